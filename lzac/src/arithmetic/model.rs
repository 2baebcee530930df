//! Adaptive order 0 model over the decimal alphabet.

use std::fmt::Display;

use log::debug;

/// Symbols every model knows about, before the terminator.
pub const ALPHABET: &[u8; 11] = b"0123456789.";

/// Number of symbols in a model, terminator included.
pub const ALPHABET_SIZE: usize = ALPHABET.len() + 1;

/// Largest total count a 16 bit coder can work with without losing symbols.
///
/// Once the model reaches it, every frequency is halved.
pub const MAXIMUM_SCALE: u16 = 16383;

/// A symbol, as a slice `[low_count, high_count)` of `[0, scale)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymbolRange {
    pub low_count: u16,
    pub high_count: u16,
    pub scale: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelEntry {
    pub symbol: u8,
    pub low: u16,
    pub high: u16,
}

/// Cumulative frequency table, one entry per symbol, contiguous over `[0, scale)`.
///
/// Every lookup counts the symbol it returns: its high count and every later entry move up
/// by one, and so does the scale. An encoder and a decoder stay in sync as long as they start
/// from the same table and look up the same symbols.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdaptiveModel {
    entries: [ModelEntry; ALPHABET_SIZE],
    scale: u16,
}

/// Whether `terminator` can close a stream, that is, it is not one of the [ALPHABET] symbols.
pub fn is_valid_terminator(terminator: u8) -> bool {
    !ALPHABET.contains(&terminator)
}

impl AdaptiveModel {
    /// Every symbol starts with a count of one.
    pub(crate) fn new(terminator: u8) -> Self {
        debug_assert!(is_valid_terminator(terminator));

        let mut entries = [ModelEntry {
            symbol: terminator,
            low: 0,
            high: 0,
        }; ALPHABET_SIZE];
        for (index, entry) in entries.iter_mut().enumerate() {
            if index < ALPHABET.len() {
                entry.symbol = ALPHABET[index];
            }
            entry.low = index as u16;
            entry.high = index as u16 + 1;
        }

        Self {
            entries,
            scale: ALPHABET_SIZE as u16,
        }
    }

    pub(crate) fn reset(&mut self) {
        *self = AdaptiveModel::new(self.terminator());
    }

    pub fn scale(&self) -> u16 {
        self.scale
    }

    pub fn terminator(&self) -> u8 {
        self.entries[ALPHABET_SIZE - 1].symbol
    }

    pub fn entries(&self) -> &[ModelEntry] {
        &self.entries
    }

    /// Range of a symbol, then counts it. `None` if the symbol is not in the alphabet.
    pub(crate) fn symbol_for_byte(&mut self, k: u8) -> Option<SymbolRange> {
        let index = self.entries.iter().position(|entry| entry.symbol == k)?;
        let range = self.range_at(index);
        self.update(index);
        Some(range)
    }

    /// Symbol whose range holds `count`, with that range, then counts it.
    /// `None` if `count` is not below the scale.
    pub(crate) fn symbol_for_count(&mut self, count: u16) -> Option<(u8, SymbolRange)> {
        let index = self
            .entries
            .iter()
            .position(|entry| entry.low <= count && count < entry.high)?;
        let symbol = self.entries[index].symbol;
        let range = self.range_at(index);
        self.update(index);
        Some((symbol, range))
    }

    #[inline]
    fn range_at(&self, index: usize) -> SymbolRange {
        let entry = &self.entries[index];
        SymbolRange {
            low_count: entry.low,
            high_count: entry.high,
            scale: self.scale,
        }
    }

    fn update(&mut self, index: usize) {
        self.entries[index].high += 1;
        for entry in self.entries[index + 1..].iter_mut() {
            entry.low += 1;
            entry.high += 1;
        }
        self.scale += 1;

        if self.scale >= MAXIMUM_SCALE {
            self.rescale();
        }
    }

    /// Halves every frequency, rounding up so no symbol drops out.
    fn rescale(&mut self) {
        let mut cumulative = 0;
        for entry in self.entries.iter_mut() {
            let frequency = (entry.high - entry.low + 1) / 2;
            entry.low = cumulative;
            cumulative += frequency;
            entry.high = cumulative;
        }
        debug!("arithmetic: model rescaled from {} to {cumulative}", self.scale);
        self.scale = cumulative;
    }
}

impl Display for AdaptiveModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "scale {}", self.scale)?;
        for entry in self.entries.iter() {
            writeln!(
                f,
                "{:>4} [{}, {})",
                entry.symbol.escape_ascii().to_string(),
                entry.low,
                entry.high
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_contiguous(model: &AdaptiveModel) {
        let entries = model.entries();
        assert_eq!(entries[0].low, 0);
        for pair in entries.windows(2) {
            assert!(pair[0].low < pair[0].high);
            assert_eq!(pair[0].high, pair[1].low);
        }
        assert_eq!(entries[ALPHABET_SIZE - 1].high, model.scale());
    }

    #[test]
    fn starts_uniform() {
        let model = AdaptiveModel::new(0);

        assert_eq!(model.scale(), 12);
        assert_eq!(model.terminator(), 0);
        assert_eq!(
            model.entries()[10],
            ModelEntry {
                symbol: b'.',
                low: 10,
                high: 11
            }
        );
        assert_contiguous(&model);
    }

    #[test]
    fn counts_looked_up_bytes() {
        let mut model = AdaptiveModel::new(0);

        let range = model.symbol_for_byte(b'3').unwrap();
        assert_eq!(
            range,
            SymbolRange {
                low_count: 3,
                high_count: 4,
                scale: 12
            }
        );

        let range = model.symbol_for_byte(b'3').unwrap();
        assert_eq!(
            range,
            SymbolRange {
                low_count: 3,
                high_count: 5,
                scale: 13
            }
        );

        let range = model.symbol_for_byte(b'.').unwrap();
        assert_eq!(
            range,
            SymbolRange {
                low_count: 12,
                high_count: 13,
                scale: 14
            }
        );

        assert_eq!(model.scale(), 15);
        assert_eq!(model.entries()[0].high, 1);
        assert_eq!(model.entries()[4].low, 6);
        assert_contiguous(&model);
    }

    #[test]
    fn counts_looked_up_counts() {
        let mut model = AdaptiveModel::new(0);

        assert_eq!(
            model.symbol_for_count(11),
            Some((
                0,
                SymbolRange {
                    low_count: 11,
                    high_count: 12,
                    scale: 12
                }
            ))
        );
        assert_eq!(model.symbol_for_count(13), None);
        assert_eq!(model.scale(), 13);
        assert_contiguous(&model);
    }

    #[test]
    fn byte_and_count_lookups_agree() {
        let mut encoding = AdaptiveModel::new(b'\n');
        let mut decoding = AdaptiveModel::new(b'\n');

        for &k in b"3.14159265358979\n" {
            let range = encoding.symbol_for_byte(k).unwrap();
            let (symbol, decoded_range) = decoding.symbol_for_count(range.low_count).unwrap();

            assert_eq!(symbol, k);
            assert_eq!(decoded_range, range);
        }

        assert_eq!(encoding, decoding);
    }

    #[test]
    fn unknown_byte() {
        let mut model = AdaptiveModel::new(0);

        assert_eq!(model.symbol_for_byte(b'a'), None);
        assert_eq!(model, AdaptiveModel::new(0));
    }

    #[test]
    fn halves_at_maximum_scale() {
        let mut model = AdaptiveModel::new(0);

        for _ in 0..(MAXIMUM_SCALE - 12) {
            model.symbol_for_byte(b'7').unwrap();
        }

        assert!(model.scale() < MAXIMUM_SCALE);
        assert_eq!(model.scale(), 8186 + 11);
        assert_eq!(model.entries()[0].high - model.entries()[0].low, 1);
        assert_contiguous(&model);
    }

    #[test]
    fn terminators() {
        assert!(is_valid_terminator(0));
        assert!(is_valid_terminator(b'\n'));
        assert!(!is_valid_terminator(b'.'));
        assert!(!is_valid_terminator(b'0'));
    }

    #[test]
    fn display() {
        let model = AdaptiveModel::new(0);

        let dump = model.to_string();

        assert!(dump.starts_with("scale 12\n"));
        assert!(dump.contains("   . [10, 11)"));
        assert!(dump.contains("\\x00 [11, 12)"));
    }
}
