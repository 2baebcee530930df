//! Adaptive order 0 arithmetic codec for decimal text.
//!
//! The coder keeps a 16 bit interval `[low, high]` and narrows it to the slice of each symbol,
//! as given by an [AdaptiveModel]. Whenever the top bits of both ends agree, that bit is settled
//! and shifted out. When the interval straddles the middle while closing in on it, the decision
//! is deferred: the second bit is dropped and an underflow bit is counted, to be written once the
//! following settled bit is known.
//!
//! Text is made of the [model::ALPHABET] symbols and is closed by a terminator byte, so the
//! stream carries no length header.

pub mod decoder;
pub mod encoder;
pub mod model;

pub use decoder::{ArithmeticDecoder, DecodingError};
pub use encoder::{ArithmeticEncoder, EncodingError};
pub use model::{AdaptiveModel, SymbolRange};

/// Terminator used by [compress] and [expand].
pub const DEFAULT_TERMINATOR: u8 = 0x00;

const TOP_BIT: u16 = 0x8000;
const SECOND_BIT: u16 = 0x4000;

/// What the next renormalization step of an [Interval] is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Step {
    /// Both ends share their top bit, here it is.
    Settled(bool),
    /// `low` is `01...` and `high` is `10...`: the interval closes in on the middle.
    Underflow,
    /// Wide enough, nothing to shift out.
    Done,
}

/// The coding interval, inclusive on both ends. `low < high` holds between symbols.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Interval {
    pub low: u16,
    pub high: u16,
}

impl Interval {
    pub fn full() -> Self {
        Self {
            low: 0,
            high: u16::MAX,
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        (self.high - self.low) as u32 + 1
    }

    /// Narrows the interval down to the part `range` covers.
    #[inline]
    pub fn narrow(&mut self, range: SymbolRange) {
        let width = self.width();
        let low = self.low as u32;
        self.high = (low + width * range.high_count as u32 / range.scale as u32 - 1) as u16;
        self.low = (low + width * range.low_count as u32 / range.scale as u32) as u16;
    }

    #[inline]
    pub fn step(&self) -> Step {
        if (self.low ^ self.high) & TOP_BIT == 0 {
            Step::Settled(self.high & TOP_BIT != 0)
        } else if self.low & SECOND_BIT != 0 && self.high & SECOND_BIT == 0 {
            Step::Underflow
        } else {
            Step::Done
        }
    }

    /// Drops the second bit of both ends, keeping the top one. Only valid on [Step::Underflow].
    #[inline]
    pub fn fold_underflow(&mut self) {
        self.low &= SECOND_BIT - 1;
        self.high |= SECOND_BIT;
    }

    /// Shifts the top bit out, a zero into `low` and a one into `high`.
    #[inline]
    pub fn shift(&mut self) {
        self.low <<= 1;
        self.high = (self.high << 1) | 1;
    }

    /// Bit written when flushing, telling which quarter the interval holds.
    #[inline]
    pub fn flush_bit(&self) -> bool {
        self.low & SECOND_BIT != 0
    }
}

/// Compress decimal text, closed with [DEFAULT_TERMINATOR].
///
/// # Examples
///
/// ```
/// let compressed = lzac::arithmetic::compress(b"12.12").unwrap();
///
/// assert_eq!(compressed, [0x1b, 0xac, 0xb4]);
/// assert_eq!(lzac::arithmetic::expand(&compressed).unwrap(), b"12.12");
/// ```
pub fn compress(text: &[u8]) -> Result<Vec<u8>, EncodingError> {
    compress_with_terminator(text, DEFAULT_TERMINATOR)
}

/// Compress decimal text, closed with `terminator`.
pub fn compress_with_terminator(text: &[u8], terminator: u8) -> Result<Vec<u8>, EncodingError> {
    ArithmeticEncoder::new(terminator)?.encode_to_vec(text)
}

/// Expand a stream produced by [compress], up to its terminator.
pub fn expand(data: &[u8]) -> Result<Vec<u8>, DecodingError> {
    expand_with_terminator(data, DEFAULT_TERMINATOR)
}

/// Expand a stream produced by [compress_with_terminator] with the same `terminator`.
pub fn expand_with_terminator(data: &[u8], terminator: u8) -> Result<Vec<u8>, DecodingError> {
    ArithmeticDecoder::new(terminator)?.decode_to_vec(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn narrow_full_interval() {
        let mut interval = Interval::full();

        interval.narrow(SymbolRange {
            low_count: 3,
            high_count: 4,
            scale: 12,
        });

        assert_eq!(
            interval,
            Interval {
                low: 16384,
                high: 21844
            }
        );
        assert_eq!(interval.step(), Step::Settled(false));
    }

    #[test]
    fn underflow_step() {
        let mut interval = Interval {
            low: 0x7000,
            high: 0x9000,
        };
        assert_eq!(interval.step(), Step::Underflow);

        interval.fold_underflow();
        assert_eq!(
            interval,
            Interval {
                low: 0x3000,
                high: 0xd000
            }
        );

        interval.shift();
        assert_eq!(
            interval,
            Interval {
                low: 0x6000,
                high: 0xa001
            }
        );
        assert_eq!(interval.step(), Step::Underflow);
    }

    #[test]
    fn wide_interval_is_done() {
        assert_eq!(Interval::full().step(), Step::Done);
        assert_eq!(
            Interval {
                low: 0x3fff,
                high: 0xc000
            }
            .step(),
            Step::Done
        );
    }

    #[test]
    fn compress_vectors() -> Result<(), Box<dyn std::error::Error>> {
        assert_eq!(compress(b"")?, [0xf0]);
        assert_eq!(compress(b"0")?, [0x14]);
        assert_eq!(compress(b"12.12")?, [0x1b, 0xac, 0xb4]);
        assert_eq!(compress(b"3.14159")?, [0x52, 0x37, 0x07, 0xc2]);

        Ok(())
    }

    #[test]
    fn expand_vectors() -> Result<(), Box<dyn std::error::Error>> {
        assert_eq!(expand(&[0xf0])?, b"");
        assert_eq!(expand(&[0x14])?, b"0");
        assert_eq!(expand(&[0x52, 0x37, 0x07, 0xc2])?, b"3.14159");

        Ok(())
    }

    #[test]
    fn terminator_only_names_the_last_symbol() -> Result<(), Box<dyn std::error::Error>> {
        let with_newline = compress_with_terminator(b"12.12", b'\n')?;

        assert_eq!(with_newline, compress(b"12.12")?);
        assert_eq!(expand_with_terminator(&with_newline, b'\n')?, b"12.12");

        Ok(())
    }

    #[test]
    fn expand_nothing() {
        assert!(matches!(expand(&[]), Err(DecodingError::PastEndOfStream)));
    }

    #[test]
    fn long_run_crosses_rescale() -> Result<(), Box<dyn std::error::Error>> {
        let text = vec![b'7'; 40_000];

        let compressed = compress(&text)?;

        assert_eq!(compressed.len(), 22);
        assert_eq!(expand(&compressed)?, text);

        Ok(())
    }
}
