//! Contains the arithmetic decoder.

use std::{
    fmt::Display,
    io::{Read, Write},
};

use log::debug;

use crate::io::BitInput;

use super::{
    model::{is_valid_terminator, AdaptiveModel, SymbolRange},
    Interval, Step,
};

/// The error type for arithmetic decoding operations.
#[derive(Debug)]
pub enum DecodingError {
    /// An I/O error happened when reading or writing data.
    Io(std::io::Error),
    /// The terminator is one of the alphabet symbols.
    InvalidTerminator(u8),
    /// The code value fell outside of the coding interval or of the model.
    StreamCorrupted,
    /// The stream ran out before its terminator was decoded.
    PastEndOfStream,
}

impl Display for DecodingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodingError::Io(error) => std::fmt::Display::fmt(&error, f),
            DecodingError::InvalidTerminator(terminator) => f.write_fmt(format_args!(
                "Terminator {terminator:#04x} is already an alphabet symbol."
            )),
            DecodingError::StreamCorrupted => f.write_str("Corrupted stream."),
            DecodingError::PastEndOfStream => {
                f.write_str("Stream ended before its terminator.")
            }
        }
    }
}

impl std::error::Error for DecodingError {}

impl From<std::io::Error> for DecodingError {
    fn from(error: std::io::Error) -> Self {
        DecodingError::Io(error)
    }
}

/// Arithmetic decoder, the mirror of [super::ArithmeticEncoder].
///
/// # Examples
///
/// ```
/// use lzac::arithmetic::{ArithmeticDecoder, DecodingError};
///
/// fn main() -> Result<(), DecodingError> {
///     let mut decoder = ArithmeticDecoder::new(0)?;
///     let text = decoder.decode_to_vec(&[0x1b, 0xac, 0xb4][..])?;
///
///     assert_eq!(text, b"12.12");
///     Ok(())
/// }
/// ```
pub struct ArithmeticDecoder {
    model: AdaptiveModel,
    interval: Interval,
    code: u16,
}

impl ArithmeticDecoder {
    /// Creates a decoder stopping at `terminator`.
    ///
    /// # Errors
    ///
    /// Returns [DecodingError::InvalidTerminator] if `terminator` is a digit or a point.
    pub fn new(terminator: u8) -> Result<Self, DecodingError> {
        if !is_valid_terminator(terminator) {
            return Err(DecodingError::InvalidTerminator(terminator));
        }

        Ok(Self {
            model: AdaptiveModel::new(terminator),
            interval: Interval::full(),
            code: 0,
        })
    }

    pub fn terminator(&self) -> u8 {
        self.model.terminator()
    }

    pub fn model(&self) -> &AdaptiveModel {
        &self.model
    }

    /// Decode the stream into `into`, up to and excluding its terminator.
    ///
    /// Bytes following the terminator are left unread or ignored.
    ///
    /// # Errors
    ///
    /// Fails when the stream is inconsistent with the model, when it runs out before the
    /// terminator, or on an [std::io::Error].
    pub fn decode<R: Read, W: Write>(&mut self, data: R, into: W) -> Result<(), DecodingError> {
        self.model.reset();
        self.interval = Interval::full();
        self.code = 0;

        let mut input = BitInput::new(data);
        let mut into = into;
        let result = self.decode_text(&mut input, &mut into);
        if result.is_err() {
            self.model.reset();
            return result;
        }

        into.flush()?;
        Ok(())
    }

    /// Decode the stream into a new [Vec<u8>].
    pub fn decode_to_vec<R: Read>(&mut self, data: R) -> Result<Vec<u8>, DecodingError> {
        let mut output = vec![];
        self.decode(data, &mut output)?;
        Ok(output)
    }

    fn decode_text<R: Read, W: Write>(
        &mut self,
        input: &mut BitInput<R>,
        into: &mut W,
    ) -> Result<(), DecodingError> {
        for _ in 0..16 {
            self.code = (self.code << 1) | next_bit(input)? as u16;
        }

        let terminator = self.model.terminator();
        let mut decoded = 0usize;
        loop {
            let count = self.current_count()?;
            let (symbol, range) = self
                .model
                .symbol_for_count(count)
                .ok_or(DecodingError::StreamCorrupted)?;
            if symbol == terminator {
                break;
            }

            into.write_all(&[symbol])?;
            decoded += 1;
            self.remove_symbol(range, input)?;
        }

        debug!(
            "arithmetic: decoded {decoded} symbols, final scale {}",
            self.model.scale()
        );
        Ok(())
    }

    /// Position of the code value inside the interval, in model counts.
    fn current_count(&self) -> Result<u16, DecodingError> {
        let offset = self
            .code
            .checked_sub(self.interval.low)
            .ok_or(DecodingError::StreamCorrupted)? as u32;
        let count = ((offset + 1) * self.model.scale() as u32 - 1) / self.interval.width();
        u16::try_from(count).map_err(|_| DecodingError::StreamCorrupted)
    }

    fn remove_symbol<R: Read>(
        &mut self,
        range: SymbolRange,
        input: &mut BitInput<R>,
    ) -> Result<(), DecodingError> {
        self.interval.narrow(range);

        loop {
            match self.interval.step() {
                Step::Settled(_) => {}
                Step::Underflow => {
                    self.code ^= 0x4000;
                    self.interval.fold_underflow();
                }
                Step::Done => return Ok(()),
            }
            self.interval.shift();
            self.code = (self.code << 1) | next_bit(input)? as u16;
        }
    }
}

#[inline]
fn next_bit<R: Read>(input: &mut BitInput<R>) -> Result<bool, DecodingError> {
    input.input_bit()?.ok_or(DecodingError::PastEndOfStream)
}

#[cfg(test)]
mod tests {
    use super::super::ArithmeticEncoder;
    use super::*;

    #[test]
    fn decode_digits() -> Result<(), DecodingError> {
        let mut decoder = ArithmeticDecoder::new(0)?;

        let text = decoder.decode_to_vec(&[0x52, 0x37, 0x07, 0xc2][..])?;

        assert_eq!(text, b"3.14159");
        assert_eq!(decoder.model().scale(), 20);

        Ok(())
    }

    #[test]
    fn decode_only_the_terminator() -> Result<(), DecodingError> {
        let mut decoder = ArithmeticDecoder::new(0)?;

        assert_eq!(decoder.decode_to_vec(&[0xf0][..])?, b"");

        Ok(())
    }

    #[test]
    fn models_end_up_identical() -> Result<(), Box<dyn std::error::Error>> {
        let text = b"271.828182845904523536028747135266249775724709369995";

        let mut encoder = ArithmeticEncoder::new(b'\n')?;
        let compressed = encoder.encode_to_vec(&text[..])?;
        let mut decoder = ArithmeticDecoder::new(b'\n')?;
        let decoded = decoder.decode_to_vec(&compressed[..])?;

        assert_eq!(decoded, text);
        assert_eq!(encoder.model(), decoder.model());

        Ok(())
    }

    #[test]
    fn reuse_same_decoder() -> Result<(), DecodingError> {
        let mut decoder = ArithmeticDecoder::new(0)?;

        let first = decoder.decode_to_vec(&[0x1b, 0xac, 0xb4][..])?;
        let second = decoder.decode_to_vec(&[0x1b, 0xac, 0xb4][..])?;

        assert_eq!(first, b"12.12");
        assert_eq!(first, second);

        Ok(())
    }

    #[test]
    fn empty_stream() -> Result<(), DecodingError> {
        let mut decoder = ArithmeticDecoder::new(0)?;

        let result = decoder.decode_to_vec(&[][..]);

        assert!(matches!(result, Err(DecodingError::PastEndOfStream)));
        assert_eq!(decoder.model().scale(), 12);

        Ok(())
    }

    #[test]
    fn count_outside_interval_is_corruption() -> Result<(), DecodingError> {
        let mut decoder = ArithmeticDecoder::new(0)?;
        decoder.interval = Interval {
            low: 0x2000,
            high: 0xa000,
        };
        decoder.code = 0x1fff;

        assert!(matches!(
            decoder.current_count(),
            Err(DecodingError::StreamCorrupted)
        ));

        decoder.code = 0x2000;
        assert_eq!(decoder.current_count()?, 0);

        Ok(())
    }

    #[test]
    fn invalid_terminator() {
        assert!(matches!(
            ArithmeticDecoder::new(b'.'),
            Err(DecodingError::InvalidTerminator(b'.'))
        ));
    }

    #[test]
    fn interval_stays_ordered() -> Result<(), Box<dyn std::error::Error>> {
        let text = b"99999999990000000000.5.5.5.5.1234567890";
        let compressed = ArithmeticEncoder::new(0)?.encode_to_vec(&text[..])?;

        let mut decoder = ArithmeticDecoder::new(0)?;
        let mut input = BitInput::new(&compressed[..]);
        for _ in 0..16 {
            decoder.code = (decoder.code << 1) | next_bit(&mut input)? as u16;
        }

        let mut decoded = vec![];
        loop {
            let count = decoder.current_count()?;
            let (symbol, range) = decoder
                .model
                .symbol_for_count(count)
                .ok_or(DecodingError::StreamCorrupted)?;
            if symbol == 0 {
                break;
            }
            decoded.push(symbol);
            decoder.remove_symbol(range, &mut input)?;

            let interval = decoder.interval;
            assert!(interval.low < interval.high);
            assert!(interval.width() > 0x4000);
            assert!(interval.low <= decoder.code && decoder.code <= interval.high);
        }

        assert_eq!(decoded, text);

        Ok(())
    }

    #[test]
    fn flipped_leading_bits_run_past_the_end() -> Result<(), Box<dyn std::error::Error>> {
        let mut compressed = ArithmeticEncoder::new(0)?.encode_to_vec(&b"3.14159265"[..])?;
        assert_eq!(compressed, [0x52, 0x37, 0x07, 0x9c, 0x4b, 0xe0]);

        compressed[0] ^= 0xff;
        compressed[1] ^= 0xff;
        let result = ArithmeticDecoder::new(0)?.decode_to_vec(&compressed[..]);

        assert!(matches!(result, Err(DecodingError::PastEndOfStream)));

        Ok(())
    }
}
