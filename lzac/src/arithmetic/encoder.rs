//! Contains the arithmetic encoder.

use std::{
    fmt::Display,
    io::{Cursor, Read, Write},
};

use log::debug;

use crate::io::BitOutput;

use super::{
    model::{is_valid_terminator, AdaptiveModel},
    Interval, Step,
};

/// The error type for arithmetic encoding operations.
#[derive(Debug)]
pub enum EncodingError {
    /// An I/O error happened when reading or writing data.
    Io(std::io::Error),
    /// A byte that is neither a digit, a point, nor the terminator.
    UnknownSymbol { symbol: u8, position: usize },
    /// The terminator showed up before the end of the text, which would cut the stream short.
    EmbeddedTerminator { position: usize },
    /// The terminator is one of the alphabet symbols.
    InvalidTerminator(u8),
    /// The caller provided block is too small for the compressed stream.
    OutputFull { capacity: usize },
}

impl Display for EncodingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EncodingError::Io(error) => std::fmt::Display::fmt(&error, f),
            EncodingError::UnknownSymbol { symbol, position } => f.write_fmt(format_args!(
                "Byte {symbol:#04x} at {position} is not in the alphabet."
            )),
            EncodingError::EmbeddedTerminator { position } => f.write_fmt(format_args!(
                "Terminator found at {position}, before the end of the text."
            )),
            EncodingError::InvalidTerminator(terminator) => f.write_fmt(format_args!(
                "Terminator {terminator:#04x} is already an alphabet symbol."
            )),
            EncodingError::OutputFull { capacity } => f.write_fmt(format_args!(
                "Compressed stream does not fit in {capacity} bytes."
            )),
        }
    }
}

impl std::error::Error for EncodingError {}

impl From<std::io::Error> for EncodingError {
    fn from(error: std::io::Error) -> Self {
        EncodingError::Io(error)
    }
}

/// Arithmetic encoder over decimal text.
///
/// Like the LZW encoder, this is an encoding session: the model starts over on every call,
/// and the model of the last successful call stays around for inspection.
///
/// # Examples
///
/// ```
/// use lzac::arithmetic::{ArithmeticEncoder, EncodingError};
///
/// fn main() -> Result<(), EncodingError> {
///     let mut encoder = ArithmeticEncoder::new(b'\n')?;
///     let compressed = encoder.encode_to_vec(&b"3.14159"[..])?;
///
///     assert_eq!(compressed, [0x52, 0x37, 0x07, 0xc2]);
///     assert_eq!(encoder.bits_written(), 31);
///     Ok(())
/// }
/// ```
pub struct ArithmeticEncoder {
    model: AdaptiveModel,
    interval: Interval,
    underflow_bits: u32,
    bits_written: u64,
}

impl ArithmeticEncoder {
    /// Creates an encoder closing its streams with `terminator`.
    ///
    /// # Errors
    ///
    /// Returns [EncodingError::InvalidTerminator] if `terminator` is a digit or a point.
    pub fn new(terminator: u8) -> Result<Self, EncodingError> {
        if !is_valid_terminator(terminator) {
            return Err(EncodingError::InvalidTerminator(terminator));
        }

        Ok(Self {
            model: AdaptiveModel::new(terminator),
            interval: Interval::full(),
            underflow_bits: 0,
            bits_written: 0,
        })
    }

    pub fn terminator(&self) -> u8 {
        self.model.terminator()
    }

    pub fn model(&self) -> &AdaptiveModel {
        &self.model
    }

    /// Significant bits of the last stream, the zero padding of its last byte excluded.
    pub fn bits_written(&self) -> u64 {
        self.bits_written
    }

    /// Encode the text and its terminator into `into`.
    ///
    /// The text must not contain the terminator itself.
    ///
    /// # Errors
    ///
    /// Fails on a byte outside the alphabet, or on an [std::io::Error].
    pub fn encode<R: Read, W: Write>(&mut self, text: R, into: W) -> Result<(), EncodingError> {
        self.model.reset();
        self.interval = Interval::full();
        self.underflow_bits = 0;
        self.bits_written = 0;

        let mut output = BitOutput::new(into);
        let result = self.encode_text(text, &mut output);
        self.bits_written = output.bits_written();
        if result.is_err() {
            self.model.reset();
            return result;
        }

        output.finish()?;
        debug!(
            "arithmetic: {} bits written, final scale {}",
            self.bits_written,
            self.model.scale()
        );
        Ok(())
    }

    /// Encode the text into a new [Vec<u8>].
    pub fn encode_to_vec<R: Read>(&mut self, text: R) -> Result<Vec<u8>, EncodingError> {
        let mut output = vec![];
        self.encode(text, &mut output)?;
        Ok(output)
    }

    /// Encode the text into a caller owned block, returning how many bytes were used.
    ///
    /// # Errors
    ///
    /// Returns [EncodingError::OutputFull] if the stream does not fit in `block`.
    pub fn encode_into_slice<R: Read>(
        &mut self,
        text: R,
        block: &mut [u8],
    ) -> Result<usize, EncodingError> {
        let capacity = block.len();
        let mut cursor = Cursor::new(block);

        match self.encode(text, &mut cursor) {
            Ok(()) => Ok(cursor.position() as usize),
            Err(EncodingError::Io(error)) if error.kind() == std::io::ErrorKind::WriteZero => {
                debug!("arithmetic: output block of {capacity} bytes is full");
                Err(EncodingError::OutputFull { capacity })
            }
            Err(error) => Err(error),
        }
    }

    fn encode_text<R: Read, W: Write>(
        &mut self,
        text: R,
        output: &mut BitOutput<W>,
    ) -> Result<(), EncodingError> {
        let terminator = self.model.terminator();

        let mut position = 0;
        for k in text.bytes() {
            let k = k?;
            if k == terminator {
                return Err(EncodingError::EmbeddedTerminator { position });
            }
            self.encode_symbol(k, position, output)?;
            position += 1;
        }
        self.encode_symbol(terminator, position, output)?;
        self.flush(output)?;

        debug!("arithmetic: encoded {position} symbols");
        Ok(())
    }

    fn encode_symbol<W: Write>(
        &mut self,
        k: u8,
        position: usize,
        output: &mut BitOutput<W>,
    ) -> Result<(), EncodingError> {
        let range = self
            .model
            .symbol_for_byte(k)
            .ok_or(EncodingError::UnknownSymbol {
                symbol: k,
                position,
            })?;
        self.interval.narrow(range);

        loop {
            match self.interval.step() {
                Step::Settled(bit) => {
                    output.output_bit(bit)?;
                    while self.underflow_bits > 0 {
                        output.output_bit(!bit)?;
                        self.underflow_bits -= 1;
                    }
                }
                Step::Underflow => {
                    self.underflow_bits += 1;
                    self.interval.fold_underflow();
                }
                Step::Done => return Ok(()),
            }
            self.interval.shift();
        }
    }

    /// Writes two bits of `low` that pin a value inside the final interval.
    fn flush<W: Write>(&mut self, output: &mut BitOutput<W>) -> Result<(), EncodingError> {
        let bit = self.interval.flush_bit();
        output.output_bit(bit)?;
        for _ in 0..=self.underflow_bits {
            output.output_bit(!bit)?;
        }
        self.underflow_bits = 0;
        Ok(())
    }
}
