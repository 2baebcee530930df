//! Contains the LZW decoder and its flat dictionary table.

use std::{
    fmt::Display,
    io::{Read, Write},
};

use log::debug;

use crate::io::{CodeReader, PackedCodeReader};

use super::{end_of_stream, is_valid_code_width, max_code, DictionaryEntry, FIRST_CODE};

/// The error type for LZW decoding operations.
#[derive(Debug)]
pub enum DecodingError {
    /// An I/O error happened when reading or writing data.
    Io(std::io::Error),
    /// Code width out of bounds. It should be between 9 and 16 included.
    CodeWidth(u8),
    /// The stream holds no code word at all.
    EmptyInput,
    /// A code word that is neither a literal, a known string, nor the string about to be
    /// learned. Decoding stops there: everything after it would be garbage.
    InvalidCode { code: u16, next_code: u16 },
    /// The stream ended before its end of stream code.
    MissingEndOfStream,
}

impl Display for DecodingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodingError::Io(error) => error.fmt(f),
            DecodingError::CodeWidth(code_width) => f.write_fmt(format_args!(
                "Code width must be between 9 and 16, was {code_width}.",
            )),
            DecodingError::EmptyInput => f.write_str("Nothing to decode, the input is empty."),
            DecodingError::InvalidCode { code, next_code } => f.write_fmt(format_args!(
                "Invalid code {code}, the next code to learn is {next_code}."
            )),
            DecodingError::MissingEndOfStream => {
                f.write_str("The stream ended without its end of stream code.")
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

#[derive(Debug, Clone, Copy)]
struct TableEntry {
    prefix_code: u16,
    suffix_char: u8,
}

/// Learned strings, addressed by `code_word - FIRST_CODE`.
struct Table {
    entries: Vec<TableEntry>,
    /// Scratch space to reverse strings, which are rebuilt from their last byte.
    stack: Vec<u8>,
}

impl Table {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
            stack: Vec::new(),
        }
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.stack.clear();
    }

    fn add(&mut self, prefix_code: u16, suffix_char: u8) {
        self.entries.push(TableEntry {
            prefix_code,
            suffix_char,
        });
    }

    /// Writes the string of a known code word, and returns its first byte.
    ///
    /// Walks the prefix chain down to a literal, then writes the bytes back in order.
    /// Prefixes are always smaller than the code word they belong to, so the walk ends.
    fn write_word<W: Write>(&mut self, code: u16, into: &mut W) -> Result<u8, std::io::Error> {
        self.stack.clear();

        let mut code = code;
        while code >= FIRST_CODE {
            let entry = self.entries[(code - FIRST_CODE) as usize];
            self.stack.push(entry.suffix_char);
            code = entry.prefix_code;
        }
        let first_k = code as u8;
        self.stack.push(first_k);
        self.stack.reverse();

        into.write_all(&self.stack)?;
        Ok(first_k)
    }

    fn entries(&self) -> impl Iterator<Item = DictionaryEntry> + '_ {
        self.entries
            .iter()
            .enumerate()
            .map(|(index, entry)| DictionaryEntry {
                code_word: FIRST_CODE + index as u16,
                prefix_code: entry.prefix_code,
                suffix_char: entry.suffix_char,
            })
    }
}

/// LZW decoder for code words of a fixed width.
///
/// Mirrors [LzwEncoder](super::LzwEncoder): it must be created with the same code width,
/// and learns the same strings in the same order. Once its table is full it keeps decoding
/// with the table as is.
///
/// # Examples
///
/// ```
/// use lzac::lzw::{DecodingError, LzwDecoder};
///
/// fn main() -> Result<(), DecodingError> {
///     let mut decoder = LzwDecoder::new(12)?;
///     let decoded = decoder.decode_codes(&[97, 98, 256, 256, 4095])?;
///
///     assert_eq!(decoded, b"ababab");
///     Ok(())
/// }
/// ```
pub struct LzwDecoder {
    code_width: u8,
    next_code: u16,
    table: Table,
}

impl LzwDecoder {
    /// Creates a decoder for code words of `code_width` bits, between 9 and 16.
    pub fn new(code_width: u8) -> Result<Self, DecodingError> {
        if !is_valid_code_width(code_width) {
            return Err(DecodingError::CodeWidth(code_width));
        }

        Ok(Self {
            code_width,
            next_code: FIRST_CODE,
            table: Table::new(),
        })
    }

    pub fn code_width(&self) -> u8 {
        self.code_width
    }

    /// The code word the next learned string would get.
    pub fn next_code(&self) -> u16 {
        self.next_code
    }

    /// Learned strings, in the order their code words were assigned.
    pub fn entries(&self) -> impl Iterator<Item = DictionaryEntry> + '_ {
        self.table.entries()
    }

    /// Decode code words up to the end of stream code. Anything after it is ignored.
    pub fn decode_codes(&mut self, codes: &[u16]) -> Result<Vec<u8>, DecodingError> {
        let mut output = vec![];
        self.inner_decode(codes.iter(), &mut output)?;
        Ok(output)
    }

    /// Decode code words packed big endian, as written by
    /// [LzwEncoder::encode](super::LzwEncoder::encode).
    ///
    /// # Errors
    ///
    /// Fails on a code word inconsistent with the strings learned so far, on a stream without
    /// end of stream code, or on an [std::io::Error].
    pub fn decode<R: Read, W: Write>(&mut self, data: R, into: W) -> Result<(), DecodingError> {
        let reader = PackedCodeReader::new(data, self.code_width);
        self.inner_decode(reader, into)
    }

    /// Decode packed code words.
    /// Convenient wrapper that creates a [Vec<u8>] under the hood.
    pub fn decode_to_vec<R: Read>(&mut self, data: R) -> Result<Vec<u8>, DecodingError> {
        let mut output = vec![];
        self.decode(data, &mut output)?;
        Ok(output)
    }

    fn inner_decode<C: CodeReader, W: Write>(
        &mut self,
        codes: C,
        into: W,
    ) -> Result<(), DecodingError> {
        self.table.clear();
        self.next_code = FIRST_CODE;

        let result = self.read_and_write(codes, into);
        if result.is_err() {
            self.table.clear();
        }
        result
    }

    fn read_and_write<C: CodeReader, W: Write>(
        &mut self,
        codes: C,
        into: W,
    ) -> Result<(), DecodingError> {
        let end_of_information = end_of_stream(self.code_width);
        let max_code = max_code(self.code_width);
        let mut codes = codes;
        let mut into = into;

        let mut current_prefix = match codes.read_code()? {
            None => return Err(DecodingError::EmptyInput),
            Some(code) if code == end_of_information => return Err(DecodingError::EmptyInput),
            Some(code) if code >= FIRST_CODE => {
                return Err(DecodingError::InvalidCode {
                    code,
                    next_code: self.next_code,
                })
            }
            Some(code) => code,
        };
        let mut first_k = current_prefix as u8;
        into.write_all(&[first_k])?;
        let mut read = 1usize;

        loop {
            let code = match codes.read_code()? {
                Some(code) => code,
                None => return Err(DecodingError::MissingEndOfStream),
            };
            if code == end_of_information {
                break;
            }
            read += 1;

            let is_full = self.next_code > max_code;
            if code < FIRST_CODE {
                first_k = code as u8;
                into.write_all(&[first_k])?;
            } else if code < self.next_code {
                first_k = self.table.write_word(code, &mut into)?;
            } else if code == self.next_code && !is_full {
                // The string + char + string + char + string case: the code is the one we are
                // about to learn, the previous string followed by its own first byte.
                self.table.write_word(current_prefix, &mut into)?;
                into.write_all(&[first_k])?;
            } else {
                debug!("lzw: invalid code {code} after {read} codes");
                return Err(DecodingError::InvalidCode {
                    code,
                    next_code: self.next_code,
                });
            }

            if !is_full {
                self.table.add(current_prefix, first_k);
                self.next_code += 1;
            }
            current_prefix = code;
        }

        into.flush()?;

        debug!(
            "lzw: decoded {read} codes, {} dictionary entries",
            self.table.entries.len()
        );

        Ok(())
    }
}
