//! Contains the LZW encoder and its binary search tree dictionary.

use std::{
    fmt::Display,
    io::{Read, Write},
};

use log::debug;

use crate::io::{CodeWriter, PackedCodeWriter};

use super::{end_of_stream, is_valid_code_width, max_code, DictionaryEntry, FIRST_CODE};

/// The error type for LZW encoding operations.
///
/// Encapsulate [std::io::Error] and expose code width, empty input or dictionary issues.
#[derive(Debug)]
pub enum EncodingError {
    /// An I/O error happened when reading or writing data.
    Io(std::io::Error),
    /// Code width out of bounds. It should be between 9 and 16 included.
    CodeWidth(u8),
    /// There was nothing to encode.
    EmptyInput,
    /// Every code word up to `max_code` was assigned before the input ran out.
    ///
    /// The encoder never resets its dictionary by itself: use a wider code, or split
    /// the input and encode the parts separately.
    DictionaryFull { max_code: u16 },
    /// A dictionary node could not be allocated.
    AllocationFailure,
}

impl Display for EncodingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EncodingError::Io(error) => std::fmt::Display::fmt(&error, f),
            EncodingError::CodeWidth(code_width) => f.write_fmt(format_args!(
                "Code width must be between 9 and 16, was {code_width}.",
            )),
            EncodingError::EmptyInput => f.write_str("Nothing to encode, the input is empty."),
            EncodingError::DictionaryFull { max_code } => f.write_fmt(format_args!(
                "Dictionary full, all codes up to {max_code} are assigned."
            )),
            EncodingError::AllocationFailure => {
                f.write_str("Could not allocate a new dictionary entry.")
            }
        }
    }
}

impl std::error::Error for EncodingError {}

impl From<std::io::Error> for EncodingError {
    fn from(error: std::io::Error) -> Self {
        EncodingError::Io(error)
    }
}

/// Builds the ordering key of a string: `{ms nibble of suffix}{prefix code}{ls nibble of suffix}`.
///
/// Splitting the suffix around the prefix spreads consecutive code words over the tree,
/// which keeps it from degenerating into a list on repetitive input.
#[inline(always)]
fn make_key(prefix_code: u16, suffix_char: u8) -> u32 {
    let mut key = ((suffix_char & 0xF0) as u32) << 16;
    key |= (prefix_code as u32) << 4;
    key | (suffix_char & 0x0F) as u32
}

#[derive(Debug, Clone)]
struct Node {
    entry: DictionaryEntry,
    key: u32,
    /// Child with a smaller key.
    left: Option<u16>,
    /// Child with a greater key.
    right: Option<u16>,
}

/// Where a missing string would hang in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Vacancy {
    Root,
    Left(u16),
    Right(u16),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lookup {
    Found(u16),
    Missing(Vacancy),
}

/// Unbalanced binary search tree, arena allocated: links are indices in `nodes`.
///
/// Nodes are pushed in code word order, so the arena doubles as the list of entries.
/// Using this suggestion: https://dev.to/deciduously/no-more-tears-no-more-knots-arena-allocated-trees-in-rust-44k6
pub(crate) struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    #[inline(always)]
    fn reset(&mut self) {
        self.nodes.clear();
    }

    fn find_word(&self, prefix_code: u16, suffix_char: u8) -> Lookup {
        if self.nodes.is_empty() {
            return Lookup::Missing(Vacancy::Root);
        }

        let search_key = make_key(prefix_code, suffix_char);
        let mut index = 0;
        loop {
            let node = &self.nodes[index as usize];
            if search_key == node.key {
                return Lookup::Found(node.entry.code_word);
            } else if search_key < node.key {
                match node.left {
                    Some(left) => index = left,
                    None => return Lookup::Missing(Vacancy::Left(index)),
                }
            } else {
                match node.right {
                    Some(right) => index = right,
                    None => return Lookup::Missing(Vacancy::Right(index)),
                }
            }
        }
    }

    fn add(&mut self, vacancy: Vacancy, entry: DictionaryEntry) -> Result<(), EncodingError> {
        self.nodes
            .try_reserve(1)
            .map_err(|_| EncodingError::AllocationFailure)?;

        let new_index = self.nodes.len() as u16;
        match vacancy {
            Vacancy::Root => debug_assert!(self.nodes.is_empty()),
            Vacancy::Left(parent) => self.nodes[parent as usize].left = Some(new_index),
            Vacancy::Right(parent) => self.nodes[parent as usize].right = Some(new_index),
        }

        self.nodes.push(Node {
            entry,
            key: make_key(entry.prefix_code, entry.suffix_char),
            left: None,
            right: None,
        });
        Ok(())
    }

    #[inline(always)]
    fn len(&self) -> usize {
        self.nodes.len()
    }

    fn entries(&self) -> impl Iterator<Item = DictionaryEntry> + '_ {
        self.nodes.iter().map(|node| node.entry)
    }
}

/// LZW encoder writing code words of a fixed width.
///
/// An encoder is an encoding session: it owns its dictionary, which is rebuilt from scratch on
/// every call, so a single instance can encode many independent inputs one after the other.
/// The dictionary of the last successful call stays around for inspection.
///
/// # Examples
///
/// ```
/// use lzac::lzw::{EncodingError, LzwEncoder};
///
/// fn main() -> Result<(), EncodingError> {
///     let mut encoder = LzwEncoder::new(12)?;
///     let codes = encoder.encode_to_codes(&b"ababab"[..])?;
///
///     assert_eq!(codes, [97, 98, 256, 256, 4095]);
///     assert_eq!(encoder.next_code(), 259);
///     Ok(())
/// }
/// ```
pub struct LzwEncoder {
    code_width: u8,
    next_code: u16,
    tree: Tree,
}

impl LzwEncoder {
    /// Creates an encoder for code words of `code_width` bits, between 9 and 16.
    ///
    /// # Errors
    ///
    /// Returns [EncodingError::CodeWidth] for unsupported widths.
    pub fn new(code_width: u8) -> Result<Self, EncodingError> {
        if !is_valid_code_width(code_width) {
            return Err(EncodingError::CodeWidth(code_width));
        }

        Ok(Self {
            code_width,
            next_code: FIRST_CODE,
            tree: Tree::new(),
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
        self.tree.entries()
    }

    /// Encode the data into its code words, terminated by the end of stream code.
    ///
    /// # Errors
    ///
    /// Fails on empty input, when the dictionary runs full, or on an [std::io::Error]
    /// reading the data.
    pub fn encode_to_codes<R: Read>(&mut self, data: R) -> Result<Vec<u16>, EncodingError> {
        let mut codes = vec![];
        self.inner_encode(data, &mut codes)?;
        Ok(codes)
    }

    /// Encode the data, packing code words big endian into `into`.
    ///
    /// The last byte is padded with zeros.
    ///
    /// # Arguments
    ///
    /// * `data` - The source data to be compressed.
    /// * `into` - The output where compressed data should be written.
    ///
    /// # Errors
    ///
    /// Fails on empty input, when the dictionary runs full, or on an [std::io::Error].
    ///
    /// # Examples
    /// ```
    /// use lzac::lzw::{EncodingError, LzwEncoder};
    ///
    /// fn main() -> Result<(), EncodingError> {
    ///     let mut output = vec![];
    ///
    ///     LzwEncoder::new(12)?.encode(&b"5"[..], &mut output)?;
    ///
    ///     assert_eq!(output, [0x03, 0x5f, 0xff]);
    ///     Ok(())
    /// }
    /// ```
    pub fn encode<R: Read, W: Write>(&mut self, data: R, into: W) -> Result<(), EncodingError> {
        let writer = PackedCodeWriter::new(into, self.code_width);
        self.inner_encode(data, writer)
    }

    /// Encode the data, packing code words big endian.
    /// Convenient wrapper that creates a [Vec<u8>] under the hood.
    pub fn encode_to_vec<R: Read>(&mut self, data: R) -> Result<Vec<u8>, EncodingError> {
        let mut output = vec![];
        self.encode(data, &mut output)?;
        Ok(output)
    }

    fn inner_encode<R: Read, C: CodeWriter>(
        &mut self,
        data: R,
        writer: C,
    ) -> Result<(), EncodingError> {
        self.tree.reset();
        self.next_code = FIRST_CODE;

        let result = self.build_and_write(data, writer);
        if result.is_err() {
            self.tree.reset();
        }
        result
    }

    fn build_and_write<R: Read, C: CodeWriter>(
        &mut self,
        data: R,
        writer: C,
    ) -> Result<(), EncodingError> {
        let max_code = max_code(self.code_width);
        let mut writer = writer;

        let mut bytes = data.bytes();
        let mut current_prefix = match bytes.next() {
            Some(k) => k? as u16,
            None => return Err(EncodingError::EmptyInput),
        };
        let mut read = 1usize;
        let mut written = 0usize;

        for k in bytes {
            let k = k?;
            read += 1;

            match self.tree.find_word(current_prefix, k) {
                Lookup::Found(word) => current_prefix = word,
                Lookup::Missing(vacancy) => {
                    if self.next_code > max_code {
                        debug!("lzw: dictionary full after {read} bytes, last code {max_code}");
                        return Err(EncodingError::DictionaryFull { max_code });
                    }

                    self.tree.add(
                        vacancy,
                        DictionaryEntry {
                            code_word: self.next_code,
                            prefix_code: current_prefix,
                            suffix_char: k,
                        },
                    )?;
                    self.next_code += 1;

                    writer.write_code(current_prefix)?;
                    written += 1;
                    current_prefix = k as u16;
                }
            }
        }

        writer.write_code(current_prefix)?;
        writer.write_code(end_of_stream(self.code_width))?;
        writer.finish()?;

        debug!(
            "lzw: encoded {read} bytes into {} codes, {} dictionary entries",
            written + 1,
            self.tree.len()
        );

        Ok(())
    }
}
