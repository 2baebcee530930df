//! Benchmark harness for the `lzac` codecs.
//!
//! Generates synthetic sensor readings, runs them through a codec and back, and reports sizes
//! and timings. Decoded output is diffed against the input outside of the codecs.

use std::{
    fmt::Display,
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use lzac::{
    arithmetic::{ArithmeticDecoder, ArithmeticEncoder},
    lzw::{LzwDecoder, LzwEncoder},
};
use rand::Rng;

const DIGITS: &[u8; 10] = b"0123456789";

/// Shape of one reading: `integer_digits` digits, a point, then `decimal_digits` digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleLayout {
    pub integer_digits: usize,
    pub decimal_digits: usize,
}

impl Default for SampleLayout {
    fn default() -> Self {
        Self {
            integer_digits: 2,
            decimal_digits: 2,
        }
    }
}

impl SampleLayout {
    pub fn sample_len(&self) -> usize {
        self.integer_digits + 1 + self.decimal_digits
    }

    /// `samples` random readings, back to back, without separators.
    pub fn generate<R: Rng>(&self, rng: &mut R, samples: usize) -> Vec<u8> {
        let sample_len = self.sample_len();
        (0..samples * sample_len)
            .map(|index| {
                if index % sample_len == self.integer_digits {
                    b'.'
                } else {
                    DIGITS[rng.gen_range(0..DIGITS.len())]
                }
            })
            .collect()
    }
}

/// First difference between an expected and a decoded buffer.
///
/// `None` on either side means that buffer ended first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mismatch {
    pub position: usize,
    pub expected: Option<u8>,
    pub found: Option<u8>,
}

impl Display for Mismatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fn show(byte: Option<u8>) -> String {
            match byte {
                Some(byte) => format!("'{}'", byte.escape_ascii()),
                None => "end of buffer".to_string(),
            }
        }

        write!(
            f,
            "Decoded output differs at {}: expected {}, found {}.",
            self.position,
            show(self.expected),
            show(self.found)
        )
    }
}

impl std::error::Error for Mismatch {}

/// Compares decoded output with the original input, byte for byte.
pub fn self_check(expected: &[u8], decoded: &[u8]) -> Result<(), Mismatch> {
    let length = expected.len().max(decoded.len());
    match (0..length).find(|&position| expected.get(position) != decoded.get(position)) {
        Some(position) => Err(Mismatch {
            position,
            expected: expected.get(position).copied(),
            found: decoded.get(position).copied(),
        }),
        None => Ok(()),
    }
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Codec {
    Arithmetic,
    Lzw,
    Both,
}

impl Codec {
    pub fn runs_arithmetic(&self) -> bool {
        matches!(self, Codec::Arithmetic | Codec::Both)
    }

    pub fn runs_lzw(&self) -> bool {
        matches!(self, Codec::Lzw | Codec::Both)
    }
}

/// Outcome of one compress and expand cycle.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub codec: &'static str,
    pub input_len: usize,
    pub compressed_len: usize,
    pub compress_time: Duration,
    pub expand_time: Duration,
}

impl RunReport {
    pub fn ratio(&self) -> f64 {
        if self.input_len == 0 {
            return 0.0;
        }
        self.compressed_len as f64 / self.input_len as f64
    }
}

impl Display for RunReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:<10} stream {:>6} B, compressed {:>6} B ({:.3}), compress {:>10.1?}, expand {:>10.1?}",
            self.codec,
            self.input_len,
            self.compressed_len,
            self.ratio(),
            self.compress_time,
            self.expand_time
        )
    }
}

/// Compresses `text` into a block as large as the text itself, expands it, and checks it.
pub fn run_arithmetic(text: &[u8], terminator: u8) -> Result<RunReport> {
    let mut block = vec![0u8; text.len().max(1)];
    let mut encoder = ArithmeticEncoder::new(terminator)?;
    let mut decoder = ArithmeticDecoder::new(terminator)?;

    let start = Instant::now();
    let compressed_len = encoder
        .encode_into_slice(text, &mut block)
        .context("Arithmetic compression failed")?;
    let compress_time = start.elapsed();

    let start = Instant::now();
    let decoded = decoder
        .decode_to_vec(&block[..compressed_len])
        .context("Arithmetic expansion failed")?;
    let expand_time = start.elapsed();

    self_check(text, &decoded)?;
    log::debug!("arithmetic model after the run:\n{}", encoder.model());

    Ok(RunReport {
        codec: "arithmetic",
        input_len: text.len(),
        compressed_len,
        compress_time,
        expand_time,
    })
}

/// Encodes `text` into packed code words, decodes them, and checks the result.
pub fn run_lzw(text: &[u8], code_width: u8) -> Result<RunReport> {
    let mut encoder = LzwEncoder::new(code_width)?;
    let mut decoder = LzwDecoder::new(code_width)?;

    let start = Instant::now();
    let compressed = encoder
        .encode_to_vec(text)
        .context("LZW compression failed")?;
    let compress_time = start.elapsed();

    let start = Instant::now();
    let decoded = decoder
        .decode_to_vec(&compressed[..])
        .context("LZW expansion failed")?;
    let expand_time = start.elapsed();

    self_check(text, &decoded)?;

    Ok(RunReport {
        codec: "lzw",
        input_len: text.len(),
        compressed_len: compressed.len(),
        compress_time,
        expand_time,
    })
}
