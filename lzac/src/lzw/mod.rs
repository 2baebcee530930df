//! Dictionary based LZW codec over the full byte alphabet.
//!
//! Literal bytes are their own code words, `0..=255`. Learned strings get code words
//! assigned monotonically from [FIRST_CODE] on. Every code word is `code_width` bits wide,
//! and the all ones value of that width is reserved as the end of stream marker, so a
//! dictionary of width `w` holds `2.pow(w) - 1 - FIRST_CODE` learned strings.
//!
//! The encoder looks strings up in a binary search tree, the decoder in a flat table
//! addressed by code word. Both insert the same entries in the same order.

pub mod decoder;
pub mod encoder;

pub use decoder::{DecodingError, LzwDecoder};
pub use encoder::{EncodingError, LzwEncoder};

/// Code word of the first learned string. Everything below is a literal byte.
pub const FIRST_CODE: u16 = 256;

/// Smallest supported code width. Anything smaller could not hold a single learned string.
pub const MIN_CODE_WIDTH: u8 = 9;

/// Largest supported code width.
pub const MAX_CODE_WIDTH: u8 = 16;

/// The classic 12 bit LZW.
pub const DEFAULT_CODE_WIDTH: u8 = 12;

/// A learned string: the string named by `prefix_code`, followed by `suffix_char`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DictionaryEntry {
    pub code_word: u16,
    pub prefix_code: u16,
    pub suffix_char: u8,
}

/// The reserved end of stream code word for a given width.
#[inline]
pub const fn end_of_stream(code_width: u8) -> u16 {
    ((1u32 << code_width) - 1) as u16
}

/// The largest code word a dictionary of this width will ever assign.
#[inline]
pub const fn max_code(code_width: u8) -> u16 {
    end_of_stream(code_width) - 1
}

#[inline]
pub(crate) fn is_valid_code_width(code_width: u8) -> bool {
    (MIN_CODE_WIDTH..=MAX_CODE_WIDTH).contains(&code_width)
}

/// Encode bytes into [DEFAULT_CODE_WIDTH] code words, ending with the end of stream code.
///
/// Each call works on a dictionary of its own.
///
/// # Examples
///
/// ```
/// let codes = lzac::lzw::encode(b"12.12").unwrap();
///
/// assert_eq!(codes, [49, 50, 46, 256, 4095]);
/// ```
pub fn encode(data: &[u8]) -> Result<Vec<u16>, EncodingError> {
    LzwEncoder::new(DEFAULT_CODE_WIDTH)?.encode_to_codes(data)
}

/// Decode [DEFAULT_CODE_WIDTH] code words up to the end of stream code.
pub fn decode(codes: &[u16]) -> Result<Vec<u8>, DecodingError> {
    LzwDecoder::new(DEFAULT_CODE_WIDTH)?.decode_codes(codes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_codes() {
        assert_eq!(end_of_stream(9), 511);
        assert_eq!(max_code(9), 510);
        assert_eq!(end_of_stream(12), 4095);
        assert_eq!(end_of_stream(16), u16::MAX);
        assert_eq!(max_code(16), u16::MAX - 1);
    }

    #[test]
    fn roundtrip_default_width() -> Result<(), Box<dyn std::error::Error>> {
        let data = b"12.3412.3412.3456.7856.78";

        let codes = encode(data)?;
        assert_eq!(codes.last(), Some(&end_of_stream(DEFAULT_CODE_WIDTH)));
        assert!(codes.len() < data.len());

        assert_eq!(decode(&codes)?, data);

        Ok(())
    }

    #[test]
    fn encoder_and_decoder_learn_the_same_entries() -> Result<(), Box<dyn std::error::Error>> {
        let data = b"TOBEORNOTTOBEORTOBEORNOT#aaaaaaaaaaaa31.41.59.26.53.58.97";

        let mut encoder = LzwEncoder::new(DEFAULT_CODE_WIDTH)?;
        let codes = encoder.encode_to_codes(&data[..])?;
        let mut decoder = LzwDecoder::new(DEFAULT_CODE_WIDTH)?;
        let decoded = decoder.decode_codes(&codes)?;

        assert_eq!(decoded, data);
        assert_eq!(encoder.next_code(), decoder.next_code());
        assert!(encoder.entries().eq(decoder.entries()));

        Ok(())
    }

    #[test]
    fn supported_widths() {
        assert!(!is_valid_code_width(8));
        assert!(is_valid_code_width(9));
        assert!(is_valid_code_width(DEFAULT_CODE_WIDTH));
        assert!(is_valid_code_width(16));
        assert!(!is_valid_code_width(17));
    }
}
