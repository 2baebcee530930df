//! LZW and arithmetic coding for small in-memory buffers.
//!
//! This crate provides two independent codecs:
//! * [lzw], a dictionary coder over the full byte alphabet with a fixed code width between
//!   9 and 16 bits, producing either code words or a packed big endian stream.
//! * [arithmetic], an adaptive order 0 arithmetic coder for decimal text (digits and points),
//!   closed by a terminator byte.
//!
//! Each encoder and decoder owns its dictionary or model, which is rebuilt on every call, so an
//! instance can be reused for many inputs but not shared between streams running at once.
//!
//! It works with any [std::io::Read] and [std::io::Write].
//!
//! # Examples
//!
//! ```
//! use lzac::{arithmetic, lzw};
//!
//! let text = b"12.34512.345";
//!
//! let codes = lzw::encode(text).unwrap();
//! assert_eq!(lzw::decode(&codes).unwrap(), text);
//!
//! let compressed = arithmetic::compress(text).unwrap();
//! assert_eq!(arithmetic::expand(&compressed).unwrap(), text);
//! ```

pub mod arithmetic;
mod io;
pub mod lzw;
