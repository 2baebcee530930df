use std::io::{Read, Write};

use bitstream_io::{BigEndian, BitRead, BitReader, BitWrite, BitWriter};

/// Zero bits handed out once the real input is exhausted. The decoder keeps a 16 bit window
/// on the stream, and it needs that many extra bits to push the last symbol out of it.
const TRAILING_DUMMY_BITS: u8 = 16;

/// Single bit output, most significant bit first within each byte.
pub(crate) struct BitOutput<W>
where
    W: Write,
{
    writer: BitWriter<W, BigEndian>,
    bits_written: u64,
}

impl<W> BitOutput<W>
where
    W: Write,
{
    pub fn new(write: W) -> Self {
        Self {
            writer: BitWriter::endian(write, BigEndian),
            bits_written: 0,
        }
    }

    #[inline]
    pub fn output_bit(&mut self, bit: bool) -> Result<(), std::io::Error> {
        self.writer.write_bit(bit)?;
        self.bits_written += 1;
        Ok(())
    }

    /// Amount of bits handed to this output so far, padding excluded.
    pub fn bits_written(&self) -> u64 {
        self.bits_written
    }

    /// Pads the trailing partial byte with zeros, then flushes the underlying writer.
    pub fn finish(mut self) -> Result<(), std::io::Error> {
        self.writer.byte_align()?;
        let mut write = self.writer.into_writer();
        write.flush()
    }
}

/// Single bit input, most significant bit first within each byte.
///
/// Once the underlying reader is dry, exactly [TRAILING_DUMMY_BITS] zero bits are supplied.
/// Any bit requested after those yields `None`.
pub(crate) struct BitInput<R>
where
    R: Read,
{
    reader: BitReader<R, BigEndian>,
    past_end: bool,
    dummy_bits_left: u8,
}

impl<R> BitInput<R>
where
    R: Read,
{
    pub fn new(read: R) -> Self {
        Self {
            reader: BitReader::endian(read, BigEndian),
            past_end: false,
            dummy_bits_left: 0,
        }
    }

    #[inline]
    pub fn input_bit(&mut self) -> Result<Option<bool>, std::io::Error> {
        if self.past_end {
            if self.dummy_bits_left == 0 {
                return Ok(None);
            }
            self.dummy_bits_left -= 1;
            return Ok(Some(false));
        }

        match self.reader.read_bit() {
            Ok(bit) => Ok(Some(bit)),
            Err(error) if error.kind() == std::io::ErrorKind::UnexpectedEof => {
                self.past_end = true;
                self.dummy_bits_left = TRAILING_DUMMY_BITS - 1;
                Ok(Some(false))
            }
            Err(error) => Err(error),
        }
    }
}

/// Destination for LZW code words.
pub(crate) trait CodeWriter: Sized {
    fn write_code(&mut self, code: u16) -> Result<(), std::io::Error>;

    fn finish(self) -> Result<(), std::io::Error>;
}

impl CodeWriter for &mut Vec<u16> {
    #[inline]
    fn write_code(&mut self, code: u16) -> Result<(), std::io::Error> {
        self.push(code);
        Ok(())
    }

    fn finish(self) -> Result<(), std::io::Error> {
        Ok(())
    }
}

/// Packs code words of a fixed width, big endian, into a byte stream.
pub(crate) struct PackedCodeWriter<W>
where
    W: Write,
{
    writer: BitWriter<W, BigEndian>,
    code_width: u32,
}

impl<W> PackedCodeWriter<W>
where
    W: Write,
{
    pub fn new(write: W, code_width: u8) -> Self {
        Self {
            writer: BitWriter::endian(write, BigEndian),
            code_width: code_width as u32,
        }
    }
}

impl<W> CodeWriter for PackedCodeWriter<W>
where
    W: Write,
{
    #[inline]
    fn write_code(&mut self, code: u16) -> Result<(), std::io::Error> {
        self.writer.write(self.code_width, code)
    }

    fn finish(mut self) -> Result<(), std::io::Error> {
        self.writer.byte_align()?;
        let mut write = self.writer.into_writer();
        write.flush()
    }
}

/// Source of LZW code words. `None` means the source ran dry.
pub(crate) trait CodeReader {
    fn read_code(&mut self) -> Result<Option<u16>, std::io::Error>;
}

impl<'a> CodeReader for std::slice::Iter<'a, u16> {
    #[inline]
    fn read_code(&mut self) -> Result<Option<u16>, std::io::Error> {
        Ok(self.next().copied())
    }
}

/// Reads back code words written by [PackedCodeWriter].
pub(crate) struct PackedCodeReader<R>
where
    R: Read,
{
    reader: BitReader<R, BigEndian>,
    code_width: u32,
}

impl<R> PackedCodeReader<R>
where
    R: Read,
{
    pub fn new(read: R, code_width: u8) -> Self {
        Self {
            reader: BitReader::endian(read, BigEndian),
            code_width: code_width as u32,
        }
    }
}

impl<R> CodeReader for PackedCodeReader<R>
where
    R: Read,
{
    #[inline]
    fn read_code(&mut self) -> Result<Option<u16>, std::io::Error> {
        match self.reader.read::<u16>(self.code_width) {
            Ok(code) => Ok(Some(code)),
            Err(error) if error.kind() == std::io::ErrorKind::UnexpectedEof => Ok(None),
            Err(error) => Err(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_1_bit() -> Result<(), std::io::Error> {
        let mut output = vec![];

        let mut bits = BitOutput::new(&mut output);
        bits.output_bit(true)?;
        assert_eq!(bits.bits_written(), 1);
        bits.finish()?;

        assert_eq!(output, [0x80]);

        Ok(())
    }

    #[test]
    fn write_bits_msb_first() -> Result<(), std::io::Error> {
        let mut output = vec![];

        let mut bits = BitOutput::new(&mut output);
        for bit in [1, 0, 0, 0, 0, 1, 1, 1, 0, 1, 1] {
            bits.output_bit(bit == 1)?;
        }
        assert_eq!(bits.bits_written(), 11);
        bits.finish()?;

        assert_eq!(output, [0x87, 0x60]);

        Ok(())
    }

    #[test]
    fn write_into_full_block() {
        let mut block = [0u8; 1];
        let mut cursor = std::io::Cursor::new(&mut block[..]);

        let mut bits = BitOutput::new(&mut cursor);
        let result: Result<(), std::io::Error> = (0..16).try_for_each(|_| bits.output_bit(true));

        assert_eq!(
            result.err().map(|error| error.kind()),
            Some(std::io::ErrorKind::WriteZero)
        );
    }

    #[test]
    fn read_bits_msb_first() -> Result<(), std::io::Error> {
        let input = [0xA5];

        let mut bits = BitInput::new(&input[..]);
        let mut output = vec![];
        for _ in 0..8 {
            output.push(bits.input_bit()?);
        }

        let expected: Vec<_> = [1, 0, 1, 0, 0, 1, 0, 1]
            .iter()
            .map(|&bit| Some(bit == 1))
            .collect();
        assert_eq!(output, expected);

        Ok(())
    }

    #[test]
    fn read_past_end_yields_two_dummy_bytes() -> Result<(), std::io::Error> {
        let input = [0xff];

        let mut bits = BitInput::new(&input[..]);
        for _ in 0..8 {
            assert_eq!(bits.input_bit()?, Some(true));
        }
        for _ in 0..16 {
            assert_eq!(bits.input_bit()?, Some(false));
        }
        assert_eq!(bits.input_bit()?, None);
        assert_eq!(bits.input_bit()?, None);

        Ok(())
    }

    #[test]
    fn write_12_bit_codes() -> Result<(), std::io::Error> {
        let mut output = vec![];

        let mut writer = PackedCodeWriter::new(&mut output, 12);
        writer.write_code(0xfff)?;
        writer.finish()?;

        assert_eq!(output, [0xff, 0xf0]);

        Ok(())
    }

    #[test]
    fn write_9_bit_codes() -> Result<(), std::io::Error> {
        let mut output = vec![];

        let mut writer = PackedCodeWriter::new(&mut output, 9);
        writer.write_code(0x100)?;
        writer.write_code(0x1ff)?;
        writer.finish()?;

        assert_eq!(output, [0x80, 0x7f, 0xc0]);

        Ok(())
    }

    #[test]
    fn read_0xfffa_16_bits() -> Result<(), std::io::Error> {
        let input = [0xff, 0xfa];

        let mut reader = PackedCodeReader::new(&input[..], 16);

        assert_eq!(reader.read_code()?, Some(0xfffa));
        assert_eq!(reader.read_code()?, None);

        Ok(())
    }

    #[test]
    fn read_full() -> Result<(), std::io::Error> {
        let mut output = vec![];
        let mut writer = PackedCodeWriter::new(&mut output, 12);
        writer.write_code(0)?;
        writer.write_code(1)?;
        writer.write_code(0)?;
        writer.write_code(2)?;
        writer.finish()?;

        let mut reader = PackedCodeReader::new(&output[..], 12);
        let mut codes = vec![];
        while let Some(code) = reader.read_code()? {
            codes.push(code);
        }

        assert_eq!(codes, [0, 1, 0, 2]);

        Ok(())
    }

    #[test]
    fn read_from_code_slice() -> Result<(), std::io::Error> {
        let codes = [49u16, 256, 4095];

        let mut reader = codes.iter();

        assert_eq!(reader.read_code()?, Some(49));
        assert_eq!(reader.read_code()?, Some(256));
        assert_eq!(reader.read_code()?, Some(4095));
        assert_eq!(reader.read_code()?, None);

        Ok(())
    }
}
