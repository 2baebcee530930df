use anyhow::Result;
use lzac::{
    arithmetic::{self, ArithmeticEncoder},
    lzw::{LzwDecoder, LzwEncoder},
};

const READINGS: &[u8] = b"21.4521.4721.4721.5021.4821.4521.45";

fn main() -> Result<()> {
    let mut compressed = vec![];
    LzwEncoder::new(12)?.encode(READINGS, &mut compressed)?;

    let mut decompressed = vec![];
    LzwDecoder::new(12)?.decode(&compressed[..], &mut decompressed)?;

    assert_eq!(decompressed, READINGS);
    println!(
        "lzw: {} bytes down to {} bytes",
        READINGS.len(),
        compressed.len()
    );

    let mut block = [0u8; 64];
    let mut encoder = ArithmeticEncoder::new(arithmetic::DEFAULT_TERMINATOR)?;
    let used = encoder.encode_into_slice(READINGS, &mut block)?;

    assert_eq!(arithmetic::expand(&block[..used])?, READINGS);
    println!(
        "arithmetic: {} bytes down to {used} bytes ({} bits)",
        READINGS.len(),
        encoder.bits_written()
    );
    print!("{}", encoder.model());

    Ok(())
}
