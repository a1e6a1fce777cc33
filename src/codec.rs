//! Little-endian field readers and padding helpers shared by the record codecs.

use std::io::{self, Read, Write};

/// Round `size` up to the next multiple of 4.
#[inline]
pub const fn align4(size: usize) -> usize {
    (size + 3) & !3
}

/// Write `count` zero bytes.
pub fn write_padding<W: Write>(w: &mut W, count: usize) -> io::Result<()> {
    const ZEROS: [u8; 4] = [0; 4];
    let mut remaining = count;
    while remaining > 0 {
        let n = remaining.min(ZEROS.len());
        w.write_all(&ZEROS[..n])?;
        remaining -= n;
    }
    Ok(())
}

/// Skip `count` bytes.
pub fn skip<R: Read>(r: &mut R, count: usize) -> io::Result<()> {
    let mut buf = [0u8; 4];
    let mut remaining = count;
    while remaining > 0 {
        let n = remaining.min(buf.len());
        r.read_exact(&mut buf[..n])?;
        remaining -= n;
    }
    Ok(())
}

pub fn read_u8<R: Read>(r: &mut R) -> io::Result<u8> {
    let mut buf = [0u8; 1];
    r.read_exact(&mut buf)?;
    Ok(buf[0])
}

pub fn read_u16<R: Read>(r: &mut R) -> io::Result<u16> {
    let mut buf = [0u8; 2];
    r.read_exact(&mut buf)?;
    Ok(u16::from_le_bytes(buf))
}

pub fn read_u32<R: Read>(r: &mut R) -> io::Result<u32> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

/// Error for a type byte that names no known record variant.
pub fn unknown_type(kind: &str, value: u8) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidData,
        format!("Unknown {} type: {}", kind, value),
    )
}
