//! Snapshot wire helpers.
//!
//! Everything in a snapshot is little-endian and length-prefixed; there is
//! no version byte, compatibility is by exact match. These helpers keep the
//! per-component `write_to`/`read_from` methods short and make truncated
//! input surface as [`IndexError::CorruptSnapshot`] instead of a bare i/o
//! error.

use std::io::{Read, Write};

use crate::error::{IndexError, Result};

pub(crate) fn write_u8<W: Write>(w: &mut W, v: u8) -> Result<()> {
    w.write_all(&[v])?;
    Ok(())
}

pub(crate) fn write_u32<W: Write>(w: &mut W, v: u32) -> Result<()> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

pub(crate) fn write_u64<W: Write>(w: &mut W, v: u64) -> Result<()> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

pub(crate) fn write_f32<W: Write>(w: &mut W, v: f32) -> Result<()> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

fn fill<R: Read>(r: &mut R, buf: &mut [u8]) -> Result<()> {
    r.read_exact(buf).map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            IndexError::CorruptSnapshot("unexpected end of snapshot".into())
        } else {
            IndexError::Io(e)
        }
    })
}

pub(crate) fn read_u8<R: Read>(r: &mut R) -> Result<u8> {
    let mut buf = [0u8; 1];
    fill(r, &mut buf)?;
    Ok(buf[0])
}

pub(crate) fn read_u32<R: Read>(r: &mut R) -> Result<u32> {
    let mut buf = [0u8; 4];
    fill(r, &mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

pub(crate) fn read_u64<R: Read>(r: &mut R) -> Result<u64> {
    let mut buf = [0u8; 8];
    fill(r, &mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

pub(crate) fn read_f32<R: Read>(r: &mut R) -> Result<f32> {
    let mut buf = [0u8; 4];
    fill(r, &mut buf)?;
    Ok(f32::from_le_bytes(buf))
}

/// Read a `u64` length prefix and reject absurd values before allocating.
pub(crate) fn read_len<R: Read>(r: &mut R, what: &str) -> Result<usize> {
    let len = read_u64(r)?;
    // A snapshot never legitimately stores more than 2^40 entries of
    // anything addressable by a 32-bit id.
    if len > 1 << 40 {
        return Err(IndexError::CorruptSnapshot(format!("implausible {what} length {len}")));
    }
    Ok(len as usize)
}

/// Fixed-width element that can cross the snapshot boundary.
///
/// The module is private, so this is sealed to `u32`, `u64` and `f32`.
pub trait WireElem: Copy + Default {
    fn write_to<W: Write>(self, w: &mut W) -> Result<()>;
    fn read_from<R: Read>(r: &mut R) -> Result<Self>;
}

impl WireElem for u32 {
    fn write_to<W: Write>(self, w: &mut W) -> Result<()> {
        write_u32(w, self)
    }
    fn read_from<R: Read>(r: &mut R) -> Result<Self> {
        read_u32(r)
    }
}

impl WireElem for u64 {
    fn write_to<W: Write>(self, w: &mut W) -> Result<()> {
        write_u64(w, self)
    }
    fn read_from<R: Read>(r: &mut R) -> Result<Self> {
        read_u64(r)
    }
}

impl WireElem for f32 {
    fn write_to<W: Write>(self, w: &mut W) -> Result<()> {
        write_f32(w, self)
    }
    fn read_from<R: Read>(r: &mut R) -> Result<Self> {
        read_f32(r)
    }
}

/// Write a length prefix followed by the raw elements.
pub(crate) fn write_slice<E: WireElem, W: Write>(w: &mut W, s: &[E]) -> Result<()> {
    write_u64(w, s.len() as u64)?;
    for &e in s {
        e.write_to(w)?;
    }
    Ok(())
}

/// Counterpart of [`write_slice`].
pub(crate) fn read_vec<E: WireElem, R: Read>(r: &mut R, what: &str) -> Result<Vec<E>> {
    let len = read_len(r, what)?;
    let mut out = Vec::with_capacity(len.min(1 << 20));
    for _ in 0..len {
        out.push(E::read_from(r)?);
    }
    Ok(out)
}
