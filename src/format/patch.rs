//! Reserve-now, fill-later fields over a seekable stream.

use std::io::{Seek, SeekFrom, Write};

use crate::errors::Result;

/// An 8-byte field written as zero, waiting for its real value.
///
/// Not `Copy`: filling a placeholder consumes it, so every reserved field is written
/// exactly once.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a reserved field stays zero unless it is filled"]
pub struct Placeholder {
    position: u64,
}

impl Placeholder {
    pub fn position(&self) -> u64 {
        self.position
    }
}

pub struct PatchWriter<W> {
    inner: W,
}

impl<W: Write + Seek> PatchWriter<W> {
    pub fn new(inner: W) -> Self {
        PatchWriter { inner }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }

    pub fn position(&mut self) -> Result<u64> {
        Ok(self.inner.stream_position()?)
    }

    pub fn seek_to(&mut self, position: u64) -> Result<()> {
        self.inner.seek(SeekFrom::Start(position))?;
        Ok(())
    }

    pub fn seek_to_end(&mut self) -> Result<u64> {
        Ok(self.inner.seek(SeekFrom::End(0))?)
    }

    pub fn flush(&mut self) -> Result<()> {
        self.inner.flush()?;
        Ok(())
    }

    pub fn write_u8(&mut self, v: u8) -> Result<()> {
        self.inner.write_all(&[v])?;
        Ok(())
    }

    pub fn write_u16(&mut self, v: u16) -> Result<()> {
        self.inner.write_all(&v.to_le_bytes())?;
        Ok(())
    }

    pub fn write_i32(&mut self, v: i32) -> Result<()> {
        self.inner.write_all(&v.to_le_bytes())?;
        Ok(())
    }

    pub fn write_i64(&mut self, v: i64) -> Result<()> {
        self.inner.write_all(&v.to_le_bytes())?;
        Ok(())
    }

    pub fn write_f64(&mut self, v: f64) -> Result<()> {
        self.inner.write_all(&v.to_le_bytes())?;
        Ok(())
    }

    pub fn reserve_i64(&mut self) -> Result<Placeholder> {
        let position = self.position()?;
        self.write_i64(0)?;
        Ok(Placeholder { position })
    }

    /// Overwrites the placeholder and returns to where writing left off.
    pub fn patch_i64(&mut self, placeholder: Placeholder, value: i64) -> Result<()> {
        let resume = self.position()?;
        self.seek_to(placeholder.position)?;
        self.write_i64(value)?;
        self.seek_to(resume)
    }

    /// Fills the placeholder with the current stream position and returns that position.
    pub fn fill_with_position(&mut self, placeholder: Placeholder) -> Result<u64> {
        let here = self.position()?;
        self.patch_i64(placeholder, i64::try_from(here)?)?;
        Ok(here)
    }
}
