//! Positional file I/O shared by the posting store and the sidecar.
//!
//! Adapted from `trident`'s `FileCursor`: a `File` plus a tracked offset,
//! reading/writing via `pread`/`pwrite` (`FileExt`) so random-access callers
//! don't have to serialize around a single shared seek position.

use std::fs::File;
use std::io::{Read, Result, Seek, SeekFrom, Write};
use std::os::unix::fs::FileExt;

pub struct FileCursor {
    f: File,
    offset: u64,
}

impl FileCursor {
    pub fn new(f: File) -> Self {
        Self { f, offset: 0 }
    }

    pub fn len(&self) -> Result<u64> {
        Ok(self.f.metadata()?.len())
    }

    pub fn sync_all(&self) -> Result<()> {
        self.f.sync_all()
    }

    /// Read `buf.len()` bytes starting at `offset`, without disturbing the
    /// cursor's current position.
    pub fn read_at(&self, buf: &mut [u8], offset: u64) -> Result<()> {
        self.f.read_exact_at(buf, offset)
    }

    /// Write `buf` starting at `offset`, without disturbing the cursor's
    /// current position.
    pub fn write_at(&self, buf: &[u8], offset: u64) -> Result<()> {
        self.f.write_all_at(buf, offset)
    }
}

impl Read for FileCursor {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let n = self.f.read_at(buf, self.offset)?;
        self.offset += n as u64;
        Ok(n)
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        self.f.read_exact_at(buf, self.offset)?;
        self.offset += buf.len() as u64;
        Ok(())
    }
}

impl Write for FileCursor {
    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        let n = self.f.write_at(buf, self.offset)?;
        self.offset += n as u64;
        Ok(n)
    }

    fn write_all(&mut self, buf: &[u8]) -> Result<()> {
        self.f.write_all_at(buf, self.offset)?;
        self.offset += buf.len() as u64;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.f.flush()
    }
}

impl Seek for FileCursor {
    fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        match pos {
            SeekFrom::Current(i) => self.offset = (self.offset as i64 + i) as u64,
            SeekFrom::Start(i) => self.offset = i,
            SeekFrom::End(i) => self.offset = (self.f.metadata()?.len() as i64 + i) as u64,
        };
        Ok(self.offset)
    }
}
