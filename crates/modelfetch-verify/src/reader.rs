use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use crate::{Checksum, Hasher, Result};

/// Streaming reader that hashes data as it passes through.
pub struct VerifiedReader<R, H> {
    reader: R,
    hasher: H,
    len:    u64,
}

impl<R, H> VerifiedReader<R, H> {
    pub fn new(reader: R, hasher: H) -> Self {
        Self {
            reader,
            hasher,
            len: 0,
        }
    }

    /// Bytes read so far.
    pub fn len(&self) -> u64 { self.len }

    pub fn is_empty(&self) -> bool { self.len == 0 }
}

impl<R: Read, H: Hasher> Read for VerifiedReader<R, H> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.reader.read(buf)?;
        if n > 0 {
            self.hasher.update(&buf[..n]);
            self.len += n as u64;
        }
        Ok(n)
    }
}

impl<R: Read, H: Hasher> VerifiedReader<R, H> {
    /// Drain the remaining input and return `(bytes read, digest)`.
    pub fn finish(mut self) -> io::Result<(u64, Vec<u8>)> {
        io::copy(&mut self, &mut io::sink())?;
        Ok((self.len, self.hasher.finalize()))
    }
}

/// Hash the file at `path` and compare it with `expected`.
///
/// Returns the file length so callers can check the size in the same pass.
pub fn verify_file(path: impl AsRef<Path>, expected: &Checksum) -> Result<u64> {
    let file = File::open(path.as_ref())?;
    let reader = VerifiedReader::new(BufReader::new(file), expected.hasher()?);
    let (len, digest) = reader.finish()?;
    expected.verify(&digest)?;
    Ok(len)
}
