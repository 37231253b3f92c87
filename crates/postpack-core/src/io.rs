//! Byte-stream access for the streaming codec entry points.
//!
//! Any `std::io::Read` works as a byte source and any `std::io::Write` as a
//! sink. [`ReadMayCopy`] adds the "read what is there" primitive the stream
//! driver uses to size its requests exactly.

use std::io::{ErrorKind, Read};

use crate::error::{CodecError, Result};

pub trait ReadMayCopy {
    /// Fills as much of `buf` as the source can provide and returns the
    /// number of bytes copied. Fewer than `buf.len()` means end of stream.
    fn read_may_copy(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Fills all of `buf`; a short read is reported as [`CodecError::Truncated`].
    fn read_exact_or_truncated(&mut self, buf: &mut [u8]) -> Result<()> {
        let got = self.read_may_copy(buf)?;
        if got < buf.len() {
            log::warn!("byte stream ended after {} of {} bytes", got, buf.len());
            return Err(CodecError::Truncated {
                needed: buf.len(),
                available: got,
            });
        }
        Ok(())
    }
}

impl<R: Read + ?Sized> ReadMayCopy for R {
    fn read_may_copy(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(filled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Hands out at most two bytes per `read` call.
    struct Trickle<'a>(&'a [u8]);

    impl Read for Trickle<'_> {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            let n = buf.len().min(2).min(self.0.len());
            buf[..n].copy_from_slice(&self.0[..n]);
            self.0 = &self.0[n..];
            Ok(n)
        }
    }

    #[test]
    fn test_read_may_copy_gathers_short_reads() {
        let mut reader = Trickle(&[1, 2, 3, 4, 5]);
        let mut buf = [0u8; 4];
        assert_eq!(reader.read_may_copy(&mut buf).unwrap(), 4);
        assert_eq!(buf, [1, 2, 3, 4]);
        assert_eq!(reader.read_may_copy(&mut buf).unwrap(), 1);
    }

    #[test]
    fn test_short_read_is_truncation() {
        let mut reader: &[u8] = &[9, 9];
        let mut buf = [0u8; 3];
        let err = reader.read_exact_or_truncated(&mut buf).unwrap_err();
        assert!(matches!(err, CodecError::Truncated { needed: 3, available: 2 }));
    }
}
