//! Growable or fixed in-memory stream.

use crate::error::{IoError, IoErrorCode, IoResult};
use crate::stream::{SeekWhence, Stream, StreamCaps};

#[derive(Debug, Clone, Copy)]
pub struct MemoryStreamOptions {
    pub readable: bool,
    pub writable: bool,
    /// Writes past the end grow the buffer.
    pub growable: bool,
}

impl Default for MemoryStreamOptions {
    fn default() -> Self {
        Self {
            readable: true,
            writable: true,
            growable: true,
        }
    }
}

pub struct MemoryStream {
    opt: MemoryStreamOptions,
    buf: Vec<u8>,
    pos: u64,
    open: bool,
    eof: bool,
}

impl MemoryStream {
    pub fn new() -> Self {
        Self::with_options(MemoryStreamOptions::default())
    }

    pub fn with_options(opt: MemoryStreamOptions) -> Self {
        Self {
            opt,
            buf: Vec::new(),
            pos: 0,
            open: true,
            eof: false,
        }
    }

    pub fn from_vec(data: Vec<u8>, opt: MemoryStreamOptions) -> Self {
        Self {
            opt,
            buf: data,
            pos: 0,
            open: true,
            eof: false,
        }
    }

    /// Read-only view over `data`, seeked to the start.
    pub fn read_only(data: Vec<u8>) -> Self {
        Self::from_vec(
            data,
            MemoryStreamOptions {
                readable: true,
                writable: false,
                growable: false,
            },
        )
    }

    pub fn buffer(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }

    pub fn position(&self) -> u64 {
        self.pos
    }
}

impl Default for MemoryStream {
    fn default() -> Self {
        Self::new()
    }
}

impl Stream for MemoryStream {
    fn caps(&self) -> StreamCaps {
        StreamCaps {
            readable: self.opt.readable,
            writable: self.opt.writable,
            seekable: true,
        }
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn is_eof(&self) -> bool {
        self.eof
    }

    fn read(&mut self, dst: &mut [u8]) -> IoResult<usize> {
        if !self.open {
            return Err(IoError::new(
                IoErrorCode::ReadFailed,
                "MemoryStream: read on closed stream",
            ));
        }
        if !self.opt.readable {
            return Err(IoError::new(
                IoErrorCode::NotSupported,
                "MemoryStream: read not supported",
            ));
        }
        if dst.is_empty() {
            return Ok(0);
        }

        let size = self.buf.len() as u64;
        if self.pos >= size {
            self.eof = true;
            return Ok(0);
        }

        let remain = (size - self.pos) as usize;
        let n = remain.min(dst.len());
        let start = self.pos as usize;
        dst[..n].copy_from_slice(&self.buf[start..start + n]);
        self.pos += n as u64;
        self.eof = self.pos >= size;
        Ok(n)
    }

    fn write(&mut self, src: &[u8]) -> IoResult<usize> {
        if !self.open {
            return Err(IoError::new(
                IoErrorCode::WriteFailed,
                "MemoryStream: write on closed stream",
            ));
        }
        if !self.opt.writable {
            return Err(IoError::new(
                IoErrorCode::NotSupported,
                "MemoryStream: write not supported",
            ));
        }
        if src.is_empty() {
            return Ok(0);
        }

        // pos may sit past the end (growable+writable); the gap zero-fills.
        let need = self.pos + src.len() as u64;
        if need > self.buf.len() as u64 {
            if !self.opt.growable {
                return Err(IoError::with_detail(
                    IoErrorCode::WriteFailed,
                    "MemoryStream: no space (not growable)",
                    format!("need={} size={}", need, self.buf.len()),
                ));
            }
            self.buf.resize(need as usize, 0);
        }

        let start = self.pos as usize;
        self.buf[start..start + src.len()].copy_from_slice(src);
        self.pos += src.len() as u64;
        self.eof = false;
        Ok(src.len())
    }

    fn tell(&self) -> IoResult<u64> {
        if !self.open {
            return Err(IoError::new(
                IoErrorCode::SeekFailed,
                "MemoryStream: tell on closed stream",
            ));
        }
        Ok(self.pos)
    }

    fn seek(&mut self, offset: i64, whence: SeekWhence) -> IoResult<u64> {
        if !self.open {
            return Err(IoError::new(
                IoErrorCode::SeekFailed,
                "MemoryStream: seek on closed stream",
            ));
        }

        let cur = self.pos as i64;
        let end = self.buf.len() as i64;
        let target = match whence {
            SeekWhence::Begin => offset,
            SeekWhence::Current => cur + offset,
            SeekWhence::End => end + offset,
        };

        if target < 0 {
            return Err(IoError::with_detail(
                IoErrorCode::SeekFailed,
                "MemoryStream: seek before begin",
                format!("target={target}"),
            ));
        }

        // Seeking past the end is allowed only when a later write can extend.
        let allow_beyond_end = self.opt.writable && self.opt.growable;
        if !allow_beyond_end && target > end {
            return Err(IoError::with_detail(
                IoErrorCode::SeekFailed,
                "MemoryStream: seek beyond end",
                format!("target={target} end={end}"),
            ));
        }

        self.pos = target as u64;
        self.eof = false;
        Ok(self.pos)
    }

    fn size(&self) -> IoResult<u64> {
        if !self.open {
            return Err(IoError::new(
                IoErrorCode::NotSupported,
                "MemoryStream: size on closed stream",
            ));
        }
        Ok(self.buf.len() as u64)
    }

    fn flush(&mut self) -> IoResult<()> {
        if !self.open {
            return Err(IoError::new(
                IoErrorCode::NotSupported,
                "MemoryStream: flush on closed stream",
            ));
        }
        Ok(())
    }

    fn close(&mut self) -> IoResult<()> {
        self.open = false;
        self.eof = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_write_round_trip() {
        let mut s = MemoryStream::new();
        assert_eq!(s.write(b"hello").unwrap(), 5);
        s.seek(0, SeekWhence::Begin).unwrap();

        let mut buf = [0u8; 8];
        let n = s.read(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"hello");
        assert!(s.is_eof());

        // After EOF, reads keep returning 0.
        assert_eq!(s.read(&mut buf).unwrap(), 0);
        assert!(s.is_eof());
    }

    #[test]
    fn zero_length_read_is_zero() {
        let mut s = MemoryStream::read_only(b"abc".to_vec());
        assert_eq!(s.read(&mut []).unwrap(), 0);
        assert!(!s.is_eof());
    }

    #[test]
    fn seek_beyond_end_only_when_growable() {
        let mut s = MemoryStream::new();
        s.write(b"ab").unwrap();
        assert_eq!(s.seek(10, SeekWhence::Begin).unwrap(), 10);
        s.write(b"z").unwrap();
        assert_eq!(s.size().unwrap(), 11);

        let mut ro = MemoryStream::read_only(b"ab".to_vec());
        assert!(ro.seek(10, SeekWhence::Begin).is_err());
    }

    #[test]
    fn fixed_stream_rejects_growth() {
        let mut s = MemoryStream::from_vec(
            vec![0u8; 4],
            MemoryStreamOptions {
                readable: true,
                writable: true,
                growable: false,
            },
        );
        assert_eq!(s.write(b"abcd").unwrap(), 4);
        let err = s.write(b"x").unwrap_err();
        assert_eq!(err.code, IoErrorCode::WriteFailed);
    }

    #[test]
    fn read_only_rejects_write() {
        let mut s = MemoryStream::read_only(b"x".to_vec());
        assert_eq!(s.write(b"y").unwrap_err().code, IoErrorCode::NotSupported);
    }

    #[test]
    fn closed_stream_errors() {
        let mut s = MemoryStream::new();
        s.close().unwrap();
        assert!(!s.is_open());
        assert!(s.read(&mut [0u8; 1]).is_err());
        assert!(s.write(b"a").is_err());
        assert!(s.tell().is_err());
    }

    #[test]
    fn seek_from_end_and_current() {
        let mut s = MemoryStream::from_vec(b"abcdef".to_vec(), MemoryStreamOptions::default());
        assert_eq!(s.seek(-2, SeekWhence::End).unwrap(), 4);
        assert_eq!(s.seek(1, SeekWhence::Current).unwrap(), 5);
        assert!(s.seek(-10, SeekWhence::Current).is_err());
    }
}
