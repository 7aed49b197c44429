//! Non-owning stream over an externally supplied buffer.

use crate::error::{IoError, IoErrorCode, IoResult};
use crate::stream::{SeekWhence, Stream, StreamCaps};

enum SpanBuf<'a> {
    ReadOnly(&'a [u8]),
    ReadWrite(&'a mut [u8]),
}

impl SpanBuf<'_> {
    fn len(&self) -> usize {
        match self {
            SpanBuf::ReadOnly(b) => b.len(),
            SpanBuf::ReadWrite(b) => b.len(),
        }
    }

    fn bytes(&self) -> &[u8] {
        match self {
            SpanBuf::ReadOnly(b) => b,
            SpanBuf::ReadWrite(b) => b,
        }
    }
}

/// Fixed-size stream over a borrowed buffer. Writes past the end fail; the
/// buffer never grows.
pub struct SpanStream<'a> {
    buf: SpanBuf<'a>,
    pos: u64,
    open: bool,
    eof: bool,
}

impl<'a> SpanStream<'a> {
    pub fn read_only(data: &'a [u8]) -> Self {
        Self {
            buf: SpanBuf::ReadOnly(data),
            pos: 0,
            open: true,
            eof: false,
        }
    }

    pub fn read_write(data: &'a mut [u8]) -> Self {
        Self {
            buf: SpanBuf::ReadWrite(data),
            pos: 0,
            open: true,
            eof: false,
        }
    }
}

impl Stream for SpanStream<'_> {
    fn caps(&self) -> StreamCaps {
        StreamCaps {
            readable: true,
            writable: matches!(self.buf, SpanBuf::ReadWrite(_)),
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
                "SpanStream: read on closed stream",
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
        dst[..n].copy_from_slice(&self.buf.bytes()[start..start + n]);
        self.pos += n as u64;
        self.eof = self.pos >= size;
        Ok(n)
    }

    fn write(&mut self, src: &[u8]) -> IoResult<usize> {
        if !self.open {
            return Err(IoError::new(
                IoErrorCode::WriteFailed,
                "SpanStream: write on closed stream",
            ));
        }
        let SpanBuf::ReadWrite(buf) = &mut self.buf else {
            return Err(IoError::new(
                IoErrorCode::NotSupported,
                "SpanStream: write not supported (read-only)",
            ));
        };
        if src.is_empty() {
            return Ok(0);
        }

        let need = self.pos + src.len() as u64;
        if need > buf.len() as u64 {
            return Err(IoError::with_detail(
                IoErrorCode::WriteFailed,
                "SpanStream: write beyond end",
                format!("need={} size={}", need, buf.len()),
            ));
        }

        let start = self.pos as usize;
        buf[start..start + src.len()].copy_from_slice(src);
        self.pos += src.len() as u64;
        self.eof = false;
        Ok(src.len())
    }

    fn tell(&self) -> IoResult<u64> {
        if !self.open {
            return Err(IoError::new(
                IoErrorCode::SeekFailed,
                "SpanStream: tell on closed stream",
            ));
        }
        Ok(self.pos)
    }

    fn seek(&mut self, offset: i64, whence: SeekWhence) -> IoResult<u64> {
        if !self.open {
            return Err(IoError::new(
                IoErrorCode::SeekFailed,
                "SpanStream: seek on closed stream",
            ));
        }

        let cur = self.pos as i64;
        let end = self.buf.len() as i64;
        let target = match whence {
            SeekWhence::Begin => offset,
            SeekWhence::Current => cur + offset,
            SeekWhence::End => end + offset,
        };

        if target < 0 || target > end {
            return Err(IoError::with_detail(
                IoErrorCode::SeekFailed,
                "SpanStream: seek out of range",
                format!("target={target} size={end}"),
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
                "SpanStream: size on closed stream",
            ));
        }
        Ok(self.buf.len() as u64)
    }

    fn flush(&mut self) -> IoResult<()> {
        if !self.open {
            return Err(IoError::new(
                IoErrorCode::NotSupported,
                "SpanStream: flush on closed stream",
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
    fn read_only_span() {
        let data = b"span data";
        let mut s = SpanStream::read_only(data);
        let mut buf = [0u8; 16];
        let n = s.read(&mut buf).unwrap();
        assert_eq!(&buf[..n], data);
        assert!(s.is_eof());
        assert_eq!(s.write(b"x").unwrap_err().code, IoErrorCode::NotSupported);
    }

    #[test]
    fn write_beyond_end_fails() {
        let mut backing = [0u8; 4];
        let mut s = SpanStream::read_write(&mut backing);
        assert_eq!(s.write(b"abcd").unwrap(), 4);
        let err = s.write(b"e").unwrap_err();
        assert_eq!(err.code, IoErrorCode::WriteFailed);
        drop(s);
        assert_eq!(&backing, b"abcd");
    }

    #[test]
    fn seek_bounds() {
        let data = b"abc";
        let mut s = SpanStream::read_only(data);
        assert_eq!(s.seek(0, SeekWhence::End).unwrap(), 3);
        assert!(s.seek(1, SeekWhence::End).is_err());
        assert!(s.seek(-4, SeekWhence::End).is_err());
    }

    #[test]
    fn read_write_span_round_trip() {
        let mut backing = *b"____";
        let mut s = SpanStream::read_write(&mut backing);
        s.write(b"ab").unwrap();
        s.seek(0, SeekWhence::Begin).unwrap();
        let mut buf = [0u8; 4];
        let n = s.read(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"ab__");
    }
}
