//! Buffered wrapper with independent read and write buffers.
//!
//! Invariants:
//! - Switching write→read flushes the write buffer first.
//! - Switching read→write rewinds the inner stream by the unread byte count
//!   (requires a seekable inner stream) and discards the read buffer.
//! - `tell` and `size` report the logical position/extent, adjusted for
//!   buffered-but-unflushed state.
//! - A large write into an empty write buffer bypasses buffering.
//! - An inner write that makes no progress is a `WriteFailed` ("stalled"),
//!   never an infinite loop.

use crate::error::{IoError, IoErrorCode, IoResult};
use crate::stream::{SeekWhence, Stream, StreamCaps};

#[derive(Debug, Clone, Copy)]
pub struct BufferingOptions {
    pub read_buffer_size: usize,
    pub write_buffer_size: usize,
    pub enable_read: bool,
    pub enable_write: bool,
}

impl Default for BufferingOptions {
    fn default() -> Self {
        Self {
            read_buffer_size: 64 * 1024,
            write_buffer_size: 64 * 1024,
            enable_read: true,
            enable_write: true,
        }
    }
}

pub struct BufferedStream {
    inner: Box<dyn Stream>,
    opt: BufferingOptions,

    rbuf: Vec<u8>,
    rpos: usize,
    rlen: usize,

    wbuf: Vec<u8>,
    wlen: usize,
}

impl BufferedStream {
    pub fn new(inner: Box<dyn Stream>) -> Self {
        Self::with_options(inner, BufferingOptions::default())
    }

    pub fn with_options(inner: Box<dyn Stream>, opt: BufferingOptions) -> Self {
        let rbuf = if opt.enable_read && opt.read_buffer_size > 0 {
            vec![0; opt.read_buffer_size]
        } else {
            Vec::new()
        };
        let wbuf = if opt.enable_write && opt.write_buffer_size > 0 {
            vec![0; opt.write_buffer_size]
        } else {
            Vec::new()
        };
        Self {
            inner,
            opt,
            rbuf,
            rpos: 0,
            rlen: 0,
            wbuf,
            wlen: 0,
        }
    }

    pub fn inner(&self) -> &dyn Stream {
        &*self.inner
    }

    fn flush_write_buffer(&mut self) -> IoResult<()> {
        if !self.opt.enable_write || self.wbuf.is_empty() || self.wlen == 0 {
            return Ok(());
        }

        let mut written_total = 0;
        while written_total < self.wlen {
            let n = self.inner.write(&self.wbuf[written_total..self.wlen])?;
            if n == 0 {
                return Err(IoError::new(
                    IoErrorCode::WriteFailed,
                    "BufferedStream: inner write returned 0 (stalled)",
                ));
            }
            written_total += n;
        }

        self.wlen = 0;
        Ok(())
    }

    fn fill_read_buffer(&mut self) -> IoResult<usize> {
        self.rpos = 0;
        self.rlen = 0;

        if !self.opt.enable_read || self.rbuf.is_empty() {
            return Ok(0);
        }

        let n = self.inner.read(&mut self.rbuf)?;
        self.rlen = n;
        Ok(n)
    }

    /// Before a read: commit buffered writes.
    fn sync_for_read(&mut self) -> IoResult<()> {
        if self.wlen > 0 {
            self.flush_write_buffer()?;
        }
        Ok(())
    }

    /// Before a write: the inner stream sits at the end of read-ahead, so
    /// rewind by the unread count and discard the read buffer.
    fn sync_for_write(&mut self) -> IoResult<()> {
        if self.rlen > self.rpos {
            if !self.inner.caps().seekable {
                return Err(IoError::new(
                    IoErrorCode::NotSupported,
                    "BufferedStream: switching read->write requires seekable inner stream",
                ));
            }
            let unread = (self.rlen - self.rpos) as i64;
            self.inner.seek(-unread, SeekWhence::Current).map_err(|_| {
                IoError::new(
                    IoErrorCode::SeekFailed,
                    "BufferedStream: failed to rewind unread read-buffer bytes",
                )
            })?;
        }
        self.rpos = 0;
        self.rlen = 0;
        Ok(())
    }
}

impl Stream for BufferedStream {
    fn caps(&self) -> StreamCaps {
        self.inner.caps()
    }

    fn is_open(&self) -> bool {
        self.inner.is_open()
    }

    fn is_eof(&self) -> bool {
        if self.rpos < self.rlen {
            return false;
        }
        self.inner.is_eof()
    }

    fn read(&mut self, dst: &mut [u8]) -> IoResult<usize> {
        if !self.inner.is_open() {
            return Err(IoError::new(
                IoErrorCode::ReadFailed,
                "BufferedStream: read on closed stream",
            ));
        }
        if dst.is_empty() {
            return Ok(0);
        }

        self.sync_for_read()?;

        if !self.opt.enable_read || self.rbuf.is_empty() {
            return self.inner.read(dst);
        }

        let mut out = 0;
        while out < dst.len() {
            let avail = self.rlen.saturating_sub(self.rpos);
            if avail == 0 {
                if self.fill_read_buffer()? == 0 {
                    break; // EOF
                }
                continue;
            }

            let n = (dst.len() - out).min(avail);
            dst[out..out + n].copy_from_slice(&self.rbuf[self.rpos..self.rpos + n]);
            self.rpos += n;
            out += n;
        }

        Ok(out)
    }

    fn write(&mut self, src: &[u8]) -> IoResult<usize> {
        if !self.inner.is_open() {
            return Err(IoError::new(
                IoErrorCode::WriteFailed,
                "BufferedStream: write on closed stream",
            ));
        }
        if src.is_empty() {
            return Ok(0);
        }

        self.sync_for_write()?;

        if !self.opt.enable_write || self.wbuf.is_empty() {
            return self.inner.write(src);
        }

        let cap = self.wbuf.len();
        let mut in_off = 0;
        while in_off < src.len() {
            // Large write into an empty buffer goes straight through.
            if self.wlen == 0 && (src.len() - in_off) >= cap {
                let n = self.inner.write(&src[in_off..])?;
                if n == 0 {
                    return Err(IoError::new(
                        IoErrorCode::WriteFailed,
                        "BufferedStream: inner write returned 0 (stalled)",
                    ));
                }
                in_off += n;
                continue;
            }

            let free = cap - self.wlen;
            let n = free.min(src.len() - in_off);
            self.wbuf[self.wlen..self.wlen + n].copy_from_slice(&src[in_off..in_off + n]);
            self.wlen += n;
            in_off += n;

            if self.wlen == cap {
                self.flush_write_buffer()?;
            }
        }

        Ok(src.len())
    }

    fn tell(&self) -> IoResult<u64> {
        if !self.inner.is_open() {
            return Err(IoError::new(
                IoErrorCode::SeekFailed,
                "BufferedStream: tell on closed stream",
            ));
        }
        if !self.inner.caps().seekable {
            return Err(IoError::new(
                IoErrorCode::NotSupported,
                "BufferedStream: tell requires seekable inner stream",
            ));
        }

        let mut pos = self.inner.tell()?;

        // Reading: inner sits at the end of the read-ahead.
        if self.rlen > self.rpos {
            pos -= (self.rlen - self.rpos) as u64;
        }
        // Writing: unflushed bytes are logically already written.
        if self.wlen > 0 {
            pos += self.wlen as u64;
        }

        Ok(pos)
    }

    fn seek(&mut self, offset: i64, whence: SeekWhence) -> IoResult<u64> {
        if !self.inner.is_open() {
            return Err(IoError::new(
                IoErrorCode::SeekFailed,
                "BufferedStream: seek on closed stream",
            ));
        }
        if !self.inner.caps().seekable {
            return Err(IoError::new(
                IoErrorCode::NotSupported,
                "BufferedStream: seek requires seekable inner stream",
            ));
        }

        self.flush_write_buffer()?;

        // The position jumps, so the read-ahead is stale.
        self.rpos = 0;
        self.rlen = 0;

        self.inner.seek(offset, whence)
    }

    fn size(&self) -> IoResult<u64> {
        if !self.inner.is_open() {
            return Err(IoError::new(
                IoErrorCode::NotSupported,
                "BufferedStream: size on closed stream",
            ));
        }

        let mut size = self.inner.size()?;

        // Unflushed writes can extend the logical size past the inner end.
        if self.wlen > 0
            && let Ok(pos) = self.inner.tell()
        {
            let logical_end = pos + self.wlen as u64;
            if logical_end > size {
                size = logical_end;
            }
        }

        Ok(size)
    }

    fn flush(&mut self) -> IoResult<()> {
        if !self.inner.is_open() {
            return Err(IoError::new(
                IoErrorCode::NotSupported,
                "BufferedStream: flush on closed stream",
            ));
        }
        self.flush_write_buffer()?;
        self.inner.flush()
    }

    fn close(&mut self) -> IoResult<()> {
        self.flush_write_buffer()?;
        self.rpos = 0;
        self.rlen = 0;
        self.inner.close()
    }
}

impl Drop for BufferedStream {
    fn drop(&mut self) {
        // Best-effort flush; a destructor must not fail.
        if self.inner.is_open() {
            let _ = self.flush_write_buffer();
            let _ = self.inner.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::MemoryStream;

    fn small_buffered(inner: MemoryStream, buf: usize) -> BufferedStream {
        BufferedStream::with_options(
            Box::new(inner),
            BufferingOptions {
                read_buffer_size: buf,
                write_buffer_size: buf,
                enable_read: true,
                enable_write: true,
            },
        )
    }

    #[test]
    fn write_then_read_flushes() {
        let mut s = small_buffered(MemoryStream::new(), 16);
        s.write(b"abc").unwrap();
        s.seek(0, SeekWhence::Begin).unwrap();
        let mut buf = [0u8; 3];
        assert_eq!(s.read(&mut buf).unwrap(), 3);
        assert_eq!(&buf, b"abc");
    }

    #[test]
    fn read_then_write_rewinds_unread() {
        let inner = MemoryStream::from_vec(b"abcdef".to_vec(), Default::default());
        let mut s = small_buffered(inner, 4);

        let mut two = [0u8; 2];
        s.read(&mut two).unwrap(); // read-ahead pulls 4, consumes 2
        assert_eq!(&two, b"ab");
        assert_eq!(s.tell().unwrap(), 2);

        s.write(b"XY").unwrap(); // must land at logical position 2
        s.flush().unwrap();
        s.seek(0, SeekWhence::Begin).unwrap();

        let mut all = [0u8; 6];
        s.read(&mut all).unwrap();
        assert_eq!(&all, b"abXYef");
    }

    #[test]
    fn tell_accounts_for_buffers() {
        let mut s = small_buffered(MemoryStream::new(), 16);
        s.write(b"abcde").unwrap(); // still buffered
        assert_eq!(s.tell().unwrap(), 5);
        s.flush().unwrap();
        assert_eq!(s.tell().unwrap(), 5);
    }

    #[test]
    fn size_includes_buffered_writes() {
        let mut s = small_buffered(MemoryStream::new(), 16);
        s.write(b"abcde").unwrap();
        assert_eq!(s.size().unwrap(), 5);
    }

    #[test]
    fn large_write_bypasses_buffer() {
        let mut s = small_buffered(MemoryStream::new(), 4);
        let data = vec![7u8; 64];
        assert_eq!(s.write(&data).unwrap(), 64);
        // Bypassed writes are already in the inner stream.
        assert_eq!(s.inner().size().unwrap(), 64);
    }

    #[test]
    fn round_trip_100k_in_3k_chunks() {
        let mut s = small_buffered(MemoryStream::new(), 8 * 1024);

        let chunk: Vec<u8> = (0..3 * 1024).map(|i| (i % 251) as u8).collect();
        let mut expected = Vec::new();
        while expected.len() < 100 * 1024 {
            s.write(&chunk).unwrap();
            expected.extend_from_slice(&chunk);
        }

        s.seek(0, SeekWhence::Begin).unwrap();
        assert_eq!(s.size().unwrap(), expected.len() as u64);

        let mut out = vec![0u8; expected.len()];
        let mut read = 0;
        while read < out.len() {
            let n = s.read(&mut out[read..]).unwrap();
            if n == 0 {
                break;
            }
            read += n;
        }
        assert_eq!(read, expected.len());
        assert_eq!(out, expected);
    }

    #[test]
    fn eof_visible_through_buffer() {
        let inner = MemoryStream::from_vec(b"ab".to_vec(), Default::default());
        let mut s = small_buffered(inner, 8);
        let mut buf = [0u8; 8];
        assert_eq!(s.read(&mut buf).unwrap(), 2);
        assert_eq!(s.read(&mut buf).unwrap(), 0);
        assert!(s.is_eof());
    }
}
