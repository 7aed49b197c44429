//! Typed write helpers layered over any [`Stream`].

use crate::error::{IoError, IoErrorCode, IoResult};
use crate::stream::Stream;

#[derive(Debug, Clone, Copy, Default)]
pub struct TextWriteOptions {
    pub write_utf8_bom: bool,
    /// `\n` becomes `\r\n` (tooling output).
    pub normalize_newlines: bool,
}

pub struct StreamWriter<'a> {
    stream: &'a mut dyn Stream,
}

impl<'a> StreamWriter<'a> {
    pub fn new(stream: &'a mut dyn Stream) -> Self {
        Self { stream }
    }

    /// Write the whole buffer or fail; an inner write that makes no progress
    /// is a stall, not a retry loop.
    pub fn write_exactly(&mut self, src: &[u8]) -> IoResult<()> {
        let mut done = 0;
        while done < src.len() {
            let n = self.stream.write(&src[done..])?;
            if n == 0 {
                return Err(IoError::new(
                    IoErrorCode::WriteFailed,
                    "StreamWriter: inner write returned 0 (stalled)",
                ));
            }
            done += n;
        }
        Ok(())
    }

    pub fn write_all_bytes(&mut self, bytes: &[u8]) -> IoResult<()> {
        if bytes.is_empty() {
            return Ok(());
        }
        self.write_exactly(bytes)
    }

    pub fn write_all_text(&mut self, text: &str, opt: &TextWriteOptions) -> IoResult<()> {
        if opt.write_utf8_bom {
            self.write_exactly(&[0xEF, 0xBB, 0xBF])?;
        }

        if !opt.normalize_newlines {
            return self.write_exactly(text.as_bytes());
        }

        let mut tmp = String::with_capacity(text.len() + 16);
        for c in text.chars() {
            if c == '\n' {
                tmp.push('\r');
                tmp.push('\n');
            } else {
                tmp.push(c);
            }
        }
        self.write_exactly(tmp.as_bytes())
    }

    pub fn write_u8(&mut self, v: u8) -> IoResult<()> {
        self.write_exactly(&[v])
    }

    pub fn write_u16_le(&mut self, v: u16) -> IoResult<()> {
        self.write_exactly(&v.to_le_bytes())
    }

    pub fn write_u32_le(&mut self, v: u32) -> IoResult<()> {
        self.write_exactly(&v.to_le_bytes())
    }

    pub fn write_u64_le(&mut self, v: u64) -> IoResult<()> {
        self.write_exactly(&v.to_le_bytes())
    }

    pub fn write_line(&mut self, line: &str) -> IoResult<()> {
        self.write_exactly(line.as_bytes())?;
        self.write_exactly(b"\n")
    }

    pub fn flush(&mut self) -> IoResult<()> {
        self.stream.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::{MemoryStream, SeekWhence, StreamReader, TextReadOptions};

    #[test]
    fn integers_round_trip() {
        let mut s = MemoryStream::new();
        {
            let mut w = StreamWriter::new(&mut s);
            w.write_u8(0xAB).unwrap();
            w.write_u16_le(0x1234).unwrap();
            w.write_u32_le(0xDEADBEEF).unwrap();
            w.write_u64_le(0x0102030405060708).unwrap();
        }
        s.seek(0, SeekWhence::Begin).unwrap();
        let mut r = StreamReader::new(&mut s);
        assert_eq!(r.read_u8().unwrap(), 0xAB);
        assert_eq!(r.read_u16_le().unwrap(), 0x1234);
        assert_eq!(r.read_u32_le().unwrap(), 0xDEADBEEF);
        assert_eq!(r.read_u64_le().unwrap(), 0x0102030405060708);
    }

    #[test]
    fn bom_and_newline_normalization() {
        let mut s = MemoryStream::new();
        {
            let mut w = StreamWriter::new(&mut s);
            w.write_all_text(
                "a\nb",
                &TextWriteOptions {
                    write_utf8_bom: true,
                    normalize_newlines: true,
                },
            )
            .unwrap();
        }
        assert_eq!(s.buffer(), b"\xEF\xBB\xBFa\r\nb");

        // What the writer emitted, the reader undoes.
        s.seek(0, SeekWhence::Begin).unwrap();
        let mut r = StreamReader::new(&mut s);
        let text = r
            .read_all_text(&TextReadOptions {
                strip_utf8_bom: true,
                normalize_newlines: true,
                max_bytes: 0,
            })
            .unwrap();
        assert_eq!(text, "a\nb");
    }

    #[test]
    fn write_line_appends_lf() {
        let mut s = MemoryStream::new();
        {
            let mut w = StreamWriter::new(&mut s);
            w.write_line("hello").unwrap();
            w.write_line("world").unwrap();
        }
        assert_eq!(s.buffer(), b"hello\nworld\n");
    }

    #[test]
    fn write_exactly_on_read_only_fails() {
        let mut s = MemoryStream::read_only(b"x".to_vec());
        let mut w = StreamWriter::new(&mut s);
        assert!(w.write_exactly(b"y").is_err());
    }
}
