//! Typed read helpers layered over any [`Stream`].

use crate::error::{IoError, IoErrorCode, IoResult};
use crate::stream::Stream;

const LINE_BUFFER_SIZE: usize = 4096;
const READ_CHUNK_SIZE: usize = 64 * 1024;

#[derive(Debug, Clone, Copy)]
pub struct TextReadOptions {
    pub strip_utf8_bom: bool,
    /// `\r\n` and bare `\r` collapse to `\n`.
    pub normalize_newlines: bool,
    /// 0 = unlimited.
    pub max_bytes: usize,
}

impl Default for TextReadOptions {
    fn default() -> Self {
        Self {
            strip_utf8_bom: true,
            normalize_newlines: false,
            max_bytes: 64 * 1024 * 1024,
        }
    }
}

pub struct StreamReader<'a> {
    stream: &'a mut dyn Stream,

    // line buffer for read_line
    lbuf: Vec<u8>,
    lpos: usize,
    llen: usize,
}

impl<'a> StreamReader<'a> {
    pub fn new(stream: &'a mut dyn Stream) -> Self {
        Self {
            stream,
            lbuf: vec![0; LINE_BUFFER_SIZE],
            lpos: 0,
            llen: 0,
        }
    }

    /// Read exactly `dst.len()` bytes or fail with `EndOfStream`.
    pub fn read_exactly(&mut self, dst: &mut [u8]) -> IoResult<usize> {
        let mut done = 0;
        while done < dst.len() {
            let n = self.stream.read(&mut dst[done..])?;
            if n == 0 {
                return Err(IoError::new(
                    IoErrorCode::EndOfStream,
                    "StreamReader: unexpected EOF in read_exactly",
                ));
            }
            done += n;
        }
        Ok(done)
    }

    /// Read to EOF; `max_bytes == 0` means unlimited, exceeding a limit is a
    /// `ReadFailed`.
    pub fn read_all_bytes(&mut self, max_bytes: usize) -> IoResult<Vec<u8>> {
        let mut out = Vec::with_capacity(READ_CHUNK_SIZE);
        let mut tmp = vec![0u8; READ_CHUNK_SIZE];

        loop {
            let n = self.stream.read(&mut tmp)?;
            if n == 0 {
                break;
            }
            if max_bytes != 0 && out.len() + n > max_bytes {
                return Err(IoError::new(
                    IoErrorCode::ReadFailed,
                    "StreamReader: read_all_bytes exceeded max_bytes",
                ));
            }
            out.extend_from_slice(&tmp[..n]);
        }

        Ok(out)
    }

    pub fn read_u8(&mut self) -> IoResult<u8> {
        let mut b = [0u8; 1];
        self.read_exactly(&mut b)?;
        Ok(b[0])
    }

    pub fn read_u16_le(&mut self) -> IoResult<u16> {
        let mut b = [0u8; 2];
        self.read_exactly(&mut b)?;
        Ok(u16::from_le_bytes(b))
    }

    pub fn read_u32_le(&mut self) -> IoResult<u32> {
        let mut b = [0u8; 4];
        self.read_exactly(&mut b)?;
        Ok(u32::from_le_bytes(b))
    }

    pub fn read_u64_le(&mut self) -> IoResult<u64> {
        let mut b = [0u8; 8];
        self.read_exactly(&mut b)?;
        Ok(u64::from_le_bytes(b))
    }

    /// Read the remainder of the stream as UTF-8 text.
    pub fn read_all_text(&mut self, opt: &TextReadOptions) -> IoResult<String> {
        let bytes = self.read_all_bytes(opt.max_bytes)?;

        let start = if opt.strip_utf8_bom && bytes.starts_with(&[0xEF, 0xBB, 0xBF]) {
            3
        } else {
            0
        };

        let s = std::str::from_utf8(&bytes[start..]).map_err(|e| {
            IoError::with_detail(
                IoErrorCode::ReadFailed,
                "StreamReader: text is not valid UTF-8",
                e.to_string(),
            )
        })?;

        if !opt.normalize_newlines {
            return Ok(s.to_string());
        }

        let mut out = String::with_capacity(s.len());
        let mut chars = s.chars().peekable();
        while let Some(c) = chars.next() {
            if c == '\r' {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                out.push('\n');
            } else {
                out.push(c);
            }
        }
        Ok(out)
    }

    fn fill_line_buffer(&mut self) -> IoResult<usize> {
        self.lpos = 0;
        self.llen = 0;
        let n = self.stream.read(&mut self.lbuf)?;
        self.llen = n;
        Ok(n)
    }

    /// Read one line without the terminator; CRLF collapses to LF. Returns
    /// `None` at EOF when nothing was read. `max_line_bytes == 0` means
    /// unlimited.
    pub fn read_line(&mut self, max_line_bytes: usize) -> IoResult<Option<String>> {
        let mut line: Vec<u8> = Vec::new();

        loop {
            if self.lpos >= self.llen {
                if self.fill_line_buffer()? == 0 {
                    // EOF: a partial line still counts as a line.
                    if line.is_empty() {
                        return Ok(None);
                    }
                    break;
                }
            }

            let mut i = self.lpos;
            while i < self.llen && self.lbuf[i] != b'\n' {
                i += 1;
            }

            let chunk = i - self.lpos;
            if max_line_bytes != 0 && line.len() + chunk > max_line_bytes {
                return Err(IoError::new(
                    IoErrorCode::ReadFailed,
                    "StreamReader: line too long",
                ));
            }
            line.extend_from_slice(&self.lbuf[self.lpos..i]);

            if i < self.llen {
                // found '\n'
                self.lpos = i + 1;
                break;
            }
            self.lpos = self.llen;
        }

        if line.last() == Some(&b'\r') {
            line.pop();
        }

        let text = String::from_utf8(line).map_err(|e| {
            IoError::with_detail(
                IoErrorCode::ReadFailed,
                "StreamReader: line is not valid UTF-8",
                e.to_string(),
            )
        })?;
        Ok(Some(text))
    }
}
