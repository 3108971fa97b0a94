use bytes::BytesMut;
use std::io;
use tokio::io::{AsyncRead, AsyncReadExt};

const READ_CHUNK: usize = 4096;

/// Splits a child output pipe into text lines.
///
/// Lines end at `\n`; a trailing `\r` is dropped and invalid UTF-8 is replaced.
/// Whatever remains when the pipe closes is returned as a last line.
pub struct LineReader<R> {
    inner: R,
    buf: BytesMut,
    // bytes of `buf` already known not to contain a newline
    scanned: usize,
    eof: bool,
}

impl<R: AsyncRead + Unpin> LineReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(READ_CHUNK),
            scanned: 0,
            eof: false,
        }
    }

    pub async fn next_line(&mut self) -> io::Result<Option<String>> {
        loop {
            if let Some(offset) = self.buf[self.scanned..].iter().position(|b| *b == b'\n') {
                let end = self.scanned + offset;
                let line = self.buf.split_to(end + 1);
                self.scanned = 0;
                return Ok(Some(decode(&line[..end])));
            }
            self.scanned = self.buf.len();

            if self.eof {
                if self.buf.is_empty() {
                    return Ok(None);
                }
                let rest = self.buf.split();
                self.scanned = 0;
                return Ok(Some(decode(&rest)));
            }

            self.buf.reserve(READ_CHUNK);
            if self.inner.read_buf(&mut self.buf).await? == 0 {
                self.eof = true;
            }
        }
    }
}

fn decode(bytes: &[u8]) -> String {
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}
