//! Byte-exact line reading.
//!
//! The patch engine and the stream parser both need to know, for every
//! physical line, exactly how many bytes it consumed from the source,
//! terminator included. `std::io::BufRead::read_line` folds CRLF into the
//! returned string, so the accounting lives here instead.

use std::io::{self, BufRead};

/// One physical line read from the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLine {
    /// Line content with the terminator stripped. A lone `\r` that is not
    /// followed by `\n` stays in the content.
    pub content: String,
    /// Total bytes consumed from the reader, terminator included: LF adds
    /// 1, CRLF adds 2, a final unterminated line adds nothing.
    pub consumed: u64,
}

/// Read the next line, reporting its exact consumed byte length.
///
/// Returns `Ok(None)` at end of input. Non-UTF-8 content is rejected with
/// an `InvalidData` error carrying the byte offset-free cause.
pub fn read_line<R: BufRead>(reader: &mut R) -> io::Result<Option<RawLine>> {
    let mut buf: Vec<u8> = Vec::new();
    let mut consumed: u64 = 0;

    loop {
        let mut byte = [0u8; 1];
        let n = read_one(reader, &mut byte)?;
        if n == 0 {
            if consumed == 0 {
                return Ok(None);
            }
            // EOF after some bytes: unterminated final line.
            return finish(buf, consumed);
        }
        consumed += 1;

        match byte[0] {
            b'\n' => return finish(buf, consumed),
            b'\r' => {
                let next = reader.fill_buf()?;
                if next.first() == Some(&b'\n') {
                    reader.consume(1);
                    consumed += 1;
                    return finish(buf, consumed);
                }
                // Literal CR, not a terminator.
                buf.push(b'\r');
            }
            b => buf.push(b),
        }
    }
}

fn read_one<R: BufRead>(reader: &mut R, byte: &mut [u8; 1]) -> io::Result<usize> {
    loop {
        match reader.read(byte) {
            Ok(n) => return Ok(n),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
}

fn finish(buf: Vec<u8>, consumed: u64) -> io::Result<Option<RawLine>> {
    let content = String::from_utf8(buf)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    Ok(Some(RawLine { content, consumed }))
}
