//! Byte-to-text decoding with reversible escapes and LF-only line splitting
//!
//! Commit messages in the wild contain bytes that are not valid UTF-8 and
//! carriage returns in places where they are content, not terminators. Both
//! must survive the trip into `String` without dropping a commit.

use std::io::BufRead;

/// First code point of the Private Use Area slice reserved for escaped bytes.
///
/// An invalid byte `b` decodes to `U+E000 + b`; `encode` reverses the
/// mapping, so the original byte sequence can always be recovered.
const ESCAPE_BASE: u32 = 0xE000;

/// Decode raw bytes into a `String`, escaping each invalid byte.
///
/// Valid UTF-8 runs are kept as-is. Every byte that cannot start or continue
/// a valid sequence is replaced, per-occurrence, with its private-use escape
/// character. Nothing is ever dropped.
pub fn decode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    let mut rest = bytes;
    while !rest.is_empty() {
        match std::str::from_utf8(rest) {
            Ok(valid) => {
                out.push_str(valid);
                break;
            }
            Err(err) => {
                let valid_up_to = err.valid_up_to();
                // The prefix is known valid, so the lossy conversion borrows.
                out.push_str(&String::from_utf8_lossy(&rest[..valid_up_to]));
                out.push(escape_byte(rest[valid_up_to]));
                rest = &rest[valid_up_to + 1..];
            }
        }
    }
    out
}

/// Re-encode a decoded string into the original byte sequence.
///
/// Escape characters in the reserved range turn back into single bytes;
/// everything else is emitted as UTF-8.
pub fn encode(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    let mut buf = [0u8; 4];
    for ch in text.chars() {
        let cp = ch as u32;
        if (ESCAPE_BASE..ESCAPE_BASE + 0x100).contains(&cp) {
            out.push((cp - ESCAPE_BASE) as u8);
        } else {
            out.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
        }
    }
    out
}

fn escape_byte(b: u8) -> char {
    // Always within U+E000..=U+E0FF, so the fallback is unreachable.
    char::from_u32(ESCAPE_BASE + b as u32).unwrap_or(char::REPLACEMENT_CHARACTER)
}

/// Lazy line iterator over raw bytes, splitting on LF only.
///
/// A carriage return is never treated as a terminator: git's own listing
/// convention separates lines with `\n`, and a literal `\r` inside a commit
/// message is message content. The trailing `\n` is stripped; `\r` is kept.
pub struct ByteLines<R> {
    reader: R,
}

impl<R: BufRead> ByteLines<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: BufRead> Iterator for ByteLines<R> {
    type Item = std::io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut buf = Vec::new();
        match self.reader.read_until(b'\n', &mut buf) {
            Ok(0) => None,
            Ok(_) => {
                if buf.last() == Some(&b'\n') {
                    buf.pop();
                }
                Some(Ok(decode(&buf)))
            }
            Err(err) => Some(Err(err)),
        }
    }
}
