//! UTF-8-safe byte ingestion with a push-back buffer and a zap-glyph filter.
//! Grounded on `original_source/fgetc.c`'s `my_fgetc`/`my_ungetc` pair: a
//! small LIFO unget ring that also clears a previously observed EOF, so
//! pushed-back bytes are always re-read before hitting the underlying
//! stream again.

use std::io::Read;

const UNGET_CAPACITY: usize = 16;

pub struct ByteReader<R: Read> {
    inner: R,
    unget: Vec<u8>,
    eof: bool,
    substitute: char,
    zapped_glyphs: Vec<char>,
}

impl<R: Read> ByteReader<R> {
    pub fn new(inner: R, substitute: char, zapped_glyphs: Vec<char>) -> Self {
        ByteReader {
            inner,
            unget: Vec::with_capacity(UNGET_CAPACITY),
            eof: false,
            substitute,
            zapped_glyphs,
        }
    }

    fn read_raw_byte(&mut self) -> Option<u8> {
        if let Some(b) = self.unget.pop() {
            self.eof = false;
            return Some(b);
        }
        if self.eof {
            return None;
        }
        let mut buf = [0u8; 1];
        match self.inner.read(&mut buf) {
            Ok(0) => {
                self.eof = true;
                None
            }
            Ok(_) => Some(buf[0]),
            Err(_) => {
                self.eof = true;
                None
            }
        }
    }

    /// Push a byte back; consumed LIFO by the next [`ByteReader::read_raw_byte`] call.
    pub fn unget_byte(&mut self, b: u8) {
        self.unget.push(b);
    }

    /// Read one UTF-8 glyph (a single `char`). Invalid sequences are
    /// replaced by the configured substitute character, never an error.
    /// Zapped glyphs are silently discarded and reading continues.
    pub fn read_glyph(&mut self) -> Option<char> {
        loop {
            let c = self.read_glyph_once()?;
            if self.zapped_glyphs.contains(&c) {
                continue;
            }
            return Some(c);
        }
    }

    fn read_glyph_once(&mut self) -> Option<char> {
        let first = self.read_raw_byte()?;
        if first < 0x80 {
            return Some(first as char);
        }
        let len = utf8_len(first)?;
        if len == 0 {
            return Some(self.substitute);
        }
        let mut bytes = vec![first];
        for _ in 1..len {
            match self.read_raw_byte() {
                Some(b) if (0x80..0xC0).contains(&b) => bytes.push(b),
                Some(b) => {
                    // Not a continuation byte: push it back, bail on this sequence.
                    self.unget_byte(b);
                    return Some(self.substitute);
                }
                None => return Some(self.substitute),
            }
        }
        match std::str::from_utf8(&bytes) {
            Ok(s) => s.chars().next().or(Some(self.substitute)),
            Err(_) => Some(self.substitute),
        }
    }
}

fn utf8_len(first: u8) -> Option<usize> {
    if first & 0b1110_0000 == 0b1100_0000 {
        Some(2)
    } else if first & 0b1111_0000 == 0b1110_0000 {
        Some(3)
    } else if first & 0b1111_1000 == 0b1111_0000 {
        Some(4)
    } else {
        Some(0) // invalid leading byte -> substitute
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_ascii() {
        let mut r = ByteReader::new("abc".as_bytes(), '?', vec![]);
        assert_eq!(r.read_glyph(), Some('a'));
        assert_eq!(r.read_glyph(), Some('b'));
        assert_eq!(r.read_glyph(), Some('c'));
        assert_eq!(r.read_glyph(), None);
    }

    #[test]
    fn reads_multibyte_utf8() {
        let mut r = ByteReader::new("é".as_bytes(), '?', vec![]);
        assert_eq!(r.read_glyph(), Some('é'));
    }

    #[test]
    fn invalid_byte_becomes_substitute() {
        let mut r = ByteReader::new(&[0xFFu8, b'x'][..], '?', vec![]);
        assert_eq!(r.read_glyph(), Some('?'));
        assert_eq!(r.read_glyph(), Some('x'));
    }

    #[test]
    fn zapped_glyph_is_skipped() {
        let mut r = ByteReader::new("a\u{200B}b".as_bytes(), '?', vec!['\u{200B}']);
        assert_eq!(r.read_glyph(), Some('a'));
        assert_eq!(r.read_glyph(), Some('b'));
    }
}
