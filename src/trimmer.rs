//! Output filter that removes trailing blanks.
//!
//! Spans bracketed by [`ESCAPE`] bytes pass through unchanged with the
//! markers removed. Form feeds become newlines and vertical tabs become
//! horizontal tabs.

use std::io::{self, Write};

/// Marks the start and end of text that must not be altered.
pub const ESCAPE: u8 = 0xFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Blanks seen since the last text are held back.
    Space,
    /// Inside an escaped span.
    Escape,
    Text,
}

/// Writer that trims blanks before every line break. State carries over
/// between writes, so the output does not depend on how the input is
/// split into chunks.
#[derive(Debug)]
pub struct Trimmer<W> {
    inner: W,
    state: State,
    space: Vec<u8>,
}

impl<W: Write> Trimmer<W> {
    pub const fn new(inner: W) -> Self {
        Self {
            inner,
            state: State::Space,
            space: Vec::new(),
        }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }

    fn reset_space(&mut self) {
        self.state = State::Space;
        self.space.clear();
    }
}

impl<W: Write> Write for Trimmer<W> {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        // Text in data[start..] has not been written yet unless state is
        // Space, in which case only the held-back blanks are pending.
        let mut start = 0;
        for (i, &byte) in data.iter().enumerate() {
            let byte = if byte == b'\x0b' { b'\t' } else { byte };
            match self.state {
                State::Space => match byte {
                    b'\t' | b' ' => self.space.push(byte),
                    b'\n' | b'\x0c' => {
                        self.reset_space();
                        self.inner.write_all(b"\n")?;
                    }
                    ESCAPE => {
                        self.inner.write_all(&self.space)?;
                        self.state = State::Escape;
                        start = i + 1;
                    }
                    _ => {
                        self.inner.write_all(&self.space)?;
                        self.state = State::Text;
                        start = i;
                    }
                },
                State::Escape => {
                    if byte == ESCAPE {
                        self.inner.write_all(&data[start..i])?;
                        self.reset_space();
                    }
                }
                State::Text => match byte {
                    b'\t' | b' ' => {
                        self.inner.write_all(&data[start..i])?;
                        self.reset_space();
                        self.space.push(byte);
                    }
                    b'\n' | b'\x0c' => {
                        self.inner.write_all(&data[start..i])?;
                        self.reset_space();
                        self.inner.write_all(b"\n")?;
                    }
                    ESCAPE => {
                        self.inner.write_all(&data[start..i])?;
                        self.state = State::Escape;
                        start = i + 1;
                    }
                    _ => {}
                },
            }
        }
        if self.state != State::Space {
            // Vertical tabs never end up inside a pending text run.
            self.inner.write_all(&data[start..])?;
        }
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trim(chunks: &[&[u8]]) -> String {
        let mut t = Trimmer::new(Vec::new());
        for chunk in chunks {
            t.write_all(chunk).unwrap();
        }
        String::from_utf8(t.into_inner()).unwrap()
    }

    #[test]
    fn trailing_blanks_are_removed() {
        assert_eq!(trim(&[b"a  \t\nb \x0cc"]), "a\nb\nc");
    }

    #[test]
    fn inner_blanks_are_kept() {
        assert_eq!(trim(&[b"\ta  b\n"]), "\ta  b\n");
    }

    #[test]
    fn escaped_text_is_verbatim() {
        assert_eq!(trim(&[b"x = \xff'a  \n b'\xff;  \n"]), "x = 'a  \n b';\n");
    }

    #[test]
    fn vertical_tab_becomes_tab() {
        assert_eq!(trim(&[b"a\x0bb\n"]), "a\tb\n");
    }

    #[test]
    fn chunking_does_not_matter() {
        assert_eq!(trim(&[b"a ", b" ", b"\n", b"b\xff ", b" \xff", b" \n"]), "a\nb  \n");
    }
}
