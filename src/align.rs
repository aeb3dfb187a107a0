//! Column alignment for printer output.
//!
//! Text is split into cells terminated by `\v`. Adjacent lines that share
//! a column form a block, and every cell in the block is padded with
//! spaces to the width of the widest cell plus one. The last cell of a
//! line is never padded. A line without cells, or one ending in `\f`,
//! flushes everything buffered so far.
//!
//! Spans bracketed by [`ESCAPE`] bytes are opaque: they never terminate
//! a cell or a line and are passed through with their markers.

use std::io::{self, Write};

use crate::trimmer::ESCAPE;

const CELL: u8 = b'\x0b';
const FORM_FEED: u8 = b'\x0c';
const PADDING: usize = 1;

#[derive(Debug, Default)]
struct Cell {
    text: Vec<u8>,
    /// Width in characters, escape markers excluded.
    width: usize,
}

#[derive(Debug, Default)]
struct Line {
    cells: Vec<Cell>,
    /// `\n` or `\f`; `None` for the unfinished last line.
    end: Option<u8>,
}

#[derive(Debug)]
pub struct ColumnWriter<W> {
    inner: W,
    lines: Vec<Line>,
    cell: Cell,
    cells: Vec<Cell>,
    escaped: bool,
    /// Column widths of the enclosing blocks while formatting.
    widths: Vec<usize>,
}

impl<W: Write> ColumnWriter<W> {
    pub const fn new(inner: W) -> Self {
        Self {
            inner,
            lines: Vec::new(),
            cell: Cell {
                text: Vec::new(),
                width: 0,
            },
            cells: Vec::new(),
            escaped: false,
            widths: Vec::new(),
        }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }

    fn terminate_cell(&mut self) -> usize {
        self.cells.push(std::mem::take(&mut self.cell));
        self.cells.len()
    }

    fn end_line(&mut self, end: u8) -> io::Result<()> {
        let ncells = self.terminate_cell();
        self.lines.push(Line {
            cells: std::mem::take(&mut self.cells),
            end: Some(end),
        });
        if end == FORM_FEED || ncells == 1 {
            self.flush_lines()?;
        }
        Ok(())
    }

    fn flush_lines(&mut self) -> io::Result<()> {
        let lines = std::mem::take(&mut self.lines);
        self.format(&lines, 0, lines.len())?;
        self.widths.clear();
        Ok(())
    }

    /// Write `lines[line0..line1]`, computing widths for the column at
    /// depth `self.widths.len()` and recursing for deeper columns.
    fn format(&mut self, lines: &[Line], mut line0: usize, line1: usize) -> io::Result<()> {
        let column = self.widths.len();
        let mut this = line0;
        while this < line1 {
            if column + 1 >= lines[this].cells.len() {
                this += 1;
                continue;
            }
            // A block for this column starts here.
            self.write_lines(&lines[line0..this])?;
            line0 = this;
            let mut width = 0;
            while this < line1 {
                let cells = &lines[this].cells;
                if column + 1 >= cells.len() {
                    break;
                }
                width = width.max(cells[column].width + PADDING);
                this += 1;
            }
            self.widths.push(width);
            self.format(lines, line0, this)?;
            self.widths.pop();
            line0 = this;
        }
        self.write_lines(&lines[line0..line1])
    }

    fn write_lines(&mut self, lines: &[Line]) -> io::Result<()> {
        for line in lines {
            for (j, cell) in line.cells.iter().enumerate() {
                self.inner.write_all(&cell.text)?;
                if let Some(&width) = self.widths.get(j) {
                    if j + 1 < line.cells.len() {
                        let pad = width.saturating_sub(cell.width);
                        self.inner.write_all(&b" ".repeat(pad))?;
                    }
                }
            }
            if let Some(end) = line.end {
                self.inner.write_all(&[end])?;
            }
        }
        Ok(())
    }
}

impl<W: Write> Write for ColumnWriter<W> {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        for &byte in data {
            if self.escaped {
                self.cell.text.push(byte);
                if byte == ESCAPE {
                    self.escaped = false;
                } else if !is_continuation(byte) {
                    self.cell.width += 1;
                }
                continue;
            }
            match byte {
                ESCAPE => {
                    self.cell.text.push(byte);
                    self.escaped = true;
                }
                CELL => {
                    self.terminate_cell();
                }
                b'\n' | FORM_FEED => self.end_line(byte)?,
                _ => {
                    self.cell.text.push(byte);
                    if !is_continuation(byte) {
                        self.cell.width += 1;
                    }
                }
            }
        }
        Ok(data.len())
    }

    /// Write out all buffered text, including an unfinished last line.
    fn flush(&mut self) -> io::Result<()> {
        self.terminate_cell();
        let cells = std::mem::take(&mut self.cells);
        if cells.iter().any(|c| !c.text.is_empty()) || cells.len() > 1 {
            self.lines.push(Line { cells, end: None });
        }
        self.flush_lines()?;
        self.inner.flush()
    }
}

/// UTF-8 continuation bytes do not start a character.
const fn is_continuation(byte: u8) -> bool {
    byte & 0xC0 == 0x80
}
