//! An append-only builder for escape-coded terminal output.
//!
//! Widgets paint by building an [`Ansi`] buffer and handing it to the frame,
//! which writes it to the output surface. Lengths are measured in *visible*
//! cells: escape sequences take no space and wide code points take two.

use std::{fmt, io::Write, iter::repeat_n};

use crossterm::{
    Command, cursor,
    style::{Attribute, Color, SetAttribute, SetBackgroundColor, SetForegroundColor},
    terminal::{Clear, ClearType},
};
use unicode_width::UnicodeWidthChar;

use crate::geom::Point;

/// The escape introducer.
const ESC: char = '\x1b';
/// The BEL control, which terminates OSC sequences.
const BEL: char = '\x07';

/// The SGR reset sequence.
pub const RESET: &str = "\x1b[0m";

/// An escape-coded output buffer.
///
/// All methods append and return `&mut Self` so calls chain:
///
/// ```
/// use termview::{ansi::Ansi, geom::Point};
///
/// let mut buf = Ansi::new();
/// buf.goto(Point::new(0, 0)).bold().write_fill("title", 10, ' ').reset();
/// assert_eq!(buf.visible_len(), 10);
/// ```
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Ansi {
    /// Accumulated output.
    buf: String,
}

impl Ansi {
    /// Start an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the ANSI form of a crossterm command.
    fn command(&mut self, cmd: impl Command) -> &mut Self {
        // Formatting into a String cannot fail.
        cmd.write_ansi(&mut self.buf).ok();
        self
    }

    /// Hide the terminal cursor.
    pub fn cursor_off(&mut self) -> &mut Self {
        self.command(cursor::Hide)
    }

    /// Show the terminal cursor.
    pub fn cursor_on(&mut self) -> &mut Self {
        self.command(cursor::Show)
    }

    /// Clear the whole screen.
    pub fn clear_screen(&mut self) -> &mut Self {
        self.command(Clear(ClearType::All))
    }

    /// Turn on underlining.
    pub fn underline(&mut self) -> &mut Self {
        self.command(SetAttribute(Attribute::Underlined))
    }

    /// Turn on bold.
    pub fn bold(&mut self) -> &mut Self {
        self.command(SetAttribute(Attribute::Bold))
    }

    /// Turn on reverse video.
    pub fn reverse(&mut self) -> &mut Self {
        self.command(SetAttribute(Attribute::Reverse))
    }

    /// Reset all attributes and colors.
    pub fn reset(&mut self) -> &mut Self {
        self.command(SetAttribute(Attribute::Reset))
    }

    /// Select a foreground color from the 256-color palette.
    pub fn fg(&mut self, color: u8) -> &mut Self {
        self.command(SetForegroundColor(Color::AnsiValue(color)))
    }

    /// Select a background color from the 256-color palette.
    pub fn bg(&mut self, color: u8) -> &mut Self {
        self.command(SetBackgroundColor(Color::AnsiValue(color)))
    }

    /// Move the cursor to a 0-based cell. Coordinates beyond the protocol's
    /// range are clamped.
    pub fn goto(&mut self, p: Point) -> &mut Self {
        let x = u16::try_from(p.x).unwrap_or(u16::MAX);
        let y = u16::try_from(p.y).unwrap_or(u16::MAX);
        self.command(cursor::MoveTo(x, y))
    }

    /// Append raw text, which may itself contain escape sequences.
    pub fn write(&mut self, s: &str) -> &mut Self {
        self.buf.push_str(s);
        self
    }

    /// Append `s`, then pad with `fill` until the visible length of `s`
    /// reaches `width`. Text that is already wider is left alone; callers
    /// that need an exact width truncate first.
    pub fn write_fill(&mut self, s: &str, width: usize, fill: char) -> &mut Self {
        let pad = width.saturating_sub(visible_len(s));
        self.buf.push_str(s);
        self.buf.extend(repeat_n(fill, pad));
        self
    }

    /// Truncate the whole buffer to at most `width` visible cells.
    pub fn truncate(&mut self, width: usize) -> &mut Self {
        self.buf = truncate(&self.buf, width);
        self
    }

    /// The visible length of the buffer.
    pub fn visible_len(&self) -> usize {
        visible_len(&self.buf)
    }

    /// The raw buffer contents.
    pub fn as_str(&self) -> &str {
        &self.buf
    }

    /// Is the buffer empty?
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Write the buffer to `out` and flush. Output failures are dropped: the
    /// surface may already be gone while the process tears down.
    pub fn put(&self, out: &mut dyn Write) {
        if let Err(e) = out
            .write_all(self.buf.as_bytes())
            .and_then(|()| out.flush())
        {
            tracing::trace!("discarding output error: {e}");
        }
    }
}

impl fmt::Display for Ansi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.buf)
    }
}

impl From<Ansi> for String {
    fn from(a: Ansi) -> Self {
        a.buf
    }
}

/// A lexical piece of a styled string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Segment<'a> {
    /// A complete (or unterminated trailing) escape sequence.
    Escape(&'a str),
    /// A printable code point and its cell width.
    Char(char, usize),
}

/// Split a styled string into escape sequences and printable characters.
pub(crate) struct Segments<'a> {
    /// The string being scanned.
    s: &'a str,
    /// Byte offset of the next segment.
    pos: usize,
}

impl<'a> Segments<'a> {
    /// Scan `s` from the start.
    pub(crate) fn new(s: &'a str) -> Self {
        Self { s, pos: 0 }
    }

    /// Byte length of the escape sequence starting at `start`, which must
    /// point at an ESC.
    fn escape_len(&self, start: usize) -> usize {
        let rest = &self.s[start + ESC.len_utf8()..];
        let mut chars = rest.char_indices();
        let body = match chars.next() {
            // CSI: parameter and intermediate bytes, then one final byte.
            Some((_, '[')) => chars
                .find(|(_, c)| ('\x40'..='\x7e').contains(c))
                .map(|(i, c)| i + c.len_utf8())
                .unwrap_or(rest.len()),
            // OSC: runs to BEL or ST.
            Some((_, ']')) => {
                let mut end = rest.len();
                let mut prev_esc = false;
                for (i, c) in chars {
                    if c == BEL || (prev_esc && c == '\\') {
                        end = i + c.len_utf8();
                        break;
                    }
                    prev_esc = c == ESC;
                }
                end
            }
            Some((_, c)) => c.len_utf8(),
            None => 0,
        };
        ESC.len_utf8() + body
    }
}

impl<'a> Iterator for Segments<'a> {
    type Item = Segment<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let c = self.s[self.pos..].chars().next()?;
        let start = self.pos;
        if c == ESC {
            self.pos += self.escape_len(start);
            Some(Segment::Escape(&self.s[start..self.pos]))
        } else {
            self.pos += c.len_utf8();
            Some(Segment::Char(c, char_width(c)))
        }
    }
}

/// Cell width of a code point: wide and fullwidth characters take two
/// cells, everything else takes one.
pub fn char_width(c: char) -> usize {
    c.width().unwrap_or(1).clamp(1, 2)
}

/// The number of terminal cells `s` occupies, ignoring escape sequences.
pub fn visible_len(s: &str) -> usize {
    Segments::new(s)
        .map(|seg| match seg {
            Segment::Escape(_) => 0,
            Segment::Char(_, w) => w,
        })
        .sum()
}

/// Remove every escape sequence from `s`.
pub fn strip(s: &str) -> String {
    Segments::new(s)
        .filter_map(|seg| match seg {
            Segment::Escape(_) => None,
            Segment::Char(c, _) => Some(c),
        })
        .collect()
}

/// Truncate `s` to at most `width` visible cells.
///
/// Escape sequences are always kept whole, so styling and trailing resets
/// survive. A wide character that would straddle the limit is dropped, which
/// can leave the result one cell short of `width`.
pub fn truncate(s: &str, width: usize) -> String {
    slice_visible(s, 0, width)
}

/// Extract the visible columns `[start, start + width)` of `s`, keeping every
/// escape sequence so the slice renders with the same styling. Wide
/// characters that straddle either edge are dropped.
pub fn slice_visible(s: &str, start: usize, width: usize) -> String {
    let end = start.saturating_add(width);
    let mut out = String::with_capacity(s.len());
    let mut col = 0usize;
    for seg in Segments::new(s) {
        match seg {
            Segment::Escape(e) => out.push_str(e),
            Segment::Char(c, w) => {
                if col >= start && col + w <= end {
                    out.push(c);
                }
                col += w;
            }
        }
    }
    out
}
