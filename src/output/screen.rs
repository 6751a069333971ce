//! In-place terminal redraw
//!
//! A frame is erased using three ANSI primitives only: cursor up, cursor
//! left and clear line. The erase plan depends on the previous frame's
//! line count and final-line width, never on the new content.

use std::fmt;
use std::io::{self, Write};

const ESC: &str = "\x1b[";

/// Primitive screen operation
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScreenOp {
    CursorUp(usize),
    CursorLeft(usize),
    ClearLine,
    Text(String),
}

impl fmt::Display for ScreenOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScreenOp::CursorUp(n) => write!(f, "{ESC}{n}A"),
            ScreenOp::CursorLeft(n) => write!(f, "{ESC}{n}D"),
            ScreenOp::ClearLine => write!(f, "{ESC}2K"),
            ScreenOp::Text(s) => f.write_str(s),
        }
    }
}

/// Operations that erase `previous` from the screen, cursor ending at its
/// first column
pub fn erase_ops(previous: &str) -> Vec<ScreenOp> {
    if previous.is_empty() {
        return Vec::new();
    }

    let mut lines = previous.split('\n');
    let final_width = lines.next_back().map(|l| l.chars().count()).unwrap_or(0);
    let rows_above = lines.count();

    let mut ops = Vec::with_capacity(2 + rows_above * 2);
    ops.push(ScreenOp::CursorLeft(final_width));
    ops.push(ScreenOp::ClearLine);
    for _ in 0..rows_above {
        ops.push(ScreenOp::CursorUp(1));
        ops.push(ScreenOp::ClearLine);
    }
    ops
}

/// Full redraw plan from `previous` (if any) to `next`
pub fn redraw_ops(previous: Option<&str>, next: &str) -> Vec<ScreenOp> {
    let mut ops = previous.map(erase_ops).unwrap_or_default();
    ops.push(ScreenOp::Text(next.to_string()));
    ops
}

/// Writer that replaces what it last displayed on every call
pub struct ScreenWriter<W: Write> {
    writer: W,
    previous: Option<String>,
}

impl<W: Write> ScreenWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            previous: None,
        }
    }

    /// Erase the previous frame and draw `text` in its place
    pub fn display(&mut self, text: &str) -> io::Result<()> {
        for op in redraw_ops(self.previous.as_deref(), text) {
            write!(self.writer, "{op}")?;
        }
        self.writer.flush()?;
        self.previous = Some(text.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(frames: &[&str]) -> String {
        let mut out = Vec::new();
        let mut screen = ScreenWriter::new(&mut out);
        for frame in frames {
            screen.display(frame).unwrap();
        }
        drop(screen);
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_display_once() {
        assert_eq!(render(&["xyz"]), "xyz");
    }

    #[test]
    fn test_display_twice() {
        assert_eq!(render(&["xyz", "abc"]), "xyz\x1b[3D\x1b[2Kabc");
    }

    #[test]
    fn test_display_twice_with_newlines() {
        assert_eq!(
            render(&["xyz\nXYZ\n", "abc\nABC\n"]),
            "xyz\nXYZ\n\x1b[0D\x1b[2K\x1b[1A\x1b[2K\x1b[1A\x1b[2Kabc\nABC\n"
        );
    }

    #[test]
    fn test_shrinking_frame_erases_all_previous_lines() {
        let ops = redraw_ops(Some("one\ntwo\nthree"), "x");
        assert_eq!(
            ops,
            vec![
                ScreenOp::CursorLeft(5),
                ScreenOp::ClearLine,
                ScreenOp::CursorUp(1),
                ScreenOp::ClearLine,
                ScreenOp::CursorUp(1),
                ScreenOp::ClearLine,
                ScreenOp::Text("x".to_string()),
            ]
        );
    }

    #[test]
    fn test_erase_depends_on_shape_only() {
        assert_eq!(erase_ops("abc\nde"), erase_ops("xyz\nqr"));
        assert_eq!(
            redraw_ops(Some("a\nb\n"), "a\nb\n"),
            redraw_ops(Some("x\ny\n"), "a\nb\n")
        );
    }

    #[test]
    fn test_final_line_width_counts_characters() {
        assert_eq!(erase_ops("héllo")[0], ScreenOp::CursorLeft(5));
    }

    #[test]
    fn test_empty_previous_frame() {
        assert!(erase_ops("").is_empty());
        assert_eq!(render(&["", "abc"]), "abc");
    }
}
