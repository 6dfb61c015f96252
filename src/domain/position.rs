//! Source coordinates.
//!
//! Positions are 1-based lines with 1-based byte columns, the same scheme the
//! cover profile and the lexer report. The range builder may widen a block one
//! column to the left, which is where column 0 comes from.

use std::fmt;

/// A point in a source file. Ordering is line-major.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SourcePos {
    pub line: u32,
    pub col: u32,
}

impl SourcePos {
    pub fn new(line: u32, col: u32) -> Self {
        SourcePos { line, col }
    }
}

impl fmt::Display for SourcePos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

/// A contiguous span of source text. `end` is the position immediately after
/// the span's last character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CodeRange {
    pub start: SourcePos,
    pub end: SourcePos,
}

impl CodeRange {
    pub fn new(start: SourcePos, end: SourcePos) -> Self {
        debug_assert!(start <= end, "range start {} after end {}", start, end);
        CodeRange { start, end }
    }

    /// Marker range for nodes fabricated by the rewriter. Synthetic nodes are
    /// never classified against the uncovered set.
    pub const SYNTHETIC: CodeRange = CodeRange {
        start: SourcePos { line: 0, col: 0 },
        end: SourcePos { line: 0, col: 0 },
    };

    pub fn is_synthetic(&self) -> bool {
        *self == Self::SYNTHETIC
    }
}

impl fmt::Display for CodeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}--{}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_order_is_line_major() {
        assert!(SourcePos::new(1, 99) < SourcePos::new(2, 0));
        assert!(SourcePos::new(3, 4) < SourcePos::new(3, 5));
        assert!(SourcePos::new(3, 5) <= SourcePos::new(3, 5));
        assert!(!(SourcePos::new(2, 0) < SourcePos::new(1, 99)));
    }

    #[test]
    fn test_display_formats() {
        assert_eq!(SourcePos::new(12, 3).to_string(), "12:3");
        let r = CodeRange::new(SourcePos::new(1, 2), SourcePos::new(4, 5));
        assert_eq!(r.to_string(), "1:2--4:5");
    }

    #[test]
    fn test_synthetic_marker() {
        assert!(CodeRange::SYNTHETIC.is_synthetic());
        let r = CodeRange::new(SourcePos::new(1, 1), SourcePos::new(1, 1));
        assert!(!r.is_synthetic());
    }
}
