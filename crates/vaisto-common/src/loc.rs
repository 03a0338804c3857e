//! Source locations.
//!
//! All positions tracked by the parser and elaborator are byte offsets into
//! the original source text. Line/column information is computed on demand
//! via [`LineIndex`] only when a diagnostic actually needs to be rendered.

use serde::Serialize;

/// Byte-offset span into source text. Start is inclusive, end is exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Loc {
    pub start: u32,
    pub end: u32,
}

impl Loc {
    pub fn new(start: u32, end: u32) -> Self {
        debug_assert!(start <= end, "loc start ({start}) must be <= end ({end})");
        Self { start, end }
    }

    /// A zero-length location at `offset`, used for synthetic nodes.
    pub fn at(offset: u32) -> Self {
        Self { start: offset, end: offset }
    }

    pub fn len(&self) -> u32 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Merge two locations into one that covers both.
    pub fn merge(self, other: Loc) -> Loc {
        Loc {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

/// Pre-computed index of line start positions for on-demand line/column lookup.
#[derive(Debug)]
pub struct LineIndex {
    /// Byte offset of the start of each line. The first entry is always 0.
    line_starts: Vec<u32>,
}

impl LineIndex {
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0u32];
        for (i, byte) in source.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push((i + 1) as u32);
            }
        }
        Self { line_starts }
    }

    /// Convert a byte offset to a 1-based (line, column) pair.
    pub fn line_col(&self, offset: u32) -> (u32, u32) {
        let line_idx = self.line_starts.partition_point(|&start| start <= offset);
        let line_idx = line_idx.saturating_sub(1);
        let line = (line_idx as u32) + 1;
        let col = offset - self.line_starts[line_idx] + 1;
        (line, col)
    }

    /// The source line (without trailing newline) containing `offset`.
    pub fn line_text<'a>(&self, source: &'a str, offset: u32) -> &'a str {
        let line_idx = self.line_starts.partition_point(|&start| start <= offset);
        let line_idx = line_idx.saturating_sub(1);
        let start = self.line_starts[line_idx] as usize;
        let end = self
            .line_starts
            .get(line_idx + 1)
            .map(|&s| s as usize - 1)
            .unwrap_or(source.len());
        source.get(start..end.max(start)).unwrap_or("")
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loc_new_and_len() {
        let loc = Loc::new(5, 10);
        assert_eq!(loc.len(), 5);
        assert!(!loc.is_empty());
    }

    #[test]
    fn loc_merge() {
        let a = Loc::new(5, 10);
        let b = Loc::new(8, 15);
        assert_eq!(a.merge(b), Loc::new(5, 15));
    }

    #[test]
    fn line_index_multiple_lines() {
        let src = "hello\nworld\nfoo";
        let idx = LineIndex::new(src);
        assert_eq!(idx.line_col(0), (1, 1));
        assert_eq!(idx.line_col(6), (2, 1));
        assert_eq!(idx.line_col(13), (3, 2));
    }

    #[test]
    fn line_text_extracts_offending_line() {
        let src = "let x = 1\nlet y = x + z\n";
        let idx = LineIndex::new(src);
        assert_eq!(idx.line_text(src, 15), "let y = x + z");
    }
}
