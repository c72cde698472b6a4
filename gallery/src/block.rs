use std::fmt;
use std::ops::Range;

/// The two kinds of segment a gallery script is split into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    /// Python source, emitted verbatim.
    Code,
    /// reStructuredText prose, from the module docstring or `#` comments.
    Text,
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockKind::Code => write!(f, "code"),
            BlockKind::Text => write!(f, "text"),
        }
    }
}

/// One segment of a gallery script.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub kind: BlockKind,
    /// Block body. For text blocks the comment markers are already stripped.
    pub content: String,
    /// 1-based source line the block starts on.
    pub line: usize,
    /// Byte span in source for error reporting.
    pub span: Range<usize>,
}

impl Block {
    pub fn code(content: impl Into<String>, line: usize, span: Range<usize>) -> Self {
        Block {
            kind: BlockKind::Code,
            content: content.into(),
            line,
            span,
        }
    }

    pub fn text(content: impl Into<String>, line: usize, span: Range<usize>) -> Self {
        Block {
            kind: BlockKind::Text,
            content: content.into(),
            line,
            span,
        }
    }

    pub fn is_code(&self) -> bool {
        self.kind == BlockKind::Code
    }
}
