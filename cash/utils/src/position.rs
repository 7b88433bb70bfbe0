//! Source locations attached to IR nodes.
use crate::Id;
use std::fmt;

/// The place in the host program that created a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct SrcLoc {
    pub file: Id,
    pub line: u32,
    pub col: u32,
}

impl SrcLoc {
    pub fn new<S: Into<Id>>(file: S, line: u32, col: u32) -> Self {
        SrcLoc {
            file: file.into(),
            line,
            col,
        }
    }

    /// Location of the caller. Functions that forward to this should be
    /// `#[track_caller]` themselves so the user's call site is recorded.
    #[track_caller]
    pub fn caller() -> Self {
        let loc = std::panic::Location::caller();
        SrcLoc::new(loc.file(), loc.line(), loc.column())
    }

    pub fn unknown() -> Self {
        SrcLoc::default()
    }

    pub fn is_unknown(&self) -> bool {
        self.file.is_empty()
    }
}

impl fmt::Display for SrcLoc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unknown() {
            f.write_str("<unknown>")
        } else {
            write!(f, "{}:{}:{}", self.file, self.line, self.col)
        }
    }
}
