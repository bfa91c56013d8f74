use std::fmt::Formatter;

use strum_macros::{
    Display,
    IntoStaticStr,
};

/// Subroutine primitives a backend may lack.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Display, IntoStaticStr)]
pub enum SubroutineOp {
    #[strum(serialize = "BEGINSUB")]
    BeginSub,
    #[strum(serialize = "JUMPSUB")]
    JumpSub,
    #[strum(serialize = "RETURNSUB")]
    ReturnSub,
}

impl SubroutineOp {
    pub fn name(self) -> &'static str {
        self.into()
    }
}

/// Reasons a backend refuses to continue emitting a unit.
///
/// None of these are diagnostics about the program being compiled: the same input may be
/// fine for another backend. The unit has to be abandoned.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum AssemblyError {
    Unsupported {
        op: SubroutineOp,
        target: &'static str,
    },
    /// The assembler handed out a tag that does not fit into a [`super::LabelId`].
    TagIdTooLarge {
        tag: u128,
    },
}

impl AssemblyError {
    pub const fn is_fatal(&self) -> bool {
        match self {
            Self::Unsupported { .. } | Self::TagIdTooLarge { .. } => true,
        }
    }
}

impl std::fmt::Display for AssemblyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unsupported { op, target } => write!(f, "{op} not implemented for {target}"),
            Self::TagIdTooLarge { tag } => write!(f, "tag id too large: {tag}"),
        }
    }
}

impl std::error::Error for AssemblyError {}
