use std::fmt::{
    Display,
    Formatter,
};

use ruint::aliases::U256;

use crate::{
    instruction::Instruction,
    location::SourceLocation,
};

/// A jump target placeholder, resolved to a code offset by [`crate::Assembly::assemble`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tag(u128);

impl Tag {
    pub const fn new(id: u128) -> Self {
        Self(id)
    }

    /// The numeric payload of the tag.
    pub const fn id(self) -> u128 {
        self.0
    }
}

impl Display for Tag {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "tag_{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, EnumTryAs)]
pub enum ItemKind {
    Operation(Instruction),
    Push(U256),
    /// Definition of a tag at the current position.
    Tag(Tag),
    /// Pushes the code offset of a tag.
    PushTag(Tag),
    /// Pushes the size of the final program.
    PushProgramSize,
    /// Pushes the address of a library, filled in by the linker.
    PushLibraryAddress(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssemblyItem {
    pub kind: ItemKind,
    pub location: SourceLocation,
}

impl AssemblyItem {
    pub fn new(kind: ItemKind, location: SourceLocation) -> Self {
        Self { kind, location }
    }

    /// Change of the stack depth caused by executing this item.
    pub fn deposit(&self) -> i64 {
        match &self.kind {
            ItemKind::Operation(instruction) => instruction.info().stack_effect(),
            ItemKind::Tag(_) => 0,
            ItemKind::Push(_)
            | ItemKind::PushTag(_)
            | ItemKind::PushProgramSize
            | ItemKind::PushLibraryAddress(_) => 1,
        }
    }

    pub fn is_tag_definition(&self) -> bool {
        matches!(self.kind, ItemKind::Tag(_))
    }
}

impl Display for AssemblyItem {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            ItemKind::Operation(instruction) => write!(f, "{instruction}"),
            ItemKind::Push(value) => write!(f, "PUSH 0x{value:x}"),
            ItemKind::Tag(tag) => write!(f, "{tag}:"),
            ItemKind::PushTag(tag) => write!(f, "PUSH [tag] {}", tag.id()),
            ItemKind::PushProgramSize => write!(f, "PUSH #[$]"),
            ItemKind::PushLibraryAddress(symbol) => write!(f, "PUSHLIB \"{symbol}\""),
        }
    }
}
