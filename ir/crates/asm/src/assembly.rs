use std::fmt::{
    Display,
    Formatter,
};

use fxindexmap::FxIndexMap;
use ruint::aliases::U256;
use tracing::trace;

use crate::{
    instruction::Instruction,
    item::{
        AssemblyItem,
        ItemKind,
        Tag,
    },
    location::SourceLocation,
};

/// An instruction stream under construction.
///
/// The assembly owns the tag space of the unit and the tracked stack depth ("deposit").
/// Tags may be referenced before they are defined; offsets are only resolved by
/// [`Assembly::assemble`].
#[derive(Debug, Clone)]
pub struct Assembly {
    items: Vec<AssemblyItem>,
    deposit: i64,
    /// `None` once every tag payload has been handed out.
    next_tag: Option<u128>,
    named_tags: FxIndexMap<String, Tag>,
    current_location: SourceLocation,
}

impl Default for Assembly {
    fn default() -> Self {
        Self::new()
    }
}

impl Assembly {
    pub fn new() -> Self {
        Self::starting_at_tag(1)
    }

    /// Creates an assembly whose first allocated tag is `first`.
    ///
    /// Used when a unit continues the tag numbering of previously emitted units.
    pub fn starting_at_tag(first: u128) -> Self {
        Self {
            items: Vec::new(),
            deposit: 0,
            next_tag: Some(first),
            named_tags: fxindexmap::new_map(),
            current_location: SourceLocation::empty(),
        }
    }

    pub fn set_source_location(&mut self, location: SourceLocation) {
        self.current_location = location;
    }

    pub fn source_location(&self) -> &SourceLocation {
        &self.current_location
    }

    pub const fn deposit(&self) -> i64 {
        self.deposit
    }

    pub fn adjust_deposit(&mut self, diff: i64) {
        self.deposit += diff;
        trace!("Adjusted deposit by {diff} to {}", self.deposit);
    }

    pub fn set_deposit(&mut self, deposit: i64) {
        self.deposit = deposit;
        trace!("Set deposit to {deposit}");
    }

    pub fn append_instruction(&mut self, instruction: Instruction) {
        self.append(ItemKind::Operation(instruction));
    }

    pub fn append_constant(&mut self, value: U256) {
        self.append(ItemKind::Push(value));
    }

    pub fn append_tag(&mut self, tag: Tag) {
        self.append(ItemKind::Tag(tag));
    }

    pub fn append_push_tag(&mut self, tag: Tag) {
        self.append(ItemKind::PushTag(tag));
    }

    pub fn append_library_address(&mut self, symbol: impl Into<String>) {
        self.append(ItemKind::PushLibraryAddress(symbol.into()));
    }

    pub fn append_program_size(&mut self) {
        self.append(ItemKind::PushProgramSize);
    }

    /// Allocates a tag that has not been handed out before in this unit.
    ///
    /// Returns `None` when the tag space is exhausted.
    pub fn new_tag(&mut self) -> Option<Tag> {
        let id = self.next_tag?;
        self.next_tag = id.checked_add(1);
        let tag = Tag::new(id);
        trace!("Allocated {tag}");
        Some(tag)
    }

    /// Returns the tag bound to `name`, allocating it on first use.
    pub fn named_tag(&mut self, name: &str) -> Option<Tag> {
        if let Some(tag) = self.named_tags.get(name) {
            return Some(*tag);
        }
        let tag = self.new_tag()?;
        self.named_tags.insert(name.to_string(), tag);
        Some(tag)
    }

    pub fn named_tags(&self) -> impl Iterator<Item = (&str, Tag)> {
        self.named_tags.iter().map(|(name, tag)| (name.as_str(), *tag))
    }

    pub fn items(&self) -> &[AssemblyItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn append(&mut self, kind: ItemKind) {
        let item = AssemblyItem::new(kind, self.current_location.clone());
        self.deposit += item.deposit();
        trace!(deposit = self.deposit, "Appended {item}");
        self.items.push(item);
    }
}

impl Display for Assembly {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for item in &self.items {
            if item.is_tag_definition() {
                writeln!(f, "{item}")?;
            } else {
                writeln!(f, "    {item}")?;
            }
        }
        Ok(())
    }
}
