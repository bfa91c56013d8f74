#![deny(clippy::enum_glob_use)]
#![warn(clippy::pedantic, clippy::nursery)]
#![forbid(unsafe_code)]
#![allow(clippy::too_many_lines)]

//! Assembler for a jump-based stack machine.
//!
//! Code is built as a stream of [`AssemblyItem`]s. Jump targets are [`Tag`]s that can be
//! referenced before they are defined; [`Assembly::assemble`] resolves them into offsets
//! and produces a [`LinkerObject`].

#[macro_use]
extern crate strum;

pub use assembly::Assembly;
pub use instruction::{
    Instruction,
    InstructionInfo,
};
pub use item::{
    AssemblyItem,
    ItemKind,
    Tag,
};
pub use linker::LinkerObject;
pub use location::SourceLocation;
/// A word of the target machine.
pub use ruint::aliases::U256;

pub mod assembly;
pub mod emu;
pub mod instruction;
pub mod item;
pub mod linker;
pub mod location;
