use std::fmt::Write;

use anyhow::{
    anyhow,
    bail,
    Result,
};
use fxindexmap::FxIndexMap;
use ruint::aliases::U256;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use tracing::debug;

use crate::{
    assembly::Assembly,
    instruction::Instruction,
    item::{
        ItemKind,
        Tag,
    },
    location::SourceLocation,
};

pub const LIBRARY_ADDRESS_SIZE: usize = 20;

/// Assembled bytecode whose library addresses may still be unlinked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkerObject {
    pub bytecode: Vec<u8>,
    /// Offsets of `PUSH20` placeholders and the symbol each one stands for.
    pub link_references: FxIndexMap<usize, String>,
    tag_positions: FxHashMap<Tag, usize>,
}

impl LinkerObject {
    /// Code offset of the `JUMPDEST` a tag was resolved to.
    pub fn position_of(&self, tag: Tag) -> Option<usize> {
        self.tag_positions.get(&tag).copied()
    }

    /// Fills every placeholder of `symbol` with `address`. Returns how many were filled.
    pub fn link(&mut self, symbol: &str, address: [u8; LIBRARY_ADDRESS_SIZE]) -> usize {
        let offsets = self
            .link_references
            .iter()
            .filter(|(_, referenced)| referenced.as_str() == symbol)
            .map(|(offset, _)| *offset)
            .collect::<Vec<_>>();
        for offset in &offsets {
            let start = offset + 1;
            self.bytecode[start..start + LIBRARY_ADDRESS_SIZE].copy_from_slice(&address);
            self.link_references.shift_remove(offset);
        }
        debug!("Linked {} reference(s) to {symbol}", offsets.len());
        offsets.len()
    }

    pub fn is_fully_linked(&self) -> bool {
        self.link_references.is_empty()
    }

    pub fn to_hex(&self) -> String {
        let mut hex = String::with_capacity(self.bytecode.len() * 2);
        for byte in &self.bytecode {
            let _ = write!(hex, "{byte:02x}");
        }
        hex
    }
}

/// Minimal number of big-endian bytes needed to encode `value`; zero takes one byte.
pub fn bytes_required(value: U256) -> usize {
    value.bit_len().div_ceil(8).max(1)
}

fn encode_be(value: U256, width: usize) -> SmallVec<[u8; 32]> {
    let bytes = value.to_be_bytes::<32>();
    SmallVec::from_slice(&bytes[bytes.len() - width..])
}

fn located(location: &SourceLocation) -> String {
    if location.is_empty() {
        String::new()
    } else {
        format!(" (at {location})")
    }
}

struct Layout {
    tag_positions: FxHashMap<Tag, usize>,
    size: usize,
}

impl Assembly {
    /// Resolves tags to code offsets and encodes the item stream.
    ///
    /// Tag and program-size pushes share one immediate width, grown until every
    /// resolved value fits.
    pub fn assemble(&self) -> Result<LinkerObject> {
        self.check_tags()?;
        let mut width = 1;
        let layout = loop {
            let layout = self.layout(width);
            let largest = layout
                .tag_positions
                .values()
                .copied()
                .max()
                .unwrap_or(0)
                .max(layout.size);
            if bytes_required(U256::from(largest)) <= width {
                break layout;
            }
            width += 1;
            if width > 32 {
                bail!("Program too large to address with a 32 byte push");
            }
        };
        debug!(
            "Laid out {} items into {} bytes with {width} byte tag pushes",
            self.len(),
            layout.size
        );

        let tag_push = Instruction::push(width)
            .ok_or_else(|| anyhow!("No push instruction for {width} bytes"))?;
        let mut bytecode = Vec::with_capacity(layout.size);
        let mut link_references = fxindexmap::new_map();
        for item in self.items() {
            match &item.kind {
                ItemKind::Operation(instruction) => bytecode.push(instruction.opcode()),
                ItemKind::Push(value) => {
                    let size = bytes_required(*value);
                    let push = Instruction::push(size)
                        .ok_or_else(|| anyhow!("No push instruction for {size} bytes"))?;
                    bytecode.push(push.opcode());
                    bytecode.extend(encode_be(*value, size));
                }
                ItemKind::Tag(_) => bytecode.push(Instruction::JUMPDEST.opcode()),
                ItemKind::PushTag(tag) => {
                    let position = layout
                        .tag_positions
                        .get(tag)
                        .copied()
                        .ok_or_else(|| anyhow!("{tag} referenced but never defined"))?;
                    bytecode.push(tag_push.opcode());
                    bytecode.extend(encode_be(U256::from(position), width));
                }
                ItemKind::PushProgramSize => {
                    bytecode.push(tag_push.opcode());
                    bytecode.extend(encode_be(U256::from(layout.size), width));
                }
                ItemKind::PushLibraryAddress(symbol) => {
                    link_references.insert(bytecode.len(), symbol.clone());
                    bytecode.push(Instruction::PUSH20.opcode());
                    bytecode.extend([0; LIBRARY_ADDRESS_SIZE]);
                }
            }
        }
        debug_assert_eq!(bytecode.len(), layout.size);
        Ok(LinkerObject {
            bytecode,
            link_references,
            tag_positions: layout.tag_positions,
        })
    }

    fn check_tags(&self) -> Result<()> {
        let mut defined = fxindexmap::new_set();
        for item in self.items() {
            if let ItemKind::Tag(tag) = &item.kind {
                if !defined.insert(*tag) {
                    bail!("{tag} defined more than once{}", located(&item.location));
                }
            }
        }
        for item in self.items() {
            if let ItemKind::PushTag(tag) = &item.kind {
                if !defined.contains(tag) {
                    bail!("{tag} referenced but never defined{}", located(&item.location));
                }
            }
        }
        Ok(())
    }

    fn layout(&self, tag_width: usize) -> Layout {
        let mut tag_positions = FxHashMap::default();
        let mut offset = 0;
        for item in self.items() {
            offset += match &item.kind {
                ItemKind::Operation(_) => 1,
                ItemKind::Push(value) => 1 + bytes_required(*value),
                ItemKind::Tag(tag) => {
                    tag_positions.insert(*tag, offset);
                    1
                }
                ItemKind::PushTag(_) | ItemKind::PushProgramSize => 1 + tag_width,
                ItemKind::PushLibraryAddress(_) => 1 + LIBRARY_ADDRESS_SIZE,
            };
        }
        Layout {
            tag_positions,
            size: offset,
        }
    }
}
