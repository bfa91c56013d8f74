pub use asm::AbstractAssembly;
pub use error::{
    AssemblyError,
    SubroutineOp,
};
use evmgen_asm::Tag;

pub mod asm;
pub mod error;

index_vec::define_index_type! {
    /// Backend-scoped identifier of a jump target.
    pub struct LabelId = u32;

    MAX_INDEX = LabelId::MAX_RAW as usize;
    DISPLAY_FORMAT = "label{}";
}

impl LabelId {
    /// Largest raw value a label may hold. `u32::MAX` is never handed out.
    pub const MAX_RAW: u32 = u32::MAX - 1;

    /// Converts the numeric payload of an assembler tag into a label.
    pub fn try_from_tag(tag: Tag) -> Result<Self, AssemblyError> {
        if tag.id() > u128::from(Self::MAX_RAW) {
            return Err(AssemblyError::TagIdTooLarge { tag: tag.id() });
        }
        Ok(Self::new(tag.id() as usize))
    }

    pub fn as_tag(self) -> Tag {
        Tag::new(self.index() as u128)
    }
}
