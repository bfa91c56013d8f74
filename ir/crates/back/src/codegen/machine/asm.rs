use evmgen_asm::{
    Instruction,
    SourceLocation,
    U256,
};

use crate::codegen::machine::{
    AssemblyError,
    LabelId,
};

/// Everything a code generator may ask of a backend.
///
/// Labels are handed out by the backend and may be referenced before they are appended;
/// resolving them to offsets is left to the backend's assembler. Stack heights are the
/// number of words pushed since the start of the current code region, as tracked by the
/// backend.
pub trait AbstractAssembly {
    /// Annotates all subsequently appended instructions with `location`.
    fn set_source_location(&mut self, location: SourceLocation);

    fn stack_height(&self) -> i64;

    fn append_instruction(&mut self, instruction: Instruction);

    /// Pushes a single word.
    fn append_constant(&mut self, constant: U256);

    /// Marks the current position as the target of `label`.
    fn append_label(&mut self, label: LabelId);

    /// Pushes the position of `label`, which may not have been appended yet.
    fn append_label_reference(&mut self, label: LabelId);

    fn new_label_id(&mut self) -> Result<LabelId, AssemblyError>;

    /// Returns the same label for the same name within one unit.
    fn named_label(&mut self, name: &str) -> Result<LabelId, AssemblyError>;

    /// Pushes a placeholder resolved to the address of `symbol` when linking.
    fn append_linker_symbol(&mut self, symbol: &str);

    /// Jumps to the position on top of the stack.
    ///
    /// Control does not fall through, so the stack height afterwards cannot be derived
    /// from the jump and is set to `stack_height_after` instead.
    fn append_jump(&mut self, stack_height_after: i64);

    fn append_jump_to(&mut self, label: LabelId, stack_height_after: i64) {
        self.append_label_reference(label);
        self.append_jump(stack_height_after);
    }

    /// Jumps to `label` if the word on top of the stack is non-zero, consuming it.
    fn append_jump_to_if(&mut self, label: LabelId);

    fn append_beginsub(&mut self, label: LabelId, arguments: usize) -> Result<(), AssemblyError>;

    fn append_jumpsub(
        &mut self,
        label: LabelId,
        arguments: usize,
        returns: usize,
    ) -> Result<(), AssemblyError>;

    fn append_returnsub(
        &mut self,
        returns: usize,
        stack_diff_after: i64,
    ) -> Result<(), AssemblyError>;

    /// Pushes the size of the final program.
    fn append_assembly_size(&mut self);
}
