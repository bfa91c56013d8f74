use evmgen_asm::{
    Assembly,
    Instruction,
    SourceLocation,
    Tag,
    U256,
};
use tracing::{
    debug,
    error,
};

use crate::codegen::machine::{
    AbstractAssembly,
    AssemblyError,
    LabelId,
    SubroutineOp,
};

pub const TARGET_NAME: &str = "EVM 1.0";

/// Translates abstract assembly requests into items of one [`Assembly`].
///
/// The target only knows `JUMP` and `JUMPI`; subroutine primitives are refused.
/// Labels are the numeric payloads of the assembly's tags, so the adapter itself
/// keeps no state besides the assembly it is bound to.
pub struct EthAssemblyAdapter<'a> {
    assembly: &'a mut Assembly,
}

impl<'a> EthAssemblyAdapter<'a> {
    pub fn new(assembly: &'a mut Assembly) -> Self {
        Self { assembly }
    }

    pub fn assembly(&self) -> &Assembly {
        self.assembly
    }

    fn label_for(tag: Option<Tag>) -> Result<LabelId, AssemblyError> {
        // An exhausted tag space means the next payload would exceed every bound.
        let tag = tag.ok_or(AssemblyError::TagIdTooLarge { tag: u128::MAX })?;
        LabelId::try_from_tag(tag)
    }

    fn unsupported(op: SubroutineOp) -> Result<(), AssemblyError> {
        error!("Refusing {op}: {TARGET_NAME} has no subroutine instructions");
        Err(AssemblyError::Unsupported {
            op,
            target: TARGET_NAME,
        })
    }
}

impl AbstractAssembly for EthAssemblyAdapter<'_> {
    fn set_source_location(&mut self, location: SourceLocation) {
        self.assembly.set_source_location(location);
    }

    fn stack_height(&self) -> i64 {
        self.assembly.deposit()
    }

    fn append_instruction(&mut self, instruction: Instruction) {
        self.assembly.append_instruction(instruction);
    }

    fn append_constant(&mut self, constant: U256) {
        self.assembly.append_constant(constant);
    }

    fn append_label(&mut self, label: LabelId) {
        self.assembly.append_tag(label.as_tag());
    }

    fn append_label_reference(&mut self, label: LabelId) {
        self.assembly.append_push_tag(label.as_tag());
    }

    fn new_label_id(&mut self) -> Result<LabelId, AssemblyError> {
        let label = Self::label_for(self.assembly.new_tag())?;
        debug!("Created {label}");
        Ok(label)
    }

    fn named_label(&mut self, name: &str) -> Result<LabelId, AssemblyError> {
        let label = Self::label_for(self.assembly.named_tag(name))?;
        debug!("Resolved label name {name} to {label}");
        Ok(label)
    }

    fn append_linker_symbol(&mut self, symbol: &str) {
        self.assembly.append_library_address(symbol);
    }

    fn append_jump(&mut self, stack_height_after: i64) {
        self.append_instruction(Instruction::JUMP);
        self.assembly.set_deposit(stack_height_after);
        debug!("Jump leaves stack height at {stack_height_after}");
    }

    fn append_jump_to_if(&mut self, label: LabelId) {
        self.append_label_reference(label);
        self.append_instruction(Instruction::JUMPI);
    }

    fn append_beginsub(&mut self, _label: LabelId, _arguments: usize) -> Result<(), AssemblyError> {
        Self::unsupported(SubroutineOp::BeginSub)
    }

    fn append_jumpsub(
        &mut self,
        _label: LabelId,
        _arguments: usize,
        _returns: usize,
    ) -> Result<(), AssemblyError> {
        Self::unsupported(SubroutineOp::JumpSub)
    }

    fn append_returnsub(
        &mut self,
        _returns: usize,
        _stack_diff_after: i64,
    ) -> Result<(), AssemblyError> {
        Self::unsupported(SubroutineOp::ReturnSub)
    }

    fn append_assembly_size(&mut self) {
        self.assembly.append_program_size();
    }
}

#[cfg(test)]
mod tests {
    use evmgen_asm::ItemKind;
    use tracing_test::traced_test;

    use super::*;

    fn kinds(assembly: &Assembly) -> Vec<ItemKind> {
        assembly.items().iter().map(|item| item.kind.clone()).collect()
    }

    #[test]
    fn should_forward_instructions_and_constants() {
        let mut assembly = Assembly::new();
        let mut adapter = EthAssemblyAdapter::new(&mut assembly);
        adapter.append_constant(U256::from(5));
        adapter.append_constant(U256::from(6));
        adapter.append_instruction(Instruction::MUL);
        assert_eq!(adapter.stack_height(), 1);
        assert_eq!(
            kinds(adapter.assembly()),
            vec![
                ItemKind::Push(U256::from(5)),
                ItemKind::Push(U256::from(6)),
                ItemKind::Operation(Instruction::MUL),
            ]
        );
    }

    #[test]
    fn should_hand_out_unique_labels() {
        let mut assembly = Assembly::new();
        let mut adapter = EthAssemblyAdapter::new(&mut assembly);
        let mut labels = Vec::new();
        for _ in 0..8 {
            labels.push(adapter.new_label_id().unwrap());
        }
        labels.push(adapter.named_label("main").unwrap());
        labels.push(adapter.named_label("exit").unwrap());
        let mut deduplicated = labels.clone();
        deduplicated.sort();
        deduplicated.dedup();
        assert_eq!(deduplicated.len(), labels.len());
    }

    #[test]
    fn should_return_same_label_for_same_name() {
        let mut assembly = Assembly::new();
        let mut adapter = EthAssemblyAdapter::new(&mut assembly);
        let first = adapter.named_label("loop").unwrap();
        adapter.new_label_id().unwrap();
        let second = adapter.named_label("loop").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn should_bind_labels_to_tags_with_equal_payload() {
        let mut assembly = Assembly::new();
        let mut adapter = EthAssemblyAdapter::new(&mut assembly);
        let label = adapter.new_label_id().unwrap();
        adapter.append_label_reference(label);
        adapter.append_label(label);
        let tag = Tag::new(label.index() as u128);
        assert_eq!(
            kinds(adapter.assembly()),
            vec![ItemKind::PushTag(tag), ItemKind::Tag(tag)]
        );
    }

    #[test]
    fn should_reject_tags_that_do_not_fit_a_label() {
        let mut assembly = Assembly::starting_at_tag(u128::from(u32::MAX));
        let mut adapter = EthAssemblyAdapter::new(&mut assembly);
        assert_eq!(
            adapter.new_label_id(),
            Err(AssemblyError::TagIdTooLarge {
                tag: u128::from(u32::MAX)
            })
        );
        assert_eq!(
            adapter.named_label("late"),
            Err(AssemblyError::TagIdTooLarge {
                tag: u128::from(u32::MAX) + 1
            })
        );
    }

    #[test]
    fn should_reject_labels_once_tag_space_is_exhausted() {
        let mut assembly = Assembly::starting_at_tag(u128::MAX);
        let mut adapter = EthAssemblyAdapter::new(&mut assembly);
        for _ in 0..2 {
            assert_eq!(
                adapter.new_label_id(),
                Err(AssemblyError::TagIdTooLarge { tag: u128::MAX })
            );
        }
        assert_eq!(
            adapter.named_label("late"),
            Err(AssemblyError::TagIdTooLarge { tag: u128::MAX })
        );
        assert!(adapter.assembly().is_empty());
    }

    #[test]
    fn should_force_stack_height_after_jump() {
        for before in [0, 3, 17] {
            let mut assembly = Assembly::new();
            let mut adapter = EthAssemblyAdapter::new(&mut assembly);
            for value in 0..before {
                adapter.append_constant(U256::from(value));
            }
            let label = adapter.new_label_id().unwrap();
            adapter.append_jump_to(label, 2);
            assert_eq!(adapter.stack_height(), 2);
            adapter.append_constant(U256::ZERO);
            adapter.append_jump(-1);
            assert_eq!(adapter.stack_height(), -1);
        }
    }

    #[test]
    fn should_push_label_before_jump() {
        let mut assembly = Assembly::new();
        let mut adapter = EthAssemblyAdapter::new(&mut assembly);
        let label = adapter.new_label_id().unwrap();
        adapter.append_jump_to(label, 0);
        assert_eq!(
            kinds(adapter.assembly()),
            vec![
                ItemKind::PushTag(label.as_tag()),
                ItemKind::Operation(Instruction::JUMP),
            ]
        );
    }

    #[test]
    fn should_consume_only_condition_on_conditional_jump() {
        let mut assembly = Assembly::new();
        let mut adapter = EthAssemblyAdapter::new(&mut assembly);
        adapter.append_constant(U256::from(10));
        adapter.append_constant(U256::from(1));
        let label = adapter.new_label_id().unwrap();
        adapter.append_jump_to_if(label);
        assert_eq!(adapter.stack_height(), 1);
        assert_eq!(
            kinds(adapter.assembly())[2..],
            [
                ItemKind::PushTag(label.as_tag()),
                ItemKind::Operation(Instruction::JUMPI),
            ]
        );
    }

    #[test]
    #[traced_test]
    fn should_refuse_subroutines_without_side_effects() {
        let mut assembly = Assembly::new();
        let mut adapter = EthAssemblyAdapter::new(&mut assembly);
        let label = LabelId::new(1);
        assert_eq!(
            adapter.append_beginsub(label, 0),
            Err(AssemblyError::Unsupported {
                op: SubroutineOp::BeginSub,
                target: TARGET_NAME,
            })
        );
        assert_eq!(
            adapter.append_jumpsub(label, 2, 1),
            Err(AssemblyError::Unsupported {
                op: SubroutineOp::JumpSub,
                target: TARGET_NAME,
            })
        );
        assert_eq!(
            adapter.append_returnsub(1, 0),
            Err(AssemblyError::Unsupported {
                op: SubroutineOp::ReturnSub,
                target: TARGET_NAME,
            })
        );
        assert!(adapter.assembly().is_empty());
        assert_eq!(adapter.stack_height(), 0);
        assert!(logs_contain("Refusing BEGINSUB"));
    }

    #[test]
    fn should_forward_placeholders_and_locations() {
        let mut assembly = Assembly::new();
        let mut adapter = EthAssemblyAdapter::new(&mut assembly);
        let location = SourceLocation::new("lib.yul", 10, 20);
        adapter.set_source_location(location.clone());
        adapter.append_linker_symbol("SafeMath");
        adapter.append_assembly_size();
        assert_eq!(adapter.stack_height(), 2);
        let items = adapter.assembly().items();
        assert_eq!(items[0].kind, ItemKind::PushLibraryAddress("SafeMath".into()));
        assert_eq!(items[1].kind, ItemKind::PushProgramSize);
        assert!(items.iter().all(|item| item.location == location));
    }

    #[test]
    fn should_be_usable_as_trait_object() {
        let mut assembly = Assembly::new();
        let mut adapter = EthAssemblyAdapter::new(&mut assembly);
        let backend: &mut dyn AbstractAssembly = &mut adapter;
        backend.append_constant(U256::from(1));
        assert_eq!(backend.stack_height(), 1);
    }
}
