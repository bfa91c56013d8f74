use anyhow::Result;
use evmgen_asm::{
    Assembly,
    LinkerObject,
};
use tracing::debug;

use crate::codegen::{
    machine::{
        AbstractAssembly,
        AssemblyError,
    },
    targets::evm::EthAssemblyAdapter,
};

pub mod machine;
pub mod targets;

/// A code generator that walks its input and emits it through an [`AbstractAssembly`].
pub trait CodeTransform {
    fn transform(&mut self, assembly: &mut dyn AbstractAssembly) -> Result<(), AssemblyError>;
}

pub struct CodeGenerator;

impl CodeGenerator {
    /// Runs `transform` against an adapter bound to `assembly`.
    ///
    /// The first error aborts the unit; whatever was appended before it must not be used.
    pub fn assemble(
        assembly: &mut Assembly,
        transform: &mut impl CodeTransform,
    ) -> Result<(), AssemblyError> {
        Self::assemble_with(assembly, |adapter| transform.transform(adapter))
    }

    pub fn assemble_with<F>(assembly: &mut Assembly, transform: F) -> Result<(), AssemblyError>
    where
        F: FnOnce(&mut dyn AbstractAssembly) -> Result<(), AssemblyError>,
    {
        let mut adapter = EthAssemblyAdapter::new(assembly);
        transform(&mut adapter)?;
        debug!(
            "Emitted {} items, final stack height {}",
            adapter.assembly().len(),
            adapter.stack_height()
        );
        Ok(())
    }

    /// Emits into a fresh [`Assembly`] and resolves it.
    pub fn assemble_fresh<F>(transform: F) -> Result<LinkerObject>
    where
        F: FnOnce(&mut dyn AbstractAssembly) -> Result<(), AssemblyError>,
    {
        let mut assembly = Assembly::new();
        Self::assemble_with(&mut assembly, transform)?;
        assembly.assemble()
    }
}
