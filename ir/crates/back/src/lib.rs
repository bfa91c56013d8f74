#![deny(clippy::enum_glob_use)]
#![warn(clippy::pedantic, clippy::nursery)]
#![forbid(unsafe_code)]
#![allow(clippy::too_many_lines)]

//! Backend side of code generation: the [`AbstractAssembly`] contract a code generator
//! emits through, and its implementation for the jump-based stack machine of
//! [`evmgen_asm`].

pub use codegen::{
    machine::{
        AbstractAssembly,
        AssemblyError,
        LabelId,
        SubroutineOp,
    },
    targets::evm::EthAssemblyAdapter,
    CodeGenerator,
    CodeTransform,
};

pub mod codegen;
