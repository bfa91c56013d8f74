use anyhow::{
    anyhow,
    bail,
    Result,
};
use ruint::aliases::U256;
use rustc_hash::FxHashSet;
use tracing::{
    debug,
    trace,
};

use crate::instruction::Instruction;

const STACK_LIMIT: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HaltReason {
    Stop,
    Return,
    Revert,
    Invalid,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Halt {
    pub reason: HaltReason,
    /// Offset of the instruction that halted execution.
    pub pc: usize,
    /// Bottom of the stack first.
    pub stack: Vec<U256>,
}

/// Executes the control-flow and arithmetic core of assembled bytecode.
///
/// Words are 256 bits wide and arithmetic wraps. Memory, storage and environment access are not
/// modelled and abort emulation.
pub struct Emulator<'code> {
    code: &'code [u8],
    pc: usize,
    stack: Vec<U256>,
    jump_dests: FxHashSet<usize>,
}

impl<'code> Emulator<'code> {
    pub fn new(code: &'code [u8]) -> Self {
        let jump_dests = Self::analyze_jump_dests(code);
        debug!(
            "Initializing emulator for {} bytes with {} jump destinations",
            code.len(),
            jump_dests.len()
        );
        Self {
            code,
            pc: 0,
            stack: Vec::new(),
            jump_dests,
        }
    }

    /// Seeds the stack before running, bottom first.
    pub fn with_stack(mut self, stack: Vec<U256>) -> Self {
        self.stack = stack;
        self
    }

    pub fn run(mut self, step_limit: usize) -> Result<Halt> {
        for _ in 0..step_limit {
            if let Some(reason) = self.step()? {
                debug!("Halted with {reason:?} at {}", self.pc);
                return Ok(Halt {
                    reason,
                    pc: self.pc,
                    stack: self.stack,
                });
            }
        }
        bail!("Step limit of {step_limit} exceeded at {}", self.pc)
    }

    fn step(&mut self) -> Result<Option<HaltReason>> {
        let Some(&byte) = self.code.get(self.pc) else {
            return Ok(Some(HaltReason::Stop));
        };
        let instruction = Instruction::from_opcode(byte)
            .ok_or_else(|| anyhow!("Undefined opcode {byte:#04x} at {}", self.pc))?;
        trace!(stack = ?self.stack, "{:>4}: {instruction}", self.pc);

        if let Some(size) = instruction.push_size() {
            let start = self.pc + 1;
            let value = self
                .code
                .get(start..start + size)
                .and_then(U256::try_from_be_slice)
                .ok_or_else(|| anyhow!("Truncated {instruction} at {}", self.pc))?;
            self.push(value)?;
            self.pc = start + size;
            return Ok(None);
        }
        if let Some(depth) = instruction.dup_depth() {
            let value = self.peek(depth - 1)?;
            self.push(value)?;
            self.pc += 1;
            return Ok(None);
        }
        if let Some(depth) = instruction.swap_depth() {
            let len = self.stack.len();
            if len <= depth {
                return Err(self.underflow(instruction));
            }
            self.stack.swap(len - 1, len - 1 - depth);
            self.pc += 1;
            return Ok(None);
        }

        match instruction {
            Instruction::STOP => return Ok(Some(HaltReason::Stop)),
            Instruction::INVALID => return Ok(Some(HaltReason::Invalid)),
            Instruction::RETURN | Instruction::REVERT => {
                self.pop(instruction)?;
                self.pop(instruction)?;
                let reason = if instruction == Instruction::RETURN {
                    HaltReason::Return
                } else {
                    HaltReason::Revert
                };
                return Ok(Some(reason));
            }
            Instruction::JUMP => {
                let dest = self.pop(instruction)?;
                self.pc = self.jump_target(dest)?;
                return Ok(None);
            }
            Instruction::JUMPI => {
                let dest = self.pop(instruction)?;
                let condition = self.pop(instruction)?;
                if condition.is_zero() {
                    self.pc += 1;
                } else {
                    self.pc = self.jump_target(dest)?;
                }
                return Ok(None);
            }
            Instruction::JUMPDEST => {}
            Instruction::POP => {
                self.pop(instruction)?;
            }
            Instruction::PC => self.push(U256::from(self.pc))?,
            Instruction::CODESIZE => self.push(U256::from(self.code.len()))?,
            Instruction::ISZERO => {
                let value = self.pop(instruction)?;
                self.push(flag(value.is_zero()))?;
            }
            Instruction::NOT => {
                let value = self.pop(instruction)?;
                self.push(!value)?;
            }
            Instruction::ADD
            | Instruction::SUB
            | Instruction::MUL
            | Instruction::LT
            | Instruction::GT
            | Instruction::EQ
            | Instruction::AND
            | Instruction::OR
            | Instruction::XOR => {
                let a = self.pop(instruction)?;
                let b = self.pop(instruction)?;
                let result = match instruction {
                    Instruction::ADD => a.wrapping_add(b),
                    Instruction::SUB => a.wrapping_sub(b),
                    Instruction::MUL => a.wrapping_mul(b),
                    Instruction::LT => flag(a < b),
                    Instruction::GT => flag(a > b),
                    Instruction::EQ => flag(a == b),
                    Instruction::AND => a & b,
                    Instruction::OR => a | b,
                    _ => a ^ b,
                };
                self.push(result)?;
            }
            _ => bail!("{instruction} is not supported by the emulator (at {})", self.pc),
        }
        self.pc += 1;
        Ok(None)
    }

    fn jump_target(&self, dest: U256) -> Result<usize> {
        usize::try_from(dest)
            .ok()
            .filter(|dest| self.jump_dests.contains(dest))
            .ok_or_else(|| anyhow!("Invalid jump destination {dest} from {}", self.pc))
    }

    fn push(&mut self, value: U256) -> Result<()> {
        if self.stack.len() == STACK_LIMIT {
            bail!("Stack overflow at {}", self.pc);
        }
        self.stack.push(value);
        Ok(())
    }

    fn pop(&mut self, instruction: Instruction) -> Result<U256> {
        self.stack.pop().ok_or_else(|| self.underflow(instruction))
    }

    fn peek(&self, depth: usize) -> Result<U256> {
        self.stack
            .len()
            .checked_sub(depth + 1)
            .map(|index| self.stack[index])
            .ok_or_else(|| anyhow!("Stack underflow at {}", self.pc))
    }

    fn underflow(&self, instruction: Instruction) -> anyhow::Error {
        anyhow!("Stack underflow in {instruction} at {}", self.pc)
    }

    fn analyze_jump_dests(code: &[u8]) -> FxHashSet<usize> {
        let mut jump_dests = FxHashSet::default();
        let mut pc = 0;
        while let Some(&byte) = code.get(pc) {
            match Instruction::from_opcode(byte) {
                Some(Instruction::JUMPDEST) => {
                    jump_dests.insert(pc);
                }
                Some(instruction) => pc += instruction.push_size().unwrap_or(0),
                None => {}
            }
            pc += 1;
        }
        jump_dests
    }
}

fn flag(condition: bool) -> U256 {
    if condition {
        U256::from(1)
    } else {
        U256::ZERO
    }
}
