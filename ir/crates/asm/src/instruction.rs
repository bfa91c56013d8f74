use strum::VariantArray;

/// Opcodes of the target stack machine.
///
/// The discriminant of every variant is its encoded byte.
#[allow(clippy::upper_case_acronyms)]
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr, VariantArray)]
pub enum Instruction {
    STOP = 0x00,
    ADD = 0x01,
    MUL = 0x02,
    SUB = 0x03,
    DIV = 0x04,
    SDIV = 0x05,
    MOD = 0x06,
    SMOD = 0x07,
    ADDMOD = 0x08,
    MULMOD = 0x09,
    EXP = 0x0a,
    SIGNEXTEND = 0x0b,

    LT = 0x10,
    GT = 0x11,
    SLT = 0x12,
    SGT = 0x13,
    EQ = 0x14,
    ISZERO = 0x15,
    AND = 0x16,
    OR = 0x17,
    XOR = 0x18,
    NOT = 0x19,
    BYTE = 0x1a,
    SHL = 0x1b,
    SHR = 0x1c,
    SAR = 0x1d,

    KECCAK256 = 0x20,

    ADDRESS = 0x30,
    BALANCE = 0x31,
    ORIGIN = 0x32,
    CALLER = 0x33,
    CALLVALUE = 0x34,
    CALLDATALOAD = 0x35,
    CALLDATASIZE = 0x36,
    CALLDATACOPY = 0x37,
    CODESIZE = 0x38,
    CODECOPY = 0x39,
    GASPRICE = 0x3a,
    RETURNDATASIZE = 0x3d,
    RETURNDATACOPY = 0x3e,

    BLOCKHASH = 0x40,
    COINBASE = 0x41,
    TIMESTAMP = 0x42,
    NUMBER = 0x43,

    POP = 0x50,
    MLOAD = 0x51,
    MSTORE = 0x52,
    MSTORE8 = 0x53,
    SLOAD = 0x54,
    SSTORE = 0x55,
    JUMP = 0x56,
    JUMPI = 0x57,
    PC = 0x58,
    MSIZE = 0x59,
    GAS = 0x5a,
    JUMPDEST = 0x5b,

    PUSH1 = 0x60,
    PUSH2,
    PUSH3,
    PUSH4,
    PUSH5,
    PUSH6,
    PUSH7,
    PUSH8,
    PUSH9,
    PUSH10,
    PUSH11,
    PUSH12,
    PUSH13,
    PUSH14,
    PUSH15,
    PUSH16,
    PUSH17,
    PUSH18,
    PUSH19,
    PUSH20,
    PUSH21,
    PUSH22,
    PUSH23,
    PUSH24,
    PUSH25,
    PUSH26,
    PUSH27,
    PUSH28,
    PUSH29,
    PUSH30,
    PUSH31,
    PUSH32,

    DUP1 = 0x80,
    DUP2,
    DUP3,
    DUP4,
    DUP5,
    DUP6,
    DUP7,
    DUP8,
    DUP9,
    DUP10,
    DUP11,
    DUP12,
    DUP13,
    DUP14,
    DUP15,
    DUP16,

    SWAP1 = 0x90,
    SWAP2,
    SWAP3,
    SWAP4,
    SWAP5,
    SWAP6,
    SWAP7,
    SWAP8,
    SWAP9,
    SWAP10,
    SWAP11,
    SWAP12,
    SWAP13,
    SWAP14,
    SWAP15,
    SWAP16,

    LOG0 = 0xa0,
    LOG1,
    LOG2,
    LOG3,
    LOG4,

    CREATE = 0xf0,
    CALL = 0xf1,
    RETURN = 0xf3,
    DELEGATECALL = 0xf4,
    STATICCALL = 0xfa,
    REVERT = 0xfd,
    INVALID = 0xfe,
    SELFDESTRUCT = 0xff,
}

/// How many words an instruction pops and pushes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstructionInfo {
    pub args: u8,
    pub rets: u8,
}

impl InstructionInfo {
    const fn new(args: u8, rets: u8) -> Self {
        Self { args, rets }
    }

    /// Net change of the stack depth.
    pub const fn stack_effect(self) -> i64 {
        self.rets as i64 - self.args as i64
    }
}

const PUSH_BASE: u8 = 0x5f;
const DUP_BASE: u8 = 0x7f;
const SWAP_BASE: u8 = 0x8f;
const LOG_BASE: u8 = 0xa0;

impl Instruction {
    pub const fn opcode(self) -> u8 {
        self as u8
    }

    pub fn from_opcode(opcode: u8) -> Option<Self> {
        Self::VARIANTS
            .iter()
            .copied()
            .find(|instruction| instruction.opcode() == opcode)
    }

    pub fn name(self) -> &'static str {
        self.into()
    }

    /// `PUSH<bytes>`, for `bytes` in `1..=32`.
    pub fn push(bytes: usize) -> Option<Self> {
        match bytes {
            1..=32 => Self::from_opcode(PUSH_BASE + bytes as u8),
            _ => None,
        }
    }

    /// `DUP<depth>`, for `depth` in `1..=16`.
    pub fn dup(depth: usize) -> Option<Self> {
        match depth {
            1..=16 => Self::from_opcode(DUP_BASE + depth as u8),
            _ => None,
        }
    }

    /// `SWAP<depth>`, for `depth` in `1..=16`.
    pub fn swap(depth: usize) -> Option<Self> {
        match depth {
            1..=16 => Self::from_opcode(SWAP_BASE + depth as u8),
            _ => None,
        }
    }

    /// Number of immediate bytes following a `PUSHn` opcode.
    pub const fn push_size(self) -> Option<usize> {
        match self.opcode() {
            op @ 0x60..=0x7f => Some((op - PUSH_BASE) as usize),
            _ => None,
        }
    }

    pub const fn dup_depth(self) -> Option<usize> {
        match self.opcode() {
            op @ 0x80..=0x8f => Some((op - DUP_BASE) as usize),
            _ => None,
        }
    }

    pub const fn swap_depth(self) -> Option<usize> {
        match self.opcode() {
            op @ 0x90..=0x9f => Some((op - SWAP_BASE) as usize),
            _ => None,
        }
    }

    pub fn info(self) -> InstructionInfo {
        if self.push_size().is_some() {
            return InstructionInfo::new(0, 1);
        }
        if let Some(depth) = self.dup_depth() {
            return InstructionInfo::new(depth as u8, depth as u8 + 1);
        }
        if let Some(depth) = self.swap_depth() {
            return InstructionInfo::new(depth as u8 + 1, depth as u8 + 1);
        }
        if let op @ 0xa0..=0xa4 = self.opcode() {
            return InstructionInfo::new(op - LOG_BASE + 2, 0);
        }
        match self {
            Self::STOP | Self::JUMPDEST | Self::INVALID => InstructionInfo::new(0, 0),
            Self::ADD
            | Self::MUL
            | Self::SUB
            | Self::DIV
            | Self::SDIV
            | Self::MOD
            | Self::SMOD
            | Self::EXP
            | Self::SIGNEXTEND
            | Self::LT
            | Self::GT
            | Self::SLT
            | Self::SGT
            | Self::EQ
            | Self::AND
            | Self::OR
            | Self::XOR
            | Self::BYTE
            | Self::SHL
            | Self::SHR
            | Self::SAR
            | Self::KECCAK256 => InstructionInfo::new(2, 1),
            Self::ADDMOD | Self::MULMOD | Self::CREATE => InstructionInfo::new(3, 1),
            Self::ISZERO
            | Self::NOT
            | Self::BALANCE
            | Self::CALLDATALOAD
            | Self::BLOCKHASH
            | Self::MLOAD
            | Self::SLOAD => InstructionInfo::new(1, 1),
            Self::ADDRESS
            | Self::ORIGIN
            | Self::CALLER
            | Self::CALLVALUE
            | Self::CALLDATASIZE
            | Self::CODESIZE
            | Self::GASPRICE
            | Self::RETURNDATASIZE
            | Self::COINBASE
            | Self::TIMESTAMP
            | Self::NUMBER
            | Self::PC
            | Self::MSIZE
            | Self::GAS => InstructionInfo::new(0, 1),
            Self::CALLDATACOPY | Self::CODECOPY | Self::RETURNDATACOPY => {
                InstructionInfo::new(3, 0)
            }
            Self::POP | Self::JUMP | Self::SELFDESTRUCT => InstructionInfo::new(1, 0),
            Self::MSTORE
            | Self::MSTORE8
            | Self::SSTORE
            | Self::JUMPI
            | Self::RETURN
            | Self::REVERT => InstructionInfo::new(2, 0),
            Self::CALL => InstructionInfo::new(7, 1),
            Self::DELEGATECALL | Self::STATICCALL => InstructionInfo::new(6, 1),
            _ => unreachable!("{self} belongs to a stack family handled above"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn should_number_families_sequentially() {
        assert_eq!(Instruction::PUSH32.opcode(), 0x7f);
        assert_eq!(Instruction::DUP16.opcode(), 0x8f);
        assert_eq!(Instruction::SWAP16.opcode(), 0x9f);
        assert_eq!(Instruction::LOG4.opcode(), 0xa4);
    }

    #[test]
    fn should_build_family_members() {
        assert_eq!(Instruction::push(1), Some(Instruction::PUSH1));
        assert_eq!(Instruction::push(20), Some(Instruction::PUSH20));
        assert_eq!(Instruction::push(0), None);
        assert_eq!(Instruction::push(33), None);
        assert_eq!(Instruction::dup(3), Some(Instruction::DUP3));
        assert_eq!(Instruction::swap(16), Some(Instruction::SWAP16));
        assert_eq!(Instruction::swap(17), None);
    }

    #[test]
    fn should_decode_known_opcodes_only() {
        assert_eq!(Instruction::from_opcode(0x56), Some(Instruction::JUMP));
        assert_eq!(Instruction::from_opcode(0x5b), Some(Instruction::JUMPDEST));
        assert_eq!(Instruction::from_opcode(0x0c), None);
    }

    #[test]
    fn should_report_stack_effects() {
        assert_eq!(Instruction::ADD.info().stack_effect(), -1);
        assert_eq!(Instruction::JUMP.info().stack_effect(), -1);
        assert_eq!(Instruction::JUMPI.info().stack_effect(), -2);
        assert_eq!(Instruction::PUSH4.info().stack_effect(), 1);
        assert_eq!(Instruction::DUP2.info(), InstructionInfo { args: 2, rets: 3 });
        assert_eq!(Instruction::SWAP1.info(), InstructionInfo { args: 2, rets: 2 });
        assert_eq!(Instruction::LOG2.info(), InstructionInfo { args: 4, rets: 0 });
        assert_eq!(Instruction::STOP.info().stack_effect(), 0);
    }

    #[test]
    fn should_describe_every_opcode() {
        for instruction in Instruction::VARIANTS {
            let info = instruction.info();
            assert!(info.args <= 17, "{instruction} pops {}", info.args);
            assert!(info.rets <= 17, "{instruction} pushes {}", info.rets);
        }
    }

    #[test]
    fn should_round_trip_names() {
        assert_eq!(Instruction::CALLDATALOAD.to_string(), "CALLDATALOAD");
        assert_eq!(Instruction::from_str("JUMPI").ok(), Some(Instruction::JUMPI));
        assert_eq!(Instruction::SWAP3.name(), "SWAP3");
    }
}
