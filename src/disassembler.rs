//! The Owl-2820 disassembler: implements [`InstructionVisitor`] by
//! formatting decoded operands as a human-readable mnemonic line, with the
//! register aliasing and peephole prettifications a reader expects.

use crate::registers::abi_name;
use crate::visitor::InstructionVisitor;

/// Formats decoded instructions as text. Stateless; one instance can be
/// reused across an entire program.
#[derive(Debug, Default)]
pub struct Disassembler;

impl Disassembler {
    pub fn new() -> Self {
        Self
    }
}

fn reg(index: u8) -> &'static str {
    abi_name(index)
}

impl InstructionVisitor for Disassembler {
    type Output = String;

    fn illegal(&mut self, raw_word: u32) -> String {
        format!("illegal 0x{raw_word:08x}")
    }
    fn ecall(&mut self) -> String {
        "ecall".into()
    }
    fn ebreak(&mut self) -> String {
        "ebreak".into()
    }
    fn fence(&mut self) -> String {
        "fence".into()
    }

    fn add(&mut self, r0: u8, r1: u8, r2: u8) -> String {
        format!("add {}, {}, {}", reg(r0), reg(r1), reg(r2))
    }
    fn sub(&mut self, r0: u8, r1: u8, r2: u8) -> String {
        format!("sub {}, {}, {}", reg(r0), reg(r1), reg(r2))
    }
    fn sll(&mut self, r0: u8, r1: u8, r2: u8) -> String {
        format!("sll {}, {}, {}", reg(r0), reg(r1), reg(r2))
    }
    fn slt(&mut self, r0: u8, r1: u8, r2: u8) -> String {
        format!("slt {}, {}, {}", reg(r0), reg(r1), reg(r2))
    }
    fn sltu(&mut self, r0: u8, r1: u8, r2: u8) -> String {
        format!("sltu {}, {}, {}", reg(r0), reg(r1), reg(r2))
    }
    fn xor(&mut self, r0: u8, r1: u8, r2: u8) -> String {
        format!("xor {}, {}, {}", reg(r0), reg(r1), reg(r2))
    }
    fn srl(&mut self, r0: u8, r1: u8, r2: u8) -> String {
        format!("srl {}, {}, {}", reg(r0), reg(r1), reg(r2))
    }
    fn sra(&mut self, r0: u8, r1: u8, r2: u8) -> String {
        format!("sra {}, {}, {}", reg(r0), reg(r1), reg(r2))
    }
    fn or(&mut self, r0: u8, r1: u8, r2: u8) -> String {
        format!("or {}, {}, {}", reg(r0), reg(r1), reg(r2))
    }
    fn and(&mut self, r0: u8, r1: u8, r2: u8) -> String {
        format!("and {}, {}, {}", reg(r0), reg(r1), reg(r2))
    }

    fn slli(&mut self, r0: u8, r1: u8, shift: u8) -> String {
        format!("slli {}, {}, {}", reg(r0), reg(r1), shift)
    }
    fn srli(&mut self, r0: u8, r1: u8, shift: u8) -> String {
        format!("srli {}, {}, {}", reg(r0), reg(r1), shift)
    }
    fn srai(&mut self, r0: u8, r1: u8, shift: u8) -> String {
        format!("srai {}, {}, {}", reg(r0), reg(r1), shift)
    }

    fn beq(&mut self, r0: u8, r1: u8, offs12: i32) -> String {
        format!("beq {}, {}, {}", reg(r0), reg(r1), offs12)
    }
    fn bne(&mut self, r0: u8, r1: u8, offs12: i32) -> String {
        format!("bne {}, {}, {}", reg(r0), reg(r1), offs12)
    }
    fn blt(&mut self, r0: u8, r1: u8, offs12: i32) -> String {
        format!("blt {}, {}, {}", reg(r0), reg(r1), offs12)
    }
    fn bge(&mut self, r0: u8, r1: u8, offs12: i32) -> String {
        format!("bge {}, {}, {}", reg(r0), reg(r1), offs12)
    }
    fn bltu(&mut self, r0: u8, r1: u8, offs12: i32) -> String {
        format!("bltu {}, {}, {}", reg(r0), reg(r1), offs12)
    }
    fn bgeu(&mut self, r0: u8, r1: u8, offs12: i32) -> String {
        format!("bgeu {}, {}, {}", reg(r0), reg(r1), offs12)
    }

    /// `addi(rd, zero, imm)` prettifies to `li rd, imm`; `addi(rd, src, 0)`
    /// prettifies to `mv rd, src`.
    fn addi(&mut self, r0: u8, r1: u8, imm12: i32) -> String {
        if r1 == 0 {
            return format!("li {}, {}", reg(r0), imm12);
        }
        if imm12 == 0 {
            return format!("mv {}, {}", reg(r0), reg(r1));
        }
        format!("addi {}, {}, {}", reg(r0), reg(r1), imm12)
    }
    fn slti(&mut self, r0: u8, r1: u8, imm12: i32) -> String {
        format!("slti {}, {}, {}", reg(r0), reg(r1), imm12)
    }
    fn sltiu(&mut self, r0: u8, r1: u8, imm12: i32) -> String {
        format!("sltiu {}, {}, {}", reg(r0), reg(r1), imm12)
    }
    fn xori(&mut self, r0: u8, r1: u8, imm12: i32) -> String {
        format!("xori {}, {}, {}", reg(r0), reg(r1), imm12)
    }
    fn ori(&mut self, r0: u8, r1: u8, imm12: i32) -> String {
        format!("ori {}, {}, {}", reg(r0), reg(r1), imm12)
    }
    fn andi(&mut self, r0: u8, r1: u8, imm12: i32) -> String {
        format!("andi {}, {}, {}", reg(r0), reg(r1), imm12)
    }

    fn lb(&mut self, r0: u8, imm12: i32, r1: u8) -> String {
        format!("lb {}, {}({})", reg(r0), imm12, reg(r1))
    }
    fn lbu(&mut self, r0: u8, imm12: i32, r1: u8) -> String {
        format!("lbu {}, {}({})", reg(r0), imm12, reg(r1))
    }
    fn lh(&mut self, r0: u8, imm12: i32, r1: u8) -> String {
        format!("lh {}, {}({})", reg(r0), imm12, reg(r1))
    }
    fn lhu(&mut self, r0: u8, imm12: i32, r1: u8) -> String {
        format!("lhu {}, {}({})", reg(r0), imm12, reg(r1))
    }
    fn lw(&mut self, r0: u8, imm12: i32, r1: u8) -> String {
        format!("lw {}, {}({})", reg(r0), imm12, reg(r1))
    }

    fn sb(&mut self, r0: u8, imm12: i32, r1: u8) -> String {
        format!("sb {}, {}({})", reg(r0), imm12, reg(r1))
    }
    fn sh(&mut self, r0: u8, imm12: i32, r1: u8) -> String {
        format!("sh {}, {}({})", reg(r0), imm12, reg(r1))
    }
    fn sw(&mut self, r0: u8, imm12: i32, r1: u8) -> String {
        format!("sw {}, {}({})", reg(r0), imm12, reg(r1))
    }

    /// `jalr(zero, 0, ra)` prettifies to `ret`.
    fn jalr(&mut self, r0: u8, offs12: i32, r1: u8) -> String {
        if r0 == 0 && offs12 == 0 && r1 == crate::registers::RA {
            return "ret".into();
        }
        format!("jalr {}, {}({})", reg(r0), offs12, reg(r1))
    }
    fn jal(&mut self, r0: u8, offs20: i32) -> String {
        format!("jal {}, {}", reg(r0), offs20)
    }

    fn lui(&mut self, r0: u8, uimm20: u32) -> String {
        format!("lui {}, 0x{:x}", reg(r0), uimm20 >> 12)
    }
    fn auipc(&mut self, r0: u8, uimm20: u32) -> String {
        format!("auipc {}, 0x{:x}", reg(r0), uimm20 >> 12)
    }

    fn j(&mut self, offs20: i32) -> String {
        format!("j {offs20}")
    }
    fn call(&mut self, offs20: i32) -> String {
        format!("call {offs20}")
    }
    fn ret(&mut self) -> String {
        "ret".into()
    }
    fn li(&mut self, r0: u8, imm12: i32) -> String {
        format!("li {}, {}", reg(r0), imm12)
    }
    fn mv(&mut self, r0: u8, r1: u8) -> String {
        format!("mv {}, {}", reg(r0), reg(r1))
    }
}
