//! RV32I decoder and dispatcher.
//!
//! Decodes the canonical 32-bit RISC-V base-integer encoding and invokes
//! the matching [`InstructionVisitor`] method, renaming operands onto the
//! Owl-2820 `(r0, r1, r2)` convention as described in the module-level
//! operand mapping below. A visitor driving this dispatcher can therefore
//! be reused unchanged between the Owl dispatcher ([`crate::owl`]) and
//! this one: either execute RV32I directly, or assemble it into Owl-2820
//! (transcoding) by pointing the same decoded operands at
//! [`crate::assembler::Assembler`].
//!
//! Dispatch proceeds in the layered order the RV32I encoding is designed
//! for: the 7-bit opcode selects an instruction family, then `funct3`
//! (and, for register-register and immediate-shift forms, `funct7`/bit
//! 30) selects the exact mnemonic within that family. `ecall`/`ebreak`
//! share the `SYSTEM` opcode and are distinguished by the whole I-type
//! immediate field. Anything that doesn't match a known combination
//! invokes `illegal`.
//!
//! Operand renaming: RV32I `(rs1, rs2)` become the visitor's `(r0, r1)`
//! for branches; RV32I `(rd, rs1, rs2)` become `(r0, r1, r2)` for
//! register-register ops; RV32I `(rd, imm, rs1)` become `(r0, imm12, r1)`
//! for loads and `jalr`; RV32I store `(rs1=base, imm, rs2=source)`
//! becomes `(r0=source, imm12, r1=base)` — the same store semantics
//! ("store `r0` at `r1 + imm12`") under a renamed operand tuple.

use crate::visitor::InstructionVisitor;

const OP_LOAD: u32 = 0b0000011;
const OP_MISC_MEM: u32 = 0b0001111;
const OP_IMM: u32 = 0b0010011;
const OP_AUIPC: u32 = 0b0010111;
const OP_STORE: u32 = 0b0100011;
const OP: u32 = 0b0110011;
const OP_LUI: u32 = 0b0110111;
const OP_BRANCH: u32 = 0b1100011;
const OP_JALR: u32 = 0b1100111;
const OP_JAL: u32 = 0b1101111;
const OP_SYSTEM: u32 = 0b1110011;

fn opcode(word: u32) -> u32 {
    word & 0x7f
}

fn funct3(word: u32) -> u32 {
    (word >> 12) & 0x7
}

fn funct7(word: u32) -> u32 {
    (word >> 25) & 0x7f
}

fn rd(word: u32) -> u8 {
    ((word >> 7) & 0x1f) as u8
}

fn rs1(word: u32) -> u8 {
    ((word >> 15) & 0x1f) as u8
}

fn rs2(word: u32) -> u8 {
    ((word >> 20) & 0x1f) as u8
}

fn shamt(word: u32) -> u8 {
    ((word >> 20) & 0x1f) as u8
}

/// I-type immediate: sign-extended `word[31:20]`.
fn imm_itype(word: u32) -> i32 {
    (word as i32) >> 20
}

/// S-type immediate: `word[31:25] || word[11:7]`, sign-extended.
fn imm_stype(word: u32) -> i32 {
    let hi = (word >> 25) & 0x7f;
    let lo = (word >> 7) & 0x1f;
    let unsigned = (hi << 5) | lo;
    sign_extend(unsigned, 11)
}

/// B-type immediate: `sign(31) || 7 || 30:25 || 11:8 || 0`, sign-extended.
fn imm_btype(word: u32) -> i32 {
    let bit12 = (word >> 31) & 0x1;
    let bit11 = (word >> 7) & 0x1;
    let bits10_5 = (word >> 25) & 0x3f;
    let bits4_1 = (word >> 8) & 0xf;
    let unsigned = (bit12 << 12) | (bit11 << 11) | (bits10_5 << 5) | (bits4_1 << 1);
    sign_extend(unsigned, 12)
}

/// J-type immediate: `sign(31) || 19:12 || 11=20 || 10:1=30:21 || 0`, sign-extended.
fn imm_jtype(word: u32) -> i32 {
    let bit20 = (word >> 31) & 0x1;
    let bits19_12 = (word >> 12) & 0xff;
    let bit11 = (word >> 20) & 0x1;
    let bits10_1 = (word >> 21) & 0x3ff;
    let unsigned = (bit20 << 20) | (bits19_12 << 12) | (bit11 << 11) | (bits10_1 << 1);
    sign_extend(unsigned, 20)
}

/// U-type immediate: `word[31:12]` placed back at `[31:12]`.
fn imm_utype(word: u32) -> u32 {
    word & 0xffff_f000
}

fn sign_extend(value: u32, sign_bit: u32) -> i32 {
    let shift = 31 - sign_bit;
    (((value << shift) as i32) >> shift) as i32
}

/// Decode `word` as an RV32I instruction and call the matching method on
/// `visitor`. Falls through to `illegal` for any unrecognized encoding.
pub fn dispatch<V: InstructionVisitor>(visitor: &mut V, word: u32) -> V::Output {
    match opcode(word) {
        OP_SYSTEM if funct3(word) == 0 => match imm_itype(word) {
            0 => visitor.ecall(),
            1 => visitor.ebreak(),
            _ => visitor.illegal(word),
        },

        OP => {
            let (r0, r1, r2) = (rd(word), rs1(word), rs2(word));
            match (funct3(word), funct7(word)) {
                (0b000, 0b0000000) => visitor.add(r0, r1, r2),
                (0b000, 0b0100000) => visitor.sub(r0, r1, r2),
                (0b001, 0b0000000) => visitor.sll(r0, r1, r2),
                (0b010, 0b0000000) => visitor.slt(r0, r1, r2),
                (0b011, 0b0000000) => visitor.sltu(r0, r1, r2),
                (0b100, 0b0000000) => visitor.xor(r0, r1, r2),
                (0b101, 0b0000000) => visitor.srl(r0, r1, r2),
                (0b101, 0b0100000) => visitor.sra(r0, r1, r2),
                (0b110, 0b0000000) => visitor.or(r0, r1, r2),
                (0b111, 0b0000000) => visitor.and(r0, r1, r2),
                _ => visitor.illegal(word),
            }
        }

        OP_IMM => {
            let (r0, r1) = (rd(word), rs1(word));
            match funct3(word) {
                0b000 => visitor.addi(r0, r1, imm_itype(word)),
                0b010 => visitor.slti(r0, r1, imm_itype(word)),
                0b011 => visitor.sltiu(r0, r1, imm_itype(word)),
                0b100 => visitor.xori(r0, r1, imm_itype(word)),
                0b110 => visitor.ori(r0, r1, imm_itype(word)),
                0b111 => visitor.andi(r0, r1, imm_itype(word)),
                0b001 if funct7(word) == 0b0000000 => visitor.slli(r0, r1, shamt(word)),
                0b101 if funct7(word) == 0b0000000 => visitor.srli(r0, r1, shamt(word)),
                0b101 if funct7(word) == 0b0100000 => visitor.srai(r0, r1, shamt(word)),
                _ => visitor.illegal(word),
            }
        }

        OP_BRANCH => {
            let (r0, r1, offset) = (rs1(word), rs2(word), imm_btype(word));
            match funct3(word) {
                0b000 => visitor.beq(r0, r1, offset),
                0b001 => visitor.bne(r0, r1, offset),
                0b100 => visitor.blt(r0, r1, offset),
                0b101 => visitor.bge(r0, r1, offset),
                0b110 => visitor.bltu(r0, r1, offset),
                0b111 => visitor.bgeu(r0, r1, offset),
                _ => visitor.illegal(word),
            }
        }

        OP_LOAD => {
            let (r0, r1, offset) = (rd(word), rs1(word), imm_itype(word));
            match funct3(word) {
                0b000 => visitor.lb(r0, offset, r1),
                0b001 => visitor.lh(r0, offset, r1),
                0b010 => visitor.lw(r0, offset, r1),
                0b100 => visitor.lbu(r0, offset, r1),
                0b101 => visitor.lhu(r0, offset, r1),
                _ => visitor.illegal(word),
            }
        }

        OP_STORE => {
            let (source, base, offset) = (rs2(word), rs1(word), imm_stype(word));
            match funct3(word) {
                0b000 => visitor.sb(source, offset, base),
                0b001 => visitor.sh(source, offset, base),
                0b010 => visitor.sw(source, offset, base),
                _ => visitor.illegal(word),
            }
        }

        OP_JALR if funct3(word) == 0 => visitor.jalr(rd(word), imm_itype(word), rs1(word)),
        OP_JAL => visitor.jal(rd(word), imm_jtype(word)),
        OP_LUI => visitor.lui(rd(word), imm_utype(word)),
        OP_AUIPC => visitor.auipc(rd(word), imm_utype(word)),
        OP_MISC_MEM => visitor.fence(),

        _ => visitor.illegal(word),
    }
}
