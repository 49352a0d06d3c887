//! The Owl-2820 dispatcher: decode a single instruction word and invoke
//! the matching [`InstructionVisitor`] method with its operands.
//!
//! This is deliberately the only place that knows the mapping from
//! `Opcode` to visitor method; the executor, assembler, and disassembler
//! never see a raw word directly.

use crate::opcode::{decode, Opcode};
use crate::visitor::InstructionVisitor;

/// Decode `word` and call the matching method on `visitor`.
pub fn dispatch<V: InstructionVisitor>(visitor: &mut V, word: u32) -> V::Output {
    let op = decode::opcode(word);
    let r0 = decode::r0(word);
    let r1 = decode::r1(word);
    let r2 = decode::r2(word);

    match op {
        Opcode::Illegal => visitor.illegal(word),
        Opcode::Ecall => visitor.ecall(),
        Opcode::Ebreak => visitor.ebreak(),
        Opcode::Fence => visitor.fence(),

        Opcode::Add => visitor.add(r0, r1, r2),
        Opcode::Sub => visitor.sub(r0, r1, r2),
        Opcode::Sll => visitor.sll(r0, r1, r2),
        Opcode::Slt => visitor.slt(r0, r1, r2),
        Opcode::Sltu => visitor.sltu(r0, r1, r2),
        Opcode::Xor => visitor.xor(r0, r1, r2),
        Opcode::Srl => visitor.srl(r0, r1, r2),
        Opcode::Sra => visitor.sra(r0, r1, r2),
        Opcode::Or => visitor.or(r0, r1, r2),
        Opcode::And => visitor.and(r0, r1, r2),

        Opcode::Slli => visitor.slli(r0, r1, decode::shift(word)),
        Opcode::Srli => visitor.srli(r0, r1, decode::shift(word)),
        Opcode::Srai => visitor.srai(r0, r1, decode::shift(word)),

        Opcode::Beq => visitor.beq(r0, r1, decode::offs12(word)),
        Opcode::Bne => visitor.bne(r0, r1, decode::offs12(word)),
        Opcode::Blt => visitor.blt(r0, r1, decode::offs12(word)),
        Opcode::Bge => visitor.bge(r0, r1, decode::offs12(word)),
        Opcode::Bltu => visitor.bltu(r0, r1, decode::offs12(word)),
        Opcode::Bgeu => visitor.bgeu(r0, r1, decode::offs12(word)),

        Opcode::Addi => visitor.addi(r0, r1, decode::imm12(word)),
        Opcode::Slti => visitor.slti(r0, r1, decode::imm12(word)),
        Opcode::Sltiu => visitor.sltiu(r0, r1, decode::imm12(word)),
        Opcode::Xori => visitor.xori(r0, r1, decode::imm12(word)),
        Opcode::Ori => visitor.ori(r0, r1, decode::imm12(word)),
        Opcode::Andi => visitor.andi(r0, r1, decode::imm12(word)),

        Opcode::Lb => visitor.lb(r0, decode::imm12(word), r1),
        Opcode::Lbu => visitor.lbu(r0, decode::imm12(word), r1),
        Opcode::Lh => visitor.lh(r0, decode::imm12(word), r1),
        Opcode::Lhu => visitor.lhu(r0, decode::imm12(word), r1),
        Opcode::Lw => visitor.lw(r0, decode::imm12(word), r1),

        Opcode::Sb => visitor.sb(r0, decode::imm12(word), r1),
        Opcode::Sh => visitor.sh(r0, decode::imm12(word), r1),
        Opcode::Sw => visitor.sw(r0, decode::imm12(word), r1),

        Opcode::Jalr => visitor.jalr(r0, decode::offs12(word), r1),
        Opcode::Jal => visitor.jal(r0, decode::offs20(word)),

        Opcode::Lui => visitor.lui(r0, decode::uimm20(word)),
        Opcode::Auipc => visitor.auipc(r0, decode::uimm20(word)),

        Opcode::J => visitor.j(decode::offs20(word)),
        Opcode::Call => visitor.call(decode::offs20(word)),
        Opcode::Ret => visitor.ret(),
        Opcode::Li => visitor.li(r0, decode::imm12(word)),
        Opcode::Mv => visitor.mv(r0, r1),
    }
}
