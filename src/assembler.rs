//! The Owl-2820 assembler: implements [`InstructionVisitor`] by encoding
//! and appending words to a growable buffer, with a two-pass label/fixup
//! mechanism for forward references.
//!
//! A caller emits instructions in program order via the visitor methods,
//! interleaving `make_label`/`bind_label` calls as needed. Labels may be
//! referenced before they are bound (forward branches, forward calls); the
//! assembler records a [`Fixup`] at the reference site and patches it in
//! place once the label binds. [`Assembler::code`] fails if any label is
//! still unbound when the caller asks for the final buffer.

use std::collections::HashMap;

use thiserror::Error;

use crate::opcode::{encode, Opcode};
use crate::visitor::InstructionVisitor;

/// Sentinel address for an unbound label, matching the Owl-2820 "bad
/// address" convention.
const UNBOUND: u32 = u32::MAX;

/// An opaque label handle returned by [`Assembler::make_label`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Label(u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FixupKind {
    Offs12,
    Offs20,
    Hi20,
    Lo12,
}

#[derive(Debug, Clone, Copy)]
struct Fixup {
    target_address: u32,
    kind: FixupKind,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum AssemblerError {
    #[error("label {0:?} has unresolved fixups at code() time")]
    UnboundLabel(Label),
}

#[derive(Debug, Default)]
pub struct Assembler {
    buffer: Vec<u8>,
    labels: Vec<u32>,
    fixups: HashMap<u32, Vec<Fixup>>,
}

impl Assembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a new unbound label.
    pub fn make_label(&mut self) -> Label {
        let id = self.labels.len() as u32;
        self.labels.push(UNBOUND);
        Label(id)
    }

    fn label_address(&self, label: Label) -> u32 {
        self.labels[label.0 as usize]
    }

    fn is_bound(&self, label: Label) -> bool {
        self.label_address(label) != UNBOUND
    }

    /// The current byte offset, always a multiple of 4.
    pub fn current(&self) -> u32 {
        self.buffer.len() as u32
    }

    /// Bind `label` to the current byte offset and resolve every fixup
    /// recorded against it.
    pub fn bind_label(&mut self, label: Label) {
        let address = self.current();
        self.labels[label.0 as usize] = address;
        if let Some(pending) = self.fixups.remove(&label.0) {
            for fixup in pending {
                self.resolve(fixup, address);
            }
        }
    }

    fn resolve(&mut self, fixup: Fixup, label_address: u32) {
        let at = fixup.target_address as usize;
        let mut word = u32::from_le_bytes(self.buffer[at..at + 4].try_into().unwrap());
        match fixup.kind {
            FixupKind::Offs12 => {
                let offset = label_address.wrapping_sub(fixup.target_address) as i32;
                word &= !0xfff0_0000;
                word |= encode::offs12(offset);
            }
            FixupKind::Offs20 => {
                let offset = label_address.wrapping_sub(fixup.target_address) as i32;
                word &= !0xffff_f000;
                word |= encode::offs20(offset);
            }
            FixupKind::Hi20 => {
                word &= !0xffff_f000;
                word |= encode::uimm20(label_address >> 12);
            }
            FixupKind::Lo12 => {
                word &= !0xfff0_0000;
                word |= encode::imm12((label_address & 0xfff) as i32);
            }
        }
        self.buffer[at..at + 4].copy_from_slice(&word.to_le_bytes());
    }

    /// Top 20 bits of `label`'s eventual address, shifted down by 12, ready
    /// to feed into `lui`. Records a `Hi20` fixup (and returns 0) if `label`
    /// is not yet bound.
    pub fn hi(&mut self, label: Label) -> u32 {
        if self.is_bound(label) {
            return self.label_address(label) >> 12;
        }
        self.record_fixup(label, FixupKind::Hi20);
        0
    }

    /// Bottom 12 bits of `label`'s eventual address, ready to feed into an
    /// instruction completing an absolute address. Records a `Lo12` fixup
    /// (and returns 0) if `label` is not yet bound.
    pub fn lo(&mut self, label: Label) -> u32 {
        if self.is_bound(label) {
            return self.label_address(label) & 0xfff;
        }
        self.record_fixup(label, FixupKind::Lo12);
        0
    }

    fn record_fixup(&mut self, label: Label, kind: FixupKind) {
        self.fixups.entry(label.0).or_default().push(Fixup {
            target_address: self.current(),
            kind,
        });
    }

    /// Emit a raw 32-bit datum (used for jump/lookup tables embedded in code).
    pub fn word(&mut self, value: u32) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    /// Resolve a branch/jump target expressed as a label: if bound, encode
    /// the relative offset now; if unbound, record a fixup and emit a
    /// placeholder with the offset field cleared.
    fn branch_offset(&mut self, target: Label, kind: FixupKind) -> i32 {
        if self.is_bound(target) {
            self.label_address(target).wrapping_sub(self.current()) as i32
        } else {
            self.record_fixup(target, kind);
            0
        }
    }

    /// Emit `Beq` to a label instead of a numeric offset.
    pub fn beq_label(&mut self, r0: u8, r1: u8, target: Label) {
        let offset = self.branch_offset(target, FixupKind::Offs12);
        self.beq(r0, r1, offset);
    }

    /// Emit `Jal` to a label instead of a numeric offset.
    pub fn jal_label(&mut self, r0: u8, target: Label) {
        let offset = self.branch_offset(target, FixupKind::Offs20);
        self.jal(r0, offset);
    }

    /// Emit `Call` to a label instead of a numeric offset.
    pub fn call_label(&mut self, target: Label) {
        let offset = self.branch_offset(target, FixupKind::Offs20);
        self.call(offset);
    }

    /// Emit `J` to a label instead of a numeric offset.
    pub fn j_label(&mut self, target: Label) {
        let offset = self.branch_offset(target, FixupKind::Offs20);
        self.j(offset);
    }

    fn emit(&mut self, word: u32) {
        self.buffer.extend_from_slice(&word.to_le_bytes());
    }

    /// Finalize the code buffer. Fails if any label still has unresolved
    /// fixups.
    pub fn code(self) -> Result<Vec<u8>, AssemblerError> {
        if let Some((&id, _)) = self.fixups.iter().next() {
            return Err(AssemblerError::UnboundLabel(Label(id)));
        }
        Ok(self.buffer)
    }
}

impl InstructionVisitor for Assembler {
    type Output = ();

    fn illegal(&mut self, _raw_word: u32) {
        self.emit(encode::opcode(Opcode::Illegal));
    }
    fn ecall(&mut self) {
        self.emit(encode::opcode(Opcode::Ecall));
    }
    fn ebreak(&mut self) {
        self.emit(encode::opcode(Opcode::Ebreak));
    }
    fn fence(&mut self) {
        self.emit(encode::opcode(Opcode::Fence));
    }

    fn add(&mut self, r0: u8, r1: u8, r2: u8) {
        self.emit(encode::opcode(Opcode::Add) | encode::r0(r0) | encode::r1(r1) | encode::r2(r2));
    }
    fn sub(&mut self, r0: u8, r1: u8, r2: u8) {
        self.emit(encode::opcode(Opcode::Sub) | encode::r0(r0) | encode::r1(r1) | encode::r2(r2));
    }
    fn sll(&mut self, r0: u8, r1: u8, r2: u8) {
        self.emit(encode::opcode(Opcode::Sll) | encode::r0(r0) | encode::r1(r1) | encode::r2(r2));
    }
    fn slt(&mut self, r0: u8, r1: u8, r2: u8) {
        self.emit(encode::opcode(Opcode::Slt) | encode::r0(r0) | encode::r1(r1) | encode::r2(r2));
    }
    fn sltu(&mut self, r0: u8, r1: u8, r2: u8) {
        self.emit(
            encode::opcode(Opcode::Sltu) | encode::r0(r0) | encode::r1(r1) | encode::r2(r2),
        );
    }
    fn xor(&mut self, r0: u8, r1: u8, r2: u8) {
        self.emit(encode::opcode(Opcode::Xor) | encode::r0(r0) | encode::r1(r1) | encode::r2(r2));
    }
    fn srl(&mut self, r0: u8, r1: u8, r2: u8) {
        self.emit(encode::opcode(Opcode::Srl) | encode::r0(r0) | encode::r1(r1) | encode::r2(r2));
    }
    fn sra(&mut self, r0: u8, r1: u8, r2: u8) {
        self.emit(encode::opcode(Opcode::Sra) | encode::r0(r0) | encode::r1(r1) | encode::r2(r2));
    }
    fn or(&mut self, r0: u8, r1: u8, r2: u8) {
        self.emit(encode::opcode(Opcode::Or) | encode::r0(r0) | encode::r1(r1) | encode::r2(r2));
    }
    fn and(&mut self, r0: u8, r1: u8, r2: u8) {
        self.emit(encode::opcode(Opcode::And) | encode::r0(r0) | encode::r1(r1) | encode::r2(r2));
    }

    fn slli(&mut self, r0: u8, r1: u8, shift: u8) {
        self.emit(
            encode::opcode(Opcode::Slli) | encode::r0(r0) | encode::r1(r1) | encode::shift(shift),
        );
    }
    fn srli(&mut self, r0: u8, r1: u8, shift: u8) {
        self.emit(
            encode::opcode(Opcode::Srli) | encode::r0(r0) | encode::r1(r1) | encode::shift(shift),
        );
    }
    fn srai(&mut self, r0: u8, r1: u8, shift: u8) {
        self.emit(
            encode::opcode(Opcode::Srai) | encode::r0(r0) | encode::r1(r1) | encode::shift(shift),
        );
    }

    fn beq(&mut self, r0: u8, r1: u8, offs12: i32) {
        self.emit(
            encode::opcode(Opcode::Beq) | encode::r0(r0) | encode::r1(r1) | encode::offs12(offs12),
        );
    }
    fn bne(&mut self, r0: u8, r1: u8, offs12: i32) {
        self.emit(
            encode::opcode(Opcode::Bne) | encode::r0(r0) | encode::r1(r1) | encode::offs12(offs12),
        );
    }
    fn blt(&mut self, r0: u8, r1: u8, offs12: i32) {
        self.emit(
            encode::opcode(Opcode::Blt) | encode::r0(r0) | encode::r1(r1) | encode::offs12(offs12),
        );
    }
    fn bge(&mut self, r0: u8, r1: u8, offs12: i32) {
        self.emit(
            encode::opcode(Opcode::Bge) | encode::r0(r0) | encode::r1(r1) | encode::offs12(offs12),
        );
    }
    fn bltu(&mut self, r0: u8, r1: u8, offs12: i32) {
        self.emit(
            encode::opcode(Opcode::Bltu)
                | encode::r0(r0)
                | encode::r1(r1)
                | encode::offs12(offs12),
        );
    }
    fn bgeu(&mut self, r0: u8, r1: u8, offs12: i32) {
        self.emit(
            encode::opcode(Opcode::Bgeu)
                | encode::r0(r0)
                | encode::r1(r1)
                | encode::offs12(offs12),
        );
    }

    fn addi(&mut self, r0: u8, r1: u8, imm12: i32) {
        self.emit(
            encode::opcode(Opcode::Addi) | encode::r0(r0) | encode::r1(r1) | encode::imm12(imm12),
        );
    }
    fn slti(&mut self, r0: u8, r1: u8, imm12: i32) {
        self.emit(
            encode::opcode(Opcode::Slti) | encode::r0(r0) | encode::r1(r1) | encode::imm12(imm12),
        );
    }
    fn sltiu(&mut self, r0: u8, r1: u8, imm12: i32) {
        self.emit(
            encode::opcode(Opcode::Sltiu)
                | encode::r0(r0)
                | encode::r1(r1)
                | encode::imm12(imm12),
        );
    }
    fn xori(&mut self, r0: u8, r1: u8, imm12: i32) {
        self.emit(
            encode::opcode(Opcode::Xori) | encode::r0(r0) | encode::r1(r1) | encode::imm12(imm12),
        );
    }
    fn ori(&mut self, r0: u8, r1: u8, imm12: i32) {
        self.emit(
            encode::opcode(Opcode::Ori) | encode::r0(r0) | encode::r1(r1) | encode::imm12(imm12),
        );
    }
    fn andi(&mut self, r0: u8, r1: u8, imm12: i32) {
        self.emit(
            encode::opcode(Opcode::Andi) | encode::r0(r0) | encode::r1(r1) | encode::imm12(imm12),
        );
    }

    fn lb(&mut self, r0: u8, imm12: i32, r1: u8) {
        self.emit(
            encode::opcode(Opcode::Lb) | encode::r0(r0) | encode::imm12(imm12) | encode::r1(r1),
        );
    }
    fn lbu(&mut self, r0: u8, imm12: i32, r1: u8) {
        self.emit(
            encode::opcode(Opcode::Lbu) | encode::r0(r0) | encode::imm12(imm12) | encode::r1(r1),
        );
    }
    fn lh(&mut self, r0: u8, imm12: i32, r1: u8) {
        self.emit(
            encode::opcode(Opcode::Lh) | encode::r0(r0) | encode::imm12(imm12) | encode::r1(r1),
        );
    }
    fn lhu(&mut self, r0: u8, imm12: i32, r1: u8) {
        self.emit(
            encode::opcode(Opcode::Lhu) | encode::r0(r0) | encode::imm12(imm12) | encode::r1(r1),
        );
    }
    fn lw(&mut self, r0: u8, imm12: i32, r1: u8) {
        self.emit(
            encode::opcode(Opcode::Lw) | encode::r0(r0) | encode::imm12(imm12) | encode::r1(r1),
        );
    }

    fn sb(&mut self, r0: u8, imm12: i32, r1: u8) {
        self.emit(
            encode::opcode(Opcode::Sb) | encode::r0(r0) | encode::imm12(imm12) | encode::r1(r1),
        );
    }
    fn sh(&mut self, r0: u8, imm12: i32, r1: u8) {
        self.emit(
            encode::opcode(Opcode::Sh) | encode::r0(r0) | encode::imm12(imm12) | encode::r1(r1),
        );
    }
    fn sw(&mut self, r0: u8, imm12: i32, r1: u8) {
        self.emit(
            encode::opcode(Opcode::Sw) | encode::r0(r0) | encode::imm12(imm12) | encode::r1(r1),
        );
    }

    fn jalr(&mut self, r0: u8, offs12: i32, r1: u8) {
        self.emit(
            encode::opcode(Opcode::Jalr)
                | encode::r0(r0)
                | encode::offs12(offs12)
                | encode::r1(r1),
        );
    }
    fn jal(&mut self, r0: u8, offs20: i32) {
        self.emit(encode::opcode(Opcode::Jal) | encode::r0(r0) | encode::offs20(offs20));
    }

    /// `uimm20` arrives already positioned in bits [31:12] (see
    /// `crate::opcode::decode::uimm20`); emitting it through `encode::uimm20`
    /// here would shift it a second time.
    fn lui(&mut self, r0: u8, uimm20: u32) {
        self.emit(encode::opcode(Opcode::Lui) | encode::r0(r0) | (uimm20 & 0xffff_f000));
    }
    fn auipc(&mut self, r0: u8, uimm20: u32) {
        self.emit(encode::opcode(Opcode::Auipc) | encode::r0(r0) | (uimm20 & 0xffff_f000));
    }

    fn j(&mut self, offs20: i32) {
        self.emit(encode::opcode(Opcode::J) | encode::offs20(offs20));
    }
    fn call(&mut self, offs20: i32) {
        self.emit(encode::opcode(Opcode::Call) | encode::offs20(offs20));
    }
    fn ret(&mut self) {
        self.emit(encode::opcode(Opcode::Ret));
    }
    fn li(&mut self, r0: u8, imm12: i32) {
        self.emit(encode::opcode(Opcode::Li) | encode::r0(r0) | encode::imm12(imm12));
    }
    fn mv(&mut self, r0: u8, r1: u8) {
        self.emit(encode::opcode(Opcode::Mv) | encode::r0(r0) | encode::r1(r1));
    }
}
