//! End-to-end check that an RV32I program executed directly through the
//! RV32I dispatcher produces the same observable register state as the
//! same program transcoded word-for-word into Owl-2820 and executed
//! through the Owl dispatcher. Each RV32I instruction maps onto exactly
//! one Owl instruction of identical width, so word offsets (and therefore
//! branch/jump byte offsets) carry over unchanged between the two images.

use owl2820::assembler::Assembler;
use owl2820::{Memory, Vm};

const OP_IMM: u32 = 0b0010011;
const OP: u32 = 0b0110011;
const OP_BRANCH: u32 = 0b1100011;
const OP_SYSTEM: u32 = 0b1110011;
const OP_LUI: u32 = 0b0110111;
const OP_AUIPC: u32 = 0b0010111;

fn itype(imm: i32, rs1: u32, funct3: u32, rd: u32, opcode: u32) -> u32 {
    ((imm as u32) & 0xfff) << 20 | rs1 << 15 | funct3 << 12 | rd << 7 | opcode
}

fn utype(uimm20: u32, rd: u32, opcode: u32) -> u32 {
    (uimm20 & 0xffff_f000) | rd << 7 | opcode
}

fn rtype(funct7: u32, rs2: u32, rs1: u32, funct3: u32, rd: u32, opcode: u32) -> u32 {
    funct7 << 25 | rs2 << 20 | rs1 << 15 | funct3 << 12 | rd << 7 | opcode
}

fn btype(imm: i32, rs2: u32, rs1: u32, funct3: u32, opcode: u32) -> u32 {
    let u = imm as u32;
    let bit12 = (u >> 12) & 1;
    let bit11 = (u >> 11) & 1;
    let bits10_5 = (u >> 5) & 0x3f;
    let bits4_1 = (u >> 1) & 0xf;
    bit12 << 31 | bits10_5 << 25 | rs2 << 20 | rs1 << 15 | funct3 << 12 | bits4_1 << 8 | bit11 << 7 | opcode
}

/// `sum = 0; i = 1; while i < 6 { sum += i; i += 1 }; a7 = 0 (Exit); ecall`
fn rv32i_sum_loop() -> Vec<u32> {
    const A0: u32 = 10;
    const A1: u32 = 11;
    const A2: u32 = 12;
    const A7: u32 = 17;
    vec![
        itype(0, 0, 0b000, A0, OP_IMM),   // addi a0, zero, 0
        itype(1, 0, 0b000, A1, OP_IMM),   // addi a1, zero, 1
        itype(6, 0, 0b000, A2, OP_IMM),   // addi a2, zero, 6
        rtype(0, A1, A0, 0b000, A0, OP),  // add  a0, a0, a1       <- loop target (word 3)
        itype(1, A1, 0b000, A1, OP_IMM),  // addi a1, a1, 1
        btype(-8, A2, A1, 0b110, OP_BRANCH), // bltu a1, a2, loop (back to word 3)
        itype(0, 0, 0b000, A7, OP_IMM),   // addi a7, zero, 0
        itype(0, 0, 0b000, 0, OP_SYSTEM), // ecall
    ]
}

#[test]
fn rv32i_direct_execution_matches_transcoded_owl_execution() {
    let rv32i_words = rv32i_sum_loop();

    let mut rv32i_memory = Memory::new(4096);
    rv32i_memory.load_image(&rv32i_words);
    let mut rv32i_vm = Vm::new(rv32i_memory);
    rv32i_vm.run_rv32i().unwrap();

    let mut assembler = Assembler::new();
    for word in &rv32i_words {
        owl2820::rv32i::dispatch(&mut assembler, *word);
    }
    let owl_code = assembler.code().unwrap();
    let owl_words: Vec<u32> = owl_code
        .chunks(4)
        .map(|c| u32::from_le_bytes(c.try_into().unwrap()))
        .collect();

    let mut owl_memory = Memory::new(4096);
    owl_memory.load_image(&owl_words);
    let mut owl_vm = Vm::new(owl_memory);
    owl_vm.run().unwrap();

    assert_eq!(rv32i_vm.registers.get(10), owl_vm.registers.get(10));
    assert_eq!(rv32i_vm.registers.get(11), owl_vm.registers.get(11));
    assert_eq!(rv32i_vm.done, owl_vm.done);
    assert_eq!(rv32i_vm.pc, owl_vm.pc);
    // sum(1..=5) = 15
    assert_eq!(rv32i_vm.registers.get(10), 15);
}

#[test]
fn rv32i_register_register_and_branch_rename_operands_correctly() {
    // bltu x2, x3, +8: RV32I (rs1=2, rs2=3) must become the visitor's
    // (r0=2, r1=3) for the branch, matching direct RV32I execution.
    let words = vec![
        itype(2, 0, 0b000, 2, OP_IMM), // addi x2, zero, 2
        itype(5, 0, 0b000, 3, OP_IMM), // addi x3, zero, 5
        btype(8, 3, 2, 0b110, OP_BRANCH), // bltu x2, x3, +8 (taken)
        itype(0xff, 0, 0b000, 4, OP_IMM), // addi x4, zero, 0xff (skipped if taken)
        itype(0, 0, 0b000, 17, OP_IMM),   // addi a7, zero, 0
        itype(0, 0, 0b000, 0, OP_SYSTEM), // ecall
    ];
    let mut memory = Memory::new(4096);
    memory.load_image(&words);
    let mut vm = Vm::new(memory);
    vm.run_rv32i().unwrap();
    assert_eq!(vm.registers.get(4), 0);
}

#[test]
fn lui_and_auipc_transcode_to_the_same_effective_value() {
    // lui x1, 0x1; auipc x2, 0x1
    let words = vec![utype(0x0000_1000, 1, OP_LUI), utype(0x0000_1000, 2, OP_AUIPC)];

    let mut rv32i_memory = Memory::new(4096);
    rv32i_memory.load_image(&words);
    let mut rv32i_vm = Vm::new(rv32i_memory);
    rv32i_vm.step_rv32i().unwrap();
    rv32i_vm.step_rv32i().unwrap();

    let mut assembler = Assembler::new();
    for word in &words {
        owl2820::rv32i::dispatch(&mut assembler, *word);
    }
    let owl_code = assembler.code().unwrap();
    let owl_words: Vec<u32> = owl_code
        .chunks(4)
        .map(|c| u32::from_le_bytes(c.try_into().unwrap()))
        .collect();

    let mut owl_memory = Memory::new(4096);
    owl_memory.load_image(&owl_words);
    let mut owl_vm = Vm::new(owl_memory);
    owl_vm.step().unwrap();
    owl_vm.step().unwrap();

    assert_eq!(rv32i_vm.registers.get(1), 0x0000_1000);
    assert_eq!(owl_vm.registers.get(1), 0x0000_1000);
    assert_eq!(rv32i_vm.registers.get(2), owl_vm.registers.get(2));
}
