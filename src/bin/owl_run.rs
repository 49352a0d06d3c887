//! Load a flat binary image of 32-bit little-endian words and run it on
//! the Owl-2820 VM, or (with `--rv32i`) decode the same image as RV32I.

use std::process::ExitCode;

use clap::Parser;

use owl2820::{Memory, Vm};

/// Run an Owl-2820 or RV32I flat image to completion
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Path to a flat binary image of 32-bit little-endian words
    input: String,

    /// Decode the image as RV32I instead of native Owl-2820
    #[arg(long)]
    rv32i: bool,

    /// Memory size in bytes given to the VM
    #[arg(long, default_value_t = 4096)]
    memory_size: u32,
}

const HOST_ERROR: u8 = 1;

fn words_from_bytes(bytes: &[u8]) -> Vec<u32> {
    bytes
        .chunks(4)
        .map(|chunk| {
            let mut padded = [0u8; 4];
            padded[..chunk.len()].copy_from_slice(chunk);
            u32::from_le_bytes(padded)
        })
        .collect()
}

fn main() -> ExitCode {
    let args = Args::parse();

    let bytes = match std::fs::read(&args.input) {
        Ok(bytes) => bytes,
        Err(error) => {
            eprintln!("failed to read {}: {error}", args.input);
            return ExitCode::from(HOST_ERROR);
        }
    };

    let mut memory = Memory::new(args.memory_size);
    memory.load_image(&words_from_bytes(&bytes));
    let mut vm = Vm::new(memory);

    let result = if args.rv32i {
        vm.run_rv32i()
    } else {
        vm.run()
    };

    if let Err(error) = result {
        eprintln!("{error}");
        return ExitCode::from(HOST_ERROR);
    }

    ExitCode::from(vm.registers.get(owl2820::registers::A0) as u8)
}
