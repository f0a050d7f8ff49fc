//! Hexdump command implementation.
//!
//! ```text
//! 0x000: 00 00 C8 42 00 00 00 00  00 00 00 00 00 00 00 00  |...B............|
//! ```

use std::fmt::Write;

use anyhow::{Result, bail};
use trainer_core::ReadMemory;

use super::hex_utils::parse_hex_address;
use crate::cli::Cli;

/// Largest dump a single command reads
pub const MAX_DUMP_SIZE: usize = 64 * 1024;

fn check_size(size: usize) -> Result<()> {
    if size > MAX_DUMP_SIZE {
        bail!("Dump size {} exceeds the {} byte limit", size, MAX_DUMP_SIZE);
    }
    Ok(())
}

/// Run the hexdump command
pub fn run(cli: &Cli, address: &str, size: usize, ascii: bool) -> Result<()> {
    let address = parse_hex_address(address)?;
    check_size(size)?;
    let (trainer, _profile) = super::attach(cli)?;

    let bytes = trainer.session().read_bytes(address, size)?;

    println!("Hexdump at 0x{:X} ({} bytes):", address, size);
    println!();
    for line in format_lines(&bytes, ascii) {
        println!("{}", line);
    }

    Ok(())
}

fn format_lines(bytes: &[u8], ascii: bool) -> Vec<String> {
    bytes
        .chunks(16)
        .enumerate()
        .map(|(i, chunk)| {
            let mut line = format!("0x{:03X}: ", i * 16);

            for j in 0..16 {
                if j == 8 {
                    line.push(' ');
                }
                match chunk.get(j) {
                    Some(byte) => {
                        let _ = write!(line, "{:02X} ", byte);
                    }
                    None => line.push_str("   "),
                }
            }

            if ascii {
                line.push_str(" |");
                for byte in chunk {
                    if (0x20..0x7F).contains(byte) {
                        line.push(*byte as char);
                    } else {
                        line.push('.');
                    }
                }
                for _ in chunk.len()..16 {
                    line.push(' ');
                }
                line.push('|');
            }

            line.trim_end().to_string()
        })
        .collect()
}
