//! z64audio - inspect and repack Zelda64 audio banks and sequences
//!
//! Reads blobs from disk, hands them to the library crates and writes the
//! results back. All format logic lives in the libraries.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use z64_audiobank::{Audiobank, InstrumentBank};
use z64_audioseq::{parse_with_stats, AseqVersion, Listing, ParserConfig};
use z64_linker::LinkConfig;
use z64_types::Codec;

#[derive(Parser)]
#[command(name = "z64audio")]
#[command(about = "Zelda64 audio bank and sequence tool")]
#[command(version)]
struct Cli {
    /// Debug logging unless RUST_LOG is set
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse an instrument bank and write it back through the linker
    Bank {
        /// Index entry (.bankmeta, 8 or 16 bytes)
        meta: PathBuf,

        /// Bank blob (.zbank)
        bank: PathBuf,

        /// Output path stem; <stem>.bankmeta and <stem>.zbank are written
        #[arg(short, long)]
        output: PathBuf,

        /// Write the 8-byte index entry
        #[arg(long)]
        truncate: bool,

        /// Keep byte-identical objects separate
        #[arg(long)]
        no_dedup: bool,
    },

    /// Summarize every bank of an audiobank file
    Audiobank {
        /// Audiobank index table
        index: PathBuf,

        /// Audiobank blob
        audiobank: PathBuf,
    },

    /// Print the listing of an audio sequence
    Seq {
        /// Sequence file (.aseq)
        input: PathBuf,

        /// Opcode table revision
        #[arg(long, value_enum, default_value_t = Version::Oot)]
        version: Version,

        /// Stop after this many distinct fragments
        #[arg(long, default_value_t = ParserConfig::DEFAULT.max_fragments)]
        max_fragments: usize,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Version {
    Oot,
    Mm,
}

impl From<Version> for AseqVersion {
    fn from(v: Version) -> Self {
        match v {
            Version::Oot => AseqVersion::Oot,
            Version::Mm => AseqVersion::Mm,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Bank { meta, bank, output, truncate, no_dedup } => {
            repack_bank(&meta, &bank, &output, truncate, !no_dedup)
        }
        Commands::Audiobank { index, audiobank } => summarize_audiobank(&index, &audiobank),
        Commands::Seq { input, version, max_fragments } => {
            let config = ParserConfig::new(version.into(), max_fragments)?;
            list_sequence(&input, config)
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn read(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn write(path: &Path, bytes: &[u8]) -> Result<()> {
    fs::write(path, bytes).with_context(|| format!("Failed to write {}", path.display()))
}

/// `stem` with `.ext` appended, keeping any dots already in the stem.
fn append_extension(stem: &Path, ext: &str) -> PathBuf {
    let mut name = stem.as_os_str().to_os_string();
    name.push(".");
    name.push(ext);
    PathBuf::from(name)
}

fn repack_bank(meta: &Path, bank_path: &Path, output: &Path, truncate: bool, dedup: bool) -> Result<()> {
    let entry = read(meta)?;
    let blob = read(bank_path)?;
    let bank = InstrumentBank::parse_bytes(&entry, &blob)
        .with_context(|| format!("Failed to parse bank {}", bank_path.display()))?;
    info!(
        instruments = bank.instruments.len(),
        drums = bank.drums.len(),
        effects = bank.effects.len(),
        samples = bank.objects.samples.len(),
        "parsed bank"
    );

    let defaults = LinkConfig::DEFAULT;
    let config = LinkConfig::new(defaults.start, defaults.alignment, dedup)?;
    debug!(%config, "link configuration");
    let compiled = bank
        .compile(config)
        .with_context(|| format!("Failed to compile bank {}", bank_path.display()))?;

    let entry_bytes = if truncate {
        compiled.index_entry.to_truncated_bytes()?
    } else {
        compiled.index_entry.to_bytes()?
    };
    let meta_out = append_extension(output, "bankmeta");
    let bank_out = append_extension(output, "zbank");
    write(&meta_out, &entry_bytes)?;
    write(&bank_out, &compiled.data)?;

    println!(
        "{} -> {}: {:#x} -> {:#x} bytes, {} duplicate objects coalesced",
        bank_path.display(),
        bank_out.display(),
        blob.len(),
        compiled.data.len(),
        compiled.coalesced
    );
    Ok(())
}

fn summarize_audiobank(index: &Path, audiobank: &Path) -> Result<()> {
    let index_bytes = read(index)?;
    let blob = read(audiobank)?;
    let audiobank = Audiobank::parse_bytes(&index_bytes, &blob)
        .with_context(|| format!("Failed to parse audiobank {}", audiobank.display()))?;

    for (i, (entry, bank)) in audiobank.index.entries.iter().zip(&audiobank.banks).enumerate() {
        match (entry, bank) {
            (Some(entry), Some(bank)) => println!(
                "bank {i:3}: rom {:#08x} size {:#06x} instruments {:3} drums {:3} effects {:3} samples {:3}",
                entry.rom_addr,
                entry.bank_size,
                bank.instruments.len(),
                bank.drums.len(),
                bank.effects.len(),
                bank.objects.samples.len()
            ),
            _ => println!("bank {i:3}: empty"),
        }
    }
    Ok(())
}

fn list_sequence(input: &Path, config: ParserConfig) -> Result<()> {
    debug!(%config, "parser configuration");
    let data = read(input)?;
    let (seq, stats) = parse_with_stats(&data, config)
        .with_context(|| format!("Failed to parse sequence {}", input.display()))?;
    info!(%stats, "parsed sequence");
    print!("{}", Listing(&seq));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_extension_keeps_dotted_stem() {
        let stem = Path::new("out/bank.v2");
        assert_eq!(append_extension(stem, "bankmeta"), PathBuf::from("out/bank.v2.bankmeta"));
        assert_eq!(append_extension(stem, "zbank"), PathBuf::from("out/bank.v2.zbank"));
    }

    #[test]
    fn test_append_extension_plain_stem() {
        assert_eq!(append_extension(Path::new("bank"), "zbank"), PathBuf::from("bank.zbank"));
    }

    #[test]
    fn test_cli_parses_bank_command() {
        let cli = Cli::try_parse_from(["z64audio", "bank", "a.bankmeta", "a.zbank", "-o", "out/a.v2", "--truncate"]).unwrap();
        match cli.command {
            Commands::Bank { output, truncate, no_dedup, .. } => {
                assert_eq!(output, PathBuf::from("out/a.v2"));
                assert!(truncate);
                assert!(!no_dedup);
            }
            _ => panic!("expected bank command"),
        }
    }
}
