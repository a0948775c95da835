//! xbase - inspect and edit xBase (.dbf) tables from the command line

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use xbase_engine::Table;

/// xbase - dBase III table inspector
#[derive(Parser, Debug)]
#[command(name = "xbase")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the header and field layout
    Info {
        /// Table file
        file: PathBuf,
    },
    /// Print records, one per line, fields separated by tabs
    Dump {
        /// Table file
        file: PathBuf,
        /// Include deleted records (marked with '*')
        #[arg(short, long)]
        deleted: bool,
        /// Stop after this many records
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Mark records deleted and save the table
    Delete {
        /// Table file
        file: PathBuf,
        /// Record numbers (1-based)
        #[arg(required = true)]
        ids: Vec<usize>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::WARN,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    match args.command {
        Command::Info { file } => info_command(&file),
        Command::Dump {
            file,
            deleted,
            limit,
        } => dump_command(&file, deleted, limit),
        Command::Delete { file, ids } => delete_command(&file, &ids),
    }
}

fn load(file: &Path) -> Result<Table> {
    Table::load_file(file).with_context(|| format!("loading {}", file.display()))
}

fn info_command(file: &Path) -> Result<()> {
    let table = load(file)?;
    let header = table.header();

    println!("File:           {}", file.display());
    println!("Version:        0x{:02X}", header.version);
    println!("Last update:    {}", header.last_update);
    println!("Records:        {} ({} live)", header.record_count, table.live_count());
    println!("Header length:  {}", header.header_length);
    println!("Record length:  {}", header.record_length);
    println!();
    println!("{:<4} {:<10} {:<4} {:>5} {:>3} {:>6}", "#", "Name", "Type", "Width", "Dec", "Offset");
    for (i, field) in table.fields().iter().enumerate() {
        println!(
            "{:<4} {:<10} {:<4} {:>5} {:>3} {:>6}",
            i,
            field.name,
            field.field_type.to_string(),
            field.width,
            field.decimals,
            field.offset + 1
        );
    }
    Ok(())
}

fn dump_command(file: &Path, deleted: bool, limit: Option<usize>) -> Result<()> {
    let table = load(file)?;
    let names: Vec<&str> = table.fields().iter().map(|f| f.name.as_str()).collect();
    println!("#\t{}", names.join("\t"));

    let limit = limit.unwrap_or(usize::MAX);
    let mut printed = 0;
    for id in 1..=table.record_count() {
        if printed >= limit {
            break;
        }
        let is_deleted = table.is_deleted(id)?;
        if is_deleted && !deleted {
            continue;
        }
        let marker = if is_deleted { "*" } else { "" };
        println!("{}{}\t{}", marker, id, table.row(id)?.join("\t"));
        printed += 1;
    }
    info!("Printed {} records", printed);
    Ok(())
}

fn delete_command(file: &Path, ids: &[usize]) -> Result<()> {
    let mut table = load(file)?;
    for &id in ids {
        if id == 0 || id > table.record_count() {
            bail!("record {} does not exist ({} records)", id, table.record_count());
        }
    }
    for &id in ids {
        table.delete(id)?;
    }
    table
        .save_file(file)
        .with_context(|| format!("saving {}", file.display()))?;
    info!("Deleted {} records from {}", ids.len(), file.display());
    Ok(())
}
