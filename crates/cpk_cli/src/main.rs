//! CPK CLI
//!
//! Command-line tools for CRI Middleware CPK archives.
//!
//! # Commands
//!
//! - `unpack` - Extract every file of an archive
//! - `list` - List the archive's TOC entries
//! - `view` - Dump a `@UTF` table and the tables nested in it
//! - `compress` / `decompress` - Run the CRILAYLA codec on a file region

mod commands;

use clap::{Parser, Subcommand};
use commands::codec::Direction;
use commands::unpack::UnpackOptions;
use commands::{parse_offset, Format};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Tools for CRI CPK archives, @UTF tables and CRILAYLA compression.
#[derive(Parser)]
#[command(name = "cpk")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract every file of an archive
    Unpack {
        /// Archive to unpack
        archive: PathBuf,

        /// Output directory (default: <ARCHIVE NAME>_unpacked)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Skip entries that fail and keep going
        #[arg(long)]
        skip_errors: bool,

        /// Do not check decompressed sizes against ExtractSize
        #[arg(long)]
        no_verify: bool,

        /// Keep files that already exist
        #[arg(long)]
        no_overwrite: bool,
    },

    /// List the archive's TOC entries
    List {
        /// Archive to list
        archive: PathBuf,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: Format,
    },

    /// Dump a @UTF table and the tables nested in it
    View {
        /// File holding the table
        file: PathBuf,

        /// Offset of the table (decimal or 0x-prefixed hex)
        #[arg(long, default_value = "0", value_parser = parse_offset)]
        offset: u64,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: Format,
    },

    /// Compress a file region into a CRILAYLA container
    Compress {
        /// Input file
        input: PathBuf,

        /// Output file
        output: PathBuf,

        /// Start of the region (decimal or 0x-prefixed hex)
        #[arg(long, default_value = "0", value_parser = parse_offset)]
        offset: u64,

        /// Length of the region (default: to end of file)
        #[arg(long, value_parser = parse_offset)]
        length: Option<u64>,
    },

    /// Decompress a CRILAYLA container from a file region
    Decompress {
        /// Input file
        input: PathBuf,

        /// Output file
        output: PathBuf,

        /// Start of the container (decimal or 0x-prefixed hex)
        #[arg(long, default_value = "0", value_parser = parse_offset)]
        offset: u64,

        /// Length of the container (default: to end of file)
        #[arg(long, value_parser = parse_offset)]
        length: Option<u64>,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Unpack {
            archive,
            output,
            skip_errors,
            no_verify,
            no_overwrite,
        } => {
            let options = UnpackOptions {
                output,
                skip_errors,
                no_verify,
                no_overwrite,
            };
            commands::unpack::run(&archive, &options)?;
        }
        Commands::List { archive, format } => {
            commands::list::run(&archive, format)?;
        }
        Commands::View {
            file,
            offset,
            format,
        } => {
            commands::view::run(&file, offset, format)?;
        }
        Commands::Compress {
            input,
            output,
            offset,
            length,
        } => {
            commands::codec::run(Direction::Compress, &input, &output, offset, length)?;
        }
        Commands::Decompress {
            input,
            output,
            offset,
            length,
        } => {
            commands::codec::run(Direction::Decompress, &input, &output, offset, length)?;
        }
        Commands::Version => {
            println!("CPK CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("CPK Core v{}", cpk_core::VERSION);
        }
    }

    Ok(())
}
