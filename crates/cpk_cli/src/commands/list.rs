//! List command implementation.

use super::Format;
use cpk_core::{CpkArchive, CpkHeader, CpkTocEntry};
use cpk_storage::FileBackend;
use serde::Serialize;
use std::path::Path;

/// Archive listing.
#[derive(Debug, Serialize)]
pub struct Listing {
    /// Archive path.
    pub path: String,
    /// Header values.
    pub header: CpkHeader,
    /// TOC entries in order.
    pub entries: Vec<CpkTocEntry>,
}

/// Runs the list command.
pub fn run(archive: &Path, format: Format) -> Result<(), Box<dyn std::error::Error>> {
    let listing = collect(archive)?;
    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&listing)?),
        Format::Text => print_text(&listing),
    }
    Ok(())
}

/// Reads the header and every TOC entry of `archive`.
pub fn collect(archive: &Path) -> Result<Listing, Box<dyn std::error::Error>> {
    let source = FileBackend::open_read_only(archive)?;
    let opened = CpkArchive::open(&source)?;
    Ok(Listing {
        path: archive.display().to_string(),
        header: *opened.header(),
        entries: opened.entries(&source)?,
    })
}

fn print_text(listing: &Listing) {
    println!("{}", listing.path);
    println!(
        "  TocOffset: {:#x}  ContentOffset: {:#x}  Files: {}",
        listing.header.toc_offset, listing.header.content_offset, listing.header.files
    );
    println!();
    for entry in &listing.entries {
        let packed = if entry.is_compressed() {
            format!(" -> {}", entry.extract_size)
        } else {
            String::new()
        };
        println!(
            "{:>5} {:#010x} {:>10}{packed}  {}",
            entry.index,
            entry.file_offset,
            entry.file_size,
            entry.archive_path()
        );
    }
}
