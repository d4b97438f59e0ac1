//! View command implementation.

use super::Format;
use cpk_storage::FileBackend;
use cpk_utf::{dump_text, dump_tree};
use std::path::Path;

/// Runs the view command: dumps the `@UTF` table at `offset` and every
/// table nested in its data cells.
pub fn run(file: &Path, offset: u64, format: Format) -> Result<(), Box<dyn std::error::Error>> {
    print!("{}", render(file, offset, format)?);
    Ok(())
}

/// Renders the table at `offset` without printing it.
pub fn render(file: &Path, offset: u64, format: Format) -> Result<String, Box<dyn std::error::Error>> {
    let source = FileBackend::open_read_only(file)?;
    Ok(match format {
        Format::Text => dump_text(&source, offset)?,
        Format::Json => {
            let mut json = serde_json::to_string_pretty(&dump_tree(&source, offset)?)?;
            json.push('\n');
            json
        }
    })
}
