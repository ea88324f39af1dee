pub mod catalog;
pub mod cluster;
pub mod profile;

use std::io::{self, Write};

use crate::error::Result as CliResult;

/// Ask a yes/no question on stdout; anything but `y`/`yes` is a no.
pub(crate) fn confirm(question: &str) -> CliResult<bool> {
    print!("{question} (y/N): ");
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(matches!(input.trim().to_lowercase().as_str(), "y" | "yes"))
}
