//! One-time per-directory consent before any file or network activity.
//!
//! Accepting writes a marker file into the directory; its presence is the
//! only signal checked on later runs. Declining writes nothing, so the
//! question comes back next time.

use crate::error::{AppError, AppResult};
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::info;

pub const TRUST_FILE: &str = ".deepseek-trust";

/// Handles the trust question for working directories.
///
/// # Example
///
/// ```no_run
/// use deepseek_code::trust_gate::TrustGate;
///
/// let dir = std::env::current_dir()?;
/// let mut input = std::io::stdin().lock();
/// if !TrustGate::check_trust_with_io(&dir, &mut input, &mut std::io::stdout())? {
///     std::process::exit(0);
/// }
/// # Ok::<(), anyhow::Error>(())
/// ```
pub struct TrustGate;

impl TrustGate {
    pub fn marker_path(directory: &Path) -> PathBuf {
        directory.join(TRUST_FILE)
    }

    pub fn is_trusted(directory: &Path) -> bool {
        Self::marker_path(directory).exists()
    }

    /// Asks whether `directory` is trusted, using custom I/O streams.
    ///
    /// Returns `Ok(true)` when the marker already exists or the user accepts,
    /// `Ok(false)` when the user declines or the input is closed. A marker
    /// that cannot be written is an error, never an implicit yes.
    pub fn check_trust_with_io<R: BufRead, W: Write>(
        directory: &Path,
        input: &mut R,
        output: &mut W,
    ) -> AppResult<bool> {
        if Self::is_trusted(directory) {
            return Ok(true);
        }

        Self::display_disclosure_with_io(directory, output)?;
        write!(output, "Enter 1 to proceed or 2 to exit: ")?;
        output.flush()?;

        let mut line = Vec::new();
        if input.read_until(b'\n', &mut line)? == 0 {
            info!("Input closed at trust prompt for {}", directory.display());
            writeln!(output, "\n✗ Operation cancelled")?;
            return Ok(false);
        }

        let line = String::from_utf8_lossy(&line);
        let answer = line.trim();
        if answer == "1" || answer.eq_ignore_ascii_case("yes") {
            let marker = Self::marker_path(directory);
            fs::write(&marker, "trusted").map_err(|e| AppError::write_failed(&marker, e))?;
            info!("Trust established for {}", directory.display());
            writeln!(output, "✓ Trust established for this folder\n")?;
            Ok(true)
        } else {
            info!("User declined trust for {}", directory.display());
            writeln!(output, "✗ Operation cancelled")?;
            Ok(false)
        }
    }

    fn display_disclosure_with_io<W: Write>(directory: &Path, output: &mut W) -> io::Result<()> {
        writeln!(output, "🔒 Security Check")?;
        writeln!(output, "{}", "─".repeat(60))?;
        writeln!(output)?;
        writeln!(output, "Do you trust the files in this folder?")?;
        writeln!(output)?;
        writeln!(output, "{}", directory.display())?;
        writeln!(output)?;
        writeln!(output, "DeepSeek may read and write files contained in this directory,")?;
        writeln!(output, "and sends their contents to the remote service when asked.")?;
        writeln!(output, "Only use files from trusted sources.")?;
        writeln!(output)?;
        writeln!(output, "  1. Yes, proceed")?;
        writeln!(output, "  2. No, exit")?;
        writeln!(output)
    }
}
