use crate::error::{AppError, AppResult};
use std::fs;
use std::path::Path;
use tracing::info;

/// Reads a source file as UTF-8.
pub fn read_source(path: &Path) -> AppResult<String> {
    fs::read_to_string(path).map_err(|e| AppError::read_failed(path, e))
}

/// Writes `content` to `path`, creating parent directories and replacing
/// any existing file.
pub fn write_output(path: &Path, content: &str) -> AppResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| AppError::write_failed(parent, e))?;
    }
    fs::write(path, content).map_err(|e| AppError::write_failed(path, e))?;
    info!("Wrote {} bytes to {}", content.len(), path.display());
    Ok(())
}

/// Extension without the dot, or an empty string.
pub fn file_extension(path: &Path) -> String {
    path.extension()
        .map(|ext| ext.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Maps a file extension to a language tag. Unknown extensions pass through.
pub fn language_from_extension(ext: &str) -> String {
    let language = match ext {
        "js" => "javascript",
        "ts" => "typescript",
        "py" => "python",
        "java" => "java",
        "cpp" => "cpp",
        "c" => "c",
        "rs" => "rust",
        "go" => "go",
        "php" => "php",
        "rb" => "ruby",
        "cs" => "csharp",
        "swift" => "swift",
        "kt" => "kotlin",
        "jsx" => "jsx",
        "tsx" => "tsx",
        other => other,
    };
    language.to_string()
}

pub fn language_for_path(path: &Path) -> String {
    language_from_extension(&file_extension(path))
}
