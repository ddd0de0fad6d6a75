use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum FileExtensionError {
    #[error("{0:?} has no file extension")]
    MissingFileExtension(PathBuf),
    #[error("Unsupported file extension for file: {0:?}")]
    UnsupportedFileExtension(PathBuf),
}

/// Serialization formats recognised by file extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SerdeFormat {
    Yaml,
    Json,
}

impl SerdeFormat {
    pub fn from_path(path: &Path) -> Result<Self, FileExtensionError> {
        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .ok_or_else(|| FileExtensionError::MissingFileExtension(path.to_path_buf()))?;

        match ext.to_ascii_lowercase().as_str() {
            "yaml" | "yml" => Ok(Self::Yaml),
            "json" => Ok(Self::Json),
            _ => Err(FileExtensionError::UnsupportedFileExtension(
                path.to_path_buf(),
            )),
        }
    }
}
