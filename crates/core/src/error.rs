#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("invalid directory mode '{value}' (expected octal, e.g. 755): {source}")]
    InvalidDirMode {
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("directory mode {0:o} is out of range")]
    DirModeOutOfRange(u32),
    #[error("invalid upload size limit '{value}': {source}")]
    InvalidMaxUploadBytes {
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
