use thiserror::Error;

pub type StudioResult<T> = Result<T, StudioError>;

#[derive(Error, Debug)]
pub enum StudioError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("CSV error in {file}: {message}")]
    Csv { file: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<config::ConfigError> for StudioError {
    fn from(err: config::ConfigError) -> Self {
        StudioError::Config(err.to_string())
    }
}
