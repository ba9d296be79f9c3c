use thiserror::Error;

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Output format error: {0}")]
    Format(String),
}
