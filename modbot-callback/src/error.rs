use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CallbackKeyError {
    #[error("Malformed callback key: {0}")]
    Malformed(String),

    #[error("Callback data has no pattern separator: {0}")]
    MissingSeparator(String),
}
