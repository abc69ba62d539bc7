use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum SignalError {
    #[error("Signal engine received invalid parameters: {0}")]
    InvalidParameters(String),
}
