use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PortSpecError {
    #[error("port spec must be `A..B`, `A,B,C`, or a single port")]
    Empty,
    #[error("invalid port `{0}`")]
    InvalidPort(String),
    #[error("port range `{0}..{1}` ends before it starts")]
    ReversedRange(u16, u16),
}
