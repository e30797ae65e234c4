use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("unreachable `{0}`")]
    Unreachable(String),
    #[error("http status `{0}`")]
    HttpStatus(u16),
    #[error("http client error `{0}`")]
    Client(reqwest::Error),
}

impl From<reqwest::Error> for FetchError {
    fn from(value: reqwest::Error) -> Self {
        match value.status() {
            Some(status) => Self::HttpStatus(status.as_u16()),
            None => Self::Unreachable(value.to_string()),
        }
    }
}
