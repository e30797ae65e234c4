use std::{path::PathBuf, time::Duration};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("could not open store `{}`: {source}", .path.display())]
    Open {
        path: PathBuf,
        source: tokio_rusqlite::Error,
    },
    #[error("gave up on lock for store `{}` after {waited:?}", .path.display())]
    LockTimeout { path: PathBuf, waited: Duration },
    #[error("sqlite error `{0}`")]
    SQLiteError(tokio_rusqlite::Error),
}

impl StoreError {
    /// Open failures other than contention end the process
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Open { .. })
    }
}

impl From<tokio_rusqlite::Error> for StoreError {
    fn from(value: tokio_rusqlite::Error) -> Self {
        Self::SQLiteError(value)
    }
}
