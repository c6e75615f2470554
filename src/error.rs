use std::fmt::{Display, Formatter};
use std::num::TryFromIntError;
use std::sync::PoisonError;

use config::ConfigError;

use crate::storage::page::PageId;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    Internal(String),
    Value(String),

    /// Every frame is pinned, no victim could be found.
    PoolExhausted,
    /// The page id handed out for a new page is already resident and pinned.
    AlreadyPinned(PageId),
    /// Unpin of a page that is not in the pool or has a zero pin count.
    NotResidentOrUnpinned(PageId),
    /// Free of a page that is still pinned.
    PagePinned(PageId),
    /// Flush of a page that is not in the pool.
    NotResident(PageId),
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Internal(s) | Error::Value(s) => {
                write!(f, "{}", s)
            }
            Error::PoolExhausted => write!(f, "buffer pool exhausted, all frames are pinned"),
            Error::AlreadyPinned(id) => write!(f, "page {} is already pinned", id),
            Error::NotResidentOrUnpinned(id) => {
                write!(f, "page {} is not in the buffer pool or not pinned", id)
            }
            Error::PagePinned(id) => write!(f, "page {} is pinned", id),
            Error::NotResident(id) => write!(f, "page {} is not in the buffer pool", id),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Internal(err.to_string())
    }
}

impl From<Box<bincode::ErrorKind>> for Error {
    fn from(err: Box<bincode::ErrorKind>) -> Self {
        Error::Internal(err.to_string())
    }
}

impl<T> From<PoisonError<T>> for Error {
    fn from(err: PoisonError<T>) -> Self {
        Error::Internal(err.to_string())
    }
}

impl From<TryFromIntError> for Error {
    fn from(err: TryFromIntError) -> Self {
        Error::Internal(err.to_string())
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Error::Internal(err.to_string())
    }
}

impl From<log::ParseLevelError> for Error {
    fn from(err: log::ParseLevelError) -> Self {
        Error::Value(err.to_string())
    }
}
