use std::fmt;
use anyhow::Error as AnyhowError;

#[derive(Debug)]
pub enum Error {
    /// An intent was invoked on a room that has already been closed.
    RoomClosed,
    /// The consumer side of an event channel went away.
    ChannelClosed(&'static str),
    /// The connection factory failed to construct a connection.
    Factory(AnyhowError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::RoomClosed => write!(f, "room is closed"),
            Error::ChannelClosed(which) => write!(f, "{} channel closed", which),
            Error::Factory(e) => write!(f, "connection factory error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Factory(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

impl From<AnyhowError> for Error {
    fn from(err: AnyhowError) -> Self {
        Error::Factory(err)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
