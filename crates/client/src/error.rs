//! Client error types

use graphpipe_protocol::ProtocolError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    /// Failure at the HTTP boundary: connect, timeout, body read.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// The response body could not be decoded as the expected tables.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

pub type Result<T> = std::result::Result<T, ClientError>;
