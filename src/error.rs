//! Error types for the paisley CouchDB client.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
  #[error("Redirect {status}: {body}")]
  Redirect { status: u16, body: String },

  #[error("HTTP error {status}: {body}")]
  Http { status: u16, body: String },

  #[error("Unknown parameter(s): {0}")]
  UnknownParameter(String),

  #[error("Invalid parameter: {0}")]
  InvalidParameter(String),

  #[error("Cache miss: {0}")]
  CacheMiss(String),

  #[error("Invalid cache key: {0:?}")]
  InvalidKey(String),

  #[error("Invalid URI: {0}")]
  InvalidUri(String),

  #[error("No username configured")]
  MissingCredentials,

  #[error("Transport error: {0}")]
  Transport(#[from] reqwest::Error),

  #[error("Decode error: {0}")]
  Decode(String),

  #[error("Serialization error: {0}")]
  Serialization(String),

  #[error("Hydration error: {0}")]
  Hydration(String),
}

impl Error {
  /// Status code carried by the error, if it came from a server response.
  pub fn status(&self) -> Option<u16> {
    match self {
      Self::Redirect { status, .. } | Self::Http { status, .. } => Some(*status),
      Self::Transport(e) => e.status().map(|s| s.as_u16()),
      _ => None,
    }
  }

  /// Raw response body carried by the error, if any.
  pub fn body(&self) -> Option<&str> {
    match self {
      Self::Redirect { body, .. } | Self::Http { body, .. } => Some(body),
      _ => None,
    }
  }
}

impl From<serde_json::Error> for Error {
  fn from(e: serde_json::Error) -> Self {
    Self::Serialization(e.to_string())
  }
}

pub type Result<T> = std::result::Result<T, Error>;
