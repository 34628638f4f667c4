//! Wire conventions shared with the CouchDB server.

use std::fmt;
use std::time::Duration;

/// Value sent in the `User-Agent` header of every request
pub const USER_AGENT: &str = "paisley";

/// Default CouchDB port
pub const DEFAULT_PORT: u16 = 5984;

/// Lifetime of a server-side session cookie
pub const SESSION_WINDOW: Duration = Duration::from_secs(300);

/// Interval between keepalive pings (half the session window)
pub const KEEPALIVE_INTERVAL: Duration = Duration::from_secs(SESSION_WINDOW.as_secs() / 2);

/// Maximum length of URIs and bodies echoed into log lines
pub const LOG_TRIM: usize = 255;

/// URL scheme used to reach the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scheme {
  #[default]
  Http,
  Https,
}

impl fmt::Display for Scheme {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Scheme::Http => write!(f, "http"),
      Scheme::Https => write!(f, "https"),
    }
  }
}

impl TryFrom<&str> for Scheme {
  type Error = ();
  fn try_from(v: &str) -> Result<Self, Self::Error> {
    match v.to_ascii_lowercase().as_str() {
      "http" => Ok(Self::Http),
      "https" => Ok(Self::Https),
      _ => Err(()),
    }
  }
}

/// Server version as reported by `GET /`.
///
/// Components that do not start with a number are unknown (`None`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerVersion {
  pub major: Option<u32>,
  pub minor: Option<u32>,
  pub patch: Option<u32>,
}

impl ServerVersion {
  pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
    Self {
      major: Some(major),
      minor: Some(minor),
      patch: Some(patch),
    }
  }

  /// Parse a dotted version string such as `1.1.1a1162549`.
  pub fn parse(version: &str) -> Self {
    let mut parts = version.split('.').map(|part| {
      let digits: String = part.chars().take_while(|c| c.is_ascii_digit()).collect();
      digits.parse::<u32>().ok()
    });

    Self {
      major: parts.next().flatten(),
      minor: parts.next().flatten(),
      patch: parts.next().flatten(),
    }
  }
}

impl Default for ServerVersion {
  fn default() -> Self {
    Self::new(1, 0, 1)
  }
}

impl fmt::Display for ServerVersion {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let show = |p: Option<u32>| p.map(|v| v.to_string()).unwrap_or_else(|| "?".to_string());
    write!(f, "{}.{}.{}", show(self.major), show(self.minor), show(self.patch))
  }
}

/// How a response status is handled by the request engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
  Success,
  Redirect,
  /// 401, or 404 whose body carries `"error": "unauthorized"`
  Unauthorized,
  Failure,
}

/// Classify a response by status code and, for 404s, by its body.
///
/// CouchDB answers some unauthenticated requests (replication posts among
/// them) with 404 instead of 401, flagging it in the JSON body. A body that
/// does not parse is simply not the unauthorized case.
pub fn classify(status: u16, body: &[u8]) -> Outcome {
  match status {
    0..=299 => Outcome::Success,
    300..=399 => Outcome::Redirect,
    401 => Outcome::Unauthorized,
    404 if is_unauthorized_body(body) => Outcome::Unauthorized,
    _ => Outcome::Failure,
  }
}

fn is_unauthorized_body(body: &[u8]) -> bool {
  serde_json::from_slice::<serde_json::Value>(body)
    .ok()
    .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(|e| e == "unauthorized"))
    .unwrap_or(false)
}

/// Percent-encode a database or document name as a single path segment.
///
/// `/` is encoded too, so `a/b` stays one segment.
pub fn quote_name(name: &str) -> String {
  urlencoding::encode(name).into_owned()
}

/// Path segment for a document id.
///
/// Special documents (`_design/...`, `_local/...`) are passed through: the
/// server routes on the literal slash and answers an encoded one with a 301.
pub fn doc_segment(doc_id: &str) -> String {
  if doc_id.starts_with('_') {
    doc_id.to_string()
  } else {
    quote_name(doc_id)
  }
}

/// Attachment names may contain `/`, which is kept as a separator.
pub fn attachment_segment(name: &str) -> String {
  name.split('/').map(quote_name).collect::<Vec<_>>().join("/")
}

/// Trim a string for logging and escape newlines.
pub fn short_print(s: &str) -> String {
  if s.chars().count() < LOG_TRIM {
    s.replace('\n', "\\n")
  } else {
    let head: String = s.chars().take(LOG_TRIM).collect();
    format!("{}...", head.replace('\n', "\\n"))
  }
}
