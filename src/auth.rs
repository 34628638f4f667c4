//! Re-authentication hooks.

use async_trait::async_trait;
use tracing::debug;

use crate::client::CouchDB;
use crate::error::Result;

/// Establishes (or refreshes) credentials for a client.
///
/// Invoked by the request engine when the server rejects a request as
/// unauthorized. The side effect, usually a session cookie held by the
/// client's cookie store, is what matters; the original request is retried
/// once `authenticate` returns `Ok`.
#[async_trait]
pub trait Authenticator: Send + Sync {
  async fn authenticate(&self, client: &CouchDB) -> Result<()>;
}

/// Logs in through `POST /_session` with the client's configured credentials.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionAuthenticator;

#[async_trait]
impl Authenticator for SessionAuthenticator {
  async fn authenticate(&self, client: &CouchDB) -> Result<()> {
    let session = client.get_session().await?;
    debug!(roles = ?session.get("roles"), "session established");
    Ok(())
  }
}
