//! Database, document and view operations.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::client::{CouchDB, Request};
use crate::document::FromDocument;
use crate::error::{Error, Result};
use crate::protocol::{attachment_segment, doc_segment, quote_name};
use crate::query::{encode_query, ListDocOptions, ViewQuery};

/// Which representation of a document to fetch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpenDocOptions {
  pub revision: Option<String>,
  pub full: bool,
  pub attachment: Option<String>,
}

impl OpenDocOptions {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn revision(mut self, rev: impl Into<String>) -> Self {
    self.revision = Some(rev.into());
    self
  }

  /// Include the revision history
  pub fn full(mut self) -> Self {
    self.full = true;
    self
  }

  pub fn attachment(mut self, name: impl Into<String>) -> Self {
    self.attachment = Some(name.into());
    self
  }
}

/// Result of [`CouchDB::open_doc_with`]
#[derive(Debug, Clone, PartialEq)]
pub enum OpenedDoc {
  Document(Value),
  Attachment(Vec<u8>),
}

/// Serialize a request body. Strings are sent verbatim, as pre-encoded JSON.
fn encode_body<B: Serialize + ?Sized>(body: &B) -> Result<String> {
  match serde_json::to_value(body)? {
    Value::String(s) => Ok(s),
    other => Ok(other.to_string()),
  }
}

fn db_path(db: &str) -> String {
  format!("/{}/", quote_name(db))
}

/// Document ids must be non-empty; `/<db>/` addresses the database itself.
fn doc_path(db: &str, doc_id: &str) -> Result<String> {
  if doc_id.is_empty() {
    return Err(Error::InvalidKey("empty document id".to_string()));
  }
  Ok(format!("/{}/{}", quote_name(db), doc_segment(doc_id)))
}

impl CouchDB {
  /// Bind operations to one database.
  pub fn bind_to_database(&self, name: impl Into<String>) -> Database {
    Database {
      client: self.clone(),
      name: name.into(),
    }
  }

  /// The database named in [`ConnectOptions::database`](crate::ConnectOptions::database), if any
  pub fn default_database(&self) -> Option<Database> {
    self.database_name().map(|name| self.bind_to_database(name))
  }

  // Database operations

  pub async fn create_db(&self, db: &str) -> Result<Value> {
    self.json(Request::put(db_path(db))).await
  }

  pub async fn delete_db(&self, db: &str) -> Result<Value> {
    self.json(Request::delete(db_path(db))).await
  }

  pub async fn info_db(&self, db: &str) -> Result<Value> {
    self.json(Request::get(db_path(db))).await
  }

  pub async fn list_db(&self) -> Result<Value> {
    self.json(Request::get("/_all_dbs")).await
  }

  pub async fn compact_db(&self, db: &str) -> Result<Value> {
    self.json(Request::post(format!("/{}/_compact", quote_name(db)))).await
  }

  /// Compact the view indexes of one design document.
  pub async fn compact_design_db(&self, db: &str, design: &str) -> Result<Value> {
    let uri = format!("/{}/_compact/{}", quote_name(db), quote_name(design));
    self.json(Request::post(uri)).await
  }

  /// Remove index files no longer required by any view.
  pub async fn clean_db(&self, db: &str) -> Result<Value> {
    self.json(Request::post(format!("/{}/_view_cleanup", quote_name(db)))).await
  }

  // Document operations

  pub async fn list_doc(&self, db: &str, opts: &ListDocOptions) -> Result<Value> {
    let uri = format!("/{}/_all_docs{}", quote_name(db), opts.to_query());
    self.json(Request::get(uri)).await
  }

  /// Like [`list_doc`](Self::list_doc), with keyword-style parameters.
  ///
  /// Unknown parameter names fail before anything is sent.
  pub async fn list_doc_with_params<I, K>(&self, db: &str, params: I) -> Result<Value>
  where
    I: IntoIterator<Item = (K, Value)>,
    K: AsRef<str>,
  {
    let opts = ListDocOptions::from_params(params)?;
    self.list_doc(db, &opts).await
  }

  /// Open the current revision of a document.
  ///
  /// With a cache configured, a cached copy is returned without contacting
  /// the server; otherwise the fetched document is cached under `doc_id`.
  pub async fn open_doc(&self, db: &str, doc_id: &str) -> Result<Value> {
    let uri = doc_path(db, doc_id)?;
    if let Some(cache) = self.cache() {
      if let Ok(doc) = cache.get(doc_id) {
        debug!(doc_id, "document served from cache");
        return Ok(doc);
      }
    }

    let doc = self.json(Request::get(uri)).await?;
    if let Some(cache) = self.cache() {
      if let Err(e) = cache.store(doc_id, doc.clone()) {
        warn!(doc_id, error = %e, "could not cache document");
      }
    }
    Ok(doc)
  }

  /// Open a document, a specific revision of it, or one of its attachments.
  ///
  /// An attachment takes precedence over a revision, which takes precedence
  /// over `full`. Only the plain open goes through the cache.
  pub async fn open_doc_with(
    &self,
    db: &str,
    doc_id: &str,
    opts: &OpenDocOptions,
  ) -> Result<OpenedDoc> {
    doc_path(db, doc_id)?;
    if let Some(ref name) = opts.attachment {
      let data = self.open_attachment(db, doc_id, name).await?;
      return Ok(OpenedDoc::Attachment(data));
    }

    let doc = if let Some(ref rev) = opts.revision {
      self.open_doc_revision(db, doc_id, rev).await?
    } else if opts.full {
      self.open_doc_full(db, doc_id).await?
    } else {
      self.open_doc(db, doc_id).await?
    };
    Ok(OpenedDoc::Document(doc))
  }

  /// Open a specific revision of a document. Never cached.
  pub async fn open_doc_revision(&self, db: &str, doc_id: &str, rev: &str) -> Result<Value> {
    let uri = format!("{}{}", doc_path(db, doc_id)?, encode_query(&[("rev", rev)]));
    self.json(Request::get(uri)).await
  }

  /// Open a document along with its revision history. Never cached.
  pub async fn open_doc_full(&self, db: &str, doc_id: &str) -> Result<Value> {
    let uri = format!("{}{}", doc_path(db, doc_id)?, encode_query(&[("full", "true")]));
    self.json(Request::get(uri)).await
  }

  /// Fetch an attachment's raw bytes. Never cached.
  pub async fn open_attachment(&self, db: &str, doc_id: &str, name: &str) -> Result<Vec<u8>> {
    let uri = format!("{}/{}", doc_path(db, doc_id)?, attachment_segment(name));
    Ok(self.request(Request::get(uri).raw()).await?.into_bytes())
  }

  /// Save a document.
  ///
  /// With an id the document is created or updated in place (`PUT`);
  /// without one the server assigns an id (`POST`). A string body is
  /// taken to be already-encoded JSON.
  pub async fn save_doc<B>(&self, db: &str, body: &B, doc_id: Option<&str>) -> Result<Value>
  where
    B: Serialize + ?Sized,
  {
    let body = encode_body(body)?;
    match doc_id {
      Some(doc_id) => {
        let result = self.json(Request::put(doc_path(db, doc_id)?).body(body)).await?;
        self.invalidate(doc_id);
        Ok(result)
      }
      None => self.json(Request::post(db_path(db)).body(body)).await,
    }
  }

  /// Delete a document at the given revision.
  pub async fn delete_doc(&self, db: &str, doc_id: &str, rev: &str) -> Result<Value> {
    let uri = format!("{}{}", doc_path(db, doc_id)?, encode_query(&[("rev", rev)]));
    let result = self.json(Request::delete(uri)).await?;
    self.invalidate(doc_id);
    Ok(result)
  }

  fn invalidate(&self, doc_id: &str) {
    if let Some(cache) = self.cache() {
      if cache.delete(doc_id) {
        debug!(doc_id, "evicted from cache");
      }
    }
  }

  // View operations

  /// Query `_design/<design>/_view/<view>`.
  ///
  /// A key list in `query` turns the request into a POST carrying the keys.
  pub async fn open_view(
    &self,
    db: &str,
    design: &str,
    view: &str,
    query: &ViewQuery,
  ) -> Result<Value> {
    let uri = format!(
      "/{}/_design/{}/_view/{}{}",
      quote_name(db),
      quote_name(design),
      quote_name(view),
      query.to_query()
    );
    match query.body() {
      Some(keys) => self.json(Request::post(uri).body(keys)).await,
      None => self.json(Request::get(uri)).await,
    }
  }

  /// Run an ad-hoc view definition.
  pub async fn temp_view<V>(&self, db: &str, view: &V) -> Result<Value>
  where
    V: Serialize + ?Sized,
  {
    let uri = format!("/{}/_temp_view", quote_name(db));
    self.json(Request::post(uri).body(encode_body(view)?)).await
  }

  // Object mapping

  /// Fetch a document and hydrate it into a `T` built by `factory`.
  ///
  /// With a cache configured, a previously mapped object for `doc_id` is
  /// returned as-is; a fresh object is recorded in the object cache.
  pub async fn map<T, F>(&self, db: &str, doc_id: &str, factory: F) -> Result<Arc<T>>
  where
    T: FromDocument + Send + Sync + 'static,
    F: FnOnce() -> T,
  {
    doc_path(db, doc_id)?;
    if let Some(cache) = self.cache() {
      if let Ok(obj) = cache.get_object(doc_id) {
        if let Ok(obj) = obj.downcast::<T>() {
          return Ok(obj);
        }
      }
    }

    let doc = self.open_doc(db, doc_id).await?;
    let mut obj = factory();
    obj.from_document(&doc)?;
    let obj = Arc::new(obj);

    if let Some(cache) = self.cache() {
      cache.mapped(doc_id, obj.clone())?;
    }
    Ok(obj)
  }
}

/// Operations bound to a single database
#[derive(Debug, Clone)]
pub struct Database {
  client: CouchDB,
  name: String,
}

impl Database {
  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn client(&self) -> &CouchDB {
    &self.client
  }

  pub async fn create(&self) -> Result<Value> {
    self.client.create_db(&self.name).await
  }

  pub async fn delete(&self) -> Result<Value> {
    self.client.delete_db(&self.name).await
  }

  pub async fn info(&self) -> Result<Value> {
    self.client.info_db(&self.name).await
  }

  pub async fn compact(&self) -> Result<Value> {
    self.client.compact_db(&self.name).await
  }

  pub async fn compact_design(&self, design: &str) -> Result<Value> {
    self.client.compact_design_db(&self.name, design).await
  }

  pub async fn clean(&self) -> Result<Value> {
    self.client.clean_db(&self.name).await
  }

  pub async fn list_doc(&self, opts: &ListDocOptions) -> Result<Value> {
    self.client.list_doc(&self.name, opts).await
  }

  pub async fn list_doc_with_params<I, K>(&self, params: I) -> Result<Value>
  where
    I: IntoIterator<Item = (K, Value)>,
    K: AsRef<str>,
  {
    self.client.list_doc_with_params(&self.name, params).await
  }

  pub async fn open_doc(&self, doc_id: &str) -> Result<Value> {
    self.client.open_doc(&self.name, doc_id).await
  }

  pub async fn open_doc_with(&self, doc_id: &str, opts: &OpenDocOptions) -> Result<OpenedDoc> {
    self.client.open_doc_with(&self.name, doc_id, opts).await
  }

  pub async fn open_doc_revision(&self, doc_id: &str, rev: &str) -> Result<Value> {
    self.client.open_doc_revision(&self.name, doc_id, rev).await
  }

  pub async fn open_doc_full(&self, doc_id: &str) -> Result<Value> {
    self.client.open_doc_full(&self.name, doc_id).await
  }

  pub async fn open_attachment(&self, doc_id: &str, name: &str) -> Result<Vec<u8>> {
    self.client.open_attachment(&self.name, doc_id, name).await
  }

  pub async fn save_doc<B>(&self, body: &B, doc_id: Option<&str>) -> Result<Value>
  where
    B: Serialize + ?Sized,
  {
    self.client.save_doc(&self.name, body, doc_id).await
  }

  pub async fn delete_doc(&self, doc_id: &str, rev: &str) -> Result<Value> {
    self.client.delete_doc(&self.name, doc_id, rev).await
  }

  pub async fn open_view(&self, design: &str, view: &str, query: &ViewQuery) -> Result<Value> {
    self.client.open_view(&self.name, design, view, query).await
  }

  pub async fn temp_view<V>(&self, view: &V) -> Result<Value>
  where
    V: Serialize + ?Sized,
  {
    self.client.temp_view(&self.name, view).await
  }

  pub async fn map<T, F>(&self, doc_id: &str, factory: F) -> Result<Arc<T>>
  where
    T: FromDocument + Send + Sync + 'static,
    F: FnOnce() -> T,
  {
    self.client.map(&self.name, doc_id, factory).await
  }
}
