//! Helpers for building and hydrating documents.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::{json, Map, Value};

use crate::error::{Error, Result};

/// Types that can be filled in from a fetched document.
///
/// Used by [`CouchDB::map`](crate::CouchDB::map): the object is first built
/// by a caller-supplied factory, then hydrated.
pub trait FromDocument {
  fn from_document(&mut self, doc: &Value) -> Result<()>;
}

fn section<'a>(document: &'a mut Value, name: &str) -> Result<&'a mut Map<String, Value>> {
  let fields = document
    .as_object_mut()
    .ok_or_else(|| Error::InvalidParameter("document must be a JSON object".to_string()))?;
  fields
    .entry(name)
    .or_insert_with(|| json!({}))
    .as_object_mut()
    .ok_or_else(|| Error::InvalidParameter(format!("{name} must be a JSON object")))
}

/// Inline attachments into a document before saving it.
///
/// Each attachment is stored base64-encoded under `_attachments.<name>`.
pub fn add_attachments<I, K, V>(document: &mut Value, attachments: I) -> Result<()>
where
  I: IntoIterator<Item = (K, V)>,
  K: Into<String>,
  V: AsRef<[u8]>,
{
  let section = section(document, "_attachments")?;
  for (name, data) in attachments {
    section.insert(
      name.into(),
      json!({ "type": "base64", "data": STANDARD.encode(data) }),
    );
  }
  Ok(())
}

/// Add view definitions to a design document under `views.<name>`.
pub fn add_views<I, K>(document: &mut Value, views: I) -> Result<()>
where
  I: IntoIterator<Item = (K, Value)>,
  K: Into<String>,
{
  let section = section(document, "views")?;
  for (name, definition) in views {
    section.insert(name.into(), definition);
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_add_attachments() {
    let mut doc = json!({"_id": "a"});
    add_attachments(&mut doc, [("hello.txt", b"hello".to_vec())]).unwrap();
    add_attachments(&mut doc, [("empty", Vec::new())]).unwrap();

    assert_eq!(
      doc["_attachments"],
      json!({
        "hello.txt": {"type": "base64", "data": "aGVsbG8="},
        "empty": {"type": "base64", "data": ""}
      })
    );
    assert_eq!(doc["_id"], "a");
  }

  #[test]
  fn test_add_views() {
    let mut doc = json!({"_id": "_design/app", "views": {"old": {"map": "x"}}});
    add_views(
      &mut doc,
      [("by_name", json!({"map": "function(doc) { emit(doc.name, null); }"}))],
    )
    .unwrap();

    assert_eq!(doc["views"]["old"], json!({"map": "x"}));
    assert!(doc["views"]["by_name"]["map"].is_string());
  }

  #[test]
  fn test_rejects_non_object() {
    let mut doc = json!([1, 2]);
    assert!(matches!(
      add_views(&mut doc, Vec::<(String, Value)>::new()),
      Err(Error::InvalidParameter(_))
    ));

    let mut doc = json!({"_attachments": "oops"});
    assert!(add_attachments(&mut doc, [("a", b"x")]).is_err());
  }
}
