//! Export and import of the whole library
//!
//! The bundle is `{ books, settings, exportedAt }` as pretty-printed JSON.
//! Import checks the shape before touching the store and applies nothing on
//! failure.

use crate::book::{Book, LibrarySettings, SettingsPatch};
use crate::store::BookStore;
use crate::{Error, Result};
use chrono::Utc;
use indexmap::IndexMap;
use kanvas_core::BookId;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportBundle<'a> {
    books: &'a IndexMap<BookId, Book>,
    settings: &'a LibrarySettings,
    exported_at: String,
}

#[derive(Deserialize)]
struct ImportBundle {
    books: IndexMap<BookId, Book>,
    #[serde(default)]
    settings: Option<SettingsPatch>,
}

impl BookStore {
    /// Serialize every book and the settings
    pub fn export_books(&self) -> Result<String> {
        let bundle = ExportBundle {
            books: &self.books,
            settings: &self.settings,
            exported_at: Utc::now().to_rfc3339(),
        };
        serde_json::to_string_pretty(&bundle).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Replace the books with an exported bundle.
    ///
    /// `books` must be an object. Settings present in the bundle are merged
    /// over the current ones. On any error the store is left untouched. If
    /// the current book is not among the imported ones the pointer is
    /// cleared.
    pub fn import_books(&mut self, data: &str) -> Result<()> {
        let bundle = match parse_bundle(data) {
            Ok(bundle) => bundle,
            Err(e) => {
                warn!("rejected import: {}", e);
                return Err(e);
            }
        };

        // Keys win over whatever id the record carries
        self.books = bundle
            .books
            .into_iter()
            .map(|(id, mut book)| {
                book.id = id.clone();
                (id, book)
            })
            .collect();
        if let Some(patch) = bundle.settings {
            patch.apply_to(&mut self.settings);
        }
        if self
            .current
            .as_ref()
            .is_some_and(|id| !self.books.contains_key(id))
        {
            self.current = None;
        }

        info!("imported {} books", self.books.len());
        Ok(())
    }

    /// Write the export bundle to a file
    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = self.export_books()?;
        fs::write(path.as_ref(), json)?;
        info!("saved library to {}", path.as_ref().display());
        Ok(())
    }

    /// Import a bundle from a file
    pub fn read_from(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let data = fs::read_to_string(path.as_ref())?;
        self.import_books(&data)
    }

    /// A fresh store loaded from a bundle file
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut store = Self::new();
        store.read_from(path)?;
        Ok(store)
    }
}

fn parse_bundle(data: &str) -> Result<ImportBundle> {
    let value: serde_json::Value =
        serde_json::from_str(data).map_err(|e| Error::InvalidImport(e.to_string()))?;
    if !value.get("books").is_some_and(serde_json::Value::is_object) {
        return Err(Error::InvalidImport(
            "`books` must be an object".to_string(),
        ));
    }
    serde_json::from_value(value).map_err(|e| Error::InvalidImport(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::book::{BookViewMode, NewBook};

    #[test]
    fn test_export_shape() {
        let mut store = BookStore::new();
        store.create_book(NewBook::new("Atlas"));
        let json: serde_json::Value = serde_json::from_str(&store.export_books().unwrap()).unwrap();

        assert!(json["books"].is_object());
        assert_eq!(json["settings"]["defaultViewMode"], "carousel");
        let exported_at = json["exportedAt"].as_str().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(exported_at).is_ok());
    }

    #[test]
    fn test_import_rejects_bad_shape() {
        let mut store = BookStore::new();
        let id = store.create_book(NewBook::new("Keep me"));

        for bad in [
            "not json",
            "{}",
            r#"{"books": []}"#,
            r#"{"books": "nope"}"#,
            r#"{"books": {"x": {"title": 3}}}"#,
        ] {
            assert!(
                matches!(store.import_books(bad), Err(Error::InvalidImport(_))),
                "accepted {bad}"
            );
            assert_eq!(store.len(), 1);
            assert!(store.get(&id).is_some());
        }
    }

    #[test]
    fn test_import_merges_settings() {
        let mut store = BookStore::new();
        store
            .import_books(r#"{"books": {}, "settings": {"defaultViewMode": "grid"}}"#)
            .unwrap();
        assert_eq!(store.settings().default_view_mode, BookViewMode::Grid);
        assert!(store.settings().auto_save);
        assert!(store.is_empty());
    }

    #[test]
    fn test_import_clears_missing_current() {
        let mut store = BookStore::new();
        let id = store.create_book(NewBook::new("Gone"));
        store.set_current_book(Some(id));
        store.import_books(r#"{"books": {}}"#).unwrap();
        assert!(store.current_book_id().is_none());
    }

    #[test]
    fn test_import_minimal_book() {
        let mut store = BookStore::new();
        store
            .import_books(
                r##"{"books": {"b1": {"id": "other", "title": "T", "color": "#fff", "createdAt": 1, "updatedAt": 2}}}"##,
            )
            .unwrap();
        let book = store.get(&BookId::new("b1")).unwrap();
        assert_eq!(book.id, BookId::new("b1"));
        assert_eq!(book.world_data.viewport_scale, 1.0);
    }
}
