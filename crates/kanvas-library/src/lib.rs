//! Kanvas Library - Worlds, snapshots and persistence
//!
//! This crate builds on `kanvas-core`'s in-memory stores to provide:
//!
//! - **BookStore**: the library of worlds, each with a `WorldData` snapshot
//! - **Export/import**: the `{ books, settings, exportedAt }` JSON bundle
//! - **SaveQueue**: debounced flushing of the live world into its book
//! - **Workspace**: the composition root tying the stores together
//!
//! # Example
//!
//! ```
//! use kanvas_core::{AssetKind, NewAsset};
//! use kanvas_library::{NewBook, Workspace};
//!
//! let mut workspace = Workspace::new();
//! let book = workspace.create_world(NewBook::new("Eldoria"));
//! workspace.open_book(&book)?;
//!
//! workspace
//!     .registry_mut()
//!     .create(NewAsset::new("Capital", AssetKind::Other), None);
//!
//! let json = workspace.export()?;
//! assert!(json.contains("Capital"));
//! # Ok::<(), kanvas_library::Error>(())
//! ```

mod book;
mod error;
mod exporter;
mod save_queue;
mod store;
mod workspace;

pub use book::{
    default_cover_presets, Book, BookCoverPreset, BookPatch, BookViewMode, LibrarySettings,
    NewBook, SettingsPatch, WorldData, WorldDataPatch,
};
pub use error::{Error, Result};
pub use save_queue::{Revisions, SaveQueue};
pub use store::BookStore;
pub use workspace::Workspace;
