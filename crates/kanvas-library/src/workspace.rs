//! Composition root
//!
//! A `Workspace` owns the live stores of the open world together with the
//! library. Every operation that spans stores (switching books, deleting
//! assets with their tag associations, import) goes through here.

use crate::book::{Book, BookPatch, NewBook, SettingsPatch, WorldData, WorldDataPatch};
use crate::save_queue::{Revisions, SaveQueue};
use crate::store::BookStore;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use kanvas_core::{
    AssetId, AssetRegistry, AssetTree, BookId, KanvasConfig, Navigator, Size, TagStore,
    ViewportConfig,
};
use log::{debug, info};
use std::fs;
use std::path::Path;

#[derive(Debug)]
pub struct Workspace {
    config: KanvasConfig,
    registry: AssetRegistry,
    tags: TagStore,
    books: BookStore,
    navigator: Navigator,
    tree: AssetTree,
    save_queue: SaveQueue,
}

impl Workspace {
    pub fn new() -> Self {
        Self::with_config(KanvasConfig::default())
    }

    pub fn with_config(config: KanvasConfig) -> Self {
        Self {
            registry: AssetRegistry::with_config(&config),
            tags: TagStore::new(),
            books: BookStore::with_config(&config),
            navigator: Navigator::new(),
            tree: AssetTree::new(),
            save_queue: SaveQueue::new(&config.autosave),
            config,
        }
    }

    pub fn config(&self) -> &KanvasConfig {
        &self.config
    }

    pub fn registry(&self) -> &AssetRegistry {
        &self.registry
    }

    /// Live assets of the open world
    pub fn registry_mut(&mut self) -> &mut AssetRegistry {
        &mut self.registry
    }

    pub fn tags(&self) -> &TagStore {
        &self.tags
    }

    pub fn tags_mut(&mut self) -> &mut TagStore {
        &mut self.tags
    }

    pub fn books(&self) -> &BookStore {
        &self.books
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    pub fn tree(&self) -> &AssetTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut AssetTree {
        &mut self.tree
    }

    pub fn current_book(&self) -> Option<&Book> {
        self.books.current_book()
    }

    pub fn revisions(&self) -> Revisions {
        Revisions {
            assets: self.registry.revision(),
            tags: self.tags.revision(),
        }
    }

    // ------------------------------------------------------------------
    // Books
    // ------------------------------------------------------------------

    /// Create a book; it is not opened
    pub fn create_world(&mut self, data: NewBook) -> BookId {
        self.books.create_book(data)
    }

    pub fn update_book(&mut self, book_id: &BookId, patch: BookPatch) -> bool {
        let reload = patch.world_data.is_some() && self.books.current_book_id() == Some(book_id);
        if !self.books.update_book(book_id, patch) {
            return false;
        }
        if reload {
            self.load_current();
        }
        true
    }

    pub fn update_settings(&mut self, patch: SettingsPatch) {
        self.books.update_settings(patch);
    }

    /// Save the open world, then load another one into the live stores
    pub fn open_book(&mut self, book_id: &BookId) -> Result<()> {
        if !self.books.contains(book_id) {
            return Err(Error::BookNotFound(book_id.clone()));
        }
        self.checkpoint();
        self.books.set_current_book(Some(book_id.clone()));
        self.load_current();
        info!("opened book {}", book_id);
        Ok(())
    }

    /// Save and unload the open world
    pub fn close_book(&mut self) {
        self.checkpoint();
        self.books.set_current_book(None);
        self.unload();
    }

    /// Delete a book. Deleting the open one unloads it without saving.
    pub fn delete_book(&mut self, book_id: &BookId) -> bool {
        let was_current = self.books.current_book_id() == Some(book_id);
        if !self.books.delete_book(book_id) {
            return false;
        }
        if was_current {
            self.unload();
        }
        true
    }

    // ------------------------------------------------------------------
    // Cross-store operations on the open world
    // ------------------------------------------------------------------

    /// Delete an asset with its subtree and drop their tag associations
    pub fn delete_asset(&mut self, asset_id: &AssetId) -> Result<Vec<AssetId>> {
        let removed = self.registry.delete_checked(asset_id)?;
        self.tags.forget_assets(&removed);
        self.tree.prune(&self.registry);
        self.navigator.sync(&mut self.registry);
        Ok(removed)
    }

    pub fn enter_asset(&mut self, asset_id: &AssetId, container: Size) -> Option<ViewportConfig> {
        self.navigator.enter(&mut self.registry, asset_id, container)
    }

    pub fn exit_asset(&mut self) {
        self.navigator.exit(&mut self.registry);
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    /// Flush the open world if the save queue says a flush is due.
    /// Returns whether anything was written.
    ///
    /// Does nothing while the library's `autoSave` setting is off;
    /// `checkpoint`, book switches and export still flush.
    pub fn poll(&mut self, now: DateTime<Utc>) -> bool {
        if self.books.current_book_id().is_none() || !self.books.settings().auto_save {
            return false;
        }
        let revisions = self.revisions();
        if self.save_queue.poll(revisions, now) {
            self.flush();
            return true;
        }
        false
    }

    /// Flush the open world now if it has unsaved changes
    pub fn checkpoint(&mut self) -> bool {
        if self.books.current_book_id().is_none() || !self.save_queue.is_dirty(self.revisions()) {
            return false;
        }
        self.flush();
        true
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.books.current_book_id().is_some() && self.save_queue.is_dirty(self.revisions())
    }

    /// Export the whole library, including unsaved changes of the open world
    pub fn export(&mut self) -> Result<String> {
        self.checkpoint();
        self.books.export_books()
    }

    /// Replace the library with an exported bundle.
    ///
    /// The open world is saved first. If it survives the import it is
    /// reloaded from the imported snapshot, otherwise it is unloaded.
    pub fn import(&mut self, data: &str) -> Result<()> {
        self.checkpoint();
        self.books.import_books(data)?;
        if self.books.current_book_id().is_some() {
            self.load_current();
        } else {
            self.unload();
        }
        Ok(())
    }

    pub fn save_to(&mut self, path: impl AsRef<Path>) -> Result<()> {
        self.checkpoint();
        self.books.write_to(path)
    }

    pub fn load_from(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let data = fs::read_to_string(path.as_ref())?;
        self.import(&data)
    }

    fn flush(&mut self) {
        let Some(book_id) = self.books.current_book_id().cloned() else {
            return;
        };
        let world = WorldData::capture(&self.registry, &self.tags);
        self.books
            .update_world_data(&book_id, WorldDataPatch::from(world));
        let revisions = self.revisions();
        self.save_queue.mark_saved(revisions);
        debug!("flushed world of book {}", book_id);
    }

    fn load_current(&mut self) {
        let world = self
            .books
            .current_book()
            .map(|b| b.world_data.clone())
            .unwrap_or_else(|| WorldData::empty(&self.config.canvas));
        world.load_into(&mut self.registry, &mut self.tags);
        self.reset_views();
    }

    fn unload(&mut self) {
        self.registry.clear();
        self.tags.clear();
        self.reset_views();
    }

    fn reset_views(&mut self) {
        self.navigator = Navigator::new();
        self.tree = AssetTree::new();
        let revisions = self.revisions();
        self.save_queue.mark_saved(revisions);
    }
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new()
    }
}
