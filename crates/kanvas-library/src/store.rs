//! The book library
//!
//! Plain CRUD over the books map plus the current-book pointer. Switching
//! the current book here does not touch the live asset and tag stores;
//! [`Workspace`](crate::Workspace) pairs the two.

use crate::book::{
    default_cover_presets, Book, BookCoverPreset, BookPatch, BookViewMode, LibrarySettings,
    NewBook, SettingsPatch, WorldData, WorldDataPatch,
};
use indexmap::IndexMap;
use kanvas_core::{now_millis, BookId, CanvasDefaults, KanvasConfig};
use log::{debug, info};

/// All books, the current one, and library preferences
#[derive(Debug, Clone)]
pub struct BookStore {
    pub(crate) books: IndexMap<BookId, Book>,
    pub(crate) current: Option<BookId>,
    view_mode: BookViewMode,
    pub(crate) settings: LibrarySettings,
    cover_presets: Vec<BookCoverPreset>,
    canvas: CanvasDefaults,
}

impl BookStore {
    pub fn new() -> Self {
        Self::with_config(&KanvasConfig::default())
    }

    /// New worlds start with the configured canvas view
    pub fn with_config(config: &KanvasConfig) -> Self {
        Self {
            books: IndexMap::new(),
            current: None,
            view_mode: BookViewMode::default(),
            settings: LibrarySettings::default(),
            cover_presets: default_cover_presets(),
            canvas: config.canvas.clone(),
        }
    }

    /// Create a book and return its id
    pub fn create_book(&mut self, data: NewBook) -> BookId {
        let id = BookId::generate();
        let now = now_millis();
        let book = Book {
            id: id.clone(),
            title: data.title,
            description: data.description,
            cover_image: data.cover_image,
            color: data.color,
            gradient: data.gradient,
            created_at: now,
            updated_at: now,
            world_data: data
                .world_data
                .unwrap_or_else(|| WorldData::empty(&self.canvas)),
            is_default: data.is_default,
        };
        info!("create book {} ({:?})", id, book.title);
        self.books.insert(id.clone(), book);
        id
    }

    pub fn update_book(&mut self, book_id: &BookId, patch: BookPatch) -> bool {
        let Some(book) = self.books.get_mut(book_id) else {
            return false;
        };
        patch.apply_to(book);
        book.touch();
        true
    }

    /// Delete a book. Deleting the current book clears the current pointer.
    pub fn delete_book(&mut self, book_id: &BookId) -> bool {
        if self.books.shift_remove(book_id).is_none() {
            return false;
        }
        if self.current.as_ref() == Some(book_id) {
            self.current = None;
        }
        info!("delete book {}", book_id);
        true
    }

    /// Point the library at another book, or at none.
    ///
    /// An unknown id is refused and leaves the pointer as it was.
    pub fn set_current_book(&mut self, book_id: Option<BookId>) -> bool {
        if let Some(id) = &book_id {
            if !self.books.contains_key(id) {
                return false;
            }
        }
        debug!("current book -> {:?}", book_id);
        self.current = book_id;
        true
    }

    pub fn current_book_id(&self) -> Option<&BookId> {
        self.current.as_ref()
    }

    pub fn current_book(&self) -> Option<&Book> {
        self.current.as_ref().and_then(|id| self.books.get(id))
    }

    /// Shallow-merge into a book's snapshot
    pub fn update_world_data(&mut self, book_id: &BookId, patch: WorldDataPatch) -> bool {
        let Some(book) = self.books.get_mut(book_id) else {
            return false;
        };
        patch.apply_to(&mut book.world_data);
        book.touch();
        true
    }

    pub fn world_data(&self, book_id: &BookId) -> Option<&WorldData> {
        self.books.get(book_id).map(|b| &b.world_data)
    }

    pub fn get(&self, book_id: &BookId) -> Option<&Book> {
        self.books.get(book_id)
    }

    pub fn contains(&self, book_id: &BookId) -> bool {
        self.books.contains_key(book_id)
    }

    /// Books in creation (or import) order
    pub fn books(&self) -> impl Iterator<Item = &Book> {
        self.books.values()
    }

    /// The id-keyed books map
    pub fn book_map(&self) -> &IndexMap<BookId, Book> {
        &self.books
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    pub fn view_mode(&self) -> BookViewMode {
        self.view_mode
    }

    pub fn set_view_mode(&mut self, mode: BookViewMode) {
        self.view_mode = mode;
    }

    pub fn settings(&self) -> &LibrarySettings {
        &self.settings
    }

    pub fn update_settings(&mut self, patch: SettingsPatch) {
        patch.apply_to(&mut self.settings);
    }

    pub fn cover_presets(&self) -> &[BookCoverPreset] {
        &self.cover_presets
    }
}

impl Default for BookStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kanvas_core::Point;

    #[test]
    fn test_create_book_defaults() {
        let mut store = BookStore::new();
        let id = store.create_book(NewBook::new("Atlas").with_description("Maps"));
        let book = store.get(&id).unwrap();

        assert_eq!(book.title, "Atlas");
        assert_eq!(book.color, "#3b82f6");
        assert_eq!(book.created_at, book.updated_at);
        assert!(book.world_data.assets.is_empty());
        assert_eq!(book.world_data.viewport_offset, Point::new(-45.0, -20.0));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_create_book_uses_configured_canvas() {
        let config = KanvasConfig::from_ron_str("(canvas: (offset: (x: 0.0, y: 0.0), scale: 2.0))")
            .unwrap();
        let mut store = BookStore::with_config(&config);
        let id = store.create_book(NewBook::new("Atlas"));
        let world = store.world_data(&id).unwrap();
        assert_eq!(world.viewport_offset, Point::new(0.0, 0.0));
        assert_eq!(world.viewport_scale, 2.0);
    }

    #[test]
    fn test_update_book() {
        let mut store = BookStore::new();
        let id = store.create_book(NewBook::new("Atlas"));
        assert!(store.update_book(&id, BookPatch::title("Atlas II")));
        assert_eq!(store.get(&id).unwrap().title, "Atlas II");
        assert!(!store.update_book(&BookId::new("ghost"), BookPatch::title("x")));
    }

    #[test]
    fn test_delete_current_clears_pointer() {
        let mut store = BookStore::new();
        let a = store.create_book(NewBook::new("A"));
        let b = store.create_book(NewBook::new("B"));
        assert!(store.set_current_book(Some(a.clone())));

        assert!(store.delete_book(&b));
        assert_eq!(store.current_book_id(), Some(&a));
        assert!(store.delete_book(&a));
        assert!(store.current_book_id().is_none());
        assert!(!store.delete_book(&a));
    }

    #[test]
    fn test_set_current_unknown_refused() {
        let mut store = BookStore::new();
        let a = store.create_book(NewBook::new("A"));
        store.set_current_book(Some(a.clone()));
        assert!(!store.set_current_book(Some(BookId::new("ghost"))));
        assert_eq!(store.current_book().map(|b| &b.id), Some(&a));
        assert!(store.set_current_book(None));
        assert!(store.current_book().is_none());
    }

    #[test]
    fn test_update_world_data() {
        let mut store = BookStore::new();
        let id = store.create_book(NewBook::new("A"));
        assert!(store.update_world_data(
            &id,
            WorldDataPatch {
                viewport_scale: Some(0.5),
                ..Default::default()
            }
        ));
        assert_eq!(store.world_data(&id).unwrap().viewport_scale, 0.5);
        assert!(!store.update_world_data(&BookId::new("ghost"), WorldDataPatch::default()));
    }

    #[test]
    fn test_settings_and_view_mode() {
        let mut store = BookStore::new();
        store.set_view_mode(BookViewMode::Grid);
        assert_eq!(store.view_mode(), BookViewMode::Grid);

        store.update_settings(SettingsPatch {
            auto_save: Some(false),
            ..Default::default()
        });
        assert!(!store.settings().auto_save);
        assert!(store.settings().show_book_descriptions);
        assert_eq!(store.cover_presets().len(), 6);
    }
}
