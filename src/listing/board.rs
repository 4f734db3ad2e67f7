use tracing::{debug, info};

use crate::api::MarketApi;
use crate::error::{MarketError, Result};
use crate::listing::carousel::{CarouselState, ModalCarousel};
use crate::listing::filter::{
    filter_listings, ActiveFilters, FilterChoice, FilterCriteria, FilterKind,
};
use crate::models::Listing;
use crate::session::SessionStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalMode {
    View,
    ConfirmDelete,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Modal {
    id: String,
    mode: ModalMode,
}

/// State behind a listing grid: the fetched array, the filters applied to
/// it, one carousel index per card and the optional detail modal.
///
/// The full array changes only through `load`, `remove_local` and
/// `add_local`.
#[derive(Debug, Default)]
pub struct ListingBoard {
    listings: Vec<Listing>,
    criteria: FilterCriteria,
    active: ActiveFilters,
    carousel: CarouselState,
    modal: Option<Modal>,
    modal_carousel: ModalCarousel,
}

impl ListingBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the full array with a fresh fetch
    pub fn load(&mut self, listings: Vec<Listing>) {
        info!("Loaded {} listings", listings.len());
        self.carousel.reset_for(&listings);
        self.listings = listings;
        let modal_gone = self
            .modal
            .as_ref()
            .map(|m| self.find(&m.id).is_none())
            .unwrap_or(false);
        if modal_gone {
            self.close();
        }
    }

    pub fn all(&self) -> &[Listing] {
        &self.listings
    }

    pub fn visible(&self) -> Vec<&Listing> {
        filter_listings(&self.listings, &self.criteria)
    }

    pub fn find(&self, id: &str) -> Option<&Listing> {
        self.listings.iter().find(|l| l.id == id)
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.criteria.query = query.into();
    }

    pub fn select(&mut self, choice: FilterChoice) {
        self.active.select(&mut self.criteria, choice);
    }

    pub fn remove_filter(&mut self, kind: FilterKind) {
        self.active.remove(&mut self.criteria, kind);
    }

    pub fn chips(&self) -> &[FilterChoice] {
        self.active.chips()
    }

    pub fn image_index(&self, id: &str) -> usize {
        self.carousel.index(id)
    }

    pub fn current_image(&self, id: &str) -> Option<&str> {
        self.find(id).and_then(|l| self.carousel.current_image(l))
    }

    pub fn next_image(&mut self, id: &str) -> usize {
        let count = self.image_count(id);
        self.carousel.advance(id, count)
    }

    pub fn prev_image(&mut self, id: &str) -> usize {
        let count = self.image_count(id);
        self.carousel.retreat(id, count)
    }

    /// Update and delete controls are shown to the admin only
    pub fn can_manage(&self, session: &SessionStore) -> bool {
        session.is_admin()
    }

    fn image_count(&self, id: &str) -> usize {
        self.find(id).map(|l| l.images.len()).unwrap_or(0)
    }

    pub fn open_view(&mut self, id: &str) -> bool {
        self.open(id, ModalMode::View)
    }

    pub fn open_delete(&mut self, id: &str) -> bool {
        self.open(id, ModalMode::ConfirmDelete)
    }

    fn open(&mut self, id: &str, mode: ModalMode) -> bool {
        if self.find(id).is_none() {
            return false;
        }
        let same_listing = self.modal.as_ref().map(|m| m.id == id).unwrap_or(false);
        if !same_listing {
            self.modal_carousel.reset();
        }
        self.modal = Some(Modal {
            id: id.to_string(),
            mode,
        });
        true
    }

    pub fn close(&mut self) {
        self.modal = None;
        self.modal_carousel.reset();
    }

    pub fn modal(&self) -> Option<(&Listing, ModalMode)> {
        let modal = self.modal.as_ref()?;
        self.find(&modal.id).map(|l| (l, modal.mode))
    }

    pub fn modal_image_index(&self) -> usize {
        self.modal_carousel.index()
    }

    pub fn modal_image(&self) -> Option<&str> {
        self.modal().and_then(|(l, _)| self.modal_carousel.current_image(l))
    }

    pub fn modal_next_image(&mut self) -> usize {
        let count = self.modal().map(|(l, _)| l.images.len()).unwrap_or(0);
        self.modal_carousel.advance(count)
    }

    pub fn modal_prev_image(&mut self) -> usize {
        let count = self.modal().map(|(l, _)| l.images.len()).unwrap_or(0);
        self.modal_carousel.retreat(count)
    }

    /// Drop a listing after the backend confirmed its deletion
    pub fn remove_local(&mut self, id: &str) -> Option<Listing> {
        let pos = self.listings.iter().position(|l| l.id == id)?;
        let removed = self.listings.remove(pos);
        self.carousel.forget(id);
        if self.modal.as_ref().map(|m| m.id == id).unwrap_or(false) {
            self.close();
        }
        debug!(listing = %id, "Removed listing locally");
        Some(removed)
    }

    /// Append a listing the backend just created
    pub fn add_local(&mut self, listing: Listing) {
        debug!(listing = %listing.id, "Added listing locally");
        self.carousel.forget(&listing.id);
        self.listings.push(listing);
    }

    /// Delete the listing the confirm-delete modal is open on.
    ///
    /// Local state changes only when the backend call succeeds; on failure
    /// the modal stays open.
    pub async fn confirm_delete(&mut self, api: &dyn MarketApi) -> Result<Listing> {
        let id = match &self.modal {
            Some(Modal {
                id,
                mode: ModalMode::ConfirmDelete,
            }) => id.clone(),
            _ => {
                return Err(MarketError::NotFound(
                    "no listing selected for deletion".to_string(),
                ))
            }
        };

        api.delete_listing(&id).await?;
        info!(listing = %id, "Deleted listing");
        self.remove_local(&id).ok_or(MarketError::NotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::User;
    use crate::session::MemoryStorage;
    use serde_json::json;
    use std::sync::Arc;

    fn listing(id: &str, images: &[&str]) -> Listing {
        serde_json::from_value(json!({
            "_id": id,
            "title": format!("Listing {id}"),
            "price": 100,
            "images": images,
        }))
        .unwrap()
    }

    fn board() -> ListingBoard {
        let mut board = ListingBoard::new();
        board.load(vec![listing("a", &["1", "2", "3"]), listing("b", &["x"])]);
        board
    }

    #[test]
    fn test_load_resets_card_indices() {
        let mut board = board();
        board.next_image("a");
        assert_eq!(board.image_index("a"), 1);

        board.load(vec![listing("a", &["1", "2", "3"])]);
        assert_eq!(board.image_index("a"), 0);
    }

    #[test]
    fn test_card_navigation_uses_listing_image_count() {
        let mut board = board();
        assert_eq!(board.prev_image("a"), 2);
        assert_eq!(board.current_image("a"), Some("3"));
        assert_eq!(board.next_image("b"), 0);
    }

    #[test]
    fn test_modal_index_resets_on_new_listing_and_close() {
        let mut board = board();
        assert!(board.open_view("a"));
        board.modal_next_image();
        assert_eq!(board.modal_image(), Some("2"));

        board.open_delete("a");
        assert_eq!(board.modal_image_index(), 1);

        board.open_view("b");
        assert_eq!(board.modal_image_index(), 0);

        board.open_view("a");
        board.modal_next_image();
        board.close();
        assert_eq!(board.modal_image_index(), 0);
        assert!(board.modal().is_none());
    }

    #[test]
    fn test_open_unknown_listing_fails() {
        let mut board = board();
        assert!(!board.open_view("zzz"));
        assert!(board.modal().is_none());
    }

    #[test]
    fn test_remove_local_closes_modal() {
        let mut board = board();
        board.open_delete("a");
        assert!(board.remove_local("a").is_some());
        assert!(board.modal().is_none());
        assert_eq!(board.all().len(), 1);
        assert!(board.remove_local("a").is_none());
    }

    #[test]
    fn test_add_local_shows_in_visible() {
        let mut board = board();
        board.add_local(listing("c", &[]));
        assert_eq!(board.visible().len(), 3);
        assert_eq!(board.image_index("c"), 0);
    }

    #[test]
    fn test_can_manage_follows_admin_role() {
        let board = board();
        let session = SessionStore::new(Arc::new(MemoryStorage::new()), "admin@estate.test");
        assert!(!board.can_manage(&session));

        session.login("t", User::with_email("buyer@estate.test")).unwrap();
        assert!(!board.can_manage(&session));

        session.login("t", User::with_email("admin@estate.test")).unwrap();
        assert!(board.can_manage(&session));

        session.clear();
        assert!(!board.can_manage(&session));
    }
}
