use async_trait::async_trait;

use crate::api::types::{AuthResponse, Credentials, ListingDraft, ListingUpdate, Registration};
use crate::error::Result;
use crate::models::{Listing, User};

/// Everything the marketplace backend offers, one method per resource action.
///
/// Each call runs exactly once: no retries, no per-call timeout, no
/// cancellation beyond dropping the future.
#[async_trait]
pub trait MarketApi: Send + Sync {
    async fn register(&self, registration: &Registration) -> Result<serde_json::Value>;

    /// Authenticate. Does not touch the session; see `actions::login`.
    async fn authenticate(&self, credentials: &Credentials) -> Result<AuthResponse>;

    /// Tell the backend a token is no longer in use
    async fn logout(&self, token: &str) -> Result<()>;

    /// Listings owned by the logged-in user
    async fn my_listings(&self) -> Result<Vec<Listing>>;

    /// Every public listing
    async fn all_listings(&self) -> Result<Vec<Listing>>;

    async fn get_listing(&self, id: &str) -> Result<Listing>;

    async fn create_listing(&self, draft: &ListingDraft) -> Result<Listing>;

    async fn update_listing(&self, id: &str, update: &ListingUpdate) -> Result<Listing>;

    async fn delete_listing(&self, id: &str) -> Result<()>;

    async fn profile(&self) -> Result<User>;
}
