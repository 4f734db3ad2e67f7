//! In-memory backend used by the integration tests

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use serde_json::{json, Value};

use estate_market::api::{
    AuthResponse, Credentials, ListingDraft, ListingUpdate, MarketApi, Registration,
};
use estate_market::models::{Listing, User};
use estate_market::session::{MemoryStorage, SessionStore};
use estate_market::{MarketError, Result};

pub const ADMIN: &str = "admin@estate.test";

pub fn store() -> Arc<SessionStore> {
    Arc::new(SessionStore::new(Arc::new(MemoryStorage::new()), ADMIN))
}

pub fn listing(id: &str, title: &str, price: f64, day: Option<u32>) -> Listing {
    let mut value = json!({
        "_id": id,
        "title": title,
        "description": format!("{title} description"),
        "location": "Bengaluru",
        "price": price,
        "images": [format!("https://img/{id}/1.jpg"), format!("https://img/{id}/2.jpg")],
    });
    if let Some(day) = day {
        value["createdAt"] = Value::String(
            Utc.with_ymd_and_hms(2024, 5, day, 12, 0, 0)
                .unwrap()
                .to_rfc3339(),
        );
    }
    serde_json::from_value(value).unwrap()
}

#[derive(Default)]
pub struct FakeApi {
    pub calls: Mutex<Vec<String>>,
    pub listings: Mutex<Vec<Listing>>,
    pub fail_logout: bool,
    pub fail_delete: bool,
    pub login_user: Option<User>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_listings(listings: Vec<Listing>) -> Self {
        Self {
            listings: Mutex::new(listings),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }
}

#[async_trait]
impl MarketApi for FakeApi {
    async fn register(&self, registration: &Registration) -> Result<Value> {
        self.record(format!("register {}", registration.email));
        Ok(json!({ "message": "registered" }))
    }

    async fn authenticate(&self, credentials: &Credentials) -> Result<AuthResponse> {
        self.record(format!("login {}", credentials.email));
        if credentials.password != "secret1" {
            return Err(MarketError::Api {
                status: 401,
                message: "Invalid credentials".to_string(),
                field_errors: Default::default(),
            });
        }
        Ok(AuthResponse {
            token: format!("token-for-{}", credentials.email),
            user: self.login_user.clone(),
        })
    }

    async fn logout(&self, token: &str) -> Result<()> {
        self.record(format!("logout {token}"));
        if self.fail_logout {
            return Err(MarketError::Transport("connection refused".to_string()));
        }
        Ok(())
    }

    async fn my_listings(&self) -> Result<Vec<Listing>> {
        self.record("my_listings");
        Ok(self.listings.lock().unwrap().clone())
    }

    async fn all_listings(&self) -> Result<Vec<Listing>> {
        self.record("all_listings");
        Ok(self.listings.lock().unwrap().clone())
    }

    async fn get_listing(&self, id: &str) -> Result<Listing> {
        self.record(format!("get {id}"));
        self.listings
            .lock()
            .unwrap()
            .iter()
            .find(|l| l.id == id)
            .cloned()
            .ok_or_else(|| MarketError::Api {
                status: 404,
                message: "Property not found".to_string(),
                field_errors: Default::default(),
            })
    }

    async fn create_listing(&self, draft: &ListingDraft) -> Result<Listing> {
        self.record(format!("create {}", draft.fields.title));
        let images = draft
            .images
            .iter()
            .map(|i| format!("https://img/new/{}", i.file_name))
            .collect();
        let listing = draft.fields.to_listing("new-1".to_string(), images);
        self.listings.lock().unwrap().push(listing.clone());
        Ok(listing)
    }

    async fn update_listing(&self, id: &str, update: &ListingUpdate) -> Result<Listing> {
        self.record(format!(
            "update {id} removed={} kept={}",
            update.removed_images.len(),
            update.retained_images.len()
        ));
        let mut images = update.retained_images.clone();
        images.extend(
            update
                .new_images
                .iter()
                .map(|i| format!("https://img/{id}/{}", i.file_name)),
        );
        Ok(update.fields.to_listing(id.to_string(), images))
    }

    async fn delete_listing(&self, id: &str) -> Result<()> {
        self.record(format!("delete {id}"));
        if self.fail_delete {
            return Err(MarketError::Api {
                status: 500,
                message: "Failed to delete property".to_string(),
                field_errors: Default::default(),
            });
        }
        self.listings.lock().unwrap().retain(|l| l.id != id);
        Ok(())
    }

    async fn profile(&self) -> Result<User> {
        self.record("profile");
        Ok(User::with_email("someone@estate.test"))
    }
}

impl FakeApi {
    /// Current backend contents without recording a call
    pub fn all_listings_now(&self) -> Vec<Listing> {
        self.listings.lock().unwrap().clone()
    }
}
