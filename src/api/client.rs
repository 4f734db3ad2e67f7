use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::api::traits::MarketApi;
use crate::api::types::{
    AuthResponse, Credentials, ImageUpload, ListingDraft, ListingUpdate, ProfileBody,
    Registration,
};
use crate::config::Config;
use crate::error::{MarketError, Result};
use crate::models::{Listing, User};
use crate::session::SessionStore;

/// Error body the backend sends with non-2xx responses
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    errors: Option<BTreeMap<String, Value>>,
}

/// Create/update responses are either the listing or `{ "property": ... }`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ListingBody {
    Wrapped {
        #[serde(alias = "listing")]
        property: Listing,
    },
    Bare(Listing),
}

impl From<ListingBody> for Listing {
    fn from(body: ListingBody) -> Self {
        match body {
            ListingBody::Wrapped { property } => property,
            ListingBody::Bare(listing) => listing,
        }
    }
}

/// REST client for the marketplace backend
pub struct HttpMarketApi {
    client: Client,
    base_url: String,
    session: Arc<SessionStore>,
}

impl HttpMarketApi {
    pub fn new(config: &Config, session: Arc<SessionStore>) -> Result<Self> {
        Self::with_base_url(&config.api_base_url, config.timeout, session)
    }

    pub fn with_base_url(
        base_url: &str,
        timeout: Duration,
        session: Arc<SessionStore>,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("estate-market/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| MarketError::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Start a request, attaching the stored bearer token when there is one
    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.client.request(method, self.url(path));
        match self.session.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder, fallback: &str) -> Result<Response> {
        let response = builder.send().await.map_err(|e| {
            warn!("{fallback}: {e}");
            MarketError::Transport(e.to_string())
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        warn!("Backend returned status: {}", status);
        let text = response.text().await.unwrap_or_default();
        Err(api_error(status.as_u16(), &text, fallback))
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        fallback: &str,
    ) -> Result<T> {
        let response = self.send(builder, fallback).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| MarketError::Transport(format!("Failed to read response body: {e}")))
    }

    async fn send_discarding_body(&self, builder: RequestBuilder, fallback: &str) -> Result<()> {
        let response = self.send(builder, fallback).await?;
        let body = response.text().await.unwrap_or_default();
        debug!("Discarded {} bytes of response body", body.len());
        Ok(())
    }
}

fn api_error(status: u16, body: &str, fallback: &str) -> MarketError {
    let parsed = serde_json::from_str::<ErrorBody>(body).ok();

    let message = parsed
        .as_ref()
        .and_then(|b| b.message.clone())
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| fallback.to_string());

    let field_errors = parsed
        .and_then(|b| b.errors)
        .map(|errors| {
            errors
                .into_iter()
                .map(|(field, value)| {
                    let text = match value {
                        Value::String(s) => s,
                        other => other.to_string(),
                    };
                    (field, text)
                })
                .collect()
        })
        .unwrap_or_default();

    MarketError::Api {
        status,
        message,
        field_errors,
    }
}

fn image_part(image: &ImageUpload) -> Result<Part> {
    Part::bytes(image.bytes.clone())
        .file_name(image.file_name.clone())
        .mime_str(&image.content_type)
        .map_err(|e| MarketError::Transport(format!("Invalid image type: {e}")))
}

fn listing_form(draft: &ListingDraft) -> Result<Form> {
    let mut form = Form::new();
    for (name, value) in draft.fields.form_fields() {
        form = form.text(name, value);
    }
    for image in &draft.images {
        form = form.part("images", image_part(image)?);
    }
    Ok(form)
}

fn update_form(update: &ListingUpdate) -> Result<Form> {
    let mut form = Form::new();
    for (name, value) in update.fields.form_fields() {
        form = form.text(name, value);
    }
    for image in &update.new_images {
        form = form.part("images", image_part(image)?);
    }
    for url in &update.removed_images {
        form = form.text("removedImages", url.clone());
    }
    form = form.text(
        "existingImages",
        serde_json::to_string(&update.retained_images)?,
    );
    Ok(form)
}

#[async_trait]
impl MarketApi for HttpMarketApi {
    async fn register(&self, registration: &Registration) -> Result<Value> {
        let builder = self
            .client
            .post(self.url("/register"))
            .json(registration);
        self.send_json(builder, "Signup failed").await
    }

    async fn authenticate(&self, credentials: &Credentials) -> Result<AuthResponse> {
        let builder = self.client.post(self.url("/login")).json(credentials);
        self.send_json(builder, "Login failed").await
    }

    async fn logout(&self, token: &str) -> Result<()> {
        let builder = self.client.post(self.url("/logout")).bearer_auth(token);
        self.send_discarding_body(builder, "Logout failed").await
    }

    async fn my_listings(&self) -> Result<Vec<Listing>> {
        let builder = self.request(Method::GET, "/properties");
        let listings: Vec<Listing> = self.send_json(builder, "Failed to fetch properties").await?;
        info!("Fetched {} own properties", listings.len());
        Ok(listings)
    }

    async fn all_listings(&self) -> Result<Vec<Listing>> {
        let builder = self.request(Method::GET, "/all-properties");
        let listings: Vec<Listing> = self
            .send_json(builder, "Failed to fetch public properties")
            .await?;
        info!("Fetched {} public properties", listings.len());
        Ok(listings)
    }

    async fn get_listing(&self, id: &str) -> Result<Listing> {
        let builder = self.request(Method::GET, &format!("/properties/{id}"));
        let body: ListingBody = self.send_json(builder, "Failed to load property").await?;
        Ok(body.into())
    }

    async fn create_listing(&self, draft: &ListingDraft) -> Result<Listing> {
        let form = listing_form(draft)?;
        debug!("Creating property with {} image(s)", draft.images.len());
        let builder = self.request(Method::POST, "/properties").multipart(form);
        let body: ListingBody = self.send_json(builder, "Failed to create property").await?;
        Ok(body.into())
    }

    async fn update_listing(&self, id: &str, update: &ListingUpdate) -> Result<Listing> {
        let form = update_form(update)?;
        let builder = self
            .request(Method::PUT, &format!("/properties/{id}"))
            .multipart(form);
        let body: ListingBody = self
            .send_json(builder, "Update failed. Please try again.")
            .await?;
        Ok(body.into())
    }

    async fn delete_listing(&self, id: &str) -> Result<()> {
        let builder = self.request(Method::DELETE, &format!("/properties/{id}"));
        self.send_discarding_body(builder, "Failed to delete property")
            .await
    }

    async fn profile(&self) -> Result<User> {
        let builder = self.request(Method::GET, "/profile");
        let body: ProfileBody = self
            .send_json(builder, "Failed to load profile. Please try again.")
            .await?;
        Ok(body.into())
    }
}
