use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{Listing, ListingType, PropertyType, User};

/// Maximum number of image files attached to one create request
pub const MAX_IMAGES: usize = 5;

#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    pub email: String,
    pub password: String,
    #[serde(rename = "username", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Body of a successful login
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    #[serde(default)]
    pub user: Option<User>,
}

/// Either a bare user or `{ "user": { ... } }`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ProfileBody {
    Wrapped { user: User },
    Bare(User),
}

impl From<ProfileBody> for User {
    fn from(body: ProfileBody) -> Self {
        match body {
            ProfileBody::Wrapped { user } => user,
            ProfileBody::Bare(user) => user,
        }
    }
}

/// An image file to attach to a multipart request
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    pub async fn from_path(path: &Path) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        let content_type = content_type_for(&file_name).to_string();
        Ok(Self {
            file_name,
            content_type,
            bytes,
        })
    }
}

fn content_type_for(file_name: &str) -> &'static str {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}

/// Validated, typed listing fields shared by create and update
#[derive(Debug, Clone, PartialEq)]
pub struct ListingFields {
    pub title: String,
    pub description: String,
    pub property_type: PropertyType,
    pub listing_type: ListingType,
    pub location: String,
    pub price: f64,
    pub bedrooms: Option<u32>,
    pub carpet_area: Option<f64>,
    pub build_up_area: Option<f64>,
    pub contact_number: Option<String>,
}

impl ListingFields {
    /// Multipart text parts, in form order
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            ("title", self.title.clone()),
            ("description", self.description.clone()),
            ("typeOfProperty", self.property_type.to_string()),
            ("listingType", self.listing_type.to_string()),
            ("location", self.location.clone()),
            ("price", self.price.to_string()),
        ];
        if let Some(bhk) = self.bedrooms {
            fields.push(("bhk", bhk.to_string()));
        }
        if let Some(area) = self.carpet_area {
            fields.push(("carpetArea", area.to_string()));
        }
        if let Some(area) = self.build_up_area {
            fields.push(("buildUpArea", area.to_string()));
        }
        if let Some(contact) = &self.contact_number {
            fields.push(("contactNumber", contact.clone()));
        }
        fields
    }

    /// Build the listing a successful create would produce, for local add
    pub fn to_listing(&self, id: String, images: Vec<String>) -> Listing {
        Listing {
            id,
            title: self.title.clone(),
            description: self.description.clone(),
            property_type: Some(self.property_type),
            listing_type: Some(self.listing_type),
            location: self.location.clone(),
            price: self.price,
            bedrooms: self.bedrooms,
            carpet_area: self.carpet_area,
            build_up_area: self.build_up_area,
            contact_number: self.contact_number.clone(),
            images,
            created_at: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ListingDraft {
    pub fields: ListingFields,
    pub images: Vec<ImageUpload>,
}

/// Edits to an existing listing: new fields, added files, and which of
/// the current images to keep or drop
#[derive(Debug, Clone)]
pub struct ListingUpdate {
    pub fields: ListingFields,
    pub new_images: Vec<ImageUpload>,
    pub removed_images: Vec<String>,
    pub retained_images: Vec<String>,
}

impl ListingUpdate {
    /// Start an update that keeps every image the listing already has
    pub fn keeping_images(fields: ListingFields, current: &Listing) -> Self {
        Self {
            fields,
            new_images: Vec::new(),
            removed_images: Vec::new(),
            retained_images: current.images.clone(),
        }
    }

    /// Mark an existing image for removal. Returns false if it was not retained.
    pub fn remove_image(&mut self, url: &str) -> bool {
        let Some(pos) = self.retained_images.iter().position(|u| u == url) else {
            return false;
        };
        let url = self.retained_images.remove(pos);
        self.removed_images.push(url);
        true
    }
}
