use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

/// The ten property categories a listing can belong to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum PropertyType {
    Flats,
    #[serde(rename = "Builder Floors")]
    BuilderFloors,
    #[serde(rename = "House Villas")]
    HouseVillas,
    Plots,
    Farmhouses,
    Hotels,
    Lands,
    #[serde(rename = "Office Spaces")]
    OfficeSpaces,
    Hostels,
    #[serde(rename = "Shops Showrooms")]
    ShopsShowrooms,
}

impl PropertyType {
    pub const ALL: [PropertyType; 10] = [
        PropertyType::Flats,
        PropertyType::BuilderFloors,
        PropertyType::HouseVillas,
        PropertyType::Plots,
        PropertyType::Farmhouses,
        PropertyType::Hotels,
        PropertyType::Lands,
        PropertyType::OfficeSpaces,
        PropertyType::Hostels,
        PropertyType::ShopsShowrooms,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyType::Flats => "Flats",
            PropertyType::BuilderFloors => "Builder Floors",
            PropertyType::HouseVillas => "House Villas",
            PropertyType::Plots => "Plots",
            PropertyType::Farmhouses => "Farmhouses",
            PropertyType::Hotels => "Hotels",
            PropertyType::Lands => "Lands",
            PropertyType::OfficeSpaces => "Office Spaces",
            PropertyType::Hostels => "Hostels",
            PropertyType::ShopsShowrooms => "Shops Showrooms",
        }
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PropertyType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PropertyType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown property type: {s}"))
    }
}

/// Whether a listing is offered for sale or for rent.
///
/// Serialized as lowercase `sale` / `rent`. Parsing is case-insensitive and
/// also accepts `sell`, which some records carry instead of `sale`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ListingType {
    Sale,
    Rent,
}

impl ListingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListingType::Sale => "sale",
            ListingType::Rent => "rent",
        }
    }
}

impl fmt::Display for ListingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ListingType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sale" | "sell" => Ok(ListingType::Sale),
            "rent" => Ok(ListingType::Rent),
            other => Err(format!("unknown listing type: {other}")),
        }
    }
}

/// A single property-for-sale-or-rent record
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "ListingRecord", rename_all = "camelCase")]
pub struct Listing {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "typeOfProperty")]
    pub property_type: Option<PropertyType>,
    pub listing_type: Option<ListingType>,
    pub location: String,
    /// NaN when the backend sent something that is not a number
    pub price: f64,
    #[serde(rename = "bhk")]
    pub bedrooms: Option<u32>,
    pub carpet_area: Option<f64>,
    pub build_up_area: Option<f64>,
    pub contact_number: Option<String>,
    pub images: Vec<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl Listing {
    /// Price as the search box sees it
    pub fn price_text(&self) -> String {
        self.price.to_string()
    }

    pub fn posted_ago(&self, now: DateTime<Utc>) -> Option<String> {
        self.created_at.map(|at| relative_time(at, now))
    }
}

/// Wire shape of a listing. Records are not uniform: the id may be `_id`
/// or `id`, price may be a string, and images may come as `images`,
/// `image` or `imageUrl`. Every field is read loosely so one odd record
/// never fails a whole list.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListingRecord {
    #[serde(rename = "_id", alias = "id", default)]
    id: Value,
    #[serde(default)]
    title: Value,
    #[serde(default)]
    description: Value,
    #[serde(default)]
    type_of_property: Value,
    #[serde(default)]
    listing_type: Value,
    #[serde(default)]
    location: Value,
    #[serde(default)]
    price: Value,
    #[serde(default)]
    bhk: Value,
    #[serde(default, alias = "area")]
    carpet_area: Value,
    #[serde(default)]
    build_up_area: Value,
    #[serde(default)]
    contact_number: Value,
    #[serde(default)]
    images: Value,
    #[serde(default)]
    image: Value,
    #[serde(default)]
    image_url: Value,
    #[serde(default)]
    created_at: Value,
}

impl From<ListingRecord> for Listing {
    fn from(record: ListingRecord) -> Self {
        let id = optional_text(&record.id).unwrap_or_default();

        let property_type = optional_text(&record.type_of_property).and_then(|raw| {
            raw.parse::<PropertyType>()
                .map_err(|e| warn!(listing = %id, "{e}"))
                .ok()
        });
        let listing_type = optional_text(&record.listing_type).and_then(|raw| {
            raw.parse::<ListingType>()
                .map_err(|e| warn!(listing = %id, "{e}"))
                .ok()
        });

        let images = match &record.images {
            Value::Array(items) => items.iter().filter_map(optional_text).collect(),
            _ => optional_text(&record.image)
                .or_else(|| optional_text(&record.image_url))
                .into_iter()
                .collect(),
        };

        let created_at = optional_text(&record.created_at).and_then(|raw| {
            DateTime::parse_from_rfc3339(&raw)
                .map(|at| at.with_timezone(&Utc))
                .map_err(|e| warn!(listing = %id, "Unreadable createdAt {raw}: {e}"))
                .ok()
        });

        Listing {
            title: optional_text(&record.title).unwrap_or_default(),
            description: optional_text(&record.description).unwrap_or_default(),
            property_type,
            listing_type,
            location: optional_text(&record.location).unwrap_or_default(),
            price: number_or_nan(&record.price),
            bedrooms: optional_number(&record.bhk).map(|n| n as u32),
            carpet_area: optional_number(&record.carpet_area),
            build_up_area: optional_number(&record.build_up_area),
            contact_number: optional_text(&record.contact_number),
            images,
            created_at,
            id,
        }
    }
}

/// Strings as-is, numbers and booleans in their JSON spelling, anything
/// else (null, arrays, objects, blank strings) as absent
fn optional_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn number_or_nan(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        Value::String(s) => s.trim().parse().unwrap_or(f64::NAN),
        _ => f64::NAN,
    }
}

fn optional_number(value: &Value) -> Option<f64> {
    match value {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        other => {
            let n = number_or_nan(other);
            (!n.is_nan() && n >= 0.0).then_some(n)
        }
    }
}

/// Account as returned by login and profile endpoints
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id", alias = "id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub email: String,
    #[serde(default, alias = "username", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn with_email(email: impl Into<String>) -> Self {
        Self {
            id: None,
            email: email.into(),
            name: None,
            created_at: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Member,
}

impl Role {
    /// Exact, case-sensitive comparison against the configured admin email
    pub fn from_email(email: &str, admin_email: &str) -> Self {
        if email == admin_email {
            Role::Admin
        } else {
            Role::Member
        }
    }
}

/// Logged-in state: the bearer token plus who it belongs to.
///
/// The role is computed once when the session is created.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub token: String,
    pub user: Option<User>,
    pub role: Role,
}

impl Session {
    pub fn new(token: String, user: Option<User>, admin_email: &str) -> Self {
        let role = user
            .as_ref()
            .map(|u| Role::from_email(&u.email, admin_email))
            .unwrap_or(Role::Member);
        Self { token, user, role }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Render the distance between `at` and `now` as "3 days ago"
pub fn relative_time(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - at).num_seconds();
    if seconds < 0 {
        return "just now".to_string();
    }

    let minutes = (seconds as f64 / 60.0).round() as i64;
    let hours = (seconds as f64 / 3600.0).round() as i64;
    let days = (seconds as f64 / 86_400.0).round() as i64;

    match seconds {
        s if s < 45 => "a few seconds ago".to_string(),
        s if s < 90 => "a minute ago".to_string(),
        s if s < 45 * 60 => format!("{minutes} minutes ago"),
        s if s < 90 * 60 => "an hour ago".to_string(),
        s if s < 22 * 3600 => format!("{hours} hours ago"),
        s if s < 36 * 3600 => "a day ago".to_string(),
        s if s < 26 * 86_400 => format!("{days} days ago"),
        s if s < 45 * 86_400 => "a month ago".to_string(),
        s if s < 320 * 86_400 => format!("{} months ago", (days as f64 / 30.0).round() as i64),
        s if s < 548 * 86_400 => "a year ago".to_string(),
        _ => format!("{} years ago", (days as f64 / 365.0).round() as i64),
    }
}
