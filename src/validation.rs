//! Client-side form checks, run before any request is sent

use regex::Regex;

use crate::api::types::{
    Credentials, ImageUpload, ListingDraft, ListingFields, Registration, MAX_IMAGES,
};
use crate::error::{MarketError, Result, ValidationErrors};
use crate::models::{ListingType, PropertyType};

lazy_static::lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"\S+@\S+\.\S+").unwrap();
}

/// Raw listing form input, exactly as typed
#[derive(Debug, Clone, Default)]
pub struct ListingForm {
    pub title: String,
    pub description: String,
    pub property_type: String,
    pub listing_type: String,
    pub location: String,
    pub price: String,
    pub bedrooms: String,
    pub carpet_area: String,
    pub build_up_area: String,
    pub contact_number: String,
    pub images: Vec<ImageUpload>,
}

impl ListingForm {
    /// Check every field and collect one message per bad field
    pub fn validate(&self) -> Result<ListingFields> {
        let mut errors = ValidationErrors::new();

        let title = required(&mut errors, "title", "Title", &self.title);
        let description = required(&mut errors, "description", "Description", &self.description);
        let location = required(&mut errors, "location", "Location", &self.location);

        let property_type = match self.property_type.trim() {
            "" => {
                errors.add("property_type", "Property type is required");
                None
            }
            raw => raw
                .parse::<PropertyType>()
                .map_err(|_| errors.add("property_type", "Select a valid property type"))
                .ok(),
        };

        let listing_type = match self.listing_type.trim() {
            "" => {
                errors.add("listing_type", "Listing type is required");
                None
            }
            raw => raw
                .parse::<ListingType>()
                .map_err(|_| errors.add("listing_type", "Listing type must be sale or rent"))
                .ok(),
        };

        let price = match self.price.trim() {
            "" => {
                errors.add("price", "Price is required");
                None
            }
            raw => match raw.parse::<f64>() {
                Ok(p) if p.is_finite() && p >= 0.0 => Some(p),
                _ => {
                    errors.add("price", "Price must be a non-negative number");
                    None
                }
            },
        };

        let bedrooms = optional_number(&mut errors, "bedrooms", &self.bedrooms)
            .map(|n| n.round() as u32);
        let carpet_area = optional_number(&mut errors, "carpet_area", &self.carpet_area);
        let build_up_area = optional_number(&mut errors, "build_up_area", &self.build_up_area);

        if self.images.len() > MAX_IMAGES {
            errors.add(
                "images",
                format!("At most {MAX_IMAGES} images can be uploaded"),
            );
        }

        match (property_type, listing_type, price) {
            (Some(property_type), Some(listing_type), Some(price)) if errors.is_empty() => {
                Ok(ListingFields {
                    title,
                    description,
                    property_type,
                    listing_type,
                    location,
                    price,
                    bedrooms,
                    carpet_area,
                    build_up_area,
                    contact_number: non_empty(&self.contact_number),
                })
            }
            _ => Err(MarketError::Validation(errors)),
        }
    }

    pub fn into_draft(self) -> Result<ListingDraft> {
        let fields = self.validate()?;
        Ok(ListingDraft {
            fields,
            images: self.images,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    pub fn validate(&self) -> Result<Credentials> {
        let mut errors = ValidationErrors::new();
        check_email(&mut errors, &self.email);
        if self.password.is_empty() {
            errors.add("password", "Password is required");
        }
        errors.into_result()?;

        Ok(Credentials {
            email: self.email.trim().to_string(),
            password: self.password.clone(),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct SignupForm {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl SignupForm {
    pub fn validate(&self) -> Result<Registration> {
        let mut errors = ValidationErrors::new();

        let name = self.name.trim();
        if !name.is_empty() && name.chars().count() < 3 {
            errors.add("name", "Username must be at least 3 characters");
        }
        check_email(&mut errors, &self.email);
        if self.password.is_empty() {
            errors.add("password", "Password is required");
        } else if self.password.chars().count() < 6 {
            errors.add("password", "Password must be at least 6 characters");
        }
        errors.into_result()?;

        Ok(Registration {
            email: self.email.trim().to_string(),
            password: self.password.clone(),
            name: non_empty(name),
        })
    }
}

fn required(errors: &mut ValidationErrors, field: &str, label: &str, value: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        errors.add(field, format!("{label} is required"));
    }
    value.to_string()
}

fn optional_number(errors: &mut ValidationErrors, field: &str, value: &str) -> Option<f64> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    match value.parse::<f64>() {
        Ok(n) if n.is_finite() && n >= 0.0 => Some(n),
        _ => {
            errors.add(field, "Must be a non-negative number");
            None
        }
    }
}

fn check_email(errors: &mut ValidationErrors, email: &str) {
    let email = email.trim();
    if email.is_empty() {
        errors.add("email", "Email is required");
    } else if !EMAIL_RE.is_match(email) {
        errors.add("email", "Please enter a valid email address");
    }
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}
