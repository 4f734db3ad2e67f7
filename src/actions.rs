//! Form submissions as views perform them: validate first, never issue a
//! request for an invalid form, and keep the submit control disabled while
//! a request is in flight.

use tracing::info;

use crate::api::{ListingUpdate, MarketApi};
use crate::error::Result;
use crate::lifecycle::SubmitGate;
use crate::models::{Listing, Session, User};
use crate::session::SessionStore;
use crate::validation::{ListingForm, LoginForm, SignupForm};

pub async fn login(
    api: &dyn MarketApi,
    session: &SessionStore,
    gate: &SubmitGate,
    form: &LoginForm,
) -> Result<Session> {
    let credentials = form.validate()?;
    let _ticket = gate.try_begin()?;

    let response = api.authenticate(&credentials).await?;
    let user = response
        .user
        .unwrap_or_else(|| User::with_email(credentials.email.clone()));
    session.login(response.token, user)
}

pub async fn signup(api: &dyn MarketApi, gate: &SubmitGate, form: &SignupForm) -> Result<()> {
    let registration = form.validate()?;
    let _ticket = gate.try_begin()?;

    api.register(&registration).await?;
    info!("Registered new account");
    Ok(())
}

pub async fn create_listing(
    api: &dyn MarketApi,
    gate: &SubmitGate,
    form: ListingForm,
) -> Result<Listing> {
    let draft = form.into_draft()?;
    let _ticket = gate.try_begin()?;

    let listing = api.create_listing(&draft).await?;
    info!(listing = %listing.id, "Property created successfully");
    Ok(listing)
}

/// Validate `form` and send it as an update of `current`, dropping the
/// images listed in `remove`
pub async fn update_listing(
    api: &dyn MarketApi,
    gate: &SubmitGate,
    current: &Listing,
    form: ListingForm,
    remove: &[String],
) -> Result<Listing> {
    let fields = form.validate()?;
    let mut update = ListingUpdate::keeping_images(fields, current);
    update.new_images = form.images;
    for url in remove {
        update.remove_image(url);
    }

    let _ticket = gate.try_begin()?;
    let listing = api.update_listing(&current.id, &update).await?;
    info!(listing = %listing.id, "Property updated");
    Ok(listing)
}

/// Prefill an edit form from a fetched listing
pub fn form_from_listing(listing: &Listing) -> ListingForm {
    fn num(value: Option<f64>) -> String {
        value.map(|v| v.to_string()).unwrap_or_default()
    }

    ListingForm {
        title: listing.title.clone(),
        description: listing.description.clone(),
        property_type: listing
            .property_type
            .map(|t| t.to_string())
            .unwrap_or_default(),
        listing_type: listing
            .listing_type
            .map(|t| t.to_string())
            .unwrap_or_default(),
        location: listing.location.clone(),
        price: if listing.price.is_nan() {
            String::new()
        } else {
            listing.price.to_string()
        },
        bedrooms: listing.bedrooms.map(|b| b.to_string()).unwrap_or_default(),
        carpet_area: num(listing.carpet_area),
        build_up_area: num(listing.build_up_area),
        contact_number: listing.contact_number.clone().unwrap_or_default(),
        images: Vec::new(),
    }
}
