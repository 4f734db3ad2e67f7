//! Client side of a property-listing marketplace: session state, a REST
//! client for the backend, listing search and filters, image carousels and
//! the login gate in front of protected views.

pub mod actions;
pub mod api;
pub mod config;
pub mod error;
pub mod guard;
pub mod lifecycle;
pub mod listing;
pub mod models;
pub mod session;
pub mod validation;

pub use error::{MarketError, Result};
