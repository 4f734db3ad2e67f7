use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use estate_market::listing::{PriceRange, SortOrder};
use estate_market::models::{ListingType, PropertyType};

#[derive(Parser)]
#[command(name = "estate")]
#[command(about = "Browse, filter and manage property listings", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create an account
    Signup {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        /// Display name
        #[arg(long)]
        name: Option<String>,
    },

    /// Log in and store the session
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },

    /// Forget the stored session
    Logout,

    /// Show the stored session
    Whoami,

    /// Fetch the logged-in user's profile
    Profile,

    /// List properties, filtered and sorted
    List {
        /// Only my own listings
        #[arg(long)]
        mine: bool,

        #[command(flatten)]
        filters: FilterArgs,

        /// Also write the listings shown to this JSON file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show one property in detail
    Show {
        id: String,
    },

    /// Create a property listing
    Create {
        #[command(flatten)]
        fields: ListingArgs,
    },

    /// Update a property listing
    Update {
        id: String,

        #[command(flatten)]
        fields: ListingArgs,

        /// Image URL to drop from the listing (repeatable)
        #[arg(long = "remove-image")]
        remove_images: Vec<String>,
    },

    /// Delete a property listing
    Delete {
        id: String,
    },

    /// Check whether a page path would render or redirect
    Route {
        path: String,
    },
}

#[derive(Args, Debug, Default)]
pub struct FilterArgs {
    /// Search title, description, location and price
    #[arg(short, long)]
    pub query: Option<String>,

    /// Property type, e.g. "Flats" or "Office Spaces"
    #[arg(long = "type")]
    pub property_type: Option<PropertyType>,

    /// sale or rent
    #[arg(long)]
    pub listing_type: Option<ListingType>,

    /// Price band, e.g. 0-500000
    #[arg(long)]
    pub price: Option<PriceRange>,

    /// newest or oldest
    #[arg(long)]
    pub sort: Option<SortOrder>,
}

/// Form fields; omitted ones keep their current value on update
#[derive(Args, Debug, Default)]
pub struct ListingArgs {
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long = "type")]
    pub property_type: Option<String>,
    #[arg(long)]
    pub listing_type: Option<String>,
    #[arg(long)]
    pub location: Option<String>,
    #[arg(long)]
    pub price: Option<String>,
    #[arg(long)]
    pub bedrooms: Option<String>,
    #[arg(long)]
    pub carpet_area: Option<String>,
    #[arg(long)]
    pub build_up_area: Option<String>,
    #[arg(long)]
    pub contact_number: Option<String>,
    /// Image file to upload (repeatable, at most 5)
    #[arg(long = "image")]
    pub images: Vec<PathBuf>,
}
