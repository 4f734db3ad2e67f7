mod cli;

use std::sync::Arc;

use anyhow::{bail, Context};
use chrono::Utc;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands, FilterArgs, ListingArgs};
use estate_market::actions;
use estate_market::api::{HttpMarketApi, ImageUpload, MarketApi};
use estate_market::config::Config;
use estate_market::guard::{GuardDecision, GuardedView, Route};
use estate_market::lifecycle::{SubmitGate, ViewScope};
use estate_market::listing::{FilterChoice, ListingBoard};
use estate_market::models::Listing;
use estate_market::session::{FileStorage, SessionStore};
use estate_market::validation::{ListingForm, LoginForm, SignupForm};
use estate_market::MarketError;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let config = Config::load().context("Failed to load configuration")?;
    let storage = Arc::new(FileStorage::new(&config.session_file));
    let session = Arc::new(SessionStore::new(storage, config.admin_email.clone()));
    let api = HttpMarketApi::new(&config, session.clone()).context("Failed to create API client")?;

    // Ctrl-C closes the view; in-flight requests are abandoned
    let scope = ViewScope::new();
    let token = scope.token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            token.cancel();
        }
    });

    let guard = GuardedView::mount(&session);
    let result = run(cli.command, &api, &session, &guard, &scope).await;

    match result {
        Ok(()) => Ok(()),
        Err(MarketError::Validation(errors)) => {
            for (field, message) in errors.fields() {
                eprintln!("  {field}: {message}");
            }
            bail!("Please fix the fields above")
        }
        Err(e) => bail!(e.user_message()),
    }
}

async fn run(
    command: Commands,
    api: &HttpMarketApi,
    session: &SessionStore,
    guard: &GuardedView,
    scope: &ViewScope,
) -> estate_market::Result<()> {
    let gate = SubmitGate::new();

    match command {
        Commands::Signup {
            email,
            password,
            name,
        } => {
            let form = SignupForm {
                name: name.unwrap_or_default(),
                email,
                password,
            };
            scope.run(actions::signup(api, &gate, &form)).await?;
            println!("✅ Account created. You can log in now.");
        }

        Commands::Login { email, password } => {
            let form = LoginForm { email, password };
            let logged_in = scope
                .run(actions::login(api, session, &gate, &form))
                .await?;
            println!("✅ Login successful!");
            if logged_in.is_admin() {
                println!("   Role: admin");
            }
        }

        Commands::Logout => {
            session.logout(api).await;
            println!("👋 Logged out");
        }

        Commands::Whoami => match session.current() {
            Some(current) => {
                let email = current
                    .user
                    .as_ref()
                    .map(|u| u.email.as_str())
                    .unwrap_or("(unknown user)");
                println!("{} ({:?})", email, current.role);
            }
            None => println!("Not logged in"),
        },

        Commands::Profile => {
            enter(guard, &Route::Profile)?;
            let user = scope.run(api.profile()).await?;
            println!("Name:       {}", user.name.as_deref().unwrap_or("-"));
            println!("Email:      {}", user.email);
            println!(
                "Created At: {}",
                user.created_at
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_else(|| "N/A".to_string())
            );
        }

        Commands::List {
            mine,
            filters,
            output,
        } => {
            let route = if mine { Route::MyListings } else { Route::Explore };
            enter(guard, &route)?;

            let listings = if mine {
                scope.run(api.my_listings()).await?
            } else {
                scope.run(api.all_listings()).await?
            };

            let mut board = ListingBoard::new();
            board.load(listings);
            apply_filters(&mut board, filters);

            for chip in board.chips() {
                info!("Filter: {chip}");
            }

            let can_manage = board.can_manage(session);
            let visible = board.visible();
            info!("Showing {} of {} properties", visible.len(), board.all().len());
            for (i, listing) in visible.iter().enumerate() {
                print_card(i + 1, listing, can_manage);
            }

            if let Some(path) = output {
                let json = serde_json::to_string_pretty(&visible)?;
                tokio::fs::write(&path, json).await?;
                info!("💾 Saved {} properties to {}", visible.len(), path.display());
            }
        }

        Commands::Show { id } => {
            enter(guard, &Route::Explore)?;
            let listing = scope.run(api.get_listing(&id)).await?;
            print_detail(&listing);
        }

        Commands::Create { fields } => {
            enter(guard, &Route::CreateListing)?;
            let form = listing_form(fields, ListingForm::default()).await?;
            let listing = scope.run(actions::create_listing(api, &gate, form)).await?;
            println!("✅ Property created successfully! ID: {}", listing.id);
        }

        Commands::Update {
            id,
            fields,
            remove_images,
        } => {
            enter(guard, &Route::UpdateListing(id.clone()))?;
            let current = scope.run(api.get_listing(&id)).await?;
            let form = listing_form(fields, actions::form_from_listing(&current)).await?;
            let updated = scope
                .run(actions::update_listing(api, &gate, &current, form, &remove_images))
                .await?;
            println!("✅ Property {} updated", updated.id);
        }

        Commands::Delete { id } => {
            enter(guard, &Route::MyListings)?;
            let mut board = ListingBoard::new();
            board.load(vec![scope.run(api.get_listing(&id)).await?]);
            if !board.open_delete(&id) {
                return Err(MarketError::NotFound(id));
            }
            let removed = scope.run(board.confirm_delete(api)).await?;
            println!("🗑️  Deleted \"{}\"", removed.title);
        }

        Commands::Route { path } => {
            let route: Route = path.parse().map_err(MarketError::NotFound)?;
            match guard.decide(&route) {
                GuardDecision::Render => println!("{route} renders"),
                GuardDecision::Redirect(to) => println!("{route} redirects to {to}"),
            }
        }
    }

    Ok(())
}

/// Refuse protected commands for visitors who are not logged in
fn enter(guard: &GuardedView, route: &Route) -> estate_market::Result<()> {
    match guard.decide(route) {
        GuardDecision::Render => Ok(()),
        GuardDecision::Redirect(to) => {
            warn!("{route} requires login, redirecting to {to}");
            Err(MarketError::Unauthenticated)
        }
    }
}

fn apply_filters(board: &mut ListingBoard, filters: FilterArgs) {
    if let Some(query) = filters.query {
        board.set_query(query);
    }
    if let Some(t) = filters.property_type {
        board.select(FilterChoice::PropertyType(t));
    }
    if let Some(t) = filters.listing_type {
        board.select(FilterChoice::ListingType(t));
    }
    if let Some(r) = filters.price {
        board.select(FilterChoice::Price(r));
    }
    if let Some(s) = filters.sort {
        board.select(FilterChoice::Sort(s));
    }
}

/// Overlay the given arguments on `base` and read image files
async fn listing_form(args: ListingArgs, base: ListingForm) -> estate_market::Result<ListingForm> {
    let mut images = Vec::with_capacity(args.images.len());
    for path in &args.images {
        images.push(ImageUpload::from_path(path).await?);
    }

    Ok(ListingForm {
        title: args.title.unwrap_or(base.title),
        description: args.description.unwrap_or(base.description),
        property_type: args.property_type.unwrap_or(base.property_type),
        listing_type: args.listing_type.unwrap_or(base.listing_type),
        location: args.location.unwrap_or(base.location),
        price: args.price.unwrap_or(base.price),
        bedrooms: args.bedrooms.unwrap_or(base.bedrooms),
        carpet_area: args.carpet_area.unwrap_or(base.carpet_area),
        build_up_area: args.build_up_area.unwrap_or(base.build_up_area),
        contact_number: args.contact_number.unwrap_or(base.contact_number),
        images,
    })
}

fn print_card(n: usize, listing: &Listing, can_manage: bool) {
    println!("{}. {} (₹{})", n, listing.title, listing.price);
    println!(
        "   {} · {} · {}",
        listing
            .property_type
            .map(|t| t.to_string())
            .unwrap_or_else(|| "-".to_string()),
        listing
            .listing_type
            .map(|t| t.to_string())
            .unwrap_or_else(|| "N/A".to_string()),
        listing.location
    );
    if let Some(ago) = listing.posted_ago(Utc::now()) {
        println!("   Posted {ago}");
    }
    println!("   ID: {}", listing.id);
    if let Some(image) = listing.images.first() {
        println!("   Image 1/{}: {}", listing.images.len(), image);
    }
    if can_manage {
        println!(
            "   [update] estate update {}   [delete] estate delete {}",
            listing.id, listing.id
        );
    }
    println!();
}

fn print_detail(listing: &Listing) {
    println!("{}", listing.title);
    println!("{}", listing.description);
    println!();
    if let Some(t) = listing.property_type {
        println!("Type:         {t}");
    }
    println!("Price:        ₹{}", listing.price);
    if let Some(bhk) = listing.bedrooms {
        println!("BHK:          {bhk}");
    }
    if let Some(area) = listing.carpet_area {
        println!("Carpet area:  {area} sq.ft");
    }
    if let Some(area) = listing.build_up_area {
        println!("Build-up:     {area} sq.ft");
    }
    println!("Location:     {}", listing.location);
    if let Some(t) = listing.listing_type {
        println!("Listing type: {t}");
    }
    if let Some(contact) = &listing.contact_number {
        println!("Contact:      {contact}");
    }
    for (i, image) in listing.images.iter().enumerate() {
        println!("Image {}/{}:    {}", i + 1, listing.images.len(), image);
    }
    if let Some(ago) = listing.posted_ago(Utc::now()) {
        println!("Posted {ago}");
    }
}
