//! Routes, the login gate in front of protected ones, and which navigation
//! links a visitor sees.

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::session::{SessionEvent, SessionStore, Subscription};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    About,
    Contact,
    Login,
    Signup,
    Explore,
    CreateListing,
    UpdateListing(String),
    MyListings,
    Profile,
}

impl Route {
    pub fn is_protected(&self) -> bool {
        matches!(
            self,
            Route::Explore
                | Route::CreateListing
                | Route::UpdateListing(_)
                | Route::MyListings
                | Route::Profile
        )
    }

    pub fn path(&self) -> String {
        match self {
            Route::Home => "/".to_string(),
            Route::About => "/about".to_string(),
            Route::Contact => "/contact".to_string(),
            Route::Login => "/auth/login".to_string(),
            Route::Signup => "/auth/signup".to_string(),
            Route::Explore => "/explore-properties".to_string(),
            Route::CreateListing => "/create-property".to_string(),
            Route::UpdateListing(id) => format!("/update-property/{id}"),
            Route::MyListings => "/my-properties".to_string(),
            Route::Profile => "/auth/profile".to_string(),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

impl FromStr for Route {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let path = s.trim();
        let path = if path.len() > 1 {
            path.trim_end_matches('/')
        } else {
            path
        };

        if let Some(id) = path.strip_prefix("/update-property/") {
            if !id.is_empty() && !id.contains('/') {
                return Ok(Route::UpdateListing(id.to_string()));
            }
        }

        match path {
            "/" | "" => Ok(Route::Home),
            "/about" => Ok(Route::About),
            "/contact" => Ok(Route::Contact),
            "/auth/login" => Ok(Route::Login),
            "/auth/signup" => Ok(Route::Signup),
            "/explore-properties" => Ok(Route::Explore),
            "/create-property" => Ok(Route::CreateListing),
            "/my-properties" => Ok(Route::MyListings),
            "/auth/profile" => Ok(Route::Profile),
            other => Err(format!("no route for {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    Checking,
    Authenticated,
    Unauthenticated,
}

impl GuardState {
    fn from_flag(authenticated: bool) -> Self {
        if authenticated {
            GuardState::Authenticated
        } else {
            GuardState::Unauthenticated
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Render,
    Redirect(Route),
}

/// Pure gate: protected routes need an authenticated visitor
pub fn decide(route: &Route, authenticated: bool) -> GuardDecision {
    if route.is_protected() && !authenticated {
        GuardDecision::Redirect(Route::Login)
    } else {
        GuardDecision::Render
    }
}

/// A mounted gate tracking session changes for as long as it lives.
///
/// Starts in `Checking`; the storage read is synchronous, so construction
/// resolves it immediately. Afterwards only session notifications move it.
pub struct GuardedView {
    state: Arc<Mutex<GuardState>>,
    _subscription: Subscription,
}

impl GuardedView {
    pub fn mount(session: &SessionStore) -> Self {
        let state = Arc::new(Mutex::new(GuardState::Checking));

        let subscription = {
            let state = state.clone();
            session.subscribe(move |event| {
                let next = GuardState::from_flag(matches!(event, SessionEvent::LoggedIn { .. }));
                if let Ok(mut state) = state.lock() {
                    debug!(from = ?*state, to = ?next, "Guard state changed");
                    *state = next;
                }
            })
        };

        if let Ok(mut current) = state.lock() {
            *current = GuardState::from_flag(session.is_authenticated());
        }

        Self {
            state,
            _subscription: subscription,
        }
    }

    pub fn state(&self) -> GuardState {
        self.state
            .lock()
            .map(|s| *s)
            .unwrap_or(GuardState::Checking)
    }

    pub fn decide(&self, route: &Route) -> GuardDecision {
        match self.state() {
            GuardState::Authenticated => decide(route, true),
            GuardState::Unauthenticated | GuardState::Checking => decide(route, false),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavLink {
    pub label: &'static str,
    pub route: Route,
}

/// Links the navigation bar shows for the current login state
pub fn nav_links(authenticated: bool) -> Vec<NavLink> {
    let mut links = vec![
        NavLink {
            label: "Home",
            route: Route::Home,
        },
        NavLink {
            label: "About",
            route: Route::About,
        },
        NavLink {
            label: "Contact Us",
            route: Route::Contact,
        },
    ];

    if authenticated {
        links.extend([
            NavLink {
                label: "Explore",
                route: Route::Explore,
            },
            NavLink {
                label: "Create Property",
                route: Route::CreateListing,
            },
            NavLink {
                label: "My Properties",
                route: Route::MyListings,
            },
            NavLink {
                label: "Profile",
                route: Route::Profile,
            },
        ]);
    } else {
        links.extend([
            NavLink {
                label: "Login",
                route: Route::Login,
            },
            NavLink {
                label: "Sign Up",
                route: Route::Signup,
            },
        ]);
    }

    links
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::User;
    use crate::session::MemoryStorage;

    fn store() -> SessionStore {
        SessionStore::new(Arc::new(MemoryStorage::new()), "admin@estate.test")
    }

    #[test]
    fn test_route_paths_parse_back() {
        let routes = [
            Route::Home,
            Route::About,
            Route::Contact,
            Route::Login,
            Route::Signup,
            Route::Explore,
            Route::CreateListing,
            Route::UpdateListing("abc".into()),
            Route::MyListings,
            Route::Profile,
        ];
        for route in routes {
            assert_eq!(route.path().parse::<Route>().unwrap(), route);
        }
        assert!("/nowhere".parse::<Route>().is_err());
        assert!("/update-property/".parse::<Route>().is_err());
    }

    #[test]
    fn test_decide() {
        assert_eq!(decide(&Route::Home, false), GuardDecision::Render);
        assert_eq!(
            decide(&Route::CreateListing, false),
            GuardDecision::Redirect(Route::Login)
        );
        assert_eq!(decide(&Route::CreateListing, true), GuardDecision::Render);
    }

    #[test]
    fn test_guarded_view_follows_session() {
        let store = store();
        let view = GuardedView::mount(&store);
        assert_eq!(view.state(), GuardState::Unauthenticated);
        assert_eq!(
            view.decide(&Route::Profile),
            GuardDecision::Redirect(Route::Login)
        );

        store.login("tok", User::with_email("a@b.co")).unwrap();
        assert_eq!(view.state(), GuardState::Authenticated);
        assert_eq!(view.decide(&Route::Profile), GuardDecision::Render);

        store.clear();
        assert_eq!(view.state(), GuardState::Unauthenticated);
    }

    #[test]
    fn test_unmounted_view_unsubscribes() {
        let store = store();
        let view = GuardedView::mount(&store);
        assert_eq!(store.listener_count(), 1);
        drop(view);
        assert_eq!(store.listener_count(), 0);
    }

    #[test]
    fn test_nav_links() {
        let labels = |auth: bool| -> Vec<&'static str> {
            nav_links(auth).iter().map(|l| l.label).collect()
        };
        assert!(labels(false).contains(&"Login"));
        assert!(!labels(false).contains(&"Profile"));
        assert!(labels(true).contains(&"Create Property"));
        assert!(!labels(true).contains(&"Sign Up"));
    }
}
