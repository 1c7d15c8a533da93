//! Routing policy between the auth view and the generator view.

use std::fmt;

use super::gate::SessionStatus;

/// The two reachable views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    /// Sign in / sign up / password reset (`/auth`).
    Auth,
    /// QR generator (`/`).
    Generator,
}

impl Route {
    pub const fn path(self) -> &'static str {
        match self {
            Route::Auth => "/auth",
            Route::Generator => "/",
        }
    }

    /// Parses a route path. Unknown paths yield `None`.
    pub fn parse(path: &str) -> Option<Self> {
        match path.trim() {
            "/auth" | "/auth/" => Some(Route::Auth),
            "/" | "" => Some(Route::Generator),
            _ => None,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Outcome of a navigation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    Render(Route),
    Redirect(Route),
}

impl RouteDecision {
    /// The route that ends up on screen.
    pub fn target(self) -> Route {
        match self {
            RouteDecision::Render(route) | RouteDecision::Redirect(route) => route,
        }
    }

    pub fn is_redirect(self) -> bool {
        matches!(self, RouteDecision::Redirect(_))
    }
}

/// `/` requires an authenticated session; `/auth` requires its absence.
/// `Unknown` counts as not authenticated.
pub fn resolve_route(requested: Route, status: &SessionStatus) -> RouteDecision {
    match (requested, status.is_authenticated()) {
        (Route::Generator, true) => RouteDecision::Render(Route::Generator),
        (Route::Generator, false) => RouteDecision::Redirect(Route::Auth),
        (Route::Auth, true) => RouteDecision::Redirect(Route::Generator),
        (Route::Auth, false) => RouteDecision::Render(Route::Auth),
    }
}
