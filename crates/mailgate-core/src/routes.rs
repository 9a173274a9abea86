//! Client destinations and the navigation decisions that point at them.

/// A destination in the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Index,
    /// Login and registration entry point
    Auth,
    Home,
    Profile,
    GmailCallback,
    OutlookCallback,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Index => "/",
            Route::Auth => "/auth",
            Route::Home => "/home",
            Route::Profile => "/profile",
            Route::GmailCallback => "/auth/callback",
            Route::OutlookCallback => "/auth/outlook",
        }
    }

    /// Resolve a path, sending anything unrecognised to the index
    pub fn from_path(path: &str) -> Self {
        let trimmed = path.trim_end_matches('/');
        match trimmed {
            "/auth" => Route::Auth,
            "/home" => Route::Home,
            "/profile" => Route::Profile,
            "/auth/callback" => Route::GmailCallback,
            "/auth/outlook" => Route::OutlookCallback,
            _ => Route::Index,
        }
    }

    /// Whether reaching this route requires passing the session guard
    pub fn is_protected(&self) -> bool {
        match self {
            Route::Index | Route::Auth => false,
            Route::Home | Route::Profile | Route::GmailCallback | Route::OutlookCallback => true,
        }
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path())
    }
}

/// What the front-end should do after a flow step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    /// Still waiting on the backend; show a neutral placeholder
    Pending,
    /// Show the requested content
    Render,
    /// Leave for another route
    Redirect(Route),
}
