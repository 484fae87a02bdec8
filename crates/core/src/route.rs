//! Client routes and the sign-in redirects between them.

/// A client-side page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// `/login`
    Login,
    /// `/`, which always redirects.
    Root,
    /// `/manage-schedules`
    ManageSchedules,
    /// `/editor`
    Editor,
    /// `/profile`
    Profile,
    /// Anything else; keeps the requested path.
    NotFound(String),
}

impl Route {
    /// Matches a path, ignoring query, fragment and trailing slashes.
    pub fn parse(path: &str) -> Self {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let trimmed = path.trim_end_matches('/');
        match trimmed {
            "" => Self::Root,
            "/login" => Self::Login,
            "/manage-schedules" => Self::ManageSchedules,
            "/editor" => Self::Editor,
            "/profile" => Self::Profile,
            _ => Self::NotFound(path.to_string()),
        }
    }

    /// Canonical path of the page.
    pub fn path(&self) -> &str {
        match self {
            Self::Login => "/login",
            Self::Root => "/",
            Self::ManageSchedules => "/manage-schedules",
            Self::Editor => "/editor",
            Self::Profile => "/profile",
            Self::NotFound(p) => p,
        }
    }

    /// Whether the page needs a signed-in user.
    pub fn requires_user(&self) -> bool {
        matches!(self, Self::ManageSchedules | Self::Editor | Self::Profile)
    }

    /// Where the client actually lands for this route.
    pub fn resolve(self, signed_in: bool) -> Self {
        match self {
            Self::Root | Self::Login if signed_in => Self::Editor,
            Self::Root => Self::Login,
            r if r.requires_user() && !signed_in => Self::Login,
            r => r,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_redirects_on_auth() {
        assert_eq!(Route::parse("/").resolve(true), Route::Editor);
        assert_eq!(Route::parse("/").resolve(false), Route::Login);
        assert_eq!(Route::parse("/login").resolve(true), Route::Editor);
        assert_eq!(Route::parse("/login").resolve(false), Route::Login);
    }

    #[test]
    fn guarded_pages_need_user() {
        assert_eq!(Route::parse("/editor").resolve(false), Route::Login);
        assert_eq!(Route::parse("/profile/").resolve(true), Route::Profile);
        assert_eq!(
            Route::parse("/manage-schedules?x=1").resolve(true),
            Route::ManageSchedules
        );
    }

    #[test]
    fn unknown_paths_fall_through() {
        let r = Route::parse("/nope").resolve(false);
        assert_eq!(r, Route::NotFound("/nope".into()));
        assert_eq!(r.path(), "/nope");
    }
}
