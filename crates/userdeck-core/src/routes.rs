//! Screen routing and the protected-route guard.
//!
//! Paths follow the web layout: `/login` is public, `/dashboard` is
//! protected, `/` goes to the dashboard and anything else goes to login.

use tracing::debug;

use crate::session::AuthStatus;

pub const LOGIN_PATH: &str = "/login";
pub const DASHBOARD_PATH: &str = "/dashboard";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Dashboard,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Login => LOGIN_PATH,
            Route::Dashboard => DASHBOARD_PATH,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Route::Login => "Sign In",
            Route::Dashboard => "Dashboard",
        }
    }

    /// Protected routes need an authenticated session to render.
    pub fn is_protected(&self) -> bool {
        matches!(self, Route::Dashboard)
    }
}

/// Where a path leads before any authentication check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Render(Route),
    Redirect(Route),
}

impl Resolution {
    pub fn route(&self) -> Route {
        match self {
            Resolution::Render(route) | Resolution::Redirect(route) => *route,
        }
    }
}

/// Map a path to a route. Query strings, fragments and a trailing slash
/// are ignored.
pub fn resolve(path: &str) -> Resolution {
    let path = path.split(|c: char| c == '?' || c == '#').next().unwrap_or_default();
    let trimmed = path.trim_end_matches('/');

    match trimmed {
        "" => Resolution::Redirect(Route::Dashboard),
        LOGIN_PATH => Resolution::Render(Route::Login),
        DASHBOARD_PATH => Resolution::Render(Route::Dashboard),
        _ => Resolution::Redirect(Route::Login),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// Authentication is still being determined. Show a neutral indicator.
    Wait,
    /// Go to `to`, remembering `from` for after login.
    Redirect { to: Route, from: Route },
    Render(Route),
}

pub struct RouteGuard;

impl RouteGuard {
    pub fn check(status: AuthStatus, route: Route) -> GuardDecision {
        if !route.is_protected() {
            return GuardDecision::Render(route);
        }
        match status {
            AuthStatus::Loading => GuardDecision::Wait,
            AuthStatus::Unauthenticated => GuardDecision::Redirect {
                to: Route::Login,
                from: route,
            },
            AuthStatus::Authenticated => GuardDecision::Render(route),
        }
    }
}

/// What the front end should draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Waiting,
    Page(Route),
}

/// Current location plus the destination to return to after login.
#[derive(Debug, Clone)]
pub struct Navigator {
    location: Route,
    from: Option<Route>,
}

impl Navigator {
    pub fn new(initial_path: &str) -> Self {
        Self {
            location: resolve(initial_path).route(),
            from: None,
        }
    }

    pub fn location(&self) -> Route {
        self.location
    }

    /// Destination remembered by the last guard redirect.
    pub fn from(&self) -> Option<Route> {
        self.from
    }

    pub fn navigate(&mut self, path: &str) {
        self.location = resolve(path).route();
        debug!(path, location = ?self.location, "Navigate");
    }

    /// Apply the guard and login forwarding for `status`, updating the
    /// location, and return the screen to draw.
    pub fn sync(&mut self, status: AuthStatus) -> Screen {
        loop {
            if self.location == Route::Login {
                if status == AuthStatus::Authenticated {
                    self.location = self.from.take().unwrap_or(Route::Dashboard);
                    debug!(location = ?self.location, "Forwarding after login");
                    continue;
                }
                return Screen::Page(Route::Login);
            }

            match RouteGuard::check(status, self.location) {
                GuardDecision::Wait => return Screen::Waiting,
                GuardDecision::Render(route) => return Screen::Page(route),
                GuardDecision::Redirect { to, from } => {
                    debug!(?from, "Redirecting unauthenticated visitor to login");
                    self.from = Some(from);
                    self.location = to;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_paths() {
        assert_eq!(resolve("/login"), Resolution::Render(Route::Login));
        assert_eq!(resolve("/dashboard"), Resolution::Render(Route::Dashboard));
        assert_eq!(resolve("/dashboard/"), Resolution::Render(Route::Dashboard));
        assert_eq!(resolve("/dashboard?tab=1"), Resolution::Render(Route::Dashboard));
        assert_eq!(resolve("/"), Resolution::Redirect(Route::Dashboard));
        assert_eq!(resolve(""), Resolution::Redirect(Route::Dashboard));
        assert_eq!(resolve("/settings"), Resolution::Redirect(Route::Login));
        assert_eq!(resolve("/login/extra"), Resolution::Redirect(Route::Login));
    }

    #[test]
    fn test_guard_decisions() {
        assert_eq!(
            RouteGuard::check(AuthStatus::Loading, Route::Dashboard),
            GuardDecision::Wait
        );
        assert_eq!(
            RouteGuard::check(AuthStatus::Unauthenticated, Route::Dashboard),
            GuardDecision::Redirect {
                to: Route::Login,
                from: Route::Dashboard
            }
        );
        assert_eq!(
            RouteGuard::check(AuthStatus::Authenticated, Route::Dashboard),
            GuardDecision::Render(Route::Dashboard)
        );
        // Public routes ignore the session
        assert_eq!(
            RouteGuard::check(AuthStatus::Loading, Route::Login),
            GuardDecision::Render(Route::Login)
        );
    }

    #[test]
    fn test_loading_waits_without_redirect() {
        let mut nav = Navigator::new("/dashboard");
        assert_eq!(nav.sync(AuthStatus::Loading), Screen::Waiting);
        assert_eq!(nav.location(), Route::Dashboard);
        assert_eq!(nav.from(), None);
    }

    #[test]
    fn test_protected_redirects_then_returns_after_login() {
        let mut nav = Navigator::new("/dashboard");

        assert_eq!(nav.sync(AuthStatus::Unauthenticated), Screen::Page(Route::Login));
        assert_eq!(nav.location(), Route::Login);
        assert_eq!(nav.from(), Some(Route::Dashboard));

        assert_eq!(nav.sync(AuthStatus::Authenticated), Screen::Page(Route::Dashboard));
        assert_eq!(nav.from(), None);
    }

    #[test]
    fn test_root_goes_to_dashboard() {
        let mut nav = Navigator::new("/");
        assert_eq!(nav.sync(AuthStatus::Authenticated), Screen::Page(Route::Dashboard));
    }

    #[test]
    fn test_unknown_path_goes_to_login_without_memory() {
        let mut nav = Navigator::new("/nowhere");
        assert_eq!(nav.sync(AuthStatus::Unauthenticated), Screen::Page(Route::Login));
        assert_eq!(nav.from(), None);
    }

    #[test]
    fn test_authenticated_visit_to_login_is_forwarded() {
        let mut nav = Navigator::new("/login");
        assert_eq!(nav.sync(AuthStatus::Authenticated), Screen::Page(Route::Dashboard));
    }

    #[test]
    fn test_login_renders_while_loading() {
        let mut nav = Navigator::new("/login");
        assert_eq!(nav.sync(AuthStatus::Loading), Screen::Page(Route::Login));
    }

    #[test]
    fn test_losing_session_on_dashboard_redirects() {
        let mut nav = Navigator::new("/dashboard");
        assert_eq!(nav.sync(AuthStatus::Authenticated), Screen::Page(Route::Dashboard));

        assert_eq!(nav.sync(AuthStatus::Unauthenticated), Screen::Page(Route::Login));
        assert_eq!(nav.from(), Some(Route::Dashboard));
    }

    #[test]
    fn test_navigate() {
        let mut nav = Navigator::new("/login");
        nav.navigate("/");
        assert_eq!(nav.location(), Route::Dashboard);
        nav.navigate("/bogus");
        assert_eq!(nav.location(), Route::Login);
    }
}
