use crate::models::Permission;
use crate::services::auth::AuthState;

pub const LOGIN_PATH: &str = "/login";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Dashboard,
    Documents,
    Assistant,
    Users,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Login => LOGIN_PATH,
            Route::Dashboard => "/dashboard",
            Route::Documents => "/documents",
            Route::Assistant => "/assistant",
            Route::Users => "/users",
        }
    }

    pub fn from_path(path: &str) -> Option<Self> {
        [
            Route::Login,
            Route::Dashboard,
            Route::Documents,
            Route::Assistant,
            Route::Users,
        ]
        .into_iter()
        .find(|r| r.path() == path)
    }

    pub fn requires_auth(&self) -> bool {
        !matches!(self, Route::Login)
    }

    pub fn required_permissions(&self) -> &'static [Permission] {
        match self {
            Route::Login => &[],
            Route::Dashboard => &[Permission::AnalyticsView],
            Route::Documents | Route::Assistant => &[Permission::DocumentsRead],
            Route::Users => &[Permission::UsersManage],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    Render,
    Redirect(&'static str),
    Forbidden,
}

/// Every required permission must be granted.
pub fn check(is_authenticated: bool, permissions: &[Permission], route: Route) -> RouteDecision {
    if !route.requires_auth() {
        return RouteDecision::Render;
    }
    if !is_authenticated {
        return RouteDecision::Redirect(LOGIN_PATH);
    }
    if route
        .required_permissions()
        .iter()
        .all(|p| permissions.contains(p))
    {
        RouteDecision::Render
    } else {
        tracing::debug!("Access to {} denied", route.path());
        RouteDecision::Forbidden
    }
}

pub fn check_session(auth: &AuthState, route: Route) -> RouteDecision {
    check(auth.is_authenticated(), auth.permissions(), route)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Role, User};

    fn signed_in(role: Role) -> AuthState {
        AuthState {
            user: Some(User {
                id: "u".into(),
                email: "u@example.com".into(),
                name: "U".into(),
                role,
                permissions: role.default_permissions(),
            }),
            error: None,
        }
    }

    #[test]
    fn test_login_is_public() {
        assert_eq!(check(false, &[], Route::Login), RouteDecision::Render);
    }

    #[test]
    fn test_anonymous_is_redirected() {
        assert_eq!(
            check_session(&AuthState::default(), Route::Assistant),
            RouteDecision::Redirect("/login")
        );
    }

    #[test]
    fn test_permissions_gate_routes() {
        let viewer = signed_in(Role::Viewer);
        assert_eq!(check_session(&viewer, Route::Documents), RouteDecision::Render);
        assert_eq!(check_session(&viewer, Route::Dashboard), RouteDecision::Forbidden);

        let admin = signed_in(Role::Admin);
        assert_eq!(check_session(&admin, Route::Users), RouteDecision::Render);
    }

    #[test]
    fn test_from_path() {
        assert_eq!(Route::from_path("/assistant"), Some(Route::Assistant));
        assert_eq!(Route::from_path("/nowhere"), None);
    }
}
