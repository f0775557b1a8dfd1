use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::AUTH_USER_KEY;
use crate::models::{Permission, Role, User};
use crate::services::persistence::Persistence;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Please enter a valid email address")]
    InvalidEmail,

    #[error("Password is required")]
    MissingPassword,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Not signed in")]
    NotAuthenticated,

    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

impl AuthError {
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::InvalidEmail => "INVALID_EMAIL",
            AuthError::MissingPassword => "MISSING_PASSWORD",
            AuthError::InvalidCredentials => "INVALID_CREDENTIALS",
            AuthError::NotAuthenticated => "NOT_AUTHENTICATED",
            AuthError::Storage(_) => "STORAGE_ERROR",
        }
    }
}

/// Uniform envelope returned by every auth operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: Option<T>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data,
            error: None,
        }
    }

    pub fn fail(err: &AuthError) -> Self {
        Self {
            success: false,
            message: err.to_string(),
            data: None,
            error: Some(err.code().to_string()),
        }
    }
}

impl<T> From<Result<(String, Option<T>), AuthError>> for ApiResponse<T> {
    fn from(result: Result<(String, Option<T>), AuthError>) -> Self {
        match result {
            Ok((message, data)) => Self::ok(message, data),
            Err(e) => Self::fail(&e),
        }
    }
}

#[async_trait]
pub trait AuthBackend: Send + Sync {
    async fn login(&self, email: &str, password: &str) -> ApiResponse<User>;

    async fn logout(&self) -> ApiResponse<()>;

    async fn current_user(&self) -> ApiResponse<User>;
}

struct DemoAccount {
    user: User,
    password: &'static str,
}

/// Stand-in for the real auth server: a fixed user directory, an artificial
/// round-trip delay, and the signed-in user kept in local storage.
pub struct MockAuthBackend {
    persistence: Persistence,
    accounts: Vec<DemoAccount>,
    latency: Duration,
}

impl MockAuthBackend {
    pub fn new(persistence: Persistence, latency: Duration) -> Self {
        let accounts = [
            ("u-1", "admin@docudesk.io", "Alex Morgan", Role::Admin, "admin123"),
            ("u-2", "editor@docudesk.io", "Sam Rivera", Role::Editor, "editor123"),
            ("u-3", "viewer@docudesk.io", "Jordan Lee", Role::Viewer, "viewer123"),
        ]
        .into_iter()
        .map(|(id, email, name, role, password)| DemoAccount {
            user: User {
                id: id.to_string(),
                email: email.to_string(),
                name: name.to_string(),
                role,
                permissions: role.default_permissions(),
            },
            password,
        })
        .collect();

        Self {
            persistence,
            accounts,
            latency,
        }
    }

    async fn round_trip(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }

    async fn try_login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = email.trim();
        if !is_plausible_email(email) {
            return Err(AuthError::InvalidEmail);
        }
        if password.is_empty() {
            return Err(AuthError::MissingPassword);
        }

        let account = self
            .accounts
            .iter()
            .find(|a| a.user.email.eq_ignore_ascii_case(email) && a.password == password)
            .ok_or(AuthError::InvalidCredentials)?;

        self.persistence
            .save_json(AUTH_USER_KEY, &account.user)
            .await?;
        Ok(account.user.clone())
    }
}

#[async_trait]
impl AuthBackend for MockAuthBackend {
    async fn login(&self, email: &str, password: &str) -> ApiResponse<User> {
        self.round_trip().await;
        match self.try_login(email, password).await {
            Ok(user) => {
                tracing::info!("Signed in {}", user.email);
                ApiResponse::ok("Login successful", Some(user))
            }
            Err(e) => {
                tracing::warn!("Login failed for {}: {}", email, e);
                ApiResponse::fail(&e)
            }
        }
    }

    async fn logout(&self) -> ApiResponse<()> {
        self.round_trip().await;
        let result = self
            .persistence
            .storage()
            .remove_item(AUTH_USER_KEY)
            .await
            .map(|()| ("Logged out".to_string(), None::<()>))
            .map_err(AuthError::from);
        result.into()
    }

    async fn current_user(&self) -> ApiResponse<User> {
        let user: Option<User> = self.persistence.load_json(AUTH_USER_KEY, || None).await;
        match user {
            Some(user) => ApiResponse::ok("Authenticated", Some(user)),
            None => ApiResponse::fail(&AuthError::NotAuthenticated),
        }
    }
}

fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
        }
        None => false,
    }
}

/// What the login screen and the route guard read.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthState {
    pub user: Option<User>,
    /// Last failure message, shown inline as a banner.
    pub error: Option<String>,
}

impl AuthState {
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub fn permissions(&self) -> &[Permission] {
        self.user
            .as_ref()
            .map(|u| u.permissions.as_slice())
            .unwrap_or(&[])
    }
}

pub struct AuthService {
    backend: Arc<dyn AuthBackend>,
    state: AuthState,
}

impl AuthService {
    pub fn new(backend: Arc<dyn AuthBackend>) -> Self {
        Self {
            backend,
            state: AuthState::default(),
        }
    }

    pub fn state(&self) -> &AuthState {
        &self.state
    }

    /// Pick up a session left by a previous run.
    pub async fn restore(&mut self) {
        let response = self.backend.current_user().await;
        self.state.user = if response.success { response.data } else { None };
    }

    pub async fn login(&mut self, email: &str, password: &str) -> bool {
        let response = self.backend.login(email, password).await;
        if response.success {
            self.state.user = response.data;
            self.state.error = None;
            true
        } else {
            self.state.error = Some(response.message);
            false
        }
    }

    pub async fn logout(&mut self) {
        let response = self.backend.logout().await;
        if !response.success {
            tracing::warn!("Logout failed: {}", response.message);
            self.state.error = Some(response.message);
        }
        self.state.user = None;
    }
}
