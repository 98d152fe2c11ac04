//! Authentication route handlers.
//!
//! Handles login, registration and logout against the local user table.
//! Failed submissions re-render the form with the error and a matching
//! status code.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;

use super::PageContext;
use crate::error::{AppError, clear_sentry_user, set_sentry_user};
use crate::middleware::{OptionalAuth, clear_current_user, set_current_user};
use crate::models::{CurrentUser, User};
use crate::services::auth::{AuthError, AuthService, MIN_PASSWORD_LENGTH, Registration};
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub page: PageContext,
    pub username: String,
    pub error: Option<String>,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub page: PageContext,
    pub form: Registration,
    pub min_password_length: usize,
    pub error: Option<String>,
}

impl RegisterTemplate {
    fn new(page: PageContext, form: Registration, error: Option<String>) -> Self {
        Self {
            page,
            form,
            min_password_length: MIN_PASSWORD_LENGTH,
            error,
        }
    }
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page.
pub async fn login_page(OptionalAuth(user): OptionalAuth) -> impl IntoResponse {
    LoginTemplate {
        page: PageContext::bare("Login", user),
        username: String::new(),
        error: None,
    }
}

/// Handle login form submission.
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Response {
    match AuthService::new(state.pool())
        .login(&form.username, &form.password)
        .await
    {
        Ok(user) => match start_session(&session, &user).await {
            Ok(()) => Redirect::to("/").into_response(),
            Err(e) => e.into_response(),
        },
        Err(e) => {
            tracing::warn!(username = %form.username, "Login failed: {e}");
            let status = AppError::from(e).status();
            let message = if status.is_server_error() {
                "Login is temporarily unavailable"
            } else {
                "Please enter a correct username and password"
            };

            (
                status,
                LoginTemplate {
                    page: PageContext::bare("Login", None),
                    username: form.username,
                    error: Some(message.to_string()),
                },
            )
                .into_response()
        }
    }
}

// =============================================================================
// Registration Routes
// =============================================================================

/// Display the registration page.
pub async fn register_page(OptionalAuth(user): OptionalAuth) -> impl IntoResponse {
    RegisterTemplate::new(
        PageContext::bare("Register", user),
        Registration::default(),
        None,
    )
}

/// Handle registration form submission.
///
/// A new account is logged in straight away.
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<Registration>,
) -> Response {
    let redisplay = form.clone();

    match AuthService::new(state.pool()).register(form).await {
        Ok(user) => {
            tracing::info!(user_id = %user.id, username = %user.username, "User registered");
            match start_session(&session, &user).await {
                Ok(()) => Redirect::to("/").into_response(),
                Err(e) => e.into_response(),
            }
        }
        Err(e) => {
            tracing::warn!(username = %redisplay.username, "Registration failed: {e}");
            let message = registration_message(&e);
            let status = AppError::from(e).status();

            (
                status,
                RegisterTemplate::new(
                    PageContext::bare("Register", None),
                    Registration {
                        password: String::new(),
                        password_confirm: String::new(),
                        ..redisplay
                    },
                    Some(message),
                ),
            )
                .into_response()
        }
    }
}

/// User-facing text for a failed registration.
fn registration_message(err: &AuthError) -> String {
    match err {
        AuthError::UserAlreadyExists => "A user with that username already exists".to_string(),
        AuthError::Repository(_) | AuthError::PasswordHash => {
            "Registration is temporarily unavailable".to_string()
        }
        other => other.to_string(),
    }
}

// =============================================================================
// Logout Route
// =============================================================================

/// Handle logout.
pub async fn logout(session: Session) -> Response {
    if let Err(e) = clear_current_user(&session).await {
        tracing::error!("Failed to clear session: {}", e);
    }
    clear_sentry_user();

    Redirect::to("/").into_response()
}

/// Store the user in a fresh session.
async fn start_session(session: &Session, user: &User) -> Result<(), AppError> {
    set_current_user(session, &CurrentUser::from(user))
        .await
        .map_err(|e| AppError::Internal(format!("session: {e}")))?;
    set_sentry_user(&user.id, user.username.as_str());

    tracing::info!(user_id = %user.id, "User logged in");
    Ok(())
}
