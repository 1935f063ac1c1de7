#![cfg(not(tarpaulin_include))]
use crate::app::AppState;
use crate::error::{AppError, Result, ValidationError};
use crate::flash;
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use axum::{
    Form,
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// User data structure representing a registered application user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Username (unique identifier for the user)
    pub username: String,

    /// Email address as submitted, never verified
    pub email: String,

    /// Mobile number as submitted, never verified
    pub mobile: String,

    /// Argon2 hash of the user's password
    pub password_hash: String,
}

/// Sign-up form data
#[derive(Debug, Clone, Deserialize)]
pub struct SignUpForm {
    pub username: String,
    pub email: String,
    pub mobile: String,
    pub password: String,
    pub confirm_password: String,
}

/// Login form data
#[derive(Debug, Clone, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// Storage for user accounts, keyed by username
///
/// The server uses [`MemoryAccountStore`]; accounts live exactly as long as
/// the process. Inserting an existing username replaces the old record.
pub trait AccountStore: Send + Sync {
    fn insert(&self, user: User);

    fn get(&self, username: &str) -> Option<User>;

    fn contains(&self, username: &str) -> bool {
        self.get(username).is_some()
    }
}

/// Process-local account store
#[derive(Debug, Default)]
pub struct MemoryAccountStore {
    users: RwLock<HashMap<String, User>>,
}

impl MemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> Arc<dyn AccountStore> {
        Arc::new(Self::new())
    }
}

impl AccountStore for MemoryAccountStore {
    fn insert(&self, user: User) {
        let mut users = self.users.write().unwrap_or_else(PoisonError::into_inner);
        users.insert(user.username.clone(), user);
    }

    fn get(&self, username: &str) -> Option<User> {
        let users = self.users.read().unwrap_or_else(PoisonError::into_inner);
        users.get(username).cloned()
    }
}

/// Register a new user
///
/// Creates (or replaces) the account for `form.username`. The password is
/// hashed before storage.
///
/// # Returns
/// * `true` if an existing account with the same username was replaced
///
/// # Errors
/// * `ValidationError::PasswordMismatch` when the two password fields differ;
///   nothing is stored in that case
pub fn register(store: &dyn AccountStore, form: &SignUpForm) -> Result<bool> {
    if form.password != form.confirm_password {
        return Err(ValidationError::PasswordMismatch.into());
    }

    let replaced = store.contains(&form.username);

    let user = User {
        username: form.username.clone(),
        email: form.email.clone(),
        mobile: form.mobile.clone(),
        password_hash: hash_password(&form.password)?,
    };
    store.insert(user);

    Ok(replaced)
}

/// Verify user credentials
///
/// Returns true only if the username exists and the password matches the one
/// given at sign-up.
pub fn authenticate(store: &dyn AccountStore, username: &str, password: &str) -> bool {
    match store.get(username) {
        Some(user) => verify_password(password, &user.password_hash),
        None => false,
    }
}

/// Hash a password using Argon2
fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::PasswordHash(e.to_string()))
}

/// Verify a password against a stored hash
///
/// A malformed hash counts as a mismatch.
fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

// Web handlers

pub async fn serve_signup_page(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<(CookieJar, Html<String>)> {
    state.render_page(jar, "sign_up")
}

/// Handle user registration
///
/// Redirects back to the form with a flash message on validation failure,
/// otherwise to the login page.
pub async fn handle_signup(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<SignUpForm>,
) -> Result<Response> {
    match register(state.accounts.as_ref(), &form) {
        Ok(replaced) => {
            if replaced {
                log::warn!("Sign-up replaced the existing account {}", form.username);
            } else {
                log::info!("Registered user {}", form.username);
            }
            let jar = flash::push(jar, "Sign up successful! Please log in.");
            Ok((jar, Redirect::to("/login")).into_response())
        }
        Err(AppError::Validation(err)) => {
            let jar = flash::push(jar, &err.to_string());
            Ok((jar, Redirect::to("/sign_up")).into_response())
        }
        Err(other) => Err(other),
    }
}

pub async fn serve_login_page(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<(CookieJar, Html<String>)> {
    state.render_page(jar, "login")
}

/// Handle user login requests
///
/// Valid credentials redirect to the upload page. No session is created.
pub async fn handle_login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(credentials): Form<LoginForm>,
) -> Result<Response> {
    if authenticate(
        state.accounts.as_ref(),
        &credentials.username,
        &credentials.password,
    ) {
        log::info!("User {} logged in", credentials.username);
        return Ok(Redirect::to("/upload").into_response());
    }

    log::warn!("Failed login attempt for {}", credentials.username);
    let (jar, mut messages) = flash::take(jar);
    messages.push("Invalid username or password!".to_string());
    let page = state.render("login", &messages)?;
    Ok((jar, Html(page)).into_response())
}

/// Handle user logout
///
/// Nothing to clear, since login never creates a session.
pub async fn handle_logout() -> Redirect {
    Redirect::to("/login")
}
