/// User service - signup and login
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::{hash_password, reject_absent_user, verify_password, TokenService};
use crate::db::BlogRepository;
use crate::error::{AppError, Result};
use crate::forms::{LoginForm, SignupForm};
use crate::models::NewUser;
use crate::urls;

/// Token response shared by signup and login
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user_id: Uuid,
    pub username: String,
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    /// Local path the client should continue to
    pub redirect_to: String,
}

#[derive(Clone)]
pub struct UserService {
    repo: Arc<dyn BlogRepository>,
    tokens: Arc<TokenService>,
}

impl UserService {
    pub fn new(repo: Arc<dyn BlogRepository>, tokens: Arc<TokenService>) -> Self {
        Self { repo, tokens }
    }

    /// Register a new user and log them in.
    pub async fn signup(&self, form: SignupForm) -> Result<AuthResponse> {
        let form = form.clean()?;

        if self
            .repo
            .find_user_by_username(&form.username)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(format!(
                "username '{}' is already taken",
                form.username
            )));
        }

        let password_hash = hash_password(&form.password)?;
        let user = self
            .repo
            .create_user(NewUser {
                username: form.username,
                first_name: form.first_name.unwrap_or_default().trim().to_string(),
                last_name: form.last_name.unwrap_or_default().trim().to_string(),
                email: form.email.unwrap_or_default().trim().to_string(),
                password_hash,
            })
            .await?;

        info!(user_id = %user.id, username = %user.username, "User registered");
        self.respond(user.id, &user.username, urls::INDEX.to_string())
    }

    pub async fn login(&self, form: LoginForm) -> Result<AuthResponse> {
        let form = form.clean()?;

        let user = match self.repo.find_user_by_username(&form.username).await? {
            Some(user) => user,
            None => {
                warn!(username = %form.username, "Login for unknown user");
                return Err(reject_absent_user(&form.password));
            }
        };

        if let Err(e) = verify_password(&form.password, &user.password_hash) {
            warn!(user_id = %user.id, "Login with wrong password");
            return Err(e);
        }

        info!(user_id = %user.id, "User logged in");
        let next = urls::safe_next(form.next.as_deref());
        self.respond(user.id, &user.username, next)
    }

    fn respond(&self, user_id: Uuid, username: &str, redirect_to: String) -> Result<AuthResponse> {
        Ok(AuthResponse {
            user_id,
            username: username.to_string(),
            access_token: self.tokens.issue(user_id, username)?,
            token_type: "Bearer".to_string(),
            expires_in: self.tokens.ttl_secs(),
            redirect_to,
        })
    }
}
