//! Authentication slice
//!
//! Owns the signed-in user. Tokens themselves live in the [`Session`]
//! token store shared with the HTTP client.
//!
//! [`Session`]: mailreach_client::Session

use crate::async_op::AsyncOp;
use crate::store::Store;
use mailreach_client::models::{validate_payload, LoginRequest, RegisterRequest, User};
use mailreach_common::{Error, Result};
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct AuthState {
    pub user: Option<User>,
    pub is_authenticated: bool,
    pub login: AsyncOp,
    pub register: AsyncOp,
    pub session_check: AsyncOp,
}

impl Default for AuthState {
    fn default() -> Self {
        Self {
            user: None,
            is_authenticated: false,
            login: AsyncOp::latest_only(),
            register: AsyncOp::concurrent(),
            session_check: AsyncOp::latest_only(),
        }
    }
}

impl AuthState {
    fn sign_in(&mut self, user: &User) {
        self.user = Some(user.clone());
        self.is_authenticated = true;
    }

    fn sign_out(&mut self) {
        self.user = None;
        self.is_authenticated = false;
    }
}

impl Store {
    /// Log in, persist the token pair and load the user
    pub async fn login(&self, input: &LoginRequest) -> Result<User> {
        validate_payload(input)?;
        let user = self
            .dispatch(
                |s| &mut s.auth.login,
                async {
                    let tokens = self.services().auth.login(input).await?;
                    self.session()
                        .store_tokens(&tokens.access_token, tokens.refresh_token.as_deref())?;
                    match tokens.user {
                        Some(user) => Ok(user),
                        None => self.services().auth.me().await,
                    }
                },
                |s, user: &User| s.auth.sign_in(user),
            )
            .await?;
        info!("Logged in as {}", user.email);
        Ok(user)
    }

    pub async fn register(&self, input: &RegisterRequest) -> Result<User> {
        validate_payload(input)?;
        self.dispatch(
            |s| &mut s.auth.register,
            self.services().auth.register(input),
            |_, _: &User| {},
        )
        .await
    }

    /// Log out on the backend, then always drop the local session and every
    /// cached entity
    pub async fn logout(&self) -> Result<()> {
        if let Err(e) = self.services().auth.logout().await {
            warn!("Logout request failed, clearing session anyway: {}", e);
        }
        self.session().clear();
        self.reset().await;
        info!("Logged out");
        Ok(())
    }

    /// Confirm the stored session with `GET /auth/me`.
    ///
    /// A rejected access token is refreshed once and `me` retried. If that
    /// fails too the session is cleared and `Ok(false)` returned.
    pub async fn check_session(&self) -> Result<bool> {
        if !self.session().is_present() {
            self.update(|s| s.auth.sign_out()).await;
            return Ok(false);
        }

        let outcome = self
            .dispatch(
                |s| &mut s.auth.session_check,
                self.current_user(),
                |s, user: &User| s.auth.sign_in(user),
            )
            .await;

        match outcome {
            Ok(_) => Ok(true),
            Err(e) if e.is_unauthorized() => {
                info!("Session expired: {}", e);
                self.session().clear();
                self.update(|s| s.auth.sign_out()).await;
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    async fn current_user(&self) -> Result<User> {
        let auth = &self.services().auth;
        let err = match auth.me().await {
            Err(e) if e.is_unauthorized() => e,
            other => return other,
        };

        let Some(refresh_token) = self.session().refresh_token() else {
            return Err(err);
        };

        info!("Access token rejected, refreshing session");
        let tokens = match auth.refresh(&refresh_token).await {
            Ok(tokens) => tokens,
            Err(Error::Api { message, body, .. }) | Err(Error::Unauthorized { message, body }) => {
                return Err(Error::Unauthorized { message, body });
            }
            Err(e) => return Err(e),
        };
        self.session()
            .store_tokens(&tokens.access_token, tokens.refresh_token.as_deref())?;
        auth.me().await
    }
}
