//! Authentication service

use crate::http::ApiClient;
use crate::models::{LoginRequest, RegisterRequest, TokenResponse, User};
use crate::normalize::unwrap_entity;
use mailreach_common::{Error, Result};
use serde_json::json;

/// Authentication endpoints. Token persistence is left to the caller.
#[derive(Clone, Debug)]
pub struct AuthService {
    client: ApiClient,
}

impl AuthService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// POST /auth/login
    pub async fn login(&self, input: &LoginRequest) -> Result<TokenResponse> {
        let body = self.client.post("/auth/login", input).await?;
        unwrap_entity(&body, "tokens")
    }

    /// POST /auth/register
    pub async fn register(&self, input: &RegisterRequest) -> Result<User> {
        let body = self.client.post("/auth/register", input).await?;
        unwrap_entity(&body, "user")
    }

    /// POST /auth/logout
    pub async fn logout(&self) -> Result<()> {
        self.client.post_empty("/auth/logout").await?;
        Ok(())
    }

    /// POST /auth/verify-token. An expired or unknown token is `Ok(false)`.
    pub async fn verify_token(&self, token: &str) -> Result<bool> {
        match self
            .client
            .post("/auth/verify-token", &json!({ "token": token }))
            .await
        {
            Ok(body) => Ok(body
                .get("valid")
                .and_then(|v| v.as_bool())
                .unwrap_or(true)),
            Err(Error::Unauthorized { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// POST /auth/refresh
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse> {
        let body = self
            .client
            .post("/auth/refresh", &json!({ "refresh_token": refresh_token }))
            .await?;
        unwrap_entity(&body, "tokens")
    }

    /// GET /auth/me
    pub async fn me(&self) -> Result<User> {
        let body = self.client.get("/auth/me").await?;
        unwrap_entity(&body, "user")
    }
}
