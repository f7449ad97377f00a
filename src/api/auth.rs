use log::{info, warn};
use reqwest::Method;
use serde_json::{json, Value};

use crate::models::{Registration, TokenPair, User};

use super::{
    client::{unwrap_envelope, ApiClient},
    error::{ApiError, ApiResult},
};

impl ApiClient {
    /// Stores the token pair, then fetches and caches the profile.
    pub async fn login(&self, username: &str, password: &str) -> ApiResult<User> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(ApiError::Validation(
                "username and password are required".into(),
            ));
        }

        let pair: TokenPair = self
            .send_anonymous(
                "users/login/",
                &json!({ "username": username, "password": password }),
            )
            .await?;
        self.tokens().store(pair).await?;

        let user = self.me().await?;
        self.tokens().cache_user(&user).await?;
        info!("Logged in as {}", user.username);
        Ok(user)
    }

    /// Creates the account; the caller logs in separately.
    pub async fn register(&self, registration: &Registration) -> ApiResult<User> {
        if registration.password.chars().count() < 6 {
            return Err(ApiError::Validation(
                "password must be at least 6 characters".into(),
            ));
        }
        let value: Value = self
            .send_anonymous("users/register/", registration)
            .await?;
        unwrap_envelope(value, "user")
    }

    /// Blacklists the refresh token if the server is reachable, then tears
    /// down local state regardless.
    pub async fn logout(&self) -> ApiResult<()> {
        if let Some(refresh) = self.tokens().refresh_token() {
            let result: ApiResult<Value> = self
                .send(Method::POST, "users/logout/", &json!({ "refresh": refresh }))
                .await;
            if let Err(err) = result {
                warn!("Server logout failed, clearing local session anyway: {err}");
            }
        }
        self.tokens().clear().await?;
        Ok(())
    }

    pub async fn current_user(&self) -> ApiResult<Option<User>> {
        Ok(self.tokens().cached_user().await?)
    }
}
