use anyhow::Result;

use crate::{
    db::Database,
    models::{TokenPair, User},
};

use super::keys;

impl Database {
    pub async fn load_tokens(&self) -> Result<Option<TokenPair>> {
        self.get_value(keys::AUTH_TOKENS).await
    }

    pub async fn save_tokens(&self, tokens: &TokenPair) -> Result<()> {
        self.put_value(keys::AUTH_TOKENS, tokens).await
    }

    pub async fn load_user(&self) -> Result<Option<User>> {
        self.get_value(keys::AUTH_USER).await
    }

    pub async fn save_user(&self, user: &User) -> Result<()> {
        self.put_value(keys::AUTH_USER, user).await
    }

    /// Drops tokens and the cached user together.
    pub async fn clear_auth(&self) -> Result<()> {
        self.remove_value(keys::AUTH_TOKENS).await?;
        self.remove_value(keys::AUTH_USER).await
    }
}
