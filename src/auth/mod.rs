//! Access/refresh token pair held in memory and mirrored to client storage.

use std::sync::{Arc, RwLock};

use anyhow::Result;
use log::info;
use tokio::sync::watch;

use crate::{
    db::Database,
    models::{TokenPair, User},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStatus {
    LoggedIn,
    LoggedOut,
}

#[derive(Clone)]
pub struct AuthTokens {
    tokens: Arc<RwLock<Option<TokenPair>>>,
    db: Database,
    status: Arc<watch::Sender<AuthStatus>>,
}

impl AuthTokens {
    /// Restores any tokens persisted by a previous run.
    pub async fn load(db: Database) -> Result<Self> {
        let stored = db.load_tokens().await?;
        let status = if stored.is_some() {
            AuthStatus::LoggedIn
        } else {
            AuthStatus::LoggedOut
        };
        let (status_tx, _) = watch::channel(status);

        Ok(Self {
            tokens: Arc::new(RwLock::new(stored)),
            db,
            status: Arc::new(status_tx),
        })
    }

    pub fn access_token(&self) -> Option<String> {
        self.read().as_ref().map(|pair| pair.access.clone())
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.read().as_ref().map(|pair| pair.refresh.clone())
    }

    pub fn is_logged_in(&self) -> bool {
        self.read().is_some()
    }

    pub fn status(&self) -> AuthStatus {
        *self.status.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthStatus> {
        self.status.subscribe()
    }

    pub async fn store(&self, pair: TokenPair) -> Result<()> {
        self.db.save_tokens(&pair).await?;
        *self.write() = Some(pair);
        self.status.send_replace(AuthStatus::LoggedIn);
        Ok(())
    }

    pub async fn cached_user(&self) -> Result<Option<User>> {
        self.db.load_user().await
    }

    pub async fn cache_user(&self, user: &User) -> Result<()> {
        self.db.save_user(user).await
    }

    /// Local teardown: memory, storage, and workout timer anchors.
    pub async fn clear(&self) -> Result<()> {
        *self.write() = None;
        self.status.send_replace(AuthStatus::LoggedOut);
        self.db.clear_auth().await?;
        let anchors = self.db.clear_all_workout_anchors().await?;
        info!("Cleared local session ({anchors} workout anchors)");
        Ok(())
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Option<TokenPair>> {
        match self.tokens.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Option<TokenPair>> {
        match self.tokens.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
