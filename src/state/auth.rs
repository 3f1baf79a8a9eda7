use chrono::Utc;
use tokio::sync::{watch, RwLock};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::{NewUser, User, ADMIN_USERNAME};
use crate::store::{Filter, StoreClient, StoreError};

/// Point-in-time view of the session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthSnapshot {
    pub current_user: Option<User>,
    pub is_loading: bool,
    pub last_error: Option<String>,
    pub is_initialized: bool,
}

/// Session and credential management against the `users` collection.
pub struct AuthState {
    store: StoreClient,
    inner: RwLock<AuthSnapshot>,
    refreshes: watch::Sender<u64>,
}

impl AuthState {
    pub fn new(store: StoreClient) -> Self {
        let (refreshes, _) = watch::channel(0);
        Self {
            store,
            inner: RwLock::new(AuthSnapshot::default()),
            refreshes,
        }
    }

    pub async fn snapshot(&self) -> AuthSnapshot {
        self.inner.read().await.clone()
    }

    pub async fn current_user(&self) -> Option<User> {
        self.inner.read().await.current_user.clone()
    }

    /// The signed-in user, or `Error::NotSignedIn`.
    pub async fn require_user(&self) -> Result<User> {
        self.current_user().await.ok_or(Error::NotSignedIn)
    }

    pub async fn is_admin(&self) -> bool {
        self.inner
            .read()
            .await
            .current_user
            .as_ref()
            .is_some_and(User::is_admin)
    }

    /// Revision bumped after every `refresh_users`, successful or not.
    pub fn watch_refreshes(&self) -> watch::Receiver<u64> {
        self.refreshes.subscribe()
    }

    async fn begin(&self) {
        let mut state = self.inner.write().await;
        state.is_loading = true;
        state.last_error = None;
    }

    async fn fail(&self, message: String) {
        let mut state = self.inner.write().await;
        state.is_loading = false;
        state.last_error = Some(message);
    }

    /// Makes sure the bootstrap administrator exists.
    pub async fn initialize(&self) -> Result<()> {
        self.begin().await;

        match self.ensure_admin().await {
            Ok(created) => {
                if created {
                    tracing::info!("Created default administrator '{}'", ADMIN_USERNAME);
                }
                let mut state = self.inner.write().await;
                state.is_loading = false;
                state.is_initialized = true;
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Failed to initialize: {}", e);
                self.fail(format!("Failed to initialize the store: {}", e))
                    .await;
                Err(e.into())
            }
        }
    }

    async fn ensure_admin(&self) -> Result<bool, StoreError> {
        let existing: Option<User> = self
            .store
            .get_one(&Filter::new().eq("username", ADMIN_USERNAME))
            .await?;
        if existing.is_some() {
            return Ok(false);
        }
        self.store.insert(&[User::default_admin()]).await?;
        Ok(true)
    }

    /// Signs in when exactly one user matches.
    pub async fn login(&self, username: &str, secret: &str) -> bool {
        self.begin().await;

        // Plaintext equality against the stored secret; not a hardened check.
        let filter = Filter::new()
            .eq("username", username.trim().to_lowercase())
            .eq("secret", secret);

        let result = self.store.select::<User>(&filter).await;
        let mut state = self.inner.write().await;
        state.is_loading = false;

        match result {
            Ok(users) if users.len() == 1 => {
                let user = users.into_iter().next();
                if let Some(user) = &user {
                    tracing::info!("Signed in as {}", user);
                }
                state.current_user = user;
                true
            }
            Ok(users) => {
                tracing::debug!("Login matched {} user(s)", users.len());
                state.last_error = Some("Invalid credentials".to_string());
                false
            }
            Err(e) => {
                tracing::warn!("Login failed: {}", e);
                state.last_error = Some(format!("Login failed: {}", e));
                false
            }
        }
    }

    pub async fn logout(&self) {
        self.inner.write().await.current_user = None;
    }

    /// Creates a credential record. The username is stored lowercased.
    pub async fn add_user(&self, new_user: NewUser) -> Result<User> {
        self.begin().await;

        let username = new_user.username.trim().to_lowercase();
        if username.is_empty() || new_user.secret.is_empty() {
            let e = Error::Validation("Username and secret are required".to_string());
            self.fail(e.to_string()).await;
            return Err(e);
        }

        let user = User {
            id: new_user.id.unwrap_or_else(|| Uuid::new_v4().to_string()),
            username,
            secret: new_user.secret,
            role: new_user.role,
            created_at: Some(Utc::now()),
        };

        match self.store.insert(std::slice::from_ref(&user)).await {
            Ok(()) => {
                self.inner.write().await.is_loading = false;
                tracing::info!("Added user {}", user);
                Ok(user)
            }
            Err(e) => {
                self.fail(format!("Failed to add user: {}", e)).await;
                Err(e.into())
            }
        }
    }

    /// Re-reads the signed-in user's row. Failures are logged only.
    pub async fn refresh_users(&self) {
        match self.store.list_all::<User>(Some("username")).await {
            Ok(users) => {
                let mut state = self.inner.write().await;
                let fresh = state
                    .current_user
                    .as_ref()
                    .and_then(|current| users.into_iter().find(|u| u.id == current.id));
                if fresh.is_some() {
                    state.current_user = fresh;
                }
            }
            Err(e) => tracing::warn!("Failed to refresh users: {}", e),
        }
        self.refreshes.send_modify(|revision| *revision += 1);
    }
}
