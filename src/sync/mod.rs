//! Client-side state synchronization.
//!
//! `SyncClient` is the application-state object handed to the view layer. Its
//! lifecycle is `init` (restore session) → `populate` → mutate → `logout`
//! (clear). Mutators live in `mutations`.

mod mutations;
mod report;

pub use report::*;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;

use crate::api::{ApiClient, Resource};
use crate::auth::SessionStore;
use crate::config::Config;
use crate::db::{init_storage, LocalStore};
use crate::errors::ClientError;
use crate::models::{Credentials, Notification, Role, Session, SignupRequest};
use crate::push::{PushEvent, PushSubscription};
use crate::state::ClientState;

/// Shared handle on the state container.
pub type SharedState = Arc<RwLock<ClientState>>;

const CONSUMER_STOP_TIMEOUT: Duration = Duration::from_secs(1);

/// The live push subscription and the task merging its events into state.
struct ActivePush {
    subscription: PushSubscription,
    consumer: JoinHandle<()>,
}

/// Authenticated client state kept in sync with the backend.
pub struct SyncClient {
    config: Config,
    api: ApiClient,
    session: SessionStore,
    state: SharedState,
    push: Mutex<Option<ActivePush>>,
}

impl SyncClient {
    pub fn new(config: Config, storage: LocalStore) -> Result<Self, ClientError> {
        let api = ApiClient::new(&config.api_base_url)?;
        let session = SessionStore::new(storage, api.clone());

        Ok(Self {
            config,
            api,
            session,
            state: Arc::new(RwLock::new(ClientState::new())),
            push: Mutex::new(None),
        })
    }

    /// Open local storage at the configured path and build a client on it.
    pub async fn connect(config: Config) -> Result<Self, ClientError> {
        let pool = init_storage(&config.storage_path).await?;
        Self::new(config, LocalStore::new(pool))
    }

    pub fn state(&self) -> SharedState {
        Arc::clone(&self.state)
    }

    /// Copy of the current state.
    pub async fn snapshot(&self) -> ClientState {
        self.state.read().await.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.state.read().await.is_authenticated()
    }

    pub async fn current_session(&self) -> Option<Session> {
        self.state.read().await.session.clone()
    }

    pub async fn current_role(&self) -> Option<Role> {
        self.state
            .read()
            .await
            .session
            .as_ref()
            .and_then(|s| s.role.clone())
    }

    pub fn session_store(&self) -> &SessionStore {
        &self.session
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    // ==================== LIFECYCLE ====================

    /// Restore a persisted session. Returns the populate report when a
    /// session could be restored, `None` when starting logged out.
    pub async fn init(&self) -> Option<SyncReport> {
        let Some(session) = self.session.restore().await else {
            tracing::info!("No usable stored session; starting logged out");
            return None;
        };
        tracing::info!("Restored session for user {}", session.user_id);
        Some(self.start_session(session).await)
    }

    /// Authenticate, persist the token pair and load state.
    ///
    /// On failure the error is logged and returned and the client stays
    /// unauthenticated.
    pub async fn login(&self, credentials: &Credentials) -> Result<SyncReport, ClientError> {
        let session = match self.authenticate(credentials).await {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!("Login failed for {}: {}", credentials.username, e);
                return Err(e);
            }
        };

        tracing::info!("Logged in as user {}", session.user_id);
        Ok(self.start_session(session).await)
    }

    async fn authenticate(&self, credentials: &Credentials) -> Result<Session, ClientError> {
        let tokens = self.api.login(credentials).await?;
        self.session.save_tokens(&tokens).await
    }

    /// Create an account. Does not log in.
    pub async fn signup(&self, request: &SignupRequest) -> Result<(), ClientError> {
        if request.username.trim().is_empty()
            || request.email.trim().is_empty()
            || request.password.is_empty()
        {
            return Err(ClientError::Validation(
                "Username, email and password are required".to_string(),
            ));
        }

        self.api.signup(request).await.inspect_err(|e| {
            tracing::warn!("Signup failed for {}: {}", request.username, e);
        })
    }

    async fn start_session(&self, session: Session) -> SyncReport {
        let token = session.access_token().to_string();
        self.api.set_access_token(Some(token.clone())).await;
        self.state.write().await.session = Some(session);

        let report = self.populate().await;

        if let Err(e) = self.open_push(&token).await {
            tracing::warn!("Push channel not started: {}", e);
        }
        report
    }

    /// Close the push channel, drop all state and forget the stored tokens.
    pub async fn logout(&self) -> Result<(), ClientError> {
        self.close_push().await;
        self.state.write().await.clear();
        self.api.set_access_token(None).await;
        self.session.clear().await?;
        tracing::info!("Logged out");
        Ok(())
    }

    /// Close the push channel but keep the stored session for the next start.
    pub async fn shutdown(&self) {
        self.close_push().await;
    }

    // ==================== FETCHING ====================

    /// Fetch projects, users, tasks and notifications concurrently. Each
    /// failed collection is reset to empty and listed in the report.
    pub async fn populate(&self) -> SyncReport {
        let user_id = self
            .state
            .read()
            .await
            .session
            .as_ref()
            .map(|s| s.user_id.clone());

        let (projects, users, tasks, notifications) = tokio::join!(
            self.api.list_projects(),
            self.api.list_users(),
            self.api.list_tasks(),
            self.fetch_notifications(user_id.as_deref()),
        );

        let mut report = SyncReport::default();
        let mut state = self.state.write().await;
        state.projects = report.settle(Resource::Projects, projects);
        state.users = report.settle(Resource::Users, users);
        state.tasks = report.settle(Resource::Tasks, tasks);
        state.notifications = report.settle(Resource::Notifications, notifications);

        tracing::info!(
            "Loaded {} projects, {} users, {} tasks, {} notifications",
            state.projects.len(),
            state.users.len(),
            state.tasks.len(),
            state.notifications.len()
        );
        report
    }

    async fn fetch_notifications(
        &self,
        user_id: Option<&str>,
    ) -> Result<Vec<Notification>, ClientError> {
        match user_id {
            Some(id) => self.api.list_notifications(id).await,
            None => Ok(Vec::new()),
        }
    }

    pub async fn refresh_projects(&self) -> Result<(), ClientError> {
        let (items, outcome) = degrade(Resource::Projects, self.api.list_projects().await);
        self.state.write().await.projects = items;
        outcome
    }

    pub async fn refresh_tasks(&self) -> Result<(), ClientError> {
        let (items, outcome) = degrade(Resource::Tasks, self.api.list_tasks().await);
        self.state.write().await.tasks = items;
        outcome
    }

    pub async fn refresh_users(&self) -> Result<(), ClientError> {
        let (items, outcome) = degrade(Resource::Users, self.api.list_users().await);
        self.state.write().await.users = items;
        outcome
    }

    pub async fn refresh_notifications(&self) -> Result<(), ClientError> {
        let user_id = self
            .state
            .read()
            .await
            .session
            .as_ref()
            .map(|s| s.user_id.clone());
        let result = self.fetch_notifications(user_id.as_deref()).await;
        let (items, outcome) = degrade(Resource::Notifications, result);
        self.state.write().await.notifications = items;
        outcome
    }

    // ==================== PUSH ====================

    /// Merge one pushed event into state.
    pub async fn apply_push_event(&self, event: PushEvent) {
        self.state.write().await.apply_push(event);
    }

    pub async fn is_push_active(&self) -> bool {
        self.push
            .lock()
            .await
            .as_ref()
            .is_some_and(|p| p.subscription.is_running())
    }

    async fn open_push(&self, access_token: &str) -> Result<(), ClientError> {
        self.close_push().await;

        let (subscription, mut events) = PushSubscription::open(
            &self.config.push_url,
            access_token,
            self.config.push_reconnect_delay,
        )?;

        let state = Arc::clone(&self.state);
        let consumer = tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                state.write().await.apply_push(event);
            }
        });

        *self.push.lock().await = Some(ActivePush {
            subscription,
            consumer,
        });
        Ok(())
    }

    async fn close_push(&self) {
        let Some(active) = self.push.lock().await.take() else {
            return;
        };

        active.subscription.close().await;
        let mut consumer = active.consumer;
        if tokio::time::timeout(CONSUMER_STOP_TIMEOUT, &mut consumer)
            .await
            .is_err()
        {
            consumer.abort();
        }
        tracing::debug!("Push channel closed");
    }
}
