//! The results data-access facade.
//!
//! A [`ResultsClient`] is built from a [`DataStore`] and an [`AuthProvider`],
//! then driven through `connect` → use → `dispose`. Facade operations never
//! return errors: failures are logged and turned into `false`, an empty
//! default, or a failed [`AuthOutcome`].

mod cleanup;
mod collections;
mod listeners;
mod normalize;
mod roles;
mod session;

use crate::auth::{AuthProvider, Identity, LocalAuth};
use crate::error::StoreError;
use crate::store::{server_timestamp, DataStore, DbPath, SqliteStore};
use crate::subscription::ObserverSet;
use parking_lot::RwLock;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub use cleanup::{CleanupReport, CLEANUP_PATHS};
pub use collections::{Collection, Shape};
pub use normalize::{coerce_list, coerce_map};
pub use roles::{Role, UserRecord};
pub use session::{AuthEvent, AuthOutcome, SignUpProfile};

const PROBE_PATH: &str = "test/probe";

/// Connection state, re-derived from what the store actually reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Failed,
}

pub struct ResultsClient {
    store: Arc<dyn DataStore>,
    auth: Arc<dyn AuthProvider>,
    state: RwLock<ConnectionState>,
    last_error: RwLock<Option<String>>,
    current: RwLock<Option<Identity>>,
    auth_observers: Arc<ObserverSet<AuthEvent>>,
}

impl ResultsClient {
    pub fn new(store: Arc<dyn DataStore>, auth: Arc<dyn AuthProvider>) -> Self {
        Self {
            store,
            auth,
            state: RwLock::new(ConnectionState::Disconnected),
            last_error: RwLock::new(None),
            current: RwLock::new(None),
            auth_observers: ObserverSet::new(),
        }
    }

    /// Client over the store and accounts kept in `workspace`. Not yet
    /// connected.
    pub fn open_workspace(workspace: &Path) -> anyhow::Result<Self> {
        let store = SqliteStore::open(workspace)?;
        let auth = LocalAuth::open(workspace)?;
        Ok(Self::new(Arc::new(store), Arc::new(auth)))
    }

    /// Probes the store with a write and a read-back, and records the outcome.
    pub fn connect(&self) -> ConnectionState {
        self.set_state(ConnectionState::Connecting);
        let probe = match DbPath::parse(PROBE_PATH) {
            Ok(p) => p,
            Err(e) => return self.fail(&e.to_string()),
        };
        let result = self
            .store
            .set(&probe, server_timestamp())
            .and_then(|_| self.store.get(&probe));
        match result {
            Ok(v) if !v.is_null() => {
                *self.last_error.write() = None;
                self.set_state(ConnectionState::Connected);
                info!("connected to data store");
                ConnectionState::Connected
            }
            Ok(_) => self.fail("probe write was not readable"),
            Err(e) => self.fail(&e.to_string()),
        }
    }

    /// Drops all auth observers and the current identity, revoking its token.
    pub fn dispose(&self) {
        self.auth_observers.clear();
        let prev = self.current.write().take();
        if let Some(prev) = prev {
            self.revoke(&prev);
        }
        self.set_state(ConnectionState::Disconnected);
        info!("client disposed");
    }

    pub fn connection_state(&self) -> ConnectionState {
        *self.state.read()
    }

    pub fn is_connected(&self) -> bool {
        self.connection_state() == ConnectionState::Connected
    }

    /// Message of the failure that last moved the client to `Failed`.
    pub fn last_error(&self) -> Option<String> {
        self.last_error.read().clone()
    }

    pub fn store(&self) -> &Arc<dyn DataStore> {
        &self.store
    }

    fn set_state(&self, next: ConnectionState) {
        let mut state = self.state.write();
        if *state != next {
            debug!(from = ?*state, to = ?next, "connection state");
            *state = next;
        }
    }

    fn fail(&self, message: &str) -> ConnectionState {
        warn!(error = %message, "data store unavailable");
        *self.last_error.write() = Some(message.to_string());
        self.set_state(ConnectionState::Failed);
        ConnectionState::Failed
    }

    /// Runs `f` against the store when connected. The error string is what
    /// the facade logs; transport errors also flip the state to `Failed`.
    fn guarded<T>(
        &self,
        op: &str,
        path: &DbPath,
        f: impl FnOnce(&dyn DataStore) -> Result<T, StoreError>,
    ) -> Result<T, String> {
        if !self.is_connected() {
            debug!(op, path = %path, state = ?self.connection_state(), "skipped, not connected");
            return Err("not connected".to_string());
        }
        f(self.store.as_ref()).map_err(|e| {
            warn!(op, path = %path, error = %e, "store call failed");
            if e.is_transport() {
                self.fail(&e.to_string());
            }
            e.to_string()
        })
    }
}
