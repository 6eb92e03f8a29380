//! FILENAME: app/viewer-bridge/src/session.rs
//! PURPOSE: Open table views keyed by session id.
//! CONTEXT: Single-threaded. The store hands out one session at a time;
//! a request that re-enters the store while another is running fails
//! instead of aliasing the session.

use std::cell::RefCell;
use std::collections::HashMap;

use style_engine::{EngineConfig, TableViewContext};
use uuid::Uuid;

use crate::error::{BridgeError, BridgeResult};

/// One open table view.
pub struct TableSession {
    pub id: String,
    pub fingerprint: String,
    pub context: TableViewContext,
}

/// Bridge state shared by all commands.
pub struct BridgeState {
    pub config: EngineConfig,
    sessions: RefCell<HashMap<String, TableSession>>,
}

impl BridgeState {
    pub fn new(config: EngineConfig) -> Self {
        BridgeState {
            config,
            sessions: RefCell::new(HashMap::new()),
        }
    }

    /// Stores a context under a fresh id and returns the id.
    pub fn insert(&self, fingerprint: String, context: TableViewContext) -> BridgeResult<String> {
        let id = Uuid::new_v4().to_string();
        let mut sessions = self.sessions.try_borrow_mut().map_err(|_| BridgeError::SessionBusy)?;
        sessions.insert(
            id.clone(),
            TableSession {
                id: id.clone(),
                fingerprint,
                context,
            },
        );
        Ok(id)
    }

    pub fn with_session<T>(
        &self,
        id: &str,
        f: impl FnOnce(&mut TableSession) -> BridgeResult<T>,
    ) -> BridgeResult<T> {
        let mut sessions = self.sessions.try_borrow_mut().map_err(|_| BridgeError::SessionBusy)?;
        let session = sessions
            .get_mut(id)
            .ok_or_else(|| BridgeError::SessionNotFound(id.to_string()))?;
        f(session)
    }

    /// Removes a session; its context is unlinked from the source table.
    pub fn remove(&self, id: &str) -> BridgeResult<TableSession> {
        let mut sessions = self.sessions.try_borrow_mut().map_err(|_| BridgeError::SessionBusy)?;
        let mut session = sessions
            .remove(id)
            .ok_or_else(|| BridgeError::SessionNotFound(id.to_string()))?;
        session.context.unlink();
        Ok(session)
    }

    pub fn session_count(&self) -> usize {
        self.sessions.try_borrow().map(|s| s.len()).unwrap_or(0)
    }
}

impl Default for BridgeState {
    fn default() -> Self {
        BridgeState::new(EngineConfig::default())
    }
}
