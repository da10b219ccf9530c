//! Session state for the logged-in user.
//!
//! The current user and the authenticated flag are persisted together under
//! `SESSION_KEY` and rehydrated when the store is created. Each operation
//! updates memory first and then commits once; a failed write is logged and
//! does not fail the operation.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::api::user_id;
use crate::client::ApiClient;
use crate::error::ApiError;
use crate::http::{Transport, UreqTransport};
use crate::storage::{load_json, save_json, KvStore};
use crate::types::{IntoId, ResponseEnvelope, User};

pub const SESSION_KEY: &str = "user-store";

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersistedSession {
    #[serde(default)]
    current_user: Option<User>,
    #[serde(default)]
    is_authenticated: bool,
}

pub struct UserStore<T = UreqTransport> {
    client: Arc<ApiClient<T>>,
    storage: Arc<dyn KvStore>,
    current_user: Option<User>,
    authenticated: bool,
}

impl<T: Transport> UserStore<T> {
    pub fn new(client: Arc<ApiClient<T>>, storage: Arc<dyn KvStore>) -> Self {
        let session: PersistedSession = match load_json(storage.as_ref(), SESSION_KEY) {
            Ok(session) => session.unwrap_or_default(),
            Err(e) => {
                tracing::error!(error = %e, "failed to restore user session");
                PersistedSession::default()
            }
        };
        // A flag without a user is not a session.
        let authenticated = session.is_authenticated && session.current_user.is_some();
        let current_user = if authenticated { session.current_user } else { None };

        Self {
            client,
            storage,
            current_user,
            authenticated,
        }
    }

    pub fn current_user(&self) -> Option<&User> {
        self.current_user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// Log in as `id`. Any failure clears the session and is returned.
    pub fn login(&mut self, id: impl IntoId) -> Result<&User, ApiError> {
        let outcome = user_id(id).and_then(|id| {
            tracing::info!(user_id = id, "logging in");
            self.client.users().login(id)
        });

        let user = outcome.and_then(|envelope| match envelope.into_result() {
            Ok(Some(user)) => Ok(user),
            Ok(None) => Err(ApiError::MissingData("login failed".to_string())),
            Err(e) => Err(e.with_default_message("login failed")),
        });

        match user {
            Ok(user) => {
                tracing::info!(user_id = user.id, username = %user.username, "logged in");
                self.authenticated = true;
                self.current_user = Some(user);
                self.commit();
                self.current_user
                    .as_ref()
                    .ok_or_else(|| ApiError::MissingData("login failed".to_string()))
            }
            Err(e) => {
                tracing::error!(error = %e, "login failed");
                self.clear();
                self.commit();
                Err(e)
            }
        }
    }

    /// Ask the server who is logged in. A "not logged in" answer (non-zero
    /// code, or success without a user) clears the session and is returned
    /// as-is; only transport failures are errors.
    pub fn fetch_current_user(&mut self) -> Result<ResponseEnvelope<User>, ApiError> {
        match self.client.users().current() {
            Ok(envelope) => {
                match envelope.data.as_ref().filter(|_| envelope.is_success()) {
                    Some(user) => {
                        tracing::debug!(user_id = user.id, "current user resolved");
                        self.current_user = Some(user.clone());
                        self.authenticated = true;
                    }
                    None => {
                        tracing::debug!(code = envelope.code, message = %envelope.message, "no current user");
                        self.clear();
                    }
                }
                self.commit();
                Ok(envelope)
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to fetch current user");
                self.clear();
                self.commit();
                Err(e)
            }
        }
    }

    /// Forget the session locally. The server is not contacted.
    pub fn logout(&mut self) {
        tracing::info!("logging out");
        self.clear();
        self.commit();
    }

    fn clear(&mut self) {
        self.current_user = None;
        self.authenticated = false;
    }

    fn commit(&self) {
        let session = PersistedSession {
            current_user: self.current_user.clone(),
            is_authenticated: self.authenticated,
        };
        if let Err(e) = save_json(self.storage.as_ref(), SESSION_KEY, &session) {
            tracing::warn!(error = %e, "failed to persist user session");
        }
    }
}
