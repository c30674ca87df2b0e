/// Identity session
///
/// Wraps an external identity provider and publishes the session state (resolved flag +
/// current identity) on a watch channel. Subscribers always see the current state first,
/// then every change.
use std::sync::Arc;

use tokio::sync::{watch, Mutex};

use crate::{
    error::AppResult,
    models::{IdpCredential, SessionState, SessionTokens, UserIdentity},
};

pub mod firebase;

pub use firebase::FirebaseIdentityProvider;

/// Trait for external identity providers
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Exchanges an interactive sign-in credential for a session.
    ///
    /// A cancelled popup arrives here as a failed credential; it is not distinguished.
    async fn sign_in(&self, credential: &IdpCredential) -> AppResult<(UserIdentity, SessionTokens)>;

    async fn refresh(&self, refresh_token: &str) -> AppResult<SessionTokens>;

    async fn sign_out(&self, tokens: &SessionTokens) -> AppResult<()>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}

/// Subscription to session changes; dropping it unsubscribes
pub struct IdentityWatch {
    rx: watch::Receiver<SessionState>,
    primed: bool,
}

impl IdentityWatch {
    /// Current state on the first call, then waits for the next change.
    /// Returns `None` once the session has been dropped.
    pub async fn next(&mut self) -> Option<SessionState> {
        if !self.primed {
            self.primed = true;
            return Some(self.rx.borrow_and_update().clone());
        }

        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }
}

pub struct IdentitySession {
    provider: Arc<dyn IdentityProvider>,
    state: watch::Sender<SessionState>,
    tokens: Mutex<Option<SessionTokens>>,
}

impl IdentitySession {
    /// Creates an unresolved session
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        let (state, _) = watch::channel(SessionState::default());
        Self {
            provider,
            state,
            tokens: Mutex::new(None),
        }
    }

    pub fn current(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Raw receiver for callers that only read the latest state
    pub fn state_receiver(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn subscribe(&self) -> IdentityWatch {
        IdentityWatch {
            rx: self.state.subscribe(),
            primed: false,
        }
    }

    /// Marks the initial auth check as complete
    pub fn resolve(&self) {
        self.state.send_if_modified(|state| {
            if state.resolved {
                return false;
            }
            state.resolved = true;
            true
        });
    }

    fn publish(&self, identity: Option<UserIdentity>) {
        self.state.send_replace(SessionState {
            resolved: true,
            identity,
        });
    }

    pub async fn sign_in(&self, credential: &IdpCredential) -> AppResult<UserIdentity> {
        match self.provider.sign_in(credential).await {
            Ok((identity, tokens)) => {
                *self.tokens.lock().await = Some(tokens);
                self.publish(Some(identity.clone()));
                Ok(identity)
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    provider = self.provider.name(),
                    "Error signing in"
                );
                self.resolve();
                Err(e)
            }
        }
    }

    /// Ends the session locally even when the provider call fails
    pub async fn sign_out(&self) -> AppResult<()> {
        let tokens = self.tokens.lock().await.take();
        self.publish(None);

        if let Some(tokens) = tokens {
            if let Err(e) = self.provider.sign_out(&tokens).await {
                tracing::error!(
                    error = %e,
                    provider = self.provider.name(),
                    "Error signing out"
                );
                return Err(e);
            }
        }

        tracing::info!("Signed out");
        Ok(())
    }

    /// Refreshes expired tokens; a failed refresh invalidates the session
    pub async fn refresh_if_expired(&self) -> AppResult<()> {
        let mut tokens = self.tokens.lock().await;
        let refresh_token = match tokens.as_ref() {
            Some(current) if current.is_expired() => current.refresh_token.clone(),
            _ => return Ok(()),
        };

        match self.provider.refresh(&refresh_token).await {
            Ok(fresh) => {
                *tokens = Some(fresh);
                tracing::debug!("Session tokens refreshed");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "Token refresh failed, ending session");
                *tokens = None;
                drop(tokens);
                self.publish(None);
                Err(e)
            }
        }
    }

    /// Current id token, refreshing it first if it has expired
    pub async fn id_token(&self) -> Option<String> {
        if self.refresh_if_expired().await.is_err() {
            return None;
        }
        self.tokens
            .lock()
            .await
            .as_ref()
            .map(|tokens| tokens.id_token.clone())
    }
}
