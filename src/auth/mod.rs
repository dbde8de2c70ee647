//! Per-gateway authentication.
//!
//! Authentication is an explicit state machine. [`AuthState::next_action`]
//! says what the driver has to do next, the driver performs it against the
//! gateway or credential store, and feeds the outcome back as an
//! [`AuthEvent`] through [`AuthState::advance`]. Transitions are pure so each
//! one can be tested without a gateway.
//!
//! ```text
//! Start ─┬─ InfoFetched ─┬─ CredentialKnown ── Login ─┬─ Authenticated
//!        │               │                            └─ LoginFailed
//!        │               └─ CredentialUnknown ─┐
//!        └─ InfoFailed ────────────────────────┴─ ProvisionAttempted ─┬─ Authenticated
//!                                                                     └─ ProvisionFailed
//! ```
//!
//! A credential is persisted only after a freshly provisioned credential has
//! logged in, and only when the gateway's identity is known. A stored
//! credential that fails to log in is never replaced automatically.

use anyhow::{Result, bail};

use crate::credentials::{Credential, CredentialStore, GatewayId};
use crate::gateway::{Gateway, GatewayInfo, hue};


#[derive(Debug, Clone, PartialEq)]
pub enum AuthState {
    Start,
    InfoFetched {
        gateway_id: GatewayId,
    },
    /// The gateway did not report its identity; provisioning is still tried.
    InfoFailed {
        reason: String,
    },
    CredentialKnown {
        gateway_id: GatewayId,
        credential: Credential,
    },
    CredentialUnknown {
        gateway_id: Option<GatewayId>,
    },
    ProvisionAttempted {
        gateway_id: Option<GatewayId>,
        credential: Credential,
    },
    Authenticated {
        gateway_id: Option<GatewayId>,
        credential: Credential,
        /// Whether the credential was created during this run.
        provisioned: bool,
    },
    LoginFailed {
        gateway_id: GatewayId,
        reason: String,
    },
    ProvisionFailed {
        gateway_id: Option<GatewayId>,
        reason: String,
    },
}

/// Outcome of the work requested by an [`AuthAction`].
#[derive(Debug, Clone, PartialEq)]
pub enum AuthEvent {
    InfoFetched(GatewayInfo),
    InfoUnavailable(String),
    CredentialFound(Credential),
    CredentialMissing,
    LoginSucceeded,
    LoginRejected(String),
    Provisioned(Credential),
    ProvisionRejected(String),
}

/// Work the driver performs to move out of a non-terminal state.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthAction {
    FetchInfo,
    LookupCredential(GatewayId),
    Login(Credential),
    Provision,
}

impl AuthState {
    pub fn name(&self) -> &'static str {
        match self {
            AuthState::Start => "Start",
            AuthState::InfoFetched { .. } => "InfoFetched",
            AuthState::InfoFailed { .. } => "InfoFailed",
            AuthState::CredentialKnown { .. } => "CredentialKnown",
            AuthState::CredentialUnknown { .. } => "CredentialUnknown",
            AuthState::ProvisionAttempted { .. } => "ProvisionAttempted",
            AuthState::Authenticated { .. } => "Authenticated",
            AuthState::LoginFailed { .. } => "LoginFailed",
            AuthState::ProvisionFailed { .. } => "ProvisionFailed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.next_action().is_none()
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::Authenticated { .. })
    }

    pub fn gateway_id(&self) -> Option<&GatewayId> {
        match self {
            AuthState::Start | AuthState::InfoFailed { .. } => None,
            AuthState::InfoFetched { gateway_id }
            | AuthState::CredentialKnown { gateway_id, .. }
            | AuthState::LoginFailed { gateway_id, .. } => Some(gateway_id),
            AuthState::CredentialUnknown { gateway_id }
            | AuthState::ProvisionAttempted { gateway_id, .. }
            | AuthState::Authenticated { gateway_id, .. }
            | AuthState::ProvisionFailed { gateway_id, .. } => gateway_id.as_ref(),
        }
    }

    /// Failure reason for failed terminal states.
    pub fn failure(&self) -> Option<&str> {
        match self {
            AuthState::LoginFailed { reason, .. } | AuthState::ProvisionFailed { reason, .. } => {
                Some(reason)
            }
            _ => None,
        }
    }

    pub fn next_action(&self) -> Option<AuthAction> {
        match self {
            AuthState::Start => Some(AuthAction::FetchInfo),
            AuthState::InfoFetched { gateway_id } => {
                Some(AuthAction::LookupCredential(gateway_id.clone()))
            }
            AuthState::InfoFailed { .. } | AuthState::CredentialUnknown { .. } => {
                Some(AuthAction::Provision)
            }
            AuthState::CredentialKnown { credential, .. }
            | AuthState::ProvisionAttempted { credential, .. } => {
                Some(AuthAction::Login(credential.clone()))
            }
            AuthState::Authenticated { .. }
            | AuthState::LoginFailed { .. }
            | AuthState::ProvisionFailed { .. } => None,
        }
    }

    /// Apply `event` to this state.
    ///
    /// An event that does not answer the state's pending action is an error.
    pub fn advance(self, event: AuthEvent) -> Result<AuthState> {
        let next = match (self, event) {
            (AuthState::Start, AuthEvent::InfoFetched(info)) => AuthState::InfoFetched {
                gateway_id: info.id,
            },
            (AuthState::Start, AuthEvent::InfoUnavailable(reason)) => {
                AuthState::InfoFailed { reason }
            }

            (AuthState::InfoFetched { gateway_id }, AuthEvent::CredentialFound(credential)) => {
                AuthState::CredentialKnown {
                    gateway_id,
                    credential,
                }
            }
            (AuthState::InfoFetched { gateway_id }, AuthEvent::CredentialMissing) => {
                AuthState::CredentialUnknown {
                    gateway_id: Some(gateway_id),
                }
            }

            (
                AuthState::CredentialKnown {
                    gateway_id,
                    credential,
                },
                AuthEvent::LoginSucceeded,
            ) => AuthState::Authenticated {
                gateway_id: Some(gateway_id),
                credential,
                provisioned: false,
            },
            (AuthState::CredentialKnown { gateway_id, .. }, AuthEvent::LoginRejected(reason)) => {
                AuthState::LoginFailed { gateway_id, reason }
            }

            (AuthState::InfoFailed { .. }, AuthEvent::Provisioned(credential)) => {
                AuthState::ProvisionAttempted {
                    gateway_id: None,
                    credential,
                }
            }
            (AuthState::CredentialUnknown { gateway_id }, AuthEvent::Provisioned(credential)) => {
                AuthState::ProvisionAttempted {
                    gateway_id,
                    credential,
                }
            }
            (AuthState::InfoFailed { .. }, AuthEvent::ProvisionRejected(reason)) => {
                AuthState::ProvisionFailed {
                    gateway_id: None,
                    reason,
                }
            }
            (
                AuthState::CredentialUnknown { gateway_id },
                AuthEvent::ProvisionRejected(reason),
            ) => AuthState::ProvisionFailed { gateway_id, reason },

            (
                AuthState::ProvisionAttempted {
                    gateway_id,
                    credential,
                },
                AuthEvent::LoginSucceeded,
            ) => AuthState::Authenticated {
                gateway_id,
                credential,
                provisioned: true,
            },
            (
                AuthState::ProvisionAttempted { gateway_id, .. },
                AuthEvent::LoginRejected(reason),
            ) => AuthState::ProvisionFailed { gateway_id, reason },

            (state, event) => bail!("Invalid authentication transition: {} on {event:?}", state.name()),
        };

        Ok(next)
    }
}

impl std::fmt::Display for AuthState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.gateway_id() {
            Some(id) => write!(f, "{} ({id})", self.name()),
            None => f.write_str(self.name()),
        }
    }
}

fn describe(error: &anyhow::Error) -> String {
    format!("{error:#}")
}

/// Perform `action` and report its outcome as an event.
fn perform(
    action: AuthAction,
    gateway: &mut dyn Gateway,
    store: &dyn CredentialStore,
    app_name: &str,
) -> AuthEvent {
    match action {
        AuthAction::FetchInfo => match gateway.fetch_info() {
            Ok(info) => AuthEvent::InfoFetched(info),
            Err(e) => AuthEvent::InfoUnavailable(describe(&e)),
        },
        AuthAction::LookupCredential(id) => match store.lookup(&id) {
            Some(credential) => AuthEvent::CredentialFound(credential),
            None => AuthEvent::CredentialMissing,
        },
        AuthAction::Login(credential) => match gateway.login(&credential) {
            Ok(()) => AuthEvent::LoginSucceeded,
            Err(e) => AuthEvent::LoginRejected(describe(&e)),
        },
        AuthAction::Provision => match gateway.provision(app_name) {
            Ok(credential) => AuthEvent::Provisioned(credential),
            Err(e) => {
                if hue::api_error(&e).is_some_and(|api| api.is_link_button_not_pressed()) {
                    log_indented!(
                        "Press the link button on bridge {} to authorize phlux",
                        gateway.address()
                    );
                }
                AuthEvent::ProvisionRejected(describe(&e))
            }
        },
    }
}

/// Drive the state machine for one gateway until it reaches a terminal
/// state.
///
/// A newly provisioned credential is written to `store` once it has logged
/// in. A failed write is logged; the session itself stays authenticated.
pub fn authenticate(
    gateway: &mut dyn Gateway,
    store: &mut dyn CredentialStore,
    app_name: &str,
) -> Result<AuthState> {
    let mut state = AuthState::Start;

    while let Some(action) = state.next_action() {
        log_debug!("Bridge {}: {} -> {:?}", gateway.address(), state, action);
        let event = perform(action, gateway, store, app_name);

        match &event {
            AuthEvent::InfoUnavailable(reason) => {
                log_indented!("Bridge did not report its identity: {reason}");
                log_indented!("Trying to register without it");
            }
            AuthEvent::CredentialMissing => {
                log_indented!("No stored credential, registering with bridge");
            }
            _ => {}
        }

        state = state.advance(event)?;
    }

    if let AuthState::Authenticated {
        gateway_id,
        credential,
        provisioned: true,
    } = &state
    {
        match gateway_id {
            Some(id) => match store.store(id, credential) {
                Ok(()) => log_indented!("Saved new credential for bridge {id}"),
                Err(e) => log_warning!("Failed to save credential for bridge {id}: {e:#}"),
            },
            None => log_warning!(
                "Bridge {} did not report its id, new credential will not be saved",
                gateway.address()
            ),
        }
    }

    Ok(state)
}
