//! # parley-auth
//!
//! Identity and trust for the Parley platform.
//!
//! This crate provides:
//! - OAuth 2.0 authorization-code login against the external identity
//!   provider
//! - Issuance and verification of the application's signed session
//!   token
//! - A revocation gate reconciling stateless tokens with mutable
//!   account state
//! - Permission evaluation with an implicit `admin` superset
//! - HMAC verification of inbound messaging-platform webhooks
//! - Audit events for login, logout, refresh, and revoke
//!
//! ## Trust model
//!
//! A session token proves a prior successful login. It is never, by
//! itself, proof of current authorization: every protected request
//! chains [`token::SessionTokenService::verify`] with
//! [`authz::RevocationGate::check`]. Webhook requests are trusted
//! through an entirely independent path, [`webhook`].
//!
//! ## Modules
//!
//! - [`config`] - Configuration, validated fatally at startup
//! - [`error`] - The `AuthError` kinds callers match on
//! - [`oauth`] - Login redirect and callback exchange
//! - [`token`] - Session token issuance and verification
//! - [`identity`] - User records, grants, and the storage trait
//! - [`authz`] - Revocation gate and permission evaluator
//! - [`webhook`] - Inbound signature verification
//! - [`audit`] - Audit events and sink trait
//! - [`middleware`] - Axum extractors
//! - [`http`] - Axum handlers and router
//! - [`secrets`] - AES-256-GCM sealing of stored provider tokens

pub mod audit;
pub mod authz;
pub mod config;
pub mod error;
pub mod http;
pub mod identity;
pub mod middleware;
pub mod oauth;
pub mod secrets;
pub mod token;
pub mod webhook;

pub use audit::{AuditSink, AuthAction, AuthEvent, TracingAuditSink};
pub use authz::{PermissionEvaluator, RevocationGate};
pub use config::{AuthConfig, ConfigError};
pub use error::{AuthError, ErrorCategory};
pub use http::{AuthHttpState, router};
pub use identity::{IdentityStore, PermissionGrant, User};
pub use middleware::{AdminAuth, AuthContext, AuthState, SessionAuth};
pub use oauth::{
    CallbackExchanger, CallbackParams, LoginOutcome, LoginRequest, LoginRequestBuilder,
    StateStore, generate_state,
};
pub use secrets::{SealedSecret, TokenCipher};
pub use token::{IssuedSessionToken, SessionTokenClaims, SessionTokenService};
pub use webhook::WebhookSignatureVerifier;

/// Type alias for authentication/authorization results.
pub type AuthResult<T> = Result<T, AuthError>;
