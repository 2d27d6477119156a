//! OAuth 2.0 authorization-code login flow against the external
//! identity provider.
//!
//! The flow has two halves:
//!
//! 1. [`authorize`] builds the provider redirect and registers a CSRF
//!    state value.
//! 2. [`callback`] validates the echoed state, exchanges the code for
//!    provider tokens, resolves the identity, and mints the session
//!    token.

pub mod authorize;
pub mod callback;
pub mod state;

pub use authorize::{LoginRequest, LoginRequestBuilder};
pub use callback::{CallbackExchanger, CallbackParams, LoginOutcome};
pub use state::{StateStore, generate_state};
