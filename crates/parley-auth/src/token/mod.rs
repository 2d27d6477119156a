//! Session token issuance and verification.

pub mod session;

pub use session::{IssuedSessionToken, SessionTokenClaims, SessionTokenService};
