//! Authorization: revocation gate and permission evaluation.
//!
//! A session token is self-contained proof of a *prior* login, never of
//! *current* authorization. Every protected request therefore chains
//! the token verifier with the [`RevocationGate`], and permission
//! checks run only after the gate has passed.

pub mod evaluator;
pub mod gate;

pub use evaluator::PermissionEvaluator;
pub use gate::RevocationGate;
