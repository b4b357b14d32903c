//! Authentication primitives.
//!
//! - [`jwt`] -- JWT access-token validation against the identity provider's
//!   shared secret.

pub mod jwt;
