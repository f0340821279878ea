//! Password-reset verification tokens: issuance, persistence and validation.

mod code;
mod service;
mod store;

pub use code::ResetCode;
pub use service::{TokenError, TokenService};
pub use store::{InsertError, NewVerificationToken, PgTokenStore, TokenStore, VerificationToken};

#[cfg(test)]
pub(crate) use store::testing;
