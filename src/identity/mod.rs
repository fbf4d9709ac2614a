//! Identity store: accounts, passwords, tokens and profile attributes.

mod attributes;
mod password;
mod service;
mod tokens;
mod user;

pub use attributes::{decode_list, encode_list, MAX_ATTRIBUTE_LENGTH};
pub use password::{hash_password, validate_password, verify_password, PasswordError};
pub use service::{AuthSession, IdentityService, ProfileChanges, Registration, UserProfile};
pub use tokens::{AccessClaims, IdClaims, TokenIssuer};
pub use user::{User, UserRepository};
