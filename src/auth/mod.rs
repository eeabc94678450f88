//! Authentication module

pub mod extractor;
pub mod jwt;

pub use extractor::OptionalUser;
pub use jwt::{Claims, CurrentUser, JwtConfig, JwtError, JwtService, TokenPair};
