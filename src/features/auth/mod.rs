//! Bearer token authentication and role guards.

mod jwks;
mod validator;

pub mod guards;
pub mod model;

pub use jwks::{JwksClient, JwksError};
pub use validator::{JwtValidator, TokenVerifier};
