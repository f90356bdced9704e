//! Service-to-service authentication.

pub mod jwt;

pub use jwt::{JwtConfig, ServiceClaims};
