pub mod identity;
pub mod jwt;

pub use identity::{IdentityProvider, ADMIN_GROUP, DEFAULT_GROUP};
pub use jwt::{AuthError, Claims, HsVerifier, JwksVerifier, TokenVerifier};
