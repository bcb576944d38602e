//! Authentication and authorization module

pub mod cookie;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod policy;

pub use jwt::{Claims, JwtService, TokenClass, TokenError, TokenPair};
pub use middleware::{
    authenticate, extract_token, jwt_auth_middleware, optional_auth_middleware, AuthMode,
    Identity, MaybeIdentity,
};
pub use password::{HashError, PasswordHasher};
pub use policy::{can_access, ensure_can_access};
