pub mod jwt;
pub mod middleware;
pub mod models;

pub use jwt::JwtService;
pub use middleware::{auth_middleware, AuthFailureLimiter, AuthState};
pub use models::{ActorContext, JwtClaims};
