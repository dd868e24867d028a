pub mod auth;

pub use auth::{jwt_cookie_middleware, AuthUser};
