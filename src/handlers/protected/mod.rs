// handlers/protected/mod.rs - Protected handlers (token cookie required)
//
// Routed behind `jwt_cookie_middleware`, so an `AuthUser` is always present
// in the request extensions when these run.

pub mod bookings;
