// handlers/mod.rs - Two-tier handler layout
//
// Public (no auth) → Protected (token cookie + ownership check)
//
// Every handler performs at most one document store operation and returns
// the store's result as the response body.
pub mod protected;
pub mod public;
