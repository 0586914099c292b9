//! The per-request authorization pipeline.
//!
//! Runs in two stages, strictly in sequence: the token-exchange middleware
//! swaps the caller's access token for a UMA2 RPT (failing the request
//! closed when it cannot), then the claims middleware decodes the RPT and
//! flattens its claims into the authority set handlers match against.

pub mod claims;
pub mod context;
pub mod exchange;
pub mod validate;

pub use claims::flatten_authorities;
pub use context::AuthContext;
pub use exchange::rpt_exchange_middleware;
pub use validate::claims_middleware;
