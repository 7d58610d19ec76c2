//! Ticket marketplace API server.
//!
//! Organizers publish events with priced ticket tiers; buyers hold a cart on
//! the client and check out through [`checkout::CheckoutEngine`], which turns
//! the cart into one guarded batched write against a hierarchical document
//! store ([`store::DocumentStore`]). Either the whole checkout commits or the
//! store is left untouched.

pub mod checkout;
pub mod config;
pub mod extract;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod store;
pub mod utils;
