//! Core types and trait definitions for Gatehouse.
//!
//! No HTTP or database code lives here. The account store, billing API and
//! mail relay are reached only through the traits in [`store`],
//! [`entitlement`] and [`verification`]; concrete adapters live in the
//! sibling crates.

pub mod account;
pub mod credentials;
pub mod entitlement;
pub mod error;
pub mod lifecycle;
pub mod settings;
pub mod store;
pub mod token;
pub mod verification;

pub use error::{Error, Result};

#[cfg(test)]
mod testing;
