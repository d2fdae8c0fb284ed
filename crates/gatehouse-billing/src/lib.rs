//! Stripe-compatible billing client for Gatehouse.
//!
//! Implements [`gatehouse_core::entitlement::BillingClient`] by listing the
//! customers registered under an email address, with their subscriptions
//! expanded, and reducing them to a
//! [`SubscriptionStanding`](gatehouse_core::entitlement::SubscriptionStanding).

pub mod client;
pub mod error;
pub mod standing;

pub use client::StripeClient;
pub use error::Error;
