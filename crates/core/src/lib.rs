//! Bodega Core - Shared types library.
//!
//! This crate provides common types used across all Bodega components:
//! - `cart` - Client-side cart session manager
//! - `integration-tests` - Cross-component test scenarios
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no persistence, no
//! background tasks. This keeps it lightweight and allows it to be used
//! anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, and roles

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
