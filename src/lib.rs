//! Amnesia Anchoring Library
//!
//! Resolves annotation selectors against paginated documents whose text is
//! extracted and rendered lazily, and describes live selections as
//! selectors. The HTTP service binary is in main.rs.
//!
//! # Modules
//!
//! - `selectors`: Serializable quote and position selectors
//! - `anchoring`: Anchoring engine (caches, quote search, describe)
//! - `memory`: In-memory paginated document used by the service and tests
//! - `config`, `error`, `state`, `routes`: HTTP service

pub mod anchoring;
pub mod memory;
pub mod selectors;

pub mod config;
pub mod error;
pub mod routes;
pub mod state;
