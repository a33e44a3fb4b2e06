//! Core types and business rules for the medbay injury register.
//!
//! This crate is deliberately free of HTTP and database dependencies. It
//! holds the domain model, the pure derivation helpers, the lifecycle
//! controller and the reporting aggregates. Storage backends implement
//! [`store::InjuryStore`].

pub mod catalog;
pub mod derive;
pub mod error;
pub mod injury;
pub mod lifecycle;
pub mod report;
pub mod roster;
pub mod store;

pub use error::{Error, Result};
