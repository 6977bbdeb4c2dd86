//! Modules layer - Infrastructure components
//!
//! Contains the persistence backends behind the `Store` trait.

pub mod store;
