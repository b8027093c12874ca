//! services/api/src/lib.rs
//!
//! The benchmark service library: store adapters, configuration and the
//! HTTP layer that dispatches each request to one store.

pub mod adapters;
pub mod config;
pub mod error;
pub mod web;
