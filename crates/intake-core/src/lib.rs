//! Core types and rules for the application intake system.
//!
//! The draft, its validation rules and the wizard controller live here next
//! to the [`store::ApplicationStore`] trait that the SQLite crate implements.
//! Nothing in this crate speaks HTTP or SQL.

pub mod application;
pub mod draft;
pub mod error;
pub mod export;
pub mod sharing;
pub mod step;
pub mod store;
pub mod submission;
pub mod validate;
pub mod wizard;

pub use error::{Error, Result};

#[cfg(test)]
mod fixtures;
