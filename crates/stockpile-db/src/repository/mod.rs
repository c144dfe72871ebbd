//! Stores, one per table.
//!
//! Each store is a thin wrapper around a pool clone, obtained from
//! [`crate::Database`]. Inputs are validated with `stockpile_core` before
//! any SQL runs.

pub mod product;
pub mod sale;
pub mod user;
