//! Domain rules for the warehouse inventory backend.
//!
//! Nothing in this crate performs I/O. The persistence layer loads rows, runs
//! them through these rules and writes the result back inside a transaction.

pub mod alert;
pub mod error;
pub mod movement;
pub mod reservation;
pub mod stock;
pub mod types;
