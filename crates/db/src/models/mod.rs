//! Row models and input DTOs.
//!
//! Row structs derive `FromRow` (column aliases match the Rust field names) and
//! `Serialize` with the JSON field names the warehouse UI consumes. Input DTOs
//! carry already-validated values; request parsing lives in the API crate.

pub mod alert;
pub mod catalog;
pub mod material;
pub mod movement;
pub mod report;
pub mod reservation;
pub mod user;
