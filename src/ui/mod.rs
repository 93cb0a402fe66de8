//! egui rendering. Reads [`crate::state::AppState`]; never filters or
//! aggregates on its own.

pub mod pages;
pub mod panels;
pub mod plot;
