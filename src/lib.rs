//! Disaster-events analytics: load an EM-DAT table once, filter it, and
//! reduce it to the tables and matrices the dashboard draws.

pub mod data;
pub mod views;
