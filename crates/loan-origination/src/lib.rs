//! Core library for the loan origination service: application intake,
//! transaction id issue, integrity sealing, and sealed-record lookup, plus
//! the configuration, telemetry, and error surface shared by its binaries.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
