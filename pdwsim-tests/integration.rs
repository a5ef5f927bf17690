//! Integration tests for pdwsim
//!
//! These tests drive whole scenarios through configuration, emitters, the
//! merger and the CSV sink, checking the properties that only show up when
//! the pieces run together.

#[path = "integration/conservation.rs"]
mod conservation;
#[path = "integration/determinism.rs"]
mod determinism;
#[path = "integration/merge_scenario.rs"]
mod merge_scenario;
#[path = "integration/properties.rs"]
mod properties;
