//! Hamstead library crate: re-exports all modules for integration testing.
//!
//! The binary crate (`main.rs`) is the headless sanctuary runner.
//! This library crate exposes the same modules so that `tests/` integration
//! tests can import engine types, systems, and resources directly.

pub mod shared;
pub mod error;
pub mod config;
pub mod data;
pub mod clock;
pub mod visits;
pub mod biome;
pub mod ledger;
pub mod save;
