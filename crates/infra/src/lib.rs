//! Infrastructure layer: configuration, snapshot persistence and the
//! operator tooling around the role-binding backfill.

pub mod config;
pub mod snapshot;

#[cfg(test)]
mod integration_tests;
