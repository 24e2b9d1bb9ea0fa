//! Core types and definitions for the Signalscape RF engine.
//!
//! This crate defines the vocabulary shared across all other crates:
//! transmitters, mobility, propagation results, session commands,
//! snapshots, events, constants and runtime configuration.
//! It has no dependency on any scene or rendering framework.

pub mod commands;
pub mod components;
pub mod config;
pub mod constants;
pub mod enums;
pub mod events;
pub mod state;
pub mod types;

#[cfg(test)]
mod tests;
