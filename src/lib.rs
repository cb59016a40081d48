//! Transitioner - State machine transitions for persisted entities
//!
//! An entity carries a named state attribute and moves between states
//! according to a declared transition table, with per-state validations,
//! before/after hooks and an optional all-or-nothing transactional mode.

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
