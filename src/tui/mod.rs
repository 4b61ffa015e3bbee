//! Interactive terminal UI: state machine, key table, pacing and rendering.

pub mod app;
pub mod input;
pub mod schedule;
pub mod ui;
