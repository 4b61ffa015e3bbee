//! External collaborators (tmux, the process table, clipboard) and shared types.

pub mod clipboard;
pub mod debug;
pub mod process;
pub mod tmux;
pub mod types;
