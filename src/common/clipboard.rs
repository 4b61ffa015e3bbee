//! Best-effort clipboard copy through whatever helper is installed.

use crate::debug_log;
use std::io::Write;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

/// Candidate programs, tried in order until one succeeds
const BACKENDS: &[(&str, &[&str])] = &[
    ("wl-copy", &[]),
    ("xclip", &["-selection", "clipboard"]),
    ("xsel", &["--clipboard", "--input"]),
    ("pbcopy", &[]),
    ("tmux", &["load-buffer", "-"]),
];

const BACKEND_TIMEOUT: Duration = Duration::from_secs(1);

/// Copy `text` on a detached thread. Nothing is reported back; every failure
/// (missing binary, timeout, non-zero exit) just moves on to the next backend.
pub fn copy_detached(text: String) {
    let spawned = thread::Builder::new()
        .name("clipboard".to_string())
        .spawn(move || {
            copy_with(BACKENDS, text.as_bytes(), BACKEND_TIMEOUT);
        });
    if let Err(e) = spawned {
        debug_log!("CLIPBOARD: could not spawn thread: {}", e);
    }
}

/// Try each backend in turn; returns the program that accepted the text
fn copy_with(backends: &[(&str, &[&str])], bytes: &[u8], timeout: Duration) -> Option<String> {
    for (program, args) in backends {
        match pipe_to(program, args, bytes, timeout) {
            Ok(()) => {
                debug_log!("CLIPBOARD: copied {} bytes via {}", bytes.len(), program);
                return Some(program.to_string());
            }
            Err(reason) => debug_log!("CLIPBOARD: {} failed: {}", program, reason),
        }
    }
    None
}

fn pipe_to(program: &str, args: &[&str], bytes: &[u8], timeout: Duration) -> Result<(), String> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| e.to_string())?;

    if let Some(mut stdin) = child.stdin.take() {
        // Dropping stdin closes the pipe so the helper sees EOF
        stdin.write_all(bytes).map_err(|e| e.to_string())?;
    }

    let deadline = Instant::now() + timeout;
    loop {
        match child.try_wait() {
            Ok(Some(status)) if status.success() => return Ok(()),
            Ok(Some(status)) => return Err(format!("exited with {}", status)),
            Ok(None) if Instant::now() >= deadline => {
                let _ = child.kill();
                let _ = child.wait();
                return Err("timed out".to_string());
            }
            Ok(None) => thread::sleep(Duration::from_millis(10)),
            Err(e) => return Err(e.to_string()),
        }
    }
}
