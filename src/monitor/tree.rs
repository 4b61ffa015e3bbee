//! Pane process trees, flattened in pre-order, and their connector glyphs.

use crate::common::process::{display_command, ProcessSource};
use crate::common::types::ProcessNode;
use crate::monitor::cpu::CpuTracker;
use std::collections::HashSet;
use std::time::Instant;

pub const BRANCH: &str = "├──";
pub const LAST: &str = "└──";
pub const PIPE: &str = "│   ";
pub const BLANK: &str = "    ";

/// Walk every pane root and return all their processes in pre-order.
///
/// Each PID is sampled once per call (advancing its CPU baseline) and appears
/// at most once, even if two panes share a process.
pub fn build_tree<S: ProcessSource>(
    source: &S,
    cpu: &mut CpuTracker,
    now: Instant,
    pane_pids: &[u32],
) -> Vec<ProcessNode> {
    let mut visited = HashSet::new();
    let mut nodes = Vec::new();
    for &root in pane_pids {
        nodes.extend(walk(source, cpu, now, root, 0, None, &mut visited));
    }
    nodes
}

fn walk<S: ProcessSource>(
    source: &S,
    cpu: &mut CpuTracker,
    now: Instant,
    pid: u32,
    depth: usize,
    parent_pid: Option<u32>,
    visited: &mut HashSet<u32>,
) -> Vec<ProcessNode> {
    if !visited.insert(pid) {
        return Vec::new();
    }
    let Some(sample) = source.process(pid) else {
        // vanished between listing and reading: drop it and its subtree
        cpu.forget(pid);
        return Vec::new();
    };
    let cpu_percent = cpu.sample(pid, Some(sample.cpu_reading()), now, true);

    // Children are listed once here; the last-child flag comes from this list
    let mut subtrees: Vec<Vec<ProcessNode>> = source
        .children(pid)
        .into_iter()
        .map(|child| walk(source, cpu, now, child, depth + 1, Some(pid), visited))
        .filter(|subtree| !subtree.is_empty())
        .collect();
    if let Some(first) = subtrees.last_mut().and_then(|last| last.first_mut()) {
        first.is_last_child = true;
    }

    let mut nodes = vec![ProcessNode {
        pid,
        cpu_percent,
        memory_kb: sample.memory_kb,
        command: display_command(&sample),
        depth,
        is_last_child: false,
        parent_pid,
        has_children: !subtrees.is_empty(),
    }];
    for subtree in subtrees {
        nodes.extend(subtree);
    }
    nodes
}

/// Connector glyphs for `nodes[index]`; empty for pane roots.
///
/// The last column is the node's own connector. Every column L before it is a
/// pipe when the ancestor at depth L + 1 has a sibling still to come.
pub fn tree_prefix(nodes: &[ProcessNode], index: usize) -> String {
    let Some(node) = nodes.get(index) else {
        return String::new();
    };
    if node.depth == 0 {
        return String::new();
    }

    let mut prefix = String::new();
    for level in 0..node.depth - 1 {
        let glyph = if has_later_sibling(nodes, index, level + 1) {
            PIPE
        } else {
            BLANK
        };
        prefix.push_str(glyph);
    }
    prefix.push_str(if node.is_last_child { LAST } else { BRANCH });
    prefix
}

/// Does the ancestor of `nodes[index]` at `depth` have a later sibling?
fn has_later_sibling(nodes: &[ProcessNode], index: usize, depth: usize) -> bool {
    let Some(ancestor) = (0..=index).rev().find(|&i| nodes[i].depth == depth) else {
        return false;
    };
    nodes[ancestor + 1..]
        .iter()
        .find(|n| n.depth <= depth)
        .is_some_and(|n| n.depth == depth)
}
