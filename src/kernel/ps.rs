/*!
 * Process Tree Rendering
 */

use super::Kernel;
use crate::core::types::{KernelResult, Pid};
use crate::process::{PackedDescriptor, ProcessDescriptor};
use ahash::AHashSet;
use std::collections::BTreeMap;

impl Kernel {
    /// Render the process tree rooted at `pid`
    ///
    /// Read-only. Siblings are sorted by PID; labels read `type:pid`, with
    /// the JSON arguments appended when there are any. An absent PID renders
    /// as `MISSING:pid`.
    ///
    /// ```text
    /// tron:0
    /// `-- init:1
    ///     |-- miner:2:"W1N1",3
    ///     `-- hauler:3
    /// ```
    pub fn ps(&self, pid: Pid) -> KernelResult<String> {
        let table = self.table.snapshot()?;

        let mut by_parent: BTreeMap<Pid, Vec<Pid>> = BTreeMap::new();
        for (&child, packed) in &table {
            if child != packed.2 {
                by_parent.entry(packed.2).or_default().push(child);
            }
        }

        let mut lines = Vec::new();
        let mut seen = AHashSet::new();
        // (pid, indentation, last-sibling flag; None for the tree root)
        let mut stack: Vec<(Pid, String, Option<bool>)> = vec![(pid, String::new(), None)];
        while let Some((next, indent, last)) = stack.pop() {
            if !seen.insert(next) {
                continue;
            }
            let connector = match last {
                None => "",
                Some(true) => "`-- ",
                Some(false) => "|-- ",
            };
            lines.push(format!("{}{}{}", indent, connector, label(next, table.get(&next))));

            let child_indent = match last {
                None => indent,
                Some(true) => format!("{}    ", indent),
                Some(false) => format!("{}|   ", indent),
            };
            if let Some(children) = by_parent.get(&next) {
                let count = children.len();
                for (i, &child) in children.iter().enumerate().rev() {
                    stack.push((child, child_indent.clone(), Some(i + 1 == count)));
                }
            }
        }

        Ok(lines.join("\n"))
    }
}

fn label(pid: Pid, packed: Option<&PackedDescriptor>) -> String {
    let Some(packed) = packed else {
        return format!("MISSING:{}", pid);
    };
    let args = ProcessDescriptor::from(packed.clone()).args();
    if args.is_empty() {
        format!("{}:{}", packed.0, pid)
    } else {
        let rendered: Vec<String> = args.iter().map(|arg| arg.to_string()).collect();
        format!("{}:{}:{}", packed.0, pid, rendered.join(","))
    }
}
