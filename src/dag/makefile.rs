// src/dag/makefile.rs

//! Line-oriented Makefile reader.
//!
//! Only the subset distmake needs: `target: dep dep ...` headers followed by
//! tab-indented command lines. Blank lines and lines starting with `#` are
//! skipped. There are no variables, pattern rules or line continuations.

use tracing::debug;

use crate::errors::{DistmakeError, Result};

/// One `target: deps` header and the command lines attached to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub target: String,
    pub deps: Vec<String>,
    pub commands: Vec<String>,
    /// 1-based line number of the header.
    pub line: usize,
}

/// Parse `text` into rules, in file order, in a single pass.
///
/// The line that ends a command block is itself considered as the next
/// header.
pub fn parse_rules(text: &str) -> Result<Vec<Rule>> {
    let mut rules = Vec::new();
    let mut lines = text.lines().enumerate().peekable();

    while let Some((idx, line)) = lines.next() {
        let line_no = idx + 1;

        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }

        if line.starts_with('\t') {
            debug!(line = line_no, "command line outside of a rule; ignoring");
            continue;
        }

        let Some((target, deps)) = line.split_once(':') else {
            debug!(line = line_no, "line is neither a rule nor a command; ignoring");
            continue;
        };

        let target = target.trim();
        if target.is_empty() {
            return Err(DistmakeError::ParseError(format!(
                "line {line_no}: rule has an empty target name"
            )));
        }
        if target.split_whitespace().count() > 1 {
            return Err(DistmakeError::ParseError(format!(
                "line {line_no}: multiple targets in one rule are not supported ('{target}')"
            )));
        }

        let deps = deps.split_whitespace().map(str::to_string).collect();

        let mut commands = Vec::new();
        while let Some((_, command_line)) = lines.next_if(|(_, l)| l.starts_with('\t')) {
            let command = &command_line[1..];
            if !command.trim().is_empty() {
                commands.push(command.to_string());
            }
        }

        rules.push(Rule {
            target: target.to_string(),
            deps,
            commands,
            line: line_no,
        });
    }

    Ok(rules)
}
