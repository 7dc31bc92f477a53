//! Append-only program text.

use crate::command::Command;

/// Ordered command lines. Lines are only ever appended.
#[derive(Debug, Clone, Default)]
pub struct CommandBuffer {
    lines: Vec<String>,
}

impl CommandBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// The full program, one newline-terminated line per command.
    pub fn render(&self) -> String {
        let size = self.lines.iter().map(|l| l.len() + 1).sum();
        let mut out = String::with_capacity(size);
        for line in &self.lines {
            out.push_str(line);
            out.push('\n');
        }
        out
    }

    pub(crate) fn append(&mut self, commands: &[Command]) -> &[String] {
        let start = self.lines.len();
        self.lines.extend(commands.iter().map(Command::to_string));
        &self.lines[start..]
    }
}
