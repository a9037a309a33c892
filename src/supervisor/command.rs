// src/supervisor/command.rs

use std::fmt;
use std::process::Stdio;

use tokio::process::Command;

/// A non-empty argument vector: program plus arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    program: String,
    args: Vec<String>,
}

impl CommandLine {
    /// Split a command line on whitespace. No shell quoting is applied.
    ///
    /// Returns `None` for a blank line.
    pub fn parse(line: &str) -> Option<Self> {
        Self::from_argv(line.split_whitespace().map(str::to_string).collect())
    }

    /// Returns `None` if `argv` is empty or its first element is blank.
    pub fn from_argv(argv: Vec<String>) -> Option<Self> {
        let mut iter = argv.into_iter();
        let program = iter.next()?;
        if program.trim().is_empty() {
            return None;
        }
        Some(Self {
            program,
            args: iter.collect(),
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Build a process for this command line.
    ///
    /// The child inherits our environment and stdin/stdout/stderr; its output
    /// is neither captured nor transformed.
    pub fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());
        cmd
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}
