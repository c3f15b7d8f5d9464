//! Command Line Reconstruction
//!
//! Shells strip the quotation marks users typed, which breaks commands such as
//! `python -c "for i in range(100): pass"` when the arguments are joined back
//! into one line. Every argument is therefore wrapped in double quotes again.
//! Quotes already inside an argument are left as they are.

use std::ffi::OsString;
use thiserror::Error;

/// Default upper bound on the rendered command line, in bytes.
pub const DEFAULT_MAX_COMMAND_LINE: usize = 32_767;

/// Errors building a command line
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandLineError {
    #[error("no command given")]
    MissingCommand,

    #[error("command line too long: {len} bytes (max {max} bytes)")]
    TooLong { len: usize, max: usize },
}

/// Quoted command line of the child, plus the raw argv it was built from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    args: Vec<OsString>,
    rendered: String,
}

impl CommandLine {
    /// Build from `argv[start..]`.
    ///
    /// Each token becomes `"token"`; tokens are joined by a single space.
    /// Fails if there is no token at or after `start`, or if the rendered
    /// line exceeds `max_len` bytes.
    pub fn build<S>(argv: &[S], start: usize, max_len: usize) -> Result<Self, CommandLineError>
    where
        S: AsRef<std::ffi::OsStr>,
    {
        let tokens = argv.get(start..).unwrap_or_default();
        if tokens.is_empty() {
            return Err(CommandLineError::MissingCommand);
        }

        let mut rendered = String::new();
        for (i, token) in tokens.iter().enumerate() {
            if i > 0 {
                rendered.push(' ');
            }
            rendered.push('"');
            rendered.push_str(&token.as_ref().to_string_lossy());
            rendered.push('"');

            if rendered.len() > max_len {
                return Err(CommandLineError::TooLong {
                    len: rendered.len() + remaining_len(&tokens[i + 1..]),
                    max: max_len,
                });
            }
        }

        Ok(Self {
            args: tokens.iter().map(|t| t.as_ref().to_os_string()).collect(),
            rendered,
        })
    }

    /// Program to execute (first token)
    pub fn program(&self) -> &OsString {
        &self.args[0]
    }

    /// Arguments after the program
    pub fn args(&self) -> &[OsString] {
        &self.args[1..]
    }

    /// Number of tokens, program included
    pub fn len(&self) -> usize {
        self.args.len()
    }

    /// Always false: a command line has at least the program
    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    /// The quoted, space-separated line
    pub fn as_str(&self) -> &str {
        &self.rendered
    }
}

impl std::fmt::Display for CommandLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.rendered)
    }
}

/// Rendered length of tokens not yet appended (quotes and separators included)
fn remaining_len<S: AsRef<std::ffi::OsStr>>(tokens: &[S]) -> usize {
    tokens
        .iter()
        .map(|t| t.as_ref().to_string_lossy().len() + 3)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(items: &[&str]) -> Vec<OsString> {
        items.iter().map(OsString::from).collect()
    }

    #[test]
    fn test_quotes_every_token_in_order() {
        let argv = argv(&["proctime", "-s", "python", "-c", "for i in range(3): pass"]);
        let line = CommandLine::build(&argv, 2, DEFAULT_MAX_COMMAND_LINE).unwrap();
        assert_eq!(line.as_str(), r#""python" "-c" "for i in range(3): pass""#);
        assert_eq!(line.program(), "python");
        assert_eq!(line.args(), &argv[3..]);
        assert_eq!(line.len(), 3);
    }

    #[test]
    fn test_token_count_matches_argc_minus_start() {
        let argv = argv(&["proctime", "a", "b c", "", "d"]);
        for start in 1..argv.len() {
            let line = CommandLine::build(&argv, start, DEFAULT_MAX_COMMAND_LINE).unwrap();
            let tokens: Vec<&str> = line.as_str().split("\" \"").collect();
            assert_eq!(tokens.len(), argv.len() - start);
            assert_eq!(line.as_str().matches('"').count(), 2 * (argv.len() - start));
            assert!(line.as_str().starts_with('"') && line.as_str().ends_with('"'));
        }
    }

    #[test]
    fn test_embedded_quotes_not_escaped() {
        let argv = argv(&["echo", r#"say "hi""#]);
        let line = CommandLine::build(&argv, 0, DEFAULT_MAX_COMMAND_LINE).unwrap();
        assert_eq!(line.as_str(), r#""echo" "say "hi"""#);
    }

    #[test]
    fn test_missing_command() {
        let argv = argv(&["proctime", "-s"]);
        assert_eq!(
            CommandLine::build(&argv, 2, DEFAULT_MAX_COMMAND_LINE),
            Err(CommandLineError::MissingCommand)
        );
        assert_eq!(
            CommandLine::build(&argv, 7, DEFAULT_MAX_COMMAND_LINE),
            Err(CommandLineError::MissingCommand)
        );
    }

    #[test]
    fn test_too_long_reports_full_length() {
        let argv = argv(&["abc", "defg", "hi"]);
        // "abc" "defg" "hi" = 5 + 1 + 6 + 1 + 4 = 17
        assert!(CommandLine::build(&argv, 0, 17).is_ok());
        assert_eq!(
            CommandLine::build(&argv, 0, 10),
            Err(CommandLineError::TooLong { len: 17, max: 10 })
        );
    }
}
