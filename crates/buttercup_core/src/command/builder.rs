//! Command construction and entity ID generation.

use rand::rngs::OsRng;
use rand::RngCore;

use super::{Command, Slug};
use crate::error::{ButtercupError, Result};

/// Generate a short collision-resistant entity ID.
///
/// 64 random bits, base-36 lowercase. IDs are opaque strings everywhere
/// else in the engine; nothing ever parses them back into numbers.
pub fn generate_entity_id() -> String {
    let mut value = OsRng.next_u64();
    if value == 0 {
        // Avoid the empty encoding; "0" is the root sentinel
        value = 1;
    }
    let digits = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut out = Vec::new();
    while value > 0 {
        out.push(digits[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8(out).expect("base36 digits are ASCII")
}

/// Builds encoded command lines with arity checking.
///
/// ```
/// use buttercup_core::command::{CommandBuilder, Slug};
///
/// let line = CommandBuilder::new(Slug::SetEntryProperty)
///     .arg("e1")
///     .arg("username")
///     .arg("alice")
///     .encode()
///     .unwrap();
/// assert_eq!(line, "sep e1 username alice");
/// ```
#[derive(Debug)]
pub struct CommandBuilder {
    slug: Slug,
    args: Vec<String>,
}

impl CommandBuilder {
    /// Start building a command for the given slug.
    pub fn new(slug: Slug) -> Self {
        Self {
            slug,
            args: Vec::new(),
        }
    }

    /// Append a positional argument.
    pub fn arg(mut self, value: impl Into<String>) -> Self {
        self.args.push(value.into());
        self
    }

    /// Finish building, validating the argument count.
    pub fn build(self) -> Result<Command> {
        let expected = self.slug.descriptor().args.len();
        if self.args.len() != expected {
            return Err(ButtercupError::InvalidCommand {
                line: self.slug.code().to_string(),
                reason: format!(
                    "{} takes {} argument(s), got {}",
                    self.slug.code(),
                    expected,
                    self.args.len()
                ),
            });
        }
        Ok(Command {
            slug: self.slug,
            args: self.args,
        })
    }

    /// Finish building and encode to a history line.
    pub fn encode(self) -> Result<String> {
        self.build()?.encode()
    }
}
