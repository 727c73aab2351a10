//! Line codec for commands.
//!
//! A command serializes to `<slug> <arg> <arg> ...` on a single line.
//! Arguments are written bare when they contain no space, quote, or
//! backslash, and double-quoted otherwise with `\"` and `\\` escapes.
//! Decoding accepts bare and quoted tokens in any position.

use super::{Command, Slug};
use crate::error::{ButtercupError, Result};

impl Command {
    /// Encode this command as a history line.
    ///
    /// Round-trip property: `Command::decode(&cmd.encode()?)? == cmd`.
    pub fn encode(&self) -> Result<String> {
        let mut line = String::from(self.slug.code());
        for arg in &self.args {
            if arg.contains('\n') || arg.contains('\r') {
                return Err(ButtercupError::InvalidCommand {
                    line: line.clone(),
                    reason: "argument contains a line break".into(),
                });
            }
            line.push(' ');
            encode_token(arg, &mut line);
        }
        Ok(line)
    }

    /// Decode a history line into a command.
    ///
    /// Validates the slug, the quoting, and the argument count against the
    /// descriptor table.
    pub fn decode(line: &str) -> Result<Command> {
        let invalid = |reason: &str| ButtercupError::InvalidCommand {
            line: line.to_string(),
            reason: reason.to_string(),
        };

        let code = line.get(..3).ok_or_else(|| invalid("line too short"))?;
        if !code.chars().all(|c| c.is_ascii_lowercase()) {
            return Err(invalid("slug must be three lowercase letters"));
        }
        let slug = Slug::from_code(code).ok_or_else(|| invalid("unknown slug"))?;

        let payload = match line.as_bytes().get(3) {
            None => "",
            Some(&b' ') => &line[4..],
            Some(_) => return Err(invalid("slug must be followed by a space")),
        };

        let args = split_tokens(payload).map_err(|reason| invalid(&reason))?;
        let expected = slug.descriptor().args.len();
        if args.len() != expected {
            return Err(invalid(&format!(
                "expected {} argument(s), got {}",
                expected,
                args.len()
            )));
        }

        Ok(Command { slug, args })
    }
}

fn encode_token(token: &str, out: &mut String) {
    let bare = !token.is_empty()
        && !token.contains(' ')
        && !token.contains('"')
        && !token.contains('\\');
    if bare {
        out.push_str(token);
        return;
    }
    out.push('"');
    for c in token.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
}

fn split_tokens(payload: &str) -> std::result::Result<Vec<String>, String> {
    let mut tokens = Vec::new();
    let mut chars = payload.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c == ' ' {
            chars.next();
            continue;
        }
        if c == '"' {
            chars.next();
            let mut token = String::new();
            loop {
                match chars.next() {
                    Some('\\') => match chars.next() {
                        Some(escaped @ ('"' | '\\')) => token.push(escaped),
                        Some(other) => {
                            return Err(format!("invalid escape '\\{}'", other));
                        }
                        None => return Err("trailing backslash in quoted token".into()),
                    },
                    Some('"') => break,
                    Some(other) => token.push(other),
                    None => return Err("unterminated quoted token".into()),
                }
            }
            // Quoted tokens must end at a token boundary
            if chars.peek().is_some_and(|&next| next != ' ') {
                return Err("missing space after quoted token".into());
            }
            tokens.push(token);
        } else {
            let mut token = String::new();
            while let Some(&next) = chars.peek() {
                if next == ' ' {
                    break;
                }
                token.push(next);
                chars.next();
            }
            tokens.push(token);
        }
    }

    Ok(tokens)
}
