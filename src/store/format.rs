//! Snapshot file format.
//!
//! One entry per key, blank-line separated:
//!
//! ```text
//! exports['<key>'] = `
//! <text>
//! `
//!
//! exports['<key>'] = {
//!   "a": 1
//! }
//! ```
//!
//! Rules:
//! - String values are written as template literals wrapped in one leading and
//!   one trailing newline; on load, every top-level string bounded by newlines
//!   on both ends loses exactly one newline per side.
//! - Everything else is pretty JSON (2-space indent).
//! - Keys: single-quoted, `\\` `\'` and newlines escaped.
//! - Template literal: `` ` ``, `\\` and `${` escaped.
//! - Empty strings are rejected.

use anyhow::Result;
use serde_json::Value;

use crate::consts::{ENTRY_ASSIGN, ENTRY_PREFIX, TEXT_QUOTE};
use crate::error::SnapError;
use crate::store::Records;

// -------- Writing --------

fn escape_key(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
    out
}

fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.push_str("\\\\"),
            '`' => out.push_str("\\`"),
            '$' if chars.peek() == Some(&'{') => out.push_str("\\$"),
            _ => out.push(c),
        }
    }
    out
}

/// Render a text entry. Empty text is an error; `origin` names the source file in it.
pub fn export_text(name: &str, value: &str, origin: &str) -> Result<String> {
    if name.is_empty() {
        return Err(SnapError::invalid("expected snapshot name").into());
    }
    if value.is_empty() {
        return Err(SnapError::EmptyText {
            name: name.to_string(),
            file: origin.to_string(),
        }
        .into());
    }
    Ok(format!(
        "{}'{}'{}{}\n{}\n{}\n",
        ENTRY_PREFIX,
        escape_key(name),
        ENTRY_ASSIGN,
        TEXT_QUOTE,
        escape_text(value),
        TEXT_QUOTE
    ))
}

/// Render a structural entry as pretty JSON.
pub fn export_object(name: &str, value: &Value) -> Result<String> {
    if name.is_empty() {
        return Err(SnapError::invalid("expected snapshot name").into());
    }
    let serialized = serde_json::to_string_pretty(value)?;
    Ok(format!(
        "{}'{}'{}{}\n",
        ENTRY_PREFIX,
        escape_key(name),
        ENTRY_ASSIGN,
        serialized
    ))
}

/// Render a full record mapping; `sort` orders keys lexicographically.
pub fn render(records: &Records, sort: bool, origin: &str) -> Result<String> {
    let mut keys: Vec<&String> = records.keys().collect();
    if sort {
        keys.sort();
    }
    let mut parts = Vec::with_capacity(keys.len());
    for key in keys {
        let part = match &records[key.as_str()] {
            Value::String(s) => export_text(key, s, origin)?,
            other => export_object(key, other)?,
        };
        parts.push(part);
    }
    Ok(parts.join("\n"))
}

// -------- Reading --------

struct Cursor<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn line(&self) -> usize {
        self.src[..self.pos].matches('\n').count() + 1
    }

    fn error(&self, message: &str) -> anyhow::Error {
        SnapError::Format {
            line: self.line(),
            message: message.to_string(),
        }
        .into()
    }

    /// Skip whitespace, `;` separators and `//` line comments.
    fn skip_trivia(&mut self) {
        loop {
            let rest = self.rest();
            let trimmed = rest.trim_start_matches(|c: char| c.is_whitespace() || c == ';');
            self.pos += rest.len() - trimmed.len();
            if self.rest().starts_with("//") {
                match self.rest().find('\n') {
                    Some(i) => self.pos += i + 1,
                    None => self.pos = self.src.len(),
                }
                continue;
            }
            break;
        }
    }

    fn expect(&mut self, token: &str) -> Result<()> {
        if self.rest().starts_with(token) {
            self.pos += token.len();
            Ok(())
        } else {
            Err(self.error(&format!("expected `{}`", token.trim())))
        }
    }
}

fn parse_key(c: &mut Cursor<'_>) -> Result<String> {
    let quote = match c.bump() {
        Some(q @ ('\'' | '"')) => q,
        _ => return Err(c.error("expected quoted snapshot key")),
    };
    let mut out = String::new();
    loop {
        match c.bump() {
            None => return Err(c.error("unterminated snapshot key")),
            Some('\\') => match c.bump() {
                Some('n') => out.push('\n'),
                Some('r') => out.push('\r'),
                Some('t') => out.push('\t'),
                Some(e) => out.push(e),
                None => return Err(c.error("unterminated escape in snapshot key")),
            },
            Some(ch) if ch == quote => return Ok(out),
            Some(ch) => out.push(ch),
        }
    }
}

fn parse_text(c: &mut Cursor<'_>) -> Result<String> {
    c.expect("`")?;
    let mut out = String::new();
    loop {
        match c.bump() {
            None => return Err(c.error("unterminated text snapshot")),
            Some('\\') => match c.bump() {
                Some('n') => out.push('\n'),
                Some('r') => out.push('\r'),
                Some('t') => out.push('\t'),
                Some(e) => out.push(e),
                None => return Err(c.error("unterminated escape in text snapshot")),
            },
            Some('`') => return Ok(out),
            Some(ch) => out.push(ch),
        }
    }
}

fn parse_json(c: &mut Cursor<'_>) -> Result<Value> {
    let mut stream = serde_json::Deserializer::from_str(c.rest()).into_iter::<Value>();
    match stream.next() {
        Some(Ok(v)) => {
            c.pos += stream.byte_offset();
            Ok(v)
        }
        Some(Err(e)) => Err(c.error(&format!("invalid JSON value: {}", e))),
        None => Err(c.error("missing snapshot value")),
    }
}

/// Parse file content into a record mapping (extra newlines already removed).
/// Later duplicates of a key overwrite earlier ones.
pub fn parse(src: &str) -> Result<Records> {
    let mut records = Records::new();
    let mut c = Cursor::new(src);
    loop {
        c.skip_trivia();
        if c.at_end() {
            break;
        }
        c.expect(ENTRY_PREFIX)?;
        let key = parse_key(&mut c)?;
        c.skip_trivia();
        c.expect(ENTRY_ASSIGN.trim())?;
        c.skip_trivia();
        let value = if c.peek() == Some(TEXT_QUOTE) {
            Value::String(parse_text(&mut c)?)
        } else {
            parse_json(&mut c)?
        };
        records.insert(key, value);
    }
    remove_extra_newlines(&mut records);
    Ok(records)
}

fn surrounded_by_newlines(s: &str) -> bool {
    s.len() > 1 && s.starts_with('\n') && s.ends_with('\n')
}

/// Strip the one leading and one trailing newline added by `export_text`.
pub fn remove_extra_newlines(records: &mut Records) {
    for value in records.values_mut() {
        if let Value::String(s) = value {
            if surrounded_by_newlines(s) {
                *s = s[1..s.len() - 1].to_string();
            }
        }
    }
}
