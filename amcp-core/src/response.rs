//! Response frames and status lines.
//!
//! ```text
//! 200 CLS OK                 ← header: status code + text
//! "AMB"  MOVIE  6445960 …    ← body lines (zero or more)
//! "GO1080P25"  MOVIE  …
//! <blank>                    ← terminator, consumed by the codec
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

// ── StatusLine ───────────────────────────────────────────────────

/// How many body lines follow a given status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyRule {
    /// Header only (`202 … OK`, errors, informational codes).
    None,
    /// Exactly one data line (`201 … OK`).
    SingleLine,
    /// Lines until an empty line (`200 … OK`).
    UntilBlank,
}

/// The parsed header line of a reply, e.g. `200 CLS OK`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusLine {
    pub code: u16,
    pub text: String,
}

impl StatusLine {
    /// Parse `"<code> <text>"`. Returns `None` when the line does not
    /// start with a three-digit code.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        let (code, text) = match line.split_once(' ') {
            Some((code, text)) => (code, text.trim()),
            None => (line, ""),
        };
        if code.len() != 3 {
            return None;
        }
        let code = code.parse().ok()?;
        Some(Self {
            code,
            text: text.to_string(),
        })
    }

    /// `2xx`.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.code)
    }

    /// `4xx` and `5xx`.
    pub fn is_error(&self) -> bool {
        (400..600).contains(&self.code)
    }

    pub fn body_rule(&self) -> BodyRule {
        match self.code {
            200 => BodyRule::UntilBlank,
            201 => BodyRule::SingleLine,
            _ => BodyRule::None,
        }
    }
}

impl fmt::Display for StatusLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.text.is_empty() {
            write!(f, "{}", self.code)
        } else {
            write!(f, "{} {}", self.code, self.text)
        }
    }
}

// ── ResponseFrame ────────────────────────────────────────────────

/// All lines of one reply: header first, then the body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseFrame {
    lines: Vec<String>,
}

impl ResponseFrame {
    pub fn new(lines: Vec<String>) -> Self {
        Self { lines }
    }

    /// A frame with no lines at all.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }

    /// The server status line, if any.
    pub fn header(&self) -> Option<&str> {
        self.lines.first().map(String::as_str)
    }

    /// Every line after the header.
    pub fn body(&self) -> &[String] {
        self.lines.get(1..).unwrap_or_default()
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// The parsed status of the header line.
    pub fn status(&self) -> Option<StatusLine> {
        self.header().and_then(StatusLine::parse)
    }

    pub(crate) fn push(&mut self, line: String) {
        self.lines.push(line);
    }
}
