//! Abstract Syntax Tree definitions for cmdprobe check files
//!
//! Every AST node preserves location information for error reporting.

use regex::Regex;
use serde::Serialize;
use std::fmt;

/// Source location information for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    #[must_use]
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    #[must_use]
    pub const fn dummy() -> Self {
        Self { start: 0, end: 0 }
    }

    /// Smallest span covering both `self` and `other`
    #[must_use]
    pub const fn to(self, other: Self) -> Self {
        let start = if self.start < other.start {
            self.start
        } else {
            other.start
        };
        let end = if self.end > other.end {
            self.end
        } else {
            other.end
        };
        Self { start, end }
    }
}

/// Line and column position in source text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    #[must_use]
    pub const fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// Convert byte span to line/column positions
pub struct SourceMap {
    line_starts: Vec<usize>,
}

impl SourceMap {
    #[must_use]
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        for (pos, ch) in source.char_indices() {
            if ch == '\n' {
                line_starts.push(pos + 1);
            }
        }
        Self { line_starts }
    }

    #[must_use]
    pub fn position(&self, byte_offset: usize) -> Position {
        match self.line_starts.binary_search(&byte_offset) {
            Ok(line) => Position::new(line + 1, 1),
            Err(line) => {
                let line_start = self.line_starts[line - 1];
                Position::new(line, byte_offset - line_start + 1)
            }
        }
    }

    #[must_use]
    pub fn span_to_positions(&self, span: Span) -> (Position, Position) {
        (self.position(span.start), self.position(span.end))
    }
}

/// AST node with location information
#[derive(Debug, Clone)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    #[must_use]
    pub const fn new(node: T, span: Span) -> Self {
        Self { node, span }
    }
}

/// A parsed check file: one entry per `describe command(...)` block
#[derive(Debug, Clone, Default)]
pub struct CheckFile {
    pub checks: Vec<Spanned<CommandCheck>>,
}

/// One described command and the assertions made about its run
#[derive(Debug, Clone)]
pub struct CommandCheck {
    /// The command line exactly as written in the check file
    pub command: String,
    /// Executable to spawn (first word of `command`)
    pub program: String,
    /// Remaining words of `command`, quotes removed
    pub args: Vec<String>,
    pub assertions: Vec<Spanned<Assertion>>,
}

/// Output channel an assertion inspects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stream {
    Stdout,
    Stderr,
    ExitStatus,
}

impl Stream {
    /// Resolve the attribute name used in `its('...')`
    #[must_use]
    pub fn from_attribute(name: &str) -> Option<Self> {
        match name {
            "stdout" => Some(Self::Stdout),
            "stderr" => Some(Self::Stderr),
            "exit_status" => Some(Self::ExitStatus),
            _ => None,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Stdout => "stdout",
            Self::Stderr => "stderr",
            Self::ExitStatus => "exit_status",
        }
    }

    /// Whether the stream carries captured text rather than a status code
    #[must_use]
    pub const fn is_text(self) -> bool {
        matches!(self, Self::Stdout | Self::Stderr)
    }
}

impl fmt::Display for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// `should` or `should_not`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    Should,
    ShouldNot,
}

impl Polarity {
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Should => "should",
            Self::ShouldNot => "should_not",
        }
    }

    /// Apply the polarity to a raw matcher result
    #[must_use]
    pub const fn holds(self, matched: bool) -> bool {
        match self {
            Self::Should => matched,
            Self::ShouldNot => !matched,
        }
    }
}

/// Trailing flags of a regex literal
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PatternFlags {
    /// `i`
    pub case_insensitive: bool,
    /// `m`: `.` also matches a newline
    pub dot_matches_newline: bool,
    /// `x`
    pub extended: bool,
}

impl fmt::Display for PatternFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.case_insensitive {
            f.write_str("i")?;
        }
        if self.dot_matches_newline {
            f.write_str("m")?;
        }
        if self.extended {
            f.write_str("x")?;
        }
        Ok(())
    }
}

/// A regex literal as written in the check file
///
/// Carries the regex compiled from the literal when the check file was
/// parsed, so evaluation never compiles it again. Equality ignores the
/// compiled form.
#[derive(Debug, Clone)]
pub struct Pattern {
    /// Body of the literal, delimiters stripped, escapes untouched
    source: String,
    flags: PatternFlags,
    regex: Regex,
}

impl Pattern {
    /// Pair a literal with the regex compiled from it
    #[must_use]
    pub const fn new(source: String, flags: PatternFlags, regex: Regex) -> Self {
        Self {
            source,
            flags,
            regex,
        }
    }

    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub const fn flags(&self) -> PatternFlags {
        self.flags
    }

    #[must_use]
    pub const fn regex(&self) -> &Regex {
        &self.regex
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source && self.flags == other.flags
    }
}

impl Eq for Pattern {}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.source.contains('/') && !self.source.contains('}') {
            return write!(f, "%r{{{}}}{}", self.source, self.flags);
        }

        // slash form: a bare '/' would end the literal early
        f.write_str("/")?;
        let mut escaped = false;
        for ch in self.source.chars() {
            if ch == '/' && !escaped {
                f.write_str("\\")?;
            }
            write!(f, "{ch}")?;
            escaped = ch == '\\' && !escaped;
        }
        write!(f, "/{}", self.flags)
    }
}

/// Literal operand of `eq`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
    Text(String),
    Integer(i64),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => write!(f, "{text:?}"),
            Self::Integer(value) => write!(f, "{value}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Matcher {
    /// match(/regex/): unanchored regex search
    Match(Pattern),
    /// eq('text') or eq 0: exact equality
    Eq(Literal),
    /// include('text'): substring containment
    Include(String),
}

impl fmt::Display for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Match(pattern) => write!(f, "match {pattern}"),
            Self::Eq(literal) => write!(f, "eq {literal}"),
            Self::Include(text) => write!(f, "include {text:?}"),
        }
    }
}

/// its('<stream>') { <polarity> <matcher> }
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assertion {
    pub stream: Stream,
    pub polarity: Polarity,
    pub matcher: Matcher,
}

impl fmt::Display for Assertion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "its('{}') {{ {} {} }}",
            self.stream,
            self.polarity.keyword(),
            self.matcher
        )
    }
}

/// Error types with location information
#[derive(thiserror::Error, Debug)]
pub enum ProbeError {
    #[error("cmdprobe:{filename}:{line}:{column}: ERR_SYNTAX: {message}")]
    Syntax {
        message: String,
        span: Span,
        filename: String,
        line: usize,
        column: usize,
    },

    #[error("cmdprobe:{filename}:{line}:{column}: ERR_REGEX: invalid pattern {pattern}: {message}")]
    InvalidPattern {
        pattern: String,
        message: String,
        span: Span,
        filename: String,
        line: usize,
        column: usize,
    },
}

impl ProbeError {
    #[must_use]
    pub fn syntax(message: String, span: Span, source_map: &SourceMap, filename: &str) -> Self {
        let pos = source_map.position(span.start);
        Self::Syntax {
            message,
            span,
            filename: filename.to_string(),
            line: pos.line,
            column: pos.column,
        }
    }

    #[must_use]
    pub fn invalid_pattern(
        pattern: String,
        message: String,
        span: Span,
        source_map: &SourceMap,
        filename: &str,
    ) -> Self {
        let pos = source_map.position(span.start);
        Self::InvalidPattern {
            pattern,
            message,
            span,
            filename: filename.to_string(),
            line: pos.line,
            column: pos.column,
        }
    }

    #[must_use]
    pub const fn span(&self) -> Span {
        match self {
            Self::Syntax { span, .. } | Self::InvalidPattern { span, .. } => *span,
        }
    }
}
