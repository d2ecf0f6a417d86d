//! Regex literal handling
//!
//! Check files carry regex literals in the `/body/flags` and `%r{body}flags`
//! forms. This module splits literals into a [`Pattern`] and translates the
//! body into the syntax of the `regex` crate:
//!
//! * `^` and `$` always anchor at line boundaries.
//! * an escaped punctuation character with no regex meaning (`\<`, `\>`,
//!   `\/`, ...) stands for the character itself, so `\<nil\>` matches the
//!   text `<nil>` rather than word boundaries.
//! * `\h`/`\H` are hex-digit classes and `\Z` allows one trailing newline.

use cmdprobe_ast::{Pattern, PatternFlags};
use regex::RegexBuilder;

/// Characters that keep their backslash when escaped
const META: &str = r"\.+*?()|[]{}^$#&-~";

/// Split the text of a `Regex` token (`/body/flags`) into body and flags
#[must_use]
pub fn from_slash_literal(text: &str) -> Option<(&str, PatternFlags)> {
    let rest = text.strip_prefix('/')?;
    let close = rest.rfind('/')?;
    Some((&rest[..close], parse_flags(&rest[close + 1..])?))
}

/// Split the text of a `PercentRegex` token (`%r{body}flags`) into body and flags
#[must_use]
pub fn from_percent_literal(text: &str) -> Option<(&str, PatternFlags)> {
    let rest = text.strip_prefix("%r{")?;
    let close = rest.rfind('}')?;
    Some((&rest[..close], parse_flags(&rest[close + 1..])?))
}

fn parse_flags(text: &str) -> Option<PatternFlags> {
    let mut flags = PatternFlags::default();
    for ch in text.chars() {
        match ch {
            'i' => flags.case_insensitive = true,
            'm' => flags.dot_matches_newline = true,
            'x' => flags.extended = true,
            _ => return None,
        }
    }
    Some(flags)
}

/// Rewrite a literal body into `regex` crate syntax
#[must_use]
pub fn translate(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut chars = source.chars().peekable();
    // depth of `[...]` nesting; `\Z` and `\h` need class-safe forms inside
    let mut class_depth = 0usize;

    while let Some(ch) = chars.next() {
        match ch {
            '\\' => {}
            '[' => {
                class_depth += 1;
                out.push('[');
                if let Some(negation) = chars.next_if_eq(&'^') {
                    out.push(negation);
                }
                // a leading ']' is a member, not the end of the class
                if let Some(bracket) = chars.next_if_eq(&']') {
                    out.push('\\');
                    out.push(bracket);
                }
                continue;
            }
            ']' if class_depth > 0 => {
                class_depth -= 1;
                out.push(']');
                continue;
            }
            _ => {
                out.push(ch);
                continue;
            }
        }

        let in_class = class_depth > 0;
        match chars.next() {
            None => out.push('\\'),
            Some('h') if in_class => out.push_str("0-9a-fA-F"),
            Some('h') => out.push_str("[0-9a-fA-F]"),
            Some('H') => out.push_str("[^0-9a-fA-F]"),
            Some('Z') if in_class => out.push('Z'),
            Some('Z') => out.push_str(r"(?:\n?\z)"),
            Some(c) if META.contains(c) || c == ' ' => {
                out.push('\\');
                out.push(c);
            }
            Some(c) if c.is_ascii_punctuation() => out.push(c),
            Some(c) => {
                out.push('\\');
                out.push(c);
            }
        }
    }
    out
}

/// Compile a literal body into a searchable [`Pattern`]
///
/// # Errors
///
/// Returns `regex::Error` if the translated body is not a valid regex.
pub fn compile(source: &str, flags: PatternFlags) -> Result<Pattern, regex::Error> {
    let regex = RegexBuilder::new(&translate(source))
        .multi_line(true)
        .case_insensitive(flags.case_insensitive)
        .dot_matches_new_line(flags.dot_matches_newline)
        .ignore_whitespace(flags.extended)
        .build()?;
    Ok(Pattern::new(source.to_string(), flags, regex))
}
