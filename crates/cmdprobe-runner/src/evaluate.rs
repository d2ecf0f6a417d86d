//! Assertion evaluation against captured output

use cmdprobe_ast::{Assertion, Literal, Matcher, Stream};
use std::borrow::Cow;

use crate::CapturedOutput;

/// The value an assertion inspects, rendered as text
#[must_use]
pub fn subject(stream: Stream, output: &CapturedOutput) -> Cow<'_, str> {
    match stream {
        Stream::Stdout => Cow::Borrowed(output.stdout.as_str()),
        Stream::Stderr => Cow::Borrowed(output.stderr.as_str()),
        Stream::ExitStatus => output
            .exit_code
            .map_or(Cow::Borrowed("<terminated by signal>"), |code| {
                Cow::Owned(code.to_string())
            }),
    }
}

/// Raw matcher result, before polarity is applied
///
/// Regexes were compiled when the check file was parsed, so evaluation
/// cannot fail.
#[must_use]
pub fn raw_match(assertion: &Assertion, output: &CapturedOutput) -> bool {
    let text = subject(assertion.stream, output);
    match &assertion.matcher {
        Matcher::Match(pattern) => pattern.regex().is_match(&text),
        Matcher::Include(needle) => text.contains(needle.as_str()),
        Matcher::Eq(Literal::Text(expected)) => text == expected.as_str(),
        // only exit_status takes a number, and its subject is the decimal code
        Matcher::Eq(Literal::Integer(expected)) => text == expected.to_string(),
    }
}

/// Whether the assertion holds for this run
#[must_use]
pub fn holds(assertion: &Assertion, output: &CapturedOutput) -> bool {
    assertion.polarity.holds(raw_match(assertion, output))
}
