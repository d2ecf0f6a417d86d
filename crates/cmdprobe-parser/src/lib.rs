//! Recursive-descent parser for cmdprobe check files
//!
//! Consumes the logos token stream and builds a [`CheckFile`]. Regex literals
//! are compiled while parsing so that a bad pattern is reported with its
//! location instead of surfacing at run time.

use cmdprobe_ast::{
    Assertion, CheckFile, CommandCheck, Literal, Matcher, Pattern, Polarity, ProbeError,
    SourceMap, Span, Spanned, Stream,
};
use cmdprobe_lexer::{Lexer, SpannedToken, Token};

// Regex literal translation and compilation
pub mod pattern;

// String processing utilities
pub mod string_utils;

pub struct Parser {
    source_map: SourceMap,
    filename: String,
    tokens: Vec<SpannedToken>,
}

impl Parser {
    /// Create a new parser for the given input
    ///
    /// # Errors
    ///
    /// Returns `ProbeError` if there are lexical errors in the input
    pub fn new(input: &str) -> Result<Self, ProbeError> {
        Self::new_with_filename(input, "<input>")
    }

    /// Create a new parser for the given input with a filename
    ///
    /// # Errors
    ///
    /// Returns `ProbeError` if there are lexical errors in the input
    pub fn new_with_filename(input: &str, filename: &str) -> Result<Self, ProbeError> {
        let source_map = SourceMap::new(input);

        let mut lexer = Lexer::new(input);
        let tokens = lexer.tokenize();

        for token in &tokens {
            if token.token == Token::Error {
                return Err(ProbeError::syntax(
                    format!("Unexpected character: {}", token.text),
                    token.span,
                    &source_map,
                    filename,
                ));
            }
        }

        Ok(Self {
            source_map,
            filename: filename.to_string(),
            // Newlines only separate items; the grammar never needs them
            tokens: tokens
                .into_iter()
                .filter(|token| token.token != Token::Newline)
                .collect(),
        })
    }

    /// Parse the input into a check file AST
    ///
    /// # Errors
    ///
    /// Returns `ProbeError` if there are syntax errors or invalid patterns
    pub fn parse(&self) -> Result<CheckFile, ProbeError> {
        let mut cursor = Cursor {
            parser: self,
            pos: 0,
        };
        let mut checks = Vec::new();
        while cursor.peek().token != Token::Eof {
            checks.push(cursor.describe()?);
        }
        Ok(CheckFile { checks })
    }

    /// Get access to the source map for error reporting
    #[must_use]
    pub const fn source_map(&self) -> &SourceMap {
        &self.source_map
    }

    /// Get access to the tokens (newlines removed)
    #[must_use]
    pub fn tokens(&self) -> &[SpannedToken] {
        &self.tokens
    }

    fn syntax_error(&self, message: String, span: Span) -> ProbeError {
        ProbeError::syntax(message, span, &self.source_map, &self.filename)
    }
}

struct Cursor<'p> {
    parser: &'p Parser,
    pos: usize,
}

impl Cursor<'_> {
    fn peek(&self) -> &SpannedToken {
        // tokenize() always ends with Eof, so the last token is a safe fallback
        let tokens = &self.parser.tokens;
        tokens.get(self.pos).unwrap_or(&tokens[tokens.len() - 1])
    }

    fn advance(&mut self) -> SpannedToken {
        let token = self.peek().clone();
        if token.token != Token::Eof {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, kind: Token) -> Option<SpannedToken> {
        if self.peek().token == kind {
            Some(self.advance())
        } else {
            None
        }
    }

    fn expect(&mut self, kind: Token, context: &str) -> Result<SpannedToken, ProbeError> {
        if self.peek().token == kind {
            return Ok(self.advance());
        }
        Err(self.unexpected(&format!("{} {context}", kind.describe())))
    }

    fn unexpected(&self, expected: &str) -> ProbeError {
        let found = self.peek();
        let found_text = if found.token == Token::Eof {
            found.token.describe().to_string()
        } else {
            format!("{} '{}'", found.token.describe(), found.text)
        };
        self.parser
            .syntax_error(format!("expected {expected}, found {found_text}"), found.span)
    }

    /// describe command(STRING) do its* end
    fn describe(&mut self) -> Result<Spanned<CommandCheck>, ProbeError> {
        let start = self.expect(Token::Describe, "to start a check")?.span;
        self.expect(Token::Command, "after 'describe'")?;
        self.expect(Token::Lparen, "after 'command'")?;
        let command_token = self.expect(Token::String, "naming the command to run")?;
        self.expect(Token::Rparen, "after the command string")?;
        self.expect(Token::Do, "to open the check body")?;

        let command = string_utils::unquote(&command_token.text);
        let mut words = string_utils::split_command_line(&command)
            .map_err(|err| self.parser.syntax_error(err.to_string(), command_token.span))?
            .into_iter();
        let Some(program) = words.next() else {
            return Err(self
                .parser
                .syntax_error("command must not be empty".to_string(), command_token.span));
        };

        let mut assertions = Vec::new();
        while self.peek().token == Token::Its {
            assertions.push(self.its()?);
        }
        let end = self.expect(Token::End, "to close the check body")?.span;

        Ok(Spanned::new(
            CommandCheck {
                command,
                program,
                args: words.collect(),
                assertions,
            },
            start.to(end),
        ))
    }

    /// its(STRING) { should matcher }
    fn its(&mut self) -> Result<Spanned<Assertion>, ProbeError> {
        let start = self.expect(Token::Its, "to start an assertion")?.span;
        self.expect(Token::Lparen, "after 'its'")?;
        let attribute = self.expect(Token::String, "naming a stream")?;
        self.expect(Token::Rparen, "after the stream name")?;

        let name = string_utils::unquote(&attribute.text);
        let stream = Stream::from_attribute(&name).ok_or_else(|| {
            self.parser.syntax_error(
                format!("unknown attribute '{name}', expected stdout, stderr or exit_status"),
                attribute.span,
            )
        })?;

        self.expect(Token::Lbrace, "to open the expectation")?;
        let polarity = match self.peek().token {
            Token::Should => Polarity::Should,
            Token::ShouldNot => Polarity::ShouldNot,
            _ => return Err(self.unexpected("'should' or 'should_not'")),
        };
        self.advance();

        let matcher_start = self.peek().span;
        let matcher = self.matcher()?;
        let matcher_span = matcher_start.to(self.previous_span());
        self.check_compatible(stream, &matcher, matcher_span)?;

        let end = self.expect(Token::Rbrace, "to close the expectation")?.span;

        Ok(Spanned::new(
            Assertion {
                stream,
                polarity,
                matcher,
            },
            start.to(end),
        ))
    }

    fn previous_span(&self) -> Span {
        self.pos
            .checked_sub(1)
            .and_then(|idx| self.parser.tokens.get(idx))
            .map_or_else(Span::dummy, |token| token.span)
    }

    /// match REGEX | eq (STRING | NUMBER) | include STRING, parentheses optional
    fn matcher(&mut self) -> Result<Matcher, ProbeError> {
        let keyword = self.peek().token;
        if !matches!(keyword, Token::Match | Token::Eq | Token::Include) {
            return Err(self.unexpected("a matcher ('match', 'eq' or 'include')"));
        }
        self.advance();
        let parenthesized = self.eat(Token::Lparen).is_some();

        let matcher = match keyword {
            Token::Match => Matcher::Match(self.regex_literal()?),
            Token::Eq => match self.peek().token {
                Token::String => Matcher::Eq(Literal::Text(string_utils::unquote(
                    &self.advance().text,
                ))),
                Token::Number => {
                    let token = self.advance();
                    let value = token.text.parse::<i64>().map_err(|err| {
                        self.parser
                            .syntax_error(format!("invalid number: {err}"), token.span)
                    })?;
                    Matcher::Eq(Literal::Integer(value))
                }
                _ => return Err(self.unexpected("a string or number to compare with")),
            },
            _ => Matcher::Include(string_utils::unquote(
                &self.expect(Token::String, "after 'include'")?.text,
            )),
        };

        if parenthesized {
            self.expect(Token::Rparen, "after the matcher argument")?;
        }
        Ok(matcher)
    }

    fn regex_literal(&mut self) -> Result<Pattern, ProbeError> {
        let token = match self.peek().token {
            Token::Regex | Token::PercentRegex => self.advance(),
            _ => return Err(self.unexpected("a regex literal after 'match'")),
        };
        let parsed = if token.token == Token::Regex {
            pattern::from_slash_literal(&token.text)
        } else {
            pattern::from_percent_literal(&token.text)
        };
        let (source, flags) = parsed.ok_or_else(|| {
            self.parser
                .syntax_error(format!("malformed regex literal {}", token.text), token.span)
        })?;

        pattern::compile(source, flags).map_err(|err| {
            ProbeError::invalid_pattern(
                token.text.clone(),
                err.to_string(),
                token.span,
                &self.parser.source_map,
                &self.parser.filename,
            )
        })
    }

    fn check_compatible(
        &self,
        stream: Stream,
        matcher: &Matcher,
        span: Span,
    ) -> Result<(), ProbeError> {
        let compatible = match matcher {
            Matcher::Match(_) | Matcher::Include(_) | Matcher::Eq(Literal::Text(_)) => {
                stream.is_text()
            }
            Matcher::Eq(Literal::Integer(_)) => !stream.is_text(),
        };
        if compatible {
            Ok(())
        } else {
            Err(self.parser.syntax_error(
                format!("matcher '{matcher}' cannot be applied to {stream}"),
                span,
            ))
        }
    }
}
