//! Lexical analysis for cmdprobe check files
//!
//! Tokenizes the `describe command(...) do ... end` language using logos.

use cmdprobe_ast::Span;
use logos::Logos;

/// Check-file tokens
#[derive(Logos, Debug, PartialEq, Eq, Clone, Copy)]
pub enum Token {
    // Keywords
    #[token("describe")]
    Describe,

    #[token("command")]
    Command,

    #[token("do")]
    Do,

    #[token("end")]
    End,

    #[token("its")]
    Its,

    #[token("should")]
    Should,

    #[token("should_not")]
    ShouldNot,

    #[token("match")]
    Match,

    #[token("eq")]
    Eq,

    #[token("include")]
    Include,

    /// Any other bare identifier (reported by the parser)
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_?!]*")]
    Ident,

    /// String literal with quotes
    #[regex(r#""([^"\\]|\\.)*""#)]
    #[regex(r#"'([^'\\]|\\.)*'"#)]
    String,

    /// Slash-delimited regex literal with optional flags: /body/imx
    #[regex(r"/([^/\\\n]|\\.)*/[imx]*")]
    Regex,

    /// Percent regex literal: %r{body}imx, braces in the body nest
    #[token("%r{", percent_regex_body)]
    PercentRegex,

    #[regex(r"-?[0-9]+")]
    Number,

    #[token("(")]
    Lparen,

    #[token(")")]
    Rparen,

    #[token("{")]
    Lbrace,

    #[token("}")]
    Rbrace,

    #[token("\n")]
    Newline,

    /// Line comment (ignored)
    #[regex(r"#[^\n]*", logos::skip)]
    Comment,

    /// Whitespace (ignored)
    #[regex(r"[ \t\r\f]+", logos::skip)]
    Whitespace,

    /// End of input
    Eof,

    /// Lexer error
    Error,
}

impl Token {
    /// Human readable name used in parser diagnostics
    #[must_use]
    pub const fn describe(self) -> &'static str {
        match self {
            Self::Describe => "'describe'",
            Self::Command => "'command'",
            Self::Do => "'do'",
            Self::End => "'end'",
            Self::Its => "'its'",
            Self::Should => "'should'",
            Self::ShouldNot => "'should_not'",
            Self::Match => "'match'",
            Self::Eq => "'eq'",
            Self::Include => "'include'",
            Self::Ident => "identifier",
            Self::String => "string literal",
            Self::Regex | Self::PercentRegex => "regex literal",
            Self::Number => "number",
            Self::Lparen => "'('",
            Self::Rparen => "')'",
            Self::Lbrace => "'{'",
            Self::Rbrace => "'}'",
            Self::Newline => "newline",
            Self::Comment => "comment",
            Self::Whitespace => "whitespace",
            Self::Eof => "end of input",
            Self::Error => "invalid character",
        }
    }
}

/// Consume a `%r{` body up to its balancing `}` plus trailing flags
fn percent_regex_body(lex: &mut logos::Lexer<'_, Token>) -> bool {
    let rest = lex.remainder();
    let mut depth = 1usize;
    let mut chars = rest.char_indices();

    while let Some((idx, ch)) = chars.next() {
        match ch {
            '\\' => {
                chars.next();
            }
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    let body_end = idx + 1;
                    let flags = rest[body_end..]
                        .bytes()
                        .take_while(|b| matches!(b, b'i' | b'm' | b'x'))
                        .count();
                    lex.bump(body_end + flags);
                    return true;
                }
            }
            _ => {}
        }
    }
    false
}

/// Token with location information
#[derive(Debug, Clone)]
pub struct SpannedToken {
    pub token: Token,
    pub span: Span,
    pub text: String,
}

/// Lexer that produces tokens with spans
pub struct Lexer<'input> {
    lexer: logos::Lexer<'input, Token>,
    input: &'input str,
}

impl<'input> Lexer<'input> {
    #[must_use]
    pub fn new(input: &'input str) -> Self {
        Self {
            lexer: Token::lexer(input),
            input,
        }
    }

    /// Get the next token with span information
    pub fn next_token(&mut self) -> SpannedToken {
        match self.lexer.next() {
            Some(result) => {
                let span = self.lexer.span();
                SpannedToken {
                    token: result.unwrap_or(Token::Error),
                    span: Span::new(span.start, span.end),
                    text: self.input[span].to_string(),
                }
            }
            None => SpannedToken {
                token: Token::Eof,
                span: Span::new(self.input.len(), self.input.len()),
                text: String::new(),
            },
        }
    }

    /// Tokenize the entire input
    pub fn tokenize(&mut self) -> Vec<SpannedToken> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let is_eof = token.token == Token::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        tokens
    }
}
