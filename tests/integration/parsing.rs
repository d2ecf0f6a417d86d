//! Integration tests for lexer + parser pipeline
//! Tests component interactions at the parsing boundary

use cmdprobe_ast::{Literal, Matcher, Polarity, ProbeError, Stream};
use cmdprobe_lexer::{Lexer, Token};
use cmdprobe_parser::Parser;

#[test]
fn test_lexer_and_parser_agree_on_token_spans() {
    let source = "describe command('true') do\n  its('stdout') { should eq '' }\nend\n";
    let lexed: Vec<Token> = Lexer::new(source)
        .tokenize()
        .into_iter()
        .map(|t| t.token)
        .filter(|t| *t != Token::Newline)
        .collect();
    let parser = Parser::new(source).unwrap();
    let parsed: Vec<Token> = parser.tokens().iter().map(|t| t.token).collect();

    assert_eq!(lexed, parsed);
    assert_eq!(parser.parse().unwrap().checks.len(), 1);
}

#[test]
fn test_comments_and_blank_lines_between_items() {
    let parser = Parser::new(
        "# header\n\ndescribe command('true') do # trailing\n\n  # inside\n  its('exit_status') { should eq 0 }\n\nend\n",
    )
    .unwrap();
    let file = parser.parse().unwrap();

    let assertion = &file.checks[0].node.assertions[0].node;
    assert_eq!(assertion.stream, Stream::ExitStatus);
    assert_eq!(assertion.polarity, Polarity::Should);
    assert_eq!(assertion.matcher, Matcher::Eq(Literal::Integer(0)));
}

#[test]
fn test_assertion_spans_map_to_lines() {
    let source = "describe command('true') do\n  its('stdout') { should eq '' }\n  its('stderr') { should eq '' }\nend\n";
    let parser = Parser::new(source).unwrap();
    let file = parser.parse().unwrap();

    let second = file.checks[0].node.assertions[1].span;
    let (start, end) = parser.source_map().span_to_positions(second);
    assert_eq!((start.line, start.column), (3, 3));
    assert_eq!(end.line, 3);
    assert_eq!(&source[second.start..second.end], "its('stderr') { should eq '' }");
}

#[test]
fn test_error_carries_filename_and_position() {
    let parser = Parser::new_with_filename(
        "describe command('true') do\n  its('stdout') { should match(/[z-a]/) }\nend\n",
        "ranges.rb",
    )
    .unwrap();

    match parser.parse().unwrap_err() {
        ProbeError::InvalidPattern {
            filename,
            line,
            column,
            ..
        } => {
            assert_eq!(filename, "ranges.rb");
            assert_eq!(line, 2);
            assert_eq!(column, 32);
        }
        other => panic!("Expected InvalidPattern error, got {other:?}"),
    }
}

#[test]
fn test_bundled_authenticate_check_parses() {
    let source = include_str!("../../checks/authenticate.rb");
    let file = Parser::new_with_filename(source, "checks/authenticate.rb")
        .unwrap()
        .parse()
        .unwrap();

    assert_eq!(file.checks.len(), 1);
    let streams: Vec<Stream> = file.checks[0]
        .node
        .assertions
        .iter()
        .map(|a| a.node.stream)
        .collect();
    assert_eq!(streams, vec![Stream::Stderr, Stream::Stdout, Stream::Stdout]);
}
