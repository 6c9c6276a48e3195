/*
    This module parses PMCFG exchange format text
*/

mod lexer;
mod verifier;

use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};

use crate::grammar::*;
use crate::error_handling::*;
use itertools::{Itertools, PeekingNext};
use lexer::*;
use verifier::verify_sequence_references;

// Keywords of the format. The pragma and comment markers classify a line by
// its first character; the reserved markers are standalone tokens.
const PRAGMA_MARKER: char = ':';
const COMMENT_MARKERS: &[char] = &['#', '/', '*', '-'];
const RULE_MARKER: &str = ":";
const LIN_MARKER: &str = "=";
const SEQUENCE_MARKER: &str = "=>";
const RULE_ARROW: &str = "<-";

#[derive(Debug)]
pub enum ParseErrorType {
    // A quoted token never reached its closing quote before line end
    UnterminatedString,
    // Something other than an identifier where one is required
    InvalidIdentifier(String),
    // A line that matches none of the declaration forms
    UnrecognizedDeclarationShape,
    // A sequence token that is neither quoted nor a well-formed arg:ref pair
    MalformedArgref(String),
    // A score that is not an integer or decimal literal
    MalformedNumber(String),
    // A sequence name defined more than once
    DuplicateSequenceName(String),
    // A linearization refers to a sequence that is never defined
    UndefinedSequenceReference(String),
    // There was an issue with reading a file
    FileError(std::io::Error),
}

impl ErrorType for ParseErrorType {}

impl PartialEq for ParseErrorType {
    fn eq(&self, other: &Self) -> bool {
        if let ParseErrorType::FileError(a) = self {
            if let ParseErrorType::FileError(b) = other {
                return a.kind() == b.kind();
            }
        }
        return std::mem::discriminant(self) == std::mem::discriminant(other);
    }
}

impl Display for ParseErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseErrorType::UnterminatedString => write!(f, "Unmatched quote before end of line"),
            ParseErrorType::InvalidIdentifier(text) => write!(f, "Not an identifier: `{}`", text),
            ParseErrorType::UnrecognizedDeclarationShape => write!(f, "Line does not match any declaration form"),
            ParseErrorType::MalformedArgref(text) => write!(f, "Not a sequence token: `{}`", text),
            ParseErrorType::MalformedNumber(text) => write!(f, "Not a valid score: `{}`", text),
            ParseErrorType::DuplicateSequenceName(name) => write!(f, "Sequence `{}` is defined more than once", name),
            ParseErrorType::UndefinedSequenceReference(name) => write!(f, "Could not find definition for sequence `{}`", name),
            ParseErrorType::FileError(e) => write!(f, "File error: {}", e),
        }
    }
}

pub type ParseError = Error<ParseErrorType>;
pub type ParseErrors = Errors<ParseErrorType>;

fn io_error(error: std::io::Error, file: PathBuf) -> ParseError {
    ParseError {
        location: Location {
            file,
            line: 0
        },
        source: String::new(),
        error: ParseErrorType::FileError(error)
    }
}

pub type Result<T> = std::result::Result<T, ParseErrorType>;
pub type LineResult<T> = std::result::Result<T, ParseError>;
pub type FileResult<T> = std::result::Result<T, ParseErrors>;

// One declaration per source line, before shorthand expansion
#[derive(PartialEq, Debug)]
pub enum Declaration {
    Comment(String),
    Pragma { name: Option<String>, value: String },
    Rule { names: Vec<String>, lhs: String, rhs: Vec<String> },
    Lin { names: Vec<String>, refs: Vec<String> },
    Linseq { name: String, body: Sequence },
    Score { name: String, value: f64 },
}

#[derive(PartialEq, Debug)]
struct DeclarationLine {
    declaration: Declaration,
    location: Location,
    source: String
}

impl DeclarationLine {
    fn error(&self, error: ParseErrorType) -> ParseError {
        ParseError {
            location: self.location.clone(),
            source: self.source.clone(),
            error
        }
    }
}

pub fn is_line_separator(c: char) -> bool {
    matches!(c, '\n' | '\r' | '\x0C' | '\x0B')
}

// Splits text into trimmed, 1-indexed lines, dropping the blank ones. A
// carriage return directly followed by a newline counts as one separator.
fn split_lines(text: &str) -> Vec<(usize, &str)> {
    let mut lines = Vec::new();
    let mut number = 1;
    let mut start = 0;

    let mut indices = text.char_indices().peekable();
    while let Some((at, c)) = indices.next() {
        if !is_line_separator(c) {
            continue;
        }
        push_trimmed(&mut lines, number, &text[start..at]);
        let mut end = at + 1;
        if c == '\r' && indices.peeking_next(|&(_, next)| next == '\n').is_some() {
            end += 1;
        }
        start = end;
        number += 1;
    }
    push_trimmed(&mut lines, number, &text[start..]);

    return lines;
}

fn push_trimmed<'a>(lines: &mut Vec<(usize, &'a str)>, number: usize, raw: &'a str) {
    let line = raw.trim_matches(is_delimiter);
    if !line.is_empty() {
        lines.push((number, line));
    }
}

// An identifier starts with an ASCII letter, digit, or underscore; its
// remaining characters only have to avoid the delimiter and line separator
// classes, which the lexer already guarantees
fn is_identifier(text: &str) -> bool {
    text.chars().next().is_some_and(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn is_digit_run(text: &str) -> bool {
    !text.is_empty() && text.chars().all(|c| c.is_ascii_digit())
}

fn is_marker(token: &Token) -> bool {
    matches!(token, Token::Word(text)
        if text == RULE_MARKER || text == LIN_MARKER || text == SEQUENCE_MARKER)
}

fn parse_identifier(token: &Token) -> Result<String> {
    match token {
        Token::Word(text) if is_identifier(text) => Ok(text.clone()),
        _ => Err(ParseErrorType::InvalidIdentifier(token.spelling().to_string()))
    }
}

fn parse_argref(text: &str) -> Result<Symbol> {
    let malformed = || ParseErrorType::MalformedArgref(text.to_string());

    let (argument, component) = text.split_once(':').ok_or_else(malformed)?;
    if !is_digit_run(argument) || !is_digit_run(component) {
        return Err(malformed());
    }
    let argument = argument.parse().map_err(|_| malformed())?;
    let component = component.parse().map_err(|_| malformed())?;

    return Ok(Symbol::Argref(argument, component));
}

fn parse_symbol(token: &Token) -> Result<Symbol> {
    match token {
        Token::Quoted(raw) => Ok(Symbol::Terminal(decode_terminal(raw))),
        Token::Word(text) => parse_argref(text)
    }
}

fn parse_score_value(token: &Token) -> Result<f64> {
    let malformed = || ParseErrorType::MalformedNumber(token.spelling().to_string());

    let text = match token {
        Token::Word(text) => text,
        Token::Quoted(_) => return Err(malformed())
    };
    // An unsigned integer or decimal literal; no exponent form
    let well_formed = match text.split_once('.') {
        Some((whole, fraction)) => is_digit_run(whole) && is_digit_run(fraction),
        None => is_digit_run(text)
    };
    if !well_formed {
        return Err(malformed());
    }

    let value: f64 = text.parse().map_err(|_| malformed())?;
    if !value.is_finite() {
        return Err(malformed());
    }
    return Ok(value);
}

fn parse_rule(names: Vec<String>, tokens: &[Token]) -> Result<Declaration> {
    let lhs = match tokens.first() {
        Some(token) => parse_identifier(token)?,
        None => return Err(ParseErrorType::InvalidIdentifier(String::new()))
    };
    if tokens.get(1).map(Token::spelling) != Some(RULE_ARROW) {
        return Err(ParseErrorType::UnrecognizedDeclarationShape);
    }
    let rhs = tokens[2..].iter().map(parse_identifier).collect::<Result<_>>()?;

    return Ok(Declaration::Rule { names, lhs, rhs });
}

fn parse_lin(names: Vec<String>, tokens: &[Token]) -> Result<Declaration> {
    let refs = tokens.iter().map(parse_identifier).collect::<Result<_>>()?;

    return Ok(Declaration::Lin { names, refs });
}

fn parse_sequence(mut names: Vec<String>, tokens: &[Token]) -> Result<Declaration> {
    // The sequence form takes no shorthand
    if names.len() != 1 {
        return Err(ParseErrorType::UnrecognizedDeclarationShape);
    }
    let body = tokens.iter().map(parse_symbol).collect::<Result<_>>()?;

    return Ok(Declaration::Linseq { name: names.remove(0), body });
}

fn parse_score(tokens: &[Token]) -> Result<Declaration> {
    if tokens.len() != 2 {
        return Err(ParseErrorType::UnrecognizedDeclarationShape);
    }
    let name = parse_identifier(&tokens[0])?;
    let value = parse_score_value(&tokens[1])?;

    return Ok(Declaration::Score { name, value });
}

fn parse_declaration(tokens: &[Token]) -> Result<Declaration> {
    // A line with no reserved marker can only be a score declaration
    let Some(marker_at) = tokens.iter().position(is_marker) else {
        return parse_score(tokens);
    };
    if marker_at == 0 {
        return Err(ParseErrorType::InvalidIdentifier(tokens[0].spelling().to_string()));
    }
    let names = tokens[..marker_at].iter().map(parse_identifier).collect::<Result<Vec<_>>>()?;
    let rest = &tokens[marker_at + 1..];

    return match tokens[marker_at].spelling() {
        RULE_MARKER => parse_rule(names, rest),
        SEQUENCE_MARKER => parse_sequence(names, rest),
        _ => parse_lin(names, rest)
    };
}

fn parse_pragma(rest: &str) -> Declaration {
    let (name, value) = match rest.find(is_delimiter) {
        Some(at) => (&rest[..at], rest[at..].trim_start_matches(is_delimiter)),
        None => (rest, "")
    };
    let name = if name.is_empty() { None } else { Some(name.to_string()) };

    return Declaration::Pragma { name, value: value.to_string() };
}

fn classify_line(line: &str) -> Result<Declaration> {
    if line.starts_with(COMMENT_MARKERS) {
        return Ok(Declaration::Comment(line.to_string()));
    }
    if let Some(rest) = line.strip_prefix(PRAGMA_MARKER) {
        return Ok(parse_pragma(rest));
    }
    let tokens = lex_line(line)?;

    return parse_declaration(&tokens);
}

fn parse_classified_line(line: &str, location: Location) -> LineResult<DeclarationLine> {
    classify_line(line)
        .map(|declaration| DeclarationLine {
            declaration,
            location: location.clone(),
            source: line.to_string()
        })
        .map_err(|error| ParseError { location, source: line.to_string(), error })
}

// Expands a multi-name rule or linearization into one declaration per name,
// each carrying the same body
fn expand_line(line: DeclarationLine) -> Vec<DeclarationLine> {
    match &line.declaration {
        Declaration::Rule { names, lhs, rhs } if names.len() > 1 => names.iter()
            .map(|name| DeclarationLine {
                declaration: Declaration::Rule {
                    names: vec![name.clone()],
                    lhs: lhs.clone(),
                    rhs: rhs.clone()
                },
                location: line.location.clone(),
                source: line.source.clone()
            })
            .collect(),
        Declaration::Lin { names, refs } if names.len() > 1 => names.iter()
            .map(|name| DeclarationLine {
                declaration: Declaration::Lin {
                    names: vec![name.clone()],
                    refs: refs.clone()
                },
                location: line.location.clone(),
                source: line.source.clone()
            })
            .collect(),
        _ => vec![line]
    }
}

// Folds the expanded declaration sequence into a grammar, collecting the
// errors it can only see at this stage
fn assemble(lines: &[DeclarationLine]) -> (Grammar, ParseErrors) {
    let mut grammar = Grammar::default();
    let mut errors = ParseErrors::new();

    for line in lines {
        match &line.declaration {
            Declaration::Comment(text) => grammar.comments.push(text.clone()),
            Declaration::Pragma { name, value } => grammar.pragmas.push((name.clone(), value.clone())),
            Declaration::Rule { names, lhs, rhs } => grammar.rules
                .entry(names[0].clone())
                .or_default()
                .push((lhs.clone(), rhs.clone())),
            Declaration::Lin { names, refs } => grammar.linearizations
                .entry(names[0].clone())
                .or_default()
                .push(refs.clone()),
            Declaration::Linseq { name, body } => {
                if grammar.sequences.contains_key(name) {
                    errors.push(line.error(ParseErrorType::DuplicateSequenceName(name.clone())));
                } else {
                    grammar.sequences.insert(name.clone(), body.clone());
                }
            }
            Declaration::Score { name, value } => grammar.scores
                .entry(name.clone())
                .or_default()
                .push(*value),
        }
    }

    return (grammar, errors);
}

pub fn parse_text(text: &str, file: &Path) -> FileResult<Grammar> {
    let classified = split_lines(text).into_iter().map(|(number, line)| {
        parse_classified_line(line, Location {
            file: file.to_path_buf(),
            line: number
        })
    });

    let (parsed, failed): (Vec<_>, Vec<_>) = classified.partition(LineResult::is_ok);
    let mut errors = failed.into_iter().map(LineResult::unwrap_err).collect_vec();

    let expanded = parsed.into_iter()
        .map(LineResult::unwrap)
        .flat_map(expand_line)
        .collect_vec();

    let (grammar, assembly_errors) = assemble(&expanded);
    errors.extend(assembly_errors);
    errors.extend(verify_sequence_references(&expanded, &grammar.sequences));

    if errors.len() > 0 {
        return Err(errors);
    }
    return Ok(grammar);
}

pub fn parse_file(path: &PathBuf) -> FileResult<Grammar> {
    let text = fs::read_to_string(path).map_err(|e| vec![io_error(e, path.clone())])?;

    return parse_text(&text, path);
}
