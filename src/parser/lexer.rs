use itertools::{Itertools, PeekingNext};

use super::{ParseErrorType, Result};

// A raw token from one line. Quoted tokens keep their full spelling, quotes
// and escapes included, until something interprets them as a terminal.
#[derive(PartialEq, Debug)]
pub enum Token {
    Word(String),
    Quoted(String)
}

impl Token {
    pub fn spelling(&self) -> &str {
        match self {
            Token::Word(text) | Token::Quoted(text) => text
        }
    }
}

// The in-line delimiters; the line separator class never reaches the lexer
pub fn is_delimiter(c: char) -> bool {
    c == ' ' || c == '\t'
}

pub fn lex_quoted(line: &mut impl PeekingNext<Item = char>, quote: char) -> Result<Token> {
    line.next(); // Consume the open quote
    let mut raw = String::from(quote);

    while let Some(c) = line.next() {
        raw.push(c);
        if c == quote {
            return Ok(Token::Quoted(raw));
        }
        // A backslash only escapes the quote character that opened the token
        if c == '\\' {
            if let Some(escaped) = line.peeking_next(|&next| next == quote) {
                raw.push(escaped);
            }
        }
    }

    return Err(ParseErrorType::UnterminatedString);
}

pub fn lex_word(line: &mut impl PeekingNext<Item = char>) -> Token {
    Token::Word(line.peeking_take_while(|&c| !is_delimiter(c)).collect())
}

pub fn lex_line(line: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();

    let mut line_chars = line.chars().peekable();

    while let Some(&c) = line_chars.peek() {
        if is_delimiter(c) {
            line_chars.next();
        } else if c == '"' || c == '\'' {
            tokens.push(lex_quoted(&mut line_chars, c)?);
        } else {
            tokens.push(lex_word(&mut line_chars));
        }
    }

    return Ok(tokens);
}

// Strips the quotes from a quoted token's raw spelling and resolves its
// escapes, producing the terminal text
pub fn decode_terminal(raw: &str) -> String {
    let quote = raw.chars().next().unwrap_or('"');
    let body = &raw[1..raw.len() - 1];

    let mut text = String::with_capacity(body.len());
    let mut body_chars = body.chars().peekable();
    while let Some(c) = body_chars.next() {
        if c == '\\' {
            if let Some(escaped) = body_chars.peeking_next(|&next| next == quote) {
                text.push(escaped);
                continue;
            }
        }
        text.push(c);
    }

    return text;
}
