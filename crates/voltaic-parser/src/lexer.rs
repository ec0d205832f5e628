//! Line lexer for netlist text.
//!
//! Netlists are case-insensitive; every token is folded to lowercase before
//! it reaches the parser. Values resolve their scale suffix immediately, so
//! `4.7k` arrives as a single `Value(4700.0)` token.

use voltaic_core::units;

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Identifier: component name, net name, keyword or directive.
    Name(String),
    /// Numeric value with its scale suffix already applied.
    Value(f64),
    Equals,
    LParen,
    RParen,
}

fn is_word_break(c: char) -> bool {
    c.is_whitespace() || c == '=' || c == '(' || c == ')'
}

/// Splits one logical line into tokens.
pub fn tokenize(line: &str, line_number: usize) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = line.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '=' => {
                chars.next();
                tokens.push(Token::Equals);
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            _ => {
                let mut end = start;
                while let Some(&(index, c)) = chars.peek() {
                    if is_word_break(c) {
                        break;
                    }
                    end = index + c.len_utf8();
                    chars.next();
                }
                let word = &line[start..end];
                tokens.push(lex_word(word, line_number)?);
            }
        }
    }
    Ok(tokens)
}

fn lex_word(word: &str, line_number: usize) -> Result<Token> {
    let first = word.chars().next().unwrap();
    let numeric_lead = first.is_ascii_digit()
        || ((first == '.' || first == '-' || first == '+')
            && word[1..].starts_with(|c: char| c.is_ascii_digit() || c == '.'));

    if numeric_lead {
        let value = units::parse_value(word).ok_or_else(|| Error::Parse {
            line: line_number,
            message: format!("malformed value {word}"),
        })?;
        return Ok(Token::Value(value));
    }

    if first.is_ascii_alphabetic() || first == '.' || first == '_' {
        return Ok(Token::Name(word.to_ascii_lowercase()));
    }

    Err(Error::Parse {
        line: line_number,
        message: format!("unexpected character {first:?}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn component_line() {
        let tokens = tokenize("R1 in out 4.7k", 1).unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Name("r1".into()),
                Token::Name("in".into()),
                Token::Name("out".into()),
                Token::Value(4700.0),
            ]
        );
    }

    #[test]
    fn numeric_nets_stay_values() {
        let tokens = tokenize("vcc 1 0 5V", 1).unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Name("vcc".into()),
                Token::Value(1.0),
                Token::Value(0.0),
                Token::Value(5.0),
            ]
        );
    }

    #[test]
    fn model_directive() {
        let tokens = tokenize(".model dclip d(is=1e-14 n=1.24)", 1).unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Name(".model".into()),
                Token::Name("dclip".into()),
                Token::Name("d".into()),
                Token::LParen,
                Token::Name("is".into()),
                Token::Equals,
                Token::Value(1e-14),
                Token::Name("n".into()),
                Token::Equals,
                Token::Value(1.24),
                Token::RParen,
            ]
        );
    }

    #[test]
    fn negative_and_fractional_values() {
        let tokens = tokenize("v2 out 0 -2.5", 1).unwrap();
        assert_eq!(tokens[3], Token::Value(-2.5));
        let tokens = tokenize("c0 a b .5u", 1).unwrap();
        assert_eq!(tokens[3], Token::Value(0.5e-6));
    }

    #[test]
    fn bad_character_is_reported_with_its_line() {
        let err = tokenize("r1 a b #", 7).unwrap_err();
        assert!(matches!(err, Error::Parse { line: 7, .. }));
    }
}
