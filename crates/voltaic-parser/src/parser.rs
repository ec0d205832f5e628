//! Line-oriented netlist parser.
//!
//! `*` starts a comment line, `+` continues the previous logical line.
//! `.model` directives populate the model map; other directives (`.end`,
//! analysis commands) are not this simulator's business and are skipped.

use std::collections::HashMap;

use crate::ast::{ComponentLine, ModelDefinition, ModelKind, NetlistArg, NetlistAst};
use crate::error::{Error, Result};
use crate::lexer::{Token, tokenize};

/// Parses a complete netlist source into an AST.
pub fn parse(source: &str) -> Result<NetlistAst> {
    let mut ast = NetlistAst::default();
    for (line_number, line) in logical_lines(source) {
        parse_line(&mut ast, &line, line_number)?;
    }
    Ok(ast)
}

/// Merges `+` continuations and drops comment lines, keeping the line
/// number of each logical line's first physical line.
fn logical_lines(source: &str) -> Vec<(usize, String)> {
    let mut lines: Vec<(usize, String)> = Vec::new();
    for (index, raw) in source.lines().enumerate() {
        let line_number = index + 1;
        let trimmed = raw.trim_end();
        if trimmed.trim_start().starts_with('*') {
            continue;
        }
        if let Some(continuation) = trimmed.strip_prefix('+') {
            if let Some((_, previous)) = lines.last_mut() {
                previous.push(' ');
                previous.push_str(continuation);
                continue;
            }
        }
        lines.push((line_number, trimmed.to_string()));
    }
    lines
}

/// Parses one logical line into the AST under construction.
pub fn parse_line(ast: &mut NetlistAst, line: &str, line_number: usize) -> Result<()> {
    let tokens = tokenize(line, line_number)?;
    if tokens.is_empty() {
        return Ok(());
    }

    match &tokens[0] {
        Token::Name(name) if name == ".model" => parse_model(ast, &tokens, line_number),
        Token::Name(name) if name.starts_with('.') => Ok(()),
        Token::Name(name) => {
            let component = parse_component(name, &tokens[1..], line_number)?;
            ast.components.push(component);
            Ok(())
        }
        _ => Err(Error::Parse {
            line: line_number,
            message: "expected a component name or directive".to_string(),
        }),
    }
}

fn parse_component(name: &str, args: &[Token], line_number: usize) -> Result<ComponentLine> {
    let mut parsed = Vec::with_capacity(args.len());
    for token in args {
        match token {
            Token::Name(name) => parsed.push(NetlistArg::Name(name.clone())),
            Token::Value(value) => parsed.push(NetlistArg::Number(*value)),
            _ => {
                return Err(Error::Parse {
                    line: line_number,
                    message: format!("unexpected token in component {name}"),
                });
            }
        }
    }
    Ok(ComponentLine {
        name: name.to_string(),
        args: parsed,
    })
}

/// `.model name kind(key=value ...)`, parentheses optional when there are no
/// parameters.
fn parse_model(ast: &mut NetlistAst, tokens: &[Token], line_number: usize) -> Result<()> {
    let mut cursor = tokens[1..].iter().peekable();

    let name = match cursor.next() {
        Some(Token::Name(name)) => name.clone(),
        _ => {
            return Err(Error::Parse {
                line: line_number,
                message: "expected a model name after .model".to_string(),
            });
        }
    };

    let kind = match cursor.next() {
        Some(Token::Name(kind)) => match kind.as_str() {
            "d" => ModelKind::Diode,
            "npn" => ModelKind::Npn,
            "pnp" => ModelKind::Pnp,
            other => {
                return Err(Error::Parse {
                    line: line_number,
                    message: format!("unknown model kind {other}"),
                });
            }
        },
        _ => {
            return Err(Error::Parse {
                line: line_number,
                message: format!("expected a model kind for {name}"),
            });
        }
    };

    let mut parameters = HashMap::new();
    if matches!(cursor.peek(), Some(Token::LParen)) {
        cursor.next();
        loop {
            match cursor.next() {
                Some(Token::RParen) => break,
                Some(Token::Name(key)) => {
                    if !matches!(cursor.next(), Some(Token::Equals)) {
                        return Err(Error::Parse {
                            line: line_number,
                            message: format!("expected = after parameter {key}"),
                        });
                    }
                    match cursor.next() {
                        Some(Token::Value(value)) => {
                            parameters.insert(key.clone(), *value);
                        }
                        _ => {
                            return Err(Error::Parse {
                                line: line_number,
                                message: format!("expected a value for parameter {key}"),
                            });
                        }
                    }
                }
                _ => {
                    return Err(Error::Parse {
                        line: line_number,
                        message: "unterminated model parameter list".to_string(),
                    });
                }
            }
        }
    }

    ast.models.insert(name, ModelDefinition { kind, parameters });
    Ok(())
}
