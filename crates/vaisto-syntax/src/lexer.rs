//! Tokenizer for the vaisto S-expression surface syntax.

use vaisto_common::Loc;

use crate::error::ParseError;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    LParen,
    RParen,
    LBracket,
    RBracket,
    Symbol(String),
    /// A leading-colon tag: `:inc`, `:wrong`.
    Keyword(String),
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub loc: Loc,
}

fn is_delimiter(c: char) -> bool {
    matches!(c, '(' | ')' | '[' | ']' | '"' | ';') || c.is_whitespace()
}

/// Tokenize `source`, collecting lexer errors rather than aborting on the
/// first one so the caller can still attempt a best-effort parse.
pub fn tokenize(source: &str) -> (Vec<Token>, Vec<ParseError>) {
    let bytes: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut errors = Vec::new();
    let mut i = 0usize;
    let n = bytes.len();

    // Byte offsets must track UTF-8 length, not char count; since the source
    // language is ASCII-oriented in practice we track a running byte cursor
    // alongside the char cursor.
    let mut byte_off = 0u32;
    let char_len = |c: char| c.len_utf8() as u32;

    while i < n {
        let c = bytes[i];
        if c.is_whitespace() {
            byte_off += char_len(c);
            i += 1;
            continue;
        }
        if c == ';' {
            while i < n && bytes[i] != '\n' {
                byte_off += char_len(bytes[i]);
                i += 1;
            }
            continue;
        }
        let start = byte_off;
        match c {
            '(' => {
                tokens.push(Token { kind: TokenKind::LParen, loc: Loc::new(start, start + 1) });
                byte_off += 1;
                i += 1;
            }
            ')' => {
                tokens.push(Token { kind: TokenKind::RParen, loc: Loc::new(start, start + 1) });
                byte_off += 1;
                i += 1;
            }
            '[' => {
                tokens.push(Token { kind: TokenKind::LBracket, loc: Loc::new(start, start + 1) });
                byte_off += 1;
                i += 1;
            }
            ']' => {
                tokens.push(Token { kind: TokenKind::RBracket, loc: Loc::new(start, start + 1) });
                byte_off += 1;
                i += 1;
            }
            '"' => {
                i += 1;
                byte_off += 1;
                let mut s = String::new();
                let mut closed = false;
                while i < n {
                    let ch = bytes[i];
                    if ch == '"' {
                        byte_off += 1;
                        i += 1;
                        closed = true;
                        break;
                    }
                    if ch == '\\' && i + 1 < n {
                        let escaped = bytes[i + 1];
                        let resolved = match escaped {
                            'n' => '\n',
                            't' => '\t',
                            '"' => '"',
                            '\\' => '\\',
                            other => other,
                        };
                        s.push(resolved);
                        byte_off += char_len(ch) + char_len(escaped);
                        i += 2;
                        continue;
                    }
                    s.push(ch);
                    byte_off += char_len(ch);
                    i += 1;
                }
                if !closed {
                    errors.push(ParseError::new(
                        "unterminated string literal",
                        Loc::new(start, byte_off),
                    ));
                }
                tokens.push(Token { kind: TokenKind::Str(s), loc: Loc::new(start, byte_off) });
            }
            ':' => {
                i += 1;
                byte_off += 1;
                let tag_start_idx = i;
                while i < n && !is_delimiter(bytes[i]) {
                    byte_off += char_len(bytes[i]);
                    i += 1;
                }
                let tag: String = bytes[tag_start_idx..i].iter().collect();
                if tag.is_empty() {
                    errors.push(ParseError::new("empty tag after `:`", Loc::new(start, byte_off)));
                }
                tokens.push(Token { kind: TokenKind::Keyword(tag), loc: Loc::new(start, byte_off) });
            }
            _ => {
                let atom_start_idx = i;
                while i < n && !is_delimiter(bytes[i]) {
                    byte_off += char_len(bytes[i]);
                    i += 1;
                }
                let text: String = bytes[atom_start_idx..i].iter().collect();
                let loc = Loc::new(start, byte_off);
                tokens.push(classify_atom(text, loc, &mut errors));
            }
        }
    }

    tokens.push(Token { kind: TokenKind::Eof, loc: Loc::at(byte_off) });
    (tokens, errors)
}

fn classify_atom(text: String, loc: Loc, errors: &mut Vec<ParseError>) -> Token {
    match text.as_str() {
        "true" => return Token { kind: TokenKind::Bool(true), loc },
        "false" => return Token { kind: TokenKind::Bool(false), loc },
        _ => {}
    }
    let looks_numeric = text
        .chars()
        .next()
        .map(|c| c.is_ascii_digit() || (c == '-' && text.len() > 1))
        .unwrap_or(false);
    if looks_numeric {
        if text.contains('.') {
            match text.parse::<f64>() {
                Ok(f) => return Token { kind: TokenKind::Float(f), loc },
                Err(_) => {
                    errors.push(ParseError::new(format!("invalid number literal: {text}"), loc));
                    return Token { kind: TokenKind::Float(0.0), loc };
                }
            }
        }
        if let Ok(v) = text.parse::<i64>() {
            return Token { kind: TokenKind::Int(v), loc };
        }
        errors.push(ParseError::new(format!("invalid number literal: {text}"), loc));
        return Token { kind: TokenKind::Int(0), loc };
    }
    Token { kind: TokenKind::Symbol(text), loc }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        tokenize(src).0.into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn tokenizes_call() {
        assert_eq!(
            kinds("(+ 1 2)"),
            vec![
                TokenKind::LParen,
                TokenKind::Symbol("+".into()),
                TokenKind::Int(1),
                TokenKind::Int(2),
                TokenKind::RParen,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn tokenizes_float_and_keyword() {
        assert_eq!(
            kinds("3.5 :inc"),
            vec![TokenKind::Float(3.5), TokenKind::Keyword("inc".into()), TokenKind::Eof]
        );
    }

    #[test]
    fn tokenizes_string_with_escapes() {
        assert_eq!(
            kinds(r#""a\nb""#),
            vec![TokenKind::Str("a\nb".into()), TokenKind::Eof]
        );
    }

    #[test]
    fn unterminated_string_reports_error() {
        let (_, errors) = tokenize("\"abc");
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn comments_are_skipped() {
        assert_eq!(kinds("1 ; comment\n2"), vec![TokenKind::Int(1), TokenKind::Int(2), TokenKind::Eof]);
    }

    #[test]
    fn negative_numbers() {
        assert_eq!(kinds("-5 -2.5"), vec![TokenKind::Int(-5), TokenKind::Float(-2.5), TokenKind::Eof]);
    }
}
