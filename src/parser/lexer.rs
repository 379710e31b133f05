use itertools::{Itertools, PeekingNext};

use super::{ParseErrorType, Result};

#[derive(PartialEq, Debug, Clone)]
pub enum Token {
    Colon,
    OpenBrace,
    CloseBrace,
    OpenBracket,
    CloseBracket,
    // `,` or `;`, both optional between fields
    Separator,
    // Field names, numbers and other bare literals like `true`
    Word(String),
    Str(String)
}

impl Token {
    pub fn describe(&self) -> String {
        match self {
            Token::Colon => "`:`".to_string(),
            Token::OpenBrace => "`{`".to_string(),
            Token::CloseBrace => "`}`".to_string(),
            Token::OpenBracket => "`[`".to_string(),
            Token::CloseBracket => "`]`".to_string(),
            Token::Separator => "separator".to_string(),
            Token::Word(w) => format!("`{}`", w),
            Token::Str(s) => format!("string \"{}\"", s),
        }
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | '+' | '.')
}

// Up to `max` digits of the given radix, read after `digits`, as a single byte
fn lex_byte_escape(line: &mut impl PeekingNext<Item = char>, mut digits: String, radix: u32, max: usize) -> Result<u8> {
    while digits.len() < max {
        match line.peeking_next(|c| c.is_digit(radix)) {
            Some(c) => digits.push(c),
            None => break,
        }
    }
    u8::from_str_radix(&digits, radix).map_err(|_| ParseErrorType::InvalidByteEscape(digits))
}

pub fn lex_string(line: &mut impl PeekingNext<Item = char>) -> Result<Token> {
    // Consume the open quote, the same kind has to close the string
    let quote = line.next().ok_or(ParseErrorType::UnmatchedQuote)?;
    // Octal and hex escapes are raw bytes, so the text is only decoded at the end
    let mut bytes = Vec::new();
    let mut buffer = [0; 4];

    loop {
        let c = match line.next() {
            None => return Err(ParseErrorType::UnmatchedQuote),
            Some(c) if c == quote => break,
            Some('\\') => match line.next() {
                Some('n') => '\n',
                Some('t') => '\t',
                Some('r') => '\r',
                Some('a') => '\x07',
                Some('b') => '\x08',
                Some('f') => '\x0c',
                Some('v') => '\x0b',
                Some(c @ ('\\' | '\'' | '"' | '?')) => c,
                Some(c @ '0'..='7') => {
                    bytes.push(lex_byte_escape(line, c.to_string(), 8, 3)?);
                    continue;
                }
                Some('x') => {
                    bytes.push(lex_byte_escape(line, String::new(), 16, 2)?);
                    continue;
                }
                Some(c) => return Err(ParseErrorType::InvalidEscape(c)),
                None => return Err(ParseErrorType::UnmatchedQuote),
            },
            Some(c) => c,
        };
        bytes.extend_from_slice(c.encode_utf8(&mut buffer).as_bytes());
    }

    String::from_utf8(bytes)
        .map(Token::Str)
        .map_err(|_| ParseErrorType::InvalidUtf8)
}

pub fn lex_word(line: &mut impl PeekingNext<Item = char>) -> Result<Token> {
    let word: String = line.peeking_take_while(|&c| is_word_char(c)).collect();
    Ok(Token::Word(word))
}

pub fn lex_line(line: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();

    let mut line_chars = line.chars().peekable();

    while let Some(&c) = line_chars.peek() {
        let punctuation = match c {
            ':' => Some(Token::Colon),
            '{' => Some(Token::OpenBrace),
            '}' => Some(Token::CloseBrace),
            '[' => Some(Token::OpenBracket),
            ']' => Some(Token::CloseBracket),
            ',' | ';' => Some(Token::Separator),
            _ => None
        };

        if let Some(token) = punctuation {
            line_chars.next();
            tokens.push(token);
        } else if c == '#' {
            // Comment runs to the end of the line
            break;
        } else if c == '"' || c == '\'' {
            tokens.push(lex_string(&mut line_chars)?);
        } else if is_word_char(c) {
            tokens.push(lex_word(&mut line_chars)?);
        } else if c.is_whitespace() {
            line_chars.next();
        } else {
            return Err(ParseErrorType::UnexpectedCharacter(c));
        }
    }

    return Ok(tokens);
}
