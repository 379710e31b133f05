/*
    This module reads grammar configurations, either in the protobuf text
    format or as the equivalent JSON dictionary
*/

mod json;
mod lexer;

use std::fs;
use std::iter::Peekable;
use std::path::Path;
use std::vec::IntoIter;

use clap::ValueEnum;
use itertools::Itertools;
use tracing::debug;

use crate::error_handling::*;
use crate::grammar::*;
use lexer::Token;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum InputFormat {
    // Sniff the first meaningful character of the file
    #[default]
    Auto,
    Json,
    Text,
}

#[derive(Debug, thiserror::Error)]
pub enum ParseErrorType {
    #[error("Unmatched quotes")]
    UnmatchedQuote,
    #[error("Unknown escape sequence `\\{0}`")]
    InvalidEscape(char),
    #[error("Byte escape `\\{0}` is out of range or has no digits")]
    InvalidByteEscape(String),
    #[error("String escapes do not form valid UTF-8")]
    InvalidUtf8,
    #[error("Unexpected character `{0}`")]
    UnexpectedCharacter(char),
    #[error("Expected {expected}, found {found}")]
    UnexpectedToken { expected: &'static str, found: String },
    #[error("Expected {0}, found end of file")]
    UnexpectedEnd(&'static str),
    #[error("Unknown field `{field}` in {message}")]
    UnknownField { message: &'static str, field: String },
    #[error("Field `{0}` given more than once")]
    DuplicateField(String),
    #[error("Invalid value {value} for field `{field}`")]
    InvalidValue { field: String, value: String },
    #[error("Unsupported schema version {0} (only version {expected} is understood)", expected = SCHEMA_VERSION)]
    UnsupportedSchema(u32),
    #[error("Invalid JSON: {0}")]
    Json(String),
    // There was an issue with reading a file
    #[error("File error: {0}")]
    FileError(std::io::Error),
}

impl ErrorType for ParseErrorType {}

impl PartialEq for ParseErrorType {
    fn eq(&self, other: &Self) -> bool {
        use ParseErrorType::*;
        match (self, other) {
            (FileError(a), FileError(b)) => a.kind() == b.kind(),
            (InvalidEscape(a), InvalidEscape(b)) => a == b,
            (InvalidByteEscape(a), InvalidByteEscape(b)) => a == b,
            (UnexpectedCharacter(a), UnexpectedCharacter(b)) => a == b,
            (UnexpectedToken { expected: a, found: x }, UnexpectedToken { expected: b, found: y }) => a == b && x == y,
            (UnexpectedEnd(a), UnexpectedEnd(b)) => a == b,
            (UnknownField { message: a, field: x }, UnknownField { message: b, field: y }) => a == b && x == y,
            (DuplicateField(a), DuplicateField(b)) => a == b,
            (InvalidValue { field: a, value: x }, InvalidValue { field: b, value: y }) => a == b && x == y,
            (UnsupportedSchema(a), UnsupportedSchema(b)) => a == b,
            // serde_json messages are not worth comparing
            (Json(_), Json(_)) => true,
            _ => std::mem::discriminant(self) == std::mem::discriminant(other),
        }
    }
}

pub type ParseError = Error<ParseErrorType>;
pub type ParseErrors = Vec<ParseError>;

fn io_error(error: std::io::Error, file: &Path) -> ParseError {
    ParseError {
        location: Location::new(file.to_path_buf(), 0),
        error: ParseErrorType::FileError(error)
    }
}

pub type Result<T> = std::result::Result<T, ParseErrorType>;
pub type LineResult<T> = std::result::Result<T, ParseError>;
pub type FileResult<T> = std::result::Result<T, ParseErrors>;

// Tokens of the whole file, each tagged with its line number
struct TokenStream<'a> {
    tokens: Peekable<IntoIter<(usize, Token)>>,
    file: &'a Path,
    line: usize
}

impl<'a> TokenStream<'a> {
    fn new(tokens: Vec<(usize, Token)>, file: &'a Path) -> Self {
        TokenStream {
            tokens: tokens.into_iter().peekable(),
            file,
            line: 0
        }
    }

    fn error_at(&self, line: usize, error: ParseErrorType) -> ParseError {
        ParseError {
            location: Location::new(self.file.to_path_buf(), line),
            error
        }
    }

    fn peek(&mut self) -> Option<&Token> {
        self.tokens.peek().map(|(_, token)| token)
    }

    fn next_token(&mut self, expected: &'static str) -> LineResult<(usize, Token)> {
        match self.tokens.next() {
            Some((line, token)) => {
                self.line = line;
                Ok((line, token))
            }
            None => Err(self.error_at(self.line, ParseErrorType::UnexpectedEnd(expected))),
        }
    }

    fn expect(&mut self, wanted: Token, expected: &'static str) -> LineResult<usize> {
        let (line, token) = self.next_token(expected)?;
        if token == wanted {
            Ok(line)
        } else {
            Err(self.unexpected(line, expected, &token))
        }
    }

    fn unexpected(&self, line: usize, expected: &'static str, found: &Token) -> ParseError {
        self.error_at(line, ParseErrorType::UnexpectedToken {
            expected,
            found: found.describe()
        })
    }

    fn eat(&mut self, wanted: &Token) -> bool {
        if self.peek() == Some(wanted) {
            self.tokens.next();
            true
        } else {
            false
        }
    }

    fn skip_separators(&mut self) {
        while self.eat(&Token::Separator) {}
    }
}

type FieldParser<T> = fn(&mut TokenStream, &mut T, &str, usize) -> LineResult<()>;

fn parse_scalar(stream: &mut TokenStream) -> LineResult<(usize, Token)> {
    let (line, token) = stream.next_token("a value")?;
    match token {
        Token::Word(_) | Token::Str(_) => Ok((line, token)),
        other => Err(stream.unexpected(line, "a value", &other)),
    }
}

// `field: value` for fields that may appear once
fn parse_singular(stream: &mut TokenStream) -> LineResult<(usize, Token)> {
    stream.expect(Token::Colon, "`:`")?;
    parse_scalar(stream)
}

// `field: value` or `field: [value, value]` for repeated fields
fn parse_repeated(stream: &mut TokenStream) -> LineResult<Vec<(usize, Token)>> {
    stream.expect(Token::Colon, "`:`")?;
    if !stream.eat(&Token::OpenBracket) {
        return Ok(vec![parse_scalar(stream)?]);
    }

    let mut values = Vec::new();
    loop {
        if stream.eat(&Token::CloseBracket) {
            return Ok(values);
        }
        values.push(parse_scalar(stream)?);
        if !stream.eat(&Token::Separator) && stream.peek() != Some(&Token::CloseBracket) {
            let (line, token) = stream.next_token("`,` or `]`")?;
            return Err(stream.unexpected(line, "`,` or `]`", &token));
        }
    }
}

// The fields of a message, after its opening `{`
fn parse_message_body<T: Default>(stream: &mut TokenStream, fill: FieldParser<T>) -> LineResult<T> {
    let mut message = T::default();
    loop {
        stream.skip_separators();
        match stream.next_token("a field name or `}`")? {
            (_, Token::CloseBrace) => return Ok(message),
            (line, Token::Word(field)) => fill(stream, &mut message, &field, line)?,
            (line, other) => return Err(stream.unexpected(line, "a field name or `}`", &other)),
        }
    }
}

// `field { ... }`, `field: { ... }` or `field: [{ ... }, { ... }]`
fn parse_messages<T: Default>(stream: &mut TokenStream, fill: FieldParser<T>, out: &mut Vec<T>) -> LineResult<()> {
    stream.eat(&Token::Colon);
    match stream.next_token("`{` or `[`")? {
        (_, Token::OpenBrace) => {
            out.push(parse_message_body(stream, fill)?);
            Ok(())
        }
        (_, Token::OpenBracket) => loop {
            if stream.eat(&Token::CloseBracket) {
                return Ok(());
            }
            stream.expect(Token::OpenBrace, "`{`")?;
            out.push(parse_message_body(stream, fill)?);
            stream.eat(&Token::Separator);
        },
        (line, other) => Err(stream.unexpected(line, "`{` or `[`", &other)),
    }
}

fn set_once<T>(stream: &TokenStream, slot: &mut Option<T>, value: T, field: &str, line: usize) -> LineResult<()> {
    if slot.is_some() {
        return Err(stream.error_at(line, ParseErrorType::DuplicateField(field.to_string())));
    }
    *slot = Some(value);
    Ok(())
}

fn invalid_value(stream: &TokenStream, field: &str, (line, token): (usize, Token)) -> ParseError {
    stream.error_at(line, ParseErrorType::InvalidValue {
        field: field.to_string(),
        value: token.describe()
    })
}

fn symbol_id_value(stream: &TokenStream, field: &str, value: (usize, Token)) -> LineResult<SymbolId> {
    if let Token::Word(w) = &value.1 {
        if let Ok(n) = w.parse::<i64>() {
            return Ok(SymbolId::Number(n));
        }
    }
    match value {
        (_, Token::Str(s)) => Ok(SymbolId::Text(s)),
        other => Err(invalid_value(stream, field, other)),
    }
}

fn string_value(stream: &TokenStream, field: &str, value: (usize, Token)) -> LineResult<String> {
    match value {
        (_, Token::Str(s)) => Ok(s),
        other => Err(invalid_value(stream, field, other)),
    }
}

fn bool_value(stream: &TokenStream, field: &str, value: (usize, Token)) -> LineResult<bool> {
    let parsed = match &value.1 {
        Token::Word(w) => match w.as_str() {
            "true" | "True" | "t" | "1" => Some(true),
            "false" | "False" | "f" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    };
    parsed.ok_or_else(|| invalid_value(stream, field, value))
}

// A node while its fields are read. The flag is a plain `bool` on `Symbol`,
// so whether it was already given is kept here.
#[derive(Default)]
struct SymbolFields {
    symbol: Symbol,
    is_terminal: Option<bool>
}

impl SymbolFields {
    fn into_symbol(self) -> Symbol {
        Symbol {
            is_terminal: self.is_terminal.unwrap_or_default(),
            ..self.symbol
        }
    }
}

fn fill_symbol(stream: &mut TokenStream, fields: &mut SymbolFields, field: &str, line: usize) -> LineResult<()> {
    let symbol = &mut fields.symbol;
    match field {
        "canonical_id" | "canonicalId" => {
            let value = parse_singular(stream)?;
            let id = symbol_id_value(stream, field, value)?;
            set_once(stream, &mut symbol.id, id, field, line)
        }
        "name" => {
            let value = parse_singular(stream)?;
            let name = string_value(stream, field, value)?;
            set_once(stream, &mut symbol.name, name, field, line)
        }
        "possible_values" | "possibleValues" => {
            for value in parse_repeated(stream)? {
                symbol.terminal_values.push(string_value(stream, field, value)?);
            }
            Ok(())
        }
        "is_terminal_node" | "isTerminalNode" => {
            let value = parse_singular(stream)?;
            let flag = bool_value(stream, field, value)?;
            set_once(stream, &mut fields.is_terminal, flag, field, line)
        }
        _ => Err(stream.error_at(line, ParseErrorType::UnknownField {
            message: "node",
            field: field.to_string()
        })),
    }
}

fn fill_rule(stream: &mut TokenStream, rule: &mut ProductionRule, field: &str, line: usize) -> LineResult<()> {
    match field {
        "node1" => {
            let value = parse_singular(stream)?;
            let id = symbol_id_value(stream, field, value)?;
            set_once(stream, &mut rule.head_id, id, field, line)
        }
        "adjacent_nodes" | "adjacentNodes" => {
            for value in parse_repeated(stream)? {
                rule.body_ids.push(symbol_id_value(stream, field, value)?);
            }
            Ok(())
        }
        _ => Err(stream.error_at(line, ParseErrorType::UnknownField {
            message: "production rule",
            field: field.to_string()
        })),
    }
}

fn parse_grammar(stream: &mut TokenStream) -> LineResult<Grammar> {
    let mut grammar = Grammar::default();

    loop {
        stream.skip_separators();
        if stream.peek().is_none() {
            return Ok(grammar);
        }

        let (line, field) = match stream.next_token("a field name")? {
            (line, Token::Word(field)) => (line, field),
            (line, other) => return Err(stream.unexpected(line, "a field name", &other)),
        };

        match field.as_str() {
            "nodes" => {
                let mut nodes = Vec::new();
                parse_messages(stream, fill_symbol, &mut nodes)?;
                grammar.symbols.extend(nodes.into_iter().map(SymbolFields::into_symbol));
            }
            "production_rules" | "productionRules" => parse_messages(stream, fill_rule, &mut grammar.rules)?,
            "schema_version" | "schemaVersion" => {
                let value = parse_singular(stream)?;
                let version = match &value.1 {
                    Token::Word(w) => w.parse::<u32>().ok(),
                    _ => None,
                };
                let version = version.ok_or_else(|| invalid_value(stream, &field, value))?;
                set_once(stream, &mut grammar.schema_version, version, &field, line)?;
            }
            _ => return Err(stream.error_at(line, ParseErrorType::UnknownField {
                message: "grammar",
                field: field.clone()
            })),
        }
    }
}

// Lexes every line, reporting all the lines that could not be lexed
fn lex_text(text: &str, path: &Path) -> FileResult<Vec<(usize, Token)>> {
    let lexed = text.lines()
        .enumerate()
        .map(|(num, line)| (num + 1, lexer::lex_line(line)));

    let (lines, errors): (Vec<_>, Vec<_>) = lexed.partition(|(_, line)| line.is_ok());
    if !errors.is_empty() {
        return Err(errors.into_iter()
            .filter_map(|(num, line)| line.err().map(|error| ParseError {
                location: Location::new(path.to_path_buf(), num),
                error
            }))
            .collect_vec());
    }

    Ok(lines.into_iter()
        .flat_map(|(num, line)| line.into_iter().flatten().map(move |token| (num, token)))
        .collect_vec())
}

pub fn parse_text(text: &str, path: &Path) -> FileResult<Grammar> {
    let tokens = lex_text(text, path)?;
    let mut stream = TokenStream::new(tokens, path);
    parse_grammar(&mut stream).map_err(|e| vec![e])
}

pub fn detect_format(text: &str) -> InputFormat {
    let first = text.lines()
        .map(str::trim_start)
        .find(|line| !line.is_empty() && !line.starts_with('#'));

    match first {
        Some(line) if line.starts_with('{') => InputFormat::Json,
        _ => InputFormat::Text,
    }
}

fn check_schema_version(grammar: &Grammar) -> Result<()> {
    match grammar.schema_version {
        Some(version) if version != SCHEMA_VERSION => Err(ParseErrorType::UnsupportedSchema(version)),
        _ => Ok(()),
    }
}

pub fn parse_str(text: &str, path: &Path, format: InputFormat) -> FileResult<Grammar> {
    let format = match format {
        InputFormat::Auto => detect_format(text),
        other => other,
    };
    debug!(?format, path = %path.display(), "parsing grammar configuration");

    let grammar = match format {
        InputFormat::Json => json::parse_json(text, path).map_err(|e| vec![e])?,
        _ => parse_text(text, path)?,
    };

    check_schema_version(&grammar).map_err(|error| vec![ParseError {
        location: Location::new(path.to_path_buf(), 0),
        error
    }])?;

    Ok(grammar)
}

pub fn parse_file(path: &Path, format: InputFormat) -> FileResult<Grammar> {
    let text = fs::read_to_string(path).map_err(|e| vec![io_error(e, path)])?;
    let grammar = parse_str(&text, path, format)?;

    debug!(
        symbols = grammar.symbols.len(),
        rules = grammar.rules.len(),
        "grammar loaded"
    );
    Ok(grammar)
}
