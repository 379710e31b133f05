use std::path::Path;

use super::{LineResult, ParseError, ParseErrorType};
use crate::error_handling::Location;
use crate::grammar::Grammar;

// The message dictionary form: camelCase keys, ids as numbers or strings
pub fn parse_json(text: &str, path: &Path) -> LineResult<Grammar> {
    serde_json::from_str(text).map_err(|e| ParseError {
        location: Location::new(path.to_path_buf(), e.line()),
        error: ParseErrorType::Json(e.to_string())
    })
}
