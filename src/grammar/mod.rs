/*
    This module is for storing grammars as they are read from a configuration
*/

use std::fmt::Display;

use serde::{Deserialize, Serialize};

// The only layout of the grammar configuration understood so far
pub const SCHEMA_VERSION: u32 = 1;

// Identifiers may be written as integers or strings in the configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SymbolId {
    Number(i64),
    Text(String),
}

impl Display for SymbolId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SymbolId::Number(n) => write!(f, "{}", n),
            SymbolId::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for SymbolId {
    fn from(s: &str) -> Self {
        SymbolId::Text(s.to_string())
    }
}

// A terminal or nonterminal of the grammar. Fields left out of the
// configuration stay `None`; nothing is defaulted here.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Symbol {
    #[serde(rename = "canonicalId", alias = "canonical_id")]
    pub id: Option<SymbolId>,
    pub name: Option<String>,
    #[serde(rename = "possibleValues", alias = "possible_values", default)]
    pub terminal_values: Vec<String>,
    #[serde(rename = "isTerminalNode", alias = "is_terminal_node", default)]
    pub is_terminal: bool,
}

// head -> body[0] body[1] ...; an empty body is an empty production
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProductionRule {
    #[serde(rename = "node1")]
    pub head_id: Option<SymbolId>,
    #[serde(rename = "adjacentNodes", alias = "adjacent_nodes", default)]
    pub body_ids: Vec<SymbolId>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Grammar {
    #[serde(rename = "schemaVersion", alias = "schema_version")]
    pub schema_version: Option<u32>,
    #[serde(rename = "nodes", default)]
    pub symbols: Vec<Symbol>,
    #[serde(rename = "productionRules", alias = "production_rules", default)]
    pub rules: Vec<ProductionRule>,
}
