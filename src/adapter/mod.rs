/*
    This module flattens a grammar into plain records, the shape the
    projector works from
*/

use serde::Serialize;

use crate::grammar::*;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub canonical_id: Option<SymbolId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    // `None` both when the configuration left the values out and when it
    // gave an empty list
    #[serde(skip_serializing_if = "Option::is_none")]
    pub possible_values: Option<Vec<String>>,
    pub is_terminal_node: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node1: Option<SymbolId>,
    pub adjacent_nodes: Vec<SymbolId>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GrammarRecords {
    pub nodes: Vec<SymbolRecord>,
    pub production_rules: Vec<RuleRecord>,
}

impl From<&Symbol> for SymbolRecord {
    fn from(symbol: &Symbol) -> Self {
        let possible_values = if symbol.terminal_values.is_empty() {
            None
        } else {
            Some(symbol.terminal_values.clone())
        };

        SymbolRecord {
            canonical_id: symbol.id.clone(),
            name: symbol.name.clone(),
            possible_values,
            is_terminal_node: symbol.is_terminal
        }
    }
}

impl From<&ProductionRule> for RuleRecord {
    fn from(rule: &ProductionRule) -> Self {
        RuleRecord {
            node1: rule.head_id.clone(),
            adjacent_nodes: rule.body_ids.clone()
        }
    }
}

pub fn adapt(grammar: &Grammar) -> GrammarRecords {
    GrammarRecords {
        nodes: grammar.symbols.iter().map(SymbolRecord::from).collect(),
        production_rules: grammar.rules.iter().map(RuleRecord::from).collect()
    }
}
