/*
    This module turns grammar records into graph nodes and edges
*/

use std::fmt::Display;

use clap::ValueEnum;
use itertools::Itertools;
use tracing::trace;

use crate::adapter::*;
use crate::graph::*;

// Where every node sits when nothing smarter is asked for
pub const NODE_X: i64 = 10;
pub const NODE_Y: i64 = 0;

// Spacing used by the staggered placement
pub const X_STEP: i64 = 100;
pub const TERMINAL_Y: i64 = 100;

pub const EDGE_TYPE: &str = "EMPTY_EDGE_TYPE";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Placement {
    // Every node at (NODE_X, NODE_Y)
    #[default]
    Fixed,
    // One column per node, terminals on their own row
    Staggered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Node,
    ProductionRule,
}

impl Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordKind::Node => write!(f, "node"),
            RecordKind::ProductionRule => write!(f, "production rule"),
        }
    }
}

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum ProjectError {
    // `index` counts from zero, the message from one like the grammar file
    #[error("{kind} #{} has no `{field}`", .index + 1)]
    MissingField { kind: RecordKind, index: usize, field: &'static str },
}

pub type Result<T> = std::result::Result<T, ProjectError>;

fn missing(kind: RecordKind, index: usize, field: &'static str) -> ProjectError {
    ProjectError::MissingField { kind, index, field }
}

fn is_terminal(record: &SymbolRecord) -> bool {
    record.is_terminal_node || record.possible_values.as_ref().is_some_and(|v| !v.is_empty())
}

fn node_title(record: &SymbolRecord, index: usize) -> Result<String> {
    match &record.possible_values {
        Some(values) if !values.is_empty() => Ok(values.iter().join(" ")),
        _ => record.name.clone().ok_or_else(|| missing(RecordKind::Node, index, "name")),
    }
}

fn node_position(record: &SymbolRecord, index: usize, placement: Placement) -> (i64, i64) {
    match placement {
        Placement::Fixed => (NODE_X, NODE_Y),
        Placement::Staggered => {
            let y = if is_terminal(record) { TERMINAL_Y } else { NODE_Y };
            (NODE_X + X_STEP * index as i64, y)
        }
    }
}

pub fn project_node(record: &SymbolRecord, index: usize, placement: Placement) -> Result<GraphNode> {
    let id = record.canonical_id
        .as_ref()
        .ok_or_else(|| missing(RecordKind::Node, index, "canonicalId"))?;
    let (x, y) = node_position(record, index, placement);

    Ok(GraphNode {
        id: id.to_string(),
        title: node_title(record, index)?,
        x,
        y
    })
}

// One edge per body symbol, in body order
pub fn project_rule(record: &RuleRecord, index: usize) -> Result<Vec<GraphEdge>> {
    let source = record.node1
        .as_ref()
        .ok_or_else(|| missing(RecordKind::ProductionRule, index, "node1"))?
        .to_string();

    Ok(record.adjacent_nodes.iter()
        .map(|target| GraphEdge {
            source: source.clone(),
            target: target.to_string(),
            kind: EDGE_TYPE.to_string()
        })
        .collect())
}

pub fn project(records: &GrammarRecords, placement: Placement) -> Result<Graph> {
    let nodes: Vec<GraphNode> = records.nodes.iter()
        .enumerate()
        .map(|(index, record)| project_node(record, index, placement))
        .collect::<Result<_>>()?;

    let mut edges = Vec::new();
    for (index, record) in records.production_rules.iter().enumerate() {
        let rule_edges = project_rule(record, index)?;
        trace!(rule = index, edges = rule_edges.len(), "projected rule");
        edges.extend(rule_edges);
    }

    Ok(Graph { nodes, edges })
}

#[cfg(test)]
mod tests {
    use std::iter::zip;

    use super::*;
    use crate::grammar::SymbolId;

    fn symbol(id: &str, name: &str, values: &[&str]) -> SymbolRecord {
        SymbolRecord {
            canonical_id: Some(SymbolId::from(id)),
            name: Some(name.to_string()),
            possible_values: if values.is_empty() {
                None
            } else {
                Some(values.iter().map(|v| v.to_string()).collect())
            },
            is_terminal_node: false
        }
    }

    fn rule(head: &str, body: &[&str]) -> RuleRecord {
        RuleRecord {
            node1: Some(SymbolId::from(head)),
            adjacent_nodes: body.iter().map(|&id| SymbolId::from(id)).collect()
        }
    }

    fn edge(source: &str, target: &str) -> GraphEdge {
        GraphEdge {
            source: source.to_string(),
            target: target.to_string(),
            kind: EDGE_TYPE.to_string()
        }
    }

    fn node(id: &str, title: &str) -> GraphNode {
        GraphNode {
            id: id.to_string(),
            title: title.to_string(),
            x: NODE_X,
            y: NODE_Y
        }
    }

    #[test]
    fn terminal_and_nonterminal_titles() {
        let records = GrammarRecords {
            nodes: vec![symbol("1", "S", &[]), symbol("2", "a", &["a", "A"])],
            production_rules: vec![rule("1", &["2"])]
        };

        let graph = project(&records, Placement::Fixed).unwrap();

        assert_eq!(graph.nodes, vec![node("1", "S"), node("2", "a A")]);
        assert_eq!(graph.edges, vec![edge("1", "2")]);
    }

    #[test]
    fn numeric_ids_use_decimal_form() {
        let record = SymbolRecord {
            canonical_id: Some(SymbolId::Number(42)),
            ..symbol("x", "X", &[])
        };
        assert_eq!(project_node(&record, 0, Placement::Fixed).unwrap().id, "42");
    }

    #[test]
    fn empty_value_list_falls_back_to_name() {
        let record = SymbolRecord {
            possible_values: Some(vec![]),
            ..symbol("1", "digit", &[])
        };
        assert_eq!(project_node(&record, 0, Placement::Fixed).unwrap().title, "digit");
    }

    #[test]
    fn empty_production_has_no_edges() {
        let records = GrammarRecords {
            nodes: vec![symbol("1", "S", &[])],
            production_rules: vec![rule("1", &[]), rule("1", &["1"]), rule("1", &[])]
        };

        let graph = project(&records, Placement::Fixed).unwrap();
        assert_eq!(graph.edges, vec![edge("1", "1")]);
    }

    #[test]
    fn edges_follow_rule_then_body_order() {
        let records = GrammarRecords {
            nodes: vec![],
            production_rules: vec![
                rule("1", &["3", "2", "3"]),
                rule("2", &["1"]),
                rule("1", &["2"])
            ]
        };

        let graph = project(&records, Placement::Fixed).unwrap();
        assert_eq!(graph.edges, vec![
            edge("1", "3"),
            edge("1", "2"),
            edge("1", "3"),
            edge("2", "1"),
            edge("1", "2")
        ]);
    }

    #[test]
    fn shared_ids_are_not_merged() {
        let records = GrammarRecords {
            nodes: vec![symbol("7", "first", &[]), symbol("7", "second", &[])],
            production_rules: vec![]
        };

        let graph = project(&records, Placement::Fixed).unwrap();
        assert_eq!(graph.nodes, vec![node("7", "first"), node("7", "second")]);
    }

    #[test]
    fn dangling_references_are_kept() {
        let records = GrammarRecords {
            nodes: vec![symbol("1", "S", &[])],
            production_rules: vec![rule("1", &["99"])]
        };

        let graph = project(&records, Placement::Fixed).unwrap();
        assert_eq!(graph.edges, vec![edge("1", "99")]);
    }

    #[test]
    fn staggered_placement() {
        let mut flagged = symbol("3", "eps", &[]);
        flagged.is_terminal_node = true;
        let records = vec![
            symbol("1", "S", &[]),
            symbol("2", "a", &["a"]),
            flagged
        ];
        let answers = vec![(10, 0), (110, 100), (210, 100)];

        for (index, (record, answer)) in zip(&records, answers).enumerate() {
            let projected = project_node(record, index, Placement::Staggered).unwrap();
            assert_eq!((projected.x, projected.y), answer);
        }
    }

    #[test]
    fn missing_required_fields() {
        let no_id = SymbolRecord {
            canonical_id: None,
            ..symbol("1", "S", &[])
        };
        let no_name = SymbolRecord {
            name: None,
            ..symbol("2", "a", &[])
        };
        let no_head = RuleRecord {
            node1: None,
            adjacent_nodes: vec![]
        };

        let records = vec![
            GrammarRecords { nodes: vec![symbol("1", "S", &[]), no_id], production_rules: vec![] },
            GrammarRecords { nodes: vec![no_name], production_rules: vec![] },
            GrammarRecords { nodes: vec![], production_rules: vec![rule("1", &["1"]), no_head] }
        ];
        let answers = vec![
            missing(RecordKind::Node, 1, "canonicalId"),
            missing(RecordKind::Node, 0, "name"),
            missing(RecordKind::ProductionRule, 1, "node1")
        ];

        for (records, answer) in zip(records, answers) {
            assert_eq!(project(&records, Placement::Fixed).unwrap_err(), answer);
        }
    }

    #[test]
    fn terminal_without_name_is_fine() {
        let record = SymbolRecord {
            name: None,
            ..symbol("2", "a", &["x", "y"])
        };
        assert_eq!(project_node(&record, 0, Placement::Fixed).unwrap().title, "x y");
    }

    #[test]
    fn first_record_is_numbered_one() {
        let records = GrammarRecords {
            nodes: vec![SymbolRecord { name: None, ..symbol("1", "S", &[]) }],
            production_rules: vec![]
        };
        let error = project(&records, Placement::Fixed).unwrap_err();
        assert_eq!(error.to_string(), "node #1 has no `name`");
    }

    #[test]
    fn missing_field_message() {
        assert_eq!(
            missing(RecordKind::ProductionRule, 3, "node1").to_string(),
            "production rule #4 has no `node1`"
        );
    }
}
