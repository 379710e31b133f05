/*
    Runs one conversion: read the grammar, flatten it, project it, write it
*/

use std::path::PathBuf;

use clap::ValueEnum;
use itertools::Itertools;
use tracing::{debug, info};

use crate::adapter::adapt;
use crate::graph::{to_json, write_document};
use crate::parser::{parse_file, InputFormat, ParseErrors};
use crate::projector::{project, Placement, ProjectError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Emit {
    // The node/edge document
    #[default]
    Graph,
    // The flattened grammar records the graph is built from
    Records,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConvertConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    pub format: InputFormat,
    pub placement: Placement,
    pub pretty: bool,
    pub emit: Emit,
}

impl ConvertConfig {
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        ConvertConfig {
            input: input.into(),
            output: output.into(),
            format: InputFormat::default(),
            placement: Placement::default(),
            pretty: false,
            emit: Emit::default()
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("{}", .0.iter().join("\n"))]
    Parse(ParseErrors),
    #[error("Malformed grammar: {0}")]
    Project(#[from] ProjectError),
    #[error("Could not encode the document: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("Could not write {}: {source}", .path.display())]
    Output { path: PathBuf, source: std::io::Error },
}

pub type Result<T> = std::result::Result<T, ConvertError>;

// The whole document, built in memory before anything is written
pub fn render(config: &ConvertConfig) -> Result<String> {
    let grammar = parse_file(&config.input, config.format).map_err(ConvertError::Parse)?;
    let records = adapt(&grammar);

    if config.emit == Emit::Records {
        return Ok(to_json(&records, config.pretty)?);
    }

    let graph = project(&records, config.placement)?;
    debug!(
        nodes = graph.nodes.len(),
        edges = graph.edges.len(),
        placement = ?config.placement,
        "projected grammar"
    );
    Ok(to_json(&graph, config.pretty)?)
}

pub fn convert(config: &ConvertConfig) -> Result<()> {
    let document = render(config)?;

    write_document(&config.output, &document).map_err(|source| ConvertError::Output {
        path: config.output.clone(),
        source
    })?;

    info!(
        input = %config.input.display(),
        output = %config.output.display(),
        bytes = document.len(),
        "wrote document"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use serde_json::{json, Value};

    use super::*;
    use crate::graph::Graph;
    use crate::projector::{EDGE_TYPE, NODE_X, NODE_Y};

    fn config(input: &str) -> ConvertConfig {
        ConvertConfig::new(input, "-")
    }

    fn render_graph(config: &ConvertConfig) -> Graph {
        serde_json::from_str(&render(config).unwrap()).unwrap()
    }

    #[test]
    fn render_text_and_json_alike() {
        let text = render(&config("example_data/arithmetic.txtpb")).unwrap();
        let json = render(&config("example_data/arithmetic.json")).unwrap();
        assert_eq!(text, json);
    }

    #[test]
    fn render_arithmetic_graph() {
        let graph = render_graph(&config("example_data/arithmetic.txtpb"));

        let ids: Vec<&str> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
        let titles: Vec<&str> = graph.nodes.iter().map(|n| n.title.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3", "4"]);
        assert_eq!(titles, vec!["expr", "term", "+ -", "0 1 2"]);
        assert!(graph.nodes.iter().all(|n| n.x == NODE_X && n.y == NODE_Y));

        let edges: Vec<(&str, &str)> = graph.edges.iter()
            .map(|e| (e.source.as_str(), e.target.as_str()))
            .collect();
        assert_eq!(edges, vec![("1", "2"), ("1", "3"), ("1", "1"), ("1", "2"), ("2", "4")]);
        assert!(graph.edges.iter().all(|e| e.kind == EDGE_TYPE));
    }

    #[test]
    fn render_is_repeatable() {
        let mut config = config("example_data/arithmetic.txtpb");
        config.pretty = true;
        assert_eq!(render(&config).unwrap(), render(&config).unwrap());
    }

    #[test]
    fn render_staggered() {
        let mut config = config("example_data/arithmetic.json");
        config.placement = Placement::Staggered;
        let graph = render_graph(&config);

        let positions: Vec<(i64, i64)> = graph.nodes.iter().map(|n| (n.x, n.y)).collect();
        assert_eq!(positions, vec![(10, 0), (110, 0), (210, 100), (310, 100)]);
    }

    #[test]
    fn render_records() {
        let mut config = config("example_data/arithmetic.txtpb");
        config.emit = Emit::Records;
        let value: Value = serde_json::from_str(&render(&config).unwrap()).unwrap();

        assert_eq!(value["nodes"][2], json!({
            "canonicalId": 3,
            "name": "op",
            "possibleValues": ["+", "-"],
            "isTerminalNode": true
        }));
        assert_eq!(value["productionRules"][3], json!({"node1": 2, "adjacentNodes": []}));
    }

    #[test]
    fn missing_name_aborts() {
        let error = render(&config("example_data/missing_name.txtpb")).unwrap_err();
        assert!(matches!(error, ConvertError::Project(_)));
    }

    #[test]
    fn parse_errors_are_reported() {
        let error = render(&config("example_data/malformed.txtpb")).unwrap_err();
        assert!(error.to_string().contains("malformed.txtpb:7"));
    }

    #[test]
    fn convert_writes_output_file() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("graph.json");
        let config = ConvertConfig::new("example_data/arithmetic.json", &output);

        convert(&config).unwrap();

        let written = fs::read_to_string(&output).unwrap();
        assert_eq!(written, format!("{}\n", render(&config).unwrap()));
        let value: Value = serde_json::from_str(&written).unwrap();
        let mut keys: Vec<&String> = value.as_object().unwrap().keys().collect();
        keys.sort();
        assert_eq!(keys, vec!["edges", "nodes"]);
    }

    #[test]
    fn failed_conversion_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("graph.json");
        let config = ConvertConfig::new("example_data/missing_name.txtpb", &output);

        assert!(convert(&config).is_err());
        assert!(!output.exists());
    }

    #[test]
    fn unwritable_output_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("missing").join("graph.json");
        let config = ConvertConfig::new("example_data/arithmetic.json", &output);

        assert!(matches!(convert(&config).unwrap_err(), ConvertError::Output { .. }));
    }
}
