// Renderer handoff: the serialized multigraph shape the external
// force-directed renderer imports.

use serde::{Deserialize, Serialize};

use crate::graph::{EdgeCurve, TokenGraph};

/// Default node size in the serialized output.
pub const DEFAULT_NODE_SIZE: f64 = 4.0;

/// Node palette by key prefix.
pub const KS_NODE_COLOR: &str = "#ecff00";
pub const DSA_NODE_COLOR: &str = "#e21879";
pub const DEFAULT_NODE_COLOR: &str = "#00F218";

/// Edge color in the serialized output.
pub const EDGE_COLOR: &str = "#0294C1";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerializedGraph {
    pub attributes: GraphAttributes,
    pub options: GraphOptions,
    pub nodes: Vec<SerializedNode>,
    pub edges: Vec<SerializedEdge>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphAttributes {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphOptions {
    pub allow_self_loops: bool,
    pub multi: bool,
    #[serde(rename = "type")]
    pub graph_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerializedNode {
    pub key: String,
    pub attributes: NodeAttributes,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeAttributes {
    pub x: f64,
    pub y: f64,
    pub size: f64,
    pub color: String,
    pub label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerializedEdge {
    pub source: String,
    pub target: String,
    pub attributes: EdgeAttributes,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeAttributes {
    pub selector: String,
    pub purpose: String,
    pub label: String,
    pub color: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub edge_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub curvature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallel_index: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallel_max_index: Option<u32>,
}

/// Color a node gets from its key prefix.
pub fn node_color(key: &str) -> &'static str {
    if key.starts_with("--ks-") {
        KS_NODE_COLOR
    } else if key.starts_with("--dsa-") {
        DSA_NODE_COLOR
    } else {
        DEFAULT_NODE_COLOR
    }
}

/// Deterministic position in the unit square, derived from the key so a
/// fixed input serializes byte-identically. The layout engine overwrites
/// these on its first pass.
pub fn node_position(key: &str) -> (f64, f64) {
    (unit_interval(key, 0x9e37), unit_interval(key, 0x79b9))
}

fn unit_interval(key: &str, salt: u64) -> f64 {
    // FNV-1a, salted; stable across platforms and runs
    let mut hash = 0xcbf2_9ce4_8422_2325_u64 ^ salt;
    for byte in key.as_bytes() {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    (hash >> 11) as f64 / (1u64 << 53) as f64
}

/// Serialize a graph into the renderer's import shape.
pub fn to_renderer(graph: &TokenGraph) -> SerializedGraph {
    let nodes = graph
        .keys()
        .map(|key| {
            let (x, y) = node_position(key);
            SerializedNode {
                key: key.to_string(),
                attributes: NodeAttributes {
                    x,
                    y,
                    size: DEFAULT_NODE_SIZE,
                    color: node_color(key).to_string(),
                    label: key.to_string(),
                },
            }
        })
        .collect();

    let edges = graph
        .edges()
        .map(|(source, target, edge)| SerializedEdge {
            source: source.to_string(),
            target: target.to_string(),
            attributes: EdgeAttributes {
                selector: edge.selector.clone(),
                purpose: edge.purpose.to_string(),
                label: edge.selector.clone(),
                color: EDGE_COLOR.to_string(),
                edge_type: edge.curve.map(|curve| {
                    match curve {
                        EdgeCurve::Straight => "straight",
                        EdgeCurve::Curved { .. } => "curved",
                    }
                    .to_string()
                }),
                curvature: edge.curve.and_then(|curve| match curve {
                    EdgeCurve::Straight => None,
                    EdgeCurve::Curved { curvature } => Some(curvature),
                }),
                parallel_index: edge.parallel_index,
                parallel_max_index: edge.parallel_max_index,
            },
        })
        .collect();

    SerializedGraph {
        attributes: GraphAttributes {
            name: graph.name.clone(),
        },
        options: GraphOptions {
            allow_self_loops: false,
            multi: true,
            graph_type: "directed".to_string(),
        },
        nodes,
        edges,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::DEFAULT_EDGE_CURVATURE;
    use crate::types::{Declaration, DeclarationMap};

    fn sample_graph() -> TokenGraph {
        let mut declarations = DeclarationMap::new();
        declarations.insert(
            "--dsa-button--color".to_string(),
            vec![Declaration {
                value: "var(--ks-color-primary)".to_string(),
                selector: ".dsa-button".to_string(),
                media: None,
            }],
        );
        let (mut graph, _) = TokenGraph::build("full", &declarations);
        graph.annotate_parallel_edges(DEFAULT_EDGE_CURVATURE);
        graph
    }

    #[test]
    fn contract_shape() {
        let serialized = to_renderer(&sample_graph());
        let json = serde_json::to_value(&serialized).unwrap();

        assert_eq!(json["attributes"]["name"], "full");
        assert_eq!(json["options"]["allowSelfLoops"], false);
        assert_eq!(json["options"]["multi"], true);
        assert_eq!(json["options"]["type"], "directed");

        let node = &json["nodes"][0];
        for field in ["x", "y", "size", "color", "label"] {
            assert!(node["attributes"].get(field).is_some(), "missing {field}");
        }

        let edge = &json["edges"][0];
        assert_eq!(edge["source"], "--dsa-button--color");
        assert_eq!(edge["target"], "--ks-color-primary");
        assert_eq!(edge["attributes"]["purpose"], "reference");
        assert_eq!(edge["attributes"]["label"], ".dsa-button");
        assert_eq!(edge["attributes"]["type"], "straight");
        assert!(edge["attributes"].get("curvature").is_none());
    }

    #[test]
    fn node_colors_follow_prefixes() {
        assert_eq!(node_color("--ks-breakpoints"), KS_NODE_COLOR);
        assert_eq!(node_color("--dsa-button--color"), DSA_NODE_COLOR);
        assert_eq!(node_color("--c-spacing"), DEFAULT_NODE_COLOR);
    }

    #[test]
    fn output_is_byte_stable() {
        let a = serde_json::to_string(&to_renderer(&sample_graph())).unwrap();
        let b = serde_json::to_string(&to_renderer(&sample_graph())).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn positions_are_in_unit_square() {
        for key in ["--a", "--b", "--ks-color", "--dsa-thing__part--mod"] {
            let (x, y) = node_position(key);
            assert!((0.0..1.0).contains(&x), "{key} x out of range");
            assert!((0.0..1.0).contains(&y), "{key} y out of range");
        }
    }

    #[test]
    fn positions_differ_between_keys() {
        assert_ne!(node_position("--a"), node_position("--b"));
    }
}
