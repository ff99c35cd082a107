// Reference graph construction from merged custom-property declarations.
//
// Nodes are property names, edges are `var()` references. Parallel edges
// between the same ordered pair are allowed (same reference at different
// breakpoints); self-loops are not.

use std::collections::HashMap;
use std::sync::LazyLock;

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use regex::Regex;
use tracing::{debug, info, warn};

use crate::error::BuildError;
use crate::types::{Declaration, DeclarationMap};

/// Captures the variable name of a `var()` call up to the first comma or
/// closing paren. Fallback arguments are not references.
static VAR_REFERENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"var\(([^,)]+)[^)]*\)").expect("valid regex"));

/// Edge purpose marker carried on every reference edge.
pub const REFERENCE_PURPOSE: &str = "reference";

/// Base curvature for parallel-edge disambiguation.
pub const DEFAULT_EDGE_CURVATURE: f64 = 0.25;

// ── Node / edge data ───────────────────────────────────────────────

/// A custom property. May carry zero declarations if it is only ever
/// referenced (forward reference before definition).
#[derive(Debug, Clone)]
pub struct TokenNode {
    pub key: String,
    /// Declarations in discovery order.
    pub declarations: Vec<Declaration>,
    /// Community id, absent until detection runs (and for isolated nodes).
    pub community: Option<u32>,
}

/// How an edge should be drawn, derived from parallel-edge annotation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EdgeCurve {
    Straight,
    Curved { curvature: f64 },
}

/// A `var()` reference from one property's declaration to another
/// property.
#[derive(Debug, Clone)]
pub struct ReferenceEdge {
    /// Selector of the declaration the reference occurs in.
    pub selector: String,
    pub purpose: &'static str,
    /// 0-based index among edges sharing this ordered node pair.
    pub parallel_index: Option<u32>,
    /// Shared count−1 across the ordered pair's edge group.
    pub parallel_max_index: Option<u32>,
    pub curve: Option<EdgeCurve>,
}

impl ReferenceEdge {
    fn new(selector: String) -> Self {
        Self {
            selector,
            purpose: REFERENCE_PURPOSE,
            parallel_index: None,
            parallel_max_index: None,
            curve: None,
        }
    }
}

// ── Build report ───────────────────────────────────────────────────

/// One malformed `var()` occurrence, surfaced instead of silently
/// dropping the reference.
#[derive(Debug, Clone)]
pub struct MalformedReference {
    pub property: String,
    pub value: String,
    pub selector: String,
}

/// Outcome of a best-effort build.
#[derive(Debug, Clone, Default)]
pub struct BuildReport {
    pub edges_added: usize,
    pub self_loops_skipped: usize,
    pub malformed: Vec<MalformedReference>,
}

// ── Graph ──────────────────────────────────────────────────────────

/// Directed, possibly-cyclic multigraph of custom-property references.
#[derive(Debug, Clone)]
pub struct TokenGraph {
    pub name: String,
    pub graph: DiGraph<TokenNode, ReferenceEdge>,
    pub indices: HashMap<String, NodeIndex>,
}

impl TokenGraph {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            graph: DiGraph::new(),
            indices: HashMap::new(),
        }
    }

    /// Build the reference graph from a merged declaration map.
    ///
    /// Best-effort: a declaration with a malformed `var()` contributes no
    /// edges, and the anomaly is logged and recorded in the report. The
    /// caller decides whether that is fatal.
    pub fn build(name: impl Into<String>, declarations: &DeclarationMap) -> (Self, BuildReport) {
        let mut graph = Self::new(name);
        let mut report = BuildReport::default();

        for (property, property_declarations) in declarations {
            let property = property.trim();
            let index = graph.ensure_node(property);
            graph.graph[index]
                .declarations
                .extend(property_declarations.iter().cloned());

            for declaration in property_declarations {
                if !declaration.value.contains("var(") {
                    continue;
                }
                let references = match scan_references(property, &declaration.value) {
                    Ok(references) => references,
                    Err(error) => {
                        warn!(property, value = %declaration.value, %error,
                            "Skipping declaration with malformed reference");
                        report.malformed.push(MalformedReference {
                            property: property.to_string(),
                            value: declaration.value.clone(),
                            selector: declaration.selector.clone(),
                        });
                        continue;
                    }
                };
                for target in references {
                    if target == property {
                        debug!(property, "Ignoring self-reference");
                        report.self_loops_skipped += 1;
                        continue;
                    }
                    let target_index = graph.ensure_node(&target);
                    graph.graph.add_edge(
                        index,
                        target_index,
                        ReferenceEdge::new(declaration.selector.clone()),
                    );
                    report.edges_added += 1;
                }
            }
        }

        info!(
            graph = %graph.name,
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            malformed = report.malformed.len(),
            "Built reference graph"
        );
        (graph, report)
    }

    fn ensure_node(&mut self, key: &str) -> NodeIndex {
        if let Some(&index) = self.indices.get(key) {
            return index;
        }
        let index = self.graph.add_node(TokenNode {
            key: key.to_string(),
            declarations: Vec::new(),
            community: None,
        });
        self.indices.insert(key.to_string(), index);
        index
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.indices.contains_key(key)
    }

    pub fn node(&self, key: &str) -> Option<&TokenNode> {
        self.indices.get(key).map(|&index| &self.graph[index])
    }

    /// Node keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.graph.node_indices().map(|index| self.graph[index].key.as_str())
    }

    /// Directed neighbor keys. Parallel edges yield repeated neighbors;
    /// callers gate with a visited set.
    pub fn neighbors(&self, key: &str, direction: Direction) -> Vec<&str> {
        let Some(&index) = self.indices.get(key) else {
            return Vec::new();
        };
        self.graph
            .neighbors_directed(index, direction)
            .map(|neighbor| self.graph[neighbor].key.as_str())
            .collect()
    }

    /// All edges as (source key, target key, edge data).
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str, &ReferenceEdge)> {
        self.graph.edge_indices().map(|edge| {
            let (source, target) = self
                .graph
                .edge_endpoints(edge)
                .expect("edge index from iteration");
            (
                self.graph[source].key.as_str(),
                self.graph[target].key.as_str(),
                &self.graph[edge],
            )
        })
    }

    /// Annotate parallel-edge groups with dense indices and curvatures.
    ///
    /// Required before serialization; safe to run again after the graph
    /// changes (recomputes every group from scratch).
    pub fn annotate_parallel_edges(&mut self, base_curvature: f64) {
        let mut groups: HashMap<(NodeIndex, NodeIndex), Vec<petgraph::graph::EdgeIndex>> =
            HashMap::new();
        for edge in self.graph.edge_indices() {
            let endpoints = self.graph.edge_endpoints(edge).expect("edge exists");
            groups.entry(endpoints).or_default().push(edge);
        }

        for edges in groups.values() {
            if edges.len() == 1 {
                let data = &mut self.graph[edges[0]];
                data.parallel_index = None;
                data.parallel_max_index = None;
                data.curve = Some(EdgeCurve::Straight);
                continue;
            }
            let max_index = (edges.len() - 1) as u32;
            for (i, &edge) in edges.iter().enumerate() {
                let index = i as u32;
                let data = &mut self.graph[edge];
                data.parallel_index = Some(index);
                data.parallel_max_index = Some(max_index);
                data.curve = Some(EdgeCurve::Curved {
                    curvature: base_curvature
                        + 3.0 * base_curvature * f64::from(index) / f64::from(max_index.max(1)),
                });
            }
        }
    }
}

/// All `var()` occurrences in a value: byte range of the whole call plus
/// the referenced name. Used by the resolver for textual substitution.
pub fn var_matches(value: &str) -> Vec<(std::ops::Range<usize>, String)> {
    VAR_REFERENCE
        .captures_iter(value)
        .map(|captures| {
            let whole = captures.get(0).expect("match");
            let name = captures.get(1).expect("capture group").as_str().trim();
            (whole.range(), name.to_string())
        })
        .collect()
}

/// Extract the referenced variable names from a declaration value.
///
/// Fails only when a `var(` occurrence yields no variable name — a
/// partial match is never silently dropped.
pub fn scan_references(property: &str, value: &str) -> Result<Vec<String>, BuildError> {
    let mut covered: Vec<(usize, usize)> = Vec::new();
    let mut references = Vec::new();

    for captures in VAR_REFERENCE.captures_iter(value) {
        let whole = captures.get(0).expect("match");
        covered.push((whole.start(), whole.end()));
        let name = captures.get(1).expect("capture group").as_str().trim();
        if name.is_empty() {
            return Err(BuildError::MalformedReference {
                property: property.to_string(),
                value: value.to_string(),
            });
        }
        references.push(name.to_string());
    }

    // A `var(` outside every match span has no parseable argument
    for (position, _) in value.match_indices("var(") {
        let inside = covered
            .iter()
            .any(|&(start, end)| position >= start && position < end);
        if !inside {
            return Err(BuildError::MalformedReference {
                property: property.to_string(),
                value: value.to_string(),
            });
        }
    }

    Ok(references)
}

// ── Tests ──────────────────────────────────────────────────────────
