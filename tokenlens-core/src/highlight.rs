// Highlight policies and contour overlays.
//
// The engine only ever emits these value objects; the renderer adapter
// applies them. A policy is always replaced whole, never patched.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::color::blend_over_background;

/// Emphasis color/size for the selected node.
pub const SELECTED_NODE_COLOR: &str = "#0294C1";
pub const SELECTED_NODE_SIZE: f64 = 4.0;
/// Size for included, non-selected nodes.
pub const INCLUDED_NODE_SIZE: f64 = 2.0;
/// Size for excluded nodes kept visible (no automatic relayout).
pub const MUTED_NODE_SIZE: f64 = 1.0;

const MUTED_BASE_COLOR: &str = "#CCCCCC";
const MUTED_NODE_ALPHA: f64 = 0.2;
const MUTED_EDGE_ALPHA: f64 = 0.4;

/// Contour level thresholds and the matching fill alphas.
pub const CONTOUR_THRESHOLDS: [f64; 7] = [0.3, 2.0, 4.0, 8.0, 10.0, 15.0, 21.0];
pub const CONTOUR_ALPHAS: [f64; 7] = [0.5, 0.45, 0.4, 0.3, 0.2, 0.15, 0.1];
const CONTOUR_BORDER_ALPHA: f64 = 0.8;
const CONTOUR_RADIUS: f64 = 100.0;
const CONTOUR_BORDER_THICKNESS: f64 = 1.0;

/// The view-update contract: which nodes stay fully styled, which node is
/// emphasized, and whether excluded nodes leave the layout entirely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightPolicy {
    pub visible: BTreeSet<String>,
    pub emphasis: Option<String>,
    pub automatic_relayout: bool,
}

/// Display override for one node. `None` fields leave the default
/// attribute untouched.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct NodeStyle {
    pub hidden: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,
}

/// Display override for one edge.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct EdgeStyle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl HighlightPolicy {
    pub fn new(visible: BTreeSet<String>, emphasis: Option<String>, automatic_relayout: bool) -> Self {
        Self {
            visible,
            emphasis,
            automatic_relayout,
        }
    }

    /// Style for a node under this policy. Pure, so applying the same
    /// policy twice yields the same visual state.
    pub fn node_style(&self, key: &str) -> NodeStyle {
        if !self.visible.contains(key) {
            if self.automatic_relayout {
                return NodeStyle {
                    hidden: true,
                    ..NodeStyle::default()
                };
            }
            return NodeStyle {
                hidden: false,
                color: Some(muted_node_color()),
                size: Some(MUTED_NODE_SIZE),
            };
        }
        if self.emphasis.as_deref() == Some(key) {
            return NodeStyle {
                hidden: false,
                color: Some(SELECTED_NODE_COLOR.to_string()),
                size: Some(SELECTED_NODE_SIZE),
            };
        }
        NodeStyle {
            hidden: false,
            color: None,
            size: Some(INCLUDED_NODE_SIZE),
        }
    }

    /// Style for an edge: desaturated unless both endpoints are included.
    pub fn edge_style(&self, source: &str, target: &str) -> EdgeStyle {
        if self.visible.contains(source) && self.visible.contains(target) {
            EdgeStyle::default()
        } else {
            EdgeStyle {
                color: Some(muted_edge_color()),
            }
        }
    }
}

/// Excluded-node color: light gray at low alpha flattened onto the
/// background.
pub fn muted_node_color() -> String {
    blend_over_background(MUTED_BASE_COLOR, MUTED_NODE_ALPHA)
}

/// Desaturated edge color for edges leaving the highlighted set.
pub fn muted_edge_color() -> String {
    blend_over_background(MUTED_BASE_COLOR, MUTED_EDGE_ALPHA)
}

// ── Contours ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContourLevel {
    pub color: String,
    pub threshold: f64,
}

/// A highlight region drawn around a node set sharing a community or
/// component. One overlay per id at a time; toggling again removes it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContourOverlay {
    pub id: String,
    pub nodes: Vec<String>,
    pub radius: f64,
    pub border_color: String,
    pub border_thickness: f64,
    pub levels: Vec<ContourLevel>,
}

impl ContourOverlay {
    /// Build an overlay for a node set in the given palette color.
    pub fn build(id: impl Into<String>, nodes: Vec<String>, palette_color: &str) -> Self {
        let levels = CONTOUR_THRESHOLDS
            .iter()
            .zip(CONTOUR_ALPHAS.iter())
            .map(|(&threshold, &alpha)| ContourLevel {
                color: blend_over_background(palette_color, alpha),
                threshold,
            })
            .collect();
        Self {
            id: id.into(),
            nodes,
            radius: CONTOUR_RADIUS,
            border_color: blend_over_background(palette_color, CONTOUR_BORDER_ALPHA),
            border_thickness: CONTOUR_BORDER_THICKNESS,
            levels,
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────
