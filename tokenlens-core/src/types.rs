use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ── Declarations ───────────────────────────────────────────────────

/// A single custom-property declaration, as produced by the extraction
/// adapter: one per (selector, media-query) combination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Declaration {
    /// Raw CSS value, possibly containing `var()` / `calc()`.
    pub value: String,
    /// CSS selector the declaration appears under.
    #[serde(default)]
    pub selector: String,
    /// Media query wrapping the declaration, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<String>,
}

/// Merged extraction output: property name → declarations in discovery
/// order.
pub type DeclarationMap = BTreeMap<String, Vec<Declaration>>;

// ── Breakpoints ────────────────────────────────────────────────────

/// Responsive tier requested from the resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Breakpoint {
    Phone,
    Tablet,
    Laptop,
    #[default]
    Desktop,
}

impl Breakpoint {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Phone => "phone",
            Self::Tablet => "tablet",
            Self::Laptop => "laptop",
            Self::Desktop => "desktop",
        }
    }

    /// Cascade order from the widest tier down. Fallback walks this list
    /// starting at the requested tier.
    pub const CASCADE: [Self; 4] = [Self::Desktop, Self::Laptop, Self::Tablet, Self::Phone];
}

impl std::fmt::Display for Breakpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Breakpoint {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "phone" => Ok(Self::Phone),
            "tablet" => Ok(Self::Tablet),
            "laptop" => Ok(Self::Laptop),
            "desktop" => Ok(Self::Desktop),
            other => Err(format!("unknown breakpoint: {other}")),
        }
    }
}

/// Minimum-width thresholds (em) per tier, sourced from the breakpoints
/// token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Breakpoints {
    pub phone: u32,
    pub tablet: u32,
    pub laptop: u32,
    pub desktop: u32,
}

impl Breakpoints {
    pub fn threshold(&self, breakpoint: Breakpoint) -> u32 {
        match breakpoint {
            Breakpoint::Phone => self.phone,
            Breakpoint::Tablet => self.tablet,
            Breakpoint::Laptop => self.laptop,
            Breakpoint::Desktop => self.desktop,
        }
    }
}

// ── View state unions ──────────────────────────────────────────────

/// Which edge directions a discovery traversal follows from the start
/// node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AncestryDirection {
    #[default]
    Both,
    Ascendants,
    Descendants,
}

impl std::str::FromStr for AncestryDirection {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "both" => Ok(Self::Both),
            "ascendants" | "ascendents" => Ok(Self::Ascendants),
            "descendants" | "descendents" => Ok(Self::Descendants),
            other => Err(format!("unknown ancestry direction: {other}")),
        }
    }
}

/// Default/inverted theming filter on the toolbar. No core behavior
/// beyond carrying the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvertedFilter {
    #[default]
    Both,
    Default,
    Inverted,
}

// ── Camera ─────────────────────────────────────────────────────────

/// Renderer camera state. `ratio` is the zoom level (1 = global view).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraState {
    pub x: f64,
    pub y: f64,
    pub angle: f64,
    pub ratio: f64,
}

impl CameraState {
    /// The canonical default/global camera state.
    pub const DEFAULT: Self = Self {
        x: 0.5,
        y: 0.5,
        angle: 0.0,
        ratio: 1.0,
    };

    /// Close-zoom ratio used when focusing a node from the global view.
    pub const FOCUS_RATIO: f64 = 0.1;
}

impl Default for CameraState {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// A fire-and-forget camera animation. A new command supersedes any
/// in-flight one (last-write-wins, no queueing).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraCommand {
    pub target: CameraState,
    pub duration_ms: u32,
}

impl CameraCommand {
    pub const DURATION_MS: u32 = 500;

    pub fn animate_to(target: CameraState) -> Self {
        Self {
            target,
            duration_ms: Self::DURATION_MS,
        }
    }
}
