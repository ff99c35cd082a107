//! tokenlens core library — design-token graph construction, value
//! resolution, and the interactive query engine.
//!
//! The entry points are [`graph::TokenGraph::build`], which turns merged
//! custom-property declarations into a directed reference multigraph, and
//! [`engine::QueryEngine`], which owns the active view state and emits
//! highlight policies, contour overlays, and camera commands for an
//! external renderer.

pub mod calc;
pub mod color;
pub mod community;
pub mod component;
pub mod config;
pub mod controller;
pub mod engine;
pub mod error;
pub mod graph;
pub mod highlight;
pub mod merge;
pub mod resolve;
pub mod serialize;
pub mod types;

pub use engine::QueryEngine;
pub use error::{Result, TokenLensError};
pub use graph::TokenGraph;
pub use resolve::Resolver;
