// Interaction controller: translates UI events (renderer clicks, command
// menu, toolbar toggles) into engine operations and hands the resulting
// effects back to the renderer adapter.

use crate::engine::{Effect, QueryEngine};
use crate::error::QueryError;
use crate::types::{AncestryDirection, Breakpoint, InvertedFilter};

/// Entry in the searchable command list.
pub const RESET_COMMAND: &str = "Reset";

/// Discrete input events from the interaction surface.
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    NodeClicked(String),
    SearchSelected(String),
    ResetSelected,
    SwitchGraph(String),
    ToggleAutomaticRelayout,
    SetAncestryDirection(AncestryDirection),
    SetAncestryDepth(u32),
    SetBreakpointFilter(Option<Breakpoint>),
    SetInvertedFilter(InvertedFilter),
    ToggleComponent(String),
    ToggleCommunity(u32),
    DetectCommunities,
}

/// Thin stateful wrapper around the engine. All events funnel through
/// [`handle`](Self::handle) on the UI thread.
#[derive(Debug, Default)]
pub struct InteractionController {
    engine: Option<QueryEngine>,
}

impl InteractionController {
    pub fn new(engine: QueryEngine) -> Self {
        Self {
            engine: Some(engine),
        }
    }

    /// A controller with no graph yet; every event fails with a missing
    /// graph context until [`attach`](Self::attach) runs.
    pub fn detached() -> Self {
        Self { engine: None }
    }

    pub fn attach(&mut self, engine: QueryEngine) {
        self.engine = Some(engine);
    }

    pub fn engine(&self) -> Option<&QueryEngine> {
        self.engine.as_ref()
    }

    fn engine_mut(&mut self) -> Result<&mut QueryEngine, QueryError> {
        self.engine
            .as_mut()
            .ok_or_else(|| QueryError::MissingGraphContext("no engine attached".to_string()))
    }

    /// Dispatch one event and return the effects to apply, in order.
    pub fn handle(&mut self, event: UiEvent) -> Result<Vec<Effect>, QueryError> {
        let engine = self.engine_mut()?;
        match event {
            UiEvent::NodeClicked(key) | UiEvent::SearchSelected(key) => {
                engine.select_token(Some(key))?;
                engine.refresh()
            }
            UiEvent::ResetSelected => {
                engine.select_token(None)?;
                engine.refresh()
            }
            UiEvent::SwitchGraph(name) => engine.select_subgraph(&name),
            UiEvent::ToggleAutomaticRelayout => {
                engine.state.automatic_relayout = !engine.state.automatic_relayout;
                engine.refresh()
            }
            UiEvent::SetAncestryDirection(direction) => {
                engine.state.ancestry_direction = direction;
                engine.refresh()
            }
            UiEvent::SetAncestryDepth(depth) => {
                engine.state.ancestry_depth = depth;
                engine.refresh()
            }
            UiEvent::SetBreakpointFilter(breakpoint) => {
                engine.state.breakpoint_filter = breakpoint;
                engine.refresh()
            }
            UiEvent::SetInvertedFilter(filter) => {
                engine.state.inverted_filter = filter;
                engine.refresh()
            }
            UiEvent::ToggleComponent(selector) => {
                engine.toggle_component(&selector)?;
                engine.refresh()
            }
            UiEvent::ToggleCommunity(id) => {
                engine.toggle_community(id)?;
                engine.refresh()
            }
            UiEvent::DetectCommunities => {
                engine.detect_communities()?;
                Ok(Vec::new())
            }
        }
    }

    /// Entries for the searchable command list: `Reset` plus every node
    /// key, sorted.
    pub fn command_list(&self) -> Result<Vec<String>, QueryError> {
        let engine = self
            .engine
            .as_ref()
            .ok_or_else(|| QueryError::MissingGraphContext("no engine attached".to_string()))?;
        let mut entries: Vec<String> = engine.graph().keys().map(str::to_string).collect();
        entries.sort();
        entries.insert(0, RESET_COMMAND.to_string());
        Ok(entries)
    }
}

// ── Tests ──────────────────────────────────────────────────────────
