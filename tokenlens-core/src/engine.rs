// The query engine: owns the active graph and all mutable view state,
// and turns state changes into atomic view updates (highlight policy,
// camera command, contour bind/remove) for the renderer adapter.

use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};

use petgraph::Direction;
use tracing::{debug, info};

use crate::community::{self, CommunityInfo};
use crate::component;
use crate::error::QueryError;
use crate::graph::{DEFAULT_EDGE_CURVATURE, TokenGraph};
use crate::highlight::{ContourOverlay, HighlightPolicy};
use crate::serialize::node_position;
use crate::types::{AncestryDirection, Breakpoint, CameraCommand, CameraState, InvertedFilter};
use crate::color::categorical_palette;

/// Name of the unreduced graph.
pub const FULL_GRAPH: &str = "full";
/// Name of the precomputed design-system subgraph.
pub const DESIGN_SYSTEM_GRAPH: &str = "design-system";

/// Mutable session view state.
#[derive(Debug, Clone, Default)]
pub struct ViewState {
    pub selected: Option<String>,
    pub ancestry_direction: AncestryDirection,
    pub ancestry_depth: u32,
    pub automatic_relayout: bool,
    pub breakpoint_filter: Option<Breakpoint>,
    pub inverted_filter: InvertedFilter,
    pub active_components: BTreeSet<String>,
    pub active_communities: BTreeSet<u32>,
}

/// One renderer-facing side effect of a view update. A highlight effect
/// always carries the whole policy (full replace, never a patch).
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    SetHighlight(HighlightPolicy),
    ClearHighlight,
    Camera(CameraCommand),
    BindContour(ContourOverlay),
    RemoveContour(String),
    Relayout,
}

/// Owns the full graph and its design-system reduction, plus the session
/// view state. Single mutator; all operations run synchronously to
/// completion.
#[derive(Debug)]
pub struct QueryEngine {
    graphs: BTreeMap<String, TokenGraph>,
    active: String,
    pub state: ViewState,
    camera: CameraState,
    communities: BTreeMap<u32, CommunityInfo>,
    components: BTreeMap<String, Vec<String>>,
    community_palette: BTreeMap<String, String>,
    component_palette: BTreeMap<String, String>,
    bound_contours: BTreeSet<String>,
}

impl QueryEngine {
    /// Set up the engine around a built graph: annotates parallel edges,
    /// precomputes the design-system subgraph, and derives the component
    /// grouping.
    pub fn new(mut full: TokenGraph) -> Self {
        full.name = FULL_GRAPH.to_string();
        full.annotate_parallel_edges(DEFAULT_EDGE_CURVATURE);
        let mut design_system = component::design_system_subgraph(&full);
        design_system.annotate_parallel_edges(DEFAULT_EDGE_CURVATURE);

        let components = component::component_groups(&full);
        let component_palette =
            categorical_palette(&components.keys().cloned().collect::<Vec<_>>());

        let mut graphs = BTreeMap::new();
        graphs.insert(FULL_GRAPH.to_string(), full);
        graphs.insert(DESIGN_SYSTEM_GRAPH.to_string(), design_system);

        info!(active = FULL_GRAPH, "Query engine initialized");
        Self {
            graphs,
            active: FULL_GRAPH.to_string(),
            state: ViewState::default(),
            camera: CameraState::DEFAULT,
            communities: BTreeMap::new(),
            components,
            community_palette: BTreeMap::new(),
            component_palette,
            bound_contours: BTreeSet::new(),
        }
    }

    pub fn active_graph_name(&self) -> &str {
        &self.active
    }

    pub fn graph(&self) -> &TokenGraph {
        &self.graphs[&self.active]
    }

    fn graph_checked(&self) -> Result<&TokenGraph, QueryError> {
        self.graphs
            .get(&self.active)
            .ok_or_else(|| QueryError::MissingGraphContext(self.active.clone()))
    }

    pub fn camera(&self) -> CameraState {
        self.camera
    }

    pub fn communities(&self) -> &BTreeMap<u32, CommunityInfo> {
        &self.communities
    }

    /// Communities large enough for the menu, with their palette colors.
    pub fn menu_communities(&self) -> Vec<(CommunityInfo, Option<String>)> {
        community::menu_communities(&self.communities)
            .into_iter()
            .map(|info| {
                let color = self.community_palette.get(&info.id.to_string()).cloned();
                (info, color)
            })
            .collect()
    }

    pub fn components(&self) -> &BTreeMap<String, Vec<String>> {
        &self.components
    }

    // ── Graph switching ────────────────────────────────────────────

    /// Switch the active graph. Resets all transient highlight state and
    /// unbinds any live contours.
    pub fn select_subgraph(&mut self, name: &str) -> Result<Vec<Effect>, QueryError> {
        if !self.graphs.contains_key(name) {
            return Err(QueryError::UnknownGraph(name.to_string()));
        }
        let mut effects: Vec<Effect> = self
            .bound_contours
            .iter()
            .map(|id| Effect::RemoveContour(id.clone()))
            .collect();
        self.bound_contours.clear();

        self.active = name.to_string();
        self.state = ViewState::default();
        self.communities.clear();
        self.community_palette.clear();
        self.components = component::component_groups(self.graph_checked()?);
        self.component_palette =
            categorical_palette(&self.components.keys().cloned().collect::<Vec<_>>());

        effects.push(Effect::ClearHighlight);
        effects.extend(self.camera_reset());
        debug!(graph = name, "Switched active graph");
        Ok(effects)
    }

    // ── Community detection ────────────────────────────────────────

    /// Run community detection over the active graph and refresh the
    /// summaries and palette.
    pub fn detect_communities(&mut self) -> Result<&BTreeMap<u32, CommunityInfo>, QueryError> {
        let active = self.active.clone();
        let graph = self
            .graphs
            .get_mut(&active)
            .ok_or_else(|| QueryError::MissingGraphContext(active.clone()))?;
        self.communities = community::assign_communities(graph);
        let ids: Vec<String> = self.communities.keys().map(u32::to_string).collect();
        self.community_palette = categorical_palette(&ids);
        Ok(&self.communities)
    }

    // ── Discovery ──────────────────────────────────────────────────

    /// Directed reachability from a start node, with the depth extension
    /// pulling opposite-direction neighbors of reached nodes in as extra
    /// BFS roots. Always contains the start; terminates on cycles.
    pub fn discover_nodes(
        &self,
        start: &str,
        direction: AncestryDirection,
        depth: u32,
    ) -> Result<BTreeSet<String>, QueryError> {
        let graph = self.graph_checked()?;
        if !graph.contains(start) {
            return Err(QueryError::UnknownNode(start.to_string()));
        }

        let mut discovered = BTreeSet::new();
        discovered.insert(start.to_string());
        if matches!(
            direction,
            AncestryDirection::Both | AncestryDirection::Descendants
        ) {
            directed_discovery(graph, start, Direction::Outgoing, depth, &mut discovered);
        }
        if matches!(
            direction,
            AncestryDirection::Both | AncestryDirection::Ascendants
        ) {
            directed_discovery(graph, start, Direction::Incoming, depth, &mut discovered);
        }
        Ok(discovered)
    }

    /// Build the highlight policy for an explicit node set.
    pub fn apply_highlight(&self, visible: BTreeSet<String>) -> HighlightPolicy {
        let emphasis = self
            .state
            .selected
            .as_ref()
            .filter(|selected| visible.contains(*selected))
            .cloned();
        HighlightPolicy::new(visible, emphasis, self.state.automatic_relayout)
    }

    // ── Selection ──────────────────────────────────────────────────

    /// Select a token (or clear the selection with `None`).
    pub fn select_token(&mut self, token: Option<String>) -> Result<(), QueryError> {
        if let Some(key) = &token {
            if !self.graph_checked()?.contains(key) {
                return Err(QueryError::UnknownNode(key.clone()));
            }
        }
        self.state.selected = token;
        Ok(())
    }

    /// Flip a component's membership in the active set.
    pub fn toggle_component(&mut self, selector: &str) -> Result<(), QueryError> {
        if !self.components.contains_key(selector) {
            return Err(QueryError::UnknownComponent(selector.to_string()));
        }
        if !self.state.active_components.remove(selector) {
            self.state.active_components.insert(selector.to_string());
        }
        Ok(())
    }

    /// Flip a community's membership in the active set.
    pub fn toggle_community(&mut self, id: u32) -> Result<(), QueryError> {
        if !self.communities.contains_key(&id) {
            return Err(QueryError::UnknownCommunity(id));
        }
        if !self.state.active_communities.remove(&id) {
            self.state.active_communities.insert(id);
        }
        Ok(())
    }

    // ── View update ────────────────────────────────────────────────

    /// Recompute the whole view after any state change: highlight policy
    /// (selection wins over component/community filters), camera, and
    /// contour reconciliation. Effects apply atomically, in order.
    pub fn refresh(&mut self) -> Result<Vec<Effect>, QueryError> {
        let mut effects = Vec::new();

        if let Some(selected) = self.state.selected.clone() {
            let visible = self.discover_nodes(
                &selected,
                self.state.ancestry_direction,
                self.state.ancestry_depth,
            )?;
            effects.push(Effect::SetHighlight(self.apply_highlight(visible)));
            if self.state.automatic_relayout {
                effects.push(Effect::Relayout);
            }
            effects.extend(self.focus(&selected)?);
        } else if !self.state.active_components.is_empty()
            || !self.state.active_communities.is_empty()
        {
            let mut visible = BTreeSet::new();
            for selector in self.state.active_components.clone() {
                let members = self.components.get(&selector).cloned().unwrap_or_default();
                for member in members {
                    visible.extend(self.discover_nodes(
                        &member,
                        self.state.ancestry_direction,
                        self.state.ancestry_depth,
                    )?);
                }
            }
            for &id in &self.state.active_communities {
                visible.extend(community::community_members(self.graph_checked()?, id));
            }
            effects.push(Effect::SetHighlight(self.apply_highlight(visible)));
            if self.state.automatic_relayout {
                effects.push(Effect::Relayout);
            }
        } else {
            effects.push(Effect::ClearHighlight);
            if self.state.automatic_relayout {
                effects.push(Effect::Relayout);
            }
            effects.extend(self.camera_reset());
        }

        effects.extend(self.reconcile_contours());
        Ok(effects)
    }

    /// Point the camera at a node: close zoom from the global view,
    /// pan-only otherwise.
    pub fn focus(&mut self, key: &str) -> Result<Vec<Effect>, QueryError> {
        if !self.graph_checked()?.contains(key) {
            return Err(QueryError::UnknownNode(key.to_string()));
        }
        let (x, y) = node_position(key);
        let at_global_view = self.camera.ratio == CameraState::DEFAULT.ratio
            && self.camera.angle == CameraState::DEFAULT.angle;
        let target = if at_global_view {
            CameraState {
                x,
                y,
                angle: 0.0,
                ratio: CameraState::FOCUS_RATIO,
            }
        } else {
            CameraState {
                x,
                y,
                angle: self.camera.angle,
                ratio: self.camera.ratio,
            }
        };
        if target == self.camera {
            return Ok(Vec::new());
        }
        self.camera = target;
        Ok(vec![Effect::Camera(CameraCommand::animate_to(target))])
    }

    fn camera_reset(&mut self) -> Vec<Effect> {
        if self.camera == CameraState::DEFAULT {
            return Vec::new();
        }
        self.camera = CameraState::DEFAULT;
        vec![Effect::Camera(CameraCommand::animate_to(
            CameraState::DEFAULT,
        ))]
    }

    /// Bind overlays for newly active ids and remove overlays whose id
    /// went inactive. At most one overlay per id.
    fn reconcile_contours(&mut self) -> Vec<Effect> {
        let mut effects = Vec::new();

        let mut wanted: BTreeMap<String, ContourOverlay> = BTreeMap::new();
        for selector in &self.state.active_components {
            if let Some(members) = self.components.get(selector) {
                let color = self
                    .component_palette
                    .get(selector)
                    .map_or("#ffffff", String::as_str);
                wanted.insert(
                    selector.clone(),
                    ContourOverlay::build(selector.clone(), members.clone(), color),
                );
            }
        }
        for &id in &self.state.active_communities {
            let key = id.to_string();
            let members = community::community_members(self.graph(), id);
            let color = self
                .community_palette
                .get(&key)
                .map_or("#ffffff", String::as_str);
            wanted.insert(key.clone(), ContourOverlay::build(key, members, color));
        }

        let stale: Vec<String> = self
            .bound_contours
            .iter()
            .filter(|id| !wanted.contains_key(*id))
            .cloned()
            .collect();
        for id in stale {
            self.bound_contours.remove(&id);
            effects.push(Effect::RemoveContour(id));
        }
        for (id, overlay) in wanted {
            if self.bound_contours.insert(id) {
                effects.push(Effect::BindContour(overlay));
            }
        }
        effects
    }
}

/// Worklist BFS in one direction, with up to `depth` rounds of pulling
/// opposite-direction neighbors of reached nodes in as new roots.
fn directed_discovery(
    graph: &TokenGraph,
    start: &str,
    forward: Direction,
    depth: u32,
    discovered: &mut BTreeSet<String>,
) {
    let backward = forward.opposite();
    let mut roots: VecDeque<(String, u32)> = VecDeque::from([(start.to_string(), 0)]);
    let mut rooted: HashSet<String> = HashSet::from([start.to_string()]);

    while let Some((root, level)) = roots.pop_front() {
        // Plain BFS along `forward` from this root
        let mut queue = VecDeque::from([root.clone()]);
        let mut visited: HashSet<String> = HashSet::from([root.clone()]);
        let mut reached = Vec::new();
        while let Some(node) = queue.pop_front() {
            discovered.insert(node.clone());
            reached.push(node.clone());
            for neighbor in graph.neighbors(&node, forward) {
                if visited.insert(neighbor.to_string()) {
                    queue.push_back(neighbor.to_string());
                }
            }
        }

        if level >= depth {
            continue;
        }
        // Depth extension: opposite-direction neighbors become new roots
        for node in reached {
            if node == root {
                continue;
            }
            for neighbor in graph.neighbors(&node, backward) {
                if !discovered.contains(neighbor) && rooted.insert(neighbor.to_string()) {
                    roots.push_back((neighbor.to_string(), level + 1));
                }
            }
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Declaration, DeclarationMap};

    fn decl(value: &str) -> Declaration {
        Declaration {
            value: value.to_string(),
            selector: ":root".to_string(),
            media: None,
        }
    }

    /// Cycle --a→--b→--c→--a plus isolated --d.
    fn cycle_engine() -> QueryEngine {
        let mut map = DeclarationMap::new();
        map.insert("--a".into(), vec![decl("var(--b)")]);
        map.insert("--b".into(), vec![decl("var(--c)")]);
        map.insert("--c".into(), vec![decl("var(--a)")]);
        map.insert("--d".into(), vec![decl("4px")]);
        QueryEngine::new(TokenGraph::build(FULL_GRAPH, &map).0)
    }

    fn set(keys: &[&str]) -> BTreeSet<String> {
        keys.iter().map(|k| (*k).to_string()).collect()
    }

    #[test]
    fn descendants_follow_the_cycle_and_terminate() {
        let engine = cycle_engine();
        let nodes = engine
            .discover_nodes("--a", AncestryDirection::Descendants, 0)
            .unwrap();
        assert_eq!(nodes, set(&["--a", "--b", "--c"]));
    }

    #[test]
    fn both_is_superset_of_each_direction() {
        let engine = cycle_engine();
        let both = engine
            .discover_nodes("--a", AncestryDirection::Both, 0)
            .unwrap();
        let down = engine
            .discover_nodes("--a", AncestryDirection::Descendants, 0)
            .unwrap();
        let up = engine
            .discover_nodes("--a", AncestryDirection::Ascendants, 0)
            .unwrap();
        assert!(both.is_superset(&down));
        assert!(both.is_superset(&up));
        assert!(both.contains("--a"));
    }

    #[test]
    fn isolated_node_discovers_only_itself() {
        let engine = cycle_engine();
        let nodes = engine
            .discover_nodes("--d", AncestryDirection::Both, 0)
            .unwrap();
        assert_eq!(nodes, set(&["--d"]));
    }

    #[test]
    fn unknown_start_fails_fast() {
        let engine = cycle_engine();
        assert!(matches!(
            engine.discover_nodes("--nope", AncestryDirection::Both, 0),
            Err(QueryError::UnknownNode(_))
        ));
    }

    #[test]
    fn depth_pulls_sibling_referrers_in() {
        // --a→--shared and --other→--shared: depth 1 from --a also
        // discovers --other via --shared's inbound side.
        let mut map = DeclarationMap::new();
        map.insert("--a".into(), vec![decl("var(--shared)")]);
        map.insert("--other".into(), vec![decl("var(--shared)")]);
        map.insert("--shared".into(), vec![decl("1px")]);
        let engine = QueryEngine::new(TokenGraph::build(FULL_GRAPH, &map).0);

        let shallow = engine
            .discover_nodes("--a", AncestryDirection::Descendants, 0)
            .unwrap();
        assert_eq!(shallow, set(&["--a", "--shared"]));

        let deep = engine
            .discover_nodes("--a", AncestryDirection::Descendants, 1)
            .unwrap();
        assert_eq!(deep, set(&["--a", "--shared", "--other"]));
    }

    #[test]
    fn selection_refresh_highlights_and_focuses() {
        let mut engine = cycle_engine();
        engine.select_token(Some("--a".into())).unwrap();
        let effects = engine.refresh().unwrap();

        let policy = effects
            .iter()
            .find_map(|effect| match effect {
                Effect::SetHighlight(policy) => Some(policy),
                _ => None,
            })
            .expect("selection emits a policy");
        assert_eq!(policy.emphasis.as_deref(), Some("--a"));
        assert!(policy.visible.contains("--b"));
        assert!(!policy.visible.contains("--d"));

        let camera = effects.iter().find_map(|effect| match effect {
            Effect::Camera(command) => Some(command),
            _ => None,
        });
        let command = camera.expect("selection moves the camera");
        assert!((command.target.ratio - CameraState::FOCUS_RATIO).abs() < f64::EPSILON);
    }

    #[test]
    fn focus_pans_without_rezoom_when_already_zoomed() {
        let mut engine = cycle_engine();
        engine.focus("--a").unwrap(); // zooms to 0.1
        let effects = engine.focus("--b").unwrap();
        let Effect::Camera(command) = &effects[0] else {
            panic!("expected camera effect");
        };
        assert!((command.target.ratio - CameraState::FOCUS_RATIO).abs() < f64::EPSILON);
        let (x, y) = node_position("--b");
        assert!((command.target.x - x).abs() < f64::EPSILON);
        assert!((command.target.y - y).abs() < f64::EPSILON);
    }

    #[test]
    fn clearing_selection_returns_camera_to_default() {
        let mut engine = cycle_engine();
        engine.select_token(Some("--a".into())).unwrap();
        engine.refresh().unwrap();
        engine.select_token(None).unwrap();
        let effects = engine.refresh().unwrap();

        assert!(effects.contains(&Effect::ClearHighlight));
        let command = effects
            .iter()
            .find_map(|effect| match effect {
                Effect::Camera(command) => Some(command),
                _ => None,
            })
            .expect("reset animates the camera home");
        assert_eq!(command.target, CameraState::DEFAULT);
    }

    #[test]
    fn selecting_unknown_token_fails() {
        let mut engine = cycle_engine();
        assert!(matches!(
            engine.select_token(Some("--missing".into())),
            Err(QueryError::UnknownNode(_))
        ));
    }

    #[test]
    fn community_contour_binds_once_and_unbinds() {
        let mut engine = cycle_engine();
        engine.detect_communities().unwrap();
        let id = *engine.communities().keys().next().unwrap();

        engine.toggle_community(id).unwrap();
        let effects = engine.refresh().unwrap();
        let bound: Vec<_> = effects
            .iter()
            .filter(|effect| matches!(effect, Effect::BindContour(_)))
            .collect();
        assert_eq!(bound.len(), 1);

        // Refreshing again does not rebind
        let effects = engine.refresh().unwrap();
        assert!(!effects.iter().any(|e| matches!(e, Effect::BindContour(_))));

        // Second toggle removes the overlay
        engine.toggle_community(id).unwrap();
        let effects = engine.refresh().unwrap();
        assert!(effects.contains(&Effect::RemoveContour(id.to_string())));
    }

    #[test]
    fn unknown_community_toggle_fails() {
        let mut engine = cycle_engine();
        assert!(matches!(
            engine.toggle_community(99),
            Err(QueryError::UnknownCommunity(99))
        ));
    }

    #[test]
    fn selection_takes_precedence_over_filters() {
        let mut map = DeclarationMap::new();
        map.insert(
            "--dsa-button--color".into(),
            vec![Declaration {
                value: "var(--base)".into(),
                selector: ".dsa-button".into(),
                media: None,
            }],
        );
        map.insert("--base".into(), vec![decl("red")]);
        map.insert("--lone".into(), vec![decl("1px")]);
        let mut engine = QueryEngine::new(TokenGraph::build(FULL_GRAPH, &map).0);

        engine.toggle_component(".dsa-button").unwrap();
        engine.select_token(Some("--lone".into())).unwrap();
        let effects = engine.refresh().unwrap();
        let policy = effects
            .iter()
            .find_map(|effect| match effect {
                Effect::SetHighlight(policy) => Some(policy),
                _ => None,
            })
            .unwrap();
        // The selection's reachable set, not the component's
        assert_eq!(policy.emphasis.as_deref(), Some("--lone"));
        assert!(!policy.visible.contains("--dsa-button--color"));
    }

    #[test]
    fn component_filter_highlights_member_reach() {
        let mut map = DeclarationMap::new();
        map.insert(
            "--dsa-button--color".into(),
            vec![Declaration {
                value: "var(--base)".into(),
                selector: ".dsa-button".into(),
                media: None,
            }],
        );
        map.insert("--base".into(), vec![decl("red")]);
        map.insert("--lone".into(), vec![decl("1px")]);
        let mut engine = QueryEngine::new(TokenGraph::build(FULL_GRAPH, &map).0);

        engine.toggle_component(".dsa-button").unwrap();
        let effects = engine.refresh().unwrap();
        let policy = effects
            .iter()
            .find_map(|effect| match effect {
                Effect::SetHighlight(policy) => Some(policy),
                _ => None,
            })
            .unwrap();
        assert!(policy.visible.contains("--dsa-button--color"));
        assert!(policy.visible.contains("--base"));
        assert!(!policy.visible.contains("--lone"));
        assert_eq!(policy.emphasis, None);

        // And the contour came up alongside
        assert!(effects.iter().any(|e| matches!(e, Effect::BindContour(_))));
    }

    #[test]
    fn switching_graphs_resets_transient_state() {
        let mut map = DeclarationMap::new();
        map.insert("--dsa-x".into(), vec![decl("var(--y)")]);
        map.insert("--y".into(), vec![decl("1px")]);
        map.insert("--unrelated".into(), vec![decl("2px")]);
        let mut engine = QueryEngine::new(TokenGraph::build(FULL_GRAPH, &map).0);

        engine.select_token(Some("--unrelated".into())).unwrap();
        engine.refresh().unwrap();

        let effects = engine.select_subgraph(DESIGN_SYSTEM_GRAPH).unwrap();
        assert!(effects.contains(&Effect::ClearHighlight));
        assert_eq!(engine.state.selected, None);
        assert_eq!(engine.active_graph_name(), DESIGN_SYSTEM_GRAPH);
        // --unrelated was dropped from the reduced graph
        assert!(!engine.graph().contains("--unrelated"));
        assert!(engine.graph().contains("--dsa-x"));
    }

    #[test]
    fn unknown_graph_name_fails() {
        let mut engine = cycle_engine();
        assert!(matches!(
            engine.select_subgraph("partial"),
            Err(QueryError::UnknownGraph(_))
        ));
    }

    #[test]
    fn detect_communities_is_deterministic_per_graph() {
        let mut a = cycle_engine();
        let mut b = cycle_engine();
        assert_eq!(
            a.detect_communities().unwrap(),
            b.detect_communities().unwrap()
        );
    }

    #[test]
    fn highlight_policy_respects_relayout_flag() {
        let mut engine = cycle_engine();
        engine.state.automatic_relayout = true;
        engine.select_token(Some("--a".into())).unwrap();
        let effects = engine.refresh().unwrap();
        assert!(effects.contains(&Effect::Relayout));
        let policy = effects
            .iter()
            .find_map(|effect| match effect {
                Effect::SetHighlight(policy) => Some(policy),
                _ => None,
            })
            .unwrap();
        assert!(policy.node_style("--d").hidden);
    }
}
