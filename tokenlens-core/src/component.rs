// Connected components, the design-system subgraph, and the `.dsa-`
// component grouping used for contour overlays.

use std::collections::{BTreeMap, HashSet, VecDeque};
use std::sync::LazyLock;

use petgraph::graph::NodeIndex;
use regex::Regex;
use tracing::info;

use crate::graph::TokenGraph;

/// Design-token prefixes that anchor a component in the design-system
/// subgraph.
pub const DESIGN_PREFIXES: [&str; 3] = ["--c-", "--l-", "--dsa-"];

/// Leading `--dsa-<component-name>` of a token key.
static DSA_COMPONENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"--dsa-((?:[a-zA-Z]+-)*[a-zA-Z]+)").expect("valid regex"));

/// Weakly-connected components: edge direction ignored. Components and
/// their members come out in node insertion order.
pub fn weakly_connected_components(graph: &TokenGraph) -> Vec<Vec<String>> {
    let mut visited: HashSet<NodeIndex> = HashSet::new();
    let mut components = Vec::new();

    for start in graph.graph.node_indices() {
        if visited.contains(&start) {
            continue;
        }
        let mut component = Vec::new();
        let mut queue = VecDeque::from([start]);
        visited.insert(start);
        while let Some(index) = queue.pop_front() {
            component.push(graph.graph[index].key.clone());
            for neighbor in graph.graph.neighbors_undirected(index) {
                if visited.insert(neighbor) {
                    queue.push_back(neighbor);
                }
            }
        }
        components.push(component);
    }
    components
}

/// Reduce a graph to the components that contain at least one
/// design-prefixed node. Pure: the input graph is untouched.
pub fn design_system_subgraph(graph: &TokenGraph) -> TokenGraph {
    let mut retained: HashSet<String> = HashSet::new();
    for component in weakly_connected_components(graph) {
        let anchored = component
            .iter()
            .any(|key| DESIGN_PREFIXES.iter().any(|prefix| key.starts_with(prefix)));
        if anchored {
            retained.extend(component);
        }
    }

    let mut subgraph = TokenGraph::new("design-system");
    for index in graph.graph.node_indices() {
        let node = &graph.graph[index];
        if retained.contains(&node.key) {
            let new_index = subgraph.graph.add_node(node.clone());
            subgraph.indices.insert(node.key.clone(), new_index);
        }
    }
    for (source, target, edge) in graph.edges() {
        if let (Some(&s), Some(&t)) = (subgraph.indices.get(source), subgraph.indices.get(target))
        {
            subgraph.graph.add_edge(s, t, edge.clone());
        }
    }

    info!(
        nodes = subgraph.node_count(),
        edges = subgraph.edge_count(),
        dropped = graph.node_count() - subgraph.node_count(),
        "Computed design-system subgraph"
    );
    subgraph
}

/// Group nodes by UI component: a `--dsa-<name>…` token belongs to
/// `.dsa-<name>` when one of its declaration selectors starts with that
/// class.
pub fn component_groups(graph: &TokenGraph) -> BTreeMap<String, Vec<String>> {
    let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for index in graph.graph.node_indices() {
        let node = &graph.graph[index];
        let Some(captures) = DSA_COMPONENT.captures(&node.key) else {
            continue;
        };
        let class = format!(".dsa-{}", &captures[1]);
        let declared_under_class = node
            .declarations
            .iter()
            .any(|declaration| declaration.selector.starts_with(&class));
        if declared_under_class {
            groups.entry(class).or_default().push(node.key.clone());
        }
    }
    groups
}

/// Display name for a component selector: `.dsa-content-box` → `Content
/// Box`.
pub fn component_display_name(selector: &str) -> String {
    selector
        .trim_start_matches(".dsa-")
        .split('-')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

// ── Tests ──────────────────────────────────────────────────────────
