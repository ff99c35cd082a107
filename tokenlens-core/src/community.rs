// Community detection (Louvain) over the reference graph.
//
// Graph algorithms intentionally cast int↔float.
#![allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_lossless
)]

use std::collections::{BTreeMap, HashMap};

use petgraph::graph::NodeIndex;
use tracing::info;

use crate::graph::TokenGraph;

/// Communities below this size stay out of the user-facing menu and
/// palette, but keep their assigned id.
pub const MENU_MIN_MEMBERS: usize = 26;

/// Summary of one detected community.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommunityInfo {
    pub id: u32,
    pub name: String,
    pub count: usize,
}

/// Louvain community detection on the reference graph, treated as
/// undirected with unit edge weights (parallel edges accumulate).
///
/// Deterministic for a fixed graph: nodes are visited in index order and
/// candidate communities in ascending id, so ties always break the same
/// way.
pub fn louvain_partition(graph: &TokenGraph) -> HashMap<NodeIndex, u32> {
    let n = graph.node_count();
    if n == 0 {
        return HashMap::new();
    }

    // Undirected adjacency
    let mut adj: Vec<Vec<(usize, f64)>> = vec![Vec::new(); n];
    let mut total_weight = 0.0_f64;
    for edge in graph.graph.edge_indices() {
        if let Some((source, target)) = graph.graph.edge_endpoints(edge) {
            adj[source.index()].push((target.index(), 1.0));
            adj[target.index()].push((source.index(), 1.0));
            total_weight += 1.0;
        }
    }

    // No edges — each node is its own community
    if total_weight == 0.0 {
        return graph
            .graph
            .node_indices()
            .enumerate()
            .map(|(i, index)| (index, i as u32))
            .collect();
    }

    // Initialize: each node in its own community
    let mut community: Vec<u32> = (0..n).map(|i| i as u32).collect();

    // Node weights (sum of incident edge weights) and community totals
    let mut node_weight: Vec<f64> = vec![0.0; n];
    for (node, neighbors) in adj.iter().enumerate() {
        for &(_, weight) in neighbors {
            node_weight[node] += weight;
        }
    }
    let mut comm_total: Vec<f64> = node_weight.clone();

    // Phase 1: local moves
    let mut improved = true;
    let mut iterations = 0;
    let max_iterations = 20;

    while improved && iterations < max_iterations {
        improved = false;
        iterations += 1;

        for node in 0..n {
            let current_comm = community[node];

            // Weights to each neighboring community, in ascending id order
            let mut comm_weights: BTreeMap<u32, f64> = BTreeMap::new();
            for &(neighbor, weight) in &adj[node] {
                *comm_weights.entry(community[neighbor]).or_default() += weight;
            }

            let ki = node_weight[node];
            let m2 = 2.0 * total_weight;

            let ki_in_current = comm_weights.get(&current_comm).copied().unwrap_or(0.0);
            let sigma_current = comm_total[current_comm as usize];

            let mut best_gain = 0.0_f64;
            let mut best_comm = current_comm;

            for (&target_comm, &ki_in_target) in &comm_weights {
                if target_comm == current_comm {
                    continue;
                }

                let sigma_target = comm_total[target_comm as usize];

                // Modularity gain of moving `node` into `target_comm`
                let gain = (ki_in_target - ki_in_current) / m2
                    + ki * ((sigma_current - ki) - sigma_target) / (m2 * m2) * 2.0;

                if gain > best_gain {
                    best_gain = gain;
                    best_comm = target_comm;
                }
            }

            if best_comm != current_comm {
                comm_total[current_comm as usize] -= ki;
                comm_total[best_comm as usize] += ki;
                community[node] = best_comm;
                improved = true;
            }
        }
    }

    // Renumber communities to be contiguous from 0
    let mut remap: HashMap<u32, u32> = HashMap::new();
    let mut next_id = 0u32;
    for c in &mut community {
        let new_id = *remap.entry(*c).or_insert_with(|| {
            let id = next_id;
            next_id += 1;
            id
        });
        *c = new_id;
    }

    graph
        .graph
        .node_indices()
        .map(|index| (index, community[index.index()]))
        .collect()
}

/// Run detection and write community ids onto every node that has at
/// least one edge. Returns per-community summaries keyed by id.
pub fn assign_communities(graph: &mut TokenGraph) -> BTreeMap<u32, CommunityInfo> {
    let partition = louvain_partition(graph);

    // Isolated nodes get no id and must not consume one, so the ids seen
    // by callers stay dense from 0.
    let mut remap: HashMap<u32, u32> = HashMap::new();
    let mut next_id = 0u32;
    let mut members: BTreeMap<u32, Vec<String>> = BTreeMap::new();
    for index in graph.graph.node_indices() {
        let connected = graph
            .graph
            .neighbors_undirected(index)
            .next()
            .is_some();
        if !connected {
            graph.graph[index].community = None;
            continue;
        }
        let id = *remap.entry(partition[&index]).or_insert_with(|| {
            let id = next_id;
            next_id += 1;
            id
        });
        graph.graph[index].community = Some(id);
        members
            .entry(id)
            .or_default()
            .push(graph.graph[index].key.clone());
    }

    let summaries: BTreeMap<u32, CommunityInfo> = members
        .into_iter()
        .map(|(id, keys)| {
            (
                id,
                CommunityInfo {
                    id,
                    name: community_name(&keys),
                    count: keys.len(),
                },
            )
        })
        .collect();

    info!(
        graph = %graph.name,
        communities = summaries.len(),
        "Community detection complete"
    );
    summaries
}

/// Communities large enough for the menu/palette, ascending by id.
pub fn menu_communities(summaries: &BTreeMap<u32, CommunityInfo>) -> Vec<CommunityInfo> {
    summaries
        .values()
        .filter(|community| community.count >= MENU_MIN_MEMBERS)
        .cloned()
        .collect()
}

/// Keys of the nodes assigned to a community, in insertion order.
pub fn community_members(graph: &TokenGraph, id: u32) -> Vec<String> {
    graph
        .graph
        .node_indices()
        .filter(|&index| graph.graph[index].community == Some(id))
        .map(|index| graph.graph[index].key.clone())
        .collect()
}

/// Human-readable community name: the three most frequent words across
/// member keys, `/`-joined.
pub fn community_name(keys: &[String]) -> String {
    let mut order: Vec<(String, usize)> = Vec::new();
    let mut slots: HashMap<String, usize> = HashMap::new();

    for key in keys {
        let cleaned: String = key
            .chars()
            .map(|c| match c {
                '-' | '_' | '.' => ' ',
                c if c.is_ascii_digit() => ' ',
                c => c,
            })
            .collect();
        for word in cleaned.split_whitespace() {
            match slots.get(word) {
                Some(&slot) => order[slot].1 += 1,
                None => {
                    slots.insert(word.to_string(), order.len());
                    order.push((word.to_string(), 1));
                }
            }
        }
    }

    // Stable sort: count descending, first-seen order breaking ties
    order.sort_by(|a, b| b.1.cmp(&a.1));
    order
        .into_iter()
        .take(3)
        .map(|(word, _)| word)
        .collect::<Vec<_>>()
        .join("/")
}

// ── Tests ──────────────────────────────────────────────────────────
