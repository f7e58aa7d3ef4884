//! Power iteration over the stored link graph

use crate::config::RankSettings;
use crate::storage::LinkGraph;
use std::collections::{BTreeMap, BTreeSet};

/// Parameters of the authority computation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankConfig {
    /// Probability of following a link rather than teleporting
    pub damping: f64,

    /// L1 change between iterations below which the result is accepted
    pub tolerance: f64,

    pub max_iterations: u32,
}

impl Default for RankConfig {
    fn default() -> Self {
        Self {
            damping: 0.85,
            tolerance: 1e-10,
            max_iterations: 1000,
        }
    }
}

impl From<&RankSettings> for RankConfig {
    fn from(settings: &RankSettings) -> Self {
        Self {
            damping: settings.damping,
            tolerance: settings.tolerance,
            max_iterations: settings.max_iterations,
        }
    }
}

/// Computes the stationary distribution of a damped random walk over `graph`
///
/// Nodes are every link-record key plus every link target. A node with no
/// out-links spreads its mass uniformly over all nodes. The returned scores sum
/// to 1; an empty graph yields an empty map.
pub fn compute_authority(graph: &LinkGraph, config: &RankConfig) -> BTreeMap<String, f64> {
    let nodes: BTreeSet<&str> = graph
        .iter()
        .flat_map(|(from, targets)| {
            std::iter::once(from.as_str()).chain(targets.iter().map(String::as_str))
        })
        .collect();

    let n = nodes.len();
    if n == 0 {
        return BTreeMap::new();
    }

    let position: BTreeMap<&str, usize> = nodes.iter().enumerate().map(|(i, &u)| (u, i)).collect();

    // Out-links by node position; empty for dangling nodes
    let mut out_links: Vec<Vec<usize>> = vec![Vec::new(); n];
    for (from, targets) in graph {
        let i = position[from.as_str()];
        out_links[i] = targets.iter().map(|t| position[t.as_str()]).collect();
    }

    let size = n as f64;
    let alpha = config.damping;
    let mut ranks = vec![1.0 / size; n];
    let mut iterations = 0;

    while iterations < config.max_iterations {
        iterations += 1;

        let dangling: f64 = out_links
            .iter()
            .zip(&ranks)
            .filter(|(links, _)| links.is_empty())
            .map(|(_, r)| r)
            .sum();

        let base = (1.0 - alpha) / size + alpha * dangling / size;
        let mut next = vec![base; n];

        for (i, links) in out_links.iter().enumerate() {
            if links.is_empty() {
                continue;
            }
            let share = alpha * ranks[i] / links.len() as f64;
            for &j in links {
                next[j] += share;
            }
        }

        let change: f64 = next.iter().zip(&ranks).map(|(a, b)| (a - b).abs()).sum();
        ranks = next;

        if change < config.tolerance {
            break;
        }
    }

    tracing::debug!("Authority converged over {} nodes in {} iterations", n, iterations);

    let total: f64 = ranks.iter().sum();
    nodes
        .into_iter()
        .zip(ranks)
        .map(|(url, r)| (url.to_string(), if total > 0.0 { r / total } else { r }))
        .collect()
}
