// SPDX-FileCopyrightText: 2026 Filewise Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! File relationship graph.
//!
//! Nodes track how often and how recently a file was accessed; their
//! importance uses the same frequency/recency blend as access patterns.
//! Directed edges carry a relationship kind and a weight that is averaged,
//! not summed, each time the same edge is asserted again.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tokio::sync::RwLock;

use crate::decay::{average_weight, pattern_confidence};

/// Why two files are related.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EdgeKind {
    /// Accessed one after the other.
    Sequence,
    /// Close in embedding space.
    Similar,
    /// One depends on the other.
    Dependency,
    /// Live in the same project directory.
    Project,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileNode {
    pub path: String,
    pub access_count: u64,
    pub last_access: DateTime<Utc>,
}

impl FileNode {
    pub fn importance_at(&self, now: DateTime<Utc>) -> f64 {
        pattern_confidence(self.access_count, self.last_access, now)
    }
}

/// An outgoing edge as seen from its source node.
#[derive(Debug, Clone, PartialEq)]
pub struct Neighbor {
    pub path: String,
    pub kind: EdgeKind,
    pub weight: f64,
}

#[derive(Debug, Default)]
struct Graph {
    nodes: HashMap<String, FileNode>,
    edges: HashMap<String, HashMap<(String, EdgeKind), f64>>,
}

#[derive(Debug, Default)]
pub struct FileGraph {
    inner: RwLock<Graph>,
}

impl FileGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an access to `path`, creating the node if needed.
    pub async fn touch(&self, path: &str, at: DateTime<Utc>) {
        let mut graph = self.inner.write().await;
        graph
            .nodes
            .entry(path.to_string())
            .and_modify(|node| {
                node.access_count += 1;
                node.last_access = node.last_access.max(at);
            })
            .or_insert_with(|| FileNode {
                path: path.to_string(),
                access_count: 1,
                last_access: at,
            });
    }

    /// Asserts a directed edge. Self-loops are ignored. Returns the
    /// resulting weight.
    pub async fn assert_edge(&self, from: &str, to: &str, kind: EdgeKind, weight: f64) -> f64 {
        if from == to {
            return 0.0;
        }
        let weight = weight.clamp(0.0, 1.0);
        let mut graph = self.inner.write().await;
        let slot = graph
            .edges
            .entry(from.to_string())
            .or_default()
            .entry((to.to_string(), kind))
            .and_modify(|w| *w = average_weight(*w, weight))
            .or_insert(weight);
        *slot
    }

    /// Outgoing edges of `path`, heaviest first. Ties keep a stable
    /// path/kind order.
    pub async fn neighbors(&self, path: &str) -> Vec<Neighbor> {
        let graph = self.inner.read().await;
        let mut neighbors: Vec<Neighbor> = graph
            .edges
            .get(path)
            .map(|out| {
                out.iter()
                    .map(|((to, kind), weight)| Neighbor {
                        path: to.clone(),
                        kind: *kind,
                        weight: *weight,
                    })
                    .collect()
            })
            .unwrap_or_default();
        neighbors.sort_by(|a, b| {
            b.weight
                .total_cmp(&a.weight)
                .then_with(|| a.path.cmp(&b.path))
                .then_with(|| a.kind.cmp(&b.kind))
        });
        neighbors
    }

    pub async fn node(&self, path: &str) -> Option<FileNode> {
        self.inner.read().await.nodes.get(path).cloned()
    }

    /// Importance of `path` at `now`, or 0 for unknown files.
    pub async fn importance(&self, path: &str, now: DateTime<Utc>) -> f64 {
        self.node(path)
            .await
            .map_or(0.0, |node| node.importance_at(now))
    }

    /// Drops every node and edge touching a path `keep` rejects. Returns
    /// the number of paths removed.
    pub async fn retain_paths(&self, keep: impl Fn(&str) -> bool) -> usize {
        let mut graph = self.inner.write().await;
        let mut dropped: HashSet<String> = graph
            .nodes
            .keys()
            .chain(graph.edges.keys())
            .filter(|path| !keep(path.as_str()))
            .cloned()
            .collect();
        graph.nodes.retain(|path, _| !dropped.contains(path));
        graph.edges.retain(|path, _| !dropped.contains(path));
        for out in graph.edges.values_mut() {
            out.retain(|(to, _), _| {
                if keep(to.as_str()) {
                    true
                } else {
                    dropped.insert(to.clone());
                    false
                }
            });
        }
        graph.edges.retain(|_, out| !out.is_empty());
        dropped.len()
    }

    pub async fn node_count(&self) -> usize {
        self.inner.read().await.nodes.len()
    }

    pub async fn edge_count(&self) -> usize {
        self.inner
            .read()
            .await
            .edges
            .values()
            .map(HashMap::len)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    #[tokio::test]
    async fn reasserted_edge_is_averaged() {
        let graph = FileGraph::new();
        assert_eq!(graph.assert_edge("a", "b", EdgeKind::Sequence, 1.0).await, 1.0);
        assert_eq!(graph.assert_edge("a", "b", EdgeKind::Sequence, 0.0).await, 0.5);
        assert_eq!(graph.assert_edge("a", "b", EdgeKind::Similar, 0.25).await, 0.25);
        assert_eq!(graph.edge_count().await, 2);
    }

    #[tokio::test]
    async fn self_loops_are_ignored() {
        let graph = FileGraph::new();
        graph.assert_edge("a", "a", EdgeKind::Project, 1.0).await;
        assert_eq!(graph.edge_count().await, 0);
    }

    #[tokio::test]
    async fn neighbors_sorted_by_weight() {
        let graph = FileGraph::new();
        graph.assert_edge("a", "b", EdgeKind::Sequence, 0.2).await;
        graph.assert_edge("a", "c", EdgeKind::Project, 0.9).await;
        graph.assert_edge("b", "a", EdgeKind::Sequence, 1.0).await;
        let paths: Vec<_> = graph
            .neighbors("a")
            .await
            .into_iter()
            .map(|n| n.path)
            .collect();
        assert_eq!(paths, ["c", "b"]);
        assert!(graph.neighbors("zzz").await.is_empty());
    }

    #[tokio::test]
    async fn retain_paths_drops_nodes_and_edges_both_ways() {
        let graph = FileGraph::new();
        let now = Utc::now();
        for path in ["a", "b", "c"] {
            graph.touch(path, now).await;
        }
        graph.assert_edge("a", "b", EdgeKind::Sequence, 0.5).await;
        graph.assert_edge("b", "a", EdgeKind::Project, 0.5).await;
        graph.assert_edge("c", "b", EdgeKind::Similar, 0.9).await;
        graph.assert_edge("c", "a", EdgeKind::Similar, 0.7).await;

        let removed = graph.retain_paths(|path| path != "b").await;
        assert_eq!(removed, 1);
        assert_eq!(graph.node_count().await, 2);
        assert!(graph.node("b").await.is_none());
        assert!(graph.neighbors("a").await.is_empty());
        let from_c: Vec<_> = graph.neighbors("c").await.into_iter().map(|n| n.path).collect();
        assert_eq!(from_c, ["a"]);
        assert_eq!(graph.edge_count().await, 1);
    }

    #[tokio::test]
    async fn importance_grows_with_access_and_decays_with_time() {
        let graph = FileGraph::new();
        let now = Utc::now();
        graph.touch("a", now).await;
        let once = graph.importance("a", now).await;
        graph.touch("a", now).await;
        let twice = graph.importance("a", now).await;
        assert!(twice > once);
        assert!(graph.importance("a", now + TimeDelta::days(3)).await < twice);
        assert_eq!(graph.importance("missing", now).await, 0.0);
        assert_eq!(graph.node("a").await.map(|n| n.access_count), Some(2));
    }
}
