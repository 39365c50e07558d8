//! Category and knowledge graph construction.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use spacebio_common::Paper;
use tracing::debug;

use crate::classify::{classify, extract_keywords, Dimension};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Paper,
    Category,
    Area,
    Organism,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    Category,
    Area,
    Organism,
    Similar,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub label: String,
    pub kind: NodeKind,
    /// Paper count for bucket nodes, 1 for papers.
    pub size: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paper_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
}

impl Node {
    fn paper(paper: &Paper) -> Self {
        Self {
            id: paper_node_id(&paper.id),
            label: paper.title.clone(),
            kind: NodeKind::Paper,
            size: 1,
            paper_id: Some(paper.id.clone()),
            x: None,
            y: None,
        }
    }

    fn bucket(kind: NodeKind, label: &str, size: usize) -> Self {
        Self {
            id: bucket_node_id(kind, label),
            label: label.to_string(),
            kind,
            size,
            paper_id: None,
            x: None,
            y: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub source: String,
    pub target: String,
    pub kind: EdgeKind,
    pub weight: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl Graph {
    /// Edges as node index pairs. Edges naming unknown nodes are dropped.
    pub fn edge_indices(&self) -> Vec<(usize, usize)> {
        let index: BTreeMap<&str, usize> = self
            .nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id.as_str(), i))
            .collect();
        self.edges
            .iter()
            .filter_map(|e| Some((*index.get(e.source.as_str())?, *index.get(e.target.as_str())?)))
            .collect()
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }
}

pub fn paper_node_id(paper_id: &str) -> String {
    format!("paper:{paper_id}")
}

fn bucket_node_id(kind: NodeKind, label: &str) -> String {
    let prefix = match kind {
        NodeKind::Paper => "paper",
        NodeKind::Category => "category",
        NodeKind::Area => "area",
        NodeKind::Organism => "organism",
    };
    format!("{prefix}:{label}")
}

/// Bucket label → member papers, in the dimension's bucket order.
fn group_by_bucket<'a>(papers: &'a [Paper], dimension: Dimension) -> Vec<(&'static str, Vec<&'a Paper>)> {
    let labels: Vec<&'static str> = papers.iter().map(|p| classify(p, dimension)).collect();
    dimension
        .buckets()
        .into_iter()
        .filter_map(|bucket| {
            let members: Vec<&Paper> = papers
                .iter()
                .zip(&labels)
                .filter(|(_, l)| **l == bucket)
                .map(|(p, _)| p)
                .collect();
            (!members.is_empty()).then_some((bucket, members))
        })
        .collect()
}

// ── Category graph ────────────────────────────────────────────────────────────

/// One node per non-empty bucket, one per paper, paper → bucket edges.
pub fn build_category_graph(papers: &[Paper], dimension: Dimension) -> Graph {
    let groups = group_by_bucket(papers, dimension);
    let mut graph = Graph::default();

    for (bucket, members) in &groups {
        graph.nodes.push(Node::bucket(NodeKind::Category, bucket, members.len()));
    }
    for (bucket, members) in &groups {
        let target = bucket_node_id(NodeKind::Category, bucket);
        for paper in members {
            graph.nodes.push(Node::paper(paper));
            graph.edges.push(Edge {
                source: paper_node_id(&paper.id),
                target: target.clone(),
                kind: EdgeKind::Category,
                weight: 1.0,
            });
        }
    }
    debug!(%dimension, buckets = groups.len(), papers = papers.len(), "Built category graph");
    graph
}

// ── Knowledge graph ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct KnowledgeGraphOptions {
    /// Minimum Jaccard similarity for a paper ↔ paper link.
    pub similarity_threshold: f64,
    pub max_links_per_paper: usize,
}

impl Default for KnowledgeGraphOptions {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.3,
            max_links_per_paper: 5,
        }
    }
}

/// |a ∩ b| / |a ∪ b|, 0 when both are empty.
pub fn jaccard<T: Ord>(a: &BTreeSet<T>, b: &BTreeSet<T>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f64 / union as f64
}

pub fn build_knowledge_graph(papers: &[Paper], options: &KnowledgeGraphOptions) -> Graph {
    let mut graph = Graph::default();

    for paper in papers {
        graph.nodes.push(Node::paper(paper));
    }
    for (dimension, kind, edge_kind) in [
        (Dimension::Area, NodeKind::Area, EdgeKind::Area),
        (Dimension::Organism, NodeKind::Organism, EdgeKind::Organism),
    ] {
        for (bucket, members) in group_by_bucket(papers, dimension) {
            graph.nodes.push(Node::bucket(kind, bucket, members.len()));
            let target = bucket_node_id(kind, bucket);
            for paper in members {
                graph.edges.push(Edge {
                    source: paper_node_id(&paper.id),
                    target: target.clone(),
                    kind: edge_kind,
                    weight: 1.0,
                });
            }
        }
    }

    let links = similarity_links(papers, options);
    debug!(papers = papers.len(), links = links.len(), "Built knowledge graph");
    for (i, j, sim) in links {
        graph.edges.push(Edge {
            source: paper_node_id(&papers[i].id),
            target: paper_node_id(&papers[j].id),
            kind: EdgeKind::Similar,
            weight: sim,
        });
    }
    graph
}

/// Paper pairs at or above the threshold, strongest first, with each paper
/// taking part in at most `max_links_per_paper` links.
fn similarity_links(papers: &[Paper], options: &KnowledgeGraphOptions) -> Vec<(usize, usize, f64)> {
    let keywords: Vec<BTreeSet<&'static str>> = papers.iter().map(extract_keywords).collect();

    let mut candidates = Vec::new();
    for i in 0..papers.len() {
        for j in (i + 1)..papers.len() {
            let sim = jaccard(&keywords[i], &keywords[j]);
            if sim > 0.0 && sim >= options.similarity_threshold {
                candidates.push((i, j, sim));
            }
        }
    }
    candidates.sort_by(|a, b| {
        b.2.partial_cmp(&a.2)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| (a.0, a.1).cmp(&(b.0, b.1)))
    });

    let mut degree = vec![0usize; papers.len()];
    candidates
        .into_iter()
        .filter(|&(i, j, _)| {
            if degree[i] >= options.max_links_per_paper || degree[j] >= options.max_links_per_paper {
                return false;
            }
            degree[i] += 1;
            degree[j] += 1;
            true
        })
        .collect()
}
