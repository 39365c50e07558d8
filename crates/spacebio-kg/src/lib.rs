//! spacebio-kg: Keyword bucketing and graph views over the paper corpus.
//!
//! Papers are bucketed by organism, research area and environment with
//! ordered substring tests. The buckets feed two graph views: a category
//! graph (papers around their bucket) and a knowledge graph (papers linked
//! to areas, organisms and to each other by keyword overlap). A
//! Fruchterman–Reingold pass lays either graph out in a fixed box.

pub mod classify;
pub mod graph;
pub mod layout;

pub use classify::{classify, extract_keywords, Dimension, UnknownDimension};
pub use graph::{build_category_graph, build_knowledge_graph, Edge, EdgeKind, Graph, KnowledgeGraphOptions, Node, NodeKind};
pub use layout::{apply_layout, LayoutConfig};
