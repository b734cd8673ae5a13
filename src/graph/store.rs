//! Lookup contract against the knowledge store, plus an in-memory
//! implementation backing the demo page and the tests.

use std::collections::HashMap;

use thiserror::Error;

use super::types::{EdgeKind, KnowledgeEdge, KnowledgeNode, NodeId, NodeKind};

/// Maximum number of rows a label search returns.
pub const SEARCH_LIMIT: usize = 10;

/// I/O failure talking to the backing store. An id or label that simply
/// does not exist is never an error.
#[derive(Clone, Debug, Error, PartialEq)]
#[error("knowledge store unavailable: {0}")]
pub struct StoreError(pub String);

/// Read-only lookups the graph assembler traverses against.
///
/// Implementations must be side-effect-free; the assembler may call these
/// in any order and discards everything it gathered when one of them fails.
#[allow(async_fn_in_trait)]
pub trait GraphStore {
	/// Resolve a node by its exact label. Duplicate labels resolve to the
	/// first match.
	async fn node_by_label(&self, label: &str) -> Result<Option<KnowledgeNode>, StoreError>;

	/// Resolve a node by id.
	async fn node_by_id(&self, id: NodeId) -> Result<Option<KnowledgeNode>, StoreError>;

	/// All edges leaving `id`, in stable order.
	async fn outgoing_edges(&self, id: NodeId) -> Result<Vec<KnowledgeEdge>, StoreError>;

	/// Case-insensitive substring search over labels, capped at
	/// [`SEARCH_LIMIT`] rows.
	async fn search_nodes(&self, term: &str) -> Result<Vec<KnowledgeNode>, StoreError>;
}

/// Hash-map-backed store. Cheap to clone, deterministic iteration via the
/// recorded insertion order.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
	nodes: HashMap<NodeId, KnowledgeNode>,
	edges: HashMap<NodeId, Vec<KnowledgeEdge>>,
	order: Vec<NodeId>,
}

impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn add_node(&mut self, id: NodeId, label: &str, kind: NodeKind, weight: f64) {
		if !self.nodes.contains_key(&id) {
			self.order.push(id);
		}
		self.nodes.insert(
			id,
			KnowledgeNode {
				id,
				label: label.to_string(),
				kind,
				weight,
			},
		);
	}

	pub fn add_edge(&mut self, source: NodeId, target: NodeId, kind: EdgeKind, weight: f64) {
		self.edges.entry(source).or_default().push(KnowledgeEdge {
			source,
			target,
			kind,
			weight,
		});
	}
}

impl GraphStore for MemoryStore {
	async fn node_by_label(&self, label: &str) -> Result<Option<KnowledgeNode>, StoreError> {
		Ok(self
			.order
			.iter()
			.filter_map(|id| self.nodes.get(id))
			.find(|node| node.label == label)
			.cloned())
	}

	async fn node_by_id(&self, id: NodeId) -> Result<Option<KnowledgeNode>, StoreError> {
		Ok(self.nodes.get(&id).cloned())
	}

	async fn outgoing_edges(&self, id: NodeId) -> Result<Vec<KnowledgeEdge>, StoreError> {
		Ok(self.edges.get(&id).cloned().unwrap_or_default())
	}

	async fn search_nodes(&self, term: &str) -> Result<Vec<KnowledgeNode>, StoreError> {
		let needle = term.to_lowercase();
		Ok(self
			.order
			.iter()
			.filter_map(|id| self.nodes.get(id))
			.filter(|node| node.label.to_lowercase().contains(&needle))
			.take(SEARCH_LIMIT)
			.cloned()
			.collect())
	}
}

#[cfg(test)]
mod tests {
	use futures::executor::block_on;

	use super::*;

	fn store() -> MemoryStore {
		let mut store = MemoryStore::new();
		store.add_node(1, "JavaScript", NodeKind::Topic, 9.0);
		store.add_node(2, "TypeScript", NodeKind::Topic, 6.0);
		store.add_node(3, "Closures", NodeKind::Concept, 3.0);
		store.add_edge(1, 3, EdgeKind::PartOf, 1.0);
		store
	}

	#[test]
	fn label_lookup_is_exact() {
		let store = store();
		let node = block_on(store.node_by_label("JavaScript")).unwrap();
		assert_eq!(node.map(|n| n.id), Some(1));
		assert_eq!(block_on(store.node_by_label("javascript")).unwrap(), None);
	}

	#[test]
	fn search_matches_substrings_case_insensitively() {
		let store = store();
		let hits = block_on(store.search_nodes("script")).unwrap();
		let ids: Vec<NodeId> = hits.iter().map(|n| n.id).collect();
		assert_eq!(ids, vec![1, 2]);
	}

	#[test]
	fn search_caps_results() {
		let mut store = MemoryStore::new();
		for id in 0..30 {
			store.add_node(id, &format!("Topic {id}"), NodeKind::Topic, 1.0);
		}
		let hits = block_on(store.search_nodes("topic")).unwrap();
		assert_eq!(hits.len(), SEARCH_LIMIT);
	}

	#[test]
	fn missing_rows_are_not_errors() {
		let store = store();
		assert_eq!(block_on(store.node_by_id(99)).unwrap(), None);
		assert!(block_on(store.outgoing_edges(99)).unwrap().is_empty());
	}
}
