//! Bounded breadth-first assembly of a knowledge subgraph.

use std::collections::{HashSet, VecDeque};

use log::debug;
use thiserror::Error;

use super::store::{GraphStore, StoreError};
use super::types::{GraphSnapshot, NodeId};

/// Traversal depth applied when the caller leaves it unset.
pub const DEFAULT_DEPTH: u32 = 2;
/// Upper bound on the requested traversal depth.
pub const MAX_DEPTH: u32 = 8;

/// Failure of one assembly run. An unresolved root topic is not a failure;
/// it yields an empty snapshot.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum GraphError {
	#[error("invalid argument: {0}")]
	InvalidArgument(String),
	#[error(transparent)]
	StoreUnavailable(#[from] StoreError),
}

/// Query surface for the presentation layer. Validates arguments before any
/// store access, defaults the depth to [`DEFAULT_DEPTH`] and bounds it by
/// [`MAX_DEPTH`].
pub async fn knowledge_graph<S: GraphStore>(
	store: &S,
	root_topic: &str,
	depth: Option<i32>,
) -> Result<GraphSnapshot, GraphError> {
	let depth = match depth {
		None => DEFAULT_DEPTH,
		Some(d) if d < 0 => {
			return Err(GraphError::InvalidArgument(format!(
				"depth must be non-negative, got {d}"
			)));
		}
		Some(d) => (d as u32).min(MAX_DEPTH),
	};
	assemble(store, root_topic, depth).await
}

/// Walk outgoing edges from the node labelled `root_label`, at most
/// `max_depth` hops out, and return the deduplicated subgraph.
///
/// Every node id is expanded at most once, so traversal terminates on
/// cyclic graphs; an edge that leads back into an already-collected node is
/// recorded without re-entering it. Nodes at the depth limit contribute
/// only edges whose target is already in the snapshot, which keeps every
/// returned edge two-ended without admitting nodes past the limit.
pub async fn assemble<S: GraphStore>(
	store: &S,
	root_label: &str,
	max_depth: u32,
) -> Result<GraphSnapshot, GraphError> {
	if root_label.trim().is_empty() {
		return Err(GraphError::InvalidArgument("root topic is empty".into()));
	}

	let mut snapshot = GraphSnapshot::default();
	let Some(root) = store.node_by_label(root_label).await? else {
		return Ok(snapshot);
	};

	let mut visited: HashSet<NodeId> = HashSet::new();
	let mut seen_edges: HashSet<(NodeId, NodeId)> = HashSet::new();
	let mut queue: VecDeque<(NodeId, u32)> = VecDeque::new();

	visited.insert(root.id);
	queue.push_back((root.id, 0));
	snapshot.nodes.push(root);

	if max_depth == 0 {
		return Ok(snapshot);
	}

	while let Some((id, depth)) = queue.pop_front() {
		for edge in store.outgoing_edges(id).await? {
			if visited.contains(&edge.target) {
				if seen_edges.insert((edge.source, edge.target)) {
					snapshot.edges.push(edge);
				}
			} else if depth < max_depth {
				// Claim the target before queueing it; a later path to the
				// same node only records its edge.
				let Some(node) = store.node_by_id(edge.target).await? else {
					// Dangling edge: stays out of the snapshot entirely.
					continue;
				};
				visited.insert(node.id);
				queue.push_back((node.id, depth + 1));
				snapshot.nodes.push(node);
				if seen_edges.insert((edge.source, edge.target)) {
					snapshot.edges.push(edge);
				}
			}
		}
	}

	debug!(
		"assembled '{root_label}' to depth {max_depth}: {} nodes, {} edges",
		snapshot.nodes.len(),
		snapshot.edges.len()
	);
	Ok(snapshot)
}

#[cfg(test)]
mod tests {
	use futures::executor::block_on;

	use super::super::store::MemoryStore;
	use super::super::types::{EdgeKind, KnowledgeEdge, KnowledgeNode, NodeKind};
	use super::*;

	/// A -> B -> C -> A plus A -> D, the smallest store with a cycle.
	fn cyclic_store() -> MemoryStore {
		let mut store = MemoryStore::new();
		store.add_node(1, "A", NodeKind::Topic, 4.0);
		store.add_node(2, "B", NodeKind::Concept, 2.0);
		store.add_node(3, "C", NodeKind::Concept, 2.0);
		store.add_node(4, "D", NodeKind::Resource, 1.0);
		store.add_edge(1, 2, EdgeKind::Requires, 1.0);
		store.add_edge(1, 4, EdgeKind::RelatesTo, 1.0);
		store.add_edge(2, 3, EdgeKind::Requires, 1.0);
		store.add_edge(3, 1, EdgeKind::Requires, 1.0);
		store
	}

	fn node_ids(snapshot: &GraphSnapshot) -> Vec<NodeId> {
		let mut ids: Vec<NodeId> = snapshot.nodes.iter().map(|n| n.id).collect();
		ids.sort_unstable();
		ids
	}

	fn edge_pairs(snapshot: &GraphSnapshot) -> Vec<(NodeId, NodeId)> {
		let mut pairs: Vec<(NodeId, NodeId)> =
			snapshot.edges.iter().map(|e| (e.source, e.target)).collect();
		pairs.sort_unstable();
		pairs
	}

	#[test]
	fn cycle_terminates_and_records_back_edge() {
		let snapshot = block_on(assemble(&cyclic_store(), "A", 2)).unwrap();
		assert_eq!(node_ids(&snapshot), vec![1, 2, 3, 4]);
		assert_eq!(edge_pairs(&snapshot), vec![(1, 2), (1, 4), (2, 3), (3, 1)]);
	}

	#[test]
	fn depth_zero_returns_root_alone() {
		let snapshot = block_on(assemble(&cyclic_store(), "A", 0)).unwrap();
		assert_eq!(node_ids(&snapshot), vec![1]);
		assert!(snapshot.edges.is_empty());
	}

	#[test]
	fn depth_bound_holds_on_a_chain() {
		let mut store = MemoryStore::new();
		for id in 1..=5 {
			store.add_node(id, &format!("N{id}"), NodeKind::Concept, 1.0);
		}
		for id in 1..5 {
			store.add_edge(id, id + 1, EdgeKind::LeadsTo, 1.0);
		}
		let snapshot = block_on(assemble(&store, "N1", 2)).unwrap();
		// Two hops out: N1, N2, N3. The N3 -> N4 edge would drag in a node
		// past the limit, so it is dropped along with N4.
		assert_eq!(node_ids(&snapshot), vec![1, 2, 3]);
		assert_eq!(edge_pairs(&snapshot), vec![(1, 2), (2, 3)]);
	}

	#[test]
	fn duplicate_store_rows_collapse_to_one_edge() {
		let mut store = MemoryStore::new();
		store.add_node(1, "A", NodeKind::Topic, 1.0);
		store.add_node(2, "B", NodeKind::Topic, 1.0);
		store.add_edge(1, 2, EdgeKind::Requires, 1.0);
		store.add_edge(1, 2, EdgeKind::Requires, 1.0);
		let snapshot = block_on(assemble(&store, "A", 1)).unwrap();
		assert_eq!(edge_pairs(&snapshot), vec![(1, 2)]);
	}

	#[test]
	fn converging_branches_share_the_target() {
		// A fans out to B and C, both of which point at D.
		let mut store = MemoryStore::new();
		for (id, label) in [(1, "A"), (2, "B"), (3, "C"), (4, "D")] {
			store.add_node(id, label, NodeKind::Concept, 1.0);
		}
		store.add_edge(1, 2, EdgeKind::Requires, 1.0);
		store.add_edge(1, 3, EdgeKind::Requires, 1.0);
		store.add_edge(2, 4, EdgeKind::LeadsTo, 1.0);
		store.add_edge(3, 4, EdgeKind::LeadsTo, 1.0);
		let snapshot = block_on(assemble(&store, "A", 3)).unwrap();
		assert_eq!(node_ids(&snapshot), vec![1, 2, 3, 4]);
		// Both incoming edges survive; D itself is collected once.
		assert_eq!(
			edge_pairs(&snapshot),
			vec![(1, 2), (1, 3), (2, 4), (3, 4)]
		);
	}

	#[test]
	fn dangling_edges_are_dropped() {
		let mut store = MemoryStore::new();
		store.add_node(1, "A", NodeKind::Topic, 1.0);
		store.add_edge(1, 99, EdgeKind::RelatesTo, 1.0);
		let snapshot = block_on(assemble(&store, "A", 2)).unwrap();
		assert_eq!(node_ids(&snapshot), vec![1]);
		assert!(snapshot.edges.is_empty());
	}

	#[test]
	fn unresolved_root_is_an_empty_snapshot() {
		let snapshot = block_on(assemble(&cyclic_store(), "Nope", 2)).unwrap();
		assert!(snapshot.is_empty());
		assert!(snapshot.edges.is_empty());
	}

	#[test]
	fn blank_root_is_rejected_before_store_access() {
		let err = block_on(assemble(&cyclic_store(), "  ", 2)).unwrap_err();
		assert!(matches!(err, GraphError::InvalidArgument(_)));
	}

	#[test]
	fn repeated_runs_agree() {
		let store = cyclic_store();
		let first = block_on(assemble(&store, "A", 2)).unwrap();
		let second = block_on(assemble(&store, "A", 2)).unwrap();
		assert_eq!(node_ids(&first), node_ids(&second));
		assert_eq!(edge_pairs(&first), edge_pairs(&second));
	}

	#[test]
	fn query_surface_defaults_and_bounds_depth() {
		let store = cyclic_store();
		let defaulted = block_on(knowledge_graph(&store, "A", None)).unwrap();
		let explicit = block_on(assemble(&store, "A", DEFAULT_DEPTH)).unwrap();
		assert_eq!(defaulted, explicit);

		let clamped = block_on(knowledge_graph(&store, "A", Some(1000))).unwrap();
		let bounded = block_on(assemble(&store, "A", MAX_DEPTH)).unwrap();
		assert_eq!(clamped, bounded);
	}

	#[test]
	fn query_surface_rejects_negative_depth() {
		let err = block_on(knowledge_graph(&cyclic_store(), "A", Some(-1))).unwrap_err();
		assert!(matches!(err, GraphError::InvalidArgument(_)));
	}

	/// Fails every lookup, standing in for a store that is down.
	struct DownStore;

	impl GraphStore for DownStore {
		async fn node_by_label(&self, _: &str) -> Result<Option<KnowledgeNode>, StoreError> {
			Err(StoreError("connection refused".into()))
		}
		async fn node_by_id(&self, _: NodeId) -> Result<Option<KnowledgeNode>, StoreError> {
			Err(StoreError("connection refused".into()))
		}
		async fn outgoing_edges(&self, _: NodeId) -> Result<Vec<KnowledgeEdge>, StoreError> {
			Err(StoreError("connection refused".into()))
		}
		async fn search_nodes(&self, _: &str) -> Result<Vec<KnowledgeNode>, StoreError> {
			Err(StoreError("connection refused".into()))
		}
	}

	#[test]
	fn store_failure_aborts_the_run() {
		let err = block_on(assemble(&DownStore, "A", 2)).unwrap_err();
		assert!(matches!(err, GraphError::StoreUnavailable(_)));
	}

	/// Serves the root, then fails on edge fetches, to show partial results
	/// are discarded rather than returned.
	struct FlakyStore(MemoryStore);

	impl GraphStore for FlakyStore {
		async fn node_by_label(&self, label: &str) -> Result<Option<KnowledgeNode>, StoreError> {
			self.0.node_by_label(label).await
		}
		async fn node_by_id(&self, id: NodeId) -> Result<Option<KnowledgeNode>, StoreError> {
			self.0.node_by_id(id).await
		}
		async fn outgoing_edges(&self, _: NodeId) -> Result<Vec<KnowledgeEdge>, StoreError> {
			Err(StoreError("read timeout".into()))
		}
		async fn search_nodes(&self, term: &str) -> Result<Vec<KnowledgeNode>, StoreError> {
			self.0.search_nodes(term).await
		}
	}

	#[test]
	fn mid_run_failure_discards_partial_results() {
		let err = block_on(assemble(&FlakyStore(cyclic_store()), "A", 2)).unwrap_err();
		assert_eq!(err, GraphError::StoreUnavailable(StoreError("read timeout".into())));
	}
}
