//! Per-view state: the running simulation, the view transform and the
//! pointer gesture machine that feeds both.

use std::collections::HashSet;

use crate::graph::{GraphSnapshot, NodeId};

use super::simulation::{LayoutParameters, Simulation};

/// Zoom clamp range.
pub const MIN_SCALE: f64 = 0.1;
pub const MAX_SCALE: f64 = 4.0;

/// Extra pick margin around a node's visual radius.
pub const HIT_SLACK: f64 = 4.0;

/// Alpha target held while a node is being dragged.
const DRAG_ALPHA_TARGET: f64 = 0.3;

/// Affine mapping from simulation space to screen space. Applied to the
/// whole drawn group; node coordinates themselves never leave simulation
/// space.
#[derive(Clone, Debug, Default)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

#[derive(Clone, Debug, Default)]
pub struct DragState {
	pub active: bool,
	pub node: Option<NodeId>,
	pub start_x: f64,
	pub start_y: f64,
	pub node_start_x: f64,
	pub node_start_y: f64,
}

#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start_x: f64,
	pub transform_start_y: f64,
}

pub struct KnowledgeGraphState {
	pub sim: Simulation,
	pub snapshot: GraphSnapshot,
	pub transform: ViewTransform,
	pub drag: DragState,
	pub pan: PanState,
	pub hovered: Option<NodeId>,
	pub neighbors: HashSet<NodeId>,
	pub width: f64,
	pub height: f64,
	pub min_scale: f64,
	pub max_scale: f64,
}

impl KnowledgeGraphState {
	pub fn new(snapshot: GraphSnapshot, width: f64, height: f64) -> Self {
		let sim = Simulation::new(&snapshot, width, height, LayoutParameters::default());
		Self {
			sim,
			snapshot,
			transform: ViewTransform {
				x: 0.0,
				y: 0.0,
				k: 1.0,
			},
			drag: DragState::default(),
			pan: PanState::default(),
			hovered: None,
			neighbors: HashSet::new(),
			width,
			height,
			min_scale: MIN_SCALE,
			max_scale: MAX_SCALE,
		}
	}

	/// Advance the simulation one frame. A settled or stopped engine makes
	/// this a no-op; the positions just hold.
	pub fn tick(&mut self) {
		self.sim.step();
	}

	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		(
			(sx - self.transform.x) / self.transform.k,
			(sy - self.transform.y) / self.transform.k,
		)
	}

	pub fn node_at_position(&self, sx: f64, sy: f64) -> Option<NodeId> {
		let (gx, gy) = self.screen_to_graph(sx, sy);
		let mut found = None;
		for point in self.sim.points() {
			let (dx, dy) = (point.x - gx, point.y - gy);
			let hit = point.radius + HIT_SLACK;
			if dx * dx + dy * dy < hit * hit {
				found = Some(point.id);
			}
		}
		found
	}

	/// Pointer pressed: grab the node under the cursor, otherwise start a
	/// background pan.
	pub fn pointer_down(&mut self, sx: f64, sy: f64) {
		if !sx.is_finite() || !sy.is_finite() {
			return;
		}
		if let Some(id) = self.node_at_position(sx, sy) {
			let Some((nx, ny)) = self.sim.position(id) else {
				return;
			};
			self.drag.active = true;
			self.drag.node = Some(id);
			self.drag.start_x = sx;
			self.drag.start_y = sy;
			self.drag.node_start_x = nx;
			self.drag.node_start_y = ny;
			self.sim.pin(id, nx, ny);
			self.sim.set_alpha_target(DRAG_ALPHA_TARGET);
			self.sim.restart();
		} else {
			self.pan.active = true;
			self.pan.start_x = sx;
			self.pan.start_y = sy;
			self.pan.transform_start_x = self.transform.x;
			self.pan.transform_start_y = self.transform.y;
		}
	}

	pub fn pointer_move(&mut self, sx: f64, sy: f64) {
		if !sx.is_finite() || !sy.is_finite() {
			return;
		}
		if self.drag.active {
			if let Some(id) = self.drag.node {
				let (dx, dy) = (
					(sx - self.drag.start_x) / self.transform.k,
					(sy - self.drag.start_y) / self.transform.k,
				);
				self.sim
					.pin(id, self.drag.node_start_x + dx, self.drag.node_start_y + dy);
			}
		} else if self.pan.active {
			self.transform.x = self.pan.transform_start_x + (sx - self.pan.start_x);
			self.transform.y = self.pan.transform_start_y + (sy - self.pan.start_y);
		} else {
			let hovered = self.node_at_position(sx, sy);
			self.set_hover(hovered);
		}
	}

	/// Pointer released: a dragged node goes back to free simulation, with
	/// the energy target lowered so the layout cools down again.
	pub fn pointer_up(&mut self) {
		if self.drag.active {
			if let Some(id) = self.drag.node {
				self.sim.unpin(id);
			}
			self.sim.set_alpha_target(0.0);
		}
		self.drag.active = false;
		self.drag.node = None;
		self.pan.active = false;
	}

	pub fn pointer_leave(&mut self) {
		self.pointer_up();
		self.set_hover(None);
	}

	/// Zoom by a wheel step, anchored at the cursor so the graph point
	/// under it stays put.
	pub fn wheel_zoom(&mut self, sx: f64, sy: f64, delta_y: f64) {
		if !sx.is_finite() || !sy.is_finite() || !delta_y.is_finite() {
			return;
		}
		let factor = if delta_y > 0.0 { 0.9 } else { 1.1 };
		let new_k = (self.transform.k * factor).clamp(self.min_scale, self.max_scale);
		let ratio = new_k / self.transform.k;
		self.transform.x = sx - (sx - self.transform.x) * ratio;
		self.transform.y = sy - (sy - self.transform.y) * ratio;
		self.transform.k = new_k;
	}

	pub fn set_hover(&mut self, node: Option<NodeId>) {
		if self.hovered == node {
			return;
		}
		self.hovered = node;
		self.neighbors.clear();
		if let Some(id) = node {
			for edge in &self.snapshot.edges {
				if edge.source == id {
					self.neighbors.insert(edge.target);
				} else if edge.target == id {
					self.neighbors.insert(edge.source);
				}
			}
		}
	}

	pub fn is_highlighted(&self, id: NodeId) -> bool {
		self.hovered == Some(id) || self.neighbors.contains(&id)
	}

	pub fn has_active_highlight(&self) -> bool {
		self.hovered.is_some()
	}

	/// Surface geometry changed. Existing positions stay where they are.
	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
	}
}
