//! Force-directed layout engine.
//!
//! Owns every per-node layout point and advances them one `step()` at a
//! time under four forces: springs along edges, inverse-square repulsion
//! between all pairs, a rigid recentering pull, and pairwise collision
//! between overlapping radii. A decaying energy scalar (`alpha`) cools the
//! system until it settles; interaction reheats it through
//! [`Simulation::set_alpha_target`] and [`Simulation::restart`].

use std::collections::HashMap;
use std::f64::consts::PI;

use crate::graph::{GraphSnapshot, NodeId};

use super::scale;

/// Spiral radius step for initial placement.
const INITIAL_RADIUS: f64 = 10.0;

/// Force tuning. The defaults are the values the layout was designed
/// around: spring length 100, repulsion -300, ~300 ticks to settle.
#[derive(Clone, Copy, Debug)]
pub struct LayoutParameters {
	pub link_distance: f64,
	pub charge_strength: f64,
	pub collide_strength: f64,
	/// Energy threshold below which the engine stops ticking.
	pub alpha_min: f64,
	/// Geometric decay applied to alpha every tick.
	pub alpha_decay: f64,
	/// Fraction of velocity carried over between ticks.
	pub velocity_decay: f64,
}

impl Default for LayoutParameters {
	fn default() -> Self {
		let alpha_min: f64 = 0.001;
		Self {
			link_distance: 100.0,
			charge_strength: -300.0,
			collide_strength: 1.0,
			alpha_min,
			alpha_decay: 1.0 - alpha_min.powf(1.0 / 300.0),
			velocity_decay: 0.6,
		}
	}
}

/// Layout state for one node, in simulation space. `fx`/`fy` pin the node:
/// while set, the position is forced and the velocity zeroed each tick.
#[derive(Clone, Debug)]
pub struct LayoutPoint {
	pub id: NodeId,
	pub x: f64,
	pub y: f64,
	pub vx: f64,
	pub vy: f64,
	pub fx: Option<f64>,
	pub fy: Option<f64>,
	pub radius: f64,
}

#[derive(Clone, Copy)]
struct Link {
	source: usize,
	target: usize,
	// Degree-derived, so well-connected nodes are not yanked around by
	// every incident edge.
	strength: f64,
	bias: f64,
}

pub struct Simulation {
	points: Vec<LayoutPoint>,
	index: HashMap<NodeId, usize>,
	links: Vec<Link>,
	center: (f64, f64),
	params: LayoutParameters,
	alpha: f64,
	alpha_target: f64,
	running: bool,
	seed: u64,
}

impl Simulation {
	/// Build layout points for every node in the snapshot, placed on a
	/// deterministic spiral around the canvas center.
	pub fn new(snapshot: &GraphSnapshot, width: f64, height: f64, params: LayoutParameters) -> Self {
		let center = (width / 2.0, height / 2.0);
		let spiral_angle = PI * (3.0 - 5.0_f64.sqrt());

		let mut index = HashMap::new();
		let points: Vec<LayoutPoint> = snapshot
			.nodes
			.iter()
			.enumerate()
			.map(|(i, node)| {
				index.insert(node.id, i);
				let radius = INITIAL_RADIUS * (0.5 + i as f64).sqrt();
				let angle = i as f64 * spiral_angle;
				LayoutPoint {
					id: node.id,
					x: center.0 + radius * angle.cos(),
					y: center.1 + radius * angle.sin(),
					vx: 0.0,
					vy: 0.0,
					fx: None,
					fy: None,
					radius: scale::node_radius(node.weight),
				}
			})
			.collect();

		let mut degree = vec![0usize; points.len()];
		let endpoints: Vec<(usize, usize)> = snapshot
			.edges
			.iter()
			.filter_map(|edge| {
				if let (Some(&s), Some(&t)) = (index.get(&edge.source), index.get(&edge.target)) {
					Some((s, t))
				} else {
					None
				}
			})
			.collect();
		for &(s, t) in &endpoints {
			degree[s] += 1;
			degree[t] += 1;
		}
		let links = endpoints
			.into_iter()
			.map(|(s, t)| Link {
				source: s,
				target: t,
				strength: 1.0 / degree[s].min(degree[t]).max(1) as f64,
				bias: degree[s] as f64 / (degree[s] + degree[t]).max(1) as f64,
			})
			.collect();

		Self {
			points,
			index,
			links,
			center,
			params,
			alpha: 1.0,
			alpha_target: 0.0,
			running: true,
			seed: 1,
		}
	}

	pub fn points(&self) -> &[LayoutPoint] {
		&self.points
	}

	pub fn point(&self, id: NodeId) -> Option<&LayoutPoint> {
		self.index.get(&id).map(|&i| &self.points[i])
	}

	pub fn position(&self, id: NodeId) -> Option<(f64, f64)> {
		self.point(id).map(|p| (p.x, p.y))
	}

	/// Move a node to an explicit position without pinning it.
	pub fn place(&mut self, id: NodeId, x: f64, y: f64) {
		if let Some(&i) = self.index.get(&id) {
			let point = &mut self.points[i];
			point.x = x;
			point.y = y;
			point.vx = 0.0;
			point.vy = 0.0;
		}
	}

	/// Fix a node at `(x, y)`. It no longer moves freely but keeps exerting
	/// forces on its neighbors. The stored position is untouched until the
	/// next tick.
	pub fn pin(&mut self, id: NodeId, x: f64, y: f64) {
		if let Some(&i) = self.index.get(&id) {
			self.points[i].fx = Some(x);
			self.points[i].fy = Some(y);
		}
	}

	/// Release a pinned node back into free simulation.
	pub fn unpin(&mut self, id: NodeId) {
		if let Some(&i) = self.index.get(&id) {
			self.points[i].fx = None;
			self.points[i].fy = None;
		}
	}

	pub fn alpha(&self) -> f64 {
		self.alpha
	}

	pub fn alpha_target(&self) -> f64 {
		self.alpha_target
	}

	/// Energy level the simulation relaxes toward. A non-zero target keeps
	/// it hot, e.g. for the duration of a drag.
	pub fn set_alpha_target(&mut self, target: f64) {
		self.alpha_target = target;
	}

	/// Whether the next `step()` will advance the layout.
	pub fn is_running(&self) -> bool {
		self.running
	}

	/// Resume ticking after the engine settled or was stopped.
	pub fn restart(&mut self) {
		self.running = true;
	}

	/// Halt ticking immediately. No further `step()` advances the layout
	/// until `restart()`.
	pub fn stop(&mut self) {
		self.running = false;
	}

	/// Advance the layout by one tick. Returns false without touching any
	/// state when the engine is stopped or has settled.
	pub fn step(&mut self) -> bool {
		if !self.running {
			return false;
		}

		self.alpha += (self.alpha_target - self.alpha) * self.params.alpha_decay;

		self.apply_link_force();
		self.apply_charge_force();
		self.apply_center_force();
		self.apply_collide_force();
		self.integrate();

		if self.alpha < self.params.alpha_min {
			self.running = false;
		}
		true
	}

	fn apply_link_force(&mut self) {
		let alpha = self.alpha;
		let distance = self.params.link_distance;
		for li in 0..self.links.len() {
			let link = self.links[li];
			let (s, t) = (link.source, link.target);
			let mut dx =
				self.points[t].x + self.points[t].vx - self.points[s].x - self.points[s].vx;
			let mut dy =
				self.points[t].y + self.points[t].vy - self.points[s].y - self.points[s].vy;
			if dx == 0.0 && dy == 0.0 {
				dx = jiggle(&mut self.seed);
				dy = jiggle(&mut self.seed);
			}
			let len = (dx * dx + dy * dy).sqrt();
			let pull = (len - distance) / len * alpha * link.strength;
			let (px, py) = (dx * pull, dy * pull);
			self.points[t].vx -= px * link.bias;
			self.points[t].vy -= py * link.bias;
			self.points[s].vx += px * (1.0 - link.bias);
			self.points[s].vy += py * (1.0 - link.bias);
		}
	}

	// Brute-force pair evaluation. The kernel only sees relative offsets,
	// so a spatial partition can replace the outer loops for large graphs.
	fn apply_charge_force(&mut self) {
		let alpha = self.alpha;
		let strength = self.params.charge_strength;
		let n = self.points.len();
		for i in 0..n {
			for j in (i + 1)..n {
				let mut dx = self.points[j].x - self.points[i].x;
				let mut dy = self.points[j].y - self.points[i].y;
				let mut len2 = dx * dx + dy * dy;
				if len2 == 0.0 {
					dx = jiggle(&mut self.seed);
					dy = jiggle(&mut self.seed);
					len2 = dx * dx + dy * dy;
				}
				// Clamp the singularity at tiny separations.
				len2 = len2.max(1.0);
				let w = strength * alpha / len2;
				self.points[i].vx += dx * w;
				self.points[i].vy += dy * w;
				self.points[j].vx -= dx * w;
				self.points[j].vy -= dy * w;
			}
		}
	}

	fn apply_center_force(&mut self) {
		let n = self.points.len();
		if n == 0 {
			return;
		}
		let (mut sx, mut sy) = (0.0, 0.0);
		for point in &self.points {
			sx += point.x;
			sy += point.y;
		}
		let (sx, sy) = (sx / n as f64 - self.center.0, sy / n as f64 - self.center.1);
		for point in &mut self.points {
			point.x -= sx;
			point.y -= sy;
		}
	}

	fn apply_collide_force(&mut self) {
		let strength = self.params.collide_strength;
		let n = self.points.len();
		for i in 0..n {
			for j in (i + 1)..n {
				let r = self.points[i].radius + self.points[j].radius;
				let mut dx = self.points[i].x + self.points[i].vx
					- self.points[j].x - self.points[j].vx;
				let mut dy = self.points[i].y + self.points[i].vy
					- self.points[j].y - self.points[j].vy;
				let mut len2 = dx * dx + dy * dy;
				if len2 >= r * r {
					continue;
				}
				if len2 == 0.0 {
					dx = jiggle(&mut self.seed);
					dy = jiggle(&mut self.seed);
					len2 = dx * dx + dy * dy;
				}
				let len = len2.sqrt();
				let push = (r - len) / len * strength;
				let (px, py) = (dx * push, dy * push);
				let ri = self.points[i].radius;
				let rj = self.points[j].radius;
				let ratio = (rj * rj) / (ri * ri + rj * rj);
				self.points[i].vx += px * ratio;
				self.points[i].vy += py * ratio;
				self.points[j].vx -= px * (1.0 - ratio);
				self.points[j].vy -= py * (1.0 - ratio);
			}
		}
	}

	fn integrate(&mut self) {
		let decay = self.params.velocity_decay;
		for point in &mut self.points {
			match point.fx {
				Some(fx) => {
					point.x = fx;
					point.vx = 0.0;
				}
				None => {
					point.vx *= decay;
					point.x += point.vx;
				}
			}
			match point.fy {
				Some(fy) => {
					point.y = fy;
					point.vy = 0.0;
				}
				None => {
					point.vy *= decay;
					point.y += point.vy;
				}
			}
		}
	}
}

fn jiggle(seed: &mut u64) -> f64 {
	*seed = (*seed * 9301 + 49297) % 233280;
	(*seed as f64 / 233280.0 - 0.5) * 1e-6
}
