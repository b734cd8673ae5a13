//! Visual scales: node colors by kind, radii and stroke widths by weight.

use crate::graph::NodeKind;

pub fn node_color(kind: NodeKind) -> &'static str {
	match kind {
		NodeKind::Concept => "#ff7f0e",
		NodeKind::Topic => "#1f77b4",
		NodeKind::Skill => "#2ca02c",
		NodeKind::Resource => "#d62728",
	}
}

/// Visual radius of a node; also the radius the collision force keeps clear.
pub fn node_radius(weight: f64) -> f64 {
	weight.max(0.0).sqrt() * 5.0
}

pub fn edge_width(weight: f64) -> f64 {
	weight.max(0.0).sqrt().max(0.5)
}
