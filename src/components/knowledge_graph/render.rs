//! Canvas drawing. Consumes the current layout positions and the view
//! transform; no physics happens here.

use std::f64::consts::PI;

use web_sys::CanvasRenderingContext2d;

use super::scale;
use super::state::KnowledgeGraphState;

const ARROW_SIZE: f64 = 8.0;

pub fn render(state: &KnowledgeGraphState, ctx: &CanvasRenderingContext2d) {
	ctx.set_fill_style_str("#1a1a2e");
	ctx.fill_rect(0.0, 0.0, state.width, state.height);
	ctx.save();
	let _ = ctx.translate(state.transform.x, state.transform.y);
	let _ = ctx.scale(state.transform.k, state.transform.k);
	draw_edges(state, ctx);
	draw_nodes(state, ctx);
	ctx.restore();
}

fn draw_edges(state: &KnowledgeGraphState, ctx: &CanvasRenderingContext2d) {
	let k = state.transform.k;
	let arrow_size = ARROW_SIZE / k;

	for edge in &state.snapshot.edges {
		let (Some(source), Some(target)) =
			(state.sim.point(edge.source), state.sim.point(edge.target))
		else {
			continue;
		};
		let (x1, y1, x2, y2) = (source.x, source.y, target.x, target.y);
		let (dx, dy) = (x2 - x1, y2 - y1);
		let dist = (dx * dx + dy * dy).sqrt();
		if dist < 0.001 {
			continue;
		}

		// Dim everything outside the hovered neighborhood.
		let highlighted =
			state.is_highlighted(edge.source) && state.is_highlighted(edge.target);
		let alpha = if !state.has_active_highlight() {
			0.6
		} else if highlighted {
			0.9
		} else {
			0.15
		};

		ctx.set_stroke_style_str(&format!("rgba(153, 153, 153, {alpha})"));
		ctx.set_line_width(scale::edge_width(edge.weight));

		let (ux, uy) = (dx / dist, dy / dist);
		ctx.begin_path();
		ctx.move_to(x1 + ux * source.radius, y1 + uy * source.radius);
		ctx.line_to(
			x2 - ux * (target.radius + arrow_size),
			y2 - uy * (target.radius + arrow_size),
		);
		ctx.stroke();

		ctx.set_fill_style_str(&format!("rgba(153, 153, 153, {alpha})"));
		let (tip_x, tip_y) = (x2 - ux * target.radius, y2 - uy * target.radius);
		let (back_x, back_y) = (tip_x - ux * arrow_size, tip_y - uy * arrow_size);
		let (px, py) = (-uy * arrow_size * 0.5, ux * arrow_size * 0.5);
		ctx.begin_path();
		ctx.move_to(tip_x, tip_y);
		ctx.line_to(back_x + px, back_y + py);
		ctx.line_to(back_x - px, back_y - py);
		ctx.close_path();
		ctx.fill();
	}
}

fn draw_nodes(state: &KnowledgeGraphState, ctx: &CanvasRenderingContext2d) {
	let k = state.transform.k;
	let has_highlight = state.has_active_highlight();

	for node in &state.snapshot.nodes {
		let Some(point) = state.sim.point(node.id) else {
			continue;
		};
		let highlighted = state.is_highlighted(node.id);
		let alpha = if has_highlight && !highlighted { 0.3 } else { 1.0 };

		ctx.set_global_alpha(alpha);
		ctx.begin_path();
		let _ = ctx.arc(point.x, point.y, point.radius, 0.0, 2.0 * PI);
		ctx.set_fill_style_str(scale::node_color(node.kind));
		ctx.fill();

		if state.hovered == Some(node.id) {
			ctx.begin_path();
			let _ = ctx.arc(point.x, point.y, point.radius + 2.0 / k, 0.0, 2.0 * PI);
			ctx.set_stroke_style_str("rgba(255, 255, 255, 0.7)");
			ctx.set_line_width(1.5 / k);
			ctx.stroke();
		}

		ctx.set_fill_style_str("rgba(255, 255, 255, 0.85)");
		ctx.set_font(&format!("{}px sans-serif", 12.0 / k.max(0.5)));
		let _ = ctx.fill_text(&node.label, point.x + point.radius + 3.0, point.y + 3.0);
		ctx.set_global_alpha(1.0);
	}
}
