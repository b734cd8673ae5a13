use leptos::prelude::*;
use leptos::task::spawn_local;
use log::warn;

use crate::components::knowledge_graph::KnowledgeGraphCanvas;
use crate::graph::{
	EdgeKind, GraphSnapshot, GraphStore, MemoryStore, NodeKind, knowledge_graph,
};

const VIEW_DEPTH: i32 = 3;

/// Seed a demo knowledge store for the JavaScript ecosystem.
fn sample_store() -> MemoryStore {
	use EdgeKind::{LeadsTo, PartOf, RelatesTo, Requires};
	use NodeKind::{Concept, Resource, Skill, Topic};

	let mut store = MemoryStore::new();
	for (id, label, kind, weight) in [
		(1, "JavaScript", Topic, 9.0),
		(2, "TypeScript", Topic, 6.0),
		(3, "Node.js", Topic, 7.0),
		(4, "React", Topic, 7.0),
		(5, "Functions", Concept, 5.0),
		(6, "Closures", Concept, 3.0),
		(7, "Async/Await", Concept, 4.0),
		(8, "Promises", Concept, 4.0),
		(9, "Event Loop", Concept, 3.0),
		(10, "Prototypes", Concept, 3.0),
		(11, "DOM Manipulation", Skill, 4.0),
		(12, "REST APIs", Skill, 4.0),
		(13, "Testing", Skill, 3.0),
		(14, "MDN JavaScript Guide", Resource, 2.0),
		(15, "You Don't Know JS", Resource, 2.0),
		(16, "Node.js Docs", Resource, 2.0),
	] {
		store.add_node(id, label, kind, weight);
	}
	for (source, target, kind, weight) in [
		(1, 5, PartOf, 2.0),
		(1, 6, PartOf, 1.0),
		(1, 7, PartOf, 2.0),
		(1, 10, PartOf, 1.0),
		(1, 11, RelatesTo, 2.0),
		(1, 14, RelatesTo, 1.0),
		(1, 15, RelatesTo, 1.0),
		(1, 2, LeadsTo, 2.0),
		(1, 3, LeadsTo, 2.0),
		(1, 4, LeadsTo, 2.0),
		(2, 1, Requires, 2.0),
		(3, 1, Requires, 2.0),
		(3, 9, RelatesTo, 1.0),
		(3, 12, LeadsTo, 2.0),
		(3, 16, RelatesTo, 1.0),
		(4, 1, Requires, 2.0),
		(4, 11, Requires, 1.0),
		(4, 13, LeadsTo, 1.0),
		(6, 5, Requires, 1.0),
		(7, 8, Requires, 2.0),
		(8, 9, RelatesTo, 1.0),
	] {
		store.add_edge(source, target, kind, weight);
	}
	store
}

/// Default Home Page
#[component]
pub fn Home() -> impl IntoView {
	let store = StoredValue::new(sample_store());
	let (root_topic, set_root_topic) = signal("JavaScript".to_string());
	let (query, set_query) = signal(String::new());
	let (snapshot, set_snapshot) = signal(GraphSnapshot::default());
	let (error, set_error) = signal(None::<String>);
	let (suggestions, set_suggestions) = signal(Vec::<String>::new());
	let generation = StoredValue::new(0u64);

	Effect::new(move |_| {
		let topic = root_topic.get();
		let run = generation.get_value() + 1;
		generation.set_value(run);
		let store = store.get_value();
		spawn_local(async move {
			let result = knowledge_graph(&store, &topic, Some(VIEW_DEPTH)).await;
			// A newer query superseded this run; drop the stale result.
			if generation.get_value() != run {
				return;
			}
			match result {
				Ok(snapshot) => {
					set_error.set(None);
					set_snapshot.set(snapshot);
				}
				Err(err) => {
					warn!("knowledge graph assembly failed: {err}");
					set_error.set(Some(err.to_string()));
				}
			}
		});
	});

	Effect::new(move |_| {
		let term = query.get();
		if term.is_empty() {
			set_suggestions.set(Vec::new());
			return;
		}
		let store = store.get_value();
		spawn_local(async move {
			if let Ok(hits) = store.search_nodes(&term).await {
				set_suggestions.set(hits.into_iter().map(|node| node.label).collect());
			}
		});
	});

	view! {
		<div class="fullscreen-graph">
			<KnowledgeGraphCanvas data=snapshot fullscreen=true />
			<div class="graph-overlay">
				<h1>"Knowledge Graph"</h1>
				<p class="subtitle">
					"Drag nodes to reposition. Scroll to zoom. Drag background to pan."
				</p>
				<input
					class="topic-input"
					type="text"
					list="topic-suggestions"
					prop:value=move || root_topic.get()
					on:input=move |ev| set_query.set(event_target_value(&ev))
					on:change=move |ev| set_root_topic.set(event_target_value(&ev))
				/>
				<datalist id="topic-suggestions">
					{move || {
						suggestions
							.get()
							.into_iter()
							.map(|label| view! { <option value=label /> })
							.collect_view()
					}}
				</datalist>
				{move || {
					error
						.get()
						.map(|message| view! { <p class="error-banner">{message}</p> })
				}}
				{move || {
					(error.get().is_none() && snapshot.get().is_empty())
						.then(|| view! { <p class="subtitle">"No topic matched that label."</p> })
				}}
			</div>
		</div>
	}
}
