use neokit_core::{
    walk, Entity, GraphElementSet, GraphRef, Hydrator, ModelConfig, Node, Relationship,
    Subgraph, SubgraphData, Walkable,
};
use anyhow::Result;
use serde_json::json;

neokit_core::relationship_kind!(WorksWith);

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    println!("🚀 Starting Neokit Social Graph Example...");

    // 1. Build a few local nodes and relationships
    let alice = Node::new(["Person"]).with_property("name", "Alice").with_property("age", 33i64);
    let bob = Node::new(["Person"]).with_property("name", "Bob");
    let carol = Node::new(["Person", "Manager"]).with_property("name", "Carol");

    let ab = Relationship::new(&alice, "KNOWS", &bob)?.with_property("since", 1999i64);
    let ac = Relationship::of::<WorksWith>(&alice, &carol);
    let cb = Relationship::new(&carol, "MANAGES", &bob)?;

    println!("\n📦 Relationships:");
    for rel in [&ab, &ac, &cb] {
        println!("   - {}", rel);
    }

    // 2. Set algebra
    let team = &ab | &ac;
    println!("\n🧮 (ab | ac): {} nodes, {} relationships", team.order(), team.size());
    println!("   Labels: {:?}", team.labels());
    println!("   Types:  {:?}", team.types());

    let without_carol = &team - &Subgraph::new(vec![carol.clone()], vec![ac.clone()]);
    println!("   (ab | ac) - ac: {} nodes (Alice is kept by KNOWS)", without_carol.order());

    // 3. Walks
    let path = Walkable::from(&ab).concatenate(&Walkable::from(&cb))?;
    println!("\n🚶 Walk: {}", path);
    let parts = vec![Walkable::from(&ac), Walkable::from(&cb)];
    let joined = walk(&parts)?;
    println!("   Joined walk covers {} steps", joined.iter().count());

    // 4. Hydrate records from a query result
    let config = ModelConfig::load()?;
    let mut hydrator = Hydrator::new(GraphRef::new("bolt://localhost:7687"), config.hydration);
    let rows = vec![json!({
        "p": {
            "nodes": [
                {"identity": 1, "labels": ["Person"], "properties": {"name": "Alice"}},
                {"identity": 2, "labels": ["Person"], "properties": {"name": "Bob"}}
            ],
            "relationships": [
                {"identity": 7, "type": "KNOWS", "start": 1, "end": 2, "properties": {"since": 1999}}
            ]
        }
    })];
    let hydrated = hydrator.hydrate_records(&rows)?;
    println!("\n💧 Hydrated {} rows", hydrated.len());
    if let Some(path) = hydrated[0]["p"].as_path() {
        println!("   Path: {}", path);
        let remote_alice = hydrator.node(1).map(|n| n.identity());
        println!("   Node 1 identity: {:?}", remote_alice);
    }

    // 5. Export for a write statement
    let data = SubgraphData::from_elements(&(&team | &cb))?;
    println!("\n📤 Export:\n{}", serde_json::to_string_pretty(&data)?);

    println!("\n✅ Done. {} components in the full graph.", (&team | &cb).component_count());
    Ok(())
}
