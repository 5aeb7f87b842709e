//! Example: Building a schema diagram from a programmatic snapshot
//!
//! This example builds a small schema without parsing any source, turns it
//! into a schema graph and prints the Graphviz DOT text.

use schemaviz::{
    Visualizer, category::Category, config::AppConfig, export::OutputFormat,
    snapshot::SchemaSnapshot,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut schema = SchemaSnapshot::new();

    let person = schema.add_type("person", schema.root(Category::Entity))?;
    let company = schema.add_type("company", schema.root(Category::Entity))?;

    let name = schema.add_type("name", schema.root(Category::Attribute))?;
    schema.add_owns(person, name)?;
    schema.add_owns(company, name)?;

    let employment = schema.add_type("employment", schema.root(Category::Relation))?;
    let employee = schema.add_role(employment, "employee")?;
    let employer = schema.add_role(employment, "employer")?;
    schema.add_player(employee, person)?;
    schema.add_player(employer, company)?;

    let visualizer = Visualizer::new(AppConfig::default());
    let graph = visualizer.build_graph(&schema)?;
    println!(
        "Built graph with {} nodes and {} edges\n",
        graph.node_count(),
        graph.edge_count()
    );

    let dot = visualizer.render(&graph, "example", OutputFormat::Dot)?;
    println!("{}", String::from_utf8(dot)?);

    Ok(())
}
