// src/testing/fixtures.rs

use serde_json::{json, Value as JsonValue};

use crate::error::Result;
use crate::filter::compile_where;
use crate::schema::{
    InterfaceType, NodeType, RelationDirection, RelationshipType, SchemaField, SchemaModel,
    SpatialType, TemporalType, UnionType,
};

/// Movies, series and the people around them.
///
/// ```text
/// (Actor)-[:ACTED_IN {roles, screenTime}]->(Movie | Series)
/// (Person)-[:DIRECTED]->(Movie)
/// (Team)-[:HAS_MEMBER]->(Player {score})
/// ```
pub fn movie_schema() -> SchemaModel {
    let mut schema = SchemaModel::new();
    schema
        .add_relationship_type(
            RelationshipType::new("ActedIn")
                .with_field(SchemaField::primitive("roles", "String").array())
                .with_field(SchemaField::primitive("screenTime", "Int")),
        )
        .unwrap();
    schema
        .add_interface(
            InterfaceType::new("Production").with_field(SchemaField::primitive("title", "String")),
        )
        .unwrap();
    schema
        .add_node(
            NodeType::new("Movie")
                .implementing("Production")
                .with_field(SchemaField::primitive("title", "String"))
                .with_field(SchemaField::temporal("released", TemporalType::Date))
                .with_field(SchemaField::primitive("runtime", "Int"))
                .with_field(SchemaField::temporal("duration", TemporalType::Duration))
                .with_field(SchemaField::spatial("location", SpatialType::Point))
                .with_field(
                    SchemaField::relationship("actors", "Actor", "ACTED_IN", RelationDirection::In)
                        .array()
                        .with_properties("ActedIn"),
                )
                .with_field(SchemaField::relationship(
                    "director",
                    "Person",
                    "DIRECTED",
                    RelationDirection::In,
                ))
                .with_field(SchemaField::connection("actors"))
                .with_field(SchemaField::connection("director"))
                .with_field(SchemaField::cypher(
                    "actorCount",
                    "Int",
                    "MATCH (this)<-[:ACTED_IN]-(a:Actor)\nRETURN count(a) AS count",
                    "count",
                )),
        )
        .unwrap();
    schema
        .add_node(
            NodeType::new("Series")
                .implementing("Production")
                .with_field(SchemaField::primitive("title", "String"))
                .with_field(SchemaField::primitive("episodes", "Int")),
        )
        .unwrap();
    schema
        .add_node(
            NodeType::new("Actor")
                .with_field(SchemaField::primitive("name", "String"))
                .with_field(SchemaField::primitive("born", "Int"))
                .with_field(
                    SchemaField::relationship("movies", "Movie", "ACTED_IN", RelationDirection::Out)
                        .array()
                        .with_properties("ActedIn"),
                )
                .with_field(
                    SchemaField::relationship(
                        "actedIn",
                        "Production",
                        "ACTED_IN",
                        RelationDirection::Out,
                    )
                    .array(),
                ),
        )
        .unwrap();
    schema
        .add_node(NodeType::new("Person").with_field(SchemaField::primitive("name", "String")))
        .unwrap();
    schema
        .add_node(
            NodeType::new("Team")
                .with_field(SchemaField::primitive("name", "String"))
                .with_field(
                    SchemaField::relationship(
                        "members",
                        "Player",
                        "HAS_MEMBER",
                        RelationDirection::Out,
                    )
                    .array(),
                ),
        )
        .unwrap();
    schema
        .add_node(
            NodeType::new("Player")
                .with_field(SchemaField::primitive("name", "String"))
                .with_field(SchemaField::primitive("score", "Int").with_coalesce(json!(0))),
        )
        .unwrap();
    schema
        .add_union(UnionType::new("SearchResult", &["Movie", "Series"]))
        .unwrap();
    schema.validate().unwrap();
    schema
}

/// Compile and return the rendered filter with its sorted parameter names.
pub fn compile_rendered(
    schema: &SchemaModel,
    type_name: &str,
    filter: JsonValue,
) -> Result<(String, Vec<String>)> {
    let compiled = compile_where(schema, type_name, &filter)?;
    let names = compiled.params.names().map(str::to_string).collect();
    Ok((compiled.to_cypher(), names))
}
