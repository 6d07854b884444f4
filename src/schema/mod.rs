// src/schema/mod.rs
// Typed, immutable model of the graph schema the filters are compiled against.

pub mod global_id;

use crate::error::{FilterError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

pub use global_id::{from_global_id, to_global_id, GlobalId};

// ============================================================================
// Fields
// ============================================================================

/// Declared type of a field as written in the type definitions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TypeMeta {
    pub name: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub array: bool,
}

impl TypeMeta {
    pub fn named(name: &str) -> Self {
        TypeMeta {
            name: name.to_string(),
            required: false,
            array: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TemporalType {
    DateTime,
    LocalDateTime,
    Date,
    Time,
    LocalTime,
    Duration,
}

impl TemporalType {
    /// Cypher function converting a raw parameter into this temporal type
    pub fn cypher_function(&self) -> &'static str {
        match self {
            TemporalType::DateTime => "datetime",
            TemporalType::LocalDateTime => "localdatetime",
            TemporalType::Date => "date",
            TemporalType::Time => "time",
            TemporalType::LocalTime => "localtime",
            TemporalType::Duration => "duration",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SpatialType {
    Point,
    CartesianPoint,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationDirection {
    In,
    Out,
    Undirected,
}

/// A relationship to another node, interface or union type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RelationField {
    pub related_type: String,
    /// Edge label in the graph
    pub rel_type: String,
    pub direction: RelationDirection,
    /// Name of the relationship-properties type, when the edge carries properties
    #[serde(default)]
    pub properties: Option<String>,
}

/// The `<field>Connection` view over a relationship field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConnectionField {
    pub relationship_field: String,
    #[serde(default)]
    pub properties: Option<String>,
}

/// A field computed by a schema-defined Cypher statement. The statement sees
/// the owning node as `this` and returns its value in `column_name`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CypherField {
    pub statement: String,
    pub column_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Primitive,
    Temporal(TemporalType),
    Spatial(SpatialType),
    Enum,
    Relationship(RelationField),
    Connection(ConnectionField),
    CypherComputed(CypherField),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SchemaField {
    pub name: String,
    pub kind: FieldKind,
    pub type_meta: TypeMeta,
    /// Property name in the database when it differs from the field name
    #[serde(default)]
    pub db_alias: Option<String>,
    /// Substituted when the property is absent on a node
    #[serde(default)]
    pub coalesce_default: Option<serde_json::Value>,
}

impl SchemaField {
    fn new(name: &str, kind: FieldKind, type_name: &str) -> Self {
        SchemaField {
            name: name.to_string(),
            kind,
            type_meta: TypeMeta::named(type_name),
            db_alias: None,
            coalesce_default: None,
        }
    }

    pub fn primitive(name: &str, type_name: &str) -> Self {
        Self::new(name, FieldKind::Primitive, type_name)
    }

    pub fn enumeration(name: &str, type_name: &str) -> Self {
        Self::new(name, FieldKind::Enum, type_name)
    }

    pub fn temporal(name: &str, temporal: TemporalType) -> Self {
        let type_name = match temporal {
            TemporalType::DateTime => "DateTime",
            TemporalType::LocalDateTime => "LocalDateTime",
            TemporalType::Date => "Date",
            TemporalType::Time => "Time",
            TemporalType::LocalTime => "LocalTime",
            TemporalType::Duration => "Duration",
        };
        Self::new(name, FieldKind::Temporal(temporal), type_name)
    }

    pub fn spatial(name: &str, spatial: SpatialType) -> Self {
        let type_name = match spatial {
            SpatialType::Point => "Point",
            SpatialType::CartesianPoint => "CartesianPoint",
        };
        Self::new(name, FieldKind::Spatial(spatial), type_name)
    }

    pub fn relationship(
        name: &str,
        related_type: &str,
        rel_type: &str,
        direction: RelationDirection,
    ) -> Self {
        Self::new(
            name,
            FieldKind::Relationship(RelationField {
                related_type: related_type.to_string(),
                rel_type: rel_type.to_string(),
                direction,
                properties: None,
            }),
            related_type,
        )
    }

    /// Connection over `relationship_field`; the field name is `<relationship_field>Connection`.
    pub fn connection(relationship_field: &str) -> Self {
        Self::new(
            &format!("{}Connection", relationship_field),
            FieldKind::Connection(ConnectionField {
                relationship_field: relationship_field.to_string(),
                properties: None,
            }),
            &format!("{}Connection", relationship_field),
        )
    }

    pub fn cypher(name: &str, type_name: &str, statement: &str, column_name: &str) -> Self {
        Self::new(
            name,
            FieldKind::CypherComputed(CypherField {
                statement: statement.to_string(),
                column_name: column_name.to_string(),
            }),
            type_name,
        )
    }

    pub fn required(mut self) -> Self {
        self.type_meta.required = true;
        self
    }

    pub fn array(mut self) -> Self {
        self.type_meta.array = true;
        self
    }

    pub fn with_db_alias(mut self, alias: &str) -> Self {
        self.db_alias = Some(alias.to_string());
        self
    }

    pub fn with_coalesce(mut self, default: serde_json::Value) -> Self {
        self.coalesce_default = Some(default);
        self
    }

    /// Attach a relationship-properties type to a relationship or connection field.
    pub fn with_properties(mut self, properties: &str) -> Self {
        match &mut self.kind {
            FieldKind::Relationship(rel) => rel.properties = Some(properties.to_string()),
            FieldKind::Connection(conn) => conn.properties = Some(properties.to_string()),
            _ => {}
        }
        self
    }

    pub fn is_array(&self) -> bool {
        self.type_meta.array
    }

    /// Property name used in Cypher
    pub fn db_property(&self) -> &str {
        self.db_alias.as_deref().unwrap_or(&self.name)
    }

    pub fn as_relationship(&self) -> Option<&RelationField> {
        match &self.kind {
            FieldKind::Relationship(rel) => Some(rel),
            _ => None,
        }
    }
}

// ============================================================================
// Types
// ============================================================================

/// Anything that owns filterable fields: node, interface and
/// relationship-properties types.
pub trait FieldContainer {
    fn type_name(&self) -> &str;

    fn fields(&self) -> &[SchemaField];

    fn field(&self, name: &str) -> Option<&SchemaField> {
        self.fields().iter().find(|f| f.name == name)
    }

    /// Field backing opaque global ids, for node types that declare one
    fn global_id_field(&self) -> Option<&str> {
        None
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NodeType {
    pub name: String,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub fields: Vec<SchemaField>,
    #[serde(default)]
    pub global_id_field: Option<String>,
    #[serde(default)]
    pub implements: Vec<String>,
}

impl NodeType {
    pub fn new(name: &str) -> Self {
        NodeType {
            name: name.to_string(),
            labels: vec![name.to_string()],
            fields: Vec::new(),
            global_id_field: None,
            implements: Vec::new(),
        }
    }

    pub fn with_field(mut self, field: SchemaField) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_labels(mut self, labels: &[&str]) -> Self {
        self.labels = labels.iter().map(|l| l.to_string()).collect();
        self
    }

    pub fn with_global_id(mut self, field: &str) -> Self {
        self.global_id_field = Some(field.to_string());
        self
    }

    pub fn implementing(mut self, interface: &str) -> Self {
        self.implements.push(interface.to_string());
        self
    }

    /// Labels the node is matched with; the type name when none are declared.
    pub fn main_labels(&self) -> Vec<String> {
        if self.labels.is_empty() {
            vec![self.name.clone()]
        } else {
            self.labels.clone()
        }
    }
}

impl FieldContainer for NodeType {
    fn type_name(&self) -> &str {
        &self.name
    }

    fn fields(&self) -> &[SchemaField] {
        &self.fields
    }

    fn global_id_field(&self) -> Option<&str> {
        self.global_id_field.as_deref()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InterfaceType {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<SchemaField>,
}

impl InterfaceType {
    pub fn new(name: &str) -> Self {
        InterfaceType {
            name: name.to_string(),
            fields: Vec::new(),
        }
    }

    pub fn with_field(mut self, field: SchemaField) -> Self {
        self.fields.push(field);
        self
    }
}

impl FieldContainer for InterfaceType {
    fn type_name(&self) -> &str {
        &self.name
    }

    fn fields(&self) -> &[SchemaField] {
        &self.fields
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UnionType {
    pub name: String,
    pub members: Vec<String>,
}

impl UnionType {
    pub fn new(name: &str, members: &[&str]) -> Self {
        UnionType {
            name: name.to_string(),
            members: members.iter().map(|m| m.to_string()).collect(),
        }
    }
}

/// Properties carried by an edge (the `edge` side of a connection)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RelationshipType {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<SchemaField>,
}

impl RelationshipType {
    pub fn new(name: &str) -> Self {
        RelationshipType {
            name: name.to_string(),
            fields: Vec::new(),
        }
    }

    pub fn with_field(mut self, field: SchemaField) -> Self {
        self.fields.push(field);
        self
    }
}

impl FieldContainer for RelationshipType {
    fn type_name(&self) -> &str {
        &self.name
    }

    fn fields(&self) -> &[SchemaField] {
        &self.fields
    }
}

/// Resolved target of a relationship field
#[derive(Debug, Clone, Copy)]
pub enum Entity<'a> {
    Node(&'a NodeType),
    Interface(&'a InterfaceType),
    Union(&'a UnionType),
}

impl<'a> Entity<'a> {
    pub fn name(&self) -> &'a str {
        match self {
            Entity::Node(n) => &n.name,
            Entity::Interface(i) => &i.name,
            Entity::Union(u) => &u.name,
        }
    }
}

// ============================================================================
// Schema Model
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SchemaModel {
    #[serde(default)]
    nodes: BTreeMap<String, NodeType>,
    #[serde(default)]
    interfaces: BTreeMap<String, InterfaceType>,
    #[serde(default)]
    unions: BTreeMap<String, UnionType>,
    #[serde(default)]
    relationship_types: BTreeMap<String, RelationshipType>,
}

impl SchemaModel {
    pub fn new() -> Self {
        SchemaModel::default()
    }

    /// Deserialize and validate a schema model.
    pub fn from_json(source: &str) -> Result<Self> {
        let model: SchemaModel =
            serde_json::from_str(source).map_err(|e| FilterError::InvalidSchema(e.to_string()))?;
        model.validate()?;
        Ok(model)
    }

    fn ensure_unique_name(&self, name: &str) -> Result<()> {
        if self.nodes.contains_key(name)
            || self.interfaces.contains_key(name)
            || self.unions.contains_key(name)
            || self.relationship_types.contains_key(name)
        {
            return Err(FilterError::InvalidSchema(format!(
                "type `{}` is defined more than once",
                name
            )));
        }
        Ok(())
    }

    pub fn add_node(&mut self, node: NodeType) -> Result<()> {
        self.ensure_unique_name(&node.name)?;
        self.nodes.insert(node.name.clone(), node);
        Ok(())
    }

    pub fn add_interface(&mut self, interface: InterfaceType) -> Result<()> {
        self.ensure_unique_name(&interface.name)?;
        self.interfaces.insert(interface.name.clone(), interface);
        Ok(())
    }

    pub fn add_union(&mut self, union: UnionType) -> Result<()> {
        self.ensure_unique_name(&union.name)?;
        self.unions.insert(union.name.clone(), union);
        Ok(())
    }

    pub fn add_relationship_type(&mut self, rel: RelationshipType) -> Result<()> {
        self.ensure_unique_name(&rel.name)?;
        self.relationship_types.insert(rel.name.clone(), rel);
        Ok(())
    }

    pub fn find_node_type(&self, name: &str) -> Option<&NodeType> {
        self.nodes.get(name)
    }

    pub fn find_interface(&self, name: &str) -> Option<&InterfaceType> {
        self.interfaces.get(name)
    }

    pub fn find_union(&self, name: &str) -> Option<&UnionType> {
        self.unions.get(name)
    }

    pub fn find_relationship_type(&self, name: &str) -> Option<&RelationshipType> {
        self.relationship_types.get(name)
    }

    pub fn entity(&self, name: &str) -> Option<Entity<'_>> {
        if let Some(node) = self.nodes.get(name) {
            return Some(Entity::Node(node));
        }
        if let Some(interface) = self.interfaces.get(name) {
            return Some(Entity::Interface(interface));
        }
        self.unions.get(name).map(Entity::Union)
    }

    /// Node types implementing an interface, in name order
    pub fn implementations(&self, interface: &str) -> Vec<&NodeType> {
        self.nodes
            .values()
            .filter(|n| n.implements.iter().any(|i| i == interface))
            .collect()
    }

    /// Concrete node types behind an entity
    pub fn concrete_types<'a>(&'a self, entity: &Entity<'a>) -> Result<Vec<&'a NodeType>> {
        match entity {
            Entity::Node(n) => Ok(vec![*n]),
            Entity::Interface(i) => Ok(self.implementations(&i.name)),
            Entity::Union(u) => u
                .members
                .iter()
                .map(|m| {
                    self.find_node_type(m)
                        .ok_or_else(|| FilterError::UnknownType(m.clone()))
                })
                .collect(),
        }
    }

    /// Check every cross-type reference once, at load time.
    pub fn validate(&self) -> Result<()> {
        for node in self.nodes.values() {
            self.validate_fields(&node.name, &node.fields)?;
            if let Some(global) = &node.global_id_field {
                if node.field(global).is_none() {
                    return Err(FilterError::InvalidSchema(format!(
                        "global id field `{}` missing on `{}`",
                        global, node.name
                    )));
                }
            }
            for interface in &node.implements {
                if !self.interfaces.contains_key(interface) {
                    return Err(FilterError::InvalidSchema(format!(
                        "`{}` implements unknown interface `{}`",
                        node.name, interface
                    )));
                }
            }
        }
        for interface in self.interfaces.values() {
            self.validate_fields(&interface.name, &interface.fields)?;
        }
        for rel in self.relationship_types.values() {
            self.validate_fields(&rel.name, &rel.fields)?;
        }
        for union in self.unions.values() {
            for member in &union.members {
                if !self.nodes.contains_key(member) {
                    return Err(FilterError::InvalidSchema(format!(
                        "union `{}` has unknown member `{}`",
                        union.name, member
                    )));
                }
            }
        }
        Ok(())
    }

    fn validate_fields(&self, owner: &str, fields: &[SchemaField]) -> Result<()> {
        let mut seen = HashSet::new();
        for field in fields {
            if !seen.insert(field.name.as_str()) {
                return Err(FilterError::InvalidSchema(format!(
                    "field `{}` declared twice on `{}`",
                    field.name, owner
                )));
            }
            match &field.kind {
                FieldKind::Relationship(rel) => {
                    if self.entity(&rel.related_type).is_none() {
                        return Err(FilterError::InvalidSchema(format!(
                            "`{}.{}` targets unknown type `{}`",
                            owner, field.name, rel.related_type
                        )));
                    }
                    self.validate_properties_ref(owner, &field.name, rel.properties.as_deref())?;
                }
                FieldKind::Connection(conn) => {
                    let target = fields.iter().find(|f| f.name == conn.relationship_field);
                    if target.and_then(SchemaField::as_relationship).is_none() {
                        return Err(FilterError::InvalidSchema(format!(
                            "connection `{}.{}` refers to missing relationship `{}`",
                            owner, field.name, conn.relationship_field
                        )));
                    }
                    self.validate_properties_ref(owner, &field.name, conn.properties.as_deref())?;
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn validate_properties_ref(&self, owner: &str, field: &str, props: Option<&str>) -> Result<()> {
        match props {
            Some(name) if !self.relationship_types.contains_key(name) => {
                Err(FilterError::InvalidSchema(format!(
                    "`{}.{}` uses unknown relationship properties `{}`",
                    owner, field, name
                )))
            }
            _ => Ok(()),
        }
    }
}
