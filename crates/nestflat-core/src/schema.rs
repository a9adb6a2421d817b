//! Logical schema types. Pure data; no Arrow dependency here.
//!
//! `DataType` is a closed tree: primitive kinds at the leaves, `List` and
//! `Struct` as the only nesting constructors. The column model in `types.rs`
//! reports its shape through these types.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataType {
    Boolean,
    Int32,
    Int64,
    Float32,
    Float64,
    Utf8,
    Binary,
    Date64,
    Decimal128,
    /// Variable-length list; the boxed field describes the element.
    List(Box<Field>),
    /// Ordered named children, positionally aligned with the parent row.
    Struct(Vec<Field>),
}

impl DataType {
    pub fn is_nested(&self) -> bool {
        matches!(self, DataType::List(_) | DataType::Struct(_))
    }

    pub fn is_primitive(&self) -> bool {
        !self.is_nested()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub data_type: DataType,
    pub nullable: bool,
}

impl Field {
    pub fn new(name: impl Into<String>, data_type: DataType, nullable: bool) -> Self {
        Self {
            name: name.into(),
            data_type,
            nullable,
        }
    }

    /// Shorthand for a nullable list field with the given element.
    pub fn list(name: impl Into<String>, element: Field) -> Self {
        Self::new(name, DataType::List(Box::new(element)), true)
    }

    /// Shorthand for a nullable struct field with the given children.
    pub fn structure(name: impl Into<String>, children: Vec<Field>) -> Self {
        Self::new(name, DataType::Struct(children), true)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    pub fields: Vec<Field>,
}

impl Schema {
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    pub fn field(&self, idx: usize) -> Option<&Field> {
        self.fields.get(idx)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    pub fn field_with_name(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}
