//! Schema classification: group primitive leaves by repetition level.
//!
//! The walk is a structural recursion over the type tree. A struct is
//! transparent (its fields stay at the parent's level under the parent's
//! governing list); a list moves its element one level deeper and becomes the
//! governing list of that level. The governing list of a leaf is therefore
//! always its nearest enclosing list, however many struct layers sit between
//! them.
//!
//! Classification is generic over [`NestedNode`] so the same walk serves
//! runtime columns ([`NestedColumn`]) and plan-time schemas ([`Field`]).

use std::collections::HashSet;

use nestflat_core::config::LeafNaming;
use nestflat_core::error::{Error, Result};
use nestflat_core::schema::{DataType, Field};
use nestflat_core::types::{NestedArray, NestedColumn, PrimitiveArray};

/// One step of structural recursion over a nested tree.
pub enum Shape<'a, T> {
    Primitive(DataType),
    List(&'a T),
    Struct(&'a [T]),
}

/// A node of a nested type tree.
pub trait NestedNode: Sized {
    fn name(&self) -> &str;
    fn shape(&self) -> Shape<'_, Self>;
    fn is_nullable(&self) -> bool {
        true
    }
}

impl NestedNode for NestedColumn {
    fn name(&self) -> &str {
        &self.name
    }

    fn shape(&self) -> Shape<'_, Self> {
        match &self.array {
            NestedArray::Primitive(values) => Shape::Primitive(values.data_type()),
            NestedArray::List(list) => Shape::List(list.values()),
            NestedArray::Struct(fields) => Shape::Struct(fields.fields()),
        }
    }
}

impl NestedNode for Field {
    fn name(&self) -> &str {
        &self.name
    }

    fn shape(&self) -> Shape<'_, Self> {
        match &self.data_type {
            DataType::List(element) => Shape::List(element.as_ref()),
            DataType::Struct(children) => Shape::Struct(children.as_slice()),
            other => Shape::Primitive(other.clone()),
        }
    }

    fn is_nullable(&self) -> bool {
        self.nullable
    }
}

/// A primitive leaf and the name of the output column it produces.
#[derive(Debug)]
pub struct Leaf<'a, T> {
    pub node: &'a T,
    pub output_name: String,
    pub data_type: DataType,
}

/// Everything classified at one repetition level.
#[derive(Debug)]
pub struct LevelDescriptor<'a, T> {
    /// List whose offsets repeat this level; `None` only at level 0.
    pub governing: Option<&'a T>,
    /// Leaves in discovery order (depth-first, struct field order).
    pub leaves: Vec<Leaf<'a, T>>,
}

impl<'a, T> LevelDescriptor<'a, T> {
    fn empty() -> Self {
        Self {
            governing: None,
            leaves: Vec::new(),
        }
    }
}

/// Repetition levels `0..=max_level` of one root column.
#[derive(Debug)]
pub struct LevelMap<'a, T> {
    root: &'a T,
    levels: Vec<LevelDescriptor<'a, T>>,
}

impl<'a, T> LevelMap<'a, T> {
    pub fn root(&self) -> &'a T {
        self.root
    }

    pub fn max_level(&self) -> usize {
        self.levels.len() - 1
    }

    pub fn level(&self, level: usize) -> Option<&LevelDescriptor<'a, T>> {
        self.levels.get(level)
    }

    pub fn levels(&self) -> &[LevelDescriptor<'a, T>] {
        &self.levels
    }

    /// All leaves as `(level, leaf)`, shallowest level first.
    pub fn leaves(&self) -> impl Iterator<Item = (usize, &Leaf<'a, T>)> + '_ {
        self.levels
            .iter()
            .enumerate()
            .flat_map(|(level, desc)| desc.leaves.iter().map(move |leaf| (level, leaf)))
    }

    pub fn num_leaves(&self) -> usize {
        self.levels.iter().map(|desc| desc.leaves.len()).sum()
    }
}

/// Classify the tree under `root` into repetition levels.
///
/// Fails with `UnsupportedRootType` for a primitive root, `UnsupportedLeafType`
/// for a leaf kind without flat storage, `ConflictingRepetition` when two
/// different lists would repeat the same level, and `DuplicateColumn` when
/// two leaves map to one output name.
pub fn classify<'a, T: NestedNode>(root: &'a T, naming: &LeafNaming) -> Result<LevelMap<'a, T>> {
    if let Shape::Primitive(data_type) = root.shape() {
        return Err(Error::UnsupportedRootType {
            column: root.name().to_string(),
            data_type,
        });
    }

    let mut classifier = Classifier {
        naming,
        levels: vec![LevelDescriptor::empty()],
        path: Vec::new(),
        names: HashSet::new(),
    };
    classifier.visit(root, 0, false)?;

    Ok(LevelMap {
        root,
        levels: classifier.levels,
    })
}

struct Classifier<'a, 'n, T> {
    naming: &'n LeafNaming,
    levels: Vec<LevelDescriptor<'a, T>>,
    /// Struct-field names from the root down to the current node.
    path: Vec<&'a str>,
    names: HashSet<String>,
}

impl<'a, 'n, T: NestedNode> Classifier<'a, 'n, T> {
    /// `named` is false for the root and for list elements, which add no
    /// segment to the output path.
    fn visit(&mut self, node: &'a T, level: usize, named: bool) -> Result<()> {
        match node.shape() {
            Shape::Primitive(data_type) => self.add_leaf(node, level, named, data_type),
            Shape::Struct(children) => {
                self.enter(node, named);
                for child in children {
                    self.visit(child, level, true)?;
                }
                self.leave(named);
                Ok(())
            }
            Shape::List(element) => {
                self.enter(node, named);
                self.govern(level + 1, node)?;
                self.visit(element, level + 1, false)?;
                self.leave(named);
                Ok(())
            }
        }
    }

    fn enter(&mut self, node: &'a T, named: bool) {
        if named {
            self.path.push(node.name());
        }
    }

    fn leave(&mut self, named: bool) {
        if named {
            self.path.pop();
        }
    }

    fn govern(&mut self, level: usize, list: &'a T) -> Result<()> {
        while self.levels.len() <= level {
            self.levels.push(LevelDescriptor::empty());
        }
        let slot = &mut self.levels[level];
        if let Some(existing) = slot.governing {
            return Err(Error::ConflictingRepetition {
                level,
                first: existing.name().to_string(),
                second: list.name().to_string(),
            });
        }
        slot.governing = Some(list);
        Ok(())
    }

    fn add_leaf(
        &mut self,
        node: &'a T,
        level: usize,
        named: bool,
        data_type: DataType,
    ) -> Result<()> {
        if PrimitiveArray::with_capacity(&data_type, 0).is_none() {
            return Err(Error::UnsupportedLeafType {
                column: node.name().to_string(),
                data_type: format!("{data_type:?}"),
            });
        }

        let output_name = self.output_name(node, named);
        if !self.names.insert(output_name.clone()) {
            return Err(Error::DuplicateColumn(output_name));
        }

        self.levels[level].leaves.push(Leaf {
            node,
            output_name,
            data_type,
        });
        Ok(())
    }

    fn output_name(&self, node: &'a T, named: bool) -> String {
        match self.naming {
            LeafNaming::Leaf => node.name().to_string(),
            LeafNaming::Path { separator } => {
                let mut segments = self.path.clone();
                if named || segments.is_empty() {
                    segments.push(node.name());
                }
                segments.join(separator.as_str())
            }
        }
    }
}
