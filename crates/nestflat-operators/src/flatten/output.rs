//! Output column registry.
//!
//! Built once from the level map before any row is expanded: one typed,
//! append-only output column per leaf, allocated with the leaf's runtime
//! kind. Appends gather source values through a [`RowSelection`].

use std::mem::size_of;

use nestflat_core::error::{Error, Result};
use nestflat_core::types::{Column, NestedColumn, PrimitiveArray, RowBatch};

use super::classify::LevelMap;
use super::unnest::RowSelection;

struct Slot<'a> {
    level: usize,
    source: &'a PrimitiveArray,
    column: Column,
}

pub struct OutputRegistry<'a> {
    slots: Vec<Slot<'a>>,
    /// Rows appended so far; also counts rows of a registry with no slots.
    rows: usize,
}

impl<'a> OutputRegistry<'a> {
    /// Allocate every output column with room for `capacity` rows.
    pub fn new(levels: &LevelMap<'a, NestedColumn>, capacity: usize) -> Result<Self> {
        let mut slots = Vec::with_capacity(levels.num_leaves());
        for (level, leaf) in levels.leaves() {
            let source = leaf.node.as_primitive().ok_or_else(|| {
                Error::Invariant(format!("leaf '{}' is not primitive", leaf.node.name))
            })?;
            let data_type = source.data_type();
            let values = PrimitiveArray::with_capacity(&data_type, capacity).ok_or_else(|| {
                Error::UnsupportedLeafType {
                    column: leaf.node.name.clone(),
                    data_type: format!("{data_type:?}"),
                }
            })?;
            slots.push(Slot {
                level,
                source,
                column: Column {
                    name: leaf.output_name.clone(),
                    values,
                },
            });
        }
        Ok(Self { slots, rows: 0 })
    }

    pub fn reserve(&mut self, rows: usize) {
        for slot in &mut self.slots {
            slot.column.values.reserve(rows);
        }
    }

    /// Append the selected rows to every output column.
    pub fn append(&mut self, selection: &RowSelection) -> Result<()> {
        for slot in &mut self.slots {
            slot.column
                .values
                .extend_take(slot.source, selection.level(slot.level))?;
        }
        self.rows += selection.num_rows();
        Ok(())
    }

    pub fn num_rows(&self) -> usize {
        self.rows
    }

    /// Estimated bytes one output row adds across all columns.
    pub fn bytes_per_row(&self) -> usize {
        self.slots.iter().map(|s| value_bytes(s.source)).sum()
    }

    pub fn finish(self) -> Result<RowBatch> {
        let columns = self.slots.into_iter().map(|s| s.column).collect();
        RowBatch::new(columns, self.rows)
    }
}

/// Per-value size of an output column fed from `source`; variable-width
/// kinds add the source's mean payload length.
fn value_bytes(source: &PrimitiveArray) -> usize {
    match source {
        PrimitiveArray::Boolean(_) => size_of::<Option<bool>>(),
        PrimitiveArray::Int32(_) => size_of::<Option<i32>>(),
        PrimitiveArray::Int64(_) => size_of::<Option<i64>>(),
        PrimitiveArray::Float32(_) => size_of::<Option<f32>>(),
        PrimitiveArray::Float64(_) => size_of::<Option<f64>>(),
        PrimitiveArray::Utf8(values) => {
            let payload = mean_len(values.iter().map(|v| v.as_ref().map_or(0, String::len)));
            size_of::<Option<String>>() + payload
        }
        PrimitiveArray::Binary(values) => {
            let payload = mean_len(values.iter().map(|v| v.as_ref().map_or(0, Vec::len)));
            size_of::<Option<Vec<u8>>>() + payload
        }
    }
}

fn mean_len(lengths: impl ExactSizeIterator<Item = usize>) -> usize {
    let count = lengths.len();
    if count == 0 {
        return 0;
    }
    lengths.sum::<usize>().div_ceil(count)
}

#[cfg(test)]
mod tests {
    use nestflat_core::config::LeafNaming;
    use nestflat_core::types::Scalar;

    use super::super::classify::classify;
    use super::*;

    #[test]
    fn registry_preserves_kinds_and_order() {
        let root = NestedColumn::structure(
            "root",
            vec![
                NestedColumn::primitive("flag", vec![true, false]),
                NestedColumn::primitive("ratio", vec![0.5f32, 1.5]),
                NestedColumn::primitive("label", vec!["ab", "cdef"]),
            ],
        )
        .unwrap();
        let levels = classify(&root, &LeafNaming::Leaf).unwrap();
        let mut registry = OutputRegistry::new(&levels, 2).unwrap();
        assert_eq!(registry.num_rows(), 0);

        let selection = super::super::unnest::Unnester::new(&levels)
            .unwrap()
            .select(0..2)
            .unwrap();
        registry.append(&selection).unwrap();
        assert_eq!(registry.num_rows(), 2);
        let batch = registry.finish().unwrap();

        assert_eq!(batch.column_names(), vec!["flag", "ratio", "label"]);
        let label = batch.column("label").unwrap();
        assert_eq!(label.values.value(1), Some(Scalar::Str("cdef".into())));
        assert_eq!(
            batch.column("ratio").map(Column::data_type),
            Some(nestflat_core::schema::DataType::Float32)
        );
    }

    #[test]
    fn string_estimate_includes_payload() {
        let short = PrimitiveArray::from(vec!["a"]);
        let long = PrimitiveArray::from(vec!["a much longer payload"]);
        assert!(value_bytes(&long) > value_bytes(&short));
        let empty = PrimitiveArray::from(Vec::<&str>::new());
        assert_eq!(value_bytes(&empty), size_of::<Option<String>>());
    }
}
