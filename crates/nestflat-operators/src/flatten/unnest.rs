//! Bottom-up unnest: expand root rows through every repetition level.
//!
//! Each root row is the root of a tree whose branching factor at level `L` is
//! the width of the governing list's offset range for the parent position. A
//! depth-first walk with one explicit cursor per level visits the leaves of
//! that tree in order; every position reached at `max_level` is one output
//! row. The walk records, per level, which source index the row reads from,
//! so shallower values repeat simply because their index repeats. Values are
//! then gathered column-at-a-time by the output registry.

use std::ops::Range;

use nestflat_core::error::{Error, Result};
use nestflat_core::types::{ListArray, NestedColumn, RowBatch};

use super::classify::LevelMap;
use super::output::OutputRegistry;

/// Source index per level for each selected output row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowSelection {
    indices: Vec<Vec<usize>>,
}

impl RowSelection {
    fn new(levels: usize, capacity: usize) -> Self {
        Self {
            indices: (0..levels).map(|_| Vec::with_capacity(capacity)).collect(),
        }
    }

    fn push(&mut self, path: &[usize]) {
        for (indices, &idx) in self.indices.iter_mut().zip(path) {
            indices.push(idx);
        }
    }

    pub fn num_rows(&self) -> usize {
        self.indices.first().map(Vec::len).unwrap_or(0)
    }

    /// Indices into the element space of `level` (root rows at level 0).
    pub fn level(&self, level: usize) -> &[usize] {
        self.indices.get(level).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Offset walker over the governing lists of a classified column.
pub struct Unnester<'a> {
    root_rows: usize,
    /// `lists[l]` governs level `l + 1`.
    lists: Vec<(&'a str, &'a ListArray)>,
}

impl<'a> Unnester<'a> {
    pub fn new(levels: &LevelMap<'a, NestedColumn>) -> Result<Self> {
        let mut lists = Vec::with_capacity(levels.max_level());
        for (level, desc) in levels.levels().iter().enumerate().skip(1) {
            let column = desc.governing.ok_or_else(|| {
                Error::Invariant(format!("level {level} has no governing list"))
            })?;
            let list = column.as_list().ok_or_else(|| {
                Error::Invariant(format!("governing column '{}' is not a list", column.name))
            })?;
            lists.push((column.name.as_str(), list));
        }
        Ok(Self {
            root_rows: levels.root().len(),
            lists,
        })
    }

    pub fn root_rows(&self) -> usize {
        self.root_rows
    }

    pub fn max_level(&self) -> usize {
        self.lists.len()
    }

    /// Output rows produced by `roots`, by the row-count law.
    pub fn count_rows(&self, roots: Range<usize>) -> Result<usize> {
        let mut rows = 0usize;
        self.walk(roots, |_| rows += 1)?;
        Ok(rows)
    }

    /// Select the output rows produced by `roots`, in root order.
    pub fn select(&self, roots: Range<usize>) -> Result<RowSelection> {
        let mut selection = RowSelection::new(self.max_level() + 1, roots.len());
        self.walk(roots, |path| selection.push(path))?;
        Ok(selection)
    }

    /// Element range at `level` owned by position `parent` of `level - 1`.
    fn child_range(&self, level: usize, parent: usize) -> Result<Range<usize>> {
        let (name, list) = self.lists[level - 1];
        list.value_range(name, parent)
    }

    /// Depth-first walk calling `emit` with the per-level positions of every
    /// output row. Terminates when the root cursor reaches `roots.end`.
    fn walk(&self, roots: Range<usize>, mut emit: impl FnMut(&[usize])) -> Result<()> {
        if roots.end > self.root_rows {
            return Err(Error::Invariant(format!(
                "root rows {}..{} out of bounds for {} rows",
                roots.start, roots.end, self.root_rows
            )));
        }

        let depth = self.max_level();
        let mut path = vec![0usize; depth + 1];
        let mut cursors: Vec<Range<usize>> = Vec::with_capacity(depth);

        for root in roots {
            path[0] = root;
            if depth == 0 {
                emit(&path);
                continue;
            }

            cursors.clear();
            cursors.push(self.child_range(1, root)?);
            loop {
                let level = cursors.len();
                let Some(cursor) = cursors.last_mut() else {
                    break;
                };
                let Some(idx) = cursor.next() else {
                    cursors.pop();
                    continue;
                };
                path[level] = idx;
                if level == depth {
                    emit(&path);
                } else {
                    cursors.push(self.child_range(level + 1, idx)?);
                }
            }
        }
        Ok(())
    }
}

/// Expand every root row of the classified column into a flat batch.
///
/// All-or-nothing: any offset or type error discards the partial output.
pub fn unnest(levels: &LevelMap<'_, NestedColumn>) -> Result<RowBatch> {
    let unnester = Unnester::new(levels)?;
    let selection = unnester.select(0..unnester.root_rows())?;
    let mut registry = OutputRegistry::new(levels, selection.num_rows())?;
    registry.append(&selection)?;
    registry.finish()
}

#[cfg(test)]
mod tests {
    use nestflat_core::config::LeafNaming;

    use super::super::classify::classify;
    use super::*;

    fn ints(name: &str, values: Vec<i32>) -> NestedColumn {
        NestedColumn::primitive(name, values)
    }

    /// struct{ id, items: list<struct{ v, parts: list<p> }> }
    fn two_level(item_lengths: &[usize], part_lengths: &[usize]) -> NestedColumn {
        let parts_total: usize = part_lengths.iter().sum();
        let parts = ints("p", (0..parts_total as i32).collect());
        let item = NestedColumn::structure(
            "item",
            vec![
                ints("v", (0..part_lengths.len() as i32).map(|v| v * 10).collect()),
                NestedColumn::list_from_lengths("parts", part_lengths, parts).unwrap(),
            ],
        )
        .unwrap();
        NestedColumn::structure(
            "root",
            vec![
                ints("id", (0..item_lengths.len() as i32).collect()),
                NestedColumn::list_from_lengths("items", item_lengths, item).unwrap(),
            ],
        )
        .unwrap()
    }

    #[test]
    fn selection_repeats_outer_positions() {
        let root = two_level(&[2, 1], &[2, 0, 3]);
        let levels = classify(&root, &LeafNaming::Leaf).unwrap();
        let unnester = Unnester::new(&levels).unwrap();

        let selection = unnester.select(0..2).unwrap();
        // item 1 has no parts and drops out entirely.
        assert_eq!(selection.num_rows(), 5);
        assert_eq!(selection.level(0), &[0, 0, 1, 1, 1]);
        assert_eq!(selection.level(1), &[0, 0, 2, 2, 2]);
        assert_eq!(selection.level(2), &[0, 1, 2, 3, 4]);
        assert_eq!(unnester.count_rows(0..2).unwrap(), 5);
    }

    #[test]
    fn blocks_concatenate_to_whole() {
        let root = two_level(&[1, 2, 0, 1], &[1, 2, 3, 1]);
        let levels = classify(&root, &LeafNaming::Leaf).unwrap();
        let unnester = Unnester::new(&levels).unwrap();

        let whole = unnester.select(0..4).unwrap();
        let head = unnester.select(0..2).unwrap();
        let tail = unnester.select(2..4).unwrap();
        for level in 0..=2 {
            let joined: Vec<usize> = head
                .level(level)
                .iter()
                .chain(tail.level(level))
                .copied()
                .collect();
            assert_eq!(joined, whole.level(level));
        }
    }

    #[test]
    fn flat_struct_emits_one_row_per_root() {
        let root = NestedColumn::structure(
            "root",
            vec![ints("a", vec![1, 2, 3]), ints("b", vec![4, 5, 6])],
        )
        .unwrap();
        let levels = classify(&root, &LeafNaming::Leaf).unwrap();
        let batch = unnest(&levels).unwrap();
        assert_eq!(batch.num_rows(), 3);
        assert_eq!(batch.column_names(), vec!["a", "b"]);
    }

    #[test]
    fn malformed_offsets_abort() {
        let element = ints("v", vec![1, 2, 3]);
        let root = NestedColumn::structure(
            "root",
            vec![
                ints("id", vec![1, 2]),
                NestedColumn::list("values", vec![0, 2, 1], element),
            ],
        )
        .unwrap();
        let levels = classify(&root, &LeafNaming::Leaf).unwrap();
        match unnest(&levels) {
            Err(Error::OffsetRange { column, .. }) => assert_eq!(column, "values"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn rejects_out_of_range_roots() {
        let root = two_level(&[1], &[1]);
        let levels = classify(&root, &LeafNaming::Leaf).unwrap();
        let unnester = Unnester::new(&levels).unwrap();
        assert!(matches!(unnester.select(0..2), Err(Error::Invariant(_))));
    }
}
