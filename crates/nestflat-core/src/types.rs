//! Columnar value model: typed primitive vectors plus the nested
//! (list/struct) column tree that flatten consumes.
//!
//! Columns are immutable once built. List offsets follow the usual columnar
//! layout: `offsets.len() == rows + 1` and row `r` owns the element range
//! `offsets[r]..offsets[r + 1]`.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::schema::{DataType, Field, Schema};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Scalar {
    Null,
    Bool(bool),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Str(String),
    Bin(Vec<u8>),
}

/// Typed, nullable value vector. One variant per primitive kind with storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PrimitiveArray {
    Boolean(Vec<Option<bool>>),
    Int32(Vec<Option<i32>>),
    Int64(Vec<Option<i64>>),
    Float32(Vec<Option<f32>>),
    Float64(Vec<Option<f64>>),
    Utf8(Vec<Option<String>>),
    Binary(Vec<Option<Vec<u8>>>),
}

/// Runs `$body` with `$values` bound to the inner vector of any variant.
macro_rules! with_values {
    ($array:expr, $values:ident => $body:expr) => {
        match $array {
            PrimitiveArray::Boolean($values) => $body,
            PrimitiveArray::Int32($values) => $body,
            PrimitiveArray::Int64($values) => $body,
            PrimitiveArray::Float32($values) => $body,
            PrimitiveArray::Float64($values) => $body,
            PrimitiveArray::Utf8($values) => $body,
            PrimitiveArray::Binary($values) => $body,
        }
    };
}

impl PrimitiveArray {
    /// Allocate an empty array for `data_type`.
    ///
    /// Returns `None` for kinds without flat storage (nested kinds, `Date64`,
    /// `Decimal128`); callers turn that into `Error::UnsupportedLeafType`.
    pub fn with_capacity(data_type: &DataType, capacity: usize) -> Option<Self> {
        let array = match data_type {
            DataType::Boolean => PrimitiveArray::Boolean(Vec::with_capacity(capacity)),
            DataType::Int32 => PrimitiveArray::Int32(Vec::with_capacity(capacity)),
            DataType::Int64 => PrimitiveArray::Int64(Vec::with_capacity(capacity)),
            DataType::Float32 => PrimitiveArray::Float32(Vec::with_capacity(capacity)),
            DataType::Float64 => PrimitiveArray::Float64(Vec::with_capacity(capacity)),
            DataType::Utf8 => PrimitiveArray::Utf8(Vec::with_capacity(capacity)),
            DataType::Binary => PrimitiveArray::Binary(Vec::with_capacity(capacity)),
            DataType::Date64
            | DataType::Decimal128
            | DataType::List(_)
            | DataType::Struct(_) => return None,
        };
        Some(array)
    }

    pub fn data_type(&self) -> DataType {
        match self {
            PrimitiveArray::Boolean(_) => DataType::Boolean,
            PrimitiveArray::Int32(_) => DataType::Int32,
            PrimitiveArray::Int64(_) => DataType::Int64,
            PrimitiveArray::Float32(_) => DataType::Float32,
            PrimitiveArray::Float64(_) => DataType::Float64,
            PrimitiveArray::Utf8(_) => DataType::Utf8,
            PrimitiveArray::Binary(_) => DataType::Binary,
        }
    }

    pub fn len(&self) -> usize {
        with_values!(self, values => values.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn null_count(&self) -> usize {
        with_values!(self, values => values.iter().filter(|v| v.is_none()).count())
    }

    pub fn reserve(&mut self, additional: usize) {
        with_values!(self, values => values.reserve(additional))
    }

    /// Logical value at `idx`; `None` when out of bounds.
    pub fn value(&self, idx: usize) -> Option<Scalar> {
        let scalar = match self {
            PrimitiveArray::Boolean(v) => v.get(idx)?.map(Scalar::Bool),
            PrimitiveArray::Int32(v) => v.get(idx)?.map(Scalar::I32),
            PrimitiveArray::Int64(v) => v.get(idx)?.map(Scalar::I64),
            PrimitiveArray::Float32(v) => v.get(idx)?.map(Scalar::F32),
            PrimitiveArray::Float64(v) => v.get(idx)?.map(Scalar::F64),
            PrimitiveArray::Utf8(v) => v.get(idx)?.clone().map(Scalar::Str),
            PrimitiveArray::Binary(v) => v.get(idx)?.clone().map(Scalar::Bin),
        };
        Some(scalar.unwrap_or(Scalar::Null))
    }

    /// Append `source[i]` for every `i` in `indices`, in order.
    ///
    /// Both arrays must be of the same kind and every index must be in bounds
    /// of `source`; nothing is appended when either check fails.
    pub fn extend_take(&mut self, source: &PrimitiveArray, indices: &[usize]) -> Result<()> {
        let source_len = source.len();
        if let Some(&idx) = indices.iter().find(|&&idx| idx >= source_len) {
            return Err(Error::Invariant(format!(
                "take index {idx} out of bounds for source of length {source_len}"
            )));
        }

        match (self, source) {
            (PrimitiveArray::Boolean(out), PrimitiveArray::Boolean(src)) => {
                take_into(out, src, indices)
            }
            (PrimitiveArray::Int32(out), PrimitiveArray::Int32(src)) => {
                take_into(out, src, indices)
            }
            (PrimitiveArray::Int64(out), PrimitiveArray::Int64(src)) => {
                take_into(out, src, indices)
            }
            (PrimitiveArray::Float32(out), PrimitiveArray::Float32(src)) => {
                take_into(out, src, indices)
            }
            (PrimitiveArray::Float64(out), PrimitiveArray::Float64(src)) => {
                take_into(out, src, indices)
            }
            (PrimitiveArray::Utf8(out), PrimitiveArray::Utf8(src)) => take_into(out, src, indices),
            (PrimitiveArray::Binary(out), PrimitiveArray::Binary(src)) => {
                take_into(out, src, indices)
            }
            (out, src) => {
                return Err(Error::Invariant(format!(
                    "cannot append {:?} values to a {:?} array",
                    src.data_type(),
                    out.data_type()
                )))
            }
        }
        Ok(())
    }
}

fn take_into<T: Clone>(out: &mut Vec<Option<T>>, src: &[Option<T>], indices: &[usize]) {
    out.extend(indices.iter().map(|&idx| src[idx].clone()));
}

macro_rules! impl_from_vec {
    ($native:ty, $variant:ident) => {
        impl From<Vec<$native>> for PrimitiveArray {
            fn from(values: Vec<$native>) -> Self {
                PrimitiveArray::$variant(values.into_iter().map(Some).collect())
            }
        }

        impl From<Vec<Option<$native>>> for PrimitiveArray {
            fn from(values: Vec<Option<$native>>) -> Self {
                PrimitiveArray::$variant(values)
            }
        }
    };
}

impl_from_vec!(bool, Boolean);
impl_from_vec!(i32, Int32);
impl_from_vec!(i64, Int64);
impl_from_vec!(f32, Float32);
impl_from_vec!(f64, Float64);
impl_from_vec!(String, Utf8);
impl_from_vec!(Vec<u8>, Binary);

impl From<Vec<&str>> for PrimitiveArray {
    fn from(values: Vec<&str>) -> Self {
        PrimitiveArray::Utf8(values.into_iter().map(|s| Some(s.to_string())).collect())
    }
}

impl From<Vec<Option<&str>>> for PrimitiveArray {
    fn from(values: Vec<Option<&str>>) -> Self {
        PrimitiveArray::Utf8(values.into_iter().map(|s| s.map(str::to_string)).collect())
    }
}

/// Variable-length list: an offset sequence over one element column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListArray {
    offsets: Vec<i32>,
    values: Box<NestedColumn>,
}

impl ListArray {
    /// Build without validating offsets. Malformed offsets surface as
    /// `Error::OffsetRange` when the list is traversed.
    pub fn new(offsets: Vec<i32>, values: NestedColumn) -> Self {
        Self {
            offsets,
            values: Box::new(values),
        }
    }

    /// Build and validate the whole offset sequence up front. `column` names
    /// the list in errors.
    pub fn try_new(column: &str, offsets: Vec<i32>, values: NestedColumn) -> Result<Self> {
        let list = Self::new(offsets, values);
        if let Some(&first) = list.offsets.first() {
            if first != 0 {
                return Err(Error::OffsetRange {
                    column: column.to_string(),
                    detail: format!("first offset is {first}, expected 0"),
                });
            }
        }
        for row in 0..list.len() {
            list.value_range(column, row)?;
        }
        Ok(list)
    }

    /// Build from per-row element counts.
    pub fn from_lengths(column: &str, lengths: &[usize], values: NestedColumn) -> Result<Self> {
        let mut offsets = Vec::with_capacity(lengths.len() + 1);
        let mut end: i32 = 0;
        offsets.push(end);
        for &len in lengths {
            let len = i32::try_from(len)
                .map_err(|_| Error::Schema(format!("list length {len} exceeds i32 offsets")))?;
            end = end
                .checked_add(len)
                .ok_or_else(|| Error::Schema("list offsets overflow i32".into()))?;
            offsets.push(end);
        }
        Self::try_new(column, offsets, values)
    }

    pub fn offsets(&self) -> &[i32] {
        &self.offsets
    }

    pub fn values(&self) -> &NestedColumn {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element range owned by `row`. `column` names the list in errors.
    pub fn value_range(&self, column: &str, row: usize) -> Result<Range<usize>> {
        let offset_error = |detail: String| Error::OffsetRange {
            column: column.to_string(),
            detail,
        };

        if row >= self.len() {
            return Err(offset_error(format!(
                "row {row} out of bounds for list with {} rows",
                self.len()
            )));
        }
        let (start, end) = (self.offsets[row], self.offsets[row + 1]);
        if start < 0 {
            return Err(offset_error(format!("negative offset {start} at row {row}")));
        }
        if start > end {
            return Err(offset_error(format!(
                "decreasing offsets {start}..{end} at row {row}"
            )));
        }
        // start >= 0 and start <= end, so both convert losslessly.
        let (start, end) = (start as usize, end as usize);
        let elements = self.values.len();
        if end > elements {
            return Err(offset_error(format!(
                "offset {end} at row {row} past {elements} elements"
            )));
        }
        Ok(start..end)
    }
}

/// Ordered, equally long child columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructArray {
    len: usize,
    fields: Vec<NestedColumn>,
}

impl StructArray {
    pub fn try_new(fields: Vec<NestedColumn>) -> Result<Self> {
        let len = fields.first().map(NestedColumn::len).unwrap_or(0);
        if let Some(bad) = fields.iter().find(|f| f.len() != len) {
            return Err(Error::Schema(format!(
                "struct field '{}' has {} rows, expected {}",
                bad.name,
                bad.len(),
                len
            )));
        }
        Ok(Self { len, fields })
    }

    /// A struct with no children and `len` rows.
    pub fn new_empty(len: usize) -> Self {
        Self {
            len,
            fields: Vec::new(),
        }
    }

    pub fn fields(&self) -> &[NestedColumn] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&NestedColumn> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NestedArray {
    Primitive(PrimitiveArray),
    List(ListArray),
    Struct(StructArray),
}

/// A named column of any shape. Owned by the caller; flatten only borrows it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NestedColumn {
    pub name: String,
    pub array: NestedArray,
}

impl NestedColumn {
    pub fn primitive(name: impl Into<String>, values: impl Into<PrimitiveArray>) -> Self {
        Self {
            name: name.into(),
            array: NestedArray::Primitive(values.into()),
        }
    }

    /// List column with unchecked offsets (see [`ListArray::new`]).
    pub fn list(name: impl Into<String>, offsets: Vec<i32>, element: NestedColumn) -> Self {
        Self {
            name: name.into(),
            array: NestedArray::List(ListArray::new(offsets, element)),
        }
    }

    /// List column whose offsets are derived from per-row element counts.
    pub fn list_from_lengths(
        name: impl Into<String>,
        lengths: &[usize],
        element: NestedColumn,
    ) -> Result<Self> {
        let name = name.into();
        let list = ListArray::from_lengths(&name, lengths, element)?;
        Ok(Self {
            name,
            array: NestedArray::List(list),
        })
    }

    pub fn structure(name: impl Into<String>, fields: Vec<NestedColumn>) -> Result<Self> {
        Ok(Self {
            name: name.into(),
            array: NestedArray::Struct(StructArray::try_new(fields)?),
        })
    }

    pub fn len(&self) -> usize {
        match &self.array {
            NestedArray::Primitive(values) => values.len(),
            NestedArray::List(list) => list.len(),
            NestedArray::Struct(fields) => fields.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_primitive(&self) -> Option<&PrimitiveArray> {
        match &self.array {
            NestedArray::Primitive(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&ListArray> {
        match &self.array {
            NestedArray::List(list) => Some(list),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&StructArray> {
        match &self.array {
            NestedArray::Struct(fields) => Some(fields),
            _ => None,
        }
    }

    /// Type tree of this column, derived from its shape.
    pub fn data_type(&self) -> DataType {
        match &self.array {
            NestedArray::Primitive(values) => values.data_type(),
            NestedArray::List(list) => DataType::List(Box::new(list.values().field())),
            NestedArray::Struct(fields) => {
                DataType::Struct(fields.fields().iter().map(NestedColumn::field).collect())
            }
        }
    }

    pub fn field(&self) -> Field {
        Field::new(self.name.clone(), self.data_type(), true)
    }
}

/// Flat primitive column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub values: PrimitiveArray,
}

impl Column {
    pub fn len(&self) -> usize {
        self.values.len()
    }
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
    pub fn data_type(&self) -> DataType {
        self.values.data_type()
    }
}

/// Flat batch of equally long primitive columns.
///
/// The row count is carried explicitly: a batch may hold rows but no columns
/// (every leaf of the input was an empty struct).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RowBatch {
    pub columns: Vec<Column>,
    num_rows: usize,
}

impl RowBatch {
    /// Fails with `Error::Schema` unless every column has `num_rows` values.
    pub fn new(columns: Vec<Column>, num_rows: usize) -> Result<Self> {
        if let Some(bad) = columns.iter().find(|c| c.len() != num_rows) {
            return Err(Error::Schema(format!(
                "column '{}' has {} rows, expected {}",
                bad.name,
                bad.len(),
                num_rows
            )));
        }
        Ok(Self { columns, num_rows })
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn schema(&self) -> Schema {
        Schema::new(
            self.columns
                .iter()
                .map(|c| Field::new(c.name.clone(), c.data_type(), true))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(name: &str, values: Vec<i32>) -> NestedColumn {
        NestedColumn::primitive(name, values)
    }

    #[test]
    fn value_range_follows_offsets() {
        let list = ListArray::new(vec![0, 2, 2, 5], ints("item", vec![1, 2, 3, 4, 5]));
        assert_eq!(list.len(), 3);
        assert_eq!(list.value_range("l", 0).unwrap(), 0..2);
        assert_eq!(list.value_range("l", 1).unwrap(), 2..2);
        assert_eq!(list.value_range("l", 2).unwrap(), 2..5);
        assert!(matches!(
            list.value_range("l", 3),
            Err(Error::OffsetRange { .. })
        ));
    }

    #[test]
    fn value_range_rejects_malformed_offsets() {
        let decreasing = ListArray::new(vec![0, 3, 1], ints("item", vec![1, 2, 3]));
        assert!(matches!(
            decreasing.value_range("l", 1),
            Err(Error::OffsetRange { .. })
        ));

        let past_end = ListArray::new(vec![0, 4], ints("item", vec![1, 2, 3]));
        assert!(matches!(
            past_end.value_range("l", 0),
            Err(Error::OffsetRange { .. })
        ));

        let negative = ListArray::new(vec![-1, 1], ints("item", vec![1]));
        assert!(matches!(
            negative.value_range("l", 0),
            Err(Error::OffsetRange { .. })
        ));
    }

    #[test]
    fn try_new_validates_whole_sequence() {
        assert!(ListArray::try_new("l", vec![0, 1, 2], ints("item", vec![1, 2])).is_ok());
        assert!(ListArray::try_new("l", vec![0, 2, 1], ints("item", vec![1, 2])).is_err());
        match ListArray::try_new("tags", vec![1, 2], ints("item", vec![1, 2])) {
            Err(Error::OffsetRange { column, .. }) => assert_eq!(column, "tags"),
            other => panic!("unexpected: {other:?}"),
        }
        match ListArray::try_new("tags", vec![0, 3], ints("item", vec![1, 2])) {
            Err(Error::OffsetRange { column, .. }) => assert_eq!(column, "tags"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn from_lengths_builds_offsets() {
        let list = ListArray::from_lengths("l", &[2, 0, 1], ints("item", vec![7, 8, 9])).unwrap();
        assert_eq!(list.offsets(), &[0, 2, 2, 3]);
    }

    #[test]
    fn struct_requires_equal_lengths() {
        let err = StructArray::try_new(vec![ints("a", vec![1, 2]), ints("b", vec![1])]);
        assert!(matches!(err, Err(Error::Schema(_))));
        assert_eq!(StructArray::new_empty(4).len(), 4);
    }

    #[test]
    fn extend_take_repeats_values() {
        let source = PrimitiveArray::from(vec![Some(10i64), None, Some(30)]);
        let mut out = PrimitiveArray::with_capacity(&DataType::Int64, 4).unwrap();
        out.extend_take(&source, &[0, 0, 2, 1]).unwrap();
        assert_eq!(
            out,
            PrimitiveArray::Int64(vec![Some(10), Some(10), Some(30), None])
        );
        assert_eq!(out.null_count(), 1);
        assert_eq!(out.value(3), Some(Scalar::Null));
    }

    #[test]
    fn extend_take_rejects_kind_mismatch_and_bad_index() {
        let source = PrimitiveArray::from(vec![1i32, 2]);
        let mut out = PrimitiveArray::with_capacity(&DataType::Float64, 0).unwrap();
        assert!(matches!(
            out.extend_take(&source, &[0]),
            Err(Error::Invariant(_))
        ));

        let mut out = PrimitiveArray::with_capacity(&DataType::Int32, 0).unwrap();
        assert!(out.extend_take(&source, &[0, 5]).is_err());
        assert!(out.is_empty());
    }

    #[test]
    fn no_storage_for_date_or_decimal() {
        assert!(PrimitiveArray::with_capacity(&DataType::Date64, 1).is_none());
        assert!(PrimitiveArray::with_capacity(&DataType::Decimal128, 1).is_none());
        assert!(PrimitiveArray::with_capacity(&DataType::Struct(vec![]), 1).is_none());
    }

    #[test]
    fn batch_row_count_is_checked() {
        let column = Column {
            name: "a".into(),
            values: PrimitiveArray::from(vec![1i32, 2]),
        };
        assert_eq!(RowBatch::new(vec![column.clone()], 2).unwrap().num_rows(), 2);
        assert!(matches!(
            RowBatch::new(vec![column], 3),
            Err(Error::Schema(_))
        ));
        assert_eq!(RowBatch::new(Vec::new(), 5).unwrap().num_rows(), 5);
    }

    #[test]
    fn data_type_mirrors_shape() {
        let phones = NestedColumn::structure("phone", vec![ints("number", vec![1, 2])]).unwrap();
        let list = NestedColumn::list("phones", vec![0, 2], phones);
        let expected = DataType::List(Box::new(Field::structure(
            "phone",
            vec![Field::new("number", DataType::Int32, true)],
        )));
        assert_eq!(list.data_type(), expected);
        assert_eq!(list.len(), 1);
    }
}
