//! Conversion from Arrow arrays into the nested column model
//! (enabled with `--features arrow`).
//!
//! Only `List` (32-bit offsets), `Struct` and the primitive kinds with flat
//! storage convert. Container validity is not carried over: a null list row
//! is read through its (empty) offset range.

use arrow_array::cast::AsArray;
use arrow_array::types::{Float32Type, Float64Type, Int32Type, Int64Type};
use arrow_array::Array;
use arrow_schema::DataType as ArrowType;

use crate::error::{Error, Result};
use crate::types::{ListArray, NestedArray, NestedColumn, PrimitiveArray, StructArray};

impl NestedColumn {
    pub fn try_from_arrow(name: impl Into<String>, array: &dyn Array) -> Result<Self> {
        let name = name.into();
        let converted = match array.data_type() {
            ArrowType::Boolean => {
                NestedArray::Primitive(PrimitiveArray::Boolean(array.as_boolean().iter().collect()))
            }
            ArrowType::Int32 => NestedArray::Primitive(PrimitiveArray::Int32(
                array.as_primitive::<Int32Type>().iter().collect(),
            )),
            ArrowType::Int64 => NestedArray::Primitive(PrimitiveArray::Int64(
                array.as_primitive::<Int64Type>().iter().collect(),
            )),
            ArrowType::Float32 => NestedArray::Primitive(PrimitiveArray::Float32(
                array.as_primitive::<Float32Type>().iter().collect(),
            )),
            ArrowType::Float64 => NestedArray::Primitive(PrimitiveArray::Float64(
                array.as_primitive::<Float64Type>().iter().collect(),
            )),
            ArrowType::Utf8 => NestedArray::Primitive(PrimitiveArray::Utf8(
                array
                    .as_string::<i32>()
                    .iter()
                    .map(|v| v.map(str::to_string))
                    .collect(),
            )),
            ArrowType::Binary => NestedArray::Primitive(PrimitiveArray::Binary(
                array
                    .as_binary::<i32>()
                    .iter()
                    .map(|v| v.map(<[u8]>::to_vec))
                    .collect(),
            )),
            ArrowType::List(field) => {
                let list = array.as_list::<i32>();
                let element = Self::try_from_arrow(field.name().clone(), list.values().as_ref())?;
                let offsets = list.offsets().iter().copied().collect();
                NestedArray::List(ListArray::new(offsets, element))
            }
            ArrowType::Struct(fields) => {
                let structure = array.as_struct();
                let children = fields
                    .iter()
                    .zip(structure.columns())
                    .map(|(field, child)| {
                        Self::try_from_arrow(field.name().clone(), child.as_ref())
                    })
                    .collect::<Result<Vec<_>>>()?;
                if children.is_empty() {
                    NestedArray::Struct(StructArray::new_empty(structure.len()))
                } else {
                    NestedArray::Struct(StructArray::try_new(children)?)
                }
            }
            other => {
                return Err(Error::UnsupportedLeafType {
                    column: name,
                    data_type: format!("arrow {other}"),
                })
            }
        };
        Ok(Self {
            name,
            array: converted,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use arrow_array::{ArrayRef, Int32Array, Int64Array, StringArray, UInt8Array};
    use arrow_schema::Field as ArrowField;

    use super::*;
    use crate::schema::{DataType, Field};

    #[test]
    fn converts_struct_with_list() {
        let tags = arrow_array::ListArray::from_iter_primitive::<Int32Type, _, _>(vec![
            Some(vec![Some(1), Some(2)]),
            Some(vec![]),
        ]);
        let tags_type = tags.data_type().clone();
        let root = arrow_array::StructArray::from(vec![
            (
                Arc::new(ArrowField::new("id", ArrowType::Int64, false)),
                Arc::new(Int64Array::from(vec![7, 8])) as ArrayRef,
            ),
            (
                Arc::new(ArrowField::new("label", ArrowType::Utf8, true)),
                Arc::new(StringArray::from(vec![Some("a"), None])) as ArrayRef,
            ),
            (
                Arc::new(ArrowField::new("tags", tags_type, true)),
                Arc::new(tags) as ArrayRef,
            ),
        ]);

        let column = NestedColumn::try_from_arrow("root", &root).unwrap();
        assert_eq!(column.len(), 2);
        let structure = column.as_struct().unwrap();
        let list = structure.field("tags").and_then(NestedColumn::as_list).unwrap();
        assert_eq!(list.offsets(), &[0, 2, 2]);
        assert_eq!(
            structure.field("label").and_then(NestedColumn::as_primitive),
            Some(&PrimitiveArray::Utf8(vec![Some("a".into()), None]))
        );
        assert_eq!(
            structure.field("id").map(NestedColumn::data_type),
            Some(DataType::Int64)
        );
        assert!(matches!(
            structure.field("tags").map(NestedColumn::field),
            Some(Field { data_type: DataType::List(_), .. })
        ));
    }

    #[test]
    fn rejects_unmapped_types() {
        let bytes = Int32Array::from(vec![1]);
        assert!(NestedColumn::try_from_arrow("ok", &bytes).is_ok());

        let small = UInt8Array::from(vec![1u8]);
        assert!(matches!(
            NestedColumn::try_from_arrow("small", &small),
            Err(Error::UnsupportedLeafType { .. })
        ));
    }
}
