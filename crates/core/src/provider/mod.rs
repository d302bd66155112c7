//! Owners of the device objects behind each resource.

mod instance;
mod program;
mod texture;
mod uniform;
mod vertex;

pub use instance::*;
pub use program::*;
pub use texture::*;
pub use uniform::*;
pub use vertex::*;

use crate::{
    DataError,
    layout::{ElementType, Layout},
};

/// Flat attribute values for one named vertex or instance attribute.
#[derive(Clone, Copy, Debug)]
pub enum Values<'a> {
    Float(&'a [f32]),
    Int(&'a [i32]),
}

impl Values<'_> {
    pub fn len(&self) -> usize {
        match self {
            Values::Float(x) => x.len(),
            Values::Int(x) => x.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn type_name(&self) -> &'static str {
        match self {
            Values::Float(_) => "floats",
            Values::Int(_) => "ints",
        }
    }
}

impl<'a> From<&'a [f32]> for Values<'a> {
    fn from(value: &'a [f32]) -> Self {
        Values::Float(value)
    }
}

impl<'a, const N: usize> From<&'a [f32; N]> for Values<'a> {
    fn from(value: &'a [f32; N]) -> Self {
        Values::Float(value)
    }
}

impl<'a> From<&'a Vec<f32>> for Values<'a> {
    fn from(value: &'a Vec<f32>) -> Self {
        Values::Float(value)
    }
}

impl<'a> From<&'a [i32]> for Values<'a> {
    fn from(value: &'a [i32]) -> Self {
        Values::Int(value)
    }
}

impl<'a, const N: usize> From<&'a [i32; N]> for Values<'a> {
    fn from(value: &'a [i32; N]) -> Self {
        Values::Int(value)
    }
}

impl<'a> From<&'a Vec<i32>> for Values<'a> {
    fn from(value: &'a Vec<i32>) -> Self {
        Values::Int(value)
    }
}

/// Rows encoded for upload, plus the number of rows they cover.
pub(crate) struct EncodedRows {
    pub bytes: Vec<u8>,
    pub rows: usize,
}

/// Interleave named attribute arrays into packed rows according to `layout`.
///
/// Validates names, element types, component counts and the row capacity before
/// producing any bytes. Attributes that are not supplied are left zeroed.
pub(crate) fn encode_rows(
    layout: &Layout,
    data: &[(&str, Values<'_>)],
    capacity: u32,
    what: &'static str,
) -> Result<EncodedRows, DataError> {
    let mut rows = 0usize;
    let mut fields = Vec::with_capacity(data.len());

    for (name, values) in data {
        let field = layout
            .field(name)
            .ok_or_else(|| DataError::UnknownField { name: name.to_string() })?;

        let matches = matches!(
            (field.ty.element_type(), values),
            (ElementType::Float, Values::Float(_)) | (ElementType::Int, Values::Int(_))
        );
        if !matches {
            return Err(DataError::TypeMismatch {
                name: name.to_string(),
                expected: field.ty,
                found: values.type_name(),
            });
        }

        let components = field.ty.components();
        if values.len() % components as usize != 0 {
            return Err(DataError::Ragged {
                name: name.to_string(),
                len: values.len(),
                components,
            });
        }

        let count = values.len() / components as usize;
        rows = rows.max(count);
        fields.push((field, values));
    }

    if rows > capacity as usize {
        return Err(DataError::CapacityExceeded {
            what,
            requested: rows,
            capacity: capacity as usize,
        });
    }

    let stride = layout.size as usize;
    let mut bytes = vec![0u8; rows * stride];

    for (field, values) in fields {
        let components = field.ty.components() as usize;
        let chunks: Vec<&[u8]> = match values {
            Values::Float(x) => x.chunks(components).map(|c| bytemuck::cast_slice::<f32, u8>(c)).collect(),
            Values::Int(x) => x.chunks(components).map(|c| bytemuck::cast_slice::<i32, u8>(c)).collect(),
        };

        for (row, chunk) in chunks.into_iter().enumerate() {
            let start = row * stride + field.offset as usize;
            bytes[start..start + chunk.len()].copy_from_slice(chunk);
        }
    }

    Ok(EncodedRows { bytes, rows })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::PrimitiveType;

    fn layout() -> Layout {
        Layout::packed(&[
            ("position".to_string(), PrimitiveType::Vec2),
            ("id".to_string(), PrimitiveType::Int),
        ])
    }

    #[test]
    fn interleaves_rows() {
        let encoded = encode_rows(
            &layout(),
            &[("position", Values::Float(&[1.0, 2.0, 3.0, 4.0])), ("id", Values::Int(&[7, 9]))],
            4,
            "vertex count",
        )
        .unwrap();

        assert_eq!(encoded.rows, 2);
        assert_eq!(encoded.bytes.len(), 24);
        assert_eq!(encoded.bytes[0..4], 1.0f32.to_ne_bytes());
        assert_eq!(encoded.bytes[4..8], 2.0f32.to_ne_bytes());
        assert_eq!(encoded.bytes[20..24], 9i32.to_ne_bytes());
    }

    #[test]
    fn rejects_bad_input() {
        let layout = layout();

        assert!(matches!(
            encode_rows(&layout, &[("color", Values::Float(&[1.0]))], 4, "vertex count"),
            Err(DataError::UnknownField { .. })
        ));
        assert!(matches!(
            encode_rows(&layout, &[("id", Values::Float(&[1.0]))], 4, "vertex count"),
            Err(DataError::TypeMismatch { .. })
        ));
        assert!(matches!(
            encode_rows(&layout, &[("position", Values::Float(&[1.0, 2.0, 3.0]))], 4, "vertex count"),
            Err(DataError::Ragged { .. })
        ));
        assert!(matches!(
            encode_rows(&layout, &[("position", Values::Float(&[0.0; 10]))], 4, "vertex count"),
            Err(DataError::CapacityExceeded { requested: 5, capacity: 4, .. })
        ));
    }
}
