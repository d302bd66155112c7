//! Byte layout of vertex, instance and uniform buffers.
//!
//! Sizes follow std140 for every buffer kind: 3-vectors occupy 16 bytes and `mat3` is stored
//! as three 16 byte columns. Vertex and instance rows pack attributes back to back,
//! uniform blocks additionally align each field to its base alignment.

use serde::Deserialize;

pub const BLOCK_ALIGNMENT: u32 = 16;

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveType {
    Float,
    Int,
    Vec2,
    Vec3,
    Vec4,
    Ivec2,
    Ivec3,
    Ivec4,
    #[serde(alias = "mat3x3")]
    Mat3,
    #[serde(alias = "mat4x4")]
    Mat4,
}

/// Scalar type a primitive is made of, as seen by the GPU.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum ElementType {
    Float,
    Int,
}

impl PrimitiveType {
    pub fn glsl_name(&self) -> &'static str {
        match self {
            PrimitiveType::Float => "float",
            PrimitiveType::Int => "int",
            PrimitiveType::Vec2 => "vec2",
            PrimitiveType::Vec3 => "vec3",
            PrimitiveType::Vec4 => "vec4",
            PrimitiveType::Ivec2 => "ivec2",
            PrimitiveType::Ivec3 => "ivec3",
            PrimitiveType::Ivec4 => "ivec4",
            PrimitiveType::Mat3 => "mat3",
            PrimitiveType::Mat4 => "mat4",
        }
    }

    pub fn element_type(&self) -> ElementType {
        match self {
            PrimitiveType::Int | PrimitiveType::Ivec2 | PrimitiveType::Ivec3 | PrimitiveType::Ivec4 => ElementType::Int,
            _ => ElementType::Float,
        }
    }

    /// Number of scalar values a caller supplies for one element of this type.
    pub fn components(&self) -> u32 {
        match self {
            PrimitiveType::Float | PrimitiveType::Int => 1,
            PrimitiveType::Vec2 | PrimitiveType::Ivec2 => 2,
            PrimitiveType::Vec3 | PrimitiveType::Ivec3 => 3,
            PrimitiveType::Vec4 | PrimitiveType::Ivec4 => 4,
            PrimitiveType::Mat3 => 9,
            PrimitiveType::Mat4 => 16,
        }
    }

    pub fn size_bytes(&self) -> u32 {
        match self {
            PrimitiveType::Float | PrimitiveType::Int => 4,
            PrimitiveType::Vec2 | PrimitiveType::Ivec2 => 8,
            PrimitiveType::Vec3 | PrimitiveType::Ivec3 => 16,
            PrimitiveType::Vec4 | PrimitiveType::Ivec4 => 16,
            PrimitiveType::Mat3 => 48,
            PrimitiveType::Mat4 => 64,
        }
    }

    /// std140 base alignment.
    pub fn alignment(&self) -> u32 {
        match self {
            PrimitiveType::Float | PrimitiveType::Int => 4,
            PrimitiveType::Vec2 | PrimitiveType::Ivec2 => 8,
            _ => 16,
        }
    }

    pub fn is_matrix(&self) -> bool {
        matches!(self, PrimitiveType::Mat3 | PrimitiveType::Mat4)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LayoutField {
    pub name: String,
    pub ty: PrimitiveType,
    pub offset: u32,
}

/// Placement of named fields inside one buffer row (or one uniform block).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Layout {
    pub fields: Vec<LayoutField>,
    pub size: u32,
}

impl Layout {
    /// Vertex/instance row: fields back to back, in declaration order.
    pub fn packed(attributes: &[(String, PrimitiveType)]) -> Self {
        let mut offset = 0u32;
        let fields = attributes
            .iter()
            .map(|(name, ty)| {
                let field = LayoutField {
                    name: name.clone(),
                    ty: *ty,
                    offset,
                };
                offset += ty.size_bytes();
                field
            })
            .collect();

        Self { fields, size: offset }
    }

    /// Uniform block: std140 offsets, size rounded up to 16 bytes.
    pub fn std140(attributes: &[(String, PrimitiveType)]) -> Self {
        let mut offset = 0u32;
        let fields = attributes
            .iter()
            .map(|(name, ty)| {
                let aligned = offset.next_multiple_of(ty.alignment());
                offset = aligned + ty.size_bytes();
                LayoutField {
                    name: name.clone(),
                    ty: *ty,
                    offset: aligned,
                }
            })
            .collect();

        Self {
            fields,
            size: offset.next_multiple_of(BLOCK_ALIGNMENT),
        }
    }

    pub fn field(&self, name: &str) -> Option<&LayoutField> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Stride of a packed row made of the given attributes.
pub fn row_stride(attributes: &[(String, PrimitiveType)]) -> u32 {
    attributes.iter().map(|(_, ty)| ty.size_bytes()).sum()
}
