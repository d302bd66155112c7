use crate::layout::PrimitiveType;

/// A single typed value of a uniform block field.
///
/// Matrices are column major, as GLSL expects them.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Int(i32),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    Ivec2([i32; 2]),
    Ivec3([i32; 3]),
    Ivec4([i32; 4]),
    Mat3([f32; 9]),
    Mat4([f32; 16]),
}

impl UniformValue {
    pub fn ty(&self) -> PrimitiveType {
        match self {
            UniformValue::Float(_) => PrimitiveType::Float,
            UniformValue::Int(_) => PrimitiveType::Int,
            UniformValue::Vec2(_) => PrimitiveType::Vec2,
            UniformValue::Vec3(_) => PrimitiveType::Vec3,
            UniformValue::Vec4(_) => PrimitiveType::Vec4,
            UniformValue::Ivec2(_) => PrimitiveType::Ivec2,
            UniformValue::Ivec3(_) => PrimitiveType::Ivec3,
            UniformValue::Ivec4(_) => PrimitiveType::Ivec4,
            UniformValue::Mat3(_) => PrimitiveType::Mat3,
            UniformValue::Mat4(_) => PrimitiveType::Mat4,
        }
    }

    /// std140 bytes of the value. `mat3` columns are padded to 16 bytes.
    pub fn to_std140(&self) -> Vec<u8> {
        match self {
            UniformValue::Float(x) => x.to_ne_bytes().to_vec(),
            UniformValue::Int(x) => x.to_ne_bytes().to_vec(),
            UniformValue::Vec2(x) => bytemuck::cast_slice(x).to_vec(),
            UniformValue::Vec3(x) => bytemuck::cast_slice(x).to_vec(),
            UniformValue::Vec4(x) => bytemuck::cast_slice(x).to_vec(),
            UniformValue::Ivec2(x) => bytemuck::cast_slice(x).to_vec(),
            UniformValue::Ivec3(x) => bytemuck::cast_slice(x).to_vec(),
            UniformValue::Ivec4(x) => bytemuck::cast_slice(x).to_vec(),
            UniformValue::Mat3(x) => {
                let mut columns = [0.0f32; 12];
                for (column, chunk) in x.chunks_exact(3).enumerate() {
                    columns[column * 4..column * 4 + 3].copy_from_slice(chunk);
                }
                bytemuck::cast_slice(&columns).to_vec()
            }
            UniformValue::Mat4(x) => bytemuck::cast_slice(x).to_vec(),
        }
    }
}

/// A Rust value that maps onto one uniform block field.
pub trait UniformField {
    fn uniform_value(&self) -> UniformValue;
}

/// Sink for named uniform values, see [`Uniforms`].
pub trait UniformWriter {
    fn write_uniform(&mut self, name: &str, value: UniformValue);
}

/// A struct whose fields mirror a global signature.
///
/// Usually derived with `#[derive(Uniforms)]`; each field is written under its
/// name (or the name given by `#[uniform(rename = "...")]`).
pub trait Uniforms {
    fn write_uniforms(&self, writer: &mut dyn UniformWriter);
}

impl UniformWriter for Vec<(String, UniformValue)> {
    fn write_uniform(&mut self, name: &str, value: UniformValue) {
        self.push((name.to_string(), value));
    }
}

impl UniformField for UniformValue {
    fn uniform_value(&self) -> UniformValue {
        *self
    }
}

impl UniformField for f32 {
    fn uniform_value(&self) -> UniformValue {
        UniformValue::Float(*self)
    }
}

impl UniformField for f64 {
    fn uniform_value(&self) -> UniformValue {
        UniformValue::Float(*self as f32)
    }
}

impl UniformField for i32 {
    fn uniform_value(&self) -> UniformValue {
        UniformValue::Int(*self)
    }
}

impl UniformField for u32 {
    fn uniform_value(&self) -> UniformValue {
        UniformValue::Int(*self as i32)
    }
}

impl UniformField for bool {
    fn uniform_value(&self) -> UniformValue {
        UniformValue::Int(*self as i32)
    }
}

impl UniformField for [f32; 2] {
    fn uniform_value(&self) -> UniformValue {
        UniformValue::Vec2(*self)
    }
}

impl UniformField for [f32; 3] {
    fn uniform_value(&self) -> UniformValue {
        UniformValue::Vec3(*self)
    }
}

impl UniformField for [f32; 4] {
    fn uniform_value(&self) -> UniformValue {
        UniformValue::Vec4(*self)
    }
}

impl UniformField for [i32; 2] {
    fn uniform_value(&self) -> UniformValue {
        UniformValue::Ivec2(*self)
    }
}

impl UniformField for [i32; 3] {
    fn uniform_value(&self) -> UniformValue {
        UniformValue::Ivec3(*self)
    }
}

impl UniformField for [i32; 4] {
    fn uniform_value(&self) -> UniformValue {
        UniformValue::Ivec4(*self)
    }
}

impl UniformField for [[f32; 3]; 3] {
    fn uniform_value(&self) -> UniformValue {
        UniformValue::Mat3(bytemuck::cast(*self))
    }
}

impl UniformField for [[f32; 4]; 4] {
    fn uniform_value(&self) -> UniformValue {
        UniformValue::Mat4(bytemuck::cast(*self))
    }
}
