use super::{Values, encode_rows};
use crate::{
    BufferHandle, BufferTarget, DataError, Device, DeviceError,
    layout::{Layout, PrimitiveType},
};

const INDEX_SIZE: usize = size_of::<u16>();

/// Vertex + index buffer pair sized for a vertex signature.
#[derive(Debug)]
pub struct VertexProvider {
    layout: Layout,
    max_vertex_count: u32,
    max_triangle_count: u32,
    vertex_buffer: BufferHandle,
    index_buffer: BufferHandle,
}

impl VertexProvider {
    pub fn new(
        device: &mut dyn Device,
        attributes: &[(String, PrimitiveType)],
        max_vertex_count: u32,
        max_triangle_count: u32,
    ) -> Result<Self, DeviceError> {
        let layout = Layout::packed(attributes);
        let vertex_buffer = device.create_buffer(
            BufferTarget::Vertex,
            max_vertex_count as usize * layout.size as usize,
        )?;
        let index_buffer = device.create_buffer(BufferTarget::Index, max_triangle_count as usize * 3 * INDEX_SIZE)?;

        Ok(Self {
            layout,
            max_vertex_count,
            max_triangle_count,
            vertex_buffer,
            index_buffer,
        })
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn max_vertex_count(&self) -> u32 {
        self.max_vertex_count
    }

    pub fn max_triangle_count(&self) -> u32 {
        self.max_triangle_count
    }

    pub fn vertex_buffer(&self) -> BufferHandle {
        self.vertex_buffer
    }

    pub fn index_buffer(&self) -> BufferHandle {
        self.index_buffer
    }

    /// Replace vertex rows (from vertex 0) and indices together.
    ///
    /// Both inputs are validated before either buffer is touched. Returns the number of rows written.
    pub fn set_vertices(
        &self,
        device: &mut dyn Device,
        data: &[(&str, Values<'_>)],
        indices: &[u16],
    ) -> Result<u32, DataError> {
        self.check_indices(indices)?;
        let encoded = encode_rows(&self.layout, data, self.max_vertex_count, "vertex count")?;

        if !encoded.bytes.is_empty() {
            device.write_buffer(self.vertex_buffer, 0, &encoded.bytes)?;
        }
        if !indices.is_empty() {
            device.write_buffer(self.index_buffer, 0, bytemuck::cast_slice(indices))?;
        }

        Ok(encoded.rows as u32)
    }

    fn check_indices(&self, indices: &[u16]) -> Result<(), DataError> {
        let capacity = self.max_triangle_count as usize * 3;
        if indices.len() > capacity {
            return Err(DataError::CapacityExceeded {
                what: "index count",
                requested: indices.len(),
                capacity,
            });
        }

        match indices.iter().find(|&&i| i as u32 >= self.max_vertex_count) {
            Some(&index) => Err(DataError::IndexOutOfRange {
                index,
                vertices: self.max_vertex_count,
            }),
            None => Ok(()),
        }
    }

    pub fn delete(self, device: &mut dyn Device) {
        device.delete_buffer(self.vertex_buffer);
        device.delete_buffer(self.index_buffer);
    }
}
