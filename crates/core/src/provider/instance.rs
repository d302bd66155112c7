use super::{Values, encode_rows};
use crate::{
    BufferHandle, BufferTarget, DataError, Device, DeviceError,
    layout::{Layout, PrimitiveType},
};

/// Per-instance attribute buffer sized for an instance signature.
#[derive(Debug)]
pub struct InstanceProvider {
    layout: Layout,
    max_instance_count: u32,
    buffer: BufferHandle,
}

impl InstanceProvider {
    pub fn new(
        device: &mut dyn Device,
        attributes: &[(String, PrimitiveType)],
        max_instance_count: u32,
    ) -> Result<Self, DeviceError> {
        let layout = Layout::packed(attributes);
        let buffer = device.create_buffer(
            BufferTarget::Vertex,
            max_instance_count as usize * layout.size as usize,
        )?;

        Ok(Self {
            layout,
            max_instance_count,
            buffer,
        })
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn max_instance_count(&self) -> u32 {
        self.max_instance_count
    }

    pub fn buffer(&self) -> BufferHandle {
        self.buffer
    }

    /// Replace instance rows from instance 0.
    ///
    /// Every supplied attribute has to cover at least `instance_count` rows, so
    /// instances past the supplied data never read stale values by accident.
    pub fn set_instance_data(
        &self,
        device: &mut dyn Device,
        data: &[(&str, Values<'_>)],
        instance_count: u32,
    ) -> Result<(), DataError> {
        if instance_count > self.max_instance_count {
            return Err(DataError::CapacityExceeded {
                what: "instance count",
                requested: instance_count as usize,
                capacity: self.max_instance_count as usize,
            });
        }

        let encoded = encode_rows(&self.layout, data, self.max_instance_count, "instance count")?;
        for (name, values) in data {
            let components = self.layout.field(name).map_or(1, |f| f.ty.components()) as usize;
            let rows = values.len() / components;
            if rows < instance_count as usize {
                return Err(DataError::TooFewRows {
                    name: name.to_string(),
                    rows,
                    required: instance_count as usize,
                });
            }
        }

        if !encoded.bytes.is_empty() {
            device.write_buffer(self.buffer, 0, &encoded.bytes)?;
        }

        Ok(())
    }

    pub fn delete(self, device: &mut dyn Device) {
        device.delete_buffer(self.buffer);
    }
}
