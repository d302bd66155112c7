use super::{DrawOp, ResourceGraph, ResourceKey, ResourceKind};
use crate::{
    AttributeBinding, Device, DrawCall, GraphError, InstanceBinding, TextureBinding, UniformBlockBinding,
    layout::Layout,
};

/// Attribute pointers for one packed row layout, numbered from `first_location`.
pub(crate) fn attribute_bindings(layout: &Layout, first_location: u32, divisor: u32) -> Vec<AttributeBinding> {
    layout
        .fields
        .iter()
        .enumerate()
        .map(|(i, field)| AttributeBinding {
            location: first_location + i as u32,
            components: field.ty.components(),
            element: field.ty.element_type(),
            stride: layout.size,
            offset: field.offset,
            divisor,
        })
        .collect()
}

impl ResourceGraph {
    /// Clear the target of a dynamic texture and run its draw operations in order.
    pub(crate) fn execute_pass(&self, device: &mut dyn Device, key: ResourceKey) -> Result<(), GraphError> {
        let resource = &self.resources[key];
        let id = resource.id();
        let ResourceKind::DynamicTexture(texture) = &resource.kind else {
            return Err(GraphError::UnexpectedKind {
                id: id.to_string(),
                expected: "DynamicTexture",
                found: resource.resource_type(),
            });
        };

        log::debug!("render pass `{}` ({} draw operations)", id, texture.draw_ops.len());

        device
            .begin_pass(
                Some(texture.provider.handle()),
                texture.provider.size(),
                self.options.clear_color,
            )
            .map_err(GraphError::device(id))?;

        for op in &texture.draw_ops {
            let call = self.draw_call(op)?;
            log::trace!(
                "draw `{}`: {} indices, {} instances",
                self.resources[op.program].id(),
                call.index_count,
                call.instances.as_ref().map_or(0, |x| x.count)
            );
            device.draw(&call).map_err(GraphError::device(id))?;
        }

        Ok(())
    }

    /// Collect the buffers, attributes, uniform block and textures one draw operation binds.
    fn draw_call<'a>(&'a self, op: &'a DrawOp) -> Result<DrawCall<'a>, GraphError> {
        let program = self.select(op.program, "Program", |kind| match kind {
            ResourceKind::Program(x) => Some(x),
            _ => None,
        })?;
        let vertex = self.select(op.vertex, "Vertex", |kind| match kind {
            ResourceKind::Vertex(x) => Some(x),
            _ => None,
        })?;

        let vertex_attributes = attribute_bindings(vertex.provider.layout(), 0, 0);
        let first_instance_location = vertex_attributes.len() as u32;

        let instances = match op.instance {
            Some(key) => {
                let instance = self.select(key, "Instance", |kind| match kind {
                    ResourceKind::Instance(x) => Some(x),
                    _ => None,
                })?;
                Some(InstanceBinding {
                    buffer: instance.provider.buffer(),
                    attributes: attribute_bindings(instance.provider.layout(), first_instance_location, 1),
                    count: instance.instance_count,
                })
            }
            None => None,
        };

        let uniform_block = match (op.global, program.global_signature) {
            (Some(key), Some(signature)) => {
                let global = self.select(key, "Global", |kind| match kind {
                    ResourceKind::Global(x) => Some(x),
                    _ => None,
                })?;
                Some(UniformBlockBinding {
                    buffer: global.provider.buffer(),
                    block: self.resources[signature].id(),
                    binding: self.options.uniform_binding,
                })
            }
            _ => None,
        };

        let mut textures = Vec::with_capacity(op.textures.len());
        for (unit, (sampler, key)) in op.textures.iter().enumerate() {
            let handle = match &self.resources[*key].kind {
                ResourceKind::StaticTexture(x) => x.provider.handle(),
                ResourceKind::DynamicTexture(x) => x.provider.handle(),
                other => {
                    return Err(GraphError::UnexpectedKind {
                        id: self.resources[*key].id().to_string(),
                        expected: "texture",
                        found: other.resource_type(),
                    });
                }
            };

            textures.push(TextureBinding {
                unit: unit as u32,
                texture: handle,
                sampler: sampler.as_str(),
                sampling: program.provider.sampling(sampler),
            });
        }

        Ok(DrawCall {
            program: program.provider.handle(),
            vertex_buffer: vertex.provider.vertex_buffer(),
            vertex_attributes,
            index_buffer: vertex.provider.index_buffer(),
            index_count: vertex.triangle_count * 3,
            instances,
            uniform_block,
            textures,
        })
    }

    fn select<'a, T>(
        &'a self,
        key: ResourceKey,
        expected: &'static str,
        select: impl FnOnce(&'a ResourceKind) -> Option<&'a T>,
    ) -> Result<&'a T, GraphError> {
        let resource = self.resources.get(key).ok_or_else(|| GraphError::NotFound {
            id: format!("{:?}", key),
        })?;

        select(&resource.kind).ok_or_else(|| GraphError::UnexpectedKind {
            id: resource.id().to_string(),
            expected,
            found: resource.resource_type(),
        })
    }
}
