use super::{ResourceGraph, ResourceKey, ResourceKind};
use crate::{
    DataError, Device, GraphError, Region, ResourceType, Size, TextureData, TextureFormat, UniformValue, Uniforms,
    Values,
};
use slotmap::SecondaryMap;

impl ResourceGraph {
    /// Mark a variable resource and everything downstream of it as dirty.
    pub fn mark_and_propagate_dirty(&mut self, id: &str) -> Result<(), GraphError> {
        let key = self.variable_key(id)?;
        self.propagate_dirty(key);
        Ok(())
    }

    fn propagate_dirty(&mut self, key: ResourceKey) {
        let mut visited = SecondaryMap::new();
        let mut stack = vec![key];

        while let Some(key) = stack.pop() {
            if visited.insert(key, ()).is_some() {
                continue;
            }

            let resource = &mut self.resources[key];
            log::trace!("dirty `{}`", resource.id);
            if let Some(state) = resource.state_mut() {
                state.dirty = true;
                stack.extend(state.dependency_of.iter().copied());
            }
        }
    }

    /// A write to `key` reached the device: invalidate consumers, then mark `key` itself current.
    fn commit(&mut self, key: ResourceKey) {
        self.propagate_dirty(key);
        if let Some(state) = self.resources[key].state_mut() {
            state.dirty = false;
        }
    }

    /// Replace the vertices and indices of a `Vertex` resource.
    ///
    /// `triangle_count` triangles are drawn from the start of `indices`.
    pub fn set_vertices(
        &mut self,
        device: &mut dyn Device,
        id: &str,
        attributes: &[(&str, Values<'_>)],
        indices: &[u16],
        triangle_count: u32,
    ) -> Result<(), GraphError> {
        let (key, resource) = self.find_mut(id)?;
        let ResourceKind::Vertex(vertex) = &mut resource.kind else {
            return Err(unexpected(id, "Vertex", resource.resource_type()));
        };

        let capacity = vertex.provider.max_triangle_count().min(indices.len() as u32 / 3);
        if triangle_count > capacity {
            return Err(GraphError::Data {
                id: id.to_string(),
                source: DataError::CapacityExceeded {
                    what: "triangle count",
                    requested: triangle_count as usize,
                    capacity: capacity as usize,
                },
            });
        }

        vertex
            .provider
            .set_vertices(device, attributes, indices)
            .map_err(GraphError::data(id))?;
        vertex.triangle_count = triangle_count;

        self.commit(key);
        Ok(())
    }

    /// Replace the per-instance data of an `Instance` resource.
    pub fn set_instance_data(
        &mut self,
        device: &mut dyn Device,
        id: &str,
        attributes: &[(&str, Values<'_>)],
        instance_count: u32,
    ) -> Result<(), GraphError> {
        let (key, resource) = self.find_mut(id)?;
        let ResourceKind::Instance(instance) = &mut resource.kind else {
            return Err(unexpected(id, "Instance", resource.resource_type()));
        };

        instance
            .provider
            .set_instance_data(device, attributes, instance_count)
            .map_err(GraphError::data(id))?;
        instance.instance_count = instance_count;

        self.commit(key);
        Ok(())
    }

    /// Write some or all fields of a `Global` uniform block.
    pub fn set_uniforms(
        &mut self,
        device: &mut dyn Device,
        id: &str,
        values: &[(&str, UniformValue)],
    ) -> Result<(), GraphError> {
        let (key, resource) = self.find_mut(id)?;
        let ResourceKind::Global(global) = &mut resource.kind else {
            return Err(unexpected(id, "Global", resource.resource_type()));
        };

        global.provider.set_uniforms(device, values).map_err(GraphError::data(id))?;

        self.commit(key);
        Ok(())
    }

    /// Write a whole uniform block from a struct, see [`Uniforms`].
    pub fn set_uniform_block<T: Uniforms + ?Sized>(
        &mut self,
        device: &mut dyn Device,
        id: &str,
        block: &T,
    ) -> Result<(), GraphError> {
        let mut values: Vec<(String, UniformValue)> = Vec::new();
        block.write_uniforms(&mut values);

        let values: Vec<(&str, UniformValue)> = values
            .iter()
            .map(|(name, value)| (name.as_str(), *value))
            .collect();
        self.set_uniforms(device, id, &values)
    }

    /// Upload texels into a `StaticTexture`.
    ///
    /// Static textures have no consumer edges: textures sampling this one stay clean and
    /// keep their old contents. Call [`ResourceGraph::mark_and_propagate_dirty`] on each
    /// of them to have them rendered again.
    pub fn set_texture_data(
        &mut self,
        device: &mut dyn Device,
        id: &str,
        data: TextureData<'_>,
    ) -> Result<(), GraphError> {
        let (key, resource) = self.find_mut(id)?;
        let ResourceKind::StaticTexture(texture) = &mut resource.kind else {
            return Err(unexpected(id, "StaticTexture", resource.resource_type()));
        };

        texture.provider.upload(device, data).map_err(GraphError::data(id))?;

        self.commit(key);
        Ok(())
    }

    /// Upload tightly packed texels into part of a `StaticTexture`.
    ///
    /// Like [`ResourceGraph::set_texture_data`], this does not invalidate consumers.
    pub fn set_texture_region(
        &mut self,
        device: &mut dyn Device,
        id: &str,
        region: Region,
        bytes: &[u8],
    ) -> Result<(), GraphError> {
        let (key, resource) = self.find_mut(id)?;
        let ResourceKind::StaticTexture(texture) = &mut resource.kind else {
            return Err(unexpected(id, "StaticTexture", resource.resource_type()));
        };

        texture
            .provider
            .upload_region(device, region, bytes)
            .map_err(GraphError::data(id))?;

        self.commit(key);
        Ok(())
    }

    /// Give a static or dynamic texture a new format and size.
    ///
    /// The texels are lost, so the texture and every texture sampling it become dirty.
    /// A static texture has to be uploaded again.
    pub fn reconfigure_texture(
        &mut self,
        device: &mut dyn Device,
        id: &str,
        format: TextureFormat,
        size: Size,
    ) -> Result<(), GraphError> {
        let (key, resource) = self.find_mut(id)?;
        let provider = match &mut resource.kind {
            ResourceKind::StaticTexture(x) => &mut x.provider,
            ResourceKind::DynamicTexture(x) => &mut x.provider,
            other => return Err(unexpected(id, "texture", other.resource_type())),
        };

        provider.reconfigure(device, format, size).map_err(GraphError::device(id))?;

        // static textures have no consumer edges, so look the samplers up directly
        let samplers: Vec<ResourceKey> = self
            .resources
            .iter()
            .filter(|(_, resource)| resource.state().is_some_and(|state| state.depends_on.contains(&key)))
            .map(|(key, _)| key)
            .collect();

        self.propagate_dirty(key);
        for sampler in samplers {
            self.propagate_dirty(sampler);
        }
        Ok(())
    }

    /// Bring a `DynamicTexture` up to date.
    ///
    /// Dirty dynamic textures it samples are rendered first, depth first. Returns whether
    /// any render pass ran; a clean texture costs nothing.
    pub fn update_texture_data(&mut self, device: &mut dyn Device, id: &str) -> Result<bool, GraphError> {
        let (key, resource) = self.find(id)?;
        if resource.resource_type() != ResourceType::DynamicTexture {
            return Err(unexpected(id, "DynamicTexture", resource.resource_type()));
        }

        self.recompute(device, key, &mut Vec::new())
    }

    /// Update every dirty `DynamicTexture` in declaration order. Returns the number of passes run.
    pub fn update_all(&mut self, device: &mut dyn Device) -> Result<usize, GraphError> {
        let textures: Vec<ResourceKey> = self
            .order
            .iter()
            .copied()
            .filter(|&key| self.type_of(key) == ResourceType::DynamicTexture)
            .collect();

        let mut passes = 0;
        for key in textures {
            let mut in_progress = Vec::new();
            passes += self.recompute_counting(device, key, &mut in_progress)?;
        }

        Ok(passes)
    }

    fn recompute(
        &mut self,
        device: &mut dyn Device,
        key: ResourceKey,
        in_progress: &mut Vec<ResourceKey>,
    ) -> Result<bool, GraphError> {
        Ok(self.recompute_counting(device, key, in_progress)? > 0)
    }

    fn recompute_counting(
        &mut self,
        device: &mut dyn Device,
        key: ResourceKey,
        in_progress: &mut Vec<ResourceKey>,
    ) -> Result<usize, GraphError> {
        let resource = &self.resources[key];
        let Some(state) = resource.state() else {
            return Ok(0);
        };
        if !state.dirty {
            return Ok(0);
        }
        if in_progress.contains(&key) {
            return Err(GraphError::Cycle {
                id: resource.id().to_string(),
            });
        }

        let dependencies = state.depends_on.clone();
        in_progress.push(key);

        let mut passes = 0;
        for dependency in dependencies {
            if self.type_of(dependency) == ResourceType::DynamicTexture {
                passes += self.recompute_counting(device, dependency, in_progress)?;
            }
        }

        self.execute_pass(device, key)?;
        in_progress.pop();

        if let Some(state) = self.resources[key].state_mut() {
            state.dirty = false;
        }

        Ok(passes + 1)
    }

    fn variable_key(&self, id: &str) -> Result<ResourceKey, GraphError> {
        let (key, resource) = self.find(id)?;
        match resource.state() {
            Some(_) => Ok(key),
            None => Err(unexpected(id, "variable resource", resource.resource_type())),
        }
    }
}

fn unexpected(id: &str, expected: &'static str, found: ResourceType) -> GraphError {
    GraphError::UnexpectedKind {
        id: id.to_string(),
        expected,
        found,
    }
}
