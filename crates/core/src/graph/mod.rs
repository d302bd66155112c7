//! The resource graph.
//!
//! Resources live in a slot map arena and refer to each other by [`ResourceKey`].
//! Variable resources carry a dirty flag plus both directions of their dependency
//! edges; edges are built once by the dependency pass and never change afterwards.

mod compile;
mod dependency;
mod pass;
mod resource;
mod update;

pub use compile::*;
pub use resource::*;

pub(crate) use pass::attribute_bindings;

use crate::{Device, GraphError, ResourceType, TextureProvider};
use slotmap::{SlotMap, new_key_type};
use std::collections::HashMap;

new_key_type! {
    /// Stable handle of a resource inside one graph.
    pub struct ResourceKey;
}

/// A compiled resource graph.
#[derive(Debug)]
pub struct ResourceGraph {
    resources: SlotMap<ResourceKey, Resource>,
    ids: HashMap<String, ResourceKey>,
    /// Declaration order.
    order: Vec<ResourceKey>,
    options: CompileOptions,
}

/// Read-only view used to resolve references by id.
#[derive(Clone, Copy)]
pub struct Lookup<'a> {
    resources: &'a SlotMap<ResourceKey, Resource>,
    ids: &'a HashMap<String, ResourceKey>,
}

impl<'a> Lookup<'a> {
    pub fn key(&self, id: &str) -> Option<ResourceKey> {
        self.ids.get(id).copied()
    }

    pub fn get(&self, id: &str) -> Option<&'a Resource> {
        self.key(id).and_then(|key| self.resources.get(key))
    }

    pub fn resource(&self, key: ResourceKey) -> Option<&'a Resource> {
        self.resources.get(key)
    }

    /// Resolve `target` on behalf of `from`, requiring a particular kind.
    pub(crate) fn expect<T>(
        &self,
        from: &str,
        target: &str,
        expected: &'static str,
        select: impl FnOnce(&'a ResourceKind) -> Option<&'a T>,
    ) -> Result<(ResourceKey, &'a T), GraphError> {
        let key = self.key(target).ok_or_else(|| GraphError::MissingReference {
            from: from.to_string(),
            target: target.to_string(),
        })?;
        let resource = &self.resources[key];

        match select(&resource.kind) {
            Some(value) => Ok((key, value)),
            None => Err(GraphError::WrongKind {
                from: from.to_string(),
                target: target.to_string(),
                expected,
                found: resource.resource_type(),
            }),
        }
    }
}

impl ResourceGraph {
    pub fn lookup(&self) -> Lookup<'_> {
        Lookup {
            resources: &self.resources,
            ids: &self.ids,
        }
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    pub fn key(&self, id: &str) -> Option<ResourceKey> {
        self.ids.get(id).copied()
    }

    pub fn get(&self, id: &str) -> Option<&Resource> {
        self.lookup().get(id)
    }

    pub fn resource(&self, key: ResourceKey) -> Option<&Resource> {
        self.resources.get(key)
    }

    /// Resource ids in declaration order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(|&key| self.resources[key].id())
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn is_dirty(&self, id: &str) -> Result<bool, GraphError> {
        Ok(self.state(id)?.is_dirty())
    }

    /// Ids of the resources `id` reads.
    pub fn depends_on(&self, id: &str) -> Result<Vec<&str>, GraphError> {
        let state = self.state(id)?;
        Ok(state.depends_on.iter().map(|&key| self.resources[key].id()).collect())
    }

    /// Ids of the resources that read `id`.
    pub fn dependency_of(&self, id: &str) -> Result<Vec<&str>, GraphError> {
        let state = self.state(id)?;
        Ok(state.dependency_of.iter().map(|&key| self.resources[key].id()).collect())
    }

    /// Texture behind a static or dynamic texture resource.
    pub fn texture(&self, id: &str) -> Result<&TextureProvider, GraphError> {
        match &self.find(id)?.1.kind {
            ResourceKind::StaticTexture(x) => Ok(&x.provider),
            ResourceKind::DynamicTexture(x) => Ok(&x.provider),
            other => Err(GraphError::UnexpectedKind {
                id: id.to_string(),
                expected: "texture",
                found: other.resource_type(),
            }),
        }
    }

    /// Read back the current texels of a texture resource without recomputing it.
    pub fn read_texture(&self, device: &mut dyn Device, id: &str) -> Result<Vec<u8>, GraphError> {
        self.texture(id)?.read(device).map_err(GraphError::device(id))
    }

    /// Delete every device object owned by the graph.
    pub fn delete(self, device: &mut dyn Device) {
        log::debug!("deleting resource graph ({} resources)", self.order.len());

        for (_, resource) in self.resources {
            match resource.kind {
                ResourceKind::Program(x) => x.provider.delete(device),
                ResourceKind::Vertex(x) => x.provider.delete(device),
                ResourceKind::Instance(x) => x.provider.delete(device),
                ResourceKind::Global(x) => x.provider.delete(device),
                ResourceKind::StaticTexture(x) => x.provider.delete(device),
                ResourceKind::DynamicTexture(x) => x.provider.delete(device),
                ResourceKind::VertexSignature(_)
                | ResourceKind::InstanceSignature(_)
                | ResourceKind::GlobalSignature(_)
                | ResourceKind::TextureSignature(_) => {}
            }
        }
    }

    fn find(&self, id: &str) -> Result<(ResourceKey, &Resource), GraphError> {
        let key = self.key(id).ok_or_else(|| GraphError::NotFound { id: id.to_string() })?;
        Ok((key, &self.resources[key]))
    }

    fn find_mut(&mut self, id: &str) -> Result<(ResourceKey, &mut Resource), GraphError> {
        let key = self.key(id).ok_or_else(|| GraphError::NotFound { id: id.to_string() })?;
        Ok((key, &mut self.resources[key]))
    }

    fn state(&self, id: &str) -> Result<&VariableState, GraphError> {
        let resource = self.find(id)?.1;
        resource.state().ok_or_else(|| GraphError::UnexpectedKind {
            id: id.to_string(),
            expected: "variable resource",
            found: resource.resource_type(),
        })
    }

    fn type_of(&self, key: ResourceKey) -> ResourceType {
        self.resources[key].resource_type()
    }
}
