use super::{
    DynamicTexture, Global, GlobalSignature, Instance, InstanceSignature, Lookup, Program, Resource, ResourceGraph,
    ResourceKey, ResourceKind, StaticTexture, TextureSignature, Vertex, VertexSignature, VariableState,
};
use crate::{
    Device, GraphError, InstanceProvider, ProgramProvider, ResourceType, Size, TextureDesc, TextureProvider,
    UniformProvider, VertexProvider,
    declaration::*,
    glsl::ShaderInterface,
    layout::{Layout, PrimitiveType},
};
use slotmap::SlotMap;
use std::collections::HashMap;

/// Knobs for graph compilation and presentation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CompileOptions {
    /// Color every render target is cleared to before its draw operations run.
    pub clear_color: [f32; 4],
    /// Binding point global uniform blocks are attached to.
    pub uniform_binding: u32,
    /// Size of the display surface the screen pass draws into.
    pub surface_size: Size,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            clear_color: [0.0, 0.0, 0.0, 1.0],
            uniform_binding: 0,
            surface_size: Size {
                width: 800,
                height: 600,
            },
        }
    }
}

impl ResourceGraph {
    /// Build a graph from an ordered declaration list.
    ///
    /// Resources are instantiated in order, so signatures have to be declared before the
    /// resources using them. Draw operations may reference resources declared later;
    /// they are resolved by the dependency pass once every resource exists. A failure
    /// at any point deletes whatever was already created on the device.
    pub fn compile(
        declarations: &[Declaration],
        device: &mut dyn Device,
        options: CompileOptions,
    ) -> Result<ResourceGraph, GraphError> {
        let mut graph = ResourceGraph {
            resources: SlotMap::with_key(),
            ids: HashMap::new(),
            order: Vec::with_capacity(declarations.len()),
            options,
        };

        match graph.instantiate_all(declarations, device).and_then(|_| graph.compute_dependencies()) {
            Ok(()) => {
                log::debug!("compiled resource graph with {} resources", graph.len());
                Ok(graph)
            }
            Err(err) => {
                graph.delete(device);
                Err(err)
            }
        }
    }

    /// Same as [`ResourceGraph::compile`], reading the declarations from a JSON array.
    pub fn compile_json(
        json: &str,
        device: &mut dyn Device,
        options: CompileOptions,
    ) -> Result<ResourceGraph, GraphError> {
        let declarations = parse_declarations(json)?;
        Self::compile(&declarations, device, options)
    }

    fn instantiate_all(&mut self, declarations: &[Declaration], device: &mut dyn Device) -> Result<(), GraphError> {
        for declaration in declarations {
            if self.ids.contains_key(&declaration.id) {
                return Err(GraphError::DuplicateId {
                    id: declaration.id.clone(),
                });
            }

            let kind = instantiate(declaration, self.lookup(), device)?;
            log::debug!("instantiated {} `{}`", kind.resource_type(), declaration.id);

            let key = self.resources.insert(Resource {
                id: declaration.id.clone(),
                kind,
            });
            self.ids.insert(declaration.id.clone(), key);
            self.order.push(key);
        }

        Ok(())
    }
}

fn instantiate(
    declaration: &Declaration,
    lookup: Lookup<'_>,
    device: &mut dyn Device,
) -> Result<ResourceKind, GraphError> {
    let id = declaration.id.as_str();

    let kind = match declaration.resource_type()? {
        ResourceType::VertexSignature => {
            let data: VertexSignatureData = declaration.parse()?;
            let attributes = attribute_list(id, &data.attributes)?;
            ResourceKind::VertexSignature(VertexSignature {
                attributes,
                max_vertex_count: data.max_vertex_count,
                max_triangle_count: data.max_triangle_count,
            })
        }
        ResourceType::InstanceSignature => {
            let data: InstanceSignatureData = declaration.parse()?;
            let attributes = attribute_list(id, &data.attributes)?;
            ResourceKind::InstanceSignature(InstanceSignature {
                attributes,
                max_instance_count: data.max_instance_count,
            })
        }
        ResourceType::GlobalSignature => {
            let data: GlobalSignatureData = declaration.parse()?;
            ResourceKind::GlobalSignature(GlobalSignature {
                fields: data.fields.0,
            })
        }
        ResourceType::TextureSignature => {
            let data: TextureSignatureData = declaration.parse()?;
            ResourceKind::TextureSignature(TextureSignature {
                format: data.format,
                size: data.size.into(),
            })
        }
        ResourceType::Program => {
            let data: ProgramData = declaration.parse()?;
            ResourceKind::Program(instantiate_program(id, &data, lookup, device)?)
        }
        ResourceType::Vertex => {
            let data: SignatureRef = declaration.parse()?;
            let (signature, sig) = lookup.expect(id, &data.signature, "VertexSignature", |kind| match kind {
                ResourceKind::VertexSignature(x) => Some(x),
                _ => None,
            })?;
            let provider = VertexProvider::new(device, &sig.attributes, sig.max_vertex_count, sig.max_triangle_count)
                .map_err(GraphError::device(id))?;

            ResourceKind::Vertex(Vertex {
                state: VariableState::new(),
                signature,
                provider,
                triangle_count: 0,
            })
        }
        ResourceType::Instance => {
            let data: SignatureRef = declaration.parse()?;
            let (signature, sig) = lookup.expect(id, &data.signature, "InstanceSignature", |kind| match kind {
                ResourceKind::InstanceSignature(x) => Some(x),
                _ => None,
            })?;
            let provider =
                InstanceProvider::new(device, &sig.attributes, sig.max_instance_count).map_err(GraphError::device(id))?;

            ResourceKind::Instance(Instance {
                state: VariableState::new(),
                signature,
                provider,
                instance_count: 0,
            })
        }
        ResourceType::Global => {
            let data: SignatureRef = declaration.parse()?;
            let (signature, sig) = lookup.expect(id, &data.signature, "GlobalSignature", |kind| match kind {
                ResourceKind::GlobalSignature(x) => Some(x),
                _ => None,
            })?;
            let provider = UniformProvider::new(device, &sig.fields).map_err(GraphError::device(id))?;

            ResourceKind::Global(Global {
                state: VariableState::new(),
                signature,
                provider,
            })
        }
        ResourceType::StaticTexture => {
            let data: SignatureRef = declaration.parse()?;
            let (signature, provider) = instantiate_texture(id, &data.signature, false, lookup, device)?;

            ResourceKind::StaticTexture(StaticTexture {
                state: VariableState::new(),
                signature,
                provider,
            })
        }
        ResourceType::DynamicTexture => {
            let data: DynamicTextureData = declaration.parse()?;
            let (signature, provider) = instantiate_texture(id, &data.signature, true, lookup, device)?;

            ResourceKind::DynamicTexture(DynamicTexture {
                state: VariableState::new(),
                signature,
                provider,
                declared: data.draw_ops,
                draw_ops: Vec::new(),
            })
        }
    };

    Ok(kind)
}

fn instantiate_texture(
    id: &str,
    signature: &str,
    render_target: bool,
    lookup: Lookup<'_>,
    device: &mut dyn Device,
) -> Result<(ResourceKey, TextureProvider), GraphError> {
    let (key, sig) = lookup.expect(id, signature, "TextureSignature", |kind| match kind {
        ResourceKind::TextureSignature(x) => Some(x),
        _ => None,
    })?;

    let desc = TextureDesc {
        format: sig.format,
        size: sig.size,
        render_target,
    };
    let provider = TextureProvider::new(device, desc).map_err(GraphError::device(id))?;

    Ok((key, provider))
}

fn instantiate_program(
    id: &str,
    data: &ProgramData,
    lookup: Lookup<'_>,
    device: &mut dyn Device,
) -> Result<Program, GraphError> {
    let (vertex_signature, vertex) = lookup.expect(id, &data.vertex_signature, "VertexSignature", |kind| match kind {
        ResourceKind::VertexSignature(x) => Some(x),
        _ => None,
    })?;

    let instance = data
        .instance_signature
        .as_deref()
        .map(|target| {
            lookup.expect(id, target, "InstanceSignature", |kind| match kind {
                ResourceKind::InstanceSignature(x) => Some(x),
                _ => None,
            })
        })
        .transpose()?;

    let global = data
        .global_signature
        .as_deref()
        .map(|target| {
            lookup.expect(id, target, "GlobalSignature", |kind| match kind {
                ResourceKind::GlobalSignature(x) => Some(x),
                _ => None,
            })
        })
        .transpose()?;

    let vertex_layout = Layout::packed(&vertex.attributes);
    let instance_layout = instance.map(|(_, sig)| Layout::packed(&sig.attributes));
    let global_layout = global.map(|(_, sig)| Layout::std140(&sig.fields));
    let global_name = data.global_signature.as_deref().unwrap_or_default();
    let sampler_names: Vec<&str> = data.textures.keys().collect();

    let interface = ShaderInterface {
        vertex: &vertex_layout,
        instance: instance_layout.as_ref(),
        global: global_layout.as_ref().map(|layout| (global_name, layout)),
        samplers: &sampler_names,
    };

    let provider = ProgramProvider::new(
        device,
        interface,
        data.textures.as_slice(),
        &data.vertex_shader,
        &data.fragment_shader,
    )
    .map_err(GraphError::device(id))?;

    Ok(Program {
        provider,
        vertex_signature,
        instance_signature: instance.map(|(key, _)| key),
        global_signature: global.map(|(key, _)| key),
    })
}

/// Vertex and instance attributes, rejecting types that cannot be vertex inputs.
fn attribute_list(
    id: &str,
    attributes: &OrderedMap<PrimitiveType>,
) -> Result<Vec<(String, PrimitiveType)>, GraphError> {
    match attributes.iter().find(|(_, ty)| ty.is_matrix()) {
        Some((name, ty)) => Err(GraphError::UnsupportedAttribute {
            id: id.to_string(),
            name: name.to_string(),
            ty: *ty,
        }),
        None => Ok(attributes.0.clone()),
    }
}
