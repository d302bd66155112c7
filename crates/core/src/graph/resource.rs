use super::ResourceKey;
use crate::{
    InstanceProvider, ProgramProvider, ResourceType, Size, TextureFormat, TextureProvider, UniformProvider,
    VertexProvider, declaration::DrawOperation, layout::PrimitiveType,
};

/// A node of the resource graph.
#[derive(Debug)]
pub struct Resource {
    pub(crate) id: String,
    pub(crate) kind: ResourceKind,
}

impl Resource {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> &ResourceKind {
        &self.kind
    }

    pub fn resource_type(&self) -> ResourceType {
        self.kind.resource_type()
    }

    /// Incremental bookkeeping, `None` for persistent resources.
    pub fn state(&self) -> Option<&VariableState> {
        self.kind.state()
    }

    pub(crate) fn state_mut(&mut self) -> Option<&mut VariableState> {
        self.kind.state_mut()
    }
}

#[derive(Debug)]
pub enum ResourceKind {
    VertexSignature(VertexSignature),
    InstanceSignature(InstanceSignature),
    GlobalSignature(GlobalSignature),
    TextureSignature(TextureSignature),
    Program(Program),
    Vertex(Vertex),
    Instance(Instance),
    Global(Global),
    StaticTexture(StaticTexture),
    DynamicTexture(DynamicTexture),
}

impl ResourceKind {
    pub fn resource_type(&self) -> ResourceType {
        match self {
            ResourceKind::VertexSignature(_) => ResourceType::VertexSignature,
            ResourceKind::InstanceSignature(_) => ResourceType::InstanceSignature,
            ResourceKind::GlobalSignature(_) => ResourceType::GlobalSignature,
            ResourceKind::TextureSignature(_) => ResourceType::TextureSignature,
            ResourceKind::Program(_) => ResourceType::Program,
            ResourceKind::Vertex(_) => ResourceType::Vertex,
            ResourceKind::Instance(_) => ResourceType::Instance,
            ResourceKind::Global(_) => ResourceType::Global,
            ResourceKind::StaticTexture(_) => ResourceType::StaticTexture,
            ResourceKind::DynamicTexture(_) => ResourceType::DynamicTexture,
        }
    }

    pub fn state(&self) -> Option<&VariableState> {
        match self {
            ResourceKind::Vertex(x) => Some(&x.state),
            ResourceKind::Instance(x) => Some(&x.state),
            ResourceKind::Global(x) => Some(&x.state),
            ResourceKind::StaticTexture(x) => Some(&x.state),
            ResourceKind::DynamicTexture(x) => Some(&x.state),
            ResourceKind::VertexSignature(_)
            | ResourceKind::InstanceSignature(_)
            | ResourceKind::GlobalSignature(_)
            | ResourceKind::TextureSignature(_)
            | ResourceKind::Program(_) => None,
        }
    }

    pub(crate) fn state_mut(&mut self) -> Option<&mut VariableState> {
        match self {
            ResourceKind::Vertex(x) => Some(&mut x.state),
            ResourceKind::Instance(x) => Some(&mut x.state),
            ResourceKind::Global(x) => Some(&mut x.state),
            ResourceKind::StaticTexture(x) => Some(&mut x.state),
            ResourceKind::DynamicTexture(x) => Some(&mut x.state),
            ResourceKind::VertexSignature(_)
            | ResourceKind::InstanceSignature(_)
            | ResourceKind::GlobalSignature(_)
            | ResourceKind::TextureSignature(_)
            | ResourceKind::Program(_) => None,
        }
    }
}

/// Dirty flag and dependency edges of a variable resource.
#[derive(Clone, Debug)]
pub struct VariableState {
    pub(crate) dirty: bool,
    pub(crate) depends_on: Vec<ResourceKey>,
    pub(crate) dependency_of: Vec<ResourceKey>,
}

impl VariableState {
    pub(crate) fn new() -> Self {
        Self {
            dirty: true,
            depends_on: Vec::new(),
            dependency_of: Vec::new(),
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Resources this one reads.
    pub fn depends_on(&self) -> &[ResourceKey] {
        &self.depends_on
    }

    /// Resources that read this one.
    pub fn dependency_of(&self) -> &[ResourceKey] {
        &self.dependency_of
    }
}

#[derive(Debug)]
pub struct VertexSignature {
    pub attributes: Vec<(String, PrimitiveType)>,
    pub max_vertex_count: u32,
    pub max_triangle_count: u32,
}

#[derive(Debug)]
pub struct InstanceSignature {
    pub attributes: Vec<(String, PrimitiveType)>,
    pub max_instance_count: u32,
}

#[derive(Debug)]
pub struct GlobalSignature {
    pub fields: Vec<(String, PrimitiveType)>,
}

#[derive(Debug)]
pub struct TextureSignature {
    pub format: TextureFormat,
    pub size: Size,
}

#[derive(Debug)]
pub struct Program {
    pub(crate) provider: ProgramProvider,
    pub(crate) vertex_signature: ResourceKey,
    pub(crate) instance_signature: Option<ResourceKey>,
    pub(crate) global_signature: Option<ResourceKey>,
}

impl Program {
    pub fn provider(&self) -> &ProgramProvider {
        &self.provider
    }
}

#[derive(Debug)]
pub struct Vertex {
    pub(crate) state: VariableState,
    pub(crate) signature: ResourceKey,
    pub(crate) provider: VertexProvider,
    /// Triangles drawn, as of the last `set_vertices`.
    pub(crate) triangle_count: u32,
}

impl Vertex {
    pub fn provider(&self) -> &VertexProvider {
        &self.provider
    }

    pub fn triangle_count(&self) -> u32 {
        self.triangle_count
    }
}

#[derive(Debug)]
pub struct Instance {
    pub(crate) state: VariableState,
    pub(crate) signature: ResourceKey,
    pub(crate) provider: InstanceProvider,
    pub(crate) instance_count: u32,
}

impl Instance {
    pub fn provider(&self) -> &InstanceProvider {
        &self.provider
    }

    pub fn instance_count(&self) -> u32 {
        self.instance_count
    }
}

#[derive(Debug)]
pub struct Global {
    pub(crate) state: VariableState,
    pub(crate) signature: ResourceKey,
    pub(crate) provider: UniformProvider,
}

impl Global {
    pub fn provider(&self) -> &UniformProvider {
        &self.provider
    }
}

#[derive(Debug)]
pub struct StaticTexture {
    pub(crate) state: VariableState,
    pub(crate) signature: ResourceKey,
    pub(crate) provider: TextureProvider,
}

impl StaticTexture {
    pub fn provider(&self) -> &TextureProvider {
        &self.provider
    }
}

#[derive(Debug)]
pub struct DynamicTexture {
    pub(crate) state: VariableState,
    pub(crate) signature: ResourceKey,
    pub(crate) provider: TextureProvider,
    /// Draw operations as declared, by resource id.
    pub(crate) declared: Vec<DrawOperation>,
    /// The same operations resolved by the dependency pass.
    pub(crate) draw_ops: Vec<DrawOp>,
}

impl DynamicTexture {
    pub fn provider(&self) -> &TextureProvider {
        &self.provider
    }

    pub fn draw_ops(&self) -> &[DrawOp] {
        &self.draw_ops
    }
}

/// A draw operation with every reference resolved to a graph key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DrawOp {
    pub program: ResourceKey,
    pub vertex: ResourceKey,
    pub instance: Option<ResourceKey>,
    pub global: Option<ResourceKey>,
    /// Sampler name and sampled texture, in declaration order.
    pub textures: Vec<(String, ResourceKey)>,
}
