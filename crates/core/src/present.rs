use crate::{
    CompileOptions, Declaration, Device, DrawCall, GraphError, ProgramProvider, ResourceGraph, ResourceKey,
    ResourceType, Size, TextureBinding, TextureSampling, Values, VertexProvider,
    glsl::ShaderInterface,
    graph::attribute_bindings,
    layout::PrimitiveType,
};

const SCREEN: &str = "screen";
const SCREEN_SAMPLER: &str = "screenTexture";

const BLIT_VERTEX: &str = "out vec2 uv;
void main() {
    uv = position * 0.5 + 0.5;
    gl_Position = vec4(position, 0.0, 1.0);
}";

const BLIT_FRAGMENT: &str = "in vec2 uv;
void main() {
    outColor = texture(screenTexture, uv);
}";

const QUAD: [f32; 8] = [-1.0, -1.0, 1.0, -1.0, 1.0, 1.0, -1.0, 1.0];
const QUAD_INDICES: [u16; 6] = [0, 1, 2, 0, 2, 3];

/// The fixed full screen pass that copies a dynamic texture onto the display surface.
#[derive(Debug)]
pub struct Screen {
    program: ProgramProvider,
    quad: VertexProvider,
    size: Size,
    source: Option<ResourceKey>,
}

impl Screen {
    pub fn new(device: &mut dyn Device, size: Size) -> Result<Self, GraphError> {
        let attributes = [("position".to_string(), PrimitiveType::Vec2)];
        let quad = VertexProvider::new(device, &attributes, 4, 2).map_err(GraphError::device(SCREEN))?;
        quad.set_vertices(device, &[("position", Values::Float(&QUAD))], &QUAD_INDICES)
            .map_err(GraphError::data(SCREEN))?;

        let interface = ShaderInterface {
            vertex: quad.layout(),
            instance: None,
            global: None,
            samplers: &[SCREEN_SAMPLER],
        };
        let samplers = [(SCREEN_SAMPLER.to_string(), TextureSampling::default())];
        let program = match ProgramProvider::new(device, interface, &samplers, BLIT_VERTEX, BLIT_FRAGMENT) {
            Ok(program) => program,
            Err(err) => {
                quad.delete(device);
                return Err(GraphError::device(SCREEN)(err));
            }
        };

        Ok(Self {
            program,
            quad,
            size,
            source: None,
        })
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn delete(self, device: &mut dyn Device) {
        self.program.delete(device);
        self.quad.delete(device);
    }

    fn blit(&self, device: &mut dyn Device, graph: &ResourceGraph, clear: [f32; 4]) -> Result<(), GraphError> {
        let key = self.source.ok_or(GraphError::NoScreen)?;
        let resource = graph.resource(key).ok_or(GraphError::NoScreen)?;
        let texture = graph.texture(resource.id())?;

        device.begin_pass(None, self.size, clear).map_err(GraphError::device(SCREEN))?;
        device
            .draw(&DrawCall {
                program: self.program.handle(),
                vertex_buffer: self.quad.vertex_buffer(),
                vertex_attributes: attribute_bindings(self.quad.layout(), 0, 0),
                index_buffer: self.quad.index_buffer(),
                index_count: QUAD_INDICES.len() as u32,
                instances: None,
                uniform_block: None,
                textures: vec![TextureBinding {
                    unit: 0,
                    texture: texture.handle(),
                    sampler: SCREEN_SAMPLER,
                    sampling: self.program.sampling(SCREEN_SAMPLER),
                }],
            })
            .map_err(GraphError::device(SCREEN))
    }
}

/// A compiled graph together with its presentation pass.
#[derive(Debug)]
pub struct Graphics {
    graph: ResourceGraph,
    screen: Screen,
}

impl Graphics {
    pub fn compile(
        declarations: &[Declaration],
        device: &mut dyn Device,
        options: CompileOptions,
    ) -> Result<Self, GraphError> {
        let graph = ResourceGraph::compile(declarations, device, options)?;
        Self::with_graph(graph, device)
    }

    pub fn compile_json(json: &str, device: &mut dyn Device, options: CompileOptions) -> Result<Self, GraphError> {
        let graph = ResourceGraph::compile_json(json, device, options)?;
        Self::with_graph(graph, device)
    }

    pub fn with_graph(graph: ResourceGraph, device: &mut dyn Device) -> Result<Self, GraphError> {
        match Screen::new(device, graph.options().surface_size) {
            Ok(screen) => Ok(Self { graph, screen }),
            Err(err) => {
                graph.delete(device);
                Err(err)
            }
        }
    }

    pub fn graph(&self) -> &ResourceGraph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut ResourceGraph {
        &mut self.graph
    }

    /// Select the dynamic texture shown by [`Graphics::refresh_screen`].
    pub fn set_screen(&mut self, id: &str) -> Result<(), GraphError> {
        let resource = self.graph.get(id).ok_or_else(|| GraphError::NotFound { id: id.to_string() })?;
        if resource.resource_type() != ResourceType::DynamicTexture {
            return Err(GraphError::UnexpectedKind {
                id: id.to_string(),
                expected: "DynamicTexture",
                found: resource.resource_type(),
            });
        }

        self.screen.source = self.graph.key(id);
        log::debug!("screen shows `{}`", id);
        Ok(())
    }

    /// Id of the texture currently on screen.
    pub fn screen(&self) -> Option<&str> {
        self.screen
            .source
            .and_then(|key| self.graph.resource(key))
            .map(|resource| resource.id())
    }

    /// Change the display surface size used by the screen pass.
    pub fn resize(&mut self, size: Size) {
        self.screen.size = size;
    }

    /// Update the selected texture if it is stale, then draw it onto the display surface.
    pub fn refresh_screen(&mut self, device: &mut dyn Device) -> Result<(), GraphError> {
        let id = self.screen().ok_or(GraphError::NoScreen)?.to_string();
        self.graph.update_texture_data(device, &id)?;

        let clear = self.graph.options().clear_color;
        self.screen.blit(device, &self.graph, clear)
    }

    pub fn delete(self, device: &mut dyn Device) {
        self.screen.delete(device);
        self.graph.delete(device);
    }
}
