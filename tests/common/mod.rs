#![allow(dead_code)]

use nectargl::{CompileOptions, Declaration, ResourceGraph, Values};
use nectargl_headless::HeadlessDevice;
use serde_json::json;

pub const QUAD: [f32; 8] = [-1.0, -1.0, 1.0, -1.0, 1.0, 1.0, -1.0, 1.0];
pub const QUAD_INDICES: [u16; 6] = [0, 1, 2, 0, 2, 3];

pub const PASS_VERTEX: &str = "void main() { gl_Position = vec4(position, 0.0, 1.0); }";
pub const WHITE_FRAGMENT: &str = "void main() { outColor = vec4(1.0); }";

/// The smallest useful graph: one quad drawn into one 4x4 render target.
pub fn single_pass() -> Vec<Declaration> {
    vec![
        Declaration::new(
            "vsig",
            "VertexSignature",
            json!({ "attributes": { "position": "vec2" }, "maxVertexCount": 4, "maxTriangleCount": 2 }),
        ),
        Declaration::new("quad", "Vertex", json!({ "signature": "vsig" })),
        Declaration::new("tsig", "TextureSignature", json!({ "type": "RGBA8", "size": [4, 4] })),
        Declaration::new(
            "fill",
            "Program",
            json!({ "vertexSignature": "vsig", "vertexShader": PASS_VERTEX, "fragmentShader": WHITE_FRAGMENT }),
        ),
        Declaration::new(
            "target",
            "Texture",
            json!({ "signature": "tsig", "drawOps": [{ "program": "fill", "vertex": "quad" }] }),
        ),
    ]
}

/// A three pass graph:
/// - `base` fills the quad
/// - `dots` draws instanced sprites with a uniform block
/// - `final` samples both through the same uniform block
pub fn scene() -> Vec<Declaration> {
    vec![
        Declaration::new(
            "vsig",
            "VertexSignature",
            json!({ "attributes": { "position": "vec2" }, "maxVertexCount": 4, "maxTriangleCount": 2 }),
        ),
        Declaration::new(
            "isig",
            "InstanceSignature",
            json!({ "attributes": { "offset": "vec2", "tint": "vec4" }, "maxInstanceCount": 8 }),
        ),
        Declaration::new("gsig", "GlobalSignature", json!({ "scale": "float", "screenSize": "vec2" })),
        Declaration::new("tsig", "TextureSignature", json!({ "type": "RGBA8", "size": [4, 4] })),
        Declaration::new("quad", "Vertex", json!({ "signature": "vsig" })),
        Declaration::new("sprites", "Instance", json!({ "signature": "isig" })),
        Declaration::new("params", "Global", json!({ "signature": "gsig" })),
        Declaration::new("sprite", "Texture", json!({ "signature": "tsig" })),
        Declaration::new(
            "fill",
            "Program",
            json!({ "vertexSignature": "vsig", "vertexShader": PASS_VERTEX, "fragmentShader": WHITE_FRAGMENT }),
        ),
        Declaration::new(
            "splat",
            "Program",
            json!({
                "vertexSignature": "vsig",
                "instanceSignature": "isig",
                "globalSignature": "gsig",
                "textures": { "sprite": { "filter": "nearest" } },
                "vertexShader": "out vec4 color;\nvoid main() { color = tint; gl_Position = vec4(position * scale + offset, 0.0, 1.0); }",
                "fragmentShader": "in vec4 color;\nvoid main() { outColor = color * texture(sprite, gl_FragCoord.xy / screenSize); }"
            }),
        ),
        Declaration::new(
            "blend",
            "Program",
            json!({
                "vertexSignature": "vsig",
                "globalSignature": "gsig",
                "textures": { "source": {}, "overlay": { "wrap": "repeat" } },
                "vertexShader": PASS_VERTEX,
                "fragmentShader": "void main() { vec2 uv = gl_FragCoord.xy / screenSize; outColor = texture(source, uv) + texture(overlay, uv) * scale; }"
            }),
        ),
        Declaration::new(
            "base",
            "Texture",
            json!({ "signature": "tsig", "drawOps": [{ "program": "fill", "vertex": "quad" }] }),
        ),
        Declaration::new(
            "dots",
            "Texture",
            json!({
                "signature": "tsig",
                "drawOps": [{
                    "program": "splat", "vertex": "quad", "instances": "sprites", "global": "params",
                    "textures": { "sprite": "sprite" }
                }]
            }),
        ),
        Declaration::new(
            "final",
            "Texture",
            json!({
                "signature": "tsig",
                "drawOps": [{
                    "program": "blend", "vertex": "quad", "global": "params",
                    "textures": { "source": "base", "overlay": "dots" }
                }]
            }),
        ),
    ]
}

pub fn compile(declarations: &[Declaration]) -> (HeadlessDevice, ResourceGraph) {
    let mut device = HeadlessDevice::new();
    let graph = ResourceGraph::compile(declarations, &mut device, CompileOptions::default()).unwrap();
    (device, graph)
}

/// Compile the scene and write every leaf input once, so only the dynamic textures are dirty.
pub fn populated_scene() -> (HeadlessDevice, ResourceGraph) {
    let (mut device, mut graph) = compile(&scene());
    write_quad(&mut device, &mut graph, "quad");

    let offsets = [0.0f32; 4];
    let tints = [1.0f32; 8];
    graph
        .set_instance_data(
            &mut device,
            "sprites",
            &[("offset", Values::from(&offsets)), ("tint", Values::from(&tints))],
            2,
        )
        .unwrap();
    graph
        .set_uniforms(
            &mut device,
            "params",
            &[
                ("scale", nectargl::UniformValue::Float(0.5)),
                ("screenSize", nectargl::UniformValue::Vec2([4.0, 4.0])),
            ],
        )
        .unwrap();
    graph
        .set_texture_data(&mut device, "sprite", nectargl::TextureData::Bytes(&[255; 64]))
        .unwrap();

    (device, graph)
}

pub fn write_quad(device: &mut HeadlessDevice, graph: &mut ResourceGraph, id: &str) {
    graph
        .set_vertices(device, id, &[("position", Values::from(&QUAD))], &QUAD_INDICES, 2)
        .unwrap();
}

pub fn texture_handle(graph: &ResourceGraph, id: &str) -> nectargl::TextureHandle {
    graph.texture(id).unwrap().handle()
}
