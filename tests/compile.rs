mod common;

use common::*;
use nectargl::{CompileOptions, Declaration, DeviceError, GraphError, ResourceGraph, ShaderStage};
use nectargl_headless::HeadlessDevice;
use serde_json::json;

fn try_compile(declarations: &[Declaration]) -> (HeadlessDevice, Result<ResourceGraph, GraphError>) {
    let mut device = HeadlessDevice::new();
    let result = ResourceGraph::compile(declarations, &mut device, CompileOptions::default());
    (device, result)
}

/// `single_pass` with the draw operations of `target` replaced
fn with_draw_ops(draw_ops: serde_json::Value) -> Vec<Declaration> {
    let mut declarations = single_pass();
    declarations.pop();
    declarations.push(Declaration::new(
        "target",
        "Texture",
        json!({ "signature": "tsig", "drawOps": draw_ops }),
    ));
    declarations
}

fn sampling_program() -> Declaration {
    Declaration::new(
        "copy",
        "Program",
        json!({
            "vertexSignature": "vsig",
            "textures": { "source": {} },
            "vertexShader": PASS_VERTEX,
            "fragmentShader": "void main() { outColor = texture(source, vec2(0.5)); }"
        }),
    )
}

#[test]
fn assembled_program_layout() {
    let (device, graph) = compile(&scene());

    let program = match graph.get("splat").unwrap().kind() {
        nectargl::graph::ResourceKind::Program(program) => program.provider(),
        _ => unreachable!(),
    };
    let (vertex, fragment) = device.program_source(program.handle()).unwrap();

    assert!(vertex.starts_with("#version 300 es\n"));
    assert!(vertex.contains("layout(location = 0) in vec2 position;"));
    assert!(vertex.contains("layout(location = 1) in vec2 offset;"));
    assert!(vertex.contains("layout(location = 2) in vec4 tint;"));
    assert!(vertex.contains("layout(std140) uniform gsig {\n    float scale;\n    vec2 screenSize;\n};"));

    assert!(fragment.contains("out vec4 outColor;"));
    assert!(fragment.contains("uniform sampler2D sprite;"));
    assert!(fragment.contains("layout(std140) uniform gsig {"));
    assert!(fragment.ends_with("screenSize); }\n"));
}

#[test]
fn shader_errors_carry_the_log() {
    let mut declarations = single_pass();
    declarations[3] = Declaration::new(
        "fill",
        "Program",
        json!({
            "vertexSignature": "vsig",
            "vertexShader": PASS_VERTEX,
            "fragmentShader": "#error broken\nvoid main() {}"
        }),
    );

    let (device, result) = try_compile(&declarations);
    match result {
        Err(GraphError::Device {
            id,
            source: DeviceError::ShaderCompile { stage, log },
        }) => {
            assert_eq!(id, "fill");
            assert_eq!(stage, ShaderStage::Fragment);
            assert!(log.contains("broken"));
        }
        other => panic!("unexpected {:?}", other.map(|_| ())),
    }

    // everything created before the failure was released
    assert_eq!(device.live_objects(), (0, 0, 0));
}

#[test]
fn missing_references_are_fatal() {
    let (_, result) = try_compile(&with_draw_ops(json!([{ "program": "fill", "vertex": "nope" }])));
    match result {
        Err(GraphError::MissingReference { from, target }) => {
            assert_eq!(from, "target");
            assert_eq!(target, "nope");
        }
        other => panic!("unexpected {:?}", other.map(|_| ())),
    }

    let mut declarations = single_pass();
    declarations[1] = Declaration::new("quad", "Vertex", json!({ "signature": "later" }));
    let (device, result) = try_compile(&declarations);
    assert!(matches!(result, Err(GraphError::MissingReference { .. })));
    assert_eq!(device.live_objects(), (0, 0, 0));
}

#[test]
fn references_must_have_the_right_kind() {
    let (_, result) = try_compile(&with_draw_ops(json!([{ "program": "quad", "vertex": "quad" }])));
    match result {
        Err(GraphError::WrongKind { target, expected, .. }) => {
            assert_eq!(target, "quad");
            assert_eq!(expected, "Program");
        }
        other => panic!("unexpected {:?}", other.map(|_| ())),
    }
}

#[test]
fn draw_operations_must_fit_their_program() {
    // the program declares no samplers
    let (_, result) = try_compile(&with_draw_ops(json!([
        { "program": "fill", "vertex": "quad", "textures": { "source": "target" } }
    ])));
    assert!(matches!(result, Err(GraphError::ProgramMismatch { .. })));

    // the program has no instance signature
    let mut declarations = with_draw_ops(json!([{ "program": "fill", "vertex": "quad", "instance": "quad" }]));
    declarations.insert(
        0,
        Declaration::new(
            "isig",
            "InstanceSignature",
            json!({ "attributes": { "offset": "vec2" }, "maxInstanceCount": 1 }),
        ),
    );
    let (_, result) = try_compile(&declarations);
    assert!(matches!(result, Err(GraphError::ProgramMismatch { .. })));
}

#[test]
fn sampling_itself_is_a_cycle() {
    let mut declarations = with_draw_ops(json!([
        { "program": "copy", "vertex": "quad", "textures": { "source": "target" } }
    ]));
    declarations.insert(4, sampling_program());

    let (device, result) = try_compile(&declarations);
    assert!(matches!(result, Err(GraphError::Cycle { .. })));
    assert_eq!(device.live_objects(), (0, 0, 0));
}

#[test]
fn mutual_sampling_is_a_cycle() {
    let mut declarations = single_pass();
    declarations.pop();
    declarations.push(sampling_program());
    declarations.push(Declaration::new(
        "a",
        "Texture",
        json!({
            "signature": "tsig",
            "drawOps": [{ "program": "copy", "vertex": "quad", "textures": { "source": "b" } }]
        }),
    ));
    declarations.push(Declaration::new(
        "b",
        "Texture",
        json!({
            "signature": "tsig",
            "drawOps": [{ "program": "copy", "vertex": "quad", "textures": { "source": "a" } }]
        }),
    ));

    let (_, result) = try_compile(&declarations);
    match result {
        Err(GraphError::Cycle { id }) => assert!(id == "a" || id == "b"),
        other => panic!("unexpected {:?}", other.map(|_| ())),
    }
}

#[test]
fn declaration_errors() {
    let mut declarations = single_pass();
    declarations.push(Declaration::new("quad", "Vertex", json!({ "signature": "vsig" })));
    let (_, result) = try_compile(&declarations);
    assert!(matches!(result, Err(GraphError::DuplicateId { id }) if id == "quad"));

    let (_, result) = try_compile(&[Declaration::new("x", "Sprite", json!({}))]);
    assert!(matches!(result, Err(GraphError::UnknownType { .. })));

    let (_, result) = try_compile(&[Declaration::new(
        "vsig",
        "VertexSignature",
        json!({ "attributes": { "transform": "mat4" }, "maxVertexCount": 4, "maxTriangleCount": 2 }),
    )]);
    assert!(matches!(result, Err(GraphError::UnsupportedAttribute { .. })));

    let mut device = HeadlessDevice::new();
    assert!(matches!(
        ResourceGraph::compile_json("{ not json", &mut device, CompileOptions::default()),
        Err(GraphError::Parse(_))
    ));
}
