mod common;

use common::*;
use nectargl::{UniformValue, Uniforms, graph::ResourceKind};

#[derive(Uniforms)]
struct Params {
    scale: f32,
    #[uniform(rename = "screenSize")]
    screen_size: [f32; 2],
}

#[derive(Uniforms)]
struct Partial {
    scale: f64,
}

#[derive(Uniforms)]
struct Wrong {
    #[uniform(rename = "screenSize")]
    screen_size: i32,
}

fn block_bytes(graph: &nectargl::ResourceGraph) -> Vec<u8> {
    match graph.get("params").unwrap().kind() {
        ResourceKind::Global(global) => global.provider().bytes().to_vec(),
        _ => unreachable!(),
    }
}

#[test]
fn derive_writes_named_fields() {
    let mut writes: Vec<(String, UniformValue)> = Vec::new();
    Params {
        scale: 0.5,
        screen_size: [640.0, 480.0],
    }
    .write_uniforms(&mut writes);

    assert_eq!(
        writes,
        [
            ("scale".to_string(), UniformValue::Float(0.5)),
            ("screenSize".to_string(), UniformValue::Vec2([640.0, 480.0])),
        ]
    );
}

/// std140: `scale` at 0, `screenSize` aligned to 8, block rounded up to 16
#[test]
fn uniform_block_lands_at_std140_offsets() {
    let (mut device, mut graph) = compile(&scene());
    graph
        .set_uniform_block(
            &mut device,
            "params",
            &Params {
                scale: 2.0,
                screen_size: [4.0, 8.0],
            },
        )
        .unwrap();

    let bytes = block_bytes(&graph);
    assert_eq!(bytes.len(), 16);
    assert_eq!(&bytes[0..4], 2.0f32.to_ne_bytes());
    assert_eq!(&bytes[8..12], 4.0f32.to_ne_bytes());
    assert_eq!(&bytes[12..16], 8.0f32.to_ne_bytes());

    let buffer = match graph.get("params").unwrap().kind() {
        ResourceKind::Global(global) => global.provider().buffer(),
        _ => unreachable!(),
    };
    assert_eq!(device.buffer_data(buffer).unwrap(), bytes.as_slice());

    // fields that are not written keep their value
    graph.set_uniform_block(&mut device, "params", &Partial { scale: 3.0 }).unwrap();
    let bytes = block_bytes(&graph);
    assert_eq!(&bytes[0..4], 3.0f32.to_ne_bytes());
    assert_eq!(&bytes[8..12], 4.0f32.to_ne_bytes());

    assert!(
        graph
            .set_uniform_block(&mut device, "params", &Wrong { screen_size: 1 })
            .is_err()
    );
}
