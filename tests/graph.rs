mod common;

use common::*;
use nectargl::{
    DataError, Declaration, Device, DeviceError, GraphError, Region, ResourceGraph, Size, TextureData, TextureFormat,
    UniformValue, Values,
};
use nectargl_headless::{Event, HeadlessDevice};
use serde_json::json;

/// the basic clear + draw scenario
/// - a full screen quad covers every texel with the fill color
/// - the texture is clean once rendered
#[test]
fn single_pass_renders_quad() {
    let (mut device, mut graph) = compile(&single_pass());
    assert!(graph.is_dirty("target").unwrap());

    write_quad(&mut device, &mut graph, "quad");
    assert!(graph.update_texture_data(&mut device, "target").unwrap());
    assert!(!graph.is_dirty("target").unwrap());

    let texels = graph.read_texture(&mut device, "target").unwrap();
    assert_eq!(texels.len(), 4 * 4 * 4);
    assert!(texels.chunks(4).all(|texel| texel == [255, 255, 255, 255]));
}

/// zero triangles leaves only the clear color behind
#[test]
fn empty_draw_leaves_clear_color() {
    let (mut device, mut graph) = compile(&single_pass());
    graph
        .set_vertices(&mut device, "quad", &[("position", Values::from(&QUAD))], &QUAD_INDICES, 0)
        .unwrap();
    graph.update_texture_data(&mut device, "target").unwrap();

    let texels = graph.read_texture(&mut device, "target").unwrap();
    assert!(texels.chunks(4).all(|texel| texel == [0, 0, 0, 255]));

    let draws: Vec<u32> = device
        .events()
        .iter()
        .filter_map(|event| match event {
            Event::Draw { index_count, .. } => Some(*index_count),
            _ => None,
        })
        .collect();
    assert_eq!(draws, [0]);
}

#[test]
fn dependency_edges_are_mirrored() {
    let (_, graph) = compile(&scene());

    assert_eq!(graph.dependency_of("quad").unwrap(), ["base", "dots", "final"]);
    assert_eq!(graph.dependency_of("sprites").unwrap(), ["dots"]);
    assert_eq!(graph.dependency_of("params").unwrap(), ["dots", "final"]);
    assert_eq!(graph.dependency_of("base").unwrap(), ["final"]);
    assert_eq!(graph.dependency_of("dots").unwrap(), ["final"]);
    assert!(graph.dependency_of("final").unwrap().is_empty());

    assert_eq!(graph.depends_on("final").unwrap(), ["base", "dots"]);
    assert_eq!(graph.depends_on("dots").unwrap(), ["sprite"]);
    assert!(graph.depends_on("base").unwrap().is_empty());

    let textures = ["base", "dots", "final"];
    for a in textures {
        for b in textures {
            let forward = graph.dependency_of(a).unwrap().contains(&b);
            let backward = graph.depends_on(b).unwrap().contains(&a);
            assert_eq!(forward, backward, "{} -> {}", a, b);
        }
    }
}

/// static textures carry an empty dependency rule
#[test]
fn static_texture_upload_does_not_invalidate_consumers() {
    let (mut device, mut graph) = populated_scene();
    assert!(graph.dependency_of("sprite").unwrap().is_empty());

    graph.update_all(&mut device).unwrap();
    graph
        .set_texture_data(&mut device, "sprite", TextureData::Bytes(&[0; 64]))
        .unwrap();

    assert!(!graph.is_dirty("sprite").unwrap());
    assert!(!graph.is_dirty("dots").unwrap());
    assert!(!graph.is_dirty("final").unwrap());
}

#[test]
fn dirty_propagation_reaches_downstream_only() {
    let (mut device, mut graph) = populated_scene();
    assert_eq!(graph.update_all(&mut device).unwrap(), 3);

    graph.mark_and_propagate_dirty("base").unwrap();

    assert!(graph.is_dirty("base").unwrap());
    assert!(graph.is_dirty("final").unwrap());
    assert!(!graph.is_dirty("dots").unwrap());
    assert!(!graph.is_dirty("quad").unwrap());
    assert!(!graph.is_dirty("params").unwrap());

    // idempotent
    graph.mark_and_propagate_dirty("base").unwrap();
    assert!(graph.is_dirty("final").unwrap());
    assert!(!graph.is_dirty("dots").unwrap());
}

#[test]
fn set_uniforms_dirties_consumers_before_recompute() {
    let (mut device, mut graph) = populated_scene();
    graph.update_all(&mut device).unwrap();

    graph
        .set_uniforms(&mut device, "params", &[("scale", UniformValue::Float(2.0))])
        .unwrap();

    assert!(!graph.is_dirty("params").unwrap());
    assert!(graph.is_dirty("dots").unwrap());
    assert!(graph.is_dirty("final").unwrap());
    assert!(!graph.is_dirty("base").unwrap());
}

#[test]
fn update_is_idempotent() {
    let (mut device, mut graph) = populated_scene();

    assert!(graph.update_texture_data(&mut device, "final").unwrap());
    let events = device.take_events();
    assert!(!events.is_empty());

    assert!(!graph.update_texture_data(&mut device, "final").unwrap());
    assert!(device.events().is_empty());
    assert_eq!(graph.update_all(&mut device).unwrap(), 0);
    assert!(device.events().is_empty());
}

/// dirty textures sampled by a pass are rendered first, depth first
#[test]
fn dependencies_render_before_consumers() {
    let (mut device, mut graph) = populated_scene();
    graph.update_texture_data(&mut device, "final").unwrap();

    let passes = device.passes();
    assert_eq!(
        passes,
        [
            Some(texture_handle(&graph, "base")),
            Some(texture_handle(&graph, "dots")),
            Some(texture_handle(&graph, "final")),
        ]
    );

    // only the stale branch runs again
    device.take_events();
    graph.mark_and_propagate_dirty("dots").unwrap();
    graph.update_texture_data(&mut device, "final").unwrap();
    assert_eq!(
        device.passes(),
        [Some(texture_handle(&graph, "dots")), Some(texture_handle(&graph, "final"))]
    );
}

#[test]
fn draw_calls_bind_declared_resources() {
    let (mut device, mut graph) = populated_scene();
    graph.update_texture_data(&mut device, "final").unwrap();

    let draws: Vec<&Event> = device
        .events()
        .iter()
        .filter(|event| matches!(event, Event::Draw { .. }))
        .collect();
    assert_eq!(draws.len(), 3);

    match draws[1] {
        Event::Draw {
            index_count,
            instance_count,
            uniform_block,
            textures,
            ..
        } => {
            assert_eq!(*index_count, 6);
            assert_eq!(*instance_count, Some(2));
            assert_eq!(uniform_block.as_deref(), Some("gsig"));
            assert_eq!(textures, &[("sprite".to_string(), texture_handle(&graph, "sprite"))]);
        }
        _ => unreachable!(),
    }

    match draws[2] {
        Event::Draw {
            instance_count, textures, ..
        } => {
            assert_eq!(*instance_count, None);
            assert_eq!(
                textures,
                &[
                    ("source".to_string(), texture_handle(&graph, "base")),
                    ("overlay".to_string(), texture_handle(&graph, "dots")),
                ]
            );
        }
        _ => unreachable!(),
    }
}

#[test]
fn instance_capacity_boundary() {
    let (mut device, mut graph) = compile(&scene());
    let offsets = [0.0f32; 18];
    let tints = [1.0f32; 36];

    graph
        .set_instance_data(
            &mut device,
            "sprites",
            &[("offset", Values::from(&offsets[..16])), ("tint", Values::from(&tints[..32]))],
            8,
        )
        .unwrap();

    let result = graph.set_instance_data(
        &mut device,
        "sprites",
        &[("offset", Values::from(&offsets)), ("tint", Values::from(&tints))],
        9,
    );
    match result {
        Err(GraphError::Data {
            id,
            source: DataError::CapacityExceeded { requested, capacity, .. },
        }) => {
            assert_eq!(id, "sprites");
            assert_eq!((requested, capacity), (9, 8));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn rejected_writes_leave_state_untouched() {
    let (mut device, mut graph) = populated_scene();
    graph.update_all(&mut device).unwrap();

    // three triangles do not fit a two triangle signature
    let indices = [0u16, 1, 2, 0, 2, 3, 0, 1, 3];
    assert!(
        graph
            .set_vertices(&mut device, "quad", &[("position", Values::from(&QUAD))], &indices, 3)
            .is_err()
    );

    // an index past the vertex capacity
    assert!(
        graph
            .set_vertices(&mut device, "quad", &[("position", Values::from(&QUAD))], &[0, 1, 4], 1)
            .is_err()
    );

    assert!(
        graph
            .set_uniforms(&mut device, "params", &[("scale", UniformValue::Int(1))])
            .is_err()
    );
    assert!(
        graph
            .set_uniforms(&mut device, "params", &[("missing", UniformValue::Float(1.0))])
            .is_err()
    );

    assert!(!graph.is_dirty("base").unwrap());
    assert!(!graph.is_dirty("dots").unwrap());
    assert!(!graph.is_dirty("final").unwrap());
}

#[test]
fn partial_image_upload() {
    let (mut device, mut graph) = compile(&scene());
    let image = image::DynamicImage::ImageRgba8(image::RgbaImage::from_pixel(2, 2, image::Rgba([10, 20, 30, 40])));

    graph
        .set_texture_data(&mut device, "sprite", TextureData::Image(&image))
        .unwrap();

    let texels = graph.read_texture(&mut device, "sprite").unwrap();
    let texel = |x: usize, y: usize| &texels[(y * 4 + x) * 4..][..4];
    assert_eq!(texel(0, 0), [10, 20, 30, 40]);
    assert_eq!(texel(1, 1), [10, 20, 30, 40]);
    assert_eq!(texel(2, 0), [0, 0, 0, 0]);
    assert_eq!(texel(0, 2), [0, 0, 0, 0]);

    let too_big = image::DynamicImage::ImageRgba8(image::RgbaImage::new(5, 4));
    assert!(
        graph
            .set_texture_data(&mut device, "sprite", TextureData::Image(&too_big))
            .is_err()
    );
}

#[test]
fn wrong_kind_operations_are_rejected() {
    let (mut device, mut graph) = compile(&scene());

    assert!(matches!(
        graph.update_texture_data(&mut device, "sprite"),
        Err(GraphError::UnexpectedKind { .. })
    ));
    assert!(matches!(
        graph.set_uniforms(&mut device, "quad", &[]),
        Err(GraphError::UnexpectedKind { .. })
    ));
    assert!(matches!(
        graph.mark_and_propagate_dirty("fill"),
        Err(GraphError::UnexpectedKind { .. })
    ));
    assert!(matches!(
        graph.is_dirty("nothing"),
        Err(GraphError::NotFound { .. })
    ));
}

#[test]
fn delete_releases_device_objects() {
    let (mut device, graph) = populated_scene();
    assert_ne!(device.live_objects(), (0, 0, 0));

    graph.delete(&mut device);
    assert_eq!(device.live_objects(), (0, 0, 0));
}

#[test]
fn compile_from_json() {
    let json = r#"[
        {"id": "vsig", "type": "VertexSignature", "data": {"attributes": {"position": "vec2"}, "maxVertexCount": 4, "maxTriangleCount": 2}},
        {"id": "quad", "type": "Vertex", "data": {"signature": "vsig"}},
        {"id": "tsig", "type": "TextureSignature", "data": {"type": "R8", "size": [2, 2]}},
        {"id": "fill", "type": "Program", "data": {
            "vertexSignature": "vsig",
            "vertexShader": "void main() { gl_Position = vec4(position, 0.0, 1.0); }",
            "fragmentShader": "void main() { outColor = vec4(1.0); }"
        }},
        {"id": "mask", "type": "DynamicTexture", "data": {"signature": "tsig", "drawOps": [{"program": "fill", "vertex": "quad"}]}}
    ]"#;

    let mut device = HeadlessDevice::new();
    let mut graph = ResourceGraph::compile_json(json, &mut device, Default::default()).unwrap();
    assert_eq!(graph.ids().collect::<Vec<_>>(), ["vsig", "quad", "tsig", "fill", "mask"]);

    write_quad(&mut device, &mut graph, "quad");
    graph.update_texture_data(&mut device, "mask").unwrap();
    assert_eq!(graph.read_texture(&mut device, "mask").unwrap(), [255; 4]);
}

#[test]
fn region_upload_into_static_texture() {
    let (mut device, mut graph) = compile(&scene());
    let region = Region {
        x: 1,
        y: 2,
        width: 2,
        height: 1,
    };

    graph
        .set_texture_region(&mut device, "sprite", region, &[9; 8])
        .unwrap();
    assert!(!graph.is_dirty("sprite").unwrap());

    let texels = graph.read_texture(&mut device, "sprite").unwrap();
    let texel = |x: usize, y: usize| &texels[(y * 4 + x) * 4..][..4];
    assert_eq!(texel(1, 2), [9; 4]);
    assert_eq!(texel(2, 2), [9; 4]);
    assert_eq!(texel(0, 2), [0; 4]);
    assert_eq!(texel(3, 2), [0; 4]);
    assert_eq!(texel(1, 1), [0; 4]);

    // short by one texel
    assert!(matches!(
        graph.set_texture_region(&mut device, "sprite", region, &[9; 4]),
        Err(GraphError::Data {
            source: DataError::Format(_),
            ..
        })
    ));

    let outside = Region { x: 3, ..region };
    assert!(matches!(
        graph.set_texture_region(&mut device, "sprite", outside, &[9; 8]),
        Err(GraphError::Data {
            source: DataError::CapacityExceeded { .. },
            ..
        })
    ));

    assert!(matches!(
        graph.set_texture_region(&mut device, "base", region, &[9; 8]),
        Err(GraphError::UnexpectedKind { .. })
    ));
}

#[test]
fn float_texel_uploads() {
    let mut declarations = scene();
    declarations.push(Declaration::new("hsig", "TextureSignature", json!({ "type": "R32F", "size": [2, 2] })));
    declarations.push(Declaration::new("heights", "Texture", json!({ "signature": "hsig" })));
    let (mut device, mut graph) = compile(&declarations);

    let heights = [0.25f32, -1.0, 8.5, 0.0];
    graph
        .set_texture_data(&mut device, "heights", TextureData::Floats(&heights))
        .unwrap();
    let texels = graph.read_texture(&mut device, "heights").unwrap();
    assert_eq!(texels, bytemuck::cast_slice::<f32, u8>(&heights));

    assert!(matches!(
        graph.set_texture_data(&mut device, "heights", TextureData::Floats(&heights[..3])),
        Err(GraphError::Data {
            source: DataError::Format(_),
            ..
        })
    ));

    // an 8 bit texture takes bytes only
    match graph.set_texture_data(&mut device, "sprite", TextureData::Floats(&[1.0; 16])) {
        Err(GraphError::Data {
            id,
            source: DataError::Format(_),
        }) => assert_eq!(id, "sprite"),
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(graph.read_texture(&mut device, "heights").unwrap(), texels);
}

#[test]
fn texture_reconfiguration() {
    let (mut device, mut graph) = populated_scene();
    graph.update_all(&mut device).unwrap();
    let objects = device.live_objects();

    let old = texture_handle(&graph, "base");
    let small = Size { width: 2, height: 2 };
    graph
        .reconfigure_texture(&mut device, "base", TextureFormat::R8, small)
        .unwrap();

    assert!(device.texture_data(old).is_none());
    assert_eq!(device.live_objects(), objects);
    assert_eq!(graph.texture("base").unwrap().size(), small);
    assert_eq!(graph.texture("base").unwrap().format(), TextureFormat::R8);
    assert!(graph.texture("base").unwrap().desc().render_target);

    assert!(graph.is_dirty("base").unwrap());
    assert!(graph.is_dirty("final").unwrap());
    assert!(!graph.is_dirty("dots").unwrap());

    graph.update_texture_data(&mut device, "final").unwrap();
    assert_eq!(graph.read_texture(&mut device, "base").unwrap(), [255; 4]);

    // a static texture invalidates its samplers too and needs new texels
    graph
        .reconfigure_texture(&mut device, "sprite", TextureFormat::Rgba8, Size { width: 8, height: 8 })
        .unwrap();
    assert!(graph.is_dirty("sprite").unwrap());
    assert!(graph.is_dirty("dots").unwrap());
    assert!(graph.is_dirty("final").unwrap());
    assert!(!graph.is_dirty("base").unwrap());

    assert!(
        graph
            .set_texture_data(&mut device, "sprite", TextureData::Bytes(&[255; 64]))
            .is_err()
    );
    graph
        .set_texture_data(&mut device, "sprite", TextureData::Bytes(&[255; 256]))
        .unwrap();
    assert!(!graph.is_dirty("sprite").unwrap());

    assert!(matches!(
        graph.reconfigure_texture(&mut device, "params", TextureFormat::R8, small),
        Err(GraphError::UnexpectedKind { .. })
    ));

    // a failed reconfiguration keeps the old texture
    let current = texture_handle(&graph, "sprite");
    assert!(
        graph
            .reconfigure_texture(&mut device, "sprite", TextureFormat::R8, Size::default())
            .is_err()
    );
    assert_eq!(texture_handle(&graph, "sprite"), current);
    assert_eq!(graph.texture("sprite").unwrap().size(), Size { width: 8, height: 8 });
}

#[test]
fn failed_pass_stays_dirty() {
    let (mut device, mut graph) = populated_scene();
    graph.update_all(&mut device).unwrap();

    // the sprite texture disappears from under the graph
    assert!(device.delete_texture(texture_handle(&graph, "sprite")));
    graph
        .set_uniforms(&mut device, "params", &[("scale", UniformValue::Float(2.0))])
        .unwrap();

    match graph.update_texture_data(&mut device, "final") {
        Err(GraphError::Device {
            id,
            source: DeviceError::InvalidHandle { object },
        }) => {
            assert_eq!(id, "dots");
            assert_eq!(object, "texture");
        }
        other => panic!("unexpected {:?}", other),
    }

    assert!(graph.is_dirty("dots").unwrap());
    assert!(graph.is_dirty("final").unwrap());
    assert!(!graph.is_dirty("base").unwrap());
}

#[test]
fn unused_sampler_fails_the_draw() {
    let mut declarations = single_pass();
    declarations.push(Declaration::new(
        "ignore",
        "Program",
        json!({
            "vertexSignature": "vsig",
            "textures": { "source": {} },
            "vertexShader": PASS_VERTEX,
            "fragmentShader": WHITE_FRAGMENT
        }),
    ));
    declarations.push(Declaration::new(
        "copied",
        "Texture",
        json!({
            "signature": "tsig",
            "drawOps": [{ "program": "ignore", "vertex": "quad", "textures": { "source": "target" } }]
        }),
    ));
    let (mut device, mut graph) = compile(&declarations);
    write_quad(&mut device, &mut graph, "quad");

    match graph.update_texture_data(&mut device, "copied") {
        Err(GraphError::Device {
            id,
            source: DeviceError::MissingSampler { sampler },
        }) => {
            assert_eq!(id, "copied");
            assert_eq!(sampler, "source");
        }
        other => panic!("unexpected {:?}", other),
    }

    // the sampled texture rendered fine; only the failing pass stays dirty
    assert!(!graph.is_dirty("target").unwrap());
    assert!(graph.is_dirty("copied").unwrap());
}

#[test]
fn position_is_the_first_float_attribute() {
    let mut declarations = single_pass();
    declarations[0] = Declaration::new(
        "vsig",
        "VertexSignature",
        json!({ "attributes": { "id": "int", "position": "vec2" }, "maxVertexCount": 4, "maxTriangleCount": 2 }),
    );
    let (mut device, mut graph) = compile(&declarations);

    graph
        .set_vertices(
            &mut device,
            "quad",
            &[("id", Values::from(&[0i32, 1, 2, 3])), ("position", Values::from(&QUAD))],
            &QUAD_INDICES,
            2,
        )
        .unwrap();
    assert!(graph.update_texture_data(&mut device, "target").unwrap());
    assert_eq!(graph.read_texture(&mut device, "target").unwrap(), [255; 64]);
}
