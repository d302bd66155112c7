//! Declarations spliced in front of user shader bodies.

use crate::layout::Layout;
use std::fmt::Write;

/// Name of the `vec4` output declared in every fragment stage.
pub const FRAGMENT_OUTPUT: &str = "outColor";

/// What a program reads, as seen from GLSL.
#[derive(Clone, Copy, Debug)]
pub struct ShaderInterface<'a> {
    pub vertex: &'a Layout,
    pub instance: Option<&'a Layout>,
    /// Uniform block name and fields.
    pub global: Option<(&'a str, &'a Layout)>,
    pub samplers: &'a [&'a str],
}

impl ShaderInterface<'_> {
    pub fn vertex_source(&self, header: &str, body: &str) -> String {
        let mut buffer = String::new();
        emit_header(&mut buffer, header);
        if let Some((name, layout)) = self.global {
            emit_uniform_block(&mut buffer, name, layout);
        }
        emit_inputs(&mut buffer, self.vertex, self.instance);
        buffer.push_str(body);
        buffer.push('\n');
        buffer
    }

    pub fn fragment_source(&self, header: &str, body: &str) -> String {
        let mut buffer = String::new();
        emit_header(&mut buffer, header);
        writeln!(buffer, "out vec4 {};", FRAGMENT_OUTPUT).ok();
        if let Some((name, layout)) = self.global {
            emit_uniform_block(&mut buffer, name, layout);
        }
        for sampler in self.samplers {
            writeln!(buffer, "uniform sampler2D {};", sampler).ok();
        }
        buffer.push_str(body);
        buffer.push('\n');
        buffer
    }
}

fn emit_header(buffer: &mut String, header: &str) {
    buffer.push_str(header);
    if !header.ends_with('\n') {
        buffer.push('\n');
    }
}

fn emit_uniform_block(buffer: &mut String, name: &str, layout: &Layout) {
    writeln!(buffer, "layout(std140) uniform {} {{", name).ok();
    for field in &layout.fields {
        writeln!(buffer, "    {} {};", field.ty.glsl_name(), field.name).ok();
    }
    buffer.push_str("};\n");
}

/// Vertex attributes take locations `0..V`, instance attributes continue at `V`.
fn emit_inputs(buffer: &mut String, vertex: &Layout, instance: Option<&Layout>) {
    let fields = vertex.fields.iter().chain(instance.into_iter().flat_map(|x| x.fields.iter()));
    for (location, field) in fields.enumerate() {
        writeln!(
            buffer,
            "layout(location = {}) in {} {};",
            location,
            field.ty.glsl_name(),
            field.name
        )
        .ok();
    }
}
