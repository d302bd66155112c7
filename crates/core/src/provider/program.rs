use crate::{Device, DeviceError, ProgramHandle, TextureSampling, glsl::ShaderInterface};

/// A linked program built from user shader bodies and the declarations they rely on.
#[derive(Debug)]
pub struct ProgramProvider {
    program: ProgramHandle,
    vertex_source: String,
    fragment_source: String,
    samplers: Vec<(String, TextureSampling)>,
}

impl ProgramProvider {
    pub fn new(
        device: &mut dyn Device,
        interface: ShaderInterface<'_>,
        samplers: &[(String, TextureSampling)],
        vertex_shader: &str,
        fragment_shader: &str,
    ) -> Result<Self, DeviceError> {
        let header = device.shader_header().to_string();
        let vertex_source = interface.vertex_source(&header, vertex_shader);
        let fragment_source = interface.fragment_source(&header, fragment_shader);

        let program = device.create_program(&vertex_source, &fragment_source)?;

        Ok(Self {
            program,
            vertex_source,
            fragment_source,
            samplers: samplers.to_vec(),
        })
    }

    pub fn handle(&self) -> ProgramHandle {
        self.program
    }

    /// Fully assembled vertex stage, as handed to the device.
    pub fn vertex_source(&self) -> &str {
        &self.vertex_source
    }

    pub fn fragment_source(&self) -> &str {
        &self.fragment_source
    }

    /// Declared filtering for a sampler, default sampling for undeclared ones.
    pub fn sampling(&self, sampler: &str) -> TextureSampling {
        self.samplers
            .iter()
            .find(|(name, _)| name == sampler)
            .map(|(_, sampling)| *sampling)
            .unwrap_or_default()
    }

    pub fn samplers(&self) -> impl Iterator<Item = &str> {
        self.samplers.iter().map(|(name, _)| name.as_str())
    }

    pub fn delete(self, device: &mut dyn Device) {
        device.delete_program(self.program);
    }
}
