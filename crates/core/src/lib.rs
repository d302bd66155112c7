mod data;
pub mod declaration;
mod device;
mod error;
pub mod glsl;
pub mod graph;
pub mod layout;
mod present;
mod provider;
mod uniforms;

pub use data::*;
pub use declaration::{Declaration, ResourceType, TextureFilter, TextureSampling, TextureWrap, parse_declarations};
pub use device::*;
pub use error::*;
pub use graph::{CompileOptions, Resource, ResourceGraph, ResourceKey};
pub use present::*;
pub use provider::*;
pub use uniforms::*;
