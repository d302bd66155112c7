//! A declarative GPU resource graph.
//!
//! A JSON list of resource declarations (programs, vertex/instance/uniform buffers, textures)
//! is compiled into a [`ResourceGraph`]. Dynamic textures are rendered by drawing into them,
//! and are only redrawn when something they depend on was written since their last pass.
//!
//! Rendering goes through the [`Device`] trait. Enable the `opengl` feature for a
//! WebGL2 / OpenGL ES 3.0 device, or `headless` for a software device used in tests.

pub use nectargl_core::*;

#[cfg(feature = "derive")]
pub use nectargl_derive::Uniforms;

#[cfg(feature = "opengl")]
pub use nectargl_opengl as opengl;

#[cfg(feature = "headless")]
pub use nectargl_headless as headless;
