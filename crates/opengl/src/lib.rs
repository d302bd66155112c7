//! OpenGL backend for `nectargl`, built on `glow`.
//!
//! Targets WebGL2 and OpenGL ES 3.0 contexts, plus desktop OpenGL 3.3 for native testing.

mod backend;
mod opengl;

pub use backend::{GlDevice, GlDeviceOptions, GlNativeDevice};
pub use opengl::GlInfo;
