//! CPU-side device for running resource graphs without a GPU.

mod buffer;
mod device;

pub use buffer::TexelBuffer;
pub use device::*;
