mod buffer;
mod info;
mod program;
mod texture;
mod util;

pub use buffer::*;
pub use info::*;
pub use program::*;
pub use texture::*;
pub use util::*;
