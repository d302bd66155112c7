use serde::Deserialize;

/// Texel format of a texture.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, Deserialize)]
pub enum TextureFormat {
    #[serde(rename = "RGBA8")]
    Rgba8,
    #[serde(rename = "R8")]
    R8,
    #[serde(rename = "R32F")]
    R32f,
    #[serde(rename = "RGBA32F")]
    Rgba32f,
}

impl TextureFormat {
    pub fn channels(&self) -> usize {
        match self {
            TextureFormat::Rgba8 | TextureFormat::Rgba32f => 4,
            TextureFormat::R8 | TextureFormat::R32f => 1,
        }
    }

    pub fn bytes_per_channel(&self) -> usize {
        match self {
            TextureFormat::Rgba8 | TextureFormat::R8 => 1,
            TextureFormat::Rgba32f | TextureFormat::R32f => 4,
        }
    }

    pub fn bytes_per_texel(&self) -> usize {
        self.channels() * self.bytes_per_channel()
    }

    pub fn is_float(&self) -> bool {
        self.bytes_per_channel() == 4
    }
}

/// Pixel data for a texture upload.
#[derive(Clone, Copy, Debug)]
pub enum TextureData<'a> {
    /// Raw 8-bit texels, tightly packed, covering the whole texture.
    Bytes(&'a [u8]),
    /// Raw 32-bit float texels, tightly packed, covering the whole texture.
    Floats(&'a [f32]),
    /// A decoded image. Converted to the texture format and uploaded into the top left corner.
    Image(&'a image::DynamicImage),
}

/// A struct representing a size in physical pixels.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, Default)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub fn area(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn contains(&self, other: Size) -> bool {
        other.width <= self.width && other.height <= self.height
    }
}

/// An axis aligned rectangle of texels with origin in the bottom left corner (GL convention).
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub fn full(size: Size) -> Self {
        Self {
            x: 0,
            y: 0,
            width: size.width,
            height: size.height,
        }
    }

    pub fn size(&self) -> Size {
        Size {
            width: self.width,
            height: self.height,
        }
    }

    /// Whether the region lies fully inside a texture of the given size.
    pub fn fits(&self, size: Size) -> bool {
        self.x.checked_add(self.width).is_some_and(|r| r <= size.width)
            && self.y.checked_add(self.height).is_some_and(|b| b <= size.height)
    }
}

impl From<[u32; 2]> for Size {
    fn from(value: [u32; 2]) -> Self {
        Self {
            width: value[0],
            height: value[1],
        }
    }
}

impl From<[u32; 4]> for Region {
    fn from(value: [u32; 4]) -> Self {
        Self {
            x: value[0],
            y: value[1],
            width: value[2],
            height: value[3],
        }
    }
}
