use crate::{DataError, Device, DeviceError, Region, Size, TextureData, TextureDesc, TextureFormat, TextureHandle};

/// A 2D texture, optionally paired with a framebuffer so it can be rendered into.
#[derive(Debug)]
pub struct TextureProvider {
    desc: TextureDesc,
    texture: TextureHandle,
}

impl TextureProvider {
    pub fn new(device: &mut dyn Device, desc: TextureDesc) -> Result<Self, DeviceError> {
        let texture = device.create_texture(desc)?;
        Ok(Self { desc, texture })
    }

    pub fn desc(&self) -> TextureDesc {
        self.desc
    }

    pub fn size(&self) -> Size {
        self.desc.size
    }

    pub fn format(&self) -> TextureFormat {
        self.desc.format
    }

    pub fn handle(&self) -> TextureHandle {
        self.texture
    }

    /// Replace the texture with a blank one of another format and size.
    ///
    /// The render target flag is kept. On failure the old texture stays in place.
    pub fn reconfigure(
        &mut self,
        device: &mut dyn Device,
        format: TextureFormat,
        size: Size,
    ) -> Result<(), DeviceError> {
        let desc = TextureDesc {
            format,
            size,
            render_target: self.desc.render_target,
        };
        let texture = device.create_texture(desc)?;
        device.delete_texture(self.texture);

        log::debug!("texture reconfigured: {:?} -> {:?}", self.desc, desc);
        self.desc = desc;
        self.texture = texture;
        Ok(())
    }

    /// Upload a whole texture worth of texels, or an image into the origin corner.
    pub fn upload(&self, device: &mut dyn Device, data: TextureData<'_>) -> Result<(), DataError> {
        let format = self.desc.format;
        let full = Region::full(self.desc.size);

        match data {
            TextureData::Bytes(bytes) => self.upload_region(device, full, bytes),
            TextureData::Floats(floats) => {
                if !format.is_float() {
                    return Err(DataError::Format(format!("float texels given for a {:?} texture", format)));
                }
                self.upload_region(device, full, bytemuck::cast_slice(floats))
            }
            TextureData::Image(image) => {
                let region = Region {
                    x: 0,
                    y: 0,
                    width: image.width(),
                    height: image.height(),
                };
                if !region.fits(self.desc.size) {
                    return Err(DataError::CapacityExceeded {
                        what: "image texels",
                        requested: region.size().area(),
                        capacity: self.desc.size.area(),
                    });
                }

                let converted: Vec<u8> = match format {
                    TextureFormat::Rgba8 => image.to_rgba8().into_raw(),
                    TextureFormat::R8 => image.to_luma8().into_raw(),
                    TextureFormat::Rgba32f => bytemuck::cast_slice(&image.to_rgba32f().into_raw()).to_vec(),
                    TextureFormat::R32f => bytemuck::cast_slice(&image.to_luma32f().into_raw()).to_vec(),
                };

                self.upload_region(device, region, &converted)
            }
        }
    }

    /// Upload tightly packed texels into part of the texture.
    pub fn upload_region(&self, device: &mut dyn Device, region: Region, bytes: &[u8]) -> Result<(), DataError> {
        if !region.fits(self.desc.size) {
            return Err(DataError::CapacityExceeded {
                what: "texture region",
                requested: region.size().area(),
                capacity: self.desc.size.area(),
            });
        }

        let expected = region.size().area() * self.desc.format.bytes_per_texel();
        if bytes.len() != expected {
            return Err(DataError::Format(format!(
                "{} bytes given for a {}x{} {:?} region, expected {}",
                bytes.len(),
                region.width,
                region.height,
                self.desc.format,
                expected
            )));
        }

        device.write_texture(self.texture, region, bytes)?;
        Ok(())
    }

    /// Read back every texel, bottom row first.
    pub fn read(&self, device: &mut dyn Device) -> Result<Vec<u8>, DeviceError> {
        device.read_texture(self.texture)
    }

    pub fn delete(self, device: &mut dyn Device) {
        device.delete_texture(self.texture);
    }
}
