use nectargl_core::{Region, Size, TextureFormat};

/// Texels of one texture or of the display surface, bottom row first.
#[derive(Clone, Debug)]
pub struct TexelBuffer {
    data: Vec<u8>,
    format: TextureFormat,
    size: Size,
}

impl TexelBuffer {
    pub fn new(format: TextureFormat, size: Size) -> Self {
        Self {
            data: vec![0; size.area() * format.bytes_per_texel()],
            format,
            size,
        }
    }

    pub fn format(&self) -> TextureFormat {
        self.format
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Reallocate for a new size, dropping the contents.
    pub fn resize(&mut self, size: Size) {
        if self.size != size {
            self.size = size;
            self.data = vec![0; size.area() * self.format.bytes_per_texel()];
        }
    }

    /// Copy tightly packed rows into `region`. The caller checks bounds and length.
    pub fn write_region(&mut self, region: Region, bytes: &[u8]) {
        let texel = self.format.bytes_per_texel();
        let row_len = region.width as usize * texel;

        for (row, chunk) in bytes.chunks_exact(row_len).enumerate() {
            let y = region.y as usize + row;
            let start = (y * self.size.width as usize + region.x as usize) * texel;
            self.data[start..start + row_len].copy_from_slice(chunk);
        }
    }

    pub fn fill(&mut self, color: [f32; 4]) {
        let texel = encode(self.format, color);
        for chunk in self.data.chunks_exact_mut(texel.len()) {
            chunk.copy_from_slice(&texel);
        }
    }

    pub fn set(&mut self, x: u32, y: u32, texel: &[u8]) {
        let start = (y as usize * self.size.width as usize + x as usize) * texel.len();
        self.data[start..start + texel.len()].copy_from_slice(texel);
    }

    /// Texel at `(x, y)`, counted from the bottom left corner.
    pub fn get(&self, x: u32, y: u32) -> &[u8] {
        let texel = self.format.bytes_per_texel();
        let start = (y as usize * self.size.width as usize + x as usize) * texel;
        &self.data[start..start + texel]
    }
}

/// Bytes of one texel holding `color`, converted the way a GL clear would.
pub fn encode(format: TextureFormat, color: [f32; 4]) -> Vec<u8> {
    let unorm = |x: f32| (x.clamp(0.0, 1.0) * 255.0).round() as u8;

    match format {
        TextureFormat::Rgba8 => color.iter().map(|&x| unorm(x)).collect(),
        TextureFormat::R8 => vec![unorm(color[0])],
        TextureFormat::Rgba32f => bytemuck::cast_slice(&color).to_vec(),
        TextureFormat::R32f => color[0].to_ne_bytes().to_vec(),
    }
}

/// Half-space rasterization of one clip space triangle onto a `size` grid.
///
/// Calls `plot` for every texel whose center is covered, regardless of winding.
pub fn rasterize(size: Size, triangle: [[f32; 2]; 3], mut plot: impl FnMut(u32, u32)) {
    let to_pixels = |[x, y]: [f32; 2]| {
        [
            (x * 0.5 + 0.5) * size.width as f32,
            (y * 0.5 + 0.5) * size.height as f32,
        ]
    };
    let [a, b, c] = triangle.map(to_pixels);

    let edge = |p: [f32; 2], q: [f32; 2], r: [f32; 2]| (q[0] - p[0]) * (r[1] - p[1]) - (q[1] - p[1]) * (r[0] - p[0]);
    let area = edge(a, b, c);
    if area == 0.0 {
        return;
    }

    let min_x = a[0].min(b[0]).min(c[0]).floor().max(0.0) as u32;
    let min_y = a[1].min(b[1]).min(c[1]).floor().max(0.0) as u32;
    let max_x = (a[0].max(b[0]).max(c[0]).ceil().max(0.0) as u32).min(size.width);
    let max_y = (a[1].max(b[1]).max(c[1]).ceil().max(0.0) as u32).min(size.height);

    for y in min_y..max_y {
        for x in min_x..max_x {
            let p = [x as f32 + 0.5, y as f32 + 0.5];
            let w = [edge(b, c, p), edge(c, a, p), edge(a, b, p)];
            let inside = if area > 0.0 {
                w.iter().all(|&w| w >= 0.0)
            } else {
                w.iter().all(|&w| w <= 0.0)
            };

            if inside {
                plot(x, y);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIZE: Size = Size { width: 4, height: 4 };

    #[test]
    fn full_screen_triangles_cover_every_texel() {
        let mut covered = 0;
        rasterize(SIZE, [[-1.0, -1.0], [1.0, -1.0], [1.0, 1.0]], |_, _| covered += 1);
        rasterize(SIZE, [[-1.0, -1.0], [1.0, 1.0], [-1.0, 1.0]], |_, _| covered += 1);

        // texels on the shared diagonal are hit twice
        assert_eq!(covered, 16 + 4);
    }

    #[test]
    fn winding_does_not_matter() {
        let mut cw = Vec::new();
        let mut ccw = Vec::new();
        rasterize(SIZE, [[-1.0, -1.0], [0.0, 1.0], [1.0, -1.0]], |x, y| cw.push((x, y)));
        rasterize(SIZE, [[-1.0, -1.0], [1.0, -1.0], [0.0, 1.0]], |x, y| ccw.push((x, y)));

        assert!(!cw.is_empty());
        assert_eq!(cw, ccw);
    }

    #[test]
    fn region_writes_and_clears() {
        let mut buffer = TexelBuffer::new(TextureFormat::R8, SIZE);
        buffer.fill([0.5, 0.0, 0.0, 1.0]);
        buffer.write_region(Region::from([1, 2, 2, 1]), &[7, 9]);

        assert_eq!(buffer.get(0, 0), [128]);
        assert_eq!(buffer.get(1, 2), [7]);
        assert_eq!(buffer.get(2, 2), [9]);
        assert_eq!(buffer.get(3, 2), [128]);
    }
}
