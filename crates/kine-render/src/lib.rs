//! CPU rendering for Kine worlds.
//!
//! The field's grayscale-image heritage lives here as a pair of codecs:
//! luminance bytes become food values on the way in (image drops) and food
//! values become pixels on the way out. The simulation core only ever sees
//! a grid of floats.
//!
//! [`FrameBuffer`] is a plain RGBA8 buffer implementing
//! [`kine_core::Renderer`]: the field paints a grayscale backdrop and each
//! worm draws as an outlined disc colored from red (starving) to green
//! (comfortable).

use image::{ImageBuffer, ImageFormat, Rgba};
use kine_core::{FoodField, KineError, Renderer, Worm};
use std::io::Cursor;
use std::path::Path;

/// Disc radius as a fraction of the shorter field axis.
const WORM_RADIUS_SCALE: f32 = 1.0 / 200.0;
/// Starving worm color.
const COLOR_HUNGRY: [u8; 3] = [230, 41, 55];
/// Comfortable worm color.
const COLOR_FED: [u8; 3] = [0, 228, 48];
const COLOR_OUTLINE: [u8; 4] = [0, 0, 0, 255];

/// Decode 8-bit luminance bytes into a food field, one byte per cell in
/// row-major order; each byte `b` maps to `b / 256`.
pub fn field_from_luma(width: u32, height: u32, bytes: &[u8]) -> Result<FoodField, KineError> {
    let cells = bytes.iter().map(|&b| f32::from(b) / 256.0).collect();
    FoodField::from_cells(width, height, cells)
}

/// Encode a food field back into 8-bit luminance, `v -> floor(v * 256)`
/// capped at 255. Exact inverse of [`field_from_luma`] for any byte input.
#[must_use]
pub fn field_to_luma(field: &FoodField) -> Vec<u8> {
    field
        .cells()
        .iter()
        .map(|&v| ((v * 256.0) as u32).min(255) as u8)
        .collect()
}

/// Linear red-to-green blend by comfort.
#[must_use]
fn comfort_color(comfort: f32) -> [u8; 4] {
    let t = comfort.clamp(0.0, 1.0);
    let lerp = |a: u8, b: u8| (f32::from(a) + (f32::from(b) - f32::from(a)) * t) as u8;
    [
        lerp(COLOR_HUNGRY[0], COLOR_FED[0]),
        lerp(COLOR_HUNGRY[1], COLOR_FED[1]),
        lerp(COLOR_HUNGRY[2], COLOR_FED[2]),
        255,
    ]
}

/// An RGBA8 pixel buffer sized to the field it draws.
#[derive(Debug, Clone)]
pub struct FrameBuffer {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl FrameBuffer {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; (width as usize) * (height as usize) * 4],
        }
    }

    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Raw RGBA bytes in row-major order.
    #[must_use]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// One pixel as `[r, g, b, a]`.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        Some([
            self.pixels[idx],
            self.pixels[idx + 1],
            self.pixels[idx + 2],
            self.pixels[idx + 3],
        ])
    }

    /// Match the buffer to new field dimensions, e.g. after a field
    /// replacement from an image drop.
    fn resize_to(&mut self, width: u32, height: u32) {
        if self.width != width || self.height != height {
            self.width = width;
            self.height = height;
            self.pixels = vec![0; (width as usize) * (height as usize) * 4];
        }
    }

    fn blit_field(&mut self, field: &FoodField) {
        for (idx, luma) in field_to_luma(field).into_iter().enumerate() {
            let base = idx * 4;
            self.pixels[base] = luma;
            self.pixels[base + 1] = luma;
            self.pixels[base + 2] = luma;
            self.pixels[base + 3] = 255;
        }
    }

    fn put_pixel(&mut self, x: i64, y: i64, color: [u8; 4]) {
        if x < 0 || y < 0 || x >= i64::from(self.width) || y >= i64::from(self.height) {
            return;
        }
        let idx = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        self.pixels[idx..idx + 4].copy_from_slice(&color);
    }

    fn fill_disc(&mut self, cx: f32, cy: f32, radius: f32, color: [u8; 4]) {
        let reach = radius.ceil() as i64 + 1;
        let center_x = cx as i64;
        let center_y = cy as i64;
        for y in center_y - reach..=center_y + reach {
            for x in center_x - reach..=center_x + reach {
                let dx = x as f32 - cx;
                let dy = y as f32 - cy;
                if dx * dx + dy * dy <= radius * radius {
                    self.put_pixel(x, y, color);
                }
            }
        }
    }

    fn draw_worm(&mut self, worm: &Worm) {
        let radius = self.width.min(self.height) as f32 * WORM_RADIUS_SCALE;
        let cx = worm.position.x * self.width as f32;
        let cy = worm.position.y * self.height as f32;
        self.fill_disc(cx, cy, radius + 1.0, COLOR_OUTLINE);
        self.fill_disc(cx, cy, radius, comfort_color(worm.comfort));
    }

    /// Encode the buffer as PNG bytes.
    pub fn encode_png(&self) -> Result<Vec<u8>, image::ImageError> {
        let img: ImageBuffer<Rgba<u8>, _> =
            ImageBuffer::from_raw(self.width, self.height, self.pixels.clone())
                .expect("pixel buffer matches dimensions");
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
        Ok(bytes)
    }

    /// Write the buffer to disk as PNG.
    pub fn save_png(&self, path: &Path) -> Result<(), image::ImageError> {
        let img: ImageBuffer<Rgba<u8>, _> =
            ImageBuffer::from_raw(self.width, self.height, self.pixels.clone())
                .expect("pixel buffer matches dimensions");
        img.save_with_format(path, ImageFormat::Png)
    }
}

impl Renderer for FrameBuffer {
    fn draw(&mut self, field: &FoodField, worms: &[Worm]) {
        self.resize_to(field.width(), field.height());
        self.blit_field(field);
        for worm in worms {
            self.draw_worm(worm);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kine_core::Position;

    #[test]
    fn luma_codec_round_trips_every_byte() {
        let bytes: Vec<u8> = (0..=255).collect();
        let field = field_from_luma(16, 16, &bytes).expect("field");
        assert_eq!(field.get(0, 0), Some(0.0));
        assert_eq!(field.get(8, 8), Some(136.0 / 256.0));
        assert_eq!(field_to_luma(&field), bytes);
    }

    #[test]
    fn saturated_field_encodes_to_peak_luminance() {
        let field = FoodField::new(2, 2, 1.0).expect("field");
        assert_eq!(field_to_luma(&field), vec![255; 4]);
    }

    #[test]
    fn luma_decode_rejects_mismatched_buffer() {
        assert!(field_from_luma(4, 4, &[0u8; 15]).is_err());
    }

    #[test]
    fn draw_paints_backdrop_and_disc() {
        let field = FoodField::new(64, 64, 0.0).expect("field");
        let worm = Worm {
            position: Position::new(0.5, 0.5),
            comfort: 1.0,
            ..Worm::default()
        };

        let mut frame = FrameBuffer::new(64, 64);
        frame.draw(&field, &[worm]);

        // Empty field paints black; the disc center is fully fed green.
        assert_eq!(frame.pixel(2, 2), Some([0, 0, 0, 255]));
        assert_eq!(
            frame.pixel(32, 32),
            Some([COLOR_FED[0], COLOR_FED[1], COLOR_FED[2], 255])
        );
    }

    #[test]
    fn starving_worm_draws_red() {
        let field = FoodField::new(64, 64, 0.0).expect("field");
        let worm = Worm {
            position: Position::new(0.25, 0.25),
            comfort: 0.0,
            ..Worm::default()
        };
        let mut frame = FrameBuffer::new(64, 64);
        frame.draw(&field, &[worm]);
        assert_eq!(
            frame.pixel(16, 16),
            Some([COLOR_HUNGRY[0], COLOR_HUNGRY[1], COLOR_HUNGRY[2], 255])
        );
    }

    #[test]
    fn draw_resizes_to_the_field() {
        let field = FoodField::new(10, 20, 0.5).expect("field");
        let mut frame = FrameBuffer::new(1, 1);
        frame.draw(&field, &[]);
        assert_eq!(frame.width(), 10);
        assert_eq!(frame.height(), 20);
        // 0.5 quantizes to 128 gray.
        assert_eq!(frame.pixel(5, 5), Some([128, 128, 128, 255]));
    }

    #[test]
    fn png_encoding_produces_a_png_header() {
        let field = FoodField::new(8, 8, 0.25).expect("field");
        let mut frame = FrameBuffer::new(8, 8);
        frame.draw(&field, &[]);
        let bytes = frame.encode_png().expect("png");
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    }
}
