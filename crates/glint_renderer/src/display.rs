//! Linear-to-display encoding.

use crate::Color;

/// sRGB transfer function for one linear channel, clamped to `[0, 1]`.
#[inline]
pub fn to_srgb(c: f32) -> f32 {
    if c <= 0.0 {
        0.0
    } else if c < 0.0031308 {
        12.92 * c
    } else {
        (1.055 * c.powf(1.0 / 2.4) - 0.055).min(1.0)
    }
}

/// sRGB-encode and truncate to 8 bits.
#[inline]
pub fn encode_srgb8(c: f32) -> u8 {
    (to_srgb(c) * 255.0) as u8
}

/// Tightly packed RGB8 image, top row first.
///
/// The accumulation buffer stores rows bottom-up (row 0 at `v ~ 0`), so
/// encoding flips rows.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayBuffer {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl DisplayBuffer {
    /// Create a black buffer.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; (width * height * 3) as usize],
        }
    }

    /// Encode an accumulation buffer of `width * height` linear colors.
    pub fn encode(&mut self, accumulation: &[Color]) {
        let width = self.width as usize;
        let height = self.height as usize;
        if width == 0 || height == 0 {
            return;
        }
        debug_assert_eq!(accumulation.len(), width * height);

        for (i, row) in accumulation.chunks_exact(width).enumerate() {
            let display_row = height - i - 1;
            let out = &mut self.pixels[display_row * width * 3..(display_row + 1) * width * 3];
            for (px, color) in out.chunks_exact_mut(3).zip(row) {
                px[0] = encode_srgb8(color.x);
                px[1] = encode_srgb8(color.y);
                px[2] = encode_srgb8(color.z);
            }
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.pixels
    }

    /// RGB at display position `(x, y)`, `y = 0` being the top row.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        let i = ((y * self.width + x) * 3) as usize;
        [self.pixels[i], self.pixels[i + 1], self.pixels[i + 2]]
    }

    /// Expand to RGBA8 (opaque) for texture upload.
    pub fn to_rgba(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.pixels.len() / 3 * 4);
        for px in self.pixels.chunks_exact(3) {
            bytes.extend_from_slice(&[px[0], px[1], px[2], 255]);
        }
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_srgb_breakpoints() {
        assert_eq!(to_srgb(-1.0), 0.0);
        assert_eq!(to_srgb(0.0), 0.0);
        assert!((to_srgb(0.003) - 12.92 * 0.003).abs() < 1e-7);
        assert!((to_srgb(0.0031308) - 0.0404482).abs() < 1e-4);
        assert!((to_srgb(1.0) - 1.0).abs() < 1e-6);
        assert_eq!(to_srgb(50.0), 1.0);
    }

    #[test]
    fn test_encode_srgb8() {
        assert_eq!(encode_srgb8(0.0), 0);
        assert_eq!(encode_srgb8(2.0), 255);
        // 0.5 linear is about 0.7354 encoded
        assert_eq!(encode_srgb8(0.5), 187);
    }

    #[test]
    fn test_encode_flips_rows() {
        let mut display = DisplayBuffer::new(2, 2);
        let accumulation = vec![
            Color::new(2.0, 0.0, 0.0), // row 0 (bottom)
            Color::new(2.0, 0.0, 0.0),
            Color::new(0.0, 0.0, 2.0), // row 1 (top)
            Color::new(0.0, 0.0, 2.0),
        ];
        display.encode(&accumulation);

        assert_eq!(display.pixel(0, 0), [0, 0, 255]);
        assert_eq!(display.pixel(1, 1), [255, 0, 0]);
        assert_eq!(display.as_bytes().len(), 12);
    }

    #[test]
    fn test_encode_empty_buffer() {
        let mut display = DisplayBuffer::new(0, 4);
        display.encode(&[]);
        assert!(display.as_bytes().is_empty());
        assert!(display.to_rgba().is_empty());
    }

    #[test]
    fn test_to_rgba() {
        let mut display = DisplayBuffer::new(1, 1);
        display.encode(&[Color::splat(4.0)]);
        assert_eq!(display.to_rgba(), vec![255, 255, 255, 255]);
    }
}
