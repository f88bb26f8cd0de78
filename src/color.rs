//! RGB565 packed colors, as used by 16-bit display panels.

use bevy::prelude::Color;
use rand::Rng;

/// A 16-bit color: 5 bits red, 6 bits green, 5 bits blue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct Rgb565(pub u16);

impl Rgb565 {
    pub const BLACK: Rgb565 = Rgb565(0x0000);
    pub const WHITE: Rgb565 = Rgb565(0xFFFF);
    pub const YELLOW: Rgb565 = Rgb565(0xFFE0);
    pub const ORANGE: Rgb565 = Rgb565(0xFDA0);

    /// Packs 8-bit channels, dropping the low bits.
    pub const fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        Rgb565((((r & 0xF8) as u16) << 8) | (((g & 0xFC) as u16) << 3) | ((b >> 3) as u16))
    }

    /// Channels at native depth: (0..=31, 0..=63, 0..=31).
    pub const fn channels(self) -> (u8, u8, u8) {
        (
            ((self.0 >> 11) & 0x1F) as u8,
            ((self.0 >> 5) & 0x3F) as u8,
            (self.0 & 0x1F) as u8,
        )
    }

    pub const fn from_channels(r: u8, g: u8, b: u8) -> Self {
        Rgb565((((r & 0x1F) as u16) << 11) | (((g & 0x3F) as u16) << 5) | ((b & 0x1F) as u16))
    }

    /// Expands to 8-bit channels, replicating high bits into the low ones.
    pub const fn to_rgb8(self) -> (u8, u8, u8) {
        let (r, g, b) = self.channels();
        ((r << 3) | (r >> 2), (g << 2) | (g >> 4), (b << 3) | (b >> 2))
    }

    /// Linear blend of `self` over `background`; `alpha` 255 is fully `self`.
    pub fn blend_over(self, background: Rgb565, alpha: u8) -> Rgb565 {
        let (fr, fg, fb) = self.channels();
        let (br, bg, bb) = background.channels();
        let a = alpha as u16;
        let mix = |f: u8, b: u8| ((f as u16 * a + b as u16 * (255 - a)) / 255) as u8;
        Rgb565::from_channels(mix(fr, br), mix(fg, bg), mix(fb, bb))
    }

    /// Multiplies every channel by `factor`, saturating at the channel maximum.
    pub fn scale_brightness(self, factor: f32) -> Rgb565 {
        let (r, g, b) = self.channels();
        let scale = |c: u8, max: f32| (c as f32 * factor).clamp(0.0, max) as u8;
        Rgb565::from_channels(scale(r, 31.0), scale(g, 63.0), scale(b, 31.0))
    }

    /// A bright color with one dominant channel in 200-255 and the others in 80-229.
    pub fn random_vibrant(rng: &mut impl Rng) -> Rgb565 {
        let mut channels = [
            rng.random_range(80..230u8),
            rng.random_range(80..230u8),
            rng.random_range(80..230u8),
        ];
        channels[rng.random_range(0..3usize)] = rng.random_range(200..=255u8);
        Rgb565::from_rgb8(channels[0], channels[1], channels[2])
    }

    pub fn to_color(self) -> Color {
        let (r, g, b) = self.to_rgb8();
        Color::srgb_u8(r, g, b)
    }

    pub fn to_color_with_alpha(self, alpha: u8) -> Color {
        let (r, g, b) = self.to_rgb8();
        Color::srgba_u8(r, g, b, alpha)
    }
}
