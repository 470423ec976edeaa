// src/color.rs
use bevy_color::{ColorToComponents, LinearRgba, Srgba};

/// sRGB color as authored, converted to linear space on the way to the GPU.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color(pub Srgba);

impl Color {
    pub const fn hex(rgb: u32) -> Self {
        Self::hex_alpha(rgb, 1.0)
    }

    pub const fn hex_alpha(rgb: u32, alpha: f32) -> Self {
        let r = ((rgb >> 16) & 0xff) as f32 / 255.0;
        let g = ((rgb >> 8) & 0xff) as f32 / 255.0;
        let b = (rgb & 0xff) as f32 / 255.0;
        Self(Srgba::new(r, g, b, alpha))
    }

    pub fn into_linear_rgba(self) -> [f32; 4] {
        LinearRgba::from(self.0).to_f32_array()
    }

    pub fn into_glyphon(self) -> glyphon::Color {
        let [r, g, b, a] = self.to_u8_array();
        glyphon::Color::rgba(r, g, b, a)
    }

    pub fn to_u8_array(self) -> [u8; 4] {
        let quantize = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        [quantize(self.0.red), quantize(self.0.green), quantize(self.0.blue), quantize(self.0.alpha)]
    }
}

pub mod palette {
    use super::Color;

    pub const BACKGROUND: Color = Color::hex(0x020617);
    pub const TEXT: Color = Color::hex(0xF1F5F9);
    pub const ACCENT: Color = Color::hex(0x14B8A6);

    pub const NODE_BASE: Color = Color::hex_alpha(0xE2E8F0, 0.5);
    pub const LINE: Color = Color::hex_alpha(0x94A3B8, 0.1);
    pub const LABEL_FILL: Color = Color::hex_alpha(0x020617, 0.7);
    pub const LABEL_BORDER: Color = Color::hex_alpha(0xFFFFFF, 0.1);
    pub const HIGHLIGHT_EMISSIVE: f32 = 0.5;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_unpacks_channels() {
        let c = Color::hex(0xFF8000);
        assert_eq!(c.to_u8_array(), [255, 128, 0, 255]);
    }

    #[test]
    fn linear_conversion_darkens_midtones() {
        let [r, g, b, a] = Color::hex(0x808080).into_linear_rgba();
        assert!(r < 0.5 && g < 0.5 && b < 0.5);
        assert_eq!(a, 1.0);
    }
}
