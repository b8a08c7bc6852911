use std::ops::Deref;

use glam::Vec4;

/// Linear RGBA color, each channel in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color(Vec4);

impl Color {
    pub const TRANSPARENT: Color = Color(Vec4::new(0.0, 0.0, 0.0, 0.0));
    pub const BLACK: Color = Color(Vec4::new(0.0, 0.0, 0.0, 1.0));
    pub const WHITE: Color = Color(Vec4::new(1.0, 1.0, 1.0, 1.0));
    pub const RED: Color = Color(Vec4::new(1.0, 0.0, 0.0, 1.0));
    pub const GREEN: Color = Color(Vec4::new(0.0, 1.0, 0.0, 1.0));
    pub const BLUE: Color = Color(Vec4::new(0.0, 0.0, 1.0, 1.0));
    /// 100, 149, 237. The default clear color.
    pub const CORNFLOWER_BLUE: Color = Color(Vec4::new(100.0 / 255.0, 149.0 / 255.0, 237.0 / 255.0, 1.0));

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Color(Vec4::new(r, g, b, a))
    }

    pub fn from_rgba8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Color(Vec4::new(
            f32::from(r) / 255.0,
            f32::from(g) / 255.0,
            f32::from(b) / 255.0,
            f32::from(a) / 255.0,
        ))
    }

    pub fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        Self::from_rgba8(r, g, b, u8::MAX)
    }

    pub fn to_array(self) -> [f32; 4] {
        self.0.to_array()
    }

    pub fn with_alpha(self, alpha: f32) -> Self {
        Color(self.0.truncate().extend(alpha))
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::CORNFLOWER_BLUE
    }
}

impl Deref for Color {
    type Target = Vec4;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec4> for Color {
    fn from(v: Vec4) -> Self {
        Self(v)
    }
}

impl From<[f32; 4]> for Color {
    fn from(rgba: [f32; 4]) -> Self {
        Self(Vec4::from_array(rgba))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_cornflower_blue() {
        assert_eq!(Color::default(), Color::from_rgb8(100, 149, 237));
    }

    #[test]
    fn alpha_replacement_keeps_rgb() {
        let faded = Color::RED.with_alpha(0.25);
        assert_eq!(faded.to_array(), [1.0, 0.0, 0.0, 0.25]);
        assert_eq!(faded.x, 1.0);
    }
}
