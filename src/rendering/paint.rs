//! Recording surface: every draw call becomes a [`PaintCommand`].
//!
//! Text is measured with fixed per-character advances so layouts are
//! reproducible without any font files. Used by tests, goldens and the
//! bench; it cannot produce pixels.

use sha2::{Digest, Sha256};

use super::{Color, FontSpec, Path, Screenshot, Surface};
use crate::{Error, Result};

/// Advance per character as a fraction of the font size
const REGULAR_ADVANCE: f32 = 0.5;
const BOLD_ADVANCE: f32 = 0.55;

#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub x: f32,
    pub y: f32,
    pub text: String,
    pub font: FontSpec,
    pub color: Color,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PaintCommand {
    Clear {
        width: u32,
        height: u32,
    },
    FillRect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        color: Color,
    },
    StrokeRect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        color: Color,
        line_width: f32,
    },
    /// `bounds` is `(min_x, min_y, max_x, max_y)` of the flattened path
    FillPath {
        bounds: (f32, f32, f32, f32),
        color: Color,
    },
    StrokePath {
        bounds: (f32, f32, f32, f32),
        color: Color,
        line_width: f32,
    },
    Text(TextRun),
    Image {
        cx: f32,
        cy: f32,
        radius: f32,
        bytes: usize,
    },
    StrokeCircle {
        cx: f32,
        cy: f32,
        radius: f32,
        color: Color,
        line_width: f32,
    },
}

fn bounds(path: &Path) -> (f32, f32, f32, f32) {
    path.flatten(4).iter().flatten().fold(
        (f32::INFINITY, f32::INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY),
        |(x0, y0, x1, y1), &(x, y)| (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
    )
}

#[derive(Debug, Clone)]
pub struct DisplayList {
    commands: Vec<PaintCommand>,
    dpr: f32,
    size: (u32, u32),
}

impl Default for DisplayList {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplayList {
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
            dpr: 1.0,
            size: (0, 0),
        }
    }

    pub fn commands(&self) -> &[PaintCommand] {
        &self.commands
    }

    pub fn texts(&self) -> impl Iterator<Item = &TextRun> {
        self.commands.iter().filter_map(|c| match c {
            PaintCommand::Text(t) => Some(t),
            _ => None,
        })
    }

    pub fn find_text(&self, text: &str) -> Option<&TextRun> {
        self.texts().find(|t| t.text == text)
    }

    pub fn paths(&self) -> impl Iterator<Item = &PaintCommand> {
        self.commands
            .iter()
            .filter(|c| matches!(c, PaintCommand::FillPath { .. } | PaintCommand::StrokePath { .. }))
    }

    pub fn images(&self) -> Vec<&PaintCommand> {
        self.commands
            .iter()
            .filter(|c| matches!(c, PaintCommand::Image { .. }))
            .collect()
    }

    /// Hex SHA-256 over the debug form of every command, for golden files
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        for cmd in &self.commands {
            hasher.update(format!("{:?}\n", cmd).as_bytes());
        }
        hex::encode(hasher.finalize())
    }
}

impl Surface for DisplayList {
    fn device_pixel_ratio(&self) -> f32 {
        self.dpr
    }

    fn set_device_pixel_ratio(&mut self, dpr: f32) {
        self.dpr = dpr;
    }

    fn begin(&mut self, width: u32, height: u32) -> bool {
        if width == 0 || height == 0 || !(self.dpr > 0.0) {
            return false;
        }
        self.size = (width, height);
        true
    }

    fn logical_size(&self) -> (u32, u32) {
        self.size
    }

    fn clear(&mut self) {
        self.commands.clear();
        self.commands.push(PaintCommand::Clear {
            width: self.size.0,
            height: self.size.1,
        });
    }

    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Color) {
        self.commands.push(PaintCommand::FillRect { x, y, width, height, color });
    }

    fn stroke_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Color, line_width: f32) {
        self.commands.push(PaintCommand::StrokeRect {
            x,
            y,
            width,
            height,
            color,
            line_width,
        });
    }

    fn fill_path(&mut self, path: &Path, color: Color) {
        self.commands.push(PaintCommand::FillPath {
            bounds: bounds(path),
            color,
        });
    }

    fn stroke_path(&mut self, path: &Path, color: Color, line_width: f32) {
        self.commands.push(PaintCommand::StrokePath {
            bounds: bounds(path),
            color,
            line_width,
        });
    }

    fn fill_text(&mut self, text: &str, x: f32, y: f32, font: FontSpec, color: Color) {
        self.commands.push(PaintCommand::Text(TextRun {
            x,
            y,
            text: text.to_string(),
            font,
            color,
        }));
    }

    fn measure_text(&self, text: &str, font: FontSpec) -> f32 {
        let advance = if font.bold { BOLD_ADVANCE } else { REGULAR_ADVANCE };
        text.chars().count() as f32 * font.size * advance
    }

    fn draw_image_in_circle(&mut self, image: &[u8], cx: f32, cy: f32, radius: f32) -> Result<()> {
        if image.is_empty() {
            return Err(Error::Render("empty avatar image".into()));
        }
        self.commands.push(PaintCommand::Image {
            cx,
            cy,
            radius,
            bytes: image.len(),
        });
        Ok(())
    }

    fn stroke_circle(&mut self, cx: f32, cy: f32, radius: f32, color: Color, line_width: f32) {
        self.commands.push(PaintCommand::StrokeCircle {
            cx,
            cy,
            radius,
            color,
            line_width,
        });
    }

    fn encode_png(&self) -> Result<Screenshot> {
        Err(Error::Render("display lists cannot be exported as PNG".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paint_command_debug() {
        let cmd = PaintCommand::FillRect {
            x: 0.0,
            y: 0.0,
            width: 10.0,
            height: 10.0,
            color: Color::rgb(255, 0, 0),
        };
        match cmd {
            PaintCommand::FillRect { width, .. } => assert_eq!(width, 10.0),
            _ => panic!("unexpected"),
        }
    }

    #[test]
    fn clear_resets_recorded_commands() {
        let mut list = DisplayList::new();
        assert!(list.begin(10, 10));
        list.fill_rect(0.0, 0.0, 1.0, 1.0, Color::TRANSPARENT);
        list.clear();
        assert_eq!(list.commands(), &[PaintCommand::Clear { width: 10, height: 10 }]);
    }

    #[test]
    fn begin_rejects_zero_area() {
        let mut list = DisplayList::new();
        assert!(!list.begin(0, 10));
        list.set_device_pixel_ratio(0.0);
        assert!(!list.begin(10, 10));
    }

    #[test]
    fn measurement_is_per_char() {
        let list = DisplayList::new();
        assert_eq!(list.measure_text("abcd", FontSpec::regular(10.0)), 20.0);
        assert_eq!(list.measure_text("héllo", FontSpec::regular(10.0)), 25.0);
        assert!(list.measure_text("abcd", FontSpec::bold(10.0)) > 20.0);
    }

    #[test]
    fn digest_changes_with_content() {
        let mut a = DisplayList::new();
        a.begin(10, 10);
        a.clear();
        let before = a.digest();
        a.fill_text("x", 1.0, 1.0, FontSpec::regular(8.0), Color::rgb(1, 2, 3));
        assert_ne!(before, a.digest());
        assert_eq!(a.digest().len(), 64);
    }

    #[test]
    fn path_bounds_cover_rounded_corners() {
        let mut list = DisplayList::new();
        list.fill_path(&crate::rendering::card::rounded_rect(10.0, 20.0, 100.0, 50.0, 8.0), Color::TRANSPARENT);
        assert_eq!(list.commands()[0], PaintCommand::FillPath { bounds: (10.0, 20.0, 110.0, 70.0), color: Color::TRANSPARENT });
    }

    #[test]
    fn png_export_is_unsupported() {
        assert!(matches!(DisplayList::new().encode_png(), Err(Error::Render(_))));
    }
}
