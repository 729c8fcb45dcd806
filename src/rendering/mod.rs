//! Rendering: drawing surfaces, the card layout, and the canvas that ties
//! the layout pass to the avatar step.

pub mod card;
pub mod layout;
pub mod paint;
#[cfg(feature = "raster")]
pub mod raster;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use base64::Engine as _;

use crate::{CardSize, ProfileRecord, Result};

/// Exported card image
#[derive(Debug, Clone)]
pub struct Screenshot {
    pub width: u32,
    pub height: u32,
    pub png_data: Vec<u8>,
}

impl Screenshot {
    /// `data:` URL form of the PNG, as a browser canvas would hand out
    pub fn data_url(&self) -> String {
        format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(&self.png_data)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

/// Font request: pixel size (em) and weight
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontSpec {
    pub size: f32,
    pub bold: bool,
}

impl FontSpec {
    pub fn regular(size: f32) -> Self {
        Self { size, bold: false }
    }

    pub fn bold(size: f32) -> Self {
        Self { size, bold: true }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathOp {
    MoveTo(f32, f32),
    LineTo(f32, f32),
    QuadTo { cx: f32, cy: f32, x: f32, y: f32 },
    Close,
}

/// A vector path in logical units
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Path {
    pub ops: Vec<PathOp>,
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn move_to(&mut self, x: f32, y: f32) -> &mut Self {
        self.ops.push(PathOp::MoveTo(x, y));
        self
    }

    pub fn line_to(&mut self, x: f32, y: f32) -> &mut Self {
        self.ops.push(PathOp::LineTo(x, y));
        self
    }

    pub fn quad_to(&mut self, cx: f32, cy: f32, x: f32, y: f32) -> &mut Self {
        self.ops.push(PathOp::QuadTo { cx, cy, x, y });
        self
    }

    pub fn close(&mut self) -> &mut Self {
        self.ops.push(PathOp::Close);
        self
    }

    pub fn rect(x: f32, y: f32, w: f32, h: f32) -> Self {
        let mut p = Path::new();
        p.move_to(x, y).line_to(x + w, y).line_to(x + w, y + h).line_to(x, y + h).close();
        p
    }

    /// Flatten into closed polylines; curves are split into `segments` lines.
    pub fn flatten(&self, segments: usize) -> Vec<Vec<(f32, f32)>> {
        let segments = segments.max(1);
        let mut out = Vec::new();
        let mut cur: Vec<(f32, f32)> = Vec::new();
        for op in &self.ops {
            match *op {
                PathOp::MoveTo(x, y) => {
                    if cur.len() > 1 {
                        out.push(std::mem::take(&mut cur));
                    }
                    cur.clear();
                    cur.push((x, y));
                }
                PathOp::LineTo(x, y) => cur.push((x, y)),
                PathOp::QuadTo { cx, cy, x, y } => {
                    let (x0, y0) = cur.last().copied().unwrap_or((cx, cy));
                    for i in 1..=segments {
                        let t = i as f32 / segments as f32;
                        let mt = 1.0 - t;
                        cur.push((
                            mt * mt * x0 + 2.0 * mt * t * cx + t * t * x,
                            mt * mt * y0 + 2.0 * mt * t * cy + t * t * y,
                        ));
                    }
                }
                PathOp::Close => {
                    if let Some(&first) = cur.first() {
                        if cur.last() != Some(&first) {
                            cur.push(first);
                        }
                    }
                }
            }
        }
        if cur.len() > 1 {
            out.push(cur);
        }
        out
    }
}

/// A 2D drawing target, modeled on a canvas 2D context.
///
/// Coordinates are logical units; implementations pre-scale by the device
/// pixel ratio. Text positions are alphabetic baselines.
pub trait Surface {
    fn device_pixel_ratio(&self) -> f32;

    fn set_device_pixel_ratio(&mut self, dpr: f32);

    /// Size the backing buffer to `logical × dpr`. Returns `false` when no
    /// drawing context can be produced, in which case callers draw nothing.
    fn begin(&mut self, width: u32, height: u32) -> bool;

    /// Logical size set by the last successful `begin`
    fn logical_size(&self) -> (u32, u32);

    fn clear(&mut self);

    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Color);

    fn stroke_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Color, line_width: f32);

    fn fill_path(&mut self, path: &Path, color: Color);

    fn stroke_path(&mut self, path: &Path, color: Color, line_width: f32);

    fn fill_text(&mut self, text: &str, x: f32, y: f32, font: FontSpec, color: Color);

    /// Advance width of `text` in logical units
    fn measure_text(&self, text: &str, font: FontSpec) -> f32;

    /// Clip to the circle and draw the encoded image scaled to fill `2r × 2r`.
    fn draw_image_in_circle(&mut self, image: &[u8], cx: f32, cy: f32, r: f32) -> Result<()>;

    fn stroke_circle(&mut self, cx: f32, cy: f32, r: f32, color: Color, line_width: f32);

    /// Encode the backing buffer as PNG
    fn encode_png(&self) -> Result<Screenshot>;
}

/// Where the avatar goes for one render pass
#[derive(Debug, Clone, PartialEq)]
pub struct AvatarSlot {
    pub cx: f32,
    pub cy: f32,
    pub radius: f32,
    pub url: String,
    pub generation: u64,
}

/// Shared view of a canvas's render generation.
///
/// Cloned into avatar workers so they can tell whether their slot is
/// still the one on screen.
#[derive(Debug, Clone, Default)]
pub struct GenerationToken(Arc<AtomicU64>);

impl GenerationToken {
    pub fn current(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.current() == generation
    }

    fn advance(&self) -> u64 {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }
}

/// A surface plus the state needed to re-render and to accept avatars.
pub struct CardCanvas<S: Surface> {
    surface: S,
    size: CardSize,
    branding: String,
    generation: GenerationToken,
    last_profile: Option<ProfileRecord>,
}

impl<S: Surface> CardCanvas<S> {
    pub fn new(mut surface: S, size: CardSize) -> Self {
        surface.set_device_pixel_ratio(size.dpr);
        Self {
            surface,
            size,
            branding: crate::DEFAULT_BRANDING.to_string(),
            generation: GenerationToken::default(),
            last_profile: None,
        }
    }

    pub fn with_branding(mut self, branding: impl Into<String>) -> Self {
        self.branding = branding.into();
        self
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn size(&self) -> CardSize {
        self.size
    }

    pub fn generation(&self) -> GenerationToken {
        self.generation.clone()
    }

    pub fn profile(&self) -> Option<&ProfileRecord> {
        self.last_profile.as_ref()
    }

    /// Fully repaint for `profile`. Any avatar slot from an earlier call
    /// becomes stale.
    pub fn render(&mut self, profile: &ProfileRecord) -> AvatarSlot {
        let generation = self.generation.advance();
        let mut slot = card::render_card_with_branding(
            &mut self.surface,
            profile,
            self.size.width,
            self.size.height,
            &self.branding,
        );
        slot.generation = generation;
        self.last_profile = Some(profile.clone());
        log::debug!("rendered card for {} (generation {})", profile.login, generation);
        slot
    }

    /// Change size and re-render the last profile, if any.
    pub fn resize(&mut self, size: CardSize) -> Option<AvatarSlot> {
        self.size = size;
        self.surface.set_device_pixel_ratio(size.dpr);
        let profile = self.last_profile.take()?;
        let slot = self.render(&profile);
        Some(slot)
    }

    /// Paint a loaded avatar. Returns `false` when the slot is stale or the
    /// image cannot be drawn; neither is an error for the card.
    pub fn paint_avatar(&mut self, slot: &AvatarSlot, image: &[u8]) -> bool {
        if !self.generation.is_current(slot.generation) {
            log::debug!(
                "dropping stale avatar (generation {} != {})",
                slot.generation,
                self.generation.current()
            );
            return false;
        }
        card::draw_avatar(&mut self.surface, slot, image)
    }

    pub fn export_png(&self) -> Result<Screenshot> {
        self.surface.encode_png()
    }
}

#[cfg(test)]
mod tests {
    use super::paint::DisplayList;
    use super::*;
    use crate::profile::sample_profile;

    #[test]
    fn flatten_closes_rect() {
        let polys = Path::rect(0.0, 0.0, 10.0, 5.0).flatten(4);
        assert_eq!(polys.len(), 1);
        assert_eq!(polys[0].first(), polys[0].last());
        assert_eq!(polys[0].len(), 5);
    }

    #[test]
    fn flatten_quad_ends_on_endpoint() {
        let mut p = Path::new();
        p.move_to(0.0, 0.0).quad_to(10.0, 0.0, 10.0, 10.0);
        let polys = p.flatten(8);
        assert_eq!(polys[0].len(), 9);
        assert_eq!(*polys[0].last().unwrap(), (10.0, 10.0));
    }

    #[test]
    fn newer_render_makes_old_slot_stale() {
        let mut canvas = CardCanvas::new(DisplayList::new(), CardSize::default());
        let profile = sample_profile();
        let first = canvas.render(&profile);
        let second = canvas.render(&profile);
        assert!(second.generation > first.generation);

        assert!(!canvas.paint_avatar(&first, b"img"));
        assert!(canvas.paint_avatar(&second, b"img"));
        let images = canvas.surface().images();
        assert_eq!(images.len(), 1);
    }

    #[test]
    fn resize_rerenders_last_profile() {
        let mut canvas = CardCanvas::new(DisplayList::new(), CardSize::default());
        assert!(canvas.resize(CardSize { width: 300, height: 200, dpr: 2.0 }).is_none());

        canvas.render(&sample_profile());
        let slot = canvas
            .resize(CardSize { width: 300, height: 200, dpr: 2.0 })
            .expect("profile was rendered");
        assert_eq!((slot.cx, slot.cy, slot.radius), (40.0, 40.0, 25.0));
        assert_eq!(canvas.surface().logical_size(), (300, 200));
        assert_eq!(canvas.surface().device_pixel_ratio(), 2.0);
    }

    #[test]
    fn screenshot_data_url_prefix() {
        let s = Screenshot { width: 1, height: 1, png_data: vec![1, 2, 3] };
        assert_eq!(s.data_url(), "data:image/png;base64,AQID");
    }
}
