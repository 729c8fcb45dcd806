//! Raster backend: paints into an RGBA buffer with TrueType fonts and
//! encodes PNG.
//!
//! Shapes are anti-aliased with 4 sub-scanlines per pixel; strokes use
//! distance-to-segment coverage. All coordinates arrive in logical units and
//! are multiplied by the device pixel ratio here.

use std::io::Cursor;
use std::path::{Path as FsPath, PathBuf};

use image::imageops::{self, FilterType};
use image::{ImageOutputFormat, Rgba, RgbaImage};
use rusttype::{point, Font, Scale};

use super::{Color, FontSpec, Path, Screenshot, Surface};
use crate::{CardSize, Error, FontConfig, Result};

const SUBSAMPLES: usize = 4;
const CURVE_SEGMENTS: usize = 8;

const REGULAR_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation-sans/LiberationSans-Regular.ttf",
    "/usr/share/fonts/truetype/noto/NotoSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

const BOLD_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
    "/usr/share/fonts/liberation-sans/LiberationSans-Bold.ttf",
    "/usr/share/fonts/truetype/noto/NotoSans-Bold.ttf",
    "/System/Library/Fonts/Supplemental/Arial Bold.ttf",
    "/Library/Fonts/Arial Bold.ttf",
    "C:\\Windows\\Fonts\\arialbd.ttf",
];

fn first_existing(candidates: &[&str]) -> Option<PathBuf> {
    candidates.iter().map(PathBuf::from).find(|p| p.is_file())
}

fn read_font(path: &FsPath) -> Result<Font<'static>> {
    let bytes = std::fs::read(path).map_err(|e| Error::Font(format!("{}: {}", path.display(), e)))?;
    Font::try_from_vec(bytes).ok_or_else(|| Error::Font(format!("{}: not a TrueType/OpenType font", path.display())))
}

/// Regular and bold faces. Bold falls back to regular when no bold face is found.
#[derive(Clone)]
pub struct FontSet {
    regular: Font<'static>,
    bold: Font<'static>,
}

impl FontSet {
    pub fn from_bytes(regular: Vec<u8>, bold: Option<Vec<u8>>) -> Result<Self> {
        let regular = Font::try_from_vec(regular).ok_or_else(|| Error::Font("invalid regular font data".into()))?;
        let bold = match bold {
            Some(b) => Font::try_from_vec(b).ok_or_else(|| Error::Font("invalid bold font data".into()))?,
            None => regular.clone(),
        };
        Ok(Self { regular, bold })
    }

    /// Load configured paths, probing system locations for anything unset.
    pub fn load(config: &FontConfig) -> Result<Self> {
        let regular_path = match &config.regular {
            Some(p) => p.clone(),
            None => first_existing(REGULAR_CANDIDATES)
                .ok_or_else(|| Error::Font("no system font found; pass a font path".into()))?,
        };
        let regular = read_font(&regular_path)?;
        let bold = match config.bold.clone().or_else(|| first_existing(BOLD_CANDIDATES)) {
            Some(p) => read_font(&p)?,
            None => {
                log::debug!("no bold face found, using {}", regular_path.display());
                regular.clone()
            }
        };
        log::debug!("loaded fonts from {}", regular_path.display());
        Ok(Self { regular, bold })
    }

    pub fn discover() -> Result<Self> {
        Self::load(&FontConfig::default())
    }

    fn face(&self, bold: bool) -> &Font<'static> {
        if bold {
            &self.bold
        } else {
            &self.regular
        }
    }
}

/// rusttype scales by ascent-descent; canvas font sizes are em sizes.
fn em_scale(font: &Font<'_>, px: f32) -> Scale {
    let vm = font.v_metrics_unscaled();
    let upem = f32::from(font.units_per_em().max(1));
    Scale::uniform(px * (vm.ascent - vm.descent) / upem)
}

fn blend(img: &mut RgbaImage, x: i32, y: i32, color: Color, coverage: f32) {
    if x < 0 || y < 0 || x as u32 >= img.width() || y as u32 >= img.height() {
        return;
    }
    let sa = f32::from(color.a) / 255.0 * coverage.clamp(0.0, 1.0);
    if sa <= 0.0 {
        return;
    }
    let dst = img.get_pixel_mut(x as u32, y as u32);
    let da = f32::from(dst.0[3]) / 255.0;
    let out_a = sa + da * (1.0 - sa);
    let src = [color.r, color.g, color.b];
    for (i, s) in src.iter().enumerate() {
        let d = f32::from(dst.0[i]);
        dst.0[i] = ((f32::from(*s) * sa + d * da * (1.0 - sa)) / out_a).round() as u8;
    }
    dst.0[3] = (out_a * 255.0).round() as u8;
}

fn segment_distance(p: (f32, f32), a: (f32, f32), b: (f32, f32)) -> f32 {
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let len2 = dx * dx + dy * dy;
    let t = if len2 > 0.0 {
        (((p.0 - a.0) * dx + (p.1 - a.1) * dy) / len2).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let (qx, qy) = (a.0 + t * dx, a.1 + t * dy);
    ((p.0 - qx).powi(2) + (p.1 - qy).powi(2)).sqrt()
}

pub struct RasterSurface {
    img: RgbaImage,
    fonts: FontSet,
    dpr: f32,
    size: (u32, u32),
}

impl RasterSurface {
    pub fn new(fonts: FontSet) -> Self {
        Self {
            img: RgbaImage::new(0, 0),
            fonts,
            dpr: 1.0,
            size: (0, 0),
        }
    }

    /// Backing pixel buffer (`logical × dpr`)
    pub fn image(&self) -> &RgbaImage {
        &self.img
    }

    fn device_polys(&self, path: &Path) -> Vec<Vec<(f32, f32)>> {
        path.flatten(CURVE_SEGMENTS)
            .into_iter()
            .map(|poly| poly.into_iter().map(|(x, y)| (x * self.dpr, y * self.dpr)).collect())
            .collect()
    }

    /// Even-odd scanline fill over device-space polygons.
    fn fill_polys(&mut self, polys: &[Vec<(f32, f32)>], color: Color) {
        let (w, h) = (self.img.width() as i32, self.img.height() as i32);
        let (min_y, max_y) = polys
            .iter()
            .flatten()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &(_, y)| (lo.min(y), hi.max(y)));
        if !min_y.is_finite() || w == 0 {
            return;
        }
        let y0 = (min_y.floor() as i32).max(0);
        let y1 = (max_y.ceil() as i32).min(h);
        let mut acc = vec![0f32; w as usize];
        let weight = 1.0 / SUBSAMPLES as f32;

        for py in y0..y1 {
            acc.iter_mut().for_each(|a| *a = 0.0);
            for s in 0..SUBSAMPLES {
                let sy = py as f32 + (s as f32 + 0.5) * weight;
                let mut xs: Vec<f32> = Vec::new();
                for poly in polys {
                    for edge in poly.windows(2) {
                        let (a, b) = (edge[0], edge[1]);
                        if (a.1 <= sy && b.1 > sy) || (b.1 <= sy && a.1 > sy) {
                            xs.push(a.0 + (sy - a.1) / (b.1 - a.1) * (b.0 - a.0));
                        }
                    }
                }
                xs.sort_by(|a, b| a.total_cmp(b));
                for pair in xs.chunks_exact(2) {
                    let (left, right) = (pair[0].max(0.0), pair[1].min(w as f32));
                    if right <= left {
                        continue;
                    }
                    let mut px = left.floor() as i32;
                    while (px as f32) < right && px < w {
                        let overlap = right.min(px as f32 + 1.0) - left.max(px as f32);
                        if overlap > 0.0 {
                            acc[px as usize] += overlap * weight;
                        }
                        px += 1;
                    }
                }
            }
            for (px, cov) in acc.iter().enumerate() {
                if *cov > 0.0 {
                    blend(&mut self.img, px as i32, py, color, *cov);
                }
            }
        }
    }

    fn stroke_polys(&mut self, polys: &[Vec<(f32, f32)>], color: Color, line_width: f32) {
        let half = (line_width * self.dpr / 2.0).max(0.5);
        let (w, h) = (self.img.width() as i32, self.img.height() as i32);
        let mut coverage: std::collections::HashMap<(i32, i32), f32> = std::collections::HashMap::new();
        for poly in polys {
            for edge in poly.windows(2) {
                let (a, b) = (edge[0], edge[1]);
                let x0 = ((a.0.min(b.0) - half - 1.0).floor() as i32).max(0);
                let x1 = ((a.0.max(b.0) + half + 1.0).ceil() as i32).min(w);
                let y0 = ((a.1.min(b.1) - half - 1.0).floor() as i32).max(0);
                let y1 = ((a.1.max(b.1) + half + 1.0).ceil() as i32).min(h);
                for py in y0..y1 {
                    for px in x0..x1 {
                        let d = segment_distance((px as f32 + 0.5, py as f32 + 0.5), a, b);
                        let c = (half + 0.5 - d).clamp(0.0, 1.0);
                        if c > 0.0 {
                            let e = coverage.entry((px, py)).or_insert(0.0);
                            *e = e.max(c);
                        }
                    }
                }
            }
        }
        for ((px, py), c) in coverage {
            blend(&mut self.img, px, py, color, c);
        }
    }
}

impl Surface for RasterSurface {
    fn device_pixel_ratio(&self) -> f32 {
        self.dpr
    }

    fn set_device_pixel_ratio(&mut self, dpr: f32) {
        self.dpr = dpr;
    }

    fn begin(&mut self, width: u32, height: u32) -> bool {
        let size = CardSize { width, height, dpr: self.dpr };
        let Some((pw, ph)) = size.device_pixels() else {
            log::debug!("cannot allocate a {}x{} surface at {}x", width, height, self.dpr);
            return false;
        };
        if self.img.dimensions() != (pw, ph) {
            self.img = RgbaImage::new(pw, ph);
        }
        self.size = (width, height);
        true
    }

    fn logical_size(&self) -> (u32, u32) {
        self.size
    }

    fn clear(&mut self) {
        for p in self.img.pixels_mut() {
            *p = Rgba([0, 0, 0, 0]);
        }
    }

    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Color) {
        let polys = self.device_polys(&Path::rect(x, y, w, h));
        self.fill_polys(&polys, color);
    }

    fn stroke_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Color, line_width: f32) {
        let polys = self.device_polys(&Path::rect(x, y, w, h));
        self.stroke_polys(&polys, color, line_width);
    }

    fn fill_path(&mut self, path: &Path, color: Color) {
        let polys = self.device_polys(path);
        self.fill_polys(&polys, color);
    }

    fn stroke_path(&mut self, path: &Path, color: Color, line_width: f32) {
        let polys = self.device_polys(path);
        self.stroke_polys(&polys, color, line_width);
    }

    fn fill_text(&mut self, text: &str, x: f32, y: f32, font: FontSpec, color: Color) {
        let face = self.fonts.face(font.bold);
        let img = &mut self.img;
        let scale = em_scale(face, font.size * self.dpr);
        for glyph in face.layout(text, scale, point(x * self.dpr, y * self.dpr)) {
            if let Some(bb) = glyph.pixel_bounding_box() {
                glyph.draw(|gx, gy, v| {
                    blend(img, bb.min.x + gx as i32, bb.min.y + gy as i32, color, v);
                });
            }
        }
    }

    fn measure_text(&self, text: &str, font: FontSpec) -> f32 {
        let face = self.fonts.face(font.bold);
        let scale = em_scale(face, font.size);
        let mut width = 0.0;
        let mut prev = None;
        for ch in text.chars() {
            let g = face.glyph(ch).scaled(scale);
            if let Some(p) = prev {
                width += face.pair_kerning(scale, p, g.id());
            }
            width += g.h_metrics().advance_width;
            prev = Some(g.id());
        }
        width
    }

    fn draw_image_in_circle(&mut self, image: &[u8], cx: f32, cy: f32, radius: f32) -> Result<()> {
        let r = radius * self.dpr;
        if r <= 0.0 {
            return Err(Error::Render("avatar slot has no area".into()));
        }
        let decoded = image::load_from_memory(image)
            .map_err(|e| Error::Render(format!("undecodable avatar: {}", e)))?
            .to_rgba8();
        let side = (2.0 * r).round().max(1.0) as u32;
        let resized = imageops::resize(&decoded, side, side, FilterType::Lanczos3);

        let (dcx, dcy) = (cx * self.dpr, cy * self.dpr);
        let ox = (dcx - r).round() as i32;
        let oy = (dcy - r).round() as i32;
        for (ix, iy, p) in resized.enumerate_pixels() {
            let (px, py) = (ox + ix as i32, oy + iy as i32);
            let d = ((px as f32 + 0.5 - dcx).powi(2) + (py as f32 + 0.5 - dcy).powi(2)).sqrt();
            let clip = (r + 0.5 - d).clamp(0.0, 1.0);
            if clip > 0.0 {
                let c = Color::rgba(p.0[0], p.0[1], p.0[2], p.0[3]);
                blend(&mut self.img, px, py, c, clip);
            }
        }
        Ok(())
    }

    fn stroke_circle(&mut self, cx: f32, cy: f32, radius: f32, color: Color, line_width: f32) {
        let (dcx, dcy, r) = (cx * self.dpr, cy * self.dpr, radius * self.dpr);
        let half = (line_width * self.dpr / 2.0).max(0.5);
        let reach = r + half + 1.0;
        let (w, h) = (self.img.width() as i32, self.img.height() as i32);
        let x0 = ((dcx - reach).floor() as i32).max(0);
        let x1 = ((dcx + reach).ceil() as i32).min(w);
        let y0 = ((dcy - reach).floor() as i32).max(0);
        let y1 = ((dcy + reach).ceil() as i32).min(h);
        for py in y0..y1 {
            for px in x0..x1 {
                let d = ((px as f32 + 0.5 - dcx).powi(2) + (py as f32 + 0.5 - dcy).powi(2)).sqrt();
                let c = (half + 0.5 - (d - r).abs()).clamp(0.0, 1.0);
                if c > 0.0 {
                    blend(&mut self.img, px, py, color, c);
                }
            }
        }
    }

    fn encode_png(&self) -> Result<Screenshot> {
        if self.size == (0, 0) {
            return Err(Error::Render("nothing has been rendered".into()));
        }
        let mut buf = Cursor::new(Vec::new());
        self.img
            .write_to(&mut buf, ImageOutputFormat::Png)
            .map_err(|e| Error::Render(format!("PNG encoding failed: {}", e)))?;
        Ok(Screenshot {
            width: self.img.width(),
            height: self.img.height(),
            png_data: buf.into_inner(),
        })
    }
}
