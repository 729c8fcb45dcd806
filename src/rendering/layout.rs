//! Card layout math: reference-canvas scaling, greedy word wrap, and the
//! stat box row.
//!
//! Everything is authored against a 600×400 reference canvas and multiplied
//! by a single uniform scale factor.

pub const REFERENCE_WIDTH: f32 = 600.0;
pub const REFERENCE_HEIGHT: f32 = 400.0;

/// Bio lines kept before the last one is ellipsized
pub const MAX_BIO_LINES: usize = 3;

/// Uniform scale fitting the reference canvas into `width × height`
pub fn card_scale(width: u32, height: u32) -> f32 {
    (width as f32 / REFERENCE_WIDTH).min(height as f32 / REFERENCE_HEIGHT)
}

/// Scaled metrics for one render pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Metrics {
    pub scale: f32,
    pub avatar_x: f32,
    pub avatar_y: f32,
    pub avatar_radius: f32,
    pub content_x: f32,
    pub padding: f32,
    pub detail_value_x: f32,
    pub bio_max_width: f32,
    pub bio_line_height: f32,
}

impl Metrics {
    pub fn new(scale: f32) -> Self {
        Self {
            scale,
            avatar_x: 80.0 * scale,
            avatar_y: 80.0 * scale,
            avatar_radius: 50.0 * scale,
            content_x: 160.0 * scale,
            padding: 30.0 * scale,
            detail_value_x: 100.0 * scale,
            bio_max_width: 400.0 * scale,
            bio_line_height: 20.0 * scale,
        }
    }

    /// `base × scale`, floored at `min` pixels
    pub fn font(&self, base: f32, min: f32) -> f32 {
        (base * self.scale).max(min)
    }
}

/// Result of a greedy wrap.
///
/// `separators[i]` is the whitespace that sat between `lines[i]` and
/// `lines[i + 1]` in the source text.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Wrapped {
    pub lines: Vec<String>,
    pub separators: Vec<String>,
}

impl Wrapped {
    /// Source text, rebuilt from lines and the whitespace they were broken at
    pub fn reconstruct(&self) -> String {
        let mut out = String::new();
        for (i, line) in self.lines.iter().enumerate() {
            out.push_str(line);
            if let Some(sep) = self.separators.get(i) {
                out.push_str(sep);
            }
        }
        out
    }
}

/// Split into alternating whitespace/word runs, keeping both.
fn runs(text: &str) -> Vec<(&str, bool)> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut in_ws: Option<bool> = None;
    for (i, ch) in text.char_indices() {
        let ws = ch.is_whitespace();
        match in_ws {
            Some(prev) if prev != ws => {
                out.push((&text[start..i], prev));
                start = i;
            }
            _ => {}
        }
        in_ws = Some(ws);
    }
    if let Some(ws) = in_ws {
        out.push((&text[start..], ws));
    }
    out
}

/// Words of `text` joined by single spaces, as a line is drawn.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Greedy word wrap: a word moves to a new line when appending it would
/// exceed `max_width`. A single word wider than `max_width` gets its own line.
///
/// Lines keep their source whitespace, but widths are measured on the
/// collapsed form from [`collapse_whitespace`].
pub fn wrap_text<F>(text: &str, max_width: f32, measure: F) -> Wrapped
where
    F: Fn(&str) -> f32,
{
    let mut wrapped = Wrapped::default();
    let mut current = String::new();
    let mut shown = String::new();
    let mut has_word = false;
    let mut pending_ws = "";

    for (run, is_ws) in runs(text) {
        if is_ws {
            pending_ws = run;
            continue;
        }
        let candidate = format!("{}{}{}", current, pending_ws, run);
        let shown_candidate = if has_word { format!("{} {}", shown, run) } else { run.to_string() };
        if has_word && measure(&shown_candidate) > max_width {
            wrapped.lines.push(std::mem::take(&mut current));
            wrapped.separators.push(pending_ws.to_string());
            current.push_str(run);
            shown = run.to_string();
        } else {
            current = candidate;
            shown = shown_candidate;
        }
        has_word = true;
        pending_ws = "";
    }
    current.push_str(pending_ws);
    if !current.is_empty() || wrapped.lines.is_empty() {
        wrapped.lines.push(current);
    }
    wrapped
}

/// Keep at most `max_lines`; if anything was dropped, shorten the last kept
/// line until it fits with a trailing ellipsis.
pub fn clamp_lines<F>(mut lines: Vec<String>, max_lines: usize, max_width: f32, measure: F) -> Vec<String>
where
    F: Fn(&str) -> f32,
{
    if lines.len() <= max_lines || max_lines == 0 {
        lines.truncate(max_lines);
        return lines;
    }
    lines.truncate(max_lines);
    if let Some(last) = lines.last_mut() {
        let mut base = last.trim_end().to_string();
        while !base.is_empty() && measure(&format!("{}…", base)) > max_width {
            base.pop();
            base = base.trim_end().to_string();
        }
        *last = format!("{}…", base);
    }
    lines
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatBox {
    pub label: &'static str,
    pub value: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub radius: f32,
}

/// Horizontal gap between stat boxes; narrows on small cards
pub fn box_spacing(scale: f32) -> f32 {
    if scale < 0.7 {
        10.0 * scale
    } else {
        30.0 * scale
    }
}

/// Stat boxes that fit inside `surface_width`. A box whose right edge would
/// cross the surface edge is left out entirely.
pub fn stat_boxes(m: &Metrics, stats_y: f32, surface_width: f32, values: [(&'static str, u64); 3]) -> Vec<StatBox> {
    let width = 140.0 * m.scale;
    let height = 50.0 * m.scale;
    let spacing = box_spacing(m.scale);
    values
        .into_iter()
        .enumerate()
        .map(|(i, (label, value))| StatBox {
            label,
            value: value.to_string(),
            x: m.padding + (width + spacing) * i as f32,
            y: stats_y,
            width,
            height,
            radius: 8.0 * m.scale,
        })
        .filter(|b| b.x + b.width <= surface_width)
        .collect()
}
