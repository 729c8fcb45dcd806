//! The card itself: a fixed draw sequence over any [`Surface`].

use super::layout::{self, Metrics, MAX_BIO_LINES};
use super::{AvatarSlot, Color, FontSpec, Path, Surface};
use crate::ProfileRecord;

pub const BACKGROUND: Color = Color::rgb(0x0d, 0x11, 0x17);
pub const BORDER: Color = Color::rgb(0x21, 0x26, 0x2d);
pub const RING: Color = Color::rgb(0x30, 0x36, 0x3d);
pub const BOX_FILL: Color = Color::rgb(0x16, 0x1b, 0x22);
pub const HEADLINE: Color = Color::rgb(0xf0, 0xf6, 0xfc);
pub const MUTED: Color = Color::rgb(0x8b, 0x94, 0x9e);
pub const BODY: Color = Color::rgb(0xe6, 0xed, 0xf3);
pub const BRANDING: Color = Color::rgb(0x6e, 0x76, 0x81);

/// Closed rounded rectangle with quadratic corners.
pub fn rounded_rect(x: f32, y: f32, w: f32, h: f32, r: f32) -> Path {
    let mut p = Path::new();
    p.move_to(x + r, y)
        .line_to(x + w - r, y)
        .quad_to(x + w, y, x + w, y + r)
        .line_to(x + w, y + h - r)
        .quad_to(x + w, y + h, x + w - r, y + h)
        .line_to(x + r, y + h)
        .quad_to(x, y + h, x, y + h - r)
        .line_to(x, y + r)
        .quad_to(x, y, x + r, y)
        .close();
    p
}

/// Paint the card with the default branding line.
pub fn render_card<S: Surface + ?Sized>(surface: &mut S, profile: &ProfileRecord, width: u32, height: u32) -> AvatarSlot {
    render_card_with_branding(surface, profile, width, height, crate::DEFAULT_BRANDING)
}

/// Paint everything except the avatar and return where the avatar goes.
///
/// The surface is cleared first, so repeated calls never accumulate. If the
/// surface cannot begin a frame nothing is drawn.
pub fn render_card_with_branding<S: Surface + ?Sized>(
    surface: &mut S,
    profile: &ProfileRecord,
    width: u32,
    height: u32,
    branding: &str,
) -> AvatarSlot {
    let m = Metrics::new(layout::card_scale(width, height));
    let s = m.scale;
    let slot = AvatarSlot {
        cx: m.avatar_x,
        cy: m.avatar_y,
        radius: m.avatar_radius,
        url: profile.avatar_url.clone(),
        generation: 0,
    };

    if !surface.begin(width, height) {
        log::debug!("surface has no drawing context for {}x{}", width, height);
        return slot;
    }
    let (w, h) = (width as f32, height as f32);

    surface.clear();
    surface.fill_rect(0.0, 0.0, w, h, BACKGROUND);
    surface.stroke_rect(0.0, 0.0, w, h, BORDER, 1.0);

    surface.fill_text(profile.display_name(), m.content_x, 60.0 * s, FontSpec::bold(m.font(32.0, 16.0)), HEADLINE);
    surface.fill_text(
        &format!("@{}", profile.login),
        m.content_x,
        85.0 * s,
        FontSpec::regular(m.font(20.0, 12.0)),
        MUTED,
    );

    if let Some(bio) = profile.bio() {
        let font = FontSpec::regular(m.font(16.0, 10.0));
        let measure = |t: &str| surface.measure_text(t, font);
        let wrapped = layout::wrap_text(bio, m.bio_max_width, measure);
        let lines = wrapped.lines.iter().map(|l| layout::collapse_whitespace(l)).collect();
        let lines = layout::clamp_lines(lines, MAX_BIO_LINES, m.bio_max_width, measure);
        for (i, line) in lines.iter().enumerate() {
            surface.fill_text(line, m.content_x, 110.0 * s + i as f32 * m.bio_line_height, font, BODY);
        }
    }

    let mut y = 160.0 * s;
    let detail = FontSpec::regular(m.font(14.0, 8.0));
    for (label, value) in [("Company:", profile.company()), ("Location:", profile.location())] {
        if let Some(value) = value {
            surface.fill_text(label, m.padding, y, detail, MUTED);
            surface.fill_text(value, m.detail_value_x, y, detail, BODY);
            y += 25.0 * s;
        }
    }

    surface.fill_text("GitHub Statistics", m.padding, y + 30.0 * s, FontSpec::bold(m.font(18.0, 12.0)), HEADLINE);

    let stats_y = y + 50.0 * s;
    let boxes = layout::stat_boxes(
        &m,
        stats_y,
        w,
        [
            ("Repositories", profile.public_repos),
            ("Followers", profile.followers),
            ("Following", profile.following),
        ],
    );
    for b in &boxes {
        let path = rounded_rect(b.x, b.y, b.width, b.height, b.radius);
        surface.fill_path(&path, BOX_FILL);
        surface.stroke_path(&path, RING, 1.0);
        surface.fill_text(b.label, b.x + 15.0 * s, b.y + 20.0 * s, FontSpec::regular(m.font(12.0, 8.0)), MUTED);
        surface.fill_text(&b.value, b.x + 15.0 * s, b.y + 42.0 * s, FontSpec::bold(m.font(20.0, 12.0)), HEADLINE);
    }

    surface.fill_text(
        &format!("Joined {}", profile.joined_display()),
        m.padding,
        stats_y + 90.0 * s,
        FontSpec::regular(m.font(14.0, 8.0)),
        MUTED,
    );

    let brand_font = FontSpec::regular(m.font(12.0, 8.0));
    let brand_w = surface.measure_text(branding, brand_font);
    surface.fill_text(branding, (w - brand_w) / 2.0, stats_y + 130.0 * s, brand_font, BRANDING);

    slot
}

/// Clip-and-draw the avatar, then ring it. Returns whether the image was drawn.
pub fn draw_avatar<S: Surface + ?Sized>(surface: &mut S, slot: &AvatarSlot, image: &[u8]) -> bool {
    match surface.draw_image_in_circle(image, slot.cx, slot.cy, slot.radius) {
        Ok(()) => {
            surface.stroke_circle(slot.cx, slot.cy, slot.radius, RING, 2.0);
            true
        }
        Err(e) => {
            log::warn!("could not draw avatar {}: {}", slot.url, e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::sample_profile;
    use crate::rendering::paint::{DisplayList, PaintCommand};

    fn render(profile: &ProfileRecord, w: u32, h: u32) -> (DisplayList, AvatarSlot) {
        let mut list = DisplayList::new();
        let slot = render_card(&mut list, profile, w, h);
        (list, slot)
    }

    #[test]
    fn reference_size_places_avatar_at_80_80() {
        let (_, slot) = render(&sample_profile(), 600, 400);
        assert_eq!((slot.cx, slot.cy, slot.radius), (80.0, 80.0, 50.0));
        assert_eq!(slot.url, sample_profile().avatar_url);
    }

    #[test]
    fn starts_with_clear_background_and_border() {
        let (list, _) = render(&sample_profile(), 600, 400);
        let cmds = list.commands();
        assert_eq!(cmds[0], PaintCommand::Clear { width: 600, height: 400 });
        assert!(matches!(cmds[1], PaintCommand::FillRect { color: BACKGROUND, .. }));
        assert!(matches!(cmds[2], PaintCommand::StrokeRect { color: BORDER, .. }));
    }

    #[test]
    fn name_falls_back_to_login() {
        let mut p = sample_profile();
        p.name = None;
        let (list, _) = render(&p, 600, 400);
        let t = list.find_text("octocat").expect("login drawn as name");
        assert_eq!((t.x, t.y), (160.0, 60.0));
        assert!(list.find_text("@octocat").is_some());
    }

    #[test]
    fn null_bio_matches_empty_bio() {
        let mut none = sample_profile();
        none.bio = None;
        let mut empty = sample_profile();
        empty.bio = Some(String::new());

        let (a, _) = render(&none, 600, 400);
        let (b, _) = render(&empty, 600, 400);
        assert_eq!(a.commands(), b.commands());
        assert!(a.texts().all(|t| t.color != BODY || t.y >= 160.0));

        let ha = a.find_text("GitHub Statistics").unwrap().y;
        let hb = b.find_text("GitHub Statistics").unwrap().y;
        assert_eq!(ha, hb);
    }

    #[test]
    fn long_bio_wraps_into_lines() {
        let mut p = sample_profile();
        let bio = "Building small tools for large problems and writing about distributed systems, compilers and coffee";
        p.bio = Some(bio.into());
        let (list, _) = render(&p, 600, 400);
        let bio_lines: Vec<_> = list.texts().filter(|t| t.color == BODY && t.y < 160.0).collect();
        assert!(bio_lines.len() >= 2);
        assert_eq!(bio_lines[0].y, 110.0);
        assert_eq!(bio_lines[1].y, 130.0);
        for l in &bio_lines {
            assert!(list.measure_text(&l.text, FontSpec::regular(16.0)) <= 400.0);
        }
    }

    #[test]
    fn bio_control_whitespace_is_drawn_as_spaces() {
        let mut p = sample_profile();
        p.bio = Some("Rust dev\r\nLikes\tcats".into());
        let (list, _) = render(&p, 600, 400);
        let bio_lines: Vec<_> = list.texts().filter(|t| t.color == BODY && t.y < 160.0).collect();
        assert_eq!(bio_lines.len(), 1);
        assert_eq!(bio_lines[0].text, "Rust dev Likes cats");
        assert!(list.texts().all(|t| !t.text.contains(|c: char| c.is_control())));
    }

    #[test]
    fn absent_details_compress_upward() {
        let full = sample_profile();
        let mut bare = sample_profile();
        bare.company = None;
        bare.location = None;

        let (a, _) = render(&full, 600, 400);
        let (b, _) = render(&bare, 600, 400);
        assert_eq!(a.find_text("Company:").unwrap().y, 160.0);
        assert_eq!(a.find_text("Location:").unwrap().y, 185.0);
        assert_eq!(a.find_text("GitHub Statistics").unwrap().y, 240.0);
        assert!(b.find_text("Company:").is_none());
        assert_eq!(b.find_text("GitHub Statistics").unwrap().y, 190.0);
        // only location: takes the first slot
        let mut loc_only = sample_profile();
        loc_only.company = None;
        let (c, _) = render(&loc_only, 600, 400);
        assert_eq!(c.find_text("Location:").unwrap().y, 160.0);
    }

    #[test]
    fn stat_boxes_and_values() {
        let (list, _) = render(&sample_profile(), 600, 400);
        assert_eq!(list.paths().count(), 6);
        assert!(list.find_text("9000").is_some());
        assert!(list.find_text("Following").is_some());
    }

    #[test]
    fn stat_boxes_stay_inside_surface_at_any_size() {
        for (w, h) in [(600, 400), (300, 400), (200, 90), (1200, 400), (640, 200)] {
            let (list, _) = render(&sample_profile(), w, h);
            for cmd in list.commands() {
                if let PaintCommand::FillPath { bounds, .. } = cmd {
                    assert!(bounds.2 <= w as f32, "box overflows {}x{}", w, h);
                }
            }
        }
    }

    #[test]
    fn joined_date_is_formatted() {
        let mut p = sample_profile();
        p.created_at = "2015-01-01T00:00:00Z".into();
        let (list, _) = render(&p, 600, 400);
        assert!(list.find_text("Joined Jan 1, 2015").is_some());
    }

    #[test]
    fn branding_is_centered() {
        let (list, _) = render(&sample_profile(), 600, 400);
        let t = list.find_text(crate::DEFAULT_BRANDING).unwrap();
        let w = list.measure_text(&t.text, t.font);
        assert!(((t.x + w / 2.0) - 300.0).abs() < 1e-3);
    }

    #[test]
    fn zero_area_surface_draws_nothing() {
        let (list, slot) = render(&sample_profile(), 0, 400);
        assert!(list.commands().is_empty());
        assert_eq!(slot.radius, 0.0);
    }

    #[test]
    fn rounded_rect_is_closed_with_four_curves() {
        let p = rounded_rect(0.0, 0.0, 100.0, 50.0, 8.0);
        let curves = p.ops.iter().filter(|op| matches!(op, crate::rendering::PathOp::QuadTo { .. })).count();
        assert_eq!(curves, 4);
        assert_eq!(p.ops.last(), Some(&crate::rendering::PathOp::Close));
    }
}
