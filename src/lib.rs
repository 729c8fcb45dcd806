//! gitcard
//!
//! Fetches a public GitHub profile and renders it as a shareable card that
//! can be exported as a PNG image.
//!
//! # Features
//!
//! - **Profile fetcher**: one blocking GET against the GitHub REST API with
//!   classified failures (not found, rate limited, HTTP, network)
//! - **Card renderer**: deterministic layout on a 600×400 reference canvas,
//!   scaled uniformly to any surface size
//! - **Surfaces**: a recording display list for tests and a raster backend
//!   (feature `raster`, default) that exports PNG
//!
//! # Example
//!
//! ```no_run
//! use gitcard::{CardCanvas, CardConfig, ProfileFetcher, ProfileSource};
//! use gitcard::rendering::raster::{FontSet, RasterSurface};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = CardConfig::default();
//! let fetcher = ProfileFetcher::new(config.fetch.clone())?;
//! let profile = fetcher.fetch("octocat")?;
//!
//! let fonts = FontSet::load(&config.fonts)?;
//! let mut canvas = CardCanvas::new(RasterSurface::new(fonts), config.size);
//! let slot = canvas.render(&profile);
//! let avatar = fetcher.fetch_avatar(&slot.url)?;
//! canvas.paint_avatar(&slot, &avatar);
//! std::fs::write("octocat-github-card.png", canvas.export_png()?.png_data)?;
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;

pub mod error;
pub use error::{Error, Result};

pub mod profile;
pub use profile::{ProfileRecord, TextSummary};

pub mod fetch;
pub use fetch::{ProfileFetcher, ProfileSource};

pub mod rendering;
pub use rendering::{AvatarSlot, CardCanvas, Screenshot};

pub mod avatar;
pub use avatar::AvatarTask;

pub mod controller;
pub use controller::ViewController;

/// Branding line drawn at the bottom of every card
pub const DEFAULT_BRANDING: &str = "gitcard.puang.in";

/// Top-level configuration
///
/// The defaults target the public GitHub API and a 600×400 card at 1×
/// density. The credential is never read from the environment here; the
/// binary maps `GITHUB_TOKEN` onto [`FetchConfig::token`] explicitly.
///
/// # Examples
///
/// ```
/// let cfg = gitcard::CardConfig::default();
/// assert_eq!(cfg.size.width, 600);
/// assert!(cfg.fetch.token.is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CardConfig {
    /// HTTP settings for the profile fetcher
    pub fetch: FetchConfig,
    /// Logical card size and density
    pub size: CardSize,
    /// Font files for the raster backend
    pub fonts: FontConfig,
}

/// Settings for [`ProfileFetcher`]
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Base URL of the REST API; `users/{login}` is appended
    pub api_base_url: String,
    /// Optional bearer token sent as `Authorization: Bearer <token>`
    pub token: Option<String>,
    /// User agent string (GitHub rejects requests without one)
    pub user_agent: String,
    /// Client timeout in milliseconds
    pub timeout_ms: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.github.com".to_string(),
            token: None,
            user_agent: format!("gitcard/{}", env!("CARGO_PKG_VERSION")),
            timeout_ms: 30000,
        }
    }
}

/// Logical card dimensions plus device pixel ratio
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CardSize {
    pub width: u32,
    pub height: u32,
    pub dpr: f32,
}

/// Largest backing-image edge, in device pixels
pub const MAX_DEVICE_EDGE: u32 = 16_384;

impl CardSize {
    /// Backing size in device pixels.
    ///
    /// `None` when the ratio is not a positive finite number, or when either
    /// edge rounds to zero or exceeds [`MAX_DEVICE_EDGE`].
    pub fn device_pixels(&self) -> Option<(u32, u32)> {
        if !(self.dpr.is_finite() && self.dpr > 0.0) {
            return None;
        }
        let edge = |logical: u32| {
            let px = (logical as f64 * self.dpr as f64).round();
            (px >= 1.0 && px <= MAX_DEVICE_EDGE as f64).then_some(px as u32)
        };
        Some((edge(self.width)?, edge(self.height)?))
    }
}

impl Default for CardSize {
    fn default() -> Self {
        Self {
            width: 600,
            height: 400,
            dpr: 1.0,
        }
    }
}

/// Font files used by the raster backend.
///
/// `None` means "probe the usual system locations".
#[derive(Debug, Clone, Default)]
pub struct FontConfig {
    pub regular: Option<PathBuf>,
    pub bold: Option<PathBuf>,
}
