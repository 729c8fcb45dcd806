use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;

use gitcard::rendering::raster::{FontSet, RasterSurface};
use gitcard::{CardCanvas, CardConfig, CardSize, FetchConfig, FontConfig, ProfileFetcher, TextSummary, ViewController};

/// Render a GitHub profile card as a PNG.
#[derive(Debug, Parser)]
#[command(name = "gitcard", version, about)]
struct Cli {
    /// GitHub username
    login: String,

    /// Directory the PNG is written to
    #[arg(short, long, default_value = ".")]
    out: PathBuf,

    /// Logical card width
    #[arg(long, default_value_t = 600)]
    width: u32,

    /// Logical card height
    #[arg(long, default_value_t = 400)]
    height: u32,

    /// Device pixel ratio of the exported image
    #[arg(long, default_value_t = 1.0)]
    dpr: f32,

    /// Personal access token sent as a bearer credential
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// REST API base URL
    #[arg(long, default_value = "https://api.github.com")]
    api_url: String,

    /// HTTP timeout in milliseconds
    #[arg(long, default_value_t = 30000)]
    timeout_ms: u64,

    /// Regular font file (TTF/OTF); system fonts are probed when unset
    #[arg(long)]
    font: Option<PathBuf>,

    /// Bold font file
    #[arg(long)]
    bold_font: Option<PathBuf>,

    /// Skip downloading the avatar
    #[arg(long)]
    no_avatar: bool,

    /// Also print a plain-text summary of the card
    #[arg(long)]
    text: bool,

    /// Print the PNG as a data: URL instead of writing a file
    #[arg(long)]
    data_url: bool,
}

impl Cli {
    fn config(&self) -> CardConfig {
        CardConfig {
            fetch: FetchConfig {
                api_base_url: self.api_url.clone(),
                token: self.token.clone().filter(|t| !t.trim().is_empty()),
                timeout_ms: self.timeout_ms,
                ..FetchConfig::default()
            },
            size: CardSize {
                width: self.width,
                height: self.height,
                dpr: self.dpr,
            },
            fonts: FontConfig {
                regular: self.font.clone(),
                bold: self.bold_font.clone(),
            },
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = cli.config();
    if !(config.size.dpr.is_finite() && config.size.dpr > 0.0) {
        bail!("--dpr must be a positive finite number");
    }
    if config.size.device_pixels().is_none() {
        bail!(
            "{}x{} at {}x is not a usable image size (each edge must be 1..={} device pixels)",
            config.size.width,
            config.size.height,
            config.size.dpr,
            gitcard::MAX_DEVICE_EDGE
        );
    }

    let fetcher = Arc::new(ProfileFetcher::new(config.fetch.clone())?);
    let mut view = ViewController::new(fetcher);
    view.set_input(cli.login.as_str());
    view.submit();
    if let Some(err) = view.error() {
        bail!("{}", err);
    }
    let profile = view.profile().context("no profile loaded")?;

    if cli.text {
        print!("{}", TextSummary::from_profile(profile));
    }

    let fonts = FontSet::load(&config.fonts)?;
    let mut canvas = CardCanvas::new(RasterSurface::new(fonts), config.size);
    if cli.no_avatar {
        canvas.render(profile);
    } else {
        let task = view.render(&mut canvas).context("no profile loaded")?;
        let (slot, bytes) = task.wait();
        match bytes {
            Ok(bytes) => {
                canvas.paint_avatar(&slot, &bytes);
            }
            Err(e) => log::warn!("avatar unavailable: {}", e),
        }
    }

    if cli.data_url {
        println!("{}", canvas.export_png()?.data_url());
    } else {
        let path = view.export(&canvas, &cli.out)?;
        println!("{}", path.display());
    }
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    if let Err(e) = run(Cli::parse()) {
        eprintln!("gitcard: {:#}", e);
        std::process::exit(1);
    }
}
