use std::path::Path;
use std::rc::Rc;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use clap::Parser;
use lightbox::{
    Bitmap, ImageSource, LightboxConfig, PageController, PageListener, PageStatus, Size,
    SurfaceHandle, ThreadedLoader,
};
use tracing::{info, warn};
use url::Url;

/// Page through images in a headless lightbox
#[derive(Debug, Parser)]
#[command(name = "lightbox", about = "Headless lightbox gallery pager")]
struct Args {
    /// Viewport size the pages are laid out in
    #[arg(long, value_name = "WxH", value_parser = parse_viewport, default_value = "1280x800")]
    viewport: Size,

    /// Image paths or file:// URLs, shown in order
    #[arg(required = true, value_name = "IMAGE")]
    inputs: Vec<String>,
}

/// Give up on a single image after this long.
const LOAD_TIMEOUT: Duration = Duration::from_secs(30);

struct LogListener;

impl PageListener for LogListener {
    fn on_zoom_changed(&self, page: &PageStatus) {
        info!(page = page.page_id, scale = page.zoom_scale, frame = ?page.display_frame, "Zoom changed");
    }

    fn on_remote_image_loaded(&self, bitmap: Option<&Bitmap>, surface: &SurfaceHandle) {
        match bitmap {
            Some(b) => info!(width = b.width(), height = b.height(), frame = ?surface.borrow().frame(), "Image loaded"),
            None => warn!("Image did not load"),
        }
    }
}

fn parse_viewport(raw: &str) -> Result<Size> {
    let (w, h) = raw
        .split_once(['x', 'X'])
        .with_context(|| format!("viewport must look like 1280x800, got {raw:?}"))?;
    let width: f64 = w.trim().parse().context("invalid viewport width")?;
    let height: f64 = h.trim().parse().context("invalid viewport height")?;
    if width <= 0.0 || height <= 0.0 {
        bail!("viewport must be positive, got {raw:?}");
    }
    Ok(Size::new(width, height))
}

fn source_for_arg(arg: &str) -> Result<ImageSource> {
    if arg.contains("://") {
        return Ok(ImageSource::from_url_str(arg)?);
    }
    let path = Path::new(arg)
        .canonicalize()
        .with_context(|| format!("Failed to resolve image path: {arg}"))?;
    let url = Url::from_file_path(&path)
        .map_err(|()| anyhow::anyhow!("Not an absolute path: {:?}", path))?;
    Ok(ImageSource::from_url(url).with_caption(arg))
}

fn wait_for_load(page: &PageController, loader: &ThreadedLoader) -> Result<()> {
    let started = Instant::now();
    while page.is_loading() {
        if started.elapsed() > LOAD_TIMEOUT {
            bail!("timed out loading {:?}", page.caption());
        }
        loader.pump_timeout(Duration::from_millis(100));
    }
    Ok(())
}

/// Load the page, then zoom in and back out around the image centre.
fn show_page(page: &PageController, loader: &ThreadedLoader) -> Result<()> {
    wait_for_load(page, loader)?;
    let frame = page.display_frame()?;
    info!(caption = %page.caption(), phase = ?page.phase(), ?frame, "Page ready");

    let target = page.double_tap(frame.center())?;
    info!(scale = target.scale, rect = ?target.rect, "Double tap");
    page.double_tap(frame.center())?;
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("lightbox=info".parse()?),
        )
        .init();

    let config = LightboxConfig::from_env();
    let loader = Rc::new(ThreadedLoader::new(config.loader_workers));
    let listener = Rc::new(LogListener);

    let mut sources = args.inputs.iter().map(|arg| source_for_arg(arg));
    let first = sources.next().context("no input images")??;
    let page = PageController::builder(first, loader.clone())
        .config(config)
        .listener(&listener)
        .viewport(args.viewport)
        .build();

    show_page(&page, &loader)?;
    for source in sources {
        page.update(source?);
        show_page(&page, &loader)?;
    }

    page.teardown();
    Ok(())
}
