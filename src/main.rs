use std::error::Error;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, SystemTime};

use bpaf::Bpaf;
use kontrol_display_core::RawBitmap;
use kontrol_mk2::{DisplayDriver, DisplayLayout, SendOutcome};
use tokio::time::MissedTickBehavior;
use tracing::level_filters::LevelFilter;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::detection::{device_kind, DeviceKind};
use crate::dump::DumpTransport;
use crate::media::{load_bitmap, Color};

mod config;
mod detection;
mod dump;
mod media;

#[derive(Clone, Debug, Bpaf)]
struct MediaArgs {
    /// Use nearest neighbor interpolation when resizing, otherwise uses gaussian
    #[bpaf(short('n'), long("nearest"))]
    nearest: bool,
    /// Background color for transparent images, defaults to the config value
    #[bpaf(short, long, argument("COLOR"), optional)]
    bg: Option<Color>,
    /// Path to the image to display
    #[bpaf(positional("PATH"), guard(|p| p.exists(), "file not found"))]
    path: PathBuf,
}

#[derive(Clone, Debug, Bpaf)]
enum Command {
    /// Encode an image and write the transfer buffers to a file
    #[bpaf(command)]
    Encode {
        /// Output file for the encoded packet stream
        #[bpaf(short, long, argument("OUT"))]
        output: PathBuf,
        #[bpaf(external)]
        media_args: MediaArgs,
    },
    /// Send an image to the keyboard once
    #[bpaf(command)]
    Send {
        #[bpaf(external)]
        media_args: MediaArgs,
    },
    /// Keep sending an image, picking up changes to the file
    #[bpaf(command)]
    Refresh {
        /// Resend interval, defaults to the config value
        #[bpaf(short, long, argument("DURATION"), optional)]
        interval: Option<humantime::Duration>,
        #[bpaf(external)]
        media_args: MediaArgs,
    },
}

#[derive(Clone, Debug, Bpaf)]
#[bpaf(options, version, descr(env!("CARGO_PKG_DESCRIPTION")))]
struct Cli {
    /// Enable debug logging
    #[bpaf(short, long)]
    verbose: bool,
    #[bpaf(external(device_kind))]
    device: DeviceKind,
    #[bpaf(external(command))]
    command: Command,
}

/// Image source that reloads when the file changes on disk
struct Source {
    args: MediaArgs,
    background: Color,
    nearest: bool,
    size: (u32, u32),
    cached: Mutex<Option<(SystemTime, Arc<RawBitmap>)>>,
}

impl Source {
    fn new(args: MediaArgs, config: &Config, layout: &DisplayLayout) -> Result<Self, Box<dyn Error>> {
        let background = match args.bg {
            Some(bg) => bg,
            None => config.media.background_color.parse()?,
        };
        Ok(Self {
            nearest: args.nearest || config.media.use_nearest_neighbor,
            args,
            background,
            size: layout.surface_size(),
            cached: Mutex::new(None),
        })
    }

    /// Current bitmap, decoding the file again only if it was modified
    fn bitmap(&self) -> Result<Arc<RawBitmap>, Box<dyn Error>> {
        let modified = std::fs::metadata(&self.args.path)?.modified()?;
        let hit = match &*self.cached.lock().unwrap_or_else(PoisonError::into_inner) {
            Some((at, bitmap)) if *at == modified => Some(bitmap.clone()),
            _ => None,
        };
        if let Some(bitmap) = hit {
            return Ok(bitmap);
        }

        // decode without holding the cache lock
        let (width, height) = self.size;
        debug!("decoding {}", self.args.path.display());
        let bitmap = Arc::new(load_bitmap(
            &self.args.path,
            self.background,
            self.nearest,
            width,
            height,
        )?);
        let mut cached = self.cached.lock().unwrap_or_else(PoisonError::into_inner);
        *cached = Some((modified, bitmap.clone()));
        Ok(bitmap)
    }
}

fn report(outcome: SendOutcome) -> Result<(), Box<dyn Error>> {
    match outcome {
        SendOutcome::Sent { writes } => {
            info!("sent frame in {writes} transfers");
            Ok(())
        },
        outcome => Err(format!("frame was not sent: {outcome:?}").into()),
    }
}

/// Resend the image on every tick until interrupted
async fn refresh(
    driver: Arc<DisplayDriver>,
    source: Arc<Source>,
    period: Duration,
) -> Result<(), Box<dyn Error>> {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    info!("refreshing every {}", humantime::format_duration(period));

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let (driver, source) = (driver.clone(), source.clone());
                // Not awaited: a tick that lands on a slow transfer is dropped by the driver
                tokio::task::spawn_blocking(move || {
                    let bitmap = match source.bitmap() {
                        Ok(bitmap) => bitmap,
                        Err(e) => {
                            warn!("failed to load image: {e}");
                            return;
                        },
                    };
                    match driver.send(&*bitmap) {
                        SendOutcome::Sent { .. } => {},
                        SendOutcome::Dropped => debug!("previous frame still in flight"),
                        outcome => warn!("frame was not sent: {outcome:?}"),
                    }
                });
            }
            _ = tokio::signal::ctrl_c() => {
                info!("stopping");
                return Ok(());
            }
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = cli().run();
    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose {
            LevelFilter::DEBUG
        } else {
            LevelFilter::INFO
        })
        .init();

    let config = Config::load_or_create()?;
    let layout = config.display.layout()?;

    match cli.command {
        Command::Encode { output, media_args } => {
            let source = Source::new(media_args, &config, &layout)?;
            let bitmap = source.bitmap()?;
            let dump = Arc::new(DumpTransport::create(&output)?);
            let driver = DisplayDriver::new(layout, dump.clone());
            report(driver.send(&*bitmap))?;
            info!(
                "wrote {} bytes to {}",
                dump.bytes_written(),
                output.display()
            );
            Ok(())
        },
        Command::Send { media_args } => {
            let source = Source::new(media_args, &config, &layout)?;
            let bitmap = source.bitmap()?;
            let (transport, device) = cli.device.open()?;
            info!("connected to {}", device.name);
            let driver = DisplayDriver::new(layout, transport);
            report(driver.send(&*bitmap))
        },
        Command::Refresh {
            interval,
            media_args,
        } => {
            let source = Arc::new(Source::new(media_args, &config, &layout)?);
            let (transport, device) = cli.device.open()?;
            info!("connected to {}", device.name);
            let driver = Arc::new(DisplayDriver::new(layout, transport));
            let period = interval.map_or(config.refresh.interval, Into::into);

            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(refresh(driver, source, period))
        },
    }
}

#[cfg(test)]
mod tests {
    use image::{Rgba, RgbaImage};
    use kontrol_display_core::Bitmap;

    use super::*;

    fn source_for(path: PathBuf) -> Source {
        let args = MediaArgs {
            nearest: true,
            bg: Some(Color([0, 0, 0])),
            path,
        };
        let layout = DisplayLayout::single(4, 2).unwrap();
        Source::new(args, &Config::default(), &layout).unwrap()
    }

    #[test]
    fn source_reuses_unchanged_image() {
        let path = std::env::temp_dir().join(format!("kontrol-source-{}.png", std::process::id()));
        RgbaImage::from_pixel(8, 4, Rgba([10, 20, 30, 255]))
            .save(&path)
            .unwrap();

        let source = source_for(path.clone());
        let first = source.bitmap().unwrap();
        assert_eq!((first.width(), first.height()), (4, 2));
        assert!(source.cached.try_lock().is_ok());

        let second = source.bitmap().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn missing_image_is_an_error() {
        let source = source_for(std::env::temp_dir().join("kontrol-source-missing.png"));
        assert!(source.bitmap().is_err());
        assert!(source.cached.lock().unwrap().is_none());
    }
}
