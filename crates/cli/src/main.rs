use std::path::{Path, PathBuf};
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use clap::Parser;

use laser_points_core::pipeline::detect_points_use_case::DetectPointsUseCase;
use laser_points_core::pipeline::pipeline_logger::StdoutPipelineLogger;
use laser_points_core::pipeline::points_detector_node::PointsDetectorNode;
use laser_points_core::shared::settings::Settings;
use laser_points_core::transport::domain::frame_publisher::FramePublisher;
use laser_points_core::transport::domain::frame_source::FrameSource;
use laser_points_core::transport::domain::preview_sink::PreviewSink;
use laser_points_core::transport::infrastructure::image_file_preview_sink::ImageFilePreviewSink;
use laser_points_core::transport::infrastructure::image_file_publisher::ImageFilePublisher;
use laser_points_core::transport::infrastructure::image_file_source::ImageFileSource;
use laser_points_core::transport::infrastructure::topic::{
    topic, OverflowPolicy, TopicPublisher, TopicSubscriber,
};
use laser_points_core::vision::domain::frame_annotator::FrameAnnotator;
use laser_points_core::vision::domain::region_masker::RegionMasker;
use laser_points_core::vision::infrastructure::overlay_annotator::OverlayAnnotator;
use laser_points_core::vision::infrastructure::simple_blob_detector::SimpleBlobDetector;

/// Depth of the camera topic between the file reader and the node.
const INPUT_QUEUE_SIZE: usize = 10;

type SendError = Box<dyn std::error::Error + Send + Sync>;

/// Cancel flag of the running node, raised from the SIGINT handler.
#[cfg(unix)]
static INTERRUPT_FLAG: std::sync::OnceLock<Arc<AtomicBool>> = std::sync::OnceLock::new();

/// Laser point detector node replaying camera frames from image files.
#[derive(Parser, Debug)]
#[command(name = "points-detector")]
struct Cli {
    /// Image file or directory of images, replayed in file-name order.
    input: PathBuf,

    /// Directory receiving the published masks (frame_NNNNNN.png).
    output: PathBuf,

    /// JSON settings file (default: <config dir>/laser-points/settings.json).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Save annotated overlays and original frames to this directory.
    #[arg(long)]
    preview: Option<PathBuf>,

    /// Threshold cutoff: pixels darker than this become foreground.
    #[arg(long)]
    threshold: Option<u8>,

    /// Outline the regions of interest in the preview.
    #[arg(long)]
    draw_rois: bool,

    /// Draw vertical guide lines through the first two points in the preview.
    #[arg(long)]
    draw_guides: bool,

    /// Node name used in log output.
    #[arg(long)]
    node_name: Option<String>,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let mut settings = match &cli.config {
        Some(path) => Settings::load_from(path)?,
        None => Settings::load(),
    };
    apply_overrides(&cli, &mut settings);
    settings.validate()?;

    if cli.preview.is_none() && (settings.preview.draw_regions || settings.preview.draw_guide_lines) {
        log::warn!("overlay options have no effect without --preview");
    }

    let source = ImageFileSource::open(&settings.input_topic, &cli.input)?;
    let file_publisher = ImageFilePublisher::new(&settings.output_topic, &cli.output)?;
    let (input_pub, mut input_sub) =
        topic(&settings.input_topic, INPUT_QUEUE_SIZE, OverflowPolicy::Block);
    let (mut output_pub, output_sub) = topic(
        &settings.output_topic,
        settings.queue_size,
        OverflowPolicy::DropOldest,
    );

    let mut node = build_node(&settings, cli.preview.as_deref())?;
    let cancelled = node.cancel_handle();
    install_interrupt_handler(cancelled.clone());

    let reader_handle = spawn_reader(source, input_pub, cancelled.clone());
    let writer_handle = spawn_writer(output_sub, file_publisher);

    let spun = node.spin(&mut input_sub, &mut output_pub);
    if spun.is_err() {
        cancelled.store(true, Ordering::Relaxed);
    }

    let replayed = reader_handle
        .join()
        .map_err(|_| "Reader thread panicked")?;
    let written = writer_handle
        .join()
        .map_err(|_| "Writer thread panicked")?
        .map_err(|e| e.to_string())?;
    let stats = spun?;

    log::info!(
        "Replayed {replayed} frame(s); {} mask(s) published, {} dropped from a full queue, {written} written to {}",
        stats.published,
        output_pub.dropped(),
        cli.output.display()
    );
    if stats.dropped > 0 || stats.publish_failures > 0 {
        log::warn!(
            "{} frame(s) dropped, {} publish failure(s)",
            stats.dropped,
            stats.publish_failures
        );
    }
    Ok(())
}

fn apply_overrides(cli: &Cli, settings: &mut Settings) {
    if let Some(cutoff) = cli.threshold {
        settings.threshold.cutoff = cutoff;
    }
    if cli.draw_rois {
        settings.preview.draw_regions = true;
    }
    if cli.draw_guides {
        settings.preview.draw_guide_lines = true;
    }
    if let Some(name) = &cli.node_name {
        settings.node_name = name.clone();
    }
}

fn build_node(
    settings: &Settings,
    preview_dir: Option<&Path>,
) -> Result<PointsDetectorNode, Box<dyn std::error::Error>> {
    let preview: Option<Box<dyn PreviewSink>> = match preview_dir {
        Some(dir) => Some(Box::new(ImageFilePreviewSink::new(dir)?)),
        None => None,
    };
    let annotator: Option<Box<dyn FrameAnnotator>> = match preview {
        Some(_) => Some(Box::new(OverlayAnnotator::new(
            settings.regions.clone(),
            settings.preview.draw_regions,
            settings.preview.draw_guide_lines,
        ))),
        None => None,
    };

    let use_case = DetectPointsUseCase::new(
        settings.threshold,
        RegionMasker::new(settings.regions.clone()),
        Box::new(SimpleBlobDetector::new(settings.detector.clone())),
        annotator,
        preview,
        Box::new(StdoutPipelineLogger::default()),
    );
    Ok(PointsDetectorNode::new(&settings.node_name, use_case, None))
}

/// Stops the node between frames on the first Ctrl-C; a second one kills the process.
#[cfg(unix)]
fn install_interrupt_handler(cancelled: Arc<AtomicBool>) {
    if INTERRUPT_FLAG.set(cancelled).is_err() {
        log::warn!("Interrupt handler already installed");
        return;
    }
    let handler = on_interrupt as extern "C" fn(libc::c_int) as libc::sighandler_t;
    // SAFETY: the handler only stores to an atomic and resets the disposition,
    // both async-signal-safe.
    if unsafe { libc::signal(libc::SIGINT, handler) } == libc::SIG_ERR {
        log::warn!("Cannot handle Ctrl-C; interrupting will skip the shutdown summary");
    }
}

#[cfg(not(unix))]
fn install_interrupt_handler(_cancelled: Arc<AtomicBool>) {
    log::debug!("Ctrl-C stops the process immediately on this platform");
}

#[cfg(unix)]
extern "C" fn on_interrupt(_signal: libc::c_int) {
    if let Some(flag) = INTERRUPT_FLAG.get() {
        flag.store(true, Ordering::Relaxed);
    }
    // SAFETY: restoring the default disposition is async-signal-safe.
    unsafe {
        libc::signal(libc::SIGINT, libc::SIG_DFL);
    }
}

/// Decodes image files into the camera topic until done or cancelled.
fn spawn_reader(
    mut source: ImageFileSource,
    mut publisher: TopicPublisher,
    cancelled: Arc<AtomicBool>,
) -> JoinHandle<usize> {
    std::thread::spawn(move || {
        let mut replayed = 0;
        for item in source.messages() {
            if cancelled.load(Ordering::Relaxed) {
                break;
            }
            let message = match item {
                Ok(message) => message,
                Err(e) => {
                    log::warn!("Skipping unreadable image: {e}");
                    continue;
                }
            };
            if let Err(e) = publisher.publish(&message) {
                log::debug!("Reader stopping: {e}");
                break;
            }
            replayed += 1;
        }
        source.close();
        if let Err(e) = publisher.close() {
            log::debug!("Reader close failed: {e}");
        }
        replayed
    })
}

/// Drains the mask topic into image files.
fn spawn_writer(
    mut subscriber: TopicSubscriber,
    mut publisher: ImageFilePublisher,
) -> JoinHandle<Result<usize, SendError>> {
    std::thread::spawn(move || {
        for item in subscriber.messages() {
            let message = item.map_err(|e| e.to_string())?;
            if let Err(e) = publisher.publish(&message) {
                log::warn!("Failed to write mask {}: {e}", message.seq);
            }
        }
        publisher.close().map_err(|e| e.to_string())?;
        Ok(publisher.written())
    })
}
