use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};

use viewfinder::camera::LogicalCamera;
use viewfinder::capture::{CaptureController, Frame, FrameObserver};
use viewfinder::config::Config;
use viewfinder::preview::{PreviewLayer, PreviewSurface};
use viewfinder::registry;

/// Parse a logical camera name
fn parse_camera(s: &str) -> Result<LogicalCamera, String> {
    LogicalCamera::from_str(s)
        .ok_or_else(|| format!("Unknown camera '{}'. Available cameras: front, back", s))
}

/// viewfinder: live camera capture with switching and frame delivery
#[derive(Parser)]
#[command(name = "viewfinder")]
#[command(version, about = "Live camera capture with switching and frame delivery")]
#[command(after_help = "EXAMPLES:
    # List available camera devices
    viewfinder list-devices

    # Capture from the front camera until Ctrl+C
    viewfinder run

    # Capture from the back camera for 10 seconds
    viewfinder run --camera back --duration 10

    # Switch between cameras every 5 seconds
    viewfinder run --switch-every 5")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List available camera devices
    ListDevices,

    /// Run a live capture, printing frame statistics
    Run {
        /// Camera to start with (front or back)
        #[arg(long, short = 'c', value_parser = parse_camera)]
        camera: Option<LogicalCamera>,

        /// Stop after this many seconds (0 = run until Ctrl+C)
        #[arg(long, short = 'd', default_value_t = 0)]
        duration: u64,

        /// Switch cameras every N seconds (0 = never)
        #[arg(long, default_value_t = 0)]
        switch_every: u64,

        /// Custom config file path (default: ~/.config/viewfinder/config.toml)
        #[arg(long)]
        config: Option<String>,
    },
}

static CTRLC_RECEIVED: AtomicBool = AtomicBool::new(false);

/// Check if Ctrl+C has been received
fn ctrlc_received() -> bool {
    CTRLC_RECEIVED.load(Ordering::SeqCst)
}

/// Set up the Ctrl+C handler
fn setup_ctrlc_handler() -> Result<(), ctrlc::Error> {
    ctrlc::set_handler(move || {
        CTRLC_RECEIVED.store(true, Ordering::SeqCst);
        eprintln!("\nReceived Ctrl+C, shutting down...");
    })
}

/// Frame consumer that tallies deliveries for the status line.
struct FrameStats {
    frames: AtomicU64,
    last_timestamp_ms: AtomicU64,
}

impl FrameStats {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            frames: AtomicU64::new(0),
            last_timestamp_ms: AtomicU64::new(0),
        })
    }
}

impl FrameObserver for FrameStats {
    fn on_frame(&self, frame: &Frame) {
        self.frames.fetch_add(1, Ordering::Relaxed);
        self.last_timestamp_ms
            .store(frame.timestamp_ms.max(0) as u64, Ordering::Relaxed);
    }
}

/// Preview host that just keeps the layer for polling.
#[derive(Default)]
struct StatusSurface {
    layer: Option<PreviewLayer>,
}

impl PreviewSurface for StatusSurface {
    fn insert_preview_layer(&mut self, layer: PreviewLayer) {
        self.layer = Some(layer);
    }
}

fn run_list_devices() -> Result<(), String> {
    let devices = registry::list_devices().map_err(|e| e.to_string())?;

    if devices.is_empty() {
        println!("No camera devices found.");
        return Ok(());
    }

    println!("Camera devices:");
    for device in &devices {
        println!("  {}", device);
    }
    Ok(())
}

fn run_capture(
    camera: Option<LogicalCamera>,
    duration: u64,
    switch_every: u64,
    config_path: Option<String>,
) -> Result<(), String> {
    let config = match config_path {
        Some(path) => Config::load_from_explicit(path).map_err(|e| e.to_string())?,
        None => Config::load().map_err(|e| e.to_string())?,
    };

    let camera = camera.unwrap_or_else(|| config.default_camera());

    if let Err(e) = setup_ctrlc_handler() {
        eprintln!("Warning: Could not set up Ctrl+C handler: {}", e);
    }

    let stats = FrameStats::new();
    let mut surface = StatusSurface::default();
    let controller = CaptureController::new(
        Arc::downgrade(&stats) as std::sync::Weak<dyn FrameObserver>,
        &mut surface,
        config.output_format(),
    );
    let layer = surface.layer.expect("controller inserts the preview layer");

    controller.start_capture(camera);
    println!("Capturing from {} camera... (Ctrl+C to stop)", camera);

    let started = Instant::now();
    let mut last_switch = Instant::now();
    let mut last_report = Instant::now();

    loop {
        if ctrlc_received() {
            break;
        }
        if duration > 0 && started.elapsed() >= Duration::from_secs(duration) {
            break;
        }

        if switch_every > 0 && last_switch.elapsed() >= Duration::from_secs(switch_every) {
            controller.switch_camera();
            last_switch = Instant::now();
            println!("Switched to {} camera", controller.current_camera());
        }

        if last_report.elapsed() >= Duration::from_secs(1) {
            let frames = stats.frames.load(Ordering::Relaxed);
            let last_ts = stats.last_timestamp_ms.load(Ordering::Relaxed);
            let preview = layer
                .latest_frame()
                .map(|f| format!("{}x{} rot {}", f.width, f.height, f.rotation))
                .unwrap_or_else(|| "no frame yet".to_string());
            println!(
                "  [{}] {} frames delivered (last at {}ms), preview: {}",
                controller.current_camera(),
                frames,
                last_ts,
                preview
            );
            last_report = Instant::now();
        }

        std::thread::sleep(Duration::from_millis(50));
    }

    controller.stop_capture();
    let frames = stats.frames.load(Ordering::Relaxed);
    println!("Capture stopped. {} frames delivered.", frames);
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::ListDevices => run_list_devices(),
        Commands::Run {
            camera,
            duration,
            switch_every,
            config,
        } => run_capture(camera, duration, switch_every, config),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
