#![deny(unsafe_code)]
//! Windowed harness that draws a full-screen quad with a user shader pair.
//!
//! The fragment shader sees `time` (milliseconds since start) and
//! `iResolution`; releasing the reload key rebuilds the program from disk.

mod app;
mod error;
mod logging;
mod window;

use app::HarnessApp;
use clap::Parser;
use error::CliError;
use logging::{init_logging, LoggingConfig};
use shader_harness_core::models::find_obj_files;
use shader_harness_core::HarnessConfig;
use std::path::PathBuf;
use std::process;
use winit::event_loop::EventLoop;

#[derive(Parser, Debug)]
#[command(name = "shader-harness", about = "Live OpenGL shader harness")]
struct Cli {
    /// JSON config file. Flags below override its values.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Vertex shader path.
    #[arg(long)]
    vertex: Option<PathBuf>,

    /// Fragment shader path.
    #[arg(long)]
    fragment: Option<PathBuf>,

    /// Window width in pixels.
    #[arg(short = 'W', long)]
    width: Option<u32>,

    /// Window height in pixels.
    #[arg(short = 'H', long)]
    height: Option<u32>,

    /// Redraws per second.
    #[arg(long)]
    fps: Option<u32>,

    /// Directory scanned for `.obj` models.
    #[arg(long)]
    models: Option<PathBuf>,

    /// Log filter (env_logger syntax), overrides RUST_LOG.
    #[arg(long)]
    log: Option<String>,

    /// Print the resolved config as JSON and exit.
    #[arg(long)]
    print_config: bool,
}

impl Cli {
    /// Loads the config file (or defaults) and applies flag overrides.
    fn resolve_config(&self) -> Result<HarnessConfig, CliError> {
        let mut config = match &self.config {
            Some(path) => HarnessConfig::load(path)?,
            None => HarnessConfig::default(),
        };

        if let Some(v) = &self.vertex {
            config.vertex_shader = v.clone();
        }
        if let Some(f) = &self.fragment {
            config.fragment_shader = f.clone();
        }
        if let Some(w) = self.width {
            config.width = w;
        }
        if let Some(h) = self.height {
            config.height = h;
        }
        if let Some(fps) = self.fps {
            config.frame_rate = fps;
        }
        if let Some(m) = &self.models {
            config.models_dir = m.clone();
        }

        config.validate()?;
        Ok(config)
    }
}

fn report_models(config: &HarnessConfig) {
    match find_obj_files(&config.models_dir) {
        Ok(files) => {
            log::debug!(
                "{} model(s) in {}",
                files.len(),
                config.models_dir.display()
            );
            for file in files {
                log::debug!("  {}", file.display());
            }
        }
        Err(e) => log::warn!("model discovery skipped: {e}"),
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config = cli.resolve_config()?;

    if cli.print_config {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    report_models(&config);

    let event_loop =
        EventLoop::new().map_err(|e| CliError::Window(format!("cannot create event loop: {e}")))?;
    let mut app = HarnessApp::new(config)?;
    event_loop
        .run_app(&mut app)
        .map_err(|e| CliError::Window(format!("event loop failed: {e}")))?;

    app.into_result()
}

fn main() {
    let cli = Cli::parse();
    init_logging(LoggingConfig {
        filter: cli.log.clone(),
        ..LoggingConfig::default()
    });

    if let Err(e) = run(cli) {
        log::error!("{e}");
        eprintln!("error: {e}");
        process::exit(e.exit_code());
    }
}
