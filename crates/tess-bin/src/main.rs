//! Tessera entrypoint: load the scene, spin up the local render cluster,
//! report, persist.

use anyhow::Result;
use clap::Parser;
use core_strategy::{print_report, render_local};
use std::path::{Path, PathBuf};
use std::sync::Once;
use std::thread;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;

/// CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "tessera", version, about = "Partitioned parallel ray tracer")]
struct Args {
    /// Scene configuration path (overrides discovery of `tessera.toml`).
    #[arg(long = "config")]
    pub config: Option<PathBuf>,
    /// Rank count, coordinator included. Defaults to the machine's
    /// available parallelism.
    #[arg(long = "procs")]
    pub procs: Option<usize>,
    /// Directory the rendered image lands in.
    #[arg(long = "output-dir", default_value = "renders")]
    pub output_dir: PathBuf,
}

fn configure_logging() -> Option<WorkerGuard> {
    let log_dir = Path::new(".");
    let log_path = log_dir.join("tessera.log");
    if log_path.exists() {
        let _ = std::fs::remove_file(&log_path);
    }

    let file_appender = tracing_appender::rolling::never(log_dir, "tessera.log");
    let (nb_writer, guard) = tracing_appender::non_blocking(file_appender);
    match tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(nb_writer)
        .try_init()
    {
        Ok(_) => Some(guard),
        // Global tracing subscriber already installed; drop the guard so
        // the writer shuts down.
        Err(_err) => None,
    }
}

fn install_panic_hook() {
    static HOOK: Once = Once::new();
    HOOK.call_once(|| {
        let default_panic = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            tracing::error!(target: "runtime.panic", ?info, "panic");
            default_panic(info);
        }));
    });
}

fn main() -> Result<()> {
    let _log_guard = configure_logging();
    install_panic_hook();
    info!(target: "runtime", "startup");

    let args = Args::parse();
    let scene = core_scene::load_from(args.config.clone())?;
    let procs = args
        .procs
        .unwrap_or_else(|| thread::available_parallelism().map_or(1, |n| n.get()));

    info!(
        target: "runtime.startup",
        width = scene.width,
        height = scene.height,
        mode = scene.mode.name(),
        procs,
        config_override = args.config.is_some(),
        "bootstrap_complete"
    );

    let outcome = render_local(&scene, procs)?;
    let path = args.output_dir.join(core_image::render_file_name(&scene));
    print_report(&outcome.report, &path);
    core_image::save_png(&path, &outcome.framebuffer)?;
    Ok(())
}
