//! Coordinator and worker entry points.
//!
//! The drivers own everything the strategies share: framebuffer
//! allocation, total wall-clock measurement, structured logging of the
//! run, and the mandated stdout report. Strategies only measure their own
//! computation/communication intervals.

use anyhow::Result;
use core_fabric::Endpoint;
use core_render::Framebuffer;
use core_scene::{SceneConfig, Shader};
use std::path::Path;
use tracing::info;

use crate::strategy_for;

/// Timing report for one completed render.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Report {
    /// Wall time of the whole strategy run on the coordinator.
    pub execution: f64,
    /// Coordinator's own render interval plus every worker's reported one.
    pub computation: f64,
    /// The coordinator's result-gathering interval.
    pub communication: f64,
}

impl Report {
    /// Communication-to-computation ratio.
    pub fn ratio(&self) -> f64 {
        self.communication / self.computation
    }
}

/// Rank 0: allocate the framebuffer, run the configured strategy, and
/// measure the end-to-end wall time around it.
pub fn run_coordinator(
    scene: &SceneConfig,
    shader: &dyn Shader,
    endpoint: &Endpoint,
) -> Result<(Framebuffer, Report)> {
    let mut framebuffer = Framebuffer::new(scene.width, scene.height);
    let strategy = strategy_for(scene.mode);

    let start = endpoint.wall_time();
    let timings = strategy.run_coordinator(scene, shader, endpoint, &mut framebuffer)?;
    let execution = endpoint.wall_time() - start;

    let report = Report {
        execution,
        computation: timings.computation,
        communication: timings.communication,
    };
    info!(
        target: "driver",
        mode = scene.mode.name(),
        procs = endpoint.procs(),
        execution = report.execution,
        computation = report.computation,
        communication = report.communication,
        "render_complete"
    );
    Ok((framebuffer, report))
}

/// Rank ≥ 1: run the worker side of the configured strategy.
pub fn run_worker(scene: &SceneConfig, shader: &dyn Shader, endpoint: &Endpoint) -> Result<()> {
    strategy_for(scene.mode).run_worker(scene, shader, endpoint)
}

/// Print the run's timing block. Line wording and order are stable:
/// downstream tooling scrapes this output.
pub fn print_report(report: &Report, image_path: &Path) {
    println!("Execution Time: {} seconds", report.execution);
    println!("Image will be save to: {}", image_path.display());
    println!("Total Computation Time: {} seconds", report.computation);
    println!("Total Communication Time: {} seconds", report.communication);
    println!("C-to-C Ratio: {}", report.ratio());
}
