//! Run a full render cluster inside one process.
//!
//! Spawns one thread per worker rank, runs the coordinator on the calling
//! thread, and joins everything before returning. Each rank builds its own
//! shader instance from the shared scene, mirroring how address-space
//! isolated ranks would each construct theirs.

use anyhow::{Context, Result, anyhow};
use core_fabric::{FabricMetricsSnapshot, LocalCluster};
use core_render::Framebuffer;
use core_scene::{SceneConfig, build_shader};
use std::thread;
use tracing::debug;

use crate::driver;
pub use crate::driver::Report;

/// Everything a completed cluster run produces.
#[derive(Debug)]
pub struct RenderOutcome {
    pub framebuffer: Framebuffer,
    pub report: Report,
    /// Fabric message counters for the whole run.
    pub messages: FabricMetricsSnapshot,
}

/// Validate the scene and render it with `procs` ranks.
pub fn render_local(scene: &SceneConfig, procs: usize) -> Result<RenderOutcome> {
    scene
        .validate(procs)
        .with_context(|| format!("invalid scene for mode {}", scene.mode.name()))?;

    let mut cluster = LocalCluster::new(procs);
    let coordinator = cluster.take_endpoint(0);

    let (framebuffer, report) = thread::scope(|scope| -> Result<(Framebuffer, Report)> {
        let mut workers = Vec::with_capacity(procs - 1);
        for rank in 1..procs {
            let endpoint = cluster.take_endpoint(rank);
            workers.push(scope.spawn(move || {
                let shader = build_shader(scene);
                debug!(target: "cluster", rank, "worker_started");
                driver::run_worker(scene, shader.as_ref(), &endpoint)
            }));
        }

        let shader = build_shader(scene);
        let result = driver::run_coordinator(scene, shader.as_ref(), &coordinator);

        for (index, worker) in workers.into_iter().enumerate() {
            worker
                .join()
                .map_err(|_| anyhow!("worker rank {} panicked", index + 1))??;
        }
        result
    })?;

    Ok(RenderOutcome {
        framebuffer,
        report,
        messages: cluster.metrics(),
    })
}
