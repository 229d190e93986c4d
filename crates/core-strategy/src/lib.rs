//! Partitioning strategies and the coordinator/worker drivers.
//!
//! A [`Strategy`] owns one partitioning protocol end to end: which ranks
//! render which pixels, what flows over the fabric, and how the coordinator
//! reassembles a consistent framebuffer. The four distributed strategies and
//! the sequential reference implement the same two-operation trait, so the
//! drivers reduce to a dispatch on the configured mode; timing and console
//! reporting live in the driver, not in the strategies.

use anyhow::Result;
use core_fabric::Endpoint;
use core_render::Framebuffer;
use core_scene::{PartitionMode, SceneConfig, Shader};

pub mod blocks;
pub mod cluster;
pub mod cycles;
pub mod driver;
pub mod dynamic;
pub mod sequential;
pub mod strips;

pub use cluster::{RenderOutcome, render_local};
pub use driver::{Report, print_report, run_coordinator, run_worker};

/// Wall-clock intervals measured by a strategy's coordinator side.
/// `computation` sums the coordinator's own render interval with every
/// worker's reported interval; `communication` spans the result-gathering
/// phase, including any work-packet sends.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Timings {
    pub computation: f64,
    pub communication: f64,
}

/// One partitioning protocol. Both sides derive rank-to-pixel ownership
/// from the same layout math, so they can never disagree on who renders
/// what.
pub trait Strategy {
    /// Run the coordinator (rank 0) side: render rank 0's own share into
    /// `framebuffer`, gather every worker's result, assemble, and report
    /// the measured intervals.
    fn run_coordinator(
        &self,
        scene: &SceneConfig,
        shader: &dyn Shader,
        endpoint: &Endpoint,
        framebuffer: &mut Framebuffer,
    ) -> Result<Timings>;

    /// Run a worker (rank ≥ 1) side: render the tiles this rank owns and
    /// send them to the coordinator.
    fn run_worker(
        &self,
        scene: &SceneConfig,
        shader: &dyn Shader,
        endpoint: &Endpoint,
    ) -> Result<()>;
}

/// The strategy implementing `mode`.
pub fn strategy_for(mode: PartitionMode) -> Box<dyn Strategy> {
    match mode {
        PartitionMode::None => Box::new(sequential::Sequential),
        PartitionMode::StaticStripsVertical => Box::new(strips::VerticalStrips),
        PartitionMode::StaticBlocks => Box::new(blocks::SquareBlocks),
        PartitionMode::StaticCyclesHorizontal => Box::new(cycles::CyclicRows),
        PartitionMode::Dynamic => Box::new(dynamic::CentralizedQueue),
    }
}
