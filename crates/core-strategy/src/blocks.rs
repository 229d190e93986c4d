//! Static square blocks.
//!
//! S = ⌊√P⌋ and rank r < S² owns grid cell (r mod S, r div S); cells in
//! the last grid column and row absorb the division remainders. Ranks
//! beyond the grid are idle: they render nothing and exchange no messages,
//! so a non-square process count degrades capacity, never correctness.

use anyhow::Result;
use core_fabric::{Endpoint, TAG_RENDER};
use core_render::{BlockGrid, Framebuffer, Region, render_region};
use core_scene::{SceneConfig, Shader};
use tracing::debug;

use crate::{Strategy, Timings};

pub struct SquareBlocks;

impl Strategy for SquareBlocks {
    fn run_coordinator(
        &self,
        scene: &SceneConfig,
        shader: &dyn Shader,
        endpoint: &Endpoint,
        framebuffer: &mut Framebuffer,
    ) -> Result<Timings> {
        let grid = BlockGrid::new(scene.width, scene.height, endpoint.procs());

        let comp_start = endpoint.wall_time();
        let (x0, y0) = grid.origin(0);
        let (w, h) = grid.size_of(0);
        let own = Region::in_image(x0, y0, w, h, scene.width, scene.height);
        render_region(shader, &own, framebuffer.data_mut());
        let mut computation = endpoint.wall_time() - comp_start;

        let comm_start = endpoint.wall_time();
        for rank in (1..endpoint.procs()).filter(|&r| grid.in_grid(r)) {
            let (w, h) = grid.size_of(rank);
            let (w, h) = (w as usize, h as usize);
            let packet_len = 3 * w * h + 1;
            let packet = endpoint.recv_floats(rank, TAG_RENDER, packet_len)?;
            computation += packet[packet_len - 1] as f64;

            let (x0, y0) = grid.origin(rank);
            for ry in 0..h {
                let row = 3 * ry * w;
                framebuffer.copy_row(x0, y0 + ry as u32, &packet[row..row + 3 * w]);
            }
        }
        let communication = endpoint.wall_time() - comm_start;

        Ok(Timings {
            computation,
            communication,
        })
    }

    fn run_worker(
        &self,
        scene: &SceneConfig,
        shader: &dyn Shader,
        endpoint: &Endpoint,
    ) -> Result<()> {
        let grid = BlockGrid::new(scene.width, scene.height, endpoint.procs());
        let rank = endpoint.rank();
        if !grid.in_grid(rank) {
            debug!(target: "strategy", rank, side = grid.side(), "rank_outside_block_grid_idle");
            return Ok(());
        }

        let comp_start = endpoint.wall_time();
        let (x0, y0) = grid.origin(rank);
        let (w, h) = grid.size_of(rank);
        let region = Region::tile(x0, y0, w, h);
        let mut packet = vec![0.0f32; region.pixels_len() + 1];
        render_region(shader, &region, &mut packet[..region.pixels_len()]);

        let comp_time = endpoint.wall_time() - comp_start;
        packet[region.pixels_len()] = comp_time as f32;
        endpoint.send_floats(0, TAG_RENDER, packet)?;
        Ok(())
    }
}
