//! Static vertical strips.
//!
//! Rank r owns a contiguous strip of columns at full image height; the last
//! rank also takes the remainder columns. Workers send a single result
//! packet of [pixels…, comp_time]; the coordinator receives in increasing
//! rank order, which keeps assembly bookkeeping trivial at the cost of a
//! little reception overlap.

use anyhow::Result;
use core_fabric::{Endpoint, TAG_RENDER};
use core_render::{Framebuffer, Region, Strips, render_region};
use core_scene::{SceneConfig, Shader};

use crate::{Strategy, Timings};

pub struct VerticalStrips;

impl Strategy for VerticalStrips {
    fn run_coordinator(
        &self,
        scene: &SceneConfig,
        shader: &dyn Shader,
        endpoint: &Endpoint,
        framebuffer: &mut Framebuffer,
    ) -> Result<Timings> {
        let strips = Strips::new(scene.width, endpoint.procs());

        // Rank 0's strip goes straight into the final framebuffer.
        let comp_start = endpoint.wall_time();
        let own = Region::in_image(
            strips.x_origin(0),
            0,
            strips.width_of(0),
            scene.height,
            scene.width,
            scene.height,
        );
        render_region(shader, &own, framebuffer.data_mut());
        let mut computation = endpoint.wall_time() - comp_start;

        let comm_start = endpoint.wall_time();
        for rank in 1..endpoint.procs() {
            let width = strips.width_of(rank) as usize;
            let packet_len = 3 * width * scene.height as usize + 1;
            let packet = endpoint.recv_floats(rank, TAG_RENDER, packet_len)?;
            computation += packet[packet_len - 1] as f64;

            // The received strip is much narrower than the image, so copy
            // row by row into its column offset.
            let x = strips.x_origin(rank);
            for y in 0..scene.height {
                let row = 3 * y as usize * width;
                framebuffer.copy_row(x, y, &packet[row..row + 3 * width]);
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
        let comp_start = endpoint.wall_time();
        let strips = Strips::new(scene.width, endpoint.procs());
        let rank = endpoint.rank();

        let region = Region::tile(
            strips.x_origin(rank),
            0,
            strips.width_of(rank),
            scene.height,
        );
        // Trailing slot carries this rank's computation time.
        let mut packet = vec![0.0f32; region.pixels_len() + 1];
        render_region(shader, &region, &mut packet[..region.pixels_len()]);

        let comp_time = endpoint.wall_time() - comp_start;
        packet[region.pixels_len()] = comp_time as f32;
        endpoint.send_floats(0, TAG_RENDER, packet)?;
        Ok(())
    }
}
