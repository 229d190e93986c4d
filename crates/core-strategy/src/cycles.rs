//! Static cyclic horizontal strips.
//!
//! The image is cut into bands of `cycle_size` rows dealt round-robin:
//! band k belongs to rank k mod P. Each worker packs its bands contiguously
//! into a staging buffer sized for the worst-case band count (⌈N/P⌉ + 1
//! bands) and sends the whole buffer in one message, trading bandwidth for
//! a protocol with no per-worker size negotiation.

use anyhow::Result;
use core_fabric::{Endpoint, TAG_RENDER};
use core_render::{Bands, Framebuffer, Region, render_region};
use core_scene::{SceneConfig, Shader};

use crate::{Strategy, Timings};

/// Floats in a worker's constant-size packed buffer, plus the trailing
/// computation time.
fn packet_len(scene: &SceneConfig, bands: &Bands) -> usize {
    let rows = bands.max_bands_per_rank() * scene.cycle_size;
    3 * scene.width as usize * rows as usize + 1
}

pub struct CyclicRows;

impl Strategy for CyclicRows {
    fn run_coordinator(
        &self,
        scene: &SceneConfig,
        shader: &dyn Shader,
        endpoint: &Endpoint,
        framebuffer: &mut Framebuffer,
    ) -> Result<Timings> {
        let bands = Bands::new(scene.height, scene.cycle_size, endpoint.procs());

        // Rank 0's bands render straight into the framebuffer at their true
        // rows; no copy needed later.
        let comp_start = endpoint.wall_time();
        for band in bands.bands_of(0) {
            let region = Region::in_image(
                0,
                bands.y_origin(band),
                scene.width,
                bands.height_of(band),
                scene.width,
                scene.height,
            );
            render_region(shader, &region, framebuffer.data_mut());
        }
        let mut computation = endpoint.wall_time() - comp_start;

        let comm_start = endpoint.wall_time();
        let packet_len = packet_len(scene, &bands);
        let mut worker_buffers = Vec::with_capacity(endpoint.procs() - 1);
        for rank in 1..endpoint.procs() {
            let packet = endpoint.recv_floats(rank, TAG_RENDER, packet_len)?;
            computation += packet[packet_len - 1] as f64;
            worker_buffers.push(packet);
        }

        // Band 0 is the coordinator's; walk the rest in order, copying each
        // worker band out of its packed position.
        let row_floats = 3 * scene.width as usize;
        for band in 1..bands.count() {
            let owner = bands.owner(band);
            if owner == 0 {
                continue;
            }
            let buffer = &worker_buffers[owner - 1];
            let y0 = bands.y_origin(band);
            let packed_row0 = bands.local_index(band) * scene.cycle_size;
            for ry in 0..bands.height_of(band) {
                let src = (packed_row0 + ry) as usize * row_floats;
                framebuffer.copy_row(0, y0 + ry, &buffer[src..src + row_floats]);
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
        let bands = Bands::new(scene.height, scene.cycle_size, endpoint.procs());
        let rank = endpoint.rank();

        let packet_len = packet_len(scene, &bands);
        let pixels_len = packet_len - 1;
        let pixels_height = bands.max_bands_per_rank() * scene.cycle_size;
        // The buffer is sent whole even when the tail rows are unused; the
        // coordinator only reads the bands this rank actually owns.
        let mut packet = vec![0.0f32; packet_len];
        for band in bands.bands_of(rank) {
            let region = Region {
                x_in_image: 0,
                y_in_image: bands.y_origin(band),
                x_in_pixels: 0,
                y_in_pixels: bands.local_index(band) * scene.cycle_size,
                width: scene.width,
                height: bands.height_of(band),
                pixels_width: scene.width,
                pixels_height,
            };
            render_region(shader, &region, &mut packet[..pixels_len]);
        }

        let comp_time = endpoint.wall_time() - comp_start;
        packet[pixels_len] = comp_time as f32;
        endpoint.send_floats(0, TAG_RENDER, packet)?;
        Ok(())
    }
}
