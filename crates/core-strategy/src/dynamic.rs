//! Dynamic centralized tile queue.
//!
//! The coordinator walks the image in row-major tile order and hands each
//! worker a new tile the moment its previous result arrives. Work packets
//! are (x, y) tile origins; (−1, −1) is the termination sentinel. Result
//! packets are the compile-time-constant 3·Bw·Bh + 3 floats regardless of
//! clipping, so the coordinator's receive size never varies — clipped tiles
//! carry unused trailing pixels that assembly ignores.
//!
//! Worker state machine: IDLE → recv work → RENDER → send result → IDLE;
//! receiving the sentinel while IDLE terminates. A worker strictly
//! alternates send and recv, so at most one of its results is ever in
//! flight — which is what lets the coordinator pair "receive from anyone"
//! with "reply to exactly that rank".

use anyhow::Result;
use core_fabric::{Endpoint, TAG_RENDER};
use core_render::{Framebuffer, Region, TileCursor, render_region};
use core_scene::{SceneConfig, Shader};
use tracing::debug;

use crate::{Strategy, Timings};

/// Termination work packet.
pub const SENTINEL: [i32; 2] = [-1, -1];

/// Floats in a result packet: a full Bw×Bh tile plus (x, y, comp_time).
fn result_len(scene: &SceneConfig) -> usize {
    3 * scene.block_width as usize * scene.block_height as usize + 3
}

/// Copy one result packet into the framebuffer, clipping the tile to the
/// image edges, and return the worker's reported computation time.
fn assemble(scene: &SceneConfig, framebuffer: &mut Framebuffer, packet: &[f32]) -> f64 {
    let n = packet.len();
    let x = packet[n - 3] as u32;
    let y = packet[n - 2] as u32;
    let comp_time = packet[n - 1] as f64;

    let copy_width = scene.block_width.min(scene.width - x) as usize;
    let stride = 3 * scene.block_width as usize;
    for ry in 0..scene.block_height {
        let iy = y + ry;
        if iy >= scene.height {
            break;
        }
        let src = ry as usize * stride;
        framebuffer.copy_row(x, iy, &packet[src..src + 3 * copy_width]);
    }
    comp_time
}

pub struct CentralizedQueue;

impl Strategy for CentralizedQueue {
    fn run_coordinator(
        &self,
        scene: &SceneConfig,
        shader: &dyn Shader,
        endpoint: &Endpoint,
        framebuffer: &mut Framebuffer,
    ) -> Result<Timings> {
        let mut cursor = TileCursor::new(
            scene.width,
            scene.height,
            scene.block_width,
            scene.block_height,
        );

        // No workers to service: drain the queue locally.
        if endpoint.procs() == 1 {
            let comp_start = endpoint.wall_time();
            let clip = cursor;
            for (x, y) in cursor {
                let (w, h) = clip.clipped_size((x, y));
                let region = Region::in_image(x, y, w, h, scene.width, scene.height);
                render_region(shader, &region, framebuffer.data_mut());
            }
            return Ok(Timings {
                computation: endpoint.wall_time() - comp_start,
                communication: 0.0,
            });
        }

        let comm_start = endpoint.wall_time();
        let mut computation = 0.0f64;
        let result_len = result_len(scene);
        let mut outstanding = 0usize;

        // Prime every worker. Should the queue run dry first, the stragglers
        // get their sentinel immediately and never owe a result.
        for rank in 1..endpoint.procs() {
            match cursor.next() {
                Some((x, y)) => {
                    endpoint.send_ints(rank, TAG_RENDER, [x as i32, y as i32])?;
                    outstanding += 1;
                }
                None => endpoint.send_ints(rank, TAG_RENDER, SENTINEL)?,
            }
        }

        // Steady state: every received result immediately buys its sender
        // the next tile.
        while let Some((x, y)) = cursor.next() {
            let (packet, status) = endpoint.recv_floats_any(TAG_RENDER, result_len)?;
            endpoint.send_ints(status.source, TAG_RENDER, [x as i32, y as i32])?;
            computation += assemble(scene, framebuffer, &packet);
        }

        // Drain: one final result per in-flight tile, answered with the
        // sentinel, so every worker terminates exactly once.
        debug!(target: "strategy", outstanding, "tile_queue_exhausted_draining");
        for _ in 0..outstanding {
            let (packet, status) = endpoint.recv_floats_any(TAG_RENDER, result_len)?;
            endpoint.send_ints(status.source, TAG_RENDER, SENTINEL)?;
            computation += assemble(scene, framebuffer, &packet);
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
        let cursor = TileCursor::new(
            scene.width,
            scene.height,
            scene.block_width,
            scene.block_height,
        );
        let result_len = result_len(scene);
        loop {
            let work = endpoint.recv_ints(0, TAG_RENDER)?;
            if work == SENTINEL {
                debug!(target: "strategy", rank = endpoint.rank(), "sentinel_received");
                return Ok(());
            }

            let comp_start = endpoint.wall_time();
            let (x, y) = (work[0] as u32, work[1] as u32);
            let (w, h) = cursor.clipped_size((x, y));
            let mut packet = vec![0.0f32; result_len];
            let region = Region {
                x_in_image: x,
                y_in_image: y,
                x_in_pixels: 0,
                y_in_pixels: 0,
                width: w,
                height: h,
                pixels_width: scene.block_width,
                pixels_height: scene.block_height,
            };
            render_region(shader, &region, &mut packet[..result_len - 3]);
            let comp_time = endpoint.wall_time() - comp_start;

            packet[result_len - 3] = x as f32;
            packet[result_len - 2] = y as f32;
            packet[result_len - 1] = comp_time as f32;
            endpoint.send_floats(0, TAG_RENDER, packet)?;
        }
    }
}
