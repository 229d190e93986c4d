//! Single-process reference: the coordinator shades the whole image itself.

use anyhow::Result;
use core_fabric::Endpoint;
use core_render::{Framebuffer, Region, render_region};
use core_scene::{SceneConfig, Shader};

use crate::{Strategy, Timings};

pub struct Sequential;

impl Strategy for Sequential {
    fn run_coordinator(
        &self,
        scene: &SceneConfig,
        shader: &dyn Shader,
        endpoint: &Endpoint,
        framebuffer: &mut Framebuffer,
    ) -> Result<Timings> {
        let comp_start = endpoint.wall_time();
        let region = Region::in_image(0, 0, scene.width, scene.height, scene.width, scene.height);
        render_region(shader, &region, framebuffer.data_mut());
        Ok(Timings {
            computation: endpoint.wall_time() - comp_start,
            communication: 0.0,
        })
    }

    fn run_worker(
        &self,
        _scene: &SceneConfig,
        _shader: &dyn Shader,
        _endpoint: &Endpoint,
    ) -> Result<()> {
        // Sequential operation: workers have nothing to do.
        Ok(())
    }
}
