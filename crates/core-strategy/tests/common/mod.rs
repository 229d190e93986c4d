use core_render::Framebuffer;
use core_scene::{PartitionMode, SceneConfig};
use core_strategy::{RenderOutcome, render_local};

/// A scene using the exactly-predictable gradient kernel.
pub fn gradient_scene(width: u32, height: u32, mode: PartitionMode) -> SceneConfig {
    let mut scene = SceneConfig::default();
    scene.width = width;
    scene.height = height;
    scene.mode = mode;
    scene.shader.kind = "gradient".into();
    scene
}

pub fn render(scene: &SceneConfig, procs: usize) -> RenderOutcome {
    render_local(scene, procs).expect("cluster render")
}

/// The NONE-mode single-rank framebuffer every strategy must reproduce.
pub fn reference(width: u32, height: u32) -> Framebuffer {
    render(&gradient_scene(width, height, PartitionMode::None), 1).framebuffer
}

pub fn assert_frames_equal(actual: &Framebuffer, expected: &Framebuffer) {
    assert_eq!(actual.width(), expected.width());
    assert_eq!(actual.height(), expected.height());
    for y in 0..expected.height() {
        for x in 0..expected.width() {
            assert_eq!(
                actual.pixel(x, y),
                expected.pixel(x, y),
                "pixel ({x}, {y}) differs"
            );
        }
    }
}
