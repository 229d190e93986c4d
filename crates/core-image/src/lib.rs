//! Framebuffer persistence.
//!
//! Converts the coordinator's linear-RGB f32 framebuffer to 8-bit and
//! writes it as PNG, and generates the output file name the driver reports.

use anyhow::{Context, Result};
use core_render::Framebuffer;
use core_scene::SceneConfig;
use image::{ImageBuffer, Rgb};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::info;

fn to_byte(channel: f32) -> u8 {
    (channel.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Write `framebuffer` as an 8-bit RGB PNG at `path`, creating missing
/// parent directories. Channels are clamped to [0, 1]; no gamma is applied.
pub fn save_png(path: &Path, framebuffer: &Framebuffer) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating output directory {}", parent.display()))?;
    }

    let bytes: Vec<u8> = framebuffer.data().iter().copied().map(to_byte).collect();
    let img: ImageBuffer<Rgb<u8>, _> =
        ImageBuffer::from_raw(framebuffer.width(), framebuffer.height(), bytes)
            .context("framebuffer length disagrees with its dimensions")?;
    img.save(path)
        .with_context(|| format!("writing image {}", path.display()))?;
    info!(
        target: "image",
        path = %path.display(),
        width = framebuffer.width(),
        height = framebuffer.height(),
        "image_saved"
    );
    Ok(())
}

/// Output file name for one render: dimensions, partitioning mode, and a
/// wall-clock stamp so consecutive runs never collide.
pub fn render_file_name(scene: &SceneConfig) -> String {
    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    format!(
        "render_{}x{}_{}_{stamp}.png",
        scene.width,
        scene.height,
        scene.mode.name()
    )
}
