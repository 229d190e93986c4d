//! End-to-end cluster scenarios, one per protocol corner.

mod common;

use common::{assert_frames_equal, gradient_scene, reference, render};
use core_scene::PartitionMode;

#[test]
fn sequential_baseline_matches_closed_form() {
    // 8×8, one rank: pixel (x, y) must be exactly (x/8, y/8, 0).
    let outcome = render(&gradient_scene(8, 8, PartitionMode::None), 1);
    for y in 0..8u32 {
        for x in 0..8u32 {
            assert_eq!(
                outcome.framebuffer.pixel(x, y),
                [x as f32 / 8.0, y as f32 / 8.0, 0.0]
            );
        }
    }
    assert_eq!(outcome.messages.float_messages, 0);
    assert_eq!(outcome.messages.int_messages, 0);
}

#[test]
fn vertical_strips_with_remainder_columns() {
    // W=10, P=3: strips of width 3, 3, 4; assembly must be seamless.
    let outcome = render(&gradient_scene(10, 4, PartitionMode::StaticStripsVertical), 3);
    assert_frames_equal(&outcome.framebuffer, &reference(10, 4));
}

#[test]
fn square_blocks_perfect_grid() {
    // 8×8, P=4: S=2, four 4×4 blocks.
    let outcome = render(&gradient_scene(8, 8, PartitionMode::StaticBlocks), 4);
    assert_frames_equal(&outcome.framebuffer, &reference(8, 8));
}

#[test]
fn cyclic_rows_with_short_last_band() {
    // H=10, C=3, P=3: bands at rows 0,3,6,9 owned by ranks 0,1,2,0; the
    // last band is a single row.
    let mut scene = gradient_scene(4, 10, PartitionMode::StaticCyclesHorizontal);
    scene.cycle_size = 3;
    let outcome = render(&scene, 3);
    assert_frames_equal(&outcome.framebuffer, &reference(4, 10));
}

#[test]
fn dynamic_services_every_worker() {
    // 16×16 with 8×8 tiles and 2 workers: 4 tiles, 2 primers, 2 follow-up
    // tiles, 2 sentinels.
    let mut scene = gradient_scene(16, 16, PartitionMode::Dynamic);
    scene.block_width = 8;
    scene.block_height = 8;
    let outcome = render(&scene, 3);
    assert_frames_equal(&outcome.framebuffer, &reference(16, 16));
    assert_eq!(outcome.messages.float_messages, 4);
    assert_eq!(outcome.messages.int_messages, 6);
}

#[test]
fn dynamic_clips_edge_tiles() {
    // 10×10 with 4×4 tiles: nine tiles, the right column clipped to width
    // 2 and the bottom row clipped to height 2.
    let mut scene = gradient_scene(10, 10, PartitionMode::Dynamic);
    scene.block_width = 4;
    scene.block_height = 4;
    let outcome = render(&scene, 2);
    assert_frames_equal(&outcome.framebuffer, &reference(10, 10));
    assert_eq!(outcome.messages.float_messages, 9);
    assert_eq!(outcome.messages.int_messages, 10);
}

#[test]
fn dynamic_with_more_workers_than_tiles() {
    // One 8×8 tile and five ranks: extra workers are primed straight with
    // the sentinel and the run still terminates cleanly.
    let mut scene = gradient_scene(8, 8, PartitionMode::Dynamic);
    scene.block_width = 8;
    scene.block_height = 8;
    let outcome = render(&scene, 5);
    assert_frames_equal(&outcome.framebuffer, &reference(8, 8));
    assert_eq!(outcome.messages.float_messages, 1);
    // 1 tile + P−1 = 5 work packets in total.
    assert_eq!(outcome.messages.int_messages, 5);
}

#[test]
fn invalid_scene_is_refused() {
    let mut scene = gradient_scene(10, 10, PartitionMode::Dynamic);
    scene.block_width = 11;
    assert!(core_strategy::render_local(&scene, 2).is_err());
}
