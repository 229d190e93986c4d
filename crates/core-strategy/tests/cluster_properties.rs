//! Cross-strategy laws: pixel equivalence against the sequential
//! reference, exact message complexity, and timing sanity.

mod common;

use common::{assert_frames_equal, gradient_scene, reference, render};
use core_scene::PartitionMode;

const STRATEGIES: [PartitionMode; 4] = [
    PartitionMode::StaticStripsVertical,
    PartitionMode::StaticBlocks,
    PartitionMode::StaticCyclesHorizontal,
    PartitionMode::Dynamic,
];

/// Awkward dimensions on purpose: remainders in every direction.
fn sweep_scene(mode: PartitionMode) -> core_scene::SceneConfig {
    let mut scene = gradient_scene(13, 11, mode);
    scene.cycle_size = 2;
    scene.block_width = 3;
    scene.block_height = 5;
    scene
}

#[test]
fn every_strategy_matches_sequential_at_any_rank_count() {
    let expected = reference(13, 11);
    for mode in STRATEGIES {
        for procs in [1, 2, 3, 4, 5, 7, 9] {
            let outcome = render(&sweep_scene(mode), procs);
            assert_frames_equal(&outcome.framebuffer, &expected);
        }
    }
}

#[test]
fn static_strategies_send_one_float_message_per_worker() {
    for mode in [
        PartitionMode::StaticStripsVertical,
        PartitionMode::StaticCyclesHorizontal,
    ] {
        for procs in [2, 3, 5] {
            let outcome = render(&sweep_scene(mode), procs);
            assert_eq!(
                outcome.messages.float_messages,
                procs as u64 - 1,
                "{} with {procs} ranks",
                mode.name()
            );
            assert_eq!(outcome.messages.int_messages, 0);
        }
    }
}

#[test]
fn square_blocks_message_count_follows_the_grid() {
    // Square process count: every worker owns a cell and reports.
    let outcome = render(&sweep_scene(PartitionMode::StaticBlocks), 4);
    assert_eq!(outcome.messages.float_messages, 3);
    assert_eq!(outcome.messages.int_messages, 0);

    // Non-square: S=2, ranks 4..6 are idle and stay silent.
    let outcome = render(&sweep_scene(PartitionMode::StaticBlocks), 7);
    assert_eq!(outcome.messages.float_messages, 3);
    assert_eq!(outcome.messages.int_messages, 0);
}

#[test]
fn dynamic_message_complexity_is_exact() {
    // 13×11 in 3×5 tiles: ⌈13/3⌉·⌈11/5⌉ = 5·3 = 15 tiles.
    for procs in [2, 3, 5] {
        let outcome = render(&sweep_scene(PartitionMode::Dynamic), procs);
        assert_eq!(outcome.messages.float_messages, 15);
        assert_eq!(outcome.messages.int_messages, 15 + procs as u64 - 1);
    }
}

#[test]
fn timing_report_is_sane() {
    for mode in STRATEGIES {
        let report = render(&sweep_scene(mode), 3).report;
        assert!(report.computation >= 0.0, "{}", mode.name());
        assert!(report.communication >= 0.0, "{}", mode.name());
        // The gather interval nests inside the execution interval.
        assert!(report.execution >= report.communication, "{}", mode.name());
    }
}

#[test]
fn sequential_reports_zero_communication() {
    let report = render(&gradient_scene(16, 16, PartitionMode::None), 1).report;
    assert_eq!(report.communication, 0.0);
    assert!(report.computation >= 0.0);
    assert!(report.execution >= report.computation);
}
