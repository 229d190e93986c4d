//! Scene configuration loading and validation.
//!
//! Parses `tessera.toml` (or an override path provided by the binary) into a
//! raw [`SceneFile`] and resolves it into the immutable [`SceneConfig`] the
//! render core consumes. Unknown fields are ignored (TOML deserialization
//! tolerance) so the file format can grow without breaking older binaries.
//! An unrecognized partitioning-mode *string* degrades to [`PartitionMode::None`]
//! with a logged warning rather than failing the run; dimensional invariants
//! are enforced separately by [`SceneConfig::validate`], which refuses the
//! run with a typed error.

use anyhow::Result;
use serde::Deserialize;
use std::{fs, path::PathBuf};
use thiserror::Error;
use tracing::{info, warn};

pub mod shader;
pub use shader::{Shader, build_shader};

/// How the image is divided among ranks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PartitionMode {
    /// Single-process reference: the coordinator renders everything.
    #[default]
    None,
    /// Contiguous vertical strips, one per rank; last rank takes the
    /// remainder columns.
    StaticStripsVertical,
    /// Square ⌊√P⌋×⌊√P⌋ block grid; edge cells absorb the division
    /// remainders; ranks beyond the grid stay idle.
    StaticBlocks,
    /// Horizontal bands of `cycle_size` rows dealt round-robin to ranks.
    StaticCyclesHorizontal,
    /// Centralized tile queue: the coordinator hands out `block_width` ×
    /// `block_height` tiles on demand.
    Dynamic,
}

impl PartitionMode {
    /// Parse the TOML-facing mode name. Returns `None` for strings no
    /// strategy claims.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "none" | "sequential" => Some(Self::None),
            "static_strips_vertical" => Some(Self::StaticStripsVertical),
            "static_blocks" => Some(Self::StaticBlocks),
            "static_cycles_horizontal" => Some(Self::StaticCyclesHorizontal),
            "dynamic" => Some(Self::Dynamic),
            _ => None,
        }
    }

    /// Stable lower-case name used in log events and output file names.
    pub fn name(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::StaticStripsVertical => "static_strips_vertical",
            Self::StaticBlocks => "static_blocks",
            Self::StaticCyclesHorizontal => "static_cycles_horizontal",
            Self::Dynamic => "dynamic",
        }
    }
}

/// Violations of the scene invariants. Each variant names the offending
/// field so the driver can surface a precise diagnostic.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SceneError {
    #[error("image width must be positive")]
    ZeroWidth,
    #[error("image height must be positive")]
    ZeroHeight,
    #[error("cycle size {cycle_size} outside 1..={height}")]
    CycleSizeOutOfRange { cycle_size: u32, height: u32 },
    #[error("dynamic tile width {block_width} outside 1..={width}")]
    BlockWidthOutOfRange { block_width: u32, width: u32 },
    #[error("dynamic tile height {block_height} outside 1..={height}")]
    BlockHeightOutOfRange { block_height: u32, height: u32 },
    #[error("process count must be at least 1")]
    ZeroProcs,
}

// ---------------------------------------------------------------------------
// Raw file DTOs
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Clone)]
pub struct PartitionSection {
    /// Mode name; resolved leniently by `PartitionMode::parse`.
    #[serde(default = "PartitionSection::default_mode")]
    pub mode: String,
    /// Rows per band for the cyclic strategy.
    #[serde(default = "PartitionSection::default_cycle_size")]
    pub cycle_size: u32,
    /// Tile width for the dynamic strategy.
    #[serde(default = "PartitionSection::default_block")]
    pub block_width: u32,
    /// Tile height for the dynamic strategy.
    #[serde(default = "PartitionSection::default_block")]
    pub block_height: u32,
}

impl PartitionSection {
    fn default_mode() -> String {
        "none".to_string()
    }
    const fn default_cycle_size() -> u32 {
        16
    }
    const fn default_block() -> u32 {
        32
    }
}

impl Default for PartitionSection {
    fn default() -> Self {
        Self {
            mode: Self::default_mode(),
            cycle_size: Self::default_cycle_size(),
            block_width: Self::default_block(),
            block_height: Self::default_block(),
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct SceneFile {
    #[serde(default = "SceneFile::default_width")]
    pub width: u32,
    #[serde(default = "SceneFile::default_height")]
    pub height: u32,
    #[serde(default)]
    pub partition: PartitionSection,
    #[serde(default)]
    pub shader: shader::ShaderSection,
}

impl SceneFile {
    const fn default_width() -> u32 {
        512
    }
    const fn default_height() -> u32 {
        512
    }
}

// ---------------------------------------------------------------------------
// Resolved configuration
// ---------------------------------------------------------------------------

/// Fully-resolved scene record, immutable for the duration of a run. The
/// shader section stays opaque to the partitioning core; it is only read by
/// [`build_shader`].
#[derive(Debug, Clone)]
pub struct SceneConfig {
    pub width: u32,
    pub height: u32,
    pub mode: PartitionMode,
    pub cycle_size: u32,
    pub block_width: u32,
    pub block_height: u32,
    pub shader: shader::ShaderSection,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self::resolve(SceneFile::default())
    }
}

impl SceneConfig {
    /// Resolve a parsed file into a runnable configuration. An unknown mode
    /// string is diagnosed and degrades to sequential operation.
    pub fn resolve(file: SceneFile) -> Self {
        let mode = match PartitionMode::parse(&file.partition.mode) {
            Some(mode) => mode,
            None => {
                warn!(
                    target: "scene",
                    mode = file.partition.mode.as_str(),
                    "unknown_partition_mode_falling_back_to_none"
                );
                println!(
                    "This mode ({}) is not currently implemented.",
                    file.partition.mode
                );
                PartitionMode::None
            }
        };
        Self {
            width: file.width,
            height: file.height,
            mode,
            cycle_size: file.partition.cycle_size,
            block_width: file.partition.block_width,
            block_height: file.partition.block_height,
            shader: file.shader,
        }
    }

    /// Check every invariant the engine relies on for `procs` ranks. The
    /// cyclic and dynamic bounds are only enforced when the corresponding
    /// strategy is active; other modes never read those fields.
    pub fn validate(&self, procs: usize) -> Result<(), SceneError> {
        if self.width == 0 {
            return Err(SceneError::ZeroWidth);
        }
        if self.height == 0 {
            return Err(SceneError::ZeroHeight);
        }
        if procs == 0 {
            return Err(SceneError::ZeroProcs);
        }
        match self.mode {
            PartitionMode::StaticCyclesHorizontal => {
                if self.cycle_size == 0 || self.cycle_size > self.height {
                    return Err(SceneError::CycleSizeOutOfRange {
                        cycle_size: self.cycle_size,
                        height: self.height,
                    });
                }
            }
            PartitionMode::Dynamic => {
                if self.block_width == 0 || self.block_width > self.width {
                    return Err(SceneError::BlockWidthOutOfRange {
                        block_width: self.block_width,
                        width: self.width,
                    });
                }
                if self.block_height == 0 || self.block_height > self.height {
                    return Err(SceneError::BlockHeightOutOfRange {
                        block_height: self.block_height,
                        height: self.height,
                    });
                }
            }
            _ => {}
        }
        Ok(())
    }
}

/// Best-effort config path following platform conventions (XDG / AppData
/// Roaming): prefer a local `tessera.toml`, then the platform config dir.
pub fn discover() -> PathBuf {
    let local = PathBuf::from("tessera.toml");
    if local.exists() {
        return local;
    }
    if let Some(dir) = dirs::config_dir() {
        return dir.join("tessera").join("tessera.toml");
    }
    // Final fallback relative filename.
    PathBuf::from("tessera.toml")
}

/// Load and resolve the scene, falling back to defaults when the file is
/// absent or unparseable. A parse failure is logged, not fatal: the default
/// scene still renders and the diagnostic points at the file.
pub fn load_from(path: Option<PathBuf>) -> Result<SceneConfig> {
    let path = path.unwrap_or_else(discover);
    if let Ok(content) = fs::read_to_string(&path) {
        match toml::from_str::<SceneFile>(&content) {
            Ok(file) => {
                info!(target: "scene", file = %path.display(), "scene_loaded");
                Ok(SceneConfig::resolve(file))
            }
            Err(e) => {
                warn!(target: "scene", file = %path.display(), error = %e, "scene_parse_failed_using_defaults");
                Ok(SceneConfig::default())
            }
        }
    } else {
        info!(target: "scene", file = %path.display(), "scene_file_absent_using_defaults");
        Ok(SceneConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_scene(content: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tessera.toml");
        let mut f = fs::File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        (dir, path)
    }

    #[test]
    fn full_file_round_trips() {
        let (_dir, path) = write_scene(
            r#"
width = 640
height = 480

[partition]
mode = "dynamic"
block_width = 24
block_height = 12
"#,
        );
        let scene = load_from(Some(path)).unwrap();
        assert_eq!(scene.width, 640);
        assert_eq!(scene.height, 480);
        assert_eq!(scene.mode, PartitionMode::Dynamic);
        assert_eq!(scene.block_width, 24);
        assert_eq!(scene.block_height, 12);
        // Untouched section keeps its default.
        assert_eq!(scene.cycle_size, 16);
    }

    #[test]
    fn absent_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let scene = load_from(Some(dir.path().join("missing.toml"))).unwrap();
        assert_eq!(scene.mode, PartitionMode::None);
        assert_eq!(scene.width, 512);
    }

    #[test]
    fn unknown_mode_degrades_to_none() {
        let (_dir, path) = write_scene("[partition]\nmode = \"hilbert_curve\"\n");
        let scene = load_from(Some(path)).unwrap();
        assert_eq!(scene.mode, PartitionMode::None);
    }

    #[test]
    fn unknown_fields_are_tolerated() {
        let (_dir, path) = write_scene("width = 32\nfuture_knob = true\n");
        let scene = load_from(Some(path)).unwrap();
        assert_eq!(scene.width, 32);
    }

    #[test]
    fn mode_names_parse_round_trip() {
        for mode in [
            PartitionMode::None,
            PartitionMode::StaticStripsVertical,
            PartitionMode::StaticBlocks,
            PartitionMode::StaticCyclesHorizontal,
            PartitionMode::Dynamic,
        ] {
            assert_eq!(PartitionMode::parse(mode.name()), Some(mode));
        }
    }

    #[test]
    fn validate_rejects_bad_dimensions() {
        let mut scene = SceneConfig::default();
        scene.width = 0;
        assert_eq!(scene.validate(2), Err(SceneError::ZeroWidth));

        let mut scene = SceneConfig::default();
        scene.mode = PartitionMode::StaticCyclesHorizontal;
        scene.cycle_size = scene.height + 1;
        assert!(matches!(
            scene.validate(2),
            Err(SceneError::CycleSizeOutOfRange { .. })
        ));

        let mut scene = SceneConfig::default();
        scene.mode = PartitionMode::Dynamic;
        scene.block_width = 0;
        assert!(matches!(
            scene.validate(2),
            Err(SceneError::BlockWidthOutOfRange { .. })
        ));
    }

    #[test]
    fn validate_ignores_inactive_sections() {
        // A nonsense cycle size is fine while the strips strategy is active.
        let mut scene = SceneConfig::default();
        scene.mode = PartitionMode::StaticStripsVertical;
        scene.cycle_size = 0;
        assert_eq!(scene.validate(3), Ok(()));
    }
}
