use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use strata_mesh::MeshSettings;
use strata_noise::HeightMapSettings;
use thiserror::Error;

use crate::lod::LodInfo;
use crate::texture::TextureSettings;

/// Failure to load a [`TerrainConfig`] from disk
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid terrain config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Everything needed to stream a world. Every field has a default, so a
/// config file only lists what it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    pub height_map: HeightMapSettings,
    pub mesh: MeshSettings,
    pub texture: TextureSettings,
    pub detail_levels: Vec<LodInfo>,
    /// Index into `detail_levels` whose mesh doubles as the collider
    pub collider_lod_index: usize,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            height_map: HeightMapSettings::default(),
            mesh: MeshSettings::default(),
            texture: TextureSettings::default(),
            detail_levels: vec![
                LodInfo::new(0, 300.0),
                LodInfo::new(1, 500.0),
                LodInfo::new(2, 700.0),
                LodInfo::new(4, 1000.0),
            ],
            collider_lod_index: 0,
        }
    }
}

impl TerrainConfig {
    /// Clamp numeric settings into range. The LOD table is left alone; a bad
    /// one is rejected when the streamer is built.
    pub fn validated(&self) -> Self {
        Self {
            height_map: self.height_map.validated(),
            mesh: self.mesh.validated(),
            texture: self.texture.validated(),
            detail_levels: self.detail_levels.clone(),
            collider_lod_index: self.collider_lod_index,
        }
    }

    /// Threshold of the last LOD entry; chunks farther than this are hidden
    pub fn max_view_dst(&self) -> f32 {
        self.detail_levels.last().map_or(0.0, |level| level.visible_dst_threshold)
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json_str(&json)?;
        log::info!("Loaded terrain config from {}", path.display());
        Ok(config)
    }

    pub fn to_json_string_pretty(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_noise::NormalizeMode;

    #[test]
    fn test_partial_json_fills_defaults() {
        let config = TerrainConfig::from_json_str(
            r#"{
                "height_map": { "height_multiplier": 12.5, "noise": { "seed": 7, "normalize_mode": "Local" } },
                "mesh": { "mesh_scale": 1.0 },
                "detail_levels": [
                    { "lod": 0, "visible_dst_threshold": 100.0 },
                    { "lod": 3, "visible_dst_threshold": 250.0 }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(config.height_map.height_multiplier, 12.5);
        assert_eq!(config.height_map.noise.seed, 7);
        assert_eq!(config.height_map.noise.normalize_mode, NormalizeMode::Local);
        assert_eq!(config.height_map.noise.octaves, 6);
        assert_eq!(config.mesh.mesh_scale, 1.0);
        assert_eq!(config.detail_levels.len(), 2);
        assert_eq!(config.max_view_dst(), 250.0);
        assert_eq!(config.texture, TextureSettings::default());
    }

    #[test]
    fn test_json_round_trip() {
        let config = TerrainConfig::default();
        let json = config.to_json_string_pretty().unwrap();
        assert_eq!(TerrainConfig::from_json_str(&json).unwrap(), config);
    }

    #[test]
    fn test_bad_json_is_parse_error() {
        let err = TerrainConfig::from_json_str("{ \"mesh\": 3 }").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = TerrainConfig::load("/definitely/not/here/terrain.json").unwrap_err();
        match err {
            ConfigError::Io { path, .. } => assert!(path.ends_with("terrain.json")),
            other => panic!("expected Io error, got {other}"),
        }
    }

    #[test]
    fn test_validated_clamps_numbers_only() {
        let mut config = TerrainConfig::default();
        config.mesh.mesh_scale = -4.0;
        config.mesh.chunk_size_index = 99;
        config.detail_levels.clear();

        let validated = config.validated();
        assert!(validated.mesh.mesh_scale > 0.0);
        assert_eq!(validated.mesh.chunk_size_index, 8);
        assert!(validated.detail_levels.is_empty());
    }
}
