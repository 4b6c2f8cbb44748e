use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use glam::Vec2;
use image::{GrayImage, Luma, Rgb, RgbImage};
use strata_mesh::{generate_terrain_mesh, NUM_SUPPORTED_LODS};
use strata_noise::{generate_falloff_map, generate_height_map, generate_noise_map, HeightMap};
use strata_stream::{TerrainConfig, WorkQueue};

/// Vertex and triangle counts of one LOD of the preview chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LodSummary {
    pub lod: u32,
    pub vertices: usize,
    pub triangles: usize,
}

fn to_byte(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

fn grey_image(values: &[Vec<f32>], min: f32, max: f32) -> GrayImage {
    let range = if max > min { max - min } else { 1.0 };
    GrayImage::from_fn(values.len() as u32, values[0].len() as u32, |x, y| {
        Luma([to_byte((values[x as usize][y as usize] - min) / range)])
    })
}

fn colour_image(height_map: &HeightMap, config: &TerrainConfig) -> RgbImage {
    let min_height = config.height_map.min_height();
    let max_height = config.height_map.max_height();
    RgbImage::from_fn(height_map.width() as u32, height_map.height() as u32, |x, y| {
        let colour = config
            .texture
            .colour_at_height(height_map.get(x as usize, y as usize), min_height, max_height);
        Rgb(colour.map(to_byte))
    })
}

/// Build every LOD of the origin chunk in parallel
pub fn summarize_lods(height_map: &HeightMap, config: &TerrainConfig) -> Vec<LodSummary> {
    let queue: WorkQueue<Vec<LodSummary>> = WorkQueue::new();
    let height_map = Arc::new(height_map.clone());

    for lod in 0..NUM_SUPPORTED_LODS as u32 {
        let height_map = Arc::clone(&height_map);
        let mesh_settings = config.mesh.clone();
        queue.submit(
            move || generate_terrain_mesh(&height_map, &mesh_settings, lod),
            move |mesh, summaries: &mut Vec<LodSummary>| {
                summaries.push(LodSummary {
                    lod,
                    vertices: mesh.vertices().len(),
                    triangles: mesh.triangle_count(),
                })
            },
        );
    }

    let mut summaries = Vec::new();
    queue.run_until_idle(&mut summaries);
    summaries.sort_by_key(|s| s.lod);
    summaries
}

/// Write noise, height, colour and falloff maps of the origin chunk to `out_dir`
pub fn write_preview(config: &TerrainConfig, out_dir: &Path) -> Result<Vec<PathBuf>, Box<dyn Error>> {
    let config = config.validated();
    fs::create_dir_all(out_dir)?;

    let n = config.mesh.num_verts_per_line();
    println!("[PREVIEW] Generating {}x{} maps (seed {})", n, n, config.height_map.noise.seed);

    let noise = generate_noise_map(n, n, &config.height_map.noise, Vec2::ZERO);
    let height_map = generate_height_map(n, n, &config.height_map, Vec2::ZERO);
    let falloff = generate_falloff_map(n);

    let mut written = Vec::new();
    let mut save = |name: &str, result: image::ImageResult<()>, path: PathBuf| -> Result<(), Box<dyn Error>> {
        result?;
        println!("[PREVIEW] Wrote {} ({})", path.display(), name);
        written.push(path);
        Ok(())
    };

    let path = out_dir.join("noise.png");
    save("noise", grey_image(&noise, 0.0, 1.0).save(&path), path)?;

    let path = out_dir.join("height.png");
    save(
        "height",
        grey_image(&height_map.values, height_map.min_value, height_map.max_value).save(&path),
        path,
    )?;

    let path = out_dir.join("colour.png");
    save("colour", colour_image(&height_map, &config).save(&path), path)?;

    let path = out_dir.join("falloff.png");
    save("falloff", grey_image(&falloff, 0.0, 1.0).save(&path), path)?;

    println!(
        "[PREVIEW] Height range {:.2}..{:.2}",
        height_map.min_value, height_map.max_value
    );
    for summary in summarize_lods(&height_map, &config) {
        println!(
            "[PREVIEW] LOD {}: {} vertices, {} triangles",
            summary.lod, summary.vertices, summary.triangles
        );
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::GenericImageView;
    use strata_mesh::MeshSettings;

    fn small_config() -> TerrainConfig {
        TerrainConfig {
            mesh: MeshSettings { chunk_size_index: 0, ..Default::default() },
            ..Default::default()
        }
    }

    #[test]
    fn test_lod_summaries_shrink() {
        let config = small_config();
        let n = config.mesh.num_verts_per_line();
        let height_map = generate_height_map(n, n, &config.height_map, Vec2::ZERO);

        let summaries = summarize_lods(&height_map, &config);
        assert_eq!(summaries.len(), NUM_SUPPORTED_LODS);
        assert_eq!(summaries[0].lod, 0);
        // Size 48 at LOD 0: 8 * 49 border triangles plus 2 * 48^2 interior
        assert_eq!(summaries[0].triangles, 8 * 49 + 2 * 48 * 48);
        for pair in summaries.windows(2) {
            assert!(pair[1].triangles < pair[0].triangles);
        }
    }

    #[test]
    fn test_write_preview_files() {
        let out_dir = std::env::temp_dir().join(format!("strata_preview_{}", std::process::id()));
        let written = write_preview(&small_config(), &out_dir).unwrap();

        assert_eq!(written.len(), 4);
        for path in &written {
            assert!(path.exists());
        }
        let height = image::open(out_dir.join("height.png")).unwrap();
        assert_eq!(height.width(), 53);

        fs::remove_dir_all(&out_dir).unwrap();
    }
}
