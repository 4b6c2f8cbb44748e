mod preview;
mod renderer;
mod walker;

use std::error::Error;
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use glam::Vec2;
use strata_stream::{TerrainConfig, TerrainStreamer, WorkQueue};

use renderer::{apply_events, BufferRenderer, TerrainRenderer};
use walker::Walker;

const TICK: Duration = Duration::from_millis(33);
const STATS_EVERY: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Walk,
    Preview,
}

#[derive(Debug)]
struct Args {
    mode: Mode,
    config: Option<PathBuf>,
    out_dir: PathBuf,
    ticks: usize,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            mode: Mode::Walk,
            config: None,
            out_dir: PathBuf::from("preview"),
            ticks: 300,
        }
    }
}

const USAGE: &str = "usage: strata_viewer [walk|preview] [--config FILE] [--out DIR] [--ticks N]";

fn parse_args<I: Iterator<Item = String>>(mut args: I) -> Result<Args, String> {
    let mut parsed = Args::default();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "walk" => parsed.mode = Mode::Walk,
            "preview" => parsed.mode = Mode::Preview,
            "--config" => parsed.config = Some(args.next().ok_or("--config needs a file")?.into()),
            "--out" => parsed.out_dir = args.next().ok_or("--out needs a directory")?.into(),
            "--ticks" => {
                let value = args.next().ok_or("--ticks needs a number")?;
                parsed.ticks = value.parse().map_err(|_| format!("Bad tick count: {}", value))?;
            }
            "-h" | "--help" => return Err(USAGE.to_string()),
            other => return Err(format!("Unknown argument: {}\n{}", other, USAGE)),
        }
    }
    Ok(parsed)
}

fn load_config(args: &Args) -> Result<TerrainConfig, Box<dyn Error>> {
    match &args.config {
        Some(path) => {
            println!("[CONFIG] Loading {}", path.display());
            Ok(TerrainConfig::load(path)?)
        }
        None => {
            println!("[CONFIG] Using built-in world settings");
            Ok(TerrainConfig::default())
        }
    }
}

fn walk(config: TerrainConfig, ticks: usize) -> Result<(), Box<dyn Error>> {
    let mut streamer = TerrainStreamer::new(config, WorkQueue::new());
    let mut renderer = BufferRenderer::new();

    let (min_height, max_height) = streamer.height_range();
    renderer.apply_texture(&streamer.config().texture, min_height, max_height);

    let mut walker = Walker::new(Vec2::ZERO);
    println!(
        "[STREAM] Chunks are {} world units wide; walking for {} ticks",
        streamer.mesh_world_size(),
        ticks
    );

    let start_time = Instant::now();
    for tick in 0..ticks {
        let frame_start = Instant::now();

        let events = streamer.update(walker.viewer_position());
        apply_events(&mut renderer, &events);
        walker.update(TICK.as_secs_f32(), streamer.height_at(walker.viewer_position()));

        if tick % STATS_EVERY == 0 {
            let stats = streamer.stats();
            let coord = streamer.viewer_chunk_coord();
            println!(
                "[STREAM] t={:.1}s chunk ({}, {}) known {} visible {} loading {} meshes {}/{} colliders {} | GPU {} KiB",
                start_time.elapsed().as_secs_f32(),
                coord.x,
                coord.z,
                stats.known,
                stats.visible,
                stats.loading,
                stats.cached_meshes,
                stats.cached_meshes + stats.requested_meshes,
                stats.colliders,
                renderer.visible_bytes() / 1024
            );
        }

        if let Some(rest) = TICK.checked_sub(frame_start.elapsed()) {
            thread::sleep(rest);
        }
    }

    // Let in-flight work land so the final numbers are complete
    let queue = streamer.queue().clone();
    queue.run_until_idle(&mut streamer);
    apply_events(&mut renderer, &streamer.take_events());

    let stats = streamer.stats();
    println!(
        "\n[STREAM] Finished at {:?} ({})",
        walker.position,
        if walker.on_ground { "on the ground" } else { "ground not loaded" }
    );
    println!(
        "[STREAM] {} chunks known, {} visible, {} meshes built, {} colliders, {} uploads",
        stats.known, stats.visible, stats.cached_meshes, renderer.collider_count(), renderer.uploads
    );

    println!("[RENDER] Visible chunks per LOD: {:?}", renderer.lod_histogram());
    println!(
        "[RENDER] {} texture layers over heights {:.1}..{:.1}",
        renderer.texture_layers, renderer.height_range.0, renderer.height_range.1
    );

    let stalled = streamer.stalled_chunks();
    if !stalled.is_empty() {
        log::warn!("{} chunks never received their data: {:?}", stalled.len(), stalled);
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    println!("=== STRATA: ENDLESS TERRAIN ===\n");

    let args = parse_args(std::env::args().skip(1))?;
    let config = load_config(&args)?;

    match args.mode {
        Mode::Walk => walk(config, args.ticks)?,
        Mode::Preview => {
            preview::write_preview(&config, &args.out_dir)?;
        }
    }

    println!("\n[ENGINE] Done");
    Ok(())
}
