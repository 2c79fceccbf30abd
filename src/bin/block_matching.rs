use block_disparity::config::block_matching::{load_config, InitialDisparityConfig};
use block_disparity::image::io::{load_grayscale_f32, save_normalized_f32, write_json_file};
use block_disparity::image::ImageF32;
use block_disparity::matcher::StereoPair;
use block_disparity::pipeline::DisparityPipeline;
use block_disparity::tiling::{ProgressFn, RegionProgress};
use log::info;
use std::env;
use std::path::{Path, PathBuf};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let config_path = env::args().nth(1).ok_or_else(usage)?;
    let config = load_config(Path::new(&config_path))?;

    let left = load_grayscale_f32(&config.left)?;
    let right = load_grayscale_f32(&config.right)?;
    let left_mask = load_optional(config.left_mask.as_deref())?;
    let right_mask = load_optional(config.right_mask.as_deref())?;
    let initial = config
        .initial_disparity
        .as_ref()
        .map(load_initial)
        .transpose()?;

    let mut pair =
        StereoPair::new(&left, &right).with_masks(left_mask.as_ref(), right_mask.as_ref());
    if let Some((h, v)) = &initial {
        pair = pair.with_initial_disparity(h, v);
    }

    let pipeline = DisparityPipeline::new(config.pipeline).map_err(|e| e.to_string())?;
    let log_band = |p: RegionProgress| {
        info!(
            "band {}/{} done (rows {}..{})",
            p.completed,
            p.total,
            p.region.y0,
            p.region.y1()
        );
    };
    let progress: ProgressFn<'_> = &log_band;
    let output = pipeline
        .run_with_progress(&pair, Some(progress))
        .map_err(|e| e.to_string())?;

    let out = &config.output;
    save_normalized_f32(&output.hdisp, &out.hdisp_image)?;
    save_normalized_f32(&output.vdisp, &out.vdisp_image)?;
    if let Some(path) = &out.metric_image {
        save_normalized_f32(&output.metric, path)?;
    }
    if let Some(path) = &out.mask_image {
        save_normalized_f32(&output.mask, path)?;
    }
    write_json_file(&out.report_json, &output.report)?;

    println!(
        "Matched {}x{} -> {}x{} in {:.2} ms ({} valid pixels)",
        left.w,
        left.h,
        output.grid.output_size.0,
        output.grid.output_size.1,
        output.report.timings.total_ms,
        output.report.valid_pixels
    );
    println!(
        "Saved disparity images to {} and {}",
        out.hdisp_image.display(),
        out.vdisp_image.display()
    );
    println!("Saved report to {}", out.report_json.display());

    Ok(())
}

fn load_optional(path: Option<&Path>) -> Result<Option<ImageF32>, String> {
    path.map(load_grayscale_f32).transpose()
}

fn load_initial(cfg: &InitialDisparityConfig) -> Result<(ImageF32, ImageF32), String> {
    let decode = |path: &PathBuf| -> Result<ImageF32, String> {
        let mut img = load_grayscale_f32(path)?;
        for v in img.data.iter_mut() {
            *v = *v * cfg.scale + cfg.offset;
        }
        Ok(img)
    };
    Ok((decode(&cfg.hdisp)?, decode(&cfg.vdisp)?))
}

fn usage() -> String {
    "Usage: block_matching <config.json>".to_string()
}
