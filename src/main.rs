use std::error::Error;
use std::fs;
use std::path::Path;
use std::time::Instant;

use clap::Parser;
use log::info;

mod cli;
mod logger;
mod raytracing;

use cli::Args;
use logger::init_logger;
use raytracing::parser::{ImageData, SceneParser};
use raytracing::render::{render, Sampling};
use raytracing::tracer::Tracer;

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    init_logger(args.log_level.clone().into());

    let scene_path = Path::new(&args.scene);
    let content = fs::read_to_string(scene_path)?;
    let base_dir = scene_path.parent().unwrap_or(Path::new(""));
    let mut parser = SceneParser::new(&content).with_base_dir(base_dir);
    let ImageData {
        width,
        height,
        camera,
        scene,
        mut settings,
    } = match parser.parse_scene() {
        Ok(data) => data,
        Err(parser_error) => {
            parser_error.print_error_location(&content);
            return Err(Box::new(parser_error));
        }
    };
    if let Some(max_depth) = args.max_depth {
        settings.max_depth = max_depth;
    }

    let sampling = Sampling {
        grid: args.samples,
        jitter: args.jitter,
    };
    info!(
        "rendering {} ({}x{}, {} objects, depth {})",
        args.scene,
        width,
        height,
        scene.objects.len(),
        settings.max_depth
    );

    // measure time
    let start = Instant::now();
    let tracer = Tracer::new(&scene, settings);
    let frame = render(&tracer, &camera, width, height, sampling);
    let total_time = start.elapsed();

    frame.to_image().save(&args.output)?;
    info!("rendered {} in {:?}", args.output, total_time);
    Ok(())
}
