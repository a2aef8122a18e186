use anyhow::{Context, Result};

use handpose_tracker::camera::OpenCvCapture;
use handpose_tracker::config::Config;
use handpose_tracker::pipeline::PipelineDriver;
use handpose_tracker::pose::CpmDetector;
use handpose_tracker::render::MinifbDisplay;

const CONFIG_PATH: &str = "hand_tracker.toml";

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Hand Tracker ({})", env!("GIT_VERSION"));

    let config = Config::load_or_default(CONFIG_PATH)?;

    let source = OpenCvCapture::open(&config.camera, config.model.input_size)?;
    let (width, height) = source.resolution();

    log::info!("loading model from {}", config.model.path);
    let model = CpmDetector::new(&config.model)?;

    let display = MinifbDisplay::new((width as usize, height as usize), config.model.input_size)?;

    let mut driver = PipelineDriver::new(&config, source, model, display)?;
    let summary = driver.run().context("pipeline stopped")?;

    log::info!("processed {} frames", summary.frames);
    Ok(())
}
