use std::path::PathBuf;
use std::process::ExitCode;

use common::log_setup::{setup_logging, LogOptions};
use fbp::prelude::*;
use fbp::scene::Scene;
use tracing::error;

/// Accepts every setup call and never reconstructs; enough to walk the configuration.
#[derive(Debug, Default)]
struct DryRunEngine;

impl AcceleratorEngine for DryRunEngine {
    fn set_gpu_index(&mut self, _gpu_index: i32) -> EngineResult<()> {
        Ok(())
    }
    fn set_geometry(
        &mut self,
        _sinogram: &ProjectionGeometry2D,
        _volume: &VolumeGeometry2D,
    ) -> EngineResult<()> {
        Ok(())
    }
    fn set_supersampling(&mut self, _detector: u32, _pixel: u32) -> EngineResult<()> {
        Ok(())
    }
    fn set_filter(
        &mut self,
        _kind: FilterKind,
        _coefficients: Option<&[f32]>,
        _width: usize,
        _bandwidth: f32,
        _parameter: f32,
    ) -> EngineResult<()> {
        Ok(())
    }
    fn set_short_scan(&mut self, _short_scan: bool) -> EngineResult<()> {
        Ok(())
    }
    fn init(&mut self) -> EngineResult<()> {
        Ok(())
    }
    fn reconstruct(&mut self, _sinogram: &[f32], _reconstruction: &mut [f32]) -> EngineResult<()> {
        Err(EngineError::Failed("dry run engine cannot reconstruct".to_string()))
    }
}

fn check(path: PathBuf) -> anyhow::Result<String> {
    let scene = Scene::from_file(&path)?;
    let registry = scene.build_registry()?;
    let mut cfg = scene.algorithm;

    let mut algorithm = FbpAlgorithm::<DryRunEngine>::default();
    algorithm.initialize_from_config(&mut cfg, &registry)?;
    cfg.warn_unparsed(FbpAlgorithm::<DryRunEngine>::TYPE);

    Ok(ConfigSummary::new(algorithm.config()).to_yaml())
}

fn main() -> ExitCode {
    let log_options = LogOptions::console("info").with_file("logs", "fbp");
    if let Err(err) = setup_logging(&log_options) {
        eprintln!("{}", err);
        return ExitCode::FAILURE;
    }

    let Some(path) = std::env::args().nth(1) else {
        eprintln!("usage: fbp_check <scene.yml|scene.json>");
        return ExitCode::FAILURE;
    };

    match check(PathBuf::from(&path)) {
        Ok(summary) => {
            print!("{}", summary);
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("{}: {:#}", path, err);
            ExitCode::FAILURE
        }
    }
}
