use common::Shared;
use tracing::debug;

use crate::config::{Config, ConfigError, ConfigResult};
use crate::data::{DataRegistry, DataResult, ProjectionData2D, VolumeData2D};
use crate::filter::FilterSpec;

pub const DEFAULT_GPU_INDEX: i32 = -1;
pub const DEFAULT_SUPERSAMPLING: i32 = 1;

/// Parameter bundle shared by the reconstruction entry points.
#[derive(Clone, Debug)]
pub struct AlgorithmConfig {
    pub sinogram: Option<Shared<ProjectionData2D>>,
    pub reconstruction: Option<Shared<VolumeData2D>>,
    /// `-1` lets the engine pick a device.
    pub gpu_index: i32,
    pub pixel_supersampling: i32,
    pub detector_supersampling: u32,
    /// Only meaningful for fan-beam sinograms.
    pub short_scan: bool,
    pub filter: FilterSpec,
}

impl Default for AlgorithmConfig {
    fn default() -> Self {
        Self {
            sinogram: None,
            reconstruction: None,
            gpu_index: DEFAULT_GPU_INDEX,
            pixel_supersampling: DEFAULT_SUPERSAMPLING,
            detector_supersampling: DEFAULT_SUPERSAMPLING as u32,
            short_scan: false,
            filter: FilterSpec::default(),
        }
    }
}

impl AlgorithmConfig {
    pub fn is_fan_beam(&self) -> bool {
        self.sinogram
            .as_ref()
            .is_some_and(|sinogram| sinogram.read().geometry().is_fan_beam())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BaseInitError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("{node}: {source}")]
    Data {
        node: &'static str,
        source: crate::data::DataError,
    },
}

/// Reads the data handles, device index and supersampling factors.
///
/// Runs before any algorithm-specific parsing. Every consumed node and
/// option is marked on `cfg`.
pub fn initialize_base(
    cfg: &mut Config,
    registry: &DataRegistry,
    config: &mut AlgorithmConfig,
) -> Result<(), BaseInitError> {
    let id = cfg.content_int("ProjectionDataId")?;
    config.sinogram = Some(lookup("ProjectionDataId", registry.projection(id))?);
    cfg.mark_node_parsed("ProjectionDataId");

    let id = cfg.content_int("ReconstructionDataId")?;
    config.reconstruction = Some(lookup("ReconstructionDataId", registry.volume(id))?);
    cfg.mark_node_parsed("ReconstructionDataId");

    // both spellings are in use; `GPUIndex` wins and the other stays unparsed
    let gpu_option = if cfg.has_option("GPUIndex") {
        "GPUIndex"
    } else {
        "GPUindex"
    };
    config.gpu_index = to_i32(
        gpu_option,
        cfg.option_int(gpu_option, DEFAULT_GPU_INDEX as i64)?,
    )?;
    cfg.mark_option_parsed(gpu_option);

    config.pixel_supersampling = to_i32(
        "PixelSuperSampling",
        cfg.option_int("PixelSuperSampling", DEFAULT_SUPERSAMPLING as i64)?,
    )?;
    cfg.mark_option_parsed("PixelSuperSampling");

    let detector = cfg.option_int("DetectorSuperSampling", DEFAULT_SUPERSAMPLING as i64)?;
    config.detector_supersampling =
        u32::try_from(detector).map_err(|_| ConfigError::InvalidContent {
            name: "DetectorSuperSampling".to_string(),
            expected: "non-negative integer",
        })?;
    cfg.mark_option_parsed("DetectorSuperSampling");

    debug!(
        "Base reconstruction config: gpu {}, supersampling {}x{}",
        config.gpu_index, config.detector_supersampling, config.pixel_supersampling
    );

    Ok(())
}

fn lookup<T>(node: &'static str, result: DataResult<T>) -> Result<T, BaseInitError> {
    result.map_err(|source| BaseInitError::Data { node, source })
}

fn to_i32(name: &str, value: i64) -> ConfigResult<i32> {
    i32::try_from(value).map_err(|_| ConfigError::InvalidContent {
        name: name.to_string(),
        expected: "32-bit integer",
    })
}
