use thiserror::Error;

use crate::data::{ProjectionGeometry2D, VolumeGeometry2D};
use crate::filter::FilterKind;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    #[error("Device {0} is not available")]
    DeviceUnavailable(i32),
    #[error("Filter {kind} rejected: {message}")]
    FilterRejected { kind: FilterKind, message: String },
    #[error("Engine is not initialized")]
    NotInitialized,
    #[error("Engine failure: {0}")]
    Failed(String),
}

pub type EngineResult<T> = Result<T, EngineError>;

/// What to do when the engine refuses the filter or short-scan setup.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EngineSetupPolicy {
    /// Log the failure and keep going.
    #[default]
    Permissive,
    /// Treat the failure as a hard initialization error.
    Strict,
}

/// Device-resident FBP implementation.
///
/// Construction must be cheap. On the first run the algorithm calls, once each:
/// device, geometry and supersampling setters, [`AcceleratorEngine::init`],
/// then the filter and short-scan setters. A handle whose setup fails is
/// dropped, never set up a second time.
pub trait AcceleratorEngine {
    fn set_gpu_index(&mut self, gpu_index: i32) -> EngineResult<()>;

    fn set_geometry(
        &mut self,
        sinogram: &ProjectionGeometry2D,
        volume: &VolumeGeometry2D,
    ) -> EngineResult<()>;

    fn set_supersampling(&mut self, detector: u32, pixel: u32) -> EngineResult<()>;

    fn set_filter(
        &mut self,
        kind: FilterKind,
        coefficients: Option<&[f32]>,
        width: usize,
        bandwidth: f32,
        parameter: f32,
    ) -> EngineResult<()>;

    fn set_short_scan(&mut self, short_scan: bool) -> EngineResult<()>;

    fn init(&mut self) -> EngineResult<()>;

    fn reconstruct(&mut self, sinogram: &[f32], reconstruction: &mut [f32]) -> EngineResult<()>;
}
