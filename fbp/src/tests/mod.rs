
use crate::config::Config;
use crate::data::{
    DataRegistry, FanFlatGeometry, ParallelGeometry, ProjectionData2D, ProjectionGeometry2D,
    VolumeData2D, VolumeGeometry2D,
};
use crate::engine::{AcceleratorEngine, EngineError, EngineResult};
use crate::filter::FilterKind;

pub(crate) const DETECTORS: usize = 4;
pub(crate) const ANGLES: usize = 3;

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum EngineCall {
    GpuIndex(i32),
    Geometry {
        detectors: usize,
        angles: usize,
        fan_beam: bool,
    },
    Supersampling(u32, u32),
    Init,
    Filter {
        kind: FilterKind,
        coefficients: Option<Vec<f32>>,
        width: usize,
        bandwidth: f32,
        parameter: f32,
    },
    ShortScan(bool),
    Reconstruct,
}

/// Records every call; the filter and short-scan setters can be told to fail.
#[derive(Debug, Default)]
pub(crate) struct RecordingEngine {
    pub calls: Vec<EngineCall>,
    pub fail_filter: bool,
    pub fail_short_scan: bool,
}

impl AcceleratorEngine for RecordingEngine {
    fn set_gpu_index(&mut self, gpu_index: i32) -> EngineResult<()> {
        self.calls.push(EngineCall::GpuIndex(gpu_index));
        Ok(())
    }

    fn set_geometry(
        &mut self,
        sinogram: &ProjectionGeometry2D,
        _volume: &VolumeGeometry2D,
    ) -> EngineResult<()> {
        self.calls.push(EngineCall::Geometry {
            detectors: sinogram.detector_count(),
            angles: sinogram.projection_angle_count(),
            fan_beam: sinogram.is_fan_beam(),
        });
        Ok(())
    }

    fn set_supersampling(&mut self, detector: u32, pixel: u32) -> EngineResult<()> {
        self.calls.push(EngineCall::Supersampling(detector, pixel));
        Ok(())
    }

    fn set_filter(
        &mut self,
        kind: FilterKind,
        coefficients: Option<&[f32]>,
        width: usize,
        bandwidth: f32,
        parameter: f32,
    ) -> EngineResult<()> {
        self.calls.push(EngineCall::Filter {
            kind,
            coefficients: coefficients.map(<[f32]>::to_vec),
            width,
            bandwidth,
            parameter,
        });
        if self.fail_filter {
            return Err(EngineError::FilterRejected {
                kind,
                message: "test".to_string(),
            });
        }
        Ok(())
    }

    fn set_short_scan(&mut self, short_scan: bool) -> EngineResult<()> {
        self.calls.push(EngineCall::ShortScan(short_scan));
        if self.fail_short_scan {
            return Err(EngineError::Failed("short scan unsupported".to_string()));
        }
        Ok(())
    }

    fn init(&mut self) -> EngineResult<()> {
        self.calls.push(EngineCall::Init);
        Ok(())
    }

    fn reconstruct(&mut self, sinogram: &[f32], reconstruction: &mut [f32]) -> EngineResult<()> {
        self.calls.push(EngineCall::Reconstruct);
        let total: f32 = sinogram.iter().sum();
        reconstruction.fill(total);
        Ok(())
    }
}

pub(crate) fn fan_geometry(detector_count: usize, angle_count: usize) -> ProjectionGeometry2D {
    ProjectionGeometry2D::FanFlat(FanFlatGeometry {
        detector_count,
        detector_width: 1.0,
        angles: (0..angle_count).map(|i| i as f32 * 0.5).collect(),
        source_origin: 300.0,
        origin_detector: 100.0,
    })
}

pub(crate) fn parallel_geometry(detector_count: usize, angle_count: usize) -> ProjectionGeometry2D {
    ProjectionGeometry2D::Parallel(ParallelGeometry {
        detector_count,
        detector_width: 1.0,
        angles: (0..angle_count).map(|i| i as f32 * 0.5).collect(),
    })
}

pub(crate) fn ramp(count: usize) -> Vec<f32> {
    (0..count).map(|i| 0.25 + i as f32 * 1.5).collect()
}

/// Registry holding a sinogram and a 4x4 volume.
pub(crate) struct Fixture {
    pub registry: DataRegistry,
    pub sinogram_id: i64,
    pub volume_id: i64,
}

impl Fixture {
    pub fn new(fan_beam: bool) -> Self {
        let geometry = if fan_beam {
            fan_geometry(DETECTORS, ANGLES)
        } else {
            parallel_geometry(DETECTORS, ANGLES)
        };

        let mut registry = DataRegistry::default();
        let sinogram = ProjectionData2D::with_data(geometry, ramp(DETECTORS * ANGLES))
            .expect("sinogram fixture size");
        let sinogram_id = registry.store_projection(sinogram);
        let volume =
            VolumeData2D::new(VolumeGeometry2D { cols: 4, rows: 4 }).expect("volume fixture");
        let volume_id = registry.store_volume(volume);

        Self {
            registry,
            sinogram_id,
            volume_id,
        }
    }

    /// Config with only the required data handles set.
    pub fn config(&self) -> Config {
        let mut cfg = Config::new("FBP_CUDA");
        cfg.set_node("ProjectionDataId", self.sinogram_id)
            .set_node("ReconstructionDataId", self.volume_id);
        cfg
    }
}
