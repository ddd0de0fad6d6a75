use std::fmt::Debug;

use common::normalize_string::NormalizeString;
use common::Shared;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error};

use crate::config::{Config, ConfigError};
use crate::data::{DataError, DataRegistry, ProjectionData2D, VolumeData2D};
use crate::engine::{AcceleratorEngine, EngineError, EngineSetupPolicy};
use crate::filter::{FilterKind, FilterSpec, DEFAULT_BANDWIDTH, DEFAULT_PARAMETER};
use crate::reconstruction::{initialize_base, AlgorithmConfig, BaseInitError};

/// Structural problems that make a configuration unusable.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CheckError {
    #[error("Invalid Projection Data Object.")]
    MissingSinogram,
    #[error("Invalid Reconstruction Data Object.")]
    MissingReconstruction,
    #[error("Filter {0} requires a coefficient buffer.")]
    MissingFilterCoefficients(FilterKind),
    #[error("Projection Data Object Not Initialized.")]
    SinogramNotInitialized,
    #[error("Reconstruction Data Object Not Initialized.")]
    ReconstructionNotInitialized,
    #[error("GPUIndex must be a non-negative integer or -1, got {0}.")]
    InvalidGpuIndex(i32),
    #[error("PixelSuperSampling must be a non-negative integer, got {0}.")]
    InvalidPixelSupersampling(i32),
}

#[derive(Debug, Error)]
pub enum AlgorithmError {
    #[error("Config describes algorithm {0}, expected FBP_CUDA")]
    WrongType(String),
    #[error(transparent)]
    Base(#[from] BaseInitError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Data(#[from] DataError),
    #[error("FilterSinogramId {id} holds {actual} values, its geometry requires {expected}")]
    FilterSourceMismatch {
        id: i64,
        expected: usize,
        actual: usize,
    },
    #[error("Filter buffer holds {actual} values, {expected} are required")]
    FilterBufferTooShort { expected: usize, actual: usize },
    #[error("FBP_CUDA: {0}")]
    Check(#[from] CheckError),
    #[error("Engine setup failed: {0}")]
    EngineSetup(EngineError),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("Algorithm is not initialized")]
    NotInitialized,
}

pub type AlgorithmResult<T> = Result<T, AlgorithmError>;

pub const FBP_TYPE: &str = "FBP_CUDA";

/// Arguments of the programmatic entry point.
///
/// `coefficients` is always copied. For [`FilterKind::Sinogram`] and
/// [`FilterKind::ReversedSinogram`] the copy holds one value per sinogram
/// angle and `width` only travels to the engine; every other kind copies
/// `width` values.
#[derive(Clone, Debug)]
pub struct DirectParams<'a> {
    pub filter: FilterKind,
    pub coefficients: Option<&'a [f32]>,
    pub width: usize,
    pub gpu_index: i32,
    pub parameter: f32,
}

impl<'a> DirectParams<'a> {
    pub fn new(filter: FilterKind) -> Self {
        Self {
            filter,
            coefficients: None,
            width: 0,
            gpu_index: 0,
            parameter: DEFAULT_PARAMETER,
        }
    }

    pub fn with_coefficients(mut self, coefficients: &'a [f32], width: usize) -> Self {
        self.coefficients = Some(coefficients);
        self.width = width;
        self
    }
    pub fn with_gpu_index(mut self, gpu_index: i32) -> Self {
        self.gpu_index = gpu_index;
        self
    }
    pub fn with_parameter(mut self, parameter: f32) -> Self {
        self.parameter = parameter;
        self
    }
}

/// Checks the invariants every assembled configuration must satisfy.
pub fn validate(config: &AlgorithmConfig) -> Result<(), CheckError> {
    let sinogram = config.sinogram.as_ref().ok_or(CheckError::MissingSinogram)?;
    let reconstruction = config
        .reconstruction
        .as_ref()
        .ok_or(CheckError::MissingReconstruction)?;

    if config.filter.kind.is_data_driven() && config.filter.coefficients.is_none() {
        return Err(CheckError::MissingFilterCoefficients(config.filter.kind));
    }

    if !sinogram.read().is_initialized() {
        return Err(CheckError::SinogramNotInitialized);
    }
    if !reconstruction.read().is_initialized() {
        return Err(CheckError::ReconstructionNotInitialized);
    }

    if config.gpu_index < -1 {
        return Err(CheckError::InvalidGpuIndex(config.gpu_index));
    }
    if config.pixel_supersampling < 0 {
        return Err(CheckError::InvalidPixelSupersampling(
            config.pixel_supersampling,
        ));
    }

    Ok(())
}

type EngineCtor<E> = dyn Fn() -> E;

/// Filtered back-projection on an accelerator engine.
///
/// The engine handle is created while configuring but only set up on the
/// first [`FbpAlgorithm::run`].
pub struct FbpAlgorithm<E: AcceleratorEngine> {
    config: AlgorithmConfig,
    initialized: bool,
    policy: EngineSetupPolicy,
    engine_ctor: Box<EngineCtor<E>>,
    engine: Option<E>,
    engine_initialized: bool,
}

impl<E: AcceleratorEngine + Default + 'static> Default for FbpAlgorithm<E> {
    fn default() -> Self {
        Self::new(E::default)
    }
}

impl<E: AcceleratorEngine> Debug for FbpAlgorithm<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FbpAlgorithm")
            .field("config", &self.config)
            .field("initialized", &self.initialized)
            .field("policy", &self.policy)
            .field("engine_created", &self.engine.is_some())
            .field("engine_initialized", &self.engine_initialized)
            .finish()
    }
}

impl<E: AcceleratorEngine> FbpAlgorithm<E> {
    pub const TYPE: &'static str = FBP_TYPE;

    pub fn new<F>(engine_ctor: F) -> Self
    where
        F: Fn() -> E + 'static,
    {
        Self {
            config: AlgorithmConfig::default(),
            initialized: false,
            policy: EngineSetupPolicy::default(),
            engine_ctor: Box::new(engine_ctor),
            engine: None,
            engine_initialized: false,
        }
    }

    pub fn config(&self) -> &AlgorithmConfig {
        &self.config
    }
    pub fn filter(&self) -> &FilterSpec {
        &self.config.filter
    }
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn engine(&self) -> Option<&E> {
        self.engine.as_ref()
    }
    pub fn engine_mut(&mut self) -> Option<&mut E> {
        self.engine.as_mut()
    }
    pub fn is_engine_initialized(&self) -> bool {
        self.engine_initialized
    }

    pub fn engine_setup_policy(&self) -> EngineSetupPolicy {
        self.policy
    }
    /// Kept across re-initialization; the declarative path overwrites it from `StrictEngineSetup`.
    pub fn set_engine_setup_policy(&mut self, policy: EngineSetupPolicy) {
        self.policy = policy;
    }

    /// Drops the filter buffer and the engine and returns to the uninitialized state.
    pub fn clear(&mut self) {
        self.config = AlgorithmConfig::default();
        self.engine = None;
        self.engine_initialized = false;
        self.initialized = false;
    }

    /// Declarative entry point.
    ///
    /// | node / option        | default   |
    /// |----------------------|-----------|
    /// | `FilterType`         | `ram-lak` |
    /// | `FilterSinogramId`   | none      |
    /// | `FilterParameter`    | `-1.0`    |
    /// | `FilterD`            | `1.0`     |
    /// | `ShortScan`          | `false`, fan-beam only |
    /// | `StrictEngineSetup`  | `false`   |
    pub fn initialize_from_config(
        &mut self,
        cfg: &mut Config,
        registry: &DataRegistry,
    ) -> AlgorithmResult<()> {
        self.clear();

        if let Some(algorithm_type) = cfg.algorithm_type() {
            if !algorithm_type.eq_ignore_ascii_case(FBP_TYPE) {
                return Err(AlgorithmError::WrongType(algorithm_type.to_string()));
            }
        }

        initialize_base(cfg, registry, &mut self.config)?;

        let filter = &mut self.config.filter;

        filter.kind = if cfg.has_node("FilterType") {
            FilterKind::resolve(&cfg.content_str("FilterType")?)
        } else {
            FilterKind::RamLak
        };
        cfg.mark_node_parsed("FilterType");

        if cfg.has_node("FilterSinogramId") {
            let id = cfg.content_int("FilterSinogramId")?;
            let source = registry.projection(id)?;
            let source = source.read();

            let width = source.detector_count();
            let expected = source.geometry().checked_element_count()?;
            let data = source.data();
            if data.len() != expected {
                return Err(AlgorithmError::FilterSourceMismatch {
                    id,
                    expected,
                    actual: data.len(),
                });
            }

            filter.width = width;
            filter.coefficients = Some(data.to_vec());
        } else {
            filter.width = 0;
            filter.coefficients = None;
        }
        cfg.mark_node_parsed("FilterSinogramId");

        filter.parameter = if cfg.has_node("FilterParameter") {
            cfg.content_numerical("FilterParameter")? as f32
        } else {
            DEFAULT_PARAMETER
        };
        cfg.mark_node_parsed("FilterParameter");

        filter.bandwidth = if cfg.has_node("FilterD") {
            cfg.content_numerical("FilterD")? as f32
        } else {
            DEFAULT_BANDWIDTH
        };
        cfg.mark_node_parsed("FilterD");

        if self.config.is_fan_beam() {
            self.config.short_scan = cfg.option_bool("ShortScan", false)?;
            cfg.mark_option_parsed("ShortScan");
        }

        self.policy = if cfg.option_bool("StrictEngineSetup", false)? {
            EngineSetupPolicy::Strict
        } else {
            EngineSetupPolicy::Permissive
        };
        cfg.mark_option_parsed("StrictEngineSetup");

        self.engine = Some((self.engine_ctor)());

        self.finish_check()
    }

    /// Programmatic entry point. Short-scan cannot be requested here and stays off.
    pub fn initialize(
        &mut self,
        sinogram: Option<Shared<ProjectionData2D>>,
        reconstruction: Option<Shared<VolumeData2D>>,
        params: DirectParams<'_>,
    ) -> AlgorithmResult<()> {
        self.clear();

        self.config.sinogram = sinogram;
        self.config.reconstruction = reconstruction;
        self.config.gpu_index = params.gpu_index;
        self.config.short_scan = false;

        let filter = &mut self.config.filter;
        filter.kind = params.filter;
        filter.width = params.width;
        filter.parameter = params.parameter;

        if let Some(source) = params.coefficients {
            let count = if params.filter.is_sinogram_sized() {
                self.config
                    .sinogram
                    .as_ref()
                    .map(|sinogram| sinogram.read().angle_count())
            } else {
                Some(params.width)
            };

            // without a sinogram the check below rejects the config anyway
            if let Some(count) = count {
                if source.len() < count {
                    return Err(AlgorithmError::FilterBufferTooShort {
                        expected: count,
                        actual: source.len(),
                    });
                }
                self.config.filter.coefficients = Some(source[..count].to_vec());
            }
        }

        self.engine = Some((self.engine_ctor)());

        self.finish_check()
    }

    /// Final gate of both entry points. Marks the algorithm initialized on success.
    pub fn check(&mut self) -> bool {
        self.run_check().is_ok()
    }

    fn run_check(&mut self) -> Result<(), CheckError> {
        match validate(&self.config) {
            Ok(()) => {
                self.initialized = true;
                Ok(())
            }
            Err(err) => {
                error!("{}: {}", FBP_TYPE, err);
                Err(err)
            }
        }
    }

    fn finish_check(&mut self) -> AlgorithmResult<()> {
        self.run_check()?;
        debug!(
            "{} configured: filter {}, width {}, D {}, parameter {}, short scan {}",
            FBP_TYPE,
            self.config.filter.kind,
            self.config.filter.width,
            self.config.filter.bandwidth,
            self.config.filter.parameter,
            self.config.short_scan
        );
        Ok(())
    }

    /// Reconstructs the sinogram into the reconstruction object.
    /// The engine is set up on the first call after initialization.
    pub fn run(&mut self) -> AlgorithmResult<()> {
        if !self.initialized {
            return Err(AlgorithmError::NotInitialized);
        }
        self.init_engine()?;

        let (Some(sinogram), Some(reconstruction)) =
            (&self.config.sinogram, &self.config.reconstruction)
        else {
            return Err(AlgorithmError::NotInitialized);
        };
        let engine = self.engine.as_mut().ok_or(AlgorithmError::NotInitialized)?;

        let sinogram = sinogram.read();
        let mut reconstruction = reconstruction.write();
        engine.reconstruct(sinogram.data(), reconstruction.data_mut())?;

        Ok(())
    }

    /// Sets up the engine once. A handle whose setup failed is dropped, so the
    /// next run starts again from a freshly constructed engine.
    fn init_engine(&mut self) -> AlgorithmResult<()> {
        if self.engine_initialized {
            return Ok(());
        }

        let mut engine = match self.engine.take() {
            Some(engine) => engine,
            None => (self.engine_ctor)(),
        };
        setup_engine(&mut engine, &self.config, self.policy)?;

        self.engine = Some(engine);
        self.engine_initialized = true;
        Ok(())
    }
}

fn setup_engine<E: AcceleratorEngine>(
    engine: &mut E,
    config: &AlgorithmConfig,
    policy: EngineSetupPolicy,
) -> AlgorithmResult<()> {
    let (Some(sinogram), Some(reconstruction)) = (&config.sinogram, &config.reconstruction)
    else {
        return Err(AlgorithmError::NotInitialized);
    };

    engine.set_gpu_index(config.gpu_index)?;
    engine.set_geometry(
        sinogram.read().geometry(),
        reconstruction.read().geometry(),
    )?;
    engine.set_supersampling(
        config.detector_supersampling,
        config.pixel_supersampling.max(0) as u32,
    )?;
    engine.init()?;

    let filter = &config.filter;
    let filter_result = engine.set_filter(
        filter.kind,
        filter.coefficients(),
        filter.width,
        filter.bandwidth,
        filter.parameter,
    );
    if let Err(err) = filter_result {
        error!("{}: Failed to set filter: {}", FBP_TYPE, err);
        if policy == EngineSetupPolicy::Strict {
            return Err(AlgorithmError::EngineSetup(err));
        }
    }

    if let Err(err) = engine.set_short_scan(config.short_scan) {
        error!("{}: Failed to set short-scan mode: {}", FBP_TYPE, err);
        if policy == EngineSetupPolicy::Strict {
            return Err(AlgorithmError::EngineSetup(err));
        }
    }

    Ok(())
}

/// Flat view of an assembled configuration, for reports.
#[derive(Clone, Debug, Serialize)]
pub struct ConfigSummary {
    pub algorithm: String,
    pub filter: String,
    pub filter_width: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_coefficients: Option<usize>,
    pub filter_d: f32,
    pub filter_parameter: f32,
    pub short_scan: bool,
    pub gpu_index: i32,
    pub pixel_supersampling: i32,
    pub detector_supersampling: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sinogram_shape: Option<[usize; 2]>,
    pub fan_beam: bool,
}

impl ConfigSummary {
    pub fn new(config: &AlgorithmConfig) -> Self {
        Self {
            algorithm: FBP_TYPE.to_string(),
            filter: config.filter.kind.to_string(),
            filter_width: config.filter.width,
            filter_coefficients: config.filter.coefficients().map(<[f32]>::len),
            filter_d: config.filter.bandwidth,
            filter_parameter: config.filter.parameter,
            short_scan: config.short_scan,
            gpu_index: config.gpu_index,
            pixel_supersampling: config.pixel_supersampling,
            detector_supersampling: config.detector_supersampling,
            sinogram_shape: config.sinogram.as_ref().map(|sinogram| {
                let sinogram = sinogram.read();
                [sinogram.angle_count(), sinogram.detector_count()]
            }),
            fan_beam: config.is_fan_beam(),
        }
    }

    pub fn to_yaml(&self) -> String {
        serde_yml::to_string(self)
            .expect("Failed to serialize config summary to YAML")
            .normalize()
    }
}
