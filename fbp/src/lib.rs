pub mod algorithm;
pub mod config;
pub mod data;
pub mod engine;
pub mod filter;
pub mod reconstruction;
pub mod scene;

#[cfg(test)]
mod tests;

pub mod prelude {
    pub use crate::algorithm::{
        validate, AlgorithmError, AlgorithmResult, CheckError, ConfigSummary, DirectParams,
        FbpAlgorithm,
    };
    pub use crate::config::{Config, ConfigError};
    pub use crate::data::{
        Data2D, DataRegistry, FanFlatGeometry, ParallelGeometry, ProjectionData2D,
        ProjectionGeometry2D, VolumeData2D, VolumeGeometry2D,
    };
    pub use crate::engine::{AcceleratorEngine, EngineError, EngineResult, EngineSetupPolicy};
    pub use crate::filter::{FilterKind, FilterSpec};
    pub use crate::reconstruction::AlgorithmConfig;
}
