use std::path::Path;

use common::file_format::SerdeFormat;
use serde::Deserialize;

use crate::config::Config;
use crate::data::{
    Data2D, DataRegistry, DataResult, ProjectionData2D, ProjectionGeometry2D, VolumeData2D,
    VolumeGeometry2D,
};
use common::Shared;

#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum DataEntry {
    Projection {
        id: i64,
        geometry: ProjectionGeometry2D,
        #[serde(default)]
        values: Option<Vec<f32>>,
    },
    Volume {
        id: i64,
        geometry: VolumeGeometry2D,
        #[serde(default)]
        values: Option<Vec<f32>>,
    },
}

/// Data objects plus one algorithm config tree, as read by `fbp_check`.
#[derive(Clone, Debug, Deserialize)]
pub struct Scene {
    #[serde(default)]
    pub data: Vec<DataEntry>,
    pub algorithm: Config,
}

impl Scene {
    pub fn from_yaml(yaml: &str) -> anyhow::Result<Scene> {
        Ok(serde_yml::from_str(yaml)?)
    }
    pub fn from_json(json: &str) -> anyhow::Result<Scene> {
        Ok(serde_json::from_str(json)?)
    }
    pub fn from_file(path: &Path) -> anyhow::Result<Scene> {
        let format = SerdeFormat::from_path(path)?;
        let text = std::fs::read_to_string(path)?;
        match format {
            SerdeFormat::Yaml => Self::from_yaml(&text),
            SerdeFormat::Json => Self::from_json(&text),
        }
    }

    /// Registers every data entry under its declared id.
    pub fn build_registry(&self) -> DataResult<DataRegistry> {
        let mut registry = DataRegistry::default();

        for entry in self.data.iter() {
            match entry {
                DataEntry::Projection {
                    id,
                    geometry,
                    values,
                } => {
                    let geometry = geometry.clone();
                    let data = match values {
                        Some(values) => ProjectionData2D::with_data(geometry, values.clone())?,
                        None => ProjectionData2D::new(geometry)?,
                    };
                    registry.insert(*id, Data2D::Projection(Shared::new(data)));
                }
                DataEntry::Volume {
                    id,
                    geometry,
                    values,
                } => {
                    let data = match values {
                        Some(values) => VolumeData2D::with_data(*geometry, values.clone())?,
                        None => VolumeData2D::new(*geometry)?,
                    };
                    registry.insert(*id, Data2D::Volume(Shared::new(data)));
                }
            }
        }

        Ok(registry)
    }
}
