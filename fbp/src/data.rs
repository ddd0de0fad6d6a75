use common::Shared;
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DataError {
    #[error("Data buffer holds {actual} values, geometry requires {expected}.")]
    SizeMismatch { expected: usize, actual: usize },
    #[error("No data object is registered under id {0}.")]
    UnknownId(i64),
    #[error("Data object {id} is not {expected} data.")]
    WrongKind { id: i64, expected: &'static str },
    #[error("Geometry of {0} by {1} elements does not fit in memory.")]
    SizeOverflow(usize, usize),
}

pub type DataResult<T> = Result<T, DataError>;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParallelGeometry {
    pub detector_count: usize,
    pub detector_width: f32,
    pub angles: Vec<f32>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FanFlatGeometry {
    pub detector_count: usize,
    pub detector_width: f32,
    pub angles: Vec<f32>,
    pub source_origin: f32,
    pub origin_detector: f32,
}

/// Acquisition geometry of a sinogram. Only the shape and the beam type matter here.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProjectionGeometry2D {
    Parallel(ParallelGeometry),
    FanFlat(FanFlatGeometry),
}

impl ProjectionGeometry2D {
    pub fn detector_count(&self) -> usize {
        match self {
            ProjectionGeometry2D::Parallel(geometry) => geometry.detector_count,
            ProjectionGeometry2D::FanFlat(geometry) => geometry.detector_count,
        }
    }

    pub fn projection_angle_count(&self) -> usize {
        self.angles().len()
    }

    pub fn angles(&self) -> &[f32] {
        match self {
            ProjectionGeometry2D::Parallel(geometry) => &geometry.angles,
            ProjectionGeometry2D::FanFlat(geometry) => &geometry.angles,
        }
    }

    pub fn is_fan_beam(&self) -> bool {
        matches!(self, ProjectionGeometry2D::FanFlat(_))
    }

    /// `None` when the shape does not fit in `usize`.
    pub fn element_count(&self) -> Option<usize> {
        self.detector_count().checked_mul(self.projection_angle_count())
    }

    pub fn checked_element_count(&self) -> DataResult<usize> {
        self.element_count().ok_or(DataError::SizeOverflow(
            self.projection_angle_count(),
            self.detector_count(),
        ))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeGeometry2D {
    pub cols: usize,
    pub rows: usize,
}

impl VolumeGeometry2D {
    pub fn element_count(&self) -> Option<usize> {
        self.cols.checked_mul(self.rows)
    }

    pub fn checked_element_count(&self) -> DataResult<usize> {
        self.element_count().ok_or(DataError::SizeOverflow(self.rows, self.cols))
    }
}

/// Sinogram: `angle_count` rows of `detector_count` values.
#[derive(Clone, Debug)]
pub struct ProjectionData2D {
    geometry: ProjectionGeometry2D,
    data: Vec<f32>,
    initialized: bool,
}

impl ProjectionData2D {
    pub fn new(geometry: ProjectionGeometry2D) -> DataResult<Self> {
        let data = vec![0.0; geometry.checked_element_count()?];
        Ok(Self {
            geometry,
            data,
            initialized: true,
        })
    }

    /// A placeholder that has a geometry but is not usable yet.
    pub fn uninitialized(geometry: ProjectionGeometry2D) -> Self {
        Self {
            geometry,
            data: Vec::new(),
            initialized: false,
        }
    }

    pub fn with_data(geometry: ProjectionGeometry2D, data: Vec<f32>) -> DataResult<Self> {
        check_size(geometry.checked_element_count()?, data.len())?;
        Ok(Self {
            geometry,
            data,
            initialized: true,
        })
    }

    pub fn geometry(&self) -> &ProjectionGeometry2D {
        &self.geometry
    }
    pub fn angle_count(&self) -> usize {
        self.geometry.projection_angle_count()
    }
    pub fn detector_count(&self) -> usize {
        self.geometry.detector_count()
    }
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }
    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }
}

#[derive(Clone, Debug)]
pub struct VolumeData2D {
    geometry: VolumeGeometry2D,
    data: Vec<f32>,
    initialized: bool,
}

impl VolumeData2D {
    pub fn new(geometry: VolumeGeometry2D) -> DataResult<Self> {
        Ok(Self {
            geometry,
            data: vec![0.0; geometry.checked_element_count()?],
            initialized: true,
        })
    }

    pub fn uninitialized(geometry: VolumeGeometry2D) -> Self {
        Self {
            geometry,
            data: Vec::new(),
            initialized: false,
        }
    }

    pub fn with_data(geometry: VolumeGeometry2D, data: Vec<f32>) -> DataResult<Self> {
        check_size(geometry.checked_element_count()?, data.len())?;
        Ok(Self {
            geometry,
            data,
            initialized: true,
        })
    }

    pub fn geometry(&self) -> &VolumeGeometry2D {
        &self.geometry
    }
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }
    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }
}

fn check_size(expected: usize, actual: usize) -> DataResult<()> {
    if expected != actual {
        return Err(DataError::SizeMismatch { expected, actual });
    }
    Ok(())
}

#[derive(Clone, Debug)]
pub enum Data2D {
    Projection(Shared<ProjectionData2D>),
    Volume(Shared<VolumeData2D>),
}

impl Data2D {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Data2D::Projection(_) => "projection",
            Data2D::Volume(_) => "volume",
        }
    }
}

/// Named-data store: objects are registered once and looked up by integer handle.
#[derive(Debug)]
pub struct DataRegistry {
    store: HashMap<i64, Data2D>,
    next_id: i64,
}

impl Default for DataRegistry {
    fn default() -> Self {
        Self {
            store: HashMap::new(),
            next_id: 1,
        }
    }
}

impl DataRegistry {
    pub fn store_projection(&mut self, data: ProjectionData2D) -> i64 {
        self.store(Data2D::Projection(Shared::new(data)))
    }
    pub fn store_volume(&mut self, data: VolumeData2D) -> i64 {
        self.store(Data2D::Volume(Shared::new(data)))
    }

    pub fn store(&mut self, data: Data2D) -> i64 {
        let id = self.next_id;
        self.next_id += 1;
        self.store.insert(id, data);
        id
    }

    /// Registers `data` under a caller-chosen handle, replacing whatever was there.
    pub fn insert(&mut self, id: i64, data: Data2D) -> Option<Data2D> {
        self.next_id = self.next_id.max(id + 1);
        self.store.insert(id, data)
    }

    pub fn get(&self, id: i64) -> Option<&Data2D> {
        self.store.get(&id)
    }

    pub fn projection(&self, id: i64) -> DataResult<Shared<ProjectionData2D>> {
        match self.store.get(&id) {
            Some(Data2D::Projection(data)) => Ok(data.clone()),
            Some(_) => Err(DataError::WrongKind {
                id,
                expected: "projection",
            }),
            None => Err(DataError::UnknownId(id)),
        }
    }

    pub fn volume(&self, id: i64) -> DataResult<Shared<VolumeData2D>> {
        match self.store.get(&id) {
            Some(Data2D::Volume(data)) => Ok(data.clone()),
            Some(_) => Err(DataError::WrongKind {
                id,
                expected: "volume",
            }),
            None => Err(DataError::UnknownId(id)),
        }
    }

    pub fn remove(&mut self, id: i64) -> Option<Data2D> {
        self.store.remove(&id)
    }
    pub fn clear(&mut self) {
        self.store.clear();
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}
