use std::str::FromStr;

use strum_macros::{Display, EnumIter, EnumString};
use tracing::error;

/// Bandwidth multiplier ("D") applied to the filter cutoff when none is configured.
pub const DEFAULT_BANDWIDTH: f32 = 1.0;
/// Negative shape parameter lets the engine pick the filter's own default.
pub const DEFAULT_PARAMETER: f32 = -1.0;

/// Frequency-domain filters understood by the accelerator engine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Display, EnumIter, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum FilterKind {
    #[strum(to_string = "none")]
    None,
    #[default]
    #[strum(to_string = "ram-lak")]
    RamLak,
    #[strum(to_string = "shepp-logan")]
    SheppLogan,
    #[strum(to_string = "cosine")]
    Cosine,
    #[strum(to_string = "hamming")]
    Hamming,
    #[strum(to_string = "hann")]
    Hann,
    #[strum(to_string = "tukey")]
    Tukey,
    #[strum(to_string = "lanczos")]
    Lanczos,
    #[strum(to_string = "triangular")]
    Triangular,
    #[strum(to_string = "gaussian")]
    Gaussian,
    #[strum(to_string = "barlett-hann")]
    BartlettHann,
    #[strum(to_string = "blackman")]
    Blackman,
    #[strum(to_string = "nuttall")]
    Nuttall,
    #[strum(to_string = "blackman-harris")]
    BlackmanHarris,
    #[strum(to_string = "blackman-nuttall")]
    BlackmanNuttall,
    #[strum(to_string = "flat-top")]
    FlatTop,
    #[strum(to_string = "kaiser")]
    Kaiser,
    #[strum(to_string = "parzen")]
    Parzen,
    #[strum(to_string = "projection")]
    Projection,
    #[strum(to_string = "sinogram")]
    Sinogram,
    #[strum(to_string = "rprojection")]
    ReversedProjection,
    #[strum(to_string = "rsinogram")]
    ReversedSinogram,
}

impl FilterKind {
    /// Maps a configured filter name to its kind, ignoring ASCII case.
    ///
    /// Unknown names are not fatal: the miss is logged and `FilterKind::None`
    /// is returned so that configuration can proceed.
    pub fn resolve(name: &str) -> FilterKind {
        match FilterKind::from_str(name) {
            Ok(kind) => kind,
            Err(_) => {
                error!("Failed to convert \"{}\" into a filter.", name);
                FilterKind::None
            }
        }
    }

    /// Kinds whose response comes from caller-provided coefficients.
    pub fn is_data_driven(&self) -> bool {
        matches!(
            self,
            FilterKind::Projection
                | FilterKind::Sinogram
                | FilterKind::ReversedProjection
                | FilterKind::ReversedSinogram
        )
    }

    /// Kinds whose coefficient buffer holds one value per projection angle.
    pub fn is_sinogram_sized(&self) -> bool {
        matches!(self, FilterKind::Sinogram | FilterKind::ReversedSinogram)
    }
}

/// Fully resolved filter handed to the engine.
#[derive(Clone, Debug, PartialEq)]
pub struct FilterSpec {
    pub kind: FilterKind,
    pub coefficients: Option<Vec<f32>>,
    pub width: usize,
    pub bandwidth: f32,
    pub parameter: f32,
}

impl Default for FilterSpec {
    fn default() -> Self {
        Self {
            kind: FilterKind::default(),
            coefficients: None,
            width: 0,
            bandwidth: DEFAULT_BANDWIDTH,
            parameter: DEFAULT_PARAMETER,
        }
    }
}

impl FilterSpec {
    pub fn coefficients(&self) -> Option<&[f32]> {
        self.coefficients.as_deref()
    }
}
