use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::info;

use crate::algorithms::availability::AvailabilityPolicy;
use crate::algorithms::solver::{InitialGuess, SolverSettings};
use crate::core::{
    Anchor, AnchorId, Point2, DEFAULT_BUFFER_CAPACITY, DEFAULT_DISTANCE_CEILING_FT, DEFAULT_OUTLIER_THRESHOLD,
    DEFAULT_PATH_LOSS_EXPONENT, DEFAULT_RSSI0_DBM, MAX_PLAUSIBLE_RSSI_DBM, MIN_ANCHORS_2D, MIN_PLAUSIBLE_RSSI_DBM,
    REFERENCE_TOWERS,
};
use crate::processing::distance_model::DistanceModel;
use crate::processing::outlier::OutlierFilter;
use crate::validation::data::SampleValidator;
use crate::validation::error::{LocalizationError, LocalizationResult};

/// Complete startup configuration; immutable once a `Localizer` is built
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    /// Anchor table, in the order anchors are reported
    pub anchors: Vec<AnchorConfig>,
    /// Path-loss model parameters
    pub model: ModelConfig,
    /// Per-anchor sample window
    pub buffer: BufferConfig,
    /// Batch outlier rejection
    pub filter: FilterConfig,
    /// Anchor eligibility thresholds
    pub availability: AvailabilityConfig,
    /// Least-squares solver settings
    pub solver: SolverSettings,
    /// Plausible range for incoming readings
    pub sample_range: SampleRangeConfig,
}

/// Individual anchor configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnchorConfig {
    /// Unique anchor name
    pub name: String,
    /// East coordinate (feet)
    pub x_ft: f64,
    /// North coordinate (feet)
    pub y_ft: f64,
    /// Hardware address the scanner reports for this anchor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bssid: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Signal strength at 1 meter (dBm)
    pub rssi0_dbm: f64,
    /// Path-loss exponent
    pub path_loss_exponent: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BufferConfig {
    /// Samples kept per anchor
    pub capacity: usize,
    /// Samples required before an anchor is used
    pub min_samples: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// `z_score` or `iqr`
    pub method: String,
    pub threshold: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AvailabilityConfig {
    /// Averaged distances above this are implausible (feet)
    pub distance_ceiling_ft: f64,
    /// Eligible anchors required for a fix (at least 3)
    pub min_anchors: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SampleRangeConfig {
    pub min_dbm: f64,
    pub max_dbm: f64,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            anchors: REFERENCE_TOWERS
                .iter()
                .map(|&(name, x, y, bssid)| AnchorConfig {
                    name: name.to_string(),
                    x_ft: x,
                    y_ft: y,
                    bssid: Some(bssid.to_string()),
                })
                .collect(),
            model: ModelConfig::default(),
            buffer: BufferConfig::default(),
            filter: FilterConfig::default(),
            availability: AvailabilityConfig::default(),
            solver: SolverSettings::default(),
            sample_range: SampleRangeConfig::default(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            rssi0_dbm: DEFAULT_RSSI0_DBM,
            path_loss_exponent: DEFAULT_PATH_LOSS_EXPONENT,
        }
    }
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_BUFFER_CAPACITY,
            min_samples: 1,
        }
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            method: "z_score".to_string(),
            threshold: DEFAULT_OUTLIER_THRESHOLD,
        }
    }
}

impl Default for AvailabilityConfig {
    fn default() -> Self {
        Self {
            distance_ceiling_ft: DEFAULT_DISTANCE_CEILING_FT,
            min_anchors: MIN_ANCHORS_2D,
        }
    }
}

impl Default for SampleRangeConfig {
    fn default() -> Self {
        Self {
            min_dbm: MIN_PLAUSIBLE_RSSI_DBM,
            max_dbm: MAX_PLAUSIBLE_RSSI_DBM,
        }
    }
}

impl SystemConfig {
    /// Load and validate a JSON configuration file
    pub fn from_file<P: AsRef<Path>>(path: P) -> LocalizationResult<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config = Self::from_json(&content)?;
        info!(path = %path.as_ref().display(), anchors = config.anchors.len(), "configuration loaded");
        Ok(config)
    }

    /// Parse and validate a JSON configuration document
    pub fn from_json(content: &str) -> LocalizationResult<Self> {
        let config: SystemConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> LocalizationResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> LocalizationResult<()> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn with_anchors<I, S>(mut self, anchors: I) -> Self
    where
        I: IntoIterator<Item = (S, f64, f64)>,
        S: Into<String>,
    {
        self.anchors = anchors
            .into_iter()
            .map(|(name, x_ft, y_ft)| AnchorConfig { name: name.into(), x_ft, y_ft, bssid: None })
            .collect();
        self
    }

    pub fn with_buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer.capacity = capacity;
        self
    }

    pub fn with_min_samples(mut self, min_samples: usize) -> Self {
        self.buffer.min_samples = min_samples;
        self
    }

    pub fn with_filter(mut self, method: &str, threshold: f64) -> Self {
        self.filter = FilterConfig { method: method.to_string(), threshold };
        self
    }

    pub fn with_distance_ceiling(mut self, ceiling_ft: f64) -> Self {
        self.availability.distance_ceiling_ft = ceiling_ft;
        self
    }

    pub fn with_initial_guess(mut self, guess: InitialGuess) -> Self {
        self.solver.initial_guess = guess;
        self
    }

    /// Check every section, failing on the first problem found
    pub fn validate(&self) -> LocalizationResult<()> {
        self.validate_anchors()?;
        self.distance_model()?;
        self.outlier_filter()?;
        self.sample_validator()?;

        if self.buffer.capacity == 0 {
            return Err(LocalizationError::config("buffer.capacity", "must be at least 1"));
        }
        if self.buffer.min_samples == 0 || self.buffer.min_samples > self.buffer.capacity {
            return Err(LocalizationError::config(
                "buffer.min_samples",
                format!("must be between 1 and capacity ({})", self.buffer.capacity),
            ));
        }

        let ceiling = self.availability.distance_ceiling_ft;
        if !ceiling.is_finite() || ceiling <= 0.0 {
            return Err(LocalizationError::config(
                "availability.distance_ceiling_ft",
                format!("must be a positive finite distance, got {}", ceiling),
            ));
        }
        if self.availability.min_anchors < MIN_ANCHORS_2D || self.availability.min_anchors > self.anchors.len() {
            return Err(LocalizationError::config(
                "availability.min_anchors",
                format!("must be between {} and the number of anchors ({})", MIN_ANCHORS_2D, self.anchors.len()),
            ));
        }

        self.validate_solver()
    }

    fn validate_anchors(&self) -> LocalizationResult<()> {
        if self.anchors.len() < MIN_ANCHORS_2D {
            return Err(LocalizationError::config(
                "anchors",
                format!("at least {} anchors required, {} configured", MIN_ANCHORS_2D, self.anchors.len()),
            ));
        }

        let mut names = HashSet::new();
        let mut bssids = HashSet::new();
        for anchor in &self.anchors {
            if anchor.name.trim().is_empty() {
                return Err(LocalizationError::config("anchors.name", "anchor names must not be empty"));
            }
            if !names.insert(anchor.name.as_str()) {
                return Err(LocalizationError::config("anchors.name", format!("duplicate anchor {}", anchor.name)));
            }
            if !anchor.x_ft.is_finite() || !anchor.y_ft.is_finite() {
                return Err(LocalizationError::config(
                    "anchors.position",
                    format!("{} has a non-finite position", anchor.name),
                ));
            }
            if let Some(bssid) = &anchor.bssid {
                if !bssids.insert(bssid.to_ascii_lowercase()) {
                    return Err(LocalizationError::config("anchors.bssid", format!("duplicate address {}", bssid)));
                }
            }
        }
        Ok(())
    }

    fn validate_solver(&self) -> LocalizationResult<()> {
        let solver = &self.solver;
        if !solver.bounds.is_valid() {
            return Err(LocalizationError::config("solver.bounds", "bounds must be finite with min < max"));
        }
        if solver.max_iterations == 0 {
            return Err(LocalizationError::config("solver.max_iterations", "must be at least 1"));
        }
        for (name, tol) in [("solver.ftol", solver.ftol), ("solver.xtol", solver.xtol), ("solver.gtol", solver.gtol)] {
            if !tol.is_finite() || tol <= 0.0 {
                return Err(LocalizationError::config(name, format!("must be a positive finite tolerance, got {}", tol)));
            }
        }
        if let InitialGuess::Fixed { x, y } = solver.initial_guess {
            if !x.is_finite() || !y.is_finite() {
                return Err(LocalizationError::config("solver.initial_guess", "fixed guess must be finite"));
            }
        }
        Ok(())
    }

    /// Validated anchor table, ids assigned in configuration order
    pub fn anchor_table(&self) -> Vec<Anchor> {
        self.anchors
            .iter()
            .enumerate()
            .map(|(i, a)| Anchor {
                id: AnchorId(i),
                name: a.name.clone(),
                position: Point2::new(a.x_ft, a.y_ft),
                bssid: a.bssid.clone(),
            })
            .collect()
    }

    pub fn distance_model(&self) -> LocalizationResult<DistanceModel> {
        DistanceModel::new(self.model.rssi0_dbm, self.model.path_loss_exponent)
    }

    pub fn outlier_filter(&self) -> LocalizationResult<OutlierFilter> {
        OutlierFilter::from_name(&self.filter.method, self.filter.threshold)
    }

    pub fn sample_validator(&self) -> LocalizationResult<SampleValidator> {
        SampleValidator::new(self.sample_range.min_dbm, self.sample_range.max_dbm)
    }

    pub fn availability_policy(&self) -> AvailabilityPolicy {
        AvailabilityPolicy {
            distance_ceiling_ft: self.availability.distance_ceiling_ft,
            min_samples: self.buffer.min_samples,
            min_anchors: self.availability.min_anchors,
        }
    }
}
