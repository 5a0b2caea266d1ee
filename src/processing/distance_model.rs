//! Log-distance path-loss model converting RSSI to distance

use crate::core::FEET_PER_METER;
use crate::validation::error::{LocalizationError, LocalizationResult};

/// Log-distance path-loss model: `d = 10^((RSSI0 - rssi) / (10 n))` meters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistanceModel {
    /// Signal strength at 1 meter (dBm)
    rssi0: f64,
    /// Path-loss exponent
    n: f64,
}

impl DistanceModel {
    pub fn new(rssi0: f64, n: f64) -> LocalizationResult<Self> {
        if !rssi0.is_finite() {
            return Err(LocalizationError::InvalidModelParameter { parameter: "rssi0", value: rssi0 });
        }
        if !n.is_finite() || n == 0.0 {
            return Err(LocalizationError::InvalidModelParameter { parameter: "n", value: n });
        }
        Ok(Self { rssi0, n })
    }

    pub fn rssi0(&self) -> f64 {
        self.rssi0
    }

    pub fn path_loss_exponent(&self) -> f64 {
        self.n
    }

    /// Distance in feet for a reading in dBm
    pub fn distance_from_rssi(&self, rssi: f64) -> f64 {
        let meters = 10f64.powf((self.rssi0 - rssi) / (10.0 * self.n));
        meters * FEET_PER_METER
    }

    /// Reading in dBm that maps back to `distance_ft`
    pub fn rssi_from_distance(&self, distance_ft: f64) -> f64 {
        let meters = distance_ft / FEET_PER_METER;
        self.rssi0 - 10.0 * self.n * meters.log10()
    }

    /// Replace the reference strength; samples already converted keep their distances
    pub fn recalibrate(&mut self, rssi0: f64) -> LocalizationResult<()> {
        if !rssi0.is_finite() {
            return Err(LocalizationError::InvalidModelParameter { parameter: "rssi0", value: rssi0 });
        }
        self.rssi0 = rssi0;
        Ok(())
    }
}
