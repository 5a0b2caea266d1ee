//! Physical constants and system parameters

/// Feet per meter, used to report path-loss distances in feet
pub const FEET_PER_METER: f64 = 3.28084;

/// Reference signal strength at 1 meter for the reference deployment (dBm)
pub const DEFAULT_RSSI0_DBM: f64 = -36.0;

/// Path-loss exponent for free space
pub const DEFAULT_PATH_LOSS_EXPONENT: f64 = 2.0;

/// Samples kept per anchor in the multi-read window
pub const DEFAULT_BUFFER_CAPACITY: usize = 100;

/// Default outlier threshold (standard deviations for z-score, IQR multiples for IQR)
pub const DEFAULT_OUTLIER_THRESHOLD: f64 = 2.0;

/// Averaged distances above this are treated as implausible (feet)
pub const DEFAULT_DISTANCE_CEILING_FT: f64 = 1000.0;

/// Independent distance constraints needed for a 2-D fix
pub const MIN_ANCHORS_2D: usize = 3;

/// Side of the reference square deployment (feet)
pub const DEPLOYMENT_SIDE_FT: f64 = 300.0;

/// Margin added around the deployment to form the solver bounding box (feet)
pub const BOUNDS_MARGIN_FT: f64 = 50.0;

/// Plausible RSSI range accepted at ingestion (dBm)
pub const MIN_PLAUSIBLE_RSSI_DBM: f64 = -120.0;
pub const MAX_PLAUSIBLE_RSSI_DBM: f64 = 0.0;

/// Tower table of the reference 300 ft x 300 ft deployment: (name, x, y, bssid)
pub const REFERENCE_TOWERS: [(&str, f64, f64, &str); 4] = [
    ("Tower 1", 0.0, 0.0, "94:2a:6f:22:d1:7c"),
    ("Tower 2", 300.0, 0.0, "9a:2a:6f:22:d6:77"),
    ("Tower 3", 300.0, 300.0, "9a:2a:6f:24:9f:09"),
    ("Tower 4", 0.0, 300.0, "9a:2a:6f:22:a2:7e"),
];
