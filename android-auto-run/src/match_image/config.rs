//! Configuration for template matching

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchConfig {
    /// Difference threshold for templates loaded without an explicit one (0.0 to 1.0)
    pub default_threshold: f64,
    /// Gaussian blur applied before edge detection
    pub blur_sigma: f32,
    /// Canny hysteresis low threshold
    pub canny_low: f32,
    /// Canny hysteresis high threshold
    pub canny_high: f32,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            default_threshold: 0.05,
            blur_sigma: 1.0,
            canny_low: 255.0 / 3.0,
            canny_high: 255.0,
        }
    }
}

/// Configuration for screen-sized masked templates of static UI
pub fn create_default_config() -> MatchConfig {
    MatchConfig::default()
}

/// Configuration preset for animated or anti-aliased elements located through edge maps
pub fn create_edge_config() -> MatchConfig {
    MatchConfig {
        default_threshold: 0.25,
        ..MatchConfig::default()
    }
}
