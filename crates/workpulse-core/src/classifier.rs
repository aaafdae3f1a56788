//! Status text classification

use workpulse_config::MarkerConfig;

/// Which markers a status text contains
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatusMarks {
    pub start: bool,
    pub complete: bool,
}

impl StatusMarks {
    pub fn is_empty(&self) -> bool {
        !self.start && !self.complete
    }
}

/// Classifies status text by substring containment
#[derive(Debug, Clone)]
pub struct MarkerClassifier {
    start: String,
    complete: String,
}

impl MarkerClassifier {
    pub fn new(start: impl Into<String>, complete: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            complete: complete.into(),
        }
    }

    pub fn classify(&self, text: &str) -> StatusMarks {
        StatusMarks {
            start: text.contains(&self.start),
            complete: text.contains(&self.complete),
        }
    }

    pub fn start_marker(&self) -> &str {
        &self.start
    }

    pub fn complete_marker(&self) -> &str {
        &self.complete
    }
}

impl From<&MarkerConfig> for MarkerClassifier {
    fn from(config: &MarkerConfig) -> Self {
        Self::new(config.start.clone(), config.complete.clone())
    }
}

impl Default for MarkerClassifier {
    fn default() -> Self {
        Self::from(&MarkerConfig::default())
    }
}
