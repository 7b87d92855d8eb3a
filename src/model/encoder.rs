use serde::Deserialize;

/// Frozen categorical encoder for weather conditions, exported by the
/// offline training run. Classes are stored in sorted order (label-encoder
/// convention) and the numeric code of a category is its index in that list.
/// Queried at request time, never updated.
#[derive(Deserialize, Clone, Debug)]
pub struct WeatherEncoder {
    classes: Vec<String>,
}

impl WeatherEncoder {
    pub fn new(classes: Vec<String>) -> Self {
        Self { classes }
    }

    /// Numeric code for a category, or `None` when it lies outside the
    /// known set. Deterministic and total over `known_categories`.
    pub fn encode(&self, category: &str) -> Option<usize> {
        self.classes.iter().position(|c| c == category)
    }

    pub fn known_categories(&self) -> &[String] {
        &self.classes
    }
}
