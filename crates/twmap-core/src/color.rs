use serde::{Deserialize, Serialize};
use twmap_model::{ColorDomain, ColorKey};

/// Value-to-color classification. The actual colors belong to the render sink.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorScale {
    /// Continuous ramp over the calibrated domain.
    #[default]
    Sequential,
    /// Stepped legend. A value's class is the number of breaks strictly below it.
    Thresholds(Vec<f64>),
}

impl ColorScale {
    pub fn classify(&self, value: Option<f64>, domain: &ColorDomain) -> ColorKey {
        let Some(value) = value else {
            return ColorKey::NoData;
        };
        match self {
            Self::Sequential => ColorKey::Ramp(domain.position(value)),
            Self::Thresholds(breaks) => {
                ColorKey::Class(breaks.iter().filter(|limit| value > **limit).count())
            }
        }
    }

    /// Number of distinct classes, `None` for a continuous ramp.
    pub fn classes(&self) -> Option<usize> {
        match self {
            Self::Sequential => None,
            Self::Thresholds(breaks) => Some(breaks.len() + 1),
        }
    }
}
