use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::DrError;

/// One of the twelve architectural layers, in catalog order.
///
/// The derived `Ord` follows declaration order, which is the layer order
/// (motivation first, testing last). "Upward" traceability points towards
/// lower orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerName {
    Motivation,
    Business,
    Security,
    Application,
    Technology,
    Api,
    DataModel,
    Datastore,
    Ux,
    Navigation,
    Observability,
    Testing,
}

impl LayerName {
    /// Every layer in catalog order
    pub const ALL: [LayerName; 12] = [
        LayerName::Motivation,
        LayerName::Business,
        LayerName::Security,
        LayerName::Application,
        LayerName::Technology,
        LayerName::Api,
        LayerName::DataModel,
        LayerName::Datastore,
        LayerName::Ux,
        LayerName::Navigation,
        LayerName::Observability,
        LayerName::Testing,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LayerName::Motivation => "motivation",
            LayerName::Business => "business",
            LayerName::Security => "security",
            LayerName::Application => "application",
            LayerName::Technology => "technology",
            LayerName::Api => "api",
            LayerName::DataModel => "data_model",
            LayerName::Datastore => "datastore",
            LayerName::Ux => "ux",
            LayerName::Navigation => "navigation",
            LayerName::Observability => "observability",
            LayerName::Testing => "testing",
        }
    }

    /// 1-based position in the catalog
    pub fn order(&self) -> u32 {
        LayerName::ALL
            .iter()
            .position(|l| l == self)
            .map(|p| p as u32 + 1)
            .unwrap_or(0)
    }

    /// Default storage directory, e.g. `02_business`
    pub fn default_dir(&self) -> String {
        format!("{:02}_{}", self.order(), self.as_str())
    }
}

impl fmt::Display for LayerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LayerName {
    type Err = DrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        LayerName::ALL
            .iter()
            .copied()
            .find(|l| l.as_str() == normalized)
            .ok_or_else(|| DrError::UnknownLayer {
                layer: s.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_matches_catalog() {
        assert_eq!(LayerName::Motivation.order(), 1);
        assert_eq!(LayerName::Testing.order(), 12);
        assert!(LayerName::Motivation < LayerName::Business);
    }

    #[test]
    fn test_default_dir() {
        assert_eq!(LayerName::Business.default_dir(), "02_business");
        assert_eq!(LayerName::DataModel.default_dir(), "07_data_model");
    }

    #[test]
    fn test_parse_accepts_kebab_case() {
        assert_eq!("data-model".parse::<LayerName>().unwrap(), LayerName::DataModel);
        assert!(matches!(
            "finance".parse::<LayerName>(),
            Err(DrError::UnknownLayer { .. })
        ));
    }
}
