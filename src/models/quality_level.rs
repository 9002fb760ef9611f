use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ProcessingError;
use crate::utils::constants::{LEVEL10_DIR, LEVEL15_DIR, LEVEL20_DIR};

/// AERONET processing tier of a data file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum QualityLevel {
    #[serde(rename = "lvl10", alias = "level10")]
    Level10,
    #[serde(rename = "lvl15", alias = "level15")]
    Level15,
    #[serde(rename = "lvl20", alias = "level20")]
    Level20,
}

impl QualityLevel {
    pub const ALL: [QualityLevel; 3] = [
        QualityLevel::Level10,
        QualityLevel::Level15,
        QualityLevel::Level20,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            QualityLevel::Level10 => "lvl10",
            QualityLevel::Level15 => "lvl15",
            QualityLevel::Level20 => "lvl20",
        }
    }

    pub fn tier(&self) -> f32 {
        match self {
            QualityLevel::Level10 => 1.0,
            QualityLevel::Level15 => 1.5,
            QualityLevel::Level20 => 2.0,
        }
    }

    pub fn default_dir(&self) -> &'static str {
        match self {
            QualityLevel::Level10 => LEVEL10_DIR,
            QualityLevel::Level15 => LEVEL15_DIR,
            QualityLevel::Level20 => LEVEL20_DIR,
        }
    }
}

impl fmt::Display for QualityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for QualityLevel {
    type Err = ProcessingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        let digits = normalized
            .trim_start_matches("level")
            .trim_start_matches("lvl")
            .replace('.', "");

        match digits.as_str() {
            "10" | "1" => Ok(QualityLevel::Level10),
            "15" => Ok(QualityLevel::Level15),
            "20" | "2" => Ok(QualityLevel::Level20),
            _ => Err(ProcessingError::InvalidQualityLevel(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_quality_level() {
        assert_eq!("1.0".parse::<QualityLevel>().unwrap(), QualityLevel::Level10);
        assert_eq!("lvl15".parse::<QualityLevel>().unwrap(), QualityLevel::Level15);
        assert_eq!("level20".parse::<QualityLevel>().unwrap(), QualityLevel::Level20);
        assert_eq!("2.0".parse::<QualityLevel>().unwrap(), QualityLevel::Level20);
        assert!("3.0".parse::<QualityLevel>().is_err());
    }

    #[test]
    fn test_level_metadata() {
        assert_eq!(QualityLevel::Level15.label(), "lvl15");
        assert_eq!(QualityLevel::Level15.default_dir(), "AOD_data_lvl15");
        assert_eq!(QualityLevel::Level20.tier(), 2.0);
        assert_eq!(QualityLevel::Level10.to_string(), "lvl10");
    }

    #[test]
    fn test_serialized_name_matches_label() {
        for level in QualityLevel::ALL {
            let json = serde_json::to_string(&level).unwrap();
            assert_eq!(json, format!("\"{}\"", level.label()));
            assert_eq!(serde_json::from_str::<QualityLevel>(&json).unwrap(), level);
        }
        let legacy: QualityLevel = serde_json::from_str("\"level15\"").unwrap();
        assert_eq!(legacy, QualityLevel::Level15);
    }
}
