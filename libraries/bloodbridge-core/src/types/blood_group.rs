/// ABO/Rh blood groups
use crate::error::{BloodBridgeError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the eight ABO/Rh blood groups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BloodGroup {
    #[serde(rename = "A+")]
    APositive,
    #[serde(rename = "A-")]
    ANegative,
    #[serde(rename = "B+")]
    BPositive,
    #[serde(rename = "B-")]
    BNegative,
    #[serde(rename = "AB+")]
    AbPositive,
    #[serde(rename = "AB-")]
    AbNegative,
    #[serde(rename = "O+")]
    OPositive,
    #[serde(rename = "O-")]
    ONegative,
}

impl BloodGroup {
    /// Stored representation
    pub fn as_str(&self) -> &'static str {
        match self {
            BloodGroup::APositive => "A+",
            BloodGroup::ANegative => "A-",
            BloodGroup::BPositive => "B+",
            BloodGroup::BNegative => "B-",
            BloodGroup::AbPositive => "AB+",
            BloodGroup::AbNegative => "AB-",
            BloodGroup::OPositive => "O+",
            BloodGroup::ONegative => "O-",
        }
    }
}

impl fmt::Display for BloodGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BloodGroup {
    type Err = BloodBridgeError;

    /// Case-insensitive. An unencoded `+` in a query string arrives as a
    /// space, so `"AB "` parses as `AB+`.
    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim_start();
        let normalized = if trimmed.ends_with(' ') && !trimmed.trim_end().ends_with(['+', '-']) {
            format!("{}+", trimmed.trim_end())
        } else {
            trimmed.trim_end().to_string()
        };

        match normalized.to_ascii_uppercase().as_str() {
            "A+" => Ok(BloodGroup::APositive),
            "A-" => Ok(BloodGroup::ANegative),
            "B+" => Ok(BloodGroup::BPositive),
            "B-" => Ok(BloodGroup::BNegative),
            "AB+" => Ok(BloodGroup::AbPositive),
            "AB-" => Ok(BloodGroup::AbNegative),
            "O+" => Ok(BloodGroup::OPositive),
            "O-" => Ok(BloodGroup::ONegative),
            _ => Err(BloodBridgeError::invalid_input(format!(
                "unknown blood group '{}'",
                s.trim()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_canonical() {
        assert_eq!("AB-".parse::<BloodGroup>().unwrap(), BloodGroup::AbNegative);
        assert_eq!("o+".parse::<BloodGroup>().unwrap(), BloodGroup::OPositive);
    }

    #[test]
    fn test_parse_space_as_plus() {
        assert_eq!("A ".parse::<BloodGroup>().unwrap(), BloodGroup::APositive);
        assert_eq!("AB ".parse::<BloodGroup>().unwrap(), BloodGroup::AbPositive);
    }

    #[test]
    fn test_parse_rejects_unknown() {
        assert!("C+".parse::<BloodGroup>().is_err());
        assert!("A".parse::<BloodGroup>().is_err());
        assert!("".parse::<BloodGroup>().is_err());
    }

    #[test]
    fn test_display_matches_serde() {
        let group = BloodGroup::BNegative;
        assert_eq!(
            serde_json::to_string(&group).unwrap(),
            format!("\"{}\"", group)
        );
    }
}
