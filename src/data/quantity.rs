use crate::error::ObservationError;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of measurement stored in a single epoch
#[derive(Clone, Copy, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum QuantityType {
    /// RA and Dec offsets of the secondary, mas
    RaDec,
    /// Separation (mas) and position angle east of north
    SepPa,
    /// Radial velocity, km/s, the second component is unused
    Rv,
}

impl QuantityType {
    const NAMES: [(&'static str, Self); 3] = [
        ("radec", Self::RaDec),
        ("seppa", Self::SepPa),
        ("rv", Self::Rv),
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::RaDec => "radec",
            Self::SepPa => "seppa",
            Self::Rv => "rv",
        }
    }

    /// Whether the second component carries a measurement
    pub fn has_second_component(&self) -> bool {
        !matches!(self, Self::Rv)
    }

    /// Whether the second component is a position angle
    pub fn is_angular(&self) -> bool {
        matches!(self, Self::SepPa)
    }
}

impl fmt::Display for QuantityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for QuantityType {
    type Err = ObservationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Self::NAMES
            .iter()
            .find(|(name, _)| *name == lower)
            .map(|(_, quantity_type)| *quantity_type)
            .ok_or_else(|| ObservationError::UnknownQuantityType(s.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_names() {
        assert_eq!("radec".parse::<QuantityType>().unwrap(), QuantityType::RaDec);
        assert_eq!(" SepPA ".parse::<QuantityType>().unwrap(), QuantityType::SepPa);
        assert_eq!("rv".parse::<QuantityType>().unwrap(), QuantityType::Rv);
    }

    #[test]
    fn unknown_name() {
        let err = "altaz".parse::<QuantityType>().unwrap_err();
        assert!(matches!(err, ObservationError::UnknownQuantityType(s) if s == "altaz"));
    }

    #[test]
    fn display_round_trip() {
        for (_, quantity_type) in QuantityType::NAMES {
            assert_eq!(
                quantity_type.to_string().parse::<QuantityType>().unwrap(),
                quantity_type
            );
        }
    }

    #[test]
    fn serde_names() {
        let json = serde_json::to_string(&QuantityType::SepPa).unwrap();
        assert_eq!(json, "\"seppa\"");
    }
}
