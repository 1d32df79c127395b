//! Leaf attributes.
//!
//! Each leaf holds a single search value. Its `Display` output is the archive
//! query parameter the walker appends for it.

use crate::error::AttrError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Timestamp layout the archive expects inside `begin_time` comparisons
pub const ARCHIVE_TIME_FORMAT: &str = "%Y-%m-%d+%H:%M:%S";

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
];

// ============================================================================
// Time
// ============================================================================

/// Observation time window, compared against `begin_time`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTimeRange")]
pub struct TimeRange {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

#[derive(Deserialize)]
struct RawTimeRange {
    start: String,
    end: String,
}

impl TryFrom<RawTimeRange> for TimeRange {
    type Error = AttrError;

    fn try_from(raw: RawTimeRange) -> Result<Self, Self::Error> {
        Self::parse(&raw.start, &raw.end)
    }
}

impl TimeRange {
    /// Create a range; `end` must not precede `start`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, AttrError> {
        if end < start {
            return Err(AttrError::TimeOrder {
                start: start.to_rfc3339(),
                end: end.to_rfc3339(),
            });
        }
        Ok(Self { start, end })
    }

    /// Parse both bounds from strings (UTC assumed when no offset is given).
    pub fn parse(start: &str, end: &str) -> Result<Self, AttrError> {
        Self::new(parse_time(start)?, parse_time(end)?)
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "begin_time>='{}'+AND+begin_time<='{}'",
            self.start.format(ARCHIVE_TIME_FORMAT),
            self.end.format(ARCHIVE_TIME_FORMAT)
        )
    }
}

fn parse_time(input: &str) -> Result<DateTime<Utc>, AttrError> {
    let input = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.with_timezone(&Utc));
    }

    for format in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
            return Ok(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| AttrError::InvalidTime {
            input: input.to_string(),
        })
}

// ============================================================================
// Level
// ============================================================================

/// Raw data level as given by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LevelValue {
    /// Numeric level, `2` means `L2`
    Number(u32),
    /// Named level such as `L1` or `ll02`
    Name(String),
}

/// Processing level of the data product.
///
/// The value is kept as given; normalization happens when the parameter is
/// formatted, so an unknown level still round-trips unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Level(LevelValue);

impl Level {
    pub fn new(value: impl Into<Level>) -> Self {
        value.into()
    }

    pub fn value(&self) -> &LevelValue {
        &self.0
    }

    /// Archive spelling: integers gain an `L` prefix, everything upper-cased.
    pub fn normalized(&self) -> String {
        match &self.0 {
            LevelValue::Number(n) => format!("L{n}"),
            LevelValue::Name(name) => name.to_uppercase(),
        }
    }
}

impl From<u32> for Level {
    fn from(value: u32) -> Self {
        Self(LevelValue::Number(value))
    }
}

impl From<&str> for Level {
    fn from(value: &str) -> Self {
        Self(LevelValue::Name(value.to_string()))
    }
}

impl From<String> for Level {
    fn from(value: String) -> Self {
        Self(LevelValue::Name(value))
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "level='{}'", self.normalized())
    }
}

// ============================================================================
// Verbatim string leaves
// ============================================================================

macro_rules! string_attr {
    ($(#[$meta:meta])* $name:ident, $param:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn value(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($param, "='{}'"), self.0)
            }
        }
    };
}

string_attr!(
    /// Instrument that took the data, e.g. `EUI`.
    Instrument,
    "instrument"
);
string_attr!(
    /// Data provider.
    Provider,
    "provider"
);
string_attr!(
    /// Detector on the instrument.
    Detector,
    "Detector"
);
string_attr!(
    /// Solar Orbiter Observing Plan name.
    Soop,
    "soop_name"
);

/// Data product descriptor.
///
/// Descriptors are stored lower case by the archive, so the value is
/// lower-cased on construction and matching is case insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String")]
pub struct Product(String);

impl Product {
    pub fn new(value: impl AsRef<str>) -> Self {
        Self(value.as_ref().to_lowercase())
    }

    pub fn value(&self) -> &str {
        &self.0
    }
}

impl From<String> for Product {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "descriptor='{}'", self.0)
    }
}

// ============================================================================
// Wavelength
// ============================================================================

/// Length units accepted for wavelength bounds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WavelengthUnit {
    #[default]
    #[serde(alias = "AA")]
    Angstrom,
    #[serde(alias = "nm")]
    Nanometer,
    #[serde(alias = "um")]
    Micrometer,
    #[serde(alias = "mm")]
    Millimeter,
    #[serde(alias = "cm")]
    Centimeter,
    #[serde(alias = "m")]
    Meter,
}

impl WavelengthUnit {
    /// Multiplier converting this unit to Angstrom
    pub fn to_angstrom(self) -> f64 {
        match self {
            Self::Angstrom => 1.0,
            Self::Nanometer => 10.0,
            Self::Micrometer => 1e4,
            Self::Millimeter => 1e7,
            Self::Centimeter => 1e8,
            Self::Meter => 1e10,
        }
    }
}

/// Wavelength window, stored in Angstrom.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawWavelength")]
pub struct Wavelength {
    min: f64,
    max: f64,
}

#[derive(Deserialize)]
struct RawWavelength {
    min: f64,
    max: f64,
    #[serde(default)]
    unit: WavelengthUnit,
}

impl TryFrom<RawWavelength> for Wavelength {
    type Error = AttrError;

    fn try_from(raw: RawWavelength) -> Result<Self, Self::Error> {
        Self::new(raw.min, raw.max, raw.unit)
    }
}

impl Wavelength {
    /// Create a window from two bounds in `unit`; reversed bounds are swapped.
    pub fn new(min: f64, max: f64, unit: WavelengthUnit) -> Result<Self, AttrError> {
        for bound in [min, max] {
            if !bound.is_finite() {
                return Err(AttrError::InvalidWavelength(bound));
            }
        }

        let factor = unit.to_angstrom();
        let (min, max) = (min * factor, max * factor);
        let (min, max) = if min > max { (max, min) } else { (min, max) };
        Ok(Self { min, max })
    }

    /// Window covering exactly one wavelength.
    pub fn single(value: f64, unit: WavelengthUnit) -> Result<Self, AttrError> {
        Self::new(value, value, unit)
    }

    /// Lower bound in Angstrom
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Upper bound in Angstrom
    pub fn max(&self) -> f64 {
        self.max
    }
}

impl fmt::Display for Wavelength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Wavemin='{}'+AND+Wavemax='{}'", self.min, self.max)
    }
}
