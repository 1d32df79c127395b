//! Attribute trees.
//!
//! A search is a tree of leaf attributes joined by AND and OR nodes. The
//! combinators keep trees in OR-of-AND form, which is the shape the walker
//! turns into alternative parameter groups.

mod leaf;

pub use leaf::{
    Detector, Instrument, Level, LevelValue, Product, Provider, Soop, TimeRange, Wavelength,
    WavelengthUnit, ARCHIVE_TIME_FORMAT,
};

use crate::error::AttrError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitAnd, BitOr};

/// A node in a search attribute tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attr {
    Time(TimeRange),
    Level(Level),
    Instrument(Instrument),
    Product(Product),
    Provider(Provider),
    Soop(Soop),
    Detector(Detector),
    Wavelength(Wavelength),
    /// All children must hold
    And(Vec<Attr>),
    /// Any child may hold
    Or(Vec<Attr>),
}

/// Node kind, used as the walker's dispatch key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttrKind {
    Time,
    Level,
    Instrument,
    Product,
    Provider,
    Soop,
    Detector,
    Wavelength,
    And,
    Or,
}

impl AttrKind {
    /// Every leaf kind, in declaration order
    pub const LEAVES: [AttrKind; 8] = [
        AttrKind::Time,
        AttrKind::Level,
        AttrKind::Instrument,
        AttrKind::Product,
        AttrKind::Provider,
        AttrKind::Soop,
        AttrKind::Detector,
        AttrKind::Wavelength,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AttrKind::Time => "time",
            AttrKind::Level => "level",
            AttrKind::Instrument => "instrument",
            AttrKind::Product => "product",
            AttrKind::Provider => "provider",
            AttrKind::Soop => "soop",
            AttrKind::Detector => "detector",
            AttrKind::Wavelength => "wavelength",
            AttrKind::And => "and",
            AttrKind::Or => "or",
        }
    }

    pub fn is_leaf(self) -> bool {
        !matches!(self, AttrKind::And | AttrKind::Or)
    }
}

impl fmt::Display for AttrKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Attr {
    pub fn kind(&self) -> AttrKind {
        match self {
            Attr::Time(_) => AttrKind::Time,
            Attr::Level(_) => AttrKind::Level,
            Attr::Instrument(_) => AttrKind::Instrument,
            Attr::Product(_) => AttrKind::Product,
            Attr::Provider(_) => AttrKind::Provider,
            Attr::Soop(_) => AttrKind::Soop,
            Attr::Detector(_) => AttrKind::Detector,
            Attr::Wavelength(_) => AttrKind::Wavelength,
            Attr::And(_) => AttrKind::And,
            Attr::Or(_) => AttrKind::Or,
        }
    }

    /// Raw AND node, children kept exactly as given.
    pub fn all(attrs: impl IntoIterator<Item = Attr>) -> Self {
        Attr::And(attrs.into_iter().collect())
    }

    /// Raw OR node, children kept exactly as given.
    pub fn any(attrs: impl IntoIterator<Item = Attr>) -> Self {
        Attr::Or(attrs.into_iter().collect())
    }

    /// Conjunction in OR-of-AND form.
    ///
    /// AND operands are concatenated and AND distributes over OR, so
    /// `a & (b | c)` becomes `(a & b) | (a & c)`.
    pub fn and(self, other: Attr) -> Attr {
        match (self, other) {
            (Attr::Or(left), right) => left
                .into_iter()
                .map(|l| l.and(right.clone()))
                .fold(Attr::Or(Vec::new()), Attr::or),
            (left, Attr::Or(right)) => right
                .into_iter()
                .map(|r| left.clone().and(r))
                .fold(Attr::Or(Vec::new()), Attr::or),
            (left, right) => {
                let mut attrs = left.into_operands(AttrKind::And);
                attrs.extend(right.into_operands(AttrKind::And));
                Attr::And(attrs)
            }
        }
    }

    /// Disjunction; OR operands are concatenated.
    pub fn or(self, other: Attr) -> Attr {
        let mut attrs = self.into_operands(AttrKind::Or);
        attrs.extend(other.into_operands(AttrKind::Or));
        Attr::Or(attrs)
    }

    /// Load a tree from its JSON form.
    pub fn from_json(json: &str) -> Result<Attr, AttrError> {
        Ok(serde_json::from_str(json)?)
    }

    fn into_operands(self, kind: AttrKind) -> Vec<Attr> {
        match self {
            Attr::And(attrs) if kind == AttrKind::And => attrs,
            Attr::Or(attrs) if kind == AttrKind::Or => attrs,
            other => vec![other],
        }
    }
}

impl BitAnd for Attr {
    type Output = Attr;

    fn bitand(self, rhs: Attr) -> Attr {
        self.and(rhs)
    }
}

impl BitOr for Attr {
    type Output = Attr;

    fn bitor(self, rhs: Attr) -> Attr {
        self.or(rhs)
    }
}

macro_rules! impl_from_leaf {
    ($($leaf:ident),* $(,)?) => {
        $(
            impl From<$leaf> for Attr {
                fn from(value: $leaf) -> Self {
                    Attr::$leaf(value)
                }
            }
        )*
    };
}

impl_from_leaf!(Level, Instrument, Product, Provider, Soop, Detector, Wavelength);

impl From<TimeRange> for Attr {
    fn from(value: TimeRange) -> Self {
        Attr::Time(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inst(name: &str) -> Attr {
        Instrument::new(name).into()
    }

    #[test]
    fn test_and_flattens_nested_ands() {
        let tree = inst("EUI") & inst("MAG") & Level::from(2u32).into();

        assert_eq!(
            tree,
            Attr::And(vec![inst("EUI"), inst("MAG"), Level::from(2u32).into()])
        );
    }

    #[test]
    fn test_or_flattens_nested_ors() {
        let tree = inst("EUI") | inst("MAG") | inst("SWA");

        assert_eq!(tree, Attr::Or(vec![inst("EUI"), inst("MAG"), inst("SWA")]));
    }

    #[test]
    fn test_and_distributes_over_or() {
        let level: Attr = Level::from(1u32).into();
        let tree = level.clone() & (inst("EUI") | inst("MAG"));

        assert_eq!(
            tree,
            Attr::Or(vec![
                Attr::And(vec![level.clone(), inst("EUI")]),
                Attr::And(vec![level, inst("MAG")]),
            ])
        );
    }

    #[test]
    fn test_and_of_two_ors_is_cartesian() {
        let tree = (inst("A") | inst("B")) & (inst("C") | inst("D"));

        assert_eq!(
            tree,
            Attr::Or(vec![
                Attr::And(vec![inst("A"), inst("C")]),
                Attr::And(vec![inst("A"), inst("D")]),
                Attr::And(vec![inst("B"), inst("C")]),
                Attr::And(vec![inst("B"), inst("D")]),
            ])
        );
    }

    #[test]
    fn test_raw_constructors_keep_nesting() {
        let tree = Attr::all([inst("A"), Attr::any([inst("B"), inst("C")])]);

        assert_eq!(tree.kind(), AttrKind::And);
        let Attr::And(children) = &tree else {
            panic!("expected AND node");
        };
        assert_eq!(children[1].kind(), AttrKind::Or);
    }

    #[test]
    fn test_from_json() {
        let tree = Attr::from_json(
            r#"{"and": [
                {"instrument": "EUI"},
                {"product": "EUI-FSI174-IMAGE"},
                {"level": 2},
                {"time": {"start": "2021-01-01T00:00:00Z", "end": "2021-01-02T00:00:00Z"}},
                {"wavelength": {"min": 17, "max": 18, "unit": "nm"}}
            ]}"#,
        )
        .unwrap();

        let Attr::And(children) = tree else {
            panic!("expected AND node");
        };
        assert_eq!(children[1], Attr::Product(Product::new("eui-fsi174-image")));
        assert_eq!(children[2], Attr::Level(Level::from(2u32)));
        let Attr::Wavelength(wave) = &children[4] else {
            panic!("expected wavelength");
        };
        assert_eq!((wave.min(), wave.max()), (170.0, 180.0));
    }

    #[test]
    fn test_from_json_validates_leaves() {
        let result = Attr::from_json(
            r#"{"time": {"start": "2021-01-02T00:00:00Z", "end": "2021-01-01T00:00:00Z"}}"#,
        );

        assert!(matches!(result, Err(AttrError::Json(_))));
    }

    #[test]
    fn test_from_json_accepts_constructor_time_layouts() {
        let tree = Attr::from_json(
            r#"{"or": [
                {"time": {"start": "2021-01-01 00:00:00", "end": "2021-01-02 12:30:00"}},
                {"time": {"start": "2021-01-01", "end": "2021-01-02T06:00:00"}}
            ]}"#,
        )
        .unwrap();

        assert_eq!(
            tree,
            Attr::Or(vec![
                TimeRange::parse("2021-01-01 00:00:00", "2021-01-02 12:30:00")
                    .unwrap()
                    .into(),
                TimeRange::parse("2021-01-01", "2021-01-02T06:00:00")
                    .unwrap()
                    .into(),
            ])
        );
    }

    #[test]
    fn test_from_json_rejects_unparseable_time() {
        let result = Attr::from_json(r#"{"time": {"start": "soon", "end": "2021-01-02"}}"#);

        assert!(matches!(result, Err(AttrError::Json(_))));
    }

    #[test]
    fn test_from_json_wavelength_defaults_to_angstrom() {
        let tree = Attr::from_json(r#"{"wavelength": {"min": 171, "max": 175}}"#).unwrap();

        assert_eq!(
            tree,
            Attr::Wavelength(Wavelength::new(171.0, 175.0, WavelengthUnit::Angstrom).unwrap())
        );
    }

    #[test]
    fn test_json_round_trip() {
        let tree = (Attr::from(TimeRange::parse("2021-01-01", "2021-01-02 12:30:00").unwrap())
            & Attr::from(Level::from("ll02"))
            & Attr::from(Product::new("EUI-FSI174-IMAGE"))
            & Attr::from(Wavelength::new(17.0, 18.0, WavelengthUnit::Nanometer).unwrap()))
            | Attr::from(Soop::new("R_SMALL_MRES_MCAD_AR-Long-Term"))
            | Attr::all([
                Attr::from(Provider::new("SOAR")),
                Attr::from(Detector::new("HRI_EUV")),
                Attr::from(Level::from(1u32)),
            ]);

        let json = serde_json::to_string(&tree).unwrap();
        let loaded = Attr::from_json(&json).unwrap();

        assert_eq!(loaded, tree);
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(AttrKind::Soop.to_string(), "soop");
        assert!(AttrKind::Wavelength.is_leaf());
        assert!(!AttrKind::Or.is_leaf());
    }
}
