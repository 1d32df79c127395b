//! Solar Orbiter Archive query translation.
//!
//! Compiles a composable search, expressed as a tree of typed attributes,
//! into the flat query-parameter strings the archive's search API expects:
//!
//! 1. Build an [`Attr`] tree from leaves with `&` / `|`
//! 2. [`Walker::create`] turns it into parameter groups (OR of ANDs)
//! 3. Optionally, [`AdqlRenderer`] turns each group into a TAP request
//!
//! ```rust
//! use soar_query::{Attr, Instrument, Level, Walker};
//!
//! let tree = Attr::from(Instrument::new("EUI")) & Attr::from(Level::from(2u32));
//! let groups = Walker::new().create(&tree).unwrap();
//!
//! assert_eq!(groups, vec![vec!["instrument='EUI'", "level='L2'"]]);
//! ```

pub mod attrs;
pub mod config;
pub mod error;
pub mod render;
pub mod walker;

pub use attrs::{
    Attr, AttrKind, Detector, Instrument, Level, LevelValue, Product, Provider, Soop, TimeRange,
    Wavelength, WavelengthUnit,
};
pub use config::SoarConfig;
pub use error::{AttrError, ConfigError, Error, RenderError, Result, WalkError};
pub use render::{AdqlRenderer, QueryRenderer, RenderedQuery};
pub use walker::{ParamGroup, Walk, WalkWarning, Walker, WalkerBuilder};

/// Walk `tree` and render one archive request per parameter group.
///
/// Level warnings are logged; call [`Walker::walk`] directly to inspect them.
pub fn search_requests(tree: &Attr, config: &SoarConfig) -> Result<Vec<RenderedQuery>> {
    let groups = Walker::from_config(config).create(tree)?;
    Ok(AdqlRenderer::from_config(config).render(&groups)?)
}
