//! Attribute tree walker.
//!
//! The walker turns an attribute tree into parameter groups using two
//! dispatch tables keyed by [`AttrKind`]:
//! - creators decide how a node is recursed and shape the output groups
//! - appliers append a node's parameter strings to a group
//!
//! Strings within a group are AND-combined; separate groups are alternatives.

use crate::attrs::{Attr, AttrKind};
use crate::config::{SoarConfig, DEFAULT_ALLOWED_LEVELS};
use crate::error::WalkError;
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, trace, warn};

/// AND-combined query parameters
pub type ParamGroup = Vec<String>;

/// Creator: produce the parameter groups for a node
pub type CreateFn =
    fn(&Walker, &Attr, &mut Vec<WalkWarning>) -> Result<Vec<ParamGroup>, WalkError>;

/// Applier: append a node's parameters to `params`
pub type ApplyFn =
    fn(&Walker, &Attr, &mut ParamGroup, &mut Vec<WalkWarning>) -> Result<(), WalkError>;

/// Non-fatal issue found while walking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalkWarning {
    /// Level outside the archive's known set; the parameter is still emitted
    UnknownLevel { level: String, allowed: Vec<String> },
}

impl fmt::Display for WalkWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WalkWarning::UnknownLevel { level, allowed } => write!(
                f,
                "level '{}' not in list of allowed levels for SOAR: {}",
                level,
                allowed.join(", ")
            ),
        }
    }
}

/// Output of a walk: the groups plus any warnings raised on the way.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Walk {
    pub groups: Vec<ParamGroup>,
    pub warnings: Vec<WalkWarning>,
}

/// Dispatches attribute nodes to their creators and appliers.
#[derive(Clone)]
pub struct Walker {
    creators: HashMap<AttrKind, CreateFn>,
    appliers: HashMap<AttrKind, ApplyFn>,
    allowed_levels: Vec<String>,
}

impl fmt::Debug for Walker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut creators: Vec<_> = self.creators.keys().collect();
        creators.sort();
        let mut appliers: Vec<_> = self.appliers.keys().collect();
        appliers.sort();

        f.debug_struct("Walker")
            .field("creators", &creators)
            .field("appliers", &appliers)
            .field("allowed_levels", &self.allowed_levels)
            .finish()
    }
}

impl Default for Walker {
    fn default() -> Self {
        Self::new()
    }
}

impl Walker {
    /// Walker with the archive's handlers and default allowed levels
    pub fn new() -> Self {
        Self::builder().with_soar_handlers().build()
    }

    /// Walker with the archive's handlers, configured from `config`
    pub fn from_config(config: &SoarConfig) -> Self {
        Self::builder()
            .with_soar_handlers()
            .with_config(config)
            .build()
    }

    /// Builder with empty dispatch tables
    pub fn builder() -> WalkerBuilder {
        WalkerBuilder::new()
    }

    /// Levels accepted without a warning (upper case)
    pub fn allowed_levels(&self) -> &[String] {
        &self.allowed_levels
    }

    /// Produce the parameter groups for `tree`.
    ///
    /// Warnings are logged and dropped; use [`Walker::walk`] to keep them.
    pub fn create(&self, tree: &Attr) -> Result<Vec<ParamGroup>, WalkError> {
        self.walk(tree).map(|walk| walk.groups)
    }

    /// Produce the parameter groups for `tree` together with the warnings.
    pub fn walk(&self, tree: &Attr) -> Result<Walk, WalkError> {
        debug!(kind = %tree.kind(), "Walking attribute tree");

        let mut warnings = Vec::new();
        let groups = self.create_with(tree, &mut warnings)?;

        debug!(
            groups = groups.len(),
            warnings = warnings.len(),
            "Attribute tree walked"
        );
        Ok(Walk { groups, warnings })
    }

    /// Dispatch `tree` to the creator registered for its kind.
    pub fn create_with(
        &self,
        tree: &Attr,
        warnings: &mut Vec<WalkWarning>,
    ) -> Result<Vec<ParamGroup>, WalkError> {
        let kind = tree.kind();
        let creator = self
            .creators
            .get(&kind)
            .ok_or(WalkError::NoCreator { kind })?;
        creator(self, tree, warnings)
    }

    /// Dispatch `attr` to the applier registered for its kind.
    pub fn apply(
        &self,
        attr: &Attr,
        params: &mut ParamGroup,
        warnings: &mut Vec<WalkWarning>,
    ) -> Result<(), WalkError> {
        let kind = attr.kind();
        let applier = self
            .appliers
            .get(&kind)
            .ok_or(WalkError::NoApplier { kind })?;
        trace!(%kind, "Applying attribute");
        applier(self, attr, params, warnings)
    }

    /// Whether every node of `tree` has a handler.
    ///
    /// Follows the archive's recursion shape: OR children are created, any
    /// other node is applied, and AND children are applied in turn.
    pub fn can_handle(&self, tree: &Attr) -> bool {
        if !self.creators.contains_key(&tree.kind()) {
            return false;
        }
        match tree {
            Attr::Or(attrs) => attrs.iter().all(|attr| self.can_handle(attr)),
            other => self.can_apply(other),
        }
    }

    fn can_apply(&self, attr: &Attr) -> bool {
        if !self.appliers.contains_key(&attr.kind()) {
            return false;
        }
        match attr {
            Attr::And(attrs) => attrs.iter().all(|attr| self.can_apply(attr)),
            _ => true,
        }
    }

    fn is_allowed_level(&self, level: &str) -> bool {
        self.allowed_levels.iter().any(|allowed| allowed == level)
    }
}

/// Builder for ergonomic walker construction
pub struct WalkerBuilder {
    creators: HashMap<AttrKind, CreateFn>,
    appliers: HashMap<AttrKind, ApplyFn>,
    allowed_levels: Vec<String>,
}

impl Default for WalkerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl WalkerBuilder {
    pub fn new() -> Self {
        Self {
            creators: HashMap::new(),
            appliers: HashMap::new(),
            allowed_levels: DEFAULT_ALLOWED_LEVELS
                .iter()
                .map(|level| level.to_string())
                .collect(),
        }
    }

    /// Register (or replace) the creator for `kind`
    pub fn with_creator(mut self, kind: AttrKind, creator: CreateFn) -> Self {
        self.creators.insert(kind, creator);
        self
    }

    /// Register (or replace) the applier for `kind`
    pub fn with_applier(mut self, kind: AttrKind, applier: ApplyFn) -> Self {
        self.appliers.insert(kind, applier);
        self
    }

    /// Replace the set of levels accepted without a warning
    pub fn with_allowed_levels<I, S>(mut self, levels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.allowed_levels = levels
            .into_iter()
            .map(|level| level.as_ref().to_uppercase())
            .collect();
        self
    }

    pub fn with_config(self, config: &SoarConfig) -> Self {
        self.with_allowed_levels(&config.allowed_levels)
    }

    /// Register the archive's creators and appliers.
    ///
    /// OR nodes fan out into alternative groups; AND nodes and bare leaves
    /// form a single group.
    pub fn with_soar_handlers(self) -> Self {
        let builder = self
            .with_creator(AttrKind::Or, create_or)
            .with_creator(AttrKind::And, create_and)
            .with_applier(AttrKind::And, apply_and)
            .with_applier(AttrKind::Time, apply_time)
            .with_applier(AttrKind::Level, apply_level)
            .with_applier(AttrKind::Instrument, apply_instrument)
            .with_applier(AttrKind::Product, apply_product)
            .with_applier(AttrKind::Provider, apply_provider)
            .with_applier(AttrKind::Soop, apply_soop)
            .with_applier(AttrKind::Detector, apply_detector)
            .with_applier(AttrKind::Wavelength, apply_wavelength);

        AttrKind::LEAVES
            .into_iter()
            .fold(builder, |builder, kind| builder.with_creator(kind, create_and))
    }

    pub fn build(self) -> Walker {
        Walker {
            creators: self.creators,
            appliers: self.appliers,
            allowed_levels: self.allowed_levels,
        }
    }
}

// ============================================================================
// Creators
// ============================================================================

/// Creator for OR: each child contributes its own groups.
pub fn create_or(
    wlk: &Walker,
    tree: &Attr,
    warnings: &mut Vec<WalkWarning>,
) -> Result<Vec<ParamGroup>, WalkError> {
    let Attr::Or(attrs) = tree else {
        return Err(unexpected(AttrKind::Or, tree));
    };

    let mut groups = Vec::new();
    for sub in attrs {
        groups.extend(wlk.create_with(sub, warnings)?);
    }
    Ok(groups)
}

/// Creator for AND and bare leaves: one group holding every applied string.
pub fn create_and(
    wlk: &Walker,
    tree: &Attr,
    warnings: &mut Vec<WalkWarning>,
) -> Result<Vec<ParamGroup>, WalkError> {
    let kind = tree.kind();
    if !(kind.is_leaf() || kind == AttrKind::And) {
        return Err(unexpected(AttrKind::And, tree));
    }

    let mut params = ParamGroup::new();
    wlk.apply(tree, &mut params, warnings)?;
    Ok(vec![params])
}

// ============================================================================
// Appliers
// ============================================================================

/// Applier for AND: children are applied in declaration order.
pub fn apply_and(
    wlk: &Walker,
    tree: &Attr,
    params: &mut ParamGroup,
    warnings: &mut Vec<WalkWarning>,
) -> Result<(), WalkError> {
    let Attr::And(attrs) = tree else {
        return Err(unexpected(AttrKind::And, tree));
    };

    for attr in attrs {
        wlk.apply(attr, params, warnings)?;
    }
    Ok(())
}

/// Applier for levels. Unknown levels warn but are still emitted.
pub fn apply_level(
    wlk: &Walker,
    attr: &Attr,
    params: &mut ParamGroup,
    warnings: &mut Vec<WalkWarning>,
) -> Result<(), WalkError> {
    let Attr::Level(level) = attr else {
        return Err(unexpected(AttrKind::Level, attr));
    };

    let name = level.normalized();
    if !wlk.is_allowed_level(&name) {
        warn!(
            level = %name,
            allowed = ?wlk.allowed_levels,
            "level not in list of allowed levels for SOAR"
        );
        warnings.push(WalkWarning::UnknownLevel {
            level: name.clone(),
            allowed: wlk.allowed_levels.clone(),
        });
    }

    params.push(format!("level='{name}'"));
    Ok(())
}

// The remaining leaves format themselves through `Display`.
macro_rules! display_applier {
    ($(#[$meta:meta])* $fn_name:ident, $variant:ident) => {
        $(#[$meta])*
        pub fn $fn_name(
            _wlk: &Walker,
            attr: &Attr,
            params: &mut ParamGroup,
            _warnings: &mut Vec<WalkWarning>,
        ) -> Result<(), WalkError> {
            let Attr::$variant(value) = attr else {
                return Err(unexpected(AttrKind::$variant, attr));
            };
            params.push(value.to_string());
            Ok(())
        }
    };
}

display_applier!(
    /// Applier for time ranges: `begin_time` bounds.
    apply_time,
    Time
);
display_applier!(apply_instrument, Instrument);
display_applier!(apply_product, Product);
display_applier!(apply_provider, Provider);
display_applier!(apply_soop, Soop);
display_applier!(apply_detector, Detector);
display_applier!(
    /// Applier for wavelengths: bounds in Angstrom, unit dropped.
    apply_wavelength,
    Wavelength
);

fn unexpected(expected: AttrKind, found: &Attr) -> WalkError {
    WalkError::UnexpectedAttr {
        expected,
        found: found.kind(),
    }
}
