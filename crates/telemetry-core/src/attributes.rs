//! Descriptive metadata for the OBD-II attributes written by the collector.
//!
//! Every column of an aligned table is looked up here for its display name,
//! unit and numeric kind. Unknown identifiers either fail ([`AttributeCatalog::get`])
//! or resolve to the explicit [`UNKNOWN_ATTRIBUTE`] fallback
//! ([`AttributeCatalog::get_or_default`]); they are never passed through
//! silently.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, TelemetryError};
use crate::models::ValueKind;

/// Display name used by the lenient lookup for identifiers missing from the
/// catalog.
pub const UNKNOWN_DISPLAY_NAME: &str = "unknown";

/// Fallback returned by [`AttributeCatalog::get_or_default`].
pub static UNKNOWN_ATTRIBUTE: AttributeMeta = AttributeMeta {
    display_name: String::new(),
    unit: String::new(),
    kind: ValueKind::Float,
};

/// Human-facing description of one attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeMeta {
    /// Name shown in reports and legend labels.
    pub display_name: String,
    /// Unit suffix, e.g. `"km/h"`. May be empty.
    #[serde(default)]
    pub unit: String,
    /// Numeric type values are parsed as.
    #[serde(default)]
    pub kind: ValueKind,
}

impl AttributeMeta {
    pub fn new(display_name: &str, unit: &str, kind: ValueKind) -> Self {
        Self {
            display_name: display_name.to_string(),
            unit: unit.to_string(),
            kind,
        }
    }

    /// Display name, substituting [`UNKNOWN_DISPLAY_NAME`] when empty.
    pub fn label(&self) -> &str {
        if self.display_name.is_empty() {
            UNKNOWN_DISPLAY_NAME
        } else {
            &self.display_name
        }
    }
}

/// Mapping from attribute identifier to [`AttributeMeta`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeCatalog {
    entries: BTreeMap<String, AttributeMeta>,
}

impl AttributeCatalog {
    /// Empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog covering every parameter the vehicle collector records.
    pub fn builtin() -> Self {
        let mut catalog = Self::new();
        for (id, name, unit) in [
            ("vehicleSpeed", "vehicle speed", "km/h"),
            ("engineRPM", "engine RPM", "rpm"),
            ("engineCoolanteTemperature", "coolant temperature", "°C"),
            ("engineLoad", "engine load", "%"),
            ("absoluteBarometricPressure", "barometric pressure", "kPa"),
            ("throttlePosition", "throttle position", "%"),
            ("traveledWithMalfunction", "distance with MIL on", "km"),
            ("runtimeSinceEngineStart", "runtime since engine start", "s"),
            ("ambientAirTemperature", "ambient air temperature", "°C"),
        ] {
            catalog.insert(id, AttributeMeta::new(name, unit, ValueKind::Float));
        }
        catalog
    }

    /// Add or replace an entry. The identifier is trimmed.
    pub fn insert(&mut self, id: &str, meta: AttributeMeta) {
        self.entries.insert(id.trim().to_string(), meta);
    }

    /// Overlay `other` on top of `self`; entries in `other` win.
    pub fn merge(&mut self, other: &AttributeCatalog) {
        for (id, meta) in &other.entries {
            self.insert(id, meta.clone());
        }
    }

    /// Strict lookup.
    pub fn get(&self, id: &str) -> Result<&AttributeMeta> {
        self.entries
            .get(id.trim())
            .ok_or_else(|| TelemetryError::UnknownAttribute(id.to_string()))
    }

    /// Lenient lookup falling back to [`UNKNOWN_ATTRIBUTE`].
    pub fn get_or_default(&self, id: &str) -> &AttributeMeta {
        self.entries.get(id.trim()).unwrap_or_else(|| {
            debug!("attribute {:?} not in catalog, using fallback metadata", id);
            &UNKNOWN_ATTRIBUTE
        })
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id.trim())
    }

    /// Fail with [`TelemetryError::UnknownAttribute`] on the first identifier
    /// that has no entry.
    pub fn validate<'a>(&self, ids: impl IntoIterator<Item = &'a str>) -> Result<()> {
        for id in ids {
            self.get(id)?;
        }
        Ok(())
    }

    /// Entries in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttributeMeta)> {
        self.entries.iter().map(|(id, meta)| (id.as_str(), meta))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
