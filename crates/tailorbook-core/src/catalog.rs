// Reference catalog (catalog.toml): measurement definitions, clothing types,
// and the per-clothing-type measurement templates.

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;

use crate::config::{read_file, ConfigError};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Catalog {
    pub measurements: Vec<MeasurementEntry>,
    pub clothing_types: Vec<ClothingTypeEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MeasurementEntry {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClothingTypeEntry {
    pub id: i64,
    pub name: String,
    /// Template, in display order.
    #[serde(default)]
    pub measurements: Vec<i64>,
}

impl Catalog {
    /// Parse and validate a catalog from TOML text. `origin` is only used in
    /// error messages.
    pub fn from_toml_str(text: &str, origin: &Path) -> Result<Self, ConfigError> {
        let catalog: Catalog = toml::from_str(text).map_err(|e| ConfigError::ParseError {
            path: origin.to_path_buf(),
            source: e,
        })?;
        catalog.validate()?;
        Ok(catalog)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let mut measurement_ids = HashSet::new();
        for m in &self.measurements {
            if m.name.trim().is_empty() {
                return Err(invalid(
                    "measurements.name",
                    format!("measurement {} has an empty name", m.id),
                ));
            }
            if !measurement_ids.insert(m.id) {
                return Err(invalid(
                    "measurements.id",
                    format!("duplicate measurement id {}", m.id),
                ));
            }
        }

        let mut type_ids = HashSet::new();
        for t in &self.clothing_types {
            if t.name.trim().is_empty() {
                return Err(invalid(
                    "clothing_types.name",
                    format!("clothing type {} has an empty name", t.id),
                ));
            }
            if !type_ids.insert(t.id) {
                return Err(invalid(
                    "clothing_types.id",
                    format!("duplicate clothing type id {}", t.id),
                ));
            }

            let mut seen = HashSet::new();
            for id in &t.measurements {
                if !measurement_ids.contains(id) {
                    return Err(invalid(
                        "clothing_types.measurements",
                        format!("`{}` references unknown measurement id {id}", t.name),
                    ));
                }
                if !seen.insert(*id) {
                    return Err(invalid(
                        "clothing_types.measurements",
                        format!("`{}` lists measurement id {id} twice", t.name),
                    ));
                }
            }
        }

        Ok(())
    }
}

/// Read and validate the catalog file at `path`.
pub fn load_catalog(path: &Path) -> Result<Catalog, ConfigError> {
    let text = read_file(path)?;
    Catalog::from_toml_str(&text, path)
}

fn invalid(field: &str, message: String) -> ConfigError {
    ConfigError::ValidationError {
        field: field.to_string(),
        message,
    }
}
