//! Thread Catalog
//!
//! Thread standards grouped by family, each size carrying its numeric
//! magnitude alongside its display label, and the designations (pitch
//! variants) available for it.

mod resolver;

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use resolver::{ThreadResolution, ThreadResolver, closest_size};

/// Catalog loading errors
#[derive(Debug, Clone, Error)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Serialization error: {0}")]
    Serialize(String),
    #[error("Deserialization error: {0}")]
    Deserialize(String),
}

/// A nominal thread size
///
/// In catalog files `magnitude` may be left out, in which case it is taken
/// from the label as in [`ThreadSize::from_label`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "StoredThreadSize")]
pub struct ThreadSize {
    /// Display label (e.g. "M20")
    pub label: String,
    /// Nominal diameter in millimeters
    pub magnitude: f64,
}

impl ThreadSize {
    pub fn new(label: impl Into<String>, magnitude: f64) -> Self {
        Self {
            label: label.into(),
            magnitude,
        }
    }

    /// Build a size from its label alone, taking the first number in it as
    /// the magnitude
    ///
    /// Labels without a number get a magnitude of 0.0 so they rank as poor
    /// matches instead of failing.
    pub fn from_label(label: impl Into<String>) -> Self {
        let label = label.into();
        let magnitude = leading_number(&label).unwrap_or(0.0);
        Self { label, magnitude }
    }
}

/// On-disk form of [`ThreadSize`]
#[derive(Deserialize)]
#[serde(rename = "ThreadSize")]
struct StoredThreadSize {
    label: String,
    #[serde(default)]
    magnitude: Option<f64>,
}

impl From<StoredThreadSize> for ThreadSize {
    fn from(stored: StoredThreadSize) -> Self {
        match stored.magnitude {
            Some(magnitude) => ThreadSize::new(stored.label, magnitude),
            None => ThreadSize::from_label(stored.label),
        }
    }
}

/// First run of digits in `label`, with an optional decimal fraction
fn leading_number(label: &str) -> Option<f64> {
    let start = label.find(|c: char| c.is_ascii_digit())?;
    let rest = &label[start..];

    let mut end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    if rest[end..].starts_with('.')
        && rest[end + 1..].starts_with(|c: char| c.is_ascii_digit())
    {
        let fraction = &rest[end + 1..];
        end += 1 + fraction
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(fraction.len());
    }

    rest[..end].parse().ok()
}

/// One size with its designations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreadSizeEntry {
    pub size: ThreadSize,
    pub designations: Vec<String>,
}

/// A thread standard family
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreadFamily {
    pub name: String,
    pub sizes: Vec<ThreadSizeEntry>,
}

/// Thread data lookup service
pub trait ThreadCatalog {
    /// Names of all families, in catalog order
    fn list_families(&self) -> Vec<String>;

    /// Sizes of a family, in catalog order (empty if unknown)
    fn list_sizes(&self, family: &str) -> Vec<ThreadSize>;

    /// Designations for a family and size label, in catalog order
    fn list_designations(&self, family: &str, size: &str) -> Vec<String>;
}

/// Catalog held in memory, loadable from RON
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StaticCatalog {
    pub families: Vec<ThreadFamily>,
}

/// ISO metric nominal diameters with coarse pitch first, then fine pitches
const ISO_METRIC_PITCHES: &[(f64, &[f64])] = &[
    (1.6, &[0.35, 0.2]),
    (2.0, &[0.4, 0.25]),
    (2.5, &[0.45, 0.35]),
    (3.0, &[0.5, 0.35]),
    (4.0, &[0.7, 0.5]),
    (5.0, &[0.8, 0.5]),
    (6.0, &[1.0, 0.75]),
    (8.0, &[1.25, 1.0, 0.75]),
    (10.0, &[1.5, 1.25, 1.0, 0.75]),
    (12.0, &[1.75, 1.5, 1.25, 1.0]),
    (14.0, &[2.0, 1.5, 1.25, 1.0]),
    (16.0, &[2.0, 1.5, 1.0]),
    (18.0, &[2.5, 2.0, 1.5, 1.0]),
    (20.0, &[2.5, 2.0, 1.5, 1.0]),
    (22.0, &[2.5, 2.0, 1.5, 1.0]),
    (24.0, &[3.0, 2.0, 1.5, 1.0]),
    (27.0, &[3.0, 2.0, 1.5, 1.0]),
    (30.0, &[3.5, 3.0, 2.0, 1.5, 1.0]),
    (36.0, &[4.0, 3.0, 2.0, 1.5]),
    (42.0, &[4.5, 4.0, 3.0, 2.0, 1.5]),
    (48.0, &[5.0, 4.0, 3.0, 2.0, 1.5]),
    (56.0, &[5.5, 4.0, 3.0, 2.0, 1.5]),
    (64.0, &[6.0, 4.0, 3.0, 2.0, 1.5]),
];

/// Family name used by [`StaticCatalog::iso_metric`]
pub const ISO_METRIC_FAMILY: &str = "ISO Metric profile";

impl StaticCatalog {
    pub fn new(families: Vec<ThreadFamily>) -> Self {
        Self { families }
    }

    /// Catalog containing the standard ISO metric coarse and fine series
    pub fn iso_metric() -> Self {
        let sizes = ISO_METRIC_PITCHES
            .iter()
            .map(|(diameter, pitches)| {
                let label = format!("M{}", diameter);
                let designations = pitches.iter().map(|p| format!("{}x{}", label, p)).collect();
                ThreadSizeEntry {
                    size: ThreadSize::new(label, *diameter),
                    designations,
                }
            })
            .collect();

        Self::new(vec![ThreadFamily {
            name: ISO_METRIC_FAMILY.into(),
            sizes,
        }])
    }

    /// Load a catalog from a RON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let content =
            std::fs::read_to_string(path.as_ref()).map_err(|e| CatalogError::Io(e.to_string()))?;
        ron::from_str(&content).map_err(|e| CatalogError::Deserialize(e.to_string()))
    }

    /// Save the catalog to a RON file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), CatalogError> {
        let content = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| CatalogError::Serialize(e.to_string()))?;
        std::fs::write(path.as_ref(), content).map_err(|e| CatalogError::Io(e.to_string()))
    }

    fn family(&self, name: &str) -> Option<&ThreadFamily> {
        self.families.iter().find(|f| f.name == name)
    }
}

impl ThreadCatalog for StaticCatalog {
    fn list_families(&self) -> Vec<String> {
        self.families.iter().map(|f| f.name.clone()).collect()
    }

    fn list_sizes(&self, family: &str) -> Vec<ThreadSize> {
        self.family(family)
            .map(|f| f.sizes.iter().map(|s| s.size.clone()).collect())
            .unwrap_or_default()
    }

    fn list_designations(&self, family: &str, size: &str) -> Vec<String> {
        self.family(family)
            .and_then(|f| f.sizes.iter().find(|s| s.size.label == size))
            .map(|s| s.designations.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_label() {
        assert_eq!(ThreadSize::from_label("M20").magnitude, 20.0);
        assert_eq!(ThreadSize::from_label("M1.6").magnitude, 1.6);
        assert_eq!(ThreadSize::from_label("1/4-20 UNC").magnitude, 1.0);
        assert_eq!(ThreadSize::from_label("M8.").magnitude, 8.0);
        assert_eq!(ThreadSize::from_label("Custom").magnitude, 0.0);
        assert_eq!(ThreadSize::from_label("").magnitude, 0.0);
    }

    #[test]
    fn test_label_only_catalog_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("threads.ron");
        std::fs::write(
            &path,
            r#"(
                families: [(
                    name: "ISO Metric profile",
                    sizes: [
                        (size: (label: "M8"), designations: ["M8x1.25"]),
                        (size: (label: "M10", magnitude: 9.5), designations: ["M10x1.5"]),
                        (size: (label: "Custom"), designations: ["Custom"]),
                    ],
                )],
            )"#,
        )
        .unwrap();

        let catalog = StaticCatalog::load(&path).unwrap();
        let sizes = catalog.list_sizes(ISO_METRIC_FAMILY);
        assert_eq!(sizes[0], ThreadSize::new("M8", 8.0));
        assert_eq!(sizes[1], ThreadSize::new("M10", 9.5));
        assert_eq!(sizes[2], ThreadSize::new("Custom", 0.0));

        let resolver = ThreadResolver::new("ISO Metric", "6g");
        assert_eq!(resolver.resolve(&catalog, 7.8).unwrap().size.label, "M8");
        assert_eq!(resolver.resolve(&catalog, 0.3).unwrap().size.label, "Custom");
    }

    #[test]
    fn test_iso_metric_catalog() {
        let catalog = StaticCatalog::iso_metric();
        assert_eq!(catalog.list_families(), vec![ISO_METRIC_FAMILY.to_string()]);

        let sizes = catalog.list_sizes(ISO_METRIC_FAMILY);
        assert!(sizes.iter().any(|s| s.label == "M20" && s.magnitude == 20.0));
        assert!(sizes.iter().any(|s| s.label == "M1.6"));

        let designations = catalog.list_designations(ISO_METRIC_FAMILY, "M20");
        assert_eq!(designations[0], "M20x2.5");
        assert!(designations.contains(&"M20x1.5".to_string()));
        assert_eq!(catalog.list_designations(ISO_METRIC_FAMILY, "M6")[0], "M6x1");
    }

    #[test]
    fn test_unknown_family_is_empty() {
        let catalog = StaticCatalog::iso_metric();
        assert!(catalog.list_sizes("ANSI Unified Screw Threads").is_empty());
        assert!(catalog.list_designations(ISO_METRIC_FAMILY, "M19").is_empty());
    }

    #[test]
    fn test_catalog_file_round_trip() {
        let catalog = StaticCatalog::iso_metric();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("threads.ron");

        catalog.save(&path).unwrap();
        assert_eq!(StaticCatalog::load(&path).unwrap(), catalog);
    }
}
