//! Diameter to thread size resolution

use std::fmt::Write;

use super::{ThreadCatalog, ThreadSize};
use crate::error::{FitError, ValidationError};
use crate::feature::ThreadSpec;

/// Size whose magnitude is closest to `diameter_mm`; first match wins ties
pub fn closest_size(sizes: &[ThreadSize], diameter_mm: f64) -> Option<&ThreadSize> {
    let mut best: Option<(&ThreadSize, f64)> = None;
    for size in sizes {
        let diff = (size.magnitude - diameter_mm).abs();
        if best.is_none_or(|(_, d)| diff < d) {
            best = Some((size, diff));
        }
    }
    best.map(|(size, _)| size)
}

/// Result of matching a measured diameter against the catalog
#[derive(Debug, Clone, PartialEq)]
pub struct ThreadResolution {
    /// Full family name as listed by the catalog
    pub family: String,
    /// Chosen nominal size
    pub size: ThreadSize,
    /// Measured diameter
    pub diameter_mm: f64,
    /// Designations for the user to choose from, in catalog order
    pub designations: Vec<String>,
    /// Tolerance class applied to the thread
    pub tolerance_class: String,
}

impl ThreadResolution {
    /// Prompt text listing every designation with its index
    pub fn prompt(&self) -> String {
        let rounded = (self.diameter_mm * 100.0).round() / 100.0;
        let mut msg = format!("Detected ~{}mm diameter. Select Designation:\n", rounded);
        for (i, d) in self.designations.iter().enumerate() {
            let _ = writeln!(msg, "[{}]: {}", i, d);
        }
        msg
    }

    /// Interpret a user answer as an index into the designation list
    pub fn choose(&self, answer: &str) -> Result<&str, FitError> {
        let index: usize = answer.trim().parse().map_err(|_| {
            FitError::InvalidSelection(format!("'{}' is not a designation index", answer.trim()))
        })?;
        self.designations
            .get(index)
            .map(String::as_str)
            .ok_or_else(|| {
                FitError::InvalidSelection(format!(
                    "Index {} out of range (0..{})",
                    index,
                    self.designations.len()
                ))
            })
    }

    /// Thread specification for one of the designations
    pub fn thread_spec(&self, designation: &str) -> ThreadSpec {
        ThreadSpec::new(
            &self.family,
            &self.size.label,
            designation,
            &self.tolerance_class,
        )
    }
}

/// Matches measured diameters to a thread family
#[derive(Debug, Clone)]
pub struct ThreadResolver {
    family_query: String,
    tolerance_class: String,
}

impl ThreadResolver {
    /// `family_query` is matched as a substring of catalog family names
    pub fn new(family_query: impl Into<String>, tolerance_class: impl Into<String>) -> Self {
        Self {
            family_query: family_query.into(),
            tolerance_class: tolerance_class.into(),
        }
    }

    /// First catalog family whose name contains the query
    pub fn find_family<C: ThreadCatalog + ?Sized>(
        &self,
        catalog: &C,
    ) -> Result<String, ValidationError> {
        catalog
            .list_families()
            .into_iter()
            .find(|name| name.contains(&self.family_query))
            .ok_or_else(|| ValidationError::StandardNotFound(self.family_query.clone()))
    }

    /// Pick the closest size for `diameter_mm` and list its designations
    pub fn resolve<C: ThreadCatalog + ?Sized>(
        &self,
        catalog: &C,
        diameter_mm: f64,
    ) -> Result<ThreadResolution, ValidationError> {
        let family = self.find_family(catalog)?;
        let sizes = catalog.list_sizes(&family);
        let size = closest_size(&sizes, diameter_mm)
            .cloned()
            .ok_or_else(|| ValidationError::NoThreadSizes(family.clone()))?;

        let designations = catalog.list_designations(&family, &size.label);
        if designations.is_empty() {
            return Err(ValidationError::NoDesignations {
                family,
                size: size.label,
            });
        }

        tracing::debug!(
            "Resolved {:.3}mm to {} {} ({} designations)",
            diameter_mm,
            family,
            size.label,
            designations.len()
        );

        Ok(ThreadResolution {
            family,
            size,
            diameter_mm,
            designations,
            tolerance_class: self.tolerance_class.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::thread::{StaticCatalog, ThreadFamily, ThreadSizeEntry};

    fn catalog(labels: &[&str]) -> StaticCatalog {
        StaticCatalog::new(vec![
            ThreadFamily {
                name: "ANSI Unified Screw Threads".into(),
                sizes: Vec::new(),
            },
            ThreadFamily {
                name: "ISO Metric profile".into(),
                sizes: labels
                    .iter()
                    .map(|l| ThreadSizeEntry {
                        size: ThreadSize::from_label(*l),
                        designations: vec![format!("{}x1", l), format!("{}x0.5", l)],
                    })
                    .collect(),
            },
        ])
    }

    #[test]
    fn test_closest_size() {
        let catalog = catalog(&["M6", "M8", "M10", "M12"]);
        let resolver = ThreadResolver::new("ISO Metric", "6g");

        let resolution = resolver.resolve(&catalog, 8.9).unwrap();
        assert_eq!(resolution.size.label, "M8");
        assert_eq!(resolution.family, "ISO Metric profile");
        assert_eq!(resolution.designations, vec!["M8x1", "M8x0.5"]);
        assert_eq!(resolution.tolerance_class, "6g");
    }

    #[test]
    fn test_tie_keeps_catalog_order() {
        let sizes = vec![ThreadSize::new("M8", 8.0), ThreadSize::new("M10", 10.0)];
        assert_eq!(closest_size(&sizes, 9.0).unwrap().label, "M8");
        assert!(closest_size(&[], 9.0).is_none());
    }

    #[test]
    fn test_unparsable_labels_rank_low() {
        let catalog = catalog(&["Custom", "M20"]);
        let resolver = ThreadResolver::new("ISO Metric", "6g");
        assert_eq!(resolver.resolve(&catalog, 19.7).unwrap().size.label, "M20");
        assert_eq!(resolver.resolve(&catalog, 0.4).unwrap().size.label, "Custom");
    }

    #[test]
    fn test_deterministic() {
        let catalog = StaticCatalog::iso_metric();
        let resolver = ThreadResolver::new("ISO Metric", "6g");
        let a = resolver.resolve(&catalog, 20.0).unwrap();
        let b = resolver.resolve(&catalog, 20.0).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.size.label, "M20");
    }

    #[test]
    fn test_standard_not_found() {
        let catalog = catalog(&["M8"]);
        let resolver = ThreadResolver::new("BSW", "6g");
        assert_eq!(
            resolver.resolve(&catalog, 8.0).unwrap_err(),
            ValidationError::StandardNotFound("BSW".into())
        );
    }

    #[test]
    fn test_empty_family() {
        let catalog = catalog(&[]);
        let resolver = ThreadResolver::new("ISO Metric", "6g");
        assert!(matches!(
            resolver.resolve(&catalog, 8.0),
            Err(ValidationError::NoThreadSizes(_))
        ));
    }

    #[test]
    fn test_prompt_and_choice() {
        let catalog = StaticCatalog::iso_metric();
        let resolution = ThreadResolver::new("ISO Metric", "6g")
            .resolve(&catalog, 20.0)
            .unwrap();

        let prompt = resolution.prompt();
        assert!(prompt.starts_with("Detected ~20mm diameter. Select Designation:\n"));
        assert!(prompt.contains("[0]: M20x2.5\n"));

        assert_eq!(resolution.choose("0").unwrap(), "M20x2.5");
        assert_eq!(resolution.choose(" 1 ").unwrap(), "M20x2");
        assert!(matches!(resolution.choose("9"), Err(FitError::InvalidSelection(_))));
        assert!(matches!(resolution.choose("-1"), Err(FitError::InvalidSelection(_))));
        assert!(matches!(resolution.choose("two"), Err(FitError::InvalidSelection(_))));

        let spec = resolution.thread_spec("M20x2.5");
        assert_eq!(spec.size, "M20");
        assert_eq!(spec.family, "ISO Metric profile");
    }
}
