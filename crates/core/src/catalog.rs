//! Field-readiness checklist catalogue.
//!
//! The catalogue is supplied by an external administration component as an
//! ordered mapping from category name to ordered item labels. It is read-only
//! for this core: the checklist engine records completion against it but
//! never changes it.

use crate::{PostError, PostResult};
use serde::Deserialize;
use std::collections::HashSet;

/// One category of checklist items, in display order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CatalogCategory {
    pub name: String,
    pub items: Vec<String>,
}

/// The full catalogue: ordered categories of ordered items.
///
/// Item labels are unique across the whole catalogue — checklist state is
/// keyed by label alone.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChecklistCatalog {
    categories: Vec<CatalogCategory>,
}

/// Wire representation of the catalogue YAML file.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogWire {
    categories: Vec<CategoryWire>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct CategoryWire {
    name: String,
    items: Vec<String>,
}

impl ChecklistCatalog {
    /// Parses a catalogue from YAML text.
    ///
    /// # Errors
    ///
    /// Returns `PostError::CatalogParse` if the YAML does not match the wire
    /// schema, or `PostError::Validation` if a category or item label is
    /// empty or an item label appears twice.
    pub fn from_yaml(text: &str) -> PostResult<Self> {
        let wire: CatalogWire = serde_yaml::from_str(text)?;

        let categories: Vec<CatalogCategory> = wire
            .categories
            .into_iter()
            .map(|c| CatalogCategory {
                name: c.name,
                items: c.items,
            })
            .collect();

        validate(&categories)?;
        Ok(Self { categories })
    }

    /// The built-in default catalogue, used when no file is configured.
    ///
    /// Covers the physical readiness of a field post: shelter, medical
    /// supplies, communications and power.
    pub fn builtin() -> Self {
        let categories = [
            (
                "Tents",
                &[
                    "Triage tent erected",
                    "Treatment tent erected",
                    "Signage in place",
                ][..],
            ),
            (
                "Medical supplies",
                &[
                    "Oxygen cylinders checked",
                    "Dressing kits stocked",
                    "Stretchers available",
                    "Defibrillator tested",
                ][..],
            ),
            (
                "Communications",
                &["Radio check completed", "Dispatch line open"][..],
            ),
            ("Power", &["Generator fuelled", "Lighting rigged"][..]),
        ]
        .into_iter()
        .map(|(name, items)| CatalogCategory {
            name: name.to_string(),
            items: items.iter().map(|i| i.to_string()).collect(),
        })
        .collect();

        Self { categories }
    }

    /// All categories, in catalogue order.
    pub fn categories(&self) -> &[CatalogCategory] {
        &self.categories
    }

    /// Looks up a category by name.
    pub fn category(&self, name: &str) -> Option<&CatalogCategory> {
        self.categories.iter().find(|c| c.name == name)
    }

    /// Returns true if `label` is an item in any category.
    pub fn contains_item(&self, label: &str) -> bool {
        self.items().any(|item| item == label)
    }

    /// All item labels across all categories, in catalogue order.
    pub fn items(&self) -> impl Iterator<Item = &str> {
        self.categories
            .iter()
            .flat_map(|c| c.items.iter().map(String::as_str))
    }

    /// Total number of items in the catalogue.
    pub fn item_count(&self) -> usize {
        self.categories.iter().map(|c| c.items.len()).sum()
    }
}

fn validate(categories: &[CatalogCategory]) -> PostResult<()> {
    let mut seen = HashSet::new();

    for category in categories {
        if category.name.trim().is_empty() {
            return Err(PostError::Validation(
                "catalogue category name cannot be empty".into(),
            ));
        }
        for item in &category.items {
            if item.trim().is_empty() {
                return Err(PostError::Validation(format!(
                    "category '{}' contains an empty item label",
                    category.name
                )));
            }
            if !seen.insert(item.as_str()) {
                return Err(PostError::Validation(format!(
                    "item label '{}' appears more than once in the catalogue",
                    item
                )));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_YAML: &str = "\
categories:
  - name: Tents
    items:
      - Triage tent erected
      - Signage in place
  - name: Power
    items:
      - Generator fuelled
";

    #[test]
    fn parses_ordered_categories_from_yaml() {
        let catalog = ChecklistCatalog::from_yaml(SAMPLE_YAML).expect("parse");
        assert_eq!(catalog.categories().len(), 2);
        assert_eq!(catalog.categories()[0].name, "Tents");
        assert_eq!(catalog.item_count(), 3);
        assert!(catalog.contains_item("Generator fuelled"));
        assert!(!catalog.contains_item("Defibrillator tested"));
    }

    #[test]
    fn rejects_unknown_yaml_keys() {
        let err = ChecklistCatalog::from_yaml("categories: []\nextra: 1\n")
            .expect_err("unknown key should fail");
        assert!(matches!(err, PostError::CatalogParse(_)));
    }

    #[test]
    fn rejects_duplicate_item_labels() {
        let yaml = "\
categories:
  - name: A
    items: [Radio check completed]
  - name: B
    items: [Radio check completed]
";
        let err = ChecklistCatalog::from_yaml(yaml).expect_err("duplicate should fail");
        assert!(matches!(err, PostError::Validation(_)));
    }

    #[test]
    fn builtin_catalogue_is_valid() {
        let catalog = ChecklistCatalog::builtin();
        assert!(catalog.item_count() > 0);
        assert!(catalog.category("Power").is_some());
        assert!(validate(catalog.categories()).is_ok());
    }
}
