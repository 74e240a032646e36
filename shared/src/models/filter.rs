//! Provider table filter
//!
//! A provider passes when every non-empty filter is a case-insensitive
//! substring of its field, and the free-text search hits at least one of
//! name, tax id or phone.

use serde::{Deserialize, Serialize};

use super::provider::Provider;

/// Query-string filter for the provider table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderFilter {
    /// Free text matched against name, tax id and phone
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default, alias = "zona")]
    pub zone: Option<String>,
    #[serde(default, alias = "rubro")]
    pub category: Option<String>,
    #[serde(default, alias = "marca")]
    pub brand: Option<String>,
}

/// Lower-cased needle, or `None` when the filter imposes no constraint
fn needle(filter: &Option<String>) -> Option<String> {
    filter
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase)
}

fn contains(field: &Option<String>, needle: &str) -> bool {
    field
        .as_deref()
        .is_some_and(|value| value.to_lowercase().contains(needle))
}

impl ProviderFilter {
    /// True when no filter is set
    pub fn is_empty(&self) -> bool {
        [&self.search, &self.zone, &self.category, &self.brand]
            .iter()
            .all(|f| needle(f).is_none())
    }

    pub fn matches(&self, provider: &Provider) -> bool {
        if let Some(search) = needle(&self.search) {
            let hit = provider.name.to_lowercase().contains(&search)
                || contains(&provider.tax_id, &search)
                || contains(&provider.phone, &search);
            if !hit {
                return false;
            }
        }

        if let Some(zone) = needle(&self.zone)
            && !contains(&provider.zone, &zone)
        {
            return false;
        }

        if let Some(category) = needle(&self.category)
            && !contains(&provider.category, &category)
        {
            return false;
        }

        if let Some(brand) = needle(&self.brand)
            && !contains(&provider.brands, &brand)
        {
            return false;
        }

        true
    }
}

/// Keep the providers matching `filter`, preserving order
pub fn filter_providers<'a, I>(providers: I, filter: &ProviderFilter) -> Vec<Provider>
where
    I: IntoIterator<Item = &'a Provider>,
{
    providers
        .into_iter()
        .filter(|p| filter.matches(p))
        .cloned()
        .collect()
}
