//! Filtre par facettes (gratuité, éclairage, parking, catégorie)

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::types::{Category, Facility};
use crate::FacilityError;

/// Contrainte de catégorie: toutes, ou une seule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Category),
}

impl CategoryFilter {
    pub fn accepts(&self, category: Category) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(wanted) => *wanted == category,
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = FacilityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(CategoryFilter::All);
        }
        s.parse().map(CategoryFilter::Only)
    }
}

impl TryFrom<String> for CategoryFilter {
    type Error = FacilityError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CategoryFilter> for String {
    fn from(value: CategoryFilter) -> Self {
        value.to_string()
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryFilter::All => f.write_str("all"),
            CategoryFilter::Only(category) => fmt::Display::fmt(category, f),
        }
    }
}

/// Règles de filtrage choisies par l'utilisateur
///
/// Valeur pure, construite une fois par événement. La valeur par défaut est
/// le filtre identité.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterRule {
    pub free_only: bool,
    pub need_night_light: bool,
    pub need_parking: bool,
    pub category: CategoryFilter,
}

impl FilterRule {
    /// Vrai si aucune règle n'est active
    pub fn is_identity(&self) -> bool {
        *self == FilterRule::default()
    }

    /// Applique les règles dans l'ordre fixe, avec court-circuit
    pub fn matches(&self, facility: &Facility) -> bool {
        if self.free_only && !facility.is_free {
            return false;
        }
        if self.need_night_light && !facility.has_night_light {
            return false;
        }
        if self.need_parking && !facility.has_parking {
            return false;
        }
        self.category.accepts(facility.category)
    }
}

/// Sélectionne les équipements satisfaisant toutes les règles actives
pub fn select_by_rules<'a, I>(facilities: I, rules: &FilterRule) -> Vec<&'a Facility>
where
    I: IntoIterator<Item = &'a Facility>,
{
    facilities.into_iter().filter(|f| rules.matches(f)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::fixtures::facility;

    fn dataset() -> Vec<Facility> {
        let mut paid = facility("PAID", 37.47, 126.95);
        paid.is_free = false;
        paid.category = Category::Futsal;

        let mut dark = facility("DARK", 37.48, 126.93);
        dark.has_night_light = false;
        dark.has_parking = false;
        dark.category = Category::HorizontalBar;

        let mut no_parking = facility("NOPARK", 37.49, 126.92);
        no_parking.has_parking = false;

        vec![facility("ALL", 37.5, 126.9), paid, dark, no_parking]
    }

    fn ids<'a>(facilities: &[&'a Facility]) -> Vec<&'a str> {
        facilities.iter().map(|f| f.id.as_str()).collect()
    }

    #[test]
    fn test_identity_rule() {
        let data = dataset();
        let rule = FilterRule::default();
        assert!(rule.is_identity());
        assert_eq!(select_by_rules(&data, &rule).len(), data.len());
    }

    #[test]
    fn test_each_rule() {
        let data = dataset();

        let free = FilterRule { free_only: true, ..Default::default() };
        assert_eq!(ids(&select_by_rules(&data, &free)), vec!["ALL", "DARK", "NOPARK"]);

        let night = FilterRule { need_night_light: true, ..Default::default() };
        assert_eq!(ids(&select_by_rules(&data, &night)), vec!["ALL", "PAID", "NOPARK"]);

        let parking = FilterRule { need_parking: true, ..Default::default() };
        assert_eq!(ids(&select_by_rules(&data, &parking)), vec!["ALL", "PAID"]);

        let bars = FilterRule {
            category: CategoryFilter::Only(Category::HorizontalBar),
            ..Default::default()
        };
        assert_eq!(ids(&select_by_rules(&data, &bars)), vec!["DARK"]);
    }

    #[test]
    fn test_rules_are_conjunctive() {
        let data = dataset();
        let rule = FilterRule {
            free_only: true,
            need_night_light: true,
            need_parking: true,
            category: CategoryFilter::Only(Category::Basketball),
        };
        assert_eq!(ids(&select_by_rules(&data, &rule)), vec!["ALL"]);
    }

    #[test]
    fn test_disabling_a_rule_never_removes() {
        let data = dataset();
        let full = FilterRule {
            free_only: true,
            need_night_light: true,
            need_parking: true,
            category: CategoryFilter::Only(Category::Basketball),
        };
        let strict = select_by_rules(&data, &full).len();

        let relaxed = [
            FilterRule { free_only: false, ..full },
            FilterRule { need_night_light: false, ..full },
            FilterRule { need_parking: false, ..full },
            FilterRule { category: CategoryFilter::All, ..full },
        ];
        for rule in relaxed {
            let selected = select_by_rules(&data, &rule);
            assert!(selected.len() >= strict);
            for f in select_by_rules(&data, &full) {
                assert!(selected.iter().any(|s| s.id == f.id));
            }
        }
    }

    #[test]
    fn test_category_filter_parse_and_serde() {
        assert_eq!("all".parse::<CategoryFilter>().unwrap(), CategoryFilter::All);
        assert_eq!(
            "농구".parse::<CategoryFilter>().unwrap(),
            CategoryFilter::Only(Category::Basketball)
        );
        assert!("bowling".parse::<CategoryFilter>().is_err());

        let rule: FilterRule =
            serde_json::from_str(r#"{"free_only": true, "category": "tennis"}"#).unwrap();
        assert!(rule.free_only);
        assert!(!rule.need_parking);
        assert_eq!(rule.category, CategoryFilter::Only(Category::Tennis));

        let json = serde_json::to_string(&FilterRule::default()).unwrap();
        assert!(json.contains(r#""category":"all""#));
    }

    #[test]
    fn test_empty_input() {
        let data: Vec<Facility> = Vec::new();
        assert!(select_by_rules(&data, &FilterRule::default()).is_empty());
    }
}
