//! Filtrage des équipements: emprise puis facettes

pub mod bounds;
pub mod facet;

pub use bounds::{select_in_bounds, Bounds};
pub use facet::{select_by_rules, CategoryFilter, FilterRule};

use crate::types::Facility;

/// Calcule l'ensemble visible: emprise d'abord, puis règles
pub fn visible_facilities<'a, I>(facilities: I, bounds: &Bounds, rules: &FilterRule) -> Vec<&'a Facility>
where
    I: IntoIterator<Item = &'a Facility>,
{
    select_by_rules(select_in_bounds(facilities, bounds), rules)
}
