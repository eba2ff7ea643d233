//! Store des équipements
//!
//! Contient le jeu de données complet, non filtré. Il est rempli en une fois
//! par la source de données et remplacé intégralement à chaque rechargement.

use std::collections::HashSet;

use blake3::Hasher;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::types::{Facility, FacilityRecord};

/// Résultat d'un chargement du store
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    /// Enregistrements acceptés
    pub accepted: usize,
    /// Enregistrements rejetés pour coordonnées invalides
    pub rejected_coordinates: usize,
    /// Enregistrements rejetés car identifiant déjà présent
    pub rejected_duplicates: usize,
}

impl LoadReport {
    pub fn total_rejected(&self) -> usize {
        self.rejected_coordinates + self.rejected_duplicates
    }
}

/// Jeu de données complet, en ordre d'insertion
#[derive(Debug, Clone, Default)]
pub struct FacilityStore {
    facilities: Vec<Facility>,
}

impl FacilityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remplace tout le contenu du store
    ///
    /// Les enregistrements sans coordonnées valides n'entrent jamais dans le
    /// store. Pour un identifiant répété, la première occurrence est gardée.
    pub fn load<I>(&mut self, records: I) -> LoadReport
    where
        I: IntoIterator<Item = FacilityRecord>,
    {
        let mut report = LoadReport::default();
        let mut seen = HashSet::new();
        let mut facilities = Vec::new();

        for record in records {
            let facility = match Facility::try_from(record) {
                Ok(f) => f,
                Err(e) => {
                    debug!(error = %e, "Dropping facility record");
                    report.rejected_coordinates += 1;
                    continue;
                }
            };

            if !seen.insert(facility.id.clone()) {
                warn!(id = %facility.id, "Duplicate facility id, keeping first occurrence");
                report.rejected_duplicates += 1;
                continue;
            }

            facilities.push(facility);
        }

        report.accepted = facilities.len();
        self.facilities = facilities;

        info!(
            accepted = report.accepted,
            rejected_coordinates = report.rejected_coordinates,
            rejected_duplicates = report.rejected_duplicates,
            "Facility store loaded"
        );

        report
    }

    pub fn all(&self) -> &[Facility] {
        &self.facilities
    }

    pub fn len(&self) -> usize {
        self.facilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facilities.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Facility> {
        self.facilities.iter().find(|f| f.id == id)
    }

    /// Empreinte du jeu de données (ids et coordonnées, dans l'ordre)
    pub fn fingerprint(&self) -> [u8; 32] {
        let mut hasher = Hasher::new();
        for facility in &self.facilities {
            hasher.update(facility.id.as_bytes());
            hasher.update(&[0]);
            // Arrondi à 7 décimales (~1 cm)
            let lat = (facility.latitude * 10_000_000.0).round() as i64;
            let lng = (facility.longitude * 10_000_000.0).round() as i64;
            hasher.update(&lat.to_le_bytes());
            hasher.update(&lng.to_le_bytes());
        }
        *hasher.finalize().as_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::fixtures::record;

    #[test]
    fn test_load_drops_invalid_coordinates() {
        let mut store = FacilityStore::new();
        let report = store.load(vec![
            record("A", Some(37.5), Some(126.9)),
            record("B", None, Some(126.9)),
            record("C", Some(f64::NAN), Some(126.9)),
            record("D", Some(37.4), Some(127.0)),
        ]);

        assert_eq!(report.accepted, 2);
        assert_eq!(report.rejected_coordinates, 2);
        let ids: Vec<_> = store.all().iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["A", "D"]);
    }

    #[test]
    fn test_load_keeps_first_duplicate() {
        let mut store = FacilityStore::new();
        let report = store.load(vec![
            record("A", Some(37.5), Some(126.9)),
            record("A", Some(10.0), Some(10.0)),
        ]);

        assert_eq!(report.accepted, 1);
        assert_eq!(report.rejected_duplicates, 1);
        assert_eq!(report.total_rejected(), 1);
        assert_eq!(store.get("A").unwrap().latitude, 37.5);
    }

    #[test]
    fn test_load_replaces_wholesale() {
        let mut store = FacilityStore::new();
        store.load(vec![record("A", Some(1.0), Some(1.0))]);
        store.load(vec![record("B", Some(2.0), Some(2.0))]);

        assert_eq!(store.len(), 1);
        assert!(store.get("A").is_none());
        assert!(store.get("B").is_some());
    }

    #[test]
    fn test_empty_store() {
        let mut store = FacilityStore::new();
        store.load(Vec::new());
        assert!(store.is_empty());
        assert!(store.all().is_empty());
    }

    #[test]
    fn test_fingerprint_stable_and_order_sensitive() {
        let mut a = FacilityStore::new();
        a.load(vec![record("A", Some(1.0), Some(2.0)), record("B", Some(3.0), Some(4.0))]);
        let mut b = FacilityStore::new();
        b.load(vec![record("A", Some(1.0), Some(2.0)), record("B", Some(3.0), Some(4.0))]);
        let mut c = FacilityStore::new();
        c.load(vec![record("B", Some(3.0), Some(4.0)), record("A", Some(1.0), Some(2.0))]);

        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), c.fingerprint());
    }
}
