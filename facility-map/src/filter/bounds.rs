//! Filtre par emprise de carte
//!
//! Les longitudes hors de [-180, 180] sont ramenées dans l'intervalle; une
//! emprise dont l'ouest dépasse l'est après normalisation traverse
//! l'antiméridien et se découpe en deux rectangles.

use geo::{coord, Rect};
use serde::Serialize;

use crate::types::{Facility, LatLng};
use crate::FacilityError;

/// Rectangle lat/lng visible à l'écran
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds {
    south: f64,
    west: f64,
    north: f64,
    east: f64,
}

impl Bounds {
    /// Le globe entier
    pub const WORLD: Bounds = Bounds {
        south: -90.0,
        west: -180.0,
        north: 90.0,
        east: 180.0,
    };

    /// Construit une emprise normalisée
    ///
    /// # Errors
    ///
    /// [`FacilityError::InvalidBounds`] si une valeur n'est pas finie ou si
    /// `south > north`.
    pub fn new(south: f64, west: f64, north: f64, east: f64) -> Result<Self, FacilityError> {
        if ![south, west, north, east].iter().all(|v| v.is_finite()) {
            return Err(FacilityError::InvalidBounds(format!(
                "non-finite value in ({}, {}, {}, {})",
                south, west, north, east
            )));
        }
        if south > north {
            return Err(FacilityError::InvalidBounds(format!(
                "south {} is above north {}",
                south, north
            )));
        }

        let (west, east) = if east - west >= 360.0 {
            (-180.0, 180.0)
        } else {
            (wrap_longitude(west), wrap_longitude(east))
        };

        Ok(Self {
            south: south.clamp(-90.0, 90.0),
            west,
            north: north.clamp(-90.0, 90.0),
            east,
        })
    }

    /// Emprise centrée sur un point, avec des étendues en degrés
    pub fn around(center: LatLng, lat_span: f64, lng_span: f64) -> Result<Self, FacilityError> {
        let half_lat = lat_span.abs() / 2.0;
        let half_lng = lng_span.abs() / 2.0;
        Self::new(
            center.lat - half_lat,
            center.lng - half_lng,
            center.lat + half_lat,
            center.lng + half_lng,
        )
    }

    pub fn south(&self) -> f64 {
        self.south
    }

    pub fn west(&self) -> f64 {
        self.west
    }

    pub fn north(&self) -> f64 {
        self.north
    }

    pub fn east(&self) -> f64 {
        self.east
    }

    pub fn crosses_antimeridian(&self) -> bool {
        self.west > self.east
    }

    pub fn lat_span(&self) -> f64 {
        self.north - self.south
    }

    pub fn lng_span(&self) -> f64 {
        if self.crosses_antimeridian() {
            self.east + 360.0 - self.west
        } else {
            self.east - self.west
        }
    }

    pub fn center(&self) -> LatLng {
        let rect = Rect::new(
            coord! { x: self.west, y: self.south },
            coord! { x: self.west + self.lng_span(), y: self.north },
        );
        let c = rect.center();
        LatLng::new(c.y, wrap_longitude(c.x))
    }

    /// Test d'appartenance, bornes incluses
    pub fn contains(&self, lat: f64, lng: f64) -> bool {
        let lat_ok = lat >= self.south && lat <= self.north;
        let lng_ok = if self.crosses_antimeridian() {
            lng >= self.west || lng <= self.east
        } else {
            lng >= self.west && lng <= self.east
        };
        lat_ok && lng_ok
    }

    /// Découpe en rectangles ne traversant pas l'antiméridien
    pub fn split(&self) -> Vec<Bounds> {
        if !self.crosses_antimeridian() {
            return vec![*self];
        }
        vec![
            Bounds {
                east: 180.0,
                ..*self
            },
            Bounds {
                west: -180.0,
                ..*self
            },
        ]
    }
}

/// Ramène une longitude dans [-180, 180]
fn wrap_longitude(lng: f64) -> f64 {
    if (-180.0..=180.0).contains(&lng) {
        lng
    } else {
        (lng + 180.0).rem_euclid(360.0) - 180.0
    }
}

/// Sélectionne les équipements situés dans l'emprise (ordre conservé)
pub fn select_in_bounds<'a, I>(facilities: I, bounds: &Bounds) -> Vec<&'a Facility>
where
    I: IntoIterator<Item = &'a Facility>,
{
    facilities
        .into_iter()
        .filter(|f| bounds.contains(f.latitude, f.longitude))
        .collect()
}
