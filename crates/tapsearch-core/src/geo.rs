//! Planar nearest-neighbour search in raw degree space.
//!
//! Distances here are Euclidean over `(lat, lng)` degrees, not geodesic.
//! Ordering by this metric approximates true distance ordering only over
//! small search radii; it is not area-accurate. The Postgres query in
//! `tapsearch-db` uses the same formula so both paths agree.

use serde::{Deserialize, Serialize};

use crate::CoreError;

/// A WGS84 point, latitude first.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    /// Builds a coordinate, rejecting non-finite or out-of-range values.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidCoordinate`] if `lat` is outside
    /// `[-90, 90]`, `lng` is outside `[-180, 180]`, or either is NaN/infinite.
    pub fn new(lat: f64, lng: f64) -> Result<Self, CoreError> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(CoreError::InvalidCoordinate(format!(
                "latitude {lat} must be between -90 and 90"
            )));
        }
        if !lng.is_finite() || !(-180.0..=180.0).contains(&lng) {
            return Err(CoreError::InvalidCoordinate(format!(
                "longitude {lng} must be between -180 and 180"
            )));
        }
        Ok(Self { lat, lng })
    }
}

/// Anything with a point location that can take part in a nearest search.
pub trait Located {
    fn lat(&self) -> f64;
    fn lng(&self) -> f64;
}

impl Located for Coordinates {
    fn lat(&self) -> f64 {
        self.lat
    }

    fn lng(&self) -> f64 {
        self.lng
    }
}

/// `sqrt((a.lat - b.lat)^2 + (a.lng - b.lng)^2)` in degrees.
#[must_use]
pub fn planar_distance(a: &impl Located, b: &impl Located) -> f64 {
    let dlat = a.lat() - b.lat();
    let dlng = a.lng() - b.lng();
    (dlat * dlat + dlng * dlng).sqrt()
}

/// Winner of a nearest search along with its position in the input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Nearest<T> {
    pub index: usize,
    pub record: T,
    pub distance: f64,
}

/// Returns the record with the smallest planar distance to `query`.
///
/// Ties go to the record that appears first in `records`. Returns `None`
/// for an empty slice.
pub fn nearest<'a, T: Located>(records: &'a [T], query: &Coordinates) -> Option<Nearest<&'a T>> {
    let mut best: Option<Nearest<&'a T>> = None;
    for (index, record) in records.iter().enumerate() {
        let distance = planar_distance(record, query);
        // strict comparison keeps the earliest record on ties
        if best.is_none_or(|b| distance < b.distance) {
            best = Some(Nearest {
                index,
                record,
                distance,
            });
        }
    }
    best
}

/// Records within `radius_deg` of `query`, closest first, ties by input order.
pub fn within_radius<'a, T: Located>(
    records: &'a [T],
    query: &Coordinates,
    radius_deg: f64,
) -> Vec<Nearest<&'a T>> {
    let mut hits: Vec<Nearest<&'a T>> = records
        .iter()
        .enumerate()
        .map(|(index, record)| Nearest {
            index,
            record,
            distance: planar_distance(record, query),
        })
        .filter(|n| n.distance <= radius_deg)
        .collect();
    hits.sort_by(|a, b| a.distance.total_cmp(&b.distance).then(a.index.cmp(&b.index)));
    hits
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Poi {
        id: &'static str,
        lat: f64,
        lng: f64,
    }

    impl Located for Poi {
        fn lat(&self) -> f64 {
            self.lat
        }

        fn lng(&self) -> f64 {
            self.lng
        }
    }

    fn scenario() -> Vec<Poi> {
        vec![
            Poi {
                id: "A",
                lat: 35.0,
                lng: 139.0,
            },
            Poi {
                id: "C",
                lat: 36.0,
                lng: 140.0,
            },
        ]
    }

    fn q(lat: f64, lng: f64) -> Coordinates {
        Coordinates { lat, lng }
    }

    #[test]
    fn nearest_picks_a_for_tap_next_to_it() {
        let data = scenario();
        let hit = nearest(&data, &q(35.01, 139.01)).expect("non-empty");
        assert_eq!(hit.record.id, "A");
        assert_eq!(hit.index, 0);
        assert!((hit.distance - 0.014_142_136).abs() < 1e-6);
    }

    #[test]
    fn nearest_from_origin_is_a() {
        let data = scenario();
        let hit = nearest(&data, &q(0.0, 0.0)).expect("non-empty");
        assert_eq!(hit.record.id, "A");
        assert!((hit.distance - 143.338_760).abs() < 1e-5);
        let c_distance = planar_distance(&data[1], &q(0.0, 0.0));
        assert!((c_distance - 144.554_488).abs() < 1e-5);
    }

    #[test]
    fn planar_distance_is_the_plain_square_root_of_squares() {
        // Same expression Postgres evaluates: SQRT(POWER(dlat, 2) + POWER(dlng, 2)).
        let cases = [
            (q(35.01, 139.01), q(35.0, 139.0)),
            (q(0.0, 0.0), q(36.0, 140.0)),
            (q(35.682_146, 139.681_979), q(35.6822, 139.682)),
            (q(-89.999_999, 179.999_999), q(89.999_999, -179.999_999)),
        ];
        for (a, b) in cases {
            let dlat = a.lat - b.lat;
            let dlng = a.lng - b.lng;
            let expected = (dlat * dlat + dlng * dlng).sqrt();
            assert_eq!(planar_distance(&a, &b).to_bits(), expected.to_bits());
        }
    }

    #[test]
    fn nearest_on_empty_dataset_is_none() {
        let data: Vec<Poi> = Vec::new();
        assert!(nearest(&data, &q(35.0, 139.0)).is_none());
    }

    #[test]
    fn nearest_ties_resolve_to_lowest_index() {
        let data = vec![
            Poi {
                id: "east",
                lat: 0.0,
                lng: 1.0,
            },
            Poi {
                id: "west",
                lat: 0.0,
                lng: -1.0,
            },
            Poi {
                id: "north",
                lat: 1.0,
                lng: 0.0,
            },
        ];
        let hit = nearest(&data, &q(0.0, 0.0)).expect("non-empty");
        assert_eq!(hit.record.id, "east");
        assert_eq!(hit.index, 0);
    }

    #[test]
    fn nearest_matches_brute_force_minimum() {
        let data: Vec<Poi> = (0..50_u32)
            .map(|i| {
                let f = f64::from(i);
                Poi {
                    id: "grid",
                    lat: (f * 7.3) % 20.0 - 10.0,
                    lng: (f * 3.1) % 40.0 - 20.0,
                }
            })
            .collect();
        let query = q(1.25, -3.5);
        let hit = nearest(&data, &query).expect("non-empty");
        for (i, poi) in data.iter().enumerate() {
            let d = planar_distance(poi, &query);
            assert!(hit.distance <= d, "record {i} is closer than the winner");
            if (d - hit.distance).abs() < f64::EPSILON {
                assert!(hit.index <= i);
            }
        }
    }

    #[test]
    fn planar_distance_is_not_haversine() {
        // one degree of longitude at 60N is half as long on the ground, but
        // the planar metric treats it the same as one degree of latitude
        let d_lng = planar_distance(&q(60.0, 0.0), &q(60.0, 1.0));
        let d_lat = planar_distance(&q(60.0, 0.0), &q(61.0, 0.0));
        assert!((d_lng - d_lat).abs() < 1e-12);
    }

    #[test]
    fn within_radius_orders_by_distance() {
        let data = vec![
            Poi {
                id: "far",
                lat: 0.0,
                lng: 0.009,
            },
            Poi {
                id: "near",
                lat: 0.0,
                lng: 0.001,
            },
            Poi {
                id: "outside",
                lat: 1.0,
                lng: 1.0,
            },
        ];
        let hits = within_radius(&data, &q(0.0, 0.0), 0.01);
        let ids: Vec<&str> = hits.iter().map(|h| h.record.id).collect();
        assert_eq!(ids, vec!["near", "far"]);
    }

    #[test]
    fn coordinates_new_rejects_out_of_range() {
        assert!(Coordinates::new(90.5, 0.0).is_err());
        assert!(Coordinates::new(0.0, -180.5).is_err());
        assert!(Coordinates::new(f64::NAN, 0.0).is_err());
        assert!(Coordinates::new(0.0, 0.0).is_ok());
        assert!(Coordinates::new(-90.0, 180.0).is_ok());
    }
}
