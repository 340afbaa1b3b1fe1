// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Encoded polyline decoding (Strava routes, precision 5).
//!
//! Each coordinate is a pair of signed deltas. A delta is a run of 5-bit
//! groups offset by 63, least significant group first, with `0x20` set on
//! every group except the last. The low bit of the assembled value is the
//! sign. Deltas accumulate from `(0, 0)` and are scaled by `1e-5`.
//!
//! Truncated or malformed input never fails: decoding stops after the last
//! complete `(lat, lng)` pair. A delta longer than [`MAX_GROUPS`] groups is
//! malformed, which keeps the running totals far from overflow.

use geo::Coord;
use serde::Serialize;

const PRECISION: f64 = 1e5;

/// 35 bits per delta; a full 360° longitude swing needs 28.
pub const MAX_GROUPS: u32 = 7;

/// Decoded point in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl From<LatLng> for Coord<f64> {
    fn from(p: LatLng) -> Self {
        Coord { x: p.lng, y: p.lat }
    }
}

/// Decode an encoded polyline into an ordered coordinate sequence.
pub fn decode(encoded: &str) -> Vec<LatLng> {
    let bytes = encoded.as_bytes();
    let mut points = Vec::with_capacity(bytes.len() / 4);
    let mut index = 0;
    let mut lat: i64 = 0;
    let mut lng: i64 = 0;

    while index < bytes.len() {
        let next = next_delta(bytes, &mut index)
            .and_then(|dlat| next_delta(bytes, &mut index).map(|dlng| (dlat, dlng)))
            .and_then(|(dlat, dlng)| Some((lat.checked_add(dlat)?, lng.checked_add(dlng)?)));
        let Some((next_lat, next_lng)) = next else {
            tracing::debug!(
                decoded = points.len(),
                len = bytes.len(),
                "Polyline ended with an incomplete or malformed coordinate"
            );
            break;
        };
        lat = next_lat;
        lng = next_lng;
        points.push(LatLng {
            lat: lat as f64 / PRECISION,
            lng: lng as f64 / PRECISION,
        });
    }

    points
}

/// Read one signed delta, advancing `index`. `None` when the input ends
/// before a terminating group, runs past [`MAX_GROUPS`], or contains a byte
/// outside the alphabet.
fn next_delta(bytes: &[u8], index: &mut usize) -> Option<i64> {
    let mut result: i64 = 0;
    let mut shift = 0u32;

    loop {
        let byte = *bytes.get(*index)?;
        *index += 1;
        let group = i64::from(byte.checked_sub(63)?);
        if group > 0x3f || shift >= MAX_GROUPS * 5 {
            return None;
        }
        result |= (group & 0x1f) << shift;
        shift += 5;
        if group < 0x20 {
            break;
        }
    }

    Some(if result & 1 != 0 {
        !(result >> 1)
    } else {
        result >> 1
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::polyline::encode_coordinates;
    use geo::LineString;

    fn assert_close(points: &[LatLng], expected: &[(f64, f64)]) {
        assert_eq!(points.len(), expected.len());
        for (p, (lat, lng)) in points.iter().zip(expected) {
            assert!((p.lat - lat).abs() < 1e-5, "lat {} vs {}", p.lat, lat);
            assert!((p.lng - lng).abs() < 1e-5, "lng {} vs {}", p.lng, lng);
        }
    }

    #[test]
    fn test_reference_polyline() {
        let points = decode("_p~iF~ps|U_ulLnnqC_mqNvxq`@");
        assert_close(
            &points,
            &[(38.5, -120.2), (40.7, -120.95), (43.252, -126.453)],
        );
    }

    #[test]
    fn test_empty_input() {
        assert!(decode("").is_empty());
    }

    #[test]
    fn test_truncated_pair_is_dropped() {
        // Full first pair, then only the latitude of the second.
        let points = decode("_p~iF~ps|U_ulL");
        assert_close(&points, &[(38.5, -120.2)]);
    }

    #[test]
    fn test_truncated_group_is_dropped() {
        // Second latitude cut mid-run (continuation bit still set).
        let points = decode("_p~iF~ps|U_u");
        assert_close(&points, &[(38.5, -120.2)]);
    }

    #[test]
    fn test_garbage_bytes_do_not_panic() {
        let points = decode("_p~iF~ps|U\u{1}\u{2}");
        assert_close(&points, &[(38.5, -120.2)]);
        assert!(decode("é").is_empty());
        assert!(decode("~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~").is_empty());
    }

    #[test]
    fn test_repeated_point_kept() {
        // Zero deltas encode as '?'.
        let points = decode("_p~iF~ps|U????");
        assert_close(
            &points,
            &[(38.5, -120.2), (38.5, -120.2), (38.5, -120.2)],
        );
    }

    #[test]
    fn test_round_trip_against_reference_encoder() {
        let coords: Vec<(f64, f64)> = vec![
            (37.77493, -122.41942),
            (37.77501, -122.41899),
            (37.7762, -122.418),
            (-33.86785, 151.20732),
            (0.0, 0.0),
            (89.99999, -179.99999),
        ];
        let line: LineString<f64> = coords
            .iter()
            .map(|&(lat, lng)| Coord { x: lng, y: lat })
            .collect();
        let encoded = encode_coordinates(line, 5).unwrap();

        assert_close(&decode(&encoded), &coords);
    }

    #[test]
    fn test_overlong_delta_stops_cleanly() {
        // 13-group latitude delta (about 2^62) three times over, then '?'.
        let huge = "}~~~~~~~~~~~F";
        assert!(decode(&huge.repeat(3)).is_empty());
        assert!(decode(&format!("{}?", huge.repeat(3))).is_empty());

        // Good pair survives; the over-long delta after it ends decoding.
        let points = decode(&format!("_p~iF~ps|U{}?", huge));
        assert_close(&points, &[(38.5, -120.2)]);
    }

    #[test]
    fn test_longest_accepted_delta() {
        // Seven groups: continuation on the first six.
        let seven = "~~~~~~F";
        let points = decode(&format!("{}?", seven));
        assert_eq!(points.len(), 1);
        assert!(points[0].lat.is_finite());

        // An eighth group is rejected.
        assert!(decode("~~~~~~~F?").is_empty());
    }

    #[test]
    fn test_accumulation_never_overflows() {
        // Thousands of maximal (negative) deltas in a row stay finite.
        let pair = "~~~~~~F?";
        let points = decode(&pair.repeat(5_000));
        assert_eq!(points.len(), 5_000);
        assert!(points.iter().all(|p| p.lat.is_finite()));
        assert!(points[4_999].lat < points[0].lat);
    }
}
