//! Record-level round trips.
//!
//! Tests cover:
//! - Representative records through encode then decode
//! - Every altitude type and datum, reserved values included
//! - Fixed-point and uncertainty quantization bounds (property based)
//! - Decoder robustness against arbitrary input

use lcicoder::{
    decode, encode, AltitudeType, BssidEntry, BssidList, Datum, Diagnostics, EncodeOptions,
    FixedPoint, FloorField, GeodeticField, Inclusion, LocationRecord, Movement, UncertaintyScale,
    UsagePolicyField, ZeroPolicy,
};
use proptest::prelude::*;

fn round_trip(record: &LocationRecord, options: &EncodeOptions) -> LocationRecord {
    let encoded = encode(record, options).unwrap();
    decode(&encoded.hex).unwrap().record
}

fn located(latitude: f64, longitude: f64) -> GeodeticField {
    GeodeticField {
        latitude,
        longitude,
        altitude: 10.5,
        latitude_uncertainty: 2f64.powi(-8),
        longitude_uncertainty: 2f64.powi(-8),
        altitude_uncertainty: 4.0,
        ..GeodeticField::default()
    }
}

#[test]
fn test_all_zero_record_forced() {
    let forced = EncodeOptions {
        geodetic: Inclusion::Force,
        floor: Inclusion::Force,
        usage: Inclusion::Force,
        bssids: Inclusion::Force,
        ..EncodeOptions::default()
    };
    let encoded = encode(&LocationRecord::default(), &forced).unwrap();
    // Only altitude type 1, datum 1 and version 1 are nonzero
    assert_eq!(
        encoded.hex,
        "010008\
         00100000000000000000000001000000004\
         1\
         0406000000000000\
         060101\
         070100"
    );

    let back = decode(&encoded.hex).unwrap();
    assert!(back.diagnostics.is_empty());
    assert_eq!(back.record.geodetic, Some(GeodeticField::default()));
    assert_eq!(back.record.floor, Some(FloorField::default()));
    assert_eq!(back.record.usage, Some(UsagePolicyField::default()));
    assert_eq!(
        back.record.bssids,
        Some(BssidList {
            max_indicator: Some(0),
            entries: Vec::new(),
        })
    );
}

#[test]
fn test_extreme_coordinates() {
    for latitude in [-90.0, 90.0] {
        for longitude in [-180.0, 180.0] {
            let record = LocationRecord {
                geodetic: Some(located(latitude, longitude)),
                ..LocationRecord::default()
            };
            let back = round_trip(&record, &EncodeOptions::default());
            assert_eq!(back.geodetic, record.geodetic, "{latitude}, {longitude}");
        }
    }
}

#[test]
fn test_every_altitude_type_and_datum() {
    for alt_code in 0..16u8 {
        for datum_code in 0..8u8 {
            let record = LocationRecord {
                geodetic: Some(GeodeticField {
                    altitude_type: AltitudeType::from_code(alt_code),
                    datum: Datum::from_code(datum_code),
                    ..located(-33.5, 151.25)
                }),
                ..LocationRecord::default()
            };
            let encoded = encode(&record, &EncodeOptions::default()).unwrap();
            let back = decode(&encoded.hex).unwrap().record;

            let geo = back.geodetic.unwrap();
            assert_eq!(geo.altitude_type.code(), alt_code);
            assert_eq!(geo.datum.code(), datum_code);
            // Altitude uncertainty travels whatever the altitude type
            assert_eq!(geo.altitude_uncertainty, 4.0);
            assert_eq!(Some(geo), record.geodetic);
        }
    }
}

#[test]
fn test_full_record() {
    let record = LocationRecord {
        geodetic: Some(GeodeticField {
            regulatory_agreement: true,
            dependent_station: true,
            ..located(48.858_37, 2.294_481)
        }),
        floor: Some(FloorField {
            floor: -1.5,
            height_above_floor: 2.75,
            height_uncertainty: 0.25,
            movement: Movement::Fixed,
        }),
        usage: Some(UsagePolicyField {
            retention_expires_present: true,
            expiration_hours: 48,
            ..UsagePolicyField::default()
        }),
        bssids: Some(BssidList {
            max_indicator: Some(3),
            entries: vec![
                BssidEntry::parse("00:11:22:33:44:55"),
                BssidEntry::parse("66-77-88-99-aa-bb"),
                BssidEntry::parse("ccddeeff0011"),
            ],
        }),
        unknown: Vec::new(),
    };

    let encoded = encode(&record, &EncodeOptions::default()).unwrap();
    let decoded = decode(&encoded.hex).unwrap();
    let geo = decoded.record.geodetic.as_ref().unwrap();
    assert!((geo.latitude - 48.858_37).abs() < 2f64.powi(-25));
    assert!((geo.longitude - 2.294_481).abs() < 2f64.powi(-25));
    assert!(geo.regulatory_agreement);
    assert!(!geo.dynamic_enablement);
    assert!(geo.dependent_station);
    assert_eq!(decoded.record.floor, record.floor);
    assert_eq!(decoded.record.usage, record.usage);
    assert_eq!(decoded.record.bssids, record.bssids);

    // Re-encoding the decoded record is stable
    let again = encode(&decoded.record, &EncodeOptions::default()).unwrap();
    assert_eq!(again.hex, encoded.hex);
}

#[test]
fn test_smallest_policy_round_trip() {
    let options = EncodeOptions {
        zero_policy: ZeroPolicy::Smallest,
        ..EncodeOptions::default()
    };
    let record = LocationRecord {
        geodetic: Some(GeodeticField {
            latitude: 1.0,
            ..GeodeticField::default()
        }),
        floor: Some(FloorField::default()),
        ..LocationRecord::default()
    };
    let back = round_trip(&record, &options);
    let geo = back.geodetic.unwrap();
    assert_eq!(geo.latitude_uncertainty, UncertaintyScale::LATITUDE.value_of(34));
    assert_eq!(geo.altitude_uncertainty, UncertaintyScale::ALTITUDE.value_of(34));
    assert_eq!(back.floor.unwrap().height_uncertainty, UncertaintyScale::FLOOR_HEIGHT.value_of(24));
}

proptest! {
    #[test]
    fn prop_latitude_within_half_step(latitude in -90.0f64..=90.0) {
        let mut diags = Diagnostics::new();
        let raw = FixedPoint::LATITUDE.encode(latitude, "latitude", 0, &mut diags);
        let back = FixedPoint::LATITUDE.decode(raw);
        prop_assert!((back - latitude).abs() <= 2f64.powi(-26));
        prop_assert!(diags.is_empty());
    }

    #[test]
    fn prop_altitude_within_half_step(altitude in -2_000_000.0f64..2_000_000.0) {
        let mut diags = Diagnostics::new();
        let raw = FixedPoint::ALTITUDE.encode(altitude, "altitude", 0, &mut diags);
        let back = FixedPoint::ALTITUDE.decode(raw);
        prop_assert!((back - altitude).abs() <= 2f64.powi(-9));
    }

    #[test]
    fn prop_floor_record_round_trip(
        floor in -512i32..512,
        height in -2048i32..2048,
        movement in 0u8..4,
    ) {
        let field = FloorField {
            floor: f64::from(floor) / 4.0,
            height_above_floor: f64::from(height) / 8.0,
            height_uncertainty: 0.5,
            movement: Movement::from_code(movement),
        };
        let record = LocationRecord {
            floor: Some(field.clone()),
            ..LocationRecord::default()
        };
        let back = round_trip(&record, &EncodeOptions::default());
        prop_assert_eq!(back.floor, Some(field));
    }

    #[test]
    fn prop_uncertainty_never_understates(value in 1e-6f64..100.0) {
        let mut diags = Diagnostics::new();
        let scale = UncertaintyScale::LATITUDE;
        let code = scale.encode(value, ZeroPolicy::Unknown, "u", 0, &mut diags);
        prop_assert!((1..=scale.max_code).contains(&code));
        if diags.is_empty() {
            // The code's radius covers the value
            prop_assert!(scale.value_of(code) >= value * (1.0 - 1e-6));
        }
    }

    #[test]
    fn prop_decode_never_panics(body in "[0-9a-fA-F]{0,96}") {
        let _ = decode(&format!("010008{body}"));
        let _ = decode(&body);
    }

    #[test]
    fn prop_decoded_input_reencodes_cleanly(body in proptest::collection::vec(any::<u8>(), 0..64)) {
        let hex = format!("010008{}", hex::encode(&body));
        if let Ok(decoded) = decode(&hex) {
            let options = EncodeOptions {
                geodetic: if decoded.record.geodetic.is_some() {
                    Inclusion::Force
                } else {
                    Inclusion::Skip
                },
                ..EncodeOptions::default()
            };
            let encoded = encode(&decoded.record, &options).unwrap();
            prop_assert!(encoded.hex.starts_with("010008"));
            prop_assert!(decode(&encoded.hex).is_ok());
        }
    }
}
