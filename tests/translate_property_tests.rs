use chrono::{FixedOffset, TimeZone};
use proptest::prelude::*;
use phlux::geo::{AstronomicalClock, GeoCoordinate};
use phlux::temperature::native::unclamped_native;
use phlux::temperature::{FixtureCapability, Kelvin, desired_temperature, translate};

/// Fixture ranges that support color temperature
fn capability_strategy() -> impl Strategy<Value = FixtureCapability> {
    (0u16..1000, 1u16..1000).prop_map(|(min, span)| FixtureCapability::new(min, min.saturating_add(span)))
}

proptest! {
    #[test]
    fn test_translate_stays_within_range(
        kelvin in 2000u32..=6500,
        capability in capability_strategy()
    ) {
        let native = translate(Kelvin(kelvin), capability);
        prop_assert!(native >= capability.min && native <= capability.max);
    }

    #[test]
    fn test_warmer_never_maps_lower(
        warmer in 1000u32..=6500,
        delta in 0u32..5000,
        capability in capability_strategy()
    ) {
        let cooler = warmer + delta;
        prop_assert!(
            translate(Kelvin(warmer), capability) >= translate(Kelvin(cooler), capability)
        );
    }

    #[test]
    fn test_policy_only_emits_day_or_night(
        lat in -60.0f64..=60.0,
        lon in -180.0f64..=180.0,
        hour in 0u32..24
    ) {
        let coord = GeoCoordinate::new(lat, lon).unwrap();
        let utc = FixedOffset::east_opt(0).unwrap();
        let now = utc.with_ymd_and_hms(2023, 3, 20, hour, 0, 0).unwrap();

        let kelvin = desired_temperature(&now, coord, &AstronomicalClock);
        prop_assert!(kelvin == Kelvin(6500) || kelvin == Kelvin(1800));
    }
}

#[test]
fn test_reference_endpoints() {
    assert!((unclamped_native(Kelvin(6500)) - 153.0).abs() < 1e-9);
    assert!((unclamped_native(Kelvin(2000)) - 500.0).abs() < 0.01);

    let full = FixtureCapability::new(153, 500);
    assert_eq!(translate(Kelvin(6500), full), 153);
    assert_eq!(translate(Kelvin(2000), full), 500);
}
