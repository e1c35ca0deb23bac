//! Tests for bitrate codes and start-up resolution.
use super::*;
use crate::infra::parameters::MemoryParameterStore;

type Store = MemoryParameterStore<0x100>;

const LAYOUT: ParameterLayout = ParameterLayout::DEFAULT;

fn store_with(primary: [u8; 2], secondary: [u8; 2]) -> Store {
    let mut store = Store::new();
    store.write_bytes(LAYOUT.bitrate_primary, &primary).unwrap();
    store.write_bytes(LAYOUT.bitrate_secondary, &secondary).unwrap();
    store
}

//==================================================================================CODES
#[test]
/// Codes and timing registers for every supported rate.
fn test_code_table() {
    let expected = [
        (1, 1000, 0x00, 0x05),
        (2, 800, 0x00, 0x07),
        (3, 500, 0x00, 0x1c),
        (4, 250, 0x01, 0x1c),
        (5, 125, 0x03, 0x1c),
    ];
    for (code, kbps, btr0, btr1) in expected {
        let rate = BitRate::try_from(code).unwrap();
        assert_eq!(rate.code(), code);
        assert_eq!(rate.kbps(), kbps);
        assert_eq!(rate.timing(), BitTiming { btr0, btr1 });
    }
}

#[test]
/// Unknown codes are rejected, or mapped to 125 kbit/s when a rate is required.
fn test_unknown_codes() {
    assert_eq!(BitRate::try_from(0), Err(BitRateError::Unsupported { code: 0 }));
    assert_eq!(BitRate::try_from(6), Err(BitRateError::Unsupported { code: 6 }));
    assert_eq!(BitRate::from_code_or_default(0x42), BitRate::Kbps125);
    assert_eq!(BitRate::default(), BitRate::Kbps125);
}

//==================================================================================RESOLUTION
#[test]
/// Every primary pair: self-consistent non-zero values win, anything else
/// falls through to a valid secondary copy.
fn test_primary_slot_exhaustive() {
    for check in 0..=255u8 {
        for value in 0..=255u8 {
            let store = store_with([check, value], [!4, 4]);
            let resolved = resolve_bitrate(&store, &LAYOUT).unwrap();

            if check == !value && value != 0 {
                assert_eq!(resolved.code, value);
                assert_eq!(resolved.source, BitRateSource::Primary);
            } else {
                assert_eq!(resolved.code, 4);
                assert_eq!(resolved.source, BitRateSource::Secondary);
            }
        }
    }
}

#[test]
/// Every secondary pair behind an erased primary: valid copies are used,
/// anything else lands on the default rate.
fn test_secondary_slot_exhaustive() {
    for check in 0..=255u8 {
        for value in 0..=255u8 {
            let store = store_with([0xFF, 0xFF], [check, value]);
            let resolved = resolve_bitrate(&store, &LAYOUT).unwrap();

            if check == !value && value != 0 {
                assert_eq!(resolved.code, value);
                assert_eq!(resolved.source, BitRateSource::Secondary);
                assert!(!resolved.is_degraded());
            } else {
                assert_eq!(resolved.code, BitRate::Kbps125.code());
                assert!(resolved.is_degraded());
            }
        }
    }
}

#[test]
/// A zero value is unprogrammed even though `0xFF, 0x00` is complementary.
fn test_zero_value_is_unprogrammed() {
    let store = store_with([0xFF, 0x00], [0xFF, 0x00]);
    let resolved = resolve_bitrate(&store, &LAYOUT).unwrap();
    assert!(resolved.is_degraded());
    assert_eq!(resolved.rate(), BitRate::Kbps125);
}

#[test]
/// A consistent but unsupported stored code still resolves; the rate falls back.
fn test_unsupported_stored_code() {
    let store = store_with([!0x09, 0x09], [0xFF, 0xFF]);
    let resolved = resolve_bitrate(&store, &LAYOUT).unwrap();
    assert_eq!(resolved.source, BitRateSource::Primary);
    assert_eq!(resolved.code, 0x09);
    assert_eq!(resolved.rate(), BitRate::Kbps125);
}

#[test]
/// Storage too small for the layout surfaces as an error, not a default.
fn test_store_error_propagates() {
    let store: MemoryParameterStore<0x10> = MemoryParameterStore::new();
    assert!(resolve_bitrate(&store, &LAYOUT).is_err());
}
