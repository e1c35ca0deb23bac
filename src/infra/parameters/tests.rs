//! Tests for the in-memory store, redundancy pairs and identity loading.
use super::*;

#[test]
/// A fresh store reads back as erased flash.
fn test_new_store_is_erased() {
    let store: MemoryParameterStore<16> = MemoryParameterStore::new();
    assert!(store.as_bytes().iter().all(|b| *b == 0xFF));
}

#[test]
/// Bulk writes land at the right offsets and can be compared in place.
fn test_write_then_match() {
    let mut store: MemoryParameterStore<32> = MemoryParameterStore::new();
    store.write_bytes(4, &[0xDE, 0xAD, 0xBE, 0xEF]).unwrap();

    assert!(store.matches(4, &[0xDE, 0xAD, 0xBE, 0xEF]).unwrap());
    assert!(!store.matches(4, &[0xDE, 0xAD, 0xBE, 0xEE]).unwrap());
    assert_eq!(store.read_byte(3).unwrap(), 0xFF);
}

#[test]
/// Accesses past the end fail without touching the store.
fn test_out_of_range_access() {
    let mut store: MemoryParameterStore<8> = MemoryParameterStore::new();
    assert_eq!(
        store.write_bytes(6, &[1, 2, 3]),
        Err(ParameterError::OutOfRange { address: 6, len: 3 })
    );
    assert!(store.as_bytes().iter().all(|b| *b == 0xFF));

    let mut out = [0u8; 2];
    assert!(store.read_bytes(7, &mut out).is_err());
    assert_eq!(
        store.read_byte(8),
        Err(ParameterError::OutOfRange { address: 8, len: 1 })
    );
}

#[test]
/// Only complementary pairs are accepted.
fn test_redundant_byte() {
    let mut store: MemoryParameterStore<8> = MemoryParameterStore::new();
    store.write_bytes(0, &[!0x04, 0x04]).unwrap();
    store.write_bytes(2, &[0x12, 0x04]).unwrap();

    assert_eq!(read_redundant_byte(&store, 0).unwrap(), Some(0x04));
    assert_eq!(read_redundant_byte(&store, 2).unwrap(), None);
    // Erased flash (0xFF, 0xFF) is not a valid pair.
    assert_eq!(read_redundant_byte(&store, 4).unwrap(), None);
}

#[test]
/// Identity fields are read at the layout offsets, version big-endian.
fn test_identity_load() {
    let layout = ParameterLayout::DEFAULT;
    let mut store: MemoryParameterStore<0x100> = MemoryParameterStore::new();
    store.write_bytes(layout.serial, &[1, 2, 3, 4]).unwrap();
    store
        .write_bytes(layout.bootloader_version, &[0x01, 0x27])
        .unwrap();

    let identity = ModuleIdentity::load(&store, &layout).unwrap();
    assert_eq!(identity.serial, [1, 2, 3, 4]);
    assert_eq!(identity.bootloader_version, 0x0127);
    assert_eq!(identity.version_low_byte(), 0x27);
}

#[test]
/// User range bounds: start inclusive, end exclusive, whole write inside.
fn test_user_range_bounds() {
    let layout = ParameterLayout::DEFAULT;
    assert!(layout.in_user_range(0x200, 6));
    assert!(layout.in_user_range(0x3FA, 6));
    assert!(!layout.in_user_range(0x3FB, 6));
    assert!(!layout.in_user_range(0x1FF, 1));
    assert!(!layout.in_user_range(0x400, 1));
}
