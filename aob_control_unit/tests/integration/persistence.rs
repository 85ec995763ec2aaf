//! Persistent image across boots.

use aob_common::bus::registers::REG_PR0_VELOCITY;
use aob_control_unit::config::{ControlUnitConfig, PresetConfig};
use aob_control_unit::state::axis::Tuning;
use aob_control_unit::state::registry::MotorRegistry;
use aob_control_unit::store::image::{IMAGE_BYTES, Image};
use aob_control_unit::store::nv::{AxisStore, ImageStore};
use aob_control_unit::store::storage::MemoryStorage;
use aob_control_unit::store::{ImageError, StoreError};

use super::{Bench, IMAGE, id};

fn presets() -> Tuning {
    PresetConfig::default().tuning()
}

fn corrupted_image(position: i32) -> Vec<u8> {
    let mut image = Image::fresh();
    image.record_mut(id(1)).position = position;
    let mut bytes = image.encode().unwrap();
    bytes[0] ^= 0xFF;
    bytes
}

#[test]
fn calibration_survives_reboot() {
    let storage = MemoryStorage::new();
    {
        let mut bench = Bench::with(ControlUnitConfig::default(), storage.clone());
        bench.send("m4 set lo+m4 1200+m4 set hi");
        bench.send("eng on");
        bench.send("m4 vel=90");
    }

    let mut bench = Bench::with(ControlUnitConfig::default(), storage);
    assert_eq!(
        bench.send("m4 read"),
        vec!["m4, pos=1200, lo=0, hi=1200, lim=none"]
    );
    let motor = bench.unit.registry().get(id(4));
    assert_eq!(motor.tuning.velocity, 90);
    assert_eq!(motor.tuning.accel, presets().accel);
    // Boot pushed the persisted tuning back to the drive.
    assert_eq!(bench.drives.register(4, REG_PR0_VELOCITY), Some(90));
}

#[test]
fn bad_magic_keeps_presets_and_saves_recover() {
    let storage = MemoryStorage::new();
    storage.insert(IMAGE, corrupted_image(999));

    let mut bench = Bench::with(ControlUnitConfig::default(), storage);
    let motor = bench.unit.registry().get(id(1));
    assert_eq!(motor.position, 0);
    assert_eq!(motor.tuning, presets());

    bench.send("m1 300");
    assert_eq!(bench.persisted().record(id(1)).position, 300);
    assert_eq!(bench.storage.contents(IMAGE).unwrap().len(), IMAGE_BYTES);
}

#[test]
fn load_of_bad_magic_leaves_registry_untouched() {
    let storage = MemoryStorage::new();
    storage.insert(IMAGE, corrupted_image(999));
    let mut store = ImageStore::new(storage.clone(), IMAGE);

    let mut registry = MotorRegistry::new(presets());
    registry.get_mut(id(1)).position = 42;
    let err = store.load_all(&mut registry, &presets()).unwrap_err();
    assert!(matches!(err, StoreError::Invalid(ImageError::BadMagic(_))));
    assert_eq!(registry.get(id(1)).position, 42);

    store.save_position(id(1), 17).unwrap();
    let image = Image::decode(&storage.contents(IMAGE).unwrap()).unwrap();
    assert_eq!(image.record(id(1)).position, 17);
}

#[test]
fn initialize_is_idempotent() {
    let storage = MemoryStorage::new();
    let mut store = ImageStore::new(storage.clone(), IMAGE);

    store.initialize().unwrap();
    let first = storage.contents(IMAGE).unwrap();
    store.initialize().unwrap();
    assert_eq!(storage.contents(IMAGE).unwrap(), first);

    store.save_lower(id(9), -40).unwrap();
    let saved = storage.contents(IMAGE).unwrap();
    store.initialize().unwrap();
    assert_eq!(storage.contents(IMAGE).unwrap(), saved);
}

#[test]
fn unmounted_medium_degrades_to_memory_only() {
    let storage = MemoryStorage::unmounted();
    let mut bench = Bench::with(ControlUnitConfig::default(), storage.clone());

    assert_eq!(
        bench.send("m6 800"),
        vec!["m6, pos=800, lo=unset, hi=unset, lim=none"]
    );
    assert!(storage.contents(IMAGE).is_none());

    storage.set_mounted(true);
    bench.send("m6 -300");
    assert_eq!(bench.persisted().record(id(6)).position, 500);
}
