mod common;

use common::*;
use gantry_core::machine::Machine;
use gantry_core::state::{
    BlockFile, BlockWriter, NVRAM_FILE_VERSION, STATE_FILE_VERSION, Slot, StateError, StateKind,
    StateStore, open_container,
};

fn store() -> (tempfile::TempDir, StateStore) {
    let dir = tempfile::tempdir().unwrap();
    let store = StateStore::new(dir.path());
    (dir, store)
}

// =================================================================
// Paths
// =================================================================

#[test]
fn paths_follow_identity_and_slot() {
    let store = StateStore::new("/data");
    assert_eq!(
        store.save_state_path("scud", Slot::new(7).unwrap()),
        std::path::Path::new("/data/Saves/scud.st7")
    );
    assert_eq!(
        store.nvram_path("scud"),
        std::path::Path::new("/data/NVRAM/scud.nv")
    );
}

// =================================================================
// Save states
// =================================================================

#[test]
fn save_state_writes_header_then_machine_blocks() {
    let (_dir, store) = store();
    let machine = MockMachine::new(events());
    let path = store.save_state(&machine, Slot::default()).unwrap();

    let file = BlockFile::load(&path).unwrap();
    let header = open_container(&file, StateKind::SaveState).unwrap();
    assert_eq!(header.version, STATE_FILE_VERSION);
    assert_eq!(header.identity, "mock");
    let names: Vec<_> = file.block_names().collect();
    assert_eq!(names, ["Save State", "Mock Machine"]);
}

#[test]
fn state_round_trips_through_a_slot() {
    let (_dir, store) = store();
    let mut machine = MockMachine::new(events());
    machine.frames = 42;
    machine.ram = vec![9, 8, 7];
    store.save_state(&machine, Slot::new(4).unwrap()).unwrap();

    machine.frames = 0;
    machine.ram.clear();
    store.load_state(&mut machine, Slot::new(4).unwrap()).unwrap();
    assert_eq!(machine.frames, 42);
    assert_eq!(machine.ram, vec![9, 8, 7]);
}

#[test]
fn slots_are_independent() {
    let (_dir, store) = store();
    let mut machine = MockMachine::new(events());
    machine.frames = 1;
    store.save_state(&machine, Slot::new(0).unwrap()).unwrap();
    machine.frames = 2;
    store.save_state(&machine, Slot::new(1).unwrap()).unwrap();

    store.load_state(&mut machine, Slot::new(0).unwrap()).unwrap();
    assert_eq!(machine.frames, 1);
}

#[test]
fn missing_slot_is_an_io_error() {
    let (_dir, store) = store();
    let mut machine = MockMachine::new(events());
    let err = store.load_state(&mut machine, Slot::new(5).unwrap()).unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn newer_version_leaves_machine_identical() {
    let (_dir, store) = store();
    let mut machine = MockMachine::new(events());
    let path = store.save_state_path(machine.game_info().id, Slot::default());

    let mut w = BlockWriter::new("Save State", "");
    w.write_i32(STATE_FILE_VERSION + 1);
    w.write_cstr("mock");
    w.new_block("Mock Machine", "");
    w.write_u32(1234);
    w.write_u32(0);
    w.create(&path).unwrap();

    let err = store.load_state(&mut machine, Slot::default()).unwrap_err();
    assert!(matches!(err, StateError::VersionIncompatibility { .. }));
    assert_eq!(machine.frames, 0);
    assert_eq!(machine.ram, vec![0x11, 0x22, 0x33, 0x44]);
}

#[test]
fn missing_machine_block_is_reported() {
    let (_dir, store) = store();
    let mut machine = MockMachine::new(events());
    let path = store.save_state_path("mock", Slot::default());

    let mut w = BlockWriter::new("Save State", "");
    w.write_i32(STATE_FILE_VERSION);
    w.write_cstr("mock");
    w.create(&path).unwrap();

    let err = store.load_state(&mut machine, Slot::default()).unwrap_err();
    assert!(matches!(err, StateError::BlockNotFound(ref name) if name == "Mock Machine"));
    assert_eq!(machine.frames, 0);
}

#[test]
fn truncated_machine_block_leaves_machine_identical() {
    let (_dir, store) = store();
    let mut machine = MockMachine::new(events());
    let path = store.save_state_path("mock", Slot::default());

    let mut w = BlockWriter::new("Save State", "");
    w.write_i32(STATE_FILE_VERSION);
    w.write_cstr("mock");
    w.new_block("Mock Machine", "");
    w.write_u32(77);
    w.write_u32(100); // claims 100 bytes of RAM, provides 2
    w.write(&[1, 2]);
    w.create(&path).unwrap();

    let err = store.load_state(&mut machine, Slot::default()).unwrap_err();
    assert!(matches!(err, StateError::Truncated { .. }));
    assert_eq!(machine.frames, 0);
    assert_eq!(machine.ram, vec![0x11, 0x22, 0x33, 0x44]);
}

#[test]
fn foreign_file_in_a_slot_is_a_format_mismatch() {
    let (_dir, store) = store();
    let mut machine = MockMachine::new(events());
    let path = store.save_state_path("mock", Slot::default());
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, b"\xff\xff\xff\xffnot a state file").unwrap();

    let err = store.load_state(&mut machine, Slot::default()).unwrap_err();
    assert!(matches!(err, StateError::FormatMismatch { block: "Save State", .. }));
    assert_eq!(machine.frames, 0);
}

#[test]
fn damaged_machine_block_after_valid_header_is_corrupt() {
    let (_dir, store) = store();
    let mut machine = MockMachine::new(events());
    machine.frames = 5;
    let path = store.save_state(&machine, Slot::default()).unwrap();
    let mut bytes = std::fs::read(&path).unwrap();
    bytes.truncate(bytes.len() - 1);
    std::fs::write(&path, bytes).unwrap();

    machine.frames = 0;
    let err = store.load_state(&mut machine, Slot::default()).unwrap_err();
    assert!(matches!(err, StateError::Corrupt(_)));
    assert_eq!(machine.frames, 0);
}

// =================================================================
// NVRAM
// =================================================================

#[test]
fn missing_nvram_is_none() {
    let (_dir, store) = store();
    let mut machine = MockMachine::new(events());
    assert!(store.load_nvram(&mut machine).unwrap().is_none());
    assert_eq!(machine.nvram, vec![0xA5; 16]);
}

#[test]
fn nvram_uses_its_own_version_and_block() {
    let (_dir, store) = store();
    let mut machine = MockMachine::new(events());
    machine.nvram = vec![3; 8];
    let path = store.save_nvram(&machine).unwrap();
    assert_eq!(path, store.nvram_path("mock"));

    let file = BlockFile::load(&path).unwrap();
    let header = open_container(&file, StateKind::Nvram).unwrap();
    assert_eq!(header.version, NVRAM_FILE_VERSION);
    assert!(open_container(&file, StateKind::SaveState).is_err());

    machine.nvram.clear();
    assert_eq!(store.load_nvram(&mut machine).unwrap(), Some(path));
    assert_eq!(machine.nvram, vec![3; 8]);
}

#[test]
fn save_state_file_is_not_accepted_as_nvram() {
    let (_dir, store) = store();
    let mut machine = MockMachine::new(events());
    let state = store.save_state(&machine, Slot::default()).unwrap();
    std::fs::create_dir_all(store.nvram_path("mock").parent().unwrap()).unwrap();
    std::fs::copy(&state, store.nvram_path("mock")).unwrap();

    let err = store.load_nvram(&mut machine).unwrap_err();
    assert!(matches!(err, StateError::FormatMismatch { block: "NVRAM State", .. }));
}
