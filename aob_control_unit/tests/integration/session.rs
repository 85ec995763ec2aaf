//! Operator session: global commands, privilege modes and reports.

use aob_common::bus::registers::{REG_ALARM_STATUS, REG_PEAK_CURRENT};

use super::{Bench, id};

#[test]
fn privilege_modes_toggle_and_query() {
    let mut bench = Bench::new();
    assert_eq!(bench.send("admin+eng"), vec!["admin=off", "eng=off"]);
    assert_eq!(bench.send("Admin On"), vec!["admin=on"]);
    assert_eq!(bench.send("admin"), vec!["admin=on"]);
    assert!(bench.unit.modes().admin);
    assert!(!bench.unit.modes().engineering);
}

#[test]
fn tuning_is_gated_by_engineering_mode() {
    let mut bench = Bench::new();
    assert_eq!(
        bench.send("m3 peak=35"),
        vec!["ERROR: Engineering mode required to change parameters. Use 'eng on' first."]
    );
    assert!(bench.drives.frames().is_empty());

    bench.send("eng on");
    let out = bench.send("m3 peak=35, micro=12800");
    assert_eq!(
        out,
        vec![
            "m3, vel=50, accel=50, decel=50, peak=35, micro=3200",
            "m3, pos=0, lo=unset, hi=unset, lim=none"
        ]
    );
    assert_eq!(bench.drives.register(3, REG_PEAK_CURRENT), Some(35));
    assert_eq!(bench.persisted().record(id(3)).peak_current, 35);
}

#[test]
fn laser_is_on_after_boot() {
    let mut bench = Bench::new();
    assert_eq!(bench.send("laser"), vec!["laser=on"]);
    assert_eq!(bench.send("laser off+laser"), vec!["laser=off", "laser=off"]);
}

#[test]
fn fan_on_uses_preset_duty() {
    let mut bench = Bench::new();
    assert_eq!(bench.send("FG"), vec!["fan=on"]);
    assert_eq!(bench.unit.peripherals().fan_duty(), 60);
    assert_eq!(bench.send("fs"), vec!["fan=off"]);
    assert_eq!(bench.unit.peripherals().fan_duty(), 0);
}

#[test]
fn read_all_lists_every_axis() {
    let mut bench = Bench::new();
    bench.send("m2 -15");
    let out = bench.send("read all");
    assert_eq!(out.len(), 24);
    assert_eq!(out[0], "=== MOTOR PARAMETERS ===");
    assert_eq!(
        out[2],
        "m2: pos=-15 lo=unset hi=unset vel=50 accel=50 decel=50 peak=10 micro=51200"
    );
    assert_eq!(out[23], "======================");
}

#[test]
fn error_sweep_reports_faults_and_silence() {
    let mut bench = Bench::new();
    assert_eq!(
        bench.send("read errors"),
        vec![
            "=== DRIVER ERROR CHECK ===",
            "All drivers OK - no errors",
            "=========================="
        ]
    );

    bench.drives.set_register(12, REG_ALARM_STATUS, 0x0B);
    bench.drives.set_corrupt_replies(20, true);
    assert_eq!(
        bench.send("read errors"),
        vec![
            "=== DRIVER ERROR CHECK ===",
            "m12: ERROR 0xb",
            "m20: ERROR 0xffff",
            "=========================="
        ]
    );
    assert_eq!(bench.reads_of(REG_ALARM_STATUS).len(), 44);
}

#[test]
fn malformed_segments_are_silent() {
    let mut bench = Bench::new();
    assert!(bench.send("m99 read").is_empty());
    assert!(bench.send("m1 wiggle").is_empty());
    assert!(bench.send("").is_empty());
    assert_eq!(
        bench.send("m1 moveto+m1 movetoX"),
        vec!["err=MoveToMissingTarget", "err=MoveToBadTarget"]
    );
    assert!(bench.drives.frames().is_empty());
}

#[test]
fn overlong_segment_is_truncated() {
    let mut bench = Bench::new();
    let padded = format!("m1 read{}", " ".repeat(80));
    assert_eq!(
        bench.send(&padded),
        vec!["m1, pos=0, lo=unset, hi=unset, lim=none"]
    );
}
