//! Round-robin motion polling through the control loop.

use aob_common::bus::registers::REG_MOTION_STATUS;

use super::Bench;

fn enable_all(bench: &mut Bench) {
    let line: Vec<String> = (1..=22).map(|id| format!("m{id} st t")).collect();
    let out = bench.send(&line.join("+"));
    assert_eq!(out.len(), 44);
    bench.drives.clear_frames();
}

#[test]
fn ticks_visit_every_axis_in_order_and_wrap() {
    let mut bench = Bench::new();
    enable_all(&mut bench);

    let mut reported = Vec::new();
    for _ in 0..23 {
        reported.extend(bench.step_after(100));
    }

    let mut expected: Vec<u8> = (1..=22).collect();
    expected.push(1);
    assert_eq!(bench.reads_of(REG_MOTION_STATUS), expected);

    // Every axis reports its first state once; the revisit of m1 is silent.
    assert_eq!(reported.len(), 22);
    assert_eq!(reported[0], "m1 stopped");
    assert_eq!(reported[21], "m22 stopped");
}

#[test]
fn at_most_one_read_per_tick() {
    let mut bench = Bench::new();
    enable_all(&mut bench);

    bench.step_after(0);
    bench.step_after(10);
    bench.step_after(10);
    assert_eq!(bench.reads_of(REG_MOTION_STATUS), vec![1]);
}

#[test]
fn motion_transitions_are_reported_once() {
    let mut bench = Bench::new();
    bench.send("m5 st t");
    assert_eq!(bench.step_after(0), vec!["m5 stopped"]);

    bench.send("m5 1000");
    assert_eq!(bench.step_after(100), vec!["m5 moving"]);
    assert!(bench.step_after(100).is_empty());

    bench.send("m5 s");
    assert_eq!(bench.step_after(100), vec!["m5 stopped"]);
}

#[test]
fn silent_drive_skips_without_report() {
    let mut bench = Bench::new();
    bench.send("m5 st t+m6 st t");
    bench.drives.set_present(5, false);

    assert!(bench.step_after(0).is_empty());
    assert_eq!(bench.step_after(100), vec!["m6 stopped"]);
    assert_eq!(bench.reads_of(REG_MOTION_STATUS), vec![5, 6]);
}

#[test]
fn nothing_enabled_means_no_traffic() {
    let mut bench = Bench::new();
    for _ in 0..5 {
        assert!(bench.step_after(100).is_empty());
    }
    assert!(bench.reads_of(REG_MOTION_STATUS).is_empty());
}
