//! Moves, soft limits and direction blocks end to end.

use aob_common::bus::frame::{join_steps, split_steps};
use aob_common::bus::registers::{
    DI_NEGATIVE_LIMIT, DI_POSITIVE_LIMIT, FORCE_ENABLE_ON, PR_CONTROL_TRIGGER, REG_DI_STATUS,
    REG_FORCE_ENABLE, REG_PR_CONTROL, REG_PR0_POS_HIGH, REG_PR0_POS_LOW,
};

use super::{Bench, id};

#[test]
fn large_negative_move_splits_and_persists() {
    let mut bench = Bench::new();
    let out = bench.send("m7 -70000");
    assert_eq!(out, vec!["m7, pos=-70000, lo=unset, hi=unset, lim=none"]);

    let writes = bench.writes();
    let (hi, lo) = split_steps(-70000);
    assert_eq!((hi, lo), (0xFFFE, 0xEE90));
    let regs: Vec<(u16, u16)> = writes.iter().map(|w| (w.register, w.value)).collect();
    assert_eq!(
        regs,
        vec![
            (REG_FORCE_ENABLE, FORCE_ENABLE_ON),
            (REG_PR0_POS_HIGH, hi),
            (REG_PR0_POS_LOW, lo),
            (REG_PR_CONTROL, PR_CONTROL_TRIGGER),
        ]
    );
    assert!(writes.iter().all(|w| w.id == 7));
    assert_eq!(join_steps(hi, lo), -70000);

    assert_eq!(bench.unit.registry().get(id(7)).position, -70000);
    assert_eq!(bench.persisted().record(id(7)).position, -70000);
    assert_eq!(bench.unit.registry().get(id(7)).last_dir, -1);
}

#[test]
fn move_is_mirrored_on_the_echo_port() {
    let mut bench = Bench::new();
    bench.send("m2 250");
    assert_eq!(bench.drives.frames(), bench.drives.echo_frames());
}

#[test]
fn lower_limit_clamps_relative_move() {
    let mut bench = Bench::new();
    bench.send("m1 set lo");
    bench.send("m1 500");
    bench.drives.clear_frames();

    let out = bench.send("m1 -700");
    assert_eq!(out, vec!["m1, pos=0, lo=0, hi=unset, lim=none"]);

    let writes = bench.writes();
    let high = writes.iter().find(|w| w.register == REG_PR0_POS_HIGH).unwrap();
    let low = writes.iter().find(|w| w.register == REG_PR0_POS_LOW).unwrap();
    assert_eq!(join_steps(high.value, low.value), -500);
}

#[test]
fn move_beyond_boundary_is_refused_not_reversed() {
    let mut bench = Bench::new();
    bench.send("m3 set lo");
    bench.send("admin on");
    bench.send("m3 -200");
    bench.send("admin off");
    bench.drives.clear_frames();

    let out = bench.send("m3 -50");
    assert_eq!(out, vec!["m3, pos=-200, lo=0, hi=unset, lim=none"]);
    assert!(bench.drives.frames().is_empty());
}

#[test]
fn limit_switch_blocks_moveto_until_admin() {
    let mut bench = Bench::new();
    bench.step_after(0);

    bench.drives.set_register(1, REG_DI_STATUS, DI_POSITIVE_LIMIT);
    let out = bench.step_after(20);
    assert_eq!(out, vec!["m1, pos=0, lo=unset, hi=unset, lim=pos"]);

    bench.drives.clear_frames();
    let out = bench.send("m1 moveto 400");
    assert_eq!(out, vec!["m1, pos=0, lo=unset, hi=unset, lim=pos"]);
    assert!(bench.drives.frames().is_empty());

    // Away from the blocked side is allowed.
    let out = bench.send("m1 -100");
    assert_eq!(out, vec!["m1, pos=-100, lo=unset, hi=unset, lim=pos"]);

    bench.send("admin on");
    let out = bench.send("m1 moveto 400");
    assert_eq!(
        out,
        vec![
            "m1, moveto target=400, steps=500",
            "m1, pos=400, lo=unset, hi=unset, lim=pos"
        ]
    );
}

#[test]
fn both_limit_channels_are_independent() {
    let mut bench = Bench::new();
    bench.step_after(0);

    bench.drives.set_register(2, REG_DI_STATUS, DI_POSITIVE_LIMIT | DI_NEGATIVE_LIMIT);
    let out = bench.step_after(20);
    assert_eq!(out, vec!["m2, pos=0, lo=unset, hi=unset, lim=both"]);

    bench.drives.set_register(2, REG_DI_STATUS, DI_NEGATIVE_LIMIT);
    let out = bench.step_after(20);
    assert_eq!(out, vec!["m2, pos=0, lo=unset, hi=unset, lim=neg"]);

    bench.drives.set_register(2, REG_DI_STATUS, 0);
    let out = bench.step_after(20);
    assert_eq!(out, vec!["m2, pos=0, lo=unset, hi=unset, lim=none"]);
}

#[test]
fn stop_all_reaches_every_axis() {
    let mut bench = Bench::new();
    assert_eq!(bench.send("STOP ALL"), vec!["all, stop"]);
    let ids: Vec<u8> = bench.writes().iter().map(|w| w.id).collect();
    assert_eq!(ids, (1..=22).collect::<Vec<u8>>());
}
