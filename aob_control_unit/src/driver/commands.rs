//! Axis operations expressed as fieldbus transactions.
//!
//! Every write is fire-and-forget: success is assumed once the frame and its
//! settle delay are out. In-memory state is updated after the frames.

use std::time::Duration;

use aob_common::bus::frame::{split_steps, write_frame};
use aob_common::bus::registers::{
    FORCE_ENABLE_OFF, FORCE_ENABLE_ON, PR_CONTROL_QUICK_STOP, PR_CONTROL_TRIGGER,
    PR0_MODE_RELATIVE, REG_FORCE_ENABLE, REG_MICROSTEP, REG_PEAK_CURRENT, REG_PR_CONTROL,
    REG_PR0_ACCEL, REG_PR0_DECEL, REG_PR0_MODE, REG_PR0_POS_HIGH, REG_PR0_POS_LOW,
    REG_PR0_VELOCITY,
};
use aob_common::bus::transport::Clock;
use tracing::{debug, warn};

use super::bus::FieldBus;
use crate::state::axis::{AxisId, MotorState};
use crate::store::nv::AxisStore;

/// Driver command layer over an owned [`FieldBus`].
pub struct DriverLink {
    bus: FieldBus,
}

impl DriverLink {
    pub fn new(bus: FieldBus) -> Self {
        Self { bus }
    }

    /// Current clock reading.
    pub fn now(&self) -> Duration {
        self.bus.clock().now()
    }

    /// Block the loop on the shared clock.
    pub fn sleep(&self, duration: Duration) {
        self.bus.clock().sleep(duration);
    }

    fn write(&mut self, id: AxisId, reg: u16, value: u16) {
        self.bus.transmit(&write_frame(id.get(), reg, value));
    }

    /// Force-enable the drive output.
    pub fn enable(&mut self, motor: &mut MotorState) {
        self.write(motor.id, REG_FORCE_ENABLE, FORCE_ENABLE_ON);
        motor.enabled = true;
        debug!("m{} enabled", motor.id);
    }

    /// Release the drive output.
    pub fn disable(&mut self, motor: &mut MotorState) {
        self.write(motor.id, REG_FORCE_ENABLE, FORCE_ENABLE_OFF);
        motor.enabled = false;
        debug!("m{} disabled", motor.id);
    }

    /// Push tuning and PR0 relative mode. Does not enable the drive.
    pub fn configure(&mut self, motor: &MotorState) {
        let id = motor.id;
        let t = motor.tuning;
        self.write(id, REG_MICROSTEP, t.microstep);
        self.write(id, REG_PEAK_CURRENT, t.peak_current);
        self.write(id, REG_PR0_MODE, PR0_MODE_RELATIVE);
        self.write(id, REG_PR0_VELOCITY, t.velocity);
        self.write(id, REG_PR0_ACCEL, t.accel);
        self.write(id, REG_PR0_DECEL, t.decel);
        debug!("m{} configured {:?}", id, t);
    }

    /// Relative PR0 move of `steps`, then track and persist the new position.
    ///
    /// A failed save is logged; the in-memory position stands.
    pub fn move_relative(&mut self, motor: &mut MotorState, steps: i32, store: &mut dyn AxisStore) {
        if !motor.enabled {
            self.enable(motor);
        }
        let (high, low) = split_steps(steps);
        self.write(motor.id, REG_PR0_POS_HIGH, high);
        self.write(motor.id, REG_PR0_POS_LOW, low);
        self.write(motor.id, REG_PR_CONTROL, PR_CONTROL_TRIGGER);

        motor.position = motor.position.saturating_add(steps);
        motor.last_move = Some(self.now());
        if steps != 0 {
            motor.last_dir = steps.signum() as i8;
        }
        debug!("m{} move {:+} -> pos {}", motor.id, steps, motor.position);

        if let Err(e) = store.save_position(motor.id, motor.position) {
            warn!("m{} position not persisted: {}", motor.id, e);
        }
    }

    /// Quick stop. No state is touched.
    pub fn stop(&mut self, id: AxisId) {
        self.write(id, REG_PR_CONTROL, PR_CONTROL_QUICK_STOP);
    }

    /// Single-register read, sentinel on failure.
    pub fn read_register(&mut self, id: AxisId, reg: u16) -> u16 {
        self.bus.read_register(id.get(), reg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    use aob_common::bus::frame::{DecodedRequest, decode_request};
    use aob_common::bus::registers::FC_WRITE_SINGLE;
    use aob_common::bus::transport::ManualClock;

    use crate::config::BusConfig;
    use crate::sim::drives::SimulatedDrives;
    use crate::state::axis::Tuning;
    use crate::store::StoreError;
    use crate::store::image::Image;
    use crate::store::nv::ImageStore;
    use crate::store::storage::MemoryStorage;

    const PRESETS: Tuning = Tuning {
        velocity: 50,
        accel: 50,
        decel: 50,
        peak_current: 10,
        microstep: 51200,
    };

    struct Rig {
        drives: SimulatedDrives,
        clock: Rc<ManualClock>,
        link: DriverLink,
    }

    fn rig() -> Rig {
        let drives = SimulatedDrives::new();
        let clock = Rc::new(ManualClock::new());
        let bus = FieldBus::new(
            Box::new(drives.primary_port()),
            Some(Box::new(drives.echo_port())),
            clock.clone(),
            &BusConfig::default(),
        );
        Rig {
            drives,
            clock,
            link: DriverLink::new(bus),
        }
    }

    fn writes(drives: &SimulatedDrives) -> Vec<(u16, u16)> {
        drives
            .frames()
            .iter()
            .filter_map(decode_request)
            .filter(|r: &DecodedRequest| r.function == FC_WRITE_SINGLE)
            .map(|r| (r.register, r.value))
            .collect()
    }

    fn motor(id: u8) -> MotorState {
        MotorState::from_presets(AxisId::new(id).unwrap(), PRESETS)
    }

    #[test]
    fn enable_and_disable_send_one_frame_each() {
        let mut r = rig();
        let mut m = motor(4);
        r.link.enable(&mut m);
        assert!(m.enabled);
        r.link.disable(&mut m);
        assert!(!m.enabled);
        assert_eq!(
            writes(&r.drives),
            vec![(REG_FORCE_ENABLE, FORCE_ENABLE_ON), (REG_FORCE_ENABLE, FORCE_ENABLE_OFF)]
        );
    }

    #[test]
    fn configure_order_is_fixed() {
        let mut r = rig();
        let mut m = motor(2);
        m.tuning.velocity = 120;
        r.link.configure(&m);
        assert_eq!(
            writes(&r.drives),
            vec![
                (REG_MICROSTEP, 51200),
                (REG_PEAK_CURRENT, 10),
                (REG_PR0_MODE, PR0_MODE_RELATIVE),
                (REG_PR0_VELOCITY, 120),
                (REG_PR0_ACCEL, 50),
                (REG_PR0_DECEL, 50),
            ]
        );
        assert!(!m.enabled);
        assert_eq!(r.clock.now(), Duration::from_millis(6 * 30));
        assert_eq!(r.drives.echo_frames(), r.drives.frames());
    }

    #[test]
    fn negative_move_splits_and_persists() {
        let mut r = rig();
        let medium = MemoryStorage::new();
        let mut store = ImageStore::new(medium.clone(), "nv");
        store.initialize().unwrap();

        let mut m = motor(1);
        r.link.move_relative(&mut m, -70000, &mut store);

        assert_eq!(
            writes(&r.drives),
            vec![
                (REG_FORCE_ENABLE, FORCE_ENABLE_ON),
                (REG_PR0_POS_HIGH, 0xFFFE),
                (REG_PR0_POS_LOW, 0xEE90),
                (REG_PR_CONTROL, PR_CONTROL_TRIGGER),
            ]
        );
        assert_eq!(m.position, -70000);
        assert_eq!(m.last_dir, -1);
        assert_eq!(m.last_move, Some(Duration::from_millis(4 * 30)));

        let image = Image::decode(&medium.contents("nv").unwrap()).unwrap();
        assert_eq!(image.record(m.id).position, -70000);
    }

    #[test]
    fn enabled_axis_is_not_re_enabled() {
        let mut r = rig();
        let mut store = ImageStore::new(MemoryStorage::new(), "nv");
        let mut m = motor(3);
        m.enabled = true;
        m.last_dir = 1;
        r.link.move_relative(&mut m, 0, &mut store);
        assert_eq!(writes(&r.drives).len(), 3);
        assert_eq!(m.last_dir, 1);
    }

    #[test]
    fn position_saturates() {
        let mut r = rig();
        let mut store = ImageStore::new(MemoryStorage::new(), "nv");
        let mut m = motor(3);
        m.position = i32::MAX - 5;
        r.link.move_relative(&mut m, 100, &mut store);
        assert_eq!(m.position, i32::MAX);
    }

    #[test]
    fn unavailable_store_keeps_memory_position() {
        let mut r = rig();
        let mut store = ImageStore::new(MemoryStorage::unmounted(), "nv");
        let mut m = motor(3);
        r.link.move_relative(&mut m, 250, &mut store);
        assert_eq!(m.position, 250);
        assert!(matches!(
            store.save_position(m.id, 1),
            Err(StoreError::Unavailable)
        ));
    }

    #[test]
    fn stop_is_single_quick_stop_frame() {
        let mut r = rig();
        r.link.stop(AxisId::LAST);
        let frames = r.drives.frames();
        assert_eq!(frames.len(), 1);
        assert_eq!(
            decode_request(&frames[0]),
            Some(DecodedRequest {
                id: 22,
                function: FC_WRITE_SINGLE,
                register: REG_PR_CONTROL,
                value: PR_CONTROL_QUICK_STOP,
            })
        );
    }
}
