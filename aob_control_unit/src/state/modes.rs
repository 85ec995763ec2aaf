//! Privilege modes.

/// Session-wide privilege flags. Both start off and are never persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modes {
    /// Bypasses soft limits and direction blocks.
    pub admin: bool,
    /// Allows tuning parameter changes.
    pub engineering: bool,
}

/// Render a flag the way the console reports it.
#[inline]
pub const fn on_off(flag: bool) -> &'static str {
    if flag { "on" } else { "off" }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boot_modes_are_off() {
        let modes = Modes::default();
        assert!(!modes.admin);
        assert!(!modes.engineering);
        assert_eq!(on_off(modes.admin), "off");
        assert_eq!(on_off(true), "on");
    }
}
