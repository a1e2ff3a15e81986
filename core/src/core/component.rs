use super::bus::BusMaster;

/// A device that advances with the machine clock.
pub trait Component {
    /// Advance the device by one unit of its own clock domain. Returns true
    /// if the advance raised or changed an interrupt-relevant condition the
    /// caller should re-check (devices that never signal interrupts can
    /// ignore the return value).
    fn tick(&mut self) -> bool;

    /// How many master-clock ticks make up one call to `tick()`. 1 for
    /// devices clocked at the master rate (the Z80 itself); >1 for devices
    /// divided down from it (the VDP and PSG both run at Z80-clock/2 on an
    /// NTSC SMS, so they override this to skip every other master tick).
    fn clock_divider(&self) -> u64 {
        1
    }
}

/// A component that also needs bus access while ticking (the CPU).
pub trait BusMasterComponent: Component {
    type Bus: super::bus::Bus + ?Sized;
    fn tick_with_bus(&mut self, bus: &mut Self::Bus, master_id: BusMaster) -> bool;
}
