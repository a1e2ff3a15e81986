pub mod core;
pub mod cpu;
pub mod device;
pub mod snapshot;

pub mod runner;

pub mod prelude {
    pub use crate::core::machine::{InputButton, Machine};
    pub use crate::core::{Bus, BusMaster, BusMasterComponent, Component, bus::InterruptState};
    pub use crate::cpu::Cpu;
    pub use crate::device::sms::{RomLoadError, SmsMachine};
    pub use crate::runner::{MachineRunner, RunnerConfig};
    pub use crate::snapshot::{SnapshotError, SnapshotHistory};
}
