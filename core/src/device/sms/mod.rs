//! Sega Master System hardware core: bus, memory devices, VDP, PSG, port
//! dispatch, and the [`SmsMachine`] that wires them to the Z80.

pub mod bus;
pub mod memory;
#[cfg(feature = "debug-hooks")]
pub mod observer;
pub mod ports;
pub mod psg;
pub mod vdp;

use std::fmt;

use crate::core::bus::BusMaster;
use crate::core::machine::{InputButton, Machine};
use crate::cpu::state::CpuStateTrait;
use crate::cpu::z80::Z80;

pub use bus::SmsBus;
pub use memory::Cartridge;
pub use ports::JoypadState;
pub use psg::Psg;
pub use vdp::{Region, Vdp, FRAME_HEIGHT, FRAME_WIDTH};

/// ROM load failures (spec.md §7): the core never partially loads a ROM,
/// so a failed `load_rom`/`load_bios` call leaves the previously loaded
/// cartridge (or lack of one) untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RomLoadError {
    /// The supplied ROM image was empty.
    Empty,
}

impl fmt::Display for RomLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RomLoadError::Empty => write!(f, "ROM image is empty"),
        }
    }
}

impl std::error::Error for RomLoadError {}

const MASTER_CLOCK_NTSC: u64 = 10_738_635;
const MASTER_CLOCK_PAL: u64 = 10_640_685;
/// The Z80 runs at master-clock/3 on an SMS.
const CPU_CLOCK_DIVIDER: u64 = 3;

const INPUT_BUTTONS: [InputButton; 6] = [
    InputButton { id: 0, name: "P1 Up" },
    InputButton { id: 1, name: "P1 Down" },
    InputButton { id: 2, name: "P1 Left" },
    InputButton { id: 3, name: "P1 Right" },
    InputButton { id: 4, name: "P1 Button 1" },
    InputButton { id: 5, name: "P1 Button 2" },
];

/// Owns the Z80, the SMS bus (RAM, mapper, VDP, PSG, ports), and drives one
/// frame at a time through the [`Machine`] trait. This is the machine-agnostic
/// surface an external runner or UI shell uses; nothing outside this crate
/// reaches into CPU registers or device internals directly.
pub struct SmsMachine {
    cpu: Z80,
    bus: SmsBus,
    region: Region,
    t_states: u64,
}

impl SmsMachine {
    pub fn new(region: Region, sample_rate_hz: u64) -> Self {
        let cpu_hz = Self::cpu_hz_for(region);
        let bus = SmsBus::new(Cartridge::default(), None, Vdp::new(region), Psg::new(cpu_hz, sample_rate_hz));
        let mut machine = SmsMachine { cpu: Z80::new(), bus, region, t_states: 0 };
        machine.reset();
        machine
    }

    fn cpu_hz_for(region: Region) -> u64 {
        let master = match region {
            Region::Ntsc => MASTER_CLOCK_NTSC,
            Region::Pal => MASTER_CLOCK_PAL,
        };
        master / CPU_CLOCK_DIVIDER
    }

    pub fn cpu_hz(&self) -> u64 {
        Self::cpu_hz_for(self.region)
    }

    /// Total T-states executed since construction or the last reset. Used by
    /// the machine runner to pace wall-clock sync and by [`super::super::snapshot::SnapshotHistory`]
    /// to decide when to capture the next sample.
    pub fn t_states(&self) -> u64 {
        self.t_states
    }

    pub fn load_rom(&mut self, rom: Vec<u8>) -> Result<(), RomLoadError> {
        if rom.is_empty() {
            return Err(RomLoadError::Empty);
        }
        self.bus.load_rom(rom);
        Ok(())
    }

    pub fn load_bios(&mut self, rom: Vec<u8>) -> Result<(), RomLoadError> {
        if rom.is_empty() {
            return Err(RomLoadError::Empty);
        }
        self.bus.load_bios(rom);
        Ok(())
    }

    pub fn set_buttons(&mut self, state: u8) {
        let joy = &mut self.bus.ports_mut().joypad_a;
        joy.up = state & 0x01 != 0;
        joy.down = state & 0x02 != 0;
        joy.left = state & 0x04 != 0;
        joy.right = state & 0x08 != 0;
        joy.button1 = state & 0x10 != 0;
        joy.button2 = state & 0x20 != 0;
    }

    /// Drain PSG samples produced since the last call, as `(left, right)`
    /// pairs ready for an external [`AudioSink`]-shaped consumer.
    pub fn drain_audio_samples(&mut self) -> Vec<(f32, f32)> {
        self.bus.psg.drain_samples()
    }

    /// Execute exactly one CPU instruction (or HALT bubble), advancing the
    /// VDP and PSG by the T-states it consumed. Returns the T-state delta,
    /// mirroring spec §2's data-flow description. Any VDP interrupt raised
    /// during this step's `advance` is visible to the CPU at the start of
    /// the *next* `step()` call, via `SmsBus::check_interrupts` polling the
    /// VDP's IRQ line live — see that override for why no separate
    /// `request_irq` latch call is needed here.
    pub fn step(&mut self) -> u32 {
        #[cfg(feature = "debug-hooks")]
        self.bus.observers.before_instruction(self.cpu.pc);
        let delta = self.cpu.step(&mut self.bus, BusMaster::Cpu(0));
        self.t_states += delta as u64;
        self.bus.vdp.advance(delta);
        self.bus.psg.advance(delta);
        #[cfg(feature = "debug-hooks")]
        self.bus.observers.after_step(self.cpu.pc, delta);
        delta
    }

    pub fn cpu(&self) -> &Z80 {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut Z80 {
        &mut self.cpu
    }

    pub fn bus(&self) -> &SmsBus {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut SmsBus {
        &mut self.bus
    }

    pub fn region(&self) -> Region {
        self.region
    }
}

impl Machine for SmsMachine {
    fn display_size(&self) -> (u32, u32) {
        (FRAME_WIDTH as u32, FRAME_HEIGHT as u32)
    }

    fn run_frame(&mut self) {
        loop {
            self.step();
            if self.bus.vdp.try_consume_frame_ready() {
                break;
            }
        }
    }

    fn render_frame(&self, buffer: &mut [u8]) {
        let fb = self.bus.vdp.framebuffer();
        let n = fb.len().min(buffer.len());
        buffer[..n].copy_from_slice(&fb[..n]);
    }

    fn set_input(&mut self, button: u8, pressed: bool) {
        let joy = &mut self.bus.ports_mut().joypad_a;
        match button {
            0 => joy.up = pressed,
            1 => joy.down = pressed,
            2 => joy.left = pressed,
            3 => joy.right = pressed,
            4 => joy.button1 = pressed,
            5 => joy.button2 = pressed,
            _ => {}
        }
    }

    fn input_map(&self) -> &[InputButton] {
        &INPUT_BUTTONS
    }

    fn reset(&mut self) {
        self.cpu = Z80::new();
        crate::cpu::Cpu::reset(&mut self.cpu);
        self.bus.reset();
        self.t_states = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_frame_stops_at_the_first_vblank() {
        let mut rom = vec![0u8; 0x4000];
        rom[0] = 0x18; // JR -2 (tight loop: jumps back to itself)
        rom[1] = 0xFE;
        let mut machine = SmsMachine::new(Region::Ntsc, 44_100);
        machine.load_rom(rom).unwrap();
        machine.reset();
        machine.run_frame();
        // one frame is 262 scanlines * 228 cycles; the CPU should have
        // advanced roughly that many T-states (JR is a 12T loop).
        assert!(machine.t_states() >= 262 * 228);
    }

    #[test]
    fn set_buttons_is_active_high_externally() {
        let mut machine = SmsMachine::new(Region::Ntsc, 44_100);
        machine.set_buttons(0x01); // Up
        assert!(machine.bus().ports().joypad_a.up);
    }

    #[test]
    fn reset_clears_elapsed_t_states() {
        let mut rom = vec![0u8; 0x4000];
        let mut machine = SmsMachine::new(Region::Ntsc, 44_100);
        machine.load_rom(rom.clone()).unwrap();
        machine.step();
        assert!(machine.t_states() > 0);
        machine.reset();
        assert_eq!(machine.t_states(), 0);
        rom[0] = 0x00;
        machine.load_rom(rom).unwrap();
    }

    #[test]
    fn loading_an_empty_rom_is_rejected() {
        let mut machine = SmsMachine::new(Region::Ntsc, 44_100);
        assert_eq!(machine.load_rom(Vec::new()), Err(RomLoadError::Empty));
        assert_eq!(machine.load_bios(Vec::new()), Err(RomLoadError::Empty));
    }
}
