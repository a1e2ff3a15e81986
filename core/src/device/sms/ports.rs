//! I/O port dispatch: routes the 256-entry port space to the VDP, PSG,
//! memory-control register, and joypads, the same low-address-byte match
//! style as [`crate::device::pia6820::Pia6820`]'s register offsets, just
//! widened to cover the whole port space instead of a four-register block.

use super::memory::memory_control;
use super::psg::Psg;
use super::vdp::Vdp;

/// Active-high joypad state as seen from outside (`set_buttons`); inverted
/// to active-low on the wire when read back through port `$DC`/`$C0`.
#[derive(Clone, Copy, Default)]
pub struct JoypadState {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
    pub button1: bool,
    pub button2: bool,
}

impl JoypadState {
    /// Active-high bit encoding used by `set_buttons`/snapshotting: bits
    /// 0..5 = Up/Down/Left/Right/Button1/Button2.
    fn as_active_high_byte(self) -> u8 {
        (self.up as u8)
            | (self.down as u8) << 1
            | (self.left as u8) << 2
            | (self.right as u8) << 3
            | (self.button1 as u8) << 4
            | (self.button2 as u8) << 5
    }

    fn from_active_high_byte(byte: u8) -> Self {
        JoypadState {
            up: byte & 0x01 != 0,
            down: byte & 0x02 != 0,
            left: byte & 0x04 != 0,
            right: byte & 0x08 != 0,
            button1: byte & 0x10 != 0,
            button2: byte & 0x20 != 0,
        }
    }

    fn as_active_low_byte(self) -> u8 {
        let mut byte = 0xFFu8;
        if self.up {
            byte &= !0x01;
        }
        if self.down {
            byte &= !0x02;
        }
        if self.left {
            byte &= !0x04;
        }
        if self.right {
            byte &= !0x08;
        }
        if self.button1 {
            byte &= !0x10;
        }
        if self.button2 {
            byte &= !0x20;
        }
        byte
    }
}

/// Dispatches port reads/writes per the fixed SMS port table.
pub struct PortDevice {
    memory_control: u8,
    io_control: u8,
    pub joypad_a: JoypadState,
    f2_latch: u8,
}

/// Snapshot of `PortDevice` state other than the memory-control register
/// (serialized as its own fixed-order snapshot section per spec §6/§4.7).
#[derive(Clone, Copy, Default)]
pub struct PortState {
    pub io_control: u8,
    pub f2_latch: u8,
    pub joypad_a: u8,
}

impl PortDevice {
    pub fn new() -> Self {
        PortDevice { memory_control: 0, io_control: 0, joypad_a: JoypadState::default(), f2_latch: 0x02 }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn memory_control(&self) -> u8 {
        self.memory_control
    }

    pub fn set_memory_control(&mut self, value: u8) {
        self.memory_control = value;
    }

    pub fn bios_enabled(&self) -> bool {
        self.memory_control & memory_control::BIOS_DISABLE == 0
    }

    pub fn ram_enabled(&self) -> bool {
        self.memory_control & memory_control::RAM_DISABLE == 0
    }

    pub fn cartridge_enabled(&self) -> bool {
        self.memory_control & memory_control::CART_DISABLE == 0
    }

    pub fn read(&mut self, port: u8, vdp: &mut Vdp) -> u8 {
        match port {
            0x3E => self.memory_control,
            0x3F => self.io_control,
            0x7E => vdp.read_v_counter(),
            0x7F => vdp.read_h_counter(),
            0xBE | 0xBC => vdp.read_data(),
            0xBF | 0xBD => vdp.read_status(),
            0xDC | 0xC0 => self.joypad_a.as_active_low_byte(),
            0xDD | 0xC1 => 0xFF,
            0xF0 | 0xF1 => 0xFF,
            0xF2 => self.f2_latch,
            _ if (port & 0xC1) == 0x40 || (port & 0xC1) == 0x41 => 0xFF,
            // Fallback device: on real hardware an unmapped port floats to
            // the address bus's high byte, which for byte-wide port I/O is
            // just the port number itself.
            _ => port,
        }
    }

    pub fn write(&mut self, port: u8, value: u8, vdp: &mut Vdp, psg: &mut Psg) {
        match port {
            0x3E => self.memory_control = value,
            0x3F => {
                // TH output bits for joypad ports A/B live at bits 5 and 7;
                // a 0->1 transition on either latches the VDP's H counter.
                const TH_BITS: u8 = 0xA0;
                let rising_th = (value & !self.io_control) & TH_BITS != 0;
                self.io_control = value;
                if rising_th {
                    vdp.latch_h_counter();
                }
            }
            0x7E | 0x7F => psg.write(value),
            0xBE | 0xBC => vdp.write_data(value),
            0xBF | 0xBD => vdp.write_control(value),
            0xF2 => self.f2_latch = 0x02,
            _ if (port & 0xC1) == 0x40 || (port & 0xC1) == 0x41 => psg.write(value),
            _ => {}
        }
    }

    pub fn snapshot(&self) -> PortState {
        PortState { io_control: self.io_control, f2_latch: self.f2_latch, joypad_a: self.joypad_a.as_active_high_byte() }
    }

    pub fn restore(&mut self, s: PortState) {
        self.io_control = s.io_control;
        self.f2_latch = s.f2_latch;
        self.joypad_a = JoypadState::from_active_high_byte(s.joypad_a);
    }
}

impl Default for PortDevice {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joypad_is_active_low_on_the_wire() {
        let joy = JoypadState { up: true, ..Default::default() };
        assert_eq!(joy.as_active_low_byte(), 0xFE);
        assert_eq!(JoypadState::default().as_active_low_byte(), 0xFF);
    }

    #[test]
    fn f2_always_reads_back_the_no_fm_marker() {
        let mut ports = PortDevice::new();
        let mut vdp = Vdp::new(super::super::vdp::Region::Ntsc);
        ports.write(0xF2, 0x00, &mut vdp, &mut Psg::new(3_579_545, 44_100));
        assert_eq!(ports.read(0xF2, &mut vdp), 0x02);
    }

    #[test]
    fn psg_mirror_ports_accept_writes() {
        let mut ports = PortDevice::new();
        let mut vdp = Vdp::new(super::super::vdp::Region::Ntsc);
        let mut psg = Psg::new(3_579_545, 44_100);
        // 0x41 satisfies (port & 0xC1) == 0x41
        ports.write(0x41, 0x9F, &mut vdp, &mut psg);
    }
}
