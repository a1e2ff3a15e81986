//! The SMS memory/port bus.
//!
//! Follows [`machines::williams::WilliamsBoard`]'s shape: a single struct
//! owning inline memory arrays and device sub-structs, implementing `Bus`
//! by matching over address ranges directly rather than indirecting
//! through a lookup table of trait objects. This realizes the same
//! "avoid vtable overhead on the hot path" goal as a tagged-enum slot
//! table would, with one fewer layer of indirection.

use crate::core::bus::InterruptState;
use crate::core::{Bus, BusMaster};

use super::memory::Cartridge;
use super::ports::PortDevice;
use super::psg::Psg;
use super::vdp::Vdp;
#[cfg(feature = "debug-hooks")]
use super::observer::ObserverList;

const RAM_SIZE: usize = 0x2000;

/// Owns RAM, the cartridge/BIOS mapper windows, the VDP, the PSG, and the
/// port dispatcher; implements the bus the Z80 core runs against.
pub struct SmsBus {
    ram: [u8; RAM_SIZE],
    bios: Option<Cartridge>,
    cartridge: Cartridge,
    ports: PortDevice,
    pub vdp: Vdp,
    pub psg: Psg,
    #[cfg(feature = "debug-hooks")]
    pub observers: ObserverList,
}

impl SmsBus {
    pub fn new(cartridge: Cartridge, bios: Option<Cartridge>, vdp: Vdp, psg: Psg) -> Self {
        SmsBus {
            ram: [0; RAM_SIZE],
            bios,
            cartridge,
            ports: PortDevice::new(),
            vdp,
            psg,
            #[cfg(feature = "debug-hooks")]
            observers: ObserverList::new(),
        }
    }

    pub fn load_rom(&mut self, rom: Vec<u8>) {
        self.cartridge.load_rom(rom);
    }

    pub fn load_bios(&mut self, rom: Vec<u8>) {
        self.bios = Some(Cartridge::new(rom));
    }

    pub fn cartridge(&self) -> &Cartridge {
        &self.cartridge
    }

    pub fn cartridge_mut(&mut self) -> &mut Cartridge {
        &mut self.cartridge
    }

    pub fn bios(&self) -> Option<&Cartridge> {
        self.bios.as_ref()
    }

    pub fn bios_mut(&mut self) -> Option<&mut Cartridge> {
        self.bios.as_mut()
    }

    pub fn ports(&self) -> &PortDevice {
        &self.ports
    }

    pub fn ports_mut(&mut self) -> &mut PortDevice {
        &mut self.ports
    }

    pub fn ram(&self) -> &[u8; RAM_SIZE] {
        &self.ram
    }

    pub fn ram_mut(&mut self) -> &mut [u8; RAM_SIZE] {
        &mut self.ram
    }

    pub fn reset(&mut self) {
        self.ram = [0; RAM_SIZE];
        self.ports.reset();
        self.vdp.reset();
        self.psg.reset();
    }

    /// Combine the pending VDP IRQ with any other line the bus might one
    /// day carry; currently the VDP is the only interrupt source.
    pub fn try_consume_irq(&mut self) -> bool {
        self.vdp.try_consume_irq()
    }

    fn rom_window_read(&self, addr: u16) -> u8 {
        let route_to_bios = self.ports.bios_enabled() && self.bios.is_some();
        if route_to_bios {
            self.bios.as_ref().unwrap().read(addr)
        } else if self.ports.cartridge_enabled() {
            self.cartridge.read(addr)
        } else {
            0xFF
        }
    }
}

impl Bus for SmsBus {
    type Address = u16;
    type Data = u8;

    fn read(&mut self, _master: BusMaster, addr: u16) -> u8 {
        let data = match addr {
            0x0000..=0xBFFF => self.rom_window_read(addr),
            0xC000..=0xDFFF => {
                if self.ports.ram_enabled() || addr == 0xC000 {
                    self.ram[(addr - 0xC000) as usize]
                } else {
                    0xFF
                }
            }
            0xE000..=0xFFFB => {
                if self.ports.ram_enabled() {
                    self.ram[(addr - 0xE000) as usize]
                } else {
                    0xFF
                }
            }
            0xFFFC..=0xFFFF => self.cartridge.mapper_register(addr),
        };
        #[cfg(feature = "debug-hooks")]
        self.observers.on_memory_read(addr, data);
        data
    }

    fn write(&mut self, _master: BusMaster, addr: u16, data: u8) {
        match addr {
            0x0000..=0xBFFF => { /* ROM window: ignored */ }
            0xC000..=0xDFFF => self.ram[(addr - 0xC000) as usize] = data,
            0xE000..=0xFFFB => self.ram[(addr - 0xE000) as usize] = data,
            0xFFFC..=0xFFFF => {
                self.cartridge.write_mapper(addr, data);
                // The mapper registers are aliased onto the last four bytes
                // of RAM, so code reading $FFFC-$FFFF back sees this value
                // regardless of which path it goes through.
                self.ram[(addr - 0xE000) as usize] = data;
            }
        }
        #[cfg(feature = "debug-hooks")]
        self.observers.on_memory_write(addr, data);
    }

    fn io_read(&mut self, _master: BusMaster, addr: u16) -> u8 {
        self.ports.read(addr as u8, &mut self.vdp)
    }

    fn io_write(&mut self, _master: BusMaster, addr: u16, data: u8) {
        self.ports.write(addr as u8, data, &mut self.vdp, &mut self.psg);
    }

    fn is_halted_for(&self, _master: BusMaster) -> bool {
        false
    }

    fn check_interrupts(&self, _target: BusMaster) -> InterruptState {
        // The SMS has no NMI source in this core's scope (the Pause button's
        // NMI line belongs to the out-of-scope keyboard/joypad hook shell);
        // the VDP's VBlank/line IRQ is the only interrupt source, polled
        // live (not consumed) so it stays asserted until software
        // acknowledges it by reading the status port.
        InterruptState { nmi: false, irq: self.vdp.irq_line() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::sms::psg::Psg;
    use crate::device::sms::vdp::{Region, Vdp};

    fn make_bus(rom: Vec<u8>) -> SmsBus {
        SmsBus::new(Cartridge::new(rom), None, Vdp::new(Region::Ntsc), Psg::new(3_579_545, 44_100))
    }

    #[test]
    fn rom_reads_route_through_cartridge_window() {
        let mut rom = vec![0u8; 0x8000];
        rom[0x0400] = 0x11;
        rom[0x4400] = 0x22;
        let mut bus = make_bus(rom);
        assert_eq!(bus.read(BusMaster::Cpu(0), 0x0400), 0x11);
        bus.write(BusMaster::Cpu(0), 0xFFFD, 1);
        assert_eq!(bus.read(BusMaster::Cpu(0), 0x0400), 0x22);
    }

    #[test]
    fn ram_mirror_reads_back_the_same_bytes() {
        let mut bus = make_bus(vec![0u8; 0x4000]);
        bus.write(BusMaster::Cpu(0), 0xC010, 0x42);
        assert_eq!(bus.read(BusMaster::Cpu(0), 0xE010), 0x42);
    }

    #[test]
    fn mapper_register_write_mirrors_into_ram() {
        let mut bus = make_bus(vec![0u8; 0x4000]);
        bus.write(BusMaster::Cpu(0), 0xFFFD, 7);
        assert_eq!(bus.ram()[0x1FFD], 7);
    }
}
