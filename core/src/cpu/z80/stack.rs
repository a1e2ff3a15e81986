use crate::core::{Bus, BusMaster};
use crate::cpu::z80::Z80;

impl Z80 {
    /// PUSH rr — 11T. Opcode mask: 11 pp0 101 (p: 0=BC, 1=DE, 2=HL/IX/IY, 3=AF).
    pub(super) fn op_push<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        p: u8,
        bus: &mut B,
        master: BusMaster,
    ) -> u32 {
        let val = self.get_rp2(p);
        self.push16(bus, master, val);
        11
    }

    /// POP rr — 10T. Opcode mask: 11 pp0 001 (p: 0=BC, 1=DE, 2=HL/IX/IY, 3=AF).
    pub(super) fn op_pop<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        p: u8,
        bus: &mut B,
        master: BusMaster,
    ) -> u32 {
        let val = self.pop16(bus, master);
        self.set_rp2(p, val);
        10
    }
}
