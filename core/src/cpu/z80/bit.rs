use crate::core::{Bus, BusMaster};
use crate::cpu::z80::{Flag, Z80};

impl Z80 {
    /// op: 0=RLC, 1=RRC, 2=RL, 3=RR, 4=SLA, 5=SRA, 6=SLL(undoc), 7=SRL.
    /// Returns (result, flags). H=0, N=0; C from the shifted-out bit.
    fn do_cb_rotate_shift(&self, op: u8, val: u8) -> (u8, u8) {
        let (result, carry) = match op {
            0 => {
                let c = (val >> 7) & 1;
                ((val << 1) | c, c)
            }
            1 => {
                let c = val & 1;
                ((val >> 1) | (c << 7), c)
            }
            2 => {
                let old_c = if (self.f & Flag::C as u8) != 0 { 1 } else { 0 };
                let c = (val >> 7) & 1;
                ((val << 1) | old_c, c)
            }
            3 => {
                let old_c = if (self.f & Flag::C as u8) != 0 { 0x80 } else { 0 };
                let c = val & 1;
                ((val >> 1) | old_c, c)
            }
            4 => {
                let c = (val >> 7) & 1;
                (val << 1, c)
            }
            5 => {
                let c = val & 1;
                (((val as i8) >> 1) as u8, c)
            }
            6 => {
                let c = (val >> 7) & 1;
                ((val << 1) | 1, c)
            }
            7 => {
                let c = val & 1;
                (val >> 1, c)
            }
            _ => unreachable!(),
        };

        let mut f = 0;
        if result == 0 {
            f |= Flag::Z as u8;
        }
        if (result & 0x80) != 0 {
            f |= Flag::S as u8;
        }
        if Self::get_parity(result) {
            f |= Flag::PV as u8;
        }
        if carry != 0 {
            f |= Flag::C as u8;
        }
        f |= result & (Flag::X as u8 | Flag::Y as u8);
        (result, f)
    }

    fn bit_test_flags(&self, val: u8, yyy: u8, xy_source: u8) -> u8 {
        let tested = val & (1 << yyy);
        let mut f = self.f & Flag::C as u8;
        f |= Flag::H as u8;
        if tested == 0 {
            f |= Flag::Z as u8;
            f |= Flag::PV as u8;
        }
        if yyy == 7 && tested != 0 {
            f |= Flag::S as u8;
        }
        f |= xy_source & (Flag::X as u8 | Flag::Y as u8);
        f
    }

    /// Execute a CB-prefixed opcode (no DD/FD ahead of it — operates on a
    /// plain register or (HL), never (IX+d)/(IY+d)).
    /// Rotate/shift/SET/RES register: 8T. BIT b,(HL): 12T. RMW (HL): 15T.
    pub(super) fn execute_cb<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        op: u8,
        bus: &mut B,
        master: BusMaster,
    ) -> u32 {
        let xx = (op >> 6) & 0x03;
        let yyy = (op >> 3) & 0x07;
        let zzz = op & 0x07;

        if zzz == 6 {
            let addr = self.get_hl();
            match xx {
                1 => {
                    let val = bus.read(master, addr);
                    self.f = self.bit_test_flags(val, yyy, (self.memptr >> 8) as u8);
                    self.q = self.f;
                    12
                }
                _ => {
                    let val = bus.read(master, addr);
                    let result = match xx {
                        0 => {
                            let (r, f) = self.do_cb_rotate_shift(yyy, val);
                            self.f = f;
                            self.q = self.f;
                            r
                        }
                        2 => val & !(1 << yyy),
                        3 => val | (1 << yyy),
                        _ => unreachable!(),
                    };
                    bus.write(master, addr, result);
                    15
                }
            }
        } else {
            let val = self.get_reg8(zzz);
            match xx {
                0 => {
                    let (result, f) = self.do_cb_rotate_shift(yyy, val);
                    self.f = f;
                    self.q = self.f;
                    self.set_reg8(zzz, result);
                }
                1 => {
                    self.f = self.bit_test_flags(val, yyy, val);
                    self.q = self.f;
                }
                2 => self.set_reg8(zzz, val & !(1 << yyy)),
                3 => self.set_reg8(zzz, val | (1 << yyy)),
                _ => unreachable!(),
            }
            8
        }
    }

    /// DD CB d op / FD CB d op. `addr` is the already-resolved IX+d/IY+d
    /// effective address (MEMPTR was set by the caller before this runs).
    /// BIT b,(IX+d): 20T. Rotate/shift/SET/RES (IX+d): 23T, with the
    /// undocumented "copy result into register zzz" side effect when zzz != 6.
    pub(super) fn execute_index_cb<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        op: u8,
        addr: u16,
        bus: &mut B,
        master: BusMaster,
    ) -> u32 {
        let xx = (op >> 6) & 0x03;
        let yyy = (op >> 3) & 0x07;
        let zzz = op & 0x07;

        if xx == 1 {
            let val = bus.read(master, addr);
            self.f = self.bit_test_flags(val, yyy, (addr >> 8) as u8);
            self.q = self.f;
            20
        } else {
            let val = bus.read(master, addr);
            let result = match xx {
                0 => {
                    let (r, f) = self.do_cb_rotate_shift(yyy, val);
                    self.f = f;
                    self.q = self.f;
                    r
                }
                2 => val & !(1 << yyy),
                3 => val | (1 << yyy),
                _ => unreachable!(),
            };
            bus.write(master, addr, result);
            if zzz != 6 {
                self.set_reg8(zzz, result);
            }
            23
        }
    }
}
