use crate::core::{Bus, BusMaster};
use crate::cpu::z80::{Flag, IndexMode, Z80};

impl Z80 {
    pub(super) fn get_parity(val: u8) -> bool {
        val.count_ones() % 2 == 0
    }

    fn update_flags_logic(&mut self, result: u8, is_and: bool) {
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
        if is_and {
            f |= Flag::H as u8;
        }
        f |= result & (Flag::X as u8 | Flag::Y as u8);
        self.f = f;
        self.q = self.f;
    }

    fn do_add(&mut self, val: u8, carry_in: bool) {
        let a = self.a;
        let c_val = if carry_in && (self.f & Flag::C as u8) != 0 { 1u8 } else { 0u8 };
        let result_u16 = (a as u16) + (val as u16) + (c_val as u16);
        let result = result_u16 as u8;

        let mut f = 0;
        if result == 0 {
            f |= Flag::Z as u8;
        }
        if (result & 0x80) != 0 {
            f |= Flag::S as u8;
        }
        if ((a & 0xF) + (val & 0xF) + c_val) > 0xF {
            f |= Flag::H as u8;
        }
        if ((a ^ result) & (val ^ result) & 0x80) != 0 {
            f |= Flag::PV as u8;
        }
        if result_u16 > 0xFF {
            f |= Flag::C as u8;
        }
        f |= result & (Flag::X as u8 | Flag::Y as u8);
        self.a = result;
        self.f = f;
        self.q = self.f;
    }

    fn do_sub(&mut self, val: u8, carry_in: bool) {
        let a = self.a;
        let c_val = if carry_in && (self.f & Flag::C as u8) != 0 { 1u8 } else { 0u8 };
        let result_u16 = (a as u16).wrapping_sub(val as u16).wrapping_sub(c_val as u16);
        let result = result_u16 as u8;

        let mut f = Flag::N as u8;
        if result == 0 {
            f |= Flag::Z as u8;
        }
        if (result & 0x80) != 0 {
            f |= Flag::S as u8;
        }
        if (a & 0xF) < ((val & 0xF) + c_val) {
            f |= Flag::H as u8;
        }
        if ((a ^ val) & (a ^ result) & 0x80) != 0 {
            f |= Flag::PV as u8;
        }
        if result_u16 > 0xFF {
            f |= Flag::C as u8;
        }
        f |= result & (Flag::X as u8 | Flag::Y as u8);
        self.a = result;
        self.f = f;
        self.q = self.f;
    }

    /// CP compares but discards the result register write. Undocumented
    /// X/Y come from the *operand*, not the result — unlike every other
    /// 8-bit ALU op.
    fn do_cp(&mut self, val: u8) {
        let a = self.a;
        let result_u16 = (a as u16).wrapping_sub(val as u16);
        let result = result_u16 as u8;

        let mut f = Flag::N as u8;
        if result == 0 {
            f |= Flag::Z as u8;
        }
        if (result & 0x80) != 0 {
            f |= Flag::S as u8;
        }
        if (a & 0xF) < (val & 0xF) {
            f |= Flag::H as u8;
        }
        if ((a ^ val) & (a ^ result) & 0x80) != 0 {
            f |= Flag::PV as u8;
        }
        if result_u16 > 0xFF {
            f |= Flag::C as u8;
        }
        f |= val & (Flag::X as u8 | Flag::Y as u8);
        self.f = f;
        self.q = self.f;
    }

    fn perform_alu_op(&mut self, op: u8, val: u8) {
        match op {
            0 => self.do_add(val, false),
            1 => self.do_add(val, true),
            2 => self.do_sub(val, false),
            3 => self.do_sub(val, true),
            4 => {
                self.a &= val;
                self.update_flags_logic(self.a, true);
            }
            5 => {
                self.a ^= val;
                self.update_flags_logic(self.a, false);
            }
            6 => {
                self.a |= val;
                self.update_flags_logic(self.a, false);
            }
            7 => self.do_cp(val),
            _ => unreachable!(),
        }
    }

    /// ALU A, r / ALU A, (HL) / ALU A, (IX+d). Opcode mask: 10 ooo zzz.
    pub(super) fn op_alu_r<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        alu_op: u8,
        z: u8,
        bus: &mut B,
        master: BusMaster,
    ) -> u32 {
        if z == 6 {
            let addr = self.resolve_hl_addr(bus, master);
            let val = bus.read(master, addr);
            self.perform_alu_op(alu_op, val);
            if self.index_mode == IndexMode::HL { 7 } else { 15 }
        } else {
            let val = self.get_reg8_ix(z);
            self.perform_alu_op(alu_op, val);
            4
        }
    }

    /// ALU A, n. Opcode mask: 11 ooo 110.
    pub(super) fn op_alu_n<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        alu_op: u8,
        bus: &mut B,
        master: BusMaster,
    ) -> u32 {
        let val = self.fetch_byte(bus, master);
        self.perform_alu_op(alu_op, val);
        7
    }

    /// INC/DEC r / (HL) / (IX+d). Opcode mask: 00 yyy 10q (q=0 INC, q=1 DEC).
    pub(super) fn op_inc_dec_r<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        y: u8,
        is_dec: bool,
        bus: &mut B,
        master: BusMaster,
    ) -> u32 {
        if y == 6 {
            let addr = self.resolve_hl_addr(bus, master);
            let val = bus.read(master, addr);
            let result = if is_dec { self.calc_dec_flags(val) } else { self.calc_inc_flags(val) };
            bus.write(master, addr, result);
            if self.index_mode == IndexMode::HL { 11 } else { 19 }
        } else {
            let val = self.get_reg8_ix(y);
            let result = if is_dec { self.calc_dec_flags(val) } else { self.calc_inc_flags(val) };
            self.set_reg8_ix(y, result);
            4
        }
    }

    fn calc_inc_flags(&mut self, val: u8) -> u8 {
        let result = val.wrapping_add(1);
        let mut f = self.f & Flag::C as u8;
        if result == 0 {
            f |= Flag::Z as u8;
        }
        if (result & 0x80) != 0 {
            f |= Flag::S as u8;
        }
        if (val & 0xF) == 0xF {
            f |= Flag::H as u8;
        }
        if val == 0x7F {
            f |= Flag::PV as u8;
        }
        f |= result & (Flag::X as u8 | Flag::Y as u8);
        self.f = f;
        self.q = self.f;
        result
    }

    fn calc_dec_flags(&mut self, val: u8) -> u8 {
        let result = val.wrapping_sub(1);
        let mut f = (self.f & Flag::C as u8) | Flag::N as u8;
        if result == 0 {
            f |= Flag::Z as u8;
        }
        if (result & 0x80) != 0 {
            f |= Flag::S as u8;
        }
        if (val & 0xF) == 0x0 {
            f |= Flag::H as u8;
        }
        if val == 0x80 {
            f |= Flag::PV as u8;
        }
        f |= result & (Flag::X as u8 | Flag::Y as u8);
        self.f = f;
        self.q = self.f;
        result
    }

    /// ADD HL/IX/IY, rp — 11T. Flags: H, N=0, C from carry; S/Z/PV unaffected.
    pub(super) fn op_add_hl_rp(&mut self, p: u8) -> u32 {
        let hl = self.get_rp(2);
        let rp = self.get_rp(p);
        let result = (hl as u32) + (rp as u32);
        let mut f = self.f & (Flag::S as u8 | Flag::Z as u8 | Flag::PV as u8);
        if (((hl & 0xFFF) + (rp & 0xFFF)) & 0x1000) != 0 {
            f |= Flag::H as u8;
        }
        if result > 0xFFFF {
            f |= Flag::C as u8;
        }
        let result16 = result as u16;
        f |= ((result16 >> 8) as u8) & (Flag::X as u8 | Flag::Y as u8);
        self.f = f;
        self.q = self.f;
        self.set_rp(2, result16);
        self.memptr = hl.wrapping_add(1);
        11
    }

    /// ADC HL, rp — 15T (ED prefix). Full S/Z/H/PV/N/C per 16-bit add-with-carry.
    pub(super) fn op_adc_hl_rp(&mut self, p: u8) -> u32 {
        let hl = self.get_rp(2);
        let rp = self.get_rp(p);
        let c = if (self.f & Flag::C as u8) != 0 { 1u32 } else { 0 };
        let result = (hl as u32) + (rp as u32) + c;
        let result16 = result as u16;

        let mut f = 0;
        if result16 == 0 {
            f |= Flag::Z as u8;
        }
        if (result16 & 0x8000) != 0 {
            f |= Flag::S as u8;
        }
        if (((hl & 0xFFF) + (rp & 0xFFF) + c as u16) & 0x1000) != 0 {
            f |= Flag::H as u8;
        }
        if (((hl ^ result16) & (rp ^ result16)) & 0x8000) != 0 {
            f |= Flag::PV as u8;
        }
        if result > 0xFFFF {
            f |= Flag::C as u8;
        }
        f |= ((result16 >> 8) as u8) & (Flag::X as u8 | Flag::Y as u8);
        self.f = f;
        self.q = self.f;
        self.set_rp(2, result16);
        self.memptr = hl.wrapping_add(1);
        15
    }

    /// SBC HL, rp — 15T (ED prefix).
    pub(super) fn op_sbc_hl_rp(&mut self, p: u8) -> u32 {
        let hl = self.get_rp(2);
        let rp = self.get_rp(p);
        let c = if (self.f & Flag::C as u8) != 0 { 1i32 } else { 0 };
        let result = (hl as i32) - (rp as i32) - c;
        let result16 = result as u16;

        let mut f = Flag::N as u8;
        if result16 == 0 {
            f |= Flag::Z as u8;
        }
        if (result16 & 0x8000) != 0 {
            f |= Flag::S as u8;
        }
        if ((hl & 0xFFF) as i32) < ((rp & 0xFFF) as i32 + c) {
            f |= Flag::H as u8;
        }
        if (((hl ^ rp) & (hl ^ result16)) & 0x8000) != 0 {
            f |= Flag::PV as u8;
        }
        if result < 0 {
            f |= Flag::C as u8;
        }
        f |= ((result16 >> 8) as u8) & (Flag::X as u8 | Flag::Y as u8);
        self.f = f;
        self.q = self.f;
        self.set_rp(2, result16);
        self.memptr = hl.wrapping_add(1);
        15
    }

    /// INC/DEC rp — 6T, no flags affected.
    pub(super) fn op_inc_dec_rp(&mut self, p: u8, is_dec: bool) -> u32 {
        let v = self.get_rp(p);
        self.set_rp(p, if is_dec { v.wrapping_sub(1) } else { v.wrapping_add(1) });
        6
    }
}
