use crate::core::{Bus, BusMaster};
use crate::cpu::z80::{Flag, Z80};

impl Z80 {
    /// Evaluate a condition code (3 bits from opcode bits 5-3).
    /// 0=NZ, 1=Z, 2=NC, 3=C, 4=PO, 5=PE, 6=P, 7=M
    pub(super) fn eval_condition(&self, cc: u8) -> bool {
        match cc {
            0 => (self.f & Flag::Z as u8) == 0,
            1 => (self.f & Flag::Z as u8) != 0,
            2 => (self.f & Flag::C as u8) == 0,
            3 => (self.f & Flag::C as u8) != 0,
            4 => (self.f & Flag::PV as u8) == 0,
            5 => (self.f & Flag::PV as u8) != 0,
            6 => (self.f & Flag::S as u8) == 0,
            7 => (self.f & Flag::S as u8) != 0,
            _ => unreachable!(),
        }
    }

    /// JP nn — 10T.
    pub(super) fn op_jp_nn<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        bus: &mut B,
        master: BusMaster,
    ) -> u32 {
        let addr = self.fetch_word(bus, master);
        self.memptr = addr;
        self.pc = addr;
        10
    }

    /// JP cc,nn — always 10T.
    pub(super) fn op_jp_cc_nn<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        cc: u8,
        bus: &mut B,
        master: BusMaster,
    ) -> u32 {
        let addr = self.fetch_word(bus, master);
        self.memptr = addr;
        if self.eval_condition(cc) {
            self.pc = addr;
        }
        10
    }

    /// JR e — 12T.
    pub(super) fn op_jr_e<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        bus: &mut B,
        master: BusMaster,
    ) -> u32 {
        let disp = self.fetch_byte(bus, master) as i8;
        self.pc = self.pc.wrapping_add(disp as i16 as u16);
        self.memptr = self.pc;
        12
    }

    /// JR cc,e — 12T taken / 7T not taken. `cc` is 0=NZ,1=Z,2=NC,3=C.
    pub(super) fn op_jr_cc_e<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        cc: u8,
        bus: &mut B,
        master: BusMaster,
    ) -> u32 {
        let disp = self.fetch_byte(bus, master) as i8;
        if self.eval_condition(cc) {
            self.pc = self.pc.wrapping_add(disp as i16 as u16);
            self.memptr = self.pc;
            12
        } else {
            7
        }
    }

    /// JP (HL)/(IX)/(IY) — 4T. Despite the mnemonic this loads PC directly
    /// from the register, never dereferencing memory.
    pub(super) fn op_jp_hl(&mut self) -> u32 {
        self.pc = self.get_rp(2);
        4
    }

    /// DJNZ e — 13T taken / 8T not taken.
    pub(super) fn op_djnz<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        bus: &mut B,
        master: BusMaster,
    ) -> u32 {
        self.b = self.b.wrapping_sub(1);
        let disp = self.fetch_byte(bus, master) as i8;
        if self.b != 0 {
            self.pc = self.pc.wrapping_add(disp as i16 as u16);
            self.memptr = self.pc;
            13
        } else {
            8
        }
    }

    /// CALL nn — 17T.
    pub(super) fn op_call_nn<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        bus: &mut B,
        master: BusMaster,
    ) -> u32 {
        let addr = self.fetch_word(bus, master);
        self.memptr = addr;
        self.push16(bus, master, self.pc);
        self.pc = addr;
        17
    }

    /// CALL cc,nn — 17T taken / 10T not taken.
    pub(super) fn op_call_cc_nn<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        cc: u8,
        bus: &mut B,
        master: BusMaster,
    ) -> u32 {
        let addr = self.fetch_word(bus, master);
        self.memptr = addr;
        if self.eval_condition(cc) {
            self.push16(bus, master, self.pc);
            self.pc = addr;
            17
        } else {
            10
        }
    }

    /// RET — 10T.
    pub(super) fn op_ret<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        bus: &mut B,
        master: BusMaster,
    ) -> u32 {
        let addr = self.pop16(bus, master);
        self.pc = addr;
        self.memptr = addr;
        10
    }

    /// RET cc — 11T taken / 5T not taken.
    pub(super) fn op_ret_cc<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        cc: u8,
        bus: &mut B,
        master: BusMaster,
    ) -> u32 {
        if self.eval_condition(cc) {
            let addr = self.pop16(bus, master);
            self.pc = addr;
            self.memptr = addr;
            11
        } else {
            5
        }
    }

    /// RST p — 11T. `target` is the opcode's `y*8` restart address.
    pub(super) fn op_rst<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        target: u16,
        bus: &mut B,
        master: BusMaster,
    ) -> u32 {
        self.push16(bus, master, self.pc);
        self.pc = target;
        self.memptr = target;
        11
    }

    /// DI — 4T.
    pub(super) fn op_di(&mut self) -> u32 {
        self.iff1 = false;
        self.iff2 = false;
        4
    }

    /// EI — 4T. Enables interrupts with a one-instruction delay.
    pub(super) fn op_ei(&mut self) -> u32 {
        self.iff1 = true;
        self.iff2 = true;
        self.ei_delay = true;
        4
    }

    /// RETN/RETI — 14T (ED prefix). Pops PC, copies IFF2 into IFF1.
    pub(super) fn op_retn<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        bus: &mut B,
        master: BusMaster,
    ) -> u32 {
        self.iff1 = self.iff2;
        let addr = self.pop16(bus, master);
        self.pc = addr;
        self.memptr = addr;
        14
    }

    /// IM 0/1/2 — 8T (ED prefix). `y` is the opcode's bits 5-3.
    pub(super) fn op_im(&mut self, y: u8) -> u32 {
        self.im = match y {
            0 | 1 | 4 | 5 => 0,
            2 | 6 => 1,
            3 | 7 => 2,
            _ => unreachable!(),
        };
        8
    }
}
