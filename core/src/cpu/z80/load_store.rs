use crate::core::{Bus, BusMaster};
use crate::cpu::z80::{Flag, IndexMode, Z80};

impl Z80 {
    /// LD r,n / LD (HL),n / LD (IX+d),n. Opcode mask: 00 rrr 110.
    /// Register: 7T. (HL): 10T. (IX+d)/(IY+d): 15 (real 19, prefix adds 4 externally).
    pub(super) fn op_ld_r_n<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        r: u8,
        bus: &mut B,
        master: BusMaster,
    ) -> u32 {
        if r == 6 {
            let addr = self.resolve_hl_addr(bus, master);
            let n = self.fetch_byte(bus, master);
            bus.write(master, addr, n);
            if self.index_mode == IndexMode::HL { 10 } else { 15 }
        } else {
            let n = self.fetch_byte(bus, master);
            self.set_reg8_ix(r, n);
            7
        }
    }

    /// LD r,r' / LD r,(HL) / LD r,(IX+d) / LD (HL),r / LD (IX+d),r.
    /// Opcode mask: 01 dst src. Register-register: 4T. (HL) either side: 7T.
    /// (IX+d)/(IY+d) either side: 15 (real 19).
    pub(super) fn op_ld_r_r<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        dst: u8,
        src: u8,
        bus: &mut B,
        master: BusMaster,
    ) -> u32 {
        if src == 6 {
            let addr = self.resolve_hl_addr(bus, master);
            let val = bus.read(master, addr);
            self.set_reg8(dst, val);
            if self.index_mode == IndexMode::HL { 7 } else { 15 }
        } else if dst == 6 {
            let addr = self.resolve_hl_addr(bus, master);
            let val = self.get_reg8(src);
            bus.write(master, addr, val);
            if self.index_mode == IndexMode::HL { 7 } else { 15 }
        } else {
            let val = self.get_reg8_ix(src);
            self.set_reg8_ix(dst, val);
            4
        }
    }

    /// LD rp,nn — 10T. Opcode mask: 00 pp0 001 (p: 0=BC, 1=DE, 2=HL/IX/IY, 3=SP).
    pub(super) fn op_ld_rp_nn<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        p: u8,
        bus: &mut B,
        master: BusMaster,
    ) -> u32 {
        let val = self.fetch_word(bus, master);
        self.set_rp(p, val);
        10
    }

    /// LD A,(BC) — 7T.
    pub(super) fn op_ld_a_bc<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        bus: &mut B,
        master: BusMaster,
    ) -> u32 {
        let addr = self.get_bc();
        self.a = bus.read(master, addr);
        self.memptr = addr.wrapping_add(1);
        7
    }

    /// LD A,(DE) — 7T.
    pub(super) fn op_ld_a_de<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        bus: &mut B,
        master: BusMaster,
    ) -> u32 {
        let addr = self.get_de();
        self.a = bus.read(master, addr);
        self.memptr = addr.wrapping_add(1);
        7
    }

    /// LD (BC),A — 7T.
    pub(super) fn op_ld_bc_a<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        bus: &mut B,
        master: BusMaster,
    ) -> u32 {
        let addr = self.get_bc();
        bus.write(master, addr, self.a);
        self.memptr = ((self.a as u16) << 8) | (addr.wrapping_add(1) & 0xFF);
        7
    }

    /// LD (DE),A — 7T.
    pub(super) fn op_ld_de_a<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        bus: &mut B,
        master: BusMaster,
    ) -> u32 {
        let addr = self.get_de();
        bus.write(master, addr, self.a);
        self.memptr = ((self.a as u16) << 8) | (addr.wrapping_add(1) & 0xFF);
        7
    }

    /// LD A,(nn) — 13T.
    pub(super) fn op_ld_a_nn<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        bus: &mut B,
        master: BusMaster,
    ) -> u32 {
        let addr = self.fetch_word(bus, master);
        self.a = bus.read(master, addr);
        self.memptr = addr.wrapping_add(1);
        13
    }

    /// LD (nn),A — 13T.
    pub(super) fn op_ld_nn_a<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        bus: &mut B,
        master: BusMaster,
    ) -> u32 {
        let addr = self.fetch_word(bus, master);
        bus.write(master, addr, self.a);
        self.memptr = ((self.a as u16) << 8) | (addr.wrapping_add(1) & 0xFF);
        13
    }

    /// LD SP,HL/IX/IY — 6T (always; the indexed 10T real total minus the
    /// externally-accounted 4T prefix is also 6).
    pub(super) fn op_ld_sp_hl(&mut self) -> u32 {
        self.sp = self.get_rp(2);
        6
    }

    /// LD (nn),HL/IX/IY — 16T (same externally-accounted-prefix logic as LD SP,HL).
    pub(super) fn op_ld_nn_hl<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        bus: &mut B,
        master: BusMaster,
    ) -> u32 {
        let addr = self.fetch_word(bus, master);
        let val = self.get_rp(2);
        bus.write(master, addr, val as u8);
        bus.write(master, addr.wrapping_add(1), (val >> 8) as u8);
        self.memptr = addr.wrapping_add(1);
        16
    }

    /// LD HL/IX/IY,(nn) — 16T.
    pub(super) fn op_ld_hl_nn_ind<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        bus: &mut B,
        master: BusMaster,
    ) -> u32 {
        let addr = self.fetch_word(bus, master);
        let lo = bus.read(master, addr);
        let hi = bus.read(master, addr.wrapping_add(1));
        self.set_rp(2, ((hi as u16) << 8) | lo as u16);
        self.memptr = addr.wrapping_add(1);
        16
    }

    /// EX AF,AF' — 4T.
    pub(super) fn op_ex_af_af(&mut self) -> u32 {
        std::mem::swap(&mut self.a, &mut self.a_prime);
        std::mem::swap(&mut self.f, &mut self.f_prime);
        4
    }

    /// EXX — 4T.
    pub(super) fn op_exx(&mut self) -> u32 {
        std::mem::swap(&mut self.b, &mut self.b_prime);
        std::mem::swap(&mut self.c, &mut self.c_prime);
        std::mem::swap(&mut self.d, &mut self.d_prime);
        std::mem::swap(&mut self.e, &mut self.e_prime);
        std::mem::swap(&mut self.h, &mut self.h_prime);
        std::mem::swap(&mut self.l, &mut self.l_prime);
        4
    }

    /// EX DE,HL — 4T. Not affected by a DD/FD prefix (always plain HL).
    pub(super) fn op_ex_de_hl(&mut self) -> u32 {
        std::mem::swap(&mut self.d, &mut self.h);
        std::mem::swap(&mut self.e, &mut self.l);
        4
    }

    /// LD I,A — 9T (ED prefix).
    pub(super) fn op_ld_i_a(&mut self) -> u32 {
        self.i = self.a;
        9
    }

    /// LD R,A — 9T (ED prefix).
    pub(super) fn op_ld_r_a(&mut self) -> u32 {
        self.r = self.a;
        9
    }

    /// LD A,I — 9T (ED prefix). Flags: S/Z from I, H=0, N=0, PV=IFF2, C preserved.
    pub(super) fn op_ld_a_i(&mut self) -> u32 {
        self.a = self.i;
        let mut f = self.f & Flag::C as u8;
        if self.a == 0 {
            f |= Flag::Z as u8;
        }
        if (self.a & 0x80) != 0 {
            f |= Flag::S as u8;
        }
        if self.iff2 {
            f |= Flag::PV as u8;
        }
        f |= self.a & (Flag::X as u8 | Flag::Y as u8);
        self.f = f;
        self.q = self.f;
        9
    }

    /// LD A,R — 9T (ED prefix). Flags: S/Z from R, H=0, N=0, PV=IFF2, C preserved.
    pub(super) fn op_ld_a_r(&mut self) -> u32 {
        self.a = self.r;
        let mut f = self.f & Flag::C as u8;
        if self.a == 0 {
            f |= Flag::Z as u8;
        }
        if (self.a & 0x80) != 0 {
            f |= Flag::S as u8;
        }
        if self.iff2 {
            f |= Flag::PV as u8;
        }
        f |= self.a & (Flag::X as u8 | Flag::Y as u8);
        self.f = f;
        self.q = self.f;
        9
    }

    /// LD (nn),rp — 20T (ED prefix).
    pub(super) fn op_ld_nn_rp_ed<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        p: u8,
        bus: &mut B,
        master: BusMaster,
    ) -> u32 {
        let addr = self.fetch_word(bus, master);
        let val = self.get_rp(p);
        bus.write(master, addr, val as u8);
        bus.write(master, addr.wrapping_add(1), (val >> 8) as u8);
        self.memptr = addr.wrapping_add(1);
        20
    }

    /// LD rp,(nn) — 20T (ED prefix).
    pub(super) fn op_ld_rp_nn_ed<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        p: u8,
        bus: &mut B,
        master: BusMaster,
    ) -> u32 {
        let addr = self.fetch_word(bus, master);
        let lo = bus.read(master, addr);
        let hi = bus.read(master, addr.wrapping_add(1));
        self.set_rp(p, ((hi as u16) << 8) | lo as u16);
        self.memptr = addr.wrapping_add(1);
        20
    }

    /// IN r,(C) — 12T (ED prefix). Flags: S/Z/PV(parity) from input, H=0, N=0,
    /// C preserved. For r=6 (IN F,(C)) the value is discarded, only flags set.
    pub(super) fn op_in_r_c<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        r: u8,
        bus: &mut B,
        master: BusMaster,
    ) -> u32 {
        let val = bus.io_read(master, self.get_bc());
        if r != 6 {
            self.set_reg8(r, val);
        }
        let mut f = self.f & Flag::C as u8;
        if val == 0 {
            f |= Flag::Z as u8;
        }
        if (val & 0x80) != 0 {
            f |= Flag::S as u8;
        }
        if Self::get_parity(val) {
            f |= Flag::PV as u8;
        }
        f |= val & (Flag::X as u8 | Flag::Y as u8);
        self.f = f;
        self.q = self.f;
        self.memptr = self.get_bc().wrapping_add(1);
        12
    }

    /// OUT (C),r — 12T (ED prefix). For r=6, outputs 0 (undocumented).
    pub(super) fn op_out_c_r<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        r: u8,
        bus: &mut B,
        master: BusMaster,
    ) -> u32 {
        let val = if r == 6 { 0 } else { self.get_reg8(r) };
        bus.io_write(master, self.get_bc(), val);
        self.memptr = self.get_bc().wrapping_add(1);
        12
    }

    /// EX (SP),HL/IX/IY — 19T (the indexed real 23T minus the externally
    /// accounted 4T prefix is also 19).
    pub(super) fn op_ex_sp_hl<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        bus: &mut B,
        master: BusMaster,
    ) -> u32 {
        let lo = bus.read(master, self.sp);
        let hi = bus.read(master, self.sp.wrapping_add(1));
        let from_stack = ((hi as u16) << 8) | lo as u16;
        let reg = self.get_rp(2);
        bus.write(master, self.sp.wrapping_add(1), (reg >> 8) as u8);
        bus.write(master, self.sp, reg as u8);
        self.set_rp(2, from_stack);
        self.memptr = from_stack;
        19
    }
}
