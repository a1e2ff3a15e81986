use crate::core::{Bus, BusMaster};
use crate::cpu::z80::{Flag, Z80};

impl Z80 {
    /// LDI/LDD — 16T. (DE)←(HL), HL/DE ± 1, BC--.
    pub(super) fn op_ldi_ldd<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        dec: bool,
        bus: &mut B,
        master: BusMaster,
    ) -> u32 {
        let val = bus.read(master, self.get_hl());
        bus.write(master, self.get_de(), val);

        let delta: u16 = if dec { 0xFFFF } else { 1 };
        self.set_hl(self.get_hl().wrapping_add(delta));
        self.set_de(self.get_de().wrapping_add(delta));
        self.set_bc(self.get_bc().wrapping_sub(1));

        let n = val.wrapping_add(self.a);
        let mut f = self.f & (Flag::S as u8 | Flag::Z as u8 | Flag::C as u8);
        if self.get_bc() != 0 {
            f |= Flag::PV as u8;
        }
        if (n & 0x08) != 0 {
            f |= Flag::X as u8;
        }
        if (n & 0x02) != 0 {
            f |= Flag::Y as u8;
        }
        self.f = f;
        self.q = self.f;
        16
    }

    /// LDIR/LDDR — 21T repeating / 16T when done.
    pub(super) fn op_ldir_lddr<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        dec: bool,
        bus: &mut B,
        master: BusMaster,
    ) -> u32 {
        self.op_ldi_ldd(dec, bus, master);
        if self.get_bc() == 0 {
            16
        } else {
            self.pc = self.pc.wrapping_sub(2);
            self.memptr = self.pc.wrapping_add(1);
            21
        }
    }

    /// CPI/CPD — 16T. Compares A-(HL), HL ± 1, BC--.
    pub(super) fn op_cpi_cpd<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        dec: bool,
        bus: &mut B,
        master: BusMaster,
    ) -> u32 {
        let val = bus.read(master, self.get_hl());
        let result = self.a.wrapping_sub(val);
        let h = (self.a & 0xF) < (val & 0xF);

        let delta: u16 = if dec { 0xFFFF } else { 1 };
        self.set_hl(self.get_hl().wrapping_add(delta));
        self.set_bc(self.get_bc().wrapping_sub(1));
        if dec {
            self.memptr = self.memptr.wrapping_sub(1);
        } else {
            self.memptr = self.memptr.wrapping_add(1);
        }

        let mut f = self.f & Flag::C as u8;
        f |= Flag::N as u8;
        if result == 0 {
            f |= Flag::Z as u8;
        }
        if (result & 0x80) != 0 {
            f |= Flag::S as u8;
        }
        if h {
            f |= Flag::H as u8;
        }
        if self.get_bc() != 0 {
            f |= Flag::PV as u8;
        }
        let n = result.wrapping_sub(if h { 1 } else { 0 });
        if (n & 0x08) != 0 {
            f |= Flag::X as u8;
        }
        if (n & 0x02) != 0 {
            f |= Flag::Y as u8;
        }
        self.f = f;
        self.q = self.f;
        16
    }

    /// CPIR/CPDR — 21T repeating / 16T when done. Repeats while BC != 0 and not found.
    pub(super) fn op_cpir_cpdr<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        dec: bool,
        bus: &mut B,
        master: BusMaster,
    ) -> u32 {
        self.op_cpi_cpd(dec, bus, master);
        let z = (self.f & Flag::Z as u8) != 0;
        if self.get_bc() == 0 || z {
            16
        } else {
            self.pc = self.pc.wrapping_sub(2);
            self.memptr = self.pc.wrapping_add(1);
            21
        }
    }

    /// INI/IND — 16T. B--, IN port C → (HL), HL ± 1.
    pub(super) fn op_ini_ind<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        dec: bool,
        bus: &mut B,
        master: BusMaster,
    ) -> u32 {
        self.b = self.b.wrapping_sub(1);
        let val = bus.io_read(master, self.get_bc());
        bus.write(master, self.get_hl(), val);
        let delta: u16 = if dec { 0xFFFF } else { 1 };
        self.set_hl(self.get_hl().wrapping_add(delta));
        self.memptr = self.get_bc().wrapping_add(if dec { 0xFFFF } else { 1 });

        let mut f = Flag::N as u8;
        if self.b == 0 {
            f |= Flag::Z as u8;
        }
        f |= self.b & (Flag::X as u8 | Flag::Y as u8);
        if (self.b & 0x80) != 0 {
            f |= Flag::S as u8;
        }
        self.f = f;
        self.q = self.f;
        16
    }

    /// INIR/INDR — 21T repeating / 16T when done.
    pub(super) fn op_inir_indr<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        dec: bool,
        bus: &mut B,
        master: BusMaster,
    ) -> u32 {
        self.op_ini_ind(dec, bus, master);
        if self.b == 0 {
            16
        } else {
            self.pc = self.pc.wrapping_sub(2);
            21
        }
    }

    /// OUTI/OUTD — 16T. B--, (HL) → OUT port C, HL ± 1.
    pub(super) fn op_outi_outd<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        dec: bool,
        bus: &mut B,
        master: BusMaster,
    ) -> u32 {
        self.b = self.b.wrapping_sub(1);
        let val = bus.read(master, self.get_hl());
        let delta: u16 = if dec { 0xFFFF } else { 1 };
        self.set_hl(self.get_hl().wrapping_add(delta));
        bus.io_write(master, self.get_bc(), val);
        self.memptr = self.get_bc().wrapping_add(if dec { 0xFFFF } else { 1 });

        let mut f = Flag::N as u8;
        if self.b == 0 {
            f |= Flag::Z as u8;
        }
        f |= self.b & (Flag::X as u8 | Flag::Y as u8);
        if (self.b & 0x80) != 0 {
            f |= Flag::S as u8;
        }
        self.f = f;
        self.q = self.f;
        16
    }

    /// OTIR/OTDR — 21T repeating / 16T when done.
    pub(super) fn op_otir_otdr<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        dec: bool,
        bus: &mut B,
        master: BusMaster,
    ) -> u32 {
        self.op_outi_outd(dec, bus, master);
        if self.b == 0 {
            16
        } else {
            self.pc = self.pc.wrapping_sub(2);
            21
        }
    }
}
