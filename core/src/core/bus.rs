/// Identifies who is accessing the bus.
///
/// The SMS has a single bus master (the Z80); the variant still carries an
/// index the way the teacher's multi-CPU boards did, so the same `Bus` trait
/// shape serves both without a special case for "the only master there is".
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BusMaster {
    Cpu(usize),
}

/// Generic bus interface. Associated types let the same trait describe an
/// 8-bit/16-address machine (Z80) without committing to a fixed width.
pub trait Bus {
    type Address: Copy + Into<u64>;
    type Data;

    fn read(&mut self, master: BusMaster, addr: Self::Address) -> Self::Data;
    fn write(&mut self, master: BusMaster, addr: Self::Address, data: Self::Data);

    /// Read from I/O port address space (separate from memory on Z80).
    /// Default maps to memory read; override for CPUs with separate I/O.
    fn io_read(&mut self, master: BusMaster, addr: Self::Address) -> Self::Data {
        self.read(master, addr)
    }

    /// Write to I/O port address space (separate from memory on Z80).
    /// Default maps to memory write; override for CPUs with separate I/O.
    fn io_write(&mut self, master: BusMaster, addr: Self::Address, data: Self::Data) {
        self.write(master, addr, data)
    }

    /// Check if the bus is halted for this master. The SMS never stalls the
    /// Z80 (no RDY/BUSREQ device exists on this hardware), so every
    /// implementor returns `false`, but the hook stays for symmetry with the
    /// teacher's multi-master boards.
    fn is_halted_for(&self, master: BusMaster) -> bool;

    /// Generic interrupt query; the CPU decides which lines it cares about.
    fn check_interrupts(&self, target: BusMaster) -> InterruptState;
}

#[derive(Default, Clone, Copy, Debug, PartialEq, Eq)]
pub struct InterruptState {
    pub nmi: bool,
    pub irq: bool,
}
