//! Fixed-layout binary serialization of the full machine state, plus a
//! rolling ring of captured states for rewind.
//!
//! Hand-rolled little-endian encode/decode rather than a general-purpose
//! serializer: the `.sav` interop format's byte layout is part of its
//! contract (spec.md §6), the same reason `CmosRam::snapshot()` in this
//! codebase returns a plain owned byte buffer instead of going through
//! `serde`. No new dependency is introduced in `sms-core` for this.

use std::fmt;

use crate::core::machine::Machine;
use crate::cpu::state::CpuStateTrait;
use crate::device::sms::vdp::FRAME_WIDTH;
use crate::device::sms::{SmsMachine, vdp::FRAME_HEIGHT};

const STATE_MAGIC: [u8; 4] = *b"SMST";
const STATE_VERSION: u16 = 1;
const FILE_MAGIC: [u8; 4] = *b"SMSV";
const FILE_VERSION: u16 = 1;

const RAM_SIZE: usize = 0x2000;
const VRAM_SIZE: usize = 0x4000;

/// Errors surfaced by snapshot capture/load. All are recoverable: the
/// caller's machine is left untouched when a `load_*` call returns `Err`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotError {
    BadMagic,
    UnsupportedVersion(u16),
    LengthMismatch,
    RomMismatch { expected: String, found: String },
}

impl fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotError::BadMagic => write!(f, "snapshot has an invalid magic number"),
            SnapshotError::UnsupportedVersion(v) => write!(f, "snapshot version {v} is not supported"),
            SnapshotError::LengthMismatch => write!(f, "snapshot buffer is truncated or the wrong length"),
            SnapshotError::RomMismatch { expected, found } => {
                write!(f, "snapshot was captured for ROM '{found}', expected '{expected}'")
            }
        }
    }
}

impl std::error::Error for SnapshotError {}

// --- byte cursor helpers --------------------------------------------------

struct Writer(Vec<u8>);

impl Writer {
    fn new() -> Self {
        Writer(Vec::new())
    }
    fn u8(&mut self, v: u8) {
        self.0.push(v);
    }
    fn i8(&mut self, v: i8) {
        self.0.push(v as u8);
    }
    fn bool(&mut self, v: bool) {
        self.0.push(v as u8);
    }
    fn u16(&mut self, v: u16) {
        self.0.extend_from_slice(&v.to_le_bytes());
    }
    fn u32(&mut self, v: u32) {
        self.0.extend_from_slice(&v.to_le_bytes());
    }
    fn u64(&mut self, v: u64) {
        self.0.extend_from_slice(&v.to_le_bytes());
    }
    fn i32(&mut self, v: i32) {
        self.0.extend_from_slice(&v.to_le_bytes());
    }
    fn bytes(&mut self, v: &[u8]) {
        self.0.extend_from_slice(v);
    }
}

struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Reader { buf, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], SnapshotError> {
        if self.pos + n > self.buf.len() {
            return Err(SnapshotError::LengthMismatch);
        }
        let s = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(s)
    }

    fn u8(&mut self) -> Result<u8, SnapshotError> {
        Ok(self.take(1)?[0])
    }
    fn i8(&mut self) -> Result<i8, SnapshotError> {
        Ok(self.take(1)?[0] as i8)
    }
    fn bool(&mut self) -> Result<bool, SnapshotError> {
        Ok(self.u8()? != 0)
    }
    fn u16(&mut self) -> Result<u16, SnapshotError> {
        Ok(u16::from_le_bytes(self.take(2)?.try_into().unwrap()))
    }
    fn u32(&mut self) -> Result<u32, SnapshotError> {
        Ok(u32::from_le_bytes(self.take(4)?.try_into().unwrap()))
    }
    fn u64(&mut self) -> Result<u64, SnapshotError> {
        Ok(u64::from_le_bytes(self.take(8)?.try_into().unwrap()))
    }
    fn i32(&mut self) -> Result<i32, SnapshotError> {
        Ok(i32::from_le_bytes(self.take(4)?.try_into().unwrap()))
    }
    fn bytes(&mut self, n: usize) -> Result<Vec<u8>, SnapshotError> {
        Ok(self.take(n)?.to_vec())
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }
}

// --- inner state section ---------------------------------------------------

/// Encode the full machine state (CPU, RAM, memory controller, BIOS/cartridge
/// bank registers, port device, VDP, PSG) in the fixed section order spec.md
/// §6 describes. ROM *contents* are not part of this: only the mapper bank
/// registers are saved, on the assumption the caller reloads the same ROM
/// image before restoring (see [`encode_file`]/[`decode_file`]).
pub fn encode_state(machine: &SmsMachine) -> Vec<u8> {
    let mut w = Writer::new();
    w.bytes(&STATE_MAGIC);
    w.u16(STATE_VERSION);
    w.u16(0); // reserved

    // CPU
    let cpu = machine.cpu().snapshot();
    w.u8(cpu.a);
    w.u8(cpu.f);
    w.u8(cpu.b);
    w.u8(cpu.c);
    w.u8(cpu.d);
    w.u8(cpu.e);
    w.u8(cpu.h);
    w.u8(cpu.l);
    w.u8(cpu.a_prime);
    w.u8(cpu.f_prime);
    w.u8(cpu.b_prime);
    w.u8(cpu.c_prime);
    w.u8(cpu.d_prime);
    w.u8(cpu.e_prime);
    w.u8(cpu.h_prime);
    w.u8(cpu.l_prime);
    w.u16(cpu.ix);
    w.u16(cpu.iy);
    w.u16(cpu.sp);
    w.u16(cpu.pc);
    w.u16(cpu.memptr);
    w.u8(cpu.i);
    w.u8(cpu.r);
    w.u8(cpu.im);
    w.u8(cpu.q);
    w.bool(cpu.iff1);
    w.bool(cpu.iff2);
    w.bool(cpu.halted);
    w.bool(cpu.ei_delay);

    // RAM
    w.bytes(machine.bus().ram());

    // Memory-control register ($3E)
    w.u8(machine.bus().ports().memory_control());

    // Optional BIOS ROM bank registers
    match machine.bus().bios() {
        Some(bios) => {
            w.bool(true);
            w.u8(bios.control());
            w.u8(bios.bank0());
            w.u8(bios.bank1());
            w.u8(bios.bank2());
        }
        None => w.bool(false),
    }

    // Cartridge ROM bank registers (always present on an SMS)
    {
        let cart = machine.bus().cartridge();
        w.bool(true);
        w.u8(cart.control());
        w.u8(cart.bank0());
        w.u8(cart.bank1());
        w.u8(cart.bank2());
    }

    // Port device (everything but the memory-control register above)
    let ports = machine.bus().ports().snapshot();
    w.u8(ports.io_control);
    w.u8(ports.f2_latch);
    w.u8(ports.joypad_a);

    // VDP
    let vdp = machine.bus().vdp.snapshot();
    w.bytes(&vdp.registers);
    w.bytes(&vdp.vram);
    w.bytes(&vdp.cram);
    match vdp.control_low {
        Some(v) => {
            w.bool(true);
            w.u8(v);
        }
        None => w.bool(false),
    }
    w.u16(vdp.address);
    w.u8(vdp.access_mode_tag);
    w.u8(vdp.read_buffer);
    w.u32(vdp.cycle_in_line);
    w.u16(vdp.v_counter);
    w.u8(vdp.line_counter);
    w.u8(vdp.status);
    w.u8(vdp.h_counter_latch);
    w.bool(vdp.irq_pending);
    w.bool(vdp.frame_ready);

    // PSG
    let psg = machine.bus().psg.snapshot();
    for p in psg.tone_period {
        w.u16(p);
    }
    for v in psg.tone_volume {
        w.u8(v);
    }
    for c in psg.tone_counter {
        w.u16(c);
    }
    for p in psg.tone_polarity {
        w.i8(p);
    }
    w.u8(psg.noise_control);
    w.u8(psg.noise_volume);
    w.u16(psg.noise_counter);
    w.i8(psg.noise_polarity);
    w.u16(psg.noise_lfsr);
    w.u8(psg.latched_channel);
    w.bool(psg.latched_is_volume);
    w.u8(psg.clock_divider);
    w.u64(psg.ticks_until_next_sample);

    w.0
}

/// Decode a buffer produced by [`encode_state`] and apply it to `machine`.
/// On any error `machine` is left completely untouched.
pub fn decode_state(machine: &mut SmsMachine, data: &[u8]) -> Result<(), SnapshotError> {
    let mut r = Reader::new(data);

    if r.bytes(4)? != STATE_MAGIC {
        return Err(SnapshotError::BadMagic);
    }
    let version = r.u16()?;
    if version != STATE_VERSION {
        return Err(SnapshotError::UnsupportedVersion(version));
    }
    let _reserved = r.u16()?;

    let cpu = crate::cpu::state::Z80State {
        a: r.u8()?,
        f: r.u8()?,
        b: r.u8()?,
        c: r.u8()?,
        d: r.u8()?,
        e: r.u8()?,
        h: r.u8()?,
        l: r.u8()?,
        a_prime: r.u8()?,
        f_prime: r.u8()?,
        b_prime: r.u8()?,
        c_prime: r.u8()?,
        d_prime: r.u8()?,
        e_prime: r.u8()?,
        h_prime: r.u8()?,
        l_prime: r.u8()?,
        ix: r.u16()?,
        iy: r.u16()?,
        sp: r.u16()?,
        pc: r.u16()?,
        memptr: r.u16()?,
        i: r.u8()?,
        r: r.u8()?,
        im: r.u8()?,
        q: r.u8()?,
        iff1: r.bool()?,
        iff2: r.bool()?,
        halted: r.bool()?,
        ei_delay: r.bool()?,
    };

    let ram = r.bytes(RAM_SIZE)?;
    let memory_control = r.u8()?;

    let bios_present = r.bool()?;
    let bios_banks = if bios_present { Some((r.u8()?, r.u8()?, r.u8()?, r.u8()?)) } else { None };

    let cart_present = r.bool()?;
    let cart_banks = if cart_present { Some((r.u8()?, r.u8()?, r.u8()?, r.u8()?)) } else { None };

    let ports = crate::device::sms::ports::PortState { io_control: r.u8()?, f2_latch: r.u8()?, joypad_a: r.u8()? };

    let mut registers = [0u8; 16];
    registers.copy_from_slice(&r.bytes(16)?);
    let vram = r.bytes(VRAM_SIZE)?;
    let mut cram = [0u8; 32];
    cram.copy_from_slice(&r.bytes(32)?);
    let control_low = if r.bool()? { Some(r.u8()?) } else { None };
    let address = r.u16()?;
    let access_mode_tag = r.u8()?;
    let read_buffer = r.u8()?;
    let cycle_in_line = r.u32()?;
    let v_counter = r.u16()?;
    let line_counter = r.u8()?;
    let status = r.u8()?;
    let h_counter_latch = r.u8()?;
    let irq_pending = r.bool()?;
    let frame_ready = r.bool()?;

    let mut tone_period = [0u16; 3];
    for p in tone_period.iter_mut() {
        *p = r.u16()?;
    }
    let mut tone_volume = [0u8; 3];
    for v in tone_volume.iter_mut() {
        *v = r.u8()?;
    }
    let mut tone_counter = [0u16; 3];
    for c in tone_counter.iter_mut() {
        *c = r.u16()?;
    }
    let mut tone_polarity = [0i8; 3];
    for p in tone_polarity.iter_mut() {
        *p = r.i8()?;
    }
    let noise_control = r.u8()?;
    let noise_volume = r.u8()?;
    let noise_counter = r.u16()?;
    let noise_polarity = r.i8()?;
    let noise_lfsr = r.u16()?;
    let latched_channel = r.u8()?;
    let latched_is_volume = r.bool()?;
    let clock_divider = r.u8()?;
    let ticks_until_next_sample = r.u64()?;

    if r.remaining() != 0 {
        return Err(SnapshotError::LengthMismatch);
    }

    // Everything decoded successfully; now apply it. Past this point we
    // cannot fail, so `machine` is only ever mutated on a fully-valid buffer.
    machine.cpu_mut().restore(cpu);
    machine.bus_mut().ram_mut().copy_from_slice(&ram);
    machine.bus_mut().ports_mut().set_memory_control(memory_control);
    if let (Some((c0, b0, b1, b2)), Some(bios)) = (bios_banks, machine.bus_mut().bios_mut()) {
        bios.set_banks(c0, b0, b1, b2);
    }
    if let Some((c0, b0, b1, b2)) = cart_banks {
        machine.bus_mut().cartridge_mut().set_banks(c0, b0, b1, b2);
    }
    machine.bus_mut().ports_mut().restore(ports);
    machine.bus_mut().vdp.restore(crate::device::sms::vdp::VdpState {
        registers,
        vram,
        cram,
        control_low,
        address,
        access_mode_tag,
        read_buffer,
        cycle_in_line,
        v_counter,
        line_counter,
        status,
        h_counter_latch,
        irq_pending,
        frame_ready,
    });
    machine.bus_mut().psg.restore(crate::device::sms::psg::PsgState {
        tone_period,
        tone_volume,
        tone_counter,
        tone_polarity,
        noise_control,
        noise_volume,
        noise_counter,
        noise_polarity,
        noise_lfsr,
        latched_channel,
        latched_is_volume,
        clock_divider,
        ticks_until_next_sample,
    });

    Ok(())
}

// --- `.sav` file wrapper ----------------------------------------------------

/// Wrap [`encode_state`]'s output in the `.sav` file container, which adds
/// a UTF-8 ROM path so a loader can verify it is restoring state captured
/// against the ROM it currently has loaded.
pub fn encode_file(machine: &SmsMachine, rom_path: &str) -> Vec<u8> {
    let state = encode_state(machine);
    let mut w = Writer::new();
    w.bytes(&FILE_MAGIC);
    w.u16(FILE_VERSION);
    w.u16(0); // reserved
    w.i32(rom_path.len() as i32);
    w.i32(state.len() as i32);
    w.bytes(rom_path.as_bytes());
    w.bytes(&state);
    w.0
}

/// Decode a `.sav` file and apply its inner state to `machine`. If
/// `expected_rom_path` is provided and does not match the path recorded in
/// the file, returns `RomMismatch` without touching `machine`. Returns the
/// ROM path recorded in the file on success.
pub fn decode_file(machine: &mut SmsMachine, data: &[u8], expected_rom_path: Option<&str>) -> Result<String, SnapshotError> {
    let mut r = Reader::new(data);
    if r.bytes(4)? != FILE_MAGIC {
        return Err(SnapshotError::BadMagic);
    }
    let version = r.u16()?;
    if version != FILE_VERSION {
        return Err(SnapshotError::UnsupportedVersion(version));
    }
    let _reserved = r.u16()?;
    let rom_path_len = r.i32()?;
    let state_len = r.i32()?;
    if rom_path_len < 0 || state_len < 0 {
        return Err(SnapshotError::LengthMismatch);
    }
    let rom_path_bytes = r.bytes(rom_path_len as usize)?;
    let rom_path = String::from_utf8(rom_path_bytes).map_err(|_| SnapshotError::LengthMismatch)?;

    if let Some(expected) = expected_rom_path {
        if expected != rom_path {
            return Err(SnapshotError::RomMismatch { expected: expected.to_string(), found: rom_path });
        }
    }

    let state_bytes = r.bytes(state_len as usize)?;
    if r.remaining() != 0 {
        return Err(SnapshotError::LengthMismatch);
    }
    decode_state(machine, &state_bytes)?;
    Ok(rom_path)
}

// --- rolling snapshot history -----------------------------------------------

/// One captured sample: the encoded state plus a framebuffer copy for a
/// rewind-menu preview thumbnail.
struct HistorySample {
    state: Vec<u8>,
    preview: Vec<u8>,
    t_states: u64,
}

/// Ring of up to 30 captured states, sampled roughly once per second of
/// emulated time. Used for rewind: `rollback(i)` restores sample `i` and
/// discards everything captured after it.
pub struct SnapshotHistory {
    capacity: usize,
    samples: std::collections::VecDeque<HistorySample>,
    last_capture_t_states: Option<u64>,
    capture_interval_t_states: u64,
}

impl SnapshotHistory {
    pub const DEFAULT_CAPACITY: usize = 30;

    pub fn new(cpu_hz: u64) -> Self {
        SnapshotHistory {
            capacity: Self::DEFAULT_CAPACITY,
            samples: std::collections::VecDeque::new(),
            last_capture_t_states: None,
            capture_interval_t_states: cpu_hz.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Capture a new sample if at least one capture interval (one emulated
    /// second, by default) has elapsed since the last one. Call this once
    /// per frame from the machine runner's step loop.
    pub fn maybe_capture(&mut self, machine: &SmsMachine) {
        let now = machine.t_states();
        let due = match self.last_capture_t_states {
            None => true,
            Some(last) => now.saturating_sub(last) >= self.capture_interval_t_states,
        };
        if !due {
            return;
        }
        self.last_capture_t_states = Some(now);
        let mut preview = vec![0u8; FRAME_WIDTH * FRAME_HEIGHT * 4];
        machine.render_frame(&mut preview);
        self.samples.push_back(HistorySample { state: encode_state(machine), preview, t_states: now });
        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
    }

    /// The preview framebuffer for sample `index`, if it exists.
    pub fn preview(&self, index: usize) -> Option<&[u8]> {
        self.samples.get(index).map(|s| s.preview.as_slice())
    }

    pub fn t_states_at(&self, index: usize) -> Option<u64> {
        self.samples.get(index).map(|s| s.t_states)
    }

    /// Restore sample `index` into `machine` and drop every sample captured
    /// after it (rewinding further than `index` now requires capturing new
    /// samples going forward). Returns an error without mutating `machine`
    /// or the ring if `index` is out of range or the sample is corrupt.
    pub fn rollback(&mut self, index: usize, machine: &mut SmsMachine) -> Result<(), SnapshotError> {
        let sample = self.samples.get(index).ok_or(SnapshotError::LengthMismatch)?;
        decode_state(machine, &sample.state)?;
        self.last_capture_t_states = Some(machine.t_states());
        self.samples.truncate(index + 1);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::machine::Machine;
    use crate::device::sms::Region;

    fn make_machine() -> SmsMachine {
        let mut machine = SmsMachine::new(Region::Ntsc, 44_100);
        machine.load_rom(vec![0u8; 0x4000]).unwrap();
        machine
    }

    #[test]
    fn state_round_trip_is_byte_identical() {
        let mut machine = make_machine();
        machine.cpu_mut().a = 0x42;
        machine.bus_mut().vdp.write_control(0x10);
        machine.bus_mut().vdp.write_control(0x41);
        machine.bus_mut().vdp.write_data(0x99);

        let encoded = encode_state(&machine);
        let mut restored = make_machine();
        decode_state(&mut restored, &encoded).unwrap();
        let re_encoded = encode_state(&restored);
        assert_eq!(encoded, re_encoded);
        assert_eq!(restored.cpu().a, 0x42);
    }

    #[test]
    fn bad_magic_is_rejected_without_mutating_state() {
        let mut machine = make_machine();
        machine.cpu_mut().a = 0x77;
        let mut garbage = encode_state(&machine);
        garbage[0] = b'X';
        let mut target = make_machine();
        let err = decode_state(&mut target, &garbage).unwrap_err();
        assert_eq!(err, SnapshotError::BadMagic);
        assert_eq!(target.cpu().a, 0xFF); // untouched power-on value
    }

    #[test]
    fn truncated_buffer_is_a_length_mismatch() {
        let machine = make_machine();
        let mut encoded = encode_state(&machine);
        encoded.truncate(10);
        let mut target = make_machine();
        assert_eq!(decode_state(&mut target, &encoded).unwrap_err(), SnapshotError::LengthMismatch);
    }

    #[test]
    fn file_wrapper_round_trips_rom_path() {
        let machine = make_machine();
        let file = encode_file(&machine, "games/sonic.sms");
        let mut target = make_machine();
        let path = decode_file(&mut target, &file, Some("games/sonic.sms")).unwrap();
        assert_eq!(path, "games/sonic.sms");
    }

    #[test]
    fn file_wrapper_rejects_rom_mismatch() {
        let machine = make_machine();
        let file = encode_file(&machine, "games/sonic.sms");
        let mut target = make_machine();
        let err = decode_file(&mut target, &file, Some("games/other.sms")).unwrap_err();
        assert!(matches!(err, SnapshotError::RomMismatch { .. }));
    }

    #[test]
    fn history_caps_at_capacity_and_rollback_trims_later_samples() {
        let mut machine = make_machine();
        let mut history = SnapshotHistory { capacity: 3, ..SnapshotHistory::new(machine.cpu_hz()) };
        for i in 0..5u64 {
            history.last_capture_t_states = None; // force capture every call
            machine.cpu_mut().a = i as u8;
            history.maybe_capture(&machine);
        }
        assert_eq!(history.len(), 3);

        history.rollback(1, &mut machine).unwrap();
        assert_eq!(history.len(), 2);
    }
}
