/// Describes a single input button that a machine accepts.
pub struct InputButton {
    /// Machine-defined button identifier, passed to `set_input()`.
    pub id: u8,
    /// Human-readable name for display/configuration (e.g., "P1 Up", "Start").
    pub name: &'static str,
}

/// Machine-agnostic interface for an emulated system.
///
/// A UI shell drives emulation purely through this trait; it never reaches
/// into CPU registers, VDP state, or PSG channels directly.
pub trait Machine {
    /// Native display resolution as (width, height) in pixels.
    fn display_size(&self) -> (u32, u32);

    /// Run one frame of emulation (advance the clock by one frame's worth of cycles).
    fn run_frame(&mut self);

    /// Render the current video state into a BGRA32 pixel buffer.
    ///
    /// The buffer must be at least `width * height * 4` bytes (from
    /// `display_size()`). Pixels are stored left-to-right, top-to-bottom, 4
    /// bytes per pixel (B, G, R, A), matching the VDP's native compositing
    /// order.
    fn render_frame(&self, buffer: &mut [u8]);

    /// Handle an input event. `button` is a machine-defined ID from `input_map()`.
    /// `pressed` is true for key-down, false for key-up.
    fn set_input(&mut self, button: u8, pressed: bool);

    /// Get the list of input buttons this machine accepts.
    fn input_map(&self) -> &[InputButton];

    /// Reset the machine to its initial power-on state.
    fn reset(&mut self);
}
