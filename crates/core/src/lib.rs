//! # pyrite-core
//!
//! Core of the Pyrite fantasy console: one fixed 320×240 screen, 64 palette
//! slots, five sprite pages, and a single pre-allocated memory arena that
//! holds every byte of machine state. Scripts ("cartridges") drive the
//! console through a fixed API surface bound by interchangeable interpreter
//! backends; the host owns the window, the event pump, and the backends.
//!
//! ## Architecture
//!
//! - [`Machine`] — Top-level console wiring the arena, screen, input, RNG,
//!   and cartridge lifecycle together
//! - [`Memory`] — The byte arena and its compile-time region partition
//! - [`BitField`] — Packed-bit access (6-bit pixels, controller snapshot)
//! - [`Palette`] / [`Rgb`] — 64-entry color table with an arena-backed
//!   ground truth
//! - [`Screen`] — Pixel get/set, sprite blit, palette-indirect rendering
//! - [`Input`] / [`InputSnapshot`] — Per-step device capture into the
//!   controller region
//! - [`Console`] — The script-callable capability trait, implemented once
//! - [`ScriptBackend`] — Adapter contract for embedded interpreters
//! - [`savestate`] — Whole-arena save files (deflate-compressed)
//! - [`png`] — Screenshot encoding for rendered frames
//!
//! The whole crate is single-threaded and synchronous: one simulation step
//! is sample input → run the cartridge's `update` → render, with nothing
//! running between calls.

pub mod api;
pub mod bits;
pub mod input;
pub mod memory;
pub mod palette;
pub mod png;
pub mod savestate;
pub mod screen;
pub mod script;

pub use api::Console;
pub use bits::BitField;
pub use input::{Input, InputSnapshot};
pub use memory::{Memory, MEMORY_BYTES};
pub use palette::{Palette, Rgb, DEFAULT_PALETTE};
pub use savestate::SaveState;
pub use screen::Screen;
pub use script::{EvalOutcome, LanguageTag, ScriptBackend};

use std::time::Instant;

/// Screen width in pixels.
pub const SCREEN_WIDTH: usize = 320;
/// Screen height in pixels.
pub const SCREEN_HEIGHT: usize = 240;

/// Bits per stored pixel index. Build-time constant: 8 by default, 6 under
/// the `six-bit-pixels` feature. Changes the framebuffer and sprite bank
/// region sizes, never the partition algorithm.
#[cfg(not(feature = "six-bit-pixels"))]
pub const PIXEL_BITS: usize = 8;
#[cfg(feature = "six-bit-pixels")]
pub const PIXEL_BITS: usize = 6;

/// Bits per map-bank sprite index, paired with the pixel depth.
#[cfg(not(feature = "six-bit-pixels"))]
pub const MAP_INDEX_BITS: usize = 16;
#[cfg(feature = "six-bit-pixels")]
pub const MAP_INDEX_BITS: usize = 13;

/// Sprite bank page edge length in pixels.
pub const SPRITE_BANK_DIM: usize = 256;
/// Sprite cells per bank page.
pub const SPRITES_PER_PAGE: usize = 1024;

/// The console: arena, screen, input, and cartridge lifecycle.
///
/// There is no global instance. Hosts own a `Machine` (or several — e.g.
/// one per test) and pass it by reference into whatever dispatch layer
/// binds script names to [`Console`] operations.
pub struct Machine {
    pub mem: Memory,
    pub screen: Screen,
    pub input: Input,
    /// Set by the `exit` API; the host drains its loop once it sees this.
    pub(crate) must_quit: bool,
    /// xorshift32 state for the `random` API. Never zero.
    pub(crate) rng_state: u32,
    /// Cartridge clock epoch, set when a cartridge loads.
    pub(crate) loaded_at: Option<Instant>,
    language: LanguageTag,
}

impl Machine {
    /// A machine with a zeroed arena and the stock palette installed.
    pub fn new() -> Self {
        let mem = Memory::new();
        let screen = Screen::new(&mem);
        let mut machine = Machine {
            mem,
            screen,
            input: Input::new(),
            must_quit: false,
            rng_state: 0x193A_6754,
            loaded_at: None,
            language: LanguageTag(0),
        };
        machine
            .screen
            .set_full_palette(&mut machine.mem, &DEFAULT_PALETTE);
        machine
    }

    /// Persist the backend selector into the arena's language byte.
    pub fn set_language(&mut self, tag: LanguageTag) {
        self.language = tag;
        self.mem.set_language(tag.0);
    }

    pub fn language(&self) -> LanguageTag {
        self.language
    }

    /// Whether a script has requested shutdown via `exit()`.
    pub fn must_quit(&self) -> bool {
        self.must_quit
    }

    /// Load a cartridge: persist its language tag, copy the source into the
    /// code region (zero-filling the remainder so reloads are byte-for-byte
    /// deterministic), start the cartridge clock, and run the backend's
    /// top-level load. Returns whether the cartridge defines `update`.
    ///
    /// Source larger than the code region is rejected, and a cartridge that
    /// calls `exit()` while loading is not an error.
    pub fn load_cartridge(
        &mut self,
        backend: &mut dyn ScriptBackend,
        source: &str,
    ) -> Result<bool, String> {
        let bytes = source.as_bytes();
        if bytes.len() > memory::CODE_SIZE {
            return Err(format!(
                "cartridge source is {} bytes; the code region holds {}",
                bytes.len(),
                memory::CODE_SIZE
            ));
        }
        self.set_language(backend.language());
        let code = self.mem.code_mut();
        code[..bytes.len()].copy_from_slice(bytes);
        code[bytes.len()..].fill(0);
        self.loaded_at = Some(Instant::now());
        backend.load(self, source)?;
        Ok(backend.has_update())
    }

    /// One simulation step: capture `snapshot` into the controller region,
    /// then run the cartridge's `update`. A `Halted` outcome means the
    /// cartridge asked to exit; check [`Machine::must_quit`] and wind down.
    pub fn step(
        &mut self,
        backend: &mut dyn ScriptBackend,
        snapshot: &InputSnapshot,
    ) -> Result<EvalOutcome, String> {
        self.input.sample(&mut self.mem, snapshot);
        backend.update(self)
    }

    /// Materialize the current frame as RGBA bytes.
    pub fn render(&mut self) -> &[u8] {
        self.screen.render(&self.mem)
    }

    /// The last rendered frame as `0x00RRGGBB` pixels.
    pub fn pixel_buffer(&self) -> Vec<u32> {
        self.screen.as_pixel_buffer()
    }

    /// Replace palette slot `index` (arena and cache).
    pub fn set_palette(&mut self, index: usize, color: Rgb) {
        self.screen.set_palette(&mut self.mem, index, color);
    }

    pub fn get_palette(&self, index: usize) -> Rgb {
        self.screen.get_palette(index)
    }

    /// Import a decoded 256×1280 RGBA sprite sheet into the sprite bank.
    ///
    /// Each pixel is reduced to a color index with the mode-1 `rgb` packing
    /// (top two bits per channel), so the mapping is only meaningful for
    /// sheets drawn against the default palette. Decoding image files is
    /// the host's job.
    pub fn import_sprites(&mut self, width: usize, height: usize, rgba: &[u8]) -> Result<(), String> {
        let (want_w, want_h) = (SPRITE_BANK_DIM, SPRITE_BANK_DIM * memory::SPRITE_PAGES);
        if width != want_w || height != want_h {
            return Err(format!(
                "sprite sheet is {}x{}; expected {}x{}",
                width, height, want_w, want_h
            ));
        }
        if rgba.len() != width * height * 4 {
            return Err(format!(
                "sprite sheet byte length {} does not match {}x{} RGBA",
                rgba.len(),
                width,
                height
            ));
        }
        for y in 0..height {
            for x in 0..width {
                let o = (y * width + x) * 4;
                let index = (rgba[o] >> 6) << 4 | (rgba[o + 1] >> 6) << 2 | (rgba[o + 2] >> 6);
                self.screen.set_sprite_pixel(&mut self.mem, x, y, index);
            }
        }
        Ok(())
    }

    /// Snapshot the persisted machine state (the whole arena plus the
    /// language tag). The arena layout is the stable save format.
    pub fn save_state(&self) -> SaveState {
        SaveState {
            language: self.language.0,
            memory: self.mem.data.clone(),
        }
    }

    /// Restore a previously saved state.
    pub fn restore_state(&mut self, state: &SaveState) -> Result<(), String> {
        if state.memory.len() != MEMORY_BYTES {
            return Err(format!(
                "save state arena is {} bytes; this build uses {}",
                state.memory.len(),
                MEMORY_BYTES
            ));
        }
        self.mem.data.copy_from_slice(&state.memory);
        self.language = LanguageTag(state.language);
        self.mem.set_language(state.language);
        self.screen.sync_palette(&self.mem);
        Ok(())
    }

    /// xorshift32 step for the `random` API.
    pub(crate) fn next_u32(&mut self) -> u32 {
        self.rng_state ^= self.rng_state << 13;
        self.rng_state ^= self.rng_state >> 17;
        self.rng_state ^= self.rng_state << 5;
        self.rng_state
    }
}

impl Default for Machine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal backend standing in for an embedded interpreter: "update"
    /// runs a canned sequence of console calls, and like a real adapter it
    /// reports `Halted` as soon as the console's quit flag trips.
    struct TestBackend {
        tag: u8,
        defines_update: bool,
        call_exit_in_update: bool,
    }

    impl TestBackend {
        fn new(tag: u8) -> Self {
            TestBackend {
                tag,
                defines_update: true,
                call_exit_in_update: false,
            }
        }
    }

    impl ScriptBackend for TestBackend {
        fn language(&self) -> LanguageTag {
            LanguageTag(self.tag)
        }

        fn load(&mut self, console: &mut dyn Console, source: &str) -> Result<EvalOutcome, String> {
            if source.contains("syntax error") {
                return Err("parse failed: syntax error".into());
            }
            if source.contains("exit()") {
                console.exit();
                return Ok(EvalOutcome::Halted);
            }
            Ok(EvalOutcome::Completed)
        }

        fn has_update(&self) -> bool {
            self.defines_update
        }

        fn update(&mut self, console: &mut dyn Console) -> Result<EvalOutcome, String> {
            console.cls(1);
            if self.call_exit_in_update {
                console.exit();
            }
            if console.must_quit() {
                return Ok(EvalOutcome::Halted);
            }
            console.pix(0, 0, 5);
            Ok(EvalOutcome::Completed)
        }
    }

    #[test]
    fn test_default_palette_installed() {
        let m = Machine::new();
        assert_eq!(m.get_palette(2), Rgb::new(255, 0, 0));
        assert_eq!(m.get_palette(63), Rgb::new(255, 255, 255));
        assert_eq!(&m.mem.palette_bytes()[6..9], &[255, 0, 0]);
    }

    #[test]
    fn test_load_cartridge_persists_language_and_code() {
        let mut m = Machine::new();
        let mut backend = TestBackend::new(7);
        let has_update = m.load_cartridge(&mut backend, "fn update() {}").unwrap();
        assert!(has_update);
        assert_eq!(m.language(), LanguageTag(7));
        assert_eq!(m.mem.language(), 7);
        assert_eq!(&m.mem.code()[..14], b"fn update() {}");
        assert_eq!(m.mem.code()[14], 0);
    }

    #[test]
    fn test_load_cartridge_is_deterministic() {
        let mut m = Machine::new();
        let mut backend = TestBackend::new(1);

        // A long cartridge first, so stale bytes would linger if the
        // region weren't zero-filled on reload.
        m.load_cartridge(&mut backend, &"x".repeat(1000)).unwrap();
        let first = m.load_cartridge(&mut backend, "fn update() {}").unwrap();
        let code_first = m.mem.code().to_vec();
        let second = m.load_cartridge(&mut backend, "fn update() {}").unwrap();
        assert_eq!(code_first, m.mem.code());
        assert_eq!(first, second);
    }

    #[test]
    fn test_load_cartridge_rejects_oversized_source() {
        let mut m = Machine::new();
        let mut backend = TestBackend::new(0);
        let big = "x".repeat(memory::CODE_SIZE + 1);
        assert!(m.load_cartridge(&mut backend, &big).is_err());

        let exact = "y".repeat(memory::CODE_SIZE);
        assert!(m.load_cartridge(&mut backend, &exact).is_ok());
    }

    #[test]
    fn test_load_reports_parse_errors() {
        let mut m = Machine::new();
        let mut backend = TestBackend::new(0);
        let err = m.load_cartridge(&mut backend, "syntax error here").unwrap_err();
        assert!(err.contains("parse failed"));
    }

    #[test]
    fn test_exit_during_load_is_benign() {
        let mut m = Machine::new();
        let mut backend = TestBackend::new(0);
        let result = m.load_cartridge(&mut backend, "exit()");
        assert!(result.is_ok());
        assert!(m.must_quit());
    }

    #[test]
    fn test_exit_signal_halts_update_without_error() {
        let mut m = Machine::new();
        let mut backend = TestBackend::new(0);
        backend.call_exit_in_update = true;
        m.load_cartridge(&mut backend, "cart").unwrap();

        let outcome = m.step(&mut backend, &InputSnapshot::default()).unwrap();
        assert_eq!(outcome, EvalOutcome::Halted);
        assert!(m.must_quit());
        // The halt abandoned the remainder of update(): pix(0,0,5) never ran
        assert_eq!(m.screen.get_pixel(&m.mem, 0, 0), 1);
    }

    #[test]
    fn test_step_samples_input_before_update() {
        let mut m = Machine::new();
        let mut backend = TestBackend::new(0);
        m.load_cartridge(&mut backend, "cart").unwrap();

        let snap = InputSnapshot {
            left: true,
            ..Default::default()
        };
        let outcome = m.step(&mut backend, &snap).unwrap();
        assert_eq!(outcome, EvalOutcome::Completed);
        assert!(m.btn(2));
        assert!(!m.btn(0));
        // update() ran to completion
        assert_eq!(m.screen.get_pixel(&m.mem, 0, 0), 5);
    }

    #[test]
    fn test_render_pipeline() {
        let mut m = Machine::new();
        m.set_palette(9, Rgb::new(11, 22, 33));
        m.cls(9);
        let frame = m.render();
        assert_eq!(&frame[0..4], &[11, 22, 33, 0xFF]);
        let pixels = m.pixel_buffer();
        assert_eq!(pixels[0], 0x000B_1621);
        assert_eq!(pixels.len(), SCREEN_WIDTH * SCREEN_HEIGHT);
    }

    #[test]
    fn test_save_restore_round_trip() {
        let mut m = Machine::new();
        m.set_language(LanguageTag(3));
        m.poke(memory::STORAGE_OFFSET as i32, 0x77);
        m.set_palette(0, Rgb::new(9, 9, 9));
        let saved = m.save_state();

        m.poke(memory::STORAGE_OFFSET as i32, 0x00);
        m.set_palette(0, Rgb::new(1, 1, 1));
        m.set_language(LanguageTag(0));

        m.restore_state(&saved).unwrap();
        assert_eq!(m.peek(memory::STORAGE_OFFSET as i32), 0x77);
        assert_eq!(m.language(), LanguageTag(3));
        assert_eq!(m.get_palette(0), Rgb::new(9, 9, 9));
    }

    #[test]
    fn test_restore_rejects_wrong_arena_size() {
        let mut m = Machine::new();
        let state = SaveState {
            language: 0,
            memory: vec![0; 12],
        };
        assert!(m.restore_state(&state).is_err());
    }

    #[test]
    fn test_import_sprites() {
        let mut m = Machine::new();
        let w = SPRITE_BANK_DIM;
        let h = SPRITE_BANK_DIM * memory::SPRITE_PAGES;
        let mut sheet = vec![0u8; w * h * 4];
        // One saturated-red pixel at (3, 7) → mode-1 index 0b110000
        let o = (7 * w + 3) * 4;
        sheet[o] = 255;
        sheet[o + 3] = 255;
        m.import_sprites(w, h, &sheet).unwrap();
        assert_eq!(m.screen.sprite_pixel(&m.mem, 3, 7), 0b110000);
        assert_eq!(m.screen.sprite_pixel(&m.mem, 4, 7), 0);

        assert!(m.import_sprites(w, h, &sheet[1..]).is_err());
        assert!(m.import_sprites(64, 64, &sheet).is_err());
    }

    #[test]
    fn test_time_starts_at_cartridge_load() {
        let mut m = Machine::new();
        assert_eq!(m.time(), 0);
        let mut backend = TestBackend::new(0);
        m.load_cartridge(&mut backend, "cart").unwrap();
        assert!(m.time() >= 0);
    }
}
