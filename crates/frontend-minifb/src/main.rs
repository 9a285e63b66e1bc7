//! Pyrite desktop frontend.
//!
//! Hosts the console core behind a minifb window: pumps OS events, samples
//! keyboard/mouse/gamepad into an [`InputSnapshot`] each step, runs the
//! cartridge's `update`, and blits the rendered frame.
//!
//! Modes:
//!
//! - **GUI mode** (default): scaled window, gamepad support, screenshots,
//!   quick save/load.
//! - **Headless mode** (`--headless`): runs a fixed number of frames with
//!   idle input and writes the final frame as a PNG — handy for automated
//!   cartridge smoke tests.
//!
//! Keys: arrows = d-pad, X/Z/S/A = A/B/X/Y, C = start, D = select.
//! Hotkeys: 1–4 window scale, F5 save state, F9 load state,
//! F12 screenshot, Escape quit.

mod demo;

use demo::DemoBackend;
use gilrs::{Axis, Button as GilrsButton, Event as GilrsEvent, EventType, Gilrs};
use minifb::{Key, MouseButton, MouseMode, Scale, ScaleMode, Window, WindowOptions};
use pyrite_core::{
    savestate, InputSnapshot, Machine, ScriptBackend, SCREEN_HEIGHT, SCREEN_WIDTH,
};
use std::env;
use std::fs;
use std::process::exit;

/// Analog stick deadzone
const STICK_DEADZONE: f32 = 0.3;

// ─── Gamepad ────────────────────────────────────────────────────────────────

#[derive(Default)]
struct GamepadState {
    up: bool,
    down: bool,
    left: bool,
    right: bool,
    a: bool,
    b: bool,
    x: bool,
    y: bool,
    start: bool,
    select: bool,
    stick_x: f32,
    stick_y: f32,
}

impl GamepadState {
    fn eff_up(&self) -> bool {
        self.up || self.stick_y > STICK_DEADZONE
    }
    fn eff_down(&self) -> bool {
        self.down || self.stick_y < -STICK_DEADZONE
    }
    fn eff_left(&self) -> bool {
        self.left || self.stick_x < -STICK_DEADZONE
    }
    fn eff_right(&self) -> bool {
        self.right || self.stick_x > STICK_DEADZONE
    }
}

fn init_gamepad(debug: bool) -> Option<Gilrs> {
    match Gilrs::new() {
        Ok(gilrs) => {
            if debug {
                for (_id, gamepad) in gilrs.gamepads() {
                    println!("Gamepad: {}", gamepad.name());
                }
            }
            Some(gilrs)
        }
        Err(e) => {
            eprintln!("Warning: gamepad init: {}", e);
            None
        }
    }
}

fn poll_gamepad(gilrs: &mut Gilrs, gp: &mut GamepadState) {
    while let Some(GilrsEvent { event, .. }) = gilrs.next_event() {
        match event {
            EventType::ButtonPressed(btn, _) | EventType::ButtonReleased(btn, _) => {
                let pressed = matches!(event, EventType::ButtonPressed(..));
                match btn {
                    GilrsButton::DPadUp => gp.up = pressed,
                    GilrsButton::DPadDown => gp.down = pressed,
                    GilrsButton::DPadLeft => gp.left = pressed,
                    GilrsButton::DPadRight => gp.right = pressed,
                    GilrsButton::South => gp.a = pressed,
                    GilrsButton::East => gp.b = pressed,
                    GilrsButton::West => gp.x = pressed,
                    GilrsButton::North => gp.y = pressed,
                    GilrsButton::Start => gp.start = pressed,
                    GilrsButton::Select => gp.select = pressed,
                    _ => {}
                }
            }
            EventType::AxisChanged(Axis::LeftStickX, v, _) => gp.stick_x = v,
            EventType::AxisChanged(Axis::LeftStickY, v, _) => gp.stick_y = v,
            _ => {}
        }
    }
}

// ─── Input sampling ─────────────────────────────────────────────────────────

/// Merge keyboard, mouse, and gamepad into the console's device snapshot.
fn sample_devices(window: &Window, gp: &GamepadState, scale: usize) -> InputSnapshot {
    let (mouse_x, mouse_y) = window
        .get_mouse_pos(MouseMode::Clamp)
        .map(|(x, y)| ((x / scale as f32) as i16, (y / scale as f32) as i16))
        .unwrap_or((0, 0));

    InputSnapshot {
        up: window.is_key_down(Key::Up) || gp.eff_up(),
        down: window.is_key_down(Key::Down) || gp.eff_down(),
        left: window.is_key_down(Key::Left) || gp.eff_left(),
        right: window.is_key_down(Key::Right) || gp.eff_right(),
        a: window.is_key_down(Key::X) || gp.a,
        b: window.is_key_down(Key::Z) || gp.b,
        x: window.is_key_down(Key::S) || gp.x,
        y: window.is_key_down(Key::A) || gp.y,
        start: window.is_key_down(Key::C) || gp.start,
        select: window.is_key_down(Key::D) || gp.select,
        mouse_x,
        mouse_y,
        mouse_left: window.get_mouse_down(MouseButton::Left),
        mouse_right: window.get_mouse_down(MouseButton::Right),
    }
}

// ─── Frame presentation ─────────────────────────────────────────────────────

fn make_window(scale: usize) -> Window {
    let mut window = Window::new(
        "Pyrite",
        SCREEN_WIDTH * scale,
        SCREEN_HEIGHT * scale,
        WindowOptions {
            scale: Scale::X1,
            scale_mode: ScaleMode::AspectRatioStretch,
            resize: true,
            ..Default::default()
        },
    )
    .expect("Failed to create window");
    window.set_target_fps(60);
    window
}

/// Nearest-neighbor upscale of the console frame into the window buffer.
fn scale_frame(pixels: &[u32], scaled: &mut [u32], scale: usize) {
    for y in 0..SCREEN_HEIGHT {
        for x in 0..SCREEN_WIDTH {
            let px = pixels[y * SCREEN_WIDTH + x];
            for sy in 0..scale {
                let row = (y * scale + sy) * SCREEN_WIDTH * scale + x * scale;
                scaled[row..row + scale].fill(px);
            }
        }
    }
}

fn save_screenshot(machine: &mut Machine, path: &str) -> Result<(), String> {
    let frame = machine.render().to_vec();
    let png = pyrite_core::png::encode_png(SCREEN_WIDTH as u32, SCREEN_HEIGHT as u32, &frame);
    fs::write(path, png).map_err(|e| format!("write {}: {}", path, e))
}

// ─── Modes ──────────────────────────────────────────────────────────────────

fn run_gui(machine: &mut Machine, backend: &mut dyn ScriptBackend, state_path: &str, debug: bool) {
    let mut scale = 2usize;
    let mut window = make_window(scale);
    let mut scaled_buf = vec![0u32; SCREEN_WIDTH * scale * SCREEN_HEIGHT * scale];

    let mut gilrs = init_gamepad(debug);
    let mut gp = GamepadState::default();
    let mut prev_f5 = false;
    let mut prev_f9 = false;
    let mut prev_f12 = false;
    let mut prev_num = [false; 4];
    let mut screenshot_n = 0u32;

    while window.is_open() && !window.is_key_down(Key::Escape) && !machine.must_quit() {
        if let Some(ref mut g) = gilrs {
            poll_gamepad(g, &mut gp);
        }

        // Scale toggle (1-4)
        let num = [
            window.is_key_down(Key::Key1),
            window.is_key_down(Key::Key2),
            window.is_key_down(Key::Key3),
            window.is_key_down(Key::Key4),
        ];
        for i in 0..4 {
            if num[i] && !prev_num[i] {
                scale = i + 1;
                window = make_window(scale);
                scaled_buf = vec![0u32; SCREEN_WIDTH * scale * SCREEN_HEIGHT * scale];
            }
        }
        prev_num = num;

        // Quick save (F5) / load (F9)
        let f5 = window.is_key_down(Key::F5);
        if f5 && !prev_f5 {
            match savestate::save_to_file(&machine.save_state(), state_path.as_ref()) {
                Ok(()) => eprintln!("State saved: {}", state_path),
                Err(e) => eprintln!("Save error: {}", e),
            }
        }
        prev_f5 = f5;

        let f9 = window.is_key_down(Key::F9);
        if f9 && !prev_f9 {
            match savestate::load_from_file(state_path.as_ref())
                .and_then(|s| machine.restore_state(&s))
            {
                Ok(()) => eprintln!("State loaded: {}", state_path),
                Err(e) => eprintln!("Load error: {}", e),
            }
        }
        prev_f9 = f9;

        // Screenshot (F12)
        let f12 = window.is_key_down(Key::F12);
        if f12 && !prev_f12 {
            let f = format!("screenshot_{:04}.png", screenshot_n);
            match save_screenshot(machine, &f) {
                Ok(()) => {
                    eprintln!("Screenshot: {}", f);
                    screenshot_n += 1;
                }
                Err(e) => eprintln!("Screenshot error: {}", e),
            }
        }
        prev_f12 = f12;

        let snapshot = sample_devices(&window, &gp, scale);
        if let Err(e) = machine.step(backend, &snapshot) {
            eprintln!("Cartridge error: {}", e);
            break;
        }

        machine.render();
        let pixels = machine.pixel_buffer();
        scale_frame(&pixels, &mut scaled_buf, scale);
        window
            .update_with_buffer(&scaled_buf, SCREEN_WIDTH * scale, SCREEN_HEIGHT * scale)
            .expect("window update");
    }
}

fn run_headless(
    machine: &mut Machine,
    backend: &mut dyn ScriptBackend,
    frames: u32,
    out: &str,
) -> Result<(), String> {
    let snapshot = InputSnapshot::default();
    for _ in 0..frames {
        machine.step(backend, &snapshot)?;
        if machine.must_quit() {
            break;
        }
    }
    machine.render();
    save_screenshot(machine, out)?;
    println!("Wrote {} after {} frames", out, frames);
    Ok(())
}

// ─── Entry ──────────────────────────────────────────────────────────────────

fn usage() {
    println!("Usage: pyrite [cartridge] [options]");
    println!();
    println!("Options:");
    println!("  --headless       Run without a window, then write a PNG");
    println!("  --frames N       Headless frame count (default 60)");
    println!("  --out FILE       Headless output file (default headless.png)");
    println!("  --debug          Chatty diagnostics");
    println!("  --help           This text");
}

fn main() {
    let args: Vec<String> = env::args().skip(1).collect();
    if args.iter().any(|a| a == "--help") {
        usage();
        return;
    }

    let headless = args.iter().any(|a| a == "--headless");
    let debug = args.iter().any(|a| a == "--debug");
    let frames: u32 = args
        .iter()
        .position(|a| a == "--frames")
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok())
        .unwrap_or(60);
    let out = args
        .iter()
        .position(|a| a == "--out")
        .and_then(|i| args.get(i + 1))
        .cloned()
        .unwrap_or_else(|| "headless.png".to_string());
    // First positional argument that isn't an option value
    let mut cart_path: Option<String> = None;
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--frames" | "--out" => i += 2,
            a if a.starts_with("--") => i += 1,
            a => {
                cart_path.get_or_insert_with(|| a.to_string());
                i += 1;
            }
        }
    }

    let source = match &cart_path {
        Some(path) => match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                eprintln!("Failed to read {}: {}", path, e);
                exit(1);
            }
        },
        None => String::new(),
    };

    let mut machine = Machine::new();
    let mut backend = DemoBackend::new();

    match machine.load_cartridge(&mut backend, &source) {
        Ok(true) => {}
        Ok(false) => {
            eprintln!("Cartridge defines no update entry point; nothing to run.");
            exit(1);
        }
        Err(e) => {
            eprintln!("Cartridge load failed: {}", e);
            exit(1);
        }
    }
    if debug {
        println!("Loaded {} bytes of cartridge source", source.len());
    }

    let state_path = savestate::state_path(cart_path.as_deref().unwrap_or("demo"));

    if headless {
        if let Err(e) = run_headless(&mut machine, &mut backend, frames, &out) {
            eprintln!("Headless run failed: {}", e);
            exit(1);
        }
    } else {
        run_gui(&mut machine, &mut backend, &state_path, debug);
    }
}
