//! Built-in demo backend.
//!
//! A native [`ScriptBackend`] standing in for an embedded interpreter, so
//! the console runs end-to-end out of the box and adapter authors have a
//! working reference for the binding contract: drive everything through
//! [`Console`], poll `must_quit` after operations that can trip it, and
//! report early exit as `Halted` rather than an error.
//!
//! The cartridge itself is a bouncing ball plus a player-driven paddle:
//! d-pad moves, holding A leaves trails, start+select exits.

use pyrite_core::{Console, EvalOutcome, LanguageTag, ScriptBackend};

/// Language tag claimed by the built-in demo.
pub const DEMO_LANGUAGE: LanguageTag = LanguageTag(0xFF);

pub struct DemoBackend {
    loaded: bool,
    ball_x: i32,
    ball_y: i32,
    vel_x: i32,
    vel_y: i32,
    paddle_x: i32,
    paddle_y: i32,
    trails: bool,
}

impl DemoBackend {
    pub fn new() -> Self {
        DemoBackend {
            loaded: false,
            ball_x: 60,
            ball_y: 40,
            vel_x: 3,
            vel_y: 2,
            paddle_x: 140,
            paddle_y: 200,
            trails: false,
        }
    }
}

impl Default for DemoBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptBackend for DemoBackend {
    fn language(&self) -> LanguageTag {
        DEMO_LANGUAGE
    }

    fn load(&mut self, console: &mut dyn Console, _source: &str) -> Result<EvalOutcome, String> {
        // Native code stands in for top-level script execution.
        console.trace("demo cartridge loaded");
        self.loaded = true;
        Ok(EvalOutcome::Completed)
    }

    fn has_update(&self) -> bool {
        self.loaded
    }

    fn update(&mut self, console: &mut dyn Console) -> Result<EvalOutcome, String> {
        if console.btn(8) && console.btn(9) {
            console.exit();
        }
        if console.must_quit() {
            return Ok(EvalOutcome::Halted);
        }

        if !self.trails {
            console.cls(60);
        }

        // Paddle follows the d-pad
        if console.btn(2) {
            self.paddle_x -= 4;
        }
        if console.btn(3) {
            self.paddle_x += 4;
        }
        if console.btn(0) {
            self.paddle_y -= 4;
        }
        if console.btn(1) {
            self.paddle_y += 4;
        }
        self.trails = console.btn(4);

        // Ball physics against the screen edges
        self.ball_x += self.vel_x;
        self.ball_y += self.vel_y;
        if self.ball_x < 8 || self.ball_x > 311 {
            self.vel_x = -self.vel_x + console.random_range(-1, 2);
        }
        if self.ball_y < 8 || self.ball_y > 231 {
            self.vel_y = -self.vel_y + console.random_range(-1, 2);
        }
        self.ball_x = self.ball_x.clamp(8, 311);
        self.ball_y = self.ball_y.clamp(8, 231);
        if self.vel_x == 0 {
            self.vel_x = 1;
        }
        if self.vel_y == 0 {
            self.vel_y = 1;
        }

        // Scene: border, paddle, ball, mouse crosshair
        console.rectb(0, 0, 320, 240, 63);
        console.rect(self.paddle_x, self.paddle_y, 40, 6, 22);
        console.rectb(self.paddle_x, self.paddle_y, 40, 6, 20);
        console.circ(self.ball_x, self.ball_y, 7, 2);
        console.circb(self.ball_x, self.ball_y, 7, 0);
        console.line(160, 120, self.ball_x, self.ball_y, 12);

        let mx = console.mpos(0) as i32;
        let my = console.mpos(1) as i32;
        let cursor = if console.mbtn(0) { 7 } else { 37 };
        console.line(mx - 3, my, mx + 3, my, cursor);
        console.line(mx, my - 3, mx, my + 3, cursor);

        // Corner pixel pulses along the grey ramp with the cartridge clock
        let t = console.time() / 40 % 64;
        let grey = console.rgb(t * 4, t * 4, t * 4, 1);
        console.pix(1, 1, grey);

        Ok(EvalOutcome::Completed)
    }
}
