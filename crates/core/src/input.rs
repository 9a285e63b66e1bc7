//! Input capture: device sampling into the controller region.
//!
//! Once per simulation step the host hands [`Input::sample`] an abstract
//! [`InputSnapshot`] (key-down states, mouse position, mouse buttons). The
//! sampler writes it to two places: an in-memory pad/mouse struct answering
//! the fast queries scripts make, and the packed 16-byte controller region
//! of the arena, bit by bit, at the fixed offsets below. Scripts treat the
//! region as read-only; it is overwritten wholesale on the next sample.
//!
//! Controller region layout (bit 0 = first bit of byte 0):
//!
//! | Bits  | Content                                  |
//! |-------|------------------------------------------|
//! | 0–9   | P1 up,down,left,right,A,B,X,Y,start,select |
//! | 10–19 | P2, same order                           |
//! | 20–35 | P1 mouse X (signed 16-bit, high byte first) |
//! | 36–51 | P1 mouse Y                               |
//! | 52–53 | P1 mouse left, right                     |
//! | 54–69 | P2 mouse X                               |
//! | 70–85 | P2 mouse Y                               |
//! | 86–87 | P2 mouse left, right                     |
//!
//! Both players are currently fed from the same physical device — a known
//! simplification, preserved deliberately until a second device source
//! exists.

use crate::bits::BitField;
use crate::memory::Memory;

pub const P1_KEY_UP_BIT: usize = 0;
pub const P1_KEY_DOWN_BIT: usize = 1;
pub const P1_KEY_LEFT_BIT: usize = 2;
pub const P1_KEY_RIGHT_BIT: usize = 3;
pub const P1_KEY_A_BIT: usize = 4;
pub const P1_KEY_B_BIT: usize = 5;
pub const P1_KEY_X_BIT: usize = 6;
pub const P1_KEY_Y_BIT: usize = 7;
pub const P1_KEY_START_BIT: usize = 8;
pub const P1_KEY_SELECT_BIT: usize = 9;

pub const P2_KEY_UP_BIT: usize = 10;
pub const P2_KEY_DOWN_BIT: usize = 11;
pub const P2_KEY_LEFT_BIT: usize = 12;
pub const P2_KEY_RIGHT_BIT: usize = 13;
pub const P2_KEY_A_BIT: usize = 14;
pub const P2_KEY_B_BIT: usize = 15;
pub const P2_KEY_X_BIT: usize = 16;
pub const P2_KEY_Y_BIT: usize = 17;
pub const P2_KEY_START_BIT: usize = 18;
pub const P2_KEY_SELECT_BIT: usize = 19;

pub const P1_MOUSE_X_BIT: usize = 20;
pub const P1_MOUSE_Y_BIT: usize = P1_MOUSE_X_BIT + 16;
pub const P1_MOUSE_LEFT_BIT: usize = P1_MOUSE_Y_BIT + 16;
pub const P1_MOUSE_RIGHT_BIT: usize = P1_MOUSE_LEFT_BIT + 1;

pub const P2_MOUSE_X_BIT: usize = P1_MOUSE_RIGHT_BIT + 1;
pub const P2_MOUSE_Y_BIT: usize = P2_MOUSE_X_BIT + 16;
pub const P2_MOUSE_LEFT_BIT: usize = P2_MOUSE_Y_BIT + 16;
pub const P2_MOUSE_RIGHT_BIT: usize = P2_MOUSE_LEFT_BIT + 1;

/// Abstract device state supplied by the host each step.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputSnapshot {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
    pub a: bool,
    pub b: bool,
    pub x: bool,
    pub y: bool,
    pub start: bool,
    pub select: bool,
    pub mouse_x: i16,
    pub mouse_y: i16,
    pub mouse_left: bool,
    pub mouse_right: bool,
}

/// One player's button state.
#[derive(Debug, Clone, Copy, Default)]
struct Pad {
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
}

impl Pad {
    fn from_snapshot(s: &InputSnapshot) -> Self {
        Pad {
            up: s.up,
            down: s.down,
            left: s.left,
            right: s.right,
            a: s.a,
            b: s.b,
            x: s.x,
            y: s.y,
            start: s.start,
            select: s.select,
        }
    }

    fn write_bits(&self, bits: &mut BitField<&mut [u8]>, base: usize) {
        bits.put_bit(base, self.up);
        bits.put_bit(base + 1, self.down);
        bits.put_bit(base + 2, self.left);
        bits.put_bit(base + 3, self.right);
        bits.put_bit(base + 4, self.a);
        bits.put_bit(base + 5, self.b);
        bits.put_bit(base + 6, self.x);
        bits.put_bit(base + 7, self.y);
        bits.put_bit(base + 8, self.start);
        bits.put_bit(base + 9, self.select);
    }
}

/// One player's mouse state.
#[derive(Debug, Clone, Copy, Default)]
struct Mouse {
    x: i16,
    y: i16,
    left: bool,
    right: bool,
}

impl Mouse {
    fn write_bits(&self, bits: &mut BitField<&mut [u8]>, x_bit: usize) {
        // High byte first, then low byte, per the region layout.
        bits.set_field(x_bit, 16, self.x as u16);
        bits.set_field(x_bit + 16, 16, self.y as u16);
        bits.put_bit(x_bit + 32, self.left);
        bits.put_bit(x_bit + 33, self.right);
    }
}

/// Input sampler and last-sampled state.
#[derive(Debug, Clone, Copy, Default)]
pub struct Input {
    p1: Pad,
    p2: Pad,
    p1_mouse: Mouse,
    p2_mouse: Mouse,
}

impl Input {
    pub fn new() -> Self {
        Input::default()
    }

    /// Capture `snapshot` into the query state and the controller region.
    pub fn sample(&mut self, mem: &mut Memory, snapshot: &InputSnapshot) {
        let pad = Pad::from_snapshot(snapshot);
        let mouse = Mouse {
            x: snapshot.mouse_x,
            y: snapshot.mouse_y,
            left: snapshot.mouse_left,
            right: snapshot.mouse_right,
        };
        // Player 2 mirrors the player-1 device.
        self.p1 = pad;
        self.p2 = pad;
        self.p1_mouse = mouse;
        self.p2_mouse = mouse;

        let mut bits = BitField::over_mut(mem.controller_mut());
        self.p1.write_bits(&mut bits, P1_KEY_UP_BIT);
        self.p2.write_bits(&mut bits, P2_KEY_UP_BIT);
        self.p1_mouse.write_bits(&mut bits, P1_MOUSE_X_BIT);
        self.p2_mouse.write_bits(&mut bits, P2_MOUSE_X_BIT);
    }

    /// Button state by id: 0–9 player 1, 10–19 player 2 (order: up, down,
    /// left, right, A, B, X, Y, start, select). Unknown ids are `false`.
    pub fn button_pressed(&self, button: i32) -> bool {
        match button {
            0 => self.p1.up,
            1 => self.p1.down,
            2 => self.p1.left,
            3 => self.p1.right,
            4 => self.p1.a,
            5 => self.p1.b,
            6 => self.p1.x,
            7 => self.p1.y,
            8 => self.p1.start,
            9 => self.p1.select,
            10 => self.p2.up,
            11 => self.p2.down,
            12 => self.p2.left,
            13 => self.p2.right,
            14 => self.p2.a,
            15 => self.p2.b,
            16 => self.p2.x,
            17 => self.p2.y,
            18 => self.p2.start,
            19 => self.p2.select,
            _ => false,
        }
    }

    /// Mouse button by id: 0/1 = P1 left/right, 2/3 = P2 left/right.
    pub fn mouse_button_pressed(&self, button: i32) -> bool {
        match button {
            0 => self.p1_mouse.left,
            1 => self.p1_mouse.right,
            2 => self.p2_mouse.left,
            3 => self.p2_mouse.right,
            _ => false,
        }
    }

    /// Mouse axis by id: 0/1 = P1 x/y, 2/3 = P2 x/y. Unknown axes are 0.
    pub fn mouse_pos(&self, axis: i32) -> i16 {
        match axis {
            0 => self.p1_mouse.x,
            1 => self.p1_mouse.y,
            2 => self.p2_mouse.x,
            3 => self.p2_mouse.y,
            _ => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buttons_reach_controller_region() {
        let mut mem = Memory::new();
        let mut input = Input::new();
        let snap = InputSnapshot {
            up: true,
            select: true,
            ..Default::default()
        };
        input.sample(&mut mem, &snap);

        let ctl = mem.controller();
        let bits = BitField::over(ctl);
        assert!(bits.test_bit(P1_KEY_UP_BIT));
        assert!(bits.test_bit(P1_KEY_SELECT_BIT));
        assert!(!bits.test_bit(P1_KEY_DOWN_BIT));
        // P2 mirrors P1
        assert!(bits.test_bit(P2_KEY_UP_BIT));
        assert!(bits.test_bit(P2_KEY_SELECT_BIT));
        // Byte 0 = bits 0..7 LSB-first: up (bit 0) only → 0x01
        assert_eq!(ctl[0], 0x01);
    }

    #[test]
    fn test_mouse_field_layout() {
        let mut mem = Memory::new();
        let mut input = Input::new();
        let snap = InputSnapshot {
            mouse_x: 0x1234,
            mouse_y: -2,
            mouse_left: true,
            ..Default::default()
        };
        input.sample(&mut mem, &snap);

        let bits = BitField::over(mem.controller());
        assert_eq!(bits.field(P1_MOUSE_X_BIT, 8), 0x12); // high byte first
        assert_eq!(bits.field(P1_MOUSE_X_BIT + 8, 8), 0x34);
        assert_eq!(bits.field(P1_MOUSE_Y_BIT, 16) as i16, -2);
        assert!(bits.test_bit(P1_MOUSE_LEFT_BIT));
        assert!(!bits.test_bit(P1_MOUSE_RIGHT_BIT));
        // P2 mirror occupies the tail of the region
        assert_eq!(bits.field(P2_MOUSE_X_BIT, 16), 0x1234);
        assert!(bits.test_bit(P2_MOUSE_LEFT_BIT));
        assert!(!bits.test_bit(P2_MOUSE_RIGHT_BIT));
    }

    #[test]
    fn test_sample_overwrites_previous_state() {
        let mut mem = Memory::new();
        let mut input = Input::new();
        input.sample(
            &mut mem,
            &InputSnapshot {
                a: true,
                ..Default::default()
            },
        );
        assert!(input.button_pressed(4));
        input.sample(&mut mem, &InputSnapshot::default());
        assert!(!input.button_pressed(4));
        assert!(!BitField::over(mem.controller()).test_bit(P1_KEY_A_BIT));
    }

    #[test]
    fn test_queries() {
        let mut mem = Memory::new();
        let mut input = Input::new();
        input.sample(
            &mut mem,
            &InputSnapshot {
                right: true,
                mouse_x: -5,
                mouse_y: 17,
                mouse_right: true,
                ..Default::default()
            },
        );
        assert!(input.button_pressed(3));
        assert!(input.button_pressed(13)); // P2 mirror
        assert!(!input.button_pressed(0));
        assert!(!input.button_pressed(-1));
        assert!(!input.button_pressed(20));
        assert!(input.mouse_button_pressed(1));
        assert!(input.mouse_button_pressed(3));
        assert!(!input.mouse_button_pressed(0));
        assert!(!input.mouse_button_pressed(99));
        assert_eq!(input.mouse_pos(0), -5);
        assert_eq!(input.mouse_pos(1), 17);
        assert_eq!(input.mouse_pos(2), -5);
        assert_eq!(input.mouse_pos(7), 0);
    }

    #[test]
    fn test_used_bits_fit_region() {
        assert!(P2_MOUSE_RIGHT_BIT < crate::memory::CONTROLLER_SIZE * 8);
        assert_eq!(P2_MOUSE_RIGHT_BIT, 87);
    }
}
