use crate::constants::AXIS_HALF_RANGE;
use crate::sound::SoundId;
use crate::transport::ShadowRequest;
use crate::types::{Axis, Color};

pub trait Renderer {
    fn clear(&mut self, color: Color);
    fn draw_tile(&mut self, cell_x: usize, cell_y: usize, color: Color);
    fn draw_actor(&mut self, x: i32, y: i32, size: i32, color: Color);
    fn draw_text(&mut self, x: i32, y: i32, text: &str, color: Color);
}

pub trait TiltSensor {
    /// Raw 8-bit accelerometer sample for one axis.
    fn read_axis(&mut self, axis: Axis) -> u8;
}

pub trait Audio {
    fn play_sound(&mut self, sound: SoundId);
}

/// Half-duplex link to the remote shadow service. Neither call may block.
pub trait ShadowLink {
    /// `None` when the link cannot take a request right now.
    fn transmit(&mut self, request: &ShadowRequest) -> Option<()>;
    /// `None` when nothing has arrived yet.
    fn poll_receive(&mut self) -> Option<Vec<u8>>;
}

pub struct Peripherals<'a> {
    pub renderer: &'a mut dyn Renderer,
    pub tilt: &'a mut dyn TiltSensor,
    pub audio: &'a mut dyn Audio,
    pub link: &'a mut dyn ShadowLink,
}

/// Converts a raw tilt sample into a signed velocity. Samples above 127 wrap
/// negative; tilting the board away from the player moves the actor towards
/// negative coordinates.
pub fn axis_velocity(raw: u8, factor: i32) -> i32 {
    let mut value = raw as i32;
    if value > AXIS_HALF_RANGE {
        value -= 255;
    }
    -(value * factor / AXIS_HALF_RANGE)
}
