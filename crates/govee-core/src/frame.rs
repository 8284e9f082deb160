//! LED command frame encoding
//!
//! Every command is a fixed 20-byte frame written to a single GATT
//! characteristic:
//!
//! ```text
//! +------+---------+----------------------+----------+
//! | 0x33 | command | payload, zero padded | checksum |
//! +------+---------+----------------------+----------+
//!    0        1            2..=18             19
//! ```
//!
//! The checksum is the XOR of the 19 preceding bytes, so XOR-ing a whole
//! valid frame yields zero.

use core::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{GoveeError, Result};

// ----------------------------------------------------------------------------
// Protocol Constants
// ----------------------------------------------------------------------------

/// Characteristic that accepts command frames
pub const COMMAND_CHARACTERISTIC_UUID: Uuid =
    Uuid::from_u128(0x00010203_0405_0607_0809_0a0b0c0d2b11);

/// Total frame length in bytes
pub const FRAME_LEN: usize = 20;

/// First byte of every command frame
pub const FRAME_PREAMBLE: u8 = 0x33;

/// Largest payload that fits between the command byte and the checksum
pub const MAX_PAYLOAD_LEN: usize = FRAME_LEN - 3;

/// Command codes
pub mod commands {
    pub const POWER: u8 = 0x01;
    pub const BRIGHTNESS: u8 = 0x04;
    pub const COLOR: u8 = 0x05;

    /// Color sub-mode selecting a manually chosen RGB value
    pub const COLOR_MODE_MANUAL: u8 = 0x02;
}

// ----------------------------------------------------------------------------
// Color
// ----------------------------------------------------------------------------

/// An RGB color with 8-bit channels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl Color {
    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Build a color from untyped channel values, rejecting anything outside 0..=255
    pub fn try_from_channels(red: i64, green: i64, blue: i64) -> Result<Self> {
        Ok(Self {
            red: channel("red", red)?,
            green: channel("green", green)?,
            blue: channel("blue", blue)?,
        })
    }
}

fn channel(name: &'static str, value: i64) -> Result<u8> {
    u8::try_from(value).map_err(|_| GoveeError::InvalidColorChannel {
        channel: name,
        value,
    })
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.red, self.green, self.blue)
    }
}

// ----------------------------------------------------------------------------
// Commands
// ----------------------------------------------------------------------------

/// High-level LED command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Power(bool),
    /// Brightness in percent (0..=100)
    Brightness(u8),
    Color(Color),
}

impl Command {
    pub fn code(&self) -> u8 {
        match self {
            Command::Power(_) => commands::POWER,
            Command::Brightness(_) => commands::BRIGHTNESS,
            Command::Color(_) => commands::COLOR,
        }
    }

    /// Encode this command into a checksummed frame
    pub fn encode(&self) -> Result<Frame> {
        match *self {
            Command::Power(on) => Ok(encode_power_frame(on)),
            Command::Brightness(percent) => encode_brightness_frame(percent),
            Command::Color(color) => Ok(encode_color_frame(color.red, color.green, color.blue)),
        }
    }
}

// ----------------------------------------------------------------------------
// Frame
// ----------------------------------------------------------------------------

/// A complete 20-byte command frame
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Frame([u8; FRAME_LEN]);

impl Frame {
    /// Build a frame from a command code and payload.
    ///
    /// Only the low 8 bits of `command` are used.
    pub fn encode(command: u32, payload: &[u8]) -> Result<Self> {
        if payload.len() > MAX_PAYLOAD_LEN {
            return Err(GoveeError::PayloadTooLong {
                len: payload.len(),
                max: MAX_PAYLOAD_LEN,
            });
        }

        Ok(Self::build((command & 0xff) as u8, payload))
    }

    /// Assemble a frame; callers guarantee `payload.len() <= MAX_PAYLOAD_LEN`
    fn build(command: u8, payload: &[u8]) -> Self {
        let mut bytes = [0u8; FRAME_LEN];
        bytes[0] = FRAME_PREAMBLE;
        bytes[1] = command;
        bytes[2..2 + payload.len()].copy_from_slice(payload);
        bytes[FRAME_LEN - 1] = checksum(&bytes[..FRAME_LEN - 1]);
        Self(bytes)
    }

    /// Parse and validate a frame received as raw bytes
    pub fn decode(data: &[u8]) -> Result<Self> {
        let bytes: [u8; FRAME_LEN] = data.try_into().map_err(|_| GoveeError::InvalidFrame {
            reason: format!("expected {} bytes, got {}", FRAME_LEN, data.len()),
        })?;

        if bytes[0] != FRAME_PREAMBLE {
            return Err(GoveeError::InvalidFrame {
                reason: format!("bad preamble 0x{:02x}", bytes[0]),
            });
        }

        let expected = checksum(&bytes[..FRAME_LEN - 1]);
        if bytes[FRAME_LEN - 1] != expected {
            return Err(GoveeError::InvalidFrame {
                reason: format!(
                    "checksum mismatch: expected 0x{:02x}, got 0x{:02x}",
                    expected,
                    bytes[FRAME_LEN - 1]
                ),
            });
        }

        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; FRAME_LEN] {
        &self.0
    }

    pub fn command(&self) -> u8 {
        self.0[1]
    }

    /// Payload region including zero padding
    pub fn payload(&self) -> &[u8] {
        &self.0[2..FRAME_LEN - 1]
    }

    pub fn checksum(&self) -> u8 {
        self.0[FRAME_LEN - 1]
    }
}

impl AsRef<[u8]> for Frame {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Frame({})", hex::encode(self.0))
    }
}

/// XOR of all bytes
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |acc, b| acc ^ b)
}

// ----------------------------------------------------------------------------
// Command Encoders
// ----------------------------------------------------------------------------

pub fn encode_power_frame(on: bool) -> Frame {
    Frame::build(commands::POWER, &[u8::from(on)])
}

/// Brightness percent scaled to 0..=255, rounding half up (50% -> 0x80)
pub fn encode_brightness_frame(percent: u8) -> Result<Frame> {
    let level = brightness_level(percent)?;
    Ok(Frame::build(commands::BRIGHTNESS, &[level]))
}

pub fn encode_color_frame(red: u8, green: u8, blue: u8) -> Frame {
    Frame::build(
        commands::COLOR,
        &[commands::COLOR_MODE_MANUAL, red, green, blue],
    )
}

/// Device brightness level for a percentage
pub fn brightness_level(percent: u8) -> Result<u8> {
    if percent > 100 {
        return Err(GoveeError::InvalidBrightness {
            value: percent.into(),
        });
    }
    Ok(((u32::from(percent) * 255 + 50) / 100) as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_frame_literal() {
        let frame = encode_color_frame(255, 0, 0);
        let mut expected = [0u8; FRAME_LEN];
        expected[..4].copy_from_slice(&[0x33, 0x05, 0x02, 0xff]);
        expected[19] = 0x33 ^ 0x05 ^ 0x02 ^ 0xff;
        assert_eq!(frame.as_bytes(), &expected);
        assert_eq!(frame.checksum(), 0xcb);
    }

    #[test]
    fn test_power_frames() {
        let on = encode_power_frame(true);
        assert_eq!(&on.as_bytes()[..3], &[0x33, 0x01, 0x01]);
        assert_eq!(on.checksum(), 0x33);

        let off = encode_power_frame(false);
        assert_eq!(&off.as_bytes()[..3], &[0x33, 0x01, 0x00]);
        assert_eq!(off.checksum(), 0x32);
    }

    #[test]
    fn test_brightness_boundaries() {
        assert_eq!(encode_brightness_frame(0).unwrap().payload()[0], 0x00);
        assert_eq!(encode_brightness_frame(100).unwrap().payload()[0], 0xff);
        assert_eq!(encode_brightness_frame(50).unwrap().payload()[0], 0x80);
        assert_eq!(brightness_level(1).unwrap(), 3);
    }

    #[test]
    fn test_brightness_out_of_range() {
        assert!(matches!(
            encode_brightness_frame(101),
            Err(GoveeError::InvalidBrightness { value: 101 })
        ));
    }

    #[test]
    fn test_command_code_masked() {
        let frame = Frame::encode(0x1_05, &[]).unwrap();
        assert_eq!(frame.command(), 0x05);
    }

    #[test]
    fn test_payload_too_long() {
        assert!(Frame::encode(0x01, &[0u8; MAX_PAYLOAD_LEN]).is_ok());
        assert!(matches!(
            Frame::encode(0x01, &[0u8; MAX_PAYLOAD_LEN + 1]),
            Err(GoveeError::PayloadTooLong { len: 18, max: 17 })
        ));
    }

    #[test]
    fn test_decode_validation() {
        let frame = encode_color_frame(1, 2, 3);
        assert_eq!(Frame::decode(frame.as_ref()).unwrap(), frame);

        let mut corrupted = *frame.as_bytes();
        corrupted[5] ^= 0x10;
        assert!(Frame::decode(&corrupted).is_err());

        assert!(Frame::decode(&frame.as_bytes()[..19]).is_err());

        let mut bad_preamble = *frame.as_bytes();
        bad_preamble[0] = 0xaa;
        bad_preamble[19] ^= 0x33 ^ 0xaa;
        assert!(Frame::decode(&bad_preamble).is_err());
    }

    #[test]
    fn test_color_channel_validation() {
        assert_eq!(
            Color::try_from_channels(0, 128, 255).unwrap(),
            Color::new(0, 128, 255)
        );
        assert!(matches!(
            Color::try_from_channels(256, 0, 0),
            Err(GoveeError::InvalidColorChannel { channel: "red", value: 256 })
        ));
        assert!(matches!(
            Color::try_from_channels(0, 0, -1),
            Err(GoveeError::InvalidColorChannel { channel: "blue", value: -1 })
        ));
    }

    #[test]
    fn test_command_encode_matches_helpers() {
        assert_eq!(Command::Power(true).encode().unwrap(), encode_power_frame(true));
        assert_eq!(
            Command::Color(Color::new(9, 8, 7)).encode().unwrap(),
            encode_color_frame(9, 8, 7)
        );
        assert!(Command::Brightness(150).encode().is_err());
        assert_eq!(Command::Brightness(10).code(), commands::BRIGHTNESS);
    }
}
