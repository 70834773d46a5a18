//! FT6336U capacitive touch controller.
//!
//! The controller sits on the internal I2C bus at 0x38 and reports up to
//! two points; only the first one is used.

use crate::traits::{TouchInput, TouchPoint};
use embedded_hal::i2c::I2c;

/// FT6336U I2C address.
pub const FT6336_ADDR: u8 = 0x38;

const REG_TD_STATUS: u8 = 0x02;

/// Touch panel reader over any embedded-hal I2C bus.
pub struct Esp32Touch<I> {
    i2c: I,
}

impl<I: I2c> Esp32Touch<I> {
    /// Takes ownership of the internal I2C bus.
    pub fn new(i2c: I) -> Self {
        Self { i2c }
    }
}

impl<I: I2c> TouchInput for Esp32Touch<I> {
    type Error = I::Error;

    fn read(&mut self) -> Result<Option<TouchPoint>, Self::Error> {
        // TD_STATUS, then P1_XH, P1_XL, P1_YH, P1_YL
        let mut data = [0u8; 5];
        self.i2c.write_read(FT6336_ADDR, &[REG_TD_STATUS], &mut data)?;

        let points = data[0] & 0x0F;
        if points == 0 || points > 2 {
            return Ok(None);
        }

        let x = (i32::from(data[1] & 0x0F) << 8) | i32::from(data[2]);
        let y = (i32::from(data[3] & 0x0F) << 8) | i32::from(data[4]);
        Ok(Some(TouchPoint::new(x, y)))
    }
}
