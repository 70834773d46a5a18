//! AXP192 power management for the M5Stack Core2 / Tough.
//!
//! The panel, its backlight and the touch controller are powered through the
//! AXP192; nothing on the I2C bus answers until these rails are up. The
//! LCD reset line is wired to AXP192 GPIO4 rather than to the ESP32.

use embedded_hal::i2c::I2c;
use esp_idf_hal::delay::FreeRtos;

/// AXP192 I2C address.
pub const AXP192_ADDR: u8 = 0x34;

// Registers
const REG_POWER_OUTPUT: u8 = 0x12;
const REG_DCDC3_VOLTAGE: u8 = 0x27;
const REG_LDO23_VOLTAGE: u8 = 0x28;
const REG_GPIO4_CONTROL: u8 = 0x95;
const REG_GPIO34_STATE: u8 = 0x96;

// REG_POWER_OUTPUT bits
const DCDC1_ENABLE: u8 = 1 << 0;
const DCDC3_ENABLE: u8 = 1 << 1;
const LDO2_ENABLE: u8 = 1 << 2;

/// Brings up the display rails and pulses the LCD reset line.
pub fn init_display_power<I: I2c>(i2c: &mut I) -> Result<(), I::Error> {
    // LDO2 3.3 V (panel logic), LDO3 off
    write(i2c, REG_LDO23_VOLTAGE, 0xF0)?;
    // DCDC3 ~2.8 V drives the backlight: 700 mV + 25 mV * n
    write(i2c, REG_DCDC3_VOLTAGE, ((2800 - 700) / 25) as u8)?;

    let outputs = read(i2c, REG_POWER_OUTPUT)?;
    write(
        i2c,
        REG_POWER_OUTPUT,
        outputs | DCDC1_ENABLE | DCDC3_ENABLE | LDO2_ENABLE,
    )?;

    // GPIO4 as NMOS open-drain output, then low/high for reset
    let gpio4 = read(i2c, REG_GPIO4_CONTROL)?;
    write(i2c, REG_GPIO4_CONTROL, (gpio4 & 0x72) | 0x84)?;
    let state = read(i2c, REG_GPIO34_STATE)?;
    write(i2c, REG_GPIO34_STATE, state & !0x02)?;
    FreeRtos::delay_ms(100);
    write(i2c, REG_GPIO34_STATE, state | 0x02)?;
    FreeRtos::delay_ms(100);

    log::info!("[Power] Display rails up");
    Ok(())
}

fn read<I: I2c>(i2c: &mut I, reg: u8) -> Result<u8, I::Error> {
    let mut value = [0u8; 1];
    i2c.write_read(AXP192_ADDR, &[reg], &mut value)?;
    Ok(value[0])
}

fn write<I: I2c>(i2c: &mut I, reg: u8, value: u8) -> Result<(), I::Error> {
    i2c.write(AXP192_ADDR, &[reg, value])
}
