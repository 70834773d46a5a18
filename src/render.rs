//! embedded-graphics renderer for the 320x240 status screen.
//!
//! [`GraphicsDisplay`] implements [`StatusDisplay`] on any RGB565
//! [`DrawTarget`], so the same drawing code runs on the ILI9342C panel and
//! on an in-memory framebuffer in tests.
//!
//! # Screen Layout
//!
//! ```text
//! ┌──────────────────────────────────────┐
//! │     ┌──────────────────────────┐     │
//! │     │  SmartEVSE LCD, 2x       │     │  y 0..128
//! │     └──────────────────────────┘     │
//! │  ┌────────────┐    ┌────────────┐    │
//! │  │   Solar    │    │   Smart    │    │  y 128..184
//! │  └────────────┘    └────────────┘    │
//! │  ● WIFI  ● EVSE  Mode:Smart          │  y 204..240
//! │  Error: None                         │
//! └──────────────────────────────────────┘
//! ```

use core::fmt::Debug;

use embedded_graphics::{
    mono_font::{
        ascii::{FONT_6X10, FONT_10X20},
        MonoTextStyle,
    },
    pixelcolor::Rgb565,
    prelude::*,
    primitives::{Circle, PrimitiveStyle, PrimitiveStyleBuilder, Rectangle, RoundedRectangle},
    text::{Alignment, Baseline, Text, TextStyleBuilder},
};

use crate::bitmap::LcdFrame;
use crate::discovery::PeerHost;
use crate::onboarding::OnboardingScreen;
use crate::picker::DevicePicker;
use crate::reconciler::{
    ButtonLayout, Rect, StatusBar, LCD_AREA, SELECT_BUTTON, SMART_BUTTON, SOLAR_BUTTON,
    STATUS_AREA,
};
use crate::state::ChargeMode;
use crate::traits::StatusDisplay;

const BACKGROUND: Rgb565 = Rgb565::BLACK;
const FOREGROUND: Rgb565 = Rgb565::WHITE;
const ACCENT: Rgb565 = Rgb565::new(0, 50, 8);
const GOOD: Rgb565 = Rgb565::GREEN;
const BAD: Rgb565 = Rgb565::RED;
const BUTTON_FILL: Rgb565 = Rgb565::new(4, 8, 4);

/// Area of the status screen that holds the buttons.
const BUTTON_BAND: Rect = Rect::new(0, 128, 320, 76);

/// Largest edge of the onboarding join code, in pixels.
const JOIN_CODE_MAX_PX: u32 = 116;

fn rect(r: Rect) -> Rectangle {
    Rectangle::new(Point::new(r.x, r.y), Size::new(r.width as u32, r.height as u32))
}

/// [`StatusDisplay`] on top of an embedded-graphics draw target.
pub struct GraphicsDisplay<D> {
    target: D,
}

impl<D> GraphicsDisplay<D>
where
    D: DrawTarget<Color = Rgb565>,
    D::Error: Debug,
{
    /// Wraps a draw target.
    pub fn new(target: D) -> Self {
        Self { target }
    }

    /// The wrapped draw target.
    pub fn target(&self) -> &D {
        &self.target
    }

    /// Unwraps the draw target.
    pub fn into_inner(self) -> D {
        self.target
    }

    fn fill(&mut self, area: Rectangle, color: Rgb565) -> Result<(), D::Error> {
        area.into_styled(PrimitiveStyle::with_fill(color))
            .draw(&mut self.target)
    }

    fn text(
        &mut self,
        s: &str,
        at: Point,
        style: MonoTextStyle<'_, Rgb565>,
        alignment: Alignment,
    ) -> Result<(), D::Error> {
        let layout = TextStyleBuilder::new()
            .alignment(alignment)
            .baseline(Baseline::Middle)
            .build();
        Text::with_text_style(s, at, style, layout).draw(&mut self.target)?;
        Ok(())
    }

    fn button(&mut self, area: Rect, label: &str, active: bool) -> Result<(), D::Error> {
        let style = PrimitiveStyleBuilder::new()
            .fill_color(BUTTON_FILL)
            .stroke_color(if active { ACCENT } else { BUTTON_FILL })
            .stroke_width(if active { 4 } else { 0 })
            .build();
        RoundedRectangle::with_equal_corners(rect(area), Size::new(8, 8))
            .into_styled(style)
            .draw(&mut self.target)?;

        let center = rect(area).center();
        self.text(
            label,
            center,
            MonoTextStyle::new(&FONT_10X20, FOREGROUND),
            Alignment::Center,
        )
    }

    fn indicator(&mut self, x: i32, y: i32, label: &str, on: bool) -> Result<(), D::Error> {
        Circle::new(Point::new(x, y - 5), 10)
            .into_styled(PrimitiveStyle::with_fill(if on { GOOD } else { BAD }))
            .draw(&mut self.target)?;
        self.text(
            label,
            Point::new(x + 14, y),
            MonoTextStyle::new(&FONT_6X10, FOREGROUND),
            Alignment::Left,
        )
    }
}

impl<D> StatusDisplay for GraphicsDisplay<D>
where
    D: DrawTarget<Color = Rgb565>,
    D::Error: Debug,
{
    type Error = D::Error;

    fn clear(&mut self) -> Result<(), Self::Error> {
        self.target.clear(BACKGROUND)
    }

    fn show_message(&mut self, line1: &str, line2: Option<&str>) -> Result<(), Self::Error> {
        self.clear()?;
        let style = MonoTextStyle::new(&FONT_10X20, FOREGROUND);
        self.text(line1, Point::new(160, 104), style, Alignment::Center)?;
        if let Some(line2) = line2 {
            self.text(line2, Point::new(160, 136), style, Alignment::Center)?;
        }
        Ok(())
    }

    fn draw_onboarding(&mut self, screen: &OnboardingScreen) -> Result<(), Self::Error> {
        self.clear()?;

        let style = MonoTextStyle::new(&FONT_6X10, FOREGROUND);
        for (i, line) in screen.lines().iter().enumerate() {
            let color_style = if i == 0 {
                MonoTextStyle::new(&FONT_10X20, ACCENT)
            } else {
                style
            };
            self.text(
                line,
                Point::new(8, 24 + i as i32 * 22),
                color_style,
                Alignment::Left,
            )?;
        }

        let Some(code) = screen.join_code.as_ref() else {
            return Ok(());
        };

        // Quiet zone of two modules on every side
        let modules = code.width() as u32 + 4;
        let scale = (JOIN_CODE_MAX_PX / modules).max(1);
        let edge = modules * scale;
        let origin = Point::new(320 - 8 - edge as i32, 240 - 8 - edge as i32);
        self.fill(Rectangle::new(origin, Size::new(edge, edge)), Rgb565::WHITE)?;

        for y in 0..code.width() {
            for x in 0..code.width() {
                if code.is_dark(x, y) {
                    let offset = Point::new(
                        ((x as u32 + 2) * scale) as i32,
                        ((y as u32 + 2) * scale) as i32,
                    );
                    let at = origin + offset;
                    self.fill(Rectangle::new(at, Size::new(scale, scale)), Rgb565::BLACK)?;
                }
            }
        }
        Ok(())
    }

    fn draw_buttons(&mut self, layout: ButtonLayout) -> Result<(), Self::Error> {
        self.fill(rect(BUTTON_BAND), BACKGROUND)?;
        match layout {
            ButtonLayout::ModePair { active } => {
                self.button(SOLAR_BUTTON, "Solar", active == ChargeMode::Solar)?;
                self.button(SMART_BUTTON, "Smart", active == ChargeMode::Smart)
            }
            ButtonLayout::SelectDevice => self.button(SELECT_BUTTON, "Select EVSE", false),
        }
    }

    fn draw_status_bar(&mut self, status: &StatusBar) -> Result<(), Self::Error> {
        self.fill(rect(STATUS_AREA), BACKGROUND)?;

        let top = STATUS_AREA.y + 10;
        self.indicator(8, top, "WIFI", status.wifi_connected)?;
        self.indicator(72, top, "EVSE", status.peer_connected)?;

        let style = MonoTextStyle::new(&FONT_6X10, FOREGROUND);
        self.text(&status.mode_text(), Point::new(140, top), style, Alignment::Left)?;

        let error_style = if status.error.is_some() {
            MonoTextStyle::new(&FONT_6X10, BAD)
        } else {
            style
        };
        self.text(
            &status.error_text(),
            Point::new(8, top + 16),
            error_style,
            Alignment::Left,
        )
    }

    fn draw_lcd(&mut self, frame: &LcdFrame) -> Result<(), Self::Error> {
        let area = rect(LCD_AREA);
        let (aw, ah) = (area.size.width, area.size.height);
        let pixels = (0..ah).flat_map(move |y| {
            (0..aw).map(move |x| {
                if frame.is_on(x / 2, y / 2) {
                    FOREGROUND
                } else {
                    BACKGROUND
                }
            })
        });
        self.target.fill_contiguous(&area, pixels)
    }

    fn draw_lcd_placeholder(&mut self) -> Result<(), Self::Error> {
        let area = rect(LCD_AREA);
        self.fill(area, BACKGROUND)?;
        let style = PrimitiveStyleBuilder::new()
            .stroke_color(BAD)
            .stroke_width(1)
            .build();
        area.into_styled(style).draw(&mut self.target)?;
        self.text(
            "No connection",
            area.center(),
            MonoTextStyle::new(&FONT_10X20, FOREGROUND),
            Alignment::Center,
        )
    }

    fn draw_picker(&mut self, hosts: &[PeerHost]) -> Result<(), Self::Error> {
        self.clear()?;
        let title = MonoTextStyle::new(&FONT_10X20, ACCENT);
        self.text("Select SmartEVSE", Point::new(160, 20), title, Alignment::Center)?;

        if hosts.is_empty() {
            let style = MonoTextStyle::new(&FONT_10X20, FOREGROUND);
            self.text("No SmartEVSE found", Point::new(160, 110), style, Alignment::Center)?;
            return self.text(
                "Tap to go back",
                Point::new(160, 140),
                MonoTextStyle::new(&FONT_6X10, FOREGROUND),
                Alignment::Center,
            );
        }

        for (i, host) in hosts.iter().enumerate() {
            let row = DevicePicker::row_rect(i);
            RoundedRectangle::with_equal_corners(rect(row), Size::new(6, 6))
                .into_styled(PrimitiveStyle::with_fill(BUTTON_FILL))
                .draw(&mut self.target)?;
            self.text(
                &host.label(),
                Point::new(row.x + 10, row.y + row.height / 2),
                MonoTextStyle::new(&FONT_6X10, FOREGROUND),
                Alignment::Left,
            )?;
        }
        Ok(())
    }
}
