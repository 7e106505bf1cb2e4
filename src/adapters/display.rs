//! SSD1306 128x64 OLED adapter.
//!
//! Implements [`DisplayPort`].  Each frame clears the buffer, draws up to
//! four text lines in a 6x10 font and flushes over I²C.
//!
//! - **`target_os = "espidf"`**: `ssd1306` in buffered graphics mode + `embedded-graphics`.
//! - **all other targets**: [`SimDisplay`] keeps every rendered frame.

use crate::app::ports::DisplayPort;
use crate::app::telemetry::DisplayFrame;
use crate::error::DisplayError;

/// Vertical distance between text baselines (px).
pub const LINE_PITCH: i32 = 12;
/// Baseline of the first line (px).
pub const FIRST_BASELINE: i32 = 10;

// ───────────────────────────────────────────────────────────────
// SSD1306 over I²C
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
mod oled {
    use embedded_graphics::{
        mono_font::{ascii::FONT_6X10, MonoTextStyle},
        pixelcolor::BinaryColor,
        prelude::*,
        text::Text,
    };
    use esp_idf_svc::hal::i2c::I2cDriver;
    use ssd1306::{mode::BufferedGraphicsMode, prelude::*, I2CDisplayInterface, Ssd1306};

    use super::{FIRST_BASELINE, LINE_PITCH};
    use crate::app::ports::DisplayPort;
    use crate::app::telemetry::DisplayFrame;
    use crate::error::DisplayError;

    type DisplayDriver = Ssd1306<
        I2CInterface<I2cDriver<'static>>,
        DisplaySize128x64,
        BufferedGraphicsMode<DisplaySize128x64>,
    >;

    pub struct OledDisplay {
        display: DisplayDriver,
    }

    impl OledDisplay {
        /// Initialise the controller and blank the panel.  Failure here is
        /// fatal for the node.
        pub fn new(i2c: I2cDriver<'static>) -> Result<Self, DisplayError> {
            let interface = I2CDisplayInterface::new(i2c);
            let mut display = Ssd1306::new(interface, DisplaySize128x64, DisplayRotation::Rotate0)
                .into_buffered_graphics_mode();
            display.init().map_err(|_| DisplayError::Bus)?;
            display.clear(BinaryColor::Off).map_err(|_| DisplayError::Bus)?;
            display.flush().map_err(|_| DisplayError::Bus)?;
            log::info!("OLED: SSD1306 ready at 0x{:02X}", crate::pins::OLED_I2C_ADDR);
            Ok(Self { display })
        }
    }

    impl DisplayPort for OledDisplay {
        fn render(&mut self, frame: &DisplayFrame) -> Result<(), DisplayError> {
            self.display.clear(BinaryColor::Off).map_err(|_| DisplayError::Bus)?;
            let style = MonoTextStyle::new(&FONT_6X10, BinaryColor::On);
            let mut y = FIRST_BASELINE;
            for line in frame.lines() {
                Text::new(line, Point::new(0, y), style)
                    .draw(&mut self.display)
                    .map_err(|_| DisplayError::Bus)?;
                y += LINE_PITCH;
            }
            self.display.flush().map_err(|_| DisplayError::Bus)
        }
    }
}

#[cfg(target_os = "espidf")]
pub use oled::OledDisplay;

// ───────────────────────────────────────────────────────────────
// Simulation display
// ───────────────────────────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
use std::sync::{Arc, Mutex, PoisonError};

#[cfg(not(target_os = "espidf"))]
#[derive(Default)]
struct SimDisplayState {
    frames: Vec<DisplayFrame>,
    failing: bool,
}

/// Frame-recording display.  Clones share the record.
#[cfg(not(target_os = "espidf"))]
#[derive(Clone, Default)]
pub struct SimDisplay {
    state: Arc<Mutex<SimDisplayState>>,
    echo: bool,
}

#[cfg(not(target_os = "espidf"))]
impl SimDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also log each frame (used by the host binary).
    pub fn echoing() -> Self {
        Self { echo: true, ..Self::default() }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SimDisplayState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn frames(&self) -> Vec<DisplayFrame> {
        self.lock().frames.clone()
    }

    pub fn last_frame(&self) -> Option<DisplayFrame> {
        self.lock().frames.last().cloned()
    }

    /// Make subsequent renders fail with a bus error.
    pub fn set_failing(&self, failing: bool) {
        self.lock().failing = failing;
    }
}

#[cfg(not(target_os = "espidf"))]
impl DisplayPort for SimDisplay {
    fn render(&mut self, frame: &DisplayFrame) -> Result<(), DisplayError> {
        let mut s = self.lock();
        if s.failing {
            return Err(DisplayError::Bus);
        }
        if self.echo {
            for (row, line) in frame.lines().enumerate() {
                log::info!("OLED(sim) y={:>2}: {}", FIRST_BASELINE + row as i32 * LINE_PITCH, line);
            }
        }
        s.frames.push(frame.clone());
        Ok(())
    }
}
