use std::env;
use std::error::Error;

use clap::{Parser, Subcommand};

use crate::config::DeviceConfig;
use crate::drivers::blamcon::driver::Driver;
use crate::drivers::blamcon::event::{AxisEvent, Event};
use crate::drivers::blamcon::hid_report::{
    Color, LightgunState, PackedLedReport, PackedRecoilReport, PackedRumbleReport,
};
use crate::input::event::{InputEvent, FORMAT_HID, FORMAT_LGS};
use crate::input::gate::{handle_state_event, StateChangeSink};
use crate::input::processor::AbsolutePositionRemap;

mod config;
mod drivers;
mod input;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the lightgun hidraw device. Defaults to the first attached gun.
    #[arg(long)]
    device: Option<String>,

    /// Optional YAML device config with position-remap settings
    #[arg(long)]
    config: Option<String>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug, Clone)]
enum Commands {
    /// Print decoded input events as they arrive
    Listen {
        /// Route reports through the event gate and print canonical states
        /// instead of diffed events
        #[arg(long)]
        raw: bool,
    },
    /// Take or release application control of the feedback hardware
    EnableFfb {
        #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
        recoil: bool,
        #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
        rumble: bool,
        #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
        led: bool,
    },
    /// Pulse the vibration motor
    Rumble {
        #[arg(default_value_t = 1)]
        pulse: i32,
        /// Motor on period per cycle, in milliseconds
        #[arg(long, requires = "off")]
        on: Option<i32>,
        /// Motor off period per cycle, in milliseconds
        #[arg(long, requires = "on")]
        off: Option<i32>,
        /// Use the standalone rumble command instead of the combined report
        #[arg(long)]
        direct: bool,
    },
    /// Fire the recoil solenoid
    Recoil {
        #[arg(default_value_t = 1)]
        pulse: i32,
        /// Solenoid on period per cycle, in milliseconds
        #[arg(long, requires = "off")]
        on: Option<i32>,
        /// Solenoid off period per cycle, in milliseconds
        #[arg(long, requires = "on")]
        off: Option<i32>,
        /// Use the standalone recoil command instead of the combined report
        #[arg(long)]
        direct: bool,
    },
    /// Set an LED color
    Led {
        #[arg(default_value_t = 0)]
        index: i32,
        /// Normalized red channel
        r: f32,
        /// Normalized green channel
        g: f32,
        /// Normalized blue channel
        b: f32,
        /// Number of flashes to execute
        #[arg(long)]
        flash: Option<i32>,
        /// Flash on period per cycle, in milliseconds
        #[arg(long, requires = "flash", requires = "off")]
        on: Option<i32>,
        /// Flash off period per cycle, in milliseconds
        #[arg(long, requires = "flash", requires = "on")]
        off: Option<i32>,
        /// Use the standalone LED command instead of the combined report
        #[arg(long)]
        direct: bool,
    },
}

fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let log_level = match env::var("LOG_LEVEL") {
        Ok(value) => value,
        Err(_) => "info".to_string(),
    };
    env::set_var("RUST_LOG", log_level);
    env_logger::init();
    const VERSION: &str = env!("CARGO_PKG_VERSION");
    log::info!("Starting lightgun-hid v{}", VERSION);

    let args = Args::parse();

    let remap = match args.config {
        Some(path) => {
            let config = DeviceConfig::from_yaml_file(path)?;
            AbsolutePositionRemap::from(&config.remap)
        }
        None => AbsolutePositionRemap::default(),
    };

    let mut driver = match args.device {
        Some(path) => Driver::new(path)?,
        None => Driver::open_first()?,
    };

    match args.cmd {
        Commands::Listen { raw } => {
            if raw {
                listen_raw(&mut driver)?;
            } else {
                listen(&mut driver, &remap)?;
            }
        }
        Commands::EnableFfb {
            recoil,
            rumble,
            led,
        } => {
            driver.enable_ffb_control(recoil, rumble, led);
        }
        Commands::Rumble {
            pulse,
            on,
            off,
            direct,
        } => {
            match (direct, on, off) {
                (true, Some(on), Some(off)) => {
                    driver.send_command(PackedRumbleReport::with_periods(pulse, on, off))
                }
                (true, _, _) => driver.send_rumble_command(pulse),
                (false, Some(on), Some(off)) => driver.rumble_timed(pulse, on, off),
                (false, _, _) => driver.rumble(pulse),
            };
        }
        Commands::Recoil {
            pulse,
            on,
            off,
            direct,
        } => {
            match (direct, on, off) {
                (true, Some(on), Some(off)) => {
                    driver.send_command(PackedRecoilReport::with_periods(pulse, on, off))
                }
                (true, _, _) => driver.send_recoil_command(pulse),
                (false, Some(on), Some(off)) => driver.recoil_timed(pulse, on, off),
                (false, _, _) => driver.recoil(pulse),
            };
        }
        Commands::Led {
            index,
            r,
            g,
            b,
            flash,
            on,
            off,
            direct,
        } => {
            let color = Color::new(r, g, b);
            match (direct, flash, on, off) {
                (true, Some(flash), Some(on), Some(off)) => driver.send_command(
                    PackedLedReport::with_flash_periods(index, color, flash, on, off),
                ),
                (true, Some(flash), _, _) => {
                    driver.send_command(PackedLedReport::with_flash(index, color, flash))
                }
                (true, None, _, _) => driver.send_led_command(index, color),
                (false, Some(flash), Some(on), Some(off)) => {
                    driver.set_led_flash_timed(index, color, flash, on, off)
                }
                (false, Some(flash), _, _) => driver.set_led_flash(index, color, flash),
                (false, None, _, _) => driver.set_led(index, color),
            };
        }
    }

    Ok(())
}

/// Poll the driver and print diffed input events, with aim positions mapped
/// through the configured remap stage.
fn listen(
    driver: &mut Driver<hidapi::HidDevice>,
    remap: &AbsolutePositionRemap,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    loop {
        for event in driver.poll()? {
            match event {
                Event::Axis(AxisEvent::Aim(input)) => {
                    let (x, y) = remap.process(input.x, input.y);
                    log::info!("Aim: raw ({}, {}) -> ({x}, {y})", input.x, input.y);
                }
                event => log::info!("{event:?}"),
            }
        }
    }
}

/// Route raw reports through the event pre-processing gate and print every
/// canonical state that survives it.
fn listen_raw(driver: &mut Driver<hidapi::HidDevice>) -> Result<(), Box<dyn Error + Send + Sync>> {
    struct LogSink;
    impl StateChangeSink for LogSink {
        fn change(&mut self, event: &InputEvent) {
            if event.format != FORMAT_LGS {
                log::info!("Forwarded event in format {}", event.format);
                return;
            }
            let Ok(buf) = event.payload.as_slice().try_into() else {
                return;
            };
            let state = LightgunState::unpack(buf);
            log::info!("{state:?}");
        }
    }

    let mut sink = LogSink;
    loop {
        let (bytes_read, buf) = driver.poll_raw()?;
        let mut event = InputEvent::state(FORMAT_HID, buf[..bytes_read].to_vec());
        handle_state_event(&mut event, &mut sink);
    }
}
