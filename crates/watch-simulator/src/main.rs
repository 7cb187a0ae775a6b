//! Runs the demo watch face on the desktop.
//!
//! Headless by default: runs `WATCH_SIM_TICKS` update ticks, pressing the
//! keys from `WATCH_SIM_KEYS` one per tick, and optionally saves the final
//! panel as a PNG. Built with the `window` feature it opens an SDL window
//! instead.
//!
//! # Key bindings (window)
//!
//! | Key                | Button      |
//! |--------------------|-------------|
//! | Up / Down          | Up / Down   |
//! | Return / Space     | Center      |
//! | Backspace / Escape | Back        |
//! | U                  | Center+Up   |
//! | D                  | Center+Down |
//! | Q                  | Quit        |

use std::process::ExitCode;

use embedded_graphics::pixelcolor::Gray8;
use embedded_graphics::prelude::*;
use embedded_graphics_simulator::{OutputSettingsBuilder, SimulatorDisplay};
use log::{error, info};
use watch_sdk::{SCREEN_HEIGHT, SCREEN_WIDTH};

use watch_simulator::clock::SimClock;
use watch_simulator::files::FileStore;
use watch_simulator::host::HostState;
use watch_simulator::{SimConfig, Simulator};

/// Pixel scale factor for the simulator window.
#[cfg(feature = "window")]
const WINDOW_SCALE: u32 = 2;

fn main() -> ExitCode {
    env_logger::init();

    let config = match SimConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    let files = match FileStore::open(&config.root) {
        Ok(files) => files,
        Err(e) => {
            error!("cannot use {} as flash: {}", config.root.display(), e);
            return ExitCode::FAILURE;
        }
    };
    info!("Starting watch simulator, flash at {}", files.root().display());
    info!("Display: {}x{}", SCREEN_WIDTH, SCREEN_HEIGHT);

    let state = HostState::new(files, SimClock::from_system());
    let mut sim = match Simulator::boot(state, watch_demo::app_init) {
        Ok(sim) => sim,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut display = SimulatorDisplay::<Gray8>::new(Size::new(
        u32::from(SCREEN_WIDTH),
        u32::from(SCREEN_HEIGHT),
    ));
    let _ = display.clear(Gray8::WHITE);

    #[cfg(feature = "window")]
    run_window(&mut sim, &mut display, &config);
    #[cfg(not(feature = "window"))]
    run_headless(&mut sim, &mut display, &config);

    info!("Simulator exiting");
    ExitCode::SUCCESS
}

fn tick_ms(sim: &Simulator, config: &SimConfig) -> u32 {
    config.tick_ms.unwrap_or_else(|| sim.interval_ms()).max(1)
}

#[cfg_attr(feature = "window", allow(dead_code))]
fn run_headless(sim: &mut Simulator, display: &mut SimulatorDisplay<Gray8>, config: &SimConfig) {
    let mut keys = config.keys.iter().copied();

    for tick in 0..config.ticks {
        if let Some(key) = keys.next() {
            sim.press(key);
        }
        let update = sim.tick(tick_ms(sim, config));
        log::debug!("tick {}: {:?}", tick, update);
        let _ = sim.flush(display);

        if sim.exit_requested() {
            info!("application exited after {} ticks", tick + 1);
            break;
        }
    }

    if let Some(path) = &config.screenshot {
        let image = display.to_grayscale_output_image(&OutputSettingsBuilder::new().build());
        match image.save_png(path) {
            Ok(()) => info!("screenshot saved to {}", path.display()),
            Err(e) => error!("screenshot {}: {}", path.display(), e),
        }
    }
}

#[cfg(feature = "window")]
fn run_window(sim: &mut Simulator, display: &mut SimulatorDisplay<Gray8>, config: &SimConfig) {
    use std::time::{Duration, Instant};

    use embedded_graphics_simulator::{SimulatorEvent, Window, sdl2::Keycode};
    use watch_sdk::ButtonType;

    /// Target frame duration (~30 FPS).
    const FRAME_DURATION: Duration = Duration::from_millis(33);

    fn button(keycode: Keycode) -> Option<ButtonType> {
        match keycode {
            Keycode::Up => Some(ButtonType::Up),
            Keycode::Down => Some(ButtonType::Down),
            Keycode::Return | Keycode::Space => Some(ButtonType::Center),
            Keycode::Backspace | Keycode::Escape => Some(ButtonType::Back),
            Keycode::U => Some(ButtonType::CenterUp),
            Keycode::D => Some(ButtonType::CenterDown),
            _ => None,
        }
    }

    info!("Keys: arrows=Up/Down  Return=Center  Backspace=Back  U/D=Center+Up/Down  Q=Quit");

    let output_settings = OutputSettingsBuilder::new().scale(WINDOW_SCALE).build();
    let mut window = Window::new("Watch Simulator", &output_settings);

    // The SDL window is created on the first `update()`; `events()` panics
    // before that.
    let _ = sim.flush(display);
    window.update(display);

    let mut last_tick = Instant::now();

    'running: loop {
        let frame_start = Instant::now();

        for event in window.events() {
            match event {
                SimulatorEvent::Quit => break 'running,
                SimulatorEvent::KeyDown { keycode, repeat, .. } => {
                    if keycode == Keycode::Q {
                        break 'running;
                    }
                    if let Some(key) = button(keycode).filter(|_| !repeat) {
                        sim.press(key);
                    }
                }
                _ => {}
            }
        }

        let period = Duration::from_millis(tick_ms(sim, config).into());
        if last_tick.elapsed() >= period {
            let elapsed = last_tick.elapsed().as_millis().min(u128::from(u32::MAX)) as u32;
            last_tick = Instant::now();
            sim.tick(elapsed);
        }

        if sim.exit_requested() {
            info!("application exited");
            break 'running;
        }

        if let Err(e) = sim.flush(display) {
            error!("Draw error: {:?}", e);
        }
        window.update(display);

        let elapsed = frame_start.elapsed();
        if elapsed < FRAME_DURATION {
            std::thread::sleep(FRAME_DURATION - elapsed);
        }
    }
}
