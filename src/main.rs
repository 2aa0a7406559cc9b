use std::error::Error;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use pwm_led::{Config, Controller, Strategy};

fn usage() -> ! {
    eprintln!("Usage: pwm-led [hardware|software|binary]");
    std::process::exit(2);
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let strategy = match std::env::args().nth(1).as_deref() {
        None | Some("hardware") => Strategy::HardwarePwm,
        Some("software") => Strategy::SoftwarePwm,
        Some("binary") => Strategy::DirectBinary,
        Some(_) => usage(),
    };

    let config = Config::new(strategy).clamped();
    log::info!("Starting PWM LED dimmer ({strategy:?})");
    log::info!("  Button up:   GPIO {}", config.button_up_pin);
    log::info!("  Button down: GPIO {}", config.button_down_pin);
    log::info!("  LED:         GPIO {}", config.led_pin);
    log::info!("  Max level:   {}", config.max_level);

    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })?;

    let mut controller = Controller::new(config)?;
    log::info!("Ready; press the buttons to adjust brightness");

    let mut last_level = controller.level();
    while running.load(Ordering::SeqCst) {
        thread::sleep(Duration::from_millis(100));

        let level = controller.level();
        if level != last_level {
            log::info!("Brightness {level} ({:?})", controller.led_state());
            last_level = level;
        }
    }

    log::info!("Shutting down");
    controller.shutdown();
    Ok(())
}
