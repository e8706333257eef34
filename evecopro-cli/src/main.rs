// A small test bed for trying out the library crates in practice: it drives
// an FT81x-based panel through a SPIDriver adapter, shows two buttons, and
// logs whatever happens to them.

use evecopro::commands::options::{self, FontRef, Options, WidgetStyle};
use evecopro::commands::waiter::Waiter;
use evecopro::graphics::{WidgetRect, RGB};
use evecopro::interface::Interface;
use evecopro::interrupts::Interrupts;
use evecopro::models::Ft81x;
use evecopro::{Config, Device, Error, ErrorHandler, Pressable, WidgetId};
use evecopro_spidriver::SPIDriverInterface;
use serial_embedded_hal::{PortSettings, Serial};
use spidriver::SPIDriver;
use std::path::Path;
use std::time::{Duration, Instant};

static LOGGER: StderrLogger = StderrLogger;
struct StderrLogger;

impl log::Log for StderrLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record) {
        if self.enabled(record.metadata()) {
            eprintln!("[{:5}] {}: {}", record.level(), record.target(), record.args());
        }
    }

    fn flush(&self) {}
}

struct DemoButton {
    label: &'static str,
    pressed: bool,
    presses: u32,
}

impl DemoButton {
    fn new(label: &'static str) -> Self {
        Self {
            label: label,
            pressed: false,
            presses: 0,
        }
    }
}

impl Pressable for DemoButton {
    fn on_press(&mut self) {
        self.pressed = true;
        log::info!("{} pressed", self.label);
    }

    fn on_release(&mut self) {
        self.pressed = false;
        self.presses += 1;
        log::info!("{} released ({} so far)", self.label, self.presses);
    }
}

fn draw<I, W, H>(
    dev: &mut Device<Ft81x, I, W, H>,
    widgets: &[DemoButton],
) -> evecopro::commands::Result<(), Ft81x, I, W>
where
    I: Interface,
    W: Waiter<Ft81x, I>,
    H: ErrorHandler,
{
    dev.begin_session(RGB::new(0x10, 0x10, 0x20))?;
    dev.set_color(RGB::new(0xff, 0xff, 0xff))?;
    dev.text(
        (240_i16, 50_i16),
        FontRef::new_raw(29),
        options::Text::new().center(),
        "evecopro demo\nPress a button",
    )?;
    for (i, w) in widgets.iter().enumerate() {
        let style = if w.pressed {
            WidgetStyle::Flat
        } else {
            WidgetStyle::ThreeD
        };
        dev.button(
            Some(WidgetId(i)),
            WidgetRect::new(40 + (i as i16) * 220, 140, 180, 80),
            FontRef::new_raw(28),
            options::Button::new().style(style),
            w.label,
        )?;
    }
    dev.end_session()
}

fn main() {
    match log::set_logger(&LOGGER) {
        Ok(()) => log::set_max_level(log::LevelFilter::Debug),
        Err(err) => eprintln!("logging is unavailable: {}", err),
    }

    let port = std::env::args()
        .nth(1)
        .unwrap_or_else(|| String::from("/dev/ttyUSB0"));
    let serial = match Serial::new(
        Path::new(&port),
        &PortSettings {
            baud_rate: serial_embedded_hal::BaudRate::BaudOther(460800),
            char_size: serial_embedded_hal::CharSize::Bits8,
            parity: serial_embedded_hal::Parity::ParityNone,
            stop_bits: serial_embedded_hal::StopBits::Stop1,
            flow_control: serial_embedded_hal::FlowControl::FlowNone,
        },
    ) {
        Ok(serial) => serial,
        Err(err) => {
            log::error!("can't open {}: {:?}", port, err);
            std::process::exit(1);
        }
    };
    let (tx, rx) = serial.split();
    let mut sd = SPIDriver::new(tx, rx);
    if let Err(err) = sd.unselect() {
        log::error!("SPIDriver isn't responding: {:?}", err);
        std::process::exit(1);
    }

    let start = Instant::now();
    let clock = move || start.elapsed().as_millis() as u64;
    let config = Config::new();
    let mut dev: Device<Ft81x, _, _> =
        match Device::new_polling(SPIDriverInterface::new(sd), clock, &config) {
            Ok(dev) => dev,
            Err(err) => {
                log::error!("failed to start the coprocessor: {:?}", err);
                std::process::exit(1);
            }
        };
    if let Err(err) = dev.enable_interrupts(Interrupts::SERVICED) {
        log::warn!("failed to enable interrupts: {:?}", err);
    }

    let mut widgets = [DemoButton::new("Left"), DemoButton::new("Right")];
    let mut dirty = true;
    loop {
        let now = start.elapsed().as_millis() as u64;
        match dev.service(now) {
            Ok(_) => {}
            Err(Error::Fault) => {
                // The fault was already reported; start over with a clean
                // coprocessor.
                if let Err(err) = dev.reset() {
                    log::error!("reset after fault failed: {:?}", err);
                }
                dirty = true;
            }
            Err(Error::Halted) => {
                log::error!("device halted, giving up");
                std::process::exit(2);
            }
            Err(err) => log::warn!("servicing failed: {:?}", err),
        }

        dev.dispatch(&mut widgets[..], now);
        if dev.take_repaint_request() {
            dirty = true;
        }

        if dirty {
            let ready = dev.can_begin_session() || matches!(dev.poll_ready(), Ok(true));
            if ready {
                match draw(&mut dev, &widgets) {
                    Ok(()) => dirty = false,
                    // The ring was reset, so the next pass redraws from scratch.
                    Err(Error::DeviceReset) => {}
                    Err(Error::ReinitFailed) | Err(Error::Halted) => {
                        log::error!("device halted, giving up");
                        std::process::exit(2);
                    }
                    Err(err) => log::warn!("drawing failed: {:?}", err),
                }
            }
        }

        std::thread::sleep(Duration::from_millis(10));
    }
}
