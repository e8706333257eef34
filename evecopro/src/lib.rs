//! Driver for the graphics coprocessor of Bridgetek/FTDI EVE display
//! controllers.
//!
//! The host builds each frame as a display list session on a
//! [`Device`](Device): it begins the session, draws text and widgets, and
//! ends the session to have the chip show the result. Underneath, the
//! [`Coprocessor`](commands::Coprocessor) streams the commands into the
//! chip's circular command ring without overrunning it, and recovers if
//! host and chip ever disagree about the ring's state.
//!
//! Touches come back as tag values, which the device turns into press,
//! release and key callbacks on the application's widgets.
//!
//! This crate doesn't talk to hardware itself. Implement
//! [`Interface`](Interface) for your bus, or use one of the `evecopro-*`
//! crates that do so for `embedded-hal` and for SPIDriver.
#![no_std]

pub mod clock;
pub mod commands;
pub mod config;
pub mod device;
pub mod dispatch;
pub mod display_list;
pub mod error;
pub mod fonts;
pub mod graphics;
pub mod interface;
pub mod interrupts;
pub mod low_level;
pub mod models;
pub mod strings;
pub mod tags;

pub use config::Config;
pub use device::Device;
pub use error::{DeviceErrorCode, Error, ErrorHandler};
pub use interface::Interface;
pub use tags::{Pressable, WidgetArena, WidgetId};

/// Converts a string literal into a [`Message`](strings::Message) at compile
/// time, rewriting the characters the built-in fonts keep at special code
/// points and rejecting literals that contain a null character.
///
/// ```
/// # use evecopro::eve_text;
/// let msg = eve_text!("25°C");
/// assert_eq!(msg.as_bytes(), b"25\x18C");
/// ```
pub use evecopro_macros::eve_text;
