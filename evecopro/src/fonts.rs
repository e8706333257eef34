//! Bookkeeping for the 32 font handles.
//!
//! Handles 16 through 31 are the chip's built-in ROM fonts, which are always
//! available. Handles zero through 14 can be given custom fonts loaded into
//! main memory from a metrics blob. A custom font must be re-associated with
//! its handle in each display list that uses it, which happens lazily the
//! first time the font is drawn with in each session.

use crate::commands::waiter::Waiter;
use crate::commands::{Coprocessor, Result};
use crate::commands::options::FontRef;
use crate::display_list::options::{BitmapFormat, BitmapHandle, BitmapSizeFilter, BitmapWrapMode};
use crate::display_list::DLCmd;
use crate::error::Error;
use crate::interface::Interface;
use crate::models::Model;

/// The number of font handles.
pub const FONT_SLOTS: usize = 32;

/// The highest handle that can be given a custom font. Handle 15 is kept
/// for the coprocessor's own use.
pub const MAX_RAM_FONT: u8 = 14;

/// The smallest valid font blob: 128 character widths followed by five
/// 32-bit fields.
pub const METRICS_LEN: usize = 148;

// Offsets of the little-endian fields in a metrics blob. The bitmap data
// is addressed relative to the end of the width table.
const WIDTHS_LEN: u32 = 128;
const FORMAT_OFFSET: usize = 128;
const STRIDE_OFFSET: usize = 132;
const WIDTH_OFFSET: usize = 136;
const HEIGHT_OFFSET: usize = 140;

/// Line heights of the ROM fonts 16 through 31.
pub const ROM_FONT_HEIGHTS: [u16; 16] = [8, 8, 16, 16, 13, 17, 20, 22, 29, 38, 16, 20, 25, 28, 36, 49];

/// The reasons a font can't be loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontError {
    /// The handle is outside the range available for custom fonts.
    BadHandle,

    /// The blob is too short, misaligned, or its metrics are out of range.
    Malformed,

    /// The blob doesn't fit in main memory at the requested address.
    TooLarge,

    /// The font's first character isn't zero, which only `CMD_SETFONT2`
    /// can express.
    NeedsSetFont2,
}

impl<IErr, WErr> From<FontError> for Error<IErr, WErr> {
    fn from(err: FontError) -> Self {
        match err {
            FontError::BadHandle | FontError::Malformed => Error::InvalidArgument,
            FontError::TooLarge => Error::OutOfMemory,
            FontError::NeedsSetFont2 => Error::Unsupported,
        }
    }
}

/// The metrics of a custom font, as read from its blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RamFont {
    pub addr: u32,
    pub format: BitmapFormat,
    pub stride: u16,
    pub width: u16,
    pub height: u16,
    pub first_char: u8,
}

impl RamFont {
    /// Reads the metrics from a font blob that is to be stored at `addr` in
    /// main memory, checking that it fits within `ram_len` bytes.
    pub fn parse(addr: u32, blob: &[u8], first_char: u8, ram_len: u32) -> core::result::Result<Self, FontError> {
        if blob.len() < METRICS_LEN || (addr % 4) != 0 {
            return Err(FontError::Malformed);
        }
        let end = (addr as u64) + (blob.len() as u64);
        if end > ram_len as u64 {
            return Err(FontError::TooLarge);
        }

        let format = BitmapFormat::from_metrics(field(blob, FORMAT_OFFSET)).ok_or(FontError::Malformed)?;
        let stride = field(blob, STRIDE_OFFSET);
        let width = field(blob, WIDTH_OFFSET);
        let height = field(blob, HEIGHT_OFFSET);
        if stride > 0xfff || width > 2047 || height > 2047 || height == 0 {
            return Err(FontError::Malformed);
        }
        Ok(Self {
            addr: addr,
            format: format,
            stride: stride as u16,
            width: width as u16,
            height: height as u16,
            first_char: first_char,
        })
    }
}

fn field(blob: &[u8], offset: usize) -> u32 {
    let mut raw = [0_u8; 4];
    raw.copy_from_slice(&blob[offset..offset + 4]);
    u32::from_le_bytes(raw)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontSource {
    Unused,
    Rom,
    Ram(RamFont),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FontSlot {
    pub source: FontSource,
    pub height: u16,
    associated: bool,
}

impl FontSlot {
    const UNUSED: Self = Self {
        source: FontSource::Unused,
        height: 0,
        associated: false,
    };

    /// True if the font has already been associated with its handle in the
    /// current session. Always true for ROM fonts.
    pub fn is_associated(&self) -> bool {
        self.associated
    }
}

/// The state of all 32 font handles.
#[derive(Debug, Clone)]
pub struct FontTable {
    slots: [FontSlot; FONT_SLOTS],
}

impl FontTable {
    pub fn new() -> Self {
        let mut slots = [FontSlot::UNUSED; FONT_SLOTS];
        for (i, height) in ROM_FONT_HEIGHTS.iter().enumerate() {
            slots[FontRef::FIRST_ROM as usize + i] = FontSlot {
                source: FontSource::Rom,
                height: *height,
                associated: true,
            };
        }
        Self { slots: slots }
    }

    pub fn slot(&self, font: FontRef) -> &FontSlot {
        &self.slots[font.to_raw() as usize]
    }

    /// The line height of the given font, or `None` if nothing is loaded
    /// under its handle.
    pub fn height(&self, font: FontRef) -> Option<u16> {
        let slot = self.slot(font);
        match slot.source {
            FontSource::Unused => None,
            _ => Some(slot.height),
        }
    }

    /// Records a custom font under the given handle. The font will be
    /// associated the next time it's drawn with.
    pub fn install(&mut self, handle: u8, font: RamFont) -> core::result::Result<(), FontError> {
        if handle > MAX_RAM_FONT {
            return Err(FontError::BadHandle);
        }
        self.slots[handle as usize] = FontSlot {
            source: FontSource::Ram(font),
            height: font.height,
            associated: false,
        };
        Ok(())
    }

    /// Forgets which custom fonts were associated, so that each is
    /// associated again on its next use. Called at the start of each
    /// display list session and after a coprocessor reset.
    pub fn forget_associations(&mut self) {
        for slot in self.slots.iter_mut() {
            if let FontSource::Ram(_) = slot.source {
                slot.associated = false;
            }
        }
    }

    /// Makes sure the given font can be drawn with in the current session,
    /// appending the commands to associate it with its handle if needed.
    pub fn prepare<M, I, W>(&mut self, cp: &mut Coprocessor<M, I, W>, font: FontRef) -> Result<u16, M, I, W>
    where
        M: Model,
        I: Interface,
        W: Waiter<M, I>,
    {
        let slot = *self.slot(font);
        match slot.source {
            FontSource::Unused => {
                log::warn!("font {} is not loaded", font.to_raw());
                Err(Error::InvalidArgument)
            }
            FontSource::Rom => Ok(slot.height),
            FontSource::Ram(ram) => {
                if !slot.associated {
                    associate(cp, font.to_raw(), &ram)?;
                    self.slots[font.to_raw() as usize].associated = true;
                }
                Ok(slot.height)
            }
        }
    }
}

impl Default for FontTable {
    fn default() -> Self {
        Self::new()
    }
}

fn associate<M, I, W>(cp: &mut Coprocessor<M, I, W>, handle: u8, font: &RamFont) -> Result<(), M, I, W>
where
    M: Model,
    I: Interface,
    W: Waiter<M, I>,
{
    log::debug!("associating font {} at {:#08x}", handle, font.addr);
    cp.append_display_list(DLCmd::bitmap_handle(BitmapHandle::force_raw(handle)))?;
    cp.append_display_list(DLCmd::bitmap_source(font.addr + WIDTHS_LEN))?;
    cp.append_display_list(DLCmd::bitmap_layout(font.format, font.stride, font.height))?;
    if M::HAS_LARGE_BITMAPS && (font.stride > 1023 || font.height > 511) {
        cp.append_display_list(DLCmd::bitmap_layout_h(font.stride, font.height))?;
    }
    cp.append_display_list(DLCmd::bitmap_size(
        font.width,
        font.height,
        BitmapSizeFilter::Nearest,
        BitmapWrapMode::Border,
        BitmapWrapMode::Border,
    ))?;
    if M::HAS_LARGE_BITMAPS && (font.width > 511 || font.height > 511) {
        cp.append_display_list(DLCmd::bitmap_size_h(font.width, font.height))?;
    }
    if M::HAS_SETFONT2 {
        cp.set_font2(handle, font.addr, font.first_char)
    } else {
        cp.set_font(handle, font.addr)
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::commands::coprocessor::{CMD_SETFONT, CMD_SETFONT2};
    use crate::commands::waiter::PollingWaiter;
    use crate::interface::testing::{FakeChip, StepClock};
    use crate::models::{Ft80x, Ft81x};
    use std::vec::Vec;

    fn font_blob(format: u32, stride: u32, width: u32, height: u32) -> Vec<u8> {
        let mut blob = std::vec![0_u8; METRICS_LEN];
        blob[FORMAT_OFFSET..FORMAT_OFFSET + 4].copy_from_slice(&format.to_le_bytes());
        blob[STRIDE_OFFSET..STRIDE_OFFSET + 4].copy_from_slice(&stride.to_le_bytes());
        blob[WIDTH_OFFSET..WIDTH_OFFSET + 4].copy_from_slice(&width.to_le_bytes());
        blob[HEIGHT_OFFSET..HEIGHT_OFFSET + 4].copy_from_slice(&height.to_le_bytes());
        blob
    }

    fn test_cp<M: Model>() -> Coprocessor<M, FakeChip<M>, PollingWaiter<StepClock>> {
        let waiter = PollingWaiter::new(StepClock::new(10), 1000);
        let mut cp = Coprocessor::new(FakeChip::new(), waiter, None).unwrap();
        cp.borrow_interface().clear_calls();
        cp
    }

    #[test]
    fn test_rom_fonts() {
        let table = FontTable::new();
        assert_eq!(table.height(FontRef::new_raw(16)), Some(8));
        assert_eq!(table.height(FontRef::new_raw(28)), Some(25));
        assert_eq!(table.height(FontRef::new_raw(31)), Some(49));
        assert_eq!(table.height(FontRef::new_raw(0)), None);
        assert_eq!(table.height(FontRef::new_raw(15)), None);
    }

    #[test]
    fn test_parse() {
        let blob = font_blob(2, 9, 18, 25);
        let font = RamFont::parse(0x1000, &blob, 32, 1024 * 1024).unwrap();
        assert_eq!(
            font,
            RamFont {
                addr: 0x1000,
                format: BitmapFormat::L4,
                stride: 9,
                width: 18,
                height: 25,
                first_char: 32,
            }
        );
    }

    #[test]
    fn test_parse_rejects() {
        let blob = font_blob(2, 9, 18, 25);
        assert_eq!(
            RamFont::parse(0, &blob[..147], 0, 1024),
            Err(FontError::Malformed)
        );
        assert_eq!(RamFont::parse(2, &blob, 0, 1024), Err(FontError::Malformed));
        assert_eq!(RamFont::parse(1000, &blob, 0, 1024), Err(FontError::TooLarge));
        assert_eq!(
            RamFont::parse(0, &font_blob(8, 9, 18, 25), 0, 1024),
            Err(FontError::Malformed)
        );
        assert_eq!(
            RamFont::parse(0, &font_blob(2, 9, 18, 0), 0, 1024),
            Err(FontError::Malformed)
        );
    }

    #[test]
    fn test_install_reserved_handle() {
        let mut table = FontTable::new();
        let font = RamFont::parse(0, &font_blob(2, 9, 18, 25), 0, 1024).unwrap();
        assert_eq!(table.install(15, font), Err(FontError::BadHandle));
        assert_eq!(table.install(16, font), Err(FontError::BadHandle));
        assert_eq!(table.install(14, font), Ok(()));
    }

    #[test]
    fn test_prepare_associates_once() {
        let mut cp = test_cp::<Ft81x>();
        let mut table = FontTable::new();
        let font = RamFont::parse(0x1000, &font_blob(2, 9, 18, 25), 32, 1024 * 1024).unwrap();
        table.install(3, font).unwrap();

        let handle = FontRef::new_raw(3);
        assert_eq!(table.prepare(&mut cp, handle).unwrap(), 25);
        assert_eq!(table.prepare(&mut cp, handle).unwrap(), 25);
        assert_eq!(
            cp.borrow_interface().cmd_words(),
            [
                0x05000003, // BITMAP_HANDLE(3)
                0x01001080, // BITMAP_SOURCE(0x1080)
                0x07101219, // BITMAP_LAYOUT(L4, 9, 25)
                0x08002419, // BITMAP_SIZE(nearest, border, border, 18, 25)
                CMD_SETFONT2,
                3,
                0x1000,
                32,
            ]
        );

        table.forget_associations();
        cp.borrow_interface().clear_calls();
        table.prepare(&mut cp, handle).unwrap();
        assert_eq!(cp.borrow_interface().cmd_words().len(), 8);
    }

    #[test]
    fn test_prepare_rom_font_emits_nothing() {
        let mut cp = test_cp::<Ft81x>();
        let mut table = FontTable::new();
        assert_eq!(table.prepare(&mut cp, FontRef::new_raw(26)).unwrap(), 16);
        assert!(cp.borrow_interface().cmd_words().is_empty());
    }

    #[test]
    fn test_prepare_unloaded_font() {
        let mut cp = test_cp::<Ft81x>();
        let mut table = FontTable::new();
        match table.prepare(&mut cp, FontRef::new_raw(2)) {
            Err(Error::InvalidArgument) => {}
            other => panic!("unexpected result {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_prepare_gen1_uses_setfont() {
        let mut cp = test_cp::<Ft80x>();
        let mut table = FontTable::new();
        let font = RamFont::parse(0x1000, &font_blob(2, 9, 18, 25), 0, 256 * 1024).unwrap();
        table.install(1, font).unwrap();
        table.prepare(&mut cp, FontRef::new_raw(1)).unwrap();
        let words = cp.borrow_interface().cmd_words();
        assert_eq!(words[4..], [CMD_SETFONT, 1, 0x1000]);
    }

    #[test]
    fn test_prepare_large_font() {
        let mut cp = test_cp::<Ft81x>();
        let mut table = FontTable::new();
        let font = RamFont::parse(0, &font_blob(3, 1200, 1200, 600), 0, 1024 * 1024).unwrap();
        table.install(0, font).unwrap();
        table.prepare(&mut cp, FontRef::new_raw(0)).unwrap();
        let words = cp.borrow_interface().cmd_words();
        assert_eq!(words[3], 0x28000005);
        assert_eq!(words[5], 0x29000009);
    }
}
