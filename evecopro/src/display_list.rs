//! Representations of display list commands.
//!
//! The coprocessor copies any word in its command stream that isn't a
//! coprocessor command straight into the display list, so these are
//! appended through the same ring as everything else.

pub mod options;

use crate::graphics::RGB;
use core::fmt::Debug;

/// Represents an EVE display list command.
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct DLCmd(u32);

impl DLCmd {
    // The length of a display list command as stored in the EVE device's
    // display list RAM.
    pub const LENGTH: u32 = 4;

    pub const DISPLAY: Self = OpCode::DISPLAY.build(0);
    pub const CLEAR_ALL: Self = Self::clear(true, true, true);

    /// Creates a command from the raw command word given as a `u32`. It's
    /// the caller's responsibility to ensure that it's a valid encoding of
    /// a real display list command.
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn as_raw(&self) -> u32 {
        self.0
    }

    pub const fn bitmap_handle(bmp: options::BitmapHandle) -> Self {
        OpCode::BITMAP_HANDLE.build(bmp.0 as u32)
    }

    pub const fn bitmap_source(addr: u32) -> Self {
        OpCode::BITMAP_SOURCE.build(addr & 0x3fffff)
    }

    pub const fn bitmap_layout(
        format: options::BitmapFormat,
        line_stride: u16,
        height: u16,
    ) -> Self {
        OpCode::BITMAP_LAYOUT.build(
            (format as u32) << 19
                | (line_stride as u32 & 0b1111111111) << 9
                | (height as u32 & 0b111111111),
        )
    }

    /// The high bits of the line stride and height given to the most recent
    /// `bitmap_layout`, for bitmaps too large for that command alone. Only
    /// models from the FT81x onwards understand this.
    pub const fn bitmap_layout_h(line_stride: u16, height: u16) -> Self {
        OpCode::BITMAP_LAYOUT_H.build(
            ((line_stride >> 10) as u32 & 0b11) << 2 | ((height >> 9) as u32 & 0b11),
        )
    }

    const fn physical_bitmap_size(width: u16, height: u16) -> (u16, u16) {
        (
            if width < 2048 { width } else { 0 },
            if height < 2048 { height } else { 0 },
        )
    }

    pub const fn bitmap_size(
        width: u16,
        height: u16,
        filter: options::BitmapSizeFilter,
        wrap_x: options::BitmapWrapMode,
        wrap_y: options::BitmapWrapMode,
    ) -> Self {
        let (p_width, p_height) = Self::physical_bitmap_size(width, height);
        OpCode::BITMAP_SIZE.build(
            (filter as u32) << 20
                | (wrap_x as u32) << 19
                | (wrap_y as u32) << 18
                | (p_width as u32 & 0b111111111) << 9
                | (p_height as u32 & 0b111111111),
        )
    }

    /// The high bits of the size given to the most recent `bitmap_size`.
    /// Only models from the FT81x onwards understand this.
    pub const fn bitmap_size_h(width: u16, height: u16) -> Self {
        let (p_width, p_height) = Self::physical_bitmap_size(width, height);
        OpCode::BITMAP_SIZE_H.build(
            ((p_width >> 9) as u32 & 0b11) << 2 | ((p_height >> 9) as u32 & 0b11),
        )
    }

    pub const fn clear(color: bool, stencil: bool, tag: bool) -> Self {
        OpCode::CLEAR.build(
            if color { 0b100 } else { 0b000 }
                | if stencil { 0b010 } else { 0b000 }
                | if tag { 0b001 } else { 0b000 },
        )
    }

    pub const fn clear_color_rgb(color: RGB) -> Self {
        OpCode::CLEAR_COLOR_RGB.build(color.to_raw())
    }

    pub const fn clear_color_alpha(alpha: u8) -> Self {
        OpCode::CLEAR_COLOR_A.build(alpha as u32)
    }

    pub const fn color_rgb(color: RGB) -> Self {
        OpCode::COLOR_RGB.build(color.to_raw())
    }

    pub const fn color_alpha(alpha: u8) -> Self {
        OpCode::COLOR_A.build(alpha as u32)
    }

    pub const fn display() -> Self {
        Self::DISPLAY
    }

    /// Attaches the given tag value to everything drawn afterwards.
    pub const fn tag(tag: u8) -> Self {
        OpCode::TAG.build(tag as u32)
    }

    /// Controls whether drawing updates the tag buffer.
    pub const fn tag_mask(update: bool) -> Self {
        OpCode::TAG_MASK.build(if update { 1 } else { 0 })
    }

    pub const fn vertex_format(precision: options::PixelPrecision) -> Self {
        OpCode::VERTEX_FORMAT.build(precision as u32)
    }
}

/// Trait implemented by objects that can append display list commands to
/// a display list.
///
/// Implementers usually implement only `append_raw_command`, and take the
/// default implementations of all of the other methods.
pub trait Builder {
    type Error;

    fn append_raw_command(&mut self, raw: u32) -> Result<(), Self::Error>;

    fn append_command(&mut self, cmd: DLCmd) -> Result<(), Self::Error> {
        self.append_raw_command(cmd.as_raw())
    }

    fn clear(&mut self, color: bool, stencil: bool, tag: bool) -> Result<(), Self::Error> {
        self.append_command(DLCmd::clear(color, stencil, tag))
    }

    fn clear_all(&mut self) -> Result<(), Self::Error> {
        self.append_command(DLCmd::CLEAR_ALL)
    }

    fn clear_color_rgb(&mut self, color: RGB) -> Result<(), Self::Error> {
        self.append_command(DLCmd::clear_color_rgb(color))
    }

    fn color_rgb(&mut self, color: RGB) -> Result<(), Self::Error> {
        self.append_command(DLCmd::color_rgb(color))
    }

    fn color_alpha(&mut self, alpha: u8) -> Result<(), Self::Error> {
        self.append_command(DLCmd::color_alpha(alpha))
    }

    fn display(&mut self) -> Result<(), Self::Error> {
        self.append_command(DLCmd::DISPLAY)
    }

    fn tag(&mut self, tag: u8) -> Result<(), Self::Error> {
        self.append_command(DLCmd::tag(tag))
    }
}

/// Each command is encoded as a four-byte value. Converting to `u32` returns
/// the raw encoding of the command, as it would be written into display
/// list memory (endianness notwithstanding).
impl From<DLCmd> for u32 {
    fn from(cmd: DLCmd) -> u32 {
        cmd.0
    }
}

impl Debug for DLCmd {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "DLCmd({:#010x})", self.0)
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
#[allow(non_camel_case_types)]
enum OpCode {
    BITMAP_HANDLE = 0x05,
    BITMAP_LAYOUT = 0x07,
    BITMAP_LAYOUT_H = 0x28,
    BITMAP_SIZE = 0x08,
    BITMAP_SIZE_H = 0x29,
    BITMAP_SOURCE = 0x01,
    CLEAR = 0x26,
    CLEAR_COLOR_RGB = 0x02,
    CLEAR_COLOR_A = 0x0F,
    COLOR_A = 0x10,
    COLOR_RGB = 0x04,
    DISPLAY = 0x00,
    TAG = 0x03,
    TAG_MASK = 0x14,
    VERTEX_FORMAT = 0x27,
}

impl OpCode {
    const fn shift(self) -> u32 {
        (self as u32) << 24
    }

    const fn build(self, v: u32) -> DLCmd {
        DLCmd::from_raw(self.shift() | v)
    }
}
