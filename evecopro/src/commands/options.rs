//! Various types used as arguments to coprocessor commands.

pub trait Options: Clone + Copy + PartialEq + Eq {
    fn new() -> Self;
}

pub fn defaults<T: Options>() -> T {
    T::new()
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Button(u32);

impl Options for Button {
    fn new() -> Self {
        Self(0)
    }
}

impl Button {
    pub const fn style(self, style: WidgetStyle) -> Self {
        const MASK: u32 = !OPT_FLAT;
        Self((self.0 & MASK) | style as u32)
    }

    /// Reduces the font size if the label would not otherwise fit. Only
    /// models from the BT815 onwards honor this.
    pub const fn fill(self) -> Self {
        Self(self.0 | OPT_FILL)
    }

    pub const fn to_raw(self) -> u32 {
        self.0
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Text(u32);

impl Options for Text {
    fn new() -> Self {
        Self(0)
    }
}

impl Text {
    pub const fn center_x(self) -> Self {
        Self(self.0 | OPT_CENTERX)
    }

    pub const fn center_y(self) -> Self {
        Self(self.0 | OPT_CENTERY)
    }

    pub const fn center(self) -> Self {
        Self(self.0 | OPT_CENTER)
    }

    pub const fn right_x(self) -> Self {
        Self(self.0 | OPT_RIGHTX)
    }

    pub const fn is_centered_y(self) -> bool {
        (self.0 & OPT_CENTERY) != 0
    }

    pub const fn to_raw(self) -> u32 {
        self.0
    }
}

/// Options for `CMD_KEYS`, which draws a row of keys each tagged with its
/// own ASCII code.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Keys(u32);

impl Options for Keys {
    fn new() -> Self {
        Self(0)
    }
}

impl Keys {
    pub const fn style(self, style: WidgetStyle) -> Self {
        const MASK: u32 = !OPT_FLAT;
        Self((self.0 & MASK) | style as u32)
    }

    pub const fn center(self) -> Self {
        Self(self.0 | OPT_CENTER)
    }

    /// Draws the key labelled with the given character in its pressed state.
    pub const fn pressed(self, key: u8) -> Self {
        Self((self.0 & !0xff) | key as u32)
    }

    pub const fn to_raw(self) -> u32 {
        self.0
    }
}

/// Rendering style (flat or 3D) for various widgets that can support these
/// two rendering styles.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[repr(u32)]
pub enum WidgetStyle {
    Flat = OPT_FLAT,
    ThreeD = 0,
}

/// A reference to a font handle, between zero and 31.
///
/// Handles 16 through 31 refer to the fonts built into the chip's ROM.
/// Handles zero through 14 can be assigned RAM fonts using
/// [`Device::load_font`](crate::Device::load_font).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FontRef(u8);

impl FontRef {
    const MASK: u8 = 0b00011111;

    /// The first of the built-in ROM fonts.
    pub const FIRST_ROM: u8 = 16;

    /// Takes the given value modulo 32 and uses it to construct a font
    /// reference.
    pub const fn new_raw(v: u8) -> Self {
        Self(v & Self::MASK)
    }

    /// Returns the raw representation of the font reference index. Although
    /// returned as a `u8`, the value is always less than 32.
    pub const fn to_raw(self) -> u8 {
        self.0
    }

    pub const fn is_rom(self) -> bool {
        self.0 >= Self::FIRST_ROM
    }
}

const OPT_FLAT: u32 = 256;
const OPT_CENTERX: u32 = 512;
const OPT_CENTERY: u32 = 1024;
const OPT_CENTER: u32 = OPT_CENTERX | OPT_CENTERY;
const OPT_RIGHTX: u32 = 2048;
const OPT_FILL: u32 = 8192;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text() {
        assert_eq!(Text::new().to_raw(), 0);
        assert_eq!(Text::new().center_x().to_raw(), 0x0200);
        assert_eq!(Text::new().center().to_raw(), 0x0600);
        assert_eq!(Text::new().right_x().center_y().to_raw(), 0x0c00);
        assert!(Text::new().center().is_centered_y());
        assert!(!Text::new().center_x().is_centered_y());
    }

    #[test]
    fn test_button() {
        let flat: Button = defaults::<Button>().style(WidgetStyle::Flat);
        assert_eq!(flat.to_raw(), 256);
        assert_eq!(flat.style(WidgetStyle::ThreeD).to_raw(), 0);
        assert_eq!(flat.fill().to_raw(), 0x2100);
    }

    #[test]
    fn test_keys() {
        let keys = Keys::new().center().pressed(b'a');
        assert_eq!(keys.to_raw(), 0x0661);
        assert_eq!(keys.pressed(b'b').to_raw(), 0x0662);
    }

    #[test]
    fn test_font_ref() {
        assert_eq!(FontRef::new_raw(33).to_raw(), 1);
        assert!(FontRef::new_raw(16).is_rom());
        assert!(!FontRef::new_raw(15).is_rom());
    }
}
