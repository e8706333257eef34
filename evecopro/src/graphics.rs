//! Data types to represent geometry and colors for various graphics operations.

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct RGB {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct RGBA {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl RGB {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r: r, g: g, b: b }
    }

    pub const fn as_rgba(self) -> RGBA {
        RGBA {
            r: self.r,
            g: self.g,
            b: self.b,
            a: 0xff,
        }
    }

    /// The color packed as `0x00RRGGBB`, as used by both display list color
    /// commands and coprocessor widget color commands.
    pub const fn to_raw(self) -> u32 {
        (self.r as u32) << 16 | (self.g as u32) << 8 | (self.b as u32)
    }
}

impl RGBA {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self {
            r: r,
            g: g,
            b: b,
            a: a,
        }
    }

    pub const fn as_rgb(self) -> RGB {
        RGB {
            r: self.r,
            g: self.g,
            b: self.b,
        }
    }
}

impl From<RGBA> for RGB {
    fn from(src: RGBA) -> Self {
        src.as_rgb()
    }
}

impl From<RGB> for RGBA {
    fn from(src: RGB) -> Self {
        src.as_rgba()
    }
}

/// The position of a widget drawn by the coprocessor, in whole pixels.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct WidgetPos {
    pub x: i16,
    pub y: i16,
}

impl From<(i16, i16)> for WidgetPos {
    fn from(v: (i16, i16)) -> Self {
        Self { x: v.0, y: v.1 }
    }
}

/// The bounds of a widget drawn by the coprocessor, in whole pixels.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct WidgetRect {
    pub x: i16,
    pub y: i16,
    pub w: i16,
    pub h: i16,
}

impl WidgetRect {
    pub const fn new(x: i16, y: i16, w: i16, h: i16) -> Self {
        Self {
            x: x,
            y: y,
            w: w,
            h: h,
        }
    }
}

impl From<(i16, i16, i16, i16)> for WidgetRect {
    fn from(v: (i16, i16, i16, i16)) -> Self {
        Self::new(v.0, v.1, v.2, v.3)
    }
}
