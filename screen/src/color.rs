/// A screen pixel position, in physical pixels from the top-left corner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Coordinate {
    pub x: i32,
    pub y: i32,
}

impl Coordinate {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// An RGB triple as sampled from the screen.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Unpacks a GDI `COLORREF`, which stores channels as `0x00BBGGRR`.
    pub const fn from_colorref(value: u32) -> Self {
        Self {
            r: (value & 0xff) as u8,
            g: ((value >> 8) & 0xff) as u8,
            b: ((value >> 16) & 0xff) as u8,
        }
    }

    fn channels(&self) -> [i32; 3] {
        [self.r as i32, self.g as i32, self.b as i32]
    }
}

/// The predicate a detector rule applies to each sampled pixel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorMatcher {
    /// Every channel must sit strictly inside `(reference - tolerance, reference + tolerance)`.
    Reference { color: Color, tolerance: u8 },

    /// Every channel must be within `tolerance` of the brightest channel, i.e. some shade of
    /// grey regardless of brightness.
    Greyscale { tolerance: u8 },
}

impl ColorMatcher {
    pub fn matches(&self, sample: Color) -> bool {
        match *self {
            Self::Reference { color, tolerance } => {
                let distance = tolerance as i32;

                sample
                    .channels()
                    .iter()
                    .zip(color.channels().iter())
                    .all(|(value, reference)| reference - distance < *value && *value < reference + distance)
            },

            Self::Greyscale { tolerance } => {
                let channels = sample.channels();
                let greatest = channels.iter().copied().max().unwrap_or(0);
                let (lo, hi) = (greatest - tolerance as i32, greatest + tolerance as i32);

                channels.iter().all(|value| lo <= *value && *value <= hi)
            },
        }
    }
}
