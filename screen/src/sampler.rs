use crate::{Color, Coordinate, ScreenError};

/// Reads the color of a single screen pixel.
///
/// The classifier only ever talks to this trait, so tests can hand it synthetic
/// pixels instead of a real display.
pub trait PixelSampler {
    fn sample(&self, at: Coordinate) -> Result<Color, ScreenError>;
}

impl<T> PixelSampler for &T
where
    T: PixelSampler + ?Sized,
{
    fn sample(&self, at: Coordinate) -> Result<Color, ScreenError> {
        (**self).sample(at)
    }
}

#[cfg(windows)]
pub use gdi::ScreenSampler;

#[cfg(windows)]
mod gdi {
    use windows::Win32::Foundation::HWND;
    use windows::Win32::Graphics::Gdi::{GetDC, GetPixel, ReleaseDC, HDC};

    use ow_integrations::Log;

    use crate::{Color, Coordinate, PixelSampler, ScreenError};

    /// `GetPixel` returns this when the point is outside the clipping region.
    const CLR_INVALID: u32 = 0xFFFF_FFFF;

    /// Samples the whole virtual screen through a GDI device context.
    ///
    /// The context is acquired once and released on drop.
    #[derive(Debug)]
    pub struct ScreenSampler {
        dc: HDC,
    }

    impl ScreenSampler {
        pub fn new() -> Result<Self, ScreenError> {
            // A null window handle asks for the device context of the entire screen.
            let dc = unsafe { GetDC(HWND(0)) };

            if dc.is_invalid() {
                return Err(ScreenError::DeviceContext);
            }

            tracing::debug!(target: Log::Screen, "Acquired screen device context");

            Ok(Self { dc })
        }
    }

    impl PixelSampler for ScreenSampler {
        fn sample(&self, at: Coordinate) -> Result<Color, ScreenError> {
            let value = unsafe { GetPixel(self.dc, at.x, at.y) };

            if value.0 == CLR_INVALID {
                return Err(ScreenError::SampleFailed { x: at.x, y: at.y });
            }

            Ok(Color::from_colorref(value.0))
        }
    }

    impl Drop for ScreenSampler {
        fn drop(&mut self) {
            if unsafe { ReleaseDC(HWND(0), self.dc) } == 0 {
                tracing::warn!(target: Log::Screen, "Failed to release screen device context");
            }
        }
    }
}

#[cfg(not(windows))]
pub use unsupported::ScreenSampler;

#[cfg(not(windows))]
mod unsupported {
    use crate::{Color, Coordinate, PixelSampler, ScreenError};

    /// Placeholder for platforms without a screen reader; it can never be constructed.
    #[derive(Debug)]
    pub struct ScreenSampler {
        _private: (),
    }

    impl ScreenSampler {
        pub fn new() -> Result<Self, ScreenError> {
            Err(ScreenError::Unsupported)
        }
    }

    impl PixelSampler for ScreenSampler {
        fn sample(&self, at: Coordinate) -> Result<Color, ScreenError> {
            Err(ScreenError::SampleFailed { x: at.x, y: at.y })
        }
    }
}
