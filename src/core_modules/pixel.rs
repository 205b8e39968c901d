// THEORY (1D Pixel Heuristics):
// The `Pixel` module is the most fundamental unit of the engine. It is a "dumb" data
// container for a single RGBA pixel plus the one heuristic the histogram needs: its
// grayscale intensity. Nothing here knows about neighbors, sectors, or the reference
// point; angular reasoning belongs to `sector_geometry`.
//
// Intensity is the plain average of the three color channels after normalizing them
// to [0, 1], scaled back to [0, 255] and floored. It is deliberately not a perceptual
// luma (no Rec. 601 weights, no linearization) and alpha is ignored.
//
// The `PixelSource` trait is the boundary to the outside world. The engine never
// decodes files; it only needs random access to pixels and the raster dimensions.
// Implementations for the `image` crate's buffers are provided so hosts can pass a
// decoded image straight in.

pub mod pixel {
    use image::{DynamicImage, GenericImageView, GrayImage, Luma, Rgb, RgbImage, Rgba, RgbaImage};

    pub type Channel = u8;
    pub type NormalizedChannel = f64;
    pub type IntensityLevel = u8;

    /// Highest intensity level a pixel can map to.
    pub const MAX_INTENSITY: usize = 255;
    /// Number of distinct intensity levels (and histogram cells per sector).
    pub const INTENSITY_LEVELS: usize = MAX_INTENSITY + 1;

    /// A "dumb" data container representing a single RGBA pixel.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Pixel {
        /// The red channel value (0-255).
        pub red: Channel,
        /// The green channel value (0-255).
        pub green: Channel,
        /// The blue channel value (0-255).
        pub blue: Channel,
        /// The alpha (transparency) channel value (0-255). Not used by any heuristic.
        pub alpha: Channel,
    }

    impl Pixel {
        pub fn new(red: Channel, green: Channel, blue: Channel, alpha: Channel) -> Self {
            Self {
                red,
                green,
                blue,
                alpha,
            }
        }

        /// An opaque pixel with all three color channels set to `level`.
        pub fn gray(level: Channel) -> Self {
            Self::new(level, level, level, Channel::MAX)
        }

        /// The color channels scaled to [0.0, 1.0].
        pub fn normalized_rgb(&self) -> (NormalizedChannel, NormalizedChannel, NormalizedChannel) {
            let scale = MAX_INTENSITY as NormalizedChannel;
            (
                self.red as NormalizedChannel / scale,
                self.green as NormalizedChannel / scale,
                self.blue as NormalizedChannel / scale,
            )
        }

        /// Grayscale intensity: `floor(avg(R, G, B) * 255)` over normalized channels.
        ///
        /// The average of normalized channels can land a hair below an integer (for
        /// example a uniform gray of 11 yields 10), which is the exact behavior of
        /// the formula and is kept as is.
        pub fn intensity(&self) -> IntensityLevel {
            let (red, green, blue) = self.normalized_rgb();
            let average = (red + green + blue) / 3.0;
            let level = (average * MAX_INTENSITY as NormalizedChannel).floor();
            level.clamp(0.0, MAX_INTENSITY as NormalizedChannel) as IntensityLevel
        }
    }

    impl From<Rgba<u8>> for Pixel {
        fn from(value: Rgba<u8>) -> Self {
            let [red, green, blue, alpha] = value.0;
            Self::new(red, green, blue, alpha)
        }
    }

    impl From<Rgb<u8>> for Pixel {
        fn from(value: Rgb<u8>) -> Self {
            let [red, green, blue] = value.0;
            Self::new(red, green, blue, Channel::MAX)
        }
    }

    impl From<Luma<u8>> for Pixel {
        fn from(value: Luma<u8>) -> Self {
            Self::gray(value.0[0])
        }
    }

    /// Random-access, read-only view of a raster the accumulator can scan.
    ///
    /// Implementations must be shareable across worker threads. Returning `None` from
    /// `pixel` marks the pixel as unreadable and fails the whole accumulation.
    pub trait PixelSource: Send + Sync {
        fn width(&self) -> u32;
        fn height(&self) -> u32;
        fn pixel(&self, x: u32, y: u32) -> Option<Pixel>;
    }

    impl PixelSource for RgbaImage {
        fn width(&self) -> u32 {
            GenericImageView::width(self)
        }

        fn height(&self) -> u32 {
            GenericImageView::height(self)
        }

        fn pixel(&self, x: u32, y: u32) -> Option<Pixel> {
            self.get_pixel_checked(x, y).map(|p| Pixel::from(*p))
        }
    }

    impl PixelSource for RgbImage {
        fn width(&self) -> u32 {
            GenericImageView::width(self)
        }

        fn height(&self) -> u32 {
            GenericImageView::height(self)
        }

        fn pixel(&self, x: u32, y: u32) -> Option<Pixel> {
            self.get_pixel_checked(x, y).map(|p| Pixel::from(*p))
        }
    }

    impl PixelSource for GrayImage {
        fn width(&self) -> u32 {
            GenericImageView::width(self)
        }

        fn height(&self) -> u32 {
            GenericImageView::height(self)
        }

        fn pixel(&self, x: u32, y: u32) -> Option<Pixel> {
            self.get_pixel_checked(x, y).map(|p| Pixel::from(*p))
        }
    }

    impl PixelSource for DynamicImage {
        fn width(&self) -> u32 {
            GenericImageView::width(self)
        }

        fn height(&self) -> u32 {
            GenericImageView::height(self)
        }

        fn pixel(&self, x: u32, y: u32) -> Option<Pixel> {
            if GenericImageView::in_bounds(self, x, y) {
                Some(Pixel::from(GenericImageView::get_pixel(self, x, y)))
            } else {
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::pixel::*;
    use image::{DynamicImage, Rgba, RgbaImage};

    #[test]
    fn intensity_of_extremes() {
        assert_eq!(Pixel::gray(0).intensity(), 0);
        assert_eq!(Pixel::gray(255).intensity(), 255);
        assert_eq!(Pixel::new(255, 255, 255, 0).intensity(), 255);
    }

    #[test]
    fn intensity_averages_color_channels() {
        // (255 + 0 + 0) / 3 = 85
        assert_eq!(Pixel::new(255, 0, 0, 255).intensity(), 85);
        assert_eq!(Pixel::new(0, 0, 255, 255).intensity(), 85);
        assert_eq!(Pixel::new(0, 255, 255, 255).intensity(), 170);
        assert_eq!(Pixel::new(100, 50, 0, 255).intensity(), 50);
    }

    #[test]
    fn intensity_ignores_alpha() {
        assert_eq!(
            Pixel::new(64, 64, 64, 0).intensity(),
            Pixel::new(64, 64, 64, 255).intensity()
        );
    }

    #[test]
    fn intensity_floors_the_average() {
        assert_eq!(Pixel::gray(64).intensity(), 64);
        assert_eq!(Pixel::gray(128).intensity(), 128);
        // The normalized average sits just below 11/255.
        assert_eq!(Pixel::gray(11).intensity(), 10);
    }

    #[test]
    fn sources_report_unreadable_pixels_out_of_bounds() {
        let image = RgbaImage::from_pixel(2, 3, Rgba([10, 20, 30, 255]));
        assert_eq!(PixelSource::width(&image), 2);
        assert_eq!(PixelSource::height(&image), 3);
        assert_eq!(image.pixel(1, 2), Some(Pixel::new(10, 20, 30, 255)));
        assert_eq!(image.pixel(2, 0), None);

        let dynamic = DynamicImage::ImageRgba8(image);
        assert_eq!(dynamic.pixel(0, 0), Some(Pixel::new(10, 20, 30, 255)));
        assert_eq!(dynamic.pixel(0, 3), None);
    }
}
