pub mod image_helper {
    use crate::core_modules::renderer::{RenderedImage, to_gray8};
    use image::ImageEncoder;
    use std::io::BufWriter;
    use std::path::Path;

    /// Writes a rendered sector image as an 8-bit grayscale PNG.
    pub fn save_rendered(
        path: impl AsRef<Path>,
        image: &RenderedImage,
    ) -> Result<(), image::error::ImageError> {
        let gray = to_gray8(image);
        let output = BufWriter::new(std::fs::File::create(path)?);
        let encoder = image::codecs::png::PngEncoder::new(output);

        encoder.write_image(
            gray.as_raw(),
            gray.width(),
            gray.height(),
            image::ExtendedColorType::L8,
        )?;

        Ok(())
    }
}
