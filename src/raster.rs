use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, Rgb, RgbImage};

use crate::error::Error;

const JPEG_QUALITY: u8 = 85;

/// A decoded upload, re-encoded as baseline RGB JPEG so it can be embedded
/// with the DCT filter. Owned by exactly one placed element.
#[derive(Debug)]
pub struct RasterImage {
    jpeg: Vec<u8>,
    pixel_width: u32,
    pixel_height: u32,
}

impl RasterImage {
    pub fn data(&self) -> &[u8] {
        &self.jpeg
    }

    pub fn pixel_width(&self) -> u32 {
        self.pixel_width
    }

    pub fn pixel_height(&self) -> u32 {
        self.pixel_height
    }

    /// Height over width.
    pub fn aspect(&self) -> f32 {
        self.pixel_height as f32 / self.pixel_width as f32
    }
}

/// Decode any supported upload (PNG or JPEG, any colour mode) and normalise it
/// to RGB JPEG. Transparent pixels are composited over white.
pub fn normalize(bytes: &[u8]) -> Result<RasterImage, Error> {
    if bytes.is_empty() {
        return Err(Error::Image("empty upload".into()));
    }
    let decoded = image::load_from_memory(bytes)?;
    let (w, h) = (decoded.width(), decoded.height());
    if w == 0 || h == 0 {
        return Err(Error::Image(format!("degenerate image {w}x{h}")));
    }

    let rgb = flatten_on_white(&decoded);
    let mut jpeg = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut jpeg, JPEG_QUALITY);
    encoder.encode_image(&rgb)?;

    log::debug!(
        "normalize: {}x{} {:?} → {} bytes JPEG",
        w,
        h,
        decoded.color(),
        jpeg.len()
    );

    Ok(RasterImage {
        jpeg,
        pixel_width: w,
        pixel_height: h,
    })
}

fn flatten_on_white(img: &DynamicImage) -> RgbImage {
    if !img.color().has_alpha() {
        return img.to_rgb8();
    }
    let rgba = img.to_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let blend = |c: u8| -> u8 {
            let a = a as u16;
            ((c as u16 * a + 255 * (255 - a) + 127) / 255) as u8
        };
        Rgb([blend(r), blend(g), blend(b)])
    })
}
