//! Image format conversion.
//!
//! A thin request/response wrapper over the `image` crate: validate the
//! request, decode, optionally shrink, flatten onto white, encode, and
//! check that the output really is the requested format.

use std::fmt;
use std::str::FromStr;

use image::codecs::avif::AvifEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::codecs::webp::WebPEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, ImageFormat, RgbImage};
use thiserror::Error;

/// Largest image accepted for conversion (10 MiB).
pub const MAX_IMAGE_SIZE: usize = 10 * 1024 * 1024;

const DEFAULT_QUALITY: u8 = 80;

/// AVIF encoder speed, 1 (slowest) to 10.
const AVIF_SPEED: u8 = 8;
const AVIF_SPEED_WEB: u8 = 4;

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("no image was provided")]
    MissingImage,

    #[error("image is too large ({size} bytes, limit {limit} bytes)")]
    TooLarge { size: usize, limit: usize },

    #[error("unsupported output format: {0}")]
    UnsupportedFormat(String),

    #[error("quality must be between 1 and 100, got {0}")]
    InvalidQuality(u8),

    #[error("cannot decode image: {0}")]
    Decode(#[source] image::ImageError),

    #[error("conversion failed: {0}")]
    Encode(#[source] image::ImageError),

    #[error("conversion produced {actual} instead of {expected}")]
    WrongOutput { expected: TargetFormat, actual: String },
}

/// Output formats the converter can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetFormat {
    Jpeg,
    Png,
    Webp,
    Avif,
}

impl TargetFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            TargetFormat::Jpeg => "jpeg",
            TargetFormat::Png => "png",
            TargetFormat::Webp => "webp",
            TargetFormat::Avif => "avif",
        }
    }

    pub fn content_type(&self) -> String {
        format!("image/{}", self.extension())
    }

    fn image_format(&self) -> ImageFormat {
        match self {
            TargetFormat::Jpeg => ImageFormat::Jpeg,
            TargetFormat::Png => ImageFormat::Png,
            TargetFormat::Webp => ImageFormat::WebP,
            TargetFormat::Avif => ImageFormat::Avif,
        }
    }
}

impl fmt::Display for TargetFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for TargetFormat {
    type Err = ConvertError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        match token.to_ascii_lowercase().as_str() {
            "jpeg" | "jpg" => Ok(TargetFormat::Jpeg),
            "png" => Ok(TargetFormat::Png),
            "webp" => Ok(TargetFormat::Webp),
            "avif" => Ok(TargetFormat::Avif),
            _ => Err(ConvertError::UnsupportedFormat(token.to_string())),
        }
    }
}

/// Optional knobs of a conversion request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConvertSettings {
    /// 1..=100; JPEG and AVIF. Defaults to 80.
    pub quality: Option<u8>,
    pub auto_resize: bool,
    /// Width bound applied when `auto_resize` is set.
    pub max_width: Option<u32>,
    /// Encoded output never carries source metadata; kept for request parity.
    pub strip_metadata: bool,
    /// Spend more effort on smaller output.
    pub web_optimized: bool,
}

pub struct ConvertRequest<'a> {
    pub image: &'a [u8],
    pub format: TargetFormat,
    pub settings: ConvertSettings,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Converted {
    pub bytes: Vec<u8>,
    pub format: TargetFormat,
    pub width: u32,
    pub height: u32,
}

impl Converted {
    pub fn content_type(&self) -> String {
        self.format.content_type()
    }

    pub fn file_name(&self) -> String {
        format!("converted.{}", self.format.extension())
    }
}

impl ConvertRequest<'_> {
    pub fn validate(&self) -> Result<(), ConvertError> {
        if self.image.is_empty() {
            return Err(ConvertError::MissingImage);
        }
        if self.image.len() > MAX_IMAGE_SIZE {
            return Err(ConvertError::TooLarge {
                size: self.image.len(),
                limit: MAX_IMAGE_SIZE,
            });
        }
        match self.settings.quality {
            Some(q) if q == 0 || q > 100 => Err(ConvertError::InvalidQuality(q)),
            _ => Ok(()),
        }
    }
}

pub fn convert(request: &ConvertRequest<'_>) -> Result<Converted, ConvertError> {
    request.validate()?;
    let settings = &request.settings;

    let mut img = image::load_from_memory(request.image).map_err(ConvertError::Decode)?;

    if settings.auto_resize
        && let Some(max_width) = settings.max_width
        && max_width > 0
        && img.width() > max_width
    {
        let height = ((img.height() as u64 * max_width as u64) / img.width() as u64).max(1) as u32;
        img = img.resize_exact(max_width, height, FilterType::Lanczos3);
    }

    let rgb = flatten_on_white(&img);
    let (width, height) = rgb.dimensions();
    let bytes = encode(&rgb, request.format, settings).map_err(ConvertError::Encode)?;

    let actual = sniff_format(&bytes);
    if actual != Some(request.format.image_format()) {
        return Err(ConvertError::WrongOutput {
            expected: request.format,
            actual: actual.map_or_else(|| "unknown data".to_string(), |f| format!("{f:?}")),
        });
    }

    tracing::debug!(format = %request.format, width, height, size = bytes.len(), "image converted");
    Ok(Converted {
        bytes,
        format: request.format,
        width,
        height,
    })
}

/// Detect the container of encoded output. AVIF is an ISO-BMFF file
/// whose `ftyp` box names the `avif` brand.
fn sniff_format(bytes: &[u8]) -> Option<ImageFormat> {
    if bytes.get(4..12) == Some(b"ftypavif".as_slice()) {
        return Some(ImageFormat::Avif);
    }
    image::guess_format(bytes).ok()
}

/// Drop alpha by compositing over a white background.
fn flatten_on_white(img: &DynamicImage) -> RgbImage {
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    RgbImage::from_fn(width, height, |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let blend = |c: u8| ((c as u16 * a as u16 + 255 * (255 - a as u16)) / 255) as u8;
        image::Rgb([blend(r), blend(g), blend(b)])
    })
}

fn encode(rgb: &RgbImage, format: TargetFormat, settings: &ConvertSettings) -> image::ImageResult<Vec<u8>> {
    let mut out = Vec::new();
    let (width, height) = rgb.dimensions();
    match format {
        TargetFormat::Jpeg => {
            let quality = settings.quality.unwrap_or(DEFAULT_QUALITY);
            JpegEncoder::new_with_quality(&mut out, quality).write_image(
                rgb.as_raw(),
                width,
                height,
                ExtendedColorType::Rgb8,
            )?;
        }
        TargetFormat::Png => {
            let compression = if settings.web_optimized {
                CompressionType::Best
            } else {
                CompressionType::Default
            };
            PngEncoder::new_with_quality(&mut out, compression, PngFilter::Adaptive).write_image(
                rgb.as_raw(),
                width,
                height,
                ExtendedColorType::Rgb8,
            )?;
        }
        TargetFormat::Webp => {
            WebPEncoder::new_lossless(&mut out).write_image(
                rgb.as_raw(),
                width,
                height,
                ExtendedColorType::Rgb8,
            )?;
        }
        TargetFormat::Avif => {
            let quality = settings.quality.unwrap_or(DEFAULT_QUALITY);
            let speed = if settings.web_optimized {
                AVIF_SPEED_WEB
            } else {
                AVIF_SPEED
            };
            AvifEncoder::new_with_speed_quality(&mut out, speed, quality).write_image(
                rgb.as_raw(),
                width,
                height,
                ExtendedColorType::Rgb8,
            )?;
        }
    }
    Ok(out)
}
