//! Raster helpers: decoding (including every page of a TIFF), colour modes
//! and encoding to the supported output formats.

use std::{fmt, fs::File, io::BufReader, path::Path, str::FromStr};

use clap::ValueEnum;
use image::{DynamicImage, GrayImage, ImageBuffer, ImageReader, Luma, Rgb, RgbImage};
use serde::Serialize;
use tiff::{
    ColorType as TiffColorType,
    decoder::{Decoder, DecodingResult},
};

use crate::{
    error::{ConversionError, ConversionResult},
    output_path::input_extension,
};

const BLACK_AND_WHITE_THRESHOLD: u8 = 128;

/// Raster formats a conversion can write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Jpeg,
    Jpg,
    Gif,
    Tiff,
    Png,
}

impl ImageFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpeg",
            Self::Jpg => "jpg",
            Self::Gif => "gif",
            Self::Tiff => "tiff",
            Self::Png => "png",
        }
    }

    fn codec(self) -> image::ImageFormat {
        match self {
            Self::Jpeg | Self::Jpg => image::ImageFormat::Jpeg,
            Self::Gif => image::ImageFormat::Gif,
            Self::Tiff => image::ImageFormat::Tiff,
            Self::Png => image::ImageFormat::Png,
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ImageFormat {
    type Err = ConversionError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "jpeg" => Ok(Self::Jpeg),
            "jpg" => Ok(Self::Jpg),
            "gif" => Ok(Self::Gif),
            "tiff" => Ok(Self::Tiff),
            "png" => Ok(Self::Png),
            other => Err(ConversionError::invalid(format!(
                "unsupported output type: {other} (expected jpeg, jpg, gif, tiff or png)"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    #[default]
    Color,
    Grayscale,
    #[value(name = "blackandwhite")]
    BlackAndWhite,
}

impl fmt::Display for ColorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Color => "color",
            Self::Grayscale => "grayscale",
            Self::BlackAndWhite => "blackandwhite",
        })
    }
}

impl FromStr for ColorMode {
    type Err = ConversionError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "color" => Ok(Self::Color),
            "grayscale" => Ok(Self::Grayscale),
            "blackandwhite" => Ok(Self::BlackAndWhite),
            other => Err(ConversionError::invalid(format!(
                "unsupported color format: {other} (expected color, grayscale or blackandwhite)"
            ))),
        }
    }
}

pub fn is_tiff(path: &Path) -> bool {
    matches!(
        input_extension(&path.to_string_lossy()).as_deref(),
        Some("tif" | "tiff")
    )
}

pub fn open(path: &Path) -> ConversionResult<DynamicImage> {
    Ok(ImageReader::open(path)?.with_guessed_format()?.decode()?)
}

/// Every page of a TIFF, or the single image of any other format.
pub fn load_pages(path: &Path) -> ConversionResult<Vec<DynamicImage>> {
    if is_tiff(path) {
        decode_tiff_pages(path)
    } else {
        Ok(vec![open(path)?])
    }
}

fn decode_tiff_pages(path: &Path) -> ConversionResult<Vec<DynamicImage>> {
    let mut decoder = Decoder::new(BufReader::new(File::open(path)?))?;
    let mut pages = Vec::new();

    loop {
        pages.push(decode_tiff_page(&mut decoder)?);
        if !decoder.more_images() {
            break;
        }
        decoder.next_image()?;
    }

    Ok(pages)
}

fn decode_tiff_page<R: std::io::Read + std::io::Seek>(
    decoder: &mut Decoder<R>,
) -> ConversionResult<DynamicImage> {
    let (width, height) = decoder.dimensions()?;
    let color_type = decoder.colortype()?;
    let data = decoder.read_image()?;

    let mismatch = || {
        ConversionError::library(format!(
            "TIFF page {width}x{height} does not match its pixel data"
        ))
    };

    let image = match (data, color_type) {
        (DecodingResult::U8(data), TiffColorType::Gray(8)) => {
            DynamicImage::ImageLuma8(ImageBuffer::from_raw(width, height, data).ok_or_else(mismatch)?)
        }
        (DecodingResult::U8(data), TiffColorType::GrayA(8)) => {
            DynamicImage::ImageLumaA8(ImageBuffer::from_raw(width, height, data).ok_or_else(mismatch)?)
        }
        (DecodingResult::U8(data), TiffColorType::RGB(8)) => {
            DynamicImage::ImageRgb8(ImageBuffer::from_raw(width, height, data).ok_or_else(mismatch)?)
        }
        (DecodingResult::U8(data), TiffColorType::RGBA(8)) => {
            DynamicImage::ImageRgba8(ImageBuffer::from_raw(width, height, data).ok_or_else(mismatch)?)
        }
        (DecodingResult::U16(data), TiffColorType::Gray(16)) => {
            DynamicImage::ImageLuma16(ImageBuffer::from_raw(width, height, data).ok_or_else(mismatch)?)
        }
        (DecodingResult::U16(data), TiffColorType::RGB(16)) => {
            DynamicImage::ImageRgb16(ImageBuffer::from_raw(width, height, data).ok_or_else(mismatch)?)
        }
        (DecodingResult::U16(data), TiffColorType::RGBA(16)) => {
            DynamicImage::ImageRgba16(ImageBuffer::from_raw(width, height, data).ok_or_else(mismatch)?)
        }
        (DecodingResult::U8(data), TiffColorType::Gray(bits @ (1 | 2 | 4))) => {
            let gray = unpack_gray(&data, width, height, bits).ok_or_else(mismatch)?;
            DynamicImage::ImageLuma8(ImageBuffer::from_raw(width, height, gray).ok_or_else(mismatch)?)
        }
        (DecodingResult::U8(data), TiffColorType::CMYK(8)) => {
            let rgb = data.chunks_exact(4).flat_map(cmyk_to_rgb).collect();
            DynamicImage::ImageRgb8(ImageBuffer::from_raw(width, height, rgb).ok_or_else(mismatch)?)
        }
        (DecodingResult::U8(data), TiffColorType::CMYKA(8)) => {
            let rgba = data
                .chunks_exact(5)
                .flat_map(|px| {
                    let [r, g, b] = cmyk_to_rgb(&px[..4]);
                    [r, g, b, px[4]]
                })
                .collect();
            DynamicImage::ImageRgba8(ImageBuffer::from_raw(width, height, rgba).ok_or_else(mismatch)?)
        }
        (_, other) => {
            return Err(ConversionError::library(format!(
                "unsupported TIFF color type: {other:?}"
            )));
        }
    };

    Ok(image)
}

/// Expands gray samples packed below 8 bits into one byte per pixel. Rows
/// start on a byte boundary and samples are read most significant bit first.
fn unpack_gray(data: &[u8], width: u32, height: u32, bits: u8) -> Option<Vec<u8>> {
    let bits = usize::from(bits);
    let width = width as usize;
    let row_bytes = (width * bits).div_ceil(8);
    let max = (1u16 << bits) - 1;
    if row_bytes == 0 || data.len() < row_bytes * height as usize {
        return None;
    }

    let mut gray = Vec::with_capacity(width * height as usize);
    for row in data.chunks_exact(row_bytes).take(height as usize) {
        for x in 0..width {
            let offset = x * bits;
            let shift = 8 - bits - offset % 8;
            let sample = u16::from(row[offset / 8] >> shift) & max;
            gray.push((sample * 255 / max) as u8);
        }
    }
    Some(gray)
}

fn cmyk_to_rgb(px: &[u8]) -> [u8; 3] {
    let black = 1.0 - f32::from(px[3]) / 255.0;
    let channel = |ink: u8| ((255.0 - f32::from(ink)) * black) as u8;
    [channel(px[0]), channel(px[1]), channel(px[2])]
}

/// Composites the image over a white background, dropping alpha.
pub fn flatten_on_white(image: &DynamicImage) -> RgbImage {
    let rgba = image.to_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let blend = |c: u8| ((u32::from(c) * u32::from(a) + 255 * (255 - u32::from(a))) / 255) as u8;
        Rgb([blend(r), blend(g), blend(b)])
    })
}

pub fn apply_color_mode(image: &DynamicImage, mode: ColorMode) -> DynamicImage {
    let flat = DynamicImage::ImageRgb8(flatten_on_white(image));
    match mode {
        ColorMode::Color => flat,
        ColorMode::Grayscale => DynamicImage::ImageLuma8(flat.to_luma8()),
        ColorMode::BlackAndWhite => DynamicImage::ImageLuma8(threshold(&flat.to_luma8())),
    }
}

fn threshold(gray: &GrayImage) -> GrayImage {
    GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        let Luma([v]) = *gray.get_pixel(x, y);
        Luma([if v >= BLACK_AND_WHITE_THRESHOLD { 255 } else { 0 }])
    })
}

/// Writes `image` in `format`. GIF has no grayscale encoding, so luma
/// images are expanded to RGB for it.
pub fn save_as(image: &DynamicImage, path: &Path, format: ImageFormat) -> ConversionResult<()> {
    let image = match (format, image) {
        (ImageFormat::Gif, DynamicImage::ImageLuma8(_)) => DynamicImage::ImageRgb8(image.to_rgb8()),
        _ => image.clone(),
    };
    image.save_with_format(path, format.codec())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use tiff::encoder::{TiffEncoder, colortype};

    fn sample() -> DynamicImage {
        let mut img = RgbaImage::new(4, 2);
        img.put_pixel(0, 0, Rgba([0, 0, 0, 0]));
        img.put_pixel(1, 0, Rgba([200, 10, 10, 255]));
        img.put_pixel(2, 0, Rgba([250, 250, 250, 255]));
        img.put_pixel(3, 0, Rgba([20, 20, 20, 255]));
        DynamicImage::ImageRgba8(img)
    }

    #[test]
    fn transparent_pixels_become_white() {
        let flat = flatten_on_white(&sample());
        assert_eq!(flat.get_pixel(0, 0), &Rgb([255, 255, 255]));
        assert_eq!(flat.get_pixel(1, 0), &Rgb([200, 10, 10]));
    }

    #[test]
    fn color_modes_pick_pixel_layout() {
        assert!(matches!(apply_color_mode(&sample(), ColorMode::Color), DynamicImage::ImageRgb8(_)));
        assert!(matches!(apply_color_mode(&sample(), ColorMode::Grayscale), DynamicImage::ImageLuma8(_)));

        let bw = apply_color_mode(&sample(), ColorMode::BlackAndWhite).to_luma8();
        assert!(bw.pixels().all(|Luma([v])| *v == 0 || *v == 255));
        assert_eq!(bw.get_pixel(0, 0), &Luma([255]));
        assert_eq!(bw.get_pixel(3, 0), &Luma([0]));
    }

    #[test]
    fn option_strings_parse_case_insensitively() {
        assert_eq!("JPG".parse::<ImageFormat>().unwrap(), ImageFormat::Jpg);
        assert_eq!("blackandwhite".parse::<ColorMode>().unwrap(), ColorMode::BlackAndWhite);
        assert!("bmp".parse::<ImageFormat>().unwrap_err().is_invalid_input());
        assert!("sepia".parse::<ColorMode>().unwrap_err().is_invalid_input());
    }

    #[test]
    fn grayscale_gif_and_jpeg_are_writable() {
        let dir = tempfile::tempdir().unwrap();
        let gray = apply_color_mode(&sample(), ColorMode::Grayscale);

        let gif = dir.path().join("out.gif");
        save_as(&gray, &gif, ImageFormat::Gif).unwrap();
        assert_eq!(open(&gif).unwrap().width(), 4);

        let jpeg = dir.path().join("out.jpeg");
        save_as(&gray, &jpeg, ImageFormat::Jpeg).unwrap();
        assert_eq!(open(&jpeg).unwrap().height(), 2);
    }

    #[test]
    fn every_tiff_page_is_decoded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.tiff");
        {
            let mut encoder = TiffEncoder::new(File::create(&path).unwrap()).unwrap();
            encoder
                .write_image::<colortype::RGB8>(2, 2, &[255u8; 12])
                .unwrap();
            encoder
                .write_image::<colortype::Gray8>(3, 1, &[0u8, 128, 255])
                .unwrap();
        }

        let pages = load_pages(&path).unwrap();

        assert_eq!(pages.len(), 2);
        assert!(matches!(pages[0], DynamicImage::ImageRgb8(_)));
        assert_eq!((pages[1].width(), pages[1].height()), (3, 1));
    }

    /// A little-endian, uncompressed 8x2 page with one bit per pixel.
    fn bilevel_tiff() -> Vec<u8> {
        let entries: [(u16, u16, u32); 9] = [
            (256, 3, 8),   // ImageWidth
            (257, 3, 2),   // ImageLength
            (258, 3, 1),   // BitsPerSample
            (259, 3, 1),   // Compression: none
            (262, 3, 1),   // PhotometricInterpretation: BlackIsZero
            (273, 4, 122), // StripOffsets
            (277, 3, 1),   // SamplesPerPixel
            (278, 3, 2),   // RowsPerStrip
            (279, 4, 2),   // StripByteCounts
        ];
        let mut file = b"II*\0".to_vec();
        file.extend_from_slice(&8u32.to_le_bytes());
        file.extend_from_slice(&(entries.len() as u16).to_le_bytes());
        for (tag, kind, value) in entries {
            file.extend_from_slice(&tag.to_le_bytes());
            file.extend_from_slice(&kind.to_le_bytes());
            file.extend_from_slice(&1u32.to_le_bytes());
            if kind == 3 {
                file.extend_from_slice(&(value as u16).to_le_bytes());
                file.extend_from_slice(&[0, 0]);
            } else {
                file.extend_from_slice(&value.to_le_bytes());
            }
        }
        file.extend_from_slice(&0u32.to_le_bytes());
        assert_eq!(file.len(), 122);
        file.extend_from_slice(&[0b1010_0000, 0xFF]);
        file
    }

    #[test]
    fn bilevel_tiff_pages_are_expanded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fax.tif");
        std::fs::write(&path, bilevel_tiff()).unwrap();

        let pages = load_pages(&path).unwrap();

        assert_eq!(pages.len(), 1);
        let gray = pages[0].as_luma8().unwrap();
        assert_eq!(gray.dimensions(), (8, 2));
        let first_row: Vec<u8> = (0..8).map(|x| gray.get_pixel(x, 0).0[0]).collect();
        assert_eq!(first_row, [255, 0, 255, 0, 0, 0, 0, 0]);
        assert!((0..8).all(|x| gray.get_pixel(x, 1).0[0] == 255));
    }

    #[test]
    fn packed_gray_samples_scale_to_full_range() {
        assert_eq!(unpack_gray(&[0b0001_1011], 4, 1, 2).unwrap(), [0, 85, 170, 255]);
        assert_eq!(unpack_gray(&[0xF0, 0x00], 1, 2, 4).unwrap(), [255, 0]);
        assert!(unpack_gray(&[0xFF], 8, 2, 1).is_none());
    }

    #[test]
    fn cmyk_inks_subtract_from_white() {
        assert_eq!(cmyk_to_rgb(&[0, 0, 0, 0]), [255, 255, 255]);
        assert_eq!(cmyk_to_rgb(&[0, 0, 0, 255]), [0, 0, 0]);
        assert_eq!(cmyk_to_rgb(&[255, 0, 0, 0]), [0, 255, 255]);
    }

    #[test]
    fn tiff_detection_uses_extension() {
        assert!(is_tiff(Path::new("a/B.TIF")));
        assert!(is_tiff(Path::new("scan.tiff")));
        assert!(!is_tiff(Path::new("photo.png")));
    }
}
