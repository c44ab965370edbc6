use std::path::Path;

use image::{DynamicImage, RgbImage, codecs::jpeg::JpegEncoder};
use lopdf::{
    Document, Object, Stream,
    content::{Content, Operation},
    dictionary,
};

use crate::{
    error::{ConversionError, ConversionResult},
    imaging::flatten_on_white,
};

const JPEG_QUALITY: u8 = 92;
const IMAGE_NAME: &str = "Im0";

/// Writes a PDF with one page per image. Each page is exactly as large as
/// its image, one pixel per point.
pub fn write_image_pdf(images: &[DynamicImage], path: &Path) -> ConversionResult<()> {
    if images.is_empty() {
        return Err(ConversionError::library("no images to place in the PDF"));
    }

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let mut kids = Vec::with_capacity(images.len());

    for image in images {
        let rgb = flatten_on_white(image);
        let (width, height) = rgb.dimensions();
        let (width, height) = (i64::from(width), i64::from(height));

        let image_id = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => Object::Integer(width),
                "Height" => Object::Integer(height),
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => Object::Integer(8),
                "Filter" => "DCTDecode",
            },
            encode_jpeg(&rgb)?,
        ));

        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        Object::Integer(width),
                        Object::Integer(0),
                        Object::Integer(0),
                        Object::Integer(height),
                        Object::Integer(0),
                        Object::Integer(0),
                    ],
                ),
                Operation::new("Do", vec![Object::Name(IMAGE_NAME.as_bytes().to_vec())]),
                Operation::new("Q", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(width),
                Object::Integer(height),
            ],
            "Resources" => dictionary! {
                "XObject" => dictionary! {
                    IMAGE_NAME => image_id,
                },
            },
        });
        kids.push(Object::Reference(page_id));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => Object::Integer(count),
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();
    doc.save(path)?;
    Ok(())
}

fn encode_jpeg(image: &RgbImage) -> ConversionResult<Vec<u8>> {
    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, JPEG_QUALITY).encode_image(image)?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn one_page_per_image_sized_in_points() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.pdf");
        let images = vec![
            DynamicImage::ImageRgb8(RgbImage::from_pixel(40, 30, Rgb([10, 20, 30]))),
            DynamicImage::ImageRgb8(RgbImage::from_pixel(12, 50, Rgb([200, 200, 200]))),
        ];

        write_image_pdf(&images, &path).unwrap();

        let doc = Document::load(&path).unwrap();
        let pages = doc.get_pages();
        assert_eq!(pages.len(), 2);

        let first = doc.get_dictionary(pages[&1]).unwrap();
        let media_box: Vec<i64> = first
            .get(b"MediaBox")
            .unwrap()
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_i64().unwrap())
            .collect();
        assert_eq!(media_box, vec![0, 0, 40, 30]);
    }

    #[test]
    fn empty_input_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        assert!(write_image_pdf(&[], &dir.path().join("x.pdf")).is_err());
    }
}
