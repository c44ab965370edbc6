//! Minimal PresentationML writer: a deck of full-bleed picture slides.

use std::{
    fs::File,
    io::{Cursor, Seek, Write},
    path::Path,
};

use image::{DynamicImage, ImageFormat, imageops::FilterType};
use zip::{
    CompressionMethod, ZipWriter,
    write::{FileOptions, SimpleFileOptions},
};

use crate::{error::ConversionResult, imaging::flatten_on_white};

pub const SLIDE_WIDTH_PX: u32 = 1920;
pub const SLIDE_HEIGHT_PX: u32 = 1080;
const EMU_PER_PX: u64 = 9525;

const NS_A: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const NS_R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const NS_P: &str = "http://schemas.openxmlformats.org/presentationml/2006/main";
const REL_BASE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const XML_DECL: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

struct Slide {
    png: Vec<u8>,
    width_px: u32,
    height_px: u32,
}

#[derive(Default)]
pub struct SlideDeck {
    slides: Vec<Slide>,
}

impl SlideDeck {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.slides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    /// Scales the image to fit the slide and places it at the top-left corner.
    pub fn push_image(&mut self, image: &DynamicImage) -> ConversionResult<()> {
        let fitted = image.resize(SLIDE_WIDTH_PX, SLIDE_HEIGHT_PX, FilterType::Lanczos3);
        let rgb = DynamicImage::ImageRgb8(flatten_on_white(&fitted));
        let mut png = Vec::new();
        rgb.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
        self.slides.push(Slide {
            png,
            width_px: rgb.width(),
            height_px: rgb.height(),
        });
        Ok(())
    }

    pub fn write(&self, path: &Path) -> ConversionResult<()> {
        self.write_to(File::create(path)?)
    }

    fn write_to<W: Write + Seek>(&self, writer: W) -> ConversionResult<()> {
        let options: SimpleFileOptions =
            FileOptions::default().compression_method(CompressionMethod::Deflated);
        let mut zip = ZipWriter::new(writer);

        let mut put = |name: &str, body: &[u8]| -> ConversionResult<()> {
            zip.start_file(name, options)?;
            zip.write_all(body)?;
            Ok(())
        };

        put("[Content_Types].xml", self.content_types().as_bytes())?;
        put("_rels/.rels", ROOT_RELS.as_bytes())?;
        put("ppt/presentation.xml", self.presentation().as_bytes())?;
        put("ppt/_rels/presentation.xml.rels", self.presentation_rels().as_bytes())?;
        put("ppt/slideMasters/slideMaster1.xml", slide_master().as_bytes())?;
        put("ppt/slideMasters/_rels/slideMaster1.xml.rels", MASTER_RELS.as_bytes())?;
        put("ppt/slideLayouts/slideLayout1.xml", slide_layout().as_bytes())?;
        put("ppt/slideLayouts/_rels/slideLayout1.xml.rels", LAYOUT_RELS.as_bytes())?;
        put("ppt/theme/theme1.xml", theme().as_bytes())?;

        for (index, slide) in self.slides.iter().enumerate() {
            let number = index + 1;
            put(&format!("ppt/media/image{number}.png"), &slide.png)?;
            put(&format!("ppt/slides/slide{number}.xml"), slide_xml(slide).as_bytes())?;
            put(
                &format!("ppt/slides/_rels/slide{number}.xml.rels"),
                slide_rels(number).as_bytes(),
            )?;
        }

        zip.finish()?;
        Ok(())
    }

    fn content_types(&self) -> String {
        let mut xml = format!(
            r#"{XML_DECL}<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Default Extension="png" ContentType="image/png"/><Override PartName="/ppt/presentation.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml"/><Override PartName="/ppt/slideMasters/slideMaster1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml"/><Override PartName="/ppt/slideLayouts/slideLayout1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml"/><Override PartName="/ppt/theme/theme1.xml" ContentType="application/vnd.openxmlformats-officedocument.theme+xml"/>"#
        );
        for number in 1..=self.slides.len() {
            xml.push_str(&format!(
                r#"<Override PartName="/ppt/slides/slide{number}.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slide+xml"/>"#
            ));
        }
        xml.push_str("</Types>");
        xml
    }

    fn presentation(&self) -> String {
        // rId1 is the master, rId2 the theme; slides follow.
        let slide_ids: String = (0..self.slides.len())
            .map(|index| {
                format!(
                    r#"<p:sldId id="{}" r:id="rId{}"/>"#,
                    256 + index,
                    3 + index
                )
            })
            .collect();
        format!(
            r#"{XML_DECL}<p:presentation xmlns:a="{NS_A}" xmlns:r="{NS_R}" xmlns:p="{NS_P}"><p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst><p:sldIdLst>{slide_ids}</p:sldIdLst><p:sldSz cx="{}" cy="{}"/><p:notesSz cx="6858000" cy="9144000"/></p:presentation>"#,
            emu(SLIDE_WIDTH_PX),
            emu(SLIDE_HEIGHT_PX)
        )
    }

    fn presentation_rels(&self) -> String {
        let mut xml = format!(
            r#"{XML_DECL}<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="{REL_BASE}/slideMaster" Target="slideMasters/slideMaster1.xml"/><Relationship Id="rId2" Type="{REL_BASE}/theme" Target="theme/theme1.xml"/>"#
        );
        for index in 0..self.slides.len() {
            xml.push_str(&format!(
                r#"<Relationship Id="rId{}" Type="{REL_BASE}/slide" Target="slides/slide{}.xml"/>"#,
                3 + index,
                index + 1
            ));
        }
        xml.push_str("</Relationships>");
        xml
    }
}

fn emu(px: u32) -> u64 {
    u64::from(px) * EMU_PER_PX
}

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="ppt/presentation.xml"/></Relationships>"#;

const MASTER_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout" Target="../slideLayouts/slideLayout1.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme" Target="../theme/theme1.xml"/></Relationships>"#;

const LAYOUT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster" Target="../slideMasters/slideMaster1.xml"/></Relationships>"#;

const EMPTY_TREE: &str = r#"<p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/><a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr>"#;

fn slide_master() -> String {
    format!(
        r#"{XML_DECL}<p:sldMaster xmlns:a="{NS_A}" xmlns:r="{NS_R}" xmlns:p="{NS_P}"><p:cSld><p:spTree>{EMPTY_TREE}</p:spTree></p:cSld><p:clrMap bg1="lt1" tx1="dk1" bg2="lt2" tx2="dk2" accent1="accent1" accent2="accent2" accent3="accent3" accent4="accent4" accent5="accent5" accent6="accent6" hlink="hlink" folHlink="folHlink"/><p:sldLayoutIdLst><p:sldLayoutId id="2147483649" r:id="rId1"/></p:sldLayoutIdLst></p:sldMaster>"#
    )
}

fn slide_layout() -> String {
    format!(
        r#"{XML_DECL}<p:sldLayout xmlns:a="{NS_A}" xmlns:r="{NS_R}" xmlns:p="{NS_P}" type="blank" preserve="1"><p:cSld name="Blank"><p:spTree>{EMPTY_TREE}</p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sldLayout>"#
    )
}

fn slide_xml(slide: &Slide) -> String {
    format!(
        r#"{XML_DECL}<p:sld xmlns:a="{NS_A}" xmlns:r="{NS_R}" xmlns:p="{NS_P}"><p:cSld><p:spTree>{EMPTY_TREE}<p:pic><p:nvPicPr><p:cNvPr id="2" name="Picture 1"/><p:cNvPicPr><a:picLocks noChangeAspect="1"/></p:cNvPicPr><p:nvPr/></p:nvPicPr><p:blipFill><a:blip r:embed="rId2"/><a:stretch><a:fillRect/></a:stretch></p:blipFill><p:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="{}" cy="{}"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom></p:spPr></p:pic></p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sld>"#,
        emu(slide.width_px),
        emu(slide.height_px)
    )
}

fn slide_rels(number: usize) -> String {
    format!(
        r#"{XML_DECL}<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="{REL_BASE}/slideLayout" Target="../slideLayouts/slideLayout1.xml"/><Relationship Id="rId2" Type="{REL_BASE}/image" Target="../media/image{number}.png"/></Relationships>"#
    )
}

fn theme() -> String {
    let solid = |color: &str| format!(r#"<a:solidFill><a:schemeClr val="{color}"/></a:solidFill>"#);
    let fills = solid("phClr").repeat(3);
    let lines = format!(r#"<a:ln w="9525">{}</a:ln>"#, solid("phClr")).repeat(3);
    let effects = "<a:effectStyle><a:effectLst/></a:effectStyle>".repeat(3);
    let fonts = r#"<a:latin typeface="Calibri"/><a:ea typeface=""/><a:cs typeface=""/>"#;
    format!(
        r#"{XML_DECL}<a:theme xmlns:a="{NS_A}" name="Office Theme"><a:themeElements><a:clrScheme name="Office"><a:dk1><a:srgbClr val="000000"/></a:dk1><a:lt1><a:srgbClr val="FFFFFF"/></a:lt1><a:dk2><a:srgbClr val="44546A"/></a:dk2><a:lt2><a:srgbClr val="E7E6E6"/></a:lt2><a:accent1><a:srgbClr val="4472C4"/></a:accent1><a:accent2><a:srgbClr val="ED7D31"/></a:accent2><a:accent3><a:srgbClr val="A5A5A5"/></a:accent3><a:accent4><a:srgbClr val="FFC000"/></a:accent4><a:accent5><a:srgbClr val="5B9BD5"/></a:accent5><a:accent6><a:srgbClr val="70AD47"/></a:accent6><a:hlink><a:srgbClr val="0563C1"/></a:hlink><a:folHlink><a:srgbClr val="954F72"/></a:folHlink></a:clrScheme><a:fontScheme name="Office"><a:majorFont>{fonts}</a:majorFont><a:minorFont>{fonts}</a:minorFont></a:fontScheme><a:fmtScheme name="Office"><a:fillStyleLst>{fills}</a:fillStyleLst><a:lnStyleLst>{lines}</a:lnStyleLst><a:effectStyleLst>{effects}</a:effectStyleLst><a:bgFillStyleLst>{fills}</a:bgFillStyleLst></a:fmtScheme></a:themeElements></a:theme>"#
    )
}
