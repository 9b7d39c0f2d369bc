//! Process diagram export for BPT records.
//!
//! Diagrams are embedded raster images inside a process's page range.
//! Logos and rules are small, so only images at least `min_image_px` wide
//! and tall are kept. Each one is re-encoded as PNG next to the area's JSON
//! files and referenced from the record.

use crate::error::Mita2JsonError;
use crate::output::sanitize_name;
use crate::record::Diagram;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Supplies the diagrams of one process before its record is assembled.
pub trait DiagramSource: Send + Sync {
    /// Diagrams found on the 1-based inclusive page range `pages`.
    fn diagrams_for(&self, code: &str, process_name: &str, pages: (usize, usize)) -> Vec<Diagram>;
}

/// Used when image export is off.
pub struct NoDiagrams;

impl DiagramSource for NoDiagrams {
    fn diagrams_for(&self, _code: &str, _process_name: &str, _pages: (usize, usize)) -> Vec<Diagram> {
        Vec::new()
    }
}

pub fn diagram_filename(code: &str, process_name: &str, page: usize, index: usize) -> String {
    format!("{}_{}_diagram_{}_{}.png", code, sanitize_name(process_name), page, index)
}

pub fn diagram_entry(filename: String, page: usize) -> Diagram {
    Diagram {
        filename,
        description: format!("Process diagram from page {page}"),
        page_reference: page,
    }
}

/// Encode an image as PNG bytes.
pub fn encode_png(img: &DynamicImage) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;
    Ok(buf)
}

/// One embedded raster image large enough to be a diagram.
#[derive(Debug, Clone)]
pub struct PageImage {
    /// 1-based page number.
    pub page: usize,
    /// 1-based position among the page's image objects, small ones included.
    pub index: usize,
    pub image: DynamicImage,
}

/// Collect the images on one page that are at least `min_px` wide and tall.
///
/// Called from the same pdfium pass that reads the page text.
pub fn collect_page_images(page: &PdfPage<'_>, page_num: usize, min_px: u32) -> Vec<PageImage> {
    let mut found = Vec::new();
    let mut index = 0;
    for object in page.objects().iter() {
        let Some(image_object) = object.as_image_object() else {
            continue;
        };
        index += 1;

        let image = match image_object.get_raw_image() {
            Ok(image) => image,
            Err(e) => {
                warn!("Could not read image {} on page {}: {:?}", index, page_num, e);
                continue;
            }
        };
        if image.width() < min_px || image.height() < min_px {
            debug!("Image {} on page {} too small ({}x{})", index, page_num, image.width(), image.height());
            continue;
        }
        found.push(PageImage {
            page: page_num,
            index,
            image,
        });
    }
    found
}

/// Diagrams from images collected while the PDF was read.
///
/// The PDF is opened once per area; each process only filters the
/// collected images by its page range and writes them as PNG. Writes are
/// blocking.
pub struct ScannedDiagrams {
    images: Vec<PageImage>,
    images_dir: PathBuf,
}

impl ScannedDiagrams {
    pub fn new(images: Vec<PageImage>, images_dir: impl Into<PathBuf>) -> Self {
        Self {
            images,
            images_dir: images_dir.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    fn write(&self, filename: &str, image: &DynamicImage) -> Result<(), Mita2JsonError> {
        let path = self.images_dir.join(filename);
        let bytes = encode_png(image).map_err(|e| Mita2JsonError::ImageEncodeFailed {
            path: path.clone(),
            detail: e.to_string(),
        })?;
        write_file(&path, &bytes)
    }
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<(), Mita2JsonError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| Mita2JsonError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;
    }
    std::fs::write(path, bytes).map_err(|e| Mita2JsonError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    })
}

impl DiagramSource for ScannedDiagrams {
    fn diagrams_for(&self, code: &str, process_name: &str, pages: (usize, usize)) -> Vec<Diagram> {
        let mut diagrams = Vec::new();
        for found in self.images.iter().filter(|i| i.page >= pages.0 && i.page <= pages.1) {
            let filename = diagram_filename(code, process_name, found.page, found.index);
            match self.write(&filename, &found.image) {
                Ok(()) => {
                    info!("Exported diagram {}", filename);
                    diagrams.push(diagram_entry(filename, found.page));
                }
                Err(e) => warn!("Diagram export failed for '{}': {}", process_name, e),
            }
        }
        diagrams
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn filename_and_caption() {
        let name = diagram_filename("EE", "Determine Eligibility", 12, 2);
        assert_eq!(name, "EE_Determine_Eligibility_diagram_12_2.png");
        let d = diagram_entry(name, 12);
        assert_eq!(d.description, "Process diagram from page 12");
        assert_eq!(d.page_reference, 12);
    }

    #[test]
    fn png_encoding() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(10, 10, Rgba([255, 0, 0, 255])));
        let bytes = encode_png(&img).expect("encode should succeed");
        assert_eq!(&bytes[1..4], b"PNG");
    }

    #[test]
    fn no_diagrams_is_empty() {
        assert!(NoDiagrams.diagrams_for("CM", "Establish Case", (1, 3)).is_empty());
    }

    fn solid(page: usize, index: usize) -> PageImage {
        PageImage {
            page,
            index,
            image: DynamicImage::ImageRgba8(RgbaImage::from_pixel(4, 4, Rgba([0, 0, 255, 255]))),
        }
    }

    #[test]
    fn scanned_images_are_filtered_by_page_range() {
        let tmp = tempfile::tempdir().unwrap();
        let source = ScannedDiagrams::new(vec![solid(1, 1), solid(2, 1), solid(3, 2)], tmp.path());
        assert_eq!(source.len(), 3);

        let first = source.diagrams_for("CM", "Establish Case", (2, 3));
        let names: Vec<_> = first.iter().map(|d| d.filename.as_str()).collect();
        assert_eq!(
            names,
            vec!["CM_Establish_Case_diagram_2_1.png", "CM_Establish_Case_diagram_3_2.png"]
        );
        assert!(tmp.path().join("CM_Establish_Case_diagram_3_2.png").is_file());

        // A second process reuses the same collected images.
        let second = source.diagrams_for("CM", "Manage Case", (1, 1));
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].page_reference, 1);
        assert!(source.diagrams_for("CM", "Close Case", (4, 9)).is_empty());
    }

    #[test]
    fn write_file_creates_dirs() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("images").join("x.png");
        write_file(&path, b"data").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"data");
    }
}
