//! Turning an ordered run of tiles into a printable document.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::AssemblyError;
use crate::models::{Orientation, PageFormat};
use crate::rendering::EncodedTile;

/// Physical page description handed to a [`DocumentSink`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct PageLayout {
    pub orientation: Orientation,
    pub width_mm: f64,
    pub height_mm: f64,
}

impl PageLayout {
    pub fn new(page: &PageFormat, orientation: Orientation) -> Self {
        let oriented = page.oriented(orientation);
        Self {
            orientation,
            width_mm: oriented.width_mm,
            height_mm: oriented.height_mm,
        }
    }

    fn size_points(&self) -> (f32, f32) {
        PageFormat {
            width_mm: self.width_mm,
            height_mm: self.height_mm,
            dpi: 0.0,
        }
        .size_points()
    }
}

/// Consumer of a finished tile sequence.
///
/// Pages arrive in row-major order and must appear in the document in that
/// order, one tile per page.
pub trait DocumentSink: Send + Sync {
    /// Whether the sink can currently produce documents.
    fn is_ready(&self) -> bool {
        true
    }

    fn assemble(&self, pages: &[EncodedTile], layout: &PageLayout)
        -> Result<Vec<u8>, AssemblyError>;
}

/// Writes one full-bleed JPEG page per tile into a PDF.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfAssembler;

impl PdfAssembler {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentSink for PdfAssembler {
    fn assemble(
        &self,
        pages: &[EncodedTile],
        layout: &PageLayout,
    ) -> Result<Vec<u8>, AssemblyError> {
        if pages.is_empty() {
            return Err(AssemblyError::EmptyDocument);
        }

        let (page_w, page_h) = layout.size_points();
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let mut kids: Vec<Object> = Vec::with_capacity(pages.len());

        for tile in pages {
            // JPEG bytes go in as-is; DCTDecode is the native PDF codec for them
            let image = Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => tile.width as i64,
                    "Height" => tile.height as i64,
                    "ColorSpace" => "DeviceRGB",
                    "BitsPerComponent" => 8i64,
                    "Filter" => "DCTDecode",
                },
                tile.jpeg.clone(),
            );
            let image_id = doc.add_object(image);

            let content = Content {
                operations: vec![
                    Operation::new("q", vec![]),
                    Operation::new(
                        "cm",
                        vec![
                            Object::Real(page_w),
                            0i64.into(),
                            0i64.into(),
                            Object::Real(page_h),
                            0i64.into(),
                            0i64.into(),
                        ],
                    ),
                    Operation::new("Do", vec!["Tile".into()]),
                    Operation::new("Q", vec![]),
                ],
            };
            let encoded = content
                .encode()
                .map_err(|e| AssemblyError::Pdf(e.to_string()))?;
            let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));

            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![
                    0i64.into(),
                    0i64.into(),
                    Object::Real(page_w),
                    Object::Real(page_h),
                ],
                "Contents" => content_id,
                "Resources" => dictionary! {
                    "XObject" => dictionary! {
                        "Tile" => image_id,
                    },
                },
            });
            kids.push(page_id.into());
        }

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => pages.len() as i64,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut out = Vec::new();
        doc.save_to(&mut out)
            .map_err(|e| AssemblyError::Pdf(e.to_string()))?;

        tracing::info!(
            pages = pages.len(),
            orientation = %layout.orientation,
            bytes = out.len(),
            "Assembled PDF"
        );
        Ok(out)
    }
}
