use super::grid_spec::Orientation;

pub const MM_PER_INCH: f64 = 25.4;
pub const POINTS_PER_INCH: f64 = 72.0;

/// Physical page size and the resolution tiles are rendered at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageFormat {
    pub width_mm: f64,
    pub height_mm: f64,
    pub dpi: f64,
}

impl PageFormat {
    /// ISO A4 portrait at 300 DPI: 2480x3508 pixels
    pub const A4: Self = Self {
        width_mm: 210.0,
        height_mm: 297.0,
        dpi: 300.0,
    };

    /// The same paper turned to `orientation`.
    pub fn oriented(&self, orientation: Orientation) -> Self {
        let short = self.width_mm.min(self.height_mm);
        let long = self.width_mm.max(self.height_mm);
        let (width_mm, height_mm) = match orientation {
            Orientation::Portrait => (short, long),
            Orientation::Landscape => (long, short),
        };
        Self {
            width_mm,
            height_mm,
            dpi: self.dpi,
        }
    }

    /// Tile size in pixels, rounded to the nearest pixel.
    pub fn pixel_size(&self) -> (u32, u32) {
        (mm_to_px(self.width_mm, self.dpi), mm_to_px(self.height_mm, self.dpi))
    }

    /// Page size in PDF points.
    pub fn size_points(&self) -> (f32, f32) {
        (
            (self.width_mm * POINTS_PER_INCH / MM_PER_INCH) as f32,
            (self.height_mm * POINTS_PER_INCH / MM_PER_INCH) as f32,
        )
    }
}

impl Default for PageFormat {
    fn default() -> Self {
        Self::A4
    }
}

fn mm_to_px(mm: f64, dpi: f64) -> u32 {
    (mm * dpi / MM_PER_INCH).round().max(1.0) as u32
}
