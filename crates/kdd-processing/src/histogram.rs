//! Label-frequency bar charts encoded as PNG.
//!
//! Charts are drawn with plotters into an in-memory RGB buffer and encoded
//! with `image`. Each chart has a caption such as
//! `"Training Set - Protocol Type"`, one bar per label in descending
//! frequency order, a light horizontal grid and labelled axes.
//!
//! Text needs a TrueType font. The font is looked up once per process:
//! first the file named by `KDD_HISTOGRAM_FONT`, then a few common system
//! locations. Without a font the chart keeps its bars and grid but no text.

use crate::config::HistogramConfig;
use crate::error::{ProcessingError, Result};
use crate::summary::label_frequency;
use crate::types::{LabelFrequency, SplitKind};
use image::{ImageFormat, RgbImage};
use once_cell::sync::Lazy;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::FontStyle;
use polars::prelude::DataFrame;
use std::io::Cursor;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Environment variable naming the font file used for chart text.
pub const FONT_ENV: &str = "KDD_HISTOGRAM_FONT";

const FONT_FAMILY: &str = "sans-serif";
const FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
    "/Library/Fonts/Arial.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

const BAR: RGBColor = RGBColor(31, 119, 180);
const GRID: RGBColor = RGBColor(225, 225, 225);
const AXIS: RGBColor = RGBColor(38, 38, 38);

const MIN_WIDTH: u32 = 64;
const MIN_HEIGHT: u32 = 48;
const MARGIN: u32 = 10;
const CAPTION_SIZE: u32 = 18;
const LABEL_SIZE: u32 = 12;
const X_LABEL_AREA: u32 = 40;
const Y_LABEL_AREA: u32 = 50;
const BAR_GAP: u32 = 8;

static FONT_AVAILABLE: Lazy<bool> = Lazy::new(register_label_font);

/// Register the first readable font under [`FONT_FAMILY`].
fn register_label_font() -> bool {
    let candidates = std::env::var_os(FONT_ENV)
        .map(PathBuf::from)
        .into_iter()
        .chain(FONT_CANDIDATES.iter().map(PathBuf::from));

    for path in candidates {
        let Ok(bytes) = std::fs::read(&path) else {
            continue;
        };
        // Registered fonts live for the whole process.
        let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
        if plotters::style::register_font(FONT_FAMILY, FontStyle::Normal, bytes).is_ok() {
            debug!(font = %path.display(), "Histogram font registered");
            return true;
        }
    }

    warn!(
        env = FONT_ENV,
        "No usable font found; histograms are drawn without text"
    );
    false
}

/// `"Training Set - Protocol Type"` for the train split of `protocol_type`.
pub fn chart_title(kind: SplitKind, label_column: &str) -> String {
    let label = label_column
        .split(['_', ' ', '-'])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ");
    format!("{} - {}", kind.display_name(), label)
}

fn render_error(err: impl std::fmt::Display) -> ProcessingError {
    ProcessingError::Render(err.to_string())
}

/// Renders one bar chart per split.
#[derive(Debug, Clone, Copy, Default)]
pub struct HistogramRenderer {
    config: HistogramConfig,
}

impl HistogramRenderer {
    pub fn new(config: HistogramConfig) -> Self {
        Self { config }
    }

    /// Render the label distribution of `frame` as PNG bytes.
    pub fn render(&self, kind: SplitKind, frame: &DataFrame, label_column: &str) -> Result<Vec<u8>> {
        let frequency = label_frequency(frame, label_column)?;
        self.render_frequency(&chart_title(kind, label_column), label_column, &frequency)
    }

    /// Like [`HistogramRenderer::render`], but a failure becomes an empty image.
    pub fn render_or_empty(&self, kind: SplitKind, frame: &DataFrame, label_column: &str) -> Vec<u8> {
        match self.render(kind, frame, label_column) {
            Ok(png) => png,
            Err(err) => {
                warn!(split = %kind, error = %err, "Histogram rendering failed, returning empty image");
                Vec::new()
            }
        }
    }

    /// Draw `frequency` under `title` and encode it as PNG.
    pub fn render_frequency(
        &self,
        title: &str,
        label_column: &str,
        frequency: &LabelFrequency,
    ) -> Result<Vec<u8>> {
        let HistogramConfig { width, height } = self.config;
        if width < MIN_WIDTH || height < MIN_HEIGHT {
            return Err(ProcessingError::Render(format!(
                "canvas {width}x{height} is smaller than {MIN_WIDTH}x{MIN_HEIGHT}"
            )));
        }

        let mut buffer = vec![0u8; width as usize * height as usize * 3];
        {
            let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
            root.fill(&WHITE).map_err(render_error)?;
            draw_chart(&root, title, label_column, frequency, *FONT_AVAILABLE)?;
            root.present().map_err(render_error)?;
        }

        let canvas = RgbImage::from_raw(width, height, buffer)
            .ok_or_else(|| render_error("pixel buffer does not match the canvas size"))?;
        let mut png = Vec::new();
        canvas
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(render_error)?;
        Ok(png)
    }
}

fn draw_chart(
    area: &DrawingArea<BitMapBackend<'_>, Shift>,
    title: &str,
    label_column: &str,
    frequency: &LabelFrequency,
    with_text: bool,
) -> Result<()> {
    let labels: Vec<&str> = frequency.entries().iter().map(|(l, _)| l.as_str()).collect();
    let slots = labels.len().max(1) as u32;
    let max_count = frequency.max_count() as u32;
    // Headroom above the tallest bar.
    let y_max = max_count + (max_count / 10).max(1);

    let mut builder = ChartBuilder::on(area);
    builder.margin(MARGIN);
    if with_text {
        builder
            .caption(title, (FONT_FAMILY, CAPTION_SIZE))
            .x_label_area_size(X_LABEL_AREA)
            .y_label_area_size(Y_LABEL_AREA);
    }
    let mut chart = builder
        .build_cartesian_2d((0u32..slots).into_segmented(), 0u32..y_max)
        .map_err(render_error)?;

    let label_of = |value: &SegmentValue<u32>| match value {
        SegmentValue::CenterOf(i) => labels.get(*i as usize).map(|l| l.to_string()).unwrap_or_default(),
        _ => String::new(),
    };

    {
        let mut mesh = chart.configure_mesh();
        mesh.disable_x_mesh()
            .bold_line_style(GRID.stroke_width(1))
            .light_line_style(WHITE.stroke_width(1))
            .axis_style(AXIS.stroke_width(1))
            .x_labels(labels.len().max(1))
            .x_label_formatter(&label_of);
        if with_text {
            mesh.label_style((FONT_FAMILY, LABEL_SIZE))
                .axis_desc_style((FONT_FAMILY, LABEL_SIZE))
                .x_desc(label_column)
                .y_desc("Count");
        }
        mesh.draw().map_err(render_error)?;
    }

    chart
        .draw_series(
            Histogram::vertical(&chart)
                .style(BAR.filled())
                .margin(BAR_GAP)
                .data(
                    frequency
                        .entries()
                        .iter()
                        .enumerate()
                        .map(|(i, (_, count))| (i as u32, *count as u32)),
                ),
        )
        .map_err(render_error)?;

    Ok(())
}
