use crate::{
    aggregate::Aggregate,
    component::{Component, Detected},
    config::Config,
    engine::LabelScore,
};
use anyhow::{anyhow, Context, Result};
use printpdf::{
    BuiltinFont, Image, ImageTransform, IndirectFontRef, Mm, PdfDocument, PdfLayerReference, Pt,
};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const PAGE_WIDTH: f32 = 612.0;
const PAGE_HEIGHT: f32 = 792.0;
const NOT_AVAILABLE: &str = "Data Not Available (Not Visible)";
const IMAGE_PLACEHOLDER: &str = "[Error displaying image]";

/// Everything the PDF shows. Built once per successful analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportData {
    pub overall: u8,
    pub roof: Option<u8>,
    pub wall: Option<u8>,
    pub door: Option<u8>,
    pub description: String,
    pub image_path: PathBuf,
    pub generated_on: String,
}

impl ReportData {
    pub fn new(agg: &Aggregate, image_path: &Path, generated_on: String) -> Self {
        Self {
            overall: agg.overall,
            roof: agg.roof,
            wall: agg.wall,
            door: agg.door,
            description: agg.description.clone(),
            image_path: image_path.to_path_buf(),
            generated_on,
        }
    }
}

/// JSON companion to the PDF.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobReport {
    pub job_id: String,
    pub started: String,
    pub finished: String,
    pub aggregate: Aggregate,
    pub images: Vec<ImageRecord>,
    pub skipped: Vec<String>,
    pub degraded_scoring: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ImageRecord {
    Accepted {
        filename: String,
        saved_as: String,
        predictions: Vec<LabelScore>,
        detected: Detected,
        component: Component,
        score: u8,
    },
    Rejected {
        filename: String,
        predictions: Vec<LabelScore>,
        reason: String,
    },
    Corrupt {
        filename: String,
        error: String,
    },
    Unsupported {
        filename: String,
    },
}

pub fn format_component(score: Option<u8>) -> String {
    match score {
        Some(s) => format!("{s}/100"),
        None => NOT_AVAILABLE.to_string(),
    }
}

/// Per-component lines, always in wall, roof, door order.
pub fn score_lines(data: &ReportData) -> [String; 3] {
    [("Wall", data.wall), ("Roof", data.roof), ("Door", data.door)]
        .map(|(name, score)| format!("- {name} Condition: {}", format_component(score)))
}

/// Greedy word wrap on character count: a word joins the current line while
/// the joined line stays shorter than `limit`.
pub fn wrap_words(text: &str, limit: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line: Vec<&str> = Vec::new();
    let mut line_len = 0usize;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();
        let joined_len = if line.is_empty() {
            word_len
        } else {
            line_len + 1 + word_len
        };
        if joined_len < limit {
            line.push(word);
            line_len = joined_len;
        } else {
            lines.push(line.join(" "));
            line = vec![word];
            line_len = word_len;
        }
    }
    lines.push(line.join(" "));
    lines
}

/// Fits an image into the width cap, then the height cap, keeping aspect.
pub fn fit_image(width_px: u32, height_px: u32, max_w: f32, max_h: f32) -> (f32, f32) {
    let aspect = height_px as f32 / width_px.max(1) as f32;
    let mut w = max_w;
    let mut h = w * aspect;
    if h > max_h {
        h = max_h;
        w = h / aspect;
    }
    (w, h)
}

fn pt(v: f32) -> Mm {
    Mm::from(Pt(v))
}

/// Writes the single-page PDF report to `path`.
pub fn render_pdf(cfg: &Config, path: &Path, data: &ReportData) -> Result<()> {
    let (doc, page, layer) = PdfDocument::new(
        cfg.report.title.as_str(),
        pt(PAGE_WIDTH),
        pt(PAGE_HEIGHT),
        "Layer 1",
    );
    let layer = doc.get_page(page).get_layer(layer);
    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| anyhow!("PDF font error: {e}"))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| anyhow!("PDF font error: {e}"))?;

    let h = PAGE_HEIGHT;
    layer.use_text(cfg.report.title.as_str(), 24.0, pt(50.0), pt(h - 50.0), &bold);
    layer.use_text(
        format!("Generated on: {}", data.generated_on),
        12.0,
        pt(50.0),
        pt(h - 75.0),
        &font,
    );

    if let Err(err) = draw_image(cfg, &layer, &data.image_path, h) {
        warn!("report image failed ({}): {:#}", data.image_path.display(), err);
        layer.use_text(IMAGE_PLACEHOLDER, 12.0, pt(100.0), pt(h - 200.0), &font);
    }

    let mut y = h - 450.0;
    layer.use_text(
        format!("Overall GraminScore: {}/100", data.overall),
        18.0,
        pt(50.0),
        pt(y),
        &bold,
    );

    y -= 30.0;
    for line in score_lines(data) {
        layer.use_text(line, 14.0, pt(70.0), pt(y), &font);
        y -= 20.0;
    }
    y -= 20.0;

    layer.use_text("Assessment Description:", 14.0, pt(50.0), pt(y), &bold);
    y -= 20.0;
    draw_paragraph(&layer, &font, &data.description, cfg.report.wrap_chars, y);

    let file = File::create(path).with_context(|| format!("create report: {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    doc.save(&mut writer)
        .map_err(|e| anyhow!("PDF save error: {e}"))?;
    debug!("report written: {}", path.display());
    Ok(())
}

fn draw_image(cfg: &Config, layer: &PdfLayerReference, image_path: &Path, h: f32) -> Result<()> {
    let img = image::open(image_path)
        .with_context(|| format!("open image: {}", image_path.display()))?;
    let buf = img.to_rgb8();
    let (w_px, h_px) = buf.dimensions();
    let rgb = image::DynamicImage::ImageRgb8(buf);
    if w_px == 0 || h_px == 0 {
        return Err(anyhow!("image has zero size"));
    }
    let (w, hh) = fit_image(
        w_px,
        h_px,
        cfg.report.image_max_width,
        cfg.report.image_max_height,
    );

    // At 72 dpi one pixel is one point, so the scale factors are in points.
    Image::from_dynamic_image(&rgb).add_to_layer(
        layer.clone(),
        ImageTransform {
            translate_x: Some(pt(100.0)),
            translate_y: Some(pt(h - 400.0)),
            scale_x: Some(w / w_px as f32),
            scale_y: Some(hh / h_px as f32),
            dpi: Some(72.0),
            ..Default::default()
        },
    );
    Ok(())
}

fn draw_paragraph(layer: &PdfLayerReference, font: &IndirectFontRef, text: &str, limit: usize, top: f32) {
    // Helvetica 12 with the default 1.2 leading.
    let leading = 14.4;
    let mut y = top;
    for line in wrap_words(text, limit) {
        layer.use_text(line, 12.0, pt(50.0), pt(y), font);
        y -= leading;
    }
}

pub fn write_json(path: &Path, report: &JobReport) -> Result<()> {
    std::fs::write(path, serde_json::to_string_pretty(report)?)
        .with_context(|| format!("write {}", path.display()))
}
