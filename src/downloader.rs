#![cfg(not(tarpaulin_include))]
use crate::app::AppState;
use crate::error::{AppError, Result};
use crate::graph::{self, ChartKind};
use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};
use chrono::NaiveDate;
use printpdf::lopdf::{self, Object};
use printpdf::{BuiltinFont, Image, ImageTransform, Mm, PdfDocument, PdfLayerReference};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

pub const REPORT_TITLE: &str = "User Review Sentiment Analysis Report";
pub const REPORT_FILE_NAME: &str = "report.pdf";

// A4 portrait, in millimetres
const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const LEFT_MARGIN: f32 = 10.0;
const HEADING_BASELINE: f32 = 17.0;
const CHART_TOP: f32 = 30.0;
const CHART_WIDTH_MM: f32 = 180.0;

const MM_PER_INCH: f32 = 25.4;
const MM_PER_POINT: f32 = MM_PER_INCH / 72.0;

/// Builds the PDF report from freshly rendered charts
///
/// The document always has five pages: a title page followed by one page per
/// chart in [`ChartKind::ALL`] order.
///
/// # Returns
/// * The complete PDF file as bytes
pub fn build_report() -> Result<Vec<u8>> {
    let charts = graph::generate_all()?;
    compose_report(&charts, chrono::Local::now().date_naive())
}

/// Lays out a title page plus one page per chart PNG
pub fn compose_report(charts: &[(ChartKind, Vec<u8>)], generated_on: NaiveDate) -> Result<Vec<u8>> {
    let (doc, title_page, title_layer) =
        PdfDocument::new(REPORT_TITLE, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
    let heading_font = doc.add_builtin_font(BuiltinFont::HelveticaBold).map_err(pdf_error)?;
    let body_font = doc.add_builtin_font(BuiltinFont::Helvetica).map_err(pdf_error)?;

    let cover = doc.get_page(title_page).get_layer(title_layer);
    cover.use_text(
        REPORT_TITLE,
        16.0,
        Mm(centered_x(REPORT_TITLE, 16.0)),
        Mm(PAGE_HEIGHT - HEADING_BASELINE),
        &heading_font,
    );
    let stamp = format!("Generated on {}", generated_on.format("%B %-d, %Y"));
    cover.use_text(
        stamp.as_str(),
        10.0,
        Mm(centered_x(&stamp, 10.0)),
        Mm(PAGE_HEIGHT - HEADING_BASELINE - 10.0),
        &body_font,
    );

    for (kind, png) in charts {
        let (page, layer) = doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        let layer = doc.get_page(page).get_layer(layer);
        layer.use_text(
            kind.title(),
            12.0,
            Mm(LEFT_MARGIN),
            Mm(PAGE_HEIGHT - HEADING_BASELINE),
            &heading_font,
        );
        place_chart(layer, png)?;
    }

    let pdf = doc.save_to_bytes().map_err(pdf_error)?;
    compress_images(&pdf)
}

/// Flate-compresses every image XObject that has no filter yet
///
/// printpdf embeds charts as raw RGB samples.
fn compress_images(pdf: &[u8]) -> Result<Vec<u8>> {
    let mut document = lopdf::Document::load_mem(pdf).map_err(pdf_error)?;

    for object in document.objects.values_mut() {
        if let Object::Stream(stream) = object {
            if is_image(&stream.dict) {
                stream.compress().map_err(pdf_error)?;
            }
        }
    }

    let mut compressed = Vec::with_capacity(pdf.len() / 4);
    document.save_to(&mut compressed).map_err(pdf_error)?;
    Ok(compressed)
}

fn is_image(dict: &lopdf::Dictionary) -> bool {
    matches!(dict.get(b"Subtype"), Ok(Object::Name(name)) if name.as_slice() == b"Image")
}

/// Embeds a chart 30mm below the top edge, scaled to 180mm wide
fn place_chart(layer: PdfLayerReference, png: &[u8]) -> Result<()> {
    let chart = image::load_from_memory_with_format(png, image::ImageFormat::Png)?;
    let dpi = chart.width() as f32 * MM_PER_INCH / CHART_WIDTH_MM;
    let height_mm = chart.height() as f32 * MM_PER_INCH / dpi;

    Image::from_dynamic_image(&chart).add_to_layer(
        layer,
        ImageTransform {
            translate_x: Some(Mm(LEFT_MARGIN)),
            translate_y: Some(Mm(PAGE_HEIGHT - CHART_TOP - height_mm)),
            dpi: Some(dpi),
            ..Default::default()
        },
    );
    Ok(())
}

/// Approximate left edge that centres `text` on the page
///
/// Built-in fonts carry no metrics here, so an average Helvetica glyph
/// width of half the font size is assumed.
fn centered_x(text: &str, font_size: f32) -> f32 {
    let width = text.chars().count() as f32 * font_size * 0.5 * MM_PER_POINT;
    ((PAGE_WIDTH - width) / 2.0).max(LEFT_MARGIN)
}

/// Persists a report at `target`, replacing any previous one
///
/// The bytes go to a temporary file in the same directory which is then
/// renamed over the target, so readers never observe a partial report.
pub fn write_report(target: &Path, pdf: &[u8]) -> Result<()> {
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut staged = tempfile::NamedTempFile::new_in(dir)?;
    staged.write_all(pdf)?;
    staged.as_file().sync_all()?;
    staged.persist(target)?;

    log::info!("Report written to {} ({} bytes)", target.display(), pdf.len());
    Ok(())
}

fn pdf_error(err: impl std::fmt::Debug) -> AppError {
    AppError::Pdf(format!("{:?}", err))
}

/// Serve a freshly generated report as a download
///
/// The response body comes from the in-memory buffer; the copy on disk is
/// only a side effect.
pub async fn download_report(State(state): State<Arc<AppState>>) -> Result<Response> {
    let target = state.config.report_path();
    let pdf = tokio::task::spawn_blocking(move || -> Result<Vec<u8>> {
        let pdf = build_report()?;
        write_report(&target, &pdf)?;
        Ok(pdf)
    })
    .await??;

    let disposition = format!("attachment; filename=\"{}\"", REPORT_FILE_NAME);
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        pdf,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_count(pdf: &[u8]) -> usize {
        lopdf::Document::load_mem(pdf).unwrap().get_pages().len()
    }

    fn image_streams(pdf: &[u8]) -> Vec<lopdf::Stream> {
        lopdf::Document::load_mem(pdf)
            .unwrap()
            .objects
            .into_values()
            .filter_map(|object| match object {
                Object::Stream(stream) if is_image(&stream.dict) => Some(stream),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn report_has_title_page_plus_one_page_per_chart() {
        let pdf = build_report().unwrap();
        assert!(pdf.starts_with(b"%PDF"));
        assert_eq!(page_count(&pdf), 5);
    }

    #[test]
    fn chart_images_are_flate_compressed() {
        let pdf = build_report().unwrap();
        let images = image_streams(&pdf);
        assert_eq!(images.len(), ChartKind::ALL.len());

        let raw_rgb = (graph::CHART_WIDTH * graph::CHART_HEIGHT * 3) as usize;
        for image in &images {
            let filter = image.dict.get(b"Filter").unwrap().as_name().unwrap();
            assert_eq!(filter, b"FlateDecode");
            assert!(image.content.len() < raw_rgb / 4);
        }
        assert!(pdf.len() < raw_rgb);
    }

    #[test]
    fn compose_report_counts_pages_from_its_input() {
        let sentiment = graph::generate_sentiment_chart().unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();

        let pdf = compose_report(&[(ChartKind::Sentiment, sentiment)], date).unwrap();
        assert_eq!(page_count(&pdf), 2);
    }

    #[test]
    fn invalid_chart_bytes_are_an_image_error() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let err = compose_report(&[(ChartKind::Sales, b"not a png".to_vec())], date).unwrap_err();
        assert!(matches!(err, AppError::Image(_)));
    }

    #[test]
    fn write_report_replaces_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(REPORT_FILE_NAME);
        write_report(&path, b"%PDF-old").unwrap();
        write_report(&path, b"%PDF-new").unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-new");

        let leftovers = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn centred_text_stays_on_the_page() {
        let x = centered_x(REPORT_TITLE, 16.0);
        assert!(x > LEFT_MARGIN && x < PAGE_WIDTH / 2.0);
        assert_eq!(centered_x(&"x".repeat(500), 16.0), LEFT_MARGIN);
    }
}
