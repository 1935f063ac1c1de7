#![cfg(not(tarpaulin_include))]
use crate::data::{self, Series};
use crate::error::{AppError, Result};
use plotters::coord::ranged1d::SegmentValue;
use plotters::prelude::*;
use std::io::Cursor;
use std::path::{Path, PathBuf};

/// Pixel size of every generated chart (a 5x3 inch figure at 100 dpi)
pub const CHART_WIDTH: u32 = 500;
pub const CHART_HEIGHT: u32 = 300;

const ORANGE: RGBColor = RGBColor(255, 165, 0);
const LINE_BLUE: RGBColor = RGBColor(31, 119, 180);

/// Available graph types supported by the application
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GraphType {
    /// Line graph with a marker on every data point
    Line,

    /// Bar graph, one bar per category, shaded along a blue palette
    Bar,
}

/// Configuration options for graph generation
///
/// This structure contains all the customizable properties for generating
/// one chart. The y axis always starts at zero and stops at `y_max`.
#[derive(Clone, Debug)]
pub struct GraphOptions {
    /// Title displayed at the top of the graph
    pub title: String,

    /// Label for the X-axis
    pub x_label: String,

    /// Label for the Y-axis
    pub y_label: String,

    /// Width of the graph in pixels
    pub width: u32,

    /// Height of the graph in pixels
    pub height: u32,

    /// Upper bound of the y axis
    pub y_max: u32,

    /// Type of graph to generate
    pub graph_type: GraphType,

    /// Line and marker color (ignored by bar graphs)
    pub color: RGBColor,
}

impl Default for GraphOptions {
    fn default() -> Self {
        Self {
            title: "Graph".to_string(),
            x_label: "X Axis".to_string(),
            y_label: "Y Axis".to_string(),
            width: CHART_WIDTH,
            height: CHART_HEIGHT,
            y_max: 100,
            graph_type: GraphType::Line,
            color: LINE_BLUE,
        }
    }
}

/// The four dashboard charts, in report order
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChartKind {
    Sentiment,
    Sales,
    Revenue,
    Visitors,
}

impl ChartKind {
    pub const ALL: [ChartKind; 4] = [
        ChartKind::Sentiment,
        ChartKind::Sales,
        ChartKind::Revenue,
        ChartKind::Visitors,
    ];

    /// Chart caption, also used as the report page heading
    pub fn title(self) -> &'static str {
        match self {
            ChartKind::Sentiment => "Sentiment Analysis",
            ChartKind::Sales => "Sales Performance",
            ChartKind::Revenue => "Revenue Overview",
            ChartKind::Visitors => "Visitor Statistics",
        }
    }

    /// Short name used for template keys and file names
    pub fn key(self) -> &'static str {
        match self {
            ChartKind::Sentiment => "sentiment",
            ChartKind::Sales => "sales",
            ChartKind::Revenue => "revenue",
            ChartKind::Visitors => "visitors",
        }
    }

    pub fn series(self) -> Series {
        match self {
            ChartKind::Sentiment => data::sentiment_counts(),
            ChartKind::Sales => data::sales_column(|row| row.sales),
            ChartKind::Revenue => data::sales_column(|row| row.revenue),
            ChartKind::Visitors => data::sales_column(|row| row.visitors),
        }
    }

    pub fn options(self) -> GraphOptions {
        let (x_label, y_label, y_max, graph_type, color) = match self {
            ChartKind::Sentiment => ("Sentiment", "Counts", 100, GraphType::Bar, LINE_BLUE),
            ChartKind::Sales => ("Month", "Sales", 600, GraphType::Line, LINE_BLUE),
            ChartKind::Revenue => ("Month", "Revenue", 3000, GraphType::Bar, LINE_BLUE),
            ChartKind::Visitors => ("Month", "Visitors", 400, GraphType::Line, ORANGE),
        };

        GraphOptions {
            title: self.title().to_string(),
            x_label: x_label.to_string(),
            y_label: y_label.to_string(),
            y_max,
            graph_type,
            color,
            ..GraphOptions::default()
        }
    }

    /// Renders this chart from its dataset into a PNG buffer
    pub fn render(self) -> Result<Vec<u8>> {
        create_graph(&self.series(), &self.options())
    }
}

/// Creates a PNG chart from a labelled series
///
/// Categories are laid out on a segmented x axis, one segment per label, so
/// bars fill their segment and line points sit at the segment centres.
///
/// # Arguments
/// * `series` - Labels and values to plot
/// * `options` - Graph styling and type options
///
/// # Returns
/// * PNG image data as bytes
pub fn create_graph(series: &Series, options: &GraphOptions) -> Result<Vec<u8>> {
    if series.is_empty() {
        return Err(AppError::Chart("cannot plot an empty series".to_string()));
    }

    let (width, height) = (options.width, options.height);
    let mut pixels = vec![0u8; width as usize * height as usize * 3];
    {
        let root = BitMapBackend::with_buffer(&mut pixels, (width, height)).into_drawing_area();
        root.fill(&WHITE).map_err(chart_error)?;

        // Integer ranges are inclusive for discrete coordinates
        let last = (series.len() - 1) as u32;
        let mut chart = ChartBuilder::on(&root)
            .caption(&options.title, ("sans-serif", 20).into_font())
            .margin(10)
            .x_label_area_size(35)
            .y_label_area_size(50)
            .build_cartesian_2d((0u32..last).into_segmented(), 0u32..options.y_max)
            .map_err(chart_error)?;

        let labels = &series.labels;
        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(series.len())
            .x_label_formatter(&|value: &SegmentValue<u32>| segment_label(labels, value))
            .x_desc(&options.x_label)
            .y_desc(&options.y_label)
            .draw()
            .map_err(chart_error)?;

        match options.graph_type {
            GraphType::Bar => {
                chart
                    .draw_series(series.points().map(|(idx, value)| {
                        let idx = idx as u32;
                        let mut bar = Rectangle::new(
                            [(SegmentValue::Exact(idx), 0), (SegmentValue::Exact(idx + 1), value)],
                            bar_shade(idx as usize, series.len()).filled(),
                        );
                        bar.set_margin(0, 0, 6, 6);
                        bar
                    }))
                    .map_err(chart_error)?;
            }
            GraphType::Line => {
                let color = options.color;
                chart
                    .draw_series(LineSeries::new(
                        series
                            .points()
                            .map(|(idx, value)| (SegmentValue::CenterOf(idx as u32), value)),
                        color.stroke_width(2),
                    ))
                    .map_err(chart_error)?;
                chart
                    .draw_series(series.points().map(|(idx, value)| {
                        Circle::new((SegmentValue::CenterOf(idx as u32), value), 4, color.filled())
                    }))
                    .map_err(chart_error)?;
            }
        }

        root.present().map_err(chart_error)?;
    }

    encode_png(pixels, width, height)
}

pub fn generate_sentiment_chart() -> Result<Vec<u8>> {
    ChartKind::Sentiment.render()
}

pub fn generate_sales_chart() -> Result<Vec<u8>> {
    ChartKind::Sales.render()
}

pub fn generate_revenue_chart() -> Result<Vec<u8>> {
    ChartKind::Revenue.render()
}

pub fn generate_visitors_chart() -> Result<Vec<u8>> {
    ChartKind::Visitors.render()
}

/// Renders all four charts from scratch, in report order
pub fn generate_all() -> Result<Vec<(ChartKind, Vec<u8>)>> {
    let mut charts = Vec::with_capacity(ChartKind::ALL.len());
    for kind in ChartKind::ALL {
        charts.push((kind, kind.render()?));
    }
    Ok(charts)
}

/// Saves every chart as `<key>_chart.png` inside `output_dir`
///
/// Creates the directory if it does not exist yet.
///
/// # Returns
/// * A vector of tuples containing the chart and the written file path
pub fn save_all_charts(output_dir: &Path) -> Result<Vec<(ChartKind, PathBuf)>> {
    std::fs::create_dir_all(output_dir)?;

    let mut written = Vec::with_capacity(ChartKind::ALL.len());
    for (kind, png) in generate_all()? {
        let path = output_dir.join(format!("{}_chart.png", kind.key()));
        std::fs::write(&path, png)?;
        written.push((kind, path));
    }
    Ok(written)
}

fn segment_label(labels: &[&str], value: &SegmentValue<u32>) -> String {
    match value {
        SegmentValue::CenterOf(idx) | SegmentValue::Exact(idx) => labels
            .get(*idx as usize)
            .map(|label| label.to_string())
            .unwrap_or_default(),
        SegmentValue::Last => String::new(),
    }
}

/// Picks a shade between light and dark blue for bar `idx` of `count`
fn bar_shade(idx: usize, count: usize) -> RGBColor {
    const LIGHT: (f64, f64, f64) = (158.0, 202.0, 225.0);
    const DARK: (f64, f64, f64) = (8.0, 81.0, 156.0);

    let t = if count > 1 {
        idx as f64 / (count - 1) as f64
    } else {
        1.0
    };
    let mix = |from: f64, to: f64| (from + (to - from) * t).round() as u8;
    RGBColor(mix(LIGHT.0, DARK.0), mix(LIGHT.1, DARK.1), mix(LIGHT.2, DARK.2))
}

fn encode_png(pixels: Vec<u8>, width: u32, height: u32) -> Result<Vec<u8>> {
    let frame = image::RgbImage::from_raw(width, height, pixels)
        .ok_or_else(|| AppError::Chart("pixel buffer does not match chart size".to_string()))?;

    let mut png = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(frame).write_to(&mut png, image::ImageOutputFormat::Png)?;
    Ok(png.into_inner())
}

fn chart_error(err: impl std::fmt::Display) -> AppError {
    AppError::Chart(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    #[test]
    fn every_chart_is_a_png_of_the_configured_size() {
        for kind in ChartKind::ALL {
            let png = kind.render().unwrap();
            assert!(png.starts_with(&PNG_SIGNATURE), "{:?} is not a PNG", kind);

            let decoded = image::load_from_memory(&png).unwrap();
            assert_eq!(decoded.width(), CHART_WIDTH);
            assert_eq!(decoded.height(), CHART_HEIGHT);
        }
    }

    #[test]
    fn charts_are_distinct_and_deterministic() {
        let first = generate_all().unwrap();
        let second = generate_all().unwrap();
        assert_eq!(first.len(), 4);

        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.0, b.0);
            assert_eq!(a.1, b.1, "{:?} changed between renders", a.0);
        }
        for i in 0..first.len() {
            for j in (i + 1)..first.len() {
                assert_ne!(first[i].1, first[j].1);
            }
        }
    }

    #[test]
    fn chart_options_follow_dataset_bounds() {
        let sentiment = ChartKind::Sentiment.options();
        assert_eq!(sentiment.graph_type, GraphType::Bar);
        assert_eq!(sentiment.y_max, 100);
        assert_eq!(sentiment.x_label, "Sentiment");

        let visitors = ChartKind::Visitors.options();
        assert_eq!(visitors.graph_type, GraphType::Line);
        assert_eq!(visitors.y_max, 400);
        assert_eq!(visitors.color, ORANGE);

        assert_eq!(ChartKind::Revenue.options().y_max, 3000);
        assert_eq!(ChartKind::Sales.options().y_max, 600);
    }

    #[test]
    fn empty_series_is_rejected() {
        let empty = Series {
            labels: Vec::new(),
            values: Vec::new(),
        };
        assert!(matches!(
            create_graph(&empty, &GraphOptions::default()),
            Err(AppError::Chart(_))
        ));
    }

    #[test]
    fn save_all_charts_writes_one_file_per_chart() {
        let dir = tempfile::tempdir().unwrap();
        let written = save_all_charts(&dir.path().join("charts")).unwrap();

        assert_eq!(written.len(), 4);
        for (kind, path) in written {
            assert!(path.ends_with(format!("{}_chart.png", kind.key())));
            assert!(std::fs::metadata(&path).unwrap().len() > 0);
        }
    }

    #[test]
    fn segment_labels_map_to_categories() {
        let labels = ["Positive", "Neutral", "Negative"];
        assert_eq!(segment_label(&labels, &SegmentValue::CenterOf(1)), "Neutral");
        assert_eq!(segment_label(&labels, &SegmentValue::Exact(7)), "");
        assert_eq!(segment_label(&labels, &SegmentValue::Last), "");
    }
}
