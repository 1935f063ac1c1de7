#![cfg(not(tarpaulin_include))]
use review_insights::{downloader, graph};
use std::env;
use std::path::PathBuf;

/// Renders the four charts and the PDF report without starting the server
///
/// Usage: `render_charts [output_dir]` (defaults to `graph_output`)
fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let output_dir = env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("graph_output"));

    for (kind, path) in graph::save_all_charts(&output_dir)? {
        println!("Created {} chart at {}", kind.title(), path.display());
    }

    let report = downloader::build_report()?;
    let path = output_dir.join(downloader::REPORT_FILE_NAME);
    downloader::write_report(&path, &report)?;
    println!("Created report at {}", path.display());

    Ok(())
}
