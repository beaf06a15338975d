use anyhow::{Context, Result};
use plotters::prelude::*;
use std::fs::File;
use std::path::Path;

use crate::stats::ImageMeasurement;

pub fn load_measurements(csv_path: &Path) -> Result<Vec<ImageMeasurement>> {
    let file = File::open(csv_path)
        .with_context(|| format!("Failed to open measurements {}", csv_path.display()))?;
    let mut rdr = csv::Reader::from_reader(file);

    let mut measurements = Vec::new();
    for result in rdr.deserialize() {
        let record: ImageMeasurement = result?;
        measurements.push(record);
    }
    Ok(measurements)
}

pub fn generate_plots(csv_path: &Path, out_png: &Path) -> Result<usize> {
    let measurements = load_measurements(csv_path)?;
    if measurements.is_empty() {
        anyhow::bail!("No measurements in {}", csv_path.display());
    }
    draw_dimensions(&measurements, out_png)?;
    Ok(measurements.len())
}

fn draw_dimensions(measurements: &[ImageMeasurement], out_png: &Path) -> Result<()> {
    let root = BitMapBackend::new(out_png, (1024, 800)).into_drawing_area();
    root.fill(&WHITE)?;

    let max_w = measurements.iter().map(|m| m.width).max().unwrap_or(0);
    let max_h = measurements.iter().map(|m| m.height).max().unwrap_or(0);

    let mut chart = ChartBuilder::on(&root)
        .caption("Image Dimensions", ("sans-serif", 40))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(0u32..(max_w + max_w / 20 + 1), 0u32..(max_h + max_h / 20 + 1))?;

    chart
        .configure_mesh()
        .x_desc("Width (px)")
        .y_desc("Height (px)")
        .draw()?;

    let color = Palette99::pick(0);
    chart.draw_series(
        measurements
            .iter()
            .map(|m| Circle::new((m.width, m.height), 2, color.mix(0.4).filled())),
    )?;

    root.present()?;
    Ok(())
}
