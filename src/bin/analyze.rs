use anyhow::Result;
use caption_audit::viz;
use std::env;
use std::path::PathBuf;

fn main() -> Result<()> {
    // Optional CSV and PNG paths, otherwise defaults
    let args: Vec<String> = env::args().collect();
    let arg_or = |i: usize, default: &str| {
        PathBuf::from(args.get(i).map_or(default, String::as_str))
    };
    let measurements_csv = arg_or(1, "image_dimensions.csv");
    let out_png = arg_or(2, "image_dimensions.png");

    println!("Plotting image dimensions from {}...", measurements_csv.display());
    let count = viz::generate_plots(&measurements_csv, &out_png)?;
    println!("Done! Plotted {} images to {}.", count, out_png.display());

    Ok(())
}
