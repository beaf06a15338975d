use anyhow::Result;
use caption_audit::data::{DataUnpacker, Split};
use caption_audit::{logging, stats, uitviic, vivqa};
use caption_audit::{SanityLog, UitViicMeta, UitViicUnpacker, ViVqaMeta, ViVqaUnpacker};
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::ProgressBar;
use std::path::PathBuf;

#[derive(Parser)]
#[command(version, about = "Audit COCO-based captioning and VQA datasets")]
struct Cli {
    #[arg(long, value_enum, default_value_t = Dataset::Uitviic)]
    dataset: Dataset,

    /// Directory holding train2017/, val2017/ and the annotation checkouts
    #[arg(long)]
    data_root: Option<PathBuf>,

    #[arg(short, long)]
    verbose: bool,

    #[arg(long)]
    no_progress: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum Dataset {
    Uitviic,
    Vivqa,
}

#[derive(Subcommand)]
enum Command {
    /// Check that every referenced image exists
    Sanity {
        #[arg(long)]
        log_file: Option<PathBuf>,
    },
    /// Print image dimension statistics
    Stats {
        /// Also write per-image dimensions to this CSV
        #[arg(long)]
        measurements: Option<PathBuf>,
    },
    /// Print one annotation and its image path
    Item {
        #[arg(long, value_enum, default_value_t = Split::Train)]
        split: Split,
        #[arg(long, default_value_t = 0)]
        index: usize,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose)?;
    let show_progress = !cli.no_progress;

    match cli.dataset {
        Dataset::Uitviic => {
            let meta = match &cli.data_root {
                Some(root) => UitViicMeta::from_root(root),
                None => UitViicMeta::default(),
            };
            let unpacker = UitViicUnpacker::new(meta).with_progress(show_progress);
            run(&unpacker, cli.command, uitviic::SANITY_LOG_FILE, show_progress)
        }
        Dataset::Vivqa => {
            let meta = match &cli.data_root {
                Some(root) => ViVqaMeta::from_root(root),
                None => ViVqaMeta::default(),
            };
            let unpacker = ViVqaUnpacker::new(meta).with_progress(show_progress);
            run(&unpacker, cli.command, vivqa::SANITY_LOG_FILE, show_progress)
        }
    }
}

fn run<U: DataUnpacker>(
    unpacker: &U,
    command: Command,
    default_log: &str,
    show_progress: bool,
) -> Result<()> {
    match command {
        Command::Sanity { log_file } => {
            let log_file = log_file.unwrap_or_else(|| PathBuf::from(default_log));
            let mut log = SanityLog::create(&log_file, unpacker.name())?;
            let summary = unpacker.run_sanity_check(&mut log)?;
            println!("{}", summary);
            println!("Sanity log written to {}.", log_file.display());
        }
        Command::Stats { measurements } => {
            let image_list = unpacker.get_image_list()?;
            println!("Found {} images.", image_list.len());

            let pb = if show_progress {
                ProgressBar::new(image_list.len() as u64)
            } else {
                ProgressBar::hidden()
            };
            let report = match &measurements {
                Some(path) => {
                    let mut writer = csv::Writer::from_path(path)?;
                    let report =
                        stats::DimensionStats::measure(&image_list, Some(&mut writer), &pb)?;
                    writer.flush()?;
                    report
                }
                None => stats::DimensionStats::measure::<_, std::fs::File>(&image_list, None, &pb)?,
            };
            pb.finish_and_clear();

            println!("{}", report);
            if let Some(path) = measurements {
                println!("Measurements saved to {}.", path.display());
                println!("To plot them, run: cargo run --bin analyze -- {}", path.display());
            }
        }
        Command::Item { split, index } => match unpacker.get_item(index, split)? {
            Some((record, img_file)) => {
                println!("{}", record);
                println!("{}", img_file.display());
            }
            None => println!("No item with an image at index {} of {} split.", index, split),
        },
    }
    Ok(())
}
