use std::path::Path;
use tracing::{info, warn};

use crate::analysis::AvailabilityCalculator;
use crate::cli::args::{Cli, Commands, RunOptions};
use crate::error::Result;
use crate::models::{LoadOutcome, QualityLevel};
use crate::plotting::ChartRenderer;
use crate::processors::{AnalysisRun, AvailabilityProcessor};
use crate::readers::AodReader;
use crate::report::SummaryReport;
use crate::settings::Settings;
use crate::utils::progress::ProgressReporter;
use crate::writers::ReportWriter;

pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Analyze {
            options,
            no_plots,
            levels,
        } => analyze(&options, no_plots, levels, cli.verbose),

        Commands::Station {
            file,
            level,
            options,
        } => station(&file, level, &options),

        Commands::Validate { options } => validate(&options),
    }
}

fn load_settings(options: &RunOptions, disable_plots: bool) -> Result<Settings> {
    let settings =
        Settings::load(options.config.as_deref())?.with_overrides(options.overrides(disable_plots))?;
    info!(
        "Thresholds: >= {} measurements/day, >= {:.1}% valid days ({:?} basis)",
        settings.min_measurements_per_day, settings.min_valid_days_percentage, settings.basis
    );
    Ok(settings)
}

fn analyze(
    options: &RunOptions,
    no_plots: bool,
    levels: Vec<QualityLevel>,
    verbose: bool,
) -> Result<()> {
    let settings = load_settings(options, no_plots)?;

    println!("Analyzing AERONET data availability...");
    println!("Data root: {}", settings.data_root.display());
    println!("Output directory: {}", settings.output_dir.display());

    std::fs::create_dir_all(&settings.output_dir)?;

    let processor = AvailabilityProcessor::new(&settings).with_levels(levels);
    let mut run = AnalysisRun::new();
    let plan = processor.discover(&mut run);

    let total_files: usize = plan.iter().map(|level| level.files.len()).sum();
    if total_files == 0 {
        warn!("No station files found under {}", settings.data_root.display());
    }

    let progress =
        ProgressReporter::for_files(total_files as u64, "Analyzing station files...", false);
    processor.process_discovered(&plan, &mut run, Some(&progress));

    if settings.plots.enabled {
        let renderer = ChartRenderer::from_settings(&settings)?;
        let charts = renderer.render_all(&mut run)?;
        println!("Saved {} charts to {}", charts, renderer.plots_dir().display());
    }

    let report = SummaryReport::new(
        settings.min_measurements_per_day,
        settings.min_valid_days_percentage,
    )
    .with_distributions(verbose)
    .generate(&run);
    println!("\n{}", report);

    let writer = ReportWriter::new();
    let report_path = settings.report_path();
    let rows = writer.write_report(&run, &report_path)?;
    writer.write_summary_json(&run, &settings.summary_path())?;
    println!("Report written to {} ({} rows)", report_path.display(), rows);

    println!("Analysis complete!");
    Ok(())
}

fn station(file: &Path, level: QualityLevel, options: &RunOptions) -> Result<()> {
    let settings = load_settings(options, true)?;
    let reader = AodReader::from_settings(&settings);
    let calculator = AvailabilityCalculator::from_settings(&settings);

    println!("Analyzing station file: {}", file.display());

    let dataset = match reader.read_station(file, level)? {
        LoadOutcome::Loaded(dataset) => dataset,
        LoadOutcome::Empty => {
            println!("File is empty: no measurements to analyze");
            return Ok(());
        }
    };

    let counts = calculator.daily_counts(&dataset);
    if counts.is_empty() {
        println!("No measurements within the analysis period");
        return Ok(());
    }

    let result = calculator.calculate_from_counts(&dataset, &counts);

    println!("\n{} [{}]", result.station, level);
    println!("Period: {}", result.period());
    println!(
        "Valid days: {} of {} ({:.2}%)",
        result.valid_days, result.total_days, result.valid_days_percentage
    );
    println!("Observed days: {}", result.observed_days);
    println!(
        "Measurements: {} total, {:.2} per day (min {}, max {})",
        result.total_measurements,
        result.mean_measurements_per_day,
        result.min_measurements_per_day,
        result.max_measurements_per_day
    );
    println!(
        "Representative days: {} ({:.2}%)",
        result.representative_days, result.representative_days_percentage
    );

    if result.qualifies {
        println!(
            "✅ Meets the {:.1}% valid-day criterion",
            calculator.min_valid_days_percentage()
        );
    } else {
        println!(
            "⚠️  Below the {:.1}% valid-day criterion",
            calculator.min_valid_days_percentage()
        );
    }

    println!("\nFrequency of valid measurements per day:");
    for (value, days) in counts.frequency_distribution().iter() {
        println!("  {:>4} measurements: {} days", value, days);
    }

    Ok(())
}

fn validate(options: &RunOptions) -> Result<()> {
    let settings = load_settings(options, true)?;

    println!("Validating AERONET station files...");
    println!("Data root: {}", settings.data_root.display());

    let processor = AvailabilityProcessor::new(&settings).with_load_only(true);
    let progress = ProgressReporter::new_spinner("Loading station files...", false);
    let run = processor.process(Some(&progress));

    println!(
        "\nFiles: {} seen, {} loaded, {} empty, {} errors",
        run.files_seen,
        run.files_loaded,
        run.empty_files.len(),
        run.errors.len()
    );

    if !run.empty_files.is_empty() {
        println!("\nEmpty files:");
        for empty in &run.empty_files {
            println!("  [{}] {}", empty.level, empty.path.display());
        }
    }

    if run.errors.is_empty() {
        println!("✅ All files loaded");
    } else {
        println!("\nError log:");
        for error in &run.errors {
            println!("  {}", error);
        }
        println!("⚠️  Found {} files that could not be loaded", run.errors.len());
    }

    Ok(())
}
