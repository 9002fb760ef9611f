use crate::analysis::{AvailabilityCalculator, FrequencyDistribution};
use crate::models::{FileError, LoadOutcome, QualityLevel, StationResult};
use crate::readers::{discover_station_files, AodReader};
use crate::settings::Settings;
use crate::utils::progress::ProgressReporter;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmptyFile {
    pub level: QualityLevel,
    pub station: String,
    pub path: PathBuf,
}

/// Everything one pass over the level directories produced.
#[derive(Debug, Clone, Default)]
pub struct AnalysisRun {
    pub results: BTreeMap<QualityLevel, Vec<StationResult>>,
    pub distributions: BTreeMap<QualityLevel, BTreeMap<String, FrequencyDistribution>>,
    pub empty_files: Vec<EmptyFile>,
    pub errors: Vec<FileError>,
    pub files_seen: usize,
    pub files_loaded: usize,
}

impl AnalysisRun {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a level as present even if none of its files yield a result.
    pub fn register_level(&mut self, level: QualityLevel) {
        self.results.entry(level).or_default();
        self.distributions.entry(level).or_default();
    }

    pub fn record_result(&mut self, result: StationResult, distribution: FrequencyDistribution) {
        self.distributions
            .entry(result.level)
            .or_default()
            .insert(result.station.clone(), distribution);
        self.results.entry(result.level).or_default().push(result);
    }

    pub fn has_station(&self, level: QualityLevel, station: &str) -> bool {
        self.distributions
            .get(&level)
            .is_some_and(|stations| stations.contains_key(station))
    }

    pub fn record_empty(&mut self, level: QualityLevel, station: String, path: &Path) {
        self.empty_files.push(EmptyFile {
            level,
            station,
            path: path.to_path_buf(),
        });
    }

    pub fn record_error(&mut self, error: FileError) {
        self.errors.push(error);
    }

    pub fn levels(&self) -> impl Iterator<Item = QualityLevel> + '_ {
        self.results.keys().copied()
    }

    pub fn results_for(&self, level: QualityLevel) -> &[StationResult] {
        self.results.get(&level).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn qualifying(&self, level: QualityLevel) -> Vec<&StationResult> {
        self.results_for(level).iter().filter(|r| r.qualifies).collect()
    }

    pub fn all_results(&self) -> impl Iterator<Item = &StationResult> {
        self.results.values().flatten()
    }

    /// All stations of a level pooled into one distribution.
    pub fn level_distribution(&self, level: QualityLevel) -> FrequencyDistribution {
        let mut pooled = FrequencyDistribution::default();
        if let Some(stations) = self.distributions.get(&level) {
            for distribution in stations.values() {
                pooled.merge(distribution);
            }
        }
        pooled
    }

    pub fn station_count(&self) -> usize {
        self.all_results().count()
    }
}

/// Station files found for one quality level.
#[derive(Debug, Clone)]
pub struct LevelFiles {
    pub level: QualityLevel,
    pub dir: PathBuf,
    pub files: Vec<PathBuf>,
}

pub struct AvailabilityProcessor {
    settings: Settings,
    reader: AodReader,
    calculator: AvailabilityCalculator,
    levels: Vec<QualityLevel>,
    load_only: bool,
}

impl AvailabilityProcessor {
    pub fn new(settings: &Settings) -> Self {
        Self {
            settings: settings.clone(),
            reader: AodReader::from_settings(settings),
            calculator: AvailabilityCalculator::from_settings(settings),
            levels: QualityLevel::ALL.to_vec(),
            load_only: false,
        }
    }

    pub fn with_levels(mut self, levels: Vec<QualityLevel>) -> Self {
        if !levels.is_empty() {
            let mut levels = levels;
            levels.sort();
            levels.dedup();
            self.levels = levels;
        }
        self
    }

    /// Only load files: no availability is computed.
    pub fn with_load_only(mut self, load_only: bool) -> Self {
        self.load_only = load_only;
        self
    }

    /// List station files per level. Missing directories are skipped with a
    /// warning; unreadable ones go to the error log.
    pub fn discover(&self, run: &mut AnalysisRun) -> Vec<LevelFiles> {
        let mut plan = Vec::new();

        for &level in &self.levels {
            let dir = self.settings.level_dir(level);
            if !dir.is_dir() {
                warn!("Directory not found for {}: {}", level, dir.display());
                continue;
            }

            match discover_station_files(&dir, &self.settings.file_extension) {
                Ok(files) => {
                    info!("Found {} station files for {} in {}", files.len(), level, dir.display());
                    run.register_level(level);
                    plan.push(LevelFiles { level, dir, files });
                }
                Err(e) => {
                    error!("Cannot list {}: {}", dir.display(), e);
                    run.record_error(FileError::new(
                        level,
                        level.default_dir(),
                        dir.clone(),
                        e.to_string(),
                    ));
                }
            }
        }

        plan
    }

    pub fn process(&self, progress: Option<&ProgressReporter>) -> AnalysisRun {
        let mut run = AnalysisRun::new();
        let plan = self.discover(&mut run);
        self.process_discovered(&plan, &mut run, progress);
        run
    }

    /// Files are processed one after another; a failing file is logged and
    /// skipped.
    pub fn process_discovered(
        &self,
        plan: &[LevelFiles],
        run: &mut AnalysisRun,
        progress: Option<&ProgressReporter>,
    ) {
        for level_files in plan {
            info!("Processing level {}", level_files.level);
            if let Some(p) = progress {
                p.set_message(&format!("Processing {}", level_files.level));
            }
            for path in &level_files.files {
                if let Some(p) = progress {
                    p.advance(path);
                }
                self.process_file(path, level_files.level, run);
            }
        }

        if let Some(p) = progress {
            p.finish_with_message(&format!(
                "Processed {} files ({} empty, {} errors)",
                run.files_seen,
                run.empty_files.len(),
                run.errors.len()
            ));
        }
    }

    pub fn process_file(&self, path: &Path, level: QualityLevel, run: &mut AnalysisRun) {
        run.files_seen += 1;
        let station =
            AodReader::station_name(path).unwrap_or_else(|_| path.display().to_string());

        if run.has_station(level, &station) {
            warn!("Station {} [{}] already analyzed, skipping {}", station, level, path.display());
            run.record_error(FileError::new(
                level,
                station.as_str(),
                path,
                "station name already used by another file of this level",
            ));
            return;
        }

        match self.reader.read_station(path, level) {
            Ok(LoadOutcome::Empty) => {
                warn!("Empty file: {}", path.display());
                run.record_empty(level, station, path);
            }
            Ok(LoadOutcome::Loaded(dataset)) => {
                run.files_loaded += 1;
                if self.load_only {
                    if let Some((first, last)) = dataset.date_range() {
                        debug!(
                            "Loaded {} rows ({} with AOD) from {}, {} to {}",
                            dataset.len(),
                            dataset.valid_measurements(),
                            path.display(),
                            first,
                            last
                        );
                    }
                    return;
                }

                let counts = self.calculator.daily_counts(&dataset);
                if counts.is_empty() {
                    warn!("No data within the analysis period: {}", path.display());
                    run.record_empty(level, station, path);
                    return;
                }

                let result = self.calculator.calculate_from_counts(&dataset, &counts);
                if let Err(e) = result.check() {
                    error!("Inconsistent result for {}: {}", path.display(), e);
                    run.record_error(FileError::new(level, station, path, e.to_string()));
                    return;
                }
                debug!("{} [{}]: {}", path.display(), level, result.summary_line());
                run.record_result(result, counts.frequency_distribution());
            }
            Err(e) => {
                error!("Error processing {}: {}", path.display(), e);
                run.record_error(FileError::new(level, station, path, e.to_string()));
            }
        }
    }
}
