use crate::error::{ProcessingError, Result};
use crate::models::{LoadOutcome, Measurement, QualityLevel, StationDataset};
use crate::settings::Settings;
use crate::utils::constants::{AOD_COLUMN, DATE_COLUMN, DATE_FORMAT, HEADER_LINE, MISSING_VALUE};
use chrono::NaiveDate;
use encoding_rs::{UTF_8, WINDOWS_1252};
use std::borrow::Cow;
use std::fs;
use std::path::Path;
use tracing::debug;

pub struct AodReader {
    header_line: usize,
    date_column: String,
    aod_column: String,
    date_format: String,
    missing_value: f64,
}

impl AodReader {
    pub fn new() -> Self {
        Self {
            header_line: HEADER_LINE,
            date_column: DATE_COLUMN.to_string(),
            aod_column: AOD_COLUMN.to_string(),
            date_format: DATE_FORMAT.to_string(),
            missing_value: MISSING_VALUE,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            header_line: settings.header_line,
            date_column: settings.date_column.clone(),
            aod_column: settings.aod_column.clone(),
            date_format: settings.date_format.clone(),
            missing_value: settings.missing_value,
        }
    }

    pub fn with_header_line(mut self, header_line: usize) -> Self {
        self.header_line = header_line.max(1);
        self
    }

    /// Station name from the file stem (e.g. `Sao_Paulo.txt` -> `Sao_Paulo`)
    pub fn station_name(path: &Path) -> Result<String> {
        path.file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .ok_or_else(|| {
                ProcessingError::InvalidFormat(format!(
                    "Cannot derive station name from {}",
                    path.display()
                ))
            })
    }

    /// Load one station file.
    ///
    /// Returns `LoadOutcome::Empty` when the file holds no data rows. Missing
    /// required columns, undecodable content and data rows none of which
    /// carries a parseable date are errors.
    pub fn read_station(&self, path: &Path, level: QualityLevel) -> Result<LoadOutcome> {
        let station = Self::station_name(path)?;
        let bytes = fs::read(path)?;
        if bytes.is_empty() {
            return Ok(LoadOutcome::Empty);
        }

        let content = decode(path, &bytes)?;
        let Some(body) = self.skip_preamble(&content) else {
            debug!("{} ends before its header line", path.display());
            return Ok(LoadOutcome::Empty);
        };

        let measurements = self.parse_body(body, path)?;
        if measurements.is_empty() {
            return Ok(LoadOutcome::Empty);
        }

        Ok(LoadOutcome::Loaded(StationDataset::new(
            station,
            level,
            path.to_path_buf(),
            measurements,
        )))
    }

    /// Text from the header line onwards, `None` if the file is shorter.
    fn skip_preamble<'a>(&self, content: &'a str) -> Option<&'a str> {
        let mut offset = 0;
        let mut lines = content.split_inclusive('\n');
        for _ in 1..self.header_line {
            offset += lines.next()?.len();
        }
        let body = &content[offset..];
        if body.trim().is_empty() {
            None
        } else {
            Some(body)
        }
    }

    fn parse_body(&self, body: &str, path: &Path) -> Result<Vec<Measurement>> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(body.as_bytes());

        let headers = reader.headers()?.clone();
        let date_idx = self.column_index(&headers, &self.date_column, path)?;
        let aod_idx = self.column_index(&headers, &self.aod_column, path)?;

        let mut measurements = Vec::new();
        let mut rows = 0usize;
        let mut skipped = 0usize;

        for record in reader.records() {
            let record = record?;
            rows += 1;
            match self.parse_record(&record, date_idx, aod_idx) {
                Some(measurement) => measurements.push(measurement),
                None => skipped += 1,
            }
        }

        if rows > 0 && measurements.is_empty() {
            return Err(ProcessingError::InvalidFormat(format!(
                "{}: {} rows, none with a parseable date ({})",
                path.display(),
                rows,
                self.date_format
            )));
        }

        if skipped > 0 {
            debug!(
                "Skipped {} rows with unparseable dates in {}",
                skipped,
                path.display()
            );
        }

        Ok(measurements)
    }

    fn column_index(&self, headers: &csv::StringRecord, column: &str, path: &Path) -> Result<usize> {
        headers
            .iter()
            .position(|h| h == column)
            .ok_or_else(|| ProcessingError::MissingColumn {
                column: column.to_string(),
                path: path.display().to_string(),
            })
    }

    /// Rows without a parseable date are dropped. A missing-value sentinel or
    /// a non-numeric AOD keeps the row but without a value.
    fn parse_record(
        &self,
        record: &csv::StringRecord,
        date_idx: usize,
        aod_idx: usize,
    ) -> Option<Measurement> {
        let date = NaiveDate::parse_from_str(record.get(date_idx)?, &self.date_format).ok()?;

        let aod = record
            .get(aod_idx)
            .and_then(|v| v.parse::<f64>().ok())
            .filter(|v| v.is_finite() && !self.is_missing(*v));

        Some(Measurement::new(date, aod))
    }

    fn is_missing(&self, value: f64) -> bool {
        (value - self.missing_value).abs() < 1e-9
    }
}

impl Default for AodReader {
    fn default() -> Self {
        Self::new()
    }
}

/// UTF-8 first, Windows-1252 (a Latin-1 superset) as the fallback.
fn decode<'a>(path: &Path, bytes: &'a [u8]) -> Result<Cow<'a, str>> {
    let text = match UTF_8.decode_without_bom_handling_and_without_replacement(bytes) {
        Some(text) => text,
        None => {
            debug!("{} is not valid UTF-8, decoding as Windows-1252", path.display());
            let (text, had_errors) = WINDOWS_1252.decode_without_bom_handling(bytes);
            if had_errors {
                return Err(ProcessingError::Decode {
                    path: path.display().to_string(),
                    message: "content is neither UTF-8 nor Windows-1252".to_string(),
                });
            }
            text
        }
    };

    Ok(match text {
        Cow::Borrowed(s) => Cow::Borrowed(s.trim_start_matches('\u{feff}')),
        Cow::Owned(s) => Cow::Owned(s.trim_start_matches('\u{feff}').to_string()),
    })
}

/// Data files in `dir` with the given extension, sorted by name.
pub fn discover_station_files(dir: &Path, extension: &str) -> Result<Vec<std::path::PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file()
            && path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case(extension))
        {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    const PREAMBLE: [&str; 6] = [
        "AERONET Version 3;",
        "Sao_Paulo",
        "Version 3: AOD Level 2.0",
        "The following data are automatically cloud cleared and quality assured",
        "Contact: PI=Paulo Artaxo",
        "Daily Averages,UNITS can be found at,,, https://aeronet.gsfc.nasa.gov/new_web/units.html",
    ];
    const HEADER: &str = "AERONET_Site,Date(dd:mm:yyyy),Time(hh:mm:ss),Day_of_Year,AOD_1640nm,AOD_500nm";

    fn write_station(dir: &TempDir, name: &str, rows: &[&str]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = fs::File::create(&path).unwrap();
        for line in PREAMBLE {
            writeln!(file, "{}", line).unwrap();
        }
        writeln!(file, "{}", HEADER).unwrap();
        for row in rows {
            writeln!(file, "{}", row).unwrap();
        }
        path
    }

    #[test]
    fn test_read_station_file() -> Result<()> {
        let dir = TempDir::new()?;
        let path = write_station(
            &dir,
            "Sao_Paulo.txt",
            &[
                "Sao_Paulo,01:06:2019,10:01:22,152,0.051,0.212",
                "Sao_Paulo,01:06:2019,10:16:22,152,0.049,-999.000000",
                "Sao_Paulo,02:06:2019,11:01:22,153,0.060,0.180",
                "Sao_Paulo,bad-date,11:01:22,153,0.060,0.180",
            ],
        );

        let reader = AodReader::new();
        let dataset = match reader.read_station(&path, QualityLevel::Level20)? {
            LoadOutcome::Loaded(dataset) => dataset,
            LoadOutcome::Empty => panic!("expected data"),
        };

        assert_eq!(dataset.station, "Sao_Paulo");
        assert_eq!(dataset.level, QualityLevel::Level20);
        assert_eq!(dataset.len(), 3);
        assert_eq!(dataset.valid_measurements(), 2);
        assert_eq!(dataset.measurements[0].aod, Some(0.212));
        assert_eq!(dataset.measurements[1].aod, None);
        assert_eq!(
            dataset.measurements[2].date,
            NaiveDate::from_ymd_opt(2019, 6, 2).unwrap()
        );

        Ok(())
    }

    #[test]
    fn test_zero_byte_file_is_empty() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("Brasilia.txt");
        fs::File::create(&path)?;

        let outcome = AodReader::new().read_station(&path, QualityLevel::Level10)?;
        assert!(outcome.is_empty());
        Ok(())
    }

    #[test]
    fn test_header_without_rows_is_empty() -> Result<()> {
        let dir = TempDir::new()?;
        let path = write_station(&dir, "Petrolina_SONDA.txt", &[]);

        let outcome = AodReader::new().read_station(&path, QualityLevel::Level15)?;
        assert!(outcome.is_empty());
        Ok(())
    }

    #[test]
    fn test_single_line_file_is_empty() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("Ji_Parana_SE.txt");
        fs::write(&path, "No data for the requested period\n")?;

        let outcome = AodReader::new().read_station(&path, QualityLevel::Level20)?;
        assert!(outcome.is_empty());
        Ok(())
    }

    #[test]
    fn test_rows_without_parseable_dates_are_error() {
        let dir = TempDir::new().unwrap();
        let path = write_station(
            &dir,
            "Cuiaba-Miranda.txt",
            &[
                "Cuiaba-Miranda,2020-01-01,10:00:00,1,0.05,0.2",
                "Cuiaba-Miranda,2020-01-02,10:00:00,2,0.05,0.3",
            ],
        );

        let err = AodReader::new()
            .read_station(&path, QualityLevel::Level20)
            .unwrap_err();
        assert!(matches!(err, ProcessingError::InvalidFormat(_)));
        assert!(err.to_string().contains("2 rows"));
    }

    #[test]
    fn test_missing_column_is_error() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("Campo_Grande_SONDA.txt");
        let mut file = fs::File::create(&path)?;
        for line in PREAMBLE {
            writeln!(file, "{}", line)?;
        }
        writeln!(file, "AERONET_Site,Date(dd:mm:yyyy),AOD_675nm")?;
        writeln!(file, "Campo_Grande_SONDA,01:06:2019,0.1")?;

        let err = AodReader::new()
            .read_station(&path, QualityLevel::Level10)
            .unwrap_err();
        assert!(matches!(err, ProcessingError::MissingColumn { ref column, .. } if column == "AOD_500nm"));
        Ok(())
    }

    #[test]
    fn test_latin1_content_is_decoded() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("Itajuba.txt");
        let mut bytes = Vec::new();
        for line in PREAMBLE {
            bytes.extend_from_slice(line.as_bytes());
            bytes.push(b'\n');
        }
        bytes.extend_from_slice(HEADER.as_bytes());
        bytes.push(b'\n');
        // 0xE1 is 'á' in Latin-1 and invalid as a lone UTF-8 byte
        bytes.extend_from_slice(b"Itajub\xe1,03:07:2020,12:00:00,185,0.02,0.15\n");
        fs::write(&path, bytes)?;

        match AodReader::new().read_station(&path, QualityLevel::Level15)? {
            LoadOutcome::Loaded(dataset) => assert_eq!(dataset.valid_measurements(), 1),
            LoadOutcome::Empty => panic!("expected data"),
        }
        Ok(())
    }

    #[test]
    fn test_custom_header_line() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("Rio_de_Janeiro_UFRJ.txt");
        fs::write(
            &path,
            "preamble\nDate(dd:mm:yyyy),AOD_500nm\n05:01:2021,0.3\n05:01:2021,0.4\n",
        )?;

        let reader = AodReader::new().with_header_line(2);
        match reader.read_station(&path, QualityLevel::Level10)? {
            LoadOutcome::Loaded(dataset) => assert_eq!(dataset.len(), 2),
            LoadOutcome::Empty => panic!("expected data"),
        }
        Ok(())
    }

    #[test]
    fn test_discover_station_files_sorted() -> Result<()> {
        let dir = TempDir::new()?;
        fs::write(dir.path().join("b_station.txt"), "")?;
        fs::write(dir.path().join("a_station.txt"), "")?;
        fs::write(dir.path().join("notes.md"), "")?;

        let files = discover_station_files(dir.path(), "txt")?;
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a_station.txt", "b_station.txt"]);
        Ok(())
    }
}
