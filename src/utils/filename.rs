use crate::models::QualityLevel;

/// Make a station name safe to embed in a file name
pub fn sanitize_station_name(station: &str) -> String {
    station
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// {station}_{level}_frequency_distribution.png
pub fn frequency_distribution_filename(station: &str, level: QualityLevel) -> String {
    format!(
        "{}_{}_frequency_distribution.png",
        sanitize_station_name(station),
        level.label()
    )
}

/// {station}_{level}_boxplot.png
pub fn station_boxplot_filename(station: &str, level: QualityLevel) -> String {
    format!("{}_{}_boxplot.png", sanitize_station_name(station), level.label())
}

/// {level}_cumulative_boxplot.png
pub fn cumulative_boxplot_filename(level: QualityLevel) -> String {
    format!("{}_cumulative_boxplot.png", level.label())
}

/// {level}_valid_days_percentage_boxplot.png
pub fn percentage_boxplot_filename(level: QualityLevel) -> String {
    format!("{}_valid_days_percentage_boxplot.png", level.label())
}

/// {level}_representative_days_boxplot_absolute.png
pub fn representative_days_boxplot_filename(level: QualityLevel) -> String {
    format!("{}_representative_days_boxplot_absolute.png", level.label())
}

/// {level}_representative_days_boxplot_percentage.png
pub fn representative_percentage_boxplot_filename(level: QualityLevel) -> String {
    format!("{}_representative_days_boxplot_percentage.png", level.label())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_station_name() {
        assert_eq!(sanitize_station_name("Sao_Paulo"), "Sao_Paulo");
        assert_eq!(sanitize_station_name("Rio/Branco 2"), "Rio_Branco_2");
        assert_eq!(sanitize_station_name("CUIABA-MIRANDA"), "CUIABA-MIRANDA");
    }

    #[test]
    fn test_plot_filenames() {
        assert_eq!(
            frequency_distribution_filename("Sao_Paulo", QualityLevel::Level20),
            "Sao_Paulo_lvl20_frequency_distribution.png"
        );
        assert_eq!(
            station_boxplot_filename("Manaus", QualityLevel::Level10),
            "Manaus_lvl10_boxplot.png"
        );
        assert_eq!(
            cumulative_boxplot_filename(QualityLevel::Level15),
            "lvl15_cumulative_boxplot.png"
        );
        assert_eq!(
            percentage_boxplot_filename(QualityLevel::Level20),
            "lvl20_valid_days_percentage_boxplot.png"
        );
        assert_eq!(
            representative_days_boxplot_filename(QualityLevel::Level10),
            "lvl10_representative_days_boxplot_absolute.png"
        );
        assert_eq!(
            representative_percentage_boxplot_filename(QualityLevel::Level15),
            "lvl15_representative_days_boxplot_percentage.png"
        );
    }

    #[test]
    fn test_distinct_stations_can_share_a_file_name() {
        assert_eq!(
            station_boxplot_filename("Rio Branco", QualityLevel::Level20),
            station_boxplot_filename("Rio_Branco", QualityLevel::Level20)
        );
    }
}
