//! Run configuration.
//!
//! Every list the pipeline depends on (excluded stations, important features,
//! region boxes, month ranges) lives here rather than in the stage code. The
//! whole structure round-trips through TOML so a run can be pinned to a file.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{error::PipelineError, grid::Region};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub paths: PathConfig,
    pub calendar: CalendarConfig,
    pub aggregate: AggregateConfig,
    pub clean: CleanConfig,
    pub normalize: NormalizeConfig,
    pub reduce: ReduceConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            paths: PathConfig::default(),
            calendar: CalendarConfig::default(),
            aggregate: AggregateConfig::default(),
            clean: CleanConfig::default(),
            normalize: NormalizeConfig::default(),
            reduce: ReduceConfig::default(),
        }
    }
}

impl RunConfig {
    /// The FMI variant of the aggregation: a longer exclusion list and a fixed
    /// station for the timestamp axis.
    pub fn fmi_preset() -> Self {
        RunConfig {
            aggregate: AggregateConfig {
                excluded_stations: FMI_EXCLUDED_STATIONS
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
                timestamp_station: Some("Espoo Nuuksio".to_string()),
                ..AggregateConfig::default()
            },
            ..RunConfig::default()
        }
    }

    /// Read a configuration from a TOML file. A relative `data_root` is taken
    /// relative to the directory holding the file.
    pub fn read_from_path<P: AsRef<Path>>(p: P) -> Result<Self, PipelineError> {
        let p = p.as_ref();
        let text = std::fs::read_to_string(p)
            .map_err(|e| PipelineError::MissingInput(p.to_path_buf(), e))?;

        let mut config: RunConfig =
            toml::from_str(&text).map_err(|e| PipelineError::MalformedInput {
                path: p.to_path_buf(),
                message: e.to_string(),
            })?;

        config.paths.data_root = path_relative_to_config(p, config.paths.data_root);
        config.validate()?;

        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, PipelineError> {
        toml::to_string_pretty(self).map_err(|e| PipelineError::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), PipelineError> {
        let cal = &self.calendar;
        if cal.month_lengths.len() != 12 {
            return Err(PipelineError::Config(format!(
                "expected 12 month lengths, got {}",
                cal.month_lengths.len()
            )));
        }
        if NaiveDate::from_ymd_opt(cal.year, 1, 1).is_none() {
            return Err(PipelineError::Config(format!(
                "year {} is outside the supported date range",
                cal.year
            )));
        }
        if cal.timestep_hours == 0 || 24 % cal.timestep_hours != 0 {
            return Err(PipelineError::Config(format!(
                "timestep of {} hours does not divide a day",
                cal.timestep_hours
            )));
        }
        if self.clean.important_features.is_empty() {
            return Err(PipelineError::Config(
                "at least one important feature is required".to_string(),
            ));
        }
        if self.reduce.regions.is_empty() {
            return Err(PipelineError::Config("no regions defined".to_string()));
        }
        if self.reduce.months.is_empty() {
            return Err(PipelineError::Config("no months selected".to_string()));
        }
        if let Some(m) = self.reduce.months.iter().find(|m| !(1..=12).contains(*m)) {
            return Err(PipelineError::Config(format!("month {m} out of range")));
        }
        if let Some(r) = self.reduce.regions.iter().find(|r| !r.is_well_formed()) {
            return Err(PipelineError::Config(format!(
                "region box {:?} has min >= max",
                r.bounds
            )));
        }
        Ok(())
    }
}

fn path_relative_to_config(config_file: &Path, p: PathBuf) -> PathBuf {
    if p.is_absolute() {
        return p;
    }
    match config_file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.join(p),
        _ => p,
    }
}

/// Where the stage artifacts live. File patterns use `{}` as the index placeholder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathConfig {
    pub data_root: PathBuf,
    pub raw_dir: PathBuf,
    pub months_dir: PathBuf,
    pub cleaned_dir: PathBuf,
    pub normalized_dir: PathBuf,
    pub grid_dir: PathBuf,
    pub table_dir: PathBuf,
    pub day_file_pattern: String,
    pub month_file_pattern: String,
    pub year_file_name: String,
    pub grid_file_pattern: String,
}

impl Default for PathConfig {
    fn default() -> Self {
        PathConfig {
            data_root: PathBuf::from("data"),
            raw_dir: PathBuf::from("raw"),
            months_dir: PathBuf::from("months"),
            cleaned_dir: PathBuf::from("ws_unnormalized"),
            normalized_dir: PathBuf::from("ws_normalized"),
            grid_dir: PathBuf::from("ecmwf"),
            table_dir: PathBuf::from("predictors"),
            day_file_pattern: "data{}.json".to_string(),
            month_file_pattern: "month{}.json".to_string(),
            year_file_name: "year.json".to_string(),
            grid_file_pattern: "output_{}".to_string(),
        }
    }
}

impl PathConfig {
    pub fn day_file(&self, day: usize) -> PathBuf {
        self.data_root
            .join(&self.raw_dir)
            .join(fill_pattern(&self.day_file_pattern, day))
    }

    pub fn month_file(&self, month: usize) -> PathBuf {
        self.data_root
            .join(&self.months_dir)
            .join(fill_pattern(&self.month_file_pattern, month))
    }

    pub fn cleaned_file(&self, month: usize) -> PathBuf {
        self.data_root
            .join(&self.cleaned_dir)
            .join(fill_pattern(&self.month_file_pattern, month))
    }

    pub fn year_file(&self) -> PathBuf {
        self.data_root
            .join(&self.normalized_dir)
            .join(&self.year_file_name)
    }

    pub fn grid_file(&self, month: usize) -> PathBuf {
        self.data_root
            .join(&self.grid_dir)
            .join(fill_pattern(&self.grid_file_pattern, month))
    }

    pub fn table_dir(&self) -> PathBuf {
        self.data_root.join(&self.table_dir)
    }
}

fn fill_pattern(pattern: &str, index: usize) -> String {
    pattern.replacen("{}", &index.to_string(), 1)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarConfig {
    pub year: i32,
    pub month_lengths: Vec<usize>,
    pub timestep_hours: u32,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        CalendarConfig {
            year: 2018,
            month_lengths: vec![31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31],
            timestep_hours: 6,
        }
    }
}

impl CalendarConfig {
    pub fn observations_per_day(&self) -> usize {
        (24 / self.timestep_hours) as usize
    }

    /// Index of the first day of `month` (1-based) counted from 1 January.
    pub fn first_day_of(&self, month: usize) -> usize {
        self.month_lengths[..month - 1].iter().sum()
    }

    pub fn timesteps_in(&self, month: usize) -> usize {
        self.month_lengths[month - 1] * self.observations_per_day()
    }
}

/// How the sample shared by consecutive days is handled when they are joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Drop the last sample of every day, including the final one.
    #[default]
    DropLastEveryDay,
    /// Drop the last sample of every day except the final day of the month.
    KeepFinalDay,
    /// Keep every sample.
    KeepAll,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregateConfig {
    pub excluded_stations: Vec<String>,
    /// Feature whose station list on the first day defines the roster.
    pub reference_feature: String,
    /// Station the shared timestamp axis is read from. The first surviving
    /// station of the reference feature is used when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp_station: Option<String>,
    pub duplicates: DuplicatePolicy,
}

impl Default for AggregateConfig {
    fn default() -> Self {
        AggregateConfig {
            excluded_stations: EXCLUDED_STATIONS.iter().map(|s| s.to_string()).collect(),
            reference_feature: "t2m".to_string(),
            timestamp_station: None,
            duplicates: DuplicatePolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImputationPolicy {
    /// Left to right, each gap is the midpoint of the already filled
    /// predecessor and the next valid value.
    #[default]
    SinglePass,
    /// Each run of gaps is interpolated linearly between its bounding values.
    Linear,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanConfig {
    pub important_features: Vec<String>,
    pub imputation: ImputationPolicy,
}

impl Default for CleanConfig {
    fn default() -> Self {
        CleanConfig {
            important_features: vec!["ws_10min".to_string()],
            imputation: ImputationPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scaling {
    /// `(x - mean) / variance`
    #[default]
    Variance,
    /// `(x - mean) / std`
    StdDev,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeConfig {
    pub scaling: Scaling,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReductionMode {
    Mean,
    #[default]
    MeanAbs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GridFormat {
    #[default]
    Json,
    Netcdf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableFormat {
    #[default]
    Parquet,
    Feather,
}

impl TableFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            TableFormat::Parquet => "parquet",
            TableFormat::Feather => "feather",
        }
    }
}

/// A quantity computed per cell from two orthogonal components before reduction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedQuantity {
    pub name: String,
    pub u: String,
    pub v: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReduceConfig {
    pub quantities: Vec<String>,
    pub mode: ReductionMode,
    pub months: Vec<usize>,
    pub grid_format: GridFormat,
    pub table_format: TableFormat,
    pub table_stem: String,
    pub regions: Vec<Region>,
    pub derived: Vec<DerivedQuantity>,
}

impl Default for ReduceConfig {
    fn default() -> Self {
        ReduceConfig {
            quantities: vec!["u10".to_string(), "v10".to_string()],
            mode: ReductionMode::default(),
            months: (1..=6).collect(),
            grid_format: GridFormat::default(),
            table_format: TableFormat::default(),
            table_stem: "wind_region_mean".to_string(),
            regions: finnish_regions(),
            derived: vec![DerivedQuantity {
                name: "w10".to_string(),
                u: "u10".to_string(),
                v: "v10".to_string(),
            }],
        }
    }
}

impl ReduceConfig {
    /// Column names in row order: base quantities first, then derived ones.
    pub fn column_names(&self) -> Vec<String> {
        self.quantities
            .iter()
            .chain(self.derived.iter().map(|d| &d.name))
            .flat_map(|q| (0..self.regions.len()).map(move |i| format!("{q}_{i}")))
            .collect()
    }
}

fn finnish_regions() -> Vec<Region> {
    [
        ("Ahvenanmaa", [19.0, 21.2, 60.6, 59.5]),
        ("Varsinais-Suomi", [21.2, 23.5, 61.0, 59.5]),
        ("Uusimaa", [23.5, 26.2, 60.7, 59.5]),
        ("Kymenlaakso", [26.2, 27.2, 61.3, 59.0]),
        ("Etelä-Karjala", [27.2, 30.0, 61.7, 59.0]),
        ("Satakunta", [20.0, 22.7, 61.3, 60.0]),
        ("Kanta-Häme", [23.5, 25.0, 61.2, 60.7]),
        ("Päijät-Häme", [25.0, 26.2, 61.6, 60.7]),
        ("Pirkanmaa", [22.7, 25.0, 62.4, 61.0]),
        ("Etelä-Savo", [26.2, 29.0, 62.4, 61.3]),
        ("Keski-Suomi", [24.5, 26.5, 63.5, 61.6]),
        ("Pohjanmaat", [20.0, 24.5, 64.0, 61.0]),
        ("Pohjois-Karjala", [28.4, 32.0, 63.9, 61.7]),
        ("Pohjois-Savo", [26.5, 28.4, 64.0, 62.4]),
        ("Kainuu", [27.2, 30.5, 65.3, 63.9]),
        ("Pohjois-Pohjanmaa", [23.4, 30.0, 66.0, 63.5]),
        ("Lappi", [22.7, 30.5, 69.5, 66.0]),
    ]
    .into_iter()
    .map(|(name, bounds)| Region::named(name, bounds))
    .collect()
}

// Stations with wrong timesteps in the observation archive.
const EXCLUDED_STATIONS: &[&str] = &[
    "Helsinki Vuosaari Käärmeniementie",
    "Helsinki Vuosaari satama",
    "Inari Ivalo lentoasema",
    "Jyväskylä lentoasema",
    "Järvenpää Sorto",
    "Kajaani lentoasema",
    "Kemi I majakka",
    "Kemi Kemi-Tornio lentoasema",
    "Kittilä lentoasema",
    "Korsnäs Bredskäret",
    "Kouvola Utti lentoasema",
    "Kruunupyy Kokkola-Pietarsaari lentoasema",
    "Kuopio Savilahti",
    "Kuusamo lentoasema",
    "Lahti Sopenkorpi",
    "Lappeenranta Hiekkapakka",
    "Lumparland Långnäs satama",
    "Maarianhamina Länsisatama",
    "Oulu lentoasema",
    "Pori lentoasema",
    "Sipoo Itätoukki",
    "Sodankylä Tähtelä",
    "Turku lentoasema",
    "Vaasa lentoasema",
];

// Wrong timesteps or completely missing times.
const FMI_EXCLUDED_STATIONS: &[&str] = &[
    "Enontekiö Kilpisjärvi Saana",
    "Espoo Tapiola",
    "Hailuoto Marjaniemi",
    "Halsua Purola",
    "Hanko Tulliniemi",
    "Helsinki Harmaja",
    "Helsinki Vuosaari Käärmeniementie",
    "Helsinki Vuosaari satama",
    "Hämeenlinna Lammi Evo",
    "Ilomantsi Mekrijärvi",
    "Inari Ivalo lentoasema",
    "Inari Saariselkä Kaunispää",
    "Inari Seitalaassa",
    "Jomala Jomalaby",
    "Jomala Maarianhamina lentoasema",
    "Jyväskylä lentoasema",
    "Jämsä Halli lentoasema",
    "Järvenpää Sorto",
    "Kajaani lentoasema",
    "Kankaanpää Niinisalo lentokenttä",
    "Kauhava lentokenttä",
    "Kaskinen Sälgrund",
    "Kemi I majakka",
    "Kemi Kemi-Tornio lentoasema",
    "Kauhajoki Kuja-Kokko",
    "Kittilä lentoasema",
    "Korsnäs Bredskäret",
    "Kotka Haapasaari",
    "Kouvola Utti lentoasema",
    "Kruunupyy Kokkola-Pietarsaari lentoasema",
    "Kumlinge kirkonkylä",
    "Kuopio Savilahti",
    "Kustavi Isokari",
    "Kuusamo lentoasema",
    "Kristiinankaupunki Majakka",
    "Lahti Sopenkorpi",
    "Lappeenranta Hiekkapakka",
    "Lappeenranta Konnunsuo",
    "Lappeenranta lentoasema",
    "Lappeenranta Lepola",
    "Lemland Nyhamn",
    "Liperi Joensuu lentoasema",
    "Liperi Tuiskavanluoto",
    "Lumparland Långnäs satama",
    "Maarianhamina Länsisatama",
    "Muonio Sammaltunturi",
    "Mustasaari Valassaaret",
    "Oulu lentoasema",
    "Parikkala Koitsanlahti",
    "Pello kirkonkylä",
    "Pirkkala Tampere-Pirkkala lentoasema",
    "Pori lentoasema",
    "Pori Tahkoluoto satama",
    "Porvoo Emäsalo",
    "Puolanka Paljakka",
    "Raasepori Jussarö",
    "Rauma Kylmäpihlaja",
    "Rautavaara Ylä-Luosta",
    "Rovaniemi rautatieasema",
    "Salo Kiikala lentokenttä",
    "Savonlinna lentoasema",
    "Sotkamo Kuolaniemi",
    "Siilinjärvi Kuopio lentoasema",
    "Sipoo Itätoukki",
    "Sodankylä Tähtelä",
    "Turku lentoasema",
    "Turku Rajakari",
    "Vaasa lentoasema",
    "Vantaa Helsinki-Vantaan lentoasema",
    "Vieremä Kaarakkala",
    "Ähtäri Inha",
];

// -- Tests -------------------------------------------------------------------
