use crate::{DateParam, FitbitError, Period, utils};
use chrono::FixedOffset;
use std::path::PathBuf;

pub const DEFAULT_BASE_URL: &str = "https://api.fitbit.com";
pub const DEFAULT_CONF_PATH: &str = "./test_conf.json";
pub const DEFAULT_RESULTS_DIR: &str = "./results";
pub const DEFAULT_UTC_OFFSET_HOURS: i32 = 9;

#[derive(Clone, Debug)]
pub struct Config {
    pub conf_path: PathBuf,
    pub base_url: String,
    pub results_dir: PathBuf,
    pub utc_offset: FixedOffset,
    pub heart_date: DateParam,
    pub heart_period: Period,
}

impl Config {
    pub fn from_env() -> Result<Self, FitbitError> {
        Self::from_env_with(|k| std::env::var(k).ok())
    }

    /// Testable helper that reads configuration values using the provided
    /// function instead of the process environment.
    pub fn from_env_with<F>(mut get: F) -> Result<Self, FitbitError>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let conf_path = get("FITBIT_CONF_PATH").unwrap_or_else(|| DEFAULT_CONF_PATH.into());
        let base_url = get("FITBIT_API_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.into());
        let results_dir =
            get("FITBIT_RESULTS_DIR").unwrap_or_else(|| DEFAULT_RESULTS_DIR.into());
        let offset_hours = match get("FITBIT_UTC_OFFSET_HOURS") {
            Some(raw) => raw.trim().parse::<i32>().map_err(|_| {
                FitbitError::Config(format!("FITBIT_UTC_OFFSET_HOURS is not an integer: {raw:?}"))
            })?,
            None => DEFAULT_UTC_OFFSET_HOURS,
        };
        let heart_date = match get("FITBIT_HEART_DATE") {
            Some(raw) => raw.parse()?,
            None => DateParam::default(),
        };
        let heart_period = match get("FITBIT_HEART_PERIOD") {
            Some(raw) => raw.parse()?,
            None => Period::default(),
        };

        Ok(Self {
            conf_path: conf_path.into(),
            base_url,
            results_dir: results_dir.into(),
            utc_offset: utils::offset_from_hours(offset_hours)?,
            heart_date,
            heart_period,
        })
    }
}
