//! Public holiday lookup.
//!
//! [`NagerDateClient`] queries the Nager.Date API
//! (`{base}/PublicHolidays/{year}/{country}`). [`StaticHolidays`] serves a
//! fixed list for tests and offline runs.

use crate::error::HolidayError;
use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use reqwest::{Client, StatusCode};
use rootcause::prelude::Report;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, instrument};

fn default_base_url() -> String {
    "https://date.nager.at/api/v3".to_string()
}

fn default_country_code() -> String {
    "US".to_string()
}

/// Holiday source settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HolidayConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// ISO 3166-1 alpha-2 country code.
    #[serde(default = "default_country_code")]
    pub country_code: String,
}

impl Default for HolidayConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            country_code: default_country_code(),
        }
    }
}

/// Provides public holidays per country and year.
#[async_trait]
pub trait HolidaySource: Send + Sync {
    /// Returns every public holiday of `year` in `country`.
    ///
    /// # Errors
    ///
    /// Returns an error if the holidays cannot be fetched.
    async fn holidays(
        &self,
        country: &str,
        year: i32,
    ) -> Result<Vec<NaiveDate>, Report<HolidayError>>;
}

/// Fetches holidays for every year in `[start, end]` and keeps those inside
/// the range, both ends inclusive.
///
/// # Errors
///
/// Propagates the first failed fetch.
pub async fn holidays_in_range(
    source: &dyn HolidaySource,
    country: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<HashSet<NaiveDate>, Report<HolidayError>> {
    let mut found = HashSet::new();
    for year in start.year()..=end.year() {
        for date in source.holidays(country, year).await? {
            if start <= date && date <= end {
                found.insert(date);
            }
        }
    }
    debug!(%start, %end, holidays = found.len(), "holidays resolved");
    Ok(found)
}

#[derive(Debug, Deserialize)]
struct PublicHoliday {
    date: NaiveDate,
}

/// Nager.Date API client.
#[derive(Clone)]
pub struct NagerDateClient {
    client: Client,
    base_url: String,
}

impl NagerDateClient {
    /// Creates a client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &HolidayConfig) -> Result<Self, Report<HolidayError>> {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| HolidayError::Http {
                reason: e.to_string(),
            })?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, country: &str, year: i32) -> String {
        format!("{}/PublicHolidays/{year}/{country}", self.base_url)
    }
}

#[async_trait]
impl HolidaySource for NagerDateClient {
    #[instrument(skip(self))]
    async fn holidays(
        &self,
        country: &str,
        year: i32,
    ) -> Result<Vec<NaiveDate>, Report<HolidayError>> {
        let response = self
            .client
            .get(self.url(country, year))
            .send()
            .await
            .map_err(|e| HolidayError::Http {
                reason: e.to_string(),
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(HolidayError::UnexpectedStatus {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        let holidays: Vec<PublicHoliday> = response
            .json()
            .await
            .map_err(|e| HolidayError::InvalidResponse {
                reason: e.to_string(),
            })?;
        Ok(holidays.into_iter().map(|holiday| holiday.date).collect())
    }
}

/// A fixed holiday list, independent of country.
#[derive(Debug, Clone, Default)]
pub struct StaticHolidays {
    dates: Vec<NaiveDate>,
}

impl StaticHolidays {
    /// Creates a source serving `dates`.
    #[must_use]
    pub fn new(dates: impl IntoIterator<Item = NaiveDate>) -> Self {
        Self {
            dates: dates.into_iter().collect(),
        }
    }
}

#[async_trait]
impl HolidaySource for StaticHolidays {
    async fn holidays(
        &self,
        _country: &str,
        year: i32,
    ) -> Result<Vec<NaiveDate>, Report<HolidayError>> {
        Ok(self
            .dates
            .iter()
            .copied()
            .filter(|date| date.year() == year)
            .collect())
    }
}
