use super::config::{self, ScreenerSettings};
use super::delta::delta;
use super::feed::MarketDataFeed;
use super::models::{ChainRow, OptionType, QueryCriteria, ScreenReport, ScreenedContract};
use crate::error::ScreenError;
use chrono::{Days, Local, NaiveDate};

/// A chain row that survived validation, with its mid premium computed
#[derive(Debug, Clone, PartialEq)]
pub struct PricedRow {
    pub strike: f64,
    pub mid_premium: f64,
    pub deviation: f64,
    pub expiration: NaiveDate,
    pub quoted_delta: Option<f64>,
}

/// Runs screening queries against a market data feed
#[derive(Debug, Clone, Default)]
pub struct Screener {
    settings: ScreenerSettings,
}

impl Screener {
    pub fn new(settings: ScreenerSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &ScreenerSettings {
        &self.settings
    }

    pub async fn screen(
        &self,
        criteria: &QueryCriteria,
        feed: &dyn MarketDataFeed,
    ) -> Result<ScreenReport, ScreenError> {
        self.screen_at(criteria, feed, Local::now().date_naive()).await
    }

    /// Screen relative to a fixed `today`
    pub async fn screen_at(
        &self,
        criteria: &QueryCriteria,
        feed: &dyn MarketDataFeed,
        today: NaiveDate,
    ) -> Result<ScreenReport, ScreenError> {
        // Step 1-3: nearest expiration within the horizon
        let cutoff = horizon_cutoff(today, criteria.horizon.days());
        let expirations = feed.list_expirations().await?;
        let expiration = select_expiration(&expirations, today, cutoff)
            .ok_or(ScreenError::NoExpirationsInRange { cutoff })?;

        // Step 4: chain + spot
        let rows = feed.get_chain(expiration, criteria.option_type).await?;
        let spot = feed.get_spot_price().await?;
        if !(spot.is_finite() && spot > 0.0) {
            return Err(ScreenError::FeedUnavailable(format!("invalid spot price {}", spot)));
        }

        tracing::debug!(
            %expiration,
            spot,
            rows = rows.len(),
            option_type = %criteria.option_type,
            "screening chain"
        );

        // Step 5-7
        let priced = price_rows(rows, criteria.target_premium);
        let priced = if criteria.otm_only {
            filter_otm(priced, spot, criteria.option_type)
        } else {
            priced
        };

        if priced.is_empty() {
            return Err(ScreenError::NoCandidatesFound { expiration });
        }

        // Step 8-9
        let (selected, used_fallback) = select_candidates(
            priced,
            criteria.target_premium,
            self.settings.premium_band,
            self.settings.fallback_count,
        );

        if used_fallback {
            tracing::info!(
                target_premium = criteria.target_premium,
                kept = selected.len(),
                "no row inside premium band, using nearest rows"
            );
        }

        // Step 10
        let years = time_to_expiry_years(today, expiration);
        let contracts = selected
            .into_iter()
            .map(|row| self.to_contract(row, criteria, spot, years))
            .collect();

        Ok(ScreenReport {
            expiration,
            spot,
            contracts,
            used_fallback,
        })
    }

    fn to_contract(&self, row: PricedRow, criteria: &QueryCriteria, spot: f64, years: f64) -> ScreenedContract {
        let delta = row
            .quoted_delta
            .filter(|d| d.is_finite())
            .or_else(|| {
                delta(
                    spot,
                    row.strike,
                    years,
                    self.settings.risk_free_rate,
                    self.settings.volatility,
                    criteria.option_type,
                )
            });

        ScreenedContract {
            strike: row.strike,
            premium: row.mid_premium,
            expiration: row.expiration,
            total_cost: total_cost(row.mid_premium, criteria.contracts),
            roi_estimate: round2(row.mid_premium / spot * 100.0),
            delta,
        }
    }
}

/// Round half away from zero to two decimals
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn total_cost(mid_premium: f64, contracts: u32) -> f64 {
    round2(mid_premium * contracts as f64 * config::CONTRACT_MULTIPLIER)
}

fn horizon_cutoff(today: NaiveDate, days: i64) -> NaiveDate {
    today
        .checked_add_days(Days::new(days.max(0) as u64))
        .unwrap_or(NaiveDate::MAX)
}

/// Earliest expiration in `[today, cutoff]`
pub fn select_expiration(expirations: &[NaiveDate], today: NaiveDate, cutoff: NaiveDate) -> Option<NaiveDate> {
    expirations
        .iter()
        .copied()
        .filter(|d| *d >= today && *d <= cutoff)
        .min()
}

pub fn time_to_expiry_years(today: NaiveDate, expiration: NaiveDate) -> f64 {
    (expiration - today).num_days() as f64 / config::DAYS_PER_YEAR
}

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

/// Drop incomplete rows and compute mid premium and deviation from target
pub fn price_rows(rows: Vec<ChainRow>, target_premium: f64) -> Vec<PricedRow> {
    rows.into_iter()
        .filter_map(|row| {
            let strike = finite(row.strike)?;
            let bid = finite(row.bid)?;
            let ask = finite(row.ask)?;
            let mid_premium = (bid + ask) / 2.0;

            Some(PricedRow {
                strike,
                mid_premium,
                deviation: (mid_premium - target_premium).abs(),
                expiration: row.expiration,
                quoted_delta: row.quoted_delta,
            })
        })
        .collect()
}

/// Keep strictly out-of-the-money strikes
pub fn filter_otm(rows: Vec<PricedRow>, spot: f64, option_type: OptionType) -> Vec<PricedRow> {
    rows.into_iter()
        .filter(|row| match option_type {
            OptionType::Call => row.strike > spot,
            OptionType::Put => row.strike < spot,
        })
        .collect()
}

/// Rows inside `[target*(1-band), target*(1+band)]`, or the `fallback_count`
/// closest rows when the band is empty.
///
/// Result is ordered by deviation, then strike. The flag is true when the
/// fallback path was taken.
pub fn select_candidates(
    mut rows: Vec<PricedRow>,
    target_premium: f64,
    band: f64,
    fallback_count: usize,
) -> (Vec<PricedRow>, bool) {
    rows.sort_by(|a, b| {
        a.deviation
            .total_cmp(&b.deviation)
            .then(a.strike.total_cmp(&b.strike))
    });

    let low = target_premium * (1.0 - band);
    let high = target_premium * (1.0 + band);

    let in_band: Vec<PricedRow> = rows
        .iter()
        .filter(|row| row.mid_premium >= low && row.mid_premium <= high)
        .cloned()
        .collect();

    if !in_band.is_empty() {
        return (in_band, false);
    }

    rows.truncate(fallback_count);
    (rows, true)
}
