//! Year-end share price series.

use finstate_core::{Company, PeriodKey, PriceProvider, Table, Value};
use tracing::{debug, warn};

use crate::config::ReportConfig;

/// Column holding the year-end close.
pub const PRICE: &str = "주가";

/// Column holding the date of the year-end close.
pub const PRICE_DATE: &str = "주가날짜";

/// Builds the year-end price table from `start - lookback` through `end`.
///
/// Each year takes the last close inside the configured December window.
/// Years without a close, or whose fetch fails, are left out.
pub async fn price_series(
    prices: &dyn PriceProvider,
    company: &Company,
    start: i32,
    end: i32,
    config: &ReportConfig,
) -> Table {
    let mut table = Table::new();

    for year in (start - config.price_lookback_years)..=end {
        let (from, to) = match config.price_window.for_year(year) {
            Ok(window) => window,
            Err(e) => {
                warn!(year, error = %e, "Skipping price window");
                continue;
            }
        };

        match prices.last_close(&company.ticker, from, to).await {
            Ok(Some(close)) => {
                debug!(year, date = %close.date, close = close.close, "Year-end close");
                table.push_row(
                    PeriodKey::Year(year),
                    [
                        (PRICE, Value::Float(close.close)),
                        (PRICE_DATE, Value::Text(close.date.to_string())),
                    ],
                );
            }
            Ok(None) => {
                warn!(ticker = %company.ticker, year, "No close in year-end window");
            }
            Err(e) => {
                warn!(ticker = %company.ticker, year, error = %e, "Failed to fetch prices");
            }
        }
    }

    table
}
