//! Report pipeline.
//!
//! Builds yearly and quarterly reports for one company by running the
//! statement and series builders one after another against a set of
//! [`ReportSources`].

use std::sync::Arc;

use finstate_core::{
    Company, DataError, DocumentFetcher, FilingProvider, PriceProvider, Result, Table,
};
use tracing::info;

use crate::config::ReportConfig;
use crate::dividend::dividend_series;
use crate::merge::{ReportParts, merge_report};
use crate::price::price_series;
use crate::shares::share_series;
use crate::statement::{quarterly_statement, yearly_statement};

/// The providers a report is built from.
#[derive(Clone)]
pub struct ReportSources {
    /// Filings, statements, dividends and filing sections.
    pub filings: Arc<dyn FilingProvider>,
    /// Daily closes.
    pub prices: Arc<dyn PriceProvider>,
    /// Raw filing section pages.
    pub documents: Arc<dyn DocumentFetcher>,
}

impl std::fmt::Debug for ReportSources {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportSources")
            .field("filings", &self.filings.name())
            .field("prices", &self.prices.name())
            .field("documents", &self.documents.name())
            .finish()
    }
}

impl ReportSources {
    /// Creates a source set.
    #[must_use]
    pub fn new(
        filings: Arc<dyn FilingProvider>,
        prices: Arc<dyn PriceProvider>,
        documents: Arc<dyn DocumentFetcher>,
    ) -> Self {
        Self {
            filings,
            prices,
            documents,
        }
    }

    /// OpenDART for filings and documents, Yahoo Finance for prices.
    ///
    /// # Errors
    /// Returns [`DataError::ProviderNotConfigured`] if the OpenDART API key is
    /// not set.
    #[cfg(all(feature = "dart", feature = "yahoo"))]
    pub fn from_env() -> Result<Self> {
        let dart = Arc::new(finstate_dart::OpenDartProvider::from_env()?);
        let yahoo = Arc::new(finstate_yahoo::YahooProvider::new());
        Ok(Self::new(dart.clone(), yahoo, dart))
    }
}

fn check_range(start: i32, end: i32) -> Result<()> {
    if start > end {
        return Err(DataError::InvalidParameter(format!(
            "Start year {} is after end year {}",
            start, end
        )));
    }
    Ok(())
}

/// Builds reports with one [`ReportConfig`].
#[derive(Clone, Debug, Default)]
pub struct ReportPipeline {
    config: ReportConfig,
}

impl ReportPipeline {
    /// Creates a pipeline after validating `config`.
    ///
    /// # Errors
    /// Returns [`DataError::InvalidParameter`] if the configuration is invalid.
    pub fn new(config: ReportConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &ReportConfig {
        &self.config
    }

    /// Builds the yearly report for `[start, end]`.
    ///
    /// Rows cover every year any source reported, including the price lookback
    /// and the prior periods of each annual filing. Sources that fail for a year
    /// leave that year's cells at zero.
    ///
    /// # Errors
    /// Returns [`DataError::InvalidParameter`] if `start > end`.
    pub async fn yearly(
        &self,
        company: &Company,
        start: i32,
        end: i32,
        sources: &ReportSources,
    ) -> Result<Table> {
        check_range(start, end)?;
        let config = &self.config;
        info!(company = %company, start, end, "Building yearly report");

        let statement =
            yearly_statement(sources.filings.as_ref(), company, start, end, config).await;
        let dividends =
            dividend_series(sources.filings.as_ref(), company, start, end, config).await;
        let prices = price_series(sources.prices.as_ref(), company, start, end, config).await;
        let shares = share_series(
            sources.filings.as_ref(),
            sources.documents.as_ref(),
            company,
            start,
            end,
            config,
        )
        .await;

        let report = merge_report(
            ReportParts {
                statement,
                prices,
                shares,
                dividends,
            },
            config,
        );
        info!(company = %company, rows = report.len(), "Yearly report ready");
        Ok(report)
    }

    /// Builds the quarterly report for every filing period of `[start, end]`.
    ///
    /// # Errors
    /// Returns [`DataError::InvalidParameter`] if `start > end`.
    pub async fn quarterly(
        &self,
        company: &Company,
        start: i32,
        end: i32,
        sources: &ReportSources,
    ) -> Result<Table> {
        check_range(start, end)?;
        info!(company = %company, start, end, "Building quarterly report");

        let report =
            quarterly_statement(sources.filings.as_ref(), company, start, end, &self.config)
                .await;
        info!(company = %company, rows = report.len(), "Quarterly report ready");
        Ok(report)
    }
}

/// Builds the yearly report with the default configuration.
///
/// # Errors
/// Returns [`DataError::InvalidParameter`] if `start > end`.
pub async fn build_yearly_report(
    company: &Company,
    start: i32,
    end: i32,
    sources: &ReportSources,
) -> Result<Table> {
    ReportPipeline::default()
        .yearly(company, start, end, sources)
        .await
}

/// Builds the quarterly report with the default configuration.
///
/// # Errors
/// Returns [`DataError::InvalidParameter`] if `start > end`.
pub async fn build_quarterly_report(
    company: &Company,
    start: i32,
    end: i32,
    sources: &ReportSources,
) -> Result<Table> {
    ReportPipeline::default()
        .quarterly(company, start, end, sources)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{
        FakeDocuments, FakeFilings, FakePrices, company, current_row, date, dividend_item, raw_row,
    };
    use crate::merge::{BPS, ROE};
    use crate::price::PRICE;
    use crate::shares::TOTAL;
    use finstate_core::{PeriodKey, ReportCode, Value};

    const SHARES_HTML: &str = "<table>\
        <tr><td>Ⅳ. 발행주식의 총수</td><td>3</td><td>1</td><td>4</td></tr>\
        </table>";

    fn sources(filings: FakeFilings, prices: FakePrices, documents: FakeDocuments) -> ReportSources {
        ReportSources::new(Arc::new(filings), Arc::new(prices), Arc::new(documents))
    }

    fn sample_sources() -> ReportSources {
        let filings = FakeFilings::default()
            .with_statement(
                2020,
                ReportCode::Annual,
                vec![
                    raw_row(
                        "ifrs-full_ProfitLossAttributableToOwnersOfParent",
                        "당기순이익",
                        "지배기업의 소유주에게 귀속되는 당기순이익",
                        ["300000000", "200000000", "100000000"],
                    ),
                    raw_row(
                        "ifrs-full_EquityAttributableToOwnersOfParent",
                        "지배기업의 소유주에게 귀속되는 자본",
                        "-",
                        ["2000000000", "1000000000", "1000000000"],
                    ),
                ],
            )
            .with_dividends(2020, vec![dividend_item("주당순이익", ["100", "90", "80"])])
            .with_filing("20210309000744", "20210309", "사업보고서 (2020.12)", "연")
            .with_section("20210309000744", "4. 주식의 총수 등", "http://viewer/shares");
        let prices = FakePrices::default().with_close(date(2020, 12, 30), 81_000.0);
        let documents =
            FakeDocuments::default().with_document("http://viewer/shares", 200, SHARES_HTML);

        sources(filings, prices, documents)
    }

    #[tokio::test]
    async fn test_yearly_report() {
        let pipeline =
            ReportPipeline::new(ReportConfig::default().with_price_lookback_years(0)).unwrap();
        let report = pipeline
            .yearly(&company(), 2020, 2020, &sample_sources())
            .await
            .unwrap();

        let years: Vec<i32> = report.keys().map(|k| k.year()).collect();
        assert_eq!(years, [2018, 2019, 2020]);
        assert_eq!(
            report.columns(),
            [
                "2.지배기업소유주당기순이익(억)",
                "3.지배기업소유주자본(억)",
                PRICE,
                "보통주",
                "우선주",
                TOTAL,
                "주당순이익",
                ROE,
                BPS,
            ]
        );

        let y2020 = PeriodKey::Year(2020);
        assert_eq!(
            report.get(&y2020, "3.지배기업소유주자본(억)"),
            Some(&Value::Text("20".to_string()))
        );
        assert_eq!(report.get(&y2020, PRICE), Some(&Value::Float(81_000.0)));
        assert_eq!(report.get(&y2020, ROE), Some(&Value::Text("20.0%".to_string())));
        assert_eq!(
            report.get(&y2020, BPS),
            Some(&Value::Text("500,000,000".to_string()))
        );

        let y2018 = PeriodKey::Year(2018);
        assert_eq!(report.get(&y2018, ROE), Some(&Value::Text("10.0%".to_string())));
        assert_eq!(report.get(&y2018, PRICE), Some(&Value::Int(0)));
        assert_eq!(report.get(&y2018, BPS), None);
        assert_eq!(
            report.get(&y2018, "주당순이익"),
            Some(&Value::Float(80.0))
        );
    }

    #[tokio::test]
    async fn test_yearly_report_without_data() {
        let sources = sources(
            FakeFilings::default(),
            FakePrices::default(),
            FakeDocuments::default(),
        );
        let report = build_yearly_report(&company(), 2018, 2020, &sources)
            .await
            .unwrap();
        assert!(report.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_range() {
        let sources = sample_sources();
        assert!(matches!(
            build_yearly_report(&company(), 2021, 2020, &sources).await,
            Err(DataError::InvalidParameter(_))
        ));
        assert!(matches!(
            build_quarterly_report(&company(), 2021, 2020, &sources).await,
            Err(DataError::InvalidParameter(_))
        ));
    }

    #[tokio::test]
    async fn test_quarterly_report() {
        let filings = FakeFilings::default()
            .with_statement(
                2020,
                ReportCode::HalfYear,
                vec![current_row("ifrs-full_Revenue", "매출액", "1000000000")],
            )
            .with_section("20210309000744", "II. 사업의 내용", "http://viewer/business");
        let sources = sources(filings, FakePrices::default(), FakeDocuments::default());

        let report = build_quarterly_report(&company(), 2020, 2020, &sources)
            .await
            .unwrap();

        let key = PeriodKey::Quarter {
            year: 2020,
            report: ReportCode::HalfYear,
        };
        assert_eq!(report.columns(), ["1.매출액(억)", "8.보고서"]);
        assert_eq!(report.get(&key, "1.매출액(억)"), Some(&Value::Text("10".to_string())));
        assert_eq!(
            report.get(&key, "8.보고서"),
            Some(&Value::Text("http://viewer/business".to_string()))
        );
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = ReportConfig::default().with_unit(0.0, "억");
        assert!(ReportPipeline::new(config).is_err());
    }

    #[test]
    fn test_sources_debug_lists_providers() {
        let debug = format!("{:?}", sample_sources());
        assert!(debug.contains("fake filings"));
        assert!(debug.contains("fake prices"));
        assert!(debug.contains("fake documents"));
    }
}
