//! Dohod dividend-table parser.
//!
//! The dividend table carries two real-world complications: a filter-control
//! row embedded in the body, and a column order that has shifted between
//! site revisions. Column positions are therefore resolved from the header
//! row when enough Russian labels are recognized, falling back to fixed
//! offsets otherwise; both the recognition threshold and the offsets are
//! configuration. Rows shorter than the minimum cell count are dropped, not
//! defaulted, and any per-row failure is recorded and skipped.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, error, info, warn};

use crate::domain::records::{DividendRow, ScrapeOutcome};
use crate::infrastructure::config::{DividendColumnOffsets, DividendsConfig};
use crate::parsing::error::{ParseError, ParseResult};
use crate::parsing::extract::{collect_text, has_class};
use crate::parsing::normalize::{parse_date_ddmmyyyy, parse_decimal, parse_percent};

static TABLE_BY_ID_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("table#table-dividend").expect("valid selector"));
static TABLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("table").expect("valid selector"));
static ROW_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("tr").expect("valid selector"));
static CELL_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("td").expect("valid selector"));
static HEADER_CELL_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("th").expect("valid selector"));
static ANY_HEADER_CELL_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("th, td").expect("valid selector"));
static ANCHOR_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href]").expect("valid selector"));

/// Header cell that identifies the dividend table when the id is gone.
static TICKER_HEADER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)акция|ticker|symbol").expect("valid pattern"));

static CURRENCY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(RUB|USD|EUR|CNY|HKD|GBP)$").expect("valid pattern"));

/// How many cells after the payment column to inspect for a currency code
/// when the header row did not pin its position.
const CURRENCY_WINDOW: usize = 3;

/// Russian header labels, regex-matched so minor wording changes survive.
static HEADER_LABELS: Lazy<[(HeaderField, Regex); 8]> = Lazy::new(|| {
    let re = |p: &str| Regex::new(p).expect("valid header pattern");
    [
        (HeaderField::Name, re(r"(?i)акция|ticker|symbol")),
        (HeaderField::Sector, re(r"(?i)сектор")),
        (HeaderField::Period, re(r"(?i)период")),
        (HeaderField::Payment, re(r"(?i)выплата")),
        (HeaderField::YieldPct, re(r"(?i)доходност")),
        (HeaderField::RecordDate, re(r"(?i)дата.*реестр")),
        (HeaderField::Capitalization, re(r"(?i)капитализац")),
        (HeaderField::Dsi, re(r"(?i)dsi")),
    ]
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HeaderField {
    Name,
    Sector,
    Period,
    Payment,
    YieldPct,
    RecordDate,
    Capitalization,
    Dsi,
}

/// Resolved column positions for one table revision.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ColumnMap {
    name: usize,
    sector: usize,
    period: usize,
    payment: usize,
    /// `None` means the position is unknown and the currency is located by
    /// scanning a short window after the payment column.
    currency: Option<usize>,
    yield_pct: usize,
    record_date: usize,
    capitalization: usize,
    dsi: usize,
}

impl ColumnMap {
    fn from_offsets(offsets: &DividendColumnOffsets) -> Self {
        Self {
            name: offsets.name,
            sector: offsets.sector,
            period: offsets.period,
            payment: offsets.payment,
            currency: Some(offsets.currency),
            yield_pct: offsets.yield_pct,
            record_date: offsets.record_date,
            capitalization: offsets.capitalization,
            dsi: offsets.dsi,
        }
    }
}

/// Parser for the Dohod dividend analytics table.
pub struct DohodDividendsParser {
    min_cells: usize,
    header_min_matches: usize,
    offsets: DividendColumnOffsets,
}

impl DohodDividendsParser {
    pub fn new() -> Self {
        Self::from_config(&DividendsConfig::default())
    }

    pub fn from_config(config: &DividendsConfig) -> Self {
        Self {
            min_cells: config.min_cells,
            header_min_matches: config.header_min_matches,
            offsets: config.offsets.clone(),
        }
    }

    /// Parse the dividend table out of a fetched page.
    pub fn parse_table(&self, doc: &Html) -> ScrapeOutcome<DividendRow> {
        let Some(table) = Self::locate_table(doc) else {
            error!("dividend table not found (neither id nor header matched)");
            return ScrapeOutcome::failed("dividend table not found");
        };

        let rows: Vec<ElementRef<'_>> = table.select(&ROW_SELECTOR).collect();
        let columns = self.resolve_columns(&rows);

        let mut outcome = ScrapeOutcome::new();
        let mut data_index = 0usize;
        for row in &rows {
            // Header rows and the embedded filter-control row are table
            // furniture, not data.
            if row.select(&HEADER_CELL_SELECTOR).next().is_some() {
                continue;
            }
            if has_class(*row, "filter-row") {
                continue;
            }

            let cells: Vec<ElementRef<'_>> = row.select(&CELL_SELECTOR).collect();
            let index = data_index;
            data_index += 1;

            if cells.len() < self.min_cells {
                // Separator/spacer rows are dropped by design, without noise.
                outcome.skip(
                    index,
                    format!("{} cells, expected at least {}", cells.len(), self.min_cells),
                );
                continue;
            }

            match Self::parse_row(&cells, &columns) {
                Ok(record) => outcome.push(record),
                Err(e) => {
                    warn!(row = index, "dividend row skipped: {e}");
                    outcome.skip(index, e.to_string());
                }
            }
        }

        info!(
            rows = outcome.len(),
            skipped = outcome.skipped.len(),
            "parsed dividend table"
        );
        outcome
    }

    /// Table by id, else the first table with a ticker-ish header cell.
    fn locate_table(doc: &Html) -> Option<ElementRef<'_>> {
        if let Some(table) = doc.select(&TABLE_BY_ID_SELECTOR).next() {
            return Some(table);
        }
        doc.select(&TABLE_SELECTOR).find(|table| {
            table
                .select(&HEADER_CELL_SELECTOR)
                .any(|th| TICKER_HEADER_RE.is_match(&collect_text(th)))
        })
    }

    /// Prefer header-driven column mapping; fall back to fixed offsets when
    /// too few labels are recognized to trust the header row.
    fn resolve_columns(&self, rows: &[ElementRef<'_>]) -> ColumnMap {
        let header_row = rows
            .iter()
            .find(|row| row.select(&HEADER_CELL_SELECTOR).next().is_some());
        if let Some(row) = header_row {
            let labels: Vec<String> = row
                .select(&ANY_HEADER_CELL_SELECTOR)
                .map(|cell| collect_text(cell))
                .collect();
            if let Some(columns) = self.map_header(&labels) {
                debug!("dividend columns resolved from header row");
                return columns;
            }
        }
        debug!("dividend columns resolved from fixed offsets");
        ColumnMap::from_offsets(&self.offsets)
    }

    fn map_header(&self, labels: &[String]) -> Option<ColumnMap> {
        let position = |field: HeaderField| -> Option<usize> {
            let (_, pattern) = HEADER_LABELS.iter().find(|(f, _)| *f == field)?;
            labels.iter().position(|label| pattern.is_match(label))
        };

        let name = position(HeaderField::Name);
        let sector = position(HeaderField::Sector);
        let period = position(HeaderField::Period);
        let payment = position(HeaderField::Payment);
        let yield_pct = position(HeaderField::YieldPct);
        let record_date = position(HeaderField::RecordDate);
        let capitalization = position(HeaderField::Capitalization);
        let dsi = position(HeaderField::Dsi);

        let recognized = [name, sector, period, payment, yield_pct, record_date, capitalization, dsi]
            .iter()
            .flatten()
            .count();
        if recognized < self.header_min_matches {
            return None;
        }

        // Labels the header did not carry keep their fixed positions; the
        // currency column is never pinned by label and is window-scanned.
        Some(ColumnMap {
            name: name.unwrap_or(self.offsets.name),
            sector: sector.unwrap_or(self.offsets.sector),
            period: period.unwrap_or(self.offsets.period),
            payment: payment.unwrap_or(self.offsets.payment),
            currency: None,
            yield_pct: yield_pct.unwrap_or(self.offsets.yield_pct),
            record_date: record_date.unwrap_or(self.offsets.record_date),
            capitalization: capitalization.unwrap_or(self.offsets.capitalization),
            dsi: dsi.unwrap_or(self.offsets.dsi),
        })
    }

    fn parse_row(
        cells: &[ElementRef<'_>],
        columns: &ColumnMap,
    ) -> ParseResult<DividendRow> {
        // The company link may sit in the name cell or the one after it
        // (icon column layouts), and may hold the name text itself.
        let primary = cells.get(columns.name);
        let secondary = cells.get(columns.name + 1);
        let link = primary
            .and_then(|cell| cell.select(&ANCHOR_SELECTOR).next())
            .or_else(|| secondary.and_then(|cell| cell.select(&ANCHOR_SELECTOR).next()));

        let ticker = link
            .and_then(|a| a.value().attr("href"))
            .map(|href| {
                href.trim_end_matches('/')
                    .rsplit('/')
                    .next()
                    .unwrap_or_default()
                    .to_uppercase()
            })
            .unwrap_or_default();

        let company_name = link
            .map(|a| collect_text(a))
            .filter(|text| !text.is_empty())
            .or_else(|| primary.map(|cell| collect_text(*cell)).filter(|t| !t.is_empty()))
            .or_else(|| secondary.map(|cell| collect_text(*cell)).filter(|t| !t.is_empty()))
            .unwrap_or_default();

        let payment_text = Self::text_at(cells, columns.payment, "payment")?;
        let currency = match columns.currency {
            Some(index) => Self::validate_currency(&Self::text_at(cells, index, "currency")?),
            None => Self::currency_from_window(cells, columns.payment),
        };

        Ok(DividendRow {
            ticker,
            company_name,
            sector: Self::text_at(cells, columns.sector, "sector")?,
            period: Self::text_at(cells, columns.period, "period")?,
            payment_per_share: parse_decimal(&payment_text),
            currency,
            yield_percent: parse_percent(&Self::text_at(cells, columns.yield_pct, "yield")?),
            record_date_estimate: parse_date_ddmmyyyy(&Self::text_at(
                cells,
                columns.record_date,
                "record date",
            )?),
            capitalization: parse_decimal(&Self::text_at(
                cells,
                columns.capitalization,
                "capitalization",
            )?),
            dsi: parse_decimal(&Self::text_at(cells, columns.dsi, "dsi")?),
        })
    }

    fn text_at(
        cells: &[ElementRef<'_>],
        index: usize,
        field: &str,
    ) -> ParseResult<String> {
        cells
            .get(index)
            .map(|cell| collect_text(*cell))
            .ok_or_else(|| ParseError::required_field_missing(field, Some("dividend row")))
    }

    fn validate_currency(text: &str) -> String {
        let upper = text.trim().to_uppercase();
        if CURRENCY_RE.is_match(&upper) {
            upper
        } else {
            String::new()
        }
    }

    /// The currency column is not label-addressable; look for a known code
    /// in the cells right after the payment column.
    fn currency_from_window(cells: &[ElementRef<'_>], payment: usize) -> String {
        for index in payment + 1..=payment + CURRENCY_WINDOW {
            if let Some(cell) = cells.get(index) {
                let code = Self::validate_currency(&collect_text(*cell));
                if !code.is_empty() {
                    return code;
                }
            }
        }
        String::new()
    }
}

impl Default for DohodDividendsParser {
    fn default() -> Self {
        Self::new()
    }
}
