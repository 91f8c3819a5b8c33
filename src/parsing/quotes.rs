//! Smartlab quote-table parser.
//!
//! The quote table maps one row to one traded instrument. Cells are located
//! by fixed class names and every lookup independently falls back to the
//! "No information!" sentinel, so a row with missing cells still yields a
//! complete record. Numeric interpretation is deferred to persist time.

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::{error, info, warn};

use crate::domain::records::{QuoteRow, ScrapeOutcome};
use crate::parsing::extract::{cell_text, CellSpec};

static CONTAINER_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.main__table").expect("valid selector"));
static TABLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("table").expect("valid selector"));
static ROW_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("tr").expect("valid selector"));

const NAME: CellSpec = CellSpec::linked_td("trades-table__name");
const TICKER: CellSpec = CellSpec::td("trades-table__ticker");
const PRICE: CellSpec = CellSpec::td("trades-table__price");
const CHANGE_PCT: CellSpec = CellSpec::td("trades-table__change-per");
const VOLUME: CellSpec = CellSpec::td("trades-table__volume");
const WEEK: CellSpec = CellSpec::td("trades-table__week");
const MONTH: CellSpec = CellSpec::td("trades-table__month");
const YTD: CellSpec = CellSpec::td("trades-table__first");
const YEAR: CellSpec = CellSpec::td("trades-table__year");
const CAP_RUB: CellSpec = CellSpec::td("trades-table__rub");
const CAP_USD: CellSpec = CellSpec::td("trades-table__usd");

/// Parser for the Smartlab shares table.
#[derive(Debug, Default, Clone, Copy)]
pub struct SmartlabQuotesParser;

impl SmartlabQuotesParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse the quote table out of a fetched page.
    ///
    /// Missing container or table ends the scrape with an empty outcome
    /// (better nothing than garbage when the page shape changed). Rows are
    /// never skipped by length: absent cells resolve to the sentinel.
    pub fn parse_table(&self, doc: &Html) -> ScrapeOutcome<QuoteRow> {
        let Some(container) = doc.select(&CONTAINER_SELECTOR).next() else {
            error!("quote table container (div.main__table) not found");
            return ScrapeOutcome::failed("container div.main__table not found");
        };
        let Some(table) = container.select(&TABLE_SELECTOR).next() else {
            error!("no table inside quote container");
            return ScrapeOutcome::failed("no table inside div.main__table");
        };

        let rows: Vec<ElementRef<'_>> = table.select(&ROW_SELECTOR).collect();
        if rows.is_empty() {
            warn!("quote table is empty");
            return ScrapeOutcome::failed("quote table has no rows");
        }

        let mut outcome = ScrapeOutcome::new();
        // First row is the rendered header.
        for row in rows.iter().skip(1) {
            outcome.push(Self::parse_row(*row));
        }
        info!(rows = outcome.len(), "parsed quote table");
        outcome
    }

    fn parse_row(row: ElementRef<'_>) -> QuoteRow {
        QuoteRow {
            name: cell_text(row, &NAME),
            ticker: cell_text(row, &TICKER),
            last_price: cell_text(row, &PRICE),
            price_change_pct: cell_text(row, &CHANGE_PCT),
            volume: cell_text(row, &VOLUME),
            change_1w: cell_text(row, &WEEK),
            change_1m: cell_text(row, &MONTH),
            change_ytd: cell_text(row, &YTD),
            change_1y: cell_text(row, &YEAR),
            cap_rub: cell_text(row, &CAP_RUB),
            cap_usd: cell_text(row, &CAP_USD),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::normalize::NO_INFORMATION;

    fn page(rows: &str) -> Html {
        Html::parse_document(&format!(
            "<html><body><div class=\"main__table\"><table>\
             <tr><th>Название</th><th>Тикер</th></tr>{rows}</table></div></body></html>"
        ))
    }

    fn full_row() -> &'static str {
        r#"<tr>
            <td class="trades-table__name"><a href="/q/SBER/">Сбербанк</a></td>
            <td class="trades-table__ticker">SBER</td>
            <td class="trades-table__price">305,2</td>
            <td class="trades-table__change-per">+1,2%</td>
            <td class="trades-table__volume">12 340,5</td>
            <td class="trades-table__week">0,5%</td>
            <td class="trades-table__month">2,1%</td>
            <td class="trades-table__first">10,0%</td>
            <td class="trades-table__year">15,3%</td>
            <td class="trades-table__rub">6 800</td>
            <td class="trades-table__usd">75,2</td>
        </tr>"#
    }

    #[test]
    fn parses_full_row_with_anchor_name() {
        let outcome = SmartlabQuotesParser::new().parse_table(&page(full_row()));
        assert_eq!(outcome.records.len(), 1);
        let row = &outcome.records[0];
        assert_eq!(row.name, "Сбербанк");
        assert_eq!(row.ticker, "SBER");
        assert_eq!(row.last_price, "305,2");
        assert_eq!(row.cap_usd, "75,2");
    }

    #[test]
    fn missing_cell_yields_sentinel_not_error() {
        let row = r#"<tr>
            <td class="trades-table__name"><a href="/q/GAZP/">Газпром</a></td>
            <td class="trades-table__ticker">GAZP</td>
        </tr>"#;
        let outcome = SmartlabQuotesParser::new().parse_table(&page(row));
        assert_eq!(outcome.records.len(), 1);
        let row = &outcome.records[0];
        assert_eq!(row.ticker, "GAZP");
        assert_eq!(row.cap_usd, NO_INFORMATION);
        assert_eq!(row.volume, NO_INFORMATION);
        assert!(outcome.skipped.is_empty());
    }

    #[test]
    fn name_without_anchor_is_sentinel() {
        let row = r#"<tr><td class="trades-table__name">Газпром</td></tr>"#;
        let outcome = SmartlabQuotesParser::new().parse_table(&page(row));
        assert_eq!(outcome.records[0].name, NO_INFORMATION);
    }

    #[test]
    fn header_row_is_not_a_record() {
        let outcome = SmartlabQuotesParser::new().parse_table(&page(""));
        assert!(outcome.records.is_empty());
        assert!(outcome.diagnostics.is_empty());
    }

    #[test]
    fn missing_container_fails_whole_scrape() {
        let doc = Html::parse_document("<html><body><table><tr><td>x</td></tr></table></body></html>");
        let outcome = SmartlabQuotesParser::new().parse_table(&doc);
        assert!(outcome.records.is_empty());
        assert_eq!(outcome.diagnostics.len(), 1);
    }

    #[test]
    fn missing_table_inside_container_fails_whole_scrape() {
        let doc = Html::parse_document("<html><body><div class=\"main__table\"></div></body></html>");
        let outcome = SmartlabQuotesParser::new().parse_table(&doc);
        assert!(outcome.records.is_empty());
        assert_eq!(outcome.diagnostics.len(), 1);
    }
}
