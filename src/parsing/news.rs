//! RBC news parser: front-page article discovery plus per-article
//! title/body extraction.
//!
//! Discovery walks every anchor on the front page and keeps the ones that
//! look like concrete articles rather than section listings. Each candidate
//! page is then fetched and pushed through two fallback chains (title and
//! body), where every strategy has the same signature and the first
//! acceptable result wins. Failures are isolated per URL: one broken
//! article never ends the scrape.

use std::collections::HashSet;
use std::time::Duration;

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use tracing::{debug, error, warn};
use url::Url;

use crate::domain::records::{NewsItem, ScrapeOutcome};
use crate::infrastructure::config::NewsConfig;
use crate::infrastructure::http_client::PageFetcher;
use crate::parsing::extract::{class_contains, collect_text};

/// Path substrings that mark a link as belonging to a news section.
const SECTION_PATTERNS: &[&str] = &[
    "/article/",
    "/news/",
    "/story/",
    "/politics/",
    "/economics/",
    "/business/",
    "/society/",
    "/technology/",
    "/finance/",
    "/rbcfreenews/",
    "/life/",
    "/style/",
    "/books/",
    "/person/",
    "/designs/",
    "pro.rbc.ru/demo/",
    "pro.rbc.ru/books/",
    "style.rbc.ru/",
];

/// Section roots, tracking-decorated links and known utility stories that
/// live under news paths but are not articles.
const EXCLUDED_PATTERNS: &[&str] = &[
    "/politics/?",
    "/economics/?",
    "/business/?",
    "/society/?",
    "/technology/?",
    "/finance/?",
    "?utm_source=",
    "story/68822f889a79475439ba67bb",
];

/// Class substrings of containers that usually hold article text.
const CONTENT_CLASS_KEYWORDS: &[&str] = &["article", "text", "content", "body", "story"];

/// First-pass paragraph denylist (subscriptions, ads, cookie banners).
const SKIP_WORDS: &[&str] = &[
    "подписка",
    "реклама",
    "cookie",
    "политика конфиденциальности",
    "читайте также",
    "подробнее",
    "источник",
    "фото:",
    "фото",
];

/// Second-pass denylist: sponsored-content phrases seen in the wild.
const SKIP_PHRASES: &[&str] = &[
    "читайте рбк",
    "реклама",
    "подписка",
    "cookie",
    "политика конфиденциальности",
    "какое вино подать",
    "как приготовить",
    "чем занять детей",
    "как легко завести разговор",
    "из каких сыров",
    "что делать, если пролил",
    "какие есть правила",
    "какие игры можно",
    "как легко запомнить",
    "попробуйте новую функцию",
    "гигачат",
    "пао «сбербанк»",
    "18+",
];

// Article URLs carry either a date-stamped hex id or a bare 24-hex id.
static DATED_ARTICLE_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/\d{2}/\d{2}/\d{4}/[a-f0-9]+").expect("valid pattern"));
static HEX_ARTICLE_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/[a-f0-9]{24}").expect("valid pattern"));
/// Trailing site-name suffix of the `<title>` tag (" :: РБК ...").
static SITE_TITLE_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*::\s*РБК.*$").expect("valid pattern"));
/// Time-stamp-like paragraph prefix ("12:45 ...").
static CLOCK_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{1,2}:\d{2}").expect("valid pattern"));
/// Photo/video caption prefix.
static CAPTION_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(фото|видео):?").expect("valid pattern"));

static ANCHOR_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href]").expect("valid selector"));
static H1_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("h1").expect("valid selector"));
static HEADING_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("h1, h2").expect("valid selector"));
static OG_TITLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("meta[property=\"og:title\"]").expect("valid selector"));
static TITLE_TAG_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("title").expect("valid selector"));
static ARTICLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("article").expect("valid selector"));
static CONTAINER_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div, section").expect("valid selector"));
static PARAGRAPH_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("p").expect("valid selector"));

/// Minimum length for an accepted title.
const MIN_TITLE_LEN: usize = 10;
/// Anchor text longer than this marks an article link even without an id.
const MIN_ANCHOR_TEXT_LEN: usize = 15;

/// One title/body extraction attempt; chains are ordered slices of these,
/// evaluated left to right, first acceptable result wins.
type Strategy = fn(&Html) -> Option<String>;

const TITLE_STRATEGIES: &[Strategy] = &[
    title_from_h1,
    title_from_og_meta,
    title_from_title_tag,
    title_from_titled_heading,
];

const BODY_STRATEGIES: &[Strategy] = &[
    body_from_article_tag,
    body_from_content_container,
    body_from_all_paragraphs,
];

/// Parser for the RBC front page and its linked article pages.
pub struct RbcNewsParser {
    base: Url,
    max_articles: usize,
    article_delay: Duration,
}

impl RbcNewsParser {
    pub fn new() -> Result<Self> {
        Self::from_config(&NewsConfig::default())
    }

    pub fn from_config(config: &NewsConfig) -> Result<Self> {
        let base = Url::parse(&config.base_url)
            .with_context(|| format!("invalid news base url '{}'", config.base_url))?;
        Ok(Self {
            base,
            max_articles: config.max_articles,
            article_delay: Duration::from_millis(config.article_delay_ms),
        })
    }

    /// Scrape the front page and every discovered article.
    ///
    /// The front-page fetch is the only hard dependency; when it fails the
    /// outcome is empty with a diagnostic. Per-article failures are recorded
    /// as skips and processing continues with the remaining URLs.
    pub async fn collect(&self, fetcher: &dyn PageFetcher) -> ScrapeOutcome<NewsItem> {
        let front = match fetcher.fetch_text(self.base.as_str()).await {
            Ok(text) => text,
            Err(e) => {
                error!("front page fetch failed: {e:#}");
                return ScrapeOutcome::failed(format!("front page fetch failed: {e}"));
            }
        };

        let urls = {
            let doc = Html::parse_document(&front);
            self.discover_article_urls(&doc)
        };
        debug!(candidates = urls.len(), "discovered article candidates");

        let mut outcome = ScrapeOutcome::new();
        for (index, url) in urls.iter().enumerate() {
            if index > 0 {
                // Politeness pause between article fetches.
                tokio::time::sleep(self.article_delay).await;
            }
            let page = match fetcher.fetch_text(url).await {
                Ok(page) => page,
                Err(e) => {
                    warn!(url = %url, "article fetch failed: {e:#}");
                    outcome.skip(index, format!("fetch failed: {e}"));
                    continue;
                }
            };
            let (title, body) = {
                let doc = Html::parse_document(&page);
                (extract_title(&doc), extract_body(&doc))
            };
            if title.is_empty() {
                warn!(url = %url, "article skipped: no acceptable title");
                outcome.skip(index, "no acceptable title");
                continue;
            }
            outcome.push(NewsItem {
                title,
                url: url.clone(),
                body,
            });
        }
        outcome
    }

    /// Scan front-page anchors for links that look like concrete articles.
    ///
    /// A link qualifies when its path contains a news-section substring AND
    /// it either matches an article-id shape or carries long visible text;
    /// section roots and tracking links are excluded. URLs are absolutized,
    /// query-stripped, deduplicated, and capped.
    pub fn discover_article_urls(&self, doc: &Html) -> Vec<String> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut urls = Vec::new();

        for link in doc.select(&ANCHOR_SELECTOR) {
            let Some(href) = link.value().attr("href") else {
                continue;
            };
            let text = collect_text(link);

            let in_news_section = SECTION_PATTERNS.iter().any(|p| href.contains(p));
            let on_site = href.contains("rbc.ru") || href.starts_with('/');
            let excluded = EXCLUDED_PATTERNS.iter().any(|p| href.contains(p));
            let has_article_id =
                DATED_ARTICLE_ID.is_match(href) || HEX_ARTICLE_ID.is_match(href);
            let long_anchor = text.chars().count() > MIN_ANCHOR_TEXT_LEN;

            if in_news_section && on_site && !excluded && (has_article_id || long_anchor) {
                let Some(canonical) = self.canonicalize(href) else {
                    continue;
                };
                if seen.insert(canonical.clone()) {
                    urls.push(canonical);
                }
            }
        }

        urls.truncate(self.max_articles);
        urls
    }

    /// Absolutize a href against the site origin and strip query/fragment.
    fn canonicalize(&self, href: &str) -> Option<String> {
        let mut resolved = if href.starts_with("http") {
            Url::parse(href).ok()?
        } else {
            self.base.join(href).ok()?
        };
        resolved.set_query(None);
        resolved.set_fragment(None);
        Some(resolved.to_string())
    }
}

/// Run the title chain; empty string when no strategy yields an acceptable
/// (longer than [`MIN_TITLE_LEN`]) title.
pub fn extract_title(doc: &Html) -> String {
    TITLE_STRATEGIES
        .iter()
        .find_map(|strategy| strategy(doc).filter(|t| t.chars().count() > MIN_TITLE_LEN))
        .unwrap_or_default()
}

/// Run the body chain; empty string when every strategy comes up short.
/// An empty body is non-fatal for the article.
pub fn extract_body(doc: &Html) -> String {
    BODY_STRATEGIES
        .iter()
        .find_map(|strategy| strategy(doc))
        .unwrap_or_default()
}

fn title_from_h1(doc: &Html) -> Option<String> {
    doc.select(&H1_SELECTOR)
        .next()
        .map(collect_text)
        .filter(|t| !t.is_empty())
}

fn title_from_og_meta(doc: &Html) -> Option<String> {
    doc.select(&OG_TITLE_SELECTOR)
        .next()
        .and_then(|meta| meta.value().attr("content"))
        .map(|content| content.trim().to_string())
        .filter(|t| !t.is_empty())
}

fn title_from_title_tag(doc: &Html) -> Option<String> {
    doc.select(&TITLE_TAG_SELECTOR)
        .next()
        .map(collect_text)
        .map(|t| SITE_TITLE_SUFFIX.replace(&t, "").trim().to_string())
        .filter(|t| !t.is_empty())
}

fn title_from_titled_heading(doc: &Html) -> Option<String> {
    doc.select(&HEADING_SELECTOR)
        .find(|el| class_contains(*el, "title"))
        .map(collect_text)
        .filter(|t| !t.is_empty())
}

fn body_from_article_tag(doc: &Html) -> Option<String> {
    let article = doc.select(&ARTICLE_SELECTOR).next()?;
    let parts: Vec<String> = article
        .select(&PARAGRAPH_SELECTOR)
        .map(collect_text)
        .filter(|t| t.chars().count() > 20)
        .collect();
    (!parts.is_empty()).then(|| parts.join(" "))
}

fn body_from_content_container(doc: &Html) -> Option<String> {
    for container in doc.select(&CONTAINER_SELECTOR) {
        if !CONTENT_CLASS_KEYWORDS
            .iter()
            .any(|keyword| class_contains(container, keyword))
        {
            continue;
        }
        let parts: Vec<String> = container
            .select(&PARAGRAPH_SELECTOR)
            .map(collect_text)
            .filter(|t| t.chars().count() > 20)
            .collect();
        if !parts.is_empty() {
            return Some(parts.join(" "));
        }
    }
    None
}

/// Last resort: every paragraph on the page, filtered twice for
/// boilerplate, preferring long paragraphs.
fn body_from_all_paragraphs(doc: &Html) -> Option<String> {
    let candidates: Vec<String> = doc
        .select(&PARAGRAPH_SELECTOR)
        .map(collect_text)
        .filter(|text| {
            let lowered = text.to_lowercase();
            text.chars().count() > 50
                && !SKIP_WORDS.iter().any(|word| lowered.contains(word))
                && !text.starts_with('©')
                && !CLOCK_PREFIX.is_match(text)
        })
        .collect();

    let filtered = drop_boilerplate(candidates);
    if filtered.is_empty() {
        return None;
    }

    let long: Vec<&String> = filtered.iter().filter(|p| p.chars().count() > 100).collect();
    let joined = if long.is_empty() {
        filtered
            .iter()
            .take(10)
            .cloned()
            .collect::<Vec<_>>()
            .join(" ")
    } else {
        long.into_iter()
            .take(15)
            .cloned()
            .collect::<Vec<_>>()
            .join(" ")
    };
    Some(joined)
}

fn drop_boilerplate(parts: Vec<String>) -> Vec<String> {
    parts
        .into_iter()
        .filter(|p| {
            let lowered = p.to_lowercase();
            p.chars().count() >= 50
                && !SKIP_PHRASES.iter().any(|phrase| lowered.contains(phrase))
                && !CAPTION_PREFIX.is_match(p)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;

    struct StubFetcher {
        pages: HashMap<String, String>,
    }

    impl StubFetcher {
        fn new(pages: &[(&str, &str)]) -> Self {
            Self {
                pages: pages
                    .iter()
                    .map(|(url, body)| (url.to_string(), body.to_string()))
                    .collect(),
            }
        }
    }

    #[async_trait]
    impl PageFetcher for StubFetcher {
        async fn fetch_text(&self, url: &str) -> Result<String> {
            self.pages
                .get(url)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("no page for {url}"))
        }
    }

    fn parser() -> RbcNewsParser {
        RbcNewsParser::new().unwrap()
    }

    const LONG_PARAGRAPH: &str = "В понедельник на московской бирже индекс показал заметный \
        рост на фоне повышения цен на сырьевые товары и укрепления рубля к основным валютам.";

    #[test]
    fn discovery_keeps_article_and_drops_section_link() {
        let html = Html::parse_document(
            r#"<html><body>
            <a href="/politics/07/12/2025/abc123ef0123456789abcdef">X</a>
            <a href="/politics/?utm_source=y">Section</a>
            </body></html>"#,
        );
        let urls = parser().discover_article_urls(&html);
        assert_eq!(
            urls,
            vec!["https://www.rbc.ru/politics/07/12/2025/abc123ef0123456789abcdef".to_string()]
        );
    }

    #[test]
    fn discovery_accepts_long_anchor_text_without_id() {
        let html = Html::parse_document(
            r#"<a href="/economics/long-read">Правительство обсудило новые меры поддержки</a>"#,
        );
        let urls = parser().discover_article_urls(&html);
        assert_eq!(urls, vec!["https://www.rbc.ru/economics/long-read".to_string()]);
    }

    #[test]
    fn discovery_rejects_short_anchor_without_id() {
        let html = Html::parse_document(r#"<a href="/economics/subsection">Экономика</a>"#);
        assert!(parser().discover_article_urls(&html).is_empty());
    }

    #[test]
    fn discovery_deduplicates_on_query_stripped_url() {
        let html = Html::parse_document(
            r#"<body>
            <a href="/news/aabbccddeeff00112233445566?from=main">заголовок достаточной длины</a>
            <a href="https://www.rbc.ru/news/aabbccddeeff00112233445566">другой заголовок тоже длинный</a>
            </body>"#,
        );
        let urls = parser().discover_article_urls(&html);
        assert_eq!(
            urls,
            vec!["https://www.rbc.ru/news/aabbccddeeff00112233445566".to_string()]
        );
    }

    #[test]
    fn discovery_caps_candidate_list() {
        let mut body = String::new();
        for i in 0..40 {
            body.push_str(&format!(
                "<a href=\"/news/{i:024}\">новость с достаточно длинным заголовком</a>"
            ));
        }
        let html = Html::parse_document(&body);
        assert_eq!(parser().discover_article_urls(&html).len(), 30);
    }

    #[test]
    fn title_prefers_h1() {
        let html = Html::parse_document(
            "<html><head><title>Из тега title :: РБК</title></head>\
             <body><h1>Заголовок из h1 достаточной длины</h1></body></html>",
        );
        assert_eq!(extract_title(&html), "Заголовок из h1 достаточной длины");
    }

    #[test]
    fn title_falls_back_to_og_meta_when_h1_is_short() {
        let html = Html::parse_document(
            "<html><head><meta property=\"og:title\" content=\"Заголовок из метаданных страницы\">\
             </head><body><h1>Коротко</h1></body></html>",
        );
        assert_eq!(extract_title(&html), "Заголовок из метаданных страницы");
    }

    #[test]
    fn title_tag_strips_site_suffix() {
        let html = Html::parse_document(
            "<html><head><title>Важная новость про рынок :: РБК Инвестиции</title></head><body></body></html>",
        );
        assert_eq!(extract_title(&html), "Важная новость про рынок");
    }

    #[test]
    fn title_falls_back_to_classed_heading() {
        let html = Html::parse_document(
            "<body><h2 class=\"news__title\">Заголовок из элемента с классом</h2></body>",
        );
        assert_eq!(extract_title(&html), "Заголовок из элемента с классом");
    }

    #[test]
    fn title_empty_when_nothing_qualifies() {
        let html = Html::parse_document("<body><h1>Мало</h1></body>");
        assert_eq!(extract_title(&html), "");
    }

    #[test]
    fn body_prefers_article_tag() {
        let html = Html::parse_document(&format!(
            "<body><article><p>{LONG_PARAGRAPH}</p><p>коротко</p></article>\
             <div class=\"article__text\"><p>{LONG_PARAGRAPH}</p></div></body>"
        ));
        assert_eq!(extract_body(&html), LONG_PARAGRAPH);
    }

    #[test]
    fn body_falls_back_to_classed_container() {
        let html = Html::parse_document(&format!(
            "<body><div class=\"article__text\"><p>{LONG_PARAGRAPH}</p></div></body>"
        ));
        assert_eq!(extract_body(&html), LONG_PARAGRAPH);
    }

    #[test]
    fn body_fallback_filters_boilerplate_paragraphs() {
        let html = Html::parse_document(&format!(
            "<body>\
             <p>{LONG_PARAGRAPH}</p>\
             <p>Реклама: подпишитесь на наш замечательный платный продукт прямо сейчас же</p>\
             <p>© Все права защищены, перепечатка запрещена без письменного разрешения редакции</p>\
             </body>"
        ));
        assert_eq!(extract_body(&html), LONG_PARAGRAPH);
    }

    #[test]
    fn body_empty_when_no_paragraphs_survive() {
        let html = Html::parse_document("<body><p>Мало текста</p></body>");
        assert_eq!(extract_body(&html), "");
    }

    #[tokio::test]
    async fn collect_isolates_per_article_failures() {
        let article_a = "https://www.rbc.ru/news/aabbccddeeff001122334455";
        let article_b = "https://www.rbc.ru/news/aabbccddeeff001122334466";
        let front = format!(
            "<body><a href=\"{article_a}\">первый длинный заголовок статьи</a>\
             <a href=\"{article_b}\">второй длинный заголовок статьи</a></body>"
        );
        let page = format!("<h1>Настоящий заголовок статьи</h1><article><p>{LONG_PARAGRAPH}</p></article>");
        // article_b is intentionally absent: its fetch fails.
        let fetcher = StubFetcher::new(&[
            ("https://www.rbc.ru/", front.as_str()),
            (article_a, page.as_str()),
        ]);

        let outcome = parser().collect(&fetcher).await;
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].url, article_a);
        assert_eq!(outcome.records[0].title, "Настоящий заголовок статьи");
        assert_eq!(outcome.skipped.len(), 1);
        assert_eq!(outcome.skipped[0].index, 1);
    }

    #[tokio::test]
    async fn collect_drops_articles_without_titles() {
        let article = "https://www.rbc.ru/news/aabbccddeeff001122334455";
        let front =
            format!("<body><a href=\"{article}\">какой-то длинный заголовок статьи</a></body>");
        let fetcher = StubFetcher::new(&[
            ("https://www.rbc.ru/", front.as_str()),
            (article, "<body><h1>Мало</h1></body>"),
        ]);

        let outcome = parser().collect(&fetcher).await;
        assert!(outcome.records.is_empty());
        assert_eq!(outcome.skipped.len(), 1);
        assert_eq!(outcome.skipped[0].reason, "no acceptable title");
    }

    #[tokio::test]
    async fn collect_returns_failed_outcome_when_front_page_unreachable() {
        let fetcher = StubFetcher::new(&[]);
        let outcome = parser().collect(&fetcher).await;
        assert!(outcome.records.is_empty());
        assert_eq!(outcome.diagnostics.len(), 1);
    }
}
