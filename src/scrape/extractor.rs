use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::scrape::normalizer::normalize;
use crate::types::{ScrapeFailure, Symbol};

/// Zero-based index of the "Spin Result" column.
const SPIN_RESULT_COLUMN: usize = 2;

/// Class-name marker carried by outcome badges, e.g. `spin-cash-hunt`.
const SPIN_CLASS_MARKER: &str = "spin-";

fn selector(css: &'static str) -> Selector {
    Selector::parse(css).expect("static CSS selector")
}

/// Pull the spin history out of a results page, most recent first.
///
/// Reads the spin column of the first table; if that yields nothing
/// recognisable, falls back to every `spin-*` class on the page.
pub fn extract_symbols(html: &str) -> Result<Vec<Symbol>, ScrapeFailure> {
    let doc = Html::parse_document(html);

    let table = doc
        .select(&selector("table"))
        .next()
        .ok_or(ScrapeFailure::NoTable)?;

    let mut symbols = from_table(table);
    if symbols.is_empty() {
        debug!("Spin column yielded no symbols; scanning page for spin-* classes");
        symbols = from_spin_classes(&doc);
    }

    if symbols.is_empty() {
        return Err(ScrapeFailure::NoResults);
    }
    Ok(symbols)
}

fn from_table(table: ElementRef<'_>) -> Vec<Symbol> {
    let row_sel = selector("tr");
    let cell_sel = selector("td");

    table
        .select(&row_sel)
        .skip(1) // header row
        .filter_map(|row| row.select(&cell_sel).nth(SPIN_RESULT_COLUMN))
        .flat_map(symbols_from_cell)
        .collect()
}

/// Image alt text if present, else the trimmed cell text. When that token is
/// not recognised, each element inside the cell contributes the first of its
/// `spin-*` classes that is.
fn symbols_from_cell(cell: ElementRef<'_>) -> Vec<Symbol> {
    let token = match cell
        .select(&selector("img"))
        .next()
        .and_then(|img| img.value().attr("alt"))
        .filter(|alt| !alt.is_empty())
    {
        Some(alt) => alt.to_string(),
        None => cell.text().collect::<String>().trim().to_string(),
    };

    if token.is_empty() {
        return Vec::new();
    }
    if let Some(symbol) = normalize(&token) {
        return vec![symbol];
    }

    cell.descendants()
        .skip(1) // the cell itself
        .filter_map(ElementRef::wrap)
        .filter_map(|el| {
            el.value()
                .classes()
                .filter_map(spin_class_token)
                .find_map(|t| normalize(&t))
        })
        .collect()
}

fn from_spin_classes(doc: &Html) -> Vec<Symbol> {
    doc.select(&selector(r#"[class*="spin-"]"#))
        .flat_map(|el| el.value().classes())
        .filter_map(spin_class_token)
        .filter_map(|t| normalize(&t))
        .collect()
}

/// `spin-cash-hunt` → `cash-hunt`. `None` for unrelated classes.
fn spin_class_token(class: &str) -> Option<String> {
    class
        .contains(SPIN_CLASS_MARKER)
        .then(|| class.replace(SPIN_CLASS_MARKER, ""))
}
