//! Maps free text pulled from the results page onto a `Symbol`.
//!
//! The page markup drifts, so a token goes through a chain of matchers,
//! most specific first, and the first hit wins.

use crate::types::Symbol;

/// Known spellings, in match-priority order. The substring pass walks this
/// table top to bottom, so earlier rows win ties.
pub const ALIASES: &[(&str, Symbol)] = &[
    ("1", Symbol::One),
    ("one", Symbol::One),
    ("number_1", Symbol::One),
    ("segment_1", Symbol::One),
    ("2", Symbol::Two),
    ("two", Symbol::Two),
    ("number_2", Symbol::Two),
    ("segment_2", Symbol::Two),
    ("5", Symbol::Five),
    ("five", Symbol::Five),
    ("number_5", Symbol::Five),
    ("segment_5", Symbol::Five),
    ("10", Symbol::Ten),
    ("ten", Symbol::Ten),
    ("number_10", Symbol::Ten),
    ("segment_10", Symbol::Ten),
    ("cash hunt", Symbol::CashHunt),
    ("cash_hunt", Symbol::CashHunt),
    ("cashhunt", Symbol::CashHunt),
    ("hunt", Symbol::CashHunt),
    ("ch", Symbol::CashHunt),
    ("h", Symbol::CashHunt),
    ("pachinko", Symbol::Pachinko),
    ("pach", Symbol::Pachinko),
    ("p", Symbol::Pachinko),
    ("coin flip", Symbol::CoinFlip),
    ("coin_flip", Symbol::CoinFlip),
    ("coinflip", Symbol::CoinFlip),
    ("flip", Symbol::CoinFlip),
    ("cf", Symbol::CoinFlip),
    ("c", Symbol::CoinFlip),
    ("crazy time", Symbol::CrazyTime),
    ("crazy_time", Symbol::CrazyTime),
    ("crazytime", Symbol::CrazyTime),
    ("ct", Symbol::CrazyTime),
];

/// Words that mark headings and navigation ("Crazy Time Tracker",
/// "Crazy Time Statistics") rather than a spin.
const PAGE_FURNITURE: &[&str] = &["tracker", "statistics"];

type Matcher = fn(&str) -> Option<Symbol>;

/// Evaluated in order; each receives the trimmed, lowercased token.
const MATCHERS: &[Matcher] = &[exact_alias, alias_substring, numeric_phrase, bonus_phrase];

/// Normalize a raw token. `None` means the text is not a recognisable spin.
pub fn normalize(token: &str) -> Option<Symbol> {
    let token = token.trim().to_lowercase();
    if token.is_empty() {
        return None;
    }
    MATCHERS.iter().find_map(|m| m(&token))
}

fn exact_alias(token: &str) -> Option<Symbol> {
    ALIASES
        .iter()
        .find(|(alias, _)| *alias == token)
        .map(|&(_, symbol)| symbol)
}

/// First alias contained in the token. Single-character aliases only match
/// exactly: as substrings they would claim nearly any text.
fn alias_substring(token: &str) -> Option<Symbol> {
    let furniture = is_page_furniture(token);
    ALIASES
        .iter()
        .filter(|(alias, _)| alias.len() > 1)
        .filter(|(_, symbol)| !(furniture && *symbol == Symbol::CrazyTime))
        .find(|(alias, _)| token.contains(alias))
        .map(|&(_, symbol)| symbol)
}

fn numeric_phrase(token: &str) -> Option<Symbol> {
    [Symbol::One, Symbol::Two, Symbol::Five, Symbol::Ten]
        .into_iter()
        .find(|symbol| {
            let n = symbol.code();
            token == n
                || token.contains(&format!("number {n}"))
                || token.contains(&format!("segment {n}"))
        })
}

fn bonus_phrase(token: &str) -> Option<Symbol> {
    if token.contains("cash hunt") {
        Some(Symbol::CashHunt)
    } else if token.contains("pachinko") {
        Some(Symbol::Pachinko)
    } else if token.contains("coin flip") {
        Some(Symbol::CoinFlip)
    } else if token.contains("crazy time") && !is_page_furniture(token) {
        Some(Symbol::CrazyTime)
    } else {
        None
    }
}

fn is_page_furniture(token: &str) -> bool {
    PAGE_FURNITURE.iter().any(|w| token.contains(w))
}
