use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Symbol
// ---------------------------------------------------------------------------

/// One wheel outcome. Declaration order is the order used everywhere a
/// per-symbol table is emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Symbol {
    #[serde(rename = "1")]
    One,
    #[serde(rename = "2")]
    Two,
    #[serde(rename = "5")]
    Five,
    #[serde(rename = "10")]
    Ten,
    #[serde(rename = "H")]
    CashHunt,
    #[serde(rename = "P")]
    Pachinko,
    #[serde(rename = "C")]
    CoinFlip,
    #[serde(rename = "CT")]
    CrazyTime,
}

impl Symbol {
    pub const ALL: [Symbol; 8] = [
        Symbol::One,
        Symbol::Two,
        Symbol::Five,
        Symbol::Ten,
        Symbol::CashHunt,
        Symbol::Pachinko,
        Symbol::CoinFlip,
        Symbol::CrazyTime,
    ];

    /// Wire code, as served by the API.
    pub fn code(self) -> &'static str {
        match self {
            Symbol::One => "1",
            Symbol::Two => "2",
            Symbol::Five => "5",
            Symbol::Ten => "10",
            Symbol::CashHunt => "H",
            Symbol::Pachinko => "P",
            Symbol::CoinFlip => "C",
            Symbol::CrazyTime => "CT",
        }
    }

    /// Label used in the analysis `stats` table.
    pub fn display_name(self) -> &'static str {
        match self {
            Symbol::One => "1",
            Symbol::Two => "2",
            Symbol::Five => "5",
            Symbol::Ten => "10",
            Symbol::CashHunt => "Cash Hunt",
            Symbol::Pachinko => "Pachinko",
            Symbol::CoinFlip => "Coin Flip",
            Symbol::CrazyTime => "Crazy Time",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Symbol::ALL.into_iter().find(|s| s.code() == code)
    }

    /// Bonus-game segments: anything that is not a plain number.
    pub fn is_special(self) -> bool {
        !matches!(self, Symbol::One | Symbol::Two | Symbol::Five | Symbol::Ten)
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ---------------------------------------------------------------------------
// Scrape results
// ---------------------------------------------------------------------------

/// Payload of `GET /api/results`. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScrapeResult {
    pub success: bool,
    pub message: String,
    /// Most recent spin first, at most MAX_RESULTS entries.
    pub results: Vec<Symbol>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

/// Why a live scrape produced nothing usable. Never surfaced to API callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScrapeFailure {
    /// Network error, timeout or non-2xx from the source.
    Transport(String),
    /// The page had no `<table>`.
    NoTable,
    /// Neither extraction strategy yielded a recognised symbol.
    NoResults,
}

impl std::fmt::Display for ScrapeFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScrapeFailure::Transport(e) => write!(f, "transport failure: {e}"),
            ScrapeFailure::NoTable => write!(f, "results table not found"),
            ScrapeFailure::NoResults => write!(f, "no results found on page"),
        }
    }
}

/// Where a served result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultSource {
    Live,
    Backup,
}

impl std::fmt::Display for ResultSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResultSource::Live => write!(f, "live"),
            ResultSource::Backup => write!(f, "backup"),
        }
    }
}

// ---------------------------------------------------------------------------
// Analysis
// ---------------------------------------------------------------------------

/// Rule-table classification of the last ten spins by bonus count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Pattern {
    /// 0 specials
    #[serde(rename = "Drenagem Básica")]
    BasicDrain,
    /// 1–2 specials
    #[serde(rename = "Drenagem Prolongada")]
    ProlongedDrain,
    /// 3–4 specials
    #[serde(rename = "Manipulação Reativa")]
    ReactiveManipulation,
    /// 5–6 specials
    #[serde(rename = "Entrega Calculada")]
    CalculatedDelivery,
    /// 7+ specials
    #[serde(rename = "Entrega Emocional")]
    EmotionalDelivery,
}

impl Pattern {
    pub fn label(self) -> &'static str {
        match self {
            Pattern::BasicDrain => "Drenagem Básica",
            Pattern::ProlongedDrain => "Drenagem Prolongada",
            Pattern::ReactiveManipulation => "Manipulação Reativa",
            Pattern::CalculatedDelivery => "Entrega Calculada",
            Pattern::EmotionalDelivery => "Entrega Emocional",
        }
    }
}

impl std::fmt::Display for Pattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Per-symbol table, serialized as a JSON object in `Symbol::ALL` order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SymbolTable<T>(pub [T; 8]);

impl<T: Copy> SymbolTable<T> {
    pub fn get(&self, symbol: Symbol) -> T {
        self.0[symbol as usize]
    }
}

/// Probabilities keyed by symbol code: `{"1": 20.0, ..., "CT": 10.0}`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Probabilities(pub SymbolTable<f64>);

/// Counts keyed by display name: `{"1": 2, ..., "Crazy Time": 1}`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SymbolCounts(pub SymbolTable<usize>);

impl Serialize for Probabilities {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(Symbol::ALL.len()))?;
        for symbol in Symbol::ALL {
            map.serialize_entry(symbol.code(), &self.0.get(symbol))?;
        }
        map.end()
    }
}

impl Serialize for SymbolCounts {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(Symbol::ALL.len()))?;
        for symbol in Symbol::ALL {
            map.serialize_entry(symbol.display_name(), &self.0.get(symbol))?;
        }
        map.end()
    }
}

/// Payload of `POST /api/analyze`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub pattern: Pattern,
    pub prediction: [Symbol; 3],
    pub probabilities: Probabilities,
    pub stats: SymbolCounts,
}
