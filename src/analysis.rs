use crate::types::{AnalysisResult, Pattern, Probabilities, Symbol, SymbolCounts, SymbolTable};

/// Spins considered when classifying the pattern.
const PATTERN_WINDOW: usize = 10;
/// Spins considered by the Calculated Delivery sub-branch.
const SHORT_WINDOW: usize = 5;

/// Frequency table, pattern and 3-spin prediction for a history given most
/// recent first. A fixed rule table, not a statistical model.
///
/// `None` entries stand for values that are not one of the 8 codes. They
/// count toward the total and as special spins, but never match a symbol.
pub fn analyze<T>(history: &[T]) -> AnalysisResult
where
    T: Copy + Into<Option<Symbol>>,
{
    let history: Vec<Option<Symbol>> = history.iter().map(|&s| s.into()).collect();
    let counts = count_symbols(&history);
    let last_10 = &history[..history.len().min(PATTERN_WINDOW)];
    let last_5 = &history[..history.len().min(SHORT_WINDOW)];

    let pattern = classify(last_10);
    AnalysisResult {
        pattern,
        prediction: predict(pattern, last_10, last_5),
        probabilities: probabilities(&counts, history.len()),
        stats: SymbolCounts(counts),
    }
}

fn count_symbols(history: &[Option<Symbol>]) -> SymbolTable<usize> {
    let mut counts = [0usize; 8];
    for s in history.iter().flatten() {
        counts[*s as usize] += 1;
    }
    SymbolTable(counts)
}

/// `count / total * 100` to 2 decimals; all zero for an empty history.
fn probabilities(counts: &SymbolTable<usize>, total: usize) -> Probabilities {
    let mut pct = [0.0f64; 8];
    if total > 0 {
        for symbol in Symbol::ALL {
            pct[symbol as usize] = round2(counts.get(symbol) as f64 / total as f64 * 100.0);
        }
    }
    Probabilities(SymbolTable(pct))
}

/// Rounds the exact binary value to 2 decimals, ties to even (3.125 -> 3.12).
fn round2(x: f64) -> f64 {
    format!("{x:.2}").parse().unwrap_or(x)
}

fn classify(last_10: &[Option<Symbol>]) -> Pattern {
    let special_count = last_10
        .iter()
        .filter(|&&s| s.map_or(true, Symbol::is_special))
        .count();
    match special_count {
        0 => Pattern::BasicDrain,
        1..=2 => Pattern::ProlongedDrain,
        3..=4 => Pattern::ReactiveManipulation,
        5..=6 => Pattern::CalculatedDelivery,
        _ => Pattern::EmotionalDelivery,
    }
}

fn predict(pattern: Pattern, last_10: &[Option<Symbol>], last_5: &[Option<Symbol>]) -> [Symbol; 3] {
    use crate::types::Symbol::*;
    match pattern {
        Pattern::BasicDrain => [One, Two, One],
        Pattern::ProlongedDrain => [One, Five, Two],
        Pattern::ReactiveManipulation => {
            if last_10.contains(&Some(CrazyTime)) {
                [One, Two, Five]
            } else {
                [CoinFlip, Ten, Two]
            }
        }
        Pattern::CalculatedDelivery => {
            if last_5.iter().any(|s| matches!(s, Some(CrazyTime | Pachinko))) {
                [One, Two, Ten]
            } else {
                [Pachinko, CashHunt, Five]
            }
        }
        Pattern::EmotionalDelivery => [CrazyTime, Pachinko, CashHunt],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Symbol::*;

    #[test]
    fn probabilities_cover_every_symbol() {
        let history = [One, One, Two, Two, Five, Five, Ten, Ten, CashHunt, CrazyTime];
        let r = analyze(&history);
        assert_eq!(r.probabilities.0.get(One), 20.0);
        assert_eq!(r.probabilities.0.get(Pachinko), 0.0);
        assert_eq!(r.probabilities.0.get(CrazyTime), 10.0);

        let json = serde_json::to_value(&r).unwrap();
        let probs = json["probabilities"].as_object().unwrap();
        assert_eq!(probs.len(), 8);
        for s in Symbol::ALL {
            assert!(probs.contains_key(s.code()), "missing {s}");
        }
        assert_eq!(json["stats"]["Cash Hunt"], 1);
        assert_eq!(json["stats"]["Pachinko"], 0);
    }

    #[test]
    fn probabilities_round_to_two_decimals() {
        let r = analyze(&[One, Two, Two]);
        assert_eq!(r.probabilities.0.get(One), 33.33);
        assert_eq!(r.probabilities.0.get(Two), 66.67);
    }

    #[test]
    fn exact_halves_round_to_even() {
        let mut history = vec![One; 31];
        history.push(CrazyTime);
        assert_eq!(analyze(&history).probabilities.0.get(CrazyTime), 3.12);

        let mut history = vec![One; 159];
        history.push(Pachinko);
        assert_eq!(analyze(&history).probabilities.0.get(Pachinko), 0.62);
    }

    #[test]
    fn unknown_entries_count_as_special_but_match_nothing() {
        let r = analyze(&[None, Some(One)]);
        assert_eq!(r.probabilities.0.get(One), 50.0);
        assert_eq!(r.stats.0.get(One), 1);
        assert!(Symbol::ALL.iter().filter(|&&s| s != One).all(|&s| r.stats.0.get(s) == 0));
        assert_eq!(r.pattern, Pattern::ProlongedDrain);

        // Four unknowns are specials, yet none of them is a Crazy Time.
        let r = analyze(&[None, None, None, None, Some(One)]);
        assert_eq!(r.pattern, Pattern::ReactiveManipulation);
        assert_eq!(r.prediction, [CoinFlip, Ten, Two]);
    }

    #[test]
    fn no_specials_is_basic_drain() {
        let history = [One, Two, Five, Ten, One, Two, Five, Ten, One, Two, CrazyTime, CrazyTime];
        let r = analyze(&history);
        assert_eq!(r.pattern, Pattern::BasicDrain);
        assert_eq!(r.prediction, [One, Two, One]);
    }

    #[test]
    fn all_specials_is_emotional_delivery() {
        let history = [CrazyTime, Pachinko, CashHunt, CoinFlip, CrazyTime, Pachinko, CashHunt, CoinFlip, CrazyTime, Pachinko];
        let r = analyze(&history);
        assert_eq!(r.pattern, Pattern::EmotionalDelivery);
        assert_eq!(r.prediction, [CrazyTime, Pachinko, CashHunt]);
        assert_eq!(serde_json::to_value(r.pattern).unwrap(), "Entrega Emocional");
    }

    #[test]
    fn one_or_two_specials_is_prolonged_drain() {
        let r = analyze(&[CashHunt, One, Two, CoinFlip]);
        assert_eq!(r.pattern, Pattern::ProlongedDrain);
        assert_eq!(r.prediction, [One, Five, Two]);
    }

    #[test]
    fn reactive_manipulation_branches_on_crazy_time() {
        let with_ct = [One, Two, One, Two, One, Two, CashHunt, One, CrazyTime, CoinFlip];
        let r = analyze(&with_ct);
        assert_eq!(r.pattern, Pattern::ReactiveManipulation);
        assert_eq!(r.prediction, [One, Two, Five]);

        let without_ct = [One, Two, One, Two, One, Two, CashHunt, One, Pachinko, CoinFlip, CrazyTime];
        let r = analyze(&without_ct);
        assert_eq!(r.pattern, Pattern::ReactiveManipulation);
        assert_eq!(r.prediction, [CoinFlip, Ten, Two]);
    }

    #[test]
    fn calculated_delivery_branches_on_last_five() {
        let recent_big = [Pachinko, One, Two, One, Two, CashHunt, CoinFlip, CashHunt, CoinFlip, CashHunt];
        let r = analyze(&recent_big);
        assert_eq!(r.pattern, Pattern::CalculatedDelivery);
        assert_eq!(r.prediction, [One, Two, Ten]);

        let no_recent_big = [One, Two, One, Two, One, CashHunt, CrazyTime, CashHunt, CoinFlip, Pachinko];
        let r = analyze(&no_recent_big);
        assert_eq!(r.pattern, Pattern::CalculatedDelivery);
        assert_eq!(r.prediction, [Pachinko, CashHunt, Five]);
    }

    #[test]
    fn empty_history_is_all_zero_basic_drain() {
        let r = analyze::<Symbol>(&[]);
        assert_eq!(r.pattern, Pattern::BasicDrain);
        assert_eq!(r.prediction, [One, Two, One]);
        assert!(Symbol::ALL.iter().all(|&s| r.probabilities.0.get(s) == 0.0));
        assert!(Symbol::ALL.iter().all(|&s| r.stats.0.get(s) == 0));
    }
}
