// src/utils/form.rs
//
// Helpers for the survey's positional form encoding: fields arrive as
// `question_1..question_N` (and `comment_1..comment_N`), where the numeric
// suffix binds the value to the i-th question of the lesson's active list.

use std::collections::HashMap;

/// Collects `<prefix><index>` fields and returns their values ordered by the
/// numeric index. Keys whose suffix is not an integer are ignored.
///
/// Numeric ordering matters: a lexicographic key sort would put
/// `question_10` before `question_2`.
pub fn indexed_values(form: &HashMap<String, String>, prefix: &str) -> Vec<String> {
    let mut entries: Vec<(usize, &String)> = form
        .iter()
        .filter_map(|(key, value)| {
            let suffix = key.strip_prefix(prefix)?;
            let index: usize = suffix.parse().ok()?;
            Some((index, value))
        })
        .collect();

    entries.sort_by_key(|(index, _)| *index);
    entries.into_iter().map(|(_, v)| v.clone()).collect()
}

/// Coerces a submitted score to an integer.
///
/// Missing, empty, or non-numeric input means "no answer": the question is
/// excluded from the write entirely rather than stored as null or zero.
pub fn parse_score(raw: Option<&String>) -> Option<i32> {
    raw?.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn indexed_values_orders_numerically() {
        let form = form(&[
            ("question_10", "tenth"),
            ("question_2", "second"),
            ("question_1", "first"),
            ("comment_1", "ignored"),
        ]);
        assert_eq!(
            indexed_values(&form, "question_"),
            vec!["first", "second", "tenth"]
        );
    }

    #[test]
    fn indexed_values_skips_non_numeric_suffixes() {
        let form = form(&[("question_", "no index"), ("question_x", "bad"), ("question_1", "ok")]);
        assert_eq!(indexed_values(&form, "question_"), vec!["ok"]);
    }

    #[test]
    fn parse_score_accepts_integers_only() {
        let four = "4".to_string();
        let empty = "".to_string();
        let word = "abc".to_string();
        let padded = " 5 ".to_string();

        assert_eq!(parse_score(Some(&four)), Some(4));
        assert_eq!(parse_score(Some(&padded)), Some(5));
        assert_eq!(parse_score(Some(&empty)), None);
        assert_eq!(parse_score(Some(&word)), None);
        assert_eq!(parse_score(None), None);
    }
}
