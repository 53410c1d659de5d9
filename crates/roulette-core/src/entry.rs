//! Contestant list parsing.
//!
//! Grammar of a single entry: `name[/weight][*count]`, where the two
//! suffixes may appear in either order. `weight` is a positive number and
//! `count` a positive integer up to [`MAX_COUNT`]; both default to 1.
//! Entries are separated by commas or newlines.

/// A parsed contestant entry before weight normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct ContestantEntry {
    pub name: String,
    pub weight: f32,
    pub count: usize,
}

/// Lowest normalized weight.
pub const MIN_WEIGHT: f32 = 0.1;
/// Highest normalized weight.
pub const MAX_WEIGHT: f32 = 1.0;
/// Largest `*count` a single entry may ask for.
pub const MAX_COUNT: usize = 1000;

/// Splits free text into raw entries on commas and newlines.
pub fn split_entries(text: &str) -> Vec<String> {
    text.split([',', '\n'])
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Parses one entry. Returns `None` for blank names or malformed suffixes.
pub fn parse_entry(entry: &str) -> Option<ContestantEntry> {
    let entry = entry.trim();
    let split_at = entry.find(['/', '*']).unwrap_or(entry.len());
    let name = entry[..split_at].trim();
    if name.is_empty() {
        return None;
    }

    let mut weight: Option<f32> = None;
    let mut count: Option<usize> = None;
    let mut rest = &entry[split_at..];

    while let Some(marker) = rest.chars().next() {
        let body = &rest[1..];
        let end = body.find(['/', '*']).unwrap_or(body.len());
        let value = body[..end].trim();

        match marker {
            '/' if weight.is_none() => {
                let parsed: f32 = value.parse().ok()?;
                if !parsed.is_finite() || parsed <= 0.0 {
                    return None;
                }
                weight = Some(parsed);
            }
            '*' if count.is_none() => {
                let parsed: usize = value.parse().ok()?;
                if parsed == 0 || parsed > MAX_COUNT {
                    return None;
                }
                count = Some(parsed);
            }
            _ => return None,
        }
        rest = &body[end..];
    }

    Some(ContestantEntry {
        name: name.to_string(),
        weight: weight.unwrap_or(1.0),
        count: count.unwrap_or(1),
    })
}

/// Parses every entry, dropping malformed ones.
pub fn parse_entries<S: AsRef<str>>(entries: &[S]) -> Vec<ContestantEntry> {
    entries
        .iter()
        .filter_map(|raw| {
            let parsed = parse_entry(raw.as_ref());
            if parsed.is_none() {
                tracing::warn!("[roulette] ignoring malformed contestant entry: {:?}", raw.as_ref());
            }
            parsed
        })
        .collect()
}

/// Rescales weights linearly so the lightest entry maps to [`MIN_WEIGHT`]
/// and the heaviest to [`MAX_WEIGHT`]. When every weight is equal they all
/// become [`MIN_WEIGHT`].
pub fn normalize_weights(entries: &mut [ContestantEntry]) {
    let (min, max) = entries
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(min, max), e| {
            (min.min(e.weight), max.max(e.weight))
        });
    let gap = max - min;

    for entry in entries.iter_mut() {
        entry.weight = if gap > 0.0 {
            MIN_WEIGHT + (entry.weight - min) / gap * (MAX_WEIGHT - MIN_WEIGHT)
        } else {
            MIN_WEIGHT
        };
    }
}

/// Total number of marbles the entries expand into, saturating at `usize::MAX`.
pub fn total_count(entries: &[ContestantEntry]) -> usize {
    entries.iter().fold(0, |total, e| total.saturating_add(e.count))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_entries() {
        let entries = split_entries("A*2, B\n\n C/3 ,");
        assert_eq!(entries, vec!["A*2", "B", "C/3"]);
    }

    #[test]
    fn test_parse_plain_name() {
        let entry = parse_entry("  Kimchi stew ").unwrap();
        assert_eq!(entry.name, "Kimchi stew");
        assert_eq!(entry.weight, 1.0);
        assert_eq!(entry.count, 1);
    }

    #[test]
    fn test_parse_count_and_weight() {
        let a = parse_entry("A*2").unwrap();
        assert_eq!((a.count, a.weight), (2, 1.0));

        let b = parse_entry("B/5*3").unwrap();
        assert_eq!((b.count, b.weight), (3, 5.0));

        let c = parse_entry("C*4/2.5").unwrap();
        assert_eq!((c.count, c.weight), (4, 2.5));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(parse_entry("").is_none());
        assert!(parse_entry("*3").is_none());
        assert!(parse_entry("A*x").is_none());
        assert!(parse_entry("A*0").is_none());
        assert!(parse_entry("A/-1").is_none());
        assert!(parse_entry("A*2*3").is_none());
    }

    #[test]
    fn test_parse_caps_count() {
        assert_eq!(parse_entry("A*1000").unwrap().count, MAX_COUNT);
        assert!(parse_entry("A*1001").is_none());
        assert!(parse_entry("A*18446744073709551615").is_none());
        assert!(parse_entry("A*99999999999999999999999").is_none());

        let entries = parse_entries(&["A*18446744073709551615", "B"]);
        assert_eq!(entries.len(), 1);
        assert_eq!(total_count(&entries), 1);
    }

    #[test]
    fn test_total_count_saturates() {
        let huge = ContestantEntry {
            name: "A".to_string(),
            weight: 1.0,
            count: usize::MAX,
        };
        assert_eq!(total_count(&[huge.clone(), huge]), usize::MAX);
    }

    #[test]
    fn test_normalize_distinct_weights() {
        let mut entries = parse_entries(&["A/1", "B/3", "C/5"]);
        normalize_weights(&mut entries);

        assert!((entries[0].weight - 0.1).abs() < 1e-6);
        assert!((entries[1].weight - 0.55).abs() < 1e-6);
        assert!((entries[2].weight - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_normalize_equal_weights() {
        let mut entries = parse_entries(&["A*2", "B"]);
        normalize_weights(&mut entries);

        assert!(entries.iter().all(|e| (e.weight - MIN_WEIGHT).abs() < f32::EPSILON));
        assert_eq!(total_count(&entries), 3);
    }
}
