//! ISO-8601 duration parsing for the `contentDetails.duration` field.

/// Parse a duration like `PT1H23M45S` (or `P1DT2H`) into whole seconds.
///
/// Returns None for anything that doesn't follow the day/hour/minute/second
/// subset the videos endpoint emits.
pub fn parse_iso8601_duration(value: &str) -> Option<u64> {
    let rest = value.strip_prefix('P')?;
    let (date_part, time_part) = match rest.split_once('T') {
        Some((d, t)) => (d, t),
        None => (rest, ""),
    };

    let mut seconds = 0u64;

    for (part, units) in [(date_part, &[('D', 86_400)][..]), (
        time_part,
        &[('H', 3_600), ('M', 60), ('S', 1)][..],
    )] {
        let mut digits = String::new();
        for ch in part.chars() {
            if ch.is_ascii_digit() {
                digits.push(ch);
                continue;
            }
            let factor = units.iter().find(|(u, _)| *u == ch)?.1;
            let n: u64 = digits.parse().ok()?;
            seconds += n * factor;
            digits.clear();
        }
        if !digits.is_empty() {
            return None;
        }
    }

    Some(seconds)
}

#[cfg(test)]
mod tests {
    use super::parse_iso8601_duration;

    #[test]
    fn parses_common_forms() {
        assert_eq!(parse_iso8601_duration("PT30M"), Some(1800));
        assert_eq!(parse_iso8601_duration("PT1H23M45S"), Some(5025));
        assert_eq!(parse_iso8601_duration("PT45S"), Some(45));
        assert_eq!(parse_iso8601_duration("P1DT2H"), Some(93600));
        assert_eq!(parse_iso8601_duration("PT0S"), Some(0));
    }

    #[test]
    fn rejects_malformed_values() {
        assert_eq!(parse_iso8601_duration(""), None);
        assert_eq!(parse_iso8601_duration("30M"), None);
        assert_eq!(parse_iso8601_duration("PT30"), None);
        assert_eq!(parse_iso8601_duration("PT30X"), None);
    }
}
