use crate::timecode::SECONDS_PER_HOUR;

pub fn cost(seconds: u64, rate: f64) -> f64 {
    if !rate.is_finite() || rate <= 0.0 {
        return 0.0;
    }
    hours_from_seconds(seconds) * rate
}

pub fn hours_from_seconds(seconds: u64) -> f64 {
    seconds as f64 / SECONDS_PER_HOUR as f64
}

pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn format_currency(value: f64) -> String {
    format!("${:.2}", round_cents(value))
}

pub fn parse_rate(input: &str) -> f64 {
    let trimmed = input.trim().trim_start_matches('$');
    match trimmed.parse::<f64>() {
        Ok(rate) if rate.is_finite() && rate > 0.0 => rate,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cost_scales_with_hours() {
        assert_eq!(cost(3600, 50.0), 50.0);
        assert_eq!(cost(1800, 50.0), 25.0);
        assert_eq!(cost(5400, 40.0), 60.0);
    }

    #[test]
    fn cost_is_zero_without_positive_rate() {
        assert_eq!(cost(100, 0.0), 0.0);
        assert_eq!(cost(100, -5.0), 0.0);
        assert_eq!(cost(100, f64::NAN), 0.0);
        assert_eq!(cost(100, f64::INFINITY), 0.0);
    }

    #[test]
    fn cost_is_not_rounded() {
        let value = cost(100, 50.0);
        assert!((value - 1.388_888_888).abs() < 1e-6);
        assert_eq!(format_currency(value), "$1.39");
    }

    #[test]
    fn format_currency_uses_two_decimals() {
        assert_eq!(format_currency(0.0), "$0.00");
        assert_eq!(format_currency(40.0), "$40.00");
        assert_eq!(format_currency(12.345_6), "$12.35");
    }

    #[test]
    fn parse_rate_is_lenient() {
        assert_eq!(parse_rate("45.50"), 45.5);
        assert_eq!(parse_rate(" $60 "), 60.0);
        assert_eq!(parse_rate(""), 0.0);
        assert_eq!(parse_rate("abc"), 0.0);
        assert_eq!(parse_rate("-3"), 0.0);
    }
}
