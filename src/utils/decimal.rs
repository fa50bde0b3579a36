use std::str::FromStr;

use bigdecimal::BigDecimal;

/// Money arrives as JSON numbers; keep it to cents so `12.3` is stored as `12.30`
/// rather than the nearest binary fraction.
pub fn money_from_f64(value: f64) -> Option<BigDecimal> {
    if !value.is_finite() {
        return None;
    }
    BigDecimal::from_str(&format!("{:.2}", value)).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_to_cents() {
        assert_eq!(
            money_from_f64(12.3),
            Some(BigDecimal::from_str("12.30").unwrap())
        );
        assert_eq!(
            money_from_f64(0.1 + 0.2),
            Some(BigDecimal::from_str("0.30").unwrap())
        );
        assert_eq!(money_from_f64(f64::NAN), None);
    }
}
