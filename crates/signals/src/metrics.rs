/// Trading days per year, used to annualise daily volatility.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Relative return between two prices: `last / first - 1`.
pub fn momentum(first: f64, last: f64) -> f64 {
    last / first - 1.0
}

/// Simple daily returns of consecutive prices. `n` prices yield `n - 1` returns.
pub fn daily_returns(prices: &[f64]) -> Vec<f64> {
    prices.windows(2).map(|w| w[1] / w[0] - 1.0).collect()
}

/// Sample standard deviation (n - 1 denominator). `None` for fewer than two values.
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    Some(variance.sqrt())
}

/// Annualised volatility of a run of daily returns.
pub fn annualised_volatility(returns: &[f64]) -> Option<f64> {
    sample_std(returns).map(|std| std * TRADING_DAYS_PER_YEAR.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn momentum_is_relative_return() {
        assert_relative_eq!(momentum(100.0, 125.0), 0.25);
        assert_relative_eq!(momentum(80.0, 60.0), -0.25);
    }

    #[test]
    fn returns_are_one_shorter_than_prices() {
        let returns = daily_returns(&[100.0, 110.0, 99.0]);
        assert_eq!(returns.len(), 2);
        assert_relative_eq!(returns[0], 0.10);
        assert_relative_eq!(returns[1], -0.10, epsilon = 1e-12);
    }

    #[test]
    fn sample_std_uses_n_minus_one() {
        // mean 5, squared deviations sum to 32, 32 / 7
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_relative_eq!(sample_std(&values).unwrap(), (32.0_f64 / 7.0).sqrt());
        assert_eq!(sample_std(&[1.0]), None);
    }

    #[test]
    fn constant_returns_have_zero_volatility() {
        assert_eq!(annualised_volatility(&[0.5, 0.5, 0.5]), Some(0.0));
    }
}
