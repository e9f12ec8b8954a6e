use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// 基本面分析 - 从财务指标推导交易信号

/// 交易信号
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Signal {
    Bullish,
    Bearish,
    Neutral,
}

/// 单只股票的财务指标
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FinancialMetrics {
    pub return_on_equity: f64,
    pub net_margin: f64,
    pub operating_margin: f64,
    pub revenue_growth: f64,
    pub earnings_growth: f64,
    pub book_value_growth: f64,
    pub current_ratio: f64,
    pub debt_to_equity: f64,
    pub free_cash_flow_per_share: f64,
    pub earnings_per_share: f64,
    pub price_to_earnings_ratio: f64,
    pub price_to_book_ratio: f64,
    pub price_to_sales_ratio: f64,
}

/// 分析结果：总体信号、置信度与各维度推理
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SignalReport {
    pub signal: Signal,
    pub confidence: f64,
    pub reasoning: Value,
}

fn aspect_signal(score: u32) -> Signal {
    if score >= 2 {
        Signal::Bullish
    } else if score == 0 {
        Signal::Bearish
    } else {
        Signal::Neutral
    }
}

/// 基本面综合信号
///
/// 四个维度独立打分：盈利能力、成长性、财务健康、估值比率。
/// 总体信号按多数票决定，置信度为多数票占比。
pub fn fundamental_signal(metrics: &FinancialMetrics) -> SignalReport {
    let mut signals = Vec::with_capacity(4);
    let mut reasoning = serde_json::Map::new();

    // 盈利能力
    let mut profitability_score = 0;
    if metrics.return_on_equity > 0.15 {
        profitability_score += 1;
    }
    if metrics.net_margin > 0.20 {
        profitability_score += 1;
    }
    if metrics.operating_margin > 0.15 {
        profitability_score += 1;
    }
    let signal = aspect_signal(profitability_score);
    signals.push(signal);
    reasoning.insert(
        "profitability_signal".to_string(),
        json!({
            "signal": signal,
            "details": format!(
                "ROE: {:.2}%, Net Margin: {:.2}%, Op Margin: {:.2}%",
                metrics.return_on_equity * 100.0,
                metrics.net_margin * 100.0,
                metrics.operating_margin * 100.0
            ),
        }),
    );

    // 成长性
    let mut growth_score = 0;
    if metrics.revenue_growth > 0.10 {
        growth_score += 1;
    }
    if metrics.earnings_growth > 0.10 {
        growth_score += 1;
    }
    if metrics.book_value_growth > 0.10 {
        growth_score += 1;
    }
    let signal = aspect_signal(growth_score);
    signals.push(signal);
    reasoning.insert(
        "growth_signal".to_string(),
        json!({
            "signal": signal,
            "details": format!(
                "Revenue Growth: {:.2}%, Earnings Growth: {:.2}%",
                metrics.revenue_growth * 100.0,
                metrics.earnings_growth * 100.0
            ),
        }),
    );

    // 财务健康
    let mut health_score = 0;
    if metrics.current_ratio > 1.5 {
        health_score += 1;
    }
    if metrics.debt_to_equity < 0.5 {
        health_score += 1;
    }
    if metrics.free_cash_flow_per_share > metrics.earnings_per_share * 0.8 {
        health_score += 1;
    }
    let signal = aspect_signal(health_score);
    signals.push(signal);
    reasoning.insert(
        "financial_health_signal".to_string(),
        json!({
            "signal": signal,
            "details": format!(
                "Current Ratio: {:.2}, D/E: {:.2}",
                metrics.current_ratio, metrics.debt_to_equity
            ),
        }),
    );

    // 估值比率
    let mut price_ratio_score = 0;
    if metrics.price_to_earnings_ratio < 25.0 {
        price_ratio_score += 1;
    }
    if metrics.price_to_book_ratio < 3.0 {
        price_ratio_score += 1;
    }
    if metrics.price_to_sales_ratio < 5.0 {
        price_ratio_score += 1;
    }
    let signal = aspect_signal(price_ratio_score);
    signals.push(signal);
    reasoning.insert(
        "price_ratios_signal".to_string(),
        json!({
            "signal": signal,
            "details": format!(
                "P/E: {:.2}, P/B: {:.2}, P/S: {:.2}",
                metrics.price_to_earnings_ratio,
                metrics.price_to_book_ratio,
                metrics.price_to_sales_ratio
            ),
        }),
    );

    let bullish = signals.iter().filter(|s| **s == Signal::Bullish).count();
    let bearish = signals.iter().filter(|s| **s == Signal::Bearish).count();

    let overall = if bullish > bearish {
        Signal::Bullish
    } else if bearish > bullish {
        Signal::Bearish
    } else {
        Signal::Neutral
    };
    let confidence = bullish.max(bearish) as f64 / signals.len() as f64;

    SignalReport {
        signal: overall,
        confidence,
        reasoning: Value::Object(reasoning),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strong_metrics() -> FinancialMetrics {
        FinancialMetrics {
            return_on_equity: 0.25,
            net_margin: 0.30,
            operating_margin: 0.28,
            revenue_growth: 0.20,
            earnings_growth: 0.18,
            book_value_growth: 0.15,
            current_ratio: 2.5,
            debt_to_equity: 0.2,
            free_cash_flow_per_share: 6.0,
            earnings_per_share: 5.0,
            price_to_earnings_ratio: 18.0,
            price_to_book_ratio: 2.0,
            price_to_sales_ratio: 3.0,
        }
    }

    fn weak_metrics() -> FinancialMetrics {
        FinancialMetrics {
            return_on_equity: 0.02,
            net_margin: 0.01,
            operating_margin: 0.02,
            revenue_growth: -0.05,
            earnings_growth: -0.10,
            book_value_growth: 0.0,
            current_ratio: 0.8,
            debt_to_equity: 2.5,
            free_cash_flow_per_share: 0.5,
            earnings_per_share: 5.0,
            price_to_earnings_ratio: 60.0,
            price_to_book_ratio: 8.0,
            price_to_sales_ratio: 12.0,
        }
    }

    #[test]
    fn strong_metrics_are_bullish() {
        let report = fundamental_signal(&strong_metrics());
        assert_eq!(report.signal, Signal::Bullish);
        assert!((report.confidence - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn weak_metrics_are_bearish() {
        let report = fundamental_signal(&weak_metrics());
        assert_eq!(report.signal, Signal::Bearish);
        assert!(report.confidence >= 0.75);
    }

    #[test]
    fn mixed_metrics_are_neutral() {
        let mut metrics = strong_metrics();
        metrics.return_on_equity = 0.0;
        metrics.net_margin = 0.0;
        metrics.operating_margin = 0.0;
        metrics.revenue_growth = 0.0;
        metrics.earnings_growth = 0.0;
        metrics.book_value_growth = 0.0;
        let report = fundamental_signal(&metrics);
        assert_eq!(report.signal, Signal::Neutral);
    }

    #[test]
    fn reasoning_covers_all_aspects() {
        let report = fundamental_signal(&strong_metrics());
        let reasoning = report.reasoning.as_object().unwrap();
        for key in [
            "profitability_signal",
            "growth_signal",
            "financial_health_signal",
            "price_ratios_signal",
        ] {
            assert!(reasoning.contains_key(key), "missing {key}");
        }
    }
}
