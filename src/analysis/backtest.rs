use serde::{Deserialize, Serialize};

/// 回测 - 按组合约束执行交易并汇总绩效指标

const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// 交易动作
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeAction {
    Buy,
    Sell,
    Hold,
}

/// 持仓组合：现金 + 持股数量
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Portfolio {
    pub cash: f64,
    pub stock: u64,
}

impl Portfolio {
    pub fn new(initial_capital: f64) -> Self {
        Self {
            cash: initial_capital,
            stock: 0,
        }
    }

    /// 按组合约束执行交易，返回实际成交数量
    ///
    /// 买入超出现金时降级为现金可负担的最大数量，卖出数量
    /// 被限制在当前持股以内。价格必须为正，否则视为无法成交。
    pub fn execute_trade(&mut self, action: TradeAction, quantity: u64, price: f64) -> u64 {
        if price <= 0.0 {
            return 0;
        }
        match action {
            TradeAction::Buy if quantity > 0 => {
                let cost = quantity as f64 * price;
                if cost <= self.cash {
                    self.stock += quantity;
                    self.cash -= cost;
                    return quantity;
                }
                let affordable = (self.cash / price).floor() as u64;
                if affordable > 0 {
                    self.stock += affordable;
                    self.cash -= affordable as f64 * price;
                }
                affordable
            }
            TradeAction::Sell if quantity > 0 => {
                let quantity = quantity.min(self.stock);
                if quantity > 0 {
                    self.cash += quantity as f64 * price;
                    self.stock -= quantity;
                }
                quantity
            }
            _ => 0,
        }
    }

    /// 按当前价格计的组合总值
    pub fn total_value(&self, price: f64) -> f64 {
        self.cash + self.stock as f64 * price
    }
}

/// 回测绩效汇总
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PerformanceReport {
    pub total_return: f64,
    pub sharpe_ratio: f64,
    pub max_drawdown: f64,
}

/// 从组合净值序列计算绩效指标
///
/// 夏普比率按 252 个交易日年化，日收益率为相邻净值的变化率；
/// 净值点不足两个或收益率无波动时夏普记为 0。最大回撤为净值
/// 相对滚动峰值的最大跌幅（非正数）。
pub fn analyze_performance(initial_capital: f64, values: &[f64]) -> PerformanceReport {
    let final_value = values.last().copied().unwrap_or(initial_capital);
    let total_return = (final_value - initial_capital) / initial_capital;

    let daily_returns: Vec<f64> = values.windows(2).map(|w| w[1] / w[0] - 1.0).collect();
    let sharpe_ratio = if daily_returns.len() > 1 {
        let mean = daily_returns.iter().sum::<f64>() / daily_returns.len() as f64;
        let variance = daily_returns
            .iter()
            .map(|r| (r - mean).powi(2))
            .sum::<f64>()
            / (daily_returns.len() - 1) as f64;
        let std = variance.sqrt();
        if std > 0.0 {
            mean / std * TRADING_DAYS_PER_YEAR.sqrt()
        } else {
            0.0
        }
    } else {
        0.0
    };

    let mut rolling_max = f64::MIN;
    let mut max_drawdown: f64 = 0.0;
    for value in values {
        rolling_max = rolling_max.max(*value);
        max_drawdown = max_drawdown.min(value / rolling_max - 1.0);
    }

    PerformanceReport {
        total_return,
        sharpe_ratio,
        max_drawdown,
    }
}
