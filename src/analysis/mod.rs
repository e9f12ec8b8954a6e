// 分析模块 - 交易信号计算

mod backtest;
mod fundamentals;

pub use backtest::{analyze_performance, PerformanceReport, Portfolio, TradeAction};
pub use fundamentals::{fundamental_signal, FinancialMetrics, Signal, SignalReport};
