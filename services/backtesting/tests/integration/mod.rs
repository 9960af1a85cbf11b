//! Integration tests across the full backtest pipeline
