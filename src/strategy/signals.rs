use crate::error::{BotError, Result};
use crate::models::Signal;
use serde::{Deserialize, Serialize};

/// Configuration for signal generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalConfig {
    pub rsi_period: usize,
    pub rsi_oversold: f64,
    pub rsi_overbought: f64,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            rsi_period: 14,
            rsi_oversold: 30.0,
            rsi_overbought: 70.0,
        }
    }
}

impl SignalConfig {
    /// Check the threshold contract
    ///
    /// Both thresholds must lie in [0, 100] with `rsi_oversold` strictly
    /// below `rsi_overbought`, and the period must be at least 1.
    pub fn validate(&self) -> Result<()> {
        if self.rsi_period == 0 {
            return Err(BotError::InvalidConfiguration(
                "rsi_period must be at least 1".to_string(),
            ));
        }

        for (name, value) in [
            ("rsi_oversold", self.rsi_oversold),
            ("rsi_overbought", self.rsi_overbought),
        ] {
            if !(0.0..=100.0).contains(&value) {
                return Err(BotError::InvalidConfiguration(format!(
                    "{} must be within [0, 100], got {}",
                    name, value
                )));
            }
        }

        if self.rsi_oversold >= self.rsi_overbought {
            return Err(BotError::InvalidConfiguration(format!(
                "rsi_oversold ({}) must be below rsi_overbought ({})",
                self.rsi_oversold, self.rsi_overbought
            )));
        }

        Ok(())
    }

    /// Closes needed before the RSI is defined
    pub fn min_closes(&self) -> usize {
        self.rsi_period + 1
    }
}

/// Position flag driven by the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionState {
    Flat,
    InPosition,
}

/// Single-position RSI threshold state machine
///
/// | state       | rsi               | signal    | next        |
/// |-------------|-------------------|-----------|-------------|
/// | any         | undefined         | NO_SIGNAL | unchanged   |
/// | Flat        | < oversold        | BUY       | InPosition  |
/// | Flat        | otherwise         | HOLD      | Flat        |
/// | InPosition  | > overbought      | SELL      | Flat        |
/// | InPosition  | otherwise         | HOLD      | InPosition  |
///
/// Thresholds are strict: an RSI equal to a threshold holds.
#[derive(Debug, Clone)]
pub struct SignalStateMachine {
    oversold: f64,
    overbought: f64,
    state: PositionState,
}

impl SignalStateMachine {
    /// Start flat with validated thresholds
    pub fn new(config: &SignalConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            oversold: config.rsi_oversold,
            overbought: config.rsi_overbought,
            state: PositionState::Flat,
        })
    }

    /// Evaluate one RSI reading and apply the transition
    pub fn evaluate(&mut self, rsi: Option<f64>) -> Signal {
        let Some(rsi) = rsi else {
            return Signal::NoSignal;
        };

        match self.state {
            PositionState::Flat if rsi < self.oversold => {
                self.state = PositionState::InPosition;
                Signal::Buy
            }
            PositionState::InPosition if rsi > self.overbought => {
                self.state = PositionState::Flat;
                Signal::Sell
            }
            _ => Signal::Hold,
        }
    }

    pub fn state(&self) -> PositionState {
        self.state
    }

    pub fn in_position(&self) -> bool {
        self.state == PositionState::InPosition
    }

    pub fn oversold(&self) -> f64 {
        self.oversold
    }

    pub fn overbought(&self) -> f64 {
        self.overbought
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn machine() -> SignalStateMachine {
        SignalStateMachine::new(&SignalConfig::default()).unwrap()
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(SignalConfig::default().validate().is_ok());
        assert_eq!(SignalConfig::default().min_closes(), 15);
    }

    #[test]
    fn test_inverted_thresholds_rejected() {
        let config = SignalConfig {
            rsi_period: 14,
            rsi_oversold: 70.0,
            rsi_overbought: 30.0,
        };

        let result = SignalStateMachine::new(&config);
        assert!(matches!(result, Err(BotError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_equal_thresholds_rejected() {
        // The collapsed oversold == overbought setup is refused
        let config = SignalConfig {
            rsi_period: 14,
            rsi_oversold: 30.0,
            rsi_overbought: 30.0,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_out_of_range_threshold_rejected() {
        let config = SignalConfig {
            rsi_period: 14,
            rsi_oversold: -5.0,
            rsi_overbought: 70.0,
        };
        assert!(config.validate().is_err());

        let config = SignalConfig {
            rsi_period: 14,
            rsi_oversold: 30.0,
            rsi_overbought: f64::NAN,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_period_rejected() {
        let config = SignalConfig {
            rsi_period: 0,
            ..SignalConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_undefined_rsi_is_no_signal() {
        let mut sm = machine();
        assert_eq!(sm.evaluate(None), Signal::NoSignal);
        assert_eq!(sm.state(), PositionState::Flat);
    }

    #[test]
    fn test_buy_then_sell_cycle() {
        let mut sm = machine();

        assert_eq!(sm.evaluate(Some(50.0)), Signal::Hold);
        assert_eq!(sm.evaluate(Some(25.0)), Signal::Buy);
        assert!(sm.in_position());

        // Still oversold, no second BUY
        assert_eq!(sm.evaluate(Some(20.0)), Signal::Hold);
        assert_eq!(sm.evaluate(Some(60.0)), Signal::Hold);

        assert_eq!(sm.evaluate(Some(75.0)), Signal::Sell);
        assert_eq!(sm.state(), PositionState::Flat);
        assert_eq!(sm.evaluate(Some(80.0)), Signal::Hold);
    }

    #[test]
    fn test_thresholds_are_strict() {
        let mut sm = machine();
        assert_eq!(sm.evaluate(Some(30.0)), Signal::Hold);
        assert!(!sm.in_position());

        assert_eq!(sm.evaluate(Some(29.99)), Signal::Buy);
        assert_eq!(sm.evaluate(Some(70.0)), Signal::Hold);
        assert!(sm.in_position());
    }

    #[test]
    fn test_undefined_rsi_keeps_position() {
        let mut sm = machine();
        sm.evaluate(Some(10.0));

        assert_eq!(sm.evaluate(None), Signal::NoSignal);
        assert!(sm.in_position());
    }

    #[test]
    fn test_overbought_independent_of_oversold() {
        // SELL needs RSI above 70, not merely above the oversold level
        let mut sm = machine();
        sm.evaluate(Some(10.0));

        assert_eq!(sm.evaluate(Some(45.0)), Signal::Hold);
        assert_eq!(sm.evaluate(Some(69.0)), Signal::Hold);
        assert_eq!(sm.evaluate(Some(71.0)), Signal::Sell);
    }
}
