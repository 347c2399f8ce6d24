pub const OVERBOUGHT_RSI: f64 = 70.0;
pub const OVERSOLD_RSI: f64 = 30.0;

// Advisory label for a tracked asset, from price against its moving average and RSI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendSignal {
    StrongBuy,
    Uptrend,
    SellWarning,
    Wait,
}

impl TrendSignal {
    // Branch order matters: p == ma falls through to Wait
    pub fn classify(price: f64, moving_average: f64, rsi: f64) -> Self {
        if price > moving_average && rsi < 45.0 {
            TrendSignal::StrongBuy
        } else if price > moving_average {
            TrendSignal::Uptrend
        } else if price < moving_average && rsi > 55.0 {
            TrendSignal::SellWarning
        } else {
            TrendSignal::Wait
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            TrendSignal::StrongBuy => "price above average with room to run",
            TrendSignal::Uptrend => "price above average",
            TrendSignal::SellWarning => "price below average while momentum is still high",
            TrendSignal::Wait => "no clear edge, wait and see",
        }
    }
}

impl std::fmt::Display for TrendSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let label = match self {
            TrendSignal::StrongBuy => "Strong Buy",
            TrendSignal::Uptrend => "Uptrend",
            TrendSignal::SellWarning => "Sell Warning",
            TrendSignal::Wait => "Wait",
        };
        write!(f, "{}", label)
    }
}

// Ranked-table label, from the 24 hour percent change alone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarketSignal {
    Momentum,
    Accumulate,
    Correction,
    PanicSell,
}

impl MarketSignal {
    pub fn classify(change_24h: f64) -> Self {
        if change_24h >= 3.0 {
            MarketSignal::Momentum
        } else if change_24h >= 0.0 {
            MarketSignal::Accumulate
        } else if change_24h < -3.0 {
            MarketSignal::PanicSell
        } else {
            MarketSignal::Correction
        }
    }
}

impl std::fmt::Display for MarketSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let label = match self {
            MarketSignal::Momentum => "Momentum",
            MarketSignal::Accumulate => "Accumulate",
            MarketSignal::Correction => "Correction",
            MarketSignal::PanicSell => "Panic Sell",
        };
        write!(f, "{}", label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RsiZone {
    Overbought,
    Oversold,
    Neutral,
}

impl RsiZone {
    pub fn classify(rsi: f64) -> Self {
        if rsi > OVERBOUGHT_RSI {
            RsiZone::Overbought
        } else if rsi < OVERSOLD_RSI {
            RsiZone::Oversold
        } else {
            RsiZone::Neutral
        }
    }
}

impl std::fmt::Display for RsiZone {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let label = match self {
            RsiZone::Overbought => "Overbought",
            RsiZone::Oversold => "Oversold",
            RsiZone::Neutral => "Neutral",
        };
        write!(f, "{}", label)
    }
}
