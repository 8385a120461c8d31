//! The rule-engine collaborator.
//!
//! Step text never talks to a rule engine directly. Everything goes through
//! [`RuleSession`], created per scenario by a [`SessionFactory`].

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use super::{ScenarioMeta, SessionDirectiveBlock};
use crate::counts::ActivationCountMap;
use crate::error::{Result, StepError};
use crate::eval::{TypeHandle, Value};

/// A live rule session with the operations and assertions steps need.
pub trait RuleSession {
    /// The single fact of the given type.
    fn query_one(&self, ty: &TypeHandle) -> Result<Value>;

    /// All facts of the given type.
    fn query_all(&self, ty: &TypeHandle) -> Result<Vec<Value>>;

    /// Set a session global.
    fn set_global(&mut self, name: &str, value: Value) -> Result<()>;

    /// Release the session.
    fn destroy(&mut self);

    /// Insert facts without firing rules.
    fn insert(&mut self, facts: Vec<Value>) -> Result<()>;

    /// Fire every activated rule.
    fn fire_all_rules(&mut self) -> Result<()>;

    /// Advance the session clock.
    fn advance_time(&mut self, amount: Duration) -> Result<()>;

    /// Advance the clock until each of the rules has fired.
    fn await_for(&mut self, rules: &[String]) -> Result<()>;

    /// Fire everything that is scheduled, regardless of the clock.
    fn trigger_all_scheduled_activations(&mut self) -> Result<()>;

    /// Log the facts currently in the session.
    fn print_facts(&self);

    /// Log rule performance statistics.
    fn print_performance_statistic(&self);

    /// Assert that each fact is in the session.
    fn assert_exist(&self, facts: &[Value]) -> Result<()>;

    /// Assert the number of facts in the session.
    fn assert_facts_count(&self, count: usize) -> Result<()>;

    /// Assert that each fact has been retracted.
    fn assert_retracted(&self, facts: &[Value]) -> Result<()>;

    /// Assert that every fact has been retracted.
    fn assert_all_retracted(&self) -> Result<()>;

    /// Assert exactly these rules were activated since the last check.
    ///
    /// An empty list asserts that no rule was activated.
    fn assert_activated(&mut self, rules: &[String]) -> Result<()>;

    /// Assert activation counts since the last check.
    fn assert_activated_counts(&mut self, counts: &ActivationCountMap) -> Result<()>;

    /// Assert exactly these rules were activated since the session started.
    fn assert_all_activations(&self, rules: &[String]) -> Result<()>;

    /// Assert activation counts since the session started.
    fn assert_all_activation_counts(&self, counts: &ActivationCountMap) -> Result<()>;

    /// Assert nothing is waiting on the clock.
    fn assert_no_scheduled_activations(&self) -> Result<()>;
}

/// Creates rule sessions.
pub trait SessionFactory {
    /// Build a session from a definition and scenario options.
    fn create(
        &mut self,
        definition: &SessionDirectiveBlock,
        scenario: &ScenarioMeta,
    ) -> Result<Box<dyn RuleSession>>;
}

impl<F> SessionFactory for F
where
    F: FnMut(&SessionDirectiveBlock, &ScenarioMeta) -> Result<Box<dyn RuleSession>>,
{
    fn create(
        &mut self,
        definition: &SessionDirectiveBlock,
        scenario: &ScenarioMeta,
    ) -> Result<Box<dyn RuleSession>> {
        self(definition, scenario)
    }
}

/// Units accepted by `advance time for <amount> <unit>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeUnit {
    /// Nanoseconds.
    Nanoseconds,
    /// Microseconds.
    Microseconds,
    /// Milliseconds.
    Milliseconds,
    /// Seconds.
    Seconds,
    /// Minutes.
    Minutes,
    /// Hours.
    Hours,
    /// Days.
    Days,
}

impl TimeUnit {
    /// The span of `amount` units.
    #[must_use]
    pub fn duration(self, amount: u64) -> Duration {
        match self {
            Self::Nanoseconds => Duration::from_nanos(amount),
            Self::Microseconds => Duration::from_micros(amount),
            Self::Milliseconds => Duration::from_millis(amount),
            Self::Seconds => Duration::from_secs(amount),
            Self::Minutes => Duration::from_secs(amount.saturating_mul(60)),
            Self::Hours => Duration::from_secs(amount.saturating_mul(3_600)),
            Self::Days => Duration::from_secs(amount.saturating_mul(86_400)),
        }
    }
}

impl FromStr for TimeUnit {
    type Err = StepError;

    fn from_str(s: &str) -> Result<Self> {
        let lowered = s.trim().to_lowercase();
        if lowered == "ms" {
            return Ok(Self::Milliseconds);
        }
        match lowered.strip_suffix('s').unwrap_or(&lowered) {
            "nanosecond" => Ok(Self::Nanoseconds),
            "microsecond" => Ok(Self::Microseconds),
            "millisecond" => Ok(Self::Milliseconds),
            "second" | "sec" => Ok(Self::Seconds),
            "minute" | "min" => Ok(Self::Minutes),
            "hour" => Ok(Self::Hours),
            "day" => Ok(Self::Days),
            _ => Err(StepError::malformed("unknown time unit", s)),
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Nanoseconds => "nanoseconds",
            Self::Microseconds => "microseconds",
            Self::Milliseconds => "milliseconds",
            Self::Seconds => "seconds",
            Self::Minutes => "minutes",
            Self::Hours => "hours",
            Self::Days => "days",
        };
        f.write_str(name)
    }
}

/// Parse `<amount> <unit>`, e.g. `5 minutes`.
pub fn parse_duration(text: &str) -> Result<Duration> {
    let mut parts = text.split_whitespace();
    let (Some(amount), Some(unit), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(StepError::malformed("expected '<amount> <unit>'", text));
    };
    let amount = amount
        .parse::<u64>()
        .map_err(|_| StepError::malformed("invalid time amount", text))?;
    Ok(unit.parse::<TimeUnit>()?.duration(amount))
}
