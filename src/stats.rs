//! Phrase-level count statistics: `"<target marginal> <source marginal> <joint count>"`.

use std::str::FromStr;

use crate::error::{CountField, StatsError};

/// How non-positive counts and extra tokens are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CountPolicy {
    /// Every count must be finite and strictly positive; exactly three tokens.
    #[default]
    Strict,
    /// Counts are kept as parsed and anything after the third token is
    /// ignored. Non-positive counts are logged.
    Permissive,
}

/// Occurrence counts of one phrase pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhraseStatistics {
    target_marginal: f32,
    source_marginal: f32,
    joint_count: f32,
}

impl PhraseStatistics {
    /// Parses with [`CountPolicy::Strict`].
    pub fn parse(raw: &str) -> Result<Self, StatsError> {
        Self::parse_with(raw, CountPolicy::Strict)
    }

    pub fn parse_with(raw: &str, policy: CountPolicy) -> Result<Self, StatsError> {
        let mut tokens = raw.split_whitespace();
        let target_marginal = next_count(&mut tokens, CountField::TargetMarginal, policy)?;
        let source_marginal = next_count(&mut tokens, CountField::SourceMarginal, policy)?;
        let joint_count = next_count(&mut tokens, CountField::JointCount, policy)?;

        if policy == CountPolicy::Strict {
            let rest: Vec<&str> = tokens.collect();
            if !rest.is_empty() {
                return Err(StatsError::TrailingInput(rest.join(" ")));
            }
        }

        Ok(Self {
            target_marginal,
            source_marginal,
            joint_count,
        })
    }

    #[inline]
    pub fn target_marginal(&self) -> f32 {
        self.target_marginal
    }

    #[inline]
    pub fn source_marginal(&self) -> f32 {
        self.source_marginal
    }

    #[inline]
    pub fn joint_count(&self) -> f32 {
        self.joint_count
    }

    /// Relative frequency p(target | source).
    pub fn target_given_source(&self) -> f32 {
        self.joint_count / self.source_marginal
    }

    /// Relative frequency p(source | target).
    pub fn source_given_target(&self) -> f32 {
        self.joint_count / self.target_marginal
    }
}

impl FromStr for PhraseStatistics {
    type Err = StatsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn next_count<'a, I>(tokens: &mut I, field: CountField, policy: CountPolicy) -> Result<f32, StatsError>
where
    I: Iterator<Item = &'a str>,
{
    let token = tokens.next().ok_or(StatsError::Missing { field })?;
    let value: f32 = token.parse().map_err(|_| StatsError::NotNumeric {
        field,
        token: token.to_string(),
    })?;

    // NaN fails the comparison too.
    if !(value > 0.0 && value.is_finite()) {
        match policy {
            CountPolicy::Strict => return Err(StatsError::NonPositive { field, value }),
            CountPolicy::Permissive => {
                tracing::warn!(%field, value, "accepting non-positive phrase count");
            }
        }
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_three_counts_in_order() {
        let s = PhraseStatistics::parse("12.0 8.0 4.0").unwrap();
        assert_eq!(s.target_marginal(), 12.0);
        assert_eq!(s.source_marginal(), 8.0);
        assert_eq!(s.joint_count(), 4.0);
        assert_eq!(s.target_given_source(), 0.5);
        assert!((s.source_given_target() - 1.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn accepts_integers_and_extra_whitespace() {
        let s: PhraseStatistics = "  3\t2   1 \n".parse().unwrap();
        assert_eq!((s.target_marginal(), s.source_marginal(), s.joint_count()), (3.0, 2.0, 1.0));
    }

    #[test]
    fn missing_third_token() {
        assert_eq!(
            PhraseStatistics::parse("5.0 3.0"),
            Err(StatsError::Missing {
                field: CountField::JointCount
            })
        );
        assert_eq!(
            PhraseStatistics::parse(""),
            Err(StatsError::Missing {
                field: CountField::TargetMarginal
            })
        );
    }

    #[test]
    fn non_numeric_token() {
        assert_eq!(
            PhraseStatistics::parse("abc 3.0 4.0"),
            Err(StatsError::NotNumeric {
                field: CountField::TargetMarginal,
                token: "abc".to_string()
            })
        );
        assert!(matches!(
            PhraseStatistics::parse("1 2 x"),
            Err(StatsError::NotNumeric {
                field: CountField::JointCount,
                ..
            })
        ));
    }

    #[test]
    fn strict_rejects_non_positive_and_non_finite() {
        assert!(matches!(
            PhraseStatistics::parse("1 0 1"),
            Err(StatsError::NonPositive {
                field: CountField::SourceMarginal,
                ..
            })
        ));
        assert!(matches!(
            PhraseStatistics::parse("-2 1 1"),
            Err(StatsError::NonPositive { .. })
        ));
        assert!(matches!(
            PhraseStatistics::parse("1 1 NaN"),
            Err(StatsError::NonPositive { .. })
        ));
        assert!(matches!(
            PhraseStatistics::parse("inf 1 1"),
            Err(StatsError::NonPositive { .. })
        ));
    }

    #[test]
    fn strict_rejects_trailing_tokens() {
        assert_eq!(
            PhraseStatistics::parse("1 2 3 4 5"),
            Err(StatsError::TrailingInput("4 5".to_string()))
        );
    }

    #[test]
    fn permissive_keeps_values_and_ignores_trailing() {
        let s = PhraseStatistics::parse_with("0 -1 2 extra", CountPolicy::Permissive).unwrap();
        assert_eq!(s.target_marginal(), 0.0);
        assert_eq!(s.source_marginal(), -1.0);
        assert_eq!(s.joint_count(), 2.0);
    }

    #[test]
    fn permissive_still_rejects_malformed_tokens() {
        assert!(PhraseStatistics::parse_with("1 2", CountPolicy::Permissive).is_err());
        assert!(PhraseStatistics::parse_with("1 two 3", CountPolicy::Permissive).is_err());
    }
}
