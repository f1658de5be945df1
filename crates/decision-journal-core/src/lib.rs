use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, UtcOffset};
use ulid::Ulid;

#[derive(Debug, Clone, thiserror::Error, Eq, PartialEq)]
pub enum InsightsError {
    #[error("validation error: {0}")]
    Validation(String),
}

/// Minimum eligible decisions before a correlation verdict is attempted.
pub const MIN_CORRELATION_SAMPLE: usize = 4;

/// Minimum reviewed decisions for an emotional state to be ranked.
pub const MIN_EMOTION_SAMPLE: usize = 2;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[serde(transparent)]
pub struct UserId(pub Ulid);

impl Display for UserId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[serde(transparent)]
pub struct DecisionId(pub Ulid);

impl Display for DecisionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Better,
    Same,
    Worse,
    Unknown,
}

impl Outcome {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Better => "better",
            Self::Same => "same",
            Self::Worse => "worse",
            Self::Unknown => "unknown",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "better" => Some(Self::Better),
            "same" => Some(Self::Same),
            "worse" => Some(Self::Worse),
            "unknown" => Some(Self::Unknown),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DecisionStatus {
    Draft,
    Deliberating,
    Decided,
    Reviewed,
}

impl DecisionStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Deliberating => "deliberating",
            Self::Decided => "decided",
            Self::Reviewed => "reviewed",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "draft" => Some(Self::Draft),
            "deliberating" => Some(Self::Deliberating),
            "decided" => Some(Self::Decided),
            "reviewed" => Some(Self::Reviewed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TierLabel {
    Low,
    Medium,
    High,
}

/// Tier boundary policy for the 1..=5 confidence scale. Kept as a single
/// table so the thresholds can change without touching aggregation.
const TIER_TABLE: [(u8, TierLabel); 5] = [
    (1, TierLabel::Low),
    (2, TierLabel::Low),
    (3, TierLabel::Medium),
    (4, TierLabel::High),
    (5, TierLabel::High),
];

impl TierLabel {
    /// Fixed confidence-axis order: low, medium, high.
    pub const ALL: [Self; 3] = [Self::Low, Self::Medium, Self::High];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }

    /// Maps a confidence level to its tier. No clamping: out-of-range
    /// input is a caller bug and must surface, not skew a tier.
    ///
    /// # Errors
    /// Returns [`InsightsError::Validation`] when `level` is outside [1, 5].
    pub fn for_confidence(level: u8) -> Result<Self, InsightsError> {
        TIER_TABLE
            .iter()
            .find(|(value, _)| *value == level)
            .map(|(_, label)| *label)
            .ok_or_else(|| {
                InsightsError::Validation(format!(
                    "confidence_level MUST be in [1, 5], got {level}"
                ))
            })
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum CorrelationDirection {
    Positive,
    Negative,
    None,
    InsufficientData,
}

impl CorrelationDirection {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Negative => "negative",
            Self::None => "none",
            Self::InsufficientData => "insufficient_data",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Decision {
    pub decision_seq: i64,
    pub decision_id: DecisionId,
    pub user_id: UserId,
    pub title: String,
    pub confidence_level: u8,
    pub outcome: Outcome,
    pub status: DecisionStatus,
    pub emotional_state: Option<String>,
    pub recorded_at: OffsetDateTime,
}

impl Decision {
    #[must_use]
    pub fn is_eligible(&self) -> bool {
        self.status == DecisionStatus::Reviewed
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DecisionInput {
    pub decision_id: Option<Ulid>,
    pub user_id: UserId,
    pub title: String,
    pub confidence_level: u8,
    pub outcome: Outcome,
    pub status: DecisionStatus,
    pub emotional_state: Option<String>,
    pub recorded_at: OffsetDateTime,
}

impl DecisionInput {
    /// Validates a decision payload before it is written to a store.
    ///
    /// # Errors
    /// Returns [`InsightsError::Validation`] when required fields are missing
    /// or violate schema constraints.
    pub fn validate(&self) -> Result<(), InsightsError> {
        if self.title.trim().is_empty() {
            return Err(InsightsError::Validation(
                "title MUST be provided for every decision".to_string(),
            ));
        }

        let _ = TierLabel::for_confidence(self.confidence_level)?;

        if self.recorded_at.offset() != UtcOffset::UTC {
            return Err(InsightsError::Validation(
                "recorded_at MUST be UTC (offset Z)".to_string(),
            ));
        }

        Ok(())
    }
}

/// Eligible decisions partitioned by confidence tier. Order of the
/// underlying input is preserved within each bucket.
#[derive(Debug, Default)]
pub struct TierBuckets<'a> {
    pub low: Vec<&'a Decision>,
    pub medium: Vec<&'a Decision>,
    pub high: Vec<&'a Decision>,
}

impl<'a> TierBuckets<'a> {
    #[must_use]
    pub fn bucket(&self, label: TierLabel) -> &[&'a Decision] {
        match label {
            TierLabel::Low => &self.low,
            TierLabel::Medium => &self.medium,
            TierLabel::High => &self.high,
        }
    }

    fn bucket_mut(&mut self, label: TierLabel) -> &mut Vec<&'a Decision> {
        match label {
            TierLabel::Low => &mut self.low,
            TierLabel::Medium => &mut self.medium,
            TierLabel::High => &mut self.high,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConfidenceTier {
    pub label: TierLabel,
    pub total: usize,
    pub successes: usize,
    /// `None` when the tier is empty. An empty tier has no rate at all;
    /// treating it as 0.0 would corrupt the trend comparison.
    pub success_rate: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CorrelationReport {
    pub tiers: Vec<ConfidenceTier>,
    pub direction: CorrelationDirection,
    pub sample_size: usize,
}

/// Partitions a user's decisions into the three fixed confidence tiers.
///
/// Unreviewed decisions are excluded entirely before any further
/// processing.
///
/// # Errors
/// Returns [`InsightsError::Validation`] when an eligible decision carries a
/// `confidence_level` outside [1, 5].
pub fn bucket_decisions(decisions: &[Decision]) -> Result<TierBuckets<'_>, InsightsError> {
    let mut buckets = TierBuckets::default();

    for decision in decisions {
        if !decision.is_eligible() {
            continue;
        }

        let label = TierLabel::for_confidence(decision.confidence_level)?;
        buckets.bucket_mut(label).push(decision);
    }

    Ok(buckets)
}

/// Reduces one tier bucket to (total, successes, success rate).
///
/// Only `better` counts as success; `same`, `unknown`, and `worse` all
/// count toward the denominator.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn aggregate_tier(label: TierLabel, bucket: &[&Decision]) -> ConfidenceTier {
    let total = bucket.len();
    let successes = bucket
        .iter()
        .filter(|decision| decision.outcome == Outcome::Better)
        .count();

    let success_rate = if total == 0 {
        None
    } else {
        Some(successes as f64 / total as f64)
    };

    ConfidenceTier {
        label,
        total,
        successes,
        success_rate,
    }
}

/// Derives the correlation verdict from the ordered tier aggregates.
///
/// The comparison is endpoint-based over the tiers that have data: with
/// fewer than two defined rates, or fewer than [`MIN_CORRELATION_SAMPLE`]
/// eligible decisions overall, no verdict is claimed.
#[must_use]
pub fn classify_direction(tiers: &[ConfidenceTier]) -> CorrelationDirection {
    let sample_size: usize = tiers.iter().map(|tier| tier.total).sum();

    let defined: Vec<f64> = tiers.iter().filter_map(|tier| tier.success_rate).collect();

    if defined.len() < 2 || sample_size < MIN_CORRELATION_SAMPLE {
        return CorrelationDirection::InsufficientData;
    }

    let first = defined[0];
    let last = defined[defined.len() - 1];

    match last.partial_cmp(&first) {
        Some(std::cmp::Ordering::Greater) => CorrelationDirection::Positive,
        Some(std::cmp::Ordering::Less) => CorrelationDirection::Negative,
        _ => CorrelationDirection::None,
    }
}

/// Computes the full confidence/outcome correlation report for one
/// user's decision snapshot.
///
/// The returned tier sequence always contains all three tiers in
/// low, medium, high order, including empty ones, so callers can render
/// "no data" per tier instead of omitting it.
///
/// # Errors
/// Returns [`InsightsError::Validation`] when an eligible decision carries a
/// `confidence_level` outside [1, 5].
pub fn correlation_report(decisions: &[Decision]) -> Result<CorrelationReport, InsightsError> {
    let buckets = bucket_decisions(decisions)?;

    let tiers: Vec<ConfidenceTier> = TierLabel::ALL
        .iter()
        .map(|label| aggregate_tier(*label, buckets.bucket(*label)))
        .collect();

    let sample_size = tiers.iter().map(|tier| tier.total).sum();
    let direction = classify_direction(&tiers);

    Ok(CorrelationReport {
        tiers,
        direction,
        sample_size,
    })
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct InsightsSummary {
    pub total_decisions: usize,
    pub reviewed_decisions: usize,
    pub better: usize,
    pub worse: usize,
    pub same: usize,
    pub unknown: usize,
}

/// Overall outcome totals across a user's snapshot. Counts every
/// decision; outcome counts cover reviewed decisions only.
#[must_use]
pub fn summarize(decisions: &[Decision]) -> InsightsSummary {
    let mut summary = InsightsSummary {
        total_decisions: decisions.len(),
        reviewed_decisions: 0,
        better: 0,
        worse: 0,
        same: 0,
        unknown: 0,
    };

    for decision in decisions {
        if !decision.is_eligible() {
            continue;
        }

        summary.reviewed_decisions += 1;
        match decision.outcome {
            Outcome::Better => summary.better += 1,
            Outcome::Worse => summary.worse += 1,
            Outcome::Same => summary.same += 1,
            Outcome::Unknown => summary.unknown += 1,
        }
    }

    summary
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmotionalPattern {
    pub emotional_state: String,
    pub better: usize,
    pub worse: usize,
    pub same: usize,
    pub unknown: usize,
    pub total: usize,
    pub success_rate: Option<f64>,
}

/// Groups reviewed decisions by emotional state and computes per-state
/// outcome counts and success rates. Decisions without a recorded state
/// are grouped under "unknown". Output is sorted by state name for
/// deterministic rendering.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn emotional_patterns(decisions: &[Decision]) -> Vec<EmotionalPattern> {
    let mut grouped: BTreeMap<&str, EmotionalPattern> = BTreeMap::new();

    for decision in decisions {
        if !decision.is_eligible() {
            continue;
        }

        let state = decision.emotional_state.as_deref().unwrap_or("unknown");
        let entry = grouped
            .entry(state)
            .or_insert_with(|| EmotionalPattern {
                emotional_state: state.to_string(),
                better: 0,
                worse: 0,
                same: 0,
                unknown: 0,
                total: 0,
                success_rate: None,
            });

        entry.total += 1;
        match decision.outcome {
            Outcome::Better => entry.better += 1,
            Outcome::Worse => entry.worse += 1,
            Outcome::Same => entry.same += 1,
            Outcome::Unknown => entry.unknown += 1,
        }
    }

    let mut patterns: Vec<EmotionalPattern> = grouped.into_values().collect();
    for pattern in &mut patterns {
        if pattern.total > 0 {
            pattern.success_rate = Some(pattern.better as f64 / pattern.total as f64);
        }
    }

    patterns
}

/// Picks the emotional state with the highest success rate among states
/// with at least [`MIN_EMOTION_SAMPLE`] reviewed decisions.
#[must_use]
pub fn best_emotional_state(patterns: &[EmotionalPattern]) -> Option<&EmotionalPattern> {
    patterns
        .iter()
        .filter(|pattern| pattern.total >= MIN_EMOTION_SAMPLE)
        .max_by(|lhs, rhs| {
            let lhs_rate = lhs.success_rate.unwrap_or(0.0);
            let rhs_rate = rhs.success_rate.unwrap_or(0.0);
            lhs_rate
                .partial_cmp(&rhs_rate)
                .unwrap_or(std::cmp::Ordering::Equal)
        })
}

/// Parses an RFC3339 timestamp and requires UTC (`Z`) offset.
///
/// # Errors
/// Returns [`InsightsError::Validation`] when parsing fails or an input
/// timestamp is not UTC.
pub fn parse_rfc3339_utc(value: &str) -> Result<OffsetDateTime, InsightsError> {
    let parsed = OffsetDateTime::parse(value, &time::format_description::well_known::Rfc3339)
        .map_err(|err| InsightsError::Validation(format!("invalid RFC3339 timestamp: {err}")))?;

    if parsed.offset() != UtcOffset::UTC {
        return Err(InsightsError::Validation(
            "timestamp MUST use UTC offset Z".to_string(),
        ));
    }

    Ok(parsed)
}

/// Formats a timestamp as RFC3339 after normalizing to UTC.
///
/// # Errors
/// Returns [`InsightsError::Validation`] when formatting fails.
pub fn format_rfc3339(value: OffsetDateTime) -> Result<String, InsightsError> {
    value
        .to_offset(UtcOffset::UTC)
        .format(&time::format_description::well_known::Rfc3339)
        .map_err(|err| {
            InsightsError::Validation(format!("failed to format RFC3339 timestamp: {err}"))
        })
}

#[must_use]
pub fn now_utc() -> OffsetDateTime {
    OffsetDateTime::now_utc().to_offset(UtcOffset::UTC)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn must_ok<T, E: std::fmt::Display>(result: Result<T, E>) -> T {
        match result {
            Ok(value) => value,
            Err(err) => panic!("expected Ok(..), got error: {err}"),
        }
    }

    fn fixture_user_id() -> UserId {
        UserId(must_ok(Ulid::from_string("01J0SQQP7M70P6Y3R4T8D8G8M2")))
    }

    fn must_utc(value: &str) -> OffsetDateTime {
        must_ok(parse_rfc3339_utc(value))
    }

    fn fixture_decision(confidence_level: u8, outcome: Outcome) -> Decision {
        Decision {
            decision_seq: 0,
            decision_id: DecisionId(Ulid::new()),
            user_id: fixture_user_id(),
            title: "fixture".to_string(),
            confidence_level,
            outcome,
            status: DecisionStatus::Reviewed,
            emotional_state: None,
            recorded_at: must_utc("2026-08-30T12:00:00Z"),
        }
    }

    fn canonical_decisions() -> Vec<Decision> {
        // Low 2/4, medium 2/3, high 4/4 -- the confidence correlation
        // seed pattern.
        vec![
            fixture_decision(1, Outcome::Worse),
            fixture_decision(2, Outcome::Worse),
            fixture_decision(2, Outcome::Better),
            fixture_decision(1, Outcome::Better),
            fixture_decision(3, Outcome::Worse),
            fixture_decision(3, Outcome::Better),
            fixture_decision(3, Outcome::Better),
            fixture_decision(5, Outcome::Better),
            fixture_decision(4, Outcome::Better),
            fixture_decision(5, Outcome::Better),
            fixture_decision(4, Outcome::Better),
        ]
    }

    fn rate_of(report: &CorrelationReport, label: TierLabel) -> Option<f64> {
        report
            .tiers
            .iter()
            .find(|tier| tier.label == label)
            .and_then(|tier| tier.success_rate)
    }

    #[test]
    fn tier_table_maps_all_five_levels() {
        assert_eq!(must_ok(TierLabel::for_confidence(1)), TierLabel::Low);
        assert_eq!(must_ok(TierLabel::for_confidence(2)), TierLabel::Low);
        assert_eq!(must_ok(TierLabel::for_confidence(3)), TierLabel::Medium);
        assert_eq!(must_ok(TierLabel::for_confidence(4)), TierLabel::High);
        assert_eq!(must_ok(TierLabel::for_confidence(5)), TierLabel::High);
    }

    #[test]
    fn tier_mapping_rejects_out_of_range_without_clamping() {
        assert!(TierLabel::for_confidence(0).is_err());
        assert!(TierLabel::for_confidence(6).is_err());
    }

    #[test]
    fn bucketer_partitions_every_eligible_decision_exactly_once() {
        let decisions = canonical_decisions();
        let buckets = must_ok(bucket_decisions(&decisions));

        let bucketed = buckets.low.len() + buckets.medium.len() + buckets.high.len();
        assert_eq!(bucketed, decisions.len());
        assert!(buckets
            .low
            .iter()
            .all(|decision| decision.confidence_level <= 2));
        assert!(buckets
            .medium
            .iter()
            .all(|decision| decision.confidence_level == 3));
        assert!(buckets
            .high
            .iter()
            .all(|decision| decision.confidence_level >= 4));
    }

    #[test]
    fn bucketer_excludes_unreviewed_decisions_entirely() {
        let mut decisions = canonical_decisions();
        let baseline = must_ok(correlation_report(&decisions));

        for status in [
            DecisionStatus::Draft,
            DecisionStatus::Deliberating,
            DecisionStatus::Decided,
        ] {
            let mut unreviewed = fixture_decision(5, Outcome::Better);
            unreviewed.status = status;
            decisions.push(unreviewed);
        }

        let report = must_ok(correlation_report(&decisions));
        assert_eq!(report, baseline);
    }

    #[test]
    fn out_of_range_confidence_propagates_validation_error() {
        let mut decisions = canonical_decisions();
        decisions.push(fixture_decision(7, Outcome::Better));

        let err = match correlation_report(&decisions) {
            Ok(report) => panic!("expected validation error, got {report:?}"),
            Err(err) => err,
        };
        assert!(err.to_string().contains("confidence_level MUST be in [1, 5]"));
    }

    #[test]
    fn empty_tier_rate_is_undefined_not_zero() {
        let tier = aggregate_tier(TierLabel::Medium, &[]);
        assert_eq!(tier.total, 0);
        assert_eq!(tier.successes, 0);
        assert_eq!(tier.success_rate, None);
    }

    #[test]
    fn same_unknown_and_worse_all_count_as_non_success() {
        let decisions = vec![
            fixture_decision(3, Outcome::Better),
            fixture_decision(3, Outcome::Same),
            fixture_decision(3, Outcome::Unknown),
            fixture_decision(3, Outcome::Worse),
        ];
        let buckets = must_ok(bucket_decisions(&decisions));
        let tier = aggregate_tier(TierLabel::Medium, &buckets.medium);

        assert_eq!(tier.total, 4);
        assert_eq!(tier.successes, 1);
        assert_eq!(tier.success_rate, Some(0.25));
    }

    #[test]
    fn canonical_pattern_reports_positive_with_sample_size_11() {
        let report = must_ok(correlation_report(&canonical_decisions()));

        assert_eq!(report.direction, CorrelationDirection::Positive);
        assert_eq!(report.sample_size, 11);
        assert_eq!(rate_of(&report, TierLabel::Low), Some(0.5));
        let medium = match rate_of(&report, TierLabel::Medium) {
            Some(value) => value,
            None => panic!("medium tier rate must be defined"),
        };
        assert!((medium - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(rate_of(&report, TierLabel::High), Some(1.0));
    }

    #[test]
    fn sample_size_equals_sum_of_tier_totals() {
        let report = must_ok(correlation_report(&canonical_decisions()));
        let total: usize = report.tiers.iter().map(|tier| tier.total).sum();
        assert_eq!(report.sample_size, total);
    }

    #[test]
    fn report_is_idempotent_over_the_same_snapshot() {
        let decisions = canonical_decisions();
        let first = must_ok(correlation_report(&decisions));
        let second = must_ok(correlation_report(&decisions));
        assert_eq!(first, second);
    }

    #[test]
    fn monotonic_pattern_yields_positive() {
        let decisions = vec![
            fixture_decision(1, Outcome::Worse),
            fixture_decision(2, Outcome::Same),
            fixture_decision(4, Outcome::Better),
            fixture_decision(5, Outcome::Better),
        ];
        let report = must_ok(correlation_report(&decisions));
        assert_eq!(report.direction, CorrelationDirection::Positive);
    }

    #[test]
    fn swapping_better_and_worse_flips_the_direction() {
        let decisions = canonical_decisions();
        let flipped: Vec<Decision> = decisions
            .iter()
            .map(|decision| {
                let mut copy = decision.clone();
                copy.outcome = match decision.outcome {
                    Outcome::Better => Outcome::Worse,
                    Outcome::Worse => Outcome::Better,
                    other => other,
                };
                copy
            })
            .collect();

        let baseline = must_ok(correlation_report(&decisions));
        let mirrored = must_ok(correlation_report(&flipped));

        assert_eq!(baseline.direction, CorrelationDirection::Positive);
        assert_eq!(mirrored.direction, CorrelationDirection::Negative);
    }

    #[test]
    fn three_eligible_decisions_are_below_the_minimum_sample() {
        let decisions = vec![
            fixture_decision(1, Outcome::Worse),
            fixture_decision(3, Outcome::Better),
            fixture_decision(5, Outcome::Better),
        ];
        let report = must_ok(correlation_report(&decisions));
        assert_eq!(report.direction, CorrelationDirection::InsufficientData);
    }

    #[test]
    fn single_defined_tier_is_insufficient_regardless_of_volume() {
        let decisions = vec![
            fixture_decision(5, Outcome::Better),
            fixture_decision(5, Outcome::Better),
            fixture_decision(4, Outcome::Worse),
            fixture_decision(4, Outcome::Better),
            fixture_decision(5, Outcome::Better),
        ];
        let report = must_ok(correlation_report(&decisions));
        assert_eq!(report.direction, CorrelationDirection::InsufficientData);
    }

    #[test]
    fn empty_snapshot_reports_insufficient_data_with_all_tiers_present() {
        let report = must_ok(correlation_report(&[]));

        assert_eq!(report.direction, CorrelationDirection::InsufficientData);
        assert_eq!(report.sample_size, 0);
        assert_eq!(report.tiers.len(), 3);
        assert!(report.tiers.iter().all(|tier| tier.success_rate.is_none()));
    }

    #[test]
    fn two_tier_snapshot_compares_the_defined_endpoints() {
        // Medium tier empty: low 0/2 vs high 2/2.
        let decisions = vec![
            fixture_decision(1, Outcome::Worse),
            fixture_decision(2, Outcome::Worse),
            fixture_decision(4, Outcome::Better),
            fixture_decision(5, Outcome::Better),
        ];
        let report = must_ok(correlation_report(&decisions));
        assert_eq!(report.direction, CorrelationDirection::Positive);
        assert_eq!(rate_of(&report, TierLabel::Medium), None);
    }

    #[test]
    fn equal_endpoint_rates_yield_none() {
        let decisions = vec![
            fixture_decision(1, Outcome::Better),
            fixture_decision(2, Outcome::Worse),
            fixture_decision(4, Outcome::Better),
            fixture_decision(5, Outcome::Worse),
        ];
        let report = must_ok(correlation_report(&decisions));
        assert_eq!(report.direction, CorrelationDirection::None);
    }

    #[test]
    fn medium_deviation_does_not_override_the_endpoints() {
        // Medium dips below both endpoints; low < high still wins.
        let decisions = vec![
            fixture_decision(1, Outcome::Better),
            fixture_decision(2, Outcome::Worse),
            fixture_decision(3, Outcome::Worse),
            fixture_decision(3, Outcome::Worse),
            fixture_decision(4, Outcome::Better),
            fixture_decision(5, Outcome::Better),
        ];
        let report = must_ok(correlation_report(&decisions));
        assert_eq!(report.direction, CorrelationDirection::Positive);
    }

    #[test]
    fn report_serializes_with_nullable_success_rate() {
        let decisions = vec![
            fixture_decision(1, Outcome::Worse),
            fixture_decision(1, Outcome::Better),
            fixture_decision(4, Outcome::Better),
            fixture_decision(5, Outcome::Better),
        ];
        let report = must_ok(correlation_report(&decisions));
        let value = must_ok(serde_json::to_value(&report));

        assert_eq!(
            value,
            json!({
                "tiers": [
                    {"label": "low", "total": 2, "successes": 1, "success_rate": 0.5},
                    {"label": "medium", "total": 0, "successes": 0, "success_rate": null},
                    {"label": "high", "total": 2, "successes": 2, "success_rate": 1.0}
                ],
                "direction": "positive",
                "sample_size": 4
            })
        );
    }

    #[test]
    fn summarize_counts_every_outcome_over_reviewed_decisions() {
        let mut decisions = vec![
            fixture_decision(1, Outcome::Better),
            fixture_decision(2, Outcome::Worse),
            fixture_decision(3, Outcome::Same),
            fixture_decision(4, Outcome::Unknown),
        ];
        let mut draft = fixture_decision(5, Outcome::Better);
        draft.status = DecisionStatus::Draft;
        decisions.push(draft);

        let summary = summarize(&decisions);
        assert_eq!(summary.total_decisions, 5);
        assert_eq!(summary.reviewed_decisions, 4);
        assert_eq!(summary.better, 1);
        assert_eq!(summary.worse, 1);
        assert_eq!(summary.same, 1);
        assert_eq!(summary.unknown, 1);
    }

    #[test]
    fn best_emotional_state_requires_minimum_sample() {
        let mut confident_win = fixture_decision(4, Outcome::Better);
        confident_win.emotional_state = Some("confident".to_string());
        let mut confident_win_2 = fixture_decision(5, Outcome::Better);
        confident_win_2.emotional_state = Some("confident".to_string());
        let mut lone_calm = fixture_decision(3, Outcome::Better);
        lone_calm.emotional_state = Some("calm".to_string());
        let mut anxious_loss = fixture_decision(1, Outcome::Worse);
        anxious_loss.emotional_state = Some("anxious".to_string());
        let mut anxious_loss_2 = fixture_decision(2, Outcome::Worse);
        anxious_loss_2.emotional_state = Some("anxious".to_string());

        let decisions = vec![
            confident_win,
            confident_win_2,
            lone_calm,
            anxious_loss,
            anxious_loss_2,
        ];
        let patterns = emotional_patterns(&decisions);

        // "calm" has a perfect rate but only one decision.
        let best = match best_emotional_state(&patterns) {
            Some(value) => value,
            None => panic!("expected a best emotional state"),
        };
        assert_eq!(best.emotional_state, "confident");
        assert_eq!(best.success_rate, Some(1.0));
    }

    #[test]
    fn emotional_patterns_group_missing_state_as_unknown() {
        let decisions = vec![
            fixture_decision(3, Outcome::Better),
            fixture_decision(3, Outcome::Worse),
        ];
        let patterns = emotional_patterns(&decisions);

        assert_eq!(patterns.len(), 1);
        assert_eq!(patterns[0].emotional_state, "unknown");
        assert_eq!(patterns[0].total, 2);
        assert_eq!(patterns[0].success_rate, Some(0.5));
    }

    #[test]
    fn decision_input_validation_covers_title_confidence_and_offset() {
        let valid = DecisionInput {
            decision_id: None,
            user_id: fixture_user_id(),
            title: "Ship the release".to_string(),
            confidence_level: 4,
            outcome: Outcome::Better,
            status: DecisionStatus::Reviewed,
            emotional_state: Some("confident".to_string()),
            recorded_at: must_utc("2026-08-30T12:00:00Z"),
        };
        must_ok(valid.validate());

        let mut blank_title = valid.clone();
        blank_title.title = "  ".to_string();
        assert!(blank_title.validate().is_err());

        let mut bad_confidence = valid.clone();
        bad_confidence.confidence_level = 0;
        assert!(bad_confidence.validate().is_err());

        let mut non_utc = valid;
        non_utc.recorded_at = match OffsetDateTime::parse(
            "2026-08-30T12:00:00+02:00",
            &time::format_description::well_known::Rfc3339,
        ) {
            Ok(value) => value,
            Err(err) => panic!("invalid fixture timestamp: {err}"),
        };
        assert!(non_utc.validate().is_err());
    }

    #[test]
    fn parse_rfc3339_utc_rejects_non_utc_offsets() {
        assert!(parse_rfc3339_utc("2026-08-30T12:00:00+02:00").is_err());
        assert!(parse_rfc3339_utc("not-a-timestamp").is_err());
        let parsed = must_ok(parse_rfc3339_utc("2026-08-30T12:00:00Z"));
        assert_eq!(must_ok(format_rfc3339(parsed)), "2026-08-30T12:00:00Z");
    }
}
