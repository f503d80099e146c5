//! Role classification: normalizing external scores and deciding what to do
//! with them.
//!
//! The scores themselves come from a [`RoleInference`] port. This module owns
//! everything deterministic around them: which roles are valid, how scores
//! are cleaned, the fallback distribution, the acceptance threshold, and the
//! clarifying questions used to separate two close candidates.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{AnsweredQuestion, FieldValue, Question, Role};
use crate::ports::RoleInference;

/// Scores used when classification is unavailable.
pub const FALLBACK_DISTRIBUTION: [(Role, f64); 3] =
    [(Role::Business, 0.4), (Role::It, 0.3), (Role::Management, 0.3)];

/// Score added to the role picked in a clarifying answer when the
/// classifier could not be consulted.
pub const CLARIFICATION_BOOST: f64 = 0.2;

/// Upper bound on clarifying questions per session.
pub const MAX_CLARIFYING_QUESTIONS: usize = 3;

/// Unvalidated candidate as returned by an inference backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawCandidate {
    pub role: String,
    pub score: f64,
}

/// Unvalidated inference output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawClassification {
    #[serde(default)]
    pub candidates: Vec<RawCandidate>,
    #[serde(default, alias = "explain")]
    pub explanation: String,
}

/// A validated role with its confidence in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoleCandidate {
    pub role: Role,
    pub score: f64,
}

/// Where a classification result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationSource {
    Model,
    Fallback,
}

/// Normalized classification, candidates sorted by descending score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub candidates: Vec<RoleCandidate>,
    pub explanation: String,
    pub source: ClassificationSource,
}

impl ClassificationResult {
    /// Validates raw inference output.
    ///
    /// Unknown roles and non-finite scores are dropped, scores are clamped to
    /// `[0, 1]` and rounded to two decimals, and only the best entry per role
    /// is kept. With nothing left the fallback distribution is returned.
    pub fn from_raw(raw: RawClassification) -> Self {
        let mut candidates: Vec<RoleCandidate> = raw
            .candidates
            .into_iter()
            .filter_map(|c| {
                let role = c.role.parse::<Role>().ok()?;
                c.score.is_finite().then(|| RoleCandidate {
                    role,
                    score: round2(c.score.clamp(0.0, 1.0)),
                })
            })
            .collect();
        sort_descending(&mut candidates);
        let mut seen = Vec::with_capacity(Role::ALL.len());
        candidates.retain(|c| {
            let first = !seen.contains(&c.role);
            seen.push(c.role);
            first
        });

        if candidates.is_empty() {
            return Self::fallback("classifier returned no valid role candidates");
        }
        Self {
            candidates,
            explanation: raw.explanation,
            source: ClassificationSource::Model,
        }
    }

    /// Fixed low-confidence distribution.
    pub fn fallback(reason: impl Into<String>) -> Self {
        Self {
            candidates: FALLBACK_DISTRIBUTION
                .iter()
                .map(|&(role, score)| RoleCandidate { role, score })
                .collect(),
            explanation: reason.into(),
            source: ClassificationSource::Fallback,
        }
    }

    pub fn top(&self) -> Option<&RoleCandidate> {
        self.candidates.first()
    }

    /// The two best roles, best first.
    pub fn top_pair(&self) -> Option<(Role, Role)> {
        match self.candidates.as_slice() {
            [first, second, ..] => Some((first.role, second.role)),
            _ => None,
        }
    }

    /// Adds `amount` to a role's score and re-sorts.
    pub fn boost(&mut self, role: Role, amount: f64) {
        match self.candidates.iter_mut().find(|c| c.role == role) {
            Some(candidate) => candidate.score = round2((candidate.score + amount).clamp(0.0, 1.0)),
            None => self.candidates.push(RoleCandidate {
                role,
                score: round2(amount.clamp(0.0, 1.0)),
            }),
        }
        sort_descending(&mut self.candidates);
    }
}

fn round2(score: f64) -> f64 {
    (score * 100.0).round() / 100.0
}

fn sort_descending(candidates: &mut [RoleCandidate]) {
    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
}

/// Static disambiguation question for a pair of roles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClarifyingQuestion {
    pub question: Question,
    /// Role each option stands for, aligned with `question.options`.
    pub roles: [Role; 2],
}

impl ClarifyingQuestion {
    /// Builds the question that separates `first` from `second`, numbered
    /// `clarifying_{number}`. Returns `None` for identical roles.
    pub fn for_pair(first: Role, second: Role, number: usize) -> Option<Self> {
        let (roles, text, options) = discriminator(first, second)?;
        Some(Self {
            question: Question::choice(format!("clarifying_{}", number), text, options),
            roles,
        })
    }

    pub fn id(&self) -> &str {
        &self.question.id
    }

    /// True when this question separates the same two roles, in either order.
    pub fn covers(&self, first: Role, second: Role) -> bool {
        let [a, b] = self.roles;
        (a == first && b == second) || (a == second && b == first)
    }

    /// Role indicated by an answer, if it names one of the options.
    pub fn role_for_answer(&self, answer: &FieldValue) -> Option<Role> {
        let chosen = self.question.interpret_answer(&answer.to_text()).to_text();
        self.question
            .options
            .iter()
            .position(|option| *option == chosen)
            .map(|index| self.roles[index])
    }
}

type Discriminator = ([Role; 2], &'static str, [&'static str; 2]);

fn discriminator(first: Role, second: Role) -> Option<Discriminator> {
    use Role::*;
    let entry: Discriminator = match (first, second) {
        (It, Business) | (Business, It) => (
            [It, Business],
            "Arbeiten Sie mehr mit technischen Systemen und deren Integration oder mit fachlichen Prozessen und deren Bearbeitung?",
            ["Technische Systeme", "Fachliche Prozesse"],
        ),
        (It, Management) | (Management, It) => (
            [It, Management],
            "Liegt Ihr Fokus eher auf der technischen Umsetzung oder auf strategischen Entscheidungen und Führung?",
            ["Technische Umsetzung", "Strategie und Führung"],
        ),
        (Business, Management) | (Management, Business) => (
            [Business, Management],
            "Beschäftigen Sie sich hauptsächlich mit der operativen Durchführung von Aufgaben oder mit der strategischen Planung und Steuerung?",
            ["Operative Durchführung", "Strategische Planung"],
        ),
        _ => return None,
    };
    Some(entry)
}

/// Outcome of applying the acceptance policy to a classification.
#[derive(Debug, Clone, PartialEq)]
pub enum RoleDecision {
    /// Confident enough.
    Accept(Role),
    /// Ask this question before deciding.
    Clarify(ClarifyingQuestion),
    /// Assign anyway, flagged as uncertain.
    AcceptLowConfidence(Role),
}

/// Threshold and retry bound for role acceptance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassificationPolicy {
    pub confidence_threshold: f64,
    pub max_clarifying_questions: usize,
}

impl Default for ClassificationPolicy {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.7,
            max_clarifying_questions: MAX_CLARIFYING_QUESTIONS,
        }
    }
}

impl ClassificationPolicy {
    pub fn new(confidence_threshold: f64, max_clarifying_questions: usize) -> Self {
        Self {
            confidence_threshold,
            max_clarifying_questions: max_clarifying_questions.min(MAX_CLARIFYING_QUESTIONS),
        }
    }

    /// Decides given the result and the clarifying questions asked so far.
    ///
    /// A clarifying question is only offered for a role pair that has not
    /// been asked about yet, so repeated rounds cannot loop on one question.
    pub fn decide(&self, result: &ClassificationResult, asked: &[ClarifyingQuestion]) -> RoleDecision {
        let Some(top) = result.top() else {
            return RoleDecision::AcceptLowConfidence(Role::DEFAULT);
        };
        if top.score >= self.confidence_threshold {
            return RoleDecision::Accept(top.role);
        }

        if asked.len() < self.max_clarifying_questions {
            let next = result
                .top_pair()
                .filter(|&(a, b)| !asked.iter().any(|q| q.covers(a, b)))
                .and_then(|(a, b)| ClarifyingQuestion::for_pair(a, b, asked.len() + 1));
            if let Some(question) = next {
                return RoleDecision::Clarify(question);
            }
        }
        RoleDecision::AcceptLowConfidence(top.role)
    }
}

/// Classification front end: calls the inference port when present and
/// degrades to the fallback distribution on any failure.
#[derive(Clone, Default)]
pub struct RoleClassifier {
    inference: Option<Arc<dyn RoleInference>>,
}

impl RoleClassifier {
    pub fn new(inference: Arc<dyn RoleInference>) -> Self {
        Self {
            inference: Some(inference),
        }
    }

    /// A classifier that always falls back.
    pub fn unavailable() -> Self {
        Self { inference: None }
    }

    pub async fn classify(&self, answers: &[AnsweredQuestion]) -> ClassificationResult {
        let Some(inference) = &self.inference else {
            tracing::info!("no role classifier configured; using fallback distribution");
            return ClassificationResult::fallback("role classifier not configured");
        };
        match inference.infer(answers).await {
            Ok(raw) => {
                let result = ClassificationResult::from_raw(raw);
                if result.source == ClassificationSource::Fallback {
                    tracing::warn!("classifier output contained no usable candidates");
                }
                result
            }
            Err(err) => {
                tracing::warn!(error = %err, "role classification failed; using fallback distribution");
                ClassificationResult::fallback(format!("classification failed: {}", err))
            }
        }
    }
}

impl std::fmt::Debug for RoleClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoleClassifier")
            .field("inference", &self.inference.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::ClassificationError;
    use async_trait::async_trait;

    fn raw(entries: &[(&str, f64)]) -> RawClassification {
        RawClassification {
            candidates: entries
                .iter()
                .map(|(role, score)| RawCandidate {
                    role: role.to_string(),
                    score: *score,
                })
                .collect(),
            explanation: "because".to_string(),
        }
    }

    fn result(entries: &[(Role, f64)]) -> ClassificationResult {
        ClassificationResult {
            candidates: entries
                .iter()
                .map(|&(role, score)| RoleCandidate { role, score })
                .collect(),
            explanation: String::new(),
            source: ClassificationSource::Model,
        }
    }

    mod normalization {
        use super::*;

        #[test]
        fn sorts_clamps_and_rounds() {
            let r = ClassificationResult::from_raw(raw(&[
                ("it", 0.333),
                ("management", 1.7),
                ("fach", -0.2),
            ]));
            assert_eq!(r.source, ClassificationSource::Model);
            assert_eq!(
                r.candidates,
                vec![
                    RoleCandidate { role: Role::Management, score: 1.0 },
                    RoleCandidate { role: Role::It, score: 0.33 },
                    RoleCandidate { role: Role::Business, score: 0.0 },
                ]
            );
            assert_eq!(r.explanation, "because");
        }

        #[test]
        fn unknown_roles_and_nan_are_dropped() {
            let r = ClassificationResult::from_raw(raw(&[("sales", 0.9), ("IT", f64::NAN), ("Business", 0.6)]));
            assert_eq!(r.candidates, vec![RoleCandidate { role: Role::Business, score: 0.6 }]);
        }

        #[test]
        fn duplicate_roles_keep_the_best_score() {
            let r = ClassificationResult::from_raw(raw(&[("it", 0.2), ("it", 0.8), ("business", 0.5)]));
            assert_eq!(r.candidates.len(), 2);
            assert_eq!(r.top(), Some(&RoleCandidate { role: Role::It, score: 0.8 }));
        }

        #[test]
        fn nothing_valid_falls_back() {
            let r = ClassificationResult::from_raw(raw(&[("sales", 0.9)]));
            assert_eq!(r.source, ClassificationSource::Fallback);
            assert_eq!(r.top().map(|c| c.role), Some(Role::Business));
            assert_eq!(r.top().map(|c| c.score), Some(0.4));
        }

        #[test]
        fn explain_alias_is_accepted() {
            let parsed: RawClassification =
                serde_json::from_str(r#"{"candidates":[{"role":"it","score":0.9}],"explain":"tech"}"#).unwrap();
            assert_eq!(parsed.explanation, "tech");
        }

        #[test]
        fn boost_reorders_candidates() {
            let mut r = ClassificationResult::fallback("test");
            r.boost(Role::It, CLARIFICATION_BOOST);
            assert_eq!(r.top(), Some(&RoleCandidate { role: Role::It, score: 0.5 }));
            assert_eq!(r.top_pair(), Some((Role::It, Role::Business)));
        }
    }

    mod clarifying_questions {
        use super::*;

        #[test]
        fn table_covers_every_pair_in_both_orders() {
            for a in Role::ALL {
                for b in Role::ALL {
                    let q = ClarifyingQuestion::for_pair(a, b, 1);
                    assert_eq!(q.is_some(), a != b, "{:?}/{:?}", a, b);
                    if let Some(q) = q {
                        assert!(q.covers(a, b) && q.covers(b, a));
                        assert_eq!(q.question.options.len(), 2);
                    }
                }
            }
        }

        #[test]
        fn ids_are_numbered() {
            let q = ClarifyingQuestion::for_pair(Role::Business, Role::Management, 2).unwrap();
            assert_eq!(q.id(), "clarifying_2");
            assert_eq!(q.question.options, vec!["Operative Durchführung", "Strategische Planung"]);
        }

        #[test]
        fn answers_map_back_to_roles() {
            let q = ClarifyingQuestion::for_pair(Role::Business, Role::It, 1).unwrap();
            assert_eq!(q.role_for_answer(&FieldValue::scalar("Technische Systeme")), Some(Role::It));
            assert_eq!(q.role_for_answer(&FieldValue::scalar("2")), Some(Role::Business));
            assert_eq!(q.role_for_answer(&FieldValue::scalar("both")), None);
        }
    }

    mod policy {
        use super::*;

        #[test]
        fn confident_top_is_accepted() {
            let decision = ClassificationPolicy::default()
                .decide(&result(&[(Role::It, 0.7), (Role::Business, 0.2)]), &[]);
            assert_eq!(decision, RoleDecision::Accept(Role::It));
        }

        #[test]
        fn uncertain_top_asks_about_top_pair() {
            let decision = ClassificationPolicy::default()
                .decide(&result(&[(Role::Management, 0.5), (Role::It, 0.4)]), &[]);
            match decision {
                RoleDecision::Clarify(q) => {
                    assert!(q.covers(Role::It, Role::Management));
                    assert_eq!(q.id(), "clarifying_1");
                }
                other => panic!("expected clarifying question, got {:?}", other),
            }
        }

        #[test]
        fn already_asked_pair_is_not_repeated() {
            let asked = vec![ClarifyingQuestion::for_pair(Role::It, Role::Management, 1).unwrap()];
            let decision = ClassificationPolicy::default()
                .decide(&result(&[(Role::Management, 0.5), (Role::It, 0.4)]), &asked);
            assert_eq!(decision, RoleDecision::AcceptLowConfidence(Role::Management));
        }

        #[test]
        fn cap_forces_low_confidence_acceptance() {
            let asked: Vec<_> = (1..=3)
                .map(|n| ClarifyingQuestion::for_pair(Role::It, Role::Business, n).unwrap())
                .collect();
            let decision = ClassificationPolicy::default()
                .decide(&result(&[(Role::Management, 0.5), (Role::Business, 0.4)]), &asked);
            assert_eq!(decision, RoleDecision::AcceptLowConfidence(Role::Management));
        }

        #[test]
        fn single_candidate_is_accepted_with_low_confidence() {
            let decision = ClassificationPolicy::default().decide(&result(&[(Role::It, 0.3)]), &[]);
            assert_eq!(decision, RoleDecision::AcceptLowConfidence(Role::It));
        }

        #[test]
        fn no_candidates_uses_default_role() {
            let decision = ClassificationPolicy::default().decide(&result(&[]), &[]);
            assert_eq!(decision, RoleDecision::AcceptLowConfidence(Role::Business));
        }

        #[test]
        fn clarifying_bound_is_capped_at_three() {
            assert_eq!(ClassificationPolicy::new(0.8, 10).max_clarifying_questions, 3);
        }
    }

    mod classifier {
        use super::*;

        struct FixedInference(Result<RawClassification, ClassificationError>);

        #[async_trait]
        impl RoleInference for FixedInference {
            async fn infer(&self, _answers: &[AnsweredQuestion]) -> Result<RawClassification, ClassificationError> {
                self.0.clone()
            }
        }

        #[tokio::test]
        async fn missing_backend_falls_back() {
            let r = RoleClassifier::unavailable().classify(&[]).await;
            assert_eq!(r.source, ClassificationSource::Fallback);
        }

        #[tokio::test]
        async fn backend_error_falls_back() {
            let classifier = RoleClassifier::new(Arc::new(FixedInference(Err(
                ClassificationError::unavailable("down"),
            ))));
            let r = classifier.classify(&[]).await;
            assert_eq!(r.source, ClassificationSource::Fallback);
            assert!(r.explanation.contains("down"));
        }

        #[tokio::test]
        async fn backend_output_is_normalized() {
            let classifier = RoleClassifier::new(Arc::new(FixedInference(Ok(raw(&[("it", 0.912)])))));
            let r = classifier.classify(&[]).await;
            assert_eq!(r.source, ClassificationSource::Model);
            assert_eq!(r.top(), Some(&RoleCandidate { role: Role::It, score: 0.91 }));
        }
    }
}
