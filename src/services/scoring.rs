//! Scoring of assessment attempts against their spec.

use std::collections::{HashMap, HashSet};

use serde::Deserialize;

use crate::domain::assessment::{AnswerRecord, AnswerValue, AssessmentSpec};
use crate::domain::DomainError;

/// Maps a raw score and attempt count to a mastery probability in [0, 1].
/// The real calibration lives in an external model; implementations here
/// only have to honor the interface.
pub trait MasteryModel: Send + Sync {
    fn mastery_prob(&self, score: f64, attempt_number: i32) -> f64;
}

/// Step-table calibration carried over from the reference scoring rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct CalibratedMasteryModel;

impl MasteryModel for CalibratedMasteryModel {
    fn mastery_prob(&self, score: f64, _attempt_number: i32) -> f64 {
        if score >= 90.0 {
            0.9
        } else if score >= 80.0 {
            0.7
        } else if score >= 70.0 {
            0.5
        } else {
            0.2
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedAnswer {
    pub question_id: String,
    pub answer: AnswerValue,
}

#[derive(Debug, Clone)]
pub struct ScoreOutcome {
    pub score: f64,
    pub mastery_prob: f64,
    pub passed: bool,
    pub answers: Vec<AnswerRecord>,
}

/// Scores one submission. Unanswered questions earn nothing; answers for
/// unknown or duplicated question ids are malformed input. The attempt
/// limit is enforced here so a caller cannot record an over-limit score.
pub fn score_attempt(
    spec: &AssessmentSpec,
    answers: &[SubmittedAnswer],
    attempt_number: i32,
    model: &dyn MasteryModel,
) -> Result<ScoreOutcome, DomainError> {
    if attempt_number > spec.max_attempts {
        return Err(DomainError::AttemptLimitExceeded {
            attempt_number,
            max_attempts: spec.max_attempts,
        });
    }

    let known: HashSet<&str> = spec.questions.iter().map(|q| q.id.as_str()).collect();
    let mut submitted: HashMap<&str, &AnswerValue> = HashMap::new();
    for answer in answers {
        if !known.contains(answer.question_id.as_str()) {
            return Err(DomainError::validation(format!(
                "answer references unknown question {}",
                answer.question_id
            )));
        }
        if submitted
            .insert(answer.question_id.as_str(), &answer.answer)
            .is_some()
        {
            return Err(DomainError::validation(format!(
                "duplicate answer for question {}",
                answer.question_id
            )));
        }
    }

    let total_points = spec.total_points();
    if total_points <= 0 {
        return Err(DomainError::validation(
            "assessment spec has no scoreable points",
        ));
    }

    let mut earned = 0;
    let mut records = Vec::with_capacity(answers.len());
    for question in &spec.questions {
        let Some(answer) = submitted.get(question.id.as_str()) else {
            continue;
        };
        let is_correct = question.correct_answer.matches(answer);
        let points_earned = if is_correct { question.points } else { 0 };
        earned += points_earned;
        records.push(AnswerRecord {
            question_id: question.id.clone(),
            answer: (*answer).clone(),
            is_correct,
            points_earned,
        });
    }

    let score = earned as f64 / total_points as f64 * 100.0;
    let mastery_prob = model.mastery_prob(score, attempt_number).clamp(0.0, 1.0);

    Ok(ScoreOutcome {
        score,
        mastery_prob,
        passed: score >= spec.passing_score,
        answers: records,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::assessment::{Question, QuestionType};

    fn spec() -> AssessmentSpec {
        AssessmentSpec {
            questions: vec![
                Question {
                    id: "q1".to_string(),
                    question_type: QuestionType::MultipleChoice,
                    question: "What is Rust's package manager?".to_string(),
                    options: Some(vec!["cargo".to_string(), "pip".to_string()]),
                    correct_answer: AnswerValue::Single("cargo".to_string()),
                    points: 10,
                },
                Question {
                    id: "q2".to_string(),
                    question_type: QuestionType::MultipleChoice,
                    question: "Which keywords introduce bindings?".to_string(),
                    options: Some(vec![
                        "let".to_string(),
                        "const".to_string(),
                        "goto".to_string(),
                    ]),
                    correct_answer: AnswerValue::Multiple(vec![
                        "let".to_string(),
                        "const".to_string(),
                    ]),
                    points: 5,
                },
            ],
            time_limit_min: None,
            passing_score: 70.0,
            max_attempts: 3,
        }
    }

    fn answer(id: &str, value: AnswerValue) -> SubmittedAnswer {
        SubmittedAnswer {
            question_id: id.to_string(),
            answer: value,
        }
    }

    #[test]
    fn perfect_submission_scores_100() {
        let outcome = score_attempt(
            &spec(),
            &[
                answer("q1", AnswerValue::Single("cargo".to_string())),
                answer(
                    "q2",
                    AnswerValue::Multiple(vec!["const".to_string(), "let".to_string()]),
                ),
            ],
            1,
            &CalibratedMasteryModel,
        )
        .unwrap();

        assert_eq!(outcome.score, 100.0);
        assert!(outcome.passed);
        assert!(outcome.answers.iter().all(|a| a.is_correct));
        assert_eq!(outcome.mastery_prob, 0.9);
    }

    #[test]
    fn empty_submission_scores_zero() {
        let outcome = score_attempt(&spec(), &[], 1, &CalibratedMasteryModel).unwrap();
        assert_eq!(outcome.score, 0.0);
        assert!(!outcome.passed);
        assert!(outcome.answers.is_empty());
    }

    #[test]
    fn partial_credit_can_miss_the_bar() {
        // 10 of 15 points is roughly 66.67, below the 70 passing score.
        let outcome = score_attempt(
            &spec(),
            &[answer("q1", AnswerValue::Single("cargo".to_string()))],
            1,
            &CalibratedMasteryModel,
        )
        .unwrap();

        assert!((outcome.score - 200.0 / 3.0).abs() < 1e-9);
        assert!(!outcome.passed);
    }

    #[test]
    fn fourth_attempt_of_three_is_rejected() {
        let err = score_attempt(&spec(), &[], 4, &CalibratedMasteryModel).unwrap_err();
        assert_eq!(
            err,
            DomainError::AttemptLimitExceeded {
                attempt_number: 4,
                max_attempts: 3,
            }
        );
    }

    #[test]
    fn unknown_question_id_is_malformed() {
        let err = score_attempt(
            &spec(),
            &[answer("q9", AnswerValue::Single("cargo".to_string()))],
            1,
            &CalibratedMasteryModel,
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }
}
