//! The fixed intake schedule.
//!
//! Nine questions in a fixed order: six open questions about the person's
//! work, then three yes/no discriminators that each point at one role.

use super::{Question, QuestionType, Role};

/// Number of intake questions per session.
pub const INTAKE_QUESTION_COUNT: usize = 9;

/// Options of the yes/no discriminator questions.
pub const YES_NO_OPTIONS: [&str; 2] = ["Ja", "Nein"];

/// One slot of the intake schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntakeTopic {
    RoleFunction,
    TasksResponsibility,
    ProcessGoals,
    ProblemsChallenges,
    Collaboration,
    SuccessMeasurement,
    OperationalDecisions,
    TechnicalResponsibility,
    ProjectLeadership,
}

impl IntakeTopic {
    /// Slots in the order they are asked.
    pub const SCHEDULE: [IntakeTopic; INTAKE_QUESTION_COUNT] = [
        IntakeTopic::RoleFunction,
        IntakeTopic::TasksResponsibility,
        IntakeTopic::ProcessGoals,
        IntakeTopic::ProblemsChallenges,
        IntakeTopic::Collaboration,
        IntakeTopic::SuccessMeasurement,
        IntakeTopic::OperationalDecisions,
        IntakeTopic::TechnicalResponsibility,
        IntakeTopic::ProjectLeadership,
    ];

    /// Topic for the zero-based slot index.
    pub fn at(slot: usize) -> Option<Self> {
        Self::SCHEDULE.get(slot).copied()
    }

    /// Stable question id.
    pub fn question_id(&self) -> &'static str {
        match self {
            Self::RoleFunction => "role_function",
            Self::TasksResponsibility => "tasks_responsibility",
            Self::ProcessGoals => "process_goals",
            Self::ProblemsChallenges => "problems_challenges",
            Self::Collaboration => "collaboration",
            Self::SuccessMeasurement => "success_measurement",
            Self::OperationalDecisions => "operational_decisions",
            Self::TechnicalResponsibility => "technical_responsibility",
            Self::ProjectLeadership => "project_leadership",
        }
    }

    pub fn question_type(&self) -> QuestionType {
        if self.signals_role().is_some() {
            QuestionType::Choice
        } else {
            QuestionType::Text
        }
    }

    /// Role a "yes" answer points to, for the discriminator slots.
    pub fn signals_role(&self) -> Option<Role> {
        match self {
            Self::OperationalDecisions => Some(Role::Business),
            Self::TechnicalResponsibility => Some(Role::It),
            Self::ProjectLeadership => Some(Role::Management),
            _ => None,
        }
    }

    /// What the question should find out, phrased for a text generator.
    pub fn descriptor(&self) -> &'static str {
        match self {
            Self::RoleFunction => "the person's role or function in the organization (open question)",
            Self::TasksResponsibility => "the main tasks and responsibilities of the person",
            Self::ProcessGoals => "the goals the person wants to reach in their processes",
            Self::ProblemsChallenges => "typical problems and challenges in their daily work",
            Self::Collaboration => "roles and people they regularly work with",
            Self::SuccessMeasurement => "how they measure success in their work",
            Self::OperationalDecisions => "whether they mainly make operational decisions (yes/no)",
            Self::TechnicalResponsibility => "whether they are responsible for technical systems or software (yes/no)",
            Self::ProjectLeadership => "whether they lead projects or teams (yes/no)",
        }
    }

    /// Canned wording used when no generated text is available.
    pub fn canned_text(&self) -> &'static str {
        match self {
            Self::RoleFunction => "Welche Rolle bzw. Funktion haben Sie in Ihrem Unternehmen?",
            Self::TasksResponsibility => "Welche Aufgaben gehören zu Ihrem Verantwortungsbereich?",
            Self::ProcessGoals => "Welche Ziele möchten Sie in diesem Prozess erreichen?",
            Self::ProblemsChallenges => {
                "Welche Probleme oder Herausforderungen treten typischerweise bei Ihrer Arbeit auf?"
            }
            Self::Collaboration => "Mit welchen Rollen oder Personen arbeiten Sie regelmäßig zusammen?",
            Self::SuccessMeasurement => "Woran messen Sie Erfolg in diesem Prozess?",
            Self::OperationalDecisions => "Treffen Sie hauptsächlich operative Entscheidungen?",
            Self::TechnicalResponsibility => "Sind Sie verantwortlich für technische Systeme oder Software?",
            Self::ProjectLeadership => "Leiten Sie Projekte oder Teams?",
        }
    }

    /// The question for this slot with the given wording.
    pub fn question(&self, text: impl Into<String>) -> Question {
        let question = Question::new(self.question_id(), text, self.question_type());
        if self.question_type() == QuestionType::Choice {
            question.with_options(YES_NO_OPTIONS)
        } else {
            question
        }
    }

    pub fn canned_question(&self) -> Question {
        self.question(self.canned_text())
    }
}

/// True for answers meaning "yes" ("Ja", "yes", "j", "y").
pub fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "ja" | "j" | "yes" | "y")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schedule_has_nine_unique_ids() {
        let mut ids: Vec<_> = IntakeTopic::SCHEDULE.iter().map(|t| t.question_id()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), INTAKE_QUESTION_COUNT);
    }

    #[test]
    fn first_six_are_open_and_last_three_are_yes_no() {
        for (slot, topic) in IntakeTopic::SCHEDULE.iter().enumerate() {
            let question = topic.canned_question();
            if slot < 6 {
                assert_eq!(question.question_type, QuestionType::Text, "slot {}", slot + 1);
                assert!(question.options.is_empty());
            } else {
                assert_eq!(question.question_type, QuestionType::Choice, "slot {}", slot + 1);
                assert_eq!(question.options, vec!["Ja", "Nein"]);
            }
        }
    }

    #[test]
    fn discriminators_point_at_each_role_once() {
        let roles: Vec<_> = IntakeTopic::SCHEDULE
            .iter()
            .filter_map(|t| t.signals_role())
            .collect();
        assert_eq!(roles, vec![Role::Business, Role::It, Role::Management]);
    }

    #[test]
    fn slot_lookup() {
        assert_eq!(IntakeTopic::at(0), Some(IntakeTopic::RoleFunction));
        assert_eq!(IntakeTopic::at(8), Some(IntakeTopic::ProjectLeadership));
        assert_eq!(IntakeTopic::at(9), None);
    }

    #[test]
    fn generated_wording_keeps_slot_identity() {
        let q = IntakeTopic::TechnicalResponsibility.question("Do you own any software systems?");
        assert_eq!(q.id, "technical_responsibility");
        assert_eq!(q.options, vec!["Ja", "Nein"]);
    }

    #[test]
    fn affirmative_answers() {
        assert!(is_affirmative(" Ja "));
        assert!(is_affirmative("yes"));
        assert!(!is_affirmative("Nein"));
        assert!(!is_affirmative("jain"));
    }
}
