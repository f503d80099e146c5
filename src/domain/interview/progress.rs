//! Progress and completion of the role-specific phase.

use serde::{Deserialize, Serialize};
use std::fmt::Write;

use super::schema::{FieldRef, RoleSchema};
use super::FilledFields;

const BAR_WIDTH: usize = 20;
const MISSING_SHOWN: usize = 5;

/// Progress of one theme.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThemeProgress {
    pub theme_id: String,
    pub name: String,
    pub total: usize,
    pub filled: usize,
    pub required: usize,
    pub required_filled: usize,
    pub progress_percent: f64,
}

/// Snapshot of how far an interview has come for its role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressReport {
    pub total_fields: usize,
    pub total_required: usize,
    pub filled_fields: usize,
    pub filled_required: usize,
    pub progress_percent: f64,
    /// Unfilled required fields, unconditional ones first.
    pub missing_required: Vec<String>,
    pub themes: Vec<ThemeProgress>,
    pub is_complete: bool,
}

#[derive(Default)]
struct Tally {
    total: usize,
    filled: usize,
    required: usize,
    required_filled: usize,
}

impl Tally {
    fn count<'a>(fields: impl Iterator<Item = FieldRef<'a>>, filled: &FilledFields) -> Self {
        let mut tally = Tally::default();
        for field in fields {
            let is_filled = filled.is_filled(field.field_id());
            tally.total += 1;
            tally.filled += usize::from(is_filled);
            if field.definition.is_required_now(filled) {
                tally.required += 1;
                tally.required_filled += usize::from(is_filled);
            }
        }
        tally
    }
}

/// Computes progress from scratch. Conditions are re-evaluated on every call.
pub fn calculate_progress(schema: &RoleSchema, filled: &FilledFields) -> ProgressReport {
    let overall = Tally::count(schema.fields(), filled);

    let missing_required: Vec<String> = unfilled_required(schema, filled, true)
        .chain(unfilled_required(schema, filled, false))
        .collect();

    let themes: Vec<ThemeProgress> = schema
        .themes
        .iter()
        .map(|theme| {
            let tally = Tally::count(
                theme.fields.iter().map(|definition| FieldRef {
                    theme_id: &theme.id,
                    theme_name: &theme.name,
                    definition,
                }),
                filled,
            );
            ThemeProgress {
                theme_id: theme.id.clone(),
                name: theme.name.clone(),
                total: tally.total,
                filled: tally.filled,
                required: tally.required,
                required_filled: tally.required_filled,
                progress_percent: percent(tally.required_filled, tally.required),
            }
        })
        .collect();

    let criteria = &schema.completion_criteria;
    let required_themes_covered = criteria.required_themes.iter().all(|theme_id| {
        themes
            .iter()
            .any(|t| &t.theme_id == theme_id && t.required_filled > 0)
    });
    let is_complete = overall.required_filled >= criteria.minimum_required_fields
        && missing_required.is_empty()
        && required_themes_covered;

    ProgressReport {
        total_fields: overall.total,
        total_required: overall.required,
        filled_fields: overall.filled,
        filled_required: overall.required_filled,
        progress_percent: percent(overall.required_filled, overall.required),
        missing_required,
        themes,
        is_complete,
    }
}

fn unfilled_required<'a>(
    schema: &'a RoleSchema,
    filled: &'a FilledFields,
    unconditional: bool,
) -> impl Iterator<Item = String> + 'a {
    schema
        .fields()
        .filter(move |f| f.definition.is_unconditionally_required() == unconditional)
        .filter(move |f| f.definition.is_required_now(filled) && !filled.is_filled(f.field_id()))
        .map(|f| f.field_id().to_string())
}

/// Share of `part` in `total` as a percentage with one decimal; 100 for an empty total.
fn percent(part: usize, total: usize) -> f64 {
    if total == 0 {
        return 100.0;
    }
    (part as f64 / total as f64 * 1000.0).round() / 10.0
}

/// Renders a report as a text block for terminal output.
pub fn render_progress(report: &ProgressReport, role_name: &str) -> String {
    let cells = ((report.progress_percent / 5.0).floor() as usize).min(BAR_WIDTH);
    let mut out = String::new();

    let _ = writeln!(out, "Interview progress: {}", role_name);
    let _ = writeln!(
        out,
        "[{}{}] {:.1}%",
        "█".repeat(cells),
        "░".repeat(BAR_WIDTH - cells),
        report.progress_percent
    );
    let _ = writeln!(
        out,
        "Required fields: {}/{} (all fields: {}/{})",
        report.filled_required, report.total_required, report.filled_fields, report.total_fields
    );

    if !report.themes.is_empty() {
        let _ = writeln!(out, "\nThemes:");
        for theme in &report.themes {
            let mark = if theme.required_filled >= theme.required { '✓' } else { '○' };
            let _ = writeln!(
                out,
                "  {} {}: {}/{}",
                mark, theme.name, theme.required_filled, theme.required
            );
        }
    }

    if !report.missing_required.is_empty() {
        let shown: Vec<&str> = report
            .missing_required
            .iter()
            .take(MISSING_SHOWN)
            .map(String::as_str)
            .collect();
        let _ = write!(out, "\nMissing required fields: {}", shown.join(", "));
        if report.missing_required.len() > MISSING_SHOWN {
            let _ = write!(out, " and {} more", report.missing_required.len() - MISSING_SHOWN);
        }
        out.push('\n');
    }

    if report.is_complete {
        let _ = writeln!(out, "\nInterview for role '{}' complete.", role_name);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::interview::schema::fixtures::it_schema;
    use crate::domain::interview::FieldValue;
    use proptest::prelude::*;

    fn filled(entries: &[(&str, &str)]) -> FilledFields {
        entries
            .iter()
            .map(|(k, v)| (*k, FieldValue::scalar(*v)))
            .collect()
    }

    fn two_field_schema() -> RoleSchema {
        RoleSchema::from_yaml(
            r#"
role: it
role_name: IT
completion_criteria: {minimum_required_fields: 2}
themes:
  - id: main
    name: Main
    fields:
      - {id: a, question: "A?", required: true}
      - {id: b, question: "B?", required: true, conditional: "a == 'x'"}
"#,
            "two-field",
        )
        .unwrap()
    }

    mod totals {
        use super::*;

        #[test]
        fn empty_answers_report_everything_missing() {
            let report = calculate_progress(&it_schema(), &FilledFields::new());
            assert_eq!(report.total_fields, 5);
            assert_eq!(report.total_required, 3);
            assert_eq!(report.filled_required, 0);
            assert_eq!(report.progress_percent, 0.0);
            assert_eq!(
                report.missing_required,
                vec!["involved_systems", "team_size", "access_model"]
            );
            assert!(!report.is_complete);
        }

        #[test]
        fn percent_is_rounded_to_one_decimal() {
            let report = calculate_progress(&it_schema(), &filled(&[("involved_systems", "SAP")]));
            assert_eq!(report.progress_percent, 33.3);
        }

        #[test]
        fn optional_fields_count_as_filled_but_not_required() {
            let report = calculate_progress(&it_schema(), &filled(&[("favourite_tool", "vim")]));
            assert_eq!(report.filled_fields, 1);
            assert_eq!(report.filled_required, 0);
        }

        #[test]
        fn values_outside_the_schema_are_ignored() {
            let report = calculate_progress(&it_schema(), &filled(&[("unrelated", "x")]));
            assert_eq!(report.filled_fields, 0);
        }

        #[test]
        fn schema_without_required_fields_is_at_hundred_percent() {
            let schema = RoleSchema::from_yaml(
                "role: it\nrole_name: IT\nthemes:\n  - {id: t, name: T, fields: [{id: a, question: 'A?'}]}\n",
                "optional-only",
            )
            .unwrap();
            let report = calculate_progress(&schema, &FilledFields::new());
            assert_eq!(report.progress_percent, 100.0);
            assert!(report.is_complete);
        }
    }

    mod conditional_fields {
        use super::*;

        #[test]
        fn count_threshold_activates_field() {
            let schema = it_schema();
            let below = calculate_progress(&schema, &filled(&[("team_size", "2")]));
            assert!(!below.missing_required.contains(&"escalation_process".to_string()));

            let absent = calculate_progress(&schema, &FilledFields::new());
            assert!(!absent.missing_required.contains(&"escalation_process".to_string()));

            let at = calculate_progress(&schema, &filled(&[("team_size", "3")]));
            assert!(at.missing_required.contains(&"escalation_process".to_string()));
            assert_eq!(at.total_required, 4);
        }

        #[test]
        fn activated_field_moves_progress_from_half_to_full() {
            let schema = two_field_schema();

            let step1 = calculate_progress(&schema, &filled(&[("a", "x")]));
            assert_eq!((step1.filled_required, step1.total_required), (1, 2));
            assert_eq!(step1.progress_percent, 50.0);
            assert_eq!(step1.missing_required, vec!["b"]);
            assert!(!step1.is_complete);

            let step2 = calculate_progress(&schema, &filled(&[("a", "x"), ("b", "done")]));
            assert_eq!((step2.filled_required, step2.total_required), (2, 2));
            assert_eq!(step2.progress_percent, 100.0);
            assert!(step2.is_complete);
        }

        #[test]
        fn inactive_field_does_not_block_but_minimum_does() {
            let schema = two_field_schema();
            let report = calculate_progress(&schema, &filled(&[("a", "y")]));
            assert!(report.missing_required.is_empty());
            assert_eq!(report.progress_percent, 100.0);
            assert!(!report.is_complete, "minimum of two required fields not reached");
        }

        #[test]
        fn changing_the_trigger_is_picked_up_immediately() {
            let schema = two_field_schema();
            let mut fields = filled(&[("a", "x")]);
            assert_eq!(calculate_progress(&schema, &fields).total_required, 2);
            fields.insert("a", FieldValue::scalar("y"));
            assert_eq!(calculate_progress(&schema, &fields).total_required, 1);
        }
    }

    mod completion {
        use super::*;

        #[test]
        fn required_theme_needs_a_filled_required_field() {
            let mut schema = it_schema();
            schema.completion_criteria.minimum_required_fields = 1;
            schema.completion_criteria.required_themes = vec!["security".to_string()];
            schema.themes[1].fields[0].required = false;

            let report = calculate_progress(
                &schema,
                &filled(&[("involved_systems", "SAP"), ("team_size", "1"), ("access_model", "Roles")]),
            );
            assert!(report.missing_required.is_empty());
            assert!(!report.is_complete, "security has no required field to fill");
        }

        #[test]
        fn all_required_filled_completes() {
            let report = calculate_progress(
                &it_schema(),
                &filled(&[("involved_systems", "SAP"), ("team_size", "2"), ("access_model", "Roles")]),
            );
            assert!(report.is_complete);
            assert_eq!(report.themes[0].progress_percent, 100.0);
            assert_eq!(report.themes[1].required_filled, 1);
        }

        #[test]
        fn first_missing_field_is_the_next_one_asked() {
            let schema = it_schema();
            let fields = filled(&[("involved_systems", "SAP"), ("team_size", "4"), ("access_model", "Roles")]);
            let report = calculate_progress(&schema, &fields);
            let next = schema.next_unfilled_field(&fields).unwrap();
            assert_eq!(report.missing_required.first().map(String::as_str), Some(next.field_id()));
        }
    }

    mod display {
        use super::*;

        #[test]
        fn renders_bar_and_missing_fields() {
            let report = calculate_progress(&it_schema(), &filled(&[("involved_systems", "SAP")]));
            let text = render_progress(&report, "IT");
            assert!(text.contains("Interview progress: IT"));
            assert!(text.contains("[██████░░░░░░░░░░░░░░] 33.3%"));
            assert!(text.contains("Required fields: 1/3"));
            assert!(text.contains("Missing required fields: team_size, access_model"));
            assert!(!text.contains("complete."));
        }

        #[test]
        fn renders_completion_line() {
            let report = calculate_progress(
                &it_schema(),
                &filled(&[("involved_systems", "SAP"), ("team_size", "2"), ("access_model", "Roles")]),
            );
            let text = render_progress(&report, "IT");
            assert!(text.contains("[████████████████████] 100.0%"));
            assert!(text.contains("Interview for role 'IT' complete."));
        }
    }

    fn arb_filled() -> impl Strategy<Value = FilledFields> {
        let keys = prop::sample::select(vec![
            "involved_systems",
            "team_size",
            "escalation_process",
            "favourite_tool",
            "access_model",
            "unrelated",
        ]);
        let values = prop_oneof![
            Just(String::new()),
            "[0-9]{1,2}",
            "[a-z ]{1,8}",
        ];
        prop::collection::vec((keys, values), 0..8).prop_map(|entries| {
            entries
                .into_iter()
                .map(|(k, v)| (k, FieldValue::Scalar(v)))
                .collect()
        })
    }

    proptest! {
        #[test]
        fn progress_is_idempotent(fields in arb_filled()) {
            let schema = it_schema();
            prop_assert_eq!(calculate_progress(&schema, &fields), calculate_progress(&schema, &fields));
        }

        #[test]
        fn percent_stays_in_bounds_and_completion_implies_nothing_missing(fields in arb_filled()) {
            let report = calculate_progress(&it_schema(), &fields);
            prop_assert!((0.0..=100.0).contains(&report.progress_percent));
            prop_assert!(report.filled_required <= report.total_required);
            if report.is_complete {
                prop_assert!(report.missing_required.is_empty());
            }
        }
    }
}
