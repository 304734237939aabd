use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};

use crate::coerce::{parse_number, to_float};
use crate::error::ReportError;
use crate::model::{FieldRecord, FieldSource, FieldValue};
use crate::template::{Capture, Rule, Template};

#[derive(Debug)]
struct CompiledRule {
    rule: &'static Rule,
    regex: Option<Regex>,
}

/// A template's rules with their patterns compiled.
#[derive(Debug)]
pub struct RuleSet {
    rules: Vec<CompiledRule>,
}

static BUILTIN: LazyLock<[RuleSet; 3]> = LazyLock::new(|| {
    Template::ALL.map(|template| {
        RuleSet::new(template.rules(), template.spans_lines())
            .expect("built-in field patterns are valid")
    })
});

impl RuleSet {
    /// Compiles `rules`. Captures match case-insensitively; counts are
    /// case-sensitive so `SHAKER n` headings are not taken for screens.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Pattern`] if any pattern fails to compile.
    pub fn new(rules: &'static [Rule], spans_lines: bool) -> Result<Self, ReportError> {
        let rules = rules
            .iter()
            .map(|rule| {
                let regex = rule
                    .capture
                    .pattern()
                    .map(|pattern| {
                        RegexBuilder::new(pattern)
                            .case_insensitive(!matches!(rule.capture, Capture::Count(_)))
                            .dot_matches_new_line(spans_lines)
                            .build()
                    })
                    .transpose()?;
                Ok::<_, ReportError>(CompiledRule { rule, regex })
            })
            .collect::<Result<Vec<_>, ReportError>>()?;
        Ok(Self { rules })
    }

    #[must_use]
    pub fn builtin(template: Template) -> &'static Self {
        &BUILTIN[template.index()]
    }

    #[must_use]
    pub fn extract(&self, text: &str) -> FieldRecord {
        let mut record = FieldRecord::default();
        for compiled in &self.rules {
            apply_rule(compiled, text, &mut record);
        }
        record
    }
}

fn first_capture(regex: &Regex, text: &str) -> Option<String> {
    regex
        .captures(text)
        .and_then(|capture| capture.get(1))
        .map(|value| value.as_str().trim().to_string())
}

fn apply_rule(compiled: &CompiledRule, text: &str, record: &mut FieldRecord) {
    let rule = compiled.rule;
    if let Capture::Sum(left, right) = rule.capture {
        let total = sum_fields(record, left, right);
        record.insert(rule.field, total);
        return;
    }
    let Some(regex) = compiled.regex.as_ref() else {
        return;
    };

    match rule.capture {
        Capture::First(_) => {
            let value = match first_capture(regex, text) {
                Some(value) => FieldValue::new(value, FieldSource::Matched),
                None => FieldValue::new(rule.default, FieldSource::Defaulted),
            };
            record.insert(rule.field, value);
        }
        Capture::Slots { fields, .. } => {
            let mut matches = regex
                .captures_iter(text)
                .filter_map(|capture| capture.get(1))
                .map(|value| value.as_str().trim().to_string());
            for field in fields {
                let value = match matches.next() {
                    Some(value) => FieldValue::new(value, FieldSource::Matched),
                    None => FieldValue::new(rule.default, FieldSource::Defaulted),
                };
                record.insert(*field, value);
            }
        }
        Capture::Count(_) => {
            let count = regex.find_iter(text).count();
            record.insert(
                rule.field,
                FieldValue::new(count.to_string(), FieldSource::Counted),
            );
        }
        Capture::Sum(..) => {}
    }
}

fn sum_fields(record: &FieldRecord, left: &str, right: &str) -> FieldValue {
    let parts = [left, right].map(|name| record.get(name));
    let total = parts
        .iter()
        .flatten()
        .map(|field| to_float(&field.value))
        .sum::<f64>();
    let any_found = parts.iter().flatten().any(|field| {
        !field.is_defaulted() && parse_number(&field.value).is_some()
    });
    let source = if any_found {
        FieldSource::Composite
    } else {
        FieldSource::Defaulted
    };
    FieldValue::new(total.to_string(), source)
}

/// Recovers the template's fields from one report's text.
#[must_use]
pub fn extract(template: Template, text: &str) -> FieldRecord {
    RuleSet::builtin(template).extract(text)
}

#[cfg(test)]
mod tests {
    use super::{RuleSet, extract};
    use crate::model::FieldSource;
    use crate::template::{Template, fields};

    const BAKU_SAMPLE: &str = "\
BAKU STATE DAILY MUD REPORT
Well Name: GUN-204 Field: Absheron
Report #17 03/14/24
MUD WT 10.2 ppg
PV = 12 cP  YP = 8 lb/100ft2
Flowline Temperature (max) 128 °F
PUMP #1 310 gpm
PUMP #2 295.5 gpm
Screens API 140 ppb
Shaker 1  Shaker 2  Shaker 3
";

    #[test]
    fn builtin_rule_sets_compile() {
        for template in Template::ALL {
            let record = RuleSet::builtin(template).extract("");
            assert_eq!(record.len(), template.field_names().len());
        }
    }

    #[test]
    fn missing_fields_take_their_default() {
        let record = extract(Template::ShakerScreen, "nothing useful here");
        assert_eq!(record.value(fields::YP), Some("0"));
        assert_eq!(record.value(fields::WELL_NAME), Some("0"));
        assert!(record.get(fields::YP).is_some_and(|field| field.is_defaulted()));
        assert_eq!(record.value(fields::SCREEN_COUNT), Some("0"));
    }

    #[test]
    fn extracts_baku_report_fields() {
        let record = extract(Template::ShakerScreen, BAKU_SAMPLE);
        assert_eq!(record.value(fields::WELL_NAME), Some("GUN-204"));
        assert_eq!(record.value(fields::DATE), Some("03/14/24"));
        assert_eq!(record.value(fields::MUD_WEIGHT), Some("10.2"));
        assert_eq!(record.value(fields::PV), Some("12"));
        assert_eq!(record.value(fields::YP), Some("8"));
        assert_eq!(record.value(fields::AVE_TEMP), Some("128"));
        assert_eq!(record.value(fields::API_SCREEN), Some("140"));
        assert_eq!(record.value(fields::SCREEN_COUNT), Some("3"));
    }

    #[test]
    fn pump_readings_fill_slots_in_order() {
        let record = extract(Template::ShakerScreen, BAKU_SAMPLE);
        assert_eq!(record.value(fields::PUMP_1_GPM), Some("310"));
        assert_eq!(record.value(fields::PUMP_2_GPM), Some("295.5"));
        assert_eq!(record.value(fields::PUMP_3_GPM), Some("0"));
        assert_eq!(
            record.get(fields::PUMP_3_GPM).map(|field| field.source),
            Some(FieldSource::Defaulted)
        );
    }

    #[test]
    fn screen_count_is_case_sensitive() {
        let record = extract(Template::ShakerScreen, "SHAKER 1 SHAKER 2\nShaker 3\n");
        assert_eq!(record.value(fields::SCREEN_COUNT), Some("1"));
    }

    #[test]
    fn matching_ignores_case() {
        let record = extract(Template::ShakerScreen, "mud wt 9.8\npv=14\n");
        assert_eq!(record.value(fields::MUD_WEIGHT), Some("9.8"));
        assert_eq!(record.value(fields::PV), Some("14"));
    }

    #[test]
    fn solids_control_total_circulation_is_summed_eagerly() {
        let text = "\
Well: BHZ-12   Rig: R-7
Date: 05/02/2024
Active Volume: 850
Reserve Volume: 400.5
SCE Loss: 42
";
        let record = extract(Template::SolidsControl, text);
        assert_eq!(record.value(fields::WELL_NAME), Some("BHZ-12"));
        assert_eq!(record.value(fields::RIG), Some("R-7"));
        assert_eq!(record.value(fields::DATE), Some("05/02/2024"));
        assert_eq!(record.value(fields::TOTAL_CIRCULATION), Some("1250.5"));
        assert_eq!(
            record.get(fields::TOTAL_CIRCULATION).map(|field| field.source),
            Some(FieldSource::Composite)
        );
        assert_eq!(record.value(fields::WATER_ADDED), Some("0"));
    }

    #[test]
    fn composite_of_missing_parts_is_defaulted_zero() {
        let record = extract(Template::SolidsControl, "SCE Loss: 12");
        assert_eq!(record.value(fields::TOTAL_CIRCULATION), Some("0"));
        assert!(
            record
                .get(fields::TOTAL_CIRCULATION)
                .is_some_and(|field| field.is_defaulted())
        );
    }

    #[test]
    fn daily_drilling_patterns_span_line_breaks() {
        let text = "\
Well Name
KP-33
Report Date (mm/dd/yyyy)
11/02/2024
Mud Weight (ppg)
10.4
Daily Footage (ft)
1,240
Rotating Hours
15.5
Hole Volume (bbl)
620
Pit Volume (bbl)
380
Losses to SCE (bbl)
35
";
        let record = extract(Template::DailyDrilling, text);
        assert_eq!(record.value(fields::WELL_NAME), Some("KP-33"));
        assert_eq!(record.value(fields::DATE), Some("11/02/2024"));
        assert_eq!(record.value(fields::MUD_WEIGHT), Some("10.4"));
        assert_eq!(record.value(fields::DEPTH_DRILLED), Some("1,240"));
        assert_eq!(record.value(fields::DRILLING_HOURS), Some("15.5"));
        assert_eq!(record.value(fields::TOTAL_CIRCULATION), Some("1000"));
        assert_eq!(record.value(fields::SCE_LOSS), Some("35"));
    }
}
