//! Registration form validation.
//!
//! Validation is a pure function of a [`FormValues`] snapshot and the
//! current time. Every rule runs, so the report lists all violations in
//! field order rather than stopping at the first one.

use std::sync::LazyLock;

use air_config::FormConfig;
use air_storage::{Contribution, Registration};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use regex::Regex;

use crate::schema::{FieldRef, FormValues};

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("invalid email regex"));

const MODE_VOLUNTEER: &str = "voluntario";
const MODE_DONOR: &str = "doador";

/// A failed rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub field: FieldRef,
    pub message: String,
}

impl Violation {
    fn new(field: FieldRef, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Normalized form data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData {
    pub name: String,
    pub email: String,
    pub contact: String,
    pub birth_date: String,
    pub region: String,
    /// Set when the mode and its detail are complete.
    pub contribution: Option<Contribution>,
}

/// Outcome of validating a form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    pub violations: Vec<Violation>,
    pub data: FormData,
}

impl ValidationReport {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    /// The registration if validation passed, the violations otherwise.
    pub fn into_registration(self) -> Result<Registration, Vec<Violation>> {
        let data = self.data;
        match data.contribution {
            Some(contribution) if self.violations.is_empty() => Ok(Registration {
                name: data.name,
                email: data.email,
                contact: data.contact,
                birth_date: data.birth_date,
                region: data.region,
                contribution,
            }),
            _ => Err(self.violations),
        }
    }
}

/// Registration form rules.
#[derive(Debug, Clone)]
pub struct Validator {
    min_name_len: usize,
    min_phone_digits: usize,
    min_age: u32,
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(&FormConfig::default())
    }
}

impl Validator {
    #[must_use]
    pub fn new(config: &FormConfig) -> Self {
        Self {
            min_name_len: config.min_name_len,
            min_phone_digits: config.min_phone_digits,
            min_age: config.min_age,
        }
    }

    /// Check `values` against every rule.
    #[must_use]
    pub fn validate(&self, values: &FormValues, now: DateTime<Utc>) -> ValidationReport {
        let mut violations = Vec::new();

        let name = values.name.trim();
        if name.chars().count() < self.min_name_len {
            violations.push(Violation::new(
                FieldRef::Name,
                format!(
                    "Nome inválido. Informe pelo menos {} caracteres.",
                    self.min_name_len
                ),
            ));
        }

        let email = values.email.trim();
        if !EMAIL.is_match(email) {
            violations.push(Violation::new(FieldRef::Email, "E-mail inválido."));
        }

        let contact = values.contact.trim();
        let digits = contact.chars().filter(char::is_ascii_digit).count();
        if contact.is_empty() || digits < self.min_phone_digits {
            violations.push(Violation::new(
                FieldRef::Contact,
                "Telefone inválido. Use DDD + número.",
            ));
        }

        let birth_date = values.birth_date.trim();
        if birth_date.is_empty() {
            violations.push(Violation::new(
                FieldRef::BirthDate,
                "Informe a data de nascimento.",
            ));
        } else {
            match parse_birth_date(birth_date) {
                None => violations.push(Violation::new(
                    FieldRef::BirthDate,
                    "Data de nascimento inválida.",
                )),
                Some(dob) if age_in_years(dob, now) < self.min_age => {
                    violations.push(Violation::new(
                        FieldRef::BirthDate,
                        format!("Idade mínima {} anos.", self.min_age),
                    ));
                }
                Some(_) => {}
            }
        }

        let region = values.region.trim();
        if region.is_empty() {
            violations.push(Violation::new(FieldRef::Region, "Selecione a UF."));
        }

        let contribution = match values.mode.trim() {
            MODE_VOLUNTEER if values.areas.is_empty() => {
                violations.push(Violation::new(
                    FieldRef::VolunteerAreas,
                    "Escolha ao menos uma área de atuação.",
                ));
                None
            }
            MODE_VOLUNTEER => Some(Contribution::Volunteer {
                areas: values.areas.clone(),
            }),
            MODE_DONOR => match &values.donation_method {
                Some(method) => Some(Contribution::Donor {
                    method: method.clone(),
                }),
                None => {
                    violations.push(Violation::new(
                        FieldRef::DonationMethod,
                        "Escolha uma forma de doação.",
                    ));
                    None
                }
            },
            _ => {
                violations.push(Violation::new(
                    FieldRef::Mode,
                    "Escolha a forma de contribuição.",
                ));
                None
            }
        };

        ValidationReport {
            violations,
            data: FormData {
                name: name.to_owned(),
                email: email.to_owned(),
                contact: contact.to_owned(),
                birth_date: birth_date.to_owned(),
                region: region.to_owned(),
                contribution,
            },
        }
    }
}

/// Parse a date input value (`YYYY-MM-DD`, read as UTC midnight) or an
/// RFC 3339 timestamp.
fn parse_birth_date(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(date.and_hms_opt(0, 0, 0)?.and_utc());
    }
    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Whole years between `dob` and `now`.
///
/// Computed as the calendar year of the elapsed interval taken as an
/// offset from the Unix epoch, so a birth date in the future also yields a
/// positive age.
#[must_use]
pub fn age_in_years(dob: DateTime<Utc>, now: DateTime<Utc>) -> u32 {
    let elapsed = now.timestamp_millis() - dob.timestamp_millis();
    DateTime::<Utc>::from_timestamp_millis(elapsed)
        .map_or(0, |offset| (offset.year() - 1970).unsigned_abs())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn valid_volunteer() -> FormValues {
        FormValues {
            name: "  Maria Silva ".to_owned(),
            email: "maria@example.com".to_owned(),
            contact: "(11) 98765-4321".to_owned(),
            birth_date: "2000-05-20".to_owned(),
            region: "SP".to_owned(),
            mode: "voluntario".to_owned(),
            areas: vec!["educacao".to_owned()],
            donation_method: None,
        }
    }

    fn fields(report: &ValidationReport) -> Vec<FieldRef> {
        report.violations.iter().map(|v| v.field).collect()
    }

    #[test]
    fn test_valid_volunteer_builds_registration() {
        let report = Validator::default().validate(&valid_volunteer(), now());
        assert!(report.is_valid());
        let registration = report.into_registration().unwrap();
        assert_eq!(registration.name, "Maria Silva");
        assert_eq!(
            registration.contribution,
            Contribution::Volunteer {
                areas: vec!["educacao".to_owned()]
            }
        );
    }

    #[test]
    fn test_valid_donor() {
        let values = FormValues {
            mode: "doador".to_owned(),
            areas: vec![],
            donation_method: Some("pix".to_owned()),
            ..valid_volunteer()
        };
        let report = Validator::default().validate(&values, now());
        assert_eq!(report.violations, vec![]);
        assert_eq!(
            report.data.contribution,
            Some(Contribution::Donor {
                method: "pix".to_owned()
            })
        );
    }

    #[test]
    fn test_empty_form_reports_all_fields_in_order() {
        let report = Validator::default().validate(&FormValues::default(), now());
        assert_eq!(
            fields(&report),
            vec![
                FieldRef::Name,
                FieldRef::Email,
                FieldRef::Contact,
                FieldRef::BirthDate,
                FieldRef::Region,
                FieldRef::Mode,
            ]
        );
        assert_eq!(report.violations[3].message, "Informe a data de nascimento.");
        assert_eq!(report.into_registration().unwrap_err().len(), 6);
    }

    #[test]
    fn test_name_length_counts_characters() {
        let validator = Validator::default();
        let ok = FormValues {
            name: " Zé ".to_owned(),
            ..valid_volunteer()
        };
        assert_eq!(fields(&validator.validate(&ok, now())), vec![FieldRef::Name]);

        let ok = FormValues {
            name: "Zoé".to_owned(),
            ..valid_volunteer()
        };
        assert!(validator.validate(&ok, now()).is_valid());
    }

    #[test]
    fn test_name_message() {
        let values = FormValues {
            name: "ab".to_owned(),
            ..valid_volunteer()
        };
        let report = Validator::default().validate(&values, now());
        assert_eq!(
            report.violations[0].message,
            "Nome inválido. Informe pelo menos 3 caracteres."
        );
    }

    #[test]
    fn test_email_rules() {
        let validator = Validator::default();
        for (email, valid) in [
            ("a@b.co", true),
            (" a@b.co ", true),
            ("a@b", false),
            ("a b@c.d", false),
            ("@b.co", false),
        ] {
            let values = FormValues {
                email: email.to_owned(),
                ..valid_volunteer()
            };
            assert_eq!(validator.validate(&values, now()).is_valid(), valid, "{email}");
        }
    }

    #[test]
    fn test_phone_digit_count() {
        let validator = Validator::default();
        let short = FormValues {
            contact: "(11) 9876-543".to_owned(),
            ..valid_volunteer()
        };
        let report = validator.validate(&short, now());
        assert_eq!(report.violations[0].message, "Telefone inválido. Use DDD + número.");

        let exact = FormValues {
            contact: "11-3456-7890".to_owned(),
            ..valid_volunteer()
        };
        assert!(validator.validate(&exact, now()).is_valid());
    }

    #[test]
    fn test_invalid_birth_date() {
        let values = FormValues {
            birth_date: "20/05/2000".to_owned(),
            ..valid_volunteer()
        };
        let report = Validator::default().validate(&values, now());
        assert_eq!(report.violations[0].message, "Data de nascimento inválida.");
    }

    #[test]
    fn test_minimum_age() {
        let validator = Validator::default();
        let young = FormValues {
            birth_date: "2020-01-01".to_owned(),
            ..valid_volunteer()
        };
        let report = validator.validate(&young, now());
        assert_eq!(fields(&report), vec![FieldRef::BirthDate]);
        assert_eq!(report.violations[0].message, "Idade mínima 6 anos.");

        let old_enough = FormValues {
            birth_date: "2018-05-31".to_owned(),
            ..valid_volunteer()
        };
        assert!(validator.validate(&old_enough, now()).is_valid());
    }

    #[test]
    fn test_each_rejected_input_reports_only_its_field() {
        let base = valid_volunteer();
        let cases = [
            (
                FormValues { name: "Al".to_owned(), ..base.clone() },
                FieldRef::Name,
                "Nome inválido. Informe pelo menos 3 caracteres.",
            ),
            (
                FormValues { email: "bad@".to_owned(), ..base.clone() },
                FieldRef::Email,
                "E-mail inválido.",
            ),
            (
                FormValues { contact: "12345".to_owned(), ..base.clone() },
                FieldRef::Contact,
                "Telefone inválido. Use DDD + número.",
            ),
            (
                FormValues { birth_date: "2019-01-01".to_owned(), ..base.clone() },
                FieldRef::BirthDate,
                "Idade mínima 6 anos.",
            ),
            (
                FormValues { region: String::new(), ..base.clone() },
                FieldRef::Region,
                "Selecione a UF.",
            ),
            (
                FormValues { mode: String::new(), areas: vec![], ..base.clone() },
                FieldRef::Mode,
                "Escolha a forma de contribuição.",
            ),
        ];

        for (values, field, message) in cases {
            let report = Validator::default().validate(&values, now());
            assert_eq!(fields(&report), vec![field], "{values:?}");
            assert_eq!(report.violations[0].message, message);
        }
    }

    #[test]
    fn test_age_in_years() {
        let dob = Utc.with_ymd_and_hms(2000, 5, 20, 0, 0, 0).unwrap();
        assert_eq!(age_in_years(dob, now()), 24);
        let dob = Utc.with_ymd_and_hms(2000, 6, 2, 0, 0, 0).unwrap();
        assert_eq!(age_in_years(dob, now()), 23);
        // A future date lands before the epoch: |1969 - 1970|.
        let dob = Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap();
        assert_eq!(age_in_years(dob, now()), 1);
    }

    #[test]
    fn test_rfc3339_birth_date() {
        let values = FormValues {
            birth_date: "2000-05-20T10:00:00-03:00".to_owned(),
            ..valid_volunteer()
        };
        assert!(Validator::default().validate(&values, now()).is_valid());
    }

    #[test]
    fn test_volunteer_without_areas() {
        let values = FormValues {
            areas: vec![],
            ..valid_volunteer()
        };
        let report = Validator::default().validate(&values, now());
        assert_eq!(
            report.violations,
            vec![Violation::new(
                FieldRef::VolunteerAreas,
                "Escolha ao menos uma área de atuação."
            )]
        );
    }

    #[test]
    fn test_donor_without_method() {
        let values = FormValues {
            mode: "doador".to_owned(),
            ..valid_volunteer()
        };
        let report = Validator::default().validate(&values, now());
        assert_eq!(fields(&report), vec![FieldRef::DonationMethod]);
        assert_eq!(report.violations[0].message, "Escolha uma forma de doação.");
    }

    #[test]
    fn test_unknown_mode_is_empty() {
        let values = FormValues {
            mode: "outro".to_owned(),
            ..valid_volunteer()
        };
        let report = Validator::default().validate(&values, now());
        assert_eq!(fields(&report), vec![FieldRef::Mode]);
    }

    #[test]
    fn test_configured_limits() {
        let config = FormConfig {
            min_name_len: 5,
            min_age: 18,
            ..FormConfig::default()
        };
        let values = FormValues {
            name: "Ana".to_owned(),
            birth_date: "2010-01-01".to_owned(),
            ..valid_volunteer()
        };
        let report = Validator::new(&config).validate(&values, now());
        assert_eq!(
            report
                .violations
                .iter()
                .map(|v| v.message.as_str())
                .collect::<Vec<_>>(),
            vec![
                "Nome inválido. Informe pelo menos 5 caracteres.",
                "Idade mínima 18 anos."
            ]
        );
    }
}
