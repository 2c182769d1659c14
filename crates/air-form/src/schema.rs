//! Registration form schema.
//!
//! A [`FormSchema`] resolves every logical field of the registration form
//! to an element once, when the form is bound. Reading values and placing
//! validation messages then go through the schema instead of ad-hoc lookups.

use air_config::FormConfig;
use air_dom::{Dom, Selector};

/// Logical field of the registration form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldRef {
    Name,
    Email,
    Contact,
    BirthDate,
    Region,
    /// Contribution mode select.
    Mode,
    /// Volunteer areas section (group of checkboxes).
    VolunteerAreas,
    /// Donation method section (group of radios).
    DonationMethod,
}

impl FieldRef {
    pub const ALL: [Self; 8] = [
        Self::Name,
        Self::Email,
        Self::Contact,
        Self::BirthDate,
        Self::Region,
        Self::Mode,
        Self::VolunteerAreas,
        Self::DonationMethod,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Email => "email",
            Self::Contact => "contact",
            Self::BirthDate => "birth_date",
            Self::Region => "region",
            Self::Mode => "mode",
            Self::VolunteerAreas => "volunteer_areas",
            Self::DonationMethod => "donation_method",
        }
    }
}

/// Snapshot of the form controls' current values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormValues {
    pub name: String,
    pub email: String,
    pub contact: String,
    pub birth_date: String,
    pub region: String,
    pub mode: String,
    /// Values of the checked volunteer area checkboxes.
    pub areas: Vec<String>,
    /// Value of the checked donation method radio.
    pub donation_method: Option<String>,
}

/// Registration form with its fields resolved.
#[derive(Debug, Clone)]
pub struct FormSchema<N> {
    form: N,
    fields: Vec<(FieldRef, N)>,
}

impl<N: Clone + PartialEq> FormSchema<N> {
    /// Resolve the fields of `form`.
    ///
    /// Controls are looked up by `#id` first and `[name="id"]` second;
    /// sections by `#id` only. Missing fields are logged and read as empty.
    pub fn bind<D: Dom<Node = N>>(dom: &D, form: &N, config: &FormConfig) -> Self {
        let fields = &config.fields;
        let controls = [
            (FieldRef::Name, fields.name.as_str()),
            (FieldRef::Email, fields.email.as_str()),
            (FieldRef::Contact, fields.contact.as_str()),
            (FieldRef::BirthDate, fields.birth_date.as_str()),
            (FieldRef::Region, fields.region.as_str()),
            (FieldRef::Mode, fields.mode.as_str()),
        ];
        let sections = [
            (FieldRef::VolunteerAreas, config.volunteer_section.as_str()),
            (FieldRef::DonationMethod, config.donor_section.as_str()),
        ];

        let mut resolved = Vec::with_capacity(FieldRef::ALL.len());
        for (field, id) in controls {
            if let Some(node) = by_id(dom, form, id).or_else(|| by_name(dom, form, id)) {
                resolved.push((field, node));
            }
        }
        for (field, id) in sections {
            if let Some(node) = by_id(dom, form, id) {
                resolved.push((field, node));
            }
        }

        let schema = Self {
            form: form.clone(),
            fields: resolved,
        };
        let missing = schema.missing();
        if !missing.is_empty() {
            let missing: Vec<&str> = missing.iter().map(|f| f.as_str()).collect();
            tracing::warn!(?missing, "Registration form is missing fields");
        }
        schema
    }

    /// The form element.
    pub fn form(&self) -> &N {
        &self.form
    }

    /// Element bound to `field`, if the form has one.
    pub fn node(&self, field: FieldRef) -> Option<&N> {
        self.fields
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, node)| node)
    }

    /// Fields the form does not provide.
    #[must_use]
    pub fn missing(&self) -> Vec<FieldRef> {
        FieldRef::ALL
            .into_iter()
            .filter(|f| self.node(*f).is_none())
            .collect()
    }

    /// Read the current values.
    pub fn read<D: Dom<Node = N>>(&self, dom: &D) -> FormValues {
        let value = |field| self.node(field).map(|n| dom.value(n)).unwrap_or_default();
        FormValues {
            name: value(FieldRef::Name),
            email: value(FieldRef::Email),
            contact: value(FieldRef::Contact),
            birth_date: value(FieldRef::BirthDate),
            region: value(FieldRef::Region),
            mode: value(FieldRef::Mode),
            areas: self.checked_values(dom, FieldRef::VolunteerAreas, "checkbox"),
            donation_method: self
                .checked_values(dom, FieldRef::DonationMethod, "radio")
                .into_iter()
                .next(),
        }
    }

    /// Hide the conditional sections.
    pub fn hide_sections<D: Dom<Node = N>>(&self, dom: &D) {
        for field in [FieldRef::VolunteerAreas, FieldRef::DonationMethod] {
            if let Some(section) = self.node(field) {
                dom.set_style(section, "display", "none");
            }
        }
    }

    fn checked_values<D: Dom<Node = N>>(
        &self,
        dom: &D,
        field: FieldRef,
        kind: &str,
    ) -> Vec<String> {
        let Some(section) = self.node(field) else {
            return Vec::new();
        };
        let Ok(selector) = Selector::parse(&format!(r#"input[type="{kind}"]:checked"#)) else {
            return Vec::new();
        };
        dom.query_all(section, &selector)
            .iter()
            .map(|input| dom.value(input))
            .collect()
    }
}

fn by_id<D: Dom>(dom: &D, form: &D::Node, id: &str) -> Option<D::Node> {
    let selector = Selector::parse(&format!("#{id}")).ok()?;
    dom.query(form, &selector)
}

fn by_name<D: Dom>(dom: &D, form: &D::Node, name: &str) -> Option<D::Node> {
    let selector = Selector::parse(&format!(r#"[name="{name}"]"#)).ok()?;
    dom.query(form, &selector)
}

#[cfg(test)]
mod tests {
    use air_dom::MemoryDom;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::TEST_FORM;

    fn bind(dom: &MemoryDom) -> FormSchema<air_dom::NodeId> {
        let form = dom.find("form").unwrap();
        FormSchema::bind(dom, &form, &FormConfig::default())
    }

    #[test]
    fn test_bind_resolves_ids_then_names() {
        let dom = MemoryDom::parse(TEST_FORM);
        let schema = bind(&dom);
        assert_eq!(schema.missing(), vec![]);
        assert_eq!(schema.node(FieldRef::Email), dom.find(r#"[name="email"]"#).as_ref());
        assert_eq!(schema.node(FieldRef::Name), dom.find("#nome").as_ref());
    }

    #[test]
    fn test_bind_reports_missing_fields() {
        let dom = MemoryDom::parse(r#"<form><input id="nome"></form>"#);
        let schema = bind(&dom);
        assert_eq!(
            schema.missing(),
            vec![
                FieldRef::Email,
                FieldRef::Contact,
                FieldRef::BirthDate,
                FieldRef::Region,
                FieldRef::Mode,
                FieldRef::VolunteerAreas,
                FieldRef::DonationMethod,
            ]
        );
    }

    #[test]
    fn test_read_values() {
        let dom = MemoryDom::parse(TEST_FORM);
        let schema = bind(&dom);
        dom.set_value(dom.find("#nome").unwrap(), " Ana ");
        dom.set_value(dom.find("#formaContribuicao").unwrap(), "voluntario");
        dom.set_checked(dom.find(r#"[value="eventos"]"#).unwrap(), true);
        dom.set_checked(dom.find(r#"[value="boleto"]"#).unwrap(), true);

        let values = schema.read(&dom);
        assert_eq!(
            values,
            FormValues {
                name: " Ana ".to_owned(),
                mode: "voluntario".to_owned(),
                areas: vec!["eventos".to_owned()],
                donation_method: Some("boleto".to_owned()),
                ..FormValues::default()
            }
        );
    }

    #[test]
    fn test_missing_fields_read_empty() {
        let dom = MemoryDom::parse("<form></form>");
        let schema = bind(&dom);
        assert_eq!(schema.read(&dom), FormValues::default());
    }

    #[test]
    fn test_hide_sections() {
        let dom = MemoryDom::parse(TEST_FORM);
        let schema = bind(&dom);
        schema.hide_sections(&dom);
        let section = dom.find("#opcaoDoador").unwrap();
        assert_eq!(dom.style(section, "display").as_deref(), Some("none"));
    }
}
