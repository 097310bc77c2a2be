use tracing::debug;

use crate::dict::CategoryDictionary;
use crate::template::TemplateSet;

/// Split a trailing run of ASCII digits off a field name.
///
/// `Animal2` gives `("Animal", Some("2"))`; `Animal` gives `("Animal", None)`.
pub fn split_numbered(field: &str) -> (&str, Option<&str>) {
    let base = field.trim_end_matches(|c: char| c.is_ascii_digit());
    if base.len() == field.len() {
        (field, None)
    } else {
        (base, Some(&field[base.len()..]))
    }
}

/// Give numbered fields their base category's values.
///
/// `{{.Animal1}} chases {{.Animal2}}` then draws two independent animals from
/// `Animal`. Categories that already exist are left untouched, and so are
/// numbered fields whose base category is unknown.
pub fn alias_numbered_fields(templates: &TemplateSet, dict: &mut CategoryDictionary) {
    for template in templates.iter() {
        for field in template.fields() {
            let (base, number) = split_numbered(field);
            if number.is_none() || base.is_empty() || dict.contains_key(field) {
                continue;
            }
            if let Some(values) = dict.get(base).cloned() {
                debug!(field, base, template = template.name(), "aliasing numbered field");
                dict.insert(field.to_string(), values);
            }
        }
    }
}
