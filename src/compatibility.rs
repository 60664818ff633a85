//! Type compatibility checking
//!
//! Classifies engine type names once into a small closed set of families and
//! answers two questions from that classification: can a runtime value be
//! written into a field of a given type, and can one field type be copied into
//! another.

use serde::{Deserialize, Serialize};

use crate::schema::{DynamicField, Field, SchemaSnapshot};

/// Broad family of an engine field type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeFamily {
    /// int, long, float and double types, point-based or not
    Numeric,
    /// string and analyzed text types
    Text,
    /// location, location_rpt and point types. Only copy compatibility treats
    /// these apart; value checks and suffixes go by the raw name markers.
    Spatial,
    /// Anything else (booleans, dates, binary, custom types)
    Other,
}

/// Flavour of a spatial type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpatialKind {
    Location,
    LocationRpt,
    Point,
}

/// A type name classified once, compared many times
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeClass {
    /// Lowercased type name
    pub name: String,
    pub family: TypeFamily,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spatial: Option<SpatialKind>,
}

const NUMERIC_MARKERS: [&str; 4] = ["int", "long", "float", "double"];
const TEXT_MARKERS: [&str; 2] = ["string", "text"];
const ANALYZER_VARIANT_MARKERS: [&str; 3] = ["path", "phone", "lower"];

impl TypeClass {
    /// Classify a type name
    ///
    /// Spatial markers win over numeric ones since "point" itself contains "int".
    pub fn classify(type_name: &str) -> Self {
        let name = type_name.to_lowercase();

        let spatial = if name.contains("location_rpt") {
            Some(SpatialKind::LocationRpt)
        } else if name.contains("location") {
            Some(SpatialKind::Location)
        } else if name.contains("point") {
            Some(SpatialKind::Point)
        } else {
            None
        };

        let family = if spatial.is_some() {
            TypeFamily::Spatial
        } else if TEXT_MARKERS.iter().any(|m| name.contains(m)) {
            TypeFamily::Text
        } else if NUMERIC_MARKERS.iter().any(|m| name.contains(m)) {
            TypeFamily::Numeric
        } else {
            TypeFamily::Other
        };

        Self { name, family, spatial }
    }

    pub fn is_numeric(&self) -> bool {
        self.family == TypeFamily::Numeric
    }

    pub fn is_text(&self) -> bool {
        self.family == TypeFamily::Text
    }

    /// Point-based numeric types such as `pint`, `plongs` or `pdouble`
    pub fn is_numeric_point(&self) -> bool {
        self.is_numeric() && self.name.starts_with('p')
    }

    /// Whether the raw name carries a numeric marker, whatever its family
    ///
    /// `point` is spatial but still carries `int`.
    pub fn has_numeric_marker(&self) -> bool {
        NUMERIC_MARKERS.iter().any(|m| self.name.contains(m))
    }

    fn has_text_marker(&self) -> bool {
        TEXT_MARKERS.iter().any(|m| self.name.contains(m))
    }

    /// Whether this type could be an analyzer variant of `source`
    fn is_variant_of(&self, source: &TypeClass) -> bool {
        ANALYZER_VARIANT_MARKERS.iter().any(|m| self.name.contains(m))
            || self.name.contains(source.name.as_str())
    }
}

/// Check whether a value is acceptable for a field declared with `declared_type`
///
/// `null` always matches and sequences match when every element does; nested
/// sequences are not flattened. Types whose name carries a numeric marker
/// accept anything whose text form parses as a double (the engine accepts
/// "42" on the wire). Remaining text types require an actual string. Other
/// types are not checked.
pub fn value_matches_type(value: &serde_json::Value, declared_type: &str) -> bool {
    value_matches_class(value, &TypeClass::classify(declared_type))
}

/// Same as [`value_matches_type`] with an already classified type
pub fn value_matches_class(value: &serde_json::Value, class: &TypeClass) -> bool {
    use serde_json::Value;

    match value {
        Value::Array(items) => items.iter().all(|item| scalar_matches_class(item, class)),
        _ => scalar_matches_class(value, class),
    }
}

fn scalar_matches_class(value: &serde_json::Value, class: &TypeClass) -> bool {
    use serde_json::Value;

    if value.is_null() {
        return true;
    }
    if class.has_numeric_marker() {
        match value {
            Value::Number(_) => true,
            Value::String(s) => parses_as_double(s),
            _ => false,
        }
    } else if class.has_text_marker() {
        value.is_string()
    } else {
        true
    }
}

/// Decimal text accepted by the engine's double parser
///
/// Surrounding whitespace and control characters are ignored, `NaN` and
/// `Infinity` are spelled exactly, and one trailing `f`/`d` suffix is allowed.
/// Hexadecimal floats are rejected.
pub fn parses_as_double(text: &str) -> bool {
    let text = text.trim_matches(|c: char| c <= ' ');
    let unsigned = text.strip_prefix(&['+', '-'][..]).unwrap_or(text);
    if unsigned == "NaN" || unsigned == "Infinity" {
        return true;
    }

    let number = unsigned
        .strip_suffix(&['f', 'F', 'd', 'D'][..])
        .unwrap_or(unsigned);
    !number.is_empty()
        && !number.starts_with(&['+', '-'][..])
        && number
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'))
        && number.parse::<f64>().is_ok()
}

/// Check whether a field of `source_type` may be copied into `dest_type`
///
/// The relation is not symmetric. Identical types are always rejected.
pub fn types_are_copy_compatible(source_type: &str, dest_type: &str) -> bool {
    classes_are_copy_compatible(&TypeClass::classify(source_type), &TypeClass::classify(dest_type))
}

/// Same as [`types_are_copy_compatible`] with already classified types
pub fn classes_are_copy_compatible(source: &TypeClass, dest: &TypeClass) -> bool {
    if source.name == dest.name {
        return false;
    }

    if source.is_text() || dest.is_text() {
        return true;
    }

    if source.is_numeric_point() && dest.is_numeric_point() {
        return true;
    }

    let spatial_pair = matches!(
        (source.spatial, dest.spatial),
        (Some(SpatialKind::Location | SpatialKind::LocationRpt), Some(SpatialKind::Point))
            | (Some(SpatialKind::LocationRpt), Some(SpatialKind::LocationRpt))
            | (Some(SpatialKind::Point), Some(SpatialKind::Location | SpatialKind::LocationRpt))
    );
    if spatial_pair {
        return true;
    }

    dest.is_variant_of(source)
}

/// Multi-valuedness of a field: its own flag, else its type's default, else false
pub fn effective_multi_valued(field: &Field, snapshot: &SchemaSnapshot) -> bool {
    resolve_multi_valued(field.multi_valued, &field.field_type, snapshot)
}

/// Multi-valuedness of a dynamic field, resolved like [`effective_multi_valued`]
pub fn effective_dynamic_multi_valued(field: &DynamicField, snapshot: &SchemaSnapshot) -> bool {
    resolve_multi_valued(field.multi_valued, &field.field_type, snapshot)
}

fn resolve_multi_valued(explicit: Option<bool>, type_name: &str, snapshot: &SchemaSnapshot) -> bool {
    explicit
        .or_else(|| snapshot.get_field_type(type_name).and_then(|t| t.multi_valued))
        .unwrap_or(false)
}

/// A single-valued destination cannot receive a multi-valued source
pub fn multi_valued_allows_copy(source_multi: bool, dest_multi: bool) -> bool {
    !source_multi || dest_multi
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldType;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case("pint", TypeFamily::Numeric)]
    #[case("plongs", TypeFamily::Numeric)]
    #[case("pdouble", TypeFamily::Numeric)]
    #[case("string", TypeFamily::Text)]
    #[case("text_general", TypeFamily::Text)]
    #[case("delimited_payloads_string", TypeFamily::Text)]
    #[case("location_rpt", TypeFamily::Spatial)]
    #[case("point", TypeFamily::Spatial)]
    #[case("pdate", TypeFamily::Other)]
    #[case("boolean", TypeFamily::Other)]
    fn test_classify(#[case] type_name: &str, #[case] family: TypeFamily) {
        assert_eq!(TypeClass::classify(type_name).family, family);
    }

    #[test]
    fn test_classify_is_case_insensitive() {
        let class = TypeClass::classify("PInt");
        assert_eq!(class.name, "pint");
        assert!(class.is_numeric_point());
    }

    #[rstest]
    #[case(json!(null), "pint", true)]
    #[case(json!(42), "pint", true)]
    #[case(json!("42"), "pint", true)]
    #[case(json!(" 4.5 "), "pdouble", true)]
    #[case(json!("not-a-number"), "pint", false)]
    #[case(json!(true), "plong", false)]
    #[case(json!("hello"), "string", true)]
    #[case(json!(42), "string", false)]
    #[case(json!(42), "text_general", false)]
    #[case(json!({"nested": 1}), "text_general", false)]
    #[case(json!("anything"), "pdate", true)]
    #[case(json!(42), "my_custom_type", true)]
    #[case(json!("12.5,-3.1"), "location", true)]
    #[case(json!("12.5,-3.1"), "location_rpt", true)]
    #[case(json!(7), "point", true)]
    #[case(json!("7"), "point", true)]
    #[case(json!("hello"), "point", false)]
    #[case(json!("12.5,-3.1"), "point", false)]
    fn test_value_matches_type(
        #[case] value: serde_json::Value,
        #[case] type_name: &str,
        #[case] expected: bool,
    ) {
        assert_eq!(value_matches_type(&value, type_name), expected);
    }

    #[rstest]
    #[case("42", true)]
    #[case("42d", true)]
    #[case("1.5f", true)]
    #[case("2.5D", true)]
    #[case(" -1e3 ", true)]
    #[case(".5", true)]
    #[case("Infinity", true)]
    #[case("-Infinity", true)]
    #[case("NaN", true)]
    #[case("inf", false)]
    #[case("infinity", false)]
    #[case("nan", false)]
    #[case("0x1p3", false)]
    #[case("1_000", false)]
    #[case("+-1", false)]
    #[case("", false)]
    #[case("d", false)]
    fn test_parses_as_double(#[case] text: &str, #[case] expected: bool) {
        assert_eq!(parses_as_double(text), expected, "{text:?}");
        assert_eq!(value_matches_type(&json!(text), "pdouble"), expected);
    }

    #[test]
    fn test_nested_sequences_are_not_flattened() {
        assert!(!value_matches_type(&json!([[1, 2]]), "pints"));
        assert!(!value_matches_type(&json!([["a"]]), "strings"));
        assert!(value_matches_type(&json!([[1]]), "pdates"));
    }

    #[test]
    fn test_numeric_point_needs_p_prefix() {
        assert!(TypeClass::classify("pint").is_numeric_point());
        assert!(!TypeClass::classify("int").is_numeric_point());
        assert!(!TypeClass::classify("point").is_numeric_point());
        assert!(TypeClass::classify("point").has_numeric_marker());
    }

    #[test]
    fn test_sequences_match_element_wise() {
        assert!(value_matches_type(&json!([1, "2", null]), "pints"));
        assert!(!value_matches_type(&json!([1, "two"]), "pints"));
        assert!(value_matches_type(&json!(["a", "b"]), "strings"));
        assert!(!value_matches_type(&json!(["a", 2]), "strings"));
        assert!(value_matches_type(&json!([]), "strings"));
    }

    #[test]
    fn test_sequence_iff_every_element() {
        let elements = [json!(1), json!("x"), json!(null), json!(2.5), json!(false)];
        for type_name in ["pint", "string", "pdate"] {
            for a in &elements {
                for b in &elements {
                    let seq = json!([a, b]);
                    let expected =
                        value_matches_type(a, type_name) && value_matches_type(b, type_name);
                    assert_eq!(value_matches_type(&seq, type_name), expected, "{seq} vs {type_name}");
                }
            }
        }
    }

    #[rstest]
    #[case("string")]
    #[case("text_general")]
    #[case("pint")]
    #[case("location")]
    #[case("point")]
    #[case("pdate")]
    fn test_same_type_never_copy_compatible(#[case] type_name: &str) {
        assert!(!types_are_copy_compatible(type_name, type_name));
        assert!(!types_are_copy_compatible(type_name, &type_name.to_uppercase()));
    }

    #[rstest]
    // text/string on either side
    #[case("string", "text_general", true)]
    #[case("pint", "string", true)]
    #[case("text_general", "pdate", true)]
    // numeric point subtypes
    #[case("pint", "plong", true)]
    #[case("pdoubles", "pfloat", true)]
    // geo combinations
    #[case("location", "point", true)]
    #[case("point", "location", true)]
    #[case("location_rpt", "point", true)]
    #[case("location_rpt", "my_location_rpt", true)]
    // analyzer variants of the destination
    #[case("pdate", "descendent_path", true)]
    #[case("boolean", "phonetic_en", true)]
    #[case("random", "lowercase", true)]
    #[case("pdate", "pdates", true)]
    // otherwise incompatible
    #[case("pdate", "pint", false)]
    #[case("boolean", "pdate", false)]
    #[case("pdates", "pdate", false)]
    #[case("point", "pint", false)]
    fn test_copy_compatibility(#[case] source: &str, #[case] dest: &str, #[case] expected: bool) {
        assert_eq!(types_are_copy_compatible(source, dest), expected);
    }

    #[test]
    fn test_copy_compatibility_not_symmetric() {
        assert!(types_are_copy_compatible("pdate", "pdates"));
        assert!(!types_are_copy_compatible("pdates", "pdate"));
        assert!(types_are_copy_compatible("location", "point"));
        assert!(types_are_copy_compatible("point", "location"));
    }

    #[test]
    fn test_effective_multi_valued_fallbacks() {
        let snapshot = SchemaSnapshot {
            collection: "c".into(),
            field_types: vec![
                FieldType::new("strings").with_multi_valued(true),
                FieldType::new("string"),
            ],
            ..Default::default()
        };

        let explicit = Field::new("tags", "string").with_multi_valued(true);
        let inherited = Field::new("labels", "strings");
        let overridden = Field::new("label", "strings").with_multi_valued(false);
        let plain = Field::new("title", "string");
        let unknown_type = Field::new("blob", "binary");

        assert!(effective_multi_valued(&explicit, &snapshot));
        assert!(effective_multi_valued(&inherited, &snapshot));
        assert!(!effective_multi_valued(&overridden, &snapshot));
        assert!(!effective_multi_valued(&plain, &snapshot));
        assert!(!effective_multi_valued(&unknown_type, &snapshot));
    }

    #[test]
    fn test_multi_valued_gate() {
        assert!(multi_valued_allows_copy(false, false));
        assert!(multi_valued_allows_copy(false, true));
        assert!(multi_valued_allows_copy(true, true));
        assert!(!multi_valued_allows_copy(true, false));
    }
}
