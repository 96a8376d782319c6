use std::collections::BTreeMap;

use super::issue::{IssueCode, IssueKind, Severity, ValidationIssue};
use super::{ElementValidator, ValidationContext};
use crate::model::{Element, LayerName, PropertyValue};
use crate::registry::{AttributeKind, AttributeRule, SchemaRegistry, TypeSchema};

/// Upper bound on display name length
pub const MAX_NAME_LEN: usize = 200;

/// Checks one element's shape against its (layer, type) schema.
///
/// Purely local; never looks at other elements.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaValidator;

/// Attribute value after checking it against its declared kind
#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue {
    Text(String),
    Integer(i64),
    Number(f64),
    Boolean(bool),
    List(Vec<PropertyValue>),
    Enum(String),
}

/// An element whose attributes conform to its type schema
#[derive(Debug, Clone, PartialEq)]
pub struct TypedElement<'a> {
    pub id: &'a str,
    pub layer: LayerName,
    pub schema: &'a TypeSchema,
    /// Declared attributes that are present, in declaration order of the schema
    pub attributes: BTreeMap<String, TypedValue>,
}

impl<'a> TypedElement<'a> {
    pub fn element_type(&self) -> &str {
        &self.schema.name
    }

    pub fn get(&self, attribute: &str) -> Option<&TypedValue> {
        self.attributes.get(attribute)
    }
}

impl SchemaValidator {
    /// Translate a raw element into its typed form, or return every schema
    /// issue that prevents it.
    ///
    /// # Errors
    ///
    /// Returns the schema issues when the element does not conform.
    pub fn typed<'a>(
        &self,
        element: &'a Element,
        schemas: &'a SchemaRegistry,
    ) -> Result<TypedElement<'a>, Vec<ValidationIssue>> {
        let issues = self.check(element, schemas);
        if !issues.is_empty() {
            return Err(issues);
        }
        let Some(schema) = schemas.type_schema(element.layer, &element.element_type) else {
            return Err(vec![unknown_type(element)]);
        };

        let attributes = schema
            .attributes
            .iter()
            .filter_map(|rule| {
                let value = element.properties.get(&rule.name)?;
                conform(rule, value).map(|typed| (rule.name.clone(), typed))
            })
            .collect();

        Ok(TypedElement {
            id: &element.id,
            layer: element.layer,
            schema,
            attributes,
        })
    }

    fn check(&self, element: &Element, schemas: &SchemaRegistry) -> Vec<ValidationIssue> {
        let Some(schema) = schemas.type_schema(element.layer, &element.element_type) else {
            return vec![unknown_type(element)];
        };

        let mut issues = Vec::new();

        let name_len = element.name.trim().chars().count();
        if name_len == 0 {
            issues.push(ValidationIssue::new(
                IssueCode::EmptyName,
                Severity::Error,
                &element.id,
                "name must not be empty",
            ));
        } else if name_len > MAX_NAME_LEN {
            issues.push(
                ValidationIssue::new(
                    IssueCode::StringLength,
                    Severity::Error,
                    &element.id,
                    format!("name is {} characters, at most {} allowed", name_len, MAX_NAME_LEN),
                )
                .with_field("name"),
            );
        }

        for rule in &schema.attributes {
            match element.properties.get(&rule.name) {
                None if rule.required => issues.push(
                    ValidationIssue::new(
                        IssueCode::MissingAttribute,
                        Severity::Error,
                        &element.id,
                        format!("required attribute '{}' is missing", rule.name),
                    )
                    .with_field(&rule.name),
                ),
                None => {}
                Some(value) => {
                    if let Some(issue) = check_value(rule, value, &element.id) {
                        issues.push(issue);
                    }
                }
            }
        }

        issues
    }
}

impl ElementValidator for SchemaValidator {
    fn kind(&self) -> IssueKind {
        IssueKind::Schema
    }

    fn validate(&self, element: &Element, ctx: &ValidationContext<'_>) -> Vec<ValidationIssue> {
        self.check(element, ctx.schemas)
    }
}

fn unknown_type(element: &Element) -> ValidationIssue {
    ValidationIssue::new(
        IssueCode::UnknownType,
        Severity::Error,
        &element.id,
        format!(
            "type '{}' is not declared for layer {}",
            element.element_type, element.layer
        ),
    )
}

fn conform(rule: &AttributeRule, value: &PropertyValue) -> Option<TypedValue> {
    match (&rule.kind, value) {
        (AttributeKind::Text, PropertyValue::Text(s)) => Some(TypedValue::Text(s.clone())),
        (AttributeKind::Integer, PropertyValue::Integer(i)) => Some(TypedValue::Integer(*i)),
        (AttributeKind::Number, PropertyValue::Integer(i)) => Some(TypedValue::Number(*i as f64)),
        (AttributeKind::Number, PropertyValue::Float(f)) => Some(TypedValue::Number(*f)),
        (AttributeKind::Boolean, PropertyValue::Bool(b)) => Some(TypedValue::Boolean(*b)),
        (AttributeKind::List, PropertyValue::List(items)) => Some(TypedValue::List(items.clone())),
        (AttributeKind::Enum(values), PropertyValue::Text(s)) if values.contains(s) => {
            Some(TypedValue::Enum(s.clone()))
        }
        _ => None,
    }
}

fn expected(kind: &AttributeKind) -> &'static str {
    match kind {
        AttributeKind::Text => "string",
        AttributeKind::Integer => "integer",
        AttributeKind::Number => "number",
        AttributeKind::Boolean => "boolean",
        AttributeKind::List => "list",
        AttributeKind::Enum(_) => "string",
    }
}

fn check_value(rule: &AttributeRule, value: &PropertyValue, element_id: &str) -> Option<ValidationIssue> {
    let issue = |code, message: String| {
        Some(ValidationIssue::new(code, Severity::Error, element_id, message).with_field(&rule.name))
    };

    if conform(rule, value).is_none() {
        if let (AttributeKind::Enum(values), PropertyValue::Text(s)) = (&rule.kind, value) {
            return issue(
                IssueCode::EnumValue,
                format!(
                    "'{}' is not one of [{}] for '{}'",
                    s,
                    values.join(", "),
                    rule.name
                ),
            );
        }
        return issue(
            IssueCode::AttributeType,
            format!(
                "'{}' must be a {}, found {}",
                rule.name,
                expected(&rule.kind),
                value.type_name()
            ),
        );
    }

    if let PropertyValue::Text(s) = value {
        let len = s.chars().count();
        if rule.min_len.is_some_and(|min| len < min) || rule.max_len.is_some_and(|max| len > max) {
            return issue(
                IssueCode::StringLength,
                format!(
                    "'{}' has {} characters, allowed {}..{}",
                    rule.name,
                    len,
                    rule.min_len.unwrap_or(0),
                    rule.max_len.map(|m| m.to_string()).unwrap_or_default()
                ),
            );
        }
    }

    None
}
