//! Built-in catalog tables.

use super::links::{Cardinality, LinkRule, PredicateCategory, PredicateDef, Strength};
use super::schemas::{AttributeKind, AttributeRule, TypeSchema};
use crate::model::LayerName;

use Cardinality::{Many, One};
use LayerName::*;
use PredicateCategory::*;
use Strength::*;

const PREDICATES: &[(&str, &str, PredicateCategory)] = &[
    ("supports", "supported-by", Traceability),
    ("influences", "influenced-by", Traceability),
    ("mitigates", "mitigated-by", Traceability),
    ("monitors", "monitored-by", Traceability),
    ("tests", "tested-by", Traceability),
    ("secured-by", "secures", Traceability),
    ("realizes", "realized-by", Realization),
    ("implements", "implemented-by", Realization),
    ("stores", "stored-in", Realization),
    ("serves", "served-by", Dependency),
    ("uses", "used-by", Dependency),
    ("depends-on", "dependency-of", Dependency),
    ("accesses", "accessed-by", Dependency),
    ("triggered-by", "triggers", Dependency),
    ("assigned-to", "assigned-from", Structural),
    ("part-of", "composed-of", Structural),
    ("composed-of", "part-of", Structural),
    ("navigates-to", "navigated-from", Structural),
];

type RuleRow = (
    LayerName,
    &'static [&'static str],
    &'static str,
    LayerName,
    &'static [&'static str],
    &'static str,
    Cardinality,
    Strength,
);

// (source layer, source types, field, target layer, target types, predicate, cardinality, strength)
const LINK_RULES: &[RuleRow] = &[
    // motivation
    (Motivation, &["goal"], "parent-goal", Motivation, &["goal"], "part-of", One, Medium),
    (Motivation, &["driver"], "influences-goals", Motivation, &["goal", "outcome"], "influences", Many, Medium),
    (Motivation, &["assessment"], "assesses-drivers", Motivation, &["driver"], "influences", Many, Low),
    (Motivation, &["stakeholder"], "drivers", Motivation, &["driver"], "influences", Many, Low),
    (Motivation, &["outcome", "requirement", "principle"], "realizes-goals", Motivation, &["goal"], "realizes", Many, High),
    (Motivation, &["constraint"], "constrains-requirements", Motivation, &["requirement"], "influences", Many, Medium),
    // business
    (Business, &["service"], "supports-goals", Motivation, &["goal"], "supports", Many, High),
    (Business, &["service", "process"], "fulfills-requirements", Motivation, &["requirement"], "realizes", Many, High),
    (Business, &["process", "function"], "realizes-services", Business, &["service"], "realizes", Many, High),
    (Business, &["process"], "triggered-by", Business, &["event"], "triggered-by", Many, Medium),
    (Business, &["process", "function"], "accesses-objects", Business, &["object"], "accesses", Many, Low),
    (Business, &["actor"], "assigned-roles", Business, &["role"], "assigned-to", Many, Medium),
    (Business, &["role"], "performs", Business, &["process", "function"], "assigned-to", Many, Medium),
    // security
    (Security, &["policy"], "enforces-requirements", Motivation, &["requirement", "constraint"], "realizes", Many, Critical),
    (Security, &["control"], "implements-policy", Security, &["policy"], "implements", One, High),
    (Security, &["control"], "mitigates-threats", Security, &["threat"], "mitigates", Many, Critical),
    (Security, &["permission"], "granted-to", Security, &["role"], "assigned-to", Many, High),
    (Security, &["role"], "maps-to-roles", Business, &["role"], "realizes", Many, Medium),
    // application
    (Application, &["component", "service"], "realizes-services", Business, &["service"], "realizes", Many, High),
    (Application, &["component"], "depends-on", Application, &["component"], "depends-on", Many, Medium),
    (Application, &["component"], "accesses-data", Application, &["data-object"], "accesses", Many, Low),
    (Application, &["component", "interface"], "secured-by", Security, &["policy", "control"], "secured-by", Many, Critical),
    (Application, &["interface"], "exposes-services", Application, &["service"], "serves", Many, Medium),
    (Application, &["function"], "realizes-processes", Business, &["process", "function"], "realizes", Many, Medium),
    (Application, &["data-object"], "realizes-objects", Business, &["object"], "realizes", Many, Medium),
    // technology
    (Technology, &["artifact"], "realizes-components", Application, &["component"], "realizes", Many, High),
    (Technology, &["node", "system-software"], "serves-components", Application, &["component"], "serves", Many, Medium),
    (Technology, &["node"], "composed-of", Technology, &["device", "system-software"], "composed-of", Many, Low),
    (Technology, &["artifact"], "deployed-on", Technology, &["node"], "uses", One, Medium),
    (Technology, &["node", "device"], "connected-to", Technology, &["network"], "uses", Many, Low),
    // api
    (Api, &["operation"], "realizes-services", Application, &["service", "interface"], "realizes", Many, High),
    (Api, &["endpoint"], "operations", Api, &["operation"], "composed-of", Many, Medium),
    (Api, &["operation"], "request-schema", DataModel, &["entity"], "uses", One, Medium),
    (Api, &["operation"], "response-schema", DataModel, &["entity"], "uses", One, Medium),
    (Api, &["endpoint", "operation"], "secured-by", Security, &["policy", "control"], "secured-by", Many, Critical),
    // data model
    (DataModel, &["entity"], "realizes-objects", Application, &["data-object"], "realizes", Many, Medium),
    (DataModel, &["entity"], "references", DataModel, &["entity"], "depends-on", Many, Low),
    (DataModel, &["entity"], "uses-enums", DataModel, &["enum"], "uses", Many, Low),
    // datastore
    (Datastore, &["table", "collection"], "stores-entity", DataModel, &["entity"], "stores", One, High),
    (Datastore, &["table", "collection"], "part-of-database", Datastore, &["database"], "part-of", One, Medium),
    (Datastore, &["database"], "hosted-on", Technology, &["node", "system-software"], "uses", One, Medium),
    // ux
    (Ux, &["view", "form"], "calls-operations", Api, &["operation"], "uses", Many, Medium),
    (Ux, &["view"], "contains", Ux, &["component", "form"], "composed-of", Many, Low),
    (Ux, &["view", "component"], "realizes-components", Application, &["component"], "realizes", Many, Medium),
    // navigation
    (Navigation, &["route"], "shows-view", Ux, &["view"], "navigates-to", One, Medium),
    (Navigation, &["flow"], "steps", Navigation, &["route"], "composed-of", Many, Medium),
    (Navigation, &["flow"], "realizes-processes", Business, &["process"], "realizes", Many, Medium),
    // observability
    (Observability, &["metric"], "monitors-components", Application, &["component", "service"], "monitors", Many, Medium),
    (Observability, &["metric"], "measures-goals", Motivation, &["goal", "outcome"], "monitors", Many, High),
    (Observability, &["alert"], "watches", Observability, &["metric"], "monitors", Many, Medium),
    (Observability, &["trace"], "traces-operations", Api, &["operation"], "monitors", Many, Low),
    (Observability, &["log"], "emitted-by", Application, &["component"], "monitors", Many, Low),
    // testing
    (Testing, &["test-case"], "tests-components", Application, &["component"], "tests", Many, Medium),
    (Testing, &["test-case"], "tests-operations", Api, &["operation"], "tests", Many, Medium),
    (Testing, &["test-case"], "verifies-requirements", Motivation, &["requirement"], "tests", Many, High),
    (Testing, &["test-suite"], "cases", Testing, &["test-case"], "composed-of", Many, Low),
    (Testing, &["coverage-requirement"], "covers-suites", Testing, &["test-suite"], "tests", Many, Low),
];

pub(crate) fn builtin_links() -> (Vec<PredicateDef>, Vec<LinkRule>) {
    let predicates = PREDICATES
        .iter()
        .map(|(name, inverse, category)| PredicateDef {
            name: name.to_string(),
            inverse: Some(inverse.to_string()),
            category: *category,
        })
        .collect();

    let rules = LINK_RULES
        .iter()
        .map(
            |(source_layer, source_types, field, target_layer, target_types, predicate, cardinality, strength)| {
                LinkRule {
                    field: field.to_string(),
                    source_layer: *source_layer,
                    source_types: to_strings(source_types),
                    target_layer: *target_layer,
                    target_types: to_strings(target_types),
                    predicate: predicate.to_string(),
                    cardinality: *cardinality,
                    strength: *strength,
                }
            },
        )
        .collect();

    (predicates, rules)
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

const PRIORITY: &[&str] = &["low", "medium", "high", "critical"];
const LEVEL: &[&str] = &["low", "medium", "high"];
const HTTP_METHODS: &[&str] = &["GET", "POST", "PUT", "PATCH", "DELETE"];

fn enumeration(values: &[&str]) -> AttributeKind {
    AttributeKind::Enum(to_strings(values))
}

fn text(name: &str) -> AttributeRule {
    AttributeRule::new(name, AttributeKind::Text)
}

fn schema(layer: LayerName, name: &str, attributes: Vec<AttributeRule>) -> TypeSchema {
    TypeSchema {
        layer,
        name: name.to_string(),
        attributes,
        trace_fields: Vec::new(),
    }
}

fn traced(mut schema: TypeSchema, fields: &[&str]) -> TypeSchema {
    schema.trace_fields = to_strings(fields);
    schema
}

pub(crate) fn builtin_types() -> Vec<TypeSchema> {
    let priority = || AttributeRule::new("priority", enumeration(PRIORITY));

    vec![
        // motivation
        schema(Motivation, "stakeholder", vec![text("concern").length(None, Some(500))]),
        schema(Motivation, "driver", vec![]),
        schema(Motivation, "assessment", vec![AttributeRule::new("impact", enumeration(LEVEL))]),
        schema(Motivation, "goal", vec![priority()]),
        schema(Motivation, "outcome", vec![text("measure")]),
        schema(Motivation, "principle", vec![text("statement").length(Some(1), Some(2000))]),
        schema(
            Motivation,
            "requirement",
            vec![
                AttributeRule::new("requirement-type", enumeration(&["functional", "non-functional"])),
                priority(),
            ],
        ),
        schema(Motivation, "constraint", vec![]),
        // business
        schema(Business, "actor", vec![]),
        schema(Business, "role", vec![]),
        schema(Business, "process", vec![AttributeRule::new("automated", AttributeKind::Boolean)]),
        schema(Business, "function", vec![]),
        schema(Business, "service", vec![text("owner"), priority()]),
        schema(Business, "event", vec![]),
        schema(Business, "object", vec![]),
        // security
        schema(Security, "policy", vec![AttributeRule::new("enforcement", enumeration(&["advisory", "mandatory"]))]),
        schema(Security, "role", vec![]),
        schema(Security, "permission", vec![text("scope").required().length(Some(1), Some(200))]),
        schema(
            Security,
            "threat",
            vec![
                AttributeRule::new("likelihood", enumeration(LEVEL)),
                AttributeRule::new("impact", enumeration(LEVEL)),
            ],
        ),
        traced(schema(Security, "control", vec![]), &["implements-policy", "mitigates-threats"]),
        // application
        traced(
            schema(
                Application,
                "component",
                vec![AttributeRule::new(
                    "component-type",
                    enumeration(&["frontend", "backend", "library", "batch"]),
                )],
            ),
            &["realizes-services"],
        ),
        traced(schema(Application, "service", vec![]), &["realizes-services"]),
        schema(Application, "interface", vec![AttributeRule::new("protocol", enumeration(&["http", "grpc", "event", "file"]))]),
        schema(Application, "function", vec![]),
        schema(Application, "data-object", vec![]),
        // technology
        schema(Technology, "node", vec![AttributeRule::new("cpu-cores", AttributeKind::Integer)]),
        schema(Technology, "device", vec![]),
        schema(Technology, "system-software", vec![text("version")]),
        schema(Technology, "artifact", vec![text("format")]),
        schema(Technology, "network", vec![AttributeRule::new("bandwidth-mbps", AttributeKind::Number)]),
        // api
        schema(
            Api,
            "endpoint",
            vec![
                text("path").required().length(Some(1), Some(512)),
                AttributeRule::new("method", enumeration(HTTP_METHODS)).required(),
            ],
        ),
        traced(schema(Api, "operation", vec![text("operation-id")]), &["realizes-services"]),
        // data model
        schema(DataModel, "entity", vec![AttributeRule::new("fields", AttributeKind::List)]),
        schema(DataModel, "enum", vec![AttributeRule::new("values", AttributeKind::List).required()]),
        // datastore
        schema(Datastore, "database", vec![text("engine")]),
        traced(schema(Datastore, "table", vec![]), &["stores-entity"]),
        traced(schema(Datastore, "collection", vec![]), &["stores-entity"]),
        // ux
        schema(Ux, "view", vec![text("title").length(None, Some(200))]),
        schema(Ux, "component", vec![]),
        schema(Ux, "form", vec![]),
        // navigation
        traced(schema(Navigation, "route", vec![text("path").required().length(Some(1), Some(512))]), &["shows-view"]),
        schema(Navigation, "flow", vec![]),
        // observability
        schema(
            Observability,
            "metric",
            vec![
                AttributeRule::new("kind", enumeration(&["counter", "gauge", "histogram"])),
                text("unit"),
            ],
        ),
        schema(Observability, "trace", vec![]),
        schema(Observability, "log", vec![]),
        schema(Observability, "alert", vec![AttributeRule::new("severity", enumeration(PRIORITY))]),
        // testing
        traced(
            schema(
                Testing,
                "test-case",
                vec![priority(), AttributeRule::new("automated", AttributeKind::Boolean)],
            ),
            &["tests-components", "tests-operations", "verifies-requirements"],
        ),
        schema(Testing, "test-suite", vec![]),
        schema(Testing, "coverage-requirement", vec![AttributeRule::new("threshold", AttributeKind::Number).required()]),
    ]
}
