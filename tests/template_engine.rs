//! Integration tests for placeholder extraction and substitution

use pretty_assertions::assert_eq;
use promply::template::{
    extract_variable_names, has_variables, resolve_variables, substitute, validate, Template,
};
use promply::{ResolvedVariable, VariableDeclaration, VariableValues};

fn values(pairs: &[(&str, &str)]) -> VariableValues {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

const BODIES: &[&str] = &[
    "",
    "plain text",
    "{{a}}{{b}}{{a}}",
    "Dear {{name}},\n\n{{body}}\n\nRegards, {{name}}",
    "{{ spaced }} {{1st}} {{ok_1}} {single} {{{triple}}}",
    "unicode: {{名前}} {{café}} {{x}}",
    "{{a}} {{",
    "}}{{b}}{",
];

#[test]
fn test_extracted_names_are_distinct_and_ordered() {
    for body in BODIES {
        let names = extract_variable_names(body);
        let mut seen = std::collections::HashSet::new();
        assert!(names.iter().all(|n| seen.insert(n.clone())), "{:?}", body);
        assert_eq!(has_variables(body), !names.is_empty());
    }
    assert_eq!(extract_variable_names("{{a}}{{b}}{{a}}"), vec!["a", "b"]);
    assert_eq!(
        extract_variable_names("{{ spaced }} {{1st}} {{ok_1}} {single} {{{triple}}}"),
        vec!["ok_1", "triple"]
    );
}

#[test]
fn test_resolve_matches_extraction_positionally() {
    let declarations = vec![
        VariableDeclaration::new("body").with_description("Main text"),
        VariableDeclaration::new("unused").with_default("x"),
    ];
    for body in BODIES {
        let names = extract_variable_names(body);
        let resolved = resolve_variables(body, &declarations);
        assert_eq!(resolved.len(), names.len());
        for (var, name) in resolved.iter().zip(&names) {
            assert_eq!(&var.name, name);
        }
    }
}

#[test]
fn test_empty_values_leave_body_untouched() {
    for body in BODIES {
        assert_eq!(substitute(body, &VariableValues::new()), *body);
    }
}

#[test]
fn test_full_substitution_leaves_no_placeholders() {
    for body in BODIES {
        let names = extract_variable_names(body);
        let map: VariableValues = names.iter().map(|n| (n.clone(), "v".to_string())).collect();
        let result = substitute(body, &map);
        for name in &names {
            assert!(!result.contains(&format!("{{{{{}}}}}", name)), "{:?}", result);
        }
    }
}

#[test]
fn test_values_are_not_rescanned() {
    assert_eq!(substitute("{{a}}", &values(&[("a", "{{b}}")])), "{{b}}");
    assert_eq!(
        substitute("{{a}} {{b}}", &values(&[("a", "{{b}}"), ("b", "B")])),
        "{{b}} B"
    );
}

#[test]
fn test_greeting_scenario() {
    let body = "Hi {{name}}, you are {{age}}";
    let declarations = vec![VariableDeclaration::new("name").with_default("Alex")];

    let resolved = resolve_variables(body, &declarations);
    assert_eq!(
        resolved,
        vec![
            ResolvedVariable {
                name: "name".to_string(),
                description: None,
                default_value: Some("Alex".to_string()),
            },
            ResolvedVariable::bare("age"),
        ]
    );

    let validation = validate(body, &declarations);
    assert!(!validation.valid);
    assert_eq!(validation.missing_names, vec!["age"]);

    assert_eq!(
        substitute(body, &values(&[("name", "Sam"), ("age", "9")])),
        "Hi Sam, you are 9"
    );
}

#[test]
fn test_placeholder_spans() {
    let body = "{{x}} and {{x}}";
    let template = Template::parse(body);
    let spans = template.placeholder_spans("x");
    assert_eq!(spans, vec![0..5, 10..15]);
    for span in spans {
        assert_eq!(&body[span], "{{x}}");
    }
}

#[test]
fn test_report_names_missing_variables() {
    let body = "Hello {{who}}, meet {{whom}}";
    let report = validate(body, &[]).report(body, "hello", false);
    assert!(report.contains("2 undeclared variables: who, whom"));
    assert!(report.contains("'whom' has no declaration"));
    assert!(report.contains("hello"));
}

#[test]
fn test_substitution_snapshot() {
    let body = "Translate {{text}} into {{language}}. Keep {{tone}} tone.";
    let out = substitute(
        body,
        &values(&[("text", "\"bonjour\""), ("language", "English")]),
    );
    insta::assert_snapshot!(out, @r#"Translate "bonjour" into English. Keep {{tone}} tone."#);
}
