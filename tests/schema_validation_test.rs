mod common;

use std::path::Path;

use common::{TestFixtures, path_str, read};
use validate_toolkit::{
    SchemaIssue, SchemaValidator, Severity, ToolkitError, ValidationMode, ValidationReport,
};

fn validate_fixture(
    validator: &SchemaValidator,
    mode: ValidationMode,
    document: &Path,
    schema: &Path,
    namespace: Option<&str>,
) -> validate_toolkit::Result<Vec<SchemaIssue>> {
    match mode {
        ValidationMode::FileSystem => {
            validator.validate(mode, &path_str(document), &path_str(schema), namespace)
        }
        ValidationMode::InMemory => {
            validator.validate(mode, &read(document), &read(schema), namespace)
        }
    }
}

const MODES: [ValidationMode; 2] = [ValidationMode::FileSystem, ValidationMode::InMemory];

#[test]
fn test_valid_document_has_no_issues_in_both_modes() {
    let fixtures = TestFixtures::new();
    let validator = SchemaValidator::new();

    for mode in MODES {
        let issues = validate_fixture(
            &validator,
            mode,
            &fixtures.valid_order(),
            &fixtures.order_schema(),
            None,
        )
        .unwrap();
        assert!(issues.is_empty(), "{mode}: {issues:?}");
    }
}

#[test]
fn test_every_violation_is_reported_in_both_modes() {
    let fixtures = TestFixtures::new();
    let validator = SchemaValidator::new();

    for mode in MODES {
        let issues = validate_fixture(
            &validator,
            mode,
            &fixtures.order_with_two_violations(),
            &fixtures.order_schema(),
            None,
        )
        .unwrap();

        assert_eq!(issues.len(), 2, "{mode}: {issues:?}");
        assert!(issues.iter().all(|i| i.severity == Severity::Error));
        assert!(issues.iter().any(|i| i.message.contains("'id'")));
        assert!(issues.iter().any(|i| i.message.contains("quantity")));
    }
}

#[test]
fn test_issues_do_not_leak_between_calls() {
    let fixtures = TestFixtures::new();
    let validator = SchemaValidator::new();

    for mode in MODES {
        let first = validate_fixture(
            &validator,
            mode,
            &fixtures.order_with_two_violations(),
            &fixtures.order_schema(),
            None,
        )
        .unwrap();
        let second = validate_fixture(
            &validator,
            mode,
            &fixtures.valid_order(),
            &fixtures.order_schema(),
            None,
        )
        .unwrap();

        assert_eq!(first.len(), 2);
        assert!(second.is_empty());
    }
}

#[test]
fn test_namespace_expectation() {
    let fixtures = TestFixtures::new();
    let validator = SchemaValidator::new();

    for mode in MODES {
        for namespace in [None, Some(""), Some("urn:example:catalog")] {
            let issues = validate_fixture(
                &validator,
                mode,
                &fixtures.valid_catalog(),
                &fixtures.catalog_schema(),
                namespace,
            )
            .unwrap();
            assert!(issues.is_empty(), "{mode} {namespace:?}: {issues:?}");
        }

        let err = validate_fixture(
            &validator,
            mode,
            &fixtures.valid_catalog(),
            &fixtures.catalog_schema(),
            Some("urn:example:other"),
        )
        .unwrap_err();

        match err {
            ToolkitError::NamespaceMismatch { expected, actual } => {
                assert_eq!(expected, "urn:example:other");
                assert_eq!(actual, "urn:example:catalog");
            }
            other => panic!("Expected NamespaceMismatch, got {other:?}"),
        }
    }
}

#[test]
fn test_schema_without_target_namespace_rejects_expected_namespace() {
    let fixtures = TestFixtures::new();
    let validator = SchemaValidator::new();

    let err = validate_fixture(
        &validator,
        ValidationMode::InMemory,
        &fixtures.valid_order(),
        &fixtures.order_schema(),
        Some("urn:example:orders"),
    )
    .unwrap_err();
    assert!(matches!(err, ToolkitError::NamespaceMismatch { .. }));
}

#[test]
fn test_malformed_document_is_hard_error() {
    let fixtures = TestFixtures::new();
    let validator = SchemaValidator::new();

    for mode in MODES {
        let err = validate_fixture(
            &validator,
            mode,
            &fixtures.malformed_order(),
            &fixtures.order_schema(),
            None,
        )
        .unwrap_err();
        assert!(
            matches!(err, ToolkitError::MalformedDocument { .. }),
            "{mode}: {err:?}"
        );
    }
}

#[test]
fn test_invalid_schema_reports_parser_diagnostics() {
    let fixtures = TestFixtures::new();
    let validator = SchemaValidator::new();

    for mode in MODES {
        let err = validate_fixture(
            &validator,
            mode,
            &fixtures.valid_order(),
            &fixtures.broken_schema(),
            None,
        )
        .unwrap_err();

        match err {
            ToolkitError::SchemaParsing { details, .. } => {
                assert!(!details.trim().is_empty(), "{mode}");
            }
            other => panic!("Expected SchemaParsing, got {other:?}"),
        }
    }
}

#[test]
fn test_missing_files_in_file_system_mode() {
    let fixtures = TestFixtures::new();
    let validator = SchemaValidator::new();
    let missing = fixtures.fixtures_dir.join("does-not-exist.xml");

    let err = validator
        .validate(
            ValidationMode::FileSystem,
            &path_str(&missing),
            &path_str(&fixtures.order_schema()),
            None,
        )
        .unwrap_err();
    assert!(matches!(err, ToolkitError::FileNotFound { ref path } if *path == missing));

    let err = validator
        .validate(
            ValidationMode::FileSystem,
            &path_str(&fixtures.valid_order()),
            &path_str(&fixtures.schemas_dir().join("missing.xsd")),
            None,
        )
        .unwrap_err();
    assert!(matches!(err, ToolkitError::FileNotFound { .. }));
}

#[test]
fn test_blank_inputs_are_invalid_arguments() {
    let validator = SchemaValidator::new();

    for mode in MODES {
        let err = validator.validate(mode, "  ", "<schema/>", None).unwrap_err();
        assert!(matches!(err, ToolkitError::InvalidArgument { ref param, .. } if param == "document"));

        let err = validator.validate(mode, "<doc/>", "", None).unwrap_err();
        assert!(matches!(err, ToolkitError::InvalidArgument { ref param, .. } if param == "schema"));
    }
}

#[test]
fn test_batch_keeps_order_and_isolates_failures() {
    let fixtures = TestFixtures::new();
    let validator = SchemaValidator::new().with_threads(2).unwrap();
    let documents = vec![
        fixtures.valid_order(),
        fixtures.order_with_two_violations(),
        fixtures.fixtures_dir.join("missing.xml"),
        fixtures.malformed_order(),
    ];

    let results = validator
        .validate_files(&fixtures.order_schema(), &documents, None)
        .unwrap();

    assert_eq!(results.len(), 4);
    for (result, path) in results.iter().zip(&documents) {
        assert_eq!(&result.path, path);
    }

    assert!(results[0].is_valid());
    assert_eq!(results[1].result.as_ref().unwrap().len(), 2);
    assert!(matches!(
        results[2].result,
        Err(ToolkitError::FileNotFound { .. })
    ));
    assert!(matches!(
        results[3].result,
        Err(ToolkitError::MalformedDocument { .. })
    ));
}

#[test]
fn test_batch_requires_documents() {
    let fixtures = TestFixtures::new();
    let validator = SchemaValidator::new();

    let err = validator
        .validate_files(&fixtures.order_schema(), &[], None)
        .unwrap_err();
    assert!(matches!(err, ToolkitError::OutOfRange { .. }));
}

#[test]
fn test_batch_schema_failure_is_hard_error() {
    let fixtures = TestFixtures::new();
    let validator = SchemaValidator::new();

    let err = validator
        .validate_files(&fixtures.broken_schema(), &[fixtures.valid_order()], None)
        .unwrap_err();
    assert!(matches!(err, ToolkitError::SchemaParsing { .. }));
}

#[test]
fn test_concurrent_calls_own_their_issues() {
    let fixtures = TestFixtures::new();
    let validator = SchemaValidator::new();
    let schema = read(&fixtures.order_schema());
    let valid = read(&fixtures.valid_order());
    let invalid = read(&fixtures.order_with_two_violations());

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let document = if i % 2 == 0 { &valid } else { &invalid };
                let (validator, schema) = (&validator, &schema);
                scope.spawn(move || {
                    let issues = validator
                        .validate(ValidationMode::InMemory, document, schema, None)
                        .unwrap();
                    (i, issues.len())
                })
            })
            .collect();

        for handle in handles {
            let (i, count) = handle.join().unwrap();
            assert_eq!(count, if i % 2 == 0 { 0 } else { 2 });
        }
    });
}

#[test]
fn test_issues_populate_report() {
    let fixtures = TestFixtures::new();
    let validator = SchemaValidator::new();

    let issues = validate_fixture(
        &validator,
        ValidationMode::InMemory,
        &fixtures.order_with_two_violations(),
        &fixtures.order_schema(),
        None,
    )
    .unwrap();

    let mut report = ValidationReport::new();
    report.add_schema_issues(&issues);

    assert!(!report.is_valid());
    assert_eq!(report.failures().count(), 2);
    assert!(report.findings().iter().all(|f| f.name == "error"));
}

#[test]
fn test_namespace_comes_from_parsed_schema_root() {
    let dir = tempfile::TempDir::new().unwrap();
    let validator = SchemaValidator::new();
    let cases = [
        (
            "<!-- was: <xs:schema targetNamespace=\"urn:old\"> -->",
            "urn:new",
            "urn:new",
        ),
        ("", "urn:a&amp;b", "urn:a&b"),
    ];

    for (i, (preamble, declared, expected)) in cases.into_iter().enumerate() {
        let schema = format!(
            r#"<?xml version="1.0"?>
{preamble}
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
           targetNamespace="{declared}"
           elementFormDefault="qualified">
  <xs:element name="note" type="xs:string"/>
</xs:schema>"#
        );
        let document = format!(r#"<note xmlns="{declared}">hello</note>"#);

        let schema_path = dir.path().join(format!("note{i}.xsd"));
        let document_path = dir.path().join(format!("note{i}.xml"));
        std::fs::write(&schema_path, &schema).unwrap();
        std::fs::write(&document_path, &document).unwrap();

        for mode in MODES {
            let issues = validate_fixture(
                &validator,
                mode,
                &document_path,
                &schema_path,
                Some(expected),
            )
            .unwrap();
            assert!(issues.is_empty(), "{mode} {expected}: {issues:?}");
        }
    }
}
