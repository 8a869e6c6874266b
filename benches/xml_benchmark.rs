use divan::Bencher;
use std::io::Write;
use tempfile::NamedTempFile;
use validate_toolkit::{ArgumentTable, LibXml2Wrapper, SchemaValidator, ValidationMode};

fn main() {
    divan::main();
}

const SIMPLE_XSD: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
    <xs:element name="root">
        <xs:complexType>
            <xs:sequence>
                <xs:element name="element" type="xs:string"/>
            </xs:sequence>
        </xs:complexType>
    </xs:element>
</xs:schema>"#;

const VALID_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<root>
    <element>Valid content</element>
</root>"#;

const INVALID_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<root>
    <invalid>Content</invalid>
</root>"#;

fn temp_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", content).unwrap();
    file
}

#[divan::bench]
fn parse_schema(bencher: Bencher) {
    let wrapper = LibXml2Wrapper::new();
    let schema_data = SIMPLE_XSD.as_bytes();

    bencher.bench_local(move || {
        wrapper
            .parse_schema_from_memory(schema_data)
            .expect("Failed to parse schema")
    });
}

#[divan::bench(args = [VALID_XML, INVALID_XML])]
fn validate_in_memory(bencher: Bencher, document: &str) {
    let validator = SchemaValidator::new();

    bencher.bench_local(move || {
        validator
            .validate(ValidationMode::InMemory, document, SIMPLE_XSD, None)
            .expect("Validation failed")
    });
}

#[divan::bench(args = [VALID_XML, INVALID_XML])]
fn validate_file_system(bencher: Bencher, document: &str) {
    let validator = SchemaValidator::new();
    let schema_file = temp_file(SIMPLE_XSD);
    let document_file = temp_file(document);
    let schema_path = schema_file.path().to_string_lossy().to_string();
    let document_path = document_file.path().to_string_lossy().to_string();

    bencher.bench_local(move || {
        validator
            .validate(
                ValidationMode::FileSystem,
                &document_path,
                &schema_path,
                None,
            )
            .expect("Validation failed")
    });
}

#[divan::bench]
fn validate_cached_schema(bencher: Bencher) {
    let wrapper = LibXml2Wrapper::new();
    let schema = wrapper
        .parse_schema_from_memory(SIMPLE_XSD.as_bytes())
        .unwrap();
    let file = temp_file(VALID_XML);
    let path = file.path().to_path_buf();

    bencher.bench_local(move || {
        wrapper
            .validate_file(&schema, &path)
            .expect("Validation failed")
    });
}

#[divan::bench]
fn parse_arguments(bencher: Bencher) {
    let tokens: Vec<String> = (0..32).map(|i| format!("--key{i}=value{i}")).collect();

    bencher.bench_local(move || ArgumentTable::parse(&tokens).expect("Failed to parse"));
}
