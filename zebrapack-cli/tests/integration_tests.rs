//! Integration tests for zebrapack-cli.
//!
//! These tests verify end-to-end functionality of the CLI library:
//! loading identities, running the passes, generating, and writing output.

use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

use zebrapack::{write_schema, Directives, Protocol, SchemaDest, SchemaError};
use zebrapack_cli::{
    config::{Config, ConfigManager},
    error::{CliError, ConfigError, GenerateError},
    generator::EncoderGenerator,
    loader,
    writer::StagedFile,
};

/// Get the path to test fixtures.
fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn mixed_directives() -> Directives {
    Directives::new()
        .with_constant("HashLen", 4)
        .with_ignore("Scratch")
}

// =============================================================================
// Loader Integration Tests
// =============================================================================

#[test]
fn test_load_simple_fixture() {
    let loaded = loader::load(&fixtures_path().join("simple.json"), &Directives::default()).unwrap();

    assert_eq!(loaded.declared, 2);
    assert_eq!(loaded.dropped(), 0);
    let names: Vec<_> = loaded.identities.names().collect();
    assert_eq!(names, vec!["Point", "Triple"]);
}

#[test]
fn test_load_applies_directives() {
    let loaded = loader::load(&fixtures_path().join("mixed.json"), &mixed_directives()).unwrap();

    assert_eq!(loaded.declared, 4);
    assert_eq!(loaded.dropped(), 1);
    assert!(loaded.identities.get("Scratch").is_none());

    let order = loaded.identities.get("Order").unwrap().as_struct().unwrap();
    assert_eq!(order.skip_count, 1);
    assert!(order.has_omit_empty_tags);
}

#[test]
fn test_unresolved_array_size_drops_identity() {
    let loaded = loader::load(&fixtures_path().join("mixed.json"), &Directives::default()).unwrap();

    assert!(loaded.identities.get("Order").is_none());
    assert!(loaded.identities.get("Ids").is_some());
}

// =============================================================================
// Generation Integration Tests
// =============================================================================

#[test]
fn test_generate_simple_fast() {
    let directives = Directives::new().with_tuple("Triple");
    let loaded = loader::load(&fixtures_path().join("simple.json"), &directives).unwrap();

    let output = EncoderGenerator::new(Config::default())
        .generate(&loaded.identities)
        .unwrap();

    assert_eq!(output.generated, vec!["Point", "Triple"]);
    assert!(output.failures.is_empty());
    assert!(output.content.starts_with(zebrapack::FILE_HEADER));
    assert!(output.content.contains("impl Point {"));
    assert!(output.content.contains("// runtime struct type identification for 'Point'"));
    // tuple header fused ahead of the first dynamic write
    assert!(output.content.contains("o.extend_from_slice(&[0x93]);"));
    assert_eq!(output.content.matches("pub fn msgsize(&self) -> usize").count(), 2);
}

#[test]
fn test_generate_fails_without_keep_going() {
    let loaded = loader::load(&fixtures_path().join("mixed.json"), &mixed_directives()).unwrap();

    let err = EncoderGenerator::new(Config::default())
        .generate(&loaded.identities)
        .unwrap_err();

    assert!(matches!(
        err,
        CliError::Generate(GenerateError::Failed { ref names }) if names == &["Loose".to_string()]
    ));
}

#[test]
fn test_generate_keep_going_and_write() {
    let dir = TempDir::new().unwrap();
    let loaded = loader::load(&fixtures_path().join("mixed.json"), &mixed_directives()).unwrap();

    let mut config = Config::default();
    config.output.dir = dir.path().join("gen");
    let path = config.output_path();
    let generator = EncoderGenerator::new(config).with_keep_going(true);
    let output = generator.generate(&loaded.identities).unwrap();

    assert_eq!(output.generated, vec!["Order", "Ids"]);
    assert_eq!(output.failures[0].name, "Loose");
    assert!(output.content.contains("msgp::append_bytes(&mut o, &self.hash[..]);"));
    assert!(output.content.contains("for (zk0001, zv0001) in self.tags.iter() {"));
    assert!(!output.content.contains("impl Loose"));

    let mut staged = StagedFile::create(&path).unwrap();
    let report = generator
        .generate_into(&loaded.identities, staged.printer())
        .unwrap();
    let written = staged.commit().unwrap();

    assert_eq!(report.generated, output.generated);
    assert_eq!(written.bytes, output.content.len());
    assert_eq!(fs::read_to_string(&path).unwrap(), output.content);
}

#[test]
fn test_failed_generation_keeps_previous_output() {
    let dir = TempDir::new().unwrap();
    let loaded = loader::load(&fixtures_path().join("mixed.json"), &mixed_directives()).unwrap();
    let path = dir.path().join("zebrapack_gen.rs");
    fs::write(&path, "// previous run\n").unwrap();

    let mut staged = StagedFile::create(&path).unwrap();
    let err = EncoderGenerator::new(Config::default())
        .generate_into(&loaded.identities, staged.printer())
        .unwrap_err();
    drop(staged);

    assert!(matches!(err, CliError::Generate(GenerateError::Failed { .. })));
    assert_eq!(fs::read_to_string(&path).unwrap(), "// previous run\n");
    assert!(!dir.path().join("zebrapack_gen.rs.partial").exists());
}

#[test]
fn test_config_file_selects_protocol() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("zebrapack.toml");
    fs::write(
        &config_path,
        r#"
[generator]
protocol = "msgp2"
generate_docs = false
msgsize = false
"#,
    )
    .unwrap();

    let config = ConfigManager::load(Some(&config_path)).unwrap();
    assert_eq!(config.generator.protocol, Protocol::Msgp2);

    let loaded = loader::load(&fixtures_path().join("simple.json"), &config.directives).unwrap();
    let output = EncoderGenerator::new(config)
        .generate(&loaded.identities)
        .unwrap();

    assert!(output.content.contains("o.extend_from_slice(&[0x82, 0xa1, 0x78]);"));
    assert!(!output.content.contains("fields_not_empty"));
    assert!(!output.content.contains("pub fn msgsize"));
    assert!(!output.content.contains("///"));
}

#[test]
fn test_invalid_config_file() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("zebrapack.toml");
    fs::write(&config_path, "[generator]\nprotocol = \"slow\"\n").unwrap();

    let err = ConfigManager::load(Some(&config_path)).unwrap_err();
    assert!(matches!(err, CliError::Config(ConfigError::InvalidToml { .. })));
}

#[test]
fn test_missing_config_file_uses_defaults() {
    let dir = TempDir::new().unwrap();
    let config = ConfigManager::load(Some(&dir.path().join("absent.toml"))).unwrap();
    assert_eq!(config.output_path(), Config::default().output_path());
}

// =============================================================================
// Schema Integration Tests
// =============================================================================

#[test]
fn test_schema_written_with_id() {
    let dir = TempDir::new().unwrap();
    let loaded = loader::load(&fixtures_path().join("simple.json"), &Directives::default()).unwrap();

    let mut config = Config::default();
    config.schema.genid = true;
    let schema = EncoderGenerator::new(config).schema(&loaded.resolved).unwrap();

    let dest = SchemaDest::Path(dir.path().join("out/schema.json"));
    write_schema(&schema, &dest).unwrap();

    let text = fs::read_to_string(dir.path().join("out/schema.json")).unwrap();
    let json: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert!(json["schema_id"].as_i64().unwrap() > 0);
    assert_eq!(json["structs"][0]["name"], "Point");
    assert_eq!(json["structs"][1]["fields"][2]["name"], "c");
    assert_eq!(json["structs"][1]["fields"][2]["type"], "int");
}

#[test]
fn test_schema_rejects_non_struct() {
    let loaded = loader::load(&fixtures_path().join("mixed.json"), &mixed_directives()).unwrap();

    let err = EncoderGenerator::new(Config::default())
        .schema(&loaded.resolved)
        .unwrap_err();
    assert!(matches!(
        err,
        CliError::Schema(SchemaError::UnsupportedShape { ref name, .. }) if name == "Ids"
    ));
}

#[test]
fn test_schema_rejects_top_level_alias() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("ids.json");
    fs::write(
        &input,
        r#"{
            "Point": {
                "shape": "struct",
                "name": "Point",
                "fields": [{"name": "x", "zid": 0, "value": {"shape": "base", "kind": "int64"}}]
            },
            "Alias": {"shape": "base", "kind": "identifier", "type_name": "Point"}
        }"#,
    )
    .unwrap();

    let loaded = loader::load(&input, &Directives::default()).unwrap();
    let generator = EncoderGenerator::new(Config::default());

    // the alias has no code of its own but still blocks schema export
    let output = generator.generate(&loaded.identities).unwrap();
    assert_eq!(output.generated, vec!["Point"]);
    let err = generator.schema(&loaded.resolved).unwrap_err();
    assert!(matches!(
        err,
        CliError::Schema(SchemaError::UnsupportedShape { ref name, .. }) if name == "Alias"
    ));
}
