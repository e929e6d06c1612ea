//! Property-based tests for zebrapack-cli.
//!
//! Properties tested:
//! - Config override precedence
//! - Uncommitted output never reaches the target
//! - Generated identities cover every well-formed input struct

use proptest::prelude::*;
use std::path::PathBuf;
use tempfile::TempDir;

use zebrapack::{BaseKind, Directives, Elem, Field, Identities, Protocol, StructElem};
use zebrapack_cli::{
    config::{CliArgs, Config, ConfigManager},
    generator::EncoderGenerator,
    loader,
    writer::StagedFile,
};

// =============================================================================
// Generators for property tests
// =============================================================================

fn arb_protocol() -> impl Strategy<Value = Protocol> {
    prop_oneof![Just(Protocol::Fast), Just(Protocol::Msgp2)]
}

fn arb_kind() -> impl Strategy<Value = BaseKind> {
    prop_oneof![
        Just(BaseKind::Int64),
        Just(BaseKind::Uint32),
        Just(BaseKind::String),
        Just(BaseKind::Bool),
        Just(BaseKind::Float64),
        Just(BaseKind::Bytes),
    ]
}

/// A table of structs whose fields all carry distinct zids.
fn arb_table() -> impl Strategy<Value = Identities> {
    prop::collection::vec(prop::collection::vec(arb_kind(), 0..6), 1..5).prop_map(|structs| {
        structs
            .into_iter()
            .enumerate()
            .map(|(i, kinds)| {
                let name = format!("S{}", i);
                let fields = kinds
                    .into_iter()
                    .enumerate()
                    .map(|(z, kind)| Field::new(format!("f{}", z), Elem::base(kind)).with_zid(z as i64))
                    .collect();
                (name.clone(), Elem::from(StructElem::new(name, fields)))
            })
            .collect()
    })
}

// =============================================================================
// Property: Config Override Precedence
//
// For any setting given both in the config file and on the command line,
// the command-line value wins.
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_config_override_precedence(
        file_dir in "[a-z]{3,8}",
        cli_dir in "[a-z]{3,8}",
        file_protocol in arb_protocol(),
        cli_protocol in arb_protocol(),
        cli_fuse in any::<bool>(),
    ) {
        prop_assume!(file_dir != cli_dir);

        let mut file_config = Config::default();
        file_config.output.dir = PathBuf::from(&file_dir);
        file_config.generator.protocol = file_protocol;

        let cli_args = CliArgs {
            output: Some(PathBuf::from(&cli_dir)),
            protocol: Some(cli_protocol),
            fuse: Some(cli_fuse),
            ..Default::default()
        };

        let merged = ConfigManager::merge_cli_args(file_config, &cli_args);

        prop_assert_eq!(merged.output.dir, PathBuf::from(&cli_dir));
        prop_assert_eq!(merged.generator.protocol, cli_protocol);
        prop_assert_eq!(merged.generator.fuse, cli_fuse);
    }
}

// =============================================================================
// Property: Staged Output Isolation
//
// Whatever is printed into a staged file, the target only changes on commit,
// and a dropped stage leaves nothing behind.
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn prop_uncommitted_output_never_reaches_target(
        file_name in "[a-z]{1,8}",
        previous in proptest::option::of("[a-z ]{0,40}"),
        content in ".{0,200}",
        commit in any::<bool>(),
    ) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(format!("{}.rs", file_name));
        let had_previous = previous.is_some();
        if let Some(previous) = &previous {
            std::fs::write(&path, previous).unwrap();
        }

        let mut staged = StagedFile::create(&path).unwrap();
        staged.printer().print(&content).unwrap();
        if commit {
            let written = staged.commit().unwrap();
            prop_assert_eq!(written.bytes, content.len());
            prop_assert_eq!(std::fs::read_to_string(&path).unwrap(), content);
        } else {
            drop(staged);
            prop_assert_eq!(std::fs::read_to_string(&path).ok(), previous);
        }

        let leftovers = std::fs::read_dir(dir.path()).unwrap().count();
        prop_assert_eq!(leftovers, usize::from(commit || had_previous));
    }
}

// =============================================================================
// Property: Generation Completeness
//
// Every struct of a well-formed input (distinct zids) is generated, under
// either protocol, after a JSON round trip through the loader.
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn prop_every_struct_generated(table in arb_table(), protocol in arb_protocol()) {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("ids.json");
        std::fs::write(&input, serde_json::to_string(&table).unwrap()).unwrap();

        let loaded = loader::load(&input, &Directives::default()).unwrap();
        let mut config = Config::default();
        config.generator.protocol = protocol;
        let output = EncoderGenerator::new(config).generate(&loaded.identities).unwrap();

        let expected: Vec<String> = table.names().map(String::from).collect();
        prop_assert_eq!(&output.generated, &expected);
        for name in &expected {
            let header = format!("impl {} {{", name);
            prop_assert_eq!(output.content.matches(header.as_str()).count(), 2);
        }
    }
}
