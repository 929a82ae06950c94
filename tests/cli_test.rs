use clap::Parser;
use kiln::cli::Args;
use std::ffi::OsString;
use std::path::PathBuf;

fn make_args(args: &[&str]) -> Vec<OsString> {
    let mut res = vec![OsString::from("kiln")];
    res.extend(args.iter().map(OsString::from));
    res
}

#[test]
fn test_defaults() {
    let parsed = Args::try_parse_from(make_args(&[])).unwrap();

    assert_eq!(parsed.destination, PathBuf::from("."));
    assert!(parsed.config.is_none());
    assert!(parsed.source.is_none());
    assert!(!parsed.schema);
    assert!(!parsed.validate);
    assert!(!parsed.no_interaction);
    assert!(!parsed.verbose);
}

#[test]
fn test_install_flags() {
    let args = make_args(&[
        "--no-interaction",
        "--config={\"name\": \"My Site\"}",
        "--destination=/tmp/site",
        "--source",
        "./template",
        "-v",
    ]);
    let parsed = Args::try_parse_from(args).unwrap();

    assert!(parsed.no_interaction);
    assert_eq!(parsed.config.as_deref(), Some("{\"name\": \"My Site\"}"));
    assert_eq!(parsed.destination, PathBuf::from("/tmp/site"));
    assert_eq!(parsed.source, Some(PathBuf::from("./template")));
    assert!(parsed.verbose);
}

#[test]
fn test_validate_requires_config() {
    assert!(Args::try_parse_from(make_args(&["--validate"])).is_err());

    let parsed = Args::try_parse_from(make_args(&["--validate", "--config", "answers.json"])).unwrap();
    assert!(parsed.validate);
}

#[test]
fn test_schema_conflicts_with_validate() {
    let args = make_args(&["--schema", "--validate", "--config", "{}"]);
    assert!(Args::try_parse_from(args).is_err());
}

#[test]
fn test_run_processor() {
    let parsed = Args::try_parse_from(make_args(&["--run-processor", "uncomment"])).unwrap();
    assert_eq!(parsed.run_processor.as_deref(), Some("uncomment"));
}

#[test]
fn test_unknown_flag() {
    assert!(Args::try_parse_from(make_args(&["--template", "x"])).is_err());
}
