use super::*;
use crate::export::ExportFormat;

#[test]
fn parses_search_with_coordinates() {
    let cli = Cli::try_parse_from([
        "bizfinder",
        "search",
        "--latitude",
        "37.7749",
        "--longitude",
        "-122.4194",
        "--radius",
        "10000",
        "--search-term",
        "coffee",
    ])
    .expect("expected valid cli args");

    let Commands::Search(args) = cli.command else {
        panic!("expected search command");
    };
    assert_eq!(args.latitude, Some(37.7749));
    assert_eq!(args.longitude, Some(-122.4194));
    assert!((args.radius - 10_000.0).abs() < f64::EPSILON);
    assert_eq!(args.search_term, "coffee");
    assert!(args.sub_radius.is_none());
    assert!(!args.quiet);
}

#[test]
fn search_defaults() {
    let cli = Cli::try_parse_from(["bizfinder", "search", "--location", "Austin, TX"])
        .expect("expected valid cli args");

    let Commands::Search(args) = cli.command else {
        panic!("expected search command");
    };
    assert_eq!(args.location.as_deref(), Some("Austin, TX"));
    assert!((args.radius - 1_000.0).abs() < f64::EPSILON);
    assert_eq!(args.search_term, "business");
    assert_eq!(args.format, ExportFormat::Csv);
    assert!(args.output.is_none());
}

#[test]
fn parses_grid_tuning_and_output_flags() {
    let cli = Cli::try_parse_from([
        "bizfinder",
        "search",
        "--latitude=51.5",
        "--longitude=-0.12",
        "--sub-radius",
        "1500",
        "--max-workers",
        "8",
        "--format",
        "json",
        "-o",
        "out.json",
        "--quiet",
    ])
    .expect("expected valid cli args");

    let Commands::Search(args) = cli.command else {
        panic!("expected search command");
    };
    assert_eq!(args.sub_radius, Some(1_500.0));
    assert_eq!(args.max_workers, Some(8));
    assert_eq!(args.format, ExportFormat::Json);
    assert_eq!(args.output.as_deref(), Some(std::path::Path::new("out.json")));
    assert!(args.quiet);
}

#[test]
fn rejects_unknown_format() {
    let result = Cli::try_parse_from(["bizfinder", "search", "--format", "xlsx"]);
    assert!(result.is_err());
}

#[test]
fn json_params_override_flags_and_file_applies_last() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("params.json");
    std::fs::write(&file, r#"{"max_workers": 2}"#).unwrap();
    let file_arg = file.display().to_string();

    let cli = Cli::try_parse_from([
        "bizfinder",
        "search",
        "--search-term",
        "flag",
        "--max-workers",
        "9",
        "--json-params",
        r#"{"search_term": "inline", "latitude": 1.5, "longitude": 2.5, "max_workers": 5}"#,
        "--params-file",
        file_arg.as_str(),
    ])
    .expect("expected valid cli args");

    let Commands::Search(mut args) = cli.command else {
        panic!("expected search command");
    };
    search::apply_params(&mut args).unwrap();

    assert_eq!(args.search_term, "inline");
    assert_eq!(args.latitude, Some(1.5));
    assert_eq!(args.longitude, Some(2.5));
    assert_eq!(args.max_workers, Some(2), "file params are applied after inline JSON");
    assert!(args.json_params.is_none());
    assert!(args.params_file.is_none());
}

#[test]
fn parses_config_updates() {
    let cli = Cli::try_parse_from([
        "bizfinder",
        "config",
        "--set-api-key",
        "abc",
        "--set-sub-radius",
        "2500",
        "--show",
    ])
    .expect("expected valid cli args");

    let Commands::Config(args) = cli.command else {
        panic!("expected config command");
    };
    assert_eq!(args.set_api_key.as_deref(), Some("abc"));
    assert_eq!(args.set_sub_radius, Some(2_500.0));
    assert!(args.set_max_workers.is_none());
    assert!(args.show);
}

#[test]
fn subcommand_is_required() {
    assert!(Cli::try_parse_from(["bizfinder"]).is_err());
}
