use super::{Cli, Commands, OutputFormat};
use clap::Parser;

#[test]
fn validate_command_parses() {
    let cli = Cli::try_parse_from([
        "taskwire-runner",
        "validate",
        "--template",
        "plan.json",
        "--format",
        "json",
    ])
    .expect("must parse");
    match cli.command {
        Commands::Validate(command) => {
            assert_eq!(command.template.to_str(), Some("plan.json"));
            assert_eq!(command.format, OutputFormat::Json);
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn run_command_collects_repeated_meta() {
    let cli = Cli::try_parse_from([
        "taskwire-runner",
        "run",
        "--template",
        "plan.yaml",
        "--bindings",
        "services.yaml",
        "--input",
        "{\"page\":1}",
        "--meta",
        "tenant=acme",
        "--meta",
        "env=staging",
        "--events-jsonl",
        "-",
    ])
    .expect("must parse");
    match cli.command {
        Commands::Run(command) => {
            assert_eq!(command.meta, vec!["tenant=acme", "env=staging"]);
            assert_eq!(command.events_jsonl.as_deref(), Some("-"));
            assert!(command.bindings.is_some());
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn canon_defaults_to_full_output() {
    let cli = Cli::try_parse_from(["taskwire-runner", "canon", "--template", "plan.json"])
        .expect("must parse");
    match cli.command {
        Commands::Canon(command) => assert!(!command.digest),
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn missing_template_is_rejected() {
    assert!(Cli::try_parse_from(["taskwire-runner", "validate"]).is_err());
}
