//! CLI parsing tests.

use clap::Parser;
use fuseline::cli::{Cli, Command};

#[test]
fn run_parses_pipeline_flags() {
    let cli = Cli::try_parse_from([
        "fuseline",
        "run",
        "--api-key",
        "key-1",
        "--app",
        "demo.apk",
        "--fusion-set-id",
        "FS1",
        "--private-signing",
        "--signing-fingerprint",
        "AA:BB",
        "--output",
        "fused.apk",
    ])
    .unwrap();

    let Command::Run(args) = cli.command else {
        panic!("expected the run subcommand");
    };
    assert_eq!(args.common.api_key.as_deref(), Some("key-1"));
    assert_eq!(args.app.as_deref(), Some(std::path::Path::new("demo.apk")));
    assert_eq!(args.fusion_set_id.as_deref(), Some("FS1"));
    assert!(args.private_signing);
    assert!(!args.sign_on_service);
    assert_eq!(args.signing.signing_fingerprint.as_deref(), Some("AA:BB"));
    assert_eq!(args.outputs.output.as_deref(), Some(std::path::Path::new("fused.apk")));
}

#[test]
fn run_accepts_multiple_provisioning_profiles() {
    let cli = Cli::try_parse_from([
        "fuseline",
        "run",
        "--app",
        "demo.ipa",
        "--sign-on-service",
        "--keystore",
        "dist.p12",
        "--keystore-pass",
        "secret",
        "--provisioning-profiles",
        "a.mobileprovision",
        "b.mobileprovision",
    ])
    .unwrap();

    let Command::Run(args) = cli.command else {
        panic!("expected the run subcommand");
    };
    assert_eq!(args.signing.provisioning_profiles.len(), 2);
}

#[test]
fn signing_subcommands_share_argument_shape() {
    for name in ["sign", "private-sign", "auto-dev-sign"] {
        let cli = Cli::try_parse_from([
            "fuseline",
            name,
            "--task-id",
            "T1",
            "--signing-fingerprint",
            "AA:BB",
        ])
        .unwrap();
        let args = match cli.command {
            Command::Sign(args) | Command::PrivateSign(args) | Command::AutoDevSign(args) => args,
            other => panic!("expected a signing subcommand, got {other:?}"),
        };
        assert_eq!(args.task_id, "T1");
        assert_eq!(args.signing.signing_fingerprint.as_deref(), Some("AA:BB"));
    }
}

#[test]
fn upload_requires_an_app() {
    assert!(Cli::try_parse_from(["fuseline", "upload"]).is_err());
    let cli = Cli::try_parse_from(["fuseline", "upload", "--app", "demo.apk", "--direct"]).unwrap();
    let Command::Upload(args) = cli.command else {
        panic!("expected the upload subcommand");
    };
    assert!(args.direct);
}

#[test]
fn download_requires_task_and_output() {
    assert!(Cli::try_parse_from(["fuseline", "download", "--task-id", "T1"]).is_err());
    assert!(Cli::try_parse_from([
        "fuseline",
        "download",
        "--task-id",
        "T1",
        "--output",
        "out.apk"
    ])
    .is_ok());
}

#[test]
fn context_parses_rebranding_flags() {
    let cli = Cli::try_parse_from([
        "fuseline",
        "context",
        "--task-id",
        "T1",
        "--new-display-name",
        "White Label",
        "--icon-overlay",
        "overlay.png",
    ])
    .unwrap();
    let Command::Context(args) = cli.command else {
        panic!("expected the context subcommand");
    };
    let options = args.flags.to_options();
    assert!(options.is_requested());
    assert_eq!(options.new_display_name.as_deref(), Some("White Label"));
}

#[test]
fn unknown_subcommand_fails_to_parse() {
    assert!(Cli::try_parse_from(["fuseline", "frobnicate"]).is_err());
}
