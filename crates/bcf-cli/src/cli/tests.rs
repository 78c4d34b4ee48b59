//! CLI parse tests.

use super::{Cli, CliCommand};
use clap::Parser;
use std::path::{Path, PathBuf};

fn parse(args: &[&str]) -> CliCommand {
    let cli = Cli::try_parse_from(args).unwrap();
    cli.command
}

#[test]
fn cli_parse_fetch_defaults() {
    match parse(&["bcf", "fetch", "dQw4w9WgXcQ"]) {
        CliCommand::Fetch(args) => {
            assert_eq!(args.items, vec!["dQw4w9WgXcQ".to_string()]);
            assert!(args.input.is_none());
            assert_eq!(args.output_dir, PathBuf::from("."));
            assert!(args.proxies.is_empty());
            assert!(args.proxy_file.is_none());
            assert!(args.public_proxies.is_none());
            assert!(!args.direct);
            assert!(args.jobs.is_none());
            assert!(args.delay_ms.is_none());
            assert!(args.timeout.is_none());
            assert!(args.languages.is_empty());
            assert!(args.limit.is_none());
            assert!(!args.overwrite);
            assert!(!args.no_preflight);
        }
        _ => panic!("expected Fetch"),
    }
}

#[test]
fn cli_parse_fetch_all_flags() {
    match parse(&[
        "bcf",
        "fetch",
        "--input",
        "ids.txt",
        "--output-dir",
        "caps",
        "--proxy",
        "http://a:1",
        "--proxy",
        "http://b:2",
        "--proxy-file",
        "proxies.txt",
        "--public-proxies",
        "25",
        "--direct",
        "--jobs",
        "8",
        "--delay-ms",
        "250",
        "--timeout",
        "10",
        "-l",
        "de",
        "--language",
        "en",
        "--limit",
        "50",
        "--overwrite",
        "--no-preflight",
    ]) {
        CliCommand::Fetch(args) => {
            assert!(args.items.is_empty());
            assert_eq!(args.input.as_deref(), Some(Path::new("ids.txt")));
            assert_eq!(args.output_dir, PathBuf::from("caps"));
            assert_eq!(
                args.proxies,
                vec!["http://a:1".to_string(), "http://b:2".to_string()]
            );
            assert_eq!(args.proxy_file.as_deref(), Some(Path::new("proxies.txt")));
            assert_eq!(args.public_proxies, Some(25));
            assert!(args.direct);
            assert_eq!(args.jobs, Some(8));
            assert_eq!(args.delay_ms, Some(250));
            assert_eq!(args.timeout, Some(10));
            assert_eq!(args.languages, vec!["de".to_string(), "en".to_string()]);
            assert_eq!(args.limit, Some(50));
            assert!(args.overwrite);
            assert!(args.no_preflight);
        }
        _ => panic!("expected Fetch"),
    }
}

#[test]
fn cli_parse_probe_defaults() {
    match parse(&["bcf", "probe", "--proxy", "http://a:1"]) {
        CliCommand::Probe(args) => {
            // Known-good probe id with captions since 2005.
            assert_eq!(args.item, "jNQXAC9IVRw");
            assert_eq!(args.proxies, vec!["http://a:1".to_string()]);
            assert!(args.proxy_file.is_none());
            assert!(args.timeout.is_none());
        }
        _ => panic!("expected Probe"),
    }
}

#[test]
fn cli_parse_probe_custom_item() {
    match parse(&["bcf", "probe", "dQw4w9WgXcQ", "--timeout", "5"]) {
        CliCommand::Probe(args) => {
            assert_eq!(args.item, "dQw4w9WgXcQ");
            assert_eq!(args.timeout, Some(5));
        }
        _ => panic!("expected Probe"),
    }
}

#[test]
fn cli_rejects_unknown_subcommand() {
    assert!(Cli::try_parse_from(["bcf", "download", "x"]).is_err());
}
