// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod logging;
mod runtime;

use anyhow::{Context, Result, anyhow};
use config::Config;
use runtime::Runtime;
use salesdesk_app::SessionContext;
use std::env;
use std::path::PathBuf;

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `salesdesk --print-example-config` to generate a v1 template",
            options.config_path.display()
        )
    })?;
    logging::init(config.log_level(), config.log_file())?;

    let db_path = config.db_path()?;
    let runtime = Runtime::from_config(&config, &db_path)?;

    if let Some(token) = &options.set_token {
        runtime.store_token(token)?;
        println!("access token stored in {}", db_path.display());
        return Ok(());
    }

    if options.logout {
        runtime.logout()?;
        println!("signed out; tokens removed from {}", db_path.display());
        return Ok(());
    }

    if options.check_only {
        let count = runtime.client().check().with_context(|| {
            format!(
                "check {}; fix [api].base_url or store a token with --set-token",
                runtime.client().base_url()
            )
        })?;
        let signed_in = runtime.session().access_token()?.is_some();
        println!(
            "ok: {count} orders at {} ({})",
            runtime.client().base_url(),
            if signed_in { "token stored" } else { "no token" }
        );
        return Ok(());
    }

    let (mut view, events) = runtime.order_view()?;
    salesdesk_tui::run_app(&mut view, &events)
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    print_config_path: bool,
    print_example: bool,
    check_only: bool,
    set_token: Option<String>,
    logout: bool,
    show_help: bool,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        print_config_path: false,
        print_example: false,
        check_only: false,
        set_token: None,
        logout: false,
        show_help: false,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_ref() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--check" => {
                options.check_only = true;
            }
            "--set-token" => {
                let value = iter.next().ok_or_else(|| {
                    anyhow!("--set-token requires the access token issued at sign-in")
                })?;
                options.set_token = Some(value.as_ref().to_owned());
            }
            "--logout" => {
                options.logout = true;
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            unknown => {
                return Err(anyhow!(
                    "unknown argument {unknown:?}; run with --help to see supported options"
                ));
            }
        }
    }

    if options.set_token.is_some() && options.logout {
        return Err(anyhow!("--set-token and --logout cannot be combined"));
    }

    Ok(options)
}

fn print_help() {
    println!("salesdesk: sales order list");
    println!("  --config <path>          Use a specific config path");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-example-config   Print a v1 config template");
    println!("  --check                  Validate config, session store and API reachability");
    println!("  --set-token <token>      Store an access token for API requests");
    println!("  --logout                 Remove stored tokens");
    println!("  --help                   Show this help");
}

#[cfg(test)]
mod tests {
    use super::{CliOptions, parse_cli_args};
    use anyhow::Result;
    use std::path::PathBuf;

    fn default_options_path() -> PathBuf {
        PathBuf::from("/tmp/salesdesk-config.toml")
    }

    #[test]
    fn parse_cli_args_defaults_to_provided_config_path() -> Result<()> {
        let options = parse_cli_args(Vec::<String>::new(), default_options_path())?;
        assert_eq!(
            options,
            CliOptions {
                config_path: default_options_path(),
                print_config_path: false,
                print_example: false,
                check_only: false,
                set_token: None,
                logout: false,
                show_help: false,
            }
        );
        Ok(())
    }

    #[test]
    fn parse_cli_args_sets_config_path_override() -> Result<()> {
        let options = parse_cli_args(
            vec!["--config", "/custom/config.toml"],
            default_options_path(),
        )?;
        assert_eq!(options.config_path, PathBuf::from("/custom/config.toml"));
        Ok(())
    }

    #[test]
    fn parse_cli_args_errors_for_missing_values() {
        let error = parse_cli_args(vec!["--config"], default_options_path())
            .expect_err("missing config value should fail");
        assert!(error.to_string().contains("--config requires a file path"));

        let error = parse_cli_args(vec!["--set-token"], default_options_path())
            .expect_err("missing token should fail");
        assert!(error.to_string().contains("--set-token requires"));
    }

    #[test]
    fn parse_cli_args_errors_for_unknown_argument() {
        let error = parse_cli_args(vec!["--wat"], default_options_path())
            .expect_err("unknown arg should fail");
        let message = error.to_string();
        assert!(message.contains("unknown argument"));
        assert!(message.contains("--help"));
    }

    #[test]
    fn parse_cli_args_reads_session_flags() -> Result<()> {
        let options = parse_cli_args(vec!["--set-token", "abc123"], default_options_path())?;
        assert_eq!(options.set_token.as_deref(), Some("abc123"));
        assert!(!options.logout);

        let options = parse_cli_args(vec!["--logout"], default_options_path())?;
        assert!(options.logout);

        let error = parse_cli_args(
            vec!["--logout", "--set-token", "abc123"],
            default_options_path(),
        )
        .expect_err("conflicting session flags should fail");
        assert!(error.to_string().contains("cannot be combined"));
        Ok(())
    }

    #[test]
    fn parse_cli_args_sets_print_and_check_flags() -> Result<()> {
        let options = parse_cli_args(
            vec!["--print-config-path", "--print-example-config", "--check"],
            default_options_path(),
        )?;
        assert!(options.print_config_path);
        assert!(options.print_example);
        assert!(options.check_only);
        assert!(!options.show_help);
        Ok(())
    }

    #[test]
    fn parse_cli_args_sets_help_flag_for_long_and_short_variants() -> Result<()> {
        assert!(parse_cli_args(vec!["--help"], default_options_path())?.show_help);
        assert!(parse_cli_args(vec!["-h"], default_options_path())?.show_help);
        Ok(())
    }
}
