use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use codeserver_form::commands::{kubeconfig, namespaces};
use codeserver_form::config::Settings;
use codeserver_form::RunOptions;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Settings file (YAML)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,
    /// Namespace to create the Codeserver in
    #[arg(long, short = 'n')]
    namespace: Option<String>,
    /// Kubeconfig context
    #[arg(long)]
    context: Option<String>,
    /// Proposed Codeserver name
    #[arg(long, default_value = "")]
    name: String,
    /// Rok Codeserver Lab URL to autofill from
    #[arg(long)]
    lab_url: Option<String>,
    /// Print the kubeconfig contexts as JSON and exit
    #[arg(long)]
    list_contexts: bool,
    /// Print the cluster's namespaces as JSON and exit
    #[arg(long)]
    list_namespaces: bool,
}

fn print_json<T: serde::Serialize>(value: &T) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let config_path = Settings::resolve_path(args.config.as_deref());
    let mut settings = match Settings::load_from(config_path.as_deref()) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };
    if let Some(ns) = args.namespace {
        settings.namespace = ns;
    }
    if args.context.is_some() {
        settings.context = args.context;
    }

    codeserver_form::init_logging(&settings.log_level);
    match config_path {
        Some(p) if p.exists() => log::info!("config: loaded {}", p.display()),
        Some(p) => log::info!("config: {} not found, using defaults", p.display()),
        None => log::info!("config: no config directory, using defaults"),
    }

    if args.list_contexts {
        return print_json(&kubeconfig::get_kubeconfig_contexts());
    }
    if args.list_namespaces {
        let names = match kubeconfig::client_for_context(settings.context.as_deref()).await {
            Ok(client) => namespaces::list_namespaces(client).await,
            Err(e) => Err(e),
        };
        return match names {
            Ok(names) => print_json(&names),
            Err(e) => {
                log::error!("{e}");
                ExitCode::FAILURE
            }
        };
    }

    let opts = RunOptions {
        name: args.name,
        lab_url: args.lab_url,
    };

    match codeserver_form::run(settings, opts).await {
        Ok(form) => print_json(&form),
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
