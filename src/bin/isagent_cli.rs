//! isagent-cli — 命令行分类工具：查询当前客户端是代理还是人类
//!
//! Usage:
//!   isagent-cli classify [--token <t>] [--base-url <url>] [--config <file>]
//!   isagent-cli version
//!   isagent-cli help

use anyhow::{bail, Context};
use is_agent::{ClientConfig, IsAgentClient};
use tracing_subscriber::EnvFilter;

fn main() {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_usage();
        std::process::exit(1);
    }

    let result = match args[1].as_str() {
        "classify" => cmd_classify(&args[2..]),
        "version" | "--version" | "-V" => {
            cmd_version();
            Ok(())
        }
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {other}");
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(2);
    }
}

fn print_usage() {
    println!(
        r#"isagent-cli — agent-vs-human classification

USAGE:
    isagent-cli <COMMAND> [OPTIONS]

COMMANDS:
    classify [--token <t>] [--base-url <url>] [--config <file>]
                                Classify this client and print the result
    version                     Show version information
    help                        Show this help message

ENVIRONMENT:
    ISAGENT_PUBLIC_TOKEN        Public token used when --token is absent
    ISAGENT_BASE_URL            Endpoint base URL
    ISAGENT_HTTP_TIMEOUT_SECS   Request timeout in seconds
    ISAGENT_PROXY_URL           Proxy for outbound requests
    RUST_LOG                    Log filter (default: info)"#
    );
}

fn cmd_version() {
    println!("isagent-cli {}", env!("CARGO_PKG_VERSION"));
}

fn flag_value<'a>(args: &'a [String], name: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == name)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

fn cmd_classify(args: &[String]) -> anyhow::Result<()> {
    init_logging();

    let mut config = match flag_value(args, "--config") {
        Some(path) => ClientConfig::from_yaml_file(path)?.with_env_overrides(),
        None => ClientConfig::from_env(),
    };
    if let Some(url) = flag_value(args, "--base-url") {
        config = config.with_base_url(url);
    }
    if let Some(token) = flag_value(args, "--token") {
        config = config.with_public_token(token);
    }
    if config.public_token.is_none() {
        bail!("missing public token: pass --token or set ISAGENT_PUBLIC_TOKEN");
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    runtime.block_on(async move {
        let client = IsAgentClient::builder().config(config).build()?;
        let mut observer = client.default_context()?.observe();
        let state = observer.settled().await;

        if let Some(e) = state.error() {
            bail!("classification failed: {e}");
        }
        match state.is_agent_client_hint() {
            Some(true) => println!("isAgent: true\nYou are likely an agent or robot."),
            _ => println!("isAgent: false\nYou are likely a human."),
        }
        if let Some(identity) = state.identity() {
            println!("identity: {identity}");
        }
        Ok(())
    })
}
