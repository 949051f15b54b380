use std::{env, env::VarError};

use crate::config::{
    DEFAULT_ACCRUAL_CONCURRENCY,
    DEFAULT_ACCRUAL_IDLE_INTERVAL_MS,
    DEFAULT_ACCRUAL_SYSTEM_ADDRESS,
    DEFAULT_ACCRUAL_TIMEOUT_SECS,
    DEFAULT_DATABASE_URL,
    DEFAULT_LP_HOST,
    DEFAULT_LP_PORT,
};

/// The server takes no arguments. If any are given, print the help text and the current configuration, and tell the
/// caller to exit.
pub fn handle_command_line_args() -> bool {
    let has_cli_args = env::args().count() > 1;
    if has_cli_args {
        display_readme();
        display_envs();
    }
    has_cli_args
}

fn display_readme() {
    const README: &str = include_str!("./cli-help.txt");
    println!("\n{README}\n");
}

fn display_envs() {
    let port = DEFAULT_LP_PORT.to_string();
    let concurrency = DEFAULT_ACCRUAL_CONCURRENCY.to_string();
    let idle = DEFAULT_ACCRUAL_IDLE_INTERVAL_MS.to_string();
    let timeout = DEFAULT_ACCRUAL_TIMEOUT_SECS.to_string();
    // Be explicit about which envars to print, so as to avoid accidentally exposing secrets
    let display_envs: [(&str, &str); 9] = [
        ("RUST_LOG", "error"),
        ("LP_HOST", DEFAULT_LP_HOST),
        ("LP_PORT", &port),
        ("LP_DATABASE_URL", DEFAULT_DATABASE_URL),
        ("LP_AUTO_MIGRATE", "true"),
        ("LP_ACCRUAL_SYSTEM_ADDRESS", DEFAULT_ACCRUAL_SYSTEM_ADDRESS),
        ("LP_ACCRUAL_CONCURRENCY", &concurrency),
        ("LP_ACCRUAL_IDLE_INTERVAL_MS", &idle),
        ("LP_ACCRUAL_TIMEOUT_SECS", &timeout),
    ];

    println!("Current environment values:");
    println!("  {:<35} {:<30} {}", "Variable", "Value", "Default");
    display_envs.iter().for_each(|&(name, default)| {
        let val = match env::var(name) {
            Ok(s) => s,
            Err(VarError::NotPresent) => "Not set".into(),
            Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
        };
        println!("  {name:<35} {val:<30} {default}");
    })
}
