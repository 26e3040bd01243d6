use std::{env, env::VarError};

/// There's no real CLI for the server, so just do quick 'n dirty
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
    // Only variables without secrets are listed
    const DISPLAY_ENVS: [&str; 10] = [
        "RUST_LOG",
        "KPG_HOST",
        "KPG_PORT",
        "KPG_DATABASE_URL",
        "KPG_PROVIDER_TIMEOUT_SECS",
        "KPG_CASH_PREFIX",
        "KPG_GATEWAY_PREFIX",
        "KPG_ENABLED_PAYMENT_METHODS",
        "KPG_MIDTRANS_ENVIRONMENT",
        "KPG_MIDTRANS_SIGNATURE_CHECKS",
    ];

    println!("Current environment values (EXCLUDING variables that contain secrets):");
    DISPLAY_ENVS.iter().for_each(|&name| {
        let val = match env::var(name) {
            Ok(s) => s,
            Err(VarError::NotPresent) => "Not set".into(),
            Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
        };
        println!("  {name:<35} {val:<15}");
    })
}
