use std::{env, env::VarError};

/// There's no real CLI for the server, so just do quick 'n dirty
pub fn handle_command_line_args() -> bool {
    let has_cli_args = env::args().count() > 1;
    if has_cli_args {
        // We don't expect any CLI args, so always print the help
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
    // Be explicit about which envars to print, so as to avoid accidentally exposing secrets
    const DISPLAY_ENVS: [&str; 19] = [
        "RUST_LOG",
        "KPG_HOST",
        "KPG_PORT",
        "KPG_DATABASE_URL",
        "KPG_PUBLIC_URL",
        "KPG_WEBHOOK_IP_WHITELIST",
        "KPG_USE_X_FORWARDED_FOR",
        "KPG_USE_FORWARDED",
        "KPG_NONCE_LIFETIME",
        "KPG_ENABLED",
        "KPG_TEST_MODE",
        "KPG_TID",
        "KPG_CID",
        "KPG_SHOP_CURRENCY",
        "KPG_SUPPORTED_CURRENCIES",
        "KPG_STORE_NAME",
        "KPG_PAYMENT_BASE_URL",
        "KPG_TEST_PAYMENT_BASE_URL",
        "KPG_USE_LOGGER",
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
