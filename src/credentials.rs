//! Interactive capture of provisioning credentials.
//!
//! Install and uninstall runs need an administrative login per target. The
//! orchestration core only sees the [`CredentialSource`] trait, so it stays
//! testable without a terminal.

use std::io::{self, Write};

/// Inputs gathered for one target before a provisioning run.
#[derive(Debug, Clone)]
pub struct SetupCredentials {
    pub username: String,
    pub password: String,
    /// May be empty; the orchestrator substitutes the default policy name.
    pub policy_name: String,
}

pub trait CredentialSource {
    fn credentials_for(&mut self, target_name: &str) -> anyhow::Result<SetupCredentials>;
}

/// Reads credentials from the terminal, with the password masked.
pub struct TerminalPrompt;

impl CredentialSource for TerminalPrompt {
    fn credentials_for(&mut self, target_name: &str) -> anyhow::Result<SetupCredentials> {
        println!("Configuring target: {target_name}");
        let username = prompt_line("Username: ")?;
        let password = rpassword::prompt_password("Password: ")?;
        let policy_name = prompt_line(&format!(
            "Policy name [leave empty for default value: {}]: ",
            crate::nitro::resources::DEFAULT_CMD_POLICY_NAME
        ))?;
        Ok(SetupCredentials {
            username,
            password,
            policy_name,
        })
    }
}

fn prompt_line(prompt: &str) -> anyhow::Result<String> {
    print!("{prompt}");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}
