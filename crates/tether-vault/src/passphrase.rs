// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Vault passphrase acquisition.

use std::io::IsTerminal;

use secrecy::SecretString;
use tether_core::TetherError;

/// Environment variable holding the vault passphrase for unattended runs.
pub const PASSPHRASE_ENV_VAR: &str = "TETHER_VAULT_KEY";

/// Passphrase from the environment, if set and non-empty.
pub fn passphrase_from_env() -> Option<SecretString> {
    std::env::var(PASSPHRASE_ENV_VAR)
        .ok()
        .filter(|value| !value.is_empty())
        .map(SecretString::from)
}

/// Passphrase from the environment, else from an interactive prompt.
///
/// `confirm` asks twice, for creating a vault. Fails when neither source is
/// available.
pub fn read_passphrase(confirm: bool) -> Result<SecretString, TetherError> {
    if let Some(passphrase) = passphrase_from_env() {
        return Ok(passphrase);
    }
    if !std::io::stdin().is_terminal() {
        return Err(TetherError::Vault(format!(
            "no vault passphrase: set {PASSPHRASE_ENV_VAR} or run interactively"
        )));
    }

    let first = prompt("Vault passphrase: ")?;
    if first.is_empty() {
        return Err(TetherError::Vault("empty passphrase not allowed".to_string()));
    }
    if confirm && prompt("Confirm vault passphrase: ")? != first {
        return Err(TetherError::Vault("passphrases do not match".to_string()));
    }
    Ok(SecretString::from(first))
}

fn prompt(label: &str) -> Result<String, TetherError> {
    rpassword::prompt_password(label)
        .map_err(|e| TetherError::Vault(format!("failed to read passphrase: {e}")))
}

#[cfg(test)]
mod tests {
    use secrecy::ExposeSecret;
    use serial_test::serial;

    use super::*;

    #[test]
    #[serial]
    fn env_passphrase_is_used_without_prompt() {
        // SAFETY: env mutation is serialized across tests.
        unsafe { std::env::set_var(PASSPHRASE_ENV_VAR, "from-env") };
        let passphrase = read_passphrase(true);
        unsafe { std::env::remove_var(PASSPHRASE_ENV_VAR) };
        assert_eq!(passphrase.unwrap().expose_secret(), "from-env");
    }

    #[test]
    #[serial]
    fn empty_env_passphrase_counts_as_unset() {
        unsafe { std::env::set_var(PASSPHRASE_ENV_VAR, "") };
        let passphrase = passphrase_from_env();
        unsafe { std::env::remove_var(PASSPHRASE_ENV_VAR) };
        assert!(passphrase.is_none());
    }
}
