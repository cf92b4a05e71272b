// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Tether configuration system.

use figment::Jail;
use tether_config::diagnostic::ConfigError;
use tether_config::{
    load_and_validate_str, load_config, load_config_from_path, load_config_from_str,
};

#[test]
fn full_toml_deserializes() {
    let toml = r##"
[agent]
name = "desk-bot"
log_level = "debug"

[slack]
app_token = "xapp-1"
bot_token = "xoxb-1"
monitored_channels = ["#c0123abcd, C0456EFGH"]
auto_connect = false
command_prefix = "!claude"

[runner]
executable_path = "/opt/bin/claude"
prompt_args = ["--print"]
timeout_secs = 30

[memory]
max_turns_per_thread_context = 4
max_stored_thread_contexts = 10

[history]
max_history_items = 50
database_path = "/tmp/tether-test.db"

[notify]
on_completion = false

[reconnect]
enabled = false
initial_backoff_secs = 2
max_backoff_secs = 20
"##;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.agent.name, "desk-bot");
    assert_eq!(config.slack.bot_token.as_deref(), Some("xoxb-1"));
    assert_eq!(
        config.slack.normalized_channel_ids(),
        vec!["C0123ABCD", "C0456EFGH"]
    );
    assert!(!config.slack.auto_connect);
    assert_eq!(config.slack.command_prefix, "!claude");
    assert_eq!(config.runner.prompt_args, vec!["--print"]);
    assert_eq!(config.runner.timeout_secs, 30);
    assert_eq!(config.memory.max_turns_per_thread_context, 4);
    assert_eq!(config.history.max_history_items, 50);
    assert!(!config.notify.on_completion);
    assert!(!config.reconnect.enabled);
}

#[test]
fn empty_toml_yields_defaults() {
    let config = load_and_validate_str("").expect("defaults are valid");
    assert_eq!(config.runner.executable_path, "/usr/local/bin/claude");
    assert_eq!(config.memory.max_stored_thread_contexts, 200);
    assert!(config.slack.app_token.is_none());
}

#[test]
fn unknown_key_gets_suggestion() {
    let toml = "[slack]\nbot_tokn = \"xoxb\"\n";
    let errors = load_and_validate_str(toml).expect_err("unknown key must be rejected");
    assert!(
        errors.iter().any(|e| matches!(
            e,
            ConfigError::UnknownKey { key, suggestion: Some(s), .. }
                if key == "bot_tokn" && s == "bot_token"
        )),
        "expected a bot_token suggestion, got {errors:?}"
    );
}

#[test]
fn wrong_type_is_reported() {
    let toml = "[history]\nmax_history_items = \"lots\"\n";
    let errors = load_and_validate_str(toml).expect_err("string is not a usize");
    assert!(matches!(errors[0], ConfigError::InvalidType { .. }));
}

#[test]
fn validation_errors_surface() {
    let toml = "[memory]\nmax_turns_per_thread_context = 0\n";
    let errors = load_and_validate_str(toml).expect_err("zero turns is invalid");
    assert!(matches!(
        &errors[0],
        ConfigError::Validation { key, .. } if key == "memory.max_turns_per_thread_context"
    ));
}

#[test]
fn env_overrides_file_values() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "tether.toml",
            "[runner]\nexecutable_path = \"/from/file\"\ntimeout_secs = 5\n",
        )?;
        jail.set_env("TETHER_RUNNER_EXECUTABLE_PATH", "/from/env");
        jail.set_env("TETHER_SLACK_BOT_TOKEN", "xoxb-env");
        jail.set_env("TETHER_VAULT_KEY", "not-a-config-key");

        let config = load_config()?;
        assert_eq!(config.runner.executable_path, "/from/env");
        assert_eq!(config.runner.timeout_secs, 5);
        assert_eq!(config.slack.bot_token.as_deref(), Some("xoxb-env"));
        Ok(())
    });
}

#[test]
fn token_from_env_alone_loads() {
    Jail::expect_with(|jail| {
        jail.set_env("TETHER_SLACK_BOT_TOKEN", "xoxb-only-env");
        jail.set_env("TETHER_SLACK_APP_TOKEN", "xapp-only-env");

        let config = load_config()?;
        assert_eq!(config.slack.bot_token.as_deref(), Some("xoxb-only-env"));
        assert_eq!(config.slack.app_token.as_deref(), Some("xapp-only-env"));
        Ok(())
    });
}

#[test]
fn env_overrides_apply_to_explicit_path() {
    Jail::expect_with(|jail| {
        jail.create_file("custom.toml", "[memory]\nmax_stored_thread_contexts = 10\n")?;
        jail.set_env("TETHER_MEMORY_MAX_STORED_THREAD_CONTEXTS", "3");
        jail.set_env("TETHER_RECONNECT_INITIAL_BACKOFF_SECS", "2");

        let config = load_config_from_path(&jail.directory().join("custom.toml"))?;
        assert_eq!(config.memory.max_stored_thread_contexts, 3);
        assert_eq!(config.reconnect.initial_backoff_secs, 2);
        Ok(())
    });
}
