// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `main.rs` - command line parsing

#[cfg(test)]
mod tests {
    use super::super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["domain-manager", "create-domains"]).unwrap();

        assert_eq!(cli.config, PathBuf::from(DEFAULT_CONFIG_PATH));
        assert_eq!(cli.throttle_initial_ms, THROTTLE_INITIAL_INTERVAL_MILLIS);
        assert_eq!(cli.throttle_max_attempts, THROTTLE_MAX_ATTEMPTS);
        assert_eq!(
            cli.command.operation(),
            Some(LifecycleOperation::CreateDomains)
        );
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "domain-manager",
            "sync-mappings",
            "--stage",
            "prod",
            "--config",
            "deploy/serverless.yml",
            "--throttle-max-attempts",
            "3",
            "--debug",
        ])
        .unwrap();

        assert_eq!(cli.stage.as_deref(), Some("prod"));
        assert_eq!(cli.config, PathBuf::from("deploy/serverless.yml"));
        assert_eq!(cli.throttle_max_attempts, 3);
        assert!(cli.debug);
        assert_eq!(cli.command.operation(), Some(LifecycleOperation::SyncMappings));
    }

    #[test]
    fn test_completions_has_no_operation() {
        let cli = Cli::try_parse_from(["domain-manager", "completions", "bash"]).unwrap();
        assert!(cli.command.operation().is_none());
    }

    #[test]
    fn test_unknown_subcommand_is_rejected() {
        assert!(Cli::try_parse_from(["domain-manager", "deploy"]).is_err());
    }

    #[test]
    fn test_write_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("outputs.json");

        write_json(&path, &serde_json::json!({ "aliasTarget": "d1.cloudfront.net" })).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("d1.cloudfront.net"));
    }
}
