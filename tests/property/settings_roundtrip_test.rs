//! Property-based tests for SyncSettings serialization round-trip.
//!
//! Settings written by the engine must load back unchanged for arbitrary
//! valid values.

use dotpush::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use dotpush::types::settings::{
    ExtractionSettings, GitHubSettings, PollingSettings, RepositorySettings, SyncSettings,
};
use proptest::prelude::*;

fn arb_github_settings() -> impl Strategy<Value = GitHubSettings> {
    (
        "[A-Za-z0-9.]{4,24}",
        prop_oneof![Just("public_repo".to_string()), Just("repo".to_string())],
        "https://[a-z]{3,12}\\.example",
        "https://api\\.[a-z]{3,12}\\.example",
        "[A-Za-z-]{3,20}",
    )
        .prop_map(|(client_id, scope, oauth_base_url, api_base_url, user_agent)| GitHubSettings {
            client_id,
            scope,
            oauth_base_url,
            api_base_url,
            user_agent,
        })
}

fn arb_repository_settings() -> impl Strategy<Value = RepositorySettings> {
    (
        "[a-z][a-z0-9-]{0,20}",
        "[a-z]{0,12}",
        "[a-z]{1,10}",
        "\\PC{0,40}",
        any::<bool>(),
    )
        .prop_map(|(name, directory, branch, description, private)| RepositorySettings {
            name,
            directory,
            branch,
            description,
            private,
        })
}

fn arb_polling_settings() -> impl Strategy<Value = PollingSettings> {
    (1u64..60, 1u64..60, 60u64..3600, 1u64..10, 10u64..900).prop_map(
        |(slow_down_increment_secs, default_interval_secs, default_expires_in_secs, ui_refresh_interval_secs, ui_refresh_timeout_secs)| {
            PollingSettings {
                slow_down_increment_secs,
                default_interval_secs,
                default_expires_in_secs,
                ui_refresh_interval_secs,
                ui_refresh_timeout_secs,
            }
        },
    )
}

fn arb_settings() -> impl Strategy<Value = SyncSettings> {
    (
        arb_github_settings(),
        arb_repository_settings(),
        arb_polling_settings(),
        0usize..100,
    )
        .prop_map(|(github, repository, polling, min_length)| SyncSettings {
            github,
            repository,
            polling,
            extraction: ExtractionSettings { min_length },
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn settings_json_roundtrip(settings in arb_settings()) {
        let json = serde_json::to_string(&settings).unwrap();
        let back: SyncSettings = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(back, settings);
    }

    #[test]
    fn settings_survive_save_and_load(settings in arb_settings()) {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("settings.json").to_string_lossy().to_string();

        let mut engine = SettingsEngine::new(Some(path.clone()));
        for (key, value) in [
            ("github.client_id", serde_json::json!(settings.github.client_id)),
            ("repository.name", serde_json::json!(settings.repository.name)),
            ("repository.private", serde_json::json!(settings.repository.private)),
            ("polling.default_interval_secs", serde_json::json!(settings.polling.default_interval_secs)),
            ("extraction.min_length", serde_json::json!(settings.extraction.min_length)),
        ] {
            engine.set_value(key, value).unwrap();
        }

        let mut reloaded = SettingsEngine::new(Some(path));
        let loaded = reloaded.load().unwrap();
        prop_assert_eq!(&loaded.github.client_id, &settings.github.client_id);
        prop_assert_eq!(&loaded.repository.name, &settings.repository.name);
        prop_assert_eq!(loaded.repository.private, settings.repository.private);
        prop_assert_eq!(loaded.polling.default_interval_secs, settings.polling.default_interval_secs);
        prop_assert_eq!(loaded.extraction.min_length, settings.extraction.min_length);
    }
}
