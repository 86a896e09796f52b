use super::*;
use std::collections::HashMap;

fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key: &str| vars.get(key).cloned()
}

fn resolve(options: &GlobalOptions, file: FileConfig, env: &[(&str, &str)]) -> ServerConfig {
    ServerConfig::resolve(options, file, &env_of(env)).unwrap()
}

mod defaults_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = resolve(&GlobalOptions::default(), FileConfig::default(), &[]);

        assert_eq!(config.database_uri, DEFAULT_DATABASE_URI);
        assert_eq!(config.listen_address(), "0.0.0.0:3000");
        assert_eq!(config.upload_dir, PathBuf::from("public/pdfs"));
        assert_eq!(config.max_upload_bytes, 10 * 1024 * 1024);
        assert_eq!(config.public_url, None);
        assert_eq!(config.retry, RetryPolicy::default());
        assert!(!config.log_json);
        assert!(config.notices.is_empty());
        assert_eq!(config.base_url(), "http://localhost:3000");
    }
}

mod layering_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn file() -> FileConfig {
        toml::from_str(
            r#"
            database_uri = "mongodb://file-host/db"
            port = 4000
            upload_dir = "/srv/pdfs"

            [retry]
            attempts = 2
            delay_secs = 1
            max_delay_secs = 8
            attempt_timeout_secs = 10

            [log]
            json = true
            filter = "warn"
            "#,
        )
        .unwrap()
    }

    #[test]
    fn test_file_overrides_defaults() {
        let config = resolve(&GlobalOptions::default(), file(), &[]);

        assert_eq!(config.database_uri, "mongodb://file-host/db");
        assert_eq!(config.port, 4000);
        assert_eq!(config.upload_dir, PathBuf::from("/srv/pdfs"));
        assert_eq!(config.retry.max_attempts(), 2);
        assert_eq!(config.retry.base_delay(), Duration::from_secs(1));
        assert_eq!(config.retry.max_delay(), Duration::from_secs(8));
        assert_eq!(config.retry.attempt_timeout(), Duration::from_secs(10));
        assert!(config.log_json);
        assert_eq!(config.log_filter.as_deref(), Some("warn"));
    }

    #[test]
    fn test_env_overrides_file() {
        let config = resolve(
            &GlobalOptions::default(),
            file(),
            &[
                ("MONGODB_URI", "mongodb://env-host/db"),
                ("PORT", "5000"),
                ("DOCQR_RETRY_ATTEMPTS", "7"),
                ("DOCQR_LOG_JSON", "off"),
            ],
        );

        assert_eq!(config.database_uri, "mongodb://env-host/db");
        assert_eq!(config.port, 5000);
        assert_eq!(config.retry.max_attempts(), 7);
        assert!(!config.log_json);
    }

    #[test]
    fn test_flags_override_env() {
        let options = GlobalOptions {
            database_uri: Some("memory://flag".to_string()),
            port: Some(6000),
            retry_exponential: true,
            ..GlobalOptions::default()
        };
        let config = resolve(
            &options,
            file(),
            &[("MONGODB_URI", "mongodb://env-host/db"), ("PORT", "5000")],
        );

        assert_eq!(config.database_uri, "memory://flag");
        assert_eq!(config.port, 6000);
        assert!(config.retry.is_exponential());
    }

    #[test]
    fn test_empty_env_values_are_ignored() {
        let config = resolve(
            &GlobalOptions::default(),
            FileConfig::default(),
            &[("MONGODB_URI", "  "), ("PORT", "")],
        );
        assert_eq!(config.database_uri, DEFAULT_DATABASE_URI);
        assert_eq!(config.port, DEFAULT_PORT);
    }
}

mod legacy_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_legacy_uri_variable_is_used_with_notice() {
        let config = resolve(
            &GlobalOptions::default(),
            FileConfig::default(),
            &[("MONGO_URI", "mongodb://legacy/db")],
        );

        assert_eq!(config.database_uri, "mongodb://legacy/db");
        assert_eq!(config.notices.len(), 1);
        assert!(config.notices[0].contains("MONGODB_URI"));
    }

    #[test]
    fn test_canonical_variable_wins_over_legacy() {
        let config = resolve(
            &GlobalOptions::default(),
            FileConfig::default(),
            &[
                ("MONGODB_URI", "mongodb://new/db"),
                ("MONGO_URI", "mongodb://legacy/db"),
            ],
        );

        assert_eq!(config.database_uri, "mongodb://new/db");
        assert!(config.notices.is_empty());
    }
}

mod validation_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn resolve_err(env: &[(&str, &str)]) -> ConfigError {
        ServerConfig::resolve(&GlobalOptions::default(), FileConfig::default(), &env_of(env))
            .unwrap_err()
    }

    #[test]
    fn test_bad_port() {
        let err = resolve_err(&[("PORT", "http")]);
        assert!(matches!(err, ConfigError::Invalid { key, .. } if key == "PORT"));
    }

    #[test]
    fn test_bad_flag() {
        let err = resolve_err(&[("DOCQR_RETRY_EXPONENTIAL", "maybe")]);
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn test_zero_upload_limit() {
        let err = resolve_err(&[("MAX_UPLOAD_BYTES", "0")]);
        assert!(matches!(err, ConfigError::Invalid { key, .. } if key == "max_upload_bytes"));
    }

    #[test]
    fn test_public_url_is_normalized() {
        let config = resolve(
            &GlobalOptions::default(),
            FileConfig::default(),
            &[("PUBLIC_URL", "https://docs.example.com/")],
        );
        assert_eq!(config.public_url.as_deref(), Some("https://docs.example.com"));
        assert_eq!(config.base_url(), "https://docs.example.com");
    }

    #[test]
    fn test_missing_public_url_is_warned_about() {
        let config = resolve(&GlobalOptions::default(), FileConfig::default(), &[]);
        let warning = config.public_url_warning().unwrap();
        assert!(warning.contains("PUBLIC_URL"), "{warning}");

        let config = resolve(
            &GlobalOptions::default(),
            FileConfig::default(),
            &[("PUBLIC_URL", "https://docs.example.com")],
        );
        assert_eq!(config.public_url_warning(), None);
    }

    #[test]
    fn test_public_url_needs_http_scheme() {
        let err = resolve_err(&[("PUBLIC_URL", "ftp://docs.example.com")]);
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn test_unknown_file_keys_are_rejected() {
        let result: Result<FileConfig, _> = toml::from_str("prot = 3000");
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = FileConfig::read(Path::new("/nonexistent/docqr.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/docqr.toml"));
    }
}
