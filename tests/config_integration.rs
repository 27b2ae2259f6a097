use figment::Jail;
use gocardless_exporter::client::Environment;
use gocardless_exporter::config::{ConfigError, load_config};

#[test]
fn config_env_overrides_file() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.yaml",
            r#"
environment: live
token: from-file
bind_address: 127.0.0.1:5002
logging:
  level: debug
  format: json
"#,
        )?;
        jail.set_env("GOCARDLESS_ENVIRONMENT", "sandbox");
        jail.set_env("GOCARDLESS_LOGGING__LEVEL", "warn");

        let config = load_config().map_err(|e| e.to_string())?;
        assert_eq!(config.environment, Environment::Sandbox);
        assert_eq!(config.token.expose(), "from-file");
        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.logging.format, "json");
        Ok(())
    });
}

#[test]
fn config_from_environment_only() {
    Jail::expect_with(|jail| {
        jail.set_env("GOCARDLESS_TOKEN", "live_abc");
        jail.set_env("GOCARDLESS_PAGE_LIMIT", "250");

        let config = load_config().map_err(|e| e.to_string())?;
        assert_eq!(config.environment, Environment::Live);
        assert_eq!(config.token.expose(), "live_abc");
        assert_eq!(config.page_limit, 250);
        Ok(())
    });
}

#[test]
fn config_token_read_from_secret_file() {
    Jail::expect_with(|jail| {
        jail.create_file("token", "secret_from_mount\n")?;
        let path = jail.directory().join("token");
        jail.set_env("GOCARDLESS_TOKEN_FILE", path.display().to_string());

        let config = load_config().map_err(|e| e.to_string())?;
        assert_eq!(config.token.expose(), "secret_from_mount");
        Ok(())
    });
}

#[test]
fn config_without_token_fails_fast() {
    Jail::expect_with(|jail| {
        jail.set_env("GOCARDLESS_ENVIRONMENT", "sandbox");

        match load_config() {
            Err(ConfigError::MissingToken) => Ok(()),
            other => Err(format!("expected missing token, got {:?}", other.map(|_| ())).into()),
        }
    });
}

#[test]
fn config_file_location_can_be_overridden() {
    Jail::expect_with(|jail| {
        jail.create_file("exporter.yaml", "token: custom-location\npage_limit: 100\n")?;
        jail.set_env("GOCARDLESS_EXPORTER_CONFIG", "exporter.yaml");

        let config = load_config().map_err(|e| e.to_string())?;
        assert_eq!(config.token.expose(), "custom-location");
        assert_eq!(config.page_limit, 100);
        Ok(())
    });
}
