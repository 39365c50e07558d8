#[cfg(test)]
mod tests {
    use super::super::*;
    use std::io::Write;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.server.cors_origins, vec!["*"]);
        assert_eq!(config.chat.backend, ChatBackendKind::Keyword);
        assert_eq!(config.search.default_limit, 50);
        assert_eq!(config.search.max_limit, 1000);
        assert_eq!(config.search.fallback_size, 10);
        assert_eq!(config.graph.max_links_per_paper, 5);
        assert!((config.graph.similarity_threshold - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_partial_sections_keep_other_defaults() {
        let config = Config::from_toml_str(
            r#"
            [server]
            port = 8080

            [chat]
            backend = "azure"
            deployment = "gpt-4o"
            base_url = "https://example.openai.azure.com"

            [search]
            fallback_size = 3
            "#,
        )
        .unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.chat.backend, ChatBackendKind::Azure);
        assert_eq!(config.chat.deployment, "gpt-4o");
        assert_eq!(config.chat.api_version, "2024-02-15-preview");
        assert_eq!(config.search.fallback_size, 3);
        assert_eq!(config.search.default_limit, 50);
    }

    #[test]
    fn test_unknown_backend_is_rejected() {
        assert!(Config::from_toml_str("[chat]\nbackend = \"gemini\"\n").is_err());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[database]\npath = \"/tmp/papers.db\"").unwrap();
        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.database.path, "/tmp/papers.db");
    }

    #[test]
    fn test_sample_config_parses() {
        let sample = include_str!("../../../../spacebio.toml");
        let config = Config::from_toml_str(sample).unwrap();
        assert_eq!(config.chat.backend, ChatBackendKind::Keyword);
        assert!((config.search.weights.title - 3.0).abs() < 1e-12);
        assert_eq!(config.graph.iterations, 200);
    }

    #[test]
    fn test_api_key_missing_env() {
        let chat = ChatConfig {
            api_key_env: "SPACEBIO_TEST_KEY_THAT_IS_NEVER_SET".to_string(),
            ..ChatConfig::default()
        };
        assert!(chat.api_key().is_none());
    }
}
