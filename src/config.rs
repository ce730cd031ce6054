//! Configuração do Nexus carregada a partir de `nexus.toml`.
//!
//! A struct [`NexusConfig`] contém todos os parâmetros configuráveis.
//! Valores não presentes no arquivo usam defaults sensíveis.
//! As variáveis de ambiente `NEXUS_API_URL` e `NEXUS_TOKEN` têm precedência sobre o arquivo.

use std::path::Path;

use serde::Deserialize;

use crate::error::NexusError;

pub const CONFIG_FILE: &str = "nexus.toml";

/// Configuração de nível superior carregada de `nexus.toml`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NexusConfig {
    /// URL base do backend.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Tempo máximo de uma requisição, em segundos.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Tempo máximo para abrir a conexão, em segundos.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Token de acesso já emitido pelo serviço de autenticação.
    #[serde(default)]
    pub token: Option<String>,
}

// Valor padrão para a URL do backend: servidor local.
fn default_api_url() -> String {
    "http://localhost:8080".to_string()
}

// Valor padrão para o timeout da requisição: 10s.
fn default_timeout_secs() -> u64 {
    10
}

fn default_connect_timeout_secs() -> u64 {
    5
}

impl Default for NexusConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            token: None,
        }
    }
}

impl NexusConfig {
    /// Carrega a configuração de `nexus.toml` no diretório atual.
    /// Usa valores padrão se o arquivo não existir.
    pub fn load() -> Result<Self, NexusError> {
        let mut config = Self::load_file(Path::new(CONFIG_FILE))?;
        config.apply_env(|k| std::env::var(k).ok());
        Ok(config)
    }

    /// Carrega um arquivo específico, sem olhar o ambiente.
    pub fn load_from(path: &Path) -> Result<Self, NexusError> {
        let contents = std::fs::read_to_string(path)?;
        let config = toml::from_str::<NexusConfig>(&contents)?;
        config.validate()?;
        Ok(config)
    }

    fn load_file(path: &Path) -> Result<Self, NexusError> {
        if path.exists() {
            Self::load_from(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Aplica as variáveis de ambiente sobre os valores do arquivo.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("NEXUS_API_URL").filter(|v| !v.trim().is_empty()) {
            self.api_url = url;
        }
        if let Some(token) = lookup("NEXUS_TOKEN").filter(|v| !v.trim().is_empty()) {
            self.token = Some(token);
        }
    }

    fn validate(&self) -> Result<(), NexusError> {
        if !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://")) {
            return Err(NexusError::Config(format!(
                "api_url deve começar com http:// ou https://: {}",
                self.api_url
            )));
        }
        if self.timeout_secs == 0 {
            return Err(NexusError::Config("timeout_secs deve ser maior que zero".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_values() {
        let config = NexusConfig::default();
        assert_eq!(config.api_url, "http://localhost:8080");
        assert_eq!(config.timeout_secs, 10);
        assert_eq!(config.connect_timeout_secs, 5);
        assert!(config.token.is_none());
    }

    #[test]
    fn deserialize_partial_toml() {
        let toml_str = r#"
            api_url = "https://nexus.interno:8443"
            timeout_secs = 30
        "#;
        let config: NexusConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.api_url, "https://nexus.interno:8443");
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.connect_timeout_secs, 5);
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "api_url = \"http://10.0.0.5:8080\"\ntoken = \"abc\"").unwrap();
        let config = NexusConfig::load_from(file.path()).unwrap();
        assert_eq!(config.api_url, "http://10.0.0.5:8080");
        assert_eq!(config.token.as_deref(), Some("abc"));
    }

    #[test]
    fn load_rejects_invalid_url() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "api_url = \"localhost:8080\"").unwrap();
        let err = NexusConfig::load_from(file.path()).unwrap_err();
        assert!(matches!(err, NexusError::Config(_)));
    }

    #[test]
    fn load_rejects_malformed_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "api_url = ").unwrap();
        let err = NexusConfig::load_from(file.path()).unwrap_err();
        assert!(matches!(err, NexusError::Toml(_)));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = NexusConfig::load_file(&dir.path().join("nexus.toml")).unwrap();
        assert_eq!(config, NexusConfig::default());
    }

    #[test]
    fn env_overrides_file_values() {
        let mut config = NexusConfig::default();
        config.apply_env(|k| match k {
            "NEXUS_API_URL" => Some("http://outro:9090".into()),
            "NEXUS_TOKEN" => Some("tok".into()),
            _ => None,
        });
        assert_eq!(config.api_url, "http://outro:9090");
        assert_eq!(config.token.as_deref(), Some("tok"));

        config.apply_env(|_| Some("   ".into()));
        assert_eq!(config.api_url, "http://outro:9090");
    }
}
