use thiserror::Error;

#[derive(Debug, Error)]
pub enum NexusError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Pendência não encontrada: {0}")]
    PendenciaNotFound(i32),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}
