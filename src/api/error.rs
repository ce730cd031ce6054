//! Tipos de erro para o cliente do backend Nexus.
//!
//! Define [`ApiError`] com variantes para respostas HTTP de erro, falhas de
//! rede e corpos que não puderam ser decodificados. Usa `thiserror` para
//! derivar `Display` e `Error` a partir dos atributos `#[error(...)]`.

use serde_json::Value;
use thiserror::Error;

/// Mensagem usada quando o corpo de erro é JSON sem campo `message`.
pub const MENSAGEM_GENERICA: &str = "Erro na requisição";

/// Erros que podem ocorrer ao conversar com o backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// O backend respondeu com status de erro (4xx/5xx).
    /// `message` é a melhor mensagem legível extraída do corpo.
    #[error("{message} (status {status})")]
    Status { status: u16, message: String },

    /// Login respondeu com sucesso mas sem token.
    #[error("resposta de autenticação sem token")]
    NaoAutenticado,

    /// Falha de rede subjacente (DNS, conexão recusada, timeout).
    #[error("erro de rede: {0}")]
    Network(#[from] reqwest::Error),

    /// Corpo de resposta fora do formato esperado.
    #[error("resposta inválida do backend: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    /// Status HTTP, quando o erro veio de uma resposta do backend.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Texto a exibir ao usuário numa notificação transitória.
    pub fn mensagem(&self) -> String {
        match self {
            ApiError::Status { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

/// Extrai uma mensagem legível do corpo de uma resposta de erro.
///
/// JSON com `message` textual devolve essa mensagem; JSON em outro formato
/// devolve [`MENSAGEM_GENERICA`]; texto puro é devolvido como veio; corpo
/// vazio usa `fallback` (normalmente a frase do status HTTP).
pub fn extrair_mensagem(body: &str, fallback: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return fallback.to_string();
    }
    match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::String(s)) => s,
        Ok(Value::Object(map)) => map
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| MENSAGEM_GENERICA.to_string()),
        Ok(_) => MENSAGEM_GENERICA.to_string(),
        Err(_) => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_display() {
        let err = ApiError::Status {
            status: 500,
            message: "Pendência não encontrada".into(),
        };
        assert_eq!(err.to_string(), "Pendência não encontrada (status 500)");
        assert_eq!(err.status(), Some(500));
        assert_eq!(err.mensagem(), "Pendência não encontrada");
    }

    #[test]
    fn message_from_json_object() {
        let body = r#"{"timestamp":"2024-01-01","status":500,"message":"Não é possível transferir para este setor."}"#;
        assert_eq!(
            extrair_mensagem(body, "Internal Server Error"),
            "Não é possível transferir para este setor."
        );
    }

    #[test]
    fn message_from_json_without_message_field() {
        assert_eq!(extrair_mensagem(r#"{"error":"x"}"#, "Bad Request"), MENSAGEM_GENERICA);
        assert_eq!(extrair_mensagem("[1,2]", "Bad Request"), MENSAGEM_GENERICA);
    }

    #[test]
    fn message_from_plain_text_and_empty_body() {
        assert_eq!(extrair_mensagem("Credenciais inválidas", "Unauthorized"), "Credenciais inválidas");
        assert_eq!(extrair_mensagem("\"texto json\"", "x"), "texto json");
        assert_eq!(extrair_mensagem("   ", "Not Found"), "Not Found");
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ApiError>();
    }
}
