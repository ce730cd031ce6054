//! Provedor de credenciais injetado no cliente HTTP.
//!
//! Substitui o token global: quem cria o [`NexusClient`](super::NexusClient)
//! decide de onde vem o token e pode compartilhar o mesmo provedor entre
//! clientes. Clones compartilham o mesmo estado.

use std::sync::{Arc, RwLock};

/// Token de acesso com ciclo de vida explícito (`set`, `clear`, `current`).
#[derive(Debug, Clone, Default)]
pub struct Credenciais {
    token: Arc<RwLock<Option<String>>>,
}

impl Credenciais {
    pub fn new() -> Self {
        Self::default()
    }

    /// Provedor já iniciado com um token.
    pub fn with_token(token: impl Into<String>) -> Self {
        let c = Self::new();
        c.set(token);
        c
    }

    pub fn set(&self, token: impl Into<String>) {
        let token = token.into();
        let mut guard = self.token.write().unwrap_or_else(|e| e.into_inner());
        *guard = (!token.trim().is_empty()).then_some(token);
    }

    pub fn clear(&self) {
        let mut guard = self.token.write().unwrap_or_else(|e| e.into_inner());
        *guard = None;
    }

    pub fn current(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}
