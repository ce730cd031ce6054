pub mod client;
pub mod credentials;
pub mod error;
pub mod types;

pub use client::NexusClient;
pub use credentials::Credenciais;
pub use error::{ApiError, extrair_mensagem};
pub use types::{AtribuicaoUsuario, NovaPendencia, PatchPendencia, Sessao, Setor, Usuario};

use crate::domain::{Pendencia, PendenciaId, Roteiro, RoteiroId};

/// Operações do backend das quais o roteamento e a transferência dependem.
///
/// [`NexusClient`] é a implementação HTTP; testes usam implementações em memória.
#[allow(async_fn_in_trait)]
pub trait Backend {
    /// Busca um roteiro; `Ok(None)` quando ele não existe.
    async fn fetch_roteiro(&self, id: RoteiroId) -> Result<Option<Roteiro>, ApiError>;

    async fn fetch_sectors(&self) -> Result<Vec<Setor>, ApiError>;

    async fn fetch_users(&self) -> Result<Vec<Usuario>, ApiError>;

    /// Pendências visíveis para o usuário autenticado.
    async fn fetch_pendencias(&self) -> Result<Vec<Pendencia>, ApiError>;

    /// Aplica uma transferência numa única chamada e devolve a pendência atualizada.
    async fn apply_transfer(
        &self,
        id: PendenciaId,
        patch: &PatchPendencia,
    ) -> Result<Pendencia, ApiError>;
}
