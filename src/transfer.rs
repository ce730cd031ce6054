//! Transferência e atribuição de pendências.
//!
//! O fluxo tem duas fases, como o diálogo de transferência: [`TransferService::prepare`]
//! carrega roteiro, setores e usuários e avalia o roteamento; [`TransferService::confirm`]
//! valida o destino localmente e faz uma única chamada ao backend.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;
use tracing::{info, warn};

use crate::api::{ApiError, Backend, PatchPendencia, Setor, Usuario};
use crate::domain::{Alvo, Pendencia, PendenciaId, SetorId, UsuarioId};
use crate::routing::{RoutingDecision, evaluate_routing};

/// Destino escolhido para uma transferência.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Destino {
    pub id_setor: Option<SetorId>,
    pub id_usuario: Option<UsuarioId>,
}

impl Destino {
    pub fn setor(id_setor: SetorId) -> Self {
        Self {
            id_setor: Some(id_setor),
            id_usuario: None,
        }
    }

    pub fn usuario(id_usuario: UsuarioId) -> Self {
        Self {
            id_setor: None,
            id_usuario: Some(id_usuario),
        }
    }

    /// Alvo efetivo: o usuário, se houver; senão o setor.
    pub fn alvo(&self) -> Option<Alvo> {
        self.id_usuario
            .map(Alvo::Usuario)
            .or(self.id_setor.map(Alvo::Setor))
    }
}

/// Falhas de uma transferência.
///
/// As variantes de validação são produzidas antes de qualquer chamada ao backend.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("Informe um setor ou um usuário de destino.")]
    DestinoVazio,

    #[error(
        "A pendência está no último passo do roteiro. Remova-a do roteiro para transferir."
    )]
    RoteiroEsgotado,

    #[error(
        "Não é possível transferir para {recebido}. A pendência está em um roteiro e o próximo passo é {esperado}."
    )]
    DestinoForaDoRoteiro { esperado: Alvo, recebido: Alvo },

    #[error("Pendência não encontrada: {0}")]
    PendenciaNaoEncontrada(PendenciaId),

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl TransferError {
    /// Rejeição local, sem chamada ao backend.
    pub fn is_rejection(&self) -> bool {
        !matches!(self, TransferError::Api(_))
    }
}

/// Verifica se `destino` é permitido pela decisão de roteamento.
pub fn check_destino(decisao: &RoutingDecision, destino: &Destino) -> Result<Alvo, TransferError> {
    let alvo = destino.alvo().ok_or(TransferError::DestinoVazio)?;
    match decisao {
        RoutingDecision::Unrestricted | RoutingDecision::Untracked { .. } => Ok(alvo),
        RoutingDecision::Exhausted { .. } => Err(TransferError::RoteiroEsgotado),
        RoutingDecision::Restricted { proximo, .. } if *proximo == alvo => Ok(alvo),
        RoutingDecision::Restricted { proximo, .. } => Err(TransferError::DestinoForaDoRoteiro {
            esperado: *proximo,
            recebido: alvo,
        }),
    }
}

/// Tudo o que a confirmação precisa, carregado antes dela.
#[derive(Debug, Clone)]
pub struct TransferPlan {
    pub pendencia: Pendencia,
    pub decisao: RoutingDecision,
    pub setores: Vec<Setor>,
    pub usuarios: Vec<Usuario>,
}

impl TransferPlan {
    /// Valida o destino e monta o PATCH correspondente, sem rede.
    ///
    /// Usuário de destino leva o setor de origem dele; sem essa informação
    /// usa o setor informado e, por fim, o setor atual da pendência.
    /// Destino só com setor remove a atribuição de usuário.
    pub fn patch_for(&self, destino: &Destino) -> Result<PatchPendencia, TransferError> {
        match check_destino(&self.decisao, destino)? {
            Alvo::Setor(id_setor) => Ok(PatchPendencia::para_setor(id_setor)),
            Alvo::Usuario(id_usuario) => {
                let setor_do_usuario = self
                    .usuarios
                    .iter()
                    .find(|u| u.id == id_usuario)
                    .and_then(|u| u.id_setor);
                let id_setor = setor_do_usuario
                    .or(destino.id_setor)
                    .or(self.pendencia.id_setor);
                Ok(PatchPendencia::para_usuario(id_usuario, id_setor))
            }
        }
    }

    /// Setores oferecidos como destino.
    pub fn setores_permitidos(&self) -> Vec<&Setor> {
        match &self.decisao {
            d if d.is_free() => self.setores.iter().collect(),
            RoutingDecision::Restricted {
                proximo: Alvo::Setor(id),
                ..
            } => self.setores.iter().filter(|s| s.id == *id).collect(),
            _ => Vec::new(),
        }
    }

    /// Usuários oferecidos como destino.
    pub fn usuarios_permitidos(&self) -> Vec<&Usuario> {
        match &self.decisao {
            d if d.is_free() => self.usuarios.iter().collect(),
            RoutingDecision::Restricted {
                proximo: Alvo::Usuario(id),
                ..
            } => self.usuarios.iter().filter(|u| u.id == *id).collect(),
            _ => Vec::new(),
        }
    }
}

/// Aplica transferências respeitando o roteiro da pendência.
pub struct TransferService<'a, B> {
    backend: &'a B,
}

impl<'a, B: Backend> TransferService<'a, B> {
    pub fn new(backend: &'a B) -> Self {
        Self { backend }
    }

    /// Busca o roteiro (se houver) e avalia o roteamento da pendência.
    pub async fn evaluate(&self, pendencia: &Pendencia) -> Result<RoutingDecision, ApiError> {
        let roteiro = match pendencia.id_roteiro {
            Some(id) => self.backend.fetch_roteiro(id).await?,
            None => None,
        };
        Ok(evaluate_routing(pendencia, roteiro.as_ref()))
    }

    /// Carrega roteiro, setores e usuários para uma transferência.
    pub async fn prepare(&self, pendencia: &Pendencia) -> Result<TransferPlan, ApiError> {
        let decisao = self.evaluate(pendencia).await?;
        if let Some(aviso) = decisao.warning() {
            warn!(pendencia = pendencia.id, %aviso, "roteiro ignorado na transferência");
        }
        let setores = self.backend.fetch_sectors().await?;
        let usuarios = self.backend.fetch_users().await?;
        Ok(TransferPlan {
            pendencia: pendencia.clone(),
            decisao,
            setores,
            usuarios,
        })
    }

    /// Confirma a transferência: validação local e uma única chamada ao backend.
    ///
    /// Nada é alterado localmente antes da resposta; o retorno é a pendência
    /// como o backend a persistiu.
    pub async fn confirm(
        &self,
        plan: &TransferPlan,
        destino: Destino,
    ) -> Result<Pendencia, TransferError> {
        let patch = plan.patch_for(&destino).inspect_err(|e| {
            warn!(pendencia = plan.pendencia.id, erro = %e, "transferência rejeitada");
        })?;
        let atualizada = self
            .backend
            .apply_transfer(plan.pendencia.id, &patch)
            .await?;
        info!(
            pendencia = atualizada.id,
            id_setor = ?atualizada.id_setor,
            id_usuario = ?atualizada.id_usuario,
            "pendência transferida"
        );
        Ok(atualizada)
    }

    /// Localiza a pendência pelo id, prepara e confirma numa só chamada.
    pub async fn transfer(
        &self,
        id: PendenciaId,
        destino: Destino,
    ) -> Result<Pendencia, TransferError> {
        let pendencia = self
            .backend
            .fetch_pendencias()
            .await?
            .into_iter()
            .find(|p| p.id == id)
            .ok_or(TransferError::PendenciaNaoEncontrada(id))?;
        let plan = self.prepare(&pendencia).await?;
        self.confirm(&plan, destino).await
    }
}

/// Escopo de uma tela que pode ser fechada enquanto uma operação está em curso.
///
/// A operação continua até o fim, mas o resultado é descartado se o escopo
/// já tiver sido fechado.
#[derive(Debug, Clone)]
pub struct ViewScope {
    ativo: Arc<AtomicBool>,
}

impl ViewScope {
    pub fn new() -> Self {
        Self {
            ativo: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn close(&self) {
        self.ativo.store(false, Ordering::Release);
    }

    pub fn is_active(&self) -> bool {
        self.ativo.load(Ordering::Acquire)
    }

    /// Executa `operacao` e só entrega o resultado se o escopo seguir ativo.
    pub async fn run<F: Future>(&self, operacao: F) -> Option<F::Output> {
        let resultado = operacao.await;
        self.is_active().then_some(resultado)
    }
}

impl Default for ViewScope {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Passo, Roteiro, RoteiroId};
    use crate::routing::RoutingState;
    use std::sync::Mutex;

    const SETOR_A: SetorId = 10;
    const USUARIO_U: UsuarioId = 20;
    const SETOR_B: SetorId = 30;

    #[derive(Default)]
    struct MockBackend {
        roteiro: Option<Roteiro>,
        pendencias: Vec<Pendencia>,
        usuarios: Vec<Usuario>,
        setores: Vec<Setor>,
        falha_transfer: bool,
        chamadas: Mutex<Vec<String>>,
    }

    impl MockBackend {
        fn registrar(&self, chamada: &str) {
            self.chamadas.lock().unwrap().push(chamada.to_string());
        }

        fn chamadas(&self) -> Vec<String> {
            self.chamadas.lock().unwrap().clone()
        }

        fn transfers(&self) -> usize {
            self.chamadas()
                .iter()
                .filter(|c| c.starts_with("apply_transfer"))
                .count()
        }
    }

    impl Backend for MockBackend {
        async fn fetch_roteiro(&self, id: RoteiroId) -> Result<Option<Roteiro>, ApiError> {
            self.registrar("fetch_roteiro");
            Ok(self.roteiro.clone().filter(|r| r.id == id))
        }

        async fn fetch_sectors(&self) -> Result<Vec<Setor>, ApiError> {
            self.registrar("fetch_sectors");
            Ok(self.setores.clone())
        }

        async fn fetch_users(&self) -> Result<Vec<Usuario>, ApiError> {
            self.registrar("fetch_users");
            Ok(self.usuarios.clone())
        }

        async fn fetch_pendencias(&self) -> Result<Vec<Pendencia>, ApiError> {
            self.registrar("fetch_pendencias");
            Ok(self.pendencias.clone())
        }

        async fn apply_transfer(
            &self,
            id: PendenciaId,
            patch: &PatchPendencia,
        ) -> Result<Pendencia, ApiError> {
            self.registrar(&format!("apply_transfer:{id}"));
            if self.falha_transfer {
                return Err(ApiError::Status {
                    status: 500,
                    message: "Não é possível transferir para este setor.".into(),
                });
            }
            let mut p = self
                .pendencias
                .iter()
                .find(|p| p.id == id)
                .cloned()
                .unwrap_or(Pendencia {
                    id,
                    ..Default::default()
                });
            if patch.id_setor.is_some() {
                p.id_setor = patch.id_setor;
            }
            match patch.id_usuario {
                crate::api::AtribuicaoUsuario::Inalterado => {}
                crate::api::AtribuicaoUsuario::Remover => p.id_usuario = None,
                crate::api::AtribuicaoUsuario::Atribuir(u) => p.id_usuario = Some(u),
            }
            Ok(p)
        }
    }

    fn roteiro_abu() -> Roteiro {
        Roteiro {
            id: 7,
            nome: "Atendimento".into(),
            descricao: None,
            ativo: true,
            data_criacao: None,
            passos: vec![
                Passo::setor(1, SETOR_A),
                Passo::usuario(2, USUARIO_U),
                Passo::setor(3, SETOR_B),
            ],
        }
    }

    fn usuario(id: UsuarioId, setor: SetorId) -> Usuario {
        Usuario {
            id,
            nome_usuario: Some(format!("u{id}")),
            email_usuario: None,
            id_setor: Some(setor),
            cargo_usuario: None,
        }
    }

    fn setor(id: SetorId) -> Setor {
        Setor {
            id,
            nome_setor: Some(format!("s{id}")),
        }
    }

    fn pendencia(id_roteiro: Option<RoteiroId>, s: Option<SetorId>, u: Option<UsuarioId>) -> Pendencia {
        Pendencia {
            id: 1,
            id_roteiro,
            id_setor: s,
            id_usuario: u,
            ..Default::default()
        }
    }

    fn backend_com(p: Pendencia) -> MockBackend {
        MockBackend {
            roteiro: Some(roteiro_abu()),
            pendencias: vec![p],
            usuarios: vec![usuario(USUARIO_U, SETOR_A), usuario(21, SETOR_B)],
            setores: vec![setor(SETOR_A), setor(SETOR_B), setor(40)],
            ..Default::default()
        }
    }

    #[test]
    fn destino_prefers_user() {
        let d = Destino {
            id_setor: Some(1),
            id_usuario: Some(2),
        };
        assert_eq!(d.alvo(), Some(Alvo::Usuario(2)));
        assert_eq!(Destino::default().alvo(), None);
    }

    #[test]
    fn check_rejects_wrong_step() {
        let decisao = RoutingDecision::Restricted {
            posicao: 0,
            proximo: Alvo::Usuario(USUARIO_U),
        };
        let err = check_destino(&decisao, &Destino::setor(SETOR_B)).unwrap_err();
        assert!(matches!(
            err,
            TransferError::DestinoForaDoRoteiro {
                esperado: Alvo::Usuario(USUARIO_U),
                recebido: Alvo::Setor(SETOR_B)
            }
        ));
        assert!(err.is_rejection());
        assert!(check_destino(&decisao, &Destino::usuario(USUARIO_U)).is_ok());
    }

    #[test]
    fn sector_step_rejects_user_inside_that_sector() {
        let decisao = RoutingDecision::Restricted {
            posicao: 1,
            proximo: Alvo::Setor(SETOR_B),
        };
        let d = Destino {
            id_setor: Some(SETOR_B),
            id_usuario: Some(21),
        };
        assert!(check_destino(&decisao, &d).is_err());
    }

    #[test]
    fn exhausted_rejects_everything() {
        let decisao = RoutingDecision::Exhausted { posicao: 2 };
        assert!(matches!(
            check_destino(&decisao, &Destino::setor(1)),
            Err(TransferError::RoteiroEsgotado)
        ));
    }

    #[test]
    fn empty_destination_rejected_even_when_free() {
        assert!(matches!(
            check_destino(&RoutingDecision::Unrestricted, &Destino::default()),
            Err(TransferError::DestinoVazio)
        ));
    }

    #[tokio::test]
    async fn off_roteiro_destination_makes_no_backend_call() {
        let backend = backend_com(pendencia(Some(7), Some(SETOR_A), None));
        let plan = TransferPlan {
            pendencia: pendencia(Some(7), Some(SETOR_A), None),
            decisao: RoutingDecision::Restricted {
                posicao: 0,
                proximo: Alvo::Usuario(USUARIO_U),
            },
            setores: vec![],
            usuarios: vec![],
        };

        let err = TransferService::new(&backend)
            .confirm(&plan, Destino::setor(SETOR_B))
            .await
            .unwrap_err();

        assert!(err.is_rejection());
        assert!(backend.chamadas().is_empty());
    }

    #[tokio::test]
    async fn roteiro_step_to_user_sends_home_sector() {
        let backend = backend_com(pendencia(Some(7), Some(SETOR_A), None));
        let service = TransferService::new(&backend);

        let atualizada = service.transfer(1, Destino::usuario(USUARIO_U)).await.unwrap();

        assert_eq!(atualizada.id_usuario, Some(USUARIO_U));
        assert_eq!(atualizada.id_setor, Some(SETOR_A));
        assert_eq!(backend.transfers(), 1);
    }

    #[tokio::test]
    async fn roteiro_step_to_sector_clears_user() {
        let backend = backend_com(pendencia(Some(7), Some(SETOR_A), Some(USUARIO_U)));
        let atualizada = TransferService::new(&backend)
            .transfer(1, Destino::setor(SETOR_B))
            .await
            .unwrap();
        assert_eq!(atualizada.id_setor, Some(SETOR_B));
        assert_eq!(atualizada.id_usuario, None);
    }

    #[tokio::test]
    async fn transfer_outside_roteiro_is_rejected_before_patch() {
        let backend = backend_com(pendencia(Some(7), Some(SETOR_A), None));
        let err = TransferService::new(&backend)
            .transfer(1, Destino::setor(40))
            .await
            .unwrap_err();
        assert!(matches!(err, TransferError::DestinoForaDoRoteiro { .. }));
        assert_eq!(backend.transfers(), 0);
    }

    #[tokio::test]
    async fn unrestricted_allows_any_sector() {
        let backend = backend_com(pendencia(None, Some(SETOR_A), None));
        let atualizada = TransferService::new(&backend)
            .transfer(1, Destino::setor(40))
            .await
            .unwrap();
        assert_eq!(atualizada.id_setor, Some(40));
    }

    #[tokio::test]
    async fn missing_roteiro_is_treated_as_free() {
        let mut backend = backend_com(pendencia(Some(99), Some(SETOR_A), None));
        backend.roteiro = None;
        let service = TransferService::new(&backend);
        let plan = service.prepare(&backend.pendencias[0]).await.unwrap();
        assert_eq!(plan.decisao.state(), RoutingState::Untracked);
        assert_eq!(plan.setores_permitidos().len(), 3);
        service.confirm(&plan, Destino::setor(40)).await.unwrap();
    }

    #[tokio::test]
    async fn unknown_user_keeps_given_or_current_sector() {
        let backend = backend_com(pendencia(None, Some(SETOR_A), None));
        let service = TransferService::new(&backend);
        let plan = service.prepare(&backend.pendencias[0]).await.unwrap();

        let patch = plan.patch_for(&Destino::usuario(999)).unwrap();
        assert_eq!(patch.id_setor, Some(SETOR_A));

        let patch = plan
            .patch_for(&Destino {
                id_setor: Some(40),
                id_usuario: Some(999),
            })
            .unwrap();
        assert_eq!(patch.id_setor, Some(40));
    }

    #[tokio::test]
    async fn backend_failure_surfaces_single_error() {
        let mut backend = backend_com(pendencia(None, Some(SETOR_A), None));
        backend.falha_transfer = true;
        let err = TransferService::new(&backend)
            .transfer(1, Destino::setor(40))
            .await
            .unwrap_err();
        assert!(!err.is_rejection());
        assert_eq!(
            err.to_string(),
            "Não é possível transferir para este setor. (status 500)"
        );
        assert_eq!(backend.transfers(), 1);
    }

    #[tokio::test]
    async fn unknown_pendencia_is_reported() {
        let backend = MockBackend::default();
        let err = TransferService::new(&backend)
            .transfer(5, Destino::setor(1))
            .await
            .unwrap_err();
        assert!(matches!(err, TransferError::PendenciaNaoEncontrada(5)));
    }

    #[tokio::test]
    async fn plan_restricts_offered_options() {
        let backend = backend_com(pendencia(Some(7), Some(SETOR_A), Some(USUARIO_U)));
        let plan = TransferService::new(&backend)
            .prepare(&backend.pendencias[0])
            .await
            .unwrap();
        let setores: Vec<SetorId> = plan.setores_permitidos().iter().map(|s| s.id).collect();
        assert_eq!(setores, vec![SETOR_B]);
        assert!(plan.usuarios_permitidos().is_empty());
    }

    #[tokio::test]
    async fn exhausted_plan_offers_nothing() {
        let backend = backend_com(pendencia(Some(7), Some(SETOR_B), None));
        let plan = TransferService::new(&backend)
            .prepare(&backend.pendencias[0])
            .await
            .unwrap();
        assert!(plan.setores_permitidos().is_empty());
        assert!(plan.usuarios_permitidos().is_empty());
    }

    #[tokio::test]
    async fn closed_view_discards_result() {
        let scope = ViewScope::new();
        let (tx, rx) = tokio::sync::oneshot::channel::<u32>();
        let handle = {
            let scope = scope.clone();
            tokio::spawn(async move { scope.run(async { rx.await.unwrap() }).await })
        };
        scope.close();
        tx.send(42).unwrap();
        assert_eq!(handle.await.unwrap(), None);
    }

    #[tokio::test]
    async fn active_view_receives_result() {
        let scope = ViewScope::new();
        assert_eq!(scope.run(async { 7 }).await, Some(7));
    }
}
