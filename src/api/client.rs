use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::debug;

use super::Backend;
use super::credentials::Credenciais;
use super::error::{ApiError, extrair_mensagem};
use super::types::{NovaPendencia, PatchPendencia, Sessao, Setor, Usuario};
use crate::config::NexusConfig;
use crate::domain::{Pendencia, PendenciaId, Roteiro, RoteiroId, RoteiroPayload, Situacao};

/// Cliente HTTP do backend Nexus.
///
/// Cada chamada é uma única ida e volta; não há retentativa aqui.
pub struct NexusClient {
    client: Client,
    base_url: String,
    credenciais: Credenciais,
}

impl NexusClient {
    pub fn new(config: &NexusConfig, credenciais: Credenciais) -> Result<Self, ApiError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            credenciais,
        })
    }

    /// Create a client pointing at a custom base URL (useful for testing).
    pub fn with_base_url(base_url: impl Into<String>, credenciais: Credenciais) -> Result<Self, ApiError> {
        let config = NexusConfig {
            api_url: base_url.into(),
            ..NexusConfig::default()
        };
        Self::new(&config, credenciais)
    }

    pub fn credenciais(&self) -> &Credenciais {
        &self.credenciais
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{path}", self.base_url);
        debug!(%method, %url, "requisição ao backend");
        let builder = self.client.request(method, url);
        match self.credenciais.current() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn check(response: Response) -> Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::Status {
            status: status.as_u16(),
            message: extrair_mensagem(&body, status.canonical_reason().unwrap_or("Erro desconhecido")),
        })
    }

    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ApiError> {
        let response = Self::check(builder.send().await?).await?;
        Ok(response.json::<T>().await?)
    }

    // Listas vazias podem vir como corpo vazio ou `null`.
    async fn send_list<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<Vec<T>, ApiError> {
        let response = Self::check(builder.send().await?).await?;
        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(Vec::new());
        }
        let items: Option<Vec<T>> = serde_json::from_str(&body)?;
        Ok(items.unwrap_or_default())
    }

    /// Autentica e guarda o token no provedor de credenciais.
    pub async fn login(&self, email: &str, senha: &str) -> Result<Sessao, ApiError> {
        let body = json!({ "emailUsuario": email.trim(), "senha": senha });
        self.autenticar("/auth/login", body).await
    }

    /// Define a senha no primeiro acesso; a resposta já autentica.
    pub async fn definir_senha(&self, email: &str, nova_senha: &str) -> Result<Sessao, ApiError> {
        let body = json!({ "emailUsuario": email.trim(), "novaSenha": nova_senha });
        self.autenticar("/auth/definir-senha", body).await
    }

    // Um token anterior não é enviado nem sobrevive a uma autenticação falha.
    async fn autenticar(&self, path: &str, body: serde_json::Value) -> Result<Sessao, ApiError> {
        self.credenciais.clear();
        let sessao: Sessao = self
            .send_json(self.request(Method::POST, path).json(&body))
            .await?;
        match sessao.token.as_deref() {
            Some(token) if !token.trim().is_empty() => self.credenciais.set(token),
            _ => return Err(ApiError::NaoAutenticado),
        }
        Ok(sessao)
    }

    pub async fn criar_pendencia(&self, nova: &NovaPendencia) -> Result<Pendencia, ApiError> {
        self.send_json(self.request(Method::POST, "/pendencias").json(nova))
            .await
    }

    pub async fn atualizar_situacao(
        &self,
        id: PendenciaId,
        situacao: Situacao,
        observacoes: Option<String>,
    ) -> Result<Pendencia, ApiError> {
        let patch = PatchPendencia::situacao(situacao, observacoes);
        self.send_json(
            self.request(Method::PATCH, &format!("/pendencias/{id}"))
                .json(&patch),
        )
        .await
    }

    pub async fn listar_roteiros(&self, apenas_ativos: bool) -> Result<Vec<Roteiro>, ApiError> {
        let path = if apenas_ativos { "/roteiros/ativos" } else { "/roteiros" };
        self.send_list(self.request(Method::GET, path)).await
    }

    pub async fn criar_roteiro(&self, payload: &RoteiroPayload) -> Result<Roteiro, ApiError> {
        self.send_json(self.request(Method::POST, "/roteiros").json(payload))
            .await
    }

    /// Substitui nome, descrição, status e passos do roteiro.
    ///
    /// Pendências em andamento não são movidas; só as próximas avaliações
    /// de roteamento enxergam os passos novos.
    pub async fn atualizar_roteiro(
        &self,
        id: RoteiroId,
        payload: &RoteiroPayload,
    ) -> Result<Roteiro, ApiError> {
        self.send_json(
            self.request(Method::PUT, &format!("/roteiros/{id}"))
                .json(payload),
        )
        .await
    }

    pub async fn excluir_roteiro(&self, id: RoteiroId) -> Result<(), ApiError> {
        let response = self
            .request(Method::DELETE, &format!("/roteiros/{id}"))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }
}

impl Backend for NexusClient {
    async fn fetch_roteiro(&self, id: RoteiroId) -> Result<Option<Roteiro>, ApiError> {
        let response = self
            .request(Method::GET, &format!("/roteiros/{id}"))
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = Self::check(response).await?;
        Ok(Some(response.json::<Roteiro>().await?))
    }

    async fn fetch_sectors(&self) -> Result<Vec<Setor>, ApiError> {
        self.send_list(self.request(Method::GET, "/setores")).await
    }

    async fn fetch_users(&self) -> Result<Vec<Usuario>, ApiError> {
        self.send_list(self.request(Method::GET, "/usuarios")).await
    }

    async fn fetch_pendencias(&self) -> Result<Vec<Pendencia>, ApiError> {
        self.send_list(self.request(Method::GET, "/pendencias")).await
    }

    async fn apply_transfer(
        &self,
        id: PendenciaId,
        patch: &PatchPendencia,
    ) -> Result<Pendencia, ApiError> {
        self.send_json(
            self.request(Method::PATCH, &format!("/pendencias/{id}"))
                .json(patch),
        )
        .await
    }
}
