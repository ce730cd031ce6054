//! Tipos de dados trocados com o backend Nexus.
//!
//! Todos seguem o JSON em camelCase do backend, exceto `nome_setor`, que o
//! endpoint de setores expõe em snake_case.

use serde::{Deserialize, Serialize, Serializer};

use crate::domain::{Alvo, Prioridade, Roteiro, RoteiroId, SetorId, Situacao, UsuarioId};

/// Setor organizacional (`GET /setores`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Setor {
    pub id: SetorId,
    #[serde(default, alias = "nomeSetor")]
    pub nome_setor: Option<String>,
}

impl Setor {
    pub fn nome(&self) -> String {
        self.nome_setor
            .clone()
            .unwrap_or_else(|| format!("Setor #{}", self.id))
    }
}

/// Usuário (`GET /usuarios`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Usuario {
    pub id: UsuarioId,
    #[serde(default)]
    pub nome_usuario: Option<String>,
    #[serde(default)]
    pub email_usuario: Option<String>,
    /// Setor de origem do usuário.
    #[serde(default)]
    pub id_setor: Option<SetorId>,
    #[serde(default)]
    pub cargo_usuario: Option<String>,
}

impl Usuario {
    pub fn nome(&self) -> String {
        self.nome_usuario
            .clone()
            .unwrap_or_else(|| format!("Usuário #{}", self.id))
    }
}

/// Resposta de `/auth/login` e `/auth/definir-senha`.
#[derive(Debug, Clone, Deserialize)]
pub struct Sessao {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub usuario: Option<Usuario>,
}

/// Campo `idUsuario` de um PATCH, com três estados distintos.
///
/// `Inalterado` omite o campo; `Remover` envia `0`, que o backend interpreta
/// como "sem usuário atribuído"; `Atribuir` envia o id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AtribuicaoUsuario {
    #[default]
    Inalterado,
    Remover,
    Atribuir(UsuarioId),
}

/// Sentinela que o backend entende como "remover atribuição de usuário".
pub const SEM_USUARIO: UsuarioId = 0;

impl AtribuicaoUsuario {
    pub fn is_inalterado(&self) -> bool {
        matches!(self, AtribuicaoUsuario::Inalterado)
    }
}

impl Serialize for AtribuicaoUsuario {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            AtribuicaoUsuario::Inalterado => serializer.serialize_none(),
            AtribuicaoUsuario::Remover => serializer.serialize_i32(SEM_USUARIO),
            AtribuicaoUsuario::Atribuir(id) => serializer.serialize_i32(*id),
        }
    }
}

/// Corpo de `PATCH /pendencias/{id}`. Campos ausentes ficam inalterados.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchPendencia {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub situacao: Option<Situacao>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prioridade: Option<Prioridade>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prazo_resposta: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observacoes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_setor: Option<SetorId>,
    #[serde(skip_serializing_if = "AtribuicaoUsuario::is_inalterado")]
    pub id_usuario: AtribuicaoUsuario,
}

impl PatchPendencia {
    /// Transferência para um setor, sem ninguém atribuído.
    pub fn para_setor(id_setor: SetorId) -> Self {
        Self {
            id_setor: Some(id_setor),
            id_usuario: AtribuicaoUsuario::Remover,
            ..Default::default()
        }
    }

    /// Atribuição a um usuário; o setor acompanha o usuário quando conhecido.
    pub fn para_usuario(id_usuario: UsuarioId, id_setor: Option<SetorId>) -> Self {
        Self {
            id_setor,
            id_usuario: AtribuicaoUsuario::Atribuir(id_usuario),
            ..Default::default()
        }
    }

    /// Mudança de situação, com observação opcional registrada no histórico.
    pub fn situacao(situacao: Situacao, observacoes: Option<String>) -> Self {
        Self {
            situacao: Some(situacao),
            observacoes,
            ..Default::default()
        }
    }
}

/// Corpo de `POST /pendencias`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NovaPendencia {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub numero: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub equipamento: Option<String>,
    pub situacao: Situacao,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prioridade: Option<Prioridade>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prazo_resposta: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origem: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observacoes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_usuario: Option<UsuarioId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_setor: Option<SetorId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_roteiro: Option<RoteiroId>,
}

impl Default for NovaPendencia {
    fn default() -> Self {
        Self {
            numero: None,
            equipamento: None,
            situacao: Situacao::Aberta,
            status: None,
            prioridade: None,
            prazo_resposta: None,
            origem: None,
            observacoes: None,
            id_usuario: None,
            id_setor: None,
            id_roteiro: None,
        }
    }
}

impl NovaPendencia {
    /// Vincula a pendência ao roteiro e posiciona-a no primeiro passo.
    pub fn com_roteiro(mut self, roteiro: &Roteiro) -> Self {
        self.id_roteiro = Some(roteiro.id);
        match roteiro.primeiro_alvo() {
            Some(Alvo::Setor(id)) => {
                self.id_setor = Some(id);
                self.id_usuario = None;
            }
            Some(Alvo::Usuario(id)) => self.id_usuario = Some(id),
            None => {}
        }
        self
    }
}
