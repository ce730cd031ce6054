//! Modelo de pendência tal como o backend a devolve (`PendenciaDTO`).
//!
//! Os campos seguem o JSON em camelCase do backend. Prioridade e situação
//! são vocabulários abertos: valores conhecidos viram variantes tipadas e
//! qualquer outro texto é preservado em `Outra`.

use std::fmt;

use chrono::{Days, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::historico::Historico;

pub type PendenciaId = i32;
pub type SetorId = i32;
pub type UsuarioId = i32;
pub type RoteiroId = i32;

/// Prioridade de uma pendência.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Prioridade {
    Alta,
    Media,
    Baixa,
    /// Valor desconhecido, mantido como veio do backend.
    Outra(String),
}

impl Prioridade {
    /// Posição na ordenação padrão: Alta=0, Média=1, Baixa=2, demais=3.
    pub fn rank(&self) -> u8 {
        match self {
            Prioridade::Alta => 0,
            Prioridade::Media => 1,
            Prioridade::Baixa => 2,
            Prioridade::Outra(_) => 3,
        }
    }
}

impl From<String> for Prioridade {
    fn from(value: String) -> Self {
        match normalizar(&value).as_str() {
            "alta" => Prioridade::Alta,
            "media" => Prioridade::Media,
            "baixa" => Prioridade::Baixa,
            _ => Prioridade::Outra(value),
        }
    }
}

impl From<Prioridade> for String {
    fn from(value: Prioridade) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Prioridade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Prioridade::Alta => write!(f, "Alta"),
            Prioridade::Media => write!(f, "Média"),
            Prioridade::Baixa => write!(f, "Baixa"),
            Prioridade::Outra(v) => write!(f, "{v}"),
        }
    }
}

/// Situação do ciclo de vida de uma pendência.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Situacao {
    Aberta,
    EmAndamento,
    Finalizada,
    Outra(String),
}

impl From<String> for Situacao {
    fn from(value: String) -> Self {
        match normalizar(&value).as_str() {
            "aberta" => Situacao::Aberta,
            "em andamento" => Situacao::EmAndamento,
            "finalizada" => Situacao::Finalizada,
            _ => Situacao::Outra(value),
        }
    }
}

impl From<Situacao> for String {
    fn from(value: Situacao) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Situacao {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Situacao::Aberta => write!(f, "Aberta"),
            Situacao::EmAndamento => write!(f, "Em Andamento"),
            Situacao::Finalizada => write!(f, "Finalizada"),
            Situacao::Outra(v) => write!(f, "{v}"),
        }
    }
}

/// Estado de aceite de uma transferência, controlado pelo backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StatusTransferencia {
    Pendente,
    Aceita,
    Devolvida,
    Outro(String),
}

impl From<String> for StatusTransferencia {
    fn from(value: String) -> Self {
        match value.trim().to_uppercase().as_str() {
            "PENDENTE" => StatusTransferencia::Pendente,
            "ACEITA" => StatusTransferencia::Aceita,
            "DEVOLVIDA" => StatusTransferencia::Devolvida,
            _ => StatusTransferencia::Outro(value),
        }
    }
}

impl From<StatusTransferencia> for String {
    fn from(value: StatusTransferencia) -> Self {
        value.to_string()
    }
}

impl fmt::Display for StatusTransferencia {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusTransferencia::Pendente => write!(f, "PENDENTE"),
            StatusTransferencia::Aceita => write!(f, "ACEITA"),
            StatusTransferencia::Devolvida => write!(f, "DEVOLVIDA"),
            StatusTransferencia::Outro(v) => write!(f, "{v}"),
        }
    }
}

/// Uma pendência roteada entre setores e usuários.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pendencia {
    pub id: PendenciaId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub numero: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_criacao: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ultima_modificacao: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equipamento: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub situacao: Option<Situacao>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prioridade: Option<Prioridade>,
    /// Prazo de resposta em dias corridos a partir da criação.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prazo_resposta: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origem: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observacoes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub versao: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_usuario: Option<UsuarioId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_setor: Option<SetorId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_roteiro: Option<RoteiroId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_transferencia: Option<StatusTransferencia>,
    #[serde(default, skip_serializing_if = "Historico::is_empty")]
    pub historico: Historico,
}

impl Pendencia {
    /// Título de exibição: número, senão equipamento, senão "Pendência".
    pub fn titulo(&self) -> &str {
        self.numero
            .as_deref()
            .or(self.equipamento.as_deref())
            .unwrap_or("Pendência")
    }

    /// Situação exibida; cai para o campo `status` quando a situação não veio.
    pub fn situacao_exibida(&self) -> Option<Situacao> {
        self.situacao
            .clone()
            .or_else(|| self.status.clone().map(Situacao::from))
    }

    /// Data de criação no formato `AAAA-MM-DD`.
    pub fn data(&self) -> Option<String> {
        self.data_criacao.map(|d| d.format("%Y-%m-%d").to_string())
    }

    /// Hora de criação no formato `HH:MM`.
    pub fn hora(&self) -> Option<String> {
        self.data_criacao.map(|d| d.format("%H:%M").to_string())
    }

    /// Instante em que o prazo de resposta vence, por soma de dias de calendário.
    pub fn limite_resposta(&self) -> Option<NaiveDateTime> {
        let criada = self.data_criacao?;
        let prazo = self.prazo_resposta?;
        let dias = Days::new(u64::from(prazo.unsigned_abs()));
        if prazo >= 0 {
            criada.checked_add_days(dias)
        } else {
            criada.checked_sub_days(dias)
        }
    }

    /// Indica se o prazo de resposta já passou em `agora`.
    ///
    /// Sem data de criação ou sem prazo a pendência nunca está atrasada.
    /// A comparação é feita no instante completo, não apenas na data.
    pub fn is_overdue(&self, agora: NaiveDateTime) -> bool {
        self.limite_resposta()
            .is_some_and(|limite| agora > limite)
    }
}

// Minúsculas, sem acentos e com espaços colapsados.
fn normalizar(valor: &str) -> String {
    valor
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ã' => 'a',
            'é' | 'ê' => 'e',
            'í' => 'i',
            'ó' | 'ô' | 'õ' => 'o',
            'ú' => 'u',
            'ç' => 'c',
            other => other,
        })
        .collect()
}
