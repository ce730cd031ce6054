//! Roteiros: planos ordenados de passos (setor ou usuário) que uma pendência percorre.
//!
//! [`Roteiro`] é o formato devolvido pelo backend. [`RoteiroDraft`] é a
//! versão editável usada para criar ou alterar um roteiro; toda edição
//! renumera os passos para a sequência contígua `1..N`.

use std::collections::HashSet;
use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::pendencia::{RoteiroId, SetorId, UsuarioId};

/// Tipo de um passo do roteiro.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TipoPasso {
    #[serde(alias = "setor", alias = "Setor")]
    Setor,
    #[serde(alias = "usuario", alias = "Usuario")]
    Usuario,
}

/// Destino concreto de um passo: um setor ou um usuário.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Alvo {
    Setor(SetorId),
    Usuario(UsuarioId),
}

impl Alvo {
    pub fn tipo(&self) -> TipoPasso {
        match self {
            Alvo::Setor(_) => TipoPasso::Setor,
            Alvo::Usuario(_) => TipoPasso::Usuario,
        }
    }

    pub fn id_setor(&self) -> Option<SetorId> {
        match self {
            Alvo::Setor(id) => Some(*id),
            Alvo::Usuario(_) => None,
        }
    }

    pub fn id_usuario(&self) -> Option<UsuarioId> {
        match self {
            Alvo::Usuario(id) => Some(*id),
            Alvo::Setor(_) => None,
        }
    }
}

impl fmt::Display for Alvo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Alvo::Setor(id) => write!(f, "setor #{id}"),
            Alvo::Usuario(id) => write!(f, "usuário #{id}"),
        }
    }
}

/// Um passo do roteiro como vem do backend (`PassoRoteiroExibicaoDTO`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Passo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i32>,
    pub ordem: i32,
    pub tipo: TipoPasso,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_setor: Option<SetorId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_usuario: Option<UsuarioId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nome_setor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nome_usuario: Option<String>,
}

impl Passo {
    pub fn setor(ordem: i32, id_setor: SetorId) -> Self {
        Self::novo(ordem, Alvo::Setor(id_setor))
    }

    pub fn usuario(ordem: i32, id_usuario: UsuarioId) -> Self {
        Self::novo(ordem, Alvo::Usuario(id_usuario))
    }

    pub fn novo(ordem: i32, alvo: Alvo) -> Self {
        Self {
            id: None,
            ordem,
            tipo: alvo.tipo(),
            id_setor: alvo.id_setor(),
            id_usuario: alvo.id_usuario(),
            nome_setor: None,
            nome_usuario: None,
        }
    }

    /// Alvo do passo conforme seu tipo. `None` se o id correspondente faltar.
    pub fn alvo(&self) -> Option<Alvo> {
        match self.tipo {
            TipoPasso::Setor => self.id_setor.map(Alvo::Setor),
            TipoPasso::Usuario => self.id_usuario.map(Alvo::Usuario),
        }
    }
}

/// Passo já validado e posicionado na sequência normalizada.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassoNormalizado {
    pub ordem: i32,
    pub alvo: Alvo,
}

/// Roteiro persistido no backend (`RoteiroDTO`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Roteiro {
    pub id: RoteiroId,
    pub nome: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub descricao: Option<String>,
    #[serde(default = "ativo_padrao")]
    pub ativo: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_criacao: Option<NaiveDateTime>,
    #[serde(default)]
    pub passos: Vec<Passo>,
}

fn ativo_padrao() -> bool {
    true
}

impl Roteiro {
    /// Sequência determinística de passos.
    ///
    /// Ordena por `ordem` ascendente (estável) e, para ordens repetidas,
    /// mantém apenas a primeira ocorrência. Só depois descarta passos sem
    /// alvo do seu tipo; a ordem ocupada por eles não é herdada por duplicatas.
    pub fn passos_normalizados(&self) -> Vec<PassoNormalizado> {
        let mut ordenados: Vec<&Passo> = self.passos.iter().collect();
        ordenados.sort_by_key(|p| p.ordem);

        let mut vistos = HashSet::new();
        ordenados.retain(|p| vistos.insert(p.ordem));
        ordenados
            .into_iter()
            .filter_map(|p| {
                p.alvo().map(|alvo| PassoNormalizado {
                    ordem: p.ordem,
                    alvo,
                })
            })
            .collect()
    }

    /// Indica se a lista de passos já está bem formada (ordens contíguas `1..N`, todos com alvo).
    pub fn bem_formado(&self) -> bool {
        let normalizados = self.passos_normalizados();
        normalizados.len() == self.passos.len()
            && normalizados
                .iter()
                .enumerate()
                .all(|(i, p)| p.ordem == i as i32 + 1)
    }

    /// Alvo do primeiro passo, usado como detentor inicial de uma pendência nova.
    pub fn primeiro_alvo(&self) -> Option<Alvo> {
        self.passos_normalizados().first().map(|p| p.alvo)
    }

    /// Converte o roteiro em rascunho editável.
    pub fn to_draft(&self) -> RoteiroDraft {
        RoteiroDraft {
            nome: self.nome.clone(),
            descricao: self.descricao.clone(),
            ativo: self.ativo,
            passos: self.passos_normalizados().into_iter().map(|p| p.alvo).collect(),
        }
    }
}

/// Erros de validação de um rascunho de roteiro antes de salvar.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoteiroInvalido {
    #[error("Nome é obrigatório")]
    NomeVazio,
    #[error("Adicione pelo menos um passo (setor ou usuário) ao roteiro")]
    SemPassos,
}

/// Rascunho editável de um roteiro. A posição no vetor é a ordem do passo.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RoteiroDraft {
    pub nome: String,
    pub descricao: Option<String>,
    pub ativo: bool,
    passos: Vec<Alvo>,
}

/// Corpo de criação/atualização de roteiro (`CreateRoteiroDTO`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoteiroPayload {
    pub nome: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub descricao: Option<String>,
    pub ativo: bool,
    pub passos: Vec<Passo>,
}

impl RoteiroDraft {
    pub fn new(nome: impl Into<String>) -> Self {
        Self {
            nome: nome.into(),
            descricao: None,
            ativo: true,
            passos: Vec::new(),
        }
    }

    /// Passos com a ordem contígua derivada da posição.
    pub fn passos(&self) -> Vec<Passo> {
        self.passos
            .iter()
            .enumerate()
            .map(|(i, alvo)| Passo::novo(i as i32 + 1, *alvo))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.passos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passos.is_empty()
    }

    /// Acrescenta um passo ao final.
    pub fn adicionar(&mut self, alvo: Alvo) {
        self.passos.push(alvo);
    }

    /// Remove o passo na posição `indice`; fora do intervalo não faz nada.
    pub fn remover(&mut self, indice: usize) -> Option<Alvo> {
        (indice < self.passos.len()).then(|| self.passos.remove(indice))
    }

    /// Sobe o passo uma posição. Retorna `false` se já for o primeiro.
    pub fn subir(&mut self, indice: usize) -> bool {
        if indice == 0 || indice >= self.passos.len() {
            return false;
        }
        self.passos.swap(indice - 1, indice);
        true
    }

    /// Desce o passo uma posição. Retorna `false` se já for o último.
    pub fn descer(&mut self, indice: usize) -> bool {
        if indice + 1 >= self.passos.len() {
            return false;
        }
        self.passos.swap(indice, indice + 1);
        true
    }

    /// Substitui o alvo de um passo existente.
    pub fn alterar(&mut self, indice: usize, alvo: Alvo) -> bool {
        match self.passos.get_mut(indice) {
            Some(slot) => {
                *slot = alvo;
                true
            }
            None => false,
        }
    }

    /// Valida e monta o corpo enviado ao backend.
    pub fn to_payload(&self) -> Result<RoteiroPayload, RoteiroInvalido> {
        let nome = self.nome.trim();
        if nome.is_empty() {
            return Err(RoteiroInvalido::NomeVazio);
        }
        if self.passos.is_empty() {
            return Err(RoteiroInvalido::SemPassos);
        }
        Ok(RoteiroPayload {
            nome: nome.to_string(),
            descricao: self
                .descricao
                .as_deref()
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_string),
            ativo: self.ativo,
            passos: self.passos(),
        })
    }
}
