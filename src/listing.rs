//! Apresentação de listas de pendências: ordenação padrão, filtros,
//! visibilidade por usuário e estatísticas.

use std::collections::HashMap;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::domain::{Pendencia, SetorId, Situacao, UsuarioId};

/// Ordenação padrão: atrasadas primeiro, depois por prioridade.
///
/// A ordenação é estável; pendências empatadas mantêm a ordem relativa.
pub fn default_sort(pendencias: &mut [Pendencia], agora: NaiveDateTime) {
    pendencias.sort_by_cached_key(|p| {
        let rank = p.prioridade.as_ref().map_or(3, |pr| pr.rank());
        (!p.is_overdue(agora), rank)
    });
}

/// Regra de visibilidade: com usuário atribuído, só ele vê; senão, todo o setor.
pub fn visivel_para(pendencia: &Pendencia, id_usuario: UsuarioId, id_setor: Option<SetorId>) -> bool {
    match pendencia.id_usuario {
        Some(dono) => dono == id_usuario,
        None => pendencia.id_setor.is_some() && pendencia.id_setor == id_setor,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FiltroSituacao {
    #[default]
    Todas,
    Apenas(Situacao),
}

impl From<&str> for FiltroSituacao {
    fn from(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("todas") || value.trim().is_empty() {
            FiltroSituacao::Todas
        } else {
            FiltroSituacao::Apenas(Situacao::from(value.trim().to_string()))
        }
    }
}

/// Filtros de lista. Datas de início e fim são inclusivas.
#[derive(Debug, Clone, Default)]
pub struct FiltroPendencias {
    pub inicio: Option<NaiveDate>,
    pub fim: Option<NaiveDate>,
    pub situacao: FiltroSituacao,
}

impl FiltroPendencias {
    pub fn aceita(&self, pendencia: &Pendencia) -> bool {
        if self.inicio.is_some() || self.fim.is_some() {
            let Some(data) = pendencia.data_criacao.map(|d| d.date()) else {
                return false;
            };
            if self.inicio.is_some_and(|inicio| data < inicio) {
                return false;
            }
            if self.fim.is_some_and(|fim| data > fim) {
                return false;
            }
        }
        match &self.situacao {
            FiltroSituacao::Todas => true,
            FiltroSituacao::Apenas(s) => pendencia.situacao_exibida().as_ref() == Some(s),
        }
    }

    pub fn aplicar<'a>(&self, pendencias: &'a [Pendencia]) -> Vec<&'a Pendencia> {
        pendencias.iter().filter(|p| self.aceita(p)).collect()
    }
}

/// Resumo de um conjunto de pendências.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Estatisticas {
    pub total: usize,
    pub atrasadas: usize,
    pub por_status: Vec<(String, usize)>,
    pub por_situacao: Vec<(String, usize)>,
    pub por_prioridade: Vec<(String, usize)>,
}

impl Estatisticas {
    pub fn calcular<'a>(
        pendencias: impl IntoIterator<Item = &'a Pendencia>,
        agora: NaiveDateTime,
    ) -> Self {
        let pendencias: Vec<&Pendencia> = pendencias.into_iter().collect();
        Self {
            total: pendencias.len(),
            atrasadas: pendencias.iter().filter(|p| p.is_overdue(agora)).count(),
            por_status: contar(pendencias.iter().map(|p| p.status.clone())),
            por_situacao: contar(
                pendencias
                    .iter()
                    .map(|p| p.situacao_exibida().map(|s| s.to_string())),
            ),
            por_prioridade: contar(
                pendencias
                    .iter()
                    .map(|p| p.prioridade.as_ref().map(|pr| pr.to_string())),
            ),
        }
    }
}

// Contagem por valor: vazios ignorados, maior contagem primeiro, empates por valor.
fn contar(valores: impl Iterator<Item = Option<String>>) -> Vec<(String, usize)> {
    let mut contagem: HashMap<String, usize> = HashMap::new();
    for valor in valores.flatten() {
        let valor = valor.trim();
        if valor.is_empty() {
            continue;
        }
        *contagem.entry(valor.to_string()).or_default() += 1;
    }
    let mut pares: Vec<(String, usize)> = contagem.into_iter().collect();
    pares.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    pares
}
