//! Histórico de alterações de uma pendência.
//!
//! O backend guarda o histórico como JSON livre: pode vir nulo, como um
//! único objeto, como um array de objetos ou até como texto. Aqui ele é
//! decodificado para uma lista de [`EntradaHistorico`], uma união com
//! entrada estruturada (mapa de campos) ou entrada em texto livre.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Rótulos de exibição para os campos conhecidos do histórico.
const ROTULOS: &[(&str, &str)] = &[
    ("data", "Data"),
    ("dataAlteracao", "Data da alteração"),
    ("usuario", "Usuário"),
    ("autor", "Autor"),
    ("descricao", "Descrição"),
    ("mensagem", "Mensagem"),
    ("acao", "Ação"),
    ("situacao", "Situação"),
    ("situacaoAnterior", "Situação anterior"),
    ("observacao", "Observação"),
    ("observacoes", "Observações"),
    ("idSetor", "Id Setor"),
    ("idSetorAnterior", "Id Setor anterior"),
    ("idUsuario", "Id Usuário"),
    ("idUsuarioAnterior", "Id Usuário anterior"),
    ("status", "Status"),
    ("statusAnterior", "Status anterior"),
];

/// Uma entrada do histórico.
#[derive(Debug, Clone, PartialEq)]
pub enum EntradaHistorico {
    /// Entrada com campos nomeados (`acao`, `dataAlteracao`, `idSetor`...).
    Estruturada(Map<String, Value>),
    /// Entrada em texto livre.
    Texto(String),
}

impl EntradaHistorico {
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Object(map) => Some(EntradaHistorico::Estruturada(map)),
            Value::String(s) => Some(EntradaHistorico::Texto(s)),
            other => Some(EntradaHistorico::Texto(other.to_string())),
        }
    }

    fn into_value(self) -> Value {
        match self {
            EntradaHistorico::Estruturada(map) => Value::Object(map),
            EntradaHistorico::Texto(s) => Value::String(s),
        }
    }

    /// Valor textual de um campo de uma entrada estruturada.
    pub fn campo(&self, nome: &str) -> Option<&str> {
        match self {
            EntradaHistorico::Estruturada(map) => map.get(nome).and_then(Value::as_str),
            EntradaHistorico::Texto(_) => None,
        }
    }

    pub fn acao(&self) -> Option<&str> {
        self.campo("acao")
    }

    pub fn data_alteracao(&self) -> Option<&str> {
        self.campo("dataAlteracao")
    }

    /// Pares (rótulo, valor) prontos para exibição, ignorando valores nulos ou vazios.
    pub fn linhas(&self) -> Vec<(String, String)> {
        match self {
            EntradaHistorico::Texto(s) => vec![(String::new(), s.clone())],
            EntradaHistorico::Estruturada(map) => map
                .iter()
                .filter(|(_, v)| !matches!(v, Value::Null) && v.as_str() != Some(""))
                .map(|(k, v)| (rotulo(k), valor_exibido(v)))
                .collect(),
        }
    }
}

/// Lista de entradas de histórico, na ordem em que o backend as registrou.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub struct Historico(pub Vec<EntradaHistorico>);

impl Historico {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EntradaHistorico> {
        self.0.iter()
    }

    /// Última entrada registrada.
    pub fn ultima(&self) -> Option<&EntradaHistorico> {
        self.0.last()
    }
}

impl From<Value> for Historico {
    fn from(value: Value) -> Self {
        let entradas = match value {
            Value::Array(items) => items
                .into_iter()
                .filter_map(EntradaHistorico::from_value)
                .collect(),
            single => EntradaHistorico::from_value(single).into_iter().collect(),
        };
        Historico(entradas)
    }
}

impl From<Historico> for Value {
    fn from(historico: Historico) -> Self {
        Value::Array(
            historico
                .0
                .into_iter()
                .map(EntradaHistorico::into_value)
                .collect(),
        )
    }
}

/// Rótulo legível de um campo: tabela conhecida ou camelCase separado em palavras.
pub fn rotulo(chave: &str) -> String {
    if let Some((_, r)) = ROTULOS.iter().find(|(k, _)| *k == chave) {
        return (*r).to_string();
    }
    let mut out = String::with_capacity(chave.len() + 4);
    for (i, c) in chave.chars().enumerate() {
        if i == 0 {
            out.extend(c.to_uppercase());
        } else if c.is_uppercase() {
            out.push(' ');
            out.push(c);
        } else {
            out.push(c);
        }
    }
    out
}

fn valor_exibido(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "—".to_string(),
        other => other.to_string(),
    }
}
