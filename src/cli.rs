//! Interface de linha de comando do Nexus baseada em clap.
//!
//! Define a struct [`Cli`] com subcomandos [`Command`] e flags globais
//! (--api-url, --token, --verbose).

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use nexus::domain::{Alvo, PendenciaId, Prioridade, RoteiroId, SetorId, UsuarioId};
use nexus::listing::{FiltroPendencias, FiltroSituacao};

/// Nexus — roteamento de pendências entre setores e usuários.
#[derive(Debug, Parser)]
#[command(name = "nexus", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// URL base do backend (tem precedência sobre nexus.toml e NEXUS_API_URL).
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Token de acesso (tem precedência sobre nexus.toml e NEXUS_TOKEN).
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// Habilita saída detalhada (verbose).
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Autentica e imprime o token de acesso.
    Login {
        #[arg(long)]
        email: String,

        #[arg(long, env = "NEXUS_SENHA", hide_env_values = true)]
        senha: String,

        /// Primeiro acesso: define `--senha` como a nova senha e já autentica.
        #[arg(long)]
        primeiro_acesso: bool,
    },

    /// Lista as pendências na ordem padrão (atrasadas e mais prioritárias primeiro).
    Listar {
        #[command(flatten)]
        filtro: FiltroArgs,

        /// Mostra apenas as pendências visíveis para este usuário.
        #[arg(long)]
        usuario: Option<UsuarioId>,

        /// Setor do usuário informado em --usuario.
        #[arg(long, requires = "usuario")]
        setor: Option<SetorId>,

        /// Saída em JSON.
        #[arg(long)]
        json: bool,
    },

    /// Mostra para onde uma pendência pode ser transferida.
    Rotear {
        id: PendenciaId,

        #[arg(long)]
        json: bool,
    },

    /// Mostra os detalhes e o histórico de uma pendência.
    Detalhar { id: PendenciaId },

    /// Transfere uma pendência para um setor ou usuário.
    Transferir {
        id: PendenciaId,

        #[arg(long, required_unless_present = "usuario")]
        setor: Option<SetorId>,

        #[arg(long)]
        usuario: Option<UsuarioId>,
    },

    /// Cria uma pendência, opcionalmente vinculada a um roteiro.
    Criar {
        #[arg(long)]
        numero: Option<String>,

        #[arg(long)]
        equipamento: Option<String>,

        #[arg(long, value_parser = parse_prioridade)]
        prioridade: Option<Prioridade>,

        /// Prazo de resposta em dias.
        #[arg(long)]
        prazo: Option<i32>,

        #[arg(long)]
        origem: Option<String>,

        #[arg(long)]
        observacoes: Option<String>,

        /// Roteiro ativo a seguir; a pendência começa no primeiro passo.
        #[arg(long, conflicts_with_all = ["setor", "usuario"])]
        roteiro: Option<RoteiroId>,

        #[arg(long)]
        setor: Option<SetorId>,

        #[arg(long)]
        usuario: Option<UsuarioId>,
    },

    /// Altera a situação de uma pendência.
    Situacao {
        id: PendenciaId,

        /// Nova situação (Aberta, Em Andamento, Finalizada).
        situacao: String,

        #[arg(long)]
        observacoes: Option<String>,
    },

    /// Resume as pendências por status, situação e prioridade.
    Estatisticas {
        #[command(flatten)]
        filtro: FiltroArgs,

        #[arg(long)]
        json: bool,
    },

    /// Gerencia roteiros.
    Roteiros {
        #[command(subcommand)]
        command: RoteiroCommand,
    },
}

#[derive(Debug, Subcommand)]
pub enum RoteiroCommand {
    /// Lista os roteiros.
    Listar {
        /// Apenas roteiros ativos.
        #[arg(long)]
        ativos: bool,
    },

    /// Cria um roteiro. Passos no formato `setor:ID` ou `usuario:ID`, na ordem.
    Criar {
        #[arg(long)]
        nome: String,

        #[arg(long)]
        descricao: Option<String>,

        #[arg(long = "passo", value_parser = parse_alvo)]
        passos: Vec<Alvo>,

        #[arg(long)]
        inativo: bool,
    },

    /// Edita um roteiro existente.
    Editar {
        id: RoteiroId,

        #[arg(long)]
        nome: Option<String>,

        #[arg(long)]
        descricao: Option<String>,

        #[arg(long)]
        ativo: Option<bool>,

        /// Acrescenta um passo ao final.
        #[arg(long = "adicionar", value_parser = parse_alvo)]
        adicionar: Vec<Alvo>,

        /// Remove o passo de ordem N (base 1).
        #[arg(long)]
        remover: Option<usize>,

        /// Sobe o passo de ordem N (base 1).
        #[arg(long)]
        subir: Option<usize>,

        /// Desce o passo de ordem N (base 1).
        #[arg(long)]
        descer: Option<usize>,

        /// Troca o alvo de um passo: `N=setor:ID` ou `N=usuario:ID` (N base 1).
        #[arg(long, value_parser = parse_alteracao)]
        alterar: Option<(usize, Alvo)>,
    },

    /// Exclui um roteiro.
    Excluir { id: RoteiroId },
}

#[derive(Debug, Clone, Args)]
pub struct FiltroArgs {
    /// Data inicial de criação (AAAA-MM-DD), inclusiva.
    #[arg(long)]
    pub inicio: Option<NaiveDate>,

    /// Data final de criação (AAAA-MM-DD), inclusiva.
    #[arg(long)]
    pub fim: Option<NaiveDate>,

    /// Situação a mostrar, ou "Todas".
    #[arg(long, default_value = "Todas")]
    pub situacao: String,
}

impl From<&FiltroArgs> for FiltroPendencias {
    fn from(args: &FiltroArgs) -> Self {
        FiltroPendencias {
            inicio: args.inicio,
            fim: args.fim,
            situacao: FiltroSituacao::from(args.situacao.as_str()),
        }
    }
}

/// Lê um passo no formato `setor:ID` ou `usuario:ID`.
pub fn parse_alvo(valor: &str) -> Result<Alvo, String> {
    let (tipo, id) = valor
        .split_once(':')
        .ok_or_else(|| format!("esperado setor:ID ou usuario:ID, recebido '{valor}'"))?;
    let id: i32 = id
        .trim()
        .parse()
        .map_err(|_| format!("id inválido em '{valor}'"))?;
    match tipo.trim().to_lowercase().as_str() {
        "setor" => Ok(Alvo::Setor(id)),
        "usuario" | "usuário" => Ok(Alvo::Usuario(id)),
        outro => Err(format!("tipo de passo desconhecido: '{outro}'")),
    }
}

/// Lê uma troca de alvo no formato `N=setor:ID`.
pub fn parse_alteracao(valor: &str) -> Result<(usize, Alvo), String> {
    let (ordem, alvo) = valor
        .split_once('=')
        .ok_or_else(|| format!("esperado N=setor:ID ou N=usuario:ID, recebido '{valor}'"))?;
    let ordem: usize = ordem
        .trim()
        .parse()
        .map_err(|_| format!("ordem inválida em '{valor}'"))?;
    Ok((ordem, parse_alvo(alvo)?))
}

fn parse_prioridade(valor: &str) -> Result<Prioridade, String> {
    Ok(Prioridade::from(valor.to_string()))
}
