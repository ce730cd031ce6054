mod cli;
mod ui;

use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use chrono::{Local, NaiveDateTime};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command, RoteiroCommand};
use nexus::api::{ApiError, Backend, Credenciais, NexusClient, NovaPendencia};
use nexus::config::NexusConfig;
use nexus::domain::{Pendencia, PendenciaId, RoteiroDraft, Situacao};
use nexus::listing::{Estatisticas, FiltroPendencias, default_sort, visivel_para};
use nexus::transfer::{Destino, TransferError, TransferService, ViewScope};
use nexus::NexusError;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::fmt()
        .with_env_filter(filtro_de_log(cli.verbose, rust_log.as_deref()))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            ui::erro(&mensagem(&e));
            ExitCode::FAILURE
        }
    }
}

// RUST_LOG válido vale inteiro; sem ele, `warn` (ou `info` com --verbose).
fn filtro_de_log(verbose: bool, rust_log: Option<&str>) -> EnvFilter {
    let padrao = if verbose { "info" } else { "warn" };
    rust_log
        .filter(|v| !v.trim().is_empty())
        .and_then(|v| EnvFilter::try_new(v).ok())
        .unwrap_or_else(|| EnvFilter::new(padrao))
}

// Erros do backend são mostrados como vieram; os demais com a cadeia de contexto.
fn mensagem(erro: &anyhow::Error) -> String {
    if let Some(api) = erro.downcast_ref::<ApiError>() {
        return api.mensagem();
    }
    if let Some(TransferError::Api(api)) = erro.downcast_ref::<TransferError>() {
        return api.mensagem();
    }
    format!("{erro:#}")
}

fn load_config(cli: &Cli) -> Result<NexusConfig, NexusError> {
    let mut config = NexusConfig::load()?;
    if let Some(url) = &cli.api_url {
        config.api_url = url.clone();
    }
    if let Some(token) = &cli.token {
        config.token = Some(token.clone());
    }
    Ok(config)
}

fn agora() -> NaiveDateTime {
    Local::now().naive_local()
}

async fn buscar_pendencia(client: &NexusClient, id: PendenciaId) -> Result<Pendencia> {
    let pendencias = ui::com_progresso("Buscando pendências...", client.fetch_pendencias()).await?;
    pendencias
        .into_iter()
        .find(|p| p.id == id)
        .ok_or_else(|| NexusError::PendenciaNotFound(id).into())
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli).context("falha ao carregar a configuração")?;
    let credenciais = match &config.token {
        Some(token) => Credenciais::with_token(token.clone()),
        None => Credenciais::new(),
    };
    let client = NexusClient::new(&config, credenciais)?;
    info!(api_url = %config.api_url, "backend configurado");

    match cli.command {
        Command::Login {
            email,
            senha,
            primeiro_acesso,
        } => {
            let sessao = if primeiro_acesso {
                ui::com_progresso("Definindo senha...", client.definir_senha(&email, &senha)).await?
            } else {
                ui::com_progresso("Autenticando...", client.login(&email, &senha)).await?
            };
            let nome = sessao
                .usuario
                .as_ref()
                .map(|u| u.nome())
                .unwrap_or_else(|| email.clone());
            ui::sucesso(&format!("Autenticado como {nome}"));
            if let Some(token) = client.credenciais().current() {
                println!("{token}");
            }
        }

        Command::Listar {
            filtro,
            usuario,
            setor,
            json,
        } => {
            let pendencias =
                ui::com_progresso("Buscando pendências...", client.fetch_pendencias()).await?;
            let filtro = FiltroPendencias::from(&filtro);
            let mut lista: Vec<Pendencia> = filtro
                .aplicar(&pendencias)
                .into_iter()
                .filter(|p| usuario.is_none_or(|u| visivel_para(p, u, setor)))
                .cloned()
                .collect();
            let agora = agora();
            default_sort(&mut lista, agora);
            if json {
                println!("{}", serde_json::to_string_pretty(&lista)?);
            } else {
                ui::print_pendencias(&lista, agora);
            }
        }

        Command::Rotear { id, json } => {
            let pendencia = buscar_pendencia(&client, id).await?;
            let service = TransferService::new(&client);
            let plan = ui::com_progresso("Avaliando roteiro...", service.prepare(&pendencia)).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&plan.decisao.view())?);
            } else {
                ui::print_decisao(&plan.pendencia, &plan.decisao, &plan.setores, &plan.usuarios);
            }
        }

        Command::Detalhar { id } => {
            let pendencia = buscar_pendencia(&client, id).await?;
            ui::print_detalhe(&pendencia, agora());
        }

        Command::Transferir { id, setor, usuario } => {
            let service = TransferService::new(&client);
            let destino = Destino {
                id_setor: setor,
                id_usuario: usuario,
            };

            // Ctrl-C fecha a tela: a chamada termina, mas o resultado é descartado.
            let scope = ViewScope::new();
            let vigia = {
                let scope = scope.clone();
                tokio::spawn(async move {
                    if tokio::signal::ctrl_c().await.is_ok() {
                        scope.close();
                    }
                })
            };
            let resultado = scope
                .run(ui::com_progresso("Transferindo...", service.transfer(id, destino)))
                .await;
            vigia.abort();

            match resultado {
                None => ui::aviso("Operação interrompida; resultado descartado."),
                Some(resultado) => {
                    let atualizada = resultado?;
                    ui::sucesso(&format!(
                        "Pendência #{} transferida ({})",
                        atualizada.id,
                        destino.alvo().map(|a| a.to_string()).unwrap_or_default()
                    ));
                }
            }
        }

        Command::Criar {
            numero,
            equipamento,
            prioridade,
            prazo,
            origem,
            observacoes,
            roteiro,
            setor,
            usuario,
        } => {
            let mut nova = NovaPendencia {
                numero,
                equipamento,
                prioridade,
                prazo_resposta: prazo,
                origem,
                observacoes,
                id_setor: setor,
                id_usuario: usuario,
                ..Default::default()
            };
            if let Some(id) = roteiro {
                let Some(roteiro) = client.fetch_roteiro(id).await? else {
                    bail!("Roteiro #{id} não encontrado");
                };
                if !roteiro.ativo {
                    bail!("Roteiro #{id} está inativo");
                }
                nova = nova.com_roteiro(&roteiro);
            }
            let criada =
                ui::com_progresso("Criando pendência...", client.criar_pendencia(&nova)).await?;
            ui::sucesso(&format!("Pendência #{} criada: {}", criada.id, criada.titulo()));
        }

        Command::Situacao {
            id,
            situacao,
            observacoes,
        } => {
            let situacao = Situacao::from(situacao);
            let atualizada = ui::com_progresso(
                "Atualizando situação...",
                client.atualizar_situacao(id, situacao, observacoes),
            )
            .await?;
            ui::sucesso(&format!(
                "Pendência #{} agora está {}",
                atualizada.id,
                atualizada
                    .situacao_exibida()
                    .map(|s| s.to_string())
                    .unwrap_or_default()
            ));
        }

        Command::Estatisticas { filtro, json } => {
            let pendencias =
                ui::com_progresso("Buscando pendências...", client.fetch_pendencias()).await?;
            let filtro = FiltroPendencias::from(&filtro);
            let est = Estatisticas::calcular(filtro.aplicar(&pendencias), agora());
            if json {
                println!("{}", serde_json::to_string_pretty(&est)?);
            } else {
                ui::print_estatisticas(&est);
            }
        }

        Command::Roteiros { command } => roteiros(&client, command).await?,
    }

    Ok(())
}

async fn roteiros(client: &NexusClient, command: RoteiroCommand) -> Result<()> {
    match command {
        RoteiroCommand::Listar { ativos } => {
            let roteiros =
                ui::com_progresso("Buscando roteiros...", client.listar_roteiros(ativos)).await?;
            ui::print_roteiros(&roteiros);
        }

        RoteiroCommand::Criar {
            nome,
            descricao,
            passos,
            inativo,
        } => {
            let mut draft = RoteiroDraft::new(nome);
            draft.descricao = descricao;
            draft.ativo = !inativo;
            for alvo in passos {
                draft.adicionar(alvo);
            }
            let payload = draft.to_payload()?;
            let criado =
                ui::com_progresso("Criando roteiro...", client.criar_roteiro(&payload)).await?;
            ui::sucesso(&format!("Roteiro #{} criado", criado.id));
        }

        RoteiroCommand::Editar {
            id,
            nome,
            descricao,
            ativo,
            adicionar,
            remover,
            subir,
            descer,
            alterar,
        } => {
            let Some(roteiro) = client.fetch_roteiro(id).await? else {
                bail!("Roteiro #{id} não encontrado");
            };
            let mut draft = roteiro.to_draft();
            if let Some(nome) = nome {
                draft.nome = nome;
            }
            if descricao.is_some() {
                draft.descricao = descricao;
            }
            if let Some(ativo) = ativo {
                draft.ativo = ativo;
            }
            if let Some(ordem) = remover {
                let removido = ordem.checked_sub(1).and_then(|i| draft.remover(i));
                if removido.is_none() {
                    bail!("Passo {ordem} não existe");
                }
            }
            if let Some(ordem) = subir {
                if !ordem.checked_sub(1).is_some_and(|i| draft.subir(i)) {
                    bail!("Passo {ordem} não pode subir");
                }
            }
            if let Some(ordem) = descer {
                if !ordem.checked_sub(1).is_some_and(|i| draft.descer(i)) {
                    bail!("Passo {ordem} não pode descer");
                }
            }
            if let Some((ordem, alvo)) = alterar {
                if !ordem.checked_sub(1).is_some_and(|i| draft.alterar(i, alvo)) {
                    bail!("Passo {ordem} não existe");
                }
            }
            for alvo in adicionar {
                draft.adicionar(alvo);
            }
            let payload = draft.to_payload()?;
            let atualizado = ui::com_progresso(
                "Salvando roteiro...",
                client.atualizar_roteiro(id, &payload),
            )
            .await?;
            ui::print_roteiros(std::slice::from_ref(&atualizado));
        }

        RoteiroCommand::Excluir { id } => {
            ui::com_progresso("Excluindo roteiro...", client.excluir_roteiro(id)).await?;
            ui::sucesso(&format!("Roteiro #{id} excluído"));
        }
    }
    Ok(())
}
