//! Interface de terminal do Nexus — spinners e saída colorida.
//!
//! Usa `indicatif` para o spinner enquanto o backend responde e `console`
//! para estilização com cores.

use chrono::NaiveDateTime;
use console::Style;
use indicatif::{ProgressBar, ProgressStyle};

use nexus::domain::{Alvo, EntradaHistorico, Pendencia, Roteiro};
use nexus::listing::Estatisticas;
use nexus::RoutingDecision;
use nexus::api::{Setor, Usuario};

/// Spinner exibido durante uma chamada ao backend.
pub struct Progresso {
    pb: ProgressBar,
}

impl Progresso {
    pub fn start(mensagem: &str) -> Self {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            pb.set_style(style);
        }
        pb.set_message(mensagem.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        Self { pb }
    }

    pub fn finish(self) {
        self.pb.finish_and_clear();
    }
}

/// Executa `operacao` com um spinner ativo.
pub async fn com_progresso<T>(mensagem: &str, operacao: impl Future<Output = T>) -> T {
    let progresso = Progresso::start(mensagem);
    let resultado = operacao.await;
    progresso.finish();
    resultado
}

pub fn sucesso(mensagem: &str) {
    println!("  {} {mensagem}", Style::new().green().bold().apply_to("✓"));
}

pub fn aviso(mensagem: &str) {
    eprintln!("  {} {mensagem}", Style::new().yellow().apply_to("!"));
}

/// Notificação de erro; a mensagem é mostrada como veio.
pub fn erro(mensagem: &str) {
    eprintln!("  {} {mensagem}", Style::new().red().bold().apply_to("✗"));
}

pub fn print_pendencias(pendencias: &[Pendencia], agora: NaiveDateTime) {
    if pendencias.is_empty() {
        println!("Nenhuma pendência encontrada.");
        return;
    }
    let dim = Style::new().dim();
    let red = Style::new().red().bold();
    println!(
        "{}",
        Style::new().bold().apply_to(format!(
            "{:>6}  {:<20} {:<10} {:<5}  {:<14} {:<8} {}",
            "ID", "Pendência", "Data", "Hora", "Situação", "Prior.", "Detentor"
        ))
    );
    for p in pendencias {
        let detentor = match (p.id_usuario, p.id_setor) {
            (Some(u), _) => Alvo::Usuario(u).to_string(),
            (None, Some(s)) => Alvo::Setor(s).to_string(),
            (None, None) => "-".to_string(),
        };
        let linha = format!(
            "{:>6}  {:<20} {:<10} {:<5}  {:<14} {:<8} {}",
            p.id,
            p.titulo(),
            p.data().unwrap_or_default(),
            p.hora().unwrap_or_default(),
            p.situacao_exibida().map(|s| s.to_string()).unwrap_or_default(),
            p.prioridade.as_ref().map(|pr| pr.to_string()).unwrap_or_default(),
            detentor,
        );
        if p.is_overdue(agora) {
            println!("{} {}", linha, red.apply_to("ATRASADA"));
        } else {
            println!("{linha}");
        }
        if let Some(id) = p.id_roteiro {
            println!("{:>8}{}", "", dim.apply_to(format!("roteiro #{id}")));
        }
    }
}

fn detentor(p: &Pendencia) -> String {
    match (p.id_usuario, p.id_setor) {
        (Some(u), Some(s)) => format!("{} ({})", Alvo::Usuario(u), Alvo::Setor(s)),
        (Some(u), None) => Alvo::Usuario(u).to_string(),
        (None, Some(s)) => Alvo::Setor(s).to_string(),
        (None, None) => "-".to_string(),
    }
}

/// Cabeçalho de uma entrada: ação e data, quando presentes.
fn titulo_entrada(entrada: &EntradaHistorico) -> String {
    match (entrada.acao(), entrada.data_alteracao()) {
        (Some(acao), Some(data)) => format!("{data}  {acao}"),
        (Some(acao), None) => acao.to_string(),
        (None, Some(data)) => data.to_string(),
        (None, None) => "Registro".to_string(),
    }
}

/// Linhas de detalhe de uma pendência, sem estilo.
pub fn detalhe(p: &Pendencia, agora: NaiveDateTime) -> Vec<String> {
    let mut linhas = vec![
        format!("{} #{}", p.titulo(), p.id),
        format!(
            "Criada: {} {}",
            p.data().unwrap_or_else(|| "-".into()),
            p.hora().unwrap_or_default()
        )
        .trim_end()
        .to_string(),
        format!(
            "Situação: {}",
            p.situacao_exibida().map(|s| s.to_string()).unwrap_or_else(|| "-".into())
        ),
        format!(
            "Prioridade: {}",
            p.prioridade.as_ref().map(|pr| pr.to_string()).unwrap_or_else(|| "-".into())
        ),
        format!("Detentor: {}", detentor(p)),
    ];
    if let Some(id) = p.id_roteiro {
        linhas.push(format!("Roteiro: #{id}"));
    }
    if let Some(status) = &p.status_transferencia {
        linhas.push(format!("Transferência: {status}"));
    }
    if let Some(limite) = p.limite_resposta() {
        let atraso = if p.is_overdue(agora) { " (ATRASADA)" } else { "" };
        linhas.push(format!("Prazo: {}{atraso}", limite.format("%Y-%m-%d %H:%M")));
    }
    if let Some(obs) = p.observacoes.as_deref().filter(|o| !o.trim().is_empty()) {
        linhas.push(format!("Observações: {obs}"));
    }

    if p.historico.is_empty() {
        linhas.push("Sem histórico.".to_string());
        return linhas;
    }
    linhas.push(format!("Histórico ({} registros):", p.historico.len()));
    for entrada in p.historico.iter() {
        linhas.push(format!("  {}", titulo_entrada(entrada)));
        for (rotulo, valor) in entrada.linhas() {
            if rotulo.is_empty() {
                linhas.push(format!("    {valor}"));
            } else {
                linhas.push(format!("    {rotulo}: {valor}"));
            }
        }
    }
    if let Some(ultima) = p.historico.ultima() {
        linhas.push(format!("Última alteração: {}", titulo_entrada(ultima)));
    }
    linhas
}

pub fn print_detalhe(p: &Pendencia, agora: NaiveDateTime) {
    let linhas = detalhe(p, agora);
    let bold = Style::new().bold();
    let red = Style::new().red().bold();
    for (i, linha) in linhas.iter().enumerate() {
        if i == 0 {
            println!("{}", bold.apply_to(linha));
        } else if linha.ends_with("(ATRASADA)") {
            println!("{}", red.apply_to(linha));
        } else {
            println!("{linha}");
        }
    }
}

fn nome_alvo(alvo: &Alvo, setores: &[Setor], usuarios: &[Usuario]) -> String {
    match alvo {
        Alvo::Setor(id) => setores
            .iter()
            .find(|s| s.id == *id)
            .map(|s| s.nome())
            .unwrap_or_else(|| alvo.to_string()),
        Alvo::Usuario(id) => usuarios
            .iter()
            .find(|u| u.id == *id)
            .map(|u| u.nome())
            .unwrap_or_else(|| alvo.to_string()),
    }
}

pub fn print_decisao(
    pendencia: &Pendencia,
    decisao: &RoutingDecision,
    setores: &[Setor],
    usuarios: &[Usuario],
) {
    let cyan = Style::new().cyan().bold();
    println!(
        "{} {} {}",
        cyan.apply_to(decisao.state()),
        pendencia.titulo(),
        Style::new().dim().apply_to(format!("#{}", pendencia.id))
    );
    match decisao {
        RoutingDecision::Unrestricted => println!("  Sem roteiro: qualquer setor ou usuário."),
        RoutingDecision::Untracked { .. } => {
            if let Some(motivo) = decisao.warning() {
                aviso(&format!("Roteiro ignorado: {motivo}"));
            }
            println!("  Qualquer setor ou usuário.");
        }
        RoutingDecision::Exhausted { posicao } => println!(
            "  Último passo do roteiro ({}). Remova a pendência do roteiro para transferir.",
            posicao + 1
        ),
        RoutingDecision::Restricted { posicao, proximo } => println!(
            "  Passo {} -> próximo destino: {}",
            posicao + 1,
            nome_alvo(proximo, setores, usuarios)
        ),
    }
}

pub fn print_estatisticas(est: &Estatisticas) {
    let bold = Style::new().bold();
    println!("{} {}", bold.apply_to("Total:"), est.total);
    println!(
        "{} {}",
        bold.apply_to("Atrasadas:"),
        Style::new().red().apply_to(est.atrasadas)
    );
    for (titulo, grupos) in [
        ("Por status", &est.por_status),
        ("Por situação", &est.por_situacao),
        ("Por prioridade", &est.por_prioridade),
    ] {
        println!();
        println!("{}", bold.apply_to(titulo));
        for (valor, quantidade) in grupos {
            println!("  {valor:<20} {quantidade:>5}");
        }
    }
}

pub fn print_roteiros(roteiros: &[Roteiro]) {
    if roteiros.is_empty() {
        println!("Nenhum roteiro cadastrado.");
        return;
    }
    let dim = Style::new().dim();
    for r in roteiros {
        let estado = if r.ativo { "ativo" } else { "inativo" };
        println!(
            "{} {} {}",
            Style::new().bold().apply_to(format!("#{}", r.id)),
            r.nome,
            dim.apply_to(format!("({estado})"))
        );
        for passo in r.passos_normalizados() {
            println!("    {}. {}", passo.ordem, passo.alvo);
        }
    }
}
