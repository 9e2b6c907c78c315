//! Interface de linha de comando do autoapply baseada em clap.
//!
//! Define a struct [`Cli`] com subcomandos [`Command`] (run, init, report)
//! e flags globais (--headless, --max-jobs, --verbose).

use clap::{Parser, Subcommand};

/// autoapply — candidaturas Easy Apply automatizadas no LinkedIn.
#[derive(Debug, Parser)]
#[command(name = "autoapply", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Executa o navegador sem janela visível.
    #[arg(long, global = true, default_value_t = false)]
    pub headless: bool,

    /// Processa no máximo N vagas salvas nesta sessão.
    #[arg(long, global = true)]
    pub max_jobs: Option<usize>,

    /// Habilita saída detalhada (verbose).
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Faz login, percorre as vagas salvas e envia as candidaturas Easy Apply.
    Run,

    /// Grava um template comentado de `autoapply.toml` no diretório atual.
    Init,

    /// Mostra o relatório final da sessão mais recente.
    Report,
}
