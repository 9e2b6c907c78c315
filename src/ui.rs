//! Interface de terminal do autoapply — spinners e saída colorida.
//!
//! Usa as crates `indicatif` para spinners de progresso e `console` para
//! estilização com cores. O [`AttemptProgress`] acompanha visualmente
//! cada candidatura no terminal.

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::attempt::{AttemptOutcome, SessionReport};

/// Indicador visual de progresso para uma candidatura no terminal.
///
/// Exibe um spinner animado durante o processamento e mensagens coloridas
/// por resultado: verde (enviada), vermelho (falhou), amarelo (pulada),
/// ciano (tempo esgotado).
pub struct AttemptProgress {
    pb: ProgressBar,
    green: Style,
    red: Style,
    yellow: Style,
    cyan: Style,
}

impl AttemptProgress {
    /// Inicia o spinner com o título da vaga e retorna a instância de progresso.
    pub fn start(index: usize, total: usize, title: &str, company: &str) -> Self {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .expect("invalid template"),
        );
        pb.set_message(format!("[{index}/{total}] {title} — {company}"));
        pb.enable_steady_tick(std::time::Duration::from_millis(100));

        Self {
            pb,
            green: Style::new().green().bold(),
            red: Style::new().red().bold(),
            yellow: Style::new().yellow(),
            cyan: Style::new().cyan(),
        }
    }

    /// Finaliza o spinner e exibe o resultado terminal da candidatura.
    pub fn complete(&self, outcome: AttemptOutcome, reason: &str) {
        self.pb.finish_and_clear();
        match outcome {
            AttemptOutcome::Succeeded => {
                println!("  {} Application submitted", self.green.apply_to("✓"));
            }
            AttemptOutcome::Failed => {
                println!("  {} Application failed: {reason}", self.red.apply_to("✗"));
            }
            AttemptOutcome::Skipped => {
                println!("  {} Skipped: {reason}", self.yellow.apply_to("→"));
            }
            AttemptOutcome::TimedOut => {
                println!("  {} Timed out after the per-job budget", self.cyan.apply_to("⏱"));
            }
        }
    }
}

/// Imprime o relatório final da sessão com contagens coloridas.
pub fn print_report(report: &SessionReport) {
    let bold = Style::new().bold();
    let green = Style::new().green();
    let red = Style::new().red();
    let yellow = Style::new().yellow();
    let cyan = Style::new().cyan();

    println!();
    println!("{}", bold.apply_to("─── Session Report ───"));
    println!("  attempted: {}", report.attempted);
    println!("  {} {}", green.apply_to("succeeded:"), report.succeeded);
    println!("  {} {}", red.apply_to("failed:   "), report.failed);
    println!("  {} {}", yellow.apply_to("skipped:  "), report.skipped);
    println!("  {} {}", cyan.apply_to("timed out:"), report.timed_out);
    println!("  easy apply found: {}", report.easy_apply_found);
    println!("  success rate: {:.1}%", report.success_rate() * 100.0);
}
