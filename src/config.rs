//! Configuração do autoapply carregada a partir de `autoapply.toml`.
//!
//! A struct [`BotConfig`] contém todos os parâmetros configuráveis, incluindo
//! o [`ApplicantProfile`] usado para preencher formulários. Valores não
//! presentes no arquivo usam defaults sensíveis. As variáveis de ambiente
//! `LINKEDIN_EMAIL`, `LINKEDIN_PASSWORD` e `OPENAI_API_KEY` têm precedência
//! sobre o arquivo.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuração de nível superior carregada de `autoapply.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
    /// E-mail de login do LinkedIn.
    #[serde(default)]
    pub linkedin_email: String,

    /// Senha de login do LinkedIn.
    #[serde(default)]
    pub linkedin_password: String,

    /// Chave da API OpenAI.
    #[serde(default)]
    pub openai_api_key: String,

    /// Modelo com capacidade de visão usado para interpretar formulários.
    #[serde(default = "default_model")]
    pub model: String,

    /// Temperatura de amostragem do modelo.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Executa o navegador sem janela visível.
    #[serde(default)]
    pub headless: bool,

    /// Diretório raiz onde as sessões são gravadas.
    #[serde(default = "default_sessions_dir")]
    pub sessions_dir: String,

    /// Orçamento de tempo por candidatura, em segundos.
    #[serde(default = "default_application_budget_secs")]
    pub application_budget_secs: u64,

    /// Janela de intervenção manual para OTP/captcha, em segundos.
    #[serde(default = "default_intervention_window_secs")]
    pub intervention_window_secs: u64,

    /// Intervalo de polling durante a espera por intervenção manual.
    #[serde(default = "default_verification_poll_secs")]
    pub verification_poll_secs: u64,

    /// Máximo de retentativas de chamada ao modelo antes de falhar a candidatura.
    #[serde(default = "default_model_retries")]
    pub model_retries: u32,

    /// Atraso base em milissegundos para backoff exponencial.
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Máximo de passos observar-decidir-agir por formulário.
    #[serde(default = "default_max_form_steps")]
    pub max_form_steps: u32,

    /// Perfil do candidato usado para responder os formulários.
    #[serde(default)]
    pub profile: ApplicantProfile,
}

/// Perfil imutável do candidato. Criado uma vez no startup; somente leitura depois.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApplicantProfile {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub linkedin_url: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub zip_code: String,
    #[serde(default)]
    pub current_title: String,
    #[serde(default)]
    pub salary_expectation: String,
    #[serde(default)]
    pub degree: String,
    #[serde(default)]
    pub university: String,
    #[serde(default)]
    pub graduation_year: String,

    /// Respostas padrão para perguntas ambíguas ou repetitivas.
    #[serde(default)]
    pub defaults: CannedAnswers,
}

/// Respostas fixas configuráveis para perguntas recorrentes de formulário.
///
/// A fonte original respondia sempre "Yes"/"2"; aqui isso é configurável.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CannedAnswers {
    #[serde(default = "default_years")]
    pub years_of_experience: String,
    #[serde(default = "default_notice_period")]
    pub notice_period: String,
    #[serde(default = "default_yes")]
    pub willing_to_relocate: String,
    #[serde(default = "default_yes")]
    pub authorized_to_work: String,
    #[serde(default = "default_no")]
    pub require_sponsorship: String,
}

impl Default for CannedAnswers {
    fn default() -> Self {
        Self {
            years_of_experience: default_years(),
            notice_period: default_notice_period(),
            willing_to_relocate: default_yes(),
            authorized_to_work: default_yes(),
            require_sponsorship: default_no(),
        }
    }
}

fn default_model() -> String {
    "gpt-4o".to_string()
}

fn default_temperature() -> f32 {
    0.4
}

fn default_sessions_dir() -> String {
    "sessions".to_string()
}

// Limite de 5 minutos por candidatura.
fn default_application_budget_secs() -> u64 {
    300
}

// Janela de 2 minutos para o usuário resolver OTP/captcha.
fn default_intervention_window_secs() -> u64 {
    120
}

fn default_verification_poll_secs() -> u64 {
    5
}

fn default_model_retries() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    1000
}

fn default_max_form_steps() -> u32 {
    40
}

fn default_years() -> String {
    "2".to_string()
}

fn default_notice_period() -> String {
    "2 weeks".to_string()
}

fn default_yes() -> String {
    "Yes".to_string()
}

fn default_no() -> String {
    "No".to_string()
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            linkedin_email: String::new(),
            linkedin_password: String::new(),
            openai_api_key: String::new(),
            model: default_model(),
            temperature: default_temperature(),
            headless: false,
            sessions_dir: default_sessions_dir(),
            application_budget_secs: default_application_budget_secs(),
            intervention_window_secs: default_intervention_window_secs(),
            verification_poll_secs: default_verification_poll_secs(),
            model_retries: default_model_retries(),
            base_delay_ms: default_base_delay_ms(),
            max_form_steps: default_max_form_steps(),
            profile: ApplicantProfile::default(),
        }
    }
}

impl BotConfig {
    /// Carrega a configuração de `autoapply.toml` no diretório atual.
    /// Usa valores padrão se o arquivo não existir.
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new("autoapply.toml"))
    }

    /// Carrega a configuração de um caminho específico.
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            toml::from_str::<BotConfig>(&contents)?
        } else {
            Self::default()
        };

        // Variáveis de ambiente têm precedência sobre o arquivo para os segredos.
        for (var, field) in [
            ("LINKEDIN_EMAIL", &mut config.linkedin_email),
            ("LINKEDIN_PASSWORD", &mut config.linkedin_password),
            ("OPENAI_API_KEY", &mut config.openai_api_key),
        ] {
            if let Ok(value) = std::env::var(var)
                && !value.is_empty()
            {
                *field = value;
            }
        }

        Ok(config)
    }

    /// Valida que os três segredos obrigatórios estão presentes e não são
    /// valores de template.
    pub fn validate_credentials(&self) -> Result<(), String> {
        let checks = [
            ("linkedin_email / LINKEDIN_EMAIL", &self.linkedin_email),
            ("linkedin_password / LINKEDIN_PASSWORD", &self.linkedin_password),
            ("openai_api_key / OPENAI_API_KEY", &self.openai_api_key),
        ];
        for (name, value) in checks {
            if value.trim().is_empty() {
                return Err(format!("missing required credential: {name}"));
            }
            if value.starts_with("your_") || value.contains("example.com") {
                return Err(format!("template value still present for: {name}"));
            }
        }
        Ok(())
    }

    /// Template comentado de `autoapply.toml` gravado pelo comando `init`.
    pub fn template() -> &'static str {
        r#"# autoapply.toml — copy, fill in and keep out of version control.
# The three secrets below can also come from the environment
# (LINKEDIN_EMAIL, LINKEDIN_PASSWORD, OPENAI_API_KEY), which takes precedence.

linkedin_email = "your_linkedin_email@example.com"
linkedin_password = "your_linkedin_password"
openai_api_key = "your_openai_api_key"

# model = "gpt-4o"
# temperature = 0.4
# headless = false
# sessions_dir = "sessions"
# application_budget_secs = 300
# intervention_window_secs = 120
# model_retries = 3
# base_delay_ms = 1000
# max_form_steps = 40

[profile]
first_name = "Your First Name"
last_name = "Your Last Name"
email = "your_email@example.com"
phone = "+1234567890"
linkedin_url = "https://linkedin.com/in/yourprofile"
city = "Your City"
state = "Your State"
country = "Your Country"
zip_code = "12345"
current_title = "Your Current Job Title"
salary_expectation = "80000"
degree = "Your Degree"
university = "Your University"
graduation_year = "2020"

[profile.defaults]
years_of_experience = "2"
notice_period = "2 weeks"
willing_to_relocate = "Yes"
authorized_to_work = "Yes"
require_sponsorship = "No"
"#
    }
}
