//! Tipos de dados para requisições e respostas da API OpenAI Chat Completions.
//!
//! Todas as structs derivam `Serialize` e `Deserialize` para conversão JSON
//! conforme o formato esperado pelo endpoint `v1/chat/completions`, incluindo
//! as partes de conteúdo multimodais (texto + imagem) usadas pela visão.

use base64::Engine;
use serde::{Deserialize, Serialize};

/// Corpo da requisição para o endpoint `/v1/chat/completions`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Identificador do modelo a ser usado (ex.: "gpt-4o").
    pub model: String,
    /// Temperatura de amostragem.
    pub temperature: f32,
    /// Número máximo de tokens na resposta gerada pelo modelo.
    pub max_tokens: u32,
    /// Lista de mensagens compondo a conversa.
    pub messages: Vec<ChatMessage>,
}

/// Uma única mensagem em uma conversa, com conteúdo multimodal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Papel do remetente: "system", "user" ou "assistant".
    pub role: String,
    /// Partes de conteúdo (texto e/ou imagem).
    pub content: Vec<ContentPart>,
}

/// Uma parte de conteúdo dentro de uma mensagem.
///
/// O discriminador é serializado como `"type"` no JSON, seguindo o formato
/// da API da OpenAI: `{"type": "text", ...}` ou `{"type": "image_url", ...}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    /// Conteúdo textual.
    Text { text: String },
    /// Imagem embutida como data URL.
    ImageUrl { image_url: ImageUrl },
}

/// Referência de imagem — aqui sempre uma data URL base64.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageUrl {
    pub url: String,
}

impl ChatMessage {
    /// Mensagem de sistema somente texto.
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: "system".into(),
            content: vec![ContentPart::Text { text: text.into() }],
        }
    }

    /// Mensagem de usuário somente texto.
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            role: "user".into(),
            content: vec![ContentPart::Text { text: text.into() }],
        }
    }

    /// Mensagem de usuário com texto e um screenshot PNG embutido.
    pub fn user_with_screenshot(text: impl Into<String>, png: &[u8]) -> Self {
        let encoded = base64::engine::general_purpose::STANDARD.encode(png);
        Self {
            role: "user".into(),
            content: vec![
                ContentPart::Text { text: text.into() },
                ContentPart::ImageUrl {
                    image_url: ImageUrl {
                        url: format!("data:image/png;base64,{encoded}"),
                    },
                },
            ],
        }
    }
}

/// Resposta retornada pelo endpoint `/v1/chat/completions`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Identificador único da resposta (gerado pela API).
    pub id: String,
    /// Modelo que gerou a resposta.
    pub model: String,
    /// Alternativas geradas — normalmente uma única.
    pub choices: Vec<Choice>,
    /// Estatísticas de uso de tokens.
    pub usage: Usage,
}

/// Uma alternativa de resposta do modelo.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Choice {
    pub index: u32,
    pub message: ResponseMessage,
    /// Motivo da parada da geração (ex.: "stop", "length").
    pub finish_reason: Option<String>,
}

/// Mensagem gerada pelo modelo — conteúdo textual simples na resposta.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseMessage {
    pub role: String,
    pub content: Option<String>,
}

/// Estatísticas de consumo de tokens para uma chamada à API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl ChatResponse {
    /// Texto da primeira alternativa, já aparado. Vazio se não houver.
    pub fn text(&self) -> String {
        self.choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .map(str::trim)
            .unwrap_or_default()
            .to_string()
    }
}
