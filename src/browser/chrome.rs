//! Sessão de navegador via chromiumoxide (Chrome DevTools Protocol).
//!
//! [`ChromeSession`] é dona do processo do Chrome e da task que bombeia os
//! eventos CDP; [`ChromePage`] implementa [`PageDriver`] sobre uma aba única.
//! Toda a execução usa uma única aba, um job por vez.

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::page::{Page, ScreenshotParams};
use futures::StreamExt;
use tokio::task::JoinHandle;

use super::driver::{BrowserError, PageDriver};

/// Sessão de navegador. Encerre com [`ChromeSession::close`] ao final do run.
pub struct ChromeSession {
    browser: Browser,
    handler_task: JoinHandle<()>,
}

impl ChromeSession {
    /// Lança uma instância do Chrome e inicia a task de eventos CDP.
    pub async fn launch(headless: bool) -> Result<Self, BrowserError> {
        let mut builder = BrowserConfig::builder();
        if !headless {
            builder = builder.with_head();
        }
        let config = builder.build().map_err(BrowserError::Launch)?;

        let (browser, mut handler) = Browser::launch(config).await?;
        let handler_task = tokio::spawn(async move {
            while handler.next().await.is_some() {}
        });

        Ok(Self {
            browser,
            handler_task,
        })
    }

    /// Abre a aba única usada por toda a sessão.
    pub async fn new_page(&self) -> Result<ChromePage, BrowserError> {
        let page = self.browser.new_page("about:blank").await?;
        Ok(ChromePage { page })
    }

    /// Fecha o navegador e encerra a task de eventos.
    pub async fn close(mut self) -> Result<(), BrowserError> {
        self.browser.close().await?;
        self.handler_task.abort();
        Ok(())
    }
}

/// Uma aba do Chrome implementando [`PageDriver`].
pub struct ChromePage {
    page: Page,
}

impl PageDriver for ChromePage {
    async fn goto(&self, url: &str) -> Result<(), BrowserError> {
        self.page
            .goto(url)
            .await
            .map_err(|e| BrowserError::Navigation {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
        self.page
            .wait_for_navigation()
            .await
            .map_err(|e| BrowserError::Navigation {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
        Ok(())
    }

    async fn current_url(&self) -> Result<String, BrowserError> {
        Ok(self.page.url().await?.unwrap_or_default())
    }

    async fn exists(&self, selector: &str) -> Result<bool, BrowserError> {
        Ok(self.page.find_element(selector).await.is_ok())
    }

    async fn click(&self, selector: &str) -> Result<(), BrowserError> {
        let element = self.page.find_element(selector).await.map_err(|_| {
            BrowserError::ElementNotFound {
                selector: selector.to_string(),
            }
        })?;
        element.click().await?;
        Ok(())
    }

    async fn fill(&self, selector: &str, value: &str) -> Result<(), BrowserError> {
        let element = self.page.find_element(selector).await.map_err(|_| {
            BrowserError::ElementNotFound {
                selector: selector.to_string(),
            }
        })?;
        element.click().await?;
        element.type_str(value).await?;
        Ok(())
    }

    async fn eval_json(&self, script: &str) -> Result<serde_json::Value, BrowserError> {
        let result = self
            .page
            .evaluate(script)
            .await
            .map_err(|e| BrowserError::Eval(e.to_string()))?;
        result
            .into_value()
            .map_err(|e| BrowserError::Eval(e.to_string()))
    }

    async fn screenshot_png(&self) -> Result<Vec<u8>, BrowserError> {
        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .full_page(false)
            .build();
        Ok(self.page.screenshot(params).await?)
    }
}
