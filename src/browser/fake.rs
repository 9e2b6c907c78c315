//! Scripted in-memory [`PageDriver`] used across the crate's tests.

use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;

use super::driver::{BrowserError, PageDriver};

#[derive(Default)]
struct FakeState {
    urls: VecDeque<String>,
    last_url: String,
    elements: HashSet<String>,
    evals: VecDeque<serde_json::Value>,
    goto_log: Vec<String>,
    clicks: Vec<String>,
    fills: Vec<(String, String)>,
    failing_gotos: HashSet<String>,
}

/// A page whose answers are scripted up front. URLs are consumed as a
/// sequence (the last one sticks); eval results are consumed as a queue.
#[derive(Default)]
pub struct FakePage {
    state: Mutex<FakeState>,
}

impl FakePage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script_urls(&self, urls: &[&str]) {
        let mut s = self.state.lock().unwrap();
        s.urls = urls.iter().map(|u| u.to_string()).collect();
    }

    pub fn add_element(&self, selector: &str) {
        self.state.lock().unwrap().elements.insert(selector.to_string());
    }

    pub fn remove_element(&self, selector: &str) {
        self.state.lock().unwrap().elements.remove(selector);
    }

    pub fn push_eval(&self, value: serde_json::Value) {
        self.state.lock().unwrap().evals.push_back(value);
    }

    /// Make any `goto` whose URL contains `fragment` fail.
    pub fn fail_goto_containing(&self, fragment: &str) {
        self.state
            .lock()
            .unwrap()
            .failing_gotos
            .insert(fragment.to_string());
    }

    pub fn goto_log(&self) -> Vec<String> {
        self.state.lock().unwrap().goto_log.clone()
    }

    pub fn clicks(&self) -> Vec<String> {
        self.state.lock().unwrap().clicks.clone()
    }

    pub fn fills(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().fills.clone()
    }
}

impl PageDriver for FakePage {
    async fn goto(&self, url: &str) -> Result<(), BrowserError> {
        let mut s = self.state.lock().unwrap();
        if s.failing_gotos.iter().any(|f| url.contains(f)) {
            return Err(BrowserError::Navigation {
                url: url.to_string(),
                reason: "scripted failure".into(),
            });
        }
        s.goto_log.push(url.to_string());
        s.last_url = url.to_string();
        Ok(())
    }

    async fn current_url(&self) -> Result<String, BrowserError> {
        let mut s = self.state.lock().unwrap();
        if let Some(url) = if s.urls.len() > 1 {
            s.urls.pop_front()
        } else {
            s.urls.front().cloned()
        } {
            return Ok(url);
        }
        Ok(if s.last_url.is_empty() {
            "about:blank".into()
        } else {
            s.last_url.clone()
        })
    }

    async fn exists(&self, selector: &str) -> Result<bool, BrowserError> {
        Ok(self.state.lock().unwrap().elements.contains(selector))
    }

    async fn click(&self, selector: &str) -> Result<(), BrowserError> {
        let mut s = self.state.lock().unwrap();
        if !s.elements.contains(selector) {
            return Err(BrowserError::ElementNotFound {
                selector: selector.to_string(),
            });
        }
        s.clicks.push(selector.to_string());
        Ok(())
    }

    async fn fill(&self, selector: &str, value: &str) -> Result<(), BrowserError> {
        let mut s = self.state.lock().unwrap();
        if !s.elements.contains(selector) {
            return Err(BrowserError::ElementNotFound {
                selector: selector.to_string(),
            });
        }
        s.fills.push((selector.to_string(), value.to_string()));
        Ok(())
    }

    async fn eval_json(&self, _script: &str) -> Result<serde_json::Value, BrowserError> {
        self.state
            .lock()
            .unwrap()
            .evals
            .pop_front()
            .ok_or_else(|| BrowserError::Eval("no scripted eval result left".into()))
    }

    async fn screenshot_png(&self) -> Result<Vec<u8>, BrowserError> {
        // Minimal PNG magic; enough for the vision payload helpers.
        Ok(vec![0x89, b'P', b'N', b'G'])
    }
}
