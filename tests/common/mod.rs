//! Scripted in-memory browser shared by the controller tests.

#![allow(dead_code)]

use annuaire_scout::core::error::{Result, ScoutError};
use annuaire_scout::{ElementTarget, PageDriver};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

pub const LISTING_URL: &str = "https://www.pagesjaunes.fr/annuaire/lyon-69/garages";

pub fn init_logger() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// A listing page with one card per `(id, name)`, plus an optional pagination link.
pub fn listing_page(cards: &[(u32, &str)], next: Option<&str>) -> String {
    let items: String = cards
        .iter()
        .map(|(id, name)| {
            format!(
                r#"<li><h3><a href="/pros/{id}">{name}</a></h3>
                   <p>Entretien, réparation et carrosserie toutes marques depuis 1985.</p>
                   <p class="adresse">{id} rue Garibaldi 69003 Lyon</p></li>"#
            )
        })
        .collect();
    format!(
        r#"<html><body><ul class="bi-list">{items}</ul><nav>{}</nav></body></html>"#,
        next.unwrap_or_default()
    )
}

#[derive(Default)]
struct State {
    pages: Vec<String>,
    current_page: usize,
    current_html: String,
    current_url: Option<String>,
    advance_on: HashSet<String>,
    routes: HashMap<String, String>,
    failing_gotos: HashSet<String>,
    failing_clicks: HashSet<ElementTarget>,
    clicks: Vec<ElementTarget>,
    scrolls: Vec<ElementTarget>,
    gotos: Vec<String>,
    scripts: Vec<String>,
}

/// Serves fixed HTML: a sequence of listing pages walked by clicking an
/// `advance_on` selector, and detail pages reached through `goto`.
pub struct ScriptedDriver {
    state: Mutex<State>,
}

impl ScriptedDriver {
    pub fn listing(pages: Vec<String>) -> Self {
        let current_html = pages.first().cloned().unwrap_or_default();
        Self {
            state: Mutex::new(State {
                pages,
                current_html,
                current_url: Some(LISTING_URL.to_string()),
                ..Default::default()
            }),
        }
    }

    pub fn blank() -> Self {
        Self::listing(Vec::new())
    }

    pub fn advance_on(self, selector: &str) -> Self {
        self.state.lock().unwrap().advance_on.insert(selector.to_string());
        self
    }

    pub fn route(self, url: &str, html: impl Into<String>) -> Self {
        self.state
            .lock()
            .unwrap()
            .routes
            .insert(url.to_string(), html.into());
        self
    }

    pub fn fail_goto(self, url: &str) -> Self {
        self.state.lock().unwrap().failing_gotos.insert(url.to_string());
        self
    }

    pub fn fail_click(self, target: ElementTarget) -> Self {
        self.state.lock().unwrap().failing_clicks.insert(target);
        self
    }

    pub fn clicks(&self) -> Vec<ElementTarget> {
        self.state.lock().unwrap().clicks.clone()
    }

    pub fn scrolls(&self) -> Vec<ElementTarget> {
        self.state.lock().unwrap().scrolls.clone()
    }

    pub fn gotos(&self) -> Vec<String> {
        self.state.lock().unwrap().gotos.clone()
    }

    pub fn scripts(&self) -> Vec<String> {
        self.state.lock().unwrap().scripts.clone()
    }
}

#[async_trait]
impl PageDriver for ScriptedDriver {
    async fn goto(&self, url: &str, _timeout: Duration) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.gotos.push(url.to_string());
        if state.failing_gotos.contains(url) {
            return Err(ScoutError::Timeout {
                what: format!("navigation to {url}"),
                after: Duration::from_secs(30),
            });
        }
        let Some(html) = state.routes.get(url).cloned() else {
            return Err(ScoutError::Navigation {
                url: url.to_string(),
                reason: "no route".to_string(),
            });
        };
        state.current_html = html;
        state.current_url = Some(url.to_string());
        Ok(())
    }

    async fn html(&self) -> Result<String> {
        Ok(self.state.lock().unwrap().current_html.clone())
    }

    async fn evaluate(&self, script: &str) -> Result<serde_json::Value> {
        self.state.lock().unwrap().scripts.push(script.to_string());
        Ok(serde_json::Value::Null)
    }

    async fn scroll_into_view(&self, target: &ElementTarget) -> Result<()> {
        self.state.lock().unwrap().scrolls.push(target.clone());
        Ok(())
    }

    async fn click(&self, target: &ElementTarget) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.failing_clicks.contains(target) {
            return Err(ScoutError::ElementNotFound {
                selector: target.selector.clone(),
                index: target.index,
            });
        }
        if state.advance_on.contains(&target.selector) {
            let next = state.current_page + 1;
            let Some(html) = state.pages.get(next).cloned() else {
                return Err(ScoutError::Browser("next page did not load".to_string()));
            };
            state.current_page = next;
            state.current_html = html;
            state.current_url = Some(format!("{LISTING_URL}?page={}", next + 1));
        }
        state.clicks.push(target.clone());
        Ok(())
    }

    async fn current_url(&self) -> Option<String> {
        self.state.lock().unwrap().current_url.clone()
    }
}
