//! Scripted fetchers for unit tests

use crate::crawler::fetcher::{
    Credentials, FetchError, FetchedPage, FetcherFactory, LoginError, PageFetcher,
};
use crate::crawler::parser::DiscoveredLinks;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use url::Url;

pub fn page(location: &Url, content: &str, labeled: Option<&Url>, rel: Option<&Url>) -> FetchedPage {
    FetchedPage {
        location: location.clone(),
        content: content.to_string(),
        links: DiscoveredLinks {
            labeled_next: labeled.cloned(),
            rel_next: rel.cloned(),
        },
    }
}

#[derive(Default)]
struct Script {
    pages: HashMap<Url, FetchedPage>,
    fetched: Vec<Url>,
    logins: usize,
    acquired: usize,
    released: usize,
    failing_login: bool,
    unavailable: bool,
    delay: Duration,
}

/// Serves fixed pages and records every call
#[derive(Clone, Default)]
pub struct ScriptedFactory {
    script: Arc<Mutex<Script>>,
}

impl ScriptedFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(self, page: FetchedPage) -> Self {
        self.script
            .lock()
            .unwrap()
            .pages
            .insert(page.location.clone(), page);
        self
    }

    pub fn failing_login(self) -> Self {
        self.script.lock().unwrap().failing_login = true;
        self
    }

    pub fn unavailable(self) -> Self {
        self.script.lock().unwrap().unavailable = true;
        self
    }

    /// Makes every fetch take `delay`
    pub fn with_delay(self, delay: Duration) -> Self {
        self.script.lock().unwrap().delay = delay;
        self
    }

    pub fn fetched(&self) -> Vec<Url> {
        self.script.lock().unwrap().fetched.clone()
    }

    pub fn logins(&self) -> usize {
        self.script.lock().unwrap().logins
    }

    /// True once every acquired fetcher has been released
    pub fn released(&self) -> bool {
        let script = self.script.lock().unwrap();
        script.acquired > 0 && script.released == script.acquired
    }
}

#[async_trait]
impl FetcherFactory for ScriptedFactory {
    async fn acquire(&self) -> Result<Box<dyn PageFetcher>, FetchError> {
        let mut script = self.script.lock().unwrap();
        if script.unavailable {
            return Err(FetchError::Unavailable("scripted".to_string()));
        }
        script.acquired += 1;
        drop(script);
        Ok(Box::new(ScriptedFetcher {
            script: Arc::clone(&self.script),
        }))
    }
}

struct ScriptedFetcher {
    script: Arc<Mutex<Script>>,
}

#[async_trait]
impl PageFetcher for ScriptedFetcher {
    async fn fetch(&mut self, location: &Url) -> Result<FetchedPage, FetchError> {
        let delay = self.script.lock().unwrap().delay;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let mut script = self.script.lock().unwrap();
        script.fetched.push(location.clone());
        script
            .pages
            .get(location)
            .cloned()
            .ok_or_else(|| FetchError::Status {
                url: location.to_string(),
                status: 404,
            })
    }

    async fn login(&mut self, credentials: &Credentials) -> Result<(), LoginError> {
        let mut script = self.script.lock().unwrap();
        script.logins += 1;
        if script.failing_login {
            Err(LoginError::FieldNotFound(credentials.username_field.clone()))
        } else {
            Ok(())
        }
    }

    async fn release(&mut self) {
        self.script.lock().unwrap().released += 1;
    }
}
