//! Shared fixtures for the behavior suites: a scripted in-process HTTP client
//! and builders for a service wired to it.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use serde_json::Value;
use yieldline_core::{
    CacheBackend, DataFetcher, FetchConfig, FxRates, HttpClient, HttpError, HttpMethod,
    HttpRequest, HttpResponse, MapProperties, MemoryCache, Ticker, YieldService,
};

pub const EODHD_DIV: &str = "eodhd.com/api/div/";
pub const INCOME_STATEMENT: &str = "function=INCOME_STATEMENT";
pub const EARNINGS: &str = "function=EARNINGS";
pub const FX: &str = "api.exchangerate.host";

struct Route {
    needle: String,
    responses: VecDeque<Result<HttpResponse, HttpError>>,
}

/// Answers requests whose URL contains a registered needle.
///
/// Each needle owns a queue; the last queued answer repeats once the rest are
/// consumed. Unmatched URLs get a 404.
#[derive(Default)]
pub struct ScriptedHttpClient {
    routes: Mutex<Vec<Route>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, needle: &str, response: HttpResponse) -> Self {
        self.push(needle, Ok(response));
        self
    }

    pub fn respond_json(self, needle: &str, body: &Value) -> Self {
        self.respond(needle, HttpResponse::ok_json(body.to_string()))
    }

    pub fn respond_status(self, needle: &str, status: u16) -> Self {
        self.respond(needle, HttpResponse::new(status, ""))
    }

    pub fn fail(self, needle: &str, error: HttpError) -> Self {
        self.push(needle, Err(error));
        self
    }

    fn push(&self, needle: &str, answer: Result<HttpResponse, HttpError>) {
        let mut routes = self.routes.lock().expect("routes lock");
        match routes.iter_mut().find(|route| route.needle == needle) {
            Some(route) => route.responses.push_back(answer),
            None => routes.push(Route {
                needle: needle.to_owned(),
                responses: VecDeque::from([answer]),
            }),
        }
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().expect("requests lock").clone()
    }

    pub fn urls(&self) -> Vec<String> {
        self.requests().into_iter().map(|request| request.url).collect()
    }

    pub fn count(&self, needle: &str) -> usize {
        self.urls().iter().filter(|url| url.contains(needle)).count()
    }

    pub fn count_method(&self, method: HttpMethod) -> usize {
        self.requests()
            .iter()
            .filter(|request| request.method == method)
            .count()
    }
}

impl HttpClient for ScriptedHttpClient {
    fn execute<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
        Box::pin(async move {
            let answer = {
                let mut routes = self.routes.lock().expect("routes lock");
                routes
                    .iter_mut()
                    .find(|route| request.url.contains(&route.needle))
                    .and_then(|route| {
                        if route.responses.len() > 1 {
                            route.responses.pop_front()
                        } else {
                            route.responses.front().cloned()
                        }
                    })
            };

            self.requests.lock().expect("requests lock").push(request);
            answer.unwrap_or_else(|| Ok(HttpResponse::new(404, "")))
        })
    }
}

pub fn ticker(raw: &str) -> Ticker {
    Ticker::parse(raw).expect("valid ticker")
}

pub fn keys(values: &[&str]) -> String {
    serde_json::to_string(values).expect("serializable")
}

pub fn properties(eodhd: &[&str], alphavantage: &[&str]) -> Arc<MapProperties> {
    let mut properties = MapProperties::new();
    if !eodhd.is_empty() {
        properties = properties.with("EODHD_API_TOKEN", keys(eodhd));
    }
    if !alphavantage.is_empty() {
        properties = properties.with("ALPHA_VANTAGE_API_KEY", keys(alphavantage));
    }
    Arc::new(properties)
}

pub fn unthrottled() -> FetchConfig {
    FetchConfig {
        throttling: false,
        ..FetchConfig::default()
    }
}

pub fn fetcher(
    cache: Arc<dyn CacheBackend>,
    http: Arc<dyn HttpClient>,
    properties: Arc<MapProperties>,
) -> DataFetcher {
    DataFetcher::new(cache, http, properties).with_config(unthrottled())
}

/// Service over a fresh memory cache with one key per provider.
pub fn service(http: Arc<ScriptedHttpClient>) -> (YieldService, Arc<MemoryCache>) {
    service_over(http)
}

pub fn service_over(http: Arc<dyn HttpClient>) -> (YieldService, Arc<MemoryCache>) {
    let cache = Arc::new(MemoryCache::new());
    let fetcher = fetcher(
        cache.clone(),
        Arc::clone(&http),
        properties(&["eod-key"], &["av-key"]),
    );
    let fx = FxRates::new(cache.clone(), http);
    (YieldService::new(fetcher, fx), cache)
}
