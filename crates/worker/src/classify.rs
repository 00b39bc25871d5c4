//! Decides whether an intercepted request is an index (shell) request.

use url::Url;

use crate::settings::WorkerSettings;

/// The parts of a fetch event the classifier looks at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterceptedRequest {
    pub method: String,
    pub url: String,
    /// Raw `Accept` header, if the request carried one.
    pub accept: Option<String>,
}

impl InterceptedRequest {
    pub fn new(method: impl Into<String>, url: impl Into<String>, accept: Option<&str>) -> Self {
        Self { method: method.into(), url: url.into(), accept: accept.map(str::to_string) }
    }

    /// A browser navigation: `GET` with an HTML `Accept` header.
    pub fn navigation(url: impl Into<String>) -> Self {
        Self::new("GET", url, Some("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"))
    }
}

/// True iff the request should be answered with the cached shell.
///
/// Hosts deliver the method upper-cased, as fetch does.
///
/// All of the following must hold: the method is `GET`; the `Accept` header
/// is absent or mentions `text/html`; the URL is on the worker origin; the
/// include scope is empty or matches; the exclude scope does not match; and
/// in development builds the path is not the `/tests` runner.
pub fn is_index_request(request: &InterceptedRequest, settings: &WorkerSettings) -> bool {
    let Ok(url) = Url::parse(&request.url) else {
        return false;
    };

    let is_get = request.method == "GET";
    let accepts_html = request.accept.as_deref().is_none_or(|accept| accept.contains("text/html"));
    let is_local = url.origin() == settings.origin;
    let scope_included = settings.include_scope.is_empty() || settings.include_scope.matches_any(&request.url);
    let scope_excluded = settings.exclude_scope.matches_any(&request.url);
    let is_tests = settings.is_development && url.path() == "/tests";

    !is_tests && is_get && accepts_html && is_local && scope_included && !scope_excluded
}
