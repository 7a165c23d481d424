//! HTML parser for pagination links and login forms
//!
//! This module handles parsing fetched HTML to find:
//! - The "next page" link, by visible label and by `rel` attribute
//! - The form holding the login fields, with its action and other inputs

use crate::crawler::fetcher::{Credentials, LoginError};
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Pagination links found on a page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveredLinks {
    /// Target of the first link whose visible text is exactly "Next"
    pub labeled_next: Option<Url>,

    /// Target of the first link carrying a `next` relation
    pub rel_next: Option<Url>,
}

/// Parses HTML content and extracts its pagination links
///
/// # Example
///
/// ```
/// use scrape_engine::crawler::discover_links;
/// use url::Url;
///
/// let html = r#"<html><body><a href="/page/2">Next</a></body></html>"#;
/// let base_url = Url::parse("https://example.com/page/1").unwrap();
/// let links = discover_links(html, &base_url);
/// assert_eq!(links.labeled_next.unwrap().as_str(), "https://example.com/page/2");
/// ```
pub fn discover_links(html: &str, base_url: &Url) -> DiscoveredLinks {
    let document = Html::parse_document(html);
    let mut links = DiscoveredLinks::default();

    let Ok(a_selector) = Selector::parse("a[href]") else {
        return links;
    };

    for element in document.select(&a_selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };

        if links.labeled_next.is_none() && element.text().collect::<String>().trim() == "Next" {
            links.labeled_next = resolve_link(href, base_url);
        }

        if links.rel_next.is_none() && has_next_relation(&element) {
            links.rel_next = resolve_link(href, base_url);
        }

        if links.labeled_next.is_some() && links.rel_next.is_some() {
            break;
        }
    }

    links
}

/// Returns true if the element's `rel` attribute lists `next`
fn has_next_relation(element: &ElementRef<'_>) -> bool {
    element
        .value()
        .attr("rel")
        .map(|rel| {
            rel.split_ascii_whitespace()
                .any(|token| token.eq_ignore_ascii_case("next"))
        })
        .unwrap_or(false)
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - fragment-only anchors
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    base_url
        .join(href)
        .ok()
        .filter(|url| url.scheme() == "http" || url.scheme() == "https")
}

/// How a form is submitted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMethod {
    Get,
    Post,
}

/// A login form located on a page
#[derive(Debug, Clone)]
pub struct LoginForm {
    /// Absolute submission target
    pub action: Url,

    pub method: FormMethod,

    /// Every named input of the form with its pre-filled value
    pub fields: Vec<(String, String)>,

    username_field: String,
    password_field: String,
}

impl LoginForm {
    pub fn is_get(&self) -> bool {
        self.method == FormMethod::Get
    }

    /// Returns the form fields with the credentials filled in
    pub fn fill(&self, credentials: &Credentials) -> Vec<(String, String)> {
        self.fields
            .iter()
            .map(|(name, value)| {
                if *name == self.username_field {
                    (name.clone(), credentials.username.clone())
                } else if *name == self.password_field {
                    (name.clone(), credentials.password.clone())
                } else {
                    (name.clone(), value.clone())
                }
            })
            .collect()
    }
}

/// Finds the form containing both login fields
///
/// The first `<form>` holding inputs named `username_field` and
/// `password_field` wins. If the fields exist outside any form, they are
/// submitted to the page itself. Other inputs of the form (hidden tokens and
/// the like) are carried along with their current values.
pub fn locate_login_form(
    html: &str,
    page_url: &Url,
    username_field: &str,
    password_field: &str,
) -> Result<LoginForm, LoginError> {
    let document = Html::parse_document(html);

    if let Ok(form_selector) = Selector::parse("form") {
        for form in document.select(&form_selector) {
            let fields = named_inputs(form);
            if !has_field(&fields, username_field) || !has_field(&fields, password_field) {
                continue;
            }

            let action = match form.value().attr("action").map(str::trim) {
                Some(action) if !action.is_empty() => page_url.join(action).map_err(|e| {
                    LoginError::Submit(format!("invalid form action '{}': {}", action, e))
                })?,
                _ => page_url.clone(),
            };

            let method = match form.value().attr("method") {
                Some(m) if m.trim().eq_ignore_ascii_case("get") => FormMethod::Get,
                _ => FormMethod::Post,
            };

            return Ok(LoginForm {
                action,
                method,
                fields,
                username_field: username_field.to_string(),
                password_field: password_field.to_string(),
            });
        }
    }

    let fields = named_inputs(document.root_element());
    for required in [username_field, password_field] {
        if !has_field(&fields, required) {
            return Err(LoginError::FieldNotFound(required.to_string()));
        }
    }

    Ok(LoginForm {
        action: page_url.clone(),
        method: FormMethod::Post,
        fields,
        username_field: username_field.to_string(),
        password_field: password_field.to_string(),
    })
}

/// Collects the named, submittable inputs under `root`
fn named_inputs(root: ElementRef<'_>) -> Vec<(String, String)> {
    let mut fields = Vec::new();

    let Ok(selector) = Selector::parse("input[name], textarea[name]") else {
        return fields;
    };

    for element in root.select(&selector) {
        let el = element.value();
        let Some(name) = el.attr("name") else {
            continue;
        };

        let kind = el.attr("type").unwrap_or("text").to_ascii_lowercase();
        match kind.as_str() {
            "submit" | "button" | "image" | "reset" | "file" => continue,
            "checkbox" | "radio" if el.attr("checked").is_none() => continue,
            _ => {}
        }

        let value = if el.name() == "textarea" {
            element.text().collect::<String>()
        } else {
            el.attr("value").unwrap_or("").to_string()
        };

        fields.push((name.to_string(), value));
    }

    fields
}

fn has_field(fields: &[(String, String)], name: &str) -> bool {
    fields.iter().any(|(field, _)| field == name)
}
