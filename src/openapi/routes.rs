use regex::Regex;

use crate::errors::OpenApiError;
use crate::services::bulk::BULK_LISTS;

/// Operations that must not become generated tools. `pattern` matches the
/// OpenAPI path template, e.g. `/profiles/{profile_id}/denylist`.
#[derive(Debug, Clone)]
pub struct ExcludedRoute {
    methods: Vec<String>,
    pattern: Regex,
}

impl ExcludedRoute {
    pub fn new(methods: &[&str], pattern: &str) -> Result<Self, OpenApiError> {
        Ok(Self {
            methods: methods.iter().map(|m| m.to_ascii_uppercase()).collect(),
            pattern: Regex::new(pattern)?,
        })
    }

    pub fn matches(&self, method: &str, path: &str) -> bool {
        self.methods.iter().any(|m| m.eq_ignore_ascii_case(method)) && self.pattern.is_match(path)
    }
}

/// `PUT` on the array-bodied list endpoints, which the bulk tools own, plus
/// two endpoints the API cannot serve as plain request/response calls.
pub fn default_exclusions() -> Result<Vec<ExcludedRoute>, OpenApiError> {
    let mut routes = BULK_LISTS
        .iter()
        .map(|spec| ExcludedRoute::new(&["PUT"], &format!("^{}$", regex::escape(spec.endpoint))))
        .collect::<Result<Vec<_>, _>>()?;
    // Upstream answers 404.
    routes.push(ExcludedRoute::new(
        &["GET"],
        r"^/profiles/\{profile_id\}/analytics/domains;series$",
    )?);
    // Server-sent events.
    routes.push(ExcludedRoute::new(
        &["GET"],
        r"^/profiles/\{profile_id\}/logs/stream$",
    )?);
    Ok(routes)
}

pub fn is_excluded(routes: &[ExcludedRoute], method: &str, path: &str) -> bool {
    routes.iter().any(|route| route.matches(method, path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nine_routes_are_excluded() {
        let routes = default_exclusions().unwrap();
        assert_eq!(routes.len(), 9);
        assert!(is_excluded(&routes, "PUT", "/profiles/{profile_id}/denylist"));
        assert!(is_excluded(&routes, "put", "/profiles/{profile_id}/privacy/natives"));
        assert!(is_excluded(&routes, "GET", "/profiles/{profile_id}/logs/stream"));
        assert!(is_excluded(
            &routes,
            "GET",
            "/profiles/{profile_id}/analytics/domains;series"
        ));
    }

    #[test]
    fn other_methods_and_sub_paths_stay_included() {
        let routes = default_exclusions().unwrap();
        assert!(!is_excluded(&routes, "GET", "/profiles/{profile_id}/denylist"));
        assert!(!is_excluded(&routes, "POST", "/profiles/{profile_id}/denylist"));
        assert!(!is_excluded(
            &routes,
            "DELETE",
            "/profiles/{profile_id}/denylist/{entry_id}"
        ));
        assert!(!is_excluded(&routes, "GET", "/profiles/{profile_id}/analytics/domains"));
    }
}
