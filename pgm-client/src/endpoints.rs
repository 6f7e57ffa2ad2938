//! Backend route templates and URL resolution.
//!
//! Templates use `:serverID`, `:containerID` and `:dbName` placeholders.
//! Values are pushed as percent-encoded path segments, so an identifier can
//! never introduce an extra segment. `.` and `..` are rejected: URL
//! normalisation would drop them and the request would reach another route.

use common::errors::{AppError, AppResult};
use reqwest::Url;

pub const HEALTH: &str = "/health";
pub const SERVERS: &str = "/api/v1/servers";
pub const SERVER_STATUS: &str = "/api/v1/servers/:serverID/status";
pub const CONTAINERS: &str = "/api/v1/servers/:serverID/containers";
pub const CONTAINER_DATABASES: &str = "/api/v1/servers/:serverID/containers/:containerID/databases";
pub const HOST_DATABASES: &str = "/api/v1/servers/:serverID/host/databases";
pub const CONTAINER_DUMP: &str =
    "/api/v1/servers/:serverID/containers/:containerID/databases/:dbName/dump";
pub const HOST_DUMP: &str = "/api/v1/servers/:serverID/host/databases/:dbName/dump";

/// Values substituted into a route template.
#[derive(Debug, Default, Clone, Copy)]
pub struct PathParams<'a> {
    pub server_id: Option<&'a str>,
    pub container_id: Option<&'a str>,
    pub db_name: Option<&'a str>,
}

impl<'a> PathParams<'a> {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn server(mut self, id: &'a str) -> Self {
        self.server_id = Some(id);
        self
    }

    pub fn container(mut self, id: &'a str) -> Self {
        self.container_id = Some(id);
        self
    }

    pub fn database(mut self, name: &'a str) -> Self {
        self.db_name = Some(name);
        self
    }

    fn lookup(&self, placeholder: &str) -> AppResult<&'a str> {
        let value = match placeholder {
            ":serverID" => self.server_id,
            ":containerID" => self.container_id,
            ":dbName" => self.db_name,
            other => {
                return Err(AppError::Validation(format!(
                    "unknown path placeholder {}",
                    other
                )))
            }
        };
        match value {
            Some("." | "..") => Err(AppError::Validation(format!(
                "path placeholder {} cannot be a dot segment",
                placeholder
            ))),
            Some(v) if !v.is_empty() => Ok(v),
            _ => Err(AppError::Validation(format!(
                "missing value for path placeholder {}",
                placeholder
            ))),
        }
    }
}

/// Resolves `template` against `base`, substituting placeholders.
pub fn resolve(base: &Url, template: &str, params: &PathParams<'_>) -> AppResult<Url> {
    let mut url = base.clone();
    {
        let mut segments = url
            .path_segments_mut()
            .map_err(|_| AppError::Config(format!("base URL cannot carry a path: {}", base)))?;
        segments.pop_if_empty();
        for segment in template.split('/').filter(|s| !s.is_empty()) {
            if segment.starts_with(':') {
                segments.push(params.lookup(segment)?);
            } else {
                segments.push(segment);
            }
        }
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("http://localhost:8080").unwrap()
    }

    #[test]
    fn test_resolve_container_dump() {
        let params = PathParams::none()
            .server("srv1")
            .container("pg1")
            .database("app_db");
        let url = resolve(&base(), CONTAINER_DUMP, &params).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8080/api/v1/servers/srv1/containers/pg1/databases/app_db/dump"
        );
    }

    #[test]
    fn test_resolve_keeps_base_path_prefix() {
        let base = Url::parse("http://gateway.local/pgm/").unwrap();
        let url = resolve(&base, SERVERS, &PathParams::none()).unwrap();
        assert_eq!(url.as_str(), "http://gateway.local/pgm/api/v1/servers");
    }

    #[test]
    fn test_identifiers_are_percent_encoded() {
        let params = PathParams::none().server("a/b").database("my db");
        let url = resolve(&base(), HOST_DUMP, &params).unwrap();
        assert_eq!(
            url.path(),
            "/api/v1/servers/a%2Fb/host/databases/my%20db/dump"
        );
    }

    #[test]
    fn test_dot_segments_are_rejected() {
        let err = resolve(&base(), HOST_DUMP, &PathParams::none().server("srv1").database(".."))
            .unwrap_err();
        assert_eq!(
            err,
            AppError::Validation("path placeholder :dbName cannot be a dot segment".into())
        );

        let params = PathParams::none().server(".").container("pg1");
        assert!(matches!(
            resolve(&base(), CONTAINER_DATABASES, &params),
            Err(AppError::Validation(_))
        ));
        let params = PathParams::none().server("srv1").container("..");
        assert!(resolve(&base(), CONTAINER_DATABASES, &params).is_err());

        let params = PathParams::none().server("srv1").database("...");
        let url = resolve(&base(), HOST_DUMP, &params).unwrap();
        assert_eq!(url.path(), "/api/v1/servers/srv1/host/databases/.../dump");
    }

    #[test]
    fn test_missing_placeholder_is_rejected() {
        let err = resolve(&base(), CONTAINERS, &PathParams::none()).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = resolve(&base(), CONTAINERS, &PathParams::none().server("")).unwrap_err();
        assert!(err.is_client_side());
    }
}
