//! Route table and `Allow` header computation.
//!
//! # Responsibilities
//! - Record every registered (method, pattern, allow) triple in order
//! - Find the entry for a concrete request
//! - Compute the methods allowed at a concrete path
//!
//! # Design Decisions
//! - Append-only; disallowed routes are recorded, never omitted
//! - Linear scan per lookup (route counts are small)
//! - Generic over the handler stored next to each route

use std::fmt;

use axum::http::Method;

use super::matcher::{PathParams, PathPattern};

/// One registered endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub method: Method,
    pub path: String,
    pub allow: bool,
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<7} - {}", self.method.as_str(), self.path)
    }
}

#[derive(Debug, Clone)]
struct Entry<H> {
    route: Route,
    pattern: PathPattern,
    handler: H,
}

/// Outcome of looking a request up in a [`RouteTable`].
#[derive(Debug)]
pub enum Lookup<'a, H> {
    /// Nothing is registered at this path.
    NoMatch,
    /// The path matches, but not for this method.
    MethodNotRegistered,
    /// A route for this method and path exists.
    Found {
        route: &'a Route,
        handler: &'a H,
        params: PathParams,
    },
}

/// Ordered, append-only table of routes.
#[derive(Debug, Clone)]
pub struct RouteTable<H> {
    entries: Vec<Entry<H>>,
}

impl<H> Default for RouteTable<H> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<H> RouteTable<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a route. Duplicates are kept.
    pub fn add_route(&mut self, method: Method, path: impl Into<String>, allow: bool, handler: H) {
        let path = path.into();
        self.entries.push(Entry {
            pattern: PathPattern::parse(path.clone()),
            route: Route { method, path, allow },
            handler,
        });
    }

    pub fn routes(&self) -> impl Iterator<Item = &Route> {
        self.entries.iter().map(|entry| &entry.route)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First route registered for `method` whose pattern matches `path`.
    pub fn lookup(&self, method: &Method, path: &str) -> Lookup<'_, H> {
        let mut path_matched = false;
        for entry in &self.entries {
            let Some(params) = entry.pattern.matches(path) else {
                continue;
            };
            if entry.route.method == *method {
                return Lookup::Found {
                    route: &entry.route,
                    handler: &entry.handler,
                    params,
                };
            }
            path_matched = true;
        }

        if path_matched {
            Lookup::MethodNotRegistered
        } else {
            Lookup::NoMatch
        }
    }

    /// Methods of every allowed route matching `path`, in registration order.
    pub fn allowed_methods(&self, path: &str) -> Vec<Method> {
        let mut methods: Vec<Method> = Vec::new();
        for entry in &self.entries {
            if entry.route.allow
                && !methods.contains(&entry.route.method)
                && entry.pattern.matches(path).is_some()
            {
                methods.push(entry.route.method.clone());
            }
        }
        methods
    }

    /// `Allow` header value for `path`. Empty when nothing is allowed.
    pub fn allow_header(&self, path: &str) -> String {
        self.allowed_methods(path)
            .iter()
            .map(Method::as_str)
            .collect::<Vec<_>>()
            .join(",")
    }

    /// One line per route, in registration order.
    pub fn route_tree(&self) -> String {
        self.routes()
            .map(Route::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> RouteTable<&'static str> {
        let mut table = RouteTable::new();
        table.add_route(Method::OPTIONS, "/widgets", true, "options");
        table.add_route(Method::HEAD, "/widgets", true, "list");
        table.add_route(Method::GET, "/widgets", true, "list");
        table.add_route(Method::POST, "/widgets", false, "create");
        table.add_route(Method::OPTIONS, "/widgets/:id", true, "options");
        table.add_route(Method::HEAD, "/widgets/:id", true, "fetch");
        table.add_route(Method::GET, "/widgets/:id", true, "fetch");
        table.add_route(Method::PATCH, "/widgets/:id", true, "update");
        table.add_route(Method::DELETE, "/widgets/:id", false, "delete");
        table
    }

    #[test]
    fn test_allow_header_excludes_disallowed() {
        let table = table();
        assert_eq!(table.allow_header("/widgets"), "OPTIONS,HEAD,GET");
        assert_eq!(table.allow_header("/widgets/7"), "OPTIONS,HEAD,GET,PATCH");
        assert_eq!(table.allow_header("/gadgets"), "");
    }

    #[test]
    fn test_allowed_methods_is_idempotent() {
        let table = table();
        let first = table.allowed_methods("/widgets/7");
        let second = table.allowed_methods("/widgets/7");
        assert_eq!(first, second);
    }

    #[test]
    fn test_allowed_methods_collapses_duplicates() {
        let mut table = table();
        table.add_route(Method::GET, "/widgets", true, "again");
        assert_eq!(table.allow_header("/widgets"), "OPTIONS,HEAD,GET");
        assert_eq!(table.len(), 10);
    }

    #[test]
    fn test_lookup() {
        let table = table();

        match table.lookup(&Method::GET, "/widgets/7") {
            Lookup::Found {
                route,
                handler,
                params,
            } => {
                assert_eq!(route.path, "/widgets/:id");
                assert_eq!(*handler, "fetch");
                assert_eq!(params.id(), "7");
            }
            other => panic!("unexpected lookup: {other:?}"),
        }

        match table.lookup(&Method::POST, "/widgets") {
            Lookup::Found { route, .. } => assert!(!route.allow),
            other => panic!("unexpected lookup: {other:?}"),
        }

        assert!(matches!(
            table.lookup(&Method::PUT, "/widgets/7"),
            Lookup::MethodNotRegistered
        ));
        assert!(matches!(
            table.lookup(&Method::GET, "/widgets/7/parts"),
            Lookup::NoMatch
        ));
    }

    #[test]
    fn test_route_display() {
        let route = Route {
            method: Method::POST,
            path: "/bars/:id/testAction".into(),
            allow: true,
        };
        assert_eq!(route.to_string(), "POST    - /bars/:id/testAction");
    }

    #[test]
    fn test_route_tree_order() {
        let tree = table().route_tree();
        let lines: Vec<&str> = tree.lines().collect();
        assert_eq!(lines.len(), 9);
        assert_eq!(lines[0], "OPTIONS - /widgets");
        assert_eq!(lines[8], "DELETE  - /widgets/:id");
    }
}
