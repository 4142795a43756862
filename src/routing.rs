use crate::extract::RoutingKey;

/// A single routing table entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub name: Option<String>,
    pub pattern: String,
    pub destinations: Vec<String>,
}

impl Route {
    /// Destinations with blank entries dropped and duplicates removed,
    /// keeping first-seen order.
    pub fn destinations(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::with_capacity(self.destinations.len());
        for dest in &self.destinations {
            let dest = dest.trim();
            if !dest.is_empty() && !out.contains(&dest) {
                out.push(dest);
            }
        }
        out
    }

    fn matches(&self, key: &RoutingKey) -> bool {
        match key {
            RoutingKey::Url(url) => url.contains(self.pattern.as_str()),
            RoutingKey::SiteName(name) => name.starts_with(self.pattern.as_str()),
        }
    }
}

/// Static routing table. Lookup walks the routes in configuration order and
/// the first match wins.
#[derive(Debug, Clone)]
pub struct RoutingTable {
    routes: Vec<Route>,
}

impl RoutingTable {
    pub fn new(routes: Vec<Route>) -> Self {
        Self { routes }
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn resolve(&self, key: &RoutingKey) -> Option<&Route> {
        self.routes.iter().find(|route| route.matches(key))
    }
}
