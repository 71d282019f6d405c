use serde::{Deserialize, Serialize};

/// Query options sent with every route request. Geometries are always requested as GeoJSON,
/// since the response schema reads them as coordinate arrays.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct RouteOptions {
    #[serde(default = "default_true")]
    pub alternatives: bool,
    #[serde(default)]
    pub steps: bool,
    #[serde(default)]
    pub overview: Overview,
    #[serde(default)]
    pub annotations: bool,
}

impl Default for RouteOptions {
    fn default() -> Self {
        Self {
            alternatives: true,
            steps: false,
            overview: Overview::default(),
            annotations: false,
        }
    }
}

impl RouteOptions {
    pub fn query_string(&self) -> String {
        format!(
            "alternatives={}&steps={}&geometries=geojson&overview={}&annotations={}",
            self.alternatives,
            self.steps,
            self.overview.as_str(),
            self.annotations
        )
    }
}

/// Geometry simplification level of the route overview
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Default)]
pub enum Overview {
    #[default]
    #[serde(rename = "simplified")]
    Simplified,
    #[serde(rename = "full")]
    Full,
    #[serde(rename = "false")]
    None,
}

impl Overview {
    pub fn as_str(&self) -> &'static str {
        match self {
            Overview::Simplified => "simplified",
            Overview::Full => "full",
            Overview::None => "false",
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct TableOptions {
    /// Also ask for the distance matrix next to the durations
    #[serde(default = "default_true")]
    pub distances: bool,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self { distances: true }
    }
}

impl TableOptions {
    pub fn query_string(&self) -> Option<&'static str> {
        if self.distances {
            Some("annotations=duration,distance")
        } else {
            None
        }
    }
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_query_string() {
        assert_eq!(
            RouteOptions::default().query_string(),
            "alternatives=true&steps=false&geometries=geojson&overview=simplified&annotations=false"
        );
    }

    #[test]
    fn test_table_query_string() {
        assert_eq!(TableOptions::default().query_string(), Some("annotations=duration,distance"));
        assert_eq!(TableOptions { distances: false }.query_string(), None);
    }
}
