use serde::{Deserialize, Serialize};
use std::fmt;

/// Which kind of catalog service an instance talks to.
///
/// Both kinds expose the same v3 API surface; they differ in the item
/// endpoint name and the shape of the search command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceKind {
    Movies,
    Series,
}

impl ServiceKind {
    /// API endpoint that lists and updates items of this kind.
    pub fn item_endpoint(&self) -> &'static str {
        match self {
            ServiceKind::Movies => "movie",
            ServiceKind::Series => "series",
        }
    }

    /// Name of the search command accepted by `POST command`.
    pub fn search_command(&self) -> &'static str {
        match self {
            ServiceKind::Movies => "MoviesSearch",
            ServiceKind::Series => "SeriesSearch",
        }
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceKind::Movies => write!(f, "movies"),
            ServiceKind::Series => write!(f, "series"),
        }
    }
}
