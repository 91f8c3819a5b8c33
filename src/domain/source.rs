//! Scrape sources known to the system.

use serde::{Deserialize, Serialize};

/// The three websites this service collects from.
///
/// The name returned by [`SourceKind::name`] is the natural key of the
/// `sources` table; persistence for every record set is scoped by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceKind {
    /// rbc.ru front-page news.
    Rbc,
    /// smart-lab.ru stock quote table.
    Smartlab,
    /// dohod.ru dividend table.
    Dohod,
}

impl SourceKind {
    /// Stable source name used as the persistence key.
    pub fn name(self) -> &'static str {
        match self {
            Self::Rbc => "RBC",
            Self::Smartlab => "SmartLab",
            Self::Dohod => "Dohod",
        }
    }

    pub fn all() -> [SourceKind; 3] {
        [Self::Rbc, Self::Smartlab, Self::Dohod]
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
