//! Design phase taxonomy (Howard et al., 2008)

use serde::{Deserialize, Serialize};

/// One stage of the six-stage design process.
///
/// Variants are declared in canonical order, so `Ord` follows the
/// process order and a `BTreeMap<DesignPhase, _>` iterates canonically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DesignPhase {
    #[serde(rename = "Establishing a need")]
    EstablishingNeed,
    #[serde(rename = "Analysis of task")]
    AnalysisOfTask,
    #[serde(rename = "Concept design")]
    ConceptDesign,
    #[serde(rename = "Embodiment design")]
    EmbodimentDesign,
    #[serde(rename = "Detail design")]
    DetailDesign,
    #[serde(rename = "Implementation")]
    Implementation,
}

impl DesignPhase {
    /// All phases in canonical order.
    pub const ALL: [DesignPhase; 6] = [
        DesignPhase::EstablishingNeed,
        DesignPhase::AnalysisOfTask,
        DesignPhase::ConceptDesign,
        DesignPhase::EmbodimentDesign,
        DesignPhase::DetailDesign,
        DesignPhase::Implementation,
    ];

    /// The human-readable label, as stored in records and shown in documents.
    pub fn label(&self) -> &'static str {
        match self {
            Self::EstablishingNeed => "Establishing a need",
            Self::AnalysisOfTask => "Analysis of task",
            Self::ConceptDesign => "Concept design",
            Self::EmbodimentDesign => "Embodiment design",
            Self::DetailDesign => "Detail design",
            Self::Implementation => "Implementation",
        }
    }

    /// Resolve a stored label. Matching ignores surrounding whitespace and
    /// ASCII case; anything else is unrecognized.
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::ALL
            .into_iter()
            .find(|phase| phase.label().eq_ignore_ascii_case(label))
    }
}

impl std::fmt::Display for DesignPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
