//! Diagram languages recognized in fenced code blocks.

/// Supported diagram languages.
///
/// Mermaid is themed by the engine; the other languages are rendered as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagramLanguage {
    Mermaid,
    PlantUml,
    C4PlantUml,
    GraphViz,
    D2,
    Ditaa,
    BlockDiag,
    SeqDiag,
    Erd,
    Nomnoml,
    Svgbob,
    WaveDrom,
}

impl DiagramLanguage {
    /// Parse a language from a code fence info string.
    ///
    /// Accepts a `kroki-` prefix (`kroki-mermaid`) as well as the plain name.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let lang = s.strip_prefix("kroki-").unwrap_or(s);

        match lang {
            "mermaid" => Some(Self::Mermaid),
            "plantuml" | "puml" => Some(Self::PlantUml),
            "c4plantuml" => Some(Self::C4PlantUml),
            "graphviz" | "dot" => Some(Self::GraphViz),
            "d2" => Some(Self::D2),
            "ditaa" => Some(Self::Ditaa),
            "blockdiag" => Some(Self::BlockDiag),
            "seqdiag" => Some(Self::SeqDiag),
            "erd" => Some(Self::Erd),
            "nomnoml" => Some(Self::Nomnoml),
            "svgbob" => Some(Self::Svgbob),
            "wavedrom" => Some(Self::WaveDrom),
            _ => None,
        }
    }

    /// Kroki endpoint name for this diagram type.
    #[must_use]
    pub fn kroki_endpoint(self) -> &'static str {
        match self {
            Self::Mermaid => "mermaid",
            Self::PlantUml => "plantuml",
            Self::C4PlantUml => "c4plantuml",
            Self::GraphViz => "graphviz",
            Self::D2 => "d2",
            Self::Ditaa => "ditaa",
            Self::BlockDiag => "blockdiag",
            Self::SeqDiag => "seqdiag",
            Self::Erd => "erd",
            Self::Nomnoml => "nomnoml",
            Self::Svgbob => "svgbob",
            Self::WaveDrom => "wavedrom",
        }
    }

    /// Whether rendered output depends on the active theme.
    #[must_use]
    pub fn is_themed(self) -> bool {
        matches!(self, Self::Mermaid)
    }
}
