//! Tri-state health colour shared by per-core and overall verdicts.
//!
//! The variants are declared in severity order so the derived `Ord`
//! gives `Green < Yellow < Red`, and the worst of two verdicts is simply
//! their maximum.

/// Base path of the status icons served by the Xymon web UI.
const ICON_BASE_PATH: &str = "/xymon/gifs/static";

/// Health colour of a core or of a whole run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Verdict {
    #[default]
    Green,
    Yellow,
    Red,
}

impl Verdict {
    /// Colour name as understood by the monitoring server.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Green => "green",
            Self::Yellow => "yellow",
            Self::Red => "red",
        }
    }

    /// The more severe of the two verdicts.
    pub fn worst(self, other: Self) -> Self {
        self.max(other)
    }

    /// Inline HTML icon rendered next to each measured value in the report.
    pub fn icon_html(&self) -> String {
        let color = self.as_str();
        format!(
            r#"<img src="{ICON_BASE_PATH}/{color}.gif" alt="{color}" height="16" width="16" border="0">"#
        )
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
