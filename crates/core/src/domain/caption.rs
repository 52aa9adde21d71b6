use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Positive,
    Negative,
    Neutral,
    Highlight,
}

/// One rendered caption statement, tagged with the rule that produced it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptionBullet {
    pub rule_id: String,
    pub text: String,
    pub tone: Tone,
}

impl CaptionBullet {
    pub fn new(rule_id: impl Into<String>, text: impl Into<String>, tone: Tone) -> Self {
        Self { rule_id: rule_id.into(), text: text.into(), tone }
    }
}

/// Caption for the share, overlay, small-multiples and A/B compare charts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caption {
    pub title: Option<String>,
    pub lines: Vec<CaptionBullet>,
}

impl Caption {
    pub fn texts(&self) -> Vec<String> {
        self.title.iter().cloned().chain(self.lines.iter().map(|line| line.text.clone())).collect()
    }
}

/// Headline pair shown above the bubble chart bullets.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Headline {
    pub rising: Option<String>,
    pub established: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoSignalReason {
    /// No records were supplied.
    Empty,
    /// Every record normalized to zero base, current and delta.
    AllZero,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BubbleCaption {
    NoSignal {
        reason: NoSignalReason,
        message: String,
    },
    Insights {
        guide: String,
        headline: Option<Headline>,
        bullets: Vec<CaptionBullet>,
    },
}

impl BubbleCaption {
    pub fn bullets(&self) -> &[CaptionBullet] {
        match self {
            Self::NoSignal { .. } => &[],
            Self::Insights { bullets, .. } => bullets,
        }
    }

    pub fn is_no_signal(&self) -> bool {
        matches!(self, Self::NoSignal { .. })
    }

    /// Plain-text rendering, one statement per line.
    pub fn texts(&self) -> Vec<String> {
        match self {
            Self::NoSignal { message, .. } => vec![message.clone()],
            Self::Insights { guide, headline, bullets } => {
                let mut lines = vec![guide.clone()];
                if let Some(headline) = headline {
                    lines.push(format!(
                        "요즘 뜨는 브랜드: {} · 전통 강자: {}",
                        headline.rising.as_deref().unwrap_or("—"),
                        headline.established.as_deref().unwrap_or("—")
                    ));
                }
                lines.extend(bullets.iter().map(|bullet| format!("- {}", bullet.text)));
                lines
            }
        }
    }
}
