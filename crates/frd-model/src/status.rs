use serde::{Deserialize, Serialize};

/// Display grouping for the open-ended status labels.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum StatusTone {
    New,
    Pending,
    Reviewed,
    #[default]
    Other,
}

impl StatusTone {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusTone::New => "new",
            StatusTone::Pending => "pending",
            StatusTone::Reviewed => "reviewed",
            StatusTone::Other => "other",
        }
    }

    pub fn from_slug(value: &str) -> Self {
        let normalized = value.trim().to_ascii_uppercase();
        match normalized.as_str() {
            "NEW" => StatusTone::New,
            "PENDING" => StatusTone::Pending,
            "REVIEWED" | "COMPLETED" => StatusTone::Reviewed,
            _ => StatusTone::Other,
        }
    }
}

/// Active status filter. `All` lets every record through.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum StatusFilter {
    #[default]
    All,
    Label(String),
}

impl StatusFilter {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all") {
            StatusFilter::All
        } else {
            StatusFilter::Label(trimmed.to_string())
        }
    }

    pub fn accepts(&self, status: &str) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Label(label) => label.trim().to_lowercase() == status.trim().to_lowercase(),
        }
    }

    pub fn label(&self) -> String {
        match self {
            StatusFilter::All => "ALL".to_string(),
            StatusFilter::Label(label) => label.to_uppercase(),
        }
    }
}
