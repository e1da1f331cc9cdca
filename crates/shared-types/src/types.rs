use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

bitflags::bitflags! {
    /// Edit state of an element.
    ///
    /// The flags are independent of each other: an element can be highlighted
    /// and commented at once, and `REDACTED` / `DELETED` are separate markers
    /// even though both leave the element with empty text. Do not collapse
    /// this into a single-variant enum.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct ElementState: u8 {
        const REDACTED = 1 << 0;
        const HIGHLIGHTED = 1 << 1;
        const MODIFIED = 1 << 2;
        const COMMENTED = 1 << 3;
        const DELETED = 1 << 4;
    }
}

impl Default for ElementState {
    fn default() -> Self {
        Self::empty()
    }
}

impl ElementState {
    /// Flag names in declaration order, e.g. `["HIGHLIGHTED", "COMMENTED"]`
    pub fn names(&self) -> Vec<&'static str> {
        self.iter_names().map(|(name, _)| name).collect()
    }

    /// One-letter-per-flag rendering used in compact digests ("RH", "-" when clear)
    pub fn flag_string(&self) -> String {
        const LETTERS: [(ElementState, char); 5] = [
            (ElementState::REDACTED, 'R'),
            (ElementState::HIGHLIGHTED, 'H'),
            (ElementState::MODIFIED, 'M'),
            (ElementState::COMMENTED, 'C'),
            (ElementState::DELETED, 'D'),
        ];

        let flags: String = LETTERS
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, letter)| *letter)
            .collect();

        if flags.is_empty() {
            "-".to_string()
        } else {
            flags
        }
    }
}

/// Semantic category of an element's content
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum SemanticType {
    Ssn,
    Email,
    Phone,
    Url,
    Currency,
    Percentage,
    Date,
    Address,
    LegalParty,
    Name,
}

impl SemanticType {
    /// All categories in classification priority order
    pub const ALL: [SemanticType; 10] = [
        SemanticType::Ssn,
        SemanticType::Email,
        SemanticType::Phone,
        SemanticType::Url,
        SemanticType::Currency,
        SemanticType::Percentage,
        SemanticType::Date,
        SemanticType::Address,
        SemanticType::LegalParty,
        SemanticType::Name,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SemanticType::Ssn => "ssn",
            SemanticType::Email => "email",
            SemanticType::Phone => "phone",
            SemanticType::Url => "url",
            SemanticType::Currency => "currency",
            SemanticType::Percentage => "percentage",
            SemanticType::Date => "date",
            SemanticType::Address => "address",
            SemanticType::LegalParty => "legal_party",
            SemanticType::Name => "name",
        }
    }
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string names no known semantic category
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownSemanticType(pub String);

impl fmt::Display for UnknownSemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown semantic type: {}", self.0)
    }
}

impl std::error::Error for UnknownSemanticType {}

impl FromStr for SemanticType {
    type Err = UnknownSemanticType;

    /// Accepts the canonical names plus the spellings agents tend to produce
    /// ("phone_number", "legal-party", "person", ...)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "ssn" | "social_security_number" => Ok(SemanticType::Ssn),
            "email" | "email_address" => Ok(SemanticType::Email),
            "phone" | "phone_number" | "telephone" => Ok(SemanticType::Phone),
            "url" | "link" | "website" => Ok(SemanticType::Url),
            "currency" | "money" | "amount" => Ok(SemanticType::Currency),
            "percentage" | "percent" => Ok(SemanticType::Percentage),
            "date" => Ok(SemanticType::Date),
            "address" | "street_address" => Ok(SemanticType::Address),
            "legal_party" | "party" | "legal_party_reference" => Ok(SemanticType::LegalParty),
            "name" | "person" | "person_name" => Ok(SemanticType::Name),
            _ => Err(UnknownSemanticType(s.to_string())),
        }
    }
}

/// Page-relative rectangle, origin top-left
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Shift the box so that `(origin_x, origin_y)` becomes the new origin
    pub fn relative_to(&self, origin_x: f64, origin_y: f64) -> Self {
        Self {
            x: self.x - origin_x,
            y: self.y - origin_y,
            width: self.width,
            height: self.height,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

/// The atomic text-bearing unit of a document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub id: String, // e.g. "p3-el-12"
    pub text: String,
    /// Pre-edit text, captured on the first mutation and never overwritten
    pub original_text: Option<String>,
    pub page: u32, // 1-indexed
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub state: ElementState,
    pub semantic_type: Option<SemanticType>,
    pub entities: Option<Vec<String>>,
    pub comment: Option<Comment>,
}

impl Element {
    pub fn new(id: impl Into<String>, page: u32, text: impl Into<String>, bbox: BoundingBox) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            original_text: None,
            page,
            x: bbox.x,
            y: bbox.y,
            width: bbox.width,
            height: bbox.height,
            state: ElementState::empty(),
            semantic_type: None,
            entities: None,
            comment: None,
        }
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::new(self.x, self.y, self.width, self.height)
    }

    pub fn is_redacted(&self) -> bool {
        self.state.contains(ElementState::REDACTED)
    }

    pub fn is_highlighted(&self) -> bool {
        self.state.contains(ElementState::HIGHLIGHTED)
    }

    pub fn is_deleted(&self) -> bool {
        self.state.contains(ElementState::DELETED)
    }

    /// Deleted elements stay addressable but are never shown
    pub fn is_visible(&self) -> bool {
        !self.is_deleted()
    }

    pub fn flag_string(&self) -> String {
        self.state.flag_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub page_num: u32,
    pub width: f64,
    pub height: f64,
    pub element_count: usize, // derived, recomputed after build
}

/// Aggregate element counts; every element counts once per flag it carries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub total: usize,
    pub redacted: usize,
    pub highlighted: usize,
    pub modified: usize,
    pub commented: usize,
    pub deleted: usize,
}

impl Stats {
    /// Full recount over the given elements
    pub fn from_elements<'a>(elements: impl IntoIterator<Item = &'a Element>) -> Self {
        let mut stats = Stats::default();
        for element in elements {
            stats.total += 1;
            let state = element.state;
            if state.contains(ElementState::REDACTED) {
                stats.redacted += 1;
            }
            if state.contains(ElementState::HIGHLIGHTED) {
                stats.highlighted += 1;
            }
            if state.contains(ElementState::MODIFIED) {
                stats.modified += 1;
            }
            if state.contains(ElementState::COMMENTED) {
                stats.commented += 1;
            }
            if state.contains(ElementState::DELETED) {
                stats.deleted += 1;
            }
        }
        stats
    }
}
