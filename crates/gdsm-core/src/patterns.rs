//! Regex rules for semantic classification
//!
//! Every rule is a set of compiled `Regex` values. `Regex` keeps no match
//! cursor between calls, so the same rule table can be shared by every
//! classification without resetting anything.

use lazy_static::lazy_static;
use regex::Regex;
use shared_types::SemanticType;

/// Role nouns that identify a contracting party
const ROLE_NOUNS: &str = "Buyer|Seller|Lessor|Lessee|Landlord|Tenant|Licensor|Licensee|\
Employer|Employee|Contractor|Subcontractor|Client|Vendor|Supplier|Purchaser|Borrower|Lender|\
Guarantor|Company|Owner|Customer|Consultant|Disclosing Party|Receiving Party";

const MONTHS: &str = "Jan(?:uary)?|Feb(?:ruary)?|Mar(?:ch)?|Apr(?:il)?|May|June?|July?|\
Aug(?:ust)?|Sep(?:t(?:ember)?)?|Oct(?:ober)?|Nov(?:ember)?|Dec(?:ember)?";

/// Capitalized words that open headings and titles rather than personal names
const NON_NAME_WORDS: &[&str] = &[
    "The", "This", "That", "These", "Those", "Total", "Amount", "Due", "Balance",
    "United", "States", "Kingdom", "New", "North", "South", "East", "West", "Section",
    "Article", "Exhibit", "Schedule", "Page", "Invoice", "Payment", "Contact", "Date",
    "Signature", "Agreement", "Contract", "Lease", "Notice", "Terms", "Dear", "Street",
    "Avenue", "Road", "County", "City", "State", "Company", "Inc", "Corporation",
];

const HONORIFICS: &[&str] = &["Mr", "Mrs", "Ms", "Dr", "Prof"];

const STREET_SUFFIXES: &str = "Street|St|Avenue|Ave|Road|Rd|Boulevard|Blvd|Lane|Ln|Drive|Dr|\
Court|Ct|Way|Place|Pl|Parkway|Pkwy|Circle|Cir|Terrace|Highway|Hwy|Square|Sq";

/// One semantic category and the patterns that detect it
pub struct PatternRule {
    pub semantic_type: SemanticType,
    pub matchers: Vec<Regex>,
    /// Second check on each regex hit; the regex crate has no lookaround
    pub accept: fn(&str) -> bool,
}

impl PatternRule {
    pub fn is_match(&self, text: &str) -> bool {
        self.hits(text).next().is_some()
    }

    /// Every accepted substring, trimmed, in matcher then position order
    pub fn find_all<'t>(&self, text: &'t str) -> Vec<&'t str> {
        self.hits(text).collect()
    }

    fn hits<'r, 't>(&'r self, text: &'t str) -> impl Iterator<Item = &'t str> + 'r
    where
        't: 'r,
    {
        self.matchers
            .iter()
            .flat_map(move |re| re.find_iter(text))
            .map(|m| m.as_str().trim())
            .filter(move |s| !s.is_empty() && (self.accept)(s))
    }
}

fn any_hit(_: &str) -> bool {
    true
}

/// Honorifics always count; otherwise no word may be a heading word
fn plausible_name(candidate: &str) -> bool {
    let mut words = candidate.split_whitespace().peekable();
    if words
        .peek()
        .is_some_and(|w| HONORIFICS.contains(&w.trim_end_matches('.')))
    {
        return true;
    }
    words.all(|w| !NON_NAME_WORDS.contains(&w.trim_end_matches(['.', ','])))
}

lazy_static! {
    static ref SSN_PATTERN: Regex = Regex::new(r"\b\d{3}-\d{2}-\d{4}\b").unwrap();

    static ref EMAIL_PATTERN: Regex =
        Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").unwrap();

    static ref PHONE_PATTERN: Regex =
        Regex::new(r"(?:\+?1[-.\s]?)?(?:\(\d{3}\)\s?|\b\d{3}[-.\s])\d{3}[-.\s]\d{4}\b").unwrap();

    static ref URL_PATTERN: Regex =
        Regex::new(r#"(?i)\b(?:https?://|www\.)[^\s<>"']*[^\s<>"'.,;:!?)]"#).unwrap();

    static ref CURRENCY_SYMBOL_PATTERN: Regex =
        Regex::new(r"[$€£¥]\s?(?:\d{1,3}(?:,\d{3})+|\d+)(?:\.\d{1,2})?").unwrap();

    static ref CURRENCY_WORD_PATTERN: Regex = Regex::new(
        r"(?i)\b(?:\d{1,3}(?:,\d{3})+|\d+)(?:\.\d{1,2})?\s?(?:USD|EUR|GBP|dollars?|euros?|pounds?)\b"
    )
    .unwrap();

    static ref PERCENT_SIGN_PATTERN: Regex = Regex::new(r"\b\d+(?:\.\d+)?\s?%").unwrap();

    static ref PERCENT_WORD_PATTERN: Regex =
        Regex::new(r"(?i)\b\d+(?:\.\d+)?\s?(?:percent|per cent)\b").unwrap();

    static ref NUMERIC_DATE_PATTERN: Regex =
        Regex::new(r"\b\d{1,2}[/.-]\d{1,2}[/.-]\d{2,4}\b").unwrap();

    static ref ISO_DATE_PATTERN: Regex = Regex::new(r"\b\d{4}-\d{2}-\d{2}\b").unwrap();

    static ref MONTH_FIRST_DATE_PATTERN: Regex = Regex::new(&format!(
        r"(?i)\b(?:{MONTHS})\.?\s+\d{{1,2}}(?:st|nd|rd|th)?,?\s+\d{{4}}\b"
    ))
    .unwrap();

    static ref DAY_FIRST_DATE_PATTERN: Regex = Regex::new(&format!(
        r"(?i)\b\d{{1,2}}(?:st|nd|rd|th)?\s+(?:of\s+)?(?:{MONTHS})\.?,?\s+\d{{4}}\b"
    ))
    .unwrap();

    static ref STREET_ADDRESS_PATTERN: Regex = Regex::new(&format!(
        r"\b\d{{1,6}}\s+(?:[A-Z][A-Za-z]*\.?\s+){{1,4}}(?:{STREET_SUFFIXES})\b\.?"
    ))
    .unwrap();

    static ref PO_BOX_PATTERN: Regex = Regex::new(r"(?i)\bP\.?\s?O\.?\s+Box\s+\d+\b").unwrap();

    /// "Party A", "Party B"
    static ref PARTY_LETTER_PATTERN: Regex = Regex::new(r"\bParty\s+[A-Z]\b").unwrap();

    /// "the Buyer", "The Landlord"
    static ref ROLE_NOUN_PATTERN: Regex =
        Regex::new(&format!(r"\b[Tt]he\s+(?:{ROLE_NOUNS})s?\b")).unwrap();

    /// `Acme Holdings LLC ("Seller")`
    static ref NAMED_ROLE_PATTERN: Regex = Regex::new(&format!(
        r#"\b[A-Z][A-Za-z0-9&.,'-]*(?:\s+[A-Z][A-Za-z0-9&.,'-]*)*\s+\(\s*(?:the\s+)?["“]?(?:{ROLE_NOUNS}|Party|Parties)["”]?\s*\)"#
    ))
    .unwrap();

    static ref PERSON_NAME_PATTERN: Regex = Regex::new(
        r"\b(?:(?:Mr|Mrs|Ms|Dr|Prof)\.?\s+)?[A-Z][a-z]+(?:\s+[A-Z]\.)?\s+[A-Z][a-z]+(?:-[A-Z][a-z]+)?\b"
    )
    .unwrap();

    /// Classification rules in priority order: the first rule that matches
    /// decides an element's primary type.
    pub static ref RULES: Vec<PatternRule> = vec![
        PatternRule {
            semantic_type: SemanticType::Ssn,
            matchers: vec![SSN_PATTERN.clone()],
            accept: any_hit,
        },
        PatternRule {
            semantic_type: SemanticType::Email,
            matchers: vec![EMAIL_PATTERN.clone()],
            accept: any_hit,
        },
        PatternRule {
            semantic_type: SemanticType::Phone,
            matchers: vec![PHONE_PATTERN.clone()],
            accept: any_hit,
        },
        PatternRule {
            semantic_type: SemanticType::Url,
            matchers: vec![URL_PATTERN.clone()],
            accept: any_hit,
        },
        PatternRule {
            semantic_type: SemanticType::Currency,
            matchers: vec![CURRENCY_SYMBOL_PATTERN.clone(), CURRENCY_WORD_PATTERN.clone()],
            accept: any_hit,
        },
        PatternRule {
            semantic_type: SemanticType::Percentage,
            matchers: vec![PERCENT_SIGN_PATTERN.clone(), PERCENT_WORD_PATTERN.clone()],
            accept: any_hit,
        },
        PatternRule {
            semantic_type: SemanticType::Date,
            matchers: vec![
                ISO_DATE_PATTERN.clone(),
                NUMERIC_DATE_PATTERN.clone(),
                MONTH_FIRST_DATE_PATTERN.clone(),
                DAY_FIRST_DATE_PATTERN.clone(),
            ],
            accept: any_hit,
        },
        PatternRule {
            semantic_type: SemanticType::Address,
            matchers: vec![STREET_ADDRESS_PATTERN.clone(), PO_BOX_PATTERN.clone()],
            accept: any_hit,
        },
        PatternRule {
            semantic_type: SemanticType::LegalParty,
            matchers: vec![
                PARTY_LETTER_PATTERN.clone(),
                ROLE_NOUN_PATTERN.clone(),
                NAMED_ROLE_PATTERN.clone(),
            ],
            accept: any_hit,
        },
        PatternRule {
            semantic_type: SemanticType::Name,
            matchers: vec![PERSON_NAME_PATTERN.clone()],
            accept: plausible_name,
        },
    ];
}
