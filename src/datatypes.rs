//! WFS 2.0 simple types
//!
//! Every scalar that appears in a record converts to and from its XSD
//! lexical form through [`Lexical`]. This covers the XSD built-ins the WFS
//! schema uses (string, boolean, nonNegativeInteger, positiveInteger, anyURI,
//! QName, dateTime, list types) and the WFS enumerations and unions
//! (`AllSomeType`, `ResolveValueType`, `StateValueType`, ...).

use crate::error::{Error, Result};
use crate::namespaces::QName;
use chrono::{DateTime, FixedOffset, NaiveDateTime, SecondsFormat, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// Default output and input format of WFS 2.0 operations
pub const GML32_FORMAT: &str = "application/gml+xml; version=3.2";

/// Conversion between a value and its XSD lexical form
pub trait Lexical: Sized {
    /// Render the value in canonical lexical form
    fn to_lexical(&self) -> String;

    /// Parse a value from its lexical form
    fn from_lexical(lexical: &str) -> Result<Self>;

    /// QNames the lexical form is made of
    ///
    /// Their prefixes depend on the bindings in scope, so writers prefix
    /// them again instead of trusting [`Lexical::to_lexical`].
    fn qnames(&self) -> Option<Vec<QName>> {
        None
    }
}

impl Lexical for String {
    fn to_lexical(&self) -> String {
        self.clone()
    }

    fn from_lexical(lexical: &str) -> Result<Self> {
        Ok(lexical.to_string())
    }
}

impl Lexical for bool {
    fn to_lexical(&self) -> String {
        if *self { "true" } else { "false" }.to_string()
    }

    fn from_lexical(lexical: &str) -> Result<Self> {
        match lexical.trim() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            other => Err(Error::Value(format!("invalid boolean: '{}'", other))),
        }
    }
}

/// xs:nonNegativeInteger
impl Lexical for u64 {
    fn to_lexical(&self) -> String {
        self.to_string()
    }

    fn from_lexical(lexical: &str) -> Result<Self> {
        let trimmed = lexical.trim();
        trimmed
            .strip_prefix('+')
            .unwrap_or(trimmed)
            .parse::<u64>()
            .map_err(|e| Error::Value(format!("invalid nonNegativeInteger '{}': {}", trimmed, e)))
    }
}

impl Lexical for f64 {
    fn to_lexical(&self) -> String {
        if self.is_infinite() {
            if *self > 0.0 { "INF" } else { "-INF" }.to_string()
        } else if self.is_nan() {
            "NaN".to_string()
        } else {
            self.to_string()
        }
    }

    fn from_lexical(lexical: &str) -> Result<Self> {
        match lexical.trim() {
            "INF" => Ok(f64::INFINITY),
            "-INF" => Ok(f64::NEG_INFINITY),
            "NaN" => Ok(f64::NAN),
            other => other
                .parse::<f64>()
                .map_err(|e| Error::Value(format!("invalid double '{}': {}", other, e))),
        }
    }
}

/// xs:QName; the lexical form uses the prefix it was built with
impl Lexical for QName {
    fn to_lexical(&self) -> String {
        self.prefixed()
    }

    fn from_lexical(lexical: &str) -> Result<Self> {
        QName::parse_lexical(lexical)
    }

    fn qnames(&self) -> Option<Vec<QName>> {
        Some(vec![self.clone()])
    }
}

/// xs:dateTime
impl Lexical for DateTime<FixedOffset> {
    fn to_lexical(&self) -> String {
        self.to_rfc3339_opts(SecondsFormat::AutoSi, true)
    }

    fn from_lexical(lexical: &str) -> Result<Self> {
        let trimmed = lexical.trim();
        if let Ok(value) = DateTime::parse_from_rfc3339(trimmed) {
            return Ok(value);
        }
        // No timezone: interpret as UTC
        NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f")
            .map(|naive| naive.and_utc().fixed_offset())
            .map_err(|e| Error::Value(format!("invalid dateTime '{}': {}", trimmed, e)))
    }
}

/// XSD list types: whitespace separated items
impl<T: Lexical> Lexical for Vec<T> {
    fn to_lexical(&self) -> String {
        self.iter()
            .map(Lexical::to_lexical)
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn from_lexical(lexical: &str) -> Result<Self> {
        lexical.split_whitespace().map(T::from_lexical).collect()
    }

    fn qnames(&self) -> Option<Vec<QName>> {
        let items: Option<Vec<Vec<QName>>> = self.iter().map(Lexical::qnames).collect();
        items.map(|items| items.concat())
    }
}

/// Current time as an xs:dateTime value
pub fn now() -> DateTime<FixedOffset> {
    Utc::now().fixed_offset()
}

/// xs:positiveInteger
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct PositiveInteger(u64);

impl PositiveInteger {
    /// Default lock expiry and resolve timeout, in seconds
    pub const DEFAULT_TIMEOUT: PositiveInteger = PositiveInteger(300);

    /// Create a positive integer, rejecting zero
    pub fn new(value: u64) -> Result<Self> {
        if value == 0 {
            Err(Error::Value("positiveInteger must be greater than zero".to_string()))
        } else {
            Ok(Self(value))
        }
    }

    /// The wrapped value
    pub fn get(self) -> u64 {
        self.0
    }
}

impl TryFrom<u64> for PositiveInteger {
    type Error = Error;

    fn try_from(value: u64) -> Result<Self> {
        Self::new(value)
    }
}

impl From<PositiveInteger> for u64 {
    fn from(value: PositiveInteger) -> Self {
        value.0
    }
}

impl Lexical for PositiveInteger {
    fn to_lexical(&self) -> String {
        self.0.to_string()
    }

    fn from_lexical(lexical: &str) -> Result<Self> {
        Self::new(u64::from_lexical(lexical)?)
    }
}

impl fmt::Display for PositiveInteger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// xs:anyURI
///
/// The lexical space of anyURI admits relative references, so the value is
/// kept as text; [`AnyUri::to_url`] parses absolute forms.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnyUri(String);

impl AnyUri {
    /// Wrap a URI reference
    pub fn new(uri: impl Into<String>) -> Self {
        Self(uri.into().trim().to_string())
    }

    /// The URI text
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse as an absolute URL
    pub fn to_url(&self) -> Result<Url> {
        Ok(Url::parse(&self.0)?)
    }

    /// Resolve against a base URL
    pub fn resolve_against(&self, base: &Url) -> Result<Url> {
        Ok(base.join(&self.0)?)
    }

    /// Fragment identifier (`#id`), if any
    pub fn fragment(&self) -> Option<&str> {
        self.0
            .split_once('#')
            .map(|(_, fragment)| fragment)
            .filter(|fragment| !fragment.is_empty())
    }
}

impl From<&str> for AnyUri {
    fn from(uri: &str) -> Self {
        Self::new(uri)
    }
}

impl From<String> for AnyUri {
    fn from(uri: String) -> Self {
        Self::new(uri)
    }
}

impl Lexical for AnyUri {
    fn to_lexical(&self) -> String {
        self.0.clone()
    }

    fn from_lexical(lexical: &str) -> Result<Self> {
        let trimmed = lexical.trim();
        if trimmed.chars().any(char::is_whitespace) {
            return Err(Error::Value(format!("invalid anyURI: '{}'", trimmed)));
        }
        Ok(Self::new(trimmed))
    }
}

impl fmt::Display for AnyUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

macro_rules! lexical_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $lexical:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            /// Lexical form used in XML
            pub fn as_str(&self) -> &'static str {
                match self {
                    $( Self::$variant => $lexical ),+
                }
            }
        }

        impl Lexical for $name {
            fn to_lexical(&self) -> String {
                self.as_str().to_string()
            }

            fn from_lexical(lexical: &str) -> Result<Self> {
                match lexical.trim() {
                    $( $lexical => Ok(Self::$variant), )+
                    other => Err(Error::Value(format!(
                        "invalid {} value: '{}'",
                        stringify!($name),
                        other
                    ))),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

lexical_enum! {
    /// Lock scope: all requested features or as many as possible
    AllSome {
        /// Every feature must be locked
        All => "ALL",
        /// Lock what can be locked
        Some => "SOME",
    }
}

lexical_enum! {
    /// Which resource references a server resolves
    ResolveValue {
        /// Only references within the response document
        Local => "local",
        /// Only references to other documents
        Remote => "remote",
        /// Both local and remote references
        All => "all",
        /// No resolution
        None => "none",
    }
}

lexical_enum! {
    /// Whether a query returns features or only a count
    ResultType {
        /// Full result set
        Results => "results",
        /// Only numberMatched
        Hits => "hits",
    }
}

lexical_enum! {
    /// How an Update applies a property value
    UpdateAction {
        /// Replace the current value
        Replace => "replace",
        /// Insert before the referenced value
        InsertBefore => "insertBefore",
        /// Insert after the referenced value
        InsertAfter => "insertAfter",
        /// Remove the referenced value
        Remove => "remove",
    }
}

lexical_enum! {
    /// fes:SortOrderType
    SortOrder {
        /// Ascending
        Asc => "ASC",
        /// Descending
        Desc => "DESC",
    }
}

lexical_enum! {
    /// xlink:actuate
    ActuateType {
        /// Traverse on load
        OnLoad => "onLoad",
        /// Traverse on request
        OnRequest => "onRequest",
        /// Application defined
        Other => "other",
        /// Unspecified
        None => "none",
    }
}

lexical_enum! {
    /// xlink:show
    ShowType {
        /// New window
        New => "new",
        /// Replace the current resource
        Replace => "replace",
        /// Embed in place
        Embed => "embed",
        /// Application defined
        Other => "other",
        /// Unspecified
        None => "none",
    }
}

static OTHER_STATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^other:\w{2,}$").unwrap());

/// wfs:StateValueType: a known state or a vendor `other:xx` token
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StateValue {
    /// Current version
    Valid,
    /// Replaced by a newer version
    Superseded,
    /// No longer valid
    Retired,
    /// Becomes valid later
    Future,
    /// Vendor state matching `other:\w{2,}`
    Other(String),
}

impl Lexical for StateValue {
    fn to_lexical(&self) -> String {
        match self {
            StateValue::Valid => "valid".to_string(),
            StateValue::Superseded => "superseded".to_string(),
            StateValue::Retired => "retired".to_string(),
            StateValue::Future => "future".to_string(),
            StateValue::Other(value) => value.clone(),
        }
    }

    fn from_lexical(lexical: &str) -> Result<Self> {
        match lexical.trim() {
            "valid" => Ok(StateValue::Valid),
            "superseded" => Ok(StateValue::Superseded),
            "retired" => Ok(StateValue::Retired),
            "future" => Ok(StateValue::Future),
            other if OTHER_STATE.is_match(other) => Ok(StateValue::Other(other.to_string())),
            other => Err(Error::Value(format!("invalid StateValueType: '{}'", other))),
        }
    }
}

/// wfs:nonNegativeIntegerOrUnknown (numberMatched)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NonNegativeIntegerOrUnknown {
    /// Known count
    Count(u64),
    /// The server could not determine the count
    Unknown,
}

impl Lexical for NonNegativeIntegerOrUnknown {
    fn to_lexical(&self) -> String {
        match self {
            Self::Count(count) => count.to_string(),
            Self::Unknown => "unknown".to_string(),
        }
    }

    fn from_lexical(lexical: &str) -> Result<Self> {
        match lexical.trim() {
            "unknown" => Ok(Self::Unknown),
            other => u64::from_lexical(other).map(Self::Count),
        }
    }
}

/// wfs:positiveIntegerWithStar (resolveDepth)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PositiveIntegerWithStar {
    /// Bounded depth
    Depth(PositiveInteger),
    /// Unbounded (`*`)
    Star,
}

impl Default for PositiveIntegerWithStar {
    fn default() -> Self {
        Self::Star
    }
}

impl Lexical for PositiveIntegerWithStar {
    fn to_lexical(&self) -> String {
        match self {
            Self::Depth(depth) => depth.to_lexical(),
            Self::Star => "*".to_string(),
        }
    }

    fn from_lexical(lexical: &str) -> Result<Self> {
        match lexical.trim() {
            "*" => Ok(Self::Star),
            other => PositiveInteger::from_lexical(other).map(Self::Depth),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qname_lists_expose_their_names() {
        let names = vec![
            QName::parse_lexical("topp:states").unwrap(),
            QName::namespaced("http://www.openplans.org/topp", "roads"),
        ];
        assert_eq!(names.to_lexical(), "topp:states roads");
        assert_eq!(names.qnames(), Some(names.clone()));
        assert_eq!(vec!["a".to_string()].qnames(), None);
        assert_eq!(5u64.qnames(), None);
    }

    #[test]
    fn test_enum_lexical_forms() {
        assert_eq!(AllSome::from_lexical("SOME").unwrap(), AllSome::Some);
        assert_eq!(ResolveValue::None.to_lexical(), "none");
        assert_eq!(
            UpdateAction::from_lexical(" insertBefore ").unwrap(),
            UpdateAction::InsertBefore
        );
        assert_eq!(ResultType::Hits.to_string(), "hits");
        assert!(matches!(ResultType::from_lexical("HITS"), Err(Error::Value(_))));
    }

    #[test]
    fn test_state_value() {
        assert_eq!(StateValue::from_lexical("retired").unwrap(), StateValue::Retired);
        assert_eq!(
            StateValue::from_lexical("other:draft").unwrap(),
            StateValue::Other("other:draft".to_string())
        );
        assert!(StateValue::from_lexical("other:x").is_err());
        assert!(StateValue::from_lexical("draft").is_err());
    }

    #[test]
    fn test_union_types() {
        assert_eq!(
            NonNegativeIntegerOrUnknown::from_lexical("unknown").unwrap(),
            NonNegativeIntegerOrUnknown::Unknown
        );
        assert_eq!(
            NonNegativeIntegerOrUnknown::from_lexical("42").unwrap(),
            NonNegativeIntegerOrUnknown::Count(42)
        );
        assert_eq!(
            PositiveIntegerWithStar::from_lexical("*").unwrap(),
            PositiveIntegerWithStar::Star
        );
        assert!(PositiveIntegerWithStar::from_lexical("0").is_err());
        assert_eq!(
            PositiveIntegerWithStar::from_lexical("3").unwrap().to_lexical(),
            "3"
        );
    }

    #[test]
    fn test_positive_integer() {
        assert!(PositiveInteger::new(0).is_err());
        assert_eq!(PositiveInteger::DEFAULT_TIMEOUT.get(), 300);
        assert_eq!(PositiveInteger::from_lexical("+7").unwrap().get(), 7);
    }

    #[test]
    fn test_boolean() {
        assert!(bool::from_lexical("1").unwrap());
        assert!(!bool::from_lexical("false").unwrap());
        assert!(bool::from_lexical("yes").is_err());
    }

    #[test]
    fn test_qname_list() {
        let names = Vec::<QName>::from_lexical("topp:states  topp:roads").unwrap();
        assert_eq!(names.len(), 2);
        assert_eq!(names[1].prefixed(), "topp:roads");
        assert_eq!(names.to_lexical(), "topp:states topp:roads");
    }

    #[test]
    fn test_date_time() {
        let with_zone = DateTime::<FixedOffset>::from_lexical("2011-05-03T10:20:30+02:00").unwrap();
        assert_eq!(with_zone.to_lexical(), "2011-05-03T10:20:30+02:00");

        let utc = DateTime::<FixedOffset>::from_lexical("2011-05-03T10:20:30").unwrap();
        assert_eq!(utc.to_lexical(), "2011-05-03T10:20:30Z");

        assert!(DateTime::<FixedOffset>::from_lexical("yesterday").is_err());
    }

    #[test]
    fn test_any_uri() {
        let uri = AnyUri::from_lexical("http://example.com/wfs?service=WFS#q1").unwrap();
        assert_eq!(uri.fragment(), Some("q1"));
        assert_eq!(uri.to_url().unwrap().host_str(), Some("example.com"));

        let relative = AnyUri::new("queries.xml#byName");
        let base = Url::parse("http://example.com/store/").unwrap();
        assert_eq!(
            relative.resolve_against(&base).unwrap().as_str(),
            "http://example.com/store/queries.xml#byName"
        );

        assert!(AnyUri::from_lexical("not a uri").is_err());
    }
}
