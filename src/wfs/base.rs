//! Shared WFS building blocks
//!
//! The request base type, the standard presentation and resolve parameter
//! groups, language-tagged titles, execution status and mixed content.

use crate::datatypes::{
    AnyUri, PositiveInteger, PositiveIntegerWithStar, ResolveValue, ResultType, GML32_FORMAT,
};
use crate::documents::AnyElement;
use crate::error::{Result, ValidationError};
use crate::model::{Describe, FeatureMap, Properties, Property, Unsettable, Validate};
use crate::namespaces::{Ns, QName};
use crate::wfs::tags;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Value of the fixed `service` attribute
pub const SERVICE: &str = "WFS";

/// Value of the fixed `version` attribute
pub const VERSION: &str = "2.0.0";

/// wfs:BaseRequestType
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseRequest {
    /// service attribute (required, fixed `WFS`)
    pub service: Unsettable<String>,
    /// version attribute (required, fixed `2.0.0`)
    pub version: Unsettable<String>,
    /// handle attribute
    pub handle: Option<String>,
    /// Endpoint the request is sent to; not encoded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<AnyUri>,
    /// Vendor parameters carried along with the request; not encoded
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub extended_properties: IndexMap<String, String>,
}

impl BaseRequest {
    /// Base with schema defaults
    pub fn new() -> Self {
        Self {
            service: Unsettable::new(SERVICE.to_string()),
            version: Unsettable::new(VERSION.to_string()),
            handle: None,
            base_url: None,
            extended_properties: IndexMap::new(),
        }
    }

    /// Base with a handle
    pub fn with_handle(handle: impl Into<String>) -> Self {
        Self {
            handle: Some(handle.into()),
            ..Self::new()
        }
    }

    /// Attribute properties shared by all requests
    pub fn properties(&self) -> Vec<Property<'_>> {
        Properties::new()
            .attr_required("service", &self.service)
            .attr_required("version", &self.version)
            .attr("handle", self.handle.as_ref())
            .build()
    }

    /// Check the fixed service and version values
    pub fn check(&self, type_name: &str) -> Result<()> {
        if self.service.get() != SERVICE {
            return Err(ValidationError::new(format!(
                "service must be '{}', found '{}'",
                SERVICE,
                self.service.get()
            ))
            .with_type_name(type_name)
            .with_path("service")
            .into());
        }
        if self.version.get() != VERSION {
            return Err(ValidationError::new(format!(
                "version must be '{}', found '{}'",
                VERSION,
                self.version.get()
            ))
            .with_type_name(type_name)
            .with_path("version")
            .into());
        }
        Ok(())
    }
}

impl Default for BaseRequest {
    fn default() -> Self {
        Self::new()
    }
}

/// wfs:StandardPresentationParameters attribute group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardPresentation {
    /// startIndex, default 0
    pub start_index: Unsettable<u64>,
    /// count
    pub count: Option<u64>,
    /// resultType, default `results`
    pub result_type: Unsettable<ResultType>,
    /// outputFormat, default GML 3.2
    pub output_format: Unsettable<String>,
}

impl StandardPresentation {
    /// Group with schema defaults
    pub fn new() -> Self {
        Self {
            start_index: Unsettable::new(0),
            count: None,
            result_type: Unsettable::new(ResultType::Results),
            output_format: Unsettable::new(GML32_FORMAT.to_string()),
        }
    }

    /// Attribute properties of the group
    pub fn properties(&self) -> Vec<Property<'_>> {
        Properties::new()
            .attr_unsettable("startIndex", &self.start_index)
            .attr("count", self.count.as_ref())
            .attr_unsettable("resultType", &self.result_type)
            .attr_unsettable("outputFormat", &self.output_format)
            .build()
    }
}

impl Default for StandardPresentation {
    fn default() -> Self {
        Self::new()
    }
}

/// wfs:StandardResolveParameters attribute group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardResolve {
    /// resolve, default `none`
    pub resolve: Unsettable<ResolveValue>,
    /// resolveDepth, default `*`
    pub resolve_depth: Unsettable<PositiveIntegerWithStar>,
    /// resolveTimeout in seconds, default 300
    pub resolve_timeout: Unsettable<PositiveInteger>,
}

impl StandardResolve {
    /// Group with schema defaults
    pub fn new() -> Self {
        Self {
            resolve: Unsettable::new(ResolveValue::None),
            resolve_depth: Unsettable::new(PositiveIntegerWithStar::Star),
            resolve_timeout: Unsettable::new(PositiveInteger::DEFAULT_TIMEOUT),
        }
    }

    /// Attribute properties of the group
    pub fn properties(&self) -> Vec<Property<'_>> {
        Properties::new()
            .attr_unsettable("resolve", &self.resolve)
            .attr_unsettable("resolveDepth", &self.resolve_depth)
            .attr_unsettable("resolveTimeout", &self.resolve_timeout)
            .build()
    }
}

impl Default for StandardResolve {
    fn default() -> Self {
        Self::new()
    }
}

macro_rules! language_string {
    ($(#[$meta:meta])* $name:ident, $type_name:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        pub struct $name {
            /// Text content
            pub value: String,
            /// xml:lang, default `en`
            pub lang: Unsettable<String>,
        }

        impl $name {
            /// Text in the default language
            pub fn new(value: impl Into<String>) -> Self {
                Self {
                    value: value.into(),
                    lang: Unsettable::new("en".to_string()),
                }
            }

            /// Text in an explicit language
            pub fn in_language(value: impl Into<String>, lang: impl Into<String>) -> Self {
                Self {
                    value: value.into(),
                    lang: Unsettable::with_value("en".to_string(), lang.into()),
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new(String::new())
            }
        }

        impl Describe for $name {
            fn type_name(&self) -> &'static str {
                $type_name
            }

            fn describe(&self) -> Vec<Property<'_>> {
                Properties::new()
                    .ns_attr_unsettable(Ns::Xml, "lang", &self.lang)
                    .text(&self.value)
                    .build()
            }
        }
    };
}

language_string!(
    /// wfs:Title
    Title, "TitleType"
);
language_string!(
    /// wfs:Abstract
    Abstract, "AbstractType"
);

/// wfs:ExecutionStatusType
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionStatus {
    /// status attribute, `OK` unless set
    pub status: Unsettable<String>,
}

impl ExecutionStatus {
    /// Successful status
    pub fn ok() -> Self {
        Self {
            status: Unsettable::new("OK".to_string()),
        }
    }
}

impl Default for ExecutionStatus {
    fn default() -> Self {
        Self::ok()
    }
}

impl Describe for ExecutionStatus {
    fn type_name(&self) -> &'static str {
        "ExecutionStatusType"
    }

    fn describe(&self) -> Vec<Property<'_>> {
        Properties::new()
            .attr_unsettable("status", &self.status)
            .build()
    }
}

impl Validate for ExecutionStatus {
    fn validate(&self) -> Result<()> {
        if self.status.get() != "OK" {
            return Err(ValidationError::new(format!(
                "status must be 'OK', found '{}'",
                self.status.get()
            ))
            .with_type_name("ExecutionStatusType")
            .with_path("status")
            .into());
        }
        Ok(())
    }
}

/// wfs:EmptyType
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Empty;

impl Describe for Empty {
    fn type_name(&self) -> &'static str {
        "EmptyType"
    }

    fn describe(&self) -> Vec<Property<'_>> {
        Vec::new()
    }
}

/// Member of mixed content: text or an element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MixedContent {
    /// Character data
    Text(String),
    /// Wildcard element
    Element(AnyElement),
}

impl MixedContent {
    /// Tag this member carries in a feature map
    pub fn tag(&self) -> QName {
        match self {
            MixedContent::Text(_) => tags::TEXT.clone(),
            MixedContent::Element(element) => element.qname.clone(),
        }
    }

    /// Append to a mixed feature map under its own tag
    pub fn push_into(self, map: &mut FeatureMap<MixedContent>) {
        map.push(self.tag(), self);
    }

    /// Properties of a whole mixed sequence, in order
    pub fn sequence_properties(map: &FeatureMap<MixedContent>) -> Vec<Property<'_>> {
        let mut properties = Properties::new();
        for entry in map {
            properties = match &entry.value {
                MixedContent::Text(text) => properties.text(text),
                MixedContent::Element(element) => properties.any(element),
            };
        }
        properties.build()
    }
}

impl From<AnyElement> for MixedContent {
    fn from(element: AnyElement) -> Self {
        MixedContent::Element(element)
    }
}

impl From<&str> for MixedContent {
    fn from(text: &str) -> Self {
        MixedContent::Text(text.to_string())
    }
}

impl Describe for MixedContent {
    fn type_name(&self) -> &'static str {
        "anyType"
    }

    fn describe(&self) -> Vec<Property<'_>> {
        match self {
            MixedContent::Text(text) => Properties::new().text(text).build(),
            MixedContent::Element(element) => Properties::new().any(element).build(),
        }
    }
}
