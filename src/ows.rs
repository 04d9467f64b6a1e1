//! OWS 1.1 common types
//!
//! The subset of OGC Web Services Common that WFS 2.0 records embed:
//! xlink attributes, keywords, WGS 84 bounding boxes, metadata links,
//! GetCapabilities negotiation lists and exception reports.

use crate::datatypes::{ActuateType, AnyUri, PositiveInteger, ShowType};
use crate::documents::AnyElement;
use crate::error::Result;
use crate::model::validate::{require, require_text, validate_all, Validate};
use crate::model::{ChildList, Describe, Occurs, Properties, Property, Unsettable};
use crate::namespaces::Ns;
use serde::{Deserialize, Serialize};

/// xlink:simpleAttrs attribute group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimpleLink {
    /// xlink:type, fixed to `simple`
    pub link_type: Unsettable<String>,
    /// xlink:href
    pub href: Option<AnyUri>,
    /// xlink:role
    pub role: Option<AnyUri>,
    /// xlink:arcrole
    pub arcrole: Option<AnyUri>,
    /// xlink:title
    pub title: Option<String>,
    /// xlink:show
    pub show: Option<ShowType>,
    /// xlink:actuate
    pub actuate: Option<ActuateType>,
}

impl SimpleLink {
    /// Empty link
    pub fn new() -> Self {
        Self {
            link_type: Unsettable::new("simple".to_string()),
            href: None,
            role: None,
            arcrole: None,
            title: None,
            show: None,
            actuate: None,
        }
    }

    /// Link to `href`
    pub fn to(href: impl Into<AnyUri>) -> Self {
        Self {
            href: Some(href.into()),
            ..Self::new()
        }
    }

    /// Attribute properties of the group
    pub fn properties(&self) -> Vec<Property<'_>> {
        Properties::new()
            .ns_attr_unsettable(Ns::Xlink, "type", &self.link_type)
            .ns_attr(Ns::Xlink, "href", self.href.as_ref())
            .ns_attr(Ns::Xlink, "role", self.role.as_ref())
            .ns_attr(Ns::Xlink, "arcrole", self.arcrole.as_ref())
            .ns_attr(Ns::Xlink, "title", self.title.as_ref())
            .ns_attr(Ns::Xlink, "show", self.show.as_ref())
            .ns_attr(Ns::Xlink, "actuate", self.actuate.as_ref())
            .build()
    }
}

impl Default for SimpleLink {
    fn default() -> Self {
        Self::new()
    }
}

/// ows:Keywords
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Keywords {
    /// ows:Keyword values
    pub keywords: Vec<String>,
    /// ows:Type code
    pub keyword_type: Option<String>,
}

impl Keywords {
    /// Keyword list without a type
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keywords: keywords.into_iter().map(Into::into).collect(),
            keyword_type: None,
        }
    }
}

impl Describe for Keywords {
    fn type_name(&self) -> &'static str {
        "KeywordsType"
    }

    fn describe(&self) -> Vec<Property<'_>> {
        Properties::new()
            .elements(Ns::Ows, "Keyword", &self.keywords)
            .element(Ns::Ows, "Type", self.keyword_type.as_ref())
            .build()
    }
}

impl Validate for Keywords {
    fn validate(&self) -> Result<()> {
        Occurs::one_or_more().check(self.keywords.len(), "KeywordsType", "Keyword")
    }
}

/// ows:WGS84BoundingBox
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Wgs84BoundingBox {
    /// Longitude and latitude of the lower corner
    pub lower_corner: Vec<f64>,
    /// Longitude and latitude of the upper corner
    pub upper_corner: Vec<f64>,
    /// crs attribute
    pub crs: Option<AnyUri>,
    /// dimensions attribute
    pub dimensions: Option<PositiveInteger>,
}

impl Wgs84BoundingBox {
    /// Box from longitude/latitude extremes
    pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Self {
        Self {
            lower_corner: vec![min_lon, min_lat],
            upper_corner: vec![max_lon, max_lat],
            crs: None,
            dimensions: None,
        }
    }
}

impl Describe for Wgs84BoundingBox {
    fn type_name(&self) -> &'static str {
        "WGS84BoundingBoxType"
    }

    fn describe(&self) -> Vec<Property<'_>> {
        Properties::new()
            .attr("crs", self.crs.as_ref())
            .attr("dimensions", self.dimensions.as_ref())
            .element(Ns::Ows, "LowerCorner", Some(&self.lower_corner))
            .element(Ns::Ows, "UpperCorner", Some(&self.upper_corner))
            .build()
    }
}

impl Validate for Wgs84BoundingBox {
    fn validate(&self) -> Result<()> {
        let bounds = Occurs::new(2, Some(2));
        bounds.check(self.lower_corner.len(), "WGS84BoundingBoxType", "LowerCorner")?;
        bounds.check(self.upper_corner.len(), "WGS84BoundingBoxType", "UpperCorner")
    }
}

/// ows:Metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    /// xlink attributes
    pub link: SimpleLink,
    /// about attribute
    pub about: Option<AnyUri>,
    /// Inline ows:AbstractMetaData content
    pub content: Option<AnyElement>,
}

impl Describe for Metadata {
    fn type_name(&self) -> &'static str {
        "MetadataType"
    }

    fn describe(&self) -> Vec<Property<'_>> {
        Properties::new()
            .extend(self.link.properties())
            .attr("about", self.about.as_ref())
            .any_opt(self.content.as_ref())
            .build()
    }
}

macro_rules! string_list {
    ($(#[$meta:meta])* $name:ident, $field:ident, $type_name:literal, $element:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
        pub struct $name {
            #[doc = concat!("ows:", $element, " values")]
            pub $field: Vec<String>,
        }

        impl $name {
            /// Create from values
            pub fn new<I, S>(values: I) -> Self
            where
                I: IntoIterator<Item = S>,
                S: Into<String>,
            {
                Self {
                    $field: values.into_iter().map(Into::into).collect(),
                }
            }
        }

        impl Describe for $name {
            fn type_name(&self) -> &'static str {
                $type_name
            }

            fn describe(&self) -> Vec<Property<'_>> {
                Properties::new()
                    .elements(Ns::Ows, $element, &self.$field)
                    .build()
            }
        }
    };
}

string_list!(
    /// ows:AcceptVersions
    AcceptVersions, versions, "AcceptVersionsType", "Version"
);
string_list!(
    /// ows:Sections
    Sections, sections, "SectionsType", "Section"
);
string_list!(
    /// ows:AcceptFormats
    AcceptFormats, output_formats, "AcceptFormatsType", "OutputFormat"
);
string_list!(
    /// ows:AcceptLanguages
    AcceptLanguages, languages, "AcceptLanguagesType", "Language"
);

/// ows:ExceptionReport
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExceptionReport {
    /// Report version (required)
    pub version: Option<String>,
    /// xml:lang
    pub lang: Option<String>,
    /// Reported exceptions
    pub exceptions: ChildList<OwsException>,
}

impl ExceptionReport {
    /// Report with a single exception
    pub fn single(exception: OwsException) -> Self {
        Self {
            version: Some("2.0.0".to_string()),
            lang: None,
            exceptions: ChildList::from(vec![exception]),
        }
    }
}

impl Describe for ExceptionReport {
    fn type_name(&self) -> &'static str {
        "ExceptionReport"
    }

    fn describe(&self) -> Vec<Property<'_>> {
        Properties::new()
            .attr("version", self.version.as_ref())
            .ns_attr(Ns::Xml, "lang", self.lang.as_ref())
            .children(Ns::Ows, "Exception", &self.exceptions)
            .build()
    }
}

impl Validate for ExceptionReport {
    fn validate(&self) -> Result<()> {
        require_text(self.version.as_ref(), "ExceptionReport", "version")?;
        Occurs::one_or_more().check(self.exceptions.len(), "ExceptionReport", "Exception")?;
        validate_all(&self.exceptions, "Exception")
    }
}

/// ows:Exception
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OwsException {
    /// exceptionCode attribute (required)
    pub exception_code: Option<String>,
    /// locator attribute
    pub locator: Option<String>,
    /// ows:ExceptionText values
    pub texts: Vec<String>,
}

impl OwsException {
    /// Exception with a code and one message
    pub fn new(code: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            exception_code: Some(code.into()),
            locator: None,
            texts: vec![text.into()],
        }
    }
}

impl Describe for OwsException {
    fn type_name(&self) -> &'static str {
        "ExceptionType"
    }

    fn describe(&self) -> Vec<Property<'_>> {
        Properties::new()
            .attr("exceptionCode", self.exception_code.as_ref())
            .attr("locator", self.locator.as_ref())
            .elements(Ns::Ows, "ExceptionText", &self.texts)
            .build()
    }
}

impl Validate for OwsException {
    fn validate(&self) -> Result<()> {
        require(self.exception_code.as_ref(), "ExceptionType", "exceptionCode")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::attribute_value;

    #[test]
    fn test_simple_link_omits_default_type() {
        let link = SimpleLink::to("http://example.com/wfs?request=GetCapabilities");
        let props = link.properties();
        assert_eq!(props.len(), 1);
        assert_eq!(props[0].name.prefixed(), "xlink:href");
    }

    #[test]
    fn test_bounding_box() {
        let bbox = Wgs84BoundingBox::new(-124.7, 24.9, -66.9, 49.3);
        assert!(bbox.validate().is_ok());

        let props = bbox.describe();
        assert_eq!(props[0].lexical(), Some("-124.7 24.9"));
        assert_eq!(props[1].name.prefixed(), "ows:UpperCorner");

        let broken = Wgs84BoundingBox {
            lower_corner: vec![1.0],
            ..bbox
        };
        assert!(broken.validate().is_err());
    }

    #[test]
    fn test_exception_report() {
        let report = ExceptionReport::single(OwsException::new(
            "InvalidParameterValue",
            "unknown type name topp:nope",
        ));
        assert!(report.validate().is_ok());
        assert_eq!(attribute_value(&report.describe(), "version"), Some("2.0.0"));

        let invalid = ExceptionReport::single(OwsException::default());
        let err = invalid.validate().unwrap_err();
        assert!(err.to_string().contains("Exception[0]/exceptionCode"));
    }

    #[test]
    fn test_keywords_require_one() {
        assert!(Keywords::default().validate().is_err());
        let keywords = Keywords::new(["roads", "transport"]);
        assert_eq!(keywords.describe().len(), 2);
    }
}
