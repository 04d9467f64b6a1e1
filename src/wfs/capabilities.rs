//! GetCapabilities request and the WFS capabilities document

use crate::datatypes::{AnyUri, GML32_FORMAT};
use crate::documents::AnyElement;
use crate::error::{Result, ValidationError};
use crate::model::validate::{require, require_text, validate_all, validate_child, Validate};
use crate::model::{
    ChildList, ChildSlot, Describe, FeatureMap, Occurs, Properties, Property, Unsettable,
};
use crate::namespaces::{Ns, QName};
use crate::ows::{
    AcceptFormats, AcceptLanguages, AcceptVersions, Keywords, Metadata, Sections, SimpleLink,
    Wgs84BoundingBox,
};
use crate::wfs::base::{Abstract, MixedContent, Title, SERVICE, VERSION};
use crate::wfs::tags;
use serde::{Deserialize, Serialize};

/// wfs:GetCapabilities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GetCapabilities {
    /// ows:AcceptVersions
    pub accept_versions: ChildSlot<AcceptVersions>,
    /// ows:Sections
    pub sections: ChildSlot<Sections>,
    /// ows:AcceptFormats
    pub accept_formats: ChildSlot<AcceptFormats>,
    /// ows:AcceptLanguages
    pub accept_languages: ChildSlot<AcceptLanguages>,
    /// updateSequence attribute
    pub update_sequence: Option<String>,
    /// service attribute, default `WFS`
    pub service: Unsettable<String>,
}

impl GetCapabilities {
    /// Request with schema defaults
    pub fn new() -> Self {
        Self {
            accept_versions: ChildSlot::empty(),
            sections: ChildSlot::empty(),
            accept_formats: ChildSlot::empty(),
            accept_languages: ChildSlot::empty(),
            update_sequence: None,
            service: Unsettable::new(SERVICE.to_string()),
        }
    }
}

impl Default for GetCapabilities {
    fn default() -> Self {
        Self::new()
    }
}

impl Describe for GetCapabilities {
    fn type_name(&self) -> &'static str {
        "GetCapabilitiesType"
    }

    fn describe(&self) -> Vec<Property<'_>> {
        Properties::new()
            .attr_required("service", &self.service)
            .attr("updateSequence", self.update_sequence.as_ref())
            .child(Ns::Ows, "AcceptVersions", self.accept_versions.get())
            .child(Ns::Ows, "Sections", self.sections.get())
            .child(Ns::Ows, "AcceptFormats", self.accept_formats.get())
            .child(Ns::Ows, "AcceptLanguages", self.accept_languages.get())
            .build()
    }
}

impl Validate for GetCapabilities {
    fn validate(&self) -> Result<()> {
        if self.service.get() != SERVICE {
            return Err(ValidationError::new(format!(
                "service must be '{}', found '{}'",
                SERVICE,
                self.service.get()
            ))
            .with_type_name("GetCapabilitiesType")
            .with_path("service")
            .into());
        }
        Ok(())
    }
}

/// wfs:WFS_Capabilities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WfsCapabilities {
    /// version attribute (required)
    pub version: Unsettable<String>,
    /// updateSequence attribute
    pub update_sequence: Option<String>,
    /// ows:ServiceIdentification
    pub service_identification: Option<AnyElement>,
    /// ows:ServiceProvider
    pub service_provider: Option<AnyElement>,
    /// ows:OperationsMetadata
    pub operations_metadata: Option<AnyElement>,
    /// wfs:WSDL
    pub wsdl: ChildSlot<Wsdl>,
    /// wfs:FeatureTypeList
    pub feature_type_list: ChildSlot<FeatureTypeList>,
    /// fes:Filter_Capabilities
    pub filter_capabilities: Option<AnyElement>,
}

impl WfsCapabilities {
    /// Empty capabilities document
    pub fn new() -> Self {
        Self {
            version: Unsettable::new(VERSION.to_string()),
            update_sequence: None,
            service_identification: None,
            service_provider: None,
            operations_metadata: None,
            wsdl: ChildSlot::empty(),
            feature_type_list: ChildSlot::empty(),
            filter_capabilities: None,
        }
    }

    /// Advertised feature types
    pub fn feature_types(&self) -> impl Iterator<Item = &FeatureType> {
        self.feature_type_list
            .get()
            .into_iter()
            .flat_map(|list| list.feature_types.iter())
    }

    /// Find an advertised feature type by name
    pub fn feature_type(&self, name: &QName) -> Option<&FeatureType> {
        self.feature_types()
            .find(|ft| ft.name.as_ref().is_some_and(|n| n == name))
    }
}

impl Default for WfsCapabilities {
    fn default() -> Self {
        Self::new()
    }
}

impl Describe for WfsCapabilities {
    fn type_name(&self) -> &'static str {
        "WFS_CapabilitiesType"
    }

    fn describe(&self) -> Vec<Property<'_>> {
        Properties::new()
            .attr_required("version", &self.version)
            .attr("updateSequence", self.update_sequence.as_ref())
            .any_opt(self.service_identification.as_ref())
            .any_opt(self.service_provider.as_ref())
            .any_opt(self.operations_metadata.as_ref())
            .child(Ns::Wfs, "WSDL", self.wsdl.get())
            .child(Ns::Wfs, "FeatureTypeList", self.feature_type_list.get())
            .any_opt(self.filter_capabilities.as_ref())
            .build()
    }
}

impl Validate for WfsCapabilities {
    fn validate(&self) -> Result<()> {
        validate_child(self.wsdl.get(), "WSDL")?;
        validate_child(self.feature_type_list.get(), "FeatureTypeList")
    }
}

/// wfs:WSDL
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Wsdl {
    /// xlink attributes
    pub link: SimpleLink,
}

impl Describe for Wsdl {
    fn type_name(&self) -> &'static str {
        "WSDLType"
    }

    fn describe(&self) -> Vec<Property<'_>> {
        self.link.properties()
    }
}

impl Validate for Wsdl {
    fn validate(&self) -> Result<()> {
        require(self.link.href.as_ref(), "WSDLType", "href")
    }
}

/// wfs:FeatureTypeList
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureTypeList {
    /// wfs:FeatureType members
    pub feature_types: ChildList<FeatureType>,
}

impl Describe for FeatureTypeList {
    fn type_name(&self) -> &'static str {
        "FeatureTypeListType"
    }

    fn describe(&self) -> Vec<Property<'_>> {
        Properties::new()
            .children(Ns::Wfs, "FeatureType", &self.feature_types)
            .build()
    }
}

impl Validate for FeatureTypeList {
    fn validate(&self) -> Result<()> {
        Occurs::one_or_more().check(
            self.feature_types.len(),
            "FeatureTypeListType",
            "FeatureType",
        )?;
        validate_all(&self.feature_types, "FeatureType")
    }
}

/// wfs:FeatureType
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureType {
    /// wfs:Name (required)
    pub name: Option<QName>,
    /// wfs:Title
    pub titles: ChildList<Title>,
    /// wfs:Abstract
    pub abstracts: ChildList<Abstract>,
    /// ows:Keywords
    pub keywords: ChildList<Keywords>,
    /// wfs:DefaultCRS
    pub default_crs: Option<AnyUri>,
    /// wfs:OtherCRS
    pub other_crs: Vec<AnyUri>,
    /// wfs:NoCRS, exclusive with the CRS elements
    pub no_crs: ChildSlot<NoCrs>,
    /// wfs:OutputFormats
    pub output_formats: ChildSlot<OutputFormatList>,
    /// ows:WGS84BoundingBox
    pub wgs84_bounding_boxes: ChildList<Wgs84BoundingBox>,
    /// wfs:MetadataURL
    pub metadata_urls: ChildList<MetadataUrl>,
    /// wfs:ExtendedDescription
    pub extended_description: ChildSlot<ExtendedDescription>,
}

impl FeatureType {
    /// Feature type with a name
    pub fn new(name: QName) -> Self {
        Self {
            name: Some(name),
            ..Self::default()
        }
    }
}

impl Describe for FeatureType {
    fn type_name(&self) -> &'static str {
        "FeatureTypeType"
    }

    fn describe(&self) -> Vec<Property<'_>> {
        Properties::new()
            .element(Ns::Wfs, "Name", self.name.as_ref())
            .children(Ns::Wfs, "Title", &self.titles)
            .children(Ns::Wfs, "Abstract", &self.abstracts)
            .children(Ns::Ows, "Keywords", &self.keywords)
            .element(Ns::Wfs, "DefaultCRS", self.default_crs.as_ref())
            .elements(Ns::Wfs, "OtherCRS", &self.other_crs)
            .child(Ns::Wfs, "NoCRS", self.no_crs.get())
            .child(Ns::Wfs, "OutputFormats", self.output_formats.get())
            .children(Ns::Ows, "WGS84BoundingBox", &self.wgs84_bounding_boxes)
            .children(Ns::Wfs, "MetadataURL", &self.metadata_urls)
            .child(Ns::Wfs, "ExtendedDescription", self.extended_description.get())
            .build()
    }
}

impl Validate for FeatureType {
    fn validate(&self) -> Result<()> {
        require(self.name.as_ref(), "FeatureTypeType", "Name")?;
        if self.no_crs.is_some() && (self.default_crs.is_some() || !self.other_crs.is_empty()) {
            return Err(ValidationError::new("NoCRS excludes DefaultCRS and OtherCRS")
                .with_type_name("FeatureTypeType")
                .into());
        }
        if self.default_crs.is_none() && !self.other_crs.is_empty() {
            return require::<AnyUri>(None, "FeatureTypeType", "DefaultCRS");
        }
        validate_all(&self.keywords, "Keywords")?;
        validate_all(&self.wgs84_bounding_boxes, "WGS84BoundingBox")?;
        validate_child(self.output_formats.get(), "OutputFormats")?;
        validate_child(self.extended_description.get(), "ExtendedDescription")
    }
}

/// wfs:NoCRS
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoCrs;

impl Describe for NoCrs {
    fn type_name(&self) -> &'static str {
        "NoCRSType"
    }

    fn describe(&self) -> Vec<Property<'_>> {
        Vec::new()
    }
}

/// wfs:OutputFormats
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputFormatList {
    /// Choice group holding wfs:Format entries
    pub group: FeatureMap<String>,
}

impl OutputFormatList {
    /// List of formats
    pub fn new<I, S>(formats: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            group: formats
                .into_iter()
                .map(|f| (tags::FORMAT.clone(), f.into()))
                .collect(),
        }
    }

    /// List holding only the default GML 3.2 format
    pub fn gml32() -> Self {
        Self::new([GML32_FORMAT])
    }

    /// wfs:Format values
    pub fn formats(&self) -> Vec<&String> {
        self.group.list(&tags::FORMAT).to_vec()
    }

    /// Append a format
    pub fn add_format(&mut self, format: impl Into<String>) {
        self.group.list_mut(tags::FORMAT.clone()).push(format.into());
    }
}

impl Describe for OutputFormatList {
    fn type_name(&self) -> &'static str {
        "OutputFormatListType"
    }

    fn describe(&self) -> Vec<Property<'_>> {
        Properties::new()
            .elements(Ns::Wfs, "Format", self.group.list(&tags::FORMAT).iter())
            .build()
    }
}

impl Validate for OutputFormatList {
    fn validate(&self) -> Result<()> {
        Occurs::one_or_more().check(
            self.group.count(&tags::FORMAT),
            "OutputFormatListType",
            "Format",
        )
    }
}

/// wfs:MetadataURL
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetadataUrl {
    /// xlink attributes
    pub link: SimpleLink,
    /// about attribute
    pub about: Option<AnyUri>,
}

impl Describe for MetadataUrl {
    fn type_name(&self) -> &'static str {
        "MetadataURLType"
    }

    fn describe(&self) -> Vec<Property<'_>> {
        Properties::new()
            .extend(self.link.properties())
            .attr("about", self.about.as_ref())
            .build()
    }
}

/// wfs:ExtendedDescription
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtendedDescription {
    /// wfs:Element members
    pub elements: ChildList<DescriptionElement>,
}

impl Describe for ExtendedDescription {
    fn type_name(&self) -> &'static str {
        "ExtendedDescriptionType"
    }

    fn describe(&self) -> Vec<Property<'_>> {
        Properties::new()
            .children(Ns::Wfs, "Element", &self.elements)
            .build()
    }
}

impl Validate for ExtendedDescription {
    fn validate(&self) -> Result<()> {
        Occurs::one_or_more().check(self.elements.len(), "ExtendedDescriptionType", "Element")?;
        validate_all(&self.elements, "Element")
    }
}

/// wfs:Element of an extended description
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DescriptionElement {
    /// name attribute (required)
    pub name: Option<String>,
    /// type attribute (required)
    pub element_type: Option<QName>,
    /// ows:Metadata (required)
    pub metadata: ChildSlot<Metadata>,
    /// wfs:ValueList (required)
    pub value_list: ChildSlot<ValueList>,
}

impl Describe for DescriptionElement {
    fn type_name(&self) -> &'static str {
        "ElementType"
    }

    fn describe(&self) -> Vec<Property<'_>> {
        Properties::new()
            .attr("name", self.name.as_ref())
            .attr("type", self.element_type.as_ref())
            .child(Ns::Ows, "Metadata", self.metadata.get())
            .child(Ns::Wfs, "ValueList", self.value_list.get())
            .build()
    }
}

impl Validate for DescriptionElement {
    fn validate(&self) -> Result<()> {
        require_text(self.name.as_ref(), "ElementType", "name")?;
        require(self.element_type.as_ref(), "ElementType", "type")?;
        require(self.metadata.get(), "ElementType", "Metadata")?;
        require(self.value_list.get(), "ElementType", "ValueList")?;
        validate_child(self.value_list.get(), "ValueList")
    }
}

/// wfs:ValueList
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValueList {
    /// Choice group holding wfs:Value entries
    pub group: FeatureMap<MixedContent>,
}

impl ValueList {
    /// wfs:Value members
    pub fn values(&self) -> Vec<&MixedContent> {
        self.group.list(&tags::VALUE).to_vec()
    }

    /// Append a value
    pub fn add_value(&mut self, value: impl Into<MixedContent>) {
        self.group.list_mut(tags::VALUE.clone()).push(value.into());
    }
}

impl Describe for ValueList {
    fn type_name(&self) -> &'static str {
        "ValueListType"
    }

    fn describe(&self) -> Vec<Property<'_>> {
        let mut properties = Properties::new();
        for value in self.group.list(&tags::VALUE).iter() {
            properties = properties.tagged_child(&tags::VALUE, value);
        }
        properties.build()
    }
}

impl Validate for ValueList {
    fn validate(&self) -> Result<()> {
        Occurs::one_or_more().check(self.group.count(&tags::VALUE), "ValueListType", "Value")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn states() -> QName {
        QName::namespaced("http://www.openplans.org/topp", "states").with_prefix("topp")
    }

    #[test]
    fn test_feature_type_lookup() {
        let mut list = FeatureTypeList::default();
        let mut states_type = FeatureType::new(states());
        states_type.titles.push(Title::new("USA Population"));
        states_type.default_crs = Some(AnyUri::new("urn:ogc:def:crs:EPSG::4326"));
        list.feature_types.push(states_type);

        let mut caps = WfsCapabilities::new();
        caps.feature_type_list.set(list);

        let found = caps.feature_type(&states()).unwrap();
        assert_eq!(found.titles.first().unwrap().value, "USA Population");
        assert!(caps.validate().is_ok());
    }

    #[test]
    fn test_feature_type_crs_choice() {
        let mut ft = FeatureType::new(states());
        ft.no_crs.set(NoCrs);
        assert!(ft.validate().is_ok());

        ft.default_crs = Some(AnyUri::new("urn:ogc:def:crs:EPSG::4326"));
        assert!(ft.validate().is_err());

        let mut ft = FeatureType::new(states());
        ft.other_crs.push(AnyUri::new("urn:ogc:def:crs:EPSG::3857"));
        assert!(ft.validate().is_err());
    }

    #[test]
    fn test_output_formats_view() {
        let mut formats = OutputFormatList::gml32();
        formats.add_format("application/json");

        assert_eq!(formats.formats(), vec![GML32_FORMAT, "application/json"]);
        assert_eq!(formats.describe().len(), 2);
        assert!(formats.validate().is_ok());
        assert!(OutputFormatList::default().validate().is_err());
    }

    #[test]
    fn test_value_list() {
        let mut values = ValueList::default();
        values.add_value("residential");
        values.add_value("commercial");
        assert_eq!(values.values().len(), 2);

        let props = values.describe();
        assert_eq!(props[1].name, tags::VALUE.clone());
    }
}
