//! End-to-end encoding of complete WFS documents

use pretty_assertions::assert_eq;
use wfs20::datatypes::SortOrder;
use wfs20::encode::{Encoder, EncoderConfig};
use wfs20::fes::{Filter, SortBy};
use wfs20::namespaces::QName;
use wfs20::wfs::{
    Delete, ExecutionStatus, GetFeature, GetPropertyValue, Query, RootElement, StoredQuery,
    Transaction, WfsDocument,
};
use wfs20::{Error, Validate};

const TOPP: &str = "http://www.openplans.org/topp";

const DECLS: &str = concat!(
    " xmlns:wfs=\"http://www.opengis.net/wfs/2.0\"",
    " xmlns:fes=\"http://www.opengis.net/fes/2.0\"",
    " xmlns:ows=\"http://www.opengis.net/ows/1.1\"",
    " xmlns:gml=\"http://www.opengis.net/gml/3.2\"",
    " xmlns:xlink=\"http://www.w3.org/1999/xlink\""
);

fn states() -> QName {
    QName::parse_lexical("topp:states").unwrap()
}

fn compact() -> Encoder {
    Encoder::with_config(EncoderConfig::new().with_indent(0).with_declaration(false))
}

#[test]
fn test_get_feature_document() {
    let mut request = GetFeature::new();
    request.presentation.count = Some(5);
    request.add_query(
        Query::new(states())
            .with_property(QName::parse_lexical("topp:STATE_NAME").unwrap())
            .with_filter(Filter::by_ids(["states.1"]))
            .with_sort_by(SortBy::single("STATE_NAME", SortOrder::Desc)),
    );
    request.validate().unwrap();

    let document = WfsDocument::new(request).with_prefix("topp", TOPP).unwrap();
    let xml = Encoder::new().encode_document(&document).unwrap();

    let expected = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<wfs:GetFeature{} xmlns:topp="{}" service="WFS" version="2.0.0" count="5">
  <wfs:Query typeNames="topp:states">
    <wfs:PropertyName>topp:STATE_NAME</wfs:PropertyName>
    <fes:Filter>
      <fes:ResourceId rid="states.1"/>
    </fes:Filter>
    <fes:SortBy>
      <fes:SortProperty>
        <fes:ValueReference>STATE_NAME</fes:ValueReference>
        <fes:SortOrder>DESC</fes:SortOrder>
      </fes:SortProperty>
    </fes:SortBy>
  </wfs:Query>
</wfs:GetFeature>
"#,
        DECLS, TOPP
    );
    assert_eq!(xml, expected);
}

#[test]
fn test_queries_keep_document_order() {
    let mut request = GetFeature::new();
    request.add_query(StoredQuery::new("urn:ogc:def:query:OGC-WFS::GetFeatureById").with_parameter("ID", "states.3"));
    request.add_query(Query::new(states()));
    request.add_query(StoredQuery::new("urn:example:Other"));

    let xml = compact()
        .encode_document(&WfsDocument::new(request).with_prefix("topp", TOPP).unwrap())
        .unwrap();

    let first = xml.find("GetFeatureById").unwrap();
    let query = xml.find("<wfs:Query ").unwrap();
    let last = xml.find("urn:example:Other").unwrap();
    assert!(first < query && query < last);
    assert!(xml.contains("<wfs:Parameter name=\"ID\">states.3</wfs:Parameter>"));
}

#[test]
fn test_transaction_with_predicate_filter() {
    let filter = Filter::from_xml(
        r#"<fes:Filter xmlns:fes="http://www.opengis.net/fes/2.0">
             <fes:PropertyIsEqualTo>
               <fes:ValueReference>STATE_NAME</fes:ValueReference>
               <fes:Literal>Ohio &amp; co</fes:Literal>
             </fes:PropertyIsEqualTo>
           </fes:Filter>"#,
    )
    .unwrap();

    let mut transaction = Transaction::new();
    transaction.base.handle = Some("cleanup".to_string());
    transaction.add(Delete::new(states(), filter));
    transaction.validate().unwrap();

    let document = WfsDocument::new(transaction).with_prefix("topp", TOPP).unwrap();
    let xml = compact().encode_document(&document).unwrap();

    assert_eq!(
        xml,
        format!(
            concat!(
                "<wfs:Transaction{} xmlns:topp=\"{}\" service=\"WFS\" version=\"2.0.0\" handle=\"cleanup\">",
                "<wfs:Delete typeName=\"topp:states\">",
                "<fes:Filter>",
                "<fes:PropertyIsEqualTo>",
                "<fes:ValueReference>STATE_NAME</fes:ValueReference>",
                "<fes:Literal>Ohio &amp; co</fes:Literal>",
                "</fes:PropertyIsEqualTo>",
                "</fes:Filter>",
                "</wfs:Delete>",
                "</wfs:Transaction>"
            ),
            DECLS, TOPP
        )
    );
}

#[test]
fn test_schema_location_declares_xsi() {
    let document = WfsDocument::new(RootElement::CreateStoredQueryResponse(ExecutionStatus::ok()))
        .with_wfs_schema_location();
    let xml = compact().encode_document(&document).unwrap();

    assert!(xml.starts_with("<wfs:CreateStoredQueryResponse"));
    assert!(xml.contains(" xmlns:xsi=\"http://www.w3.org/2001/XMLSchema-instance\""));
    assert!(xml.contains(
        " xsi:schemaLocation=\"http://www.opengis.net/wfs/2.0 http://schemas.opengis.net/wfs/2.0/wfs.xsd\""
    ));
    assert!(!xml.contains(" status="));
}

#[test]
fn test_type_names_follow_document_prefixes() {
    let mut request = GetFeature::new();
    request.add_query(Query::new(QName::namespaced(TOPP, "states")));

    let bound = WfsDocument::new(request.clone()).with_prefix("topp", TOPP).unwrap();
    let xml = compact().encode_document(&bound).unwrap();
    assert!(xml.contains("<wfs:Query typeNames=\"topp:states\"/>"));

    let unbound = WfsDocument::new(request);
    let xml = compact().encode_document(&unbound).unwrap();
    assert!(xml.contains(&format!(
        "<wfs:Query xmlns:ns1=\"{}\" typeNames=\"ns1:states\"/>",
        TOPP
    )));
}

#[test]
fn test_unbound_type_name_prefix_is_an_error() {
    let mut request = GetFeature::new();
    request.add_query(Query::new(states()));
    let err = compact()
        .encode_document(&WfsDocument::new(request))
        .unwrap_err();
    assert!(matches!(err, Error::Encode(_)));
}

#[test]
fn test_unresolved_query_is_skipped_but_invalid() {
    let mut request = GetPropertyValue::new("topp:PERSONS", Query::new(states()));
    request.query = Some(wfs20::model::Reference::unresolved("q1"));

    let xml = compact()
        .encode_document(&WfsDocument::new(request.clone()).with_prefix("topp", TOPP).unwrap())
        .unwrap();
    assert!(!xml.contains("<wfs:Query"));
    assert!(xml.contains("valueReference=\"topp:PERSONS\""));

    assert!(matches!(request.validate(), Err(Error::Validation(_))));
}

#[test]
fn test_json_dump_round_trips() {
    let mut request = GetFeature::new();
    request.add_query(Query::new(states()).with_filter(Filter::by_ids(["states.1", "states.2"])));
    let document = WfsDocument::new(request).with_prefix("topp", TOPP).unwrap();

    let json = serde_json::to_string(&document).unwrap();
    let back: WfsDocument = serde_json::from_str(&json).unwrap();
    assert_eq!(back, document);
    assert_eq!(
        Encoder::new().encode_document(&back).unwrap(),
        Encoder::new().encode_document(&document).unwrap()
    );
}
