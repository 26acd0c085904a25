//! Tests for PhyphoxGenerator against the bundled base template

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rstest::rstest;
use tempfile::TempDir;

use phyphox_mqtt::application::services::PhyphoxGenerator;
use phyphox_mqtt::application::ApplicationError;
use phyphox_mqtt::domain::{GeneratorParams, PHYPHOX_NAMESPACE};
use phyphox_mqtt::infrastructure::traits::RealFileSystem;
use phyphox_mqtt::util::testing;

fn base_template() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("templates/mqtt_connector_base.phyphox")
}

fn generator_for(path: impl Into<PathBuf>) -> PhyphoxGenerator {
    testing::init_test_setup();
    PhyphoxGenerator::new(Arc::new(RealFileSystem), path, PHYPHOX_NAMESPACE)
}

fn params(light: bool, pressure: bool) -> GeneratorParams {
    GeneratorParams {
        address: "test.mosquitto.org:1883".to_string(),
        topic: "zhaw/pcls/wehs/phyphox".to_string(),
        rate: 10,
        interval: 0.1,
        experiment_id: "011024-1530".to_string(),
        enable_light: light,
        enable_pressure: pressure,
    }
}

fn generate(params: &GeneratorParams) -> String {
    let bytes = generator_for(base_template())
        .generate(params)
        .expect("generate");
    String::from_utf8(bytes).expect("utf-8 output")
}

/// Text of every `child` below the element reached by `parent_path` from the root.
fn texts_at(doc: &roxmltree::Document, parent_path: &[&str], child: &str) -> Vec<String> {
    let mut parents = vec![doc.root_element()];
    for segment in parent_path {
        parents = parents
            .into_iter()
            .flat_map(|n| n.children().filter(move |c| c.has_tag_name(*segment)))
            .collect();
    }
    parents
        .into_iter()
        .flat_map(|p| p.children().filter(|c| c.has_tag_name(child)))
        .map(|n| n.text().unwrap_or_default().to_string())
        .collect()
}

fn write_template(dir: &TempDir, content: &str) -> PathBuf {
    let path = dir.path().join("base.phyphox");
    std::fs::write(&path, content).expect("write template");
    path
}

#[test]
fn given_identical_params_when_generating_twice_then_output_is_identical() {
    let p = params(true, true);
    assert_eq!(generate(&p), generate(&p));
}

#[rstest]
#[case(false, false)]
#[case(true, false)]
#[case(false, true)]
#[case(true, true)]
fn given_any_sensor_selection_when_generating_then_output_is_valid_phyphox(
    #[case] light: bool,
    #[case] pressure: bool,
) {
    let out = generate(&params(light, pressure));

    assert!(out.starts_with("<?xml"));
    let doc = roxmltree::Document::parse(&out).expect("well-formed output");
    let root = doc.root_element();
    assert_eq!(root.tag_name().name(), "phyphox");
    assert_eq!(root.tag_name().namespace(), Some(PHYPHOX_NAMESPACE));
    assert!(out.contains(r#"<phyphox xmlns="http://phyphox.org/xml""#));
}

#[test]
fn given_no_optional_sensors_when_generating_then_nothing_is_added() {
    let out = generate(&params(false, false));
    let doc = roxmltree::Document::parse(&out).unwrap();

    assert_eq!(texts_at(&doc, &["data-containers"], "container"), ["accX", "accY", "accZ"]);
    assert_eq!(texts_at(&doc, &["network", "connection"], "send"), ["accX", "accY", "accZ"]);
    assert!(!out.contains("Light"));
    assert!(!out.contains("Pressure"));
}

#[test]
fn given_light_when_generating_then_adds_one_block_sharing_identifier() {
    let out = generate(&params(true, false));
    let doc = roxmltree::Document::parse(&out).unwrap();

    let containers = texts_at(&doc, &["data-containers"], "container");
    assert_eq!(containers.iter().filter(|t| t.as_str() == "Light").count(), 1);

    let light_sensors: Vec<_> = doc
        .descendants()
        .filter(|n| n.has_tag_name("sensor") && n.attribute("type") == Some("light"))
        .collect();
    assert_eq!(light_sensors.len(), 1);
    let sensor = light_sensors[0];
    assert_eq!(sensor.attribute("average"), Some("false"));
    let output = sensor
        .children()
        .find(|c| c.has_tag_name("output"))
        .expect("output mapping");
    assert_eq!(output.attribute("component"), Some("x"));
    assert_eq!(output.text(), Some("Light"));

    let sends: Vec<_> = doc
        .descendants()
        .filter(|n| n.has_tag_name("send") && n.attribute("id") == Some("Light"))
        .collect();
    assert_eq!(sends.len(), 1);
    assert_eq!(sends[0].attribute("type"), Some("buffer"));
    assert_eq!(sends[0].attribute("datatype"), Some("number"));
    assert_eq!(sends[0].attribute("clear"), Some("false"));
    assert_eq!(sends[0].text(), Some("Light"));

    assert!(!out.contains("Pressure"));
}

#[test]
fn given_both_sensors_when_generating_then_light_is_inserted_before_pressure() {
    let out = generate(&params(true, true));
    let doc = roxmltree::Document::parse(&out).unwrap();

    assert_eq!(
        texts_at(&doc, &["data-containers"], "container"),
        ["accX", "accY", "accZ", "Light", "Pressure"]
    );
    assert_eq!(
        texts_at(&doc, &["network", "connection"], "send"),
        ["accX", "accY", "accZ", "Light", "Pressure"]
    );
    let types: Vec<_> = doc
        .descendants()
        .filter(|n| n.has_tag_name("sensor"))
        .filter_map(|n| n.attribute("type"))
        .collect();
    assert_eq!(types, ["accelerometer", "light", "pressure"]);
}

#[test]
fn given_rate_25_when_generating_then_every_sensor_uses_it() {
    let mut p = params(true, true);
    p.rate = 25;
    let out = generate(&p);
    let doc = roxmltree::Document::parse(&out).unwrap();

    let rates: Vec<_> = doc
        .descendants()
        .filter(|n| n.has_tag_name("sensor"))
        .map(|n| n.attribute("rate"))
        .collect();
    assert_eq!(rates, [Some("25"); 3]);
}

#[test]
fn given_params_when_generating_then_connection_and_title_are_set() {
    let out = generate(&params(false, false));
    let doc = roxmltree::Document::parse(&out).unwrap();

    let title = doc.descendants().find(|n| n.has_tag_name("title")).unwrap();
    assert_eq!(title.text(), Some("MQTT-Connect 011024-1530"));

    let connection = doc
        .descendants()
        .find(|n| n.has_tag_name("connection"))
        .unwrap();
    assert_eq!(connection.attribute("address"), Some("test.mosquitto.org:1883"));
    assert_eq!(connection.attribute("sendTopic"), Some("zhaw/pcls/wehs/phyphox"));
    assert_eq!(connection.attribute("interval"), Some("0.1"));
    // untouched attributes survive
    assert_eq!(connection.attribute("service"), Some("mqtt/json"));
}

#[test]
fn given_light_only_when_generating_then_label_matches_summary_line() {
    let out = generate(&params(true, false));
    let doc = roxmltree::Document::parse(&out).unwrap();

    let info = doc.descendants().find(|n| n.has_tag_name("info")).unwrap();
    assert_eq!(
        info.attribute("label"),
        Some("server=test.mosquitto.org:1883; topic=zhaw/pcls/wehs/phyphox; rate=10Hz; interval=0.1s; add_sensors=[Light]")
    );
    assert_eq!(info.text(), None, "literal info text should be cleared");
}

#[test]
fn given_prefixed_attribute_in_template_when_generating_then_it_survives() {
    let out = generate(&params(false, false));
    let doc = roxmltree::Document::parse(&out).unwrap();

    let version = doc
        .root_element()
        .attribute(("http://phyphox.org/editor/xml", "version"));
    assert_eq!(version, Some("1.0"));
}

#[test]
fn given_missing_template_when_generating_then_returns_error_with_path() {
    let temp = TempDir::new().unwrap();
    let missing = temp.path().join("nope.phyphox");

    let result = generator_for(&missing).generate(&params(true, false));

    let err = result.expect_err("no bytes for a missing template");
    assert!(matches!(err, ApplicationError::TemplateMissing(ref p) if p == &missing));
    assert!(err.to_string().contains(&missing.display().to_string()));
}

#[test]
fn given_malformed_template_when_generating_then_returns_transformation_error() {
    let temp = TempDir::new().unwrap();
    let path = write_template(&temp, r#"<phyphox xmlns="http://phyphox.org/xml"><title>"#);

    let err = generator_for(&path)
        .generate(&params(false, false))
        .expect_err("malformed XML");

    assert!(matches!(err, ApplicationError::Transformation { .. }));
    assert!(err.to_string().starts_with("transformation failed"));
}

#[test]
fn given_foreign_namespace_when_generating_then_returns_transformation_error() {
    let temp = TempDir::new().unwrap();
    let path = write_template(&temp, r#"<phyphox xmlns="urn:not-phyphox"><title/></phyphox>"#);

    let err = generator_for(&path)
        .generate(&params(false, false))
        .expect_err("wrong namespace");

    assert!(matches!(err, ApplicationError::Transformation { .. }));
    assert!(err.to_string().contains("urn:not-phyphox"));
}

#[test]
fn given_template_without_data_containers_when_adding_light_then_other_parts_still_inserted() {
    let temp = TempDir::new().unwrap();
    let path = write_template(
        &temp,
        r#"<phyphox xmlns="http://phyphox.org/xml">
  <input/>
  <network><connection address="" sendTopic="" interval="1.0"/></network>
</phyphox>"#,
    );

    let bytes = generator_for(&path)
        .generate(&params(true, false))
        .expect("generate");
    let out = String::from_utf8(bytes).unwrap();
    let doc = roxmltree::Document::parse(&out).unwrap();

    assert_eq!(doc.descendants().filter(|n| n.has_tag_name("container")).count(), 0);
    assert_eq!(doc.descendants().filter(|n| n.has_tag_name("sensor")).count(), 1);
    assert_eq!(doc.descendants().filter(|n| n.has_tag_name("send")).count(), 1);
}

#[test]
fn given_bare_template_when_generating_then_succeeds_unchanged_apart_from_declaration() {
    let temp = TempDir::new().unwrap();
    let path = write_template(&temp, r#"<phyphox xmlns="http://phyphox.org/xml"/>"#);

    let bytes = generator_for(&path)
        .generate(&params(true, true))
        .expect("generate");

    assert_eq!(
        String::from_utf8(bytes).unwrap(),
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<phyphox xmlns=\"http://phyphox.org/xml\"/>\n"
    );
}

#[test]
fn given_template_when_passthrough_then_returns_file_bytes() {
    let bytes = generator_for(base_template()).passthrough().unwrap();
    assert_eq!(bytes, std::fs::read(base_template()).unwrap());
}

#[test]
fn given_prefixed_phyphox_namespace_when_generating_then_edits_apply_and_output_is_unprefixed() {
    let temp = TempDir::new().unwrap();
    let path = write_template(
        &temp,
        r#"<p:phyphox xmlns:p="http://phyphox.org/xml">
  <p:title>x</p:title>
  <p:data-containers><p:container>accX</p:container></p:data-containers>
  <p:input><p:sensor type="accelerometer" rate="10"/></p:input>
  <p:views><p:view><p:info label="">text</p:info></p:view></p:views>
  <p:network><p:connection address="" sendTopic="" interval="1.0"/></p:network>
</p:phyphox>"#,
    );

    let bytes = generator_for(&path)
        .generate(&params(true, false))
        .expect("generate");
    let out = String::from_utf8(bytes).unwrap();
    let doc = roxmltree::Document::parse(&out).unwrap();

    assert!(out.contains(r#"<phyphox xmlns="http://phyphox.org/xml""#));
    assert!(!out.contains("<p:"));
    let title = doc.descendants().find(|n| n.has_tag_name("title")).unwrap();
    assert_eq!(title.text(), Some("MQTT-Connect 011024-1530"));
    assert_eq!(texts_at(&doc, &["data-containers"], "container"), ["accX", "Light"]);
    assert_eq!(texts_at(&doc, &["network", "connection"], "send"), ["Light"]);
    let info = doc.descendants().find(|n| n.has_tag_name("info")).unwrap();
    assert!(info.attribute("label").unwrap().ends_with("add_sensors=[Light]"));
    for node in doc.descendants().filter(|n| n.is_element()) {
        assert_eq!(node.tag_name().namespace(), Some(PHYPHOX_NAMESPACE));
    }
}
