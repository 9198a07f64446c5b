//! Tests for ConverterRegistry
//!
//! Priority resolution, converter listing, custom entries, and the
//! payload-or-error shape every converter's result must have.

use foreign_display_core_rs::bridge::{ForeignObject, ForeignValue, ScriptedObject};
use foreign_display_core_rs::converters::{
    ChartConverter, ConverterInfo, GraphConverter, RasterConverter, TableConverter, CHART_PRIORITY, GRAPH_PRIORITY,
    RASTER_PRIORITY, TABLE_PRIORITY,
};
use foreign_display_core_rs::{
    convert_generic, ConversionError, ConversionResult, ConvertOptions, Converter, ConverterRegistry, DisplayConfig,
    DisplayDispatcher, FnConverter, NativeValue, ObjectSummary, ResultKind,
};
use serde_json::json;

// ============================================================================
// Test Helpers
// ============================================================================

fn table(rows: i64) -> ScriptedObject {
    ScriptedObject::new("ResultsTable")
        .returning("getRowCount", ForeignValue::Int(rows))
        .returning("getColumnCount", ForeignValue::Int(1))
        .returning("getColumnHeader", ForeignValue::Str("value".into()))
        .returning("get", ForeignValue::Float(0.5))
}

fn raster() -> ScriptedObject {
    ScriptedObject::new("ndarray")
        .attribute(
            "shape",
            ForeignValue::List(vec![ForeignValue::Int(2), ForeignValue::Int(2)]),
        )
        .attribute("dtype", ForeignValue::Str("uint8".into()))
        .attribute("ndim", ForeignValue::Int(2))
        .returning(
            "tolist",
            ForeignValue::List(vec![
                ForeignValue::List(vec![ForeignValue::Int(0), ForeignValue::Int(64)]),
                ForeignValue::List(vec![ForeignValue::Int(128), ForeignValue::Int(255)]),
            ]),
        )
}

fn graph() -> ScriptedObject {
    ScriptedObject::new("DefaultDirectedGraph")
        .returning("vertexSet", ForeignValue::List(vec![ForeignValue::Str("a".into())]))
        .returning("edgeSet", ForeignValue::List(Vec::new()))
        .returning("getEdgeSource", ForeignValue::Null)
        .returning("getEdgeTarget", ForeignValue::Null)
}

/// Converter that accepts everything and records its name in the metadata
fn tagging(name: &'static str) -> FnConverter {
    FnConverter::new(
        name,
        |_| true,
        move |handle, _, _| convert_generic(handle).with_metadata("converted_by", name),
    )
}

fn converted_by(registry: &ConverterRegistry, handle: &dyn ForeignObject) -> Option<String> {
    let converter = registry.find(handle)?;
    let result = converter.convert(handle, &ConvertOptions::default(), &DisplayConfig::default());
    result.metadata().get("converted_by")?.as_str().map(str::to_string)
}

fn info(name: &str, predicate: &str, converter: &str, priority: i32) -> ConverterInfo {
    ConverterInfo {
        name: name.to_string(),
        predicate_name: predicate.to_string(),
        converter_name: converter.to_string(),
        priority,
    }
}

// ============================================================================
// Lookup
// ============================================================================

#[test]
fn test_default_registry_routes_each_family() {
    let registry = ConverterRegistry::with_defaults();

    let names: Vec<Option<&str>> = [&table(1) as &dyn ForeignObject, &raster(), &graph(), &ScriptedObject::new("Roi")]
        .into_iter()
        .map(|handle| registry.find(handle).map(|c| c.name()))
        .collect();
    assert_eq!(names, vec![Some("table"), Some("raster"), Some("graph"), None]);
}

#[test]
fn test_highest_priority_wins() {
    let mut registry = ConverterRegistry::new();
    registry.register(Box::new(tagging("low")), 1);
    registry.register(Box::new(tagging("high")), 50);
    registry.register(Box::new(tagging("middle")), 10);

    assert_eq!(converted_by(&registry, &table(1)).as_deref(), Some("high"));
}

#[test]
fn test_equal_priority_keeps_first_registered() {
    let mut registry = ConverterRegistry::new();
    registry.register(Box::new(tagging("first")), 5);
    registry.register(Box::new(tagging("second")), 5);

    assert_eq!(converted_by(&registry, &table(1)).as_deref(), Some("first"));
}

#[test]
fn test_custom_converter_outranks_builtin() {
    let mut registry = ConverterRegistry::with_defaults();
    registry.register(
        Box::new(FnConverter::new(
            "results_table",
            |h| h.type_name() == "ResultsTable",
            |handle, _, _| convert_generic(handle).with_metadata("converted_by", "results_table"),
        )),
        TABLE_PRIORITY + 1,
    );

    assert_eq!(converted_by(&registry, &table(3)).as_deref(), Some("results_table"));
    assert_eq!(registry.find(&raster()).map(|c| c.name()), Some("raster"));
}

#[test]
fn test_empty_registry_finds_nothing() {
    let registry = ConverterRegistry::new();
    assert!(registry.is_empty());
    assert!(registry.find(&table(1)).is_none());
}

// ============================================================================
// Listing
// ============================================================================

#[test]
fn test_list_converters_reports_names_and_priorities() {
    let dispatcher = DisplayDispatcher::default();
    assert_eq!(
        dispatcher.list_converters(),
        vec![
            info("table", "is_table_like", "convert_table", TABLE_PRIORITY),
            info("chart", "is_chart_like", "convert_chart", CHART_PRIORITY),
            info("graph", "is_graph_like", "convert_graph", GRAPH_PRIORITY),
            info("raster", "is_raster_like", "convert_raster", RASTER_PRIORITY),
        ]
    );
}

#[test]
fn test_fn_converter_names() {
    let plain = tagging("roi");
    assert_eq!(plain.predicate_name(), "is_roi");
    assert_eq!(plain.converter_name(), "convert_roi");

    let renamed = tagging("roi").with_names("is_roi_like", "roi_to_summary");
    assert_eq!(renamed.name(), "roi");
    assert_eq!(renamed.predicate_name(), "is_roi_like");
    assert_eq!(renamed.converter_name(), "roi_to_summary");
}

#[test]
fn test_converter_info_serializes() {
    let listed = serde_json::to_value(ConverterRegistry::with_defaults().list()).expect("serializable");
    assert_eq!(listed[0]["name"], json!("table"));
    assert_eq!(listed[3]["converter_name"], json!("convert_raster"));
}

// ============================================================================
// Result Shape
// ============================================================================

fn assert_payload_xor_error(result: &ConversionResult) {
    assert!(result.is_well_formed(), "malformed result: {:?}", result);
    assert_ne!(result.payload().is_some(), result.error().is_some());
    assert!(!result.source_type().is_empty());
}

#[test]
fn test_every_converter_returns_payload_or_error() {
    let config = DisplayConfig::default();
    let options = ConvertOptions::default();
    let converters: Vec<Box<dyn Converter>> = vec![
        Box::new(TableConverter),
        Box::new(ChartConverter),
        Box::new(GraphConverter::new()),
        Box::new(RasterConverter),
    ];
    let handles = [
        table(2),
        table(2).failing("getRowCount", "disposed"),
        raster(),
        raster().attribute("ndim", ForeignValue::Int(3)),
        graph(),
        graph().failing("edgeSet", "disposed"),
        ScriptedObject::new("Plot")
            .returning("show", ForeignValue::Null)
            .returning("getFrame", ForeignValue::Null)
            .failing("save", "no writer"),
    ];

    for converter in &converters {
        for handle in &handles {
            if converter.accepts(handle) {
                assert_payload_xor_error(&converter.convert(handle, &options, &config));
            }
        }
    }
}

#[test]
fn test_raster_converted_with_metadata() {
    let result = RasterConverter.convert(&raster(), &ConvertOptions::default(), &DisplayConfig::default());
    assert_eq!(result.kind(), ResultKind::Raster);
    assert_eq!(result.metadata()["shape"], json!([2, 2]));
    assert_eq!(result.metadata()["dtype"], json!("uint8"));

    let Some(NativeValue::Raster(image)) = result.payload() else {
        panic!("expected raster payload, got {:?}", result.error());
    };
    assert_eq!(image.data(), &[0.0, 64.0, 128.0, 255.0]);
}

#[test]
fn test_raster_with_overflowing_shape_fails_structurally() {
    let huge = raster()
        .attribute(
            "shape",
            ForeignValue::List(vec![ForeignValue::Int(1 << 32), ForeignValue::Int(1 << 32)]),
        )
        .returning("tolist", ForeignValue::List(Vec::new()));
    let result = RasterConverter.convert(&huge, &ConvertOptions::default(), &DisplayConfig::default());

    assert_payload_xor_error(&result);
    assert!(!result.is_success());
    assert!(matches!(result.error(), Some(ConversionError::InvalidShape(_))));
}

#[test]
fn test_generic_conversion_summarizes_members() {
    let handle = ScriptedObject::new("Roi")
        .attribute("name", ForeignValue::Str("soma".into()))
        .returning("getBounds", ForeignValue::Null)
        .returning("_private", ForeignValue::Null);
    let result = convert_generic(&handle);
    assert_payload_xor_error(&result);
    assert_eq!(result.metadata()["attribute_count"], json!(1));

    let Some(NativeValue::Generic(ObjectSummary { methods, .. })) = result.payload() else {
        panic!("expected summary payload");
    };
    assert_eq!(methods, &vec!["getBounds".to_string()]);
}
