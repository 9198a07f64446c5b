//! Generic conversion for handles no registered converter accepts

use crate::bridge::ForeignObject;
use crate::native::ObjectSummary;
use crate::result::{ConversionResult, NativeValue};
use tracing::debug;

/// Introspective snapshot of `handle`; never fails
pub fn convert_generic(handle: &dyn ForeignObject) -> ConversionResult {
    let summary = ObjectSummary::from_handle(handle);
    debug!(
        "Generic conversion of {} ({} attributes, {} methods)",
        summary.type_name,
        summary.attributes.len(),
        summary.methods.len()
    );
    let attribute_count = summary.attributes.len();
    let method_count = summary.methods.len();
    ConversionResult::success(NativeValue::Generic(summary), handle.type_name())
        .with_metadata("attribute_count", attribute_count)
        .with_metadata("method_count", method_count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::{ForeignValue, ScriptedObject};
    use crate::result::ResultKind;

    #[test]
    fn test_generic_lists_public_members() {
        let handle = ScriptedObject::new("Opaque")
            .attribute("size", ForeignValue::Int(3))
            .attribute("_hidden", ForeignValue::Int(1))
            .returning("run", ForeignValue::Null);

        let result = convert_generic(&handle);
        assert_eq!(result.kind(), ResultKind::Generic);
        let Some(NativeValue::Generic(summary)) = result.payload() else {
            panic!("expected summary");
        };
        assert_eq!(summary.attributes, vec!["size".to_string()]);
        assert_eq!(summary.methods, vec!["run".to_string()]);
        assert_eq!(result.metadata()["source_type"], "Opaque");
    }
}
