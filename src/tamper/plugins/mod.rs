//! Built-in tamper plugins
//!
//! Grouped by category. Every plugin reads its settings once, when the
//! registry instantiates it, so bad configuration fails before any item
//! is processed.

mod date;
mod filter;
mod item;
mod list;
mod number;
mod text;

pub use date::StrToTime;
pub use filter::{KeywordFilter, Required};
pub use item::{ConvertBoolean, CopySource, DefaultValue, Rewrite};
pub use list::{Aggregate, Explode, Implode, Unique};
pub use number::Math;
pub use text::{
    AbsoluteUrl, ConvertCase, Encode, FindReplace, HtmlEntityDecode, HtmlEntityEncode, StrLen,
    Trim, WordCount,
};

use super::registry::TamperRegistry;
use super::types::{ItemUsage, Tamper, TamperDefinition, Tampered};
use crate::error::{Error, Result};
use crate::types::JsonValue;

/// Plugins that can be built from a JSON configuration map
pub(crate) trait FromConfig: Tamper + Sized + 'static {
    fn from_config(config: &JsonValue) -> Result<Self>;
}

fn add<T: FromConfig>(registry: &mut TamperRegistry, definition: TamperDefinition) {
    registry.insert(definition, |config| {
        Ok(Box::new(T::from_config(config)?) as Box<dyn Tamper>)
    });
}

/// Register every built-in plugin
pub(crate) fn register_builtins(registry: &mut TamperRegistry) {
    // List
    add::<Explode>(
        registry,
        TamperDefinition::new("explode", "Explode")
            .category("List")
            .description("Break up sequenced data into an array.")
            .item_usage(ItemUsage::Ignored),
    );
    add::<Implode>(
        registry,
        TamperDefinition::new("implode", "Implode")
            .category("List")
            .description("Join multiple values into a single string.")
            .handle_multiples()
            .item_usage(ItemUsage::Ignored),
    );
    add::<Aggregate>(
        registry,
        TamperDefinition::new("aggregate", "Aggregate")
            .category("List")
            .description("Compute a single number from a list of numbers.")
            .handle_multiples()
            .item_usage(ItemUsage::Ignored),
    );
    add::<Unique>(
        registry,
        TamperDefinition::new("unique", "Unique")
            .category("List")
            .description("Remove duplicate values from a list.")
            .handle_multiples()
            .item_usage(ItemUsage::Ignored),
    );

    // Text
    add::<Trim>(
        registry,
        TamperDefinition::new("trim", "Characters to trim")
            .category("Text")
            .description("Trim whitespace or characters from either side.")
            .item_usage(ItemUsage::Ignored),
    );
    add::<ConvertCase>(
        registry,
        TamperDefinition::new("convert_case", "Convert case")
            .category("Text")
            .item_usage(ItemUsage::Ignored),
    );
    add::<FindReplace>(
        registry,
        TamperDefinition::new("find_replace", "Find replace")
            .category("Text")
            .item_usage(ItemUsage::Ignored),
    );
    add::<HtmlEntityEncode>(
        registry,
        TamperDefinition::new("html_entity_encode", "HTML entity encode")
            .category("Text")
            .item_usage(ItemUsage::Ignored),
    );
    add::<HtmlEntityDecode>(
        registry,
        TamperDefinition::new("html_entity_decode", "HTML entity decode")
            .category("Text")
            .item_usage(ItemUsage::Ignored),
    );
    add::<StrLen>(
        registry,
        TamperDefinition::new("str_len", "Get string length")
            .category("Text")
            .item_usage(ItemUsage::Ignored),
    );
    add::<WordCount>(
        registry,
        TamperDefinition::new("word_count", "Count words")
            .category("Text")
            .item_usage(ItemUsage::Ignored),
    );
    add::<Encode>(
        registry,
        TamperDefinition::new("encode", "Encode/Decode")
            .category("Text")
            .description("Encode or decode a value with base64, JSON or YAML.")
            .handle_multiples()
            .item_usage(ItemUsage::Ignored),
    );
    add::<AbsoluteUrl>(
        registry,
        TamperDefinition::new("absolute_url", "Make URLs absolute")
            .category("Text")
            .item_usage(ItemUsage::Required),
    );

    // Filter
    add::<KeywordFilter>(
        registry,
        TamperDefinition::new("keyword_filter", "Keyword filter")
            .category("Filter")
            .description("Filter items based on keywords.")
            .handle_multiples()
            .item_usage(ItemUsage::Ignored),
    );
    add::<Required>(
        registry,
        TamperDefinition::new("required", "Required")
            .category("Filter")
            .description("Skip items that have an empty value for this source.")
            .handle_multiples()
            .item_usage(ItemUsage::Ignored),
    );

    // Number
    add::<Math>(
        registry,
        TamperDefinition::new("math", "Math")
            .category("Number")
            .item_usage(ItemUsage::Ignored),
    );

    // Date/time
    add::<StrToTime>(
        registry,
        TamperDefinition::new("strtotime", "String to Unix Timestamp")
            .category("Date/time")
            .item_usage(ItemUsage::Ignored),
    );

    // Other
    add::<DefaultValue>(
        registry,
        TamperDefinition::new("default_value", "Set default value")
            .handle_multiples()
            .item_usage(ItemUsage::Ignored),
    );
    add::<ConvertBoolean>(
        registry,
        TamperDefinition::new("convert_boolean", "Convert to boolean")
            .item_usage(ItemUsage::Ignored),
    );
    add::<CopySource>(
        registry,
        TamperDefinition::new("copy", "Copy source value")
            .handle_multiples()
            .item_usage(ItemUsage::Required),
    );
    add::<Rewrite>(
        registry,
        TamperDefinition::new("rewrite", "Rewrite")
            .description("Rewrite a value using tokens from other sources.")
            .handle_multiples()
            .item_usage(ItemUsage::Required),
    );
}

// ============================================================================
// Shared helpers
// ============================================================================

fn value(data: JsonValue) -> Result<Tampered> {
    Ok(Tampered::Value(data))
}

/// Borrow the input as a string or fail with the standard message
fn expect_str(data: &JsonValue) -> Result<&str> {
    data.as_str()
        .ok_or_else(|| Error::tamper("Input should be a string."))
}

/// Null and empty strings pass through string plugins untouched
fn is_blank(data: &JsonValue) -> bool {
    match data {
        JsonValue::Null => true,
        JsonValue::String(s) => s.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests;
