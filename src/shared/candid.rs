//! Candid text parsing for `dfx canister call` output.
//!
//! The shop canister answers `getShop` with a textual Candid value such as
//!
//! ```text
//! (
//!   record {
//!     owned = vec {};
//!     available = vec {
//!       record { id = 1 : nat; name = "Blade"; price = 10 : nat; };
//!     };
//!   },
//! )
//! ```
//!
//! Only the `available` vector is read. The wrapper is matched greedily up to
//! the last closing brace while each `record { ... }` is matched lazily, so a
//! string value containing braces can still confuse the reader.

use once_cell::sync::Lazy;
use regex::Regex;
use std::any::Any;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, error};

static AVAILABLE_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)available\s*=\s*vec\s*\{(.*)\};?").expect("available block pattern")
});

static RECORD_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)record\s*\{(.*?)\};?").expect("record block pattern"));

static FIELD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(\w+)\s*=\s*(?:"(.*?)"|(\d[\d_]*)\s*:\s*\w+)"#).expect("field pattern")
});

pub const SHOP_HEADER: &str = "🏪 **Shop:**";
pub const NO_ITEMS_MESSAGE: &str = "No skins are available.";
pub const NOTHING_FOR_SALE_MESSAGE: &str = "No skins are currently for sale.";

const MISSING_NAME: &str = "N/A";
const MISSING_DESCRIPTION: &str = "no description";
const MISSING_PRICE: &str = "N/A";

/// One `record { ... }` entry. Numeric values keep their digits only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    fields: HashMap<String, String>,
}

impl Record {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }
}

#[cfg(test)]
impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Shop inventory in order of appearance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Catalog {
    /// No `available = vec { ... }` wrapper in the text.
    MissingWrapper,
    /// Wrapper present but holding no records.
    Empty,
    Listed(Vec<Record>),
}

impl Catalog {
    pub fn records(&self) -> &[Record] {
        match self {
            Catalog::Listed(records) => records.as_slice(),
            Catalog::MissingWrapper | Catalog::Empty => &[],
        }
    }
}

/// Extract the key/value pairs of a single record body. Fields that are
/// neither quoted text nor annotated numbers are skipped.
pub fn parse_record(body: &str) -> Record {
    let mut fields = HashMap::new();
    for caps in FIELD.captures_iter(body) {
        let key = caps[1].to_string();
        let value = match (caps.get(2), caps.get(3)) {
            (Some(text), _) => text.as_str().to_string(),
            (None, Some(number)) => number.as_str().replace('_', ""),
            (None, None) => continue,
        };
        fields.insert(key, value);
    }
    Record { fields }
}

pub fn parse_catalog(raw: &str) -> Catalog {
    let Some(block) = AVAILABLE_BLOCK.captures(raw).and_then(|caps| caps.get(1)) else {
        debug!("no `available` vector in canister output");
        return Catalog::MissingWrapper;
    };

    let content = block.as_str();
    if content.trim().is_empty() {
        return Catalog::Empty;
    }

    let records: Vec<Record> = RECORD_BLOCK
        .captures_iter(content)
        .filter_map(|caps| caps.get(1))
        .map(|body| parse_record(body.as_str()))
        .collect();

    debug!(count = records.len(), "parsed shop records");
    if records.is_empty() {
        Catalog::Empty
    } else {
        Catalog::Listed(records)
    }
}

pub fn render_catalog(catalog: &Catalog) -> String {
    let records = match catalog {
        Catalog::MissingWrapper => return format!("{SHOP_HEADER}\n{NO_ITEMS_MESSAGE}"),
        Catalog::Empty => return format!("{SHOP_HEADER}\n{NOTHING_FOR_SALE_MESSAGE}"),
        Catalog::Listed(records) => records,
    };

    let mut text = String::from("🏪 **Skins available at HQ4L**\n\n");
    for (index, skin) in records.iter().enumerate() {
        text.push_str(&format!(
            "**{}. {}**\n",
            index + 1,
            skin.get("name").unwrap_or(MISSING_NAME)
        ));
        text.push_str(&format!(
            "Description: *{}*\n",
            skin.get("description").unwrap_or(MISSING_DESCRIPTION)
        ));
        if let Some(url) = skin.get("image_url").filter(|url| !url.is_empty()) {
            text.push_str(&format!("[View image]({url})\n"));
        }
        text.push_str(&format!(
            "Price: **{}** coins\n\n",
            skin.get("price").unwrap_or(MISSING_PRICE)
        ));
    }
    text
}

/// Parse and render `raw`, falling back to a raw dump if anything goes wrong.
pub fn format_shop_response(raw: &str) -> String {
    format_guarded(raw, |text| render_catalog(&parse_catalog(text)))
}

fn format_guarded<F>(raw: &str, render: F) -> String
where
    F: FnOnce(&str) -> String,
{
    match panic::catch_unwind(AssertUnwindSafe(|| render(raw))) {
        Ok(text) => text,
        Err(payload) => {
            let reason = panic_reason(payload.as_ref());
            error!(%reason, "failed to format canister shop response");
            raw_dump(raw, &reason)
        }
    }
}

/// Passthrough rendering that keeps the complete canister output.
pub fn raw_dump(raw: &str, reason: &str) -> String {
    format!("🏪 **Shop Data (Raw):**\n\n```{raw}```\n\n*Failed to format response: {reason}*")
}

fn panic_reason(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown parser fault".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DFX_OUTPUT: &str = r#"(
  record {
    owned = vec {};
    available = vec {
      record {
        id = 1 : nat;
        image_url = "https://cdn.example/blade.png";
        name = "Blade";
        description = "A sharp starter skin";
        price = 1_500 : nat;
      };
      record {
        id = 2 : nat;
        name = "Cloak";
        price = 40 : nat;
      };
    };
  },
)"#;

    #[test]
    fn single_record_from_inline_vec() {
        let catalog =
            parse_catalog(r#"available = vec { record { name = "Blade"; price = 10 : nat; } }"#);
        let expected: Record = [("name", "Blade"), ("price", "10")].into_iter().collect();
        assert_eq!(catalog, Catalog::Listed(vec![expected]));

        let text = render_catalog(&catalog);
        assert!(text.contains("**1. Blade**"));
        assert!(text.contains("Price: **10** coins"));
        assert!(!text.contains("View image"));
        assert!(text.contains("Description: *no description*"));
    }

    #[test]
    fn dfx_output_keeps_record_order() {
        let catalog = parse_catalog(DFX_OUTPUT);
        let records = catalog.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("name"), Some("Blade"));
        assert_eq!(records[0].get("price"), Some("1500"));
        assert_eq!(records[0].get("id"), Some("1"));
        assert_eq!(records[1].get("name"), Some("Cloak"));
        assert_eq!(records[1].get("description"), None);

        let text = render_catalog(&catalog);
        let first = text.find("**1. Blade**").unwrap();
        let second = text.find("**2. Cloak**").unwrap();
        assert!(first < second);
        assert!(text.contains("[View image](https://cdn.example/blade.png)"));
        assert_eq!(text.matches("View image").count(), 1);
    }

    #[test]
    fn missing_wrapper_and_empty_vec_are_reported_differently() {
        let missing = format_shop_response("(record { owned = vec {} })");
        let empty = format_shop_response("(record { available = vec {}; })");
        let blank = format_shop_response("available = vec {   \n  };");

        assert!(missing.contains(NO_ITEMS_MESSAGE));
        assert!(empty.contains(NOTHING_FOR_SALE_MESSAGE));
        assert!(blank.contains(NOTHING_FOR_SALE_MESSAGE));
        assert_ne!(missing, empty);
    }

    #[test]
    fn wrapper_without_records_counts_as_nothing_for_sale() {
        assert_eq!(parse_catalog("available = vec { 1; 2; 3 }"), Catalog::Empty);
    }

    #[test]
    fn unrecognised_values_are_omitted() {
        let record =
            parse_record(r#"name = "Orb"; owned = true; price = 7 : nat; tags = vec {};"#);
        let expected: Record = [("name", "Orb"), ("price", "7")].into_iter().collect();
        assert_eq!(record, expected);
    }

    #[test]
    fn record_without_fields_renders_defaults() {
        let text = format_shop_response("available = vec { record { flag = true; } }");
        assert!(text.contains("**1. N/A**"));
        assert!(text.contains("Price: **N/A** coins"));
    }

    #[test]
    fn empty_image_url_is_not_printed() {
        let text = format_shop_response(
            r#"available = vec { record { name = "Orb"; image_url = ""; price = 3 : nat; } }"#,
        );
        assert!(!text.contains("View image"));
    }

    #[test]
    fn unbalanced_braces_do_not_panic() {
        for input in [
            "available = vec {",
            "available = vec { record { name = \"x\";",
            "}}}} available = vec { { { record {",
            "available = vec { record { name = \"a}\"; } }",
            "",
        ] {
            let text = format_shop_response(input);
            assert!(text.starts_with("🏪"), "unexpected output for {input:?}: {text}");
        }
    }

    #[test]
    fn render_fault_falls_back_to_raw_text() {
        let raw = "available = vec { record { name = \"Blade\"; } }";
        let text = format_guarded(raw, |_| panic!("renderer exploded"));
        assert!(text.contains(raw));
        assert!(text.contains("Shop Data (Raw)"));
        assert!(text.contains("renderer exploded"));
    }
}
