//! DOM snapshot handed over by the content script.
//!
//! The snapshot follows the shape of a CDP `DOM.Node`: `nodeName`, `nodeValue`,
//! `attributes` (flat `[name, value, ...]` list or an object) and `children`.

use std::fmt;

use serde::de::{self, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::Deserialize;

use crate::errors::MetadataError;
use crate::xpath::XPath;

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DomNode {
    #[serde(alias = "localName")]
    pub node_name: String,
    #[serde(default)]
    pub node_value: Option<String>,
    #[serde(default, deserialize_with = "attribute_list")]
    pub attributes: Vec<(String, String)>,
    #[serde(default)]
    pub children: Vec<DomNode>,
}

impl DomNode {
    pub fn element(name: &str) -> Self {
        Self {
            node_name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn text(value: &str) -> Self {
        Self {
            node_name: "#text".to_string(),
            node_value: Some(value.to_string()),
            ..Self::default()
        }
    }

    pub fn with_attr(mut self, name: &str, value: &str) -> Self {
        self.attributes.push((name.to_string(), value.to_string()));
        self
    }

    pub fn with_child(mut self, child: DomNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn is_text(&self) -> bool {
        self.node_name == "#text"
    }

    pub fn is_element(&self) -> bool {
        !self.node_name.starts_with('#')
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn name_matches(&self, name: &str) -> bool {
        self.is_element() && self.node_name.eq_ignore_ascii_case(name)
    }

    /// Concatenated text of all descendant text nodes.
    pub fn string_value(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        if self.is_text() {
            if let Some(value) = &self.node_value {
                out.push_str(value);
            }
            return;
        }
        for child in &self.children {
            child.collect_text(out);
        }
    }
}

/// A page captured for scraping.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PageDocument {
    #[serde(alias = "documentElement", alias = "root")]
    pub root: DomNode,
}

impl PageDocument {
    pub fn new(root: DomNode) -> Self {
        Self { root }
    }

    pub fn from_json(raw: &str) -> Result<Self, MetadataError> {
        serde_json::from_str(raw).map_err(|err| MetadataError::Document(err.to_string()))
    }

    /// First match of `expr`, whitespace-normalised; `None` when nothing matches
    /// or the match is blank.
    pub fn evaluate_text(&self, expr: &str) -> Result<Option<String>, MetadataError> {
        let xpath = XPath::parse(expr)?;
        Ok(xpath
            .evaluate(&self.root)
            .into_iter()
            .map(|value| normalize_space(&value))
            .find(|value| !value.is_empty()))
    }

    pub fn evaluate_all(&self, expr: &str) -> Result<Vec<String>, MetadataError> {
        let xpath = XPath::parse(expr)?;
        Ok(xpath
            .evaluate(&self.root)
            .into_iter()
            .map(|value| normalize_space(&value))
            .collect())
    }
}

pub fn normalize_space(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn attribute_list<'de, D>(deserializer: D) -> Result<Vec<(String, String)>, D::Error>
where
    D: Deserializer<'de>,
{
    struct AttributesVisitor;

    impl<'de> Visitor<'de> for AttributesVisitor {
        type Value = Vec<(String, String)>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a flat [name, value, ...] list or an attribute object")
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(Vec::new())
        }

        fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
        where
            A: SeqAccess<'de>,
        {
            let mut out = Vec::new();
            while let Some(name) = seq.next_element::<String>()? {
                let value = seq
                    .next_element::<String>()?
                    .ok_or_else(|| de::Error::custom(format!("attribute '{name}' has no value")))?;
                out.push((name, value));
            }
            Ok(out)
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut out = Vec::new();
            while let Some((name, value)) = map.next_entry::<String, String>()? {
                out.push((name, value));
            }
            Ok(out)
        }
    }

    deserializer.deserialize_any(AttributesVisitor)
}
