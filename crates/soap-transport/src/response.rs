//! SOAP 1.1 response parsing.
//!
//! The envelope is read into a small element tree. The first child of the
//! `Body` is either a `Fault` or the operation's response element, whose
//! return parts become the call result:
//!
//! - no part: `null`;
//! - one part: that part's value;
//! - several parts: an object keyed by part name.
//!
//! Element values follow their `xsi:type` where present. Arrays (an
//! `Array` type, or repeated children with the same name) become JSON arrays,
//! other compound elements become objects.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde_json::{Map, Number, Value};

use crate::SoapError;

#[derive(Debug, Default)]
struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Element>,
    text: String,
}

impl Element {
    fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|child| child.name == name)
    }
}

/// Extracts the operation result from a response envelope.
///
/// A fault in the body is returned as [`SoapError::Fault`].
pub fn parse_response(xml: &str) -> Result<Value, SoapError> {
    let envelope = parse_tree(xml)?;
    if envelope.name != "Envelope" {
        return Err(SoapError::malformed(format!(
            "expected an Envelope, found <{}>",
            envelope.name
        )));
    }
    let body = envelope
        .child("Body")
        .ok_or_else(|| SoapError::malformed("envelope has no Body"))?;
    let payload = body
        .children
        .first()
        .ok_or_else(|| SoapError::malformed("Body is empty"))?;

    if payload.name == "Fault" {
        return Err(fault(payload));
    }

    Ok(match payload.children.as_slice() {
        [] => Value::Null,
        [part] => element_value(part),
        parts => compound_value(parts),
    })
}

fn fault(element: &Element) -> SoapError {
    let text = |name: &str| element.child(name).map(|child| child.text.trim().to_string());
    SoapError::Fault {
        code: text("faultcode").unwrap_or_default(),
        message: text("faultstring").unwrap_or_default(),
        detail: element.child("detail").map(|detail| {
            if detail.children.is_empty() {
                detail.text.trim().to_string()
            } else {
                element_value(detail).to_string()
            }
        }),
    }
}

fn element_value(element: &Element) -> Value {
    if element.attribute("nil") == Some("true") {
        return Value::Null;
    }
    let xsi_type = element
        .attribute("type")
        .map(|value| value.rsplit(':').next().unwrap_or(value));

    if element.children.is_empty() {
        return scalar_value(element.text.trim(), xsi_type);
    }
    if xsi_type.is_some_and(|t| t.ends_with("Array")) {
        return Value::Array(element.children.iter().map(element_value).collect());
    }
    compound_value(&element.children)
}

fn compound_value(children: &[Element]) -> Value {
    let repeated = children.len() > 1 && children.iter().all(|c| c.name == children[0].name);
    if repeated {
        return Value::Array(children.iter().map(element_value).collect());
    }

    let mut map = Map::new();
    for child in children {
        let value = element_value(child);
        match map.get_mut(&child.name) {
            Some(Value::Array(existing)) => existing.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                map.insert(child.name.clone(), value);
            }
        }
    }
    Value::Object(map)
}

fn scalar_value(text: &str, xsi_type: Option<&str>) -> Value {
    let parsed = match xsi_type {
        Some("int" | "integer" | "long" | "short" | "byte" | "unsignedInt" | "unsignedLong") => {
            text.parse::<i64>().ok().map(Value::from)
        }
        Some("double" | "float" | "decimal") => text
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number),
        Some("boolean") => match text {
            "true" | "1" => Some(Value::Bool(true)),
            "false" | "0" => Some(Value::Bool(false)),
            _ => None,
        },
        _ => None,
    };
    parsed.unwrap_or_else(|| Value::String(text.to_string()))
}

// ---------------------------------------------------------------------------
// Tree building
// ---------------------------------------------------------------------------

fn parse_tree(xml: &str) -> Result<Element, SoapError> {
    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<Element> = Vec::new();
    let mut root = None;

    loop {
        match reader.read_event()? {
            Event::Start(start) => stack.push(open(&start)?),
            Event::Empty(start) => {
                let element = open(&start)?;
                close(element, &mut stack, &mut root);
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| SoapError::malformed("unbalanced closing tag"))?;
                close(element, &mut stack, &mut root);
            }
            Event::Text(text) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&text.unescape()?);
                }
            }
            Event::CData(data) => {
                if let Some(current) = stack.last_mut() {
                    current
                        .text
                        .push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(SoapError::malformed("document ended inside an element"));
    }
    root.ok_or_else(|| SoapError::malformed("document has no root element"))
}

fn open(start: &BytesStart<'_>) -> Result<Element, SoapError> {
    let mut attributes = Vec::new();
    for attribute in start.attributes() {
        let attribute = attribute.map_err(quick_xml::Error::from)?;
        let key = String::from_utf8_lossy(attribute.key.local_name().as_ref()).into_owned();
        let value = attribute.unescape_value()?.into_owned();
        attributes.push((key, value));
    }
    Ok(Element {
        name: String::from_utf8_lossy(start.local_name().as_ref()).into_owned(),
        attributes,
        ..Element::default()
    })
}

fn close(element: Element, stack: &mut [Element], root: &mut Option<Element>) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None => *root = Some(element),
    }
}
