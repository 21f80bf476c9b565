//! SOAP 1.1 RPC/encoded request envelopes.

use std::fmt::{self, Write};

use dispatch::Fields;
use quick_xml::escape::escape;
use serde_json::Value;

use crate::SoapError;

pub const ENVELOPE_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";
pub const ENCODING_NS: &str = "http://schemas.xmlsoap.org/soap/encoding/";
const XSD_NS: &str = "http://www.w3.org/2001/XMLSchema";
const XSI_NS: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// Builds the envelope calling `operation` in `namespace` with `parameters`
/// as typed child elements, in key order.
pub fn build_envelope(
    namespace: &str,
    operation: &str,
    parameters: &Fields,
) -> Result<String, SoapError> {
    check_name(operation)?;
    for (name, value) in parameters {
        check_names(name, value)?;
    }

    let mut body = String::new();
    for (name, value) in parameters {
        write_value(&mut body, name, value)?;
    }

    Ok(format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8"?>"#,
            r#"<SOAP-ENV:Envelope xmlns:SOAP-ENV="{envelope}" xmlns:SOAP-ENC="{encoding}" "#,
            r#"xmlns:xsd="{xsd}" xmlns:xsi="{xsi}" SOAP-ENV:encodingStyle="{encoding}">"#,
            r#"<SOAP-ENV:Body><ns1:{operation} xmlns:ns1="{namespace}">{body}</ns1:{operation}>"#,
            r#"</SOAP-ENV:Body></SOAP-ENV:Envelope>"#,
        ),
        envelope = ENVELOPE_NS,
        encoding = ENCODING_NS,
        xsd = XSD_NS,
        xsi = XSI_NS,
        operation = operation,
        namespace = escape(namespace),
        body = body,
    ))
}

/// Checks `name` and every nested element name under `value`.
fn check_names(name: &str, value: &Value) -> Result<(), SoapError> {
    check_name(name)?;
    match value {
        Value::Array(items) => items.iter().try_for_each(|item| check_names("item", item)),
        Value::Object(map) => map.iter().try_for_each(|(key, item)| check_names(key, item)),
        _ => Ok(()),
    }
}

fn write_value(out: &mut impl Write, name: &str, value: &Value) -> fmt::Result {
    match value {
        Value::Null => write!(out, r#"<{name} xsi:nil="true"/>"#),
        Value::Bool(flag) => write!(out, r#"<{name} xsi:type="xsd:boolean">{flag}</{name}>"#),
        Value::Number(number) if number.is_f64() => {
            write!(out, r#"<{name} xsi:type="xsd:double">{number}</{name}>"#)
        }
        Value::Number(number) => write!(out, r#"<{name} xsi:type="xsd:int">{number}</{name}>"#),
        Value::String(text) => write!(
            out,
            r#"<{name} xsi:type="xsd:string">{}</{name}>"#,
            escape(text.as_str())
        ),
        Value::Array(items) => {
            write!(
                out,
                r#"<{name} xsi:type="SOAP-ENC:Array" SOAP-ENC:arrayType="xsd:anyType[{}]">"#,
                items.len()
            )?;
            for item in items {
                write_value(out, "item", item)?;
            }
            write!(out, "</{name}>")
        }
        Value::Object(map) => {
            write!(out, "<{name}>")?;
            for (key, item) in map {
                write_value(out, key, item)?;
            }
            write!(out, "</{name}>")
        }
    }
}

/// Accepts plain XML element names: a letter or `_`, then letters, digits,
/// `_`, `-`, or `.`.
fn check_name(name: &str) -> Result<(), SoapError> {
    let mut chars = name.chars();
    let valid = chars
        .next()
        .is_some_and(|first| first.is_alphabetic() || first == '_')
        && chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'));
    if valid {
        Ok(())
    } else {
        Err(SoapError::InvalidName {
            name: name.to_string(),
        })
    }
}
