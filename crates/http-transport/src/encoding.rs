//! Body, header, and option encoding for outbound requests.

use std::time::Duration;

use dispatch::{Fields, Headers, MultipartPart, Options, PartContents};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use tokio::io::AsyncReadExt;

use crate::HttpTransportError;

/// Request option: timeout in seconds; `0` waits indefinitely.
pub const TIMEOUT_OPTION: &str = "timeout";

/// Request option: `false` returns 4xx/5xx responses instead of failing.
pub const HTTP_ERRORS_OPTION: &str = "http_errors";

/// Flattens body fields into `application/x-www-form-urlencoded` pairs.
///
/// Nested values use bracket notation (`tags[0]=a`, `author[name]=b`),
/// booleans become `1`/`0`, and nulls are omitted.
pub fn form_pairs(fields: &Fields) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for (key, value) in fields {
        flatten(key.clone(), value, &mut pairs);
    }
    pairs
}

fn flatten(prefix: String, value: &Value, pairs: &mut Vec<(String, String)>) {
    match value {
        Value::Null => {}
        Value::Bool(flag) => pairs.push((prefix, if *flag { "1" } else { "0" }.to_string())),
        Value::Number(number) => pairs.push((prefix, number.to_string())),
        Value::String(text) => pairs.push((prefix, text.clone())),
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                flatten(format!("{prefix}[{index}]"), item, pairs);
            }
        }
        Value::Object(map) => {
            for (key, item) in map {
                flatten(format!("{prefix}[{key}]"), item, pairs);
            }
        }
    }
}

pub fn header_map(headers: &Headers) -> Result<HeaderMap, HttpTransportError> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let invalid = |reason: String| HttpTransportError::InvalidHeader {
            name: name.clone(),
            reason,
        };
        let header_name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|e| invalid(e.to_string()))?;
        let header_value = HeaderValue::from_str(value).map_err(|e| invalid(e.to_string()))?;
        map.insert(header_name, header_value);
    }
    Ok(map)
}

/// Builds a multipart form. File contents are read here; the handles close
/// when this returns, on success or failure.
pub async fn multipart_form(parts: Vec<MultipartPart>) -> Result<Form, HttpTransportError> {
    let mut form = Form::new();
    for part in parts {
        let MultipartPart {
            name,
            contents,
            filename,
            headers,
        } = part;

        let mut encoded = match contents {
            PartContents::Text(text) => Part::text(text),
            PartContents::File(attachment) => {
                let path = attachment.path().to_path_buf();
                let mut file = tokio::fs::File::from_std(attachment.into_file());
                let mut bytes = Vec::new();
                file.read_to_end(&mut bytes)
                    .await
                    .map_err(|source| HttpTransportError::Attachment { path, source })?;
                Part::bytes(bytes)
            }
        };
        if let Some(filename) = filename {
            encoded = encoded.file_name(filename);
        }
        if !headers.is_empty() {
            encoded = encoded.headers(header_map(&headers)?);
        }
        form = form.part(name, encoded);
    }
    Ok(form)
}

pub fn timeout_option(options: &Options) -> Result<Option<Duration>, HttpTransportError> {
    let Some(value) = options.get(TIMEOUT_OPTION) else {
        return Ok(None);
    };
    let invalid = |reason: String| HttpTransportError::InvalidOption {
        key: TIMEOUT_OPTION.to_string(),
        reason,
    };
    let seconds = value
        .as_f64()
        .filter(|seconds| seconds.is_finite() && *seconds >= 0.0)
        .ok_or_else(|| invalid(format!("expected a non-negative number of seconds, got {value}")))?;
    if seconds == 0.0 {
        return Ok(None);
    }
    Duration::try_from_secs_f64(seconds)
        .map(Some)
        .map_err(|e| invalid(format!("{seconds} seconds: {e}")))
}

pub fn http_errors_option(options: &Options) -> Result<Option<bool>, HttpTransportError> {
    match options.get(HTTP_ERRORS_OPTION) {
        None => Ok(None),
        Some(Value::Bool(flag)) => Ok(Some(*flag)),
        Some(other) => Err(HttpTransportError::InvalidOption {
            key: HTTP_ERRORS_OPTION.to_string(),
            reason: format!("expected a boolean, got {other}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn fields(value: Value) -> Fields {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_form_pairs_flatten_nested_values() {
        let pairs = form_pairs(&fields(json!({
            "title": "foo",
            "tags": ["a", "b"],
            "author": { "name": "Jan", "active": true },
            "draft": false,
            "parent": null,
            "id": 5
        })));

        let expected: Vec<(String, String)> = [
            ("author[active]", "1"),
            ("author[name]", "Jan"),
            ("draft", "0"),
            ("id", "5"),
            ("tags[0]", "a"),
            ("tags[1]", "b"),
            ("title", "foo"),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        assert_eq!(pairs, expected);
    }

    #[test]
    fn test_header_map_rejects_invalid_names() {
        let mut headers = Headers::new();
        headers.insert("bad header".to_string(), "x".to_string());

        let result = header_map(&headers);

        assert!(matches!(
            result,
            Err(HttpTransportError::InvalidHeader { ref name, .. }) if name == "bad header"
        ));
    }

    #[test]
    fn test_header_map_copies_valid_headers() {
        let mut headers = Headers::new();
        headers.insert("Accept".to_string(), "application/json".to_string());

        let map = header_map(&headers).unwrap();

        assert_eq!(map["accept"], "application/json");
    }

    #[test]
    fn test_timeout_option() {
        let mut options = Options::new();
        assert_eq!(timeout_option(&options).unwrap(), None);

        options.insert(TIMEOUT_OPTION.to_string(), json!(2.5));
        assert_eq!(
            timeout_option(&options).unwrap(),
            Some(Duration::from_millis(2500))
        );

        options.insert(TIMEOUT_OPTION.to_string(), json!(0));
        assert_eq!(timeout_option(&options).unwrap(), None);

        options.insert(TIMEOUT_OPTION.to_string(), json!("soon"));
        assert!(matches!(
            timeout_option(&options),
            Err(HttpTransportError::InvalidOption { .. })
        ));

        options.insert(TIMEOUT_OPTION.to_string(), json!(-1));
        assert!(timeout_option(&options).is_err());
    }

    #[test]
    fn test_timeout_too_large_for_duration_is_rejected() {
        let mut options = Options::new();
        options.insert(TIMEOUT_OPTION.to_string(), json!(1e300));

        let result = timeout_option(&options);

        assert!(matches!(
            result,
            Err(HttpTransportError::InvalidOption { ref key, .. }) if key == TIMEOUT_OPTION
        ));
    }

    #[test]
    fn test_http_errors_option() {
        let mut options = Options::new();
        assert_eq!(http_errors_option(&options).unwrap(), None);

        options.insert(HTTP_ERRORS_OPTION.to_string(), json!(false));
        assert_eq!(http_errors_option(&options).unwrap(), Some(false));

        options.insert(HTTP_ERRORS_OPTION.to_string(), json!("no"));
        assert!(http_errors_option(&options).is_err());
    }
}
