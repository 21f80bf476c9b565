//! Outbound call descriptions.
//!
//! A [`Request`] is an immutable value produced by [`RequestBuilder::build`].
//! The builder enforces the body-type rules in a single place
//! (`RequestBuilder::fix_body_type`):
//!
//! - the body type is one of form, JSON, or multipart, and once fixed it
//!   cannot be switched to another;
//! - files require multipart, so attaching files to a form or JSON body fails
//!   with [`ProxyError::RequestBodyTypeMismatch`].
//!
//! Untyped fields set through [`RequestBuilder::body`] do not fix a body type.
//! Their encoding is chosen at build time: multipart when any part or file is
//! attached, form otherwise. The order in which `body` and `files` are called
//! therefore does not matter.

use std::fs::File;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::{BodyType, Fields, Headers, Method, Options, ProxyError, GENERIC_BODY_KEY};

// ---------------------------------------------------------------------------
// Multipart parts
// ---------------------------------------------------------------------------

/// An attachment file opened for upload.
///
/// The handle is owned: it is closed when the part is dropped, whether the
/// dispatch succeeds, fails, or never reaches the transport.
#[derive(Debug)]
pub struct Attachment {
    path: PathBuf,
    file: File,
}

impl Attachment {
    /// Opens `path` for reading.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ProxyError> {
        let path = path.as_ref().to_path_buf();
        match File::open(&path) {
            Ok(file) => Ok(Self { path, file }),
            Err(source) => Err(ProxyError::Attachment { path, source }),
        }
    }

    /// Path the attachment was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name component of the path, if any.
    pub fn file_name(&self) -> Option<String> {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
    }

    /// Gives up the open handle to the transport.
    pub fn into_file(self) -> File {
        self.file
    }
}

/// Contents of one multipart part.
#[derive(Debug)]
pub enum PartContents {
    /// Inline text, sent as-is.
    Text(String),
    /// An opened file, read by the transport when the body is encoded.
    File(Attachment),
}

/// One entry of a multipart body.
#[derive(Debug)]
pub struct MultipartPart {
    /// Form field name.
    pub name: String,
    pub contents: PartContents,
    /// Filename sent in the part's `Content-Disposition`.
    pub filename: Option<String>,
    /// Extra per-part headers.
    pub headers: Headers,
}

impl MultipartPart {
    /// A text part.
    pub fn text(name: impl Into<String>, contents: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            contents: PartContents::Text(contents.into()),
            filename: None,
            headers: Headers::new(),
        }
    }

    /// A scalar field normalised into a part (`{name, contents}`).
    ///
    /// Strings are sent verbatim; any other value is sent as its JSON text.
    pub fn field(name: impl Into<String>, value: &Value) -> Self {
        let contents = match value {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        };
        Self::text(name, contents)
    }

    /// A file part (`{name, contents: opened file, filename}`). The filename
    /// defaults to the file name of `path`.
    pub fn file(name: impl Into<String>, path: impl AsRef<Path>) -> Result<Self, ProxyError> {
        let attachment = Attachment::open(path)?;
        let filename = attachment.file_name();
        Ok(Self {
            name: name.into(),
            contents: PartContents::File(attachment),
            filename,
            headers: Headers::new(),
        })
    }

    /// Overrides the filename sent with the part.
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    /// Adds a per-part header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Returns `true` for parts carrying a file.
    pub fn is_file(&self) -> bool {
        matches!(self.contents, PartContents::File(_))
    }
}

// ---------------------------------------------------------------------------
// Transport projection
// ---------------------------------------------------------------------------

/// A request body as handed to the HTTP transport, tagged by encoding.
#[derive(Debug)]
pub enum TransportBody {
    /// Fields to form-encode.
    FormParams(Fields),
    /// Fields to send as one JSON object.
    Json(Fields),
    /// Body parts followed by file parts.
    Multipart(Vec<MultipartPart>),
    /// Body-carrying request that never fixed a body type.
    Unset(Fields),
}

impl TransportBody {
    /// The key the body is filed under (`form_params`, `json`, `multipart`,
    /// or the generic `body`).
    pub fn key(&self) -> &'static str {
        match self {
            TransportBody::FormParams(_) => BodyType::FormParams.key(),
            TransportBody::Json(_) => BodyType::Json.key(),
            TransportBody::Multipart(_) => BodyType::Multipart.key(),
            TransportBody::Unset(_) => GENERIC_BODY_KEY,
        }
    }
}

/// Everything the HTTP transport needs besides the method and URI.
#[derive(Debug, Default)]
pub struct TransportOptions {
    pub headers: Headers,
    pub options: Options,
    /// Always `None` for GET and DELETE.
    pub body: Option<TransportBody>,
}

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// One outbound call description. Build with [`Request::builder`] or
/// [`Request::create`].
#[derive(Debug)]
pub struct Request {
    method: Method,
    body_type: Option<BodyType>,
    fields: Fields,
    parts: Vec<MultipartPart>,
    files: Vec<MultipartPart>,
    headers: Headers,
    options: Options,
}

impl Request {
    /// Starts a request for a known verb.
    pub fn builder(method: Method) -> RequestBuilder {
        RequestBuilder {
            method,
            body_type: None,
            fields: Fields::new(),
            parts: Vec::new(),
            files: Vec::new(),
            headers: Headers::new(),
            options: Options::new(),
        }
    }

    /// Starts a request from a verb name.
    ///
    /// Fails with [`ProxyError::UnsupportedMethod`] unless the verb is one of
    /// GET, POST, PUT, DELETE, or RPC.
    pub fn create(method: &str) -> Result<RequestBuilder, ProxyError> {
        Ok(Self::builder(method.parse()?))
    }

    pub fn method(&self) -> Method {
        self.method
    }

    /// The resolved body type, `None` if the request has no body.
    pub fn body_type(&self) -> Option<BodyType> {
        self.body_type
    }

    /// Keyed body fields (form or JSON body, RPC parameters).
    ///
    /// Empty for multipart requests, whose fields live in [`Request::parts`].
    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    /// Non-file multipart parts, in order.
    pub fn parts(&self) -> &[MultipartPart] {
        &self.parts
    }

    /// File parts, in order.
    pub fn files(&self) -> &[MultipartPart] {
        &self.files
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn option(&self, key: &str) -> Option<&Value> {
        self.options.get(key)
    }

    /// Returns a copy of this request with `headers` and `options` merged
    /// underneath its own values; keys already set on the request win.
    pub fn with_defaults(mut self, headers: &Headers, options: &Options) -> Self {
        for (name, value) in headers {
            self.headers
                .entry(name.clone())
                .or_insert_with(|| value.clone());
        }
        for (key, value) in options {
            self.options
                .entry(key.clone())
                .or_insert_with(|| value.clone());
        }
        self
    }

    /// Projects the request into what the HTTP transport consumes.
    ///
    /// GET and DELETE carry headers and options only; any attached files are
    /// dropped (closed) here. Other verbs also carry the body under the key of
    /// their resolved body type.
    pub fn into_transport_options(self) -> TransportOptions {
        let body = if self.method.carries_body() {
            Some(match self.body_type {
                Some(BodyType::FormParams) => TransportBody::FormParams(self.fields),
                Some(BodyType::Json) => TransportBody::Json(self.fields),
                Some(BodyType::Multipart) => {
                    let mut parts = self.parts;
                    parts.extend(self.files);
                    TransportBody::Multipart(parts)
                }
                None => TransportBody::Unset(self.fields),
            })
        } else {
            None
        };

        TransportOptions {
            headers: self.headers,
            options: self.options,
            body,
        }
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Assembles a [`Request`].
///
/// Methods that fix the body type return `Result` so a conflicting encoding
/// is reported at the call that introduced it.
#[derive(Debug)]
pub struct RequestBuilder {
    method: Method,
    body_type: Option<BodyType>,
    fields: Fields,
    parts: Vec<MultipartPart>,
    files: Vec<MultipartPart>,
    headers: Headers,
    options: Options,
}

impl RequestBuilder {
    /// Sets the body fields without choosing an encoding.
    ///
    /// At build time the fields become multipart parts when any part or file
    /// is attached, form parameters otherwise. On a request already fixed to
    /// form or JSON they become that body.
    pub fn body(mut self, fields: Fields) -> Self {
        self.fields = fields;
        self
    }

    /// Sets a form-encoded body.
    pub fn form_params(mut self, fields: Fields) -> Result<Self, ProxyError> {
        self.fix_body_type(BodyType::FormParams)?;
        self.fields = fields;
        Ok(self)
    }

    /// Sets a JSON object body.
    pub fn json(mut self, fields: Fields) -> Result<Self, ProxyError> {
        self.fix_body_type(BodyType::Json)?;
        self.fields = fields;
        Ok(self)
    }

    /// Appends scalar fields as multipart parts, in iteration order.
    pub fn multipart(mut self, fields: Fields) -> Result<Self, ProxyError> {
        self.fix_body_type(BodyType::Multipart)?;
        self.parts.extend(
            fields
                .iter()
                .map(|(name, value)| MultipartPart::field(name.as_str(), value)),
        );
        Ok(self)
    }

    /// Appends fully specified multipart parts (custom filename or headers).
    pub fn multipart_parts(
        mut self,
        parts: impl IntoIterator<Item = MultipartPart>,
    ) -> Result<Self, ProxyError> {
        self.fix_body_type(BodyType::Multipart)?;
        for part in parts {
            if part.is_file() {
                self.files.push(part);
            } else {
                self.parts.push(part);
            }
        }
        Ok(self)
    }

    /// Opens and attaches files given as `(field name, path)` pairs.
    ///
    /// Fails with [`ProxyError::RequestBodyTypeMismatch`] if the body is
    /// already form or JSON, and with [`ProxyError::Attachment`] if a file
    /// cannot be opened. Forces the body type to multipart, which RPC
    /// requests cannot carry: the RPC client rejects them.
    pub fn files<N, P>(
        mut self,
        files: impl IntoIterator<Item = (N, P)>,
    ) -> Result<Self, ProxyError>
    where
        N: Into<String>,
        P: AsRef<Path>,
    {
        self.fix_body_type(BodyType::Multipart)?;
        for (name, path) in files {
            self.files.push(MultipartPart::file(name, path)?);
        }
        Ok(self)
    }

    /// Replaces the request headers.
    pub fn headers(mut self, headers: Headers) -> Self {
        self.headers = headers;
        self
    }

    /// Sets a single header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Replaces the transport options.
    pub fn options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    /// Sets a single transport option.
    pub fn option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// Finishes the request, resolving the encoding of untyped fields.
    pub fn build(self) -> Request {
        let RequestBuilder {
            method,
            body_type,
            mut fields,
            mut parts,
            files,
            headers,
            options,
        } = self;

        let body_type = body_type.or_else(|| {
            if !files.is_empty() {
                Some(BodyType::Multipart)
            } else if !fields.is_empty() {
                Some(BodyType::FormParams)
            } else {
                None
            }
        });

        if body_type == Some(BodyType::Multipart) && !fields.is_empty() {
            let mut normalised: Vec<MultipartPart> = fields
                .iter()
                .map(|(name, value)| MultipartPart::field(name.as_str(), value))
                .collect();
            normalised.append(&mut parts);
            parts = normalised;
            fields = Fields::new();
        }

        Request {
            method,
            body_type,
            fields,
            parts,
            files,
            headers,
            options,
        }
    }

    /// The single place where a body type is fixed.
    fn fix_body_type(&mut self, requested: BodyType) -> Result<(), ProxyError> {
        match self.body_type {
            Some(current) if current != requested => {
                Err(ProxyError::RequestBodyTypeMismatch { current, requested })
            }
            _ => {
                self.body_type = Some(requested);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use serde_json::json;
    use tempfile::NamedTempFile;

    use super::*;

    fn fields(value: Value) -> Fields {
        match value {
            Value::Object(map) => map,
            other => panic!("expected an object, got {other}"),
        }
    }

    fn temp_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_create_accepts_the_five_verbs() {
        for verb in ["GET", "POST", "PUT", "DELETE", "RPC"] {
            let request = Request::create(verb).unwrap().build();
            assert_eq!(request.method().as_str(), verb);
        }
    }

    #[test]
    fn test_create_rejects_other_verbs() {
        for verb in ["PATCH", "HEAD", "CONNECT", "TRACE", "OPTIONS", "FETCH"] {
            assert!(matches!(
                Request::create(verb),
                Err(ProxyError::UnsupportedMethod { .. })
            ));
        }
    }

    #[test]
    fn test_files_after_json_body_fails() {
        let file = temp_file("image");
        let result = Request::builder(Method::Post)
            .json(fields(json!({ "title": "foo" })))
            .unwrap()
            .files([("image", file.path())]);

        assert!(matches!(
            result,
            Err(ProxyError::RequestBodyTypeMismatch {
                current: BodyType::Json,
                requested: BodyType::Multipart,
            })
        ));
    }

    #[test]
    fn test_files_after_form_body_fails() {
        let file = temp_file("image");
        let result = Request::builder(Method::Post)
            .form_params(fields(json!({ "title": "foo" })))
            .unwrap()
            .files([("image", file.path())]);

        assert!(matches!(
            result,
            Err(ProxyError::RequestBodyTypeMismatch {
                current: BodyType::FormParams,
                ..
            })
        ));
    }

    #[test]
    fn test_files_on_unset_body_fix_multipart() {
        let file = temp_file("image");
        let request = Request::builder(Method::Post)
            .files([("image", file.path())])
            .unwrap()
            .build();

        assert_eq!(request.body_type(), Some(BodyType::Multipart));
        assert_eq!(request.files().len(), 1);
        assert_eq!(request.files()[0].name, "image");
        assert_eq!(
            request.files()[0].filename.as_deref(),
            file.path().file_name().and_then(|name| name.to_str())
        );
    }

    #[test]
    fn test_json_after_form_conflicts() {
        let result = Request::builder(Method::Post)
            .form_params(Fields::new())
            .unwrap()
            .json(Fields::new());

        assert!(matches!(
            result,
            Err(ProxyError::RequestBodyTypeMismatch { .. })
        ));
    }

    #[test]
    fn test_missing_attachment_is_reported() {
        let result =
            Request::builder(Method::Post).files([("image", "/definitely/not/here.png")]);

        match result {
            Err(ProxyError::Attachment { path, .. }) => {
                assert_eq!(path, PathBuf::from("/definitely/not/here.png"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_body_without_files_is_form() {
        let request = Request::builder(Method::Post)
            .body(fields(json!({ "title": "example" })))
            .build();

        assert_eq!(request.body_type(), Some(BodyType::FormParams));
        assert_eq!(request.fields()["title"], "example");
    }

    #[test]
    fn test_body_routing_ignores_call_order() {
        let file = temp_file("image");

        let files_first = Request::builder(Method::Post)
            .files([("image", file.path())])
            .unwrap()
            .body(fields(json!({ "title": "example" })))
            .build();
        let body_first = Request::builder(Method::Post)
            .body(fields(json!({ "title": "example" })))
            .files([("image", file.path())])
            .unwrap()
            .build();

        for request in [files_first, body_first] {
            assert_eq!(request.body_type(), Some(BodyType::Multipart));
            assert!(request.fields().is_empty());
            assert_eq!(request.parts().len(), 1);
            assert_eq!(request.parts()[0].name, "title");
            assert_eq!(request.files().len(), 1);
        }
    }

    #[test]
    fn test_multipart_normalises_scalars_in_order() {
        let request = Request::builder(Method::Post)
            .multipart(fields(json!({ "a": "text", "b": 5, "c": true })))
            .unwrap()
            .multipart_parts([MultipartPart::text("d", "data")
                .with_header("X-Baz", "bar")
                .with_filename("custom.txt")])
            .unwrap()
            .build();

        let names: Vec<&str> = request.parts().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["a", "b", "c", "d"]);
        match &request.parts()[1].contents {
            PartContents::Text(text) => assert_eq!(text, "5"),
            other => panic!("unexpected contents: {other:?}"),
        }
        assert_eq!(request.parts()[3].headers["X-Baz"], "bar");
        assert_eq!(request.parts()[3].filename.as_deref(), Some("custom.txt"));
    }

    #[test]
    fn test_get_and_delete_never_carry_a_body() {
        let file = temp_file("image");
        for method in [Method::Get, Method::Delete] {
            let options = Request::builder(method)
                .body(fields(json!({ "ignored": true })))
                .files([("image", file.path())])
                .unwrap()
                .header("Accept", "application/json")
                .build()
                .into_transport_options();

            assert!(options.body.is_none());
            assert_eq!(options.headers["Accept"], "application/json");
        }
    }

    #[test]
    fn test_transport_body_keyed_by_body_type() {
        let json_body = Request::builder(Method::Put)
            .json(fields(json!({ "title": "bar" })))
            .unwrap()
            .build()
            .into_transport_options()
            .body
            .unwrap();
        assert_eq!(json_body.key(), "json");

        let unset = Request::builder(Method::Post)
            .build()
            .into_transport_options()
            .body
            .unwrap();
        assert_eq!(unset.key(), "body");
    }

    #[test]
    fn test_multipart_transport_body_puts_files_last() {
        let file = temp_file("image");
        let body = Request::builder(Method::Post)
            .files([("image", file.path())])
            .unwrap()
            .multipart(fields(json!({ "title": "example" })))
            .unwrap()
            .build()
            .into_transport_options()
            .body
            .unwrap();

        match body {
            TransportBody::Multipart(parts) => {
                assert_eq!(parts.len(), 2);
                assert_eq!(parts[0].name, "title");
                assert!(parts[1].is_file());
            }
            other => panic!("unexpected body: {other:?}"),
        }
    }

    #[test]
    fn test_with_defaults_keeps_request_values() {
        let mut default_headers = Headers::new();
        default_headers.insert("User-Agent".into(), "webproxy".into());
        default_headers.insert("Accept".into(), "*/*".into());
        let mut default_options = Options::new();
        default_options.insert("timeout".into(), json!(10));

        let request = Request::builder(Method::Get)
            .header("Accept", "application/json")
            .build()
            .with_defaults(&default_headers, &default_options);

        assert_eq!(request.headers()["Accept"], "application/json");
        assert_eq!(request.headers()["User-Agent"], "webproxy");
        assert_eq!(request.option("timeout"), Some(&json!(10)));
    }
}
