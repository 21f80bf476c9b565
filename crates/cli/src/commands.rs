//! Command-line parsing and ad-hoc dispatch.
//!
//! Services and endpoints are normally compile-time types. The CLI targets
//! URIs given on the command line, so it registers one HTTP service and one
//! SOAP service whose URIs are captured by their factories, and builds
//! endpoint definitions from the path or operation arguments.

use std::path::PathBuf;

use anyhow::{anyhow, bail, Context};
use dispatch::{
    Capability, Endpoint, EndpointDef, Fields, Headers, Method, ProxyConfig, Registry, RestResource,
    Service, SoapOperation, WebProxy, Webpage,
};
use document::HtmlParser;
use http_transport::ReqwestTransport;
use serde_json::{json, Value};
use soap_transport::SoapTransport;
use tracing::info;

pub const USAGE: &str = "\
usage:
  webproxy get    <base-uri> <path> [query]
  webproxy post   <base-uri> <path> [name=value | name@file ...]
  webproxy delete <base-uri> <path> [query]
  webproxy scrape <base-uri> <path> <selector> [attribute]
  webproxy call   <wsdl-uri> <operation> [name=value ...]

Values are parsed as JSON when possible, otherwise sent as strings.
WEBPROXY_CONFIG names a TOML configuration file.";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Get {
        base: String,
        path: String,
        query: String,
    },
    Post {
        base: String,
        path: String,
        fields: Fields,
        files: Vec<(String, PathBuf)>,
    },
    Delete {
        base: String,
        path: String,
        query: String,
    },
    Scrape {
        base: String,
        path: String,
        selector: String,
        attribute: Option<String>,
    },
    Call {
        wsdl: String,
        operation: String,
        parameters: Fields,
    },
}

impl Command {
    /// Parses the arguments following the program name.
    pub fn parse(args: &[String]) -> anyhow::Result<Self> {
        let (name, rest) = args.split_first().ok_or_else(|| anyhow!("missing command"))?;
        let positional = |index: usize, what: &str| {
            rest.get(index)
                .cloned()
                .ok_or_else(|| anyhow!("{name}: missing {what}"))
        };

        match name.as_str() {
            "get" | "delete" => {
                let base = positional(0, "base URI")?;
                let path = positional(1, "path")?;
                let query = rest.get(2).cloned().unwrap_or_default();
                if rest.len() > 3 {
                    bail!("{name}: too many arguments");
                }
                Ok(if name == "get" {
                    Command::Get { base, path, query }
                } else {
                    Command::Delete { base, path, query }
                })
            }
            "post" => {
                let base = positional(0, "base URI")?;
                let path = positional(1, "path")?;
                let mut fields = Fields::new();
                let mut files = Vec::new();
                for argument in &rest[2..] {
                    if let Some((field, file)) = split_file(argument) {
                        files.push((field.to_string(), PathBuf::from(file)));
                    } else {
                        let (key, value) = parse_assignment(argument)?;
                        fields.insert(key, value);
                    }
                }
                Ok(Command::Post {
                    base,
                    path,
                    fields,
                    files,
                })
            }
            "scrape" => {
                let base = positional(0, "base URI")?;
                let path = positional(1, "path")?;
                let selector = positional(2, "selector")?;
                if rest.len() > 4 {
                    bail!("scrape: too many arguments");
                }
                Ok(Command::Scrape {
                    base,
                    path,
                    selector,
                    attribute: rest.get(3).cloned(),
                })
            }
            "call" => {
                let wsdl = positional(0, "WSDL URI")?;
                let operation = positional(1, "operation")?;
                let parameters = rest[2..]
                    .iter()
                    .map(|argument| parse_assignment(argument))
                    .collect::<anyhow::Result<Fields>>()?;
                Ok(Command::Call {
                    wsdl,
                    operation,
                    parameters,
                })
            }
            other => bail!("unknown command '{other}'"),
        }
    }
}

/// `name@path` marks a file attachment; `name=value` never does.
fn split_file(argument: &str) -> Option<(&str, &str)> {
    let (field, file) = argument.split_once('@')?;
    (!field.is_empty() && !field.contains('=')).then_some((field, file))
}

fn parse_assignment(argument: &str) -> anyhow::Result<(String, Value)> {
    let (key, raw) = argument
        .split_once('=')
        .with_context(|| format!("expected name=value, got '{argument}'"))?;
    if key.is_empty() {
        bail!("empty name in '{argument}'");
    }
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((key.to_string(), value))
}

// ---------------------------------------------------------------------------
// Runtime services and endpoints
// ---------------------------------------------------------------------------

struct CliHttpService {
    uri: String,
}

impl Service for CliHttpService {
    const CAPABILITY: Capability = Capability::Http;

    fn uri(&self) -> &str {
        &self.uri
    }
}

struct CliSoapService {
    uri: String,
}

impl Service for CliSoapService {
    const CAPABILITY: Capability = Capability::Soap;

    fn uri(&self) -> &str {
        &self.uri
    }
}

#[derive(Debug)]
struct PathDef(String);

impl EndpointDef for PathDef {
    type Service = CliHttpService;

    fn request_name(&self) -> &str {
        &self.0
    }

    fn supported_methods(&self) -> &[Method] {
        &[Method::Get, Method::Post, Method::Delete]
    }
}

#[derive(Debug)]
struct OperationDef(String);

impl EndpointDef for OperationDef {
    type Service = CliSoapService;

    fn request_name(&self) -> &str {
        &self.0
    }
}

fn proxy_for(command: &Command, config: &ProxyConfig) -> anyhow::Result<WebProxy> {
    let mut builder = Registry::builder();
    match command {
        Command::Call { wsdl, .. } => {
            let uri = wsdl.clone();
            builder = builder
                .service(move || CliSoapService { uri: uri.clone() })
                .rpc_transport(SoapTransport::new(&config.soap)?);
        }
        Command::Get { base, .. }
        | Command::Post { base, .. }
        | Command::Delete { base, .. }
        | Command::Scrape { base, .. } => {
            let uri = base.clone();
            builder = builder
                .service(move || CliHttpService { uri: uri.clone() })
                .http_transport(ReqwestTransport::new(&config.http)?);
        }
    }

    Ok(WebProxy::new(builder.build())
        .with_config(config)
        .with_document_parser(HtmlParser))
}

/// Dispatches `command` and returns what to print.
pub async fn run(command: Command, config: &ProxyConfig) -> anyhow::Result<Value> {
    let proxy = proxy_for(&command, config)?;
    info!(?command, "Running command");

    match command {
        Command::Get { path, query, .. } => {
            let resource = proxy
                .get(RestResource::with_query(PathDef(path), query), Headers::new())
                .await?;
            Ok(resource.data().cloned().unwrap_or(Value::Null))
        }
        Command::Post {
            path, fields, files, ..
        } => {
            let resource = proxy
                .post(RestResource::new(PathDef(path)), fields, files, Headers::new())
                .await?;
            Ok(resource.data().cloned().unwrap_or(Value::Null))
        }
        Command::Delete { path, query, .. } => {
            let resource = proxy
                .delete(RestResource::with_query(PathDef(path), query), Headers::new())
                .await?;
            Ok(json!({ "status": resource.response().and_then(|r| r.status()) }))
        }
        Command::Scrape {
            path,
            selector,
            attribute,
            ..
        } => {
            let page = proxy
                .get(Webpage::new(PathDef(path)), Headers::new())
                .await?;
            let value = match attribute {
                Some(attribute) => page.attr(&selector, &attribute)?,
                None => page.text(&selector)?,
            };
            Ok(json!({ "value": value, "count": page.count(&selector)? }))
        }
        Command::Call {
            operation,
            parameters,
            ..
        } => {
            let operation = proxy
                .call(SoapOperation::new(OperationDef(operation)), parameters, Headers::new())
                .await?;
            Ok(operation.result().cloned().unwrap_or(Value::Null))
        }
    }
}
