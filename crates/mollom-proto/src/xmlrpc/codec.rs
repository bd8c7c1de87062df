//! XML-RPC document encoding and decoding.
//!
//! Decoding builds a small element tree first and interprets it second. The
//! tree is depth-limited so hostile documents cannot drive the interpreter
//! into deep recursion.

use std::{collections::BTreeMap, fmt::Write as _};

use base64::{Engine as _, engine::general_purpose::STANDARD};
use quick_xml::{
    Reader,
    escape::escape,
    events::{BytesStart, Event},
};

use super::Value;
use crate::error::CodecError;

/// Maximum element nesting accepted by the decoder.
pub const MAX_DEPTH: usize = 128;

/// Decoded `methodResponse`.
#[derive(Debug, Clone, PartialEq)]
pub enum MethodResponse {
    /// `<params>` with a single return value.
    Success(Value),
    /// `<fault>` with `faultCode` and `faultString`.
    Fault {
        /// Remote fault code.
        code: i32,
        /// Remote fault message.
        message: String,
    },
}

/// Encode a `methodCall` document.
pub fn encode_call(method: &str, params: &[Value]) -> String {
    let mut out = String::from("<?xml version=\"1.0\"?>\n<methodCall><methodName>");
    out.push_str(&escape(method));
    out.push_str("</methodName><params>");
    for param in params {
        out.push_str("<param>");
        encode_value(param, &mut out);
        out.push_str("</param>");
    }
    out.push_str("</params></methodCall>");
    out
}

/// Encode a `methodResponse` document.
pub fn encode_response(response: &MethodResponse) -> String {
    let mut out = String::from("<?xml version=\"1.0\"?>\n<methodResponse>");
    match response {
        MethodResponse::Success(value) => {
            out.push_str("<params><param>");
            encode_value(value, &mut out);
            out.push_str("</param></params>");
        },
        MethodResponse::Fault { code, message } => {
            let mut members = BTreeMap::new();
            members.insert("faultCode".to_string(), Value::from(*code));
            members.insert("faultString".to_string(), Value::from(message.as_str()));
            out.push_str("<fault>");
            encode_value(&Value::Struct(members), &mut out);
            out.push_str("</fault>");
        },
    }
    out.push_str("</methodResponse>");
    out
}

fn encode_value(value: &Value, out: &mut String) {
    out.push_str("<value>");
    match value {
        Value::Int(i) => {
            let tag = if i32::try_from(*i).is_ok() { "int" } else { "i8" };
            let _ = write!(out, "<{tag}>{i}</{tag}>");
        },
        Value::Bool(b) => {
            let _ = write!(out, "<boolean>{}</boolean>", u8::from(*b));
        },
        Value::String(s) => {
            let _ = write!(out, "<string>{}</string>", escape(s));
        },
        Value::Double(d) => {
            let _ = write!(out, "<double>{d}</double>");
        },
        Value::DateTime(s) => {
            let _ = write!(out, "<dateTime.iso8601>{}</dateTime.iso8601>", escape(s));
        },
        Value::Base64(bytes) => {
            let _ = write!(out, "<base64>{}</base64>", STANDARD.encode(bytes));
        },
        Value::Struct(members) => {
            out.push_str("<struct>");
            for (name, member) in members {
                let _ = write!(out, "<member><name>{}</name>", escape(name));
                encode_value(member, out);
                out.push_str("</member>");
            }
            out.push_str("</struct>");
        },
        Value::Array(items) => {
            out.push_str("<array><data>");
            for item in items {
                encode_value(item, out);
            }
            out.push_str("</data></array>");
        },
        Value::Nil => out.push_str("<nil/>"),
    }
    out.push_str("</value>");
}

/// Decode a `methodResponse` document.
pub fn decode_response(input: &str) -> Result<MethodResponse, CodecError> {
    let root = parse_tree(input)?;
    if root.name != "methodResponse" {
        return Err(invalid(format!("root element is <{}>", root.name)));
    }

    if let Some(fault) = root.child("fault") {
        let value = decode_value(fault.required("value")?)?;
        let code = value.int_member("faultCode")?;
        let code = i32::try_from(code).map_err(|_| CodecError::InvalidScalar {
            kind: "int",
            raw: code.to_string(),
        })?;
        let message = value.get("faultString").and_then(Value::as_str).unwrap_or_default();
        return Ok(MethodResponse::Fault { code, message: message.to_string() });
    }

    let param = root.required("params")?.required("param")?;
    Ok(MethodResponse::Success(decode_value(param.required("value")?)?))
}

/// Decode a `methodCall` document into its method name and parameters.
pub fn decode_call(input: &str) -> Result<(String, Vec<Value>), CodecError> {
    let root = parse_tree(input)?;
    if root.name != "methodCall" {
        return Err(invalid(format!("root element is <{}>", root.name)));
    }
    let method = root.required("methodName")?.text.trim().to_string();
    let params = match root.child("params") {
        Some(params) => params
            .children
            .iter()
            .filter(|c| c.name == "param")
            .map(|p| decode_value(p.required("value")?))
            .collect::<Result<Vec<_>, _>>()?,
        None => Vec::new(),
    };
    Ok((method, params))
}

fn decode_value(element: &Element) -> Result<Value, CodecError> {
    let Some(typed) = element.children.first() else {
        // Untyped <value> defaults to string.
        return Ok(Value::String(element.text.clone()));
    };

    let text = typed.text.as_str();
    match typed.name.as_str() {
        "string" => Ok(Value::String(text.to_string())),
        "int" | "i4" | "i8" => text
            .trim()
            .parse()
            .map(Value::Int)
            .map_err(|_| CodecError::InvalidScalar { kind: "int", raw: text.to_string() }),
        "boolean" => match text.trim() {
            "1" | "true" => Ok(Value::Bool(true)),
            "0" | "false" => Ok(Value::Bool(false)),
            _ => Err(CodecError::InvalidScalar { kind: "boolean", raw: text.to_string() }),
        },
        "double" => text
            .trim()
            .parse()
            .map(Value::Double)
            .map_err(|_| CodecError::InvalidScalar { kind: "double", raw: text.to_string() }),
        "dateTime.iso8601" => Ok(Value::DateTime(text.trim().to_string())),
        "base64" => {
            let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
            STANDARD
                .decode(compact)
                .map(Value::Base64)
                .map_err(|_| CodecError::InvalidScalar { kind: "base64", raw: text.to_string() })
        },
        "nil" => Ok(Value::Nil),
        "struct" => {
            let mut members = BTreeMap::new();
            for member in typed.children.iter().filter(|c| c.name == "member") {
                let name = member.required("name")?.text.clone();
                let value = decode_value(member.required("value")?)?;
                members.insert(name, value);
            }
            Ok(Value::Struct(members))
        },
        "array" => {
            let data = typed.required("data")?;
            let items = data
                .children
                .iter()
                .filter(|c| c.name == "value")
                .map(decode_value)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Value::Array(items))
        },
        other => Err(invalid(format!("unknown value type <{other}>"))),
    }
}

fn invalid(reason: String) -> CodecError {
    CodecError::InvalidResponse { reason }
}

/// Minimal element tree. Attributes are irrelevant to XML-RPC and dropped.
#[derive(Debug)]
struct Element {
    name: String,
    children: Vec<Element>,
    text: String,
}

impl Element {
    fn new(start: &BytesStart<'_>) -> Self {
        let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
        Self { name, children: Vec::new(), text: String::new() }
    }

    fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    fn required(&self, name: &str) -> Result<&Element, CodecError> {
        self.child(name).ok_or_else(|| invalid(format!("<{}> without <{name}>", self.name)))
    }
}

fn parse_tree(input: &str) -> Result<Element, CodecError> {
    let mut reader = Reader::from_str(input);
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event()? {
            Event::Start(start) => {
                if stack.len() >= MAX_DEPTH {
                    return Err(invalid(format!("nesting deeper than {MAX_DEPTH}")));
                }
                stack.push(Element::new(&start));
            },
            Event::Empty(start) => attach(&mut stack, &mut root, Element::new(&start))?,
            Event::End(_) => {
                let element = stack.pop().ok_or_else(|| invalid("unbalanced end tag".into()))?;
                attach(&mut stack, &mut root, element)?;
            },
            Event::Text(text) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&text.unescape()?);
                }
            },
            Event::CData(data) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            },
            Event::Eof => break,
            Event::Decl(_) | Event::Comment(_) | Event::PI(_) | Event::DocType(_) => {},
        }
    }

    if !stack.is_empty() {
        return Err(invalid("unclosed element".into()));
    }
    root.ok_or_else(|| invalid("empty document".into()))
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
) -> Result<(), CodecError> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_none() => *root = Some(element),
        None => return Err(invalid("multiple root elements".into())),
    }
    Ok(())
}
