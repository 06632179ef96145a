//! URL composite attributes
//!
//! `url` is a computed attribute over `scheme`, `username`, `password`,
//! `hostname`, `port`, `path`, `query` and `fragment`. Writing it only
//! touches the parts the new value actually carries, so `//other:80`
//! replaces the host and port and keeps everything else. Writing none
//! clears every part.

use std::borrow::Cow;

use indexmap::IndexMap;
use recast_model::{Access, Attribute, Bundle, Outcome, Record, Result, ValidationError, Value};
use serde_json::Value as JsonValue;
use tracing::trace;
use url::form_urlencoded;

/// Composite URL attribute
pub const URL: &str = "url";
/// Authority pseudo-attribute
pub const NETLOC: &str = "netloc";
/// Comma-separated host list pseudo-attribute
pub const HOSTNAMES: &str = "hostnames";
/// Path view for connection URLs
pub const DATABASE: &str = "database";

const NETLOC_PARTS: [&str; 4] = ["username", "password", "hostname", "port"];
const SPLIT_PARTS: [&str; 5] = ["scheme", NETLOC, "path", "query", "fragment"];

// Schemes whose URLs keep `//` even with an empty authority.
const NETLOC_SCHEMES: &[&str] = &[
    "", "file", "ftp", "git", "git+ssh", "http", "https", "imap", "nfs", "rsync", "rtsp", "sftp", "svn",
    "svn+ssh", "telnet", "ws", "wss",
];

/// URL split into its five top-level components
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlParts {
    /// Lower-cased scheme, empty when absent
    pub scheme: String,
    /// Authority, empty when absent
    pub netloc: String,
    /// Path
    pub path: String,
    /// Raw query string
    pub query: String,
    /// Fragment
    pub fragment: String,
}

impl UrlParts {
    /// Split without validating anything
    #[must_use]
    pub fn split(url: &str) -> Self {
        let mut parts = Self::default();
        let mut rest = url;

        if let Some(i) = rest.find(':') {
            let candidate = &rest[..i];
            let valid = candidate.starts_with(|c: char| c.is_ascii_alphabetic())
                && candidate
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
            if valid {
                parts.scheme = candidate.to_ascii_lowercase();
                rest = &rest[i + 1..];
            }
        }

        if let Some(after) = rest.strip_prefix("//") {
            let end = after.find(|c: char| matches!(c, '/' | '?' | '#')).unwrap_or(after.len());
            parts.netloc = after[..end].to_string();
            rest = &after[end..];
        }

        if let Some((before, fragment)) = rest.split_once('#') {
            parts.fragment = fragment.to_string();
            rest = before;
        }
        if let Some((before, query)) = rest.split_once('?') {
            parts.query = query.to_string();
            rest = before;
        }
        parts.path = rest.to_string();
        parts
    }

    /// Reassemble into a URL string
    #[must_use]
    pub fn unsplit(&self) -> String {
        let mut url = self.path.clone();
        let keeps_slashes = !self.scheme.is_empty()
            && NETLOC_SCHEMES.contains(&self.scheme.as_str())
            && !url.starts_with("//");
        if !self.netloc.is_empty() || keeps_slashes {
            if !url.is_empty() && !url.starts_with('/') {
                url.insert(0, '/');
            }
            url = format!("//{}{}", self.netloc, url);
        }
        if !self.scheme.is_empty() {
            url = format!("{}:{}", self.scheme, url);
        }
        if !self.query.is_empty() {
            url.push('?');
            url.push_str(&self.query);
        }
        if !self.fragment.is_empty() {
            url.push('#');
            url.push_str(&self.fragment);
        }
        url
    }
}

/// Authority split into credentials, host and port
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Netloc {
    /// Unquoted user name
    pub username: Option<String>,
    /// Unquoted password
    pub password: Option<String>,
    /// Lower-cased host, possibly a comma-separated list
    pub hostname: Option<String>,
    /// Port
    pub port: Option<u16>,
}

impl Netloc {
    /// Parse `user:pass@host:port`
    ///
    /// # Errors
    /// Returns error for a port that is not a number in `0..=65535`
    pub fn parse(netloc: &str) -> Result<Self, ValidationError> {
        let mut parsed = Self::default();
        let hostinfo = match netloc.rsplit_once('@') {
            Some((userinfo, hostinfo)) => {
                match userinfo.split_once(':') {
                    Some((user, pass)) => {
                        parsed.username = Some(unquote(user));
                        parsed.password = Some(unquote(pass));
                    }
                    None => parsed.username = Some(unquote(userinfo)),
                }
                hostinfo
            }
            None => netloc,
        };

        let (host, port) = match hostinfo.strip_prefix('[') {
            Some(bracketed) => match bracketed.split_once(']') {
                Some((host, rest)) => (host, rest.strip_prefix(':').unwrap_or_default()),
                None => (bracketed, ""),
            },
            None => hostinfo.split_once(':').unwrap_or((hostinfo, "")),
        };
        if !host.is_empty() {
            parsed.hostname = Some(host.to_lowercase());
        }
        if !port.is_empty() {
            let number = port
                .parse::<u16>()
                .map_err(|_| ValidationError::new("port", format!("port out of range: {port}")))?;
            parsed.port = Some(number);
        }
        Ok(parsed)
    }
}

fn unquote(text: &str) -> String {
    String::from_utf8_lossy(&urlencoding::decode_binary(text.as_bytes())).into_owned()
}

fn text(record: &Record, name: &str) -> Result<Option<String>> {
    Ok(match record.get(name)? {
        Value::None => None,
        Value::Str(s) if s.is_empty() => None,
        Value::Str(s) => Some(s),
        Value::Int(0) => None,
        other => Some(other.to_string()),
    })
}

fn json_typed(text: String) -> Value {
    match serde_json::from_str::<JsonValue>(&text) {
        Ok(json) => Value::from(json),
        Err(_) => Value::Str(text),
    }
}

/// Parse a query string, dropping blank values
#[must_use]
pub fn parse_query(query: &str) -> IndexMap<String, Value> {
    form_urlencoded::parse(query.as_bytes())
        .filter(|(_, value)| !value.is_empty())
        .map(|(key, value)| (key.into_owned(), json_typed(value.into_owned())))
        .collect()
}

/// Encode a query mapping; non-strings are rendered as JSON
///
/// # Errors
/// Returns error if a value cannot be rendered as JSON
pub fn encode_query(query: &IndexMap<String, Value>) -> Result<String> {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in query {
        let rendered: Cow<'_, str> = match value {
            Value::Str(s) => Cow::Borrowed(s.as_str()),
            other => Cow::Owned(
                serde_json::to_string(other).map_err(|e| ValidationError::new("query", e.to_string()))?,
            ),
        };
        serializer.append_pair(key, &rendered);
    }
    Ok(serializer.finish())
}

fn typed_query_value(value: Value) -> Value {
    match value {
        Value::Str(s) => json_typed(s),
        other => other,
    }
}

fn query_attribute() -> Attribute<Record> {
    Attribute::<Record>::validated("query", |assign| match assign.value {
        Value::None => Ok(Value::None),
        Value::Str(query) => Ok(Value::Map(parse_query(&query))),
        Value::Map(entries) => Ok(Value::Map(
            entries
                .into_iter()
                .map(|(key, value)| (key, typed_query_value(value)))
                .collect(),
        )),
        Value::List(pairs) => pairs
            .into_iter()
            .map(|pair| match pair.as_list() {
                Some([key, value]) => Ok((key.to_string(), typed_query_value(value.clone()))),
                _ => Err(ValidationError::mismatch("query", "key-value pair", &pair).into()),
            })
            .collect::<Result<IndexMap<_, _>>>()
            .map(Value::Map),
        other => Err(ValidationError::mismatch("query", "str, map or pairs", &other).into()),
    })
}

fn compose_netloc(record: &Record) -> Result<String> {
    let mut netloc = String::new();
    if let Some(username) = text(record, "username")? {
        netloc.push_str(&urlencoding::encode(&username));
    }
    if let Some(password) = text(record, "password")? {
        netloc.push(':');
        netloc.push_str(&urlencoding::encode(&password));
    }
    if let Some(hostname) = text(record, "hostname")? {
        if !netloc.is_empty() {
            netloc.push('@');
        }
        netloc.push_str(&hostname);
    }
    if let Some(port) = text(record, "port")? {
        netloc.push(':');
        netloc.push_str(&port);
    }
    Ok(netloc)
}

/// Compose the `url` of a record carrying the URL parts
///
/// # Errors
/// Propagates part read failures
pub fn compose_url(record: &Record) -> Result<String> {
    let query = match record.get("query")? {
        Value::Map(query) => encode_query(&query)?,
        Value::None => String::new(),
        other => other.to_string(),
    };
    let parts = UrlParts {
        scheme: text(record, "scheme")?.unwrap_or_default(),
        netloc: compose_netloc(record)?,
        path: text(record, "path")?.unwrap_or_default(),
        query,
        fragment: text(record, "fragment")?.unwrap_or_default(),
    };
    Ok(parts.unsplit())
}

fn assign_url(record: &mut Record, value: Value) -> Result<()> {
    let url = match value {
        Value::None => {
            for name in SPLIT_PARTS {
                record.set(name, Value::None)?;
            }
            return Ok(());
        }
        Value::Str(s) => s,
        other => other.to_string(),
    };

    trace!("assign url {}", url);
    let parts = UrlParts::split(&url);
    let updates = [
        ("scheme", parts.scheme),
        (NETLOC, parts.netloc),
        ("path", parts.path),
        ("query", parts.query),
        ("fragment", parts.fragment),
    ];
    for (name, part) in updates {
        if !part.is_empty() {
            record.set(name, part)?;
        }
    }
    Ok(())
}

fn assign_netloc(record: &mut Record, value: Value) -> Result<()> {
    let netloc = match value {
        Value::None => {
            for name in NETLOC_PARTS {
                record.set(name, Value::None)?;
            }
            return Ok(());
        }
        Value::Str(s) => s,
        other => other.to_string(),
    };

    let authority = UrlParts::split(&format!("//{netloc}")).netloc;
    let parsed = Netloc::parse(&authority)?;
    if let Some(username) = parsed.username {
        record.set("username", username)?;
    }
    if let Some(password) = parsed.password {
        record.set("password", password)?;
    }
    if let Some(hostname) = parsed.hostname {
        record.set("hostname", hostname)?;
    }
    if let Some(port) = parsed.port {
        record.set("port", port)?;
    }
    Ok(())
}

fn url_attribute() -> Attribute<Record> {
    Attribute::<Record>::computed(URL, |access| match access {
        Access::Owner => Ok(Outcome::new(Value::None)),
        Access::Instance(record) => Ok(Outcome::new(compose_url(record)?)),
    })
    .with_writer(assign_url)
}

fn netloc_attribute() -> Attribute<Record> {
    Attribute::<Record>::computed(NETLOC, |access| match access {
        Access::Owner => Ok(Outcome::new(Value::None)),
        Access::Instance(record) => Ok(Outcome::new(compose_netloc(record)?)),
    })
    .with_writer(assign_netloc)
}

fn hostnames_attribute() -> Attribute<Record> {
    Attribute::<Record>::computed(HOSTNAMES, |access| {
        let Access::Instance(record) = access else {
            return Ok(Outcome::new(Value::None));
        };
        Ok(Outcome::new(match text(record, "hostname")? {
            Some(hostname) => Value::List(hostname.split(',').map(Value::from).collect()),
            None => Value::None,
        }))
    })
    .with_writer(|record, value| {
        let hostname = match value {
            Value::List(hosts) => Value::from(
                hosts
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(","),
            ),
            other => other,
        };
        record.set("hostname", hostname)
    })
}

fn database_attribute() -> Attribute<Record> {
    Attribute::<Record>::computed(DATABASE, |access| {
        let Access::Instance(record) = access else {
            return Ok(Outcome::new(Value::None));
        };
        Ok(Outcome::new(match record.get("path")? {
            Value::Str(path) => Value::from(path.trim_matches('/')),
            other => other,
        }))
    })
    .with_writer(|record, value| {
        let path = match value {
            Value::None => Value::None,
            other => Value::from(format!("/{other}")),
        };
        record.set("path", path)
    })
}

fn url_bundle(name: &str) -> Bundle {
    Bundle::new(name)
        .field_with(url_attribute(), "")
        .field("scheme", Value::None)
        .field("username", Value::None)
        .field("password", Value::None)
        .field("hostname", Value::None)
        .field("port", Value::None)
        .field("path", Value::None)
        .field_with(query_attribute(), Value::None)
        .field("fragment", Value::None)
        .attribute(netloc_attribute())
        .attribute(hostnames_attribute())
        .compact([URL])
}

/// `url` composite plus its parts, `netloc` and `hostnames`
#[must_use]
pub fn with_url() -> Bundle {
    url_bundle("WithUrl")
}

/// [`with_url`] plus a `database` view of `path`
#[must_use]
pub fn with_connection_url() -> Bundle {
    url_bundle("WithConnectionUrl").attribute(database_attribute())
}
