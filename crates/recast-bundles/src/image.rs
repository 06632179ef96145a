//! Container image references
//!
//! `image` composes `registry/project/name:tag` (or `name@sha256:id`) from
//! its parts. Writing it sets only the parts the reference carries.

use recast_model::{Access, Attribute, Bundle, Outcome, Record, Result, ValidationError, Value};

/// Composite image attribute
pub const IMAGE: &str = "image";

const DIGEST_MARKER: &str = "@sha256";

/// Parsed image reference
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageRef {
    /// Registry host, `registry.example.com:5000`
    pub registry: Option<String>,
    /// Project or namespace
    pub project: Option<String>,
    /// Repository name
    pub name: Option<String>,
    /// Tag, unset when pinned by digest
    pub tag: Option<String>,
    /// sha256 digest
    pub id: Option<String>,
}

fn non_empty(part: &str) -> Option<String> {
    (!part.is_empty()).then(|| part.to_string())
}

impl ImageRef {
    /// Parse a reference with up to three `/`-separated segments
    ///
    /// # Errors
    /// Returns error for more than three segments or more than one `:` in
    /// the last one
    pub fn parse(reference: &str) -> Result<Self, ValidationError> {
        let segments: Vec<&str> = reference.split('/').collect();
        let (registry, project, nametag) = match segments.as_slice() {
            [nametag] => ("", "", *nametag),
            [project, nametag] => ("", *project, *nametag),
            [registry, project, nametag] => (*registry, *project, *nametag),
            _ => return Err(ValidationError::new(IMAGE, format!("too many segments: {reference}"))),
        };

        let (name, tag) = match nametag.split(':').collect::<Vec<_>>().as_slice() {
            [name] => (*name, ""),
            [name, tag] => (*name, *tag),
            _ => return Err(ValidationError::new(IMAGE, format!("bad name or tag: {nametag}"))),
        };

        let (name, tag, id) = match name.strip_suffix(DIGEST_MARKER) {
            Some(name) => (name, "", tag),
            None => (name, tag, ""),
        };

        Ok(Self {
            registry: non_empty(registry),
            project: non_empty(project),
            name: non_empty(name),
            tag: non_empty(tag),
            id: non_empty(id),
        })
    }

    /// Render the reference; a digest wins over a tag
    #[must_use]
    pub fn render(&self) -> String {
        let mut image = self.name.clone().unwrap_or_default();
        if let Some(id) = &self.id {
            image = format!("{image}{DIGEST_MARKER}:{id}");
        } else if let Some(tag) = &self.tag {
            image = format!("{image}:{tag}");
        }
        if let Some(project) = &self.project {
            image = format!("{project}/{image}");
        }
        if let Some(registry) = &self.registry {
            image = format!("{registry}/{image}");
        }
        image
    }

    fn from_record(record: &Record) -> Result<Self> {
        let part = |name: &str| -> Result<Option<String>> {
            Ok(match record.get(name)? {
                Value::None => None,
                Value::Str(s) => non_empty(&s),
                other => Some(other.to_string()),
            })
        };
        Ok(Self {
            registry: part("image_registry")?,
            project: part("image_project")?,
            name: part("image_name")?,
            tag: part("image_tag")?,
            id: part("image_id")?,
        })
    }
}

fn assign_image(record: &mut Record, value: Value) -> Result<()> {
    let reference = match value {
        Value::None => return Ok(()),
        Value::Str(s) if s.is_empty() => return Ok(()),
        Value::Str(s) => s,
        other => other.to_string(),
    };

    let parsed = ImageRef::parse(&reference)?;
    let updates = [
        ("image_registry", parsed.registry),
        ("image_project", parsed.project),
        ("image_name", parsed.name),
        ("image_tag", parsed.tag),
        ("image_id", parsed.id),
    ];
    for (name, part) in updates {
        if let Some(part) = part {
            record.set(name, part)?;
        }
    }
    Ok(())
}

fn image_attribute() -> Attribute<Record> {
    Attribute::<Record>::computed(IMAGE, |access| match access {
        Access::Owner => Ok(Outcome::new(Value::None)),
        Access::Instance(record) => Ok(Outcome::new(ImageRef::from_record(record)?.render())),
    })
    .with_writer(assign_image)
}

/// `image` composite plus its parts and `command`
#[must_use]
pub fn with_image() -> Bundle {
    Bundle::new("WithImage")
        .field_with(image_attribute(), "")
        .field("image_id", Value::None)
        .field("image_registry", Value::None)
        .field("image_project", Value::None)
        .field("image_name", Value::None)
        .field("image_tag", Value::None)
        .field("command", Value::None)
        .compact([IMAGE])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_reference() {
        let image = ImageRef::parse("registry.local:5000/team/app:1.2").unwrap();
        assert_eq!(image.registry.as_deref(), Some("registry.local:5000"));
        assert_eq!(image.project.as_deref(), Some("team"));
        assert_eq!(image.name.as_deref(), Some("app"));
        assert_eq!(image.tag.as_deref(), Some("1.2"));
        assert_eq!(image.id, None);
        assert_eq!(image.render(), "registry.local:5000/team/app:1.2");
    }

    #[test]
    fn parse_digest_reference() {
        let image = ImageRef::parse("app@sha256:abc123").unwrap();
        assert_eq!(image.name.as_deref(), Some("app"));
        assert_eq!(image.id.as_deref(), Some("abc123"));
        assert_eq!(image.tag, None);
        assert_eq!(image.render(), "app@sha256:abc123");
    }

    #[test]
    fn parse_bare_name() {
        let image = ImageRef::parse("redis").unwrap();
        assert_eq!(image.name.as_deref(), Some("redis"));
        assert_eq!(image.project, None);
        assert_eq!(image.render(), "redis");
    }

    #[test]
    fn parse_rejects_malformed() {
        assert!(ImageRef::parse("a/b/c/d").is_err());
        assert!(ImageRef::parse("a:b:c").is_err());
    }

    #[test]
    fn digest_wins_over_tag() {
        let image = ImageRef {
            name: Some("app".into()),
            tag: Some("latest".into()),
            id: Some("ff".into()),
            ..ImageRef::default()
        };
        assert_eq!(image.render(), "app@sha256:ff");
    }
}
