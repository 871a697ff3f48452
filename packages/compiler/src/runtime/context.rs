//! Render Scopes
//!
//! A render context plus the aliases introduced by enclosing iteration
//! regions. Frames borrow their values, so entering an iteration element never
//! copies the surrounding context.

use super::value::Value;

#[derive(Debug, Clone, Copy)]
enum Frame<'a> {
    Root(&'a Value),
    Alias { name: &'a str, value: &'a Value },
    /// Fields of an object element visible as top-level names.
    Overlay(&'a Value),
}

#[derive(Debug, Clone, Copy)]
pub struct Scope<'a> {
    frame: Frame<'a>,
    parent: Option<&'a Scope<'a>>,
}

impl<'a> Scope<'a> {
    pub fn new(context: &'a Value) -> Self {
        Scope {
            frame: Frame::Root(context),
            parent: None,
        }
    }

    /// Child scope in which `name` refers to `value`.
    pub fn with_alias<'b>(&'b self, name: &'b str, value: &'b Value) -> Scope<'b> {
        Scope {
            frame: Frame::Alias { name, value },
            parent: Some(self),
        }
    }

    /// Child scope exposing the fields of `value` (when it is an object).
    pub fn with_overlay<'b>(&'b self, value: &'b Value) -> Scope<'b> {
        Scope {
            frame: Frame::Overlay(value),
            parent: Some(self),
        }
    }

    fn lookup_head(&self, name: &str) -> Option<&'a Value> {
        let found = match self.frame {
            Frame::Root(value) | Frame::Overlay(value) => value.get(name),
            Frame::Alias { name: alias, value } => (alias == name).then_some(value),
        };
        match found {
            Some(value) => Some(value),
            None => self.parent.and_then(|parent| parent.lookup_head(name)),
        }
    }

    /// Resolve a dotted path. `None` when a segment is missing or the value
    /// reached so far cannot be indexed.
    pub fn resolve(&self, path: &str) -> Option<&'a Value> {
        let mut segments = path.split('.');
        let head = segments.next()?;
        let mut current = self.lookup_head(head)?;
        for segment in segments {
            current = current.get(segment)?;
        }
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn should_resolve_dotted_paths() {
        let context = Value::from(json!({"user": {"name": "Ann", "tags": ["a", "b"]}}));
        let scope = Scope::new(&context);
        assert_eq!(scope.resolve("user.name"), Some(&Value::from("Ann")));
        assert_eq!(scope.resolve("user.tags.1"), Some(&Value::from("b")));
        assert_eq!(scope.resolve("user.missing"), None);
        assert_eq!(scope.resolve("user.name.first"), None);
    }

    #[test]
    fn should_prefer_innermost_alias() {
        let context = Value::from(json!({"p": "outer", "q": 1}));
        let element = Value::from(json!({"foo": "inner"}));
        let scope = Scope::new(&context);
        let inner = scope.with_alias("p", &element);
        assert_eq!(inner.resolve("p.foo"), Some(&Value::from("inner")));
        assert_eq!(inner.resolve("q"), Some(&Value::from(1)));
        assert_eq!(scope.resolve("p"), Some(&Value::from("outer")));
    }

    #[test]
    fn should_overlay_object_fields() {
        let context = Value::from(json!({"title": "t", "foo": "outer"}));
        let element = Value::from(json!({"foo": "inner"}));
        let scope = Scope::new(&context);
        let inner = scope.with_overlay(&element);
        assert_eq!(inner.resolve("foo"), Some(&Value::from("inner")));
        assert_eq!(inner.resolve("title"), Some(&Value::from("t")));
    }
}
