//! Access control list threaded through lazy resolution
//!
//! An item grants `act` on `obj`. Objects keep a `/` hierarchy such as
//! `Order/key/A1`; `*` matches a whole segment run and may appear once.

use crate::error::{DocResult, DocumentError};
use serde::{Deserialize, Serialize};

/// Maximum number of concrete items a single templated item may expand to
pub const ITEM_FILL_LIMIT: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AclItem {
    pub obj: String,
    pub act: String,
}

impl AclItem {
    pub fn new(obj: impl Into<String>, act: impl AsRef<str>) -> Self {
        let act = act.as_ref().split(',').map(str::trim).collect::<Vec<_>>().join(",");
        Self { obj: obj.into(), act }
    }

    /// Design-time checks removing obvious mistakes
    pub fn validate(&self) -> DocResult<()> {
        if self.obj.matches('*').count() > 1 || self.act.matches('*').count() > 1 {
            return Err(DocumentError::Acl(
                "Can not have more than 2 wildcard in obj or act".to_string(),
            ));
        }
        let segments: Vec<&str> = self.obj.split('/').collect();
        if segments.len() == 2 && !self.obj.ends_with("/*") {
            return Err(DocumentError::Acl(
                "obj/* is the only allowed pattern when no value is given".to_string(),
            ));
        }
        if segments.len() == 3 && self.obj.ends_with("/*") {
            return Err(DocumentError::Acl(
                "obj/key_set/* is the same as obj/*, please use obj/* instead".to_string(),
            ));
        }
        if self.obj.contains('*') && !segments.contains(&"*") {
            return Err(DocumentError::Acl(
                "wildcard * could only replace whole value".to_string(),
            ));
        }
        for segment in &segments {
            if let Some(name) = variable_name(segment) {
                if name.contains('*') {
                    return Err(DocumentError::Acl(
                        "wildcard * cannot present in variable name".to_string(),
                    ));
                }
            }
        }
        for act in self.act.split(',') {
            if act.contains('*') && !act.trim().ends_with('*') {
                return Err(DocumentError::Acl("act only supports wildcard at the end".to_string()));
            }
        }
        Ok(())
    }

    /// Match `key` against `pattern`, `*` allowed at start, end or middle
    pub fn key_match(key: &str, pattern: &str) -> bool {
        if pattern == "*" {
            return true;
        }
        match pattern.split_once('*') {
            None => key == pattern,
            Some(("", suffix)) => key.ends_with(suffix),
            Some((prefix, "")) => key.starts_with(prefix),
            Some((prefix, suffix)) => {
                key.len() >= prefix.len() + suffix.len()
                    && key.starts_with(prefix)
                    && key.ends_with(suffix)
            }
        }
    }

    /// Match an action against a comma separated action list
    pub fn act_match(act: &str, pattern: &str) -> bool {
        pattern.split(',').any(|p| Self::key_match(act, p.trim()))
    }

    pub fn acl_match(&self, obj: &str, act: &str) -> bool {
        Self::key_match(obj, &self.obj) && Self::act_match(act, &self.act)
    }

    /// Expand `{variable}` segments from a user profile.
    ///
    /// A variable missing from the profile yields no item at all.
    pub fn fill(&self, profile: &serde_json::Map<String, serde_json::Value>) -> DocResult<Vec<AclItem>> {
        let mut choices: Vec<Vec<String>> = Vec::new();
        for segment in self.obj.split('/') {
            match variable_name(segment) {
                Some(name) => match profile.get(name) {
                    None => return Ok(Vec::new()),
                    Some(serde_json::Value::Array(values)) => {
                        choices.push(values.iter().map(crate::value::query_text).collect())
                    }
                    Some(value) => choices.push(vec![crate::value::query_text(value)]),
                },
                None => choices.push(vec![segment.to_string()]),
            }
        }
        let total: usize = choices.iter().map(Vec::len).product();
        if total > ITEM_FILL_LIMIT {
            return Err(DocumentError::Acl(format!(
                "Single dynamic ACL item can't be filled more than {ITEM_FILL_LIMIT} entries"
            )));
        }
        let mut objs = vec![Vec::<String>::new()];
        for options in choices {
            objs = objs
                .into_iter()
                .flat_map(|prefix| {
                    options.iter().map(move |option| {
                        let mut next = prefix.clone();
                        next.push(option.clone());
                        next
                    })
                })
                .collect();
        }
        Ok(objs.into_iter().map(|parts| AclItem::new(parts.join("/"), &self.act)).collect())
    }
}

fn variable_name(segment: &str) -> Option<&str> {
    segment.strip_prefix('{').and_then(|s| s.strip_suffix('}'))
}

/// Access control list of a caller
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Acl {
    pub content: Vec<AclItem>,
}

impl Acl {
    pub fn new(content: Vec<AclItem>) -> Self {
        Self { content }
    }

    /// Allow everything
    pub fn root() -> Self {
        Self { content: vec![AclItem::new("*", "*")] }
    }

    pub fn allows(&self, obj: &str, act: &str) -> bool {
        self.content.iter().any(|item| item.acl_match(obj, act))
    }

    pub fn validate(&self) -> DocResult<()> {
        self.content.iter().try_for_each(AclItem::validate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn wildcard_positions() {
        assert!(AclItem::key_match("Order/key/A1", "*"));
        assert!(AclItem::key_match("Order/key/A1", "Order/*"));
        assert!(AclItem::key_match("Order/key/A1", "*/A1"));
        assert!(AclItem::key_match("Order/key/A1", "Order/*/A1"));
        assert!(!AclItem::key_match("Order/key/A1", "Order/*/B2"));
        assert!(!AclItem::key_match("Order", "Customer"));
    }

    #[test]
    fn act_list_is_trimmed() {
        let item = AclItem::new("Order/*", "read, write");
        assert_eq!(item.act, "read,write");
        assert!(item.acl_match("Order/key/A1", "write"));
        assert!(!item.acl_match("Order/key/A1", "delete"));
        assert!(AclItem::new("Order/*", "action/*").acl_match("Order/x", "action/refund"));
    }

    #[test]
    fn design_time_rules() {
        assert!(AclItem::new("Order/*", "read").validate().is_ok());
        assert!(AclItem::new("Order/key", "read").validate().is_err());
        assert!(AclItem::new("Order/key/*", "read").validate().is_err());
        assert!(AclItem::new("Order/key/A*", "read").validate().is_err());
        assert!(AclItem::new("Order/*", "*read").validate().is_err());
        assert!(AclItem::new("Order/key/{user*}", "read").validate().is_err());
    }

    #[test]
    fn fill_expands_profile_variables() {
        let item = AclItem::new("Order/key/{tenant}/{user}", "read");
        let profile = json!({"tenant": ["t1", "t2"], "user": "bob"});
        let filled = item.fill(profile.as_object().unwrap()).unwrap();
        let objs: Vec<&str> = filled.iter().map(|i| i.obj.as_str()).collect();
        assert_eq!(objs, vec!["Order/key/t1/bob", "Order/key/t2/bob"]);

        let missing = item.fill(json!({"tenant": "t1"}).as_object().unwrap()).unwrap();
        assert!(missing.is_empty());
    }

    #[test]
    fn acl_allows_any_matching_item() {
        let acl = Acl::new(vec![AclItem::new("Customer/*", "read"), AclItem::new("Order/*", "*")]);
        assert!(acl.allows("Order/key/A1", "delete"));
        assert!(acl.allows("Customer/key/C1", "read"));
        assert!(!acl.allows("Customer/key/C1", "write"));
        assert!(Acl::root().allows("Anything", "at_all"));
    }
}
