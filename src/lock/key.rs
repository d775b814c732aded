//! 锁键组合与序列化。

use std::fmt;

use crate::config::{DEFAULT_SUB_KEY, LOCK_NAMESPACE};

const SEPARATOR: char = ':';
const ESCAPE: char = '\\';

/// 由 `(resource_key, sub_key)` 组成的锁标识。
///
/// 序列化为 `RLOCK:{resource}:{sub_key}`，分隔符与转义符在组件内以反斜杠转义，
/// 不同的组合不会映射到同一个存储键，[`LockKey::parse`] 可还原两部分。
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct LockKey {
    resource: String,
    sub_key: String,
}

impl LockKey {
    /// 使用默认子键构造。
    pub fn new(resource: impl Into<String>) -> Self {
        Self::with_sub_key(resource, DEFAULT_SUB_KEY)
    }

    pub fn with_sub_key(resource: impl Into<String>, sub_key: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            sub_key: sub_key.into(),
        }
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn sub_key(&self) -> &str {
        &self.sub_key
    }

    pub fn storage_key(&self) -> String {
        let mut key = namespace_prefix();
        push_escaped(&mut key, &self.resource);
        key.push(SEPARATOR);
        push_escaped(&mut key, &self.sub_key);
        key
    }

    /// 从存储键还原；不属于锁命名空间或格式不符时返回 None。
    pub fn parse(storage_key: &str) -> Option<Self> {
        let body = storage_key.strip_prefix(&namespace_prefix())?;
        let mut parts = Vec::with_capacity(2);
        let mut current = String::new();
        let mut chars = body.chars();
        while let Some(ch) = chars.next() {
            match ch {
                ESCAPE => current.push(chars.next()?),
                SEPARATOR => parts.push(std::mem::take(&mut current)),
                _ => current.push(ch),
            }
        }
        parts.push(current);

        let [resource, sub_key]: [String; 2] = parts.try_into().ok()?;
        Some(Self { resource, sub_key })
    }
}

impl fmt::Display for LockKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.resource, self.sub_key)
    }
}

/// 锁命名空间前缀（`RLOCK:`），批量清理按此扫描。
pub fn namespace_prefix() -> String {
    format!("{LOCK_NAMESPACE}{SEPARATOR}")
}

fn push_escaped(target: &mut String, component: &str) {
    for ch in component.chars() {
        if ch == SEPARATOR || ch == ESCAPE {
            target.push(ESCAPE);
        }
        target.push(ch);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_keys_keep_legacy_layout() {
        assert_eq!(LockKey::new("geid-1").storage_key(), "RLOCK:geid-1:default");
        assert_eq!(
            LockKey::with_sub_key("project/a/file.txt", "copy").storage_key(),
            "RLOCK:project/a/file.txt:copy"
        );
    }

    #[test]
    fn separators_inside_components_do_not_collide() {
        let left = LockKey::with_sub_key("a:b", "c");
        let right = LockKey::with_sub_key("a", "b:c");
        assert_ne!(left.storage_key(), right.storage_key());
        assert_eq!(left.storage_key(), "RLOCK:a\\:b:c");
        assert_eq!(right.storage_key(), "RLOCK:a:b\\:c");
    }

    #[test]
    fn parse_recovers_components() {
        for key in [
            LockKey::new("simple"),
            LockKey::with_sub_key("a:b", "c"),
            LockKey::with_sub_key("back\\slash:", ":"),
            LockKey::with_sub_key("", ""),
        ] {
            assert_eq!(LockKey::parse(&key.storage_key()), Some(key));
        }
    }

    #[test]
    fn parse_rejects_foreign_keys() {
        assert_eq!(LockKey::parse("OTHER:a:default"), None);
        assert_eq!(LockKey::parse("RLOCK:only-resource"), None);
        assert_eq!(LockKey::parse("RLOCK:a:b:c"), None);
        assert_eq!(LockKey::parse("RLOCK:dangling\\"), None);
    }
}
