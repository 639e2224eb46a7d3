use alloc::borrow::Cow;
use alloc::collections::BTreeSet;
use alloc::vec::Vec;

/// Lists this long are checked for duplicates with a set instead of pairwise.
const PAIRWISE_LIMIT: usize = 16;

/// One `name="value"` pair of a start tag, with references already resolved.
#[derive(Debug, Clone)]
pub struct Attribute<'a> {
    pub name: &'a str,
    pub value: Cow<'a, str>,
    /// Offset of the name from the `<` of its tag.
    pub(crate) offset: usize,
}

impl PartialEq for Attribute<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.value == other.value
    }
}

impl Eq for Attribute<'_> {}

/// The attributes of one start tag, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes<'a> {
    list: Vec<Attribute<'a>>,
}

impl<'a> Attributes<'a> {
    pub fn new() -> Self {
        Attributes { list: Vec::new() }
    }

    pub(crate) fn push(&mut self, name: &'a str, value: Cow<'a, str>, offset: usize) {
        self.list.push(Attribute { name, value, offset });
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn as_slice(&self) -> &[Attribute<'a>] {
        &self.list
    }

    /// Iterates `(name, value)` pairs in document order.
    /// ```
    /// # use push_xml::Attributes;
    /// let attrs: Attributes = [("foo", "bar"), ("baz", "qux")].into_iter().collect();
    /// let mut iter = attrs.iter();
    /// assert_eq!(iter.next(), Some(("foo", "bar")));
    /// assert_eq!(iter.next(), Some(("baz", "qux")));
    /// assert_eq!(iter.next(), None);
    /// ```
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.list.iter().map(|a| (a.name, a.value.as_ref()))
    }

    /// Looks up a value by attribute name. Names are case-sensitive.
    /// ```
    /// # use push_xml::Attributes;
    /// let attrs: Attributes = [("foo", "bar"), ("baz", "qux")].into_iter().collect();
    /// assert_eq!(attrs.get("foo"), Some("bar"));
    /// assert_eq!(attrs.get("Foo"), None);
    /// assert_eq!(attrs.get("nonexistent"), None);
    /// ```
    pub fn get(&self, name: &str) -> Option<&str> {
        self.list
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_ref())
    }

    /// The first attribute whose name already appeared earlier in the list.
    pub(crate) fn find_duplicate(&self) -> Option<&Attribute<'a>> {
        if self.list.len() <= PAIRWISE_LIMIT {
            return self
                .list
                .iter()
                .enumerate()
                .find(|(i, a)| self.list[..*i].iter().any(|b| b.name == a.name))
                .map(|(_, a)| a);
        }
        let mut seen = BTreeSet::new();
        self.list.iter().find(|a| !seen.insert(a.name))
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for Attributes<'a> {
    fn from_iter<I: IntoIterator<Item = (&'a str, &'a str)>>(iter: I) -> Self {
        let list = iter
            .into_iter()
            .map(|(name, value)| Attribute {
                name,
                value: Cow::Borrowed(value),
                offset: 0,
            })
            .collect();
        Attributes { list }
    }
}

impl<'a, 'b> IntoIterator for &'b Attributes<'a> {
    type Item = &'b Attribute<'a>;
    type IntoIter = core::slice::Iter<'b, Attribute<'a>>;

    fn into_iter(self) -> Self::IntoIter {
        self.list.iter()
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use std::format;

    #[test]
    fn duplicates_pairwise() {
        let attrs: Attributes = [("a", "1"), ("b", "2"), ("a", "3")].into_iter().collect();
        assert_eq!(attrs.find_duplicate().map(|a| a.value.as_ref()), Some("3"));
        let attrs: Attributes = [("a", "1"), ("b", "2")].into_iter().collect();
        assert!(attrs.find_duplicate().is_none());
    }

    #[test]
    fn duplicates_with_set() {
        let names: Vec<_> = (0..40).map(|i| format!("n{i}")).collect();
        let mut attrs: Attributes = names.iter().map(|n| (n.as_str(), "")).collect();
        assert!(attrs.find_duplicate().is_none());
        attrs.push("n7", Cow::Borrowed("again"), 99);
        let dup = attrs.find_duplicate().unwrap();
        assert_eq!((dup.name, dup.offset), ("n7", 99));
    }
}
