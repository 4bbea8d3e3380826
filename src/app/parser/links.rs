//! Outbound link annotations on records
//!
//! Links are a presentation concern. Parsers never produce them; callers
//! attach them after parsing through a builder.

use serde::{Deserialize, Serialize};

/// A related resource for a record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub rel: String,
    pub href: String,
}

impl Link {
    pub fn new(rel: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            rel: rel.into(),
            href: href.into(),
        }
    }
}

/// Records that carry link annotations
pub trait HasLinks {
    fn links(&self) -> &[Link];
    fn links_mut(&mut self) -> &mut Vec<Link>;
}

/// Append the builder's links to every record
pub fn apply_links<T, F>(records: &mut [T], builder: F)
where
    T: HasLinks,
    F: Fn(&T) -> Vec<Link>,
{
    for record in records.iter_mut() {
        let links = builder(record);
        record.links_mut().extend(links);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Item {
        id: u32,
        links: Vec<Link>,
    }

    impl HasLinks for Item {
        fn links(&self) -> &[Link] {
            &self.links
        }

        fn links_mut(&mut self) -> &mut Vec<Link> {
            &mut self.links
        }
    }

    #[test]
    fn test_apply_links() {
        let mut items = vec![
            Item {
                id: 1,
                links: Vec::new(),
            },
            Item {
                id: 2,
                links: vec![Link::new("existing", "/x")],
            },
        ];

        apply_links(&mut items, |item| {
            vec![Link::new("self", format!("/members/{}", item.id))]
        });

        assert_eq!(items[0].links(), &[Link::new("self", "/members/1")]);
        assert_eq!(items[1].links().len(), 2);
        assert_eq!(items[1].links()[1].href, "/members/2");
    }
}
