//! Symbolic paragraph style roles and their resolution against a document.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A paragraph role the normalizer assigns a style for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StyleRole {
    /// Default body text.
    Body,
    /// First-level heading.
    HeadingMajor,
    /// Second-level heading.
    HeadingMinor,
    /// Bulleted list item.
    BulletList,
    /// Numbered list item.
    NumberList,
}

impl StyleRole {
    /// Every role, in resolution order.
    pub const ALL: [StyleRole; 5] = [
        Self::Body,
        Self::HeadingMajor,
        Self::HeadingMinor,
        Self::BulletList,
        Self::NumberList,
    ];

    /// Display name of the built-in style for this role.
    pub fn style_name(self) -> &'static str {
        match self {
            Self::Body => "Normal",
            Self::HeadingMajor => "Heading 1",
            Self::HeadingMinor => "Heading 2",
            Self::BulletList => "List Bullet",
            Self::NumberList => "List Number",
        }
    }
}

impl fmt::Display for StyleRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Body => "body",
            Self::HeadingMajor => "major heading",
            Self::HeadingMinor => "minor heading",
            Self::BulletList => "bulleted list",
            Self::NumberList => "numbered list",
        };
        f.write_str(label)
    }
}

/// Style identifiers the document defines for each role.
///
/// A role may be unresolved; that is only an error once a paragraph needs it
/// (see [`StyleMap::require`]).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleMap {
    body: Option<String>,
    heading_major: Option<String>,
    heading_minor: Option<String>,
    bullet_list: Option<String>,
    number_list: Option<String>,
}

impl StyleMap {
    /// Resolve every role through `lookup`, which maps a style name to the
    /// identifier the document uses for it.
    pub fn resolve<F>(mut lookup: F) -> Self
    where
        F: FnMut(&str) -> Option<String>,
    {
        let mut find = |role: StyleRole| lookup(role.style_name());

        let map = Self {
            body: find(StyleRole::Body),
            heading_major: find(StyleRole::HeadingMajor),
            heading_minor: find(StyleRole::HeadingMinor),
            bullet_list: find(StyleRole::BulletList),
            number_list: find(StyleRole::NumberList),
        };
        log::debug!("Resolved styles: {:?}", map);
        map
    }

    /// Style identifier for a role, if the document defines one.
    pub fn id(&self, role: StyleRole) -> Option<&str> {
        let id = match role {
            StyleRole::Body => &self.body,
            StyleRole::HeadingMajor => &self.heading_major,
            StyleRole::HeadingMinor => &self.heading_minor,
            StyleRole::BulletList => &self.bullet_list,
            StyleRole::NumberList => &self.number_list,
        };
        id.as_deref()
    }

    /// Style identifier for a role a paragraph is about to be given.
    ///
    /// Fails with [`Error::StyleMissing`] when the document does not define it.
    pub fn require(&self, role: StyleRole) -> Result<&str> {
        self.id(role).ok_or(Error::StyleMissing {
            role,
            name: role.style_name(),
        })
    }

    /// The role whose identifier is `id`, if any.
    pub fn role_of(&self, id: &str) -> Option<StyleRole> {
        StyleRole::ALL.into_iter().find(|&role| self.id(role) == Some(id))
    }
}
