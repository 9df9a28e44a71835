use std::collections::HashMap;

/// Structural role of a tag. Everything the break logic needs to know
/// about an element is derived from this plus its inline style.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TagCategory {
    Block,
    Heading,
    HeadingGroup,
    Preformatted,
    List,
    ListItem,
    TableCell,
    /// Character styling that is carried over into freshly created blocks.
    Formatting,
    Inline,
    /// Elements that count as content even without children (images, rules).
    Content,
    Break,
}

impl TagCategory {
    pub fn is_block(self) -> bool {
        matches!(
            self,
            TagCategory::Block
                | TagCategory::Heading
                | TagCategory::HeadingGroup
                | TagCategory::Preformatted
                | TagCategory::List
                | TagCategory::ListItem
                | TagCategory::TableCell
        )
    }
}

const HTML_TABLE: &[(&str, TagCategory)] = &[
    ("address", TagCategory::Block),
    ("article", TagCategory::Block),
    ("aside", TagCategory::Block),
    ("blockquote", TagCategory::Block),
    ("center", TagCategory::Block),
    ("dd", TagCategory::Block),
    ("details", TagCategory::Block),
    ("dir", TagCategory::Block),
    ("div", TagCategory::Block),
    ("dl", TagCategory::Block),
    ("dt", TagCategory::Block),
    ("fieldset", TagCategory::Block),
    ("figcaption", TagCategory::Block),
    ("figure", TagCategory::Block),
    ("footer", TagCategory::Block),
    ("form", TagCategory::Block),
    ("header", TagCategory::Block),
    ("main", TagCategory::Block),
    ("menu", TagCategory::Block),
    ("nav", TagCategory::Block),
    ("noscript", TagCategory::Block),
    ("p", TagCategory::Block),
    ("section", TagCategory::Block),
    ("summary", TagCategory::Block),
    ("table", TagCategory::Block),
    ("tbody", TagCategory::Block),
    ("tfoot", TagCategory::Block),
    ("thead", TagCategory::Block),
    ("tr", TagCategory::Block),
    ("h1", TagCategory::Heading),
    ("h2", TagCategory::Heading),
    ("h3", TagCategory::Heading),
    ("h4", TagCategory::Heading),
    ("h5", TagCategory::Heading),
    ("h6", TagCategory::Heading),
    ("hgroup", TagCategory::HeadingGroup),
    ("pre", TagCategory::Preformatted),
    ("ol", TagCategory::List),
    ("ul", TagCategory::List),
    ("li", TagCategory::ListItem),
    ("caption", TagCategory::TableCell),
    ("td", TagCategory::TableCell),
    ("th", TagCategory::TableCell),
    ("b", TagCategory::Formatting),
    ("em", TagCategory::Formatting),
    ("font", TagCategory::Formatting),
    ("i", TagCategory::Formatting),
    ("s", TagCategory::Formatting),
    ("span", TagCategory::Formatting),
    ("strike", TagCategory::Formatting),
    ("strong", TagCategory::Formatting),
    ("u", TagCategory::Formatting),
    ("audio", TagCategory::Content),
    ("embed", TagCategory::Content),
    ("hr", TagCategory::Content),
    ("iframe", TagCategory::Content),
    ("img", TagCategory::Content),
    ("input", TagCategory::Content),
    ("object", TagCategory::Content),
    ("select", TagCategory::Content),
    ("textarea", TagCategory::Content),
    ("video", TagCategory::Content),
    ("br", TagCategory::Break),
];

/// Lookup table from tag name to [`TagCategory`]. Unknown tags are inline.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TagTable {
    categories: HashMap<String, TagCategory>,
}

impl TagTable {
    pub fn empty() -> Self {
        Self {
            categories: HashMap::new(),
        }
    }

    pub fn html() -> Self {
        let mut table = Self::empty();
        for (tag, category) in HTML_TABLE {
            table.insert(tag, *category);
        }
        table
    }

    pub fn with(mut self, tag: &str, category: TagCategory) -> Self {
        self.insert(tag, category);
        self
    }

    pub fn insert(&mut self, tag: &str, category: TagCategory) {
        self.categories.insert(tag.to_ascii_lowercase(), category);
    }

    pub fn category(&self, tag: &str) -> TagCategory {
        if let Some(category) = self.categories.get(tag) {
            return *category;
        }
        self.categories
            .get(&tag.to_ascii_lowercase())
            .copied()
            .unwrap_or(TagCategory::Inline)
    }

    pub fn is_block(&self, tag: &str) -> bool {
        self.category(tag).is_block()
    }
}

impl Default for TagTable {
    fn default() -> Self {
        Self::html()
    }
}
