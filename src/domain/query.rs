//! Listing query state and its shareable location form.
//!
//! [`QueryState`] is the single source of truth for which posts are shown.
//! It is never stored on its own: [`PostQuery`] derives it from the current
//! entry of a navigation [`History`], so back/forward/reload always reproduce
//! the exact listing a location names.

use std::fmt;
use std::num::NonZeroU32;

use url::form_urlencoded;

pub const POSTS_PATH: &str = "/posts";
pub const DEFAULT_PAGE_SIZE: NonZeroU32 = match NonZeroU32::new(3) {
    Some(size) => size,
    None => panic!("page size must be non-zero"),
};

const PAGE_PARAM: &str = "page";
const PAGE_SIZE_PARAM: &str = "page_size";
const CONTENTS_PARAM: &str = "contents";
const CONTENTS_FILTER_PARAM: &str = "filters[contents]";

/// A navigable location such as `/posts?page=2&contents=rust`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Location(String);

impl Location {
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Self::posts();
        }
        if trimmed.starts_with('/') || trimmed.starts_with('?') {
            Self(trimmed.to_string())
        } else {
            Self(format!("/{trimmed}"))
        }
    }

    /// The default listing location.
    pub fn posts() -> Self {
        Self(POSTS_PATH.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn query(&self) -> &str {
        let after_path = self.0.split_once('?').map_or("", |(_, query)| query);
        after_path.split_once('#').map_or(after_path, |(query, _)| query)
    }

    fn param(&self, key: &str) -> Option<String> {
        form_urlencoded::parse(self.query().as_bytes())
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.into_owned())
    }
}

impl Default for Location {
    fn default() -> Self {
        Self::posts()
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The `(page, page_size, contents_filter)` triple defining a listing view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryState {
    pub page: NonZeroU32,
    pub page_size: NonZeroU32,
    pub contents_filter: String,
}

/// The part of [`QueryState`] whose change triggers a new fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewKey {
    pub page: NonZeroU32,
    pub contents_filter: String,
}

impl QueryState {
    pub fn first_page(page_size: NonZeroU32) -> Self {
        Self {
            page: NonZeroU32::MIN,
            page_size,
            contents_filter: String::new(),
        }
    }

    /// Parse a location, falling back to defaults for absent or invalid values.
    pub fn from_location(location: &Location, default_page_size: NonZeroU32) -> Self {
        Self {
            page: positive(location.param(PAGE_PARAM)).unwrap_or(NonZeroU32::MIN),
            page_size: positive(location.param(PAGE_SIZE_PARAM)).unwrap_or(default_page_size),
            contents_filter: location.param(CONTENTS_PARAM).unwrap_or_default(),
        }
    }

    /// Encode as a location. `page_size` is only written when it differs from
    /// the default, and an empty filter is omitted.
    pub fn to_location(&self, default_page_size: NonZeroU32) -> Location {
        let mut query = form_urlencoded::Serializer::new(String::new());
        query.append_pair(PAGE_PARAM, &self.page.to_string());
        if self.page_size != default_page_size {
            query.append_pair(PAGE_SIZE_PARAM, &self.page_size.to_string());
        }
        if !self.contents_filter.is_empty() {
            query.append_pair(CONTENTS_PARAM, &self.contents_filter);
        }
        Location(format!("{POSTS_PATH}?{}", query.finish()))
    }

    /// Query parameters for the listing endpoint, in a stable order.
    pub fn list_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            (PAGE_PARAM, self.page.to_string()),
            (PAGE_SIZE_PARAM, self.page_size.to_string()),
        ];
        if !self.contents_filter.is_empty() {
            params.push((CONTENTS_FILTER_PARAM, self.contents_filter.clone()));
        }
        params
    }

    pub fn view_key(&self) -> ViewKey {
        ViewKey {
            page: self.page,
            contents_filter: self.contents_filter.clone(),
        }
    }
}

fn positive(raw: Option<String>) -> Option<NonZeroU32> {
    raw?.trim().parse::<NonZeroU32>().ok()
}

/// Linear navigation history with a cursor, like a browser tab.
#[derive(Debug, Clone)]
pub struct History {
    entries: Vec<Location>,
    cursor: usize,
}

impl History {
    pub fn new(initial: Location) -> Self {
        Self {
            entries: vec![initial],
            cursor: 0,
        }
    }

    pub fn current(&self) -> &Location {
        &self.entries[self.cursor]
    }

    /// Push `location`, dropping any forward entries. Navigating to the
    /// current location is a no-op and returns `false`.
    pub fn push(&mut self, location: Location) -> bool {
        if *self.current() == location {
            return false;
        }
        self.entries.truncate(self.cursor + 1);
        self.entries.push(location);
        self.cursor += 1;
        true
    }

    pub fn back(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        true
    }

    pub fn forward(&mut self) -> bool {
        if self.cursor + 1 >= self.entries.len() {
            return false;
        }
        self.cursor += 1;
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Query state kept in lock-step with a navigation history.
#[derive(Debug, Clone)]
pub struct PostQuery {
    history: History,
    default_page_size: NonZeroU32,
    state: QueryState,
}

impl PostQuery {
    pub fn open(location: Location, default_page_size: NonZeroU32) -> Self {
        let state = QueryState::from_location(&location, default_page_size);
        Self {
            history: History::new(location),
            default_page_size,
            state,
        }
    }

    pub fn state(&self) -> &QueryState {
        &self.state
    }

    pub fn location(&self) -> &Location {
        self.history.current()
    }

    pub fn default_page_size(&self) -> NonZeroU32 {
        self.default_page_size
    }

    /// Move to `page`, keeping the current filter.
    pub fn set_page(&mut self, page: NonZeroU32) {
        let next = QueryState {
            page,
            ..self.state.clone()
        };
        self.navigate(next.to_location(self.default_page_size));
    }

    /// Commit a new filter. Always restarts at page 1 because offsets from
    /// the previous filter no longer apply.
    pub fn submit_filter(&mut self, text: impl Into<String>) {
        let next = QueryState {
            page: NonZeroU32::MIN,
            page_size: self.state.page_size,
            contents_filter: text.into(),
        };
        self.navigate(next.to_location(self.default_page_size));
    }

    pub fn navigate(&mut self, location: Location) {
        self.history.push(location);
        self.reload();
    }

    pub fn back(&mut self) -> bool {
        let moved = self.history.back();
        self.reload();
        moved
    }

    pub fn forward(&mut self) -> bool {
        let moved = self.history.forward();
        self.reload();
        moved
    }

    /// Re-derive the query state from the current location.
    pub fn reload(&mut self) {
        self.state = QueryState::from_location(self.history.current(), self.default_page_size);
    }
}

/// Search box contents, staged until explicitly submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchInput {
    buffer: String,
}

impl SearchInput {
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            buffer: initial.into(),
        }
    }

    pub fn value(&self) -> &str {
        &self.buffer
    }

    pub fn set(&mut self, text: impl Into<String>) {
        self.buffer = text.into();
    }

    pub fn push_str(&mut self, text: &str) {
        self.buffer.push_str(text);
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// Commit the buffered text as the listing filter.
    pub fn submit(&self, query: &mut PostQuery) {
        query.submit_filter(self.buffer.clone());
    }
}
