///
/// CursorPage
///
/// Cursor-mode page payload: at most `page_size` root entities in forward
/// order, a has-more flag for the direction of travel, and the two boundary
/// cursors. Boundary cursors are absent on an empty page.
///

#[derive(Debug)]
pub struct CursorPage<E> {
    entries: Vec<E>,
    has_more: bool,
    cursor_before: Option<String>,
    cursor_after: Option<String>,
    page_size: u32,
}

impl<E> CursorPage<E> {
    #[must_use]
    pub const fn new(
        entries: Vec<E>,
        has_more: bool,
        cursor_before: Option<String>,
        cursor_after: Option<String>,
        page_size: u32,
    ) -> Self {
        Self {
            entries,
            has_more,
            cursor_before,
            cursor_after,
            page_size,
        }
    }

    #[must_use]
    pub fn entries(&self) -> &[E] {
        &self.entries
    }

    #[must_use]
    pub const fn has_more(&self) -> bool {
        self.has_more
    }

    /// Token addressing the page adjacent to this page's first row.
    #[must_use]
    pub fn cursor_before(&self) -> Option<&str> {
        self.cursor_before.as_deref()
    }

    /// Token addressing the page adjacent to this page's last row.
    #[must_use]
    pub fn cursor_after(&self) -> Option<&str> {
        self.cursor_after.as_deref()
    }

    #[must_use]
    pub const fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Consume this page and return `(entries, has_more, before, after)`.
    #[must_use]
    pub fn into_parts(self) -> (Vec<E>, bool, Option<String>, Option<String>) {
        (
            self.entries,
            self.has_more,
            self.cursor_before,
            self.cursor_after,
        )
    }

    #[must_use]
    pub fn into_entries(self) -> Vec<E> {
        self.entries
    }
}

///
/// OffsetPage
/// Offset-mode page payload: entries plus the has-more flag, no cursors.
///

#[derive(Debug)]
pub struct OffsetPage<E> {
    entries: Vec<E>,
    has_more: bool,
    page_size: u32,
}

impl<E> OffsetPage<E> {
    #[must_use]
    pub const fn new(entries: Vec<E>, has_more: bool, page_size: u32) -> Self {
        Self {
            entries,
            has_more,
            page_size,
        }
    }

    #[must_use]
    pub fn entries(&self) -> &[E] {
        &self.entries
    }

    #[must_use]
    pub const fn has_more(&self) -> bool {
        self.has_more
    }

    #[must_use]
    pub const fn page_size(&self) -> u32 {
        self.page_size
    }

    #[must_use]
    pub fn into_entries(self) -> Vec<E> {
        self.entries
    }
}
