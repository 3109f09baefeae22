//! Page-number pagination.
use serde::Serialize;

/// Posts shown per page unless configured otherwise.
pub const POSTS_PER_PAGE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    count: usize,
    per_page: usize,
}

impl Paginator {
    pub fn new(count: usize, per_page: usize) -> Self {
        Self {
            count,
            per_page: per_page.max(1),
        }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn per_page(&self) -> usize {
        self.per_page
    }

    /// Always at least 1; an empty listing still has a first page.
    pub fn num_pages(&self) -> usize {
        if self.count == 0 {
            1
        } else {
            (self.count + self.per_page - 1) / self.per_page
        }
    }

    /// Resolve a raw `?page=` value to a valid page number.
    ///
    /// Missing or non-integer values ("abc", "2.0", "1e3") give the first
    /// page. Anything out of range gives the last page.
    pub fn get_page(&self, raw: Option<&str>) -> usize {
        let Some(raw) = raw.map(str::trim) else {
            return 1;
        };

        let Ok(number) = raw.parse::<i64>() else {
            return 1;
        };

        let last = self.num_pages();
        if number < 1 || number as u64 > last as u64 {
            last
        } else {
            number as usize
        }
    }

    /// Row offset and limit for a page number returned by [`get_page`].
    ///
    /// [`get_page`]: Paginator::get_page
    pub fn bounds(&self, number: usize) -> (usize, usize) {
        let offset = (number.max(1) - 1) * self.per_page;
        (offset, self.per_page)
    }

    pub fn page<T>(&self, number: usize, items: Vec<T>) -> Page<T> {
        let num_pages = self.num_pages();
        let (offset, _) = self.bounds(number);
        let has_next = number < num_pages;
        let has_previous = number > 1;

        Page {
            start_index: if self.count == 0 { 0 } else { offset + 1 },
            items,
            number,
            num_pages,
            count: self.count,
            has_next,
            has_previous,
            next_page_number: has_next.then(|| number + 1),
            previous_page_number: has_previous.then(|| number - 1),
        }
    }
}

/// One page of a listing.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: usize,
    pub num_pages: usize,
    pub count: usize,
    pub has_next: bool,
    pub has_previous: bool,
    pub next_page_number: Option<usize>,
    pub previous_page_number: Option<usize>,
    /// 1-based index of the first item, 0 for an empty listing
    pub start_index: usize,
}

impl<T> Page<T> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
