use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Zero-based page coordinates for offset pagination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub size: u64,
}

impl PageRequest {
    pub fn new(page: u64, size: u64) -> Self {
        Self { page, size }
    }
}

/// Page envelope returned by list operations.
///
/// `total_elements` counts every record matching the query, not only the
/// ones on this page.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    pub page: u64,
    pub size: u64,
    pub total_elements: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, request: PageRequest, total_elements: u64) -> Self {
        let total_pages = if request.size == 0 {
            0
        } else {
            total_elements.div_ceil(request.size)
        };
        Self {
            content,
            page: request.page,
            size: request.size,
            total_elements,
            total_pages,
        }
    }

    pub fn empty(request: PageRequest) -> Self {
        Self::new(Vec::new(), request, 0)
    }

    /// Map items while keeping the paging metadata (Domain->DTO mapping convenience)
    pub fn map_items<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            page: self.page,
            size: self.size,
            total_elements: self.total_elements,
            total_pages: self.total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_pages_rounds_up() {
        let page = Page::new(vec![1, 2], PageRequest::new(0, 2), 5);
        assert_eq!(page.total_pages, 3);

        let page: Page<i32> = Page::empty(PageRequest::new(3, 10));
        assert_eq!(page.total_pages, 0);
        assert_eq!(page.page, 3);
    }

    #[test]
    fn map_items_keeps_metadata() {
        let page = Page::new(vec![1, 2, 3], PageRequest::new(1, 3), 7);
        let mapped = page.map_items(|n| n.to_string());
        assert_eq!(mapped.content, vec!["1", "2", "3"]);
        assert_eq!(mapped.total_elements, 7);
        assert_eq!(mapped.total_pages, 3);
    }

    #[test]
    fn serializes_in_camel_case() {
        let page = Page::new(vec!["a"], PageRequest::new(0, 20), 1);
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["totalElements"], 1);
        assert_eq!(json["totalPages"], 1);
        assert_eq!(json["content"][0], "a");
    }
}
